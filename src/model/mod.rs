//! The conflict data model.
//!
//! [`Position`] and [`Source`] are deliberately decoupled: a rebase flips
//! which source's content sits at which screen position without changing any
//! geometry. The aggregate [`Conflict`] holds up to three [`Side`]s, one
//! shared [`Separator`], and the resolution state.

pub mod conflict;
pub mod regions;

use serde::{Deserialize, Serialize};

pub use conflict::Conflict;
pub use regions::{Banner, Separator, Side, SideKind};

// ---------------------------------------------------------------------------
// Position and source
// ---------------------------------------------------------------------------

/// Where a side sits within a conflict on screen.
///
/// `Middle` is occupied only by the base side of a diff3 conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Top,
    Middle,
    Bottom,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Middle => write!(f, "middle"),
            Self::Bottom => write!(f, "bottom"),
        }
    }
}

/// Whose content a side holds, independent of its screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Ours,
    Base,
    Theirs,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Base => write!(f, "base"),
            Self::Theirs => write!(f, "theirs"),
        }
    }
}

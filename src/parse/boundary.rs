//! Boundary-line classification.
//!
//! A boundary line starts with one marker character repeated exactly seven
//! times: `<<<<<<<` opens a conflict, `|||||||` opens the base region of a
//! diff3 conflict, `=======` separates the sides, and `>>>>>>>` closes the
//! conflict. Eight or more repeats are ordinary text.

use serde::{Deserialize, Serialize};

use super::cursor::LineCursor;

/// The four kinds of conflict boundary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// `<<<<<<<` — banner opening the top side.
    Ours,
    /// `|||||||` — banner opening the base side.
    Base,
    /// `=======` — divider between the sides.
    Separator,
    /// `>>>>>>>` — banner closing the bottom side.
    Theirs,
}

impl Boundary {
    pub fn marker_char(&self) -> char {
        match self {
            Self::Ours => '<',
            Self::Base => '|',
            Self::Separator => '=',
            Self::Theirs => '>',
        }
    }

    fn from_marker_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::Ours),
            '|' => Some(Self::Base),
            '=' => Some(Self::Separator),
            '>' => Some(Self::Theirs),
            _ => None,
        }
    }
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Base => write!(f, "base"),
            Self::Separator => write!(f, "separator"),
            Self::Theirs => write!(f, "theirs"),
        }
    }
}

/// Classify `line` as a boundary line, or `None` for ordinary text.
pub fn classify_line(line: &str) -> Option<Boundary> {
    let mut chars = line.chars();
    let first = chars.next()?;
    let boundary = Boundary::from_marker_char(first)?;
    for _ in 0..6 {
        if chars.next() != Some(first) {
            return None;
        }
    }
    // An eighth repeat disqualifies the line.
    if chars.next() == Some(first) {
        return None;
    }
    Some(boundary)
}

/// Which of the requested boundary kinds the current line is, if any.
pub fn is_at_boundary<C: LineCursor>(cursor: &C, kinds: &[Boundary]) -> Option<Boundary> {
    let line = cursor.current_line()?;
    classify_line(line).filter(|b| kinds.contains(b))
}

/// Advance the cursor until one of the requested boundary kinds is the
/// current line. Returns the matched kind, or `None` if input ran out.
pub fn advance_to_boundary<C: LineCursor>(cursor: &mut C, kinds: &[Boundary]) -> Option<Boundary> {
    loop {
        if cursor.at_end() {
            return None;
        }
        if let Some(found) = is_at_boundary(cursor, kinds) {
            return Some(found);
        }
        cursor.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::cursor::ChunkCursor;

    #[test]
    fn test_classify_boundary_lines() {
        assert_eq!(classify_line("<<<<<<< HEAD\n"), Some(Boundary::Ours));
        assert_eq!(classify_line("||||||| merged common ancestors\n"), Some(Boundary::Base));
        assert_eq!(classify_line("=======\n"), Some(Boundary::Separator));
        assert_eq!(classify_line("=======\r\n"), Some(Boundary::Separator));
        assert_eq!(classify_line(">>>>>>> other-branch\n"), Some(Boundary::Theirs));
    }

    #[test]
    fn test_classify_rejects_ordinary_text() {
        assert_eq!(classify_line("plain text\n"), None);
        assert_eq!(classify_line("<<<<<< six\n"), None);
        assert_eq!(classify_line("<<<<<<<< eight\n"), None);
        assert_eq!(classify_line("========\n"), None);
        assert_eq!(classify_line(""), None);
    }

    #[test]
    fn test_advance_to_boundary() {
        let mut cursor = ChunkCursor::new("aaa\nbbb\n=======\nccc\n");
        let found = advance_to_boundary(&mut cursor, &[Boundary::Base, Boundary::Separator]);
        assert_eq!(found, Some(Boundary::Separator));
        assert_eq!(cursor.current_line(), Some("=======\n"));
    }

    #[test]
    fn test_advance_to_boundary_skips_unrequested_kinds() {
        let mut cursor = ChunkCursor::new(">>>>>>> end\n=======\n");
        let found = advance_to_boundary(&mut cursor, &[Boundary::Separator]);
        assert_eq!(found, Some(Boundary::Separator));
    }

    #[test]
    fn test_advance_to_boundary_exhausts_input() {
        let mut cursor = ChunkCursor::new("aaa\nbbb\n");
        assert_eq!(advance_to_boundary(&mut cursor, &[Boundary::Theirs]), None);
        assert!(cursor.at_end());
    }
}

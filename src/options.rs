// options.rs - Compile-time option flags.
//
// A single bitflags set carries every switch the front end and the
// compiler look at. Inline groups like `(?i)` toggle the same bits.

use bitflags::bitflags;

bitflags! {
    /// Pattern compilation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u32 {
        /// Case-insensitive matching (ASCII only unless `UNICODE_CASE` is set).
        const CASE_INSENSITIVE = 1 << 0;
        /// `^` and `$` match at line terminators.
        const MULTILINE = 1 << 1;
        /// `.` matches any character including line terminators.
        const DOTALL = 1 << 2;
        /// Case folding follows Unicode simple case mapping.
        const UNICODE_CASE = 1 << 3;
        /// Only `\n` is a line terminator for `.`, `^` and `$`.
        const UNIX_LINES = 1 << 4;
        /// Whitespace and `#` comments are ignored in the pattern.
        const COMMENTS = 1 << 5;
        /// The whole pattern is a literal string.
        const LITERAL = 1 << 6;
        /// Record the capture tree of every successful match.
        const CAPTURE_TREE = 1 << 7;
        /// Recursive group calls run against a fresh capture array.
        const ISOLATE_RECURSION = 1 << 8;
    }
}

impl Flags {
    /// Map an inline flag letter (`(?imsuxd)`) to its flag.
    pub fn from_inline(c: char) -> Option<Flags> {
        match c {
            'i' => Some(Flags::CASE_INSENSITIVE),
            'm' => Some(Flags::MULTILINE),
            's' => Some(Flags::DOTALL),
            'u' => Some(Flags::UNICODE_CASE),
            'x' => Some(Flags::COMMENTS),
            'd' => Some(Flags::UNIX_LINES),
            _ => None,
        }
    }

    /// Case fold implied by these flags for literals and ranges.
    pub fn case_fold(self) -> CaseFold {
        if !self.contains(Flags::CASE_INSENSITIVE) {
            CaseFold::None
        } else if self.contains(Flags::UNICODE_CASE) {
            CaseFold::Unicode
        } else {
            CaseFold::Ascii
        }
    }
}

/// How literal text compares against the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseFold {
    /// Exact code unit comparison.
    None,
    /// ASCII letters compare case-insensitively.
    Ascii,
    /// Unicode simple case folding.
    Unicode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_letters() {
        assert_eq!(Flags::from_inline('i'), Some(Flags::CASE_INSENSITIVE));
        assert_eq!(Flags::from_inline('d'), Some(Flags::UNIX_LINES));
        assert_eq!(Flags::from_inline('q'), None);
    }

    #[test]
    fn fold_selection() {
        assert_eq!(Flags::empty().case_fold(), CaseFold::None);
        assert_eq!(Flags::CASE_INSENSITIVE.case_fold(), CaseFold::Ascii);
        assert_eq!(
            (Flags::CASE_INSENSITIVE | Flags::UNICODE_CASE).case_fold(),
            CaseFold::Unicode
        );
        // UNICODE_CASE alone does not turn on case-insensitivity.
        assert_eq!(Flags::UNICODE_CASE.case_fold(), CaseFold::None);
    }
}

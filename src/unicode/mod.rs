// unicode/mod.rs - Character properties and case mapping.
// ASCII ctype table, simple case mapping backed by std, word and
// non-spacing-mark tests used by word boundaries, and the small set of
// Unicode classes the front end exposes.

use bitflags::bitflags;

use crate::regenc::CodePoint;

// === ASCII Ctype Table ===

bitflags! {
    /// Character type bits of an ASCII code point.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CtypeMask: u16 {
        const UPPER = 1 << 0;
        const LOWER = 1 << 1;
        const DIGIT = 1 << 2;
        const SPACE = 1 << 3;
        const PUNCT = 1 << 4;
        const CNTRL = 1 << 5;
        const BLANK = 1 << 6;
        const HEX = 1 << 7;
        const UNDER = 1 << 8;
        const SP = 1 << 9;
        const ALPHA = Self::UPPER.bits() | Self::LOWER.bits();
        const ALNUM = Self::ALPHA.bits() | Self::DIGIT.bits();
        const GRAPH = Self::PUNCT.bits() | Self::ALNUM.bits();
        const PRINT = Self::GRAPH.bits() | Self::SP.bits();
        const WORD = Self::ALNUM.bits() | Self::UNDER.bits();
        const XDIGIT = Self::DIGIT.bits() | Self::HEX.bits();
    }
}

const fn ascii_ctype_bits(c: u8) -> u16 {
    let mut m = 0;
    if c.is_ascii_uppercase() {
        m |= CtypeMask::UPPER.bits();
    }
    if c.is_ascii_lowercase() {
        m |= CtypeMask::LOWER.bits();
    }
    if c.is_ascii_digit() {
        m |= CtypeMask::DIGIT.bits();
    }
    if c == b' ' || (c >= 0x09 && c <= 0x0d) {
        m |= CtypeMask::SPACE.bits();
    }
    if c.is_ascii_punctuation() {
        m |= CtypeMask::PUNCT.bits();
    }
    if c.is_ascii_control() {
        m |= CtypeMask::CNTRL.bits();
    }
    if c == b' ' || c == b'\t' {
        m |= CtypeMask::BLANK.bits();
    }
    if (c >= b'a' && c <= b'f') || (c >= b'A' && c <= b'F') {
        m |= CtypeMask::HEX.bits();
    }
    if c == b'_' {
        m |= CtypeMask::UNDER.bits();
    }
    if c == b' ' {
        m |= CtypeMask::SP.bits();
    }
    m
}

const fn build_ascii_table() -> [u16; 128] {
    let mut table = [0u16; 128];
    let mut c = 0;
    while c < 128 {
        table[c] = ascii_ctype_bits(c as u8);
        c += 1;
    }
    table
}

static ASCII_CTYPE_TABLE: [u16; 128] = build_ascii_table();

/// Ctype bits of `cp`, empty for anything outside ASCII.
#[inline]
pub fn ascii_ctype(cp: CodePoint) -> CtypeMask {
    if cp < 128 {
        CtypeMask::from_bits_retain(ASCII_CTYPE_TABLE[cp as usize])
    } else {
        CtypeMask::empty()
    }
}

/// ASCII character classes (`\p{Lower}`, `\d`, `\w`, `\s` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ctype {
    Lower,
    Upper,
    Ascii,
    Alpha,
    Digit,
    Alnum,
    Punct,
    Graph,
    Print,
    Blank,
    Cntrl,
    XDigit,
    Space,
    Word,
}

impl Ctype {
    pub fn mask(self) -> CtypeMask {
        match self {
            Ctype::Lower => CtypeMask::LOWER,
            Ctype::Upper => CtypeMask::UPPER,
            Ctype::Ascii => CtypeMask::all(),
            Ctype::Alpha => CtypeMask::ALPHA,
            Ctype::Digit => CtypeMask::DIGIT,
            Ctype::Alnum => CtypeMask::ALNUM,
            Ctype::Punct => CtypeMask::PUNCT,
            Ctype::Graph => CtypeMask::GRAPH,
            Ctype::Print => CtypeMask::PRINT,
            Ctype::Blank => CtypeMask::BLANK,
            Ctype::Cntrl => CtypeMask::CNTRL,
            Ctype::XDigit => CtypeMask::XDIGIT,
            Ctype::Space => CtypeMask::SPACE,
            Ctype::Word => CtypeMask::WORD,
        }
    }

    /// Membership test. Only code points below 128 can match.
    #[inline]
    pub fn matches(self, cp: CodePoint) -> bool {
        cp < 128 && (self == Ctype::Ascii || ascii_ctype(cp).intersects(self.mask()))
    }

    /// Look up a POSIX class name as used in `\p{Name}`.
    pub fn from_name(name: &str) -> Option<Ctype> {
        Some(match name {
            "Lower" => Ctype::Lower,
            "Upper" => Ctype::Upper,
            "ASCII" => Ctype::Ascii,
            "Alpha" => Ctype::Alpha,
            "Digit" => Ctype::Digit,
            "Alnum" => Ctype::Alnum,
            "Punct" => Ctype::Punct,
            "Graph" => Ctype::Graph,
            "Print" => Ctype::Print,
            "Blank" => Ctype::Blank,
            "Cntrl" => Ctype::Cntrl,
            "XDigit" => Ctype::XDigit,
            "Space" => Ctype::Space,
            _ => return None,
        })
    }
}

// === Unicode Classes ===

/// Unicode-aware classes answered by the std character tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnicodeClass {
    Alphabetic,
    Lowercase,
    Uppercase,
    Numeric,
    Whitespace,
    Control,
    Alphanumeric,
}

impl UnicodeClass {
    pub fn matches(self, cp: CodePoint) -> bool {
        let Some(c) = char::from_u32(cp) else {
            return false;
        };
        match self {
            UnicodeClass::Alphabetic => c.is_alphabetic(),
            UnicodeClass::Lowercase => c.is_lowercase(),
            UnicodeClass::Uppercase => c.is_uppercase(),
            UnicodeClass::Numeric => c.is_numeric(),
            UnicodeClass::Whitespace => c.is_whitespace(),
            UnicodeClass::Control => c.is_control(),
            UnicodeClass::Alphanumeric => c.is_alphanumeric(),
        }
    }

    pub fn from_name(name: &str) -> Option<UnicodeClass> {
        let name = name.strip_prefix("Is").unwrap_or(name);
        Some(match name {
            "L" | "Letter" | "Alphabetic" => UnicodeClass::Alphabetic,
            "Ll" | "Lowercase" | "LowercaseLetter" => UnicodeClass::Lowercase,
            "Lu" | "Uppercase" | "UppercaseLetter" => UnicodeClass::Uppercase,
            "N" | "Nd" | "Digit" | "Numeric" => UnicodeClass::Numeric,
            "White_Space" | "WhiteSpace" => UnicodeClass::Whitespace,
            "Cc" | "Control" => UnicodeClass::Control,
            "Alnum" | "Alphanumeric" => UnicodeClass::Alphanumeric,
            _ => return None,
        })
    }
}

// === Case Mapping ===

/// Simple upper-case mapping. Characters whose full mapping expands to
/// several characters map to themselves.
pub fn to_upper(cp: CodePoint) -> CodePoint {
    single_mapping(cp, char::to_uppercase)
}

/// Simple lower-case mapping.
pub fn to_lower(cp: CodePoint) -> CodePoint {
    single_mapping(cp, char::to_lowercase)
}

fn single_mapping<I>(cp: CodePoint, map: impl Fn(char) -> I) -> CodePoint
where
    I: Iterator<Item = char>,
{
    let Some(c) = char::from_u32(cp) else {
        return cp;
    };
    let mut it = map(c);
    match (it.next(), it.next()) {
        (Some(m), None) => m as CodePoint,
        _ => cp,
    }
}

/// Unicode case fold used by case-insensitive literals: lower(upper(c)).
#[inline]
pub fn fold(cp: CodePoint) -> CodePoint {
    to_lower(to_upper(cp))
}

#[inline]
pub fn ascii_to_lower(cp: CodePoint) -> CodePoint {
    if (b'A' as CodePoint..=b'Z' as CodePoint).contains(&cp) {
        cp + 0x20
    } else {
        cp
    }
}

#[inline]
pub fn ascii_to_upper(cp: CodePoint) -> CodePoint {
    if (b'a' as CodePoint..=b'z' as CodePoint).contains(&cp) {
        cp - 0x20
    } else {
        cp
    }
}

/// True when `cp` has a case counterpart under Unicode mapping.
pub fn has_case(cp: CodePoint) -> bool {
    to_upper(cp) != cp || to_lower(cp) != cp
}

// === Word, Marks, Whitespace ===

/// Word character for `\b`: letters, digits and underscore.
pub fn is_word(cp: CodePoint) -> bool {
    cp == '_' as CodePoint || char::from_u32(cp).is_some_and(char::is_alphanumeric)
}

// Non-spacing combining marks (general category Mn) of the common blocks.
static NON_SPACING_MARKS: &[(CodePoint, CodePoint)] = &[
    (0x0300, 0x036F),
    (0x0483, 0x0487),
    (0x0591, 0x05BD),
    (0x05BF, 0x05BF),
    (0x05C1, 0x05C2),
    (0x05C4, 0x05C5),
    (0x05C7, 0x05C7),
    (0x0610, 0x061A),
    (0x064B, 0x065F),
    (0x0670, 0x0670),
    (0x06D6, 0x06DC),
    (0x06DF, 0x06E4),
    (0x06E7, 0x06E8),
    (0x06EA, 0x06ED),
    (0x0711, 0x0711),
    (0x0730, 0x074A),
    (0x07A6, 0x07B0),
    (0x0900, 0x0902),
    (0x093A, 0x093A),
    (0x093C, 0x093C),
    (0x0941, 0x0948),
    (0x094D, 0x094D),
    (0x0951, 0x0957),
    (0x0962, 0x0963),
    (0x0E31, 0x0E31),
    (0x0E34, 0x0E3A),
    (0x0E47, 0x0E4E),
    (0x1AB0, 0x1ABD),
    (0x1DC0, 0x1DFF),
    (0x20D0, 0x20DC),
    (0x20E1, 0x20E1),
    (0x20E5, 0x20F0),
    (0x302A, 0x302D),
    (0x3099, 0x309A),
    (0xFE00, 0xFE0F),
    (0xFE20, 0xFE2F),
    (0x1D167, 0x1D169),
    (0xE0100, 0xE01EF),
];

pub fn is_non_spacing_mark(cp: CodePoint) -> bool {
    NON_SPACING_MARKS
        .binary_search_by(|&(lo, hi)| {
            if hi < cp {
                std::cmp::Ordering::Less
            } else if lo > cp {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

/// `\h`: horizontal whitespace.
pub fn is_horiz_ws(cp: CodePoint) -> bool {
    matches!(
        cp,
        0x09 | 0x20 | 0xA0 | 0x1680 | 0x180E | 0x2000..=0x200A | 0x202F | 0x205F | 0x3000
    )
}

/// `\v`: vertical whitespace.
pub fn is_vert_ws(cp: CodePoint) -> bool {
    matches!(cp, 0x0A..=0x0D | 0x85 | 0x2028 | 0x2029)
}

/// Line terminators recognised by `.`, `^` and `$` outside UNIX_LINES.
#[inline]
pub fn is_line_terminator(cp: CodePoint) -> bool {
    matches!(cp, 0x0A | 0x0D | 0x85 | 0x2028 | 0x2029)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_table() {
        assert!(Ctype::Alpha.matches('q' as u32));
        assert!(!Ctype::Alpha.matches('1' as u32));
        assert!(Ctype::Word.matches('_' as u32));
        assert!(Ctype::XDigit.matches('F' as u32));
        assert!(!Ctype::XDigit.matches('g' as u32));
        assert!(Ctype::Print.matches(' ' as u32));
        assert!(!Ctype::Graph.matches(' ' as u32));
        assert!(Ctype::Space.matches(0x0B));
        assert!(Ctype::Ascii.matches(0x7F));
        assert!(!Ctype::Lower.matches(0xE9));
    }

    #[test]
    fn case_mapping() {
        assert_eq!(to_upper('a' as u32), 'A' as u32);
        assert_eq!(to_lower('Z' as u32), 'z' as u32);
        assert_eq!(to_upper('é' as u32), 'É' as u32);
        // Multi-character mappings are left alone.
        assert_eq!(to_upper('ß' as u32), 'ß' as u32);
        assert_eq!(fold('K' as u32), 'k' as u32);
        assert_eq!(fold(0x212A), 'k' as u32);
        assert_eq!(ascii_to_lower('É' as u32), 'É' as u32);
        assert!(has_case('x' as u32));
        assert!(!has_case('1' as u32));
    }

    #[test]
    fn marks_and_words() {
        assert!(is_non_spacing_mark(0x0301));
        assert!(!is_non_spacing_mark('a' as u32));
        assert!(is_word('é' as u32));
        assert!(is_word('_' as u32));
        assert!(!is_word('-' as u32));
    }

    #[test]
    fn unicode_class_names() {
        assert_eq!(UnicodeClass::from_name("IsL"), Some(UnicodeClass::Alphabetic));
        assert_eq!(UnicodeClass::from_name("Lu"), Some(UnicodeClass::Uppercase));
        assert!(UnicodeClass::Uppercase.matches('Ä' as u32));
        assert_eq!(UnicodeClass::from_name("Greek"), None);
    }
}

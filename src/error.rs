// error.rs - Error types for nodechain.
//
// Pattern problems surface as RegexError variants; every variant keeps a
// stable numeric code so callers can match on codes as well as variants.

use std::fmt;

// === Error codes ===
pub const ERR_INVALID_ARGUMENT: i32 = -30;
pub const ERR_INTERNAL_BUG: i32 = -11;

pub const ERR_END_PATTERN_AT_LEFT_BRACE: i32 = -100;
pub const ERR_PREMATURE_END_OF_CHAR_CLASS: i32 = -103;
pub const ERR_END_PATTERN_AT_ESCAPE: i32 = -104;
pub const ERR_END_PATTERN_AT_CONTROL: i32 = -106;
pub const ERR_META_CODE_SYNTAX: i32 = -108;
pub const ERR_CHAR_CLASS_VALUE_AT_START_OF_RANGE: i32 = -111;
pub const ERR_TARGET_OF_REPEAT_OPERATOR_NOT_SPECIFIED: i32 = -113;
pub const ERR_NESTED_REPEAT_OPERATOR: i32 = -115;
pub const ERR_UNMATCHED_CLOSE_PARENTHESIS: i32 = -116;
pub const ERR_END_PATTERN_WITH_UNMATCHED_PARENTHESIS: i32 = -117;
pub const ERR_END_PATTERN_IN_GROUP: i32 = -118;
pub const ERR_UNDEFINED_GROUP_OPTION: i32 = -119;
pub const ERR_INVALID_LOOK_BEHIND_PATTERN: i32 = -122;
pub const ERR_INVALID_REPEAT_RANGE_PATTERN: i32 = -123;

pub const ERR_TOO_BIG_NUMBER: i32 = -200;
pub const ERR_TOO_BIG_NUMBER_FOR_REPEAT_RANGE: i32 = -201;
pub const ERR_UPPER_SMALLER_THAN_LOWER_IN_REPEAT_RANGE: i32 = -202;
pub const ERR_EMPTY_RANGE_IN_CHAR_CLASS: i32 = -203;
pub const ERR_INVALID_BACKREF: i32 = -208;
pub const ERR_UNDEFINED_OPERATOR: i32 = -213;
pub const ERR_EMPTY_GROUP_NAME: i32 = -214;
pub const ERR_INVALID_GROUP_NAME: i32 = -215;
pub const ERR_UNDEFINED_NAME_REFERENCE: i32 = -217;
pub const ERR_UNDEFINED_GROUP_REFERENCE: i32 = -218;
pub const ERR_MULTIPLEX_DEFINED_NAME: i32 = -219;
pub const ERR_INVALID_CHAR_PROPERTY_NAME: i32 = -223;
pub const ERR_INVALID_IF_ELSE_SYNTAX: i32 = -224;
pub const ERR_INVALID_CODE_POINT_VALUE: i32 = -400;
pub const ERR_INVALID_REGION: i32 = -410;

/// Message for a syntax error code.
pub fn error_code_to_message(code: i32) -> &'static str {
    match code {
        ERR_INVALID_ARGUMENT => "invalid argument",
        ERR_INTERNAL_BUG => "internal error (bug)",
        ERR_END_PATTERN_AT_LEFT_BRACE => "end pattern at left brace",
        ERR_PREMATURE_END_OF_CHAR_CLASS => "premature end of char-class",
        ERR_END_PATTERN_AT_ESCAPE => "end pattern at escape",
        ERR_END_PATTERN_AT_CONTROL => "end pattern at control",
        ERR_META_CODE_SYNTAX => "invalid meta-code syntax",
        ERR_CHAR_CLASS_VALUE_AT_START_OF_RANGE => "char-class value at start of range",
        ERR_TARGET_OF_REPEAT_OPERATOR_NOT_SPECIFIED => {
            "target of repeat operator is not specified"
        }
        ERR_NESTED_REPEAT_OPERATOR => "nested repeat operator",
        ERR_UNMATCHED_CLOSE_PARENTHESIS => "unmatched close parenthesis",
        ERR_END_PATTERN_WITH_UNMATCHED_PARENTHESIS => "end pattern with unmatched parenthesis",
        ERR_END_PATTERN_IN_GROUP => "end pattern in group",
        ERR_UNDEFINED_GROUP_OPTION => "undefined group option",
        ERR_INVALID_LOOK_BEHIND_PATTERN => "invalid pattern in look-behind",
        ERR_INVALID_REPEAT_RANGE_PATTERN => "invalid repeat range {lower,upper}",
        ERR_TOO_BIG_NUMBER => "too big number",
        ERR_TOO_BIG_NUMBER_FOR_REPEAT_RANGE => "too big number for repeat range",
        ERR_UPPER_SMALLER_THAN_LOWER_IN_REPEAT_RANGE => "upper is smaller than lower in repeat range",
        ERR_EMPTY_RANGE_IN_CHAR_CLASS => "empty range in char class",
        ERR_INVALID_BACKREF => "invalid backref number/name",
        ERR_UNDEFINED_OPERATOR => "undefined operator",
        ERR_EMPTY_GROUP_NAME => "group name is empty",
        ERR_INVALID_GROUP_NAME => "invalid group name",
        ERR_UNDEFINED_NAME_REFERENCE => "undefined name reference",
        ERR_UNDEFINED_GROUP_REFERENCE => "undefined group reference",
        ERR_MULTIPLEX_DEFINED_NAME => "multiplex defined name",
        ERR_INVALID_CHAR_PROPERTY_NAME => "invalid character property name",
        ERR_INVALID_IF_ELSE_SYNTAX => "invalid if-else syntax",
        ERR_INVALID_CODE_POINT_VALUE => "invalid code point value",
        ERR_INVALID_REGION => "invalid region",
        _ => "undefined error code",
    }
}

fn is_pattern_error(code: i32) -> bool {
    (-499..=-100).contains(&code) && code != ERR_INVALID_REGION
}

/// Error type for pattern compilation and matcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexError {
    /// Syntax error in the pattern text at byte offset `pos`.
    Syntax {
        code: i32,
        pos: usize,
        message: String,
    },
    /// A lookbehind body has no finite maximum length.
    UnboundedLookbehind,
    /// A back-reference names a group that does not exist.
    InvalidBackref(usize),
    /// A recursive call targets a group that does not exist.
    UndefinedGroupCall(usize),
    /// A back-reference, call or condition names an unknown group.
    UndefinedGroupName(String),
    /// `{min,max}` with `max < min`.
    InvalidRepeatRange { min: u32, max: u32 },
    /// A repeat bound does not fit the counter range.
    TooBigRepeat,
    /// A search region outside the text or with `start > end`.
    InvalidRegion { start: usize, end: usize },
    /// Invalid argument passed to a function.
    InvalidArgument,
    /// Internal engine bug (should not occur in correct usage).
    InternalBug(String),
}

impl RegexError {
    /// Build a syntax error from a code, using the stock message.
    pub fn syntax(code: i32, pos: usize) -> Self {
        RegexError::Syntax {
            code,
            pos,
            message: error_code_to_message(code).to_string(),
        }
    }

    /// Build a syntax error with extra detail appended to the stock message.
    pub fn syntax_with(code: i32, pos: usize, detail: &str) -> Self {
        RegexError::Syntax {
            code,
            pos,
            message: format!("{}: {}", error_code_to_message(code), detail),
        }
    }

    /// Numeric code of this error.
    pub fn code(&self) -> i32 {
        match self {
            RegexError::Syntax { code, .. } => *code,
            RegexError::UnboundedLookbehind => ERR_INVALID_LOOK_BEHIND_PATTERN,
            RegexError::InvalidBackref(_) => ERR_INVALID_BACKREF,
            RegexError::UndefinedGroupCall(_) => ERR_UNDEFINED_GROUP_REFERENCE,
            RegexError::UndefinedGroupName(_) => ERR_UNDEFINED_NAME_REFERENCE,
            RegexError::InvalidRepeatRange { .. } => ERR_UPPER_SMALLER_THAN_LOWER_IN_REPEAT_RANGE,
            RegexError::TooBigRepeat => ERR_TOO_BIG_NUMBER_FOR_REPEAT_RANGE,
            RegexError::InvalidRegion { .. } => ERR_INVALID_REGION,
            RegexError::InvalidArgument => ERR_INVALID_ARGUMENT,
            RegexError::InternalBug(_) => ERR_INTERNAL_BUG,
        }
    }
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegexError::Syntax { message, pos, .. } => {
                write!(f, "syntax error at offset {}: {}", pos, message)
            }
            RegexError::UnboundedLookbehind => {
                write!(f, "look-behind pattern has no obvious maximum length")
            }
            RegexError::InvalidBackref(n) => write!(f, "invalid backref number: {}", n),
            RegexError::UndefinedGroupCall(n) => write!(f, "call to undefined group: {}", n),
            RegexError::UndefinedGroupName(name) => write!(f, "undefined group name <{}>", name),
            RegexError::InvalidRepeatRange { min, max } => {
                write!(f, "upper {} is smaller than lower {} in repeat range", max, min)
            }
            RegexError::TooBigRepeat => write!(f, "too big number for repeat range"),
            RegexError::InvalidRegion { start, end } => {
                write!(f, "invalid region {}..{}", start, end)
            }
            RegexError::InvalidArgument => write!(f, "invalid argument"),
            RegexError::InternalBug(message) => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for RegexError {}

impl From<i32> for RegexError {
    fn from(code: i32) -> Self {
        match code {
            ERR_INVALID_ARGUMENT => RegexError::InvalidArgument,
            ERR_INTERNAL_BUG => RegexError::InternalBug(error_code_to_message(code).to_string()),
            ERR_INVALID_LOOK_BEHIND_PATTERN => RegexError::UnboundedLookbehind,
            ERR_TOO_BIG_NUMBER_FOR_REPEAT_RANGE => RegexError::TooBigRepeat,
            ERR_INVALID_REGION => RegexError::InvalidRegion { start: 0, end: 0 },
            c if is_pattern_error(c) => RegexError::syntax(c, 0),
            _ => RegexError::InternalBug(format!("error code {}", code)),
        }
    }
}

// prelude.rs - Convenient re-exports for the idiomatic API.
//
//! # Prelude
//!
//! ```
//! use nodechain::prelude::*;
//!
//! let re = Regex::new(r"\d+").unwrap();
//! let m = re.find("answer: 42").unwrap();
//! assert_eq!(m.as_str(), "42");
//! ```

pub use crate::api::{
    Captures, CapturesIter, FindIter, Match, Matcher, Regex, RegexBuilder,
};
pub use crate::error::RegexError;
pub use crate::options::Flags;
pub use crate::region::{CaptureTree, CaptureTreeNode, Region};

//! # nodechain
//!
//! Backtracking regex engine over UTF-16 text. Patterns compile to a graph
//! of matcher nodes which a recursive interpreter walks, one node handing
//! control to its successor.
//!
//! The dialect is Java's `Pattern` syntax extended with PCRE features:
//! recursion and subroutine calls (`(?R)`, `(?1)`, `(?&name)`), conditionals,
//! `\R`, `\h`/`\v`, and an optional capture tree that records every
//! nested capture instance.
//!
//! ## Quick Start
//!
//! ```rust
//! use nodechain::prelude::*;
//!
//! let re = Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap();
//! let m = re.find("Date: 2026-02-12").unwrap();
//! assert_eq!(m.as_str(), "2026-02-12");
//! assert_eq!(m.start(), 6);
//! ```
//!
//! For fine-grained control, use [`RegexBuilder`](api::RegexBuilder):
//!
//! ```rust
//! use nodechain::prelude::*;
//!
//! let re = Regex::builder(r"hello")
//!     .case_insensitive(true)
//!     .build()
//!     .unwrap();
//! assert!(re.is_match("Hello World"));
//! ```
//!
//! ## Matcher
//!
//! [`Matcher`](api::Matcher) works on UTF-16 units and exposes regions,
//! bounds and the `hit_end`/`require_end` signals:
//!
//! ```rust
//! use nodechain::prelude::*;
//!
//! let re = Regex::new(r"^\d+$").unwrap();
//! let text: Vec<u16> = "ab123cd".encode_utf16().collect();
//! let mut m = re.matcher(&text);
//! m.region(2, 5).unwrap();
//! assert!(m.matches());
//! assert!(m.hit_end());
//! ```
//!
//! ## Module Structure
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`regparse`] | Pattern parser |
//! | [`regparse_types`] | Pattern tree (Ast) |
//! | [`regcomp`] | Ast-to-node-chain compiler |
//! | [`regint`] | Node kinds, program, length analysis |
//! | [`regexec`] | Node interpreter and search strategies |
//! | [`region`] | Match spans and capture tree |
//! | [`regtrav`] | Capture tree traversal |
//! | [`regenc`] | UTF-16 helpers |
//! | [`unicode`] | Character classes and case folding |

#![allow(clippy::empty_line_after_doc_comments)]
// Enable #[coverage(off)] attribute when running under cargo-llvm-cov on nightly.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

/// Debug logging; a no-op unless the `logging` feature is on.
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

pub mod api;
pub mod error;
pub mod options;
pub mod prelude;
pub mod regcomp;
pub mod regenc;
pub mod regexec;
pub mod regint;
pub mod regparse;
pub mod regparse_types;
pub mod region;
pub mod regtrav;
pub mod unicode;

// api.rs - Idiomatic Rust API for nodechain.
//
// Wraps the compiler and the node chain matcher with Rust-native types:
// Regex, RegexBuilder, Match, Captures, FindIter over `&str`, and the
// Java-style Matcher over UTF-16 text.

use std::ops::Range;

use crate::error::RegexError;
use crate::options::Flags;
use crate::regcomp::{compile, compile_pattern};
use crate::regenc::{is_high_surrogate, is_low_surrogate, Utf16Text};
use crate::regexec::{self, MatchState};
use crate::regint::{AcceptMode, Program};
use crate::regparse_types::Ast;
use crate::region::{CaptureTree, Region};

/// A compiled regular expression.
///
/// # Examples
///
/// ```
/// use nodechain::api::Regex;
///
/// let re = Regex::new(r"\d+").unwrap();
/// assert!(re.is_match("hello 42"));
///
/// let m = re.find("hello 42").unwrap();
/// assert_eq!(m.as_str(), "42");
/// assert_eq!(m.start(), 6);
/// assert_eq!(m.end(), 8);
/// ```
pub struct Regex {
    prog: Program,
}

impl Regex {
    /// Compile a pattern with no flags set.
    pub fn new(pattern: &str) -> Result<Regex, RegexError> {
        Self::builder(pattern).build()
    }

    /// Create a [`RegexBuilder`] for fine-grained control over compilation.
    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder::new(pattern)
    }

    /// Compile a hand-built pattern tree. Capture groups must be numbered
    /// from 1 without gaps.
    pub fn from_ast(ast: &Ast, flags: Flags) -> Result<Regex, RegexError> {
        let prog = compile(ast, ast.max_group(), Vec::new(), flags)?;
        Ok(Regex { prog })
    }

    fn search_region(&self, text: &Utf16Text, from: usize) -> Option<Region> {
        let mut st = MatchState::new(&self.prog, text.len());
        regexec::search(&self.prog, text.units(), &mut st, from).then(|| st.region())
    }

    /// Return the first match in `text`, or `None` if no match.
    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        let utf16 = Utf16Text::new(text);
        let (beg, end) = self.search_region(&utf16, 0)?.span(0)?;
        Some(Match::new(text, &utf16, beg, end))
    }

    /// Check whether `text` matches the pattern anywhere.
    pub fn is_match(&self, text: &str) -> bool {
        let utf16 = Utf16Text::new(text);
        let mut st = MatchState::new(&self.prog, utf16.len());
        regexec::search(&self.prog, utf16.units(), &mut st, 0)
    }

    /// Return the first match with all capture groups, or `None`.
    pub fn captures<'t>(&'t self, text: &'t str) -> Option<Captures<'t>> {
        let utf16 = Utf16Text::new(text);
        let region = self.search_region(&utf16, 0)?;
        Some(Captures::new(text, &utf16, region, self))
    }

    /// Iterate over all non-overlapping matches in `text`.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> FindIter<'r, 't> {
        let utf16 = Utf16Text::new(text);
        let state = MatchState::new(&self.prog, utf16.len());
        FindIter {
            regex: self,
            text,
            utf16,
            state,
            next_start: 0,
        }
    }

    /// Return the number of capture groups in the pattern (excluding group 0).
    pub fn captures_len(&self) -> usize {
        self.prog.group_count() - 1
    }

    /// Named groups and their numbers, in definition order.
    pub fn group_names(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.prog.names().iter().map(|(n, g)| (n.as_str(), *g))
    }

    /// Create a [`Matcher`] over UTF-16 text.
    pub fn matcher<'r, 't>(&'r self, text: &'t [u16]) -> Matcher<'r, 't> {
        Matcher::new(self, text)
    }

    /// Access the compiled node chain.
    pub fn as_program(&self) -> &Program {
        &self.prog
    }
}

impl std::fmt::Debug for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Regex")
            .field("groups", &self.captures_len())
            .finish_non_exhaustive()
    }
}

// === RegexBuilder ===

/// Builder for compiling a [`Regex`] with custom options.
///
/// # Examples
///
/// ```
/// use nodechain::api::Regex;
///
/// let re = Regex::builder(r"hello world")
///     .case_insensitive(true)
///     .build()
///     .unwrap();
/// assert!(re.is_match("Hello World"));
/// ```
pub struct RegexBuilder {
    pattern: String,
    flags: Flags,
}

impl RegexBuilder {
    /// Create a new builder for the given pattern.
    pub fn new(pattern: &str) -> Self {
        RegexBuilder {
            pattern: pattern.to_owned(),
            flags: Flags::empty(),
        }
    }

    fn set(mut self, flag: Flags, yes: bool) -> Self {
        self.flags.set(flag, yes);
        self
    }

    /// Enable or disable case-insensitive matching.
    pub fn case_insensitive(self, yes: bool) -> Self {
        self.set(Flags::CASE_INSENSITIVE, yes)
    }

    /// Fold case with Unicode rules instead of ASCII only.
    pub fn unicode_case(self, yes: bool) -> Self {
        self.set(Flags::UNICODE_CASE, yes)
    }

    /// Enable or disable `.` matching line terminators.
    pub fn dot_matches_newline(self, yes: bool) -> Self {
        self.set(Flags::DOTALL, yes)
    }

    /// Enable or disable `^`/`$` matching at every line boundary.
    pub fn multi_line_anchors(self, yes: bool) -> Self {
        self.set(Flags::MULTILINE, yes)
    }

    /// Treat only `\n` as a line terminator.
    pub fn unix_lines(self, yes: bool) -> Self {
        self.set(Flags::UNIX_LINES, yes)
    }

    /// Enable or disable extended mode (whitespace and `#` comments ignored).
    pub fn extended(self, yes: bool) -> Self {
        self.set(Flags::COMMENTS, yes)
    }

    /// Match the pattern as literal text.
    pub fn literal(self, yes: bool) -> Self {
        self.set(Flags::LITERAL, yes)
    }

    /// Record the capture tree of every match.
    pub fn capture_tree(self, yes: bool) -> Self {
        self.set(Flags::CAPTURE_TREE, yes)
    }

    /// Run recursive calls against a fresh capture array.
    pub fn isolate_recursion(self, yes: bool) -> Self {
        self.set(Flags::ISOLATE_RECURSION, yes)
    }

    /// Set raw option flags.
    pub fn option(mut self, flags: Flags) -> Self {
        self.flags |= flags;
        self
    }

    /// Compile the pattern into a [`Regex`].
    pub fn build(self) -> Result<Regex, RegexError> {
        let prog = compile_pattern(&self.pattern, self.flags)?;
        Ok(Regex { prog })
    }
}

// === Match ===

/// A single match result referencing the original text.
#[derive(Debug, Clone, Copy)]
pub struct Match<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    fn new(text: &'t str, utf16: &Utf16Text, beg: usize, end: usize) -> Self {
        Match {
            text,
            start: utf16.byte_offset(beg),
            end: utf16.byte_offset(end),
        }
    }

    /// Byte offset of the start of the match.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset of the end of the match (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Byte range of the match.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The matched text.
    pub fn as_str(&self) -> &'t str {
        &self.text[self.start..self.end]
    }

    /// Returns the length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the match is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// === Captures ===

/// All capture groups from a single match.
///
/// Group 0 is the entire match. Groups 1..N correspond to `(...)` in the pattern.
pub struct Captures<'t> {
    text: &'t str,
    /// Spans in bytes.
    region: Region,
    regex: &'t Regex,
}

impl<'t> Captures<'t> {
    fn new(text: &'t str, utf16: &Utf16Text, mut region: Region, regex: &'t Regex) -> Self {
        for (b, e) in region.beg.iter_mut().zip(region.end.iter_mut()) {
            if *b >= 0 {
                *b = utf16.byte_offset(*b as usize) as i32;
                *e = utf16.byte_offset(*e as usize) as i32;
            }
        }
        if let Some(tree) = region.tree.as_mut() {
            tree.map_spans(|i| utf16.byte_offset(i));
        }
        Captures {
            text,
            region,
            regex,
        }
    }

    /// Get capture group `i`, or `None` if the group did not participate.
    ///
    /// Group 0 is the entire match.
    pub fn get(&self, i: usize) -> Option<Match<'t>> {
        let (start, end) = self.region.span(i)?;
        Some(Match {
            text: self.text,
            start,
            end,
        })
    }

    /// Get the capture group with the given name, or `None`.
    pub fn name(&self, name: &str) -> Option<Match<'t>> {
        self.get(self.regex.prog.name_to_group(name)?)
    }

    /// Number of capture groups (including group 0).
    pub fn len(&self) -> usize {
        self.region.len()
    }

    /// Returns `true` if there are no capture groups (should never happen for a valid match).
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Iterate over all capture groups.
    pub fn iter(&self) -> CapturesIter<'_, 't> {
        CapturesIter {
            captures: self,
            index: 0,
        }
    }

    /// Capture tree with byte offsets, if the regex records one.
    pub fn tree(&self) -> Option<&CaptureTree> {
        self.region.tree.as_ref()
    }
}

impl std::fmt::Debug for Captures<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for i in 0..self.len() {
            list.entry(&self.get(i));
        }
        list.finish()
    }
}

// === CapturesIter ===

/// Iterator over capture groups in a [`Captures`].
pub struct CapturesIter<'c, 't> {
    captures: &'c Captures<'t>,
    index: usize,
}

impl<'c, 't> Iterator for CapturesIter<'c, 't> {
    type Item = Option<Match<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.captures.len() {
            return None;
        }
        let m = self.captures.get(self.index);
        self.index += 1;
        Some(m)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.captures.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CapturesIter<'_, '_> {}

// === FindIter ===

/// Units to skip after an empty match at `i`: a whole surrogate pair or
/// a single unit.
fn empty_match_step(text: &[u16], i: usize) -> usize {
    if i + 1 < text.len() && is_high_surrogate(text[i]) && is_low_surrogate(text[i + 1]) {
        2
    } else {
        1
    }
}

/// Iterator over all non-overlapping matches in a text.
pub struct FindIter<'r, 't> {
    regex: &'r Regex,
    text: &'t str,
    utf16: Utf16Text,
    state: MatchState,
    next_start: usize,
}

impl<'r, 't> Iterator for FindIter<'r, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Match<'t>> {
        if self.next_start > self.utf16.len() {
            return None;
        }
        let prog = &self.regex.prog;
        if !regexec::search(prog, self.utf16.units(), &mut self.state, self.next_start) {
            self.next_start = self.utf16.len() + 1;
            return None;
        }
        let (beg, end) = (self.state.first, self.state.last);
        // An empty match must not be found again at the same place.
        self.next_start = if beg == end {
            end + empty_match_step(self.utf16.units(), end)
        } else {
            end
        };
        Some(Match::new(self.text, &self.utf16, beg, end))
    }
}

// === Matcher ===

/// Stateful matcher over UTF-16 text with a settable region.
///
/// Offsets are UTF-16 unit indices.
///
/// ```
/// use nodechain::api::Regex;
///
/// let re = Regex::new("a+").unwrap();
/// let text: Vec<u16> = "xaay".encode_utf16().collect();
/// let mut m = re.matcher(&text);
/// assert!(m.find());
/// assert_eq!((m.start(), m.end()), (Some(1), Some(3)));
/// assert!(!m.find());
/// ```
pub struct Matcher<'r, 't> {
    regex: &'r Regex,
    text: &'t [u16],
    state: MatchState,
    from: usize,
    to: usize,
    anchoring_bounds: bool,
    transparent_bounds: bool,
    /// Start of the last match, `None` after a failed attempt.
    first: Option<usize>,
    /// End of the last successful match.
    last: usize,
    result: Option<Region>,
}

impl<'r, 't> Matcher<'r, 't> {
    fn new(regex: &'r Regex, text: &'t [u16]) -> Self {
        Matcher {
            regex,
            text,
            state: MatchState::new(&regex.prog, text.len()),
            from: 0,
            to: text.len(),
            anchoring_bounds: true,
            transparent_bounds: false,
            first: None,
            last: 0,
            result: None,
        }
    }

    /// Forget any match and reset the region to the whole text.
    pub fn reset(&mut self) -> &mut Self {
        self.first = None;
        self.last = 0;
        self.result = None;
        self.from = 0;
        self.to = self.text.len();
        self.state.hit_end = false;
        self.state.require_end = false;
        self
    }

    /// Restrict matching to `start..end`. Resets the matcher.
    pub fn region(&mut self, start: usize, end: usize) -> Result<&mut Self, RegexError> {
        if start > end || end > self.text.len() {
            return Err(RegexError::InvalidRegion { start, end });
        }
        self.reset();
        self.from = start;
        self.to = end;
        Ok(self)
    }

    pub fn region_start(&self) -> usize {
        self.from
    }

    pub fn region_end(&self) -> usize {
        self.to
    }

    /// With anchoring bounds, `^`, `$`, `\A` and `\z` see the region
    /// edges as the text edges. On by default.
    pub fn use_anchoring_bounds(&mut self, yes: bool) -> &mut Self {
        self.anchoring_bounds = yes;
        self
    }

    pub fn has_anchoring_bounds(&self) -> bool {
        self.anchoring_bounds
    }

    /// With transparent bounds, lookaround and `\b` may look past the
    /// region. Off by default.
    pub fn use_transparent_bounds(&mut self, yes: bool) -> &mut Self {
        self.transparent_bounds = yes;
        self
    }

    pub fn has_transparent_bounds(&self) -> bool {
        self.transparent_bounds
    }

    fn load_bounds(&mut self) {
        self.state.from = self.from;
        self.state.to = self.to;
        self.state.anchoring_bounds = self.anchoring_bounds;
        self.state.transparent_bounds = self.transparent_bounds;
    }

    fn finish(&mut self, found: bool) -> bool {
        if found {
            self.first = Some(self.state.first);
            self.last = self.state.last;
            self.result = Some(self.state.region());
        } else {
            self.first = None;
            self.result = None;
        }
        found
    }

    fn search(&mut self, from: usize) -> bool {
        self.load_bounds();
        let found = regexec::search(&self.regex.prog, self.text, &mut self.state, from);
        self.finish(found)
    }

    fn match_from(&mut self, mode: AcceptMode) -> bool {
        self.load_bounds();
        let found = regexec::match_at(&self.regex.prog, self.text, &mut self.state, self.from, mode);
        self.finish(found)
    }

    /// Find the next match after the previous one.
    pub fn find(&mut self) -> bool {
        let mut next = self.last;
        if Some(next) == self.first {
            next += empty_match_step(self.text, next);
        }
        if next < self.from {
            next = self.from;
        }
        if next > self.to {
            self.result = None;
            self.first = None;
            return false;
        }
        self.search(next)
    }

    /// Reset, then find the first match starting at or after `start`.
    pub fn find_at(&mut self, start: usize) -> Result<bool, RegexError> {
        if start > self.text.len() {
            return Err(RegexError::InvalidArgument);
        }
        self.reset();
        Ok(self.search(start))
    }

    /// Match the entire region.
    pub fn matches(&mut self) -> bool {
        self.match_from(AcceptMode::End)
    }

    /// Match a prefix of the region.
    pub fn looking_at(&mut self) -> bool {
        self.match_from(AcceptMode::Anywhere)
    }

    /// The last attempt read the end of the region.
    pub fn hit_end(&self) -> bool {
        self.state.hit_end
    }

    /// More input could turn the last match into a non-match.
    pub fn require_end(&self) -> bool {
        self.state.require_end
    }

    pub fn start(&self) -> Option<usize> {
        self.group(0).map(|(b, _)| b)
    }

    pub fn end(&self) -> Option<usize> {
        self.group(0).map(|(_, e)| e)
    }

    /// Span of `group` in the last match.
    pub fn group(&self, group: usize) -> Option<(usize, usize)> {
        self.result.as_ref()?.span(group)
    }

    /// Number of capture groups, not counting group 0.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len()
    }

    /// Capture tree of the last match, in UTF-16 units.
    pub fn capture_tree(&self) -> Option<&CaptureTree> {
        self.result.as_ref()?.tree.as_ref()
    }

    /// Spans of the last match.
    pub fn to_region(&self) -> Option<&Region> {
        self.result.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_new_and_find() {
        let re = Regex::new(r"\d+").unwrap();
        let m = re.find("hello 42 world").unwrap();
        assert_eq!(m.as_str(), "42");
        assert_eq!(m.start(), 6);
        assert_eq!(m.end(), 8);
        assert_eq!(m.range(), 6..8);
        assert_eq!(m.len(), 2);
        assert!(!m.is_empty());
    }

    #[test]
    fn regex_no_match() {
        let re = Regex::new(r"\d+").unwrap();
        assert!(re.find("no digits here").is_none());
    }

    #[test]
    fn regex_captures() {
        let re = Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap();
        let caps = re.captures("date: 2026-02-14").unwrap();
        assert_eq!(caps.get(0).unwrap().as_str(), "2026-02-14");
        assert_eq!(caps.get(1).unwrap().as_str(), "2026");
        assert_eq!(caps.get(3).unwrap().as_str(), "14");
        assert!(caps.get(4).is_none());
        assert_eq!(caps.len(), 4);
    }

    #[test]
    fn byte_offsets_for_non_ascii() {
        let re = Regex::new("b+").unwrap();
        let m = re.find("é\u{1F600}bb").unwrap();
        assert_eq!(m.start(), 6);
        assert_eq!(m.as_str(), "bb");
    }

    #[test]
    fn find_iter_steps_over_empty_matches() {
        let re = Regex::new(r"").unwrap();
        let starts: Vec<_> = re.find_iter("a\u{1F600}").map(|m| m.start()).collect();
        assert_eq!(starts, vec![0, 1, 5]);
    }

    #[test]
    fn builder_flags() {
        let re = Regex::builder("a.c").dot_matches_newline(true).build().unwrap();
        assert!(re.is_match("a\nc"));
        let re = Regex::builder("a.c").build().unwrap();
        assert!(!re.is_match("a\nc"));
        let re = Regex::builder("a+b").literal(true).build().unwrap();
        assert!(re.is_match("xa+b"));
        assert!(!re.is_match("aab"));
    }

    #[test]
    fn group_names_in_order() {
        let re = Regex::new(r"(?<y>\d+)-(?<m>\d+)").unwrap();
        let names: Vec<_> = re.group_names().collect();
        assert_eq!(names, vec![("y", 1), ("m", 2)]);
    }

    #[test]
    fn matcher_region_validation() {
        let re = Regex::new("a").unwrap();
        let text: Vec<u16> = "aaa".encode_utf16().collect();
        let mut m = re.matcher(&text);
        assert_eq!(
            m.region(2, 1).err(),
            Some(RegexError::InvalidRegion { start: 2, end: 1 })
        );
        assert!(m.region(1, 3).is_ok());
        assert_eq!(m.region_start(), 1);
        assert_eq!(m.find_at(9), Err(RegexError::InvalidArgument));
    }
}

// api_test.rs - Integration tests for the idiomatic Rust API.

use nodechain::api::{Regex, RegexBuilder};
use nodechain::error::RegexError;
use nodechain::prelude::*;

fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

// === Regex::new ===

#[test]
fn simple_pattern() {
    let re = Regex::new(r"\d+").unwrap();
    let m = re.find("abc 123 def").unwrap();
    assert_eq!(m.as_str(), "123");
}

#[test]
fn unicode_property_pattern() {
    let re = Regex::new(r"\p{L}+").unwrap();
    let m = re.find("123 grüße 456").unwrap();
    assert_eq!(m.as_str(), "grüße");
}

#[test]
fn no_match_returns_none() {
    let re = Regex::new(r"xyz").unwrap();
    assert!(re.find("abc").is_none());
}

#[test]
fn empty_pattern() {
    let re = Regex::new(r"").unwrap();
    let m = re.find("hello").unwrap();
    assert_eq!(m.start(), 0);
    assert_eq!(m.end(), 0);
    assert!(m.is_empty());
}

#[test]
fn invalid_pattern_syntax_error() {
    let err = Regex::new(r"(unclosed").unwrap_err();
    match err {
        RegexError::Syntax { code, .. } => assert!(code < 0),
        other => panic!("expected Syntax error, got {:?}", other),
    }
}

#[test]
fn invalid_repeat_range() {
    let err = Regex::new(r"a{3,1}").unwrap_err();
    assert_eq!(err, RegexError::InvalidRepeatRange { min: 3, max: 1 });
}

#[test]
fn unbounded_lookbehind_rejected() {
    let err = Regex::new(r"(?<=a*)b").unwrap_err();
    assert_eq!(err, RegexError::UnboundedLookbehind);
}

#[test]
fn undefined_references_rejected() {
    assert_eq!(Regex::new(r"(a)\2").unwrap_err(), RegexError::InvalidBackref(2));
    assert_eq!(Regex::new(r"(?2)(a)").unwrap_err(), RegexError::UndefinedGroupCall(2));
    assert!(matches!(
        Regex::new(r"(?&missing)").unwrap_err(),
        RegexError::UndefinedGroupName(_)
    ));
}

// === Regex::is_match ===

#[test]
fn is_match_true() {
    let re = Regex::new(r"world").unwrap();
    assert!(re.is_match("hello world"));
}

#[test]
fn is_match_false() {
    let re = Regex::new(r"^world").unwrap();
    assert!(!re.is_match("hello world"));
}

// === Regex::captures ===

#[test]
fn captures_numbered() {
    let re = Regex::new(r"(\w+)@(\w+)\.com").unwrap();
    let caps = re.captures("mail: user@example.com").unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "user@example.com");
    assert_eq!(caps.get(1).unwrap().as_str(), "user");
    assert_eq!(caps.get(2).unwrap().as_str(), "example");
    assert_eq!(caps.len(), 3);
}

#[test]
fn captures_named() {
    let re = Regex::new(r"(?<year>\d{4})-(?<month>\d{2})").unwrap();
    let caps = re.captures("on 2026-10").unwrap();
    assert_eq!(caps.name("year").unwrap().as_str(), "2026");
    assert_eq!(caps.name("month").unwrap().as_str(), "10");
    assert!(caps.name("day").is_none());
}

#[test]
fn captures_python_style_names() {
    let re = Regex::new(r"(?P<word>[a-z]+) (?P=word)").unwrap();
    let caps = re.captures("say hello hello").unwrap();
    assert_eq!(caps.name("word").unwrap().as_str(), "hello");
}

#[test]
fn captures_unmatched_group() {
    let re = Regex::new(r"(a)|(b)").unwrap();
    let caps = re.captures("b").unwrap();
    assert!(caps.get(1).is_none());
    assert_eq!(caps.get(2).unwrap().as_str(), "b");
}

#[test]
fn captures_iter() {
    let re = Regex::new(r"(a)(x)?(c)").unwrap();
    let caps = re.captures("ac").unwrap();
    let groups: Vec<_> = caps.iter().map(|m| m.map(|m| m.as_str())).collect();
    assert_eq!(groups, vec![Some("ac"), Some("a"), None, Some("c")]);
    assert_eq!(caps.iter().len(), 4);
}

#[test]
fn captures_len_counts_groups() {
    let re = Regex::new(r"(a)(?:b)(c)").unwrap();
    assert_eq!(re.captures_len(), 2);
}

// === Regex::find_iter ===

#[test]
fn find_iter_words() {
    let re = Regex::new(r"\w+").unwrap();
    let words: Vec<&str> = re.find_iter("one two  three").map(|m| m.as_str()).collect();
    assert_eq!(words, vec!["one", "two", "three"]);
}

#[test]
fn find_iter_empty_matches() {
    let re = Regex::new(r"x*").unwrap();
    let spans: Vec<_> = re.find_iter("axxb").map(|m| (m.start(), m.end())).collect();
    assert_eq!(spans, vec![(0, 0), (1, 3), (3, 3), (4, 4)]);
}

#[test]
fn find_iter_non_ascii_offsets() {
    let re = Regex::new(r"é+").unwrap();
    let spans: Vec<_> = re.find_iter("aéé b é").map(|m| m.range()).collect();
    assert_eq!(spans, vec![1..5, 8..10]);
}

// === RegexBuilder ===

#[test]
fn builder_case_insensitive() {
    let re = RegexBuilder::new("hello").case_insensitive(true).build().unwrap();
    assert!(re.is_match("HeLLo"));
}

#[test]
fn builder_unicode_case() {
    let re = Regex::builder("é").case_insensitive(true).build().unwrap();
    assert!(!re.is_match("É"));
    let re = Regex::builder("é")
        .case_insensitive(true)
        .unicode_case(true)
        .build()
        .unwrap();
    assert!(re.is_match("É"));
}

#[test]
fn builder_multi_line() {
    let re = Regex::builder(r"^b$").multi_line_anchors(true).build().unwrap();
    assert!(re.is_match("a\nb\nc"));
    let re = Regex::new(r"^b$").unwrap();
    assert!(!re.is_match("a\nb\nc"));
}

#[test]
fn builder_extended() {
    let re = Regex::builder("a b c # comment").extended(true).build().unwrap();
    assert_eq!(re.find("xabc").unwrap().as_str(), "abc");
}

#[test]
fn builder_unix_lines() {
    let re = Regex::builder(r"a.b").unix_lines(true).build().unwrap();
    assert!(re.is_match("a\rb"));
    let re = Regex::new(r"a.b").unwrap();
    assert!(!re.is_match("a\rb"));
}

#[test]
fn inline_flags() {
    let re = Regex::new(r"(?i)abc(?-i)D").unwrap();
    assert!(re.is_match("ABCD"));
    assert!(!re.is_match("ABCd"));
    let re = Regex::new(r"a(?s:.)b").unwrap();
    assert!(re.is_match("a\nb"));
}

#[test]
fn builder_option_raw_flags() {
    let re = Regex::builder("a.b")
        .option(Flags::DOTALL | Flags::CASE_INSENSITIVE)
        .build()
        .unwrap();
    assert!(re.is_match("A\nB"));
}

// === Matcher ===

#[test]
fn matcher_find_sequence() {
    let re = Regex::new(r"\d+").unwrap();
    let text = utf16("a1 22 333");
    let mut m = re.matcher(&text);
    let mut spans = Vec::new();
    while m.find() {
        spans.push((m.start().unwrap(), m.end().unwrap()));
    }
    assert_eq!(spans, vec![(1, 2), (3, 5), (6, 9)]);
    assert!(m.start().is_none());
}

#[test]
fn matcher_matches_and_looking_at() {
    let re = Regex::new(r"a+").unwrap();
    let text = utf16("aab");
    let mut m = re.matcher(&text);
    assert!(!m.matches());
    assert!(m.looking_at());
    assert_eq!(m.end(), Some(2));
}

#[test]
fn matcher_groups_in_units() {
    let re = Regex::new("(\u{1F600})(x)").unwrap();
    let text = utf16("a\u{1F600}x");
    let mut m = re.matcher(&text);
    assert!(m.find());
    assert_eq!(m.group(1), Some((1, 3)));
    assert_eq!(m.group(2), Some((3, 4)));
    assert_eq!(m.group_count(), 2);
}

#[test]
fn matcher_find_at_resets() {
    let re = Regex::new("a").unwrap();
    let text = utf16("aaa");
    let mut m = re.matcher(&text);
    m.region(0, 1).unwrap();
    assert_eq!(m.find_at(2), Ok(true));
    assert_eq!(m.start(), Some(2));
    assert_eq!(m.region_end(), 3);
}

#[test]
fn matcher_reset_starts_over() {
    let re = Regex::new("a").unwrap();
    let text = utf16("aa");
    let mut m = re.matcher(&text);
    assert!(m.find());
    assert!(m.find());
    assert!(!m.find());
    m.reset();
    assert!(m.find());
    assert_eq!(m.start(), Some(0));
}

// === Debug ===

#[test]
fn regex_debug_format() {
    let re = Regex::new(r"(a)(b)").unwrap();
    let dbg = format!("{:?}", re);
    assert!(dbg.contains("Regex"));
}

#[test]
fn captures_debug_format() {
    let re = Regex::new(r"(a)").unwrap();
    let caps = re.captures("a").unwrap();
    assert!(format!("{:?}", caps).contains("Match"));
}

// compat_match.rs - End-to-end matching tests.
//
// Same harness shape as the classic regex suites:
//   x2(pattern, string, from, to)       -> search, expect match at from..to
//   x3(pattern, string, from, to, mem)   -> search, expect capture group mem at from..to
//   n(pattern, string)                    -> search, expect no match
//
// Offsets are UTF-16 units.

use nodechain::api::Regex;
use nodechain::options::Flags;

fn compile(pattern: &str, flags: Flags) -> Regex {
    Regex::builder(pattern)
        .option(flags)
        .build()
        .unwrap_or_else(|e| panic!("compile failed for {:?}: {}", pattern, e))
}

fn search(pattern: &str, input: &str, flags: Flags, mem: usize) -> Option<(usize, usize)> {
    let re = compile(pattern, flags);
    let text: Vec<u16> = input.encode_utf16().collect();
    let mut m = re.matcher(&text);
    if m.find() {
        m.group(mem)
    } else {
        None
    }
}

fn x2(pattern: &str, input: &str, from: usize, to: usize) {
    x3(pattern, input, from, to, 0);
}

fn x3(pattern: &str, input: &str, from: usize, to: usize, mem: usize) {
    let re = compile(pattern, Flags::empty());
    let text: Vec<u16> = input.encode_utf16().collect();
    let mut m = re.matcher(&text);
    assert!(
        m.find(),
        "x3: expected match for {:?} against {:?}",
        pattern,
        input
    );
    assert_eq!(
        m.group(mem),
        Some((from, to)),
        "x3: wrong span of group {} for {:?} against {:?}",
        mem,
        pattern,
        input
    );
}

fn n(pattern: &str, input: &str) {
    assert_eq!(
        search(pattern, input, Flags::empty(), 0),
        None,
        "n: expected no match for {:?} against {:?}",
        pattern,
        input
    );
}

// === Literals and classes ===

#[test]
fn literals() {
    x2("", "", 0, 0);
    x2("a", "a", 0, 1);
    x2("abc", "xxabc", 2, 5);
    x2("abcdefgh", "zzzabcdefgh", 3, 11);
    n("abcd", "abcabd");
    x2(r"\Qa.b\E+", "a.bb", 0, 4);
    x2(r"\x41B\t", "AB\t", 0, 3);
    x2(r"\cA", "\u{1}", 0, 1);
}

#[test]
fn char_classes() {
    x2("[a-c]+", "xxbcaz", 2, 5);
    x2("[^a-c]", "abcd", 3, 4);
    x2(r"[\d_]+", "ab_12", 2, 5);
    x2("[a-z&&[^aeiou]]+", "aebcd", 2, 5);
    x2("[abc[x-z]]+", "wxcaz", 1, 5);
    n("[^a]", "a");
    x2(r"\w+", "  ab1_ ", 2, 6);
    x2(r"\s", "a b", 1, 2);
    x2(r"\h\v", "a \n", 1, 3);
    x2(r"\p{Lu}+", "abCDe", 2, 4);
    x2(r"\P{Digit}", "12a", 2, 3);
    x2(r"\p{Alpha}", "1b", 1, 2);
}

#[test]
fn dot_and_line_terminators() {
    x2(".", "\na", 1, 2);
    n(".", "\r\n\u{2028}\u{85}");
    x2("a.c", "a\u{1F600}c", 0, 4);
    x2(r"\R", "a\r\nb", 1, 3);
    x2(r"\R\n", "\r\n\n", 0, 3);
    n(r"\R\n", "\r\n");
}

#[test]
fn supplementary_characters() {
    x2("\u{1F600}+", "a\u{1F600}\u{1F600}b", 1, 5);
    x2("[\u{1F600}-\u{1F64F}]", "x\u{1F610}", 1, 3);
    n("[^a]", "a");
    x2("[^a]", "\u{1F600}", 0, 2);
}

// === Anchors ===

#[test]
fn anchors() {
    x2("^a", "a\na", 0, 1);
    n("^b", "a\nb");
    x2("a$", "a\n", 0, 1);
    x2("a$", "a\r\n", 0, 1);
    n(r"a\z", "a\n");
    x2(r"a\Z", "a\n", 0, 1);
    x2(r"\Aab", "ab", 0, 2);
    x2(r"\bfoo\b", "a foo b", 2, 5);
    n(r"\bfoo\b", "afoo");
    x2(r"\Boo", "foo", 1, 3);
}

#[test]
fn multiline_anchors() {
    let re = compile("^a+$", Flags::MULTILINE);
    let text: Vec<u16> = "aaa\naa".encode_utf16().collect();
    let mut m = re.matcher(&text);
    assert!(m.find());
    assert_eq!((m.start(), m.end()), (Some(0), Some(3)));
    assert!(m.find());
    assert_eq!((m.start(), m.end()), (Some(4), Some(6)));
    assert!(!m.find());
}

#[test]
fn multiline_caret_not_after_final_terminator() {
    let re = compile("^", Flags::MULTILINE);
    let text: Vec<u16> = "a\n".encode_utf16().collect();
    let mut m = re.matcher(&text);
    assert!(m.find());
    assert_eq!(m.start(), Some(0));
    assert!(!m.find());
}

// === Quantifiers ===

#[test]
fn greedy_lazy_possessive() {
    x2("a*", "aaa", 0, 3);
    x2("a*?", "aaa", 0, 0);
    x2("a+?", "aaa", 0, 1);
    x2("a{2,3}", "aaaa", 0, 3);
    x2("a{2,3}?", "aaaa", 0, 2);
    x2("a{2}", "aaa", 0, 2);
    x2("a{2,}", "aaaaa", 0, 5);
    x2("a?b", "ab", 0, 2);
    x2("a*+b", "aab", 0, 3);
    n("a*+a", "aaa");
    n("a++a", "aaa");
    x2("(?:ab)*c", "ababc", 0, 5);
    x2("(?:ab)*?c", "ababc", 0, 5);
    x2("(?:a|b)*+c", "abbac", 0, 5);
    x2("a{0}b", "ab", 1, 2);
    x2("x{1,1}", "x", 0, 1);
}

#[test]
fn atomic_groups() {
    n("(?>a+)a", "aaa");
    x2("a+a", "aaa", 0, 3);
    x2("(?>a|ab)c", "ac", 0, 2);
    n("(?>a|ab)c", "abc");
}

#[test]
fn zero_width_iterations_stop() {
    x2("(?:a*)*b", "aab", 0, 3);
    x2("(?:a?)+", "aa", 0, 2);
    x2("(?:)*x", "x", 0, 1);
    x2("(?:\\b)*a", "a", 0, 1);
    x3("(a*)*", "b", 0, 0, 1);
    x3("(a|)+b", "aab", 2, 2, 1);
}

#[test]
fn counted_group_repeats() {
    x3("(ab){2}", "ababab", 2, 4, 1);
    x3("(a|b){3,}", "abba", 3, 4, 1);
    x3("(a)+?b", "aab", 1, 2, 1);
    x3("(?:(a)|b)+", "ab", 0, 1, 1);
}

// === Alternation ===

#[test]
fn alternation() {
    x2("a|b", "b", 0, 1);
    x2("ab|a", "ab", 0, 2);
    x2("a|ab", "ab", 0, 1);
    x2("|a", "a", 0, 0);
    x2("(?:a|)b", "b", 0, 1);
    x3("(?:(a)|(b))c", "bc", 0, 1, 2);
}

// === Captures and back references ===

#[test]
fn captures() {
    x3("(a)(b)", "ab", 0, 1, 1);
    x3("(a)(b)", "ab", 1, 2, 2);
    x3("((a)b)", "ab", 0, 1, 2);
    x3("(a)*", "aaa", 2, 3, 1);
    x3("(?<n>x)", "ax", 1, 2, 1);
}

#[test]
fn back_references() {
    x2(r"(a+)b\1", "aaba", 1, 4);
    n(r"(a)\1", "ab");
    x2(r"(?i)(a)\1", "aA", 0, 2);
    x2(r"(?<w>\w)\k<w>", "abb", 1, 3);
    x2(r"(é)(?iu)\1", "éÉ", 0, 2);
    n(r"(?:(a)|b)\1", "b");
    x2(r"(a)\10", "aa0", 0, 3);
}

// === Lookaround ===

#[test]
fn lookahead() {
    x2("a(?=b)", "ab", 0, 1);
    n("a(?=b)", "ac");
    x2("a(?!b)", "abac", 2, 3);
    x3("(?=(a))a", "a", 0, 1, 1);
    x2("(?=a)*a", "a", 0, 1);
}

#[test]
fn lookbehind() {
    x2(r"(?<=\d{3})foo", "123foo", 3, 6);
    n(r"(?<=\d{3})foo", "12foo");
    x2("(?<=a|bc)x", "bcx", 2, 3);
    x2("(?<!a)x", "axbx", 3, 4);
    n("(?<!a)x", "ax");
    x2("(?<=a{1,3})b", "aab", 2, 3);
    x2("(?<=\u{1F600})x", "\u{1F600}x", 2, 3);
    n("(?<!\u{1F600})x", "\u{1F600}x");
    x2("(?<=^)a", "a", 0, 1);
}

#[test]
fn lookbehind_captures() {
    x3("(?<=(a|bc))x", "bcx", 0, 2, 1);
    x3("(?<=(a|bc))x", "ax", 0, 1, 1);
    x3("(?<=(\u{1F600}|b))x", "\u{1F600}x", 0, 2, 1);
    x3("(?<=(\u{1F600}|b))x", "bx", 0, 1, 1);
    // A negative lookbehind never leaves captures.
    x2("(?<!(\u{1F600}))x", "ax", 1, 2);
    assert_eq!(search("(?<!(\u{1F600}))x", "ax", Flags::empty(), 1), None);
}

#[test]
fn lookbehind_captures_roll_back() {
    let cases = [
        ("(?<=(a))b(?!)|(c)", "abc", (2, 3)),
        ("(?<=(\u{1F600}))b(?!)|(c)", "\u{1F600}bc", (3, 4)),
        ("(?<!(\u{1F600}))b(?!)|(c)", "abc", (2, 3)),
    ];
    for (pattern, input, span) in cases {
        x2(pattern, input, span.0, span.1);
        assert_eq!(search(pattern, input, Flags::empty(), 1), None, "{pattern}");
        assert_eq!(search(pattern, input, Flags::empty(), 2), Some(span), "{pattern}");
    }
}

// === Conditionals ===

#[test]
fn conditionals() {
    x2(r"(<)?a(?(1)>)", "<a>", 0, 3);
    x2(r"(<)?a(?(1)>)", "a>", 0, 1);
    x2(r"(?:(x)|y)(?(1)a|b)", "yb", 0, 2);
    n(r"(?:(x)|y)(?(1)a|b)", "ya");
    x2(r"(?<q>')?v(?(<q>)')", "'v'", 0, 3);
}

// === Recursion ===

#[test]
fn recursion() {
    x2(r"\((?:[^()]|(?R))*\)", "x(a(b)c)", 1, 8);
    x2(r"(a(?1)?b)", "aaabbb", 0, 6);
    x2(r"(?<p>a(?&p)?b)", "xaabb", 1, 5);
    x2(r"(?P<p>a(?P>p)?b)", "ab", 0, 2);
    x2(r"(a)(?-1)", "aa", 0, 2);
    x2(r"(?+1)(a)", "aa", 0, 2);
    n(r"^(a(?1)?b)$", "aab");
}

#[test]
fn recursion_captures() {
    x3(r"(a(?1)?b)", "aabb", 0, 4, 1);
    // The called group keeps the span of its last call.
    x3(r"(a)(?1)", "aa", 1, 2, 1);
}

// === Case folding ===

#[test]
fn case_insensitive() {
    x2("(?i)abc", "xABC", 1, 4);
    x2("(?i)[a-c]+", "CbA", 0, 3);
    n("(?i)é", "É");
    x2("(?iu)é", "É", 0, 1);
    x2("(?iu)\u{212A}", "k", 0, 1);
    x2("(?i)abcd", "xxABCD", 2, 6);
}

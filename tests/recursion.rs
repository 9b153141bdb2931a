// recursion.rs - Recursive calls, progress guards and isolation.

use nodechain::api::Regex;

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn find(re: &Regex, input: &str) -> Option<(usize, usize)> {
    let text = units(input);
    let mut m = re.matcher(&text);
    if m.find() {
        m.group(0)
    } else {
        None
    }
}

#[test]
fn balanced_parentheses() {
    let re = Regex::new(r"^(\((?1)*\))+$").unwrap();
    assert!(re.is_match("()"));
    assert!(re.is_match("(())()"));
    assert!(re.is_match("((()()))"));
    assert!(!re.is_match("(()"));
    assert!(!re.is_match("())"));
}

#[test]
fn whole_pattern_recursion() {
    let re = Regex::new(r"a(?R)?b").unwrap();
    assert_eq!(find(&re, "xaaabbby"), Some((1, 7)));
    assert_eq!(find(&re, "aab"), Some((1, 3)));
}

#[test]
fn two_independent_recursive_groups() {
    let re = Regex::new(r"(?<p>\((?&p)*\))(?<b>\[(?&b)*\])").unwrap();
    assert_eq!(find(&re, "x(())[[]]"), Some((1, 9)));
    let caps = re.captures("(())[[]]").unwrap();
    assert_eq!(caps.name("p").unwrap().as_str(), "(())");
    assert_eq!(caps.name("b").unwrap().as_str(), "[[]]");
    assert!(!re.is_match("(([[]]"));
    assert_eq!(find(&re, "(()[[]]"), Some((1, 7)));
}

#[test]
fn recursion_inside_counted_loop() {
    let re = Regex::new(r"^(?:(a(?1)?b)){2}$").unwrap();
    assert!(re.is_match("abaabb"));
    assert!(!re.is_match("ab"));
    assert!(!re.is_match("abab ab"));
}

#[test]
fn left_recursion_terminates() {
    let re = Regex::new(r"(?<e>(?&e)x|a)").unwrap();
    assert_eq!(find(&re, "a"), Some((0, 1)));
    assert_eq!(find(&re, "axx"), Some((0, 2)));
    assert_eq!(find(&re, "bbb"), None);
}

#[test]
fn mutual_recursion() {
    let re = Regex::new(r"^(?<a>x(?&b)?)(?<b>y(?&a)?)?$").unwrap();
    assert!(re.is_match("x"));
    assert!(re.is_match("xyxy"));
    assert!(!re.is_match("xx"));
}

#[test]
fn shared_captures_by_default() {
    // The callee sees group 1 set by the outer match.
    let re = Regex::new(r"(?<c>c)?(?<g>(?(c)C|g))(?&g)").unwrap();
    assert_eq!(find(&re, "cCC"), Some((0, 3)));
    assert_eq!(find(&re, "cCg"), None);
}

#[test]
fn isolated_recursion_hides_outer_captures() {
    let re = Regex::builder(r"(?<c>c)?(?<g>(?(c)C|g))(?&g)")
        .isolate_recursion(true)
        .build()
        .unwrap();
    assert_eq!(find(&re, "cCg"), Some((0, 3)));
    assert_eq!(find(&re, "cCC"), None);
}

#[test]
fn isolated_recursion_keeps_outer_groups_after_return() {
    let re = Regex::builder(r"(x)(?<g>a)(?&g)")
        .isolate_recursion(true)
        .build()
        .unwrap();
    let caps = re.captures("xaa").unwrap();
    assert_eq!(caps.get(1).unwrap().range(), 0..1);
    assert_eq!(caps.get(2).unwrap().range(), 2..3);
}

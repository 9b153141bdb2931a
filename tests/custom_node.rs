// custom_node.rs - User-defined nodes spliced into the chain.

use std::sync::Arc;

use nodechain::api::Regex;
use nodechain::options::Flags;
use nodechain::regexec::CustomContext;
use nodechain::regint::{CustomNode, RepeatKind, TreeInfo};
use nodechain::regparse_types::Ast;

/// One ASCII vowel.
#[derive(Debug)]
struct Vowel;

impl CustomNode for Vowel {
    fn study(&self, info: &mut TreeInfo) {
        info.min_length += 1;
        info.max_length += 1;
    }

    fn match_at(&self, cx: &mut CustomContext<'_, '_>, pos: usize) -> bool {
        if pos >= cx.to() {
            cx.set_hit_end();
            return false;
        }
        let c = cx.text()[pos];
        matches!(c, 0x61 | 0x65 | 0x69 | 0x6F | 0x75) && cx.next(pos + 1)
    }
}

/// Zero-width; succeeds only the first time it runs in a match attempt.
#[derive(Debug)]
struct Once;

impl CustomNode for Once {
    fn match_at(&self, cx: &mut CustomContext<'_, '_>, pos: usize) -> bool {
        match cx.scratch::<bool>() {
            Some(seen) if !*seen => *seen = true,
            _ => return false,
        }
        cx.next(pos)
    }
}

fn vowel() -> Ast {
    Ast::custom(Arc::new(Vowel))
}

#[test]
fn custom_node_in_sequence() {
    let ast = Ast::concat(vec![Ast::literal("b"), vowel(), Ast::literal("t")]);
    let re = Regex::from_ast(&ast, Flags::empty()).unwrap();
    assert_eq!(re.find("bxt bat").map(|m| m.range()), Some(4..7));
    assert!(!re.is_match("bxt"));
}

#[test]
fn custom_node_repeated() {
    let ast = Ast::repeat(vowel(), 2, None, RepeatKind::Greedy);
    let re = Regex::from_ast(&ast, Flags::empty()).unwrap();
    assert_eq!(re.find("xaeiq").map(|m| m.as_str()), Some("aei"));
    assert!(!re.is_match("xaq"));
}

#[test]
fn custom_node_in_captures_and_lookbehind() {
    let ast = Ast::concat(vec![
        Ast::Look {
            kind: nodechain::regparse_types::LookKind::Behind,
            body: Box::new(vowel()),
        },
        Ast::capture(1, Ast::literal("x")),
    ]);
    let re = Regex::from_ast(&ast, Flags::empty()).unwrap();
    let caps = re.captures("bx ax").unwrap();
    assert_eq!(caps.get(1).unwrap().range(), 4..5);
}

#[test]
fn custom_node_hit_end() {
    let ast = Ast::concat(vec![Ast::literal("b"), vowel()]);
    let re = Regex::from_ast(&ast, Flags::empty()).unwrap();
    let text: Vec<u16> = "b".encode_utf16().collect();
    let mut m = re.matcher(&text);
    assert!(!m.find());
    assert!(m.hit_end());
}

#[test]
fn scratch_state_is_per_attempt() {
    let body = Ast::concat(vec![Ast::custom(Arc::new(Once)), Ast::literal("a")]);
    let ast = Ast::repeat(body, 0, None, RepeatKind::Greedy);
    let re = Regex::from_ast(&ast, Flags::empty()).unwrap();
    assert_eq!(re.find("aaa").map(|m| m.range()), Some(0..1));
    assert_eq!(re.find("aaa").map(|m| m.range()), Some(0..1));
}

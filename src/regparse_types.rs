// regparse_types.rs - Pattern AST.
// The tree produced by the front end and consumed by the compiler. It is
// public so callers can build patterns programmatically, including custom
// plugin nodes.

use std::sync::Arc;

use crate::options::CaseFold;
use crate::regenc::CodePoint;
use crate::regint::{CharPredicate, CustomNode, RepeatKind, REPEAT_INFINITE};

/// Reference to a capture group by number or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    Number(usize),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Numbered capture group.
    Capture(usize),
    NonCapture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookKind {
    Ahead,
    NegAhead,
    Behind,
    NegBehind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorType {
    /// `\A`, or `^` without MULTILINE.
    Begin,
    /// `^` under MULTILINE.
    Caret { unix: bool },
    /// `$`, or `\Z` with `multiline == false`.
    Dollar { multiline: bool, unix: bool },
    /// `\z`.
    End,
    WordBoundary,
    NotWordBoundary,
}

#[derive(Debug, Clone)]
pub enum Condition {
    /// `(?(?=...)` or `(?(?!...)`.
    Look { negate: bool, body: Box<Ast> },
    /// `(?(n)` or `(?(<name>)`.
    Group(GroupRef),
}

#[derive(Debug, Clone)]
pub enum Ast {
    Empty,
    Literal { cp: CodePoint, fold: CaseFold },
    Class(CharPredicate),
    /// `\R`.
    LineEnding,
    Concat(Vec<Ast>),
    Alt(Vec<Ast>),
    Group { kind: GroupKind, body: Box<Ast> },
    Quant { body: Box<Ast>, min: u32, max: u32, kind: RepeatKind },
    Look { kind: LookKind, body: Box<Ast> },
    Atomic(Box<Ast>),
    Anchor(AnchorType),
    BackRef { target: GroupRef, fold: CaseFold },
    /// Recursive call; group 0 is the whole pattern.
    Call(GroupRef),
    Conditional { cond: Condition, yes: Box<Ast>, no: Option<Box<Ast>> },
    Custom(Arc<dyn CustomNode>),
}

impl Ast {
    /// Exact literal text.
    pub fn literal(s: &str) -> Ast {
        let mut items: Vec<Ast> = s
            .chars()
            .map(|c| Ast::Literal {
                cp: c as CodePoint,
                fold: CaseFold::None,
            })
            .collect();
        match items.len() {
            0 => Ast::Empty,
            1 => items.remove(0),
            _ => Ast::Concat(items),
        }
    }

    pub fn concat(items: Vec<Ast>) -> Ast {
        Ast::Concat(items)
    }

    pub fn alt(items: Vec<Ast>) -> Ast {
        Ast::Alt(items)
    }

    pub fn capture(group: usize, body: Ast) -> Ast {
        Ast::Group {
            kind: GroupKind::Capture(group),
            body: Box::new(body),
        }
    }

    /// `body{min,max}`; pass `None` for an unbounded maximum.
    pub fn repeat(body: Ast, min: u32, max: Option<u32>, kind: RepeatKind) -> Ast {
        Ast::Quant {
            body: Box::new(body),
            min,
            max: max.unwrap_or(REPEAT_INFINITE),
            kind,
        }
    }

    pub fn custom(node: Arc<dyn CustomNode>) -> Ast {
        Ast::Custom(node)
    }

    /// Visit this node and every node below it, pre-order.
    pub fn walk(&self, f: &mut impl FnMut(&Ast)) {
        f(self);
        match self {
            Ast::Concat(items) | Ast::Alt(items) => {
                for item in items {
                    item.walk(f);
                }
            }
            Ast::Group { body, .. }
            | Ast::Quant { body, .. }
            | Ast::Look { body, .. }
            | Ast::Atomic(body) => body.walk(f),
            Ast::Conditional { cond, yes, no } => {
                if let Condition::Look { body, .. } = cond {
                    body.walk(f);
                }
                yes.walk(f);
                if let Some(no) = no {
                    no.walk(f);
                }
            }
            _ => {}
        }
    }

    fn any(&self, pred: impl Fn(&Ast) -> bool) -> bool {
        let mut found = false;
        self.walk(&mut |a| found |= pred(a));
        found
    }

    pub fn contains_capture(&self) -> bool {
        self.any(|a| {
            matches!(
                a,
                Ast::Group {
                    kind: GroupKind::Capture(_),
                    ..
                }
            )
        })
    }

    pub fn contains_call(&self) -> bool {
        self.any(|a| matches!(a, Ast::Call(_)))
    }

    /// Calls to group 0 need the root wrapped as a callable group.
    pub fn calls_whole_pattern(&self) -> bool {
        self.any(|a| matches!(a, Ast::Call(GroupRef::Number(0))))
    }

    /// Highest capture group number used in the tree.
    pub fn max_group(&self) -> usize {
        let mut max = 0;
        self.walk(&mut |a| {
            if let Ast::Group {
                kind: GroupKind::Capture(n),
                ..
            } = a
            {
                max = max.max(*n);
            }
        });
        max
    }
}

/// Output of the front end.
#[derive(Debug, Clone)]
pub struct ParsedPattern {
    pub ast: Ast,
    /// Number of capture groups, not counting group 0.
    pub capture_count: usize,
    /// Named groups in definition order.
    pub names: Vec<(String, usize)>,
}

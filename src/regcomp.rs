// regcomp.rs - Ast to node chain compiler.
// Compiles back to front: every Ast node is compiled against the id of its
// already-built continuation. Also picks quantifier and search strategies
// and precomputes Boyer-Moore tables.

use std::sync::Arc;

use crate::error::RegexError;
use crate::options::{CaseFold, Flags};
use crate::regenc::{is_supplementary, CodePoint};
use crate::regint::*;
use crate::regparse::parse;
use crate::regparse_types::*;
use crate::unicode;

/// Parse and compile `pattern`.
pub fn compile_pattern(pattern: &str, flags: Flags) -> Result<Program, RegexError> {
    let parsed = parse(pattern, flags)?;
    compile(&parsed.ast, parsed.capture_count, parsed.names, flags)
}

/// Compile an Ast whose capture groups are numbered `1..=capture_count`.
pub fn compile(
    ast: &Ast,
    capture_count: usize,
    names: Vec<(String, usize)>,
    flags: Flags,
) -> Result<Program, RegexError> {
    let mut c = Compiler::new(capture_count, &names, flags);
    let last = c.push(Node::Last);
    let match_root = if ast.calls_whole_pattern() {
        let nav = c.alloc_nav();
        let tail = c.push(Node::GroupTail {
            slot: None,
            nav: Some(nav),
            next: last,
        });
        let inner = c.compile(ast, tail)?;
        let head = c.push(Node::GroupHead {
            slot: None,
            next: inner,
        });
        c.groups[0] = Some(CallTarget { head, tail, nav });
        head
    } else {
        c.compile(ast, last)?
    };
    c.patch_calls()?;

    let mut info = TreeInfo::new();
    study(&c.nodes, match_root, &mut info, None);
    let root = c.select_root(match_root, &info);

    Ok(Program {
        nodes: c.nodes,
        root,
        match_root,
        group_count: capture_count + 1,
        local_count: c.local_count,
        nav_count: c.nav_count,
        min_length: info.min_length,
        max_length: info.max_valid.then_some(info.max_length),
        flags,
        names,
    })
}

struct Mark {
    nodes: usize,
    locals: usize,
    navs: usize,
}

struct Compiler<'a> {
    nodes: Vec<Node>,
    names: &'a [(String, usize)],
    flags: Flags,
    capture_count: usize,
    local_count: usize,
    nav_count: usize,
    groups: Vec<Option<CallTarget>>,
    calls: Vec<NodeId>,
    accept: NodeId,
    lookbehind_end: NodeId,
    supplementary: bool,
}

impl<'a> Compiler<'a> {
    fn new(capture_count: usize, names: &'a [(String, usize)], flags: Flags) -> Self {
        let mut c = Compiler {
            nodes: Vec::new(),
            names,
            flags,
            capture_count,
            local_count: 0,
            nav_count: 0,
            groups: vec![None; capture_count + 1],
            calls: Vec::new(),
            accept: NodeId(0),
            lookbehind_end: NodeId(0),
            supplementary: false,
        };
        c.accept = c.push(Node::Accept);
        c.lookbehind_end = c.push(Node::LookbehindEnd);
        c
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn alloc_local(&mut self) -> usize {
        self.local_count += 1;
        self.local_count - 1
    }

    fn alloc_nav(&mut self) -> usize {
        self.nav_count += 1;
        self.nav_count - 1
    }

    fn mark(&self) -> Mark {
        Mark {
            nodes: self.nodes.len(),
            locals: self.local_count,
            navs: self.nav_count,
        }
    }

    /// Drop everything built since `mark`.
    fn rewind(&mut self, mark: Mark) {
        self.nodes.truncate(mark.nodes);
        self.local_count = mark.locals;
        self.nav_count = mark.navs;
    }

    fn study(&self, id: NodeId) -> TreeInfo {
        let mut info = TreeInfo::new();
        study(&self.nodes, id, &mut info, None);
        info
    }

    fn resolve(&self, target: &GroupRef) -> Result<usize, RegexError> {
        match target {
            GroupRef::Number(n) => Ok(*n),
            GroupRef::Name(name) => self
                .names
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, g)| *g)
                .ok_or_else(|| RegexError::UndefinedGroupName(name.clone())),
        }
    }

    fn compile(&mut self, ast: &Ast, next: NodeId) -> Result<NodeId, RegexError> {
        match ast {
            Ast::Empty => Ok(next),
            Ast::Literal { cp, fold } => Ok(self.single(*cp, *fold, next)),
            Ast::Class(pred) => Ok(self.class(pred.clone(), next)),
            Ast::LineEnding => Ok(self.push(Node::LineEnding { next })),
            Ast::Concat(items) => self.concat(items, next),
            Ast::Alt(alts) => self.alternation(alts, next),
            Ast::Group {
                kind: GroupKind::Capture(n),
                body,
            } => Ok(self.capture_group(*n, body, next)?.head),
            Ast::Group {
                kind: GroupKind::NonCapture,
                body,
            } => self.compile(body, next),
            Ast::Quant {
                body,
                min,
                max,
                kind,
            } => self.quantifier(body, *min, *max, *kind, next),
            Ast::Look { kind, body } => self.lookaround(*kind, body, next),
            Ast::Atomic(body) => {
                let body = self.compile(body, self.accept)?;
                Ok(self.push(Node::Atomic { body, next }))
            }
            Ast::Anchor(anchor) => Ok(self.anchor(*anchor, next)),
            Ast::BackRef { target, fold } => {
                let group = self.resolve(target)?;
                if group == 0 || group > self.capture_count {
                    return Err(RegexError::InvalidBackref(group));
                }
                Ok(self.push(match fold {
                    CaseFold::None => Node::BackRef { group, next },
                    CaseFold::Ascii => Node::CIBackRef {
                        group,
                        unicode: false,
                        next,
                    },
                    CaseFold::Unicode => Node::CIBackRef {
                        group,
                        unicode: true,
                        next,
                    },
                }))
            }
            Ast::Call(target) => {
                let group = self.resolve(target)?;
                if group > self.capture_count {
                    return Err(RegexError::UndefinedGroupCall(group));
                }
                let id = self.push(Node::GroupCall {
                    group,
                    target: None,
                    isolate: self.flags.contains(Flags::ISOLATE_RECURSION),
                    next,
                });
                self.calls.push(id);
                Ok(id)
            }
            Ast::Conditional { cond, yes, no } => self.conditional(cond, yes, no.as_deref(), next),
            Ast::Custom(node) => Ok(self.push(Node::Custom {
                node: Arc::clone(node),
                next,
            })),
        }
    }

    // === Leaves ===

    fn note_supplementary(&mut self, cp: CodePoint) {
        if is_supplementary(cp) {
            self.supplementary = true;
        }
    }

    fn single(&mut self, cp: CodePoint, fold: CaseFold, next: NodeId) -> NodeId {
        self.note_supplementary(cp);
        let pred = match fold {
            CaseFold::Ascii if unicode::ascii_to_lower(cp) != unicode::ascii_to_upper(cp) => {
                CharPredicate::SingleI {
                    lower: unicode::ascii_to_lower(cp),
                    upper: unicode::ascii_to_upper(cp),
                }
            }
            CaseFold::Unicode if unicode::has_case(cp) => CharPredicate::SingleU(unicode::fold(cp)),
            _ => CharPredicate::Single(cp),
        };
        self.class(pred, next)
    }

    fn class(&mut self, pred: CharPredicate, next: NodeId) -> NodeId {
        if mentions_supplementary(&pred) {
            self.supplementary = true;
        }
        let node = match pred {
            CharPredicate::Bits(bits) => Node::BitClass { bits, next },
            CharPredicate::Ctype(ctype) => Node::Ctype { ctype, next },
            pred if pred.is_bmp_only() => Node::BmpCharProperty { pred, next },
            pred => Node::CharProperty { pred, next },
        };
        self.push(node)
    }

    /// A run of literals sharing one fold.
    fn literal_run(&mut self, cps: &[CodePoint], fold: CaseFold, next: NodeId) -> NodeId {
        if cps.len() == 1 {
            return self.single(cps[0], fold, next);
        }
        let normalize = |c: CodePoint| match fold {
            CaseFold::None => c,
            CaseFold::Ascii => unicode::ascii_to_lower(c),
            CaseFold::Unicode => unicode::fold(c),
        };
        if cps.iter().copied().any(is_supplementary) {
            self.supplementary = true;
            let buf: Box<[CodePoint]> = cps.iter().map(|&c| normalize(c)).collect();
            return self.push(Node::SliceS { buf, fold, next });
        }
        let buf: Box<[u16]> = cps.iter().map(|&c| normalize(c) as u16).collect();
        self.push(match fold {
            CaseFold::None => Node::Slice { buf, next },
            CaseFold::Ascii => Node::SliceI { buf, next },
            CaseFold::Unicode => Node::SliceU { buf, next },
        })
    }

    fn concat(&mut self, items: &[Ast], mut next: NodeId) -> Result<NodeId, RegexError> {
        let mut i = items.len();
        while i > 0 {
            if let Ast::Literal { fold, .. } = items[i - 1] {
                let mut j = i - 1;
                while j > 0 && matches!(items[j - 1], Ast::Literal { fold: f, .. } if f == fold) {
                    j -= 1;
                }
                let cps: Vec<CodePoint> = items[j..i]
                    .iter()
                    .filter_map(|a| match a {
                        Ast::Literal { cp, .. } => Some(*cp),
                        _ => None,
                    })
                    .collect();
                next = self.literal_run(&cps, fold, next);
                i = j;
            } else {
                next = self.compile(&items[i - 1], next)?;
                i -= 1;
            }
        }
        Ok(next)
    }

    fn anchor(&mut self, anchor: AnchorType, next: NodeId) -> NodeId {
        self.push(match anchor {
            AnchorType::Begin => Node::Begin { next },
            AnchorType::Caret { unix: false } => Node::Caret { next },
            AnchorType::Caret { unix: true } => Node::UnixCaret { next },
            AnchorType::Dollar {
                multiline,
                unix: false,
            } => Node::Dollar { multiline, next },
            AnchorType::Dollar {
                multiline,
                unix: true,
            } => Node::UnixDollar { multiline, next },
            AnchorType::End => Node::End { next },
            AnchorType::WordBoundary => Node::Bound {
                kind: BoundType::BOTH,
                next,
            },
            AnchorType::NotWordBoundary => Node::Bound {
                kind: BoundType::NONE,
                next,
            },
        })
    }

    // === Structure ===

    fn alternation(&mut self, alts: &[Ast], next: NodeId) -> Result<NodeId, RegexError> {
        let conn = self.push(Node::BranchConn { next });
        let mut atoms = Vec::with_capacity(alts.len());
        for alt in alts {
            let id = self.compile(alt, conn)?;
            atoms.push((id != conn).then_some(id));
        }
        Ok(self.push(Node::Branch { atoms, conn }))
    }

    fn capture_group(&mut self, group: usize, body: &Ast, next: NodeId) -> Result<CallTarget, RegexError> {
        let local = self.alloc_local();
        let nav = self.alloc_nav();
        let slot = Some(GroupSlot { group, local });
        let tail = self.push(Node::GroupTail {
            slot,
            nav: Some(nav),
            next,
        });
        let inner = self.compile(body, tail)?;
        let head = self.push(Node::GroupHead { slot, next: inner });
        let target = CallTarget { head, tail, nav };
        if let Some(entry) = self.groups.get_mut(group) {
            *entry = Some(target);
        }
        Ok(target)
    }

    fn quantifier(
        &mut self,
        body: &Ast,
        min: u32,
        max: u32,
        kind: RepeatKind,
        next: NodeId,
    ) -> Result<NodeId, RegexError> {
        if max < min {
            return Err(RegexError::InvalidRepeatRange { min, max });
        }
        if max == 0 {
            // Groups inside stay callable even though the body never runs.
            if body.contains_capture() {
                self.compile(body, self.accept)?;
            }
            return Ok(next);
        }
        if min == 1 && max == 1 {
            return match kind {
                RepeatKind::Possessive => {
                    let body = self.compile(body, self.accept)?;
                    Ok(self.push(Node::Atomic { body, next }))
                }
                _ => self.compile(body, next),
            };
        }
        if !body.contains_capture() && !body.contains_call() {
            let mark = self.mark();
            let atom = self.compile(body, self.accept)?;
            if self.study(atom).deterministic {
                log_debug!("quantifier {{{},{}}} {:?}: deterministic Curly", min, max, kind);
                return Ok(self.push(Node::Curly {
                    atom,
                    cmin: min,
                    cmax: max,
                    kind,
                    next,
                }));
            }
            self.rewind(mark);
        }
        match kind {
            RepeatKind::Possessive => {
                let body = self.general_repeat(body, min, max, false, self.accept)?;
                Ok(self.push(Node::Atomic { body, next }))
            }
            RepeatKind::Greedy => self.general_repeat(body, min, max, false, next),
            RepeatKind::Lazy => self.general_repeat(body, min, max, true, next),
        }
    }

    fn general_repeat(
        &mut self,
        body: &Ast,
        min: u32,
        max: u32,
        lazy: bool,
        next: NodeId,
    ) -> Result<NodeId, RegexError> {
        if max == 1 {
            let conn = self.push(Node::BranchConn { next });
            let b = self.compile(body, conn)?;
            let b = (b != conn).then_some(b);
            let atoms = if lazy { vec![None, b] } else { vec![b, None] };
            return Ok(self.push(Node::Branch { atoms, conn }));
        }
        if body.contains_call() {
            log_debug!("quantifier {{{},{}}}: recursive body, Loop", min, max);
            let lp = self.push(Node::Accept);
            let count_slot = self.alloc_local();
            let begin_slot = self.alloc_local();
            let head = match body {
                Ast::Group {
                    kind: GroupKind::Capture(n),
                    body: inner,
                } => self.capture_group(*n, inner, lp)?.head,
                _ => self.compile(body, lp)?,
            };
            self.nodes[lp.index()] = Node::Loop {
                head,
                count_slot,
                begin_slot,
                cmin: min,
                cmax: max,
                lazy,
                next,
            };
            return Ok(self.push(Node::Prolog { lp }));
        }
        log_debug!("quantifier {{{},{}}}: GroupRepeat", min, max);
        let target = match body {
            Ast::Group {
                kind: GroupKind::Capture(n),
                body: inner,
            } => self.capture_group(*n, inner, next)?,
            _ => {
                let nav = self.alloc_nav();
                let tail = self.push(Node::GroupTail {
                    slot: None,
                    nav: Some(nav),
                    next,
                });
                let inner = self.compile(body, tail)?;
                let head = self.push(Node::GroupHead {
                    slot: None,
                    next: inner,
                });
                CallTarget { head, tail, nav }
            }
        };
        Ok(self.push(Node::GroupRepeat {
            head: target.head,
            tail: target.tail,
            nav: target.nav,
            cmin: min,
            cmax: max,
            lazy,
            next,
        }))
    }

    fn lookaround(&mut self, kind: LookKind, body: &Ast, next: NodeId) -> Result<NodeId, RegexError> {
        match kind {
            LookKind::Ahead => {
                let cond = self.compile(body, self.accept)?;
                Ok(self.push(Node::Pos { cond, next }))
            }
            LookKind::NegAhead => {
                let cond = self.compile(body, self.accept)?;
                Ok(self.push(Node::Neg { cond, next }))
            }
            LookKind::Behind | LookKind::NegBehind => {
                let cond = self.compile(body, self.lookbehind_end)?;
                let info = self.study(cond);
                if !info.max_valid {
                    return Err(RegexError::UnboundedLookbehind);
                }
                let (rmin, rmax) = (info.min_length, info.max_length);
                let negate = kind == LookKind::NegBehind;
                log_debug!(
                    "lookbehind [{}, {}] negate={} bmp_only={}",
                    rmin,
                    rmax,
                    negate,
                    info.bmp_only
                );
                Ok(self.push(match (negate, info.bmp_only) {
                    (false, true) => Node::Behind {
                        cond,
                        rmin,
                        rmax,
                        next,
                    },
                    (true, true) => Node::NotBehind {
                        cond,
                        rmin,
                        rmax,
                        next,
                    },
                    (false, false) => Node::BehindS {
                        cond,
                        rmin,
                        rmax,
                        next,
                    },
                    (true, false) => Node::NotBehindS {
                        cond,
                        rmin,
                        rmax,
                        next,
                    },
                }))
            }
        }
    }

    fn conditional(
        &mut self,
        cond: &Condition,
        yes: &Ast,
        no: Option<&Ast>,
        next: NodeId,
    ) -> Result<NodeId, RegexError> {
        let conn = self.push(Node::BranchConn { next });
        let yes = self.compile(yes, conn)?;
        let no = match no {
            Some(no) => Some(self.compile(no, conn)?),
            None => None,
        };
        let cond = match cond {
            Condition::Look { negate, body } => CondNode::Look {
                cond: self.compile(body, self.accept)?,
                negate: *negate,
            },
            Condition::Group(target) => {
                let group = self.resolve(target)?;
                if group == 0 || group > self.capture_count {
                    return Err(RegexError::InvalidBackref(group));
                }
                CondNode::GroupSet(group)
            }
        };
        Ok(self.push(Node::Conditional { cond, yes, no, conn }))
    }

    // === Finishing ===

    fn patch_calls(&mut self) -> Result<(), RegexError> {
        for &id in &self.calls {
            if let Node::GroupCall { group, target, .. } = &mut self.nodes[id.index()] {
                let resolved = self
                    .groups
                    .get(*group)
                    .copied()
                    .flatten()
                    .ok_or(RegexError::UndefinedGroupCall(*group))?;
                *target = Some(resolved);
            }
        }
        Ok(())
    }

    /// Pick the node unanchored searches start from.
    fn select_root(&mut self, match_root: NodeId, info: &TreeInfo) -> NodeId {
        let bm = match &self.nodes[match_root.index()] {
            Node::Begin { .. } => {
                log_debug!("root: anchored at Begin");
                return match_root;
            }
            Node::Slice { buf, next } if buf.len() >= BM_MIN_PATTERN_LENGTH => {
                let pattern: Vec<u32> = buf.iter().map(|&u| u as u32).collect();
                Some((boyer_moore(&pattern, buf.len()), false, *next))
            }
            Node::SliceS {
                buf,
                fold: CaseFold::None,
                next,
            } if buf.len() >= BM_MIN_PATTERN_LENGTH => {
                let unit_len = buf.iter().map(|&c| crate::regenc::char_count(c)).sum();
                Some((boyer_moore(buf, unit_len), true, *next))
            }
            _ => None,
        };
        match bm {
            Some((bm, false, next)) => {
                log_debug!("root: BnM over {} units", bm.unit_len);
                self.push(Node::BnM {
                    bm: Box::new(bm),
                    next,
                })
            }
            Some((bm, true, next)) => {
                log_debug!("root: BnMS over {} code points", bm.pattern.len());
                self.push(Node::BnMS {
                    bm: Box::new(bm),
                    next,
                })
            }
            None => {
                log_debug!(
                    "root: Start min_length={} supplementary={}",
                    info.min_length,
                    self.supplementary
                );
                self.push(Node::Start {
                    min_length: info.min_length,
                    supplementary: self.supplementary,
                    next: match_root,
                })
            }
        }
    }
}

fn mentions_supplementary(pred: &CharPredicate) -> bool {
    match pred {
        CharPredicate::Single(c) | CharPredicate::SingleU(c) => is_supplementary(*c),
        CharPredicate::Range(_, hi) | CharPredicate::RangeI(_, hi) | CharPredicate::RangeU(_, hi) => {
            is_supplementary(*hi)
        }
        CharPredicate::Not(p) => mentions_supplementary(p),
        CharPredicate::Union(ps) | CharPredicate::Intersection(ps) => {
            ps.iter().any(mentions_supplementary)
        }
        _ => false,
    }
}

/// Build the bad-character and good-suffix tables for `pattern`.
pub fn boyer_moore(pattern: &[u32], unit_len: usize) -> BoyerMoore {
    let len = pattern.len();
    let mut last_occ = [0usize; 128];
    let mut opto_sft = vec![0usize; len];
    for (i, &c) in pattern.iter().enumerate() {
        last_occ[(c & 0x7F) as usize] = i + 1;
    }
    'next: for i in (1..=len).rev() {
        let mut j = len as isize - 1;
        while j >= i as isize {
            let ju = j as usize;
            if pattern[ju] == pattern[ju - i] {
                opto_sft[ju - 1] = i;
            } else {
                continue 'next;
            }
            j -= 1;
        }
        while j > 0 {
            j -= 1;
            opto_sft[j as usize] = i;
        }
    }
    if len > 0 {
        opto_sft[len - 1] = 1;
    }
    BoyerMoore {
        pattern: pattern.into(),
        last_occ,
        opto_sft: opto_sft.into_boxed_slice(),
        unit_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prog(p: &str) -> Program {
        compile_pattern(p, Flags::empty()).unwrap()
    }

    fn root(p: &Program) -> &Node {
        p.node(p.root())
    }

    fn match_root(p: &Program) -> &Node {
        p.node(p.match_root())
    }

    #[test]
    fn literal_runs_become_slices() {
        let p = prog("abc");
        assert!(matches!(match_root(&p), Node::Slice { buf, .. } if buf.len() == 3));
        assert!(matches!(root(&p), Node::Start { min_length: 3, supplementary: false, .. }));
        let p = compile_pattern("abc", Flags::CASE_INSENSITIVE).unwrap();
        assert!(matches!(match_root(&p), Node::SliceI { .. }));
        let p = compile_pattern("abc", Flags::CASE_INSENSITIVE | Flags::UNICODE_CASE).unwrap();
        assert!(matches!(match_root(&p), Node::SliceU { .. }));
    }

    #[test]
    fn long_literal_prefix_uses_boyer_moore() {
        let p = prog("abcd+");
        assert!(matches!(root(&p), Node::Start { .. }));
        let p = prog("hello world");
        assert!(matches!(root(&p), Node::BnM { bm, .. } if bm.unit_len == 11));
        let p = prog("\u{1F600}\u{1F601}\u{1F602}\u{1F603}");
        assert!(matches!(root(&p), Node::BnMS { bm, .. } if bm.unit_len == 8));
    }

    #[test]
    fn supplementary_literal_selects_start_s() {
        let p = prog("a\u{1F600}|b");
        assert!(matches!(root(&p), Node::Start { supplementary: true, .. }));
        let p = prog("[\u{1F600}-\u{1F64F}]");
        assert!(matches!(root(&p), Node::Start { supplementary: true, .. }));
        assert!(matches!(match_root(&p), Node::CharProperty { .. }));
    }

    #[test]
    fn begin_anchor_is_its_own_root() {
        let p = prog("^abc");
        assert_eq!(p.root(), p.match_root());
    }

    #[test]
    fn quantifier_strategies() {
        assert!(matches!(match_root(&prog("a*")), Node::Curly { .. }));
        assert!(matches!(match_root(&prog("(?:ab)+")), Node::Curly { .. }));
        assert!(matches!(match_root(&prog("(a)*")), Node::GroupRepeat { .. }));
        assert!(matches!(match_root(&prog("(?:a|b)*")), Node::GroupRepeat { .. }));
        assert!(matches!(match_root(&prog("(?:a|b)*+")), Node::Atomic { .. }));
        assert!(matches!(match_root(&prog("(a(?1)?b)*")), Node::Prolog { .. }));
        assert!(matches!(match_root(&prog("(a)?")), Node::Branch { .. }));
    }

    #[test]
    fn rewound_attempt_leaves_no_orphans() {
        let a = prog("(?:a|b)*");
        let b = prog("(?:(?:a|b)*c)*");
        assert!(a.node_count() < b.node_count());
        assert_eq!(a.nav_count, 1);
        assert_eq!(b.nav_count, 2);
    }

    #[test]
    fn lookbehind_lengths() {
        let p = prog("(?<=ab|c)x");
        assert!(matches!(match_root(&p), Node::Behind { rmin: 1, rmax: 2, .. }));
        let p = prog("(?<!\u{1F600})x");
        assert!(matches!(match_root(&p), Node::NotBehindS { rmin: 1, rmax: 1, .. }));
        assert_eq!(
            compile_pattern("(?<=a+)x", Flags::empty()).unwrap_err(),
            RegexError::UnboundedLookbehind
        );
        assert_eq!(
            compile_pattern(r"(a)(?<=\1)", Flags::empty()).unwrap_err(),
            RegexError::UnboundedLookbehind
        );
    }

    #[test]
    fn reference_errors() {
        assert_eq!(
            compile_pattern(r"(a)\2", Flags::empty()).unwrap_err(),
            RegexError::InvalidBackref(2)
        );
        assert_eq!(
            compile_pattern("(a)(?3)", Flags::empty()).unwrap_err(),
            RegexError::UndefinedGroupCall(3)
        );
        assert_eq!(
            compile_pattern(r"\k<nope>", Flags::empty()).unwrap_err(),
            RegexError::UndefinedGroupName("nope".into())
        );
    }

    #[test]
    fn calls_are_patched() {
        let p = prog("(a)(?1)(?R)?");
        let calls = p
            .nodes
            .iter()
            .filter(|n| matches!(n, Node::GroupCall { target: Some(_), .. }))
            .count();
        assert_eq!(calls, 2);
    }

    #[test]
    fn length_bounds() {
        let p = prog("a{2,3}b?");
        assert_eq!(p.min_length(), 2);
        assert_eq!(p.max_length(), Some(4));
        assert_eq!(prog("a+").max_length(), None);
    }

    #[test]
    fn boyer_moore_tables() {
        let pat: Vec<u32> = "abcab".chars().map(|c| c as u32).collect();
        let bm = boyer_moore(&pat, 5);
        assert_eq!(bm.last_occ['a' as usize], 4);
        assert_eq!(bm.last_occ['b' as usize], 5);
        assert_eq!(bm.last_occ['c' as usize], 3);
        assert_eq!(bm.last_occ['z' as usize], 0);
        assert_eq!(bm.opto_sft[4], 1);
        assert!(bm.opto_sft.iter().all(|&s| s >= 1));
    }
}

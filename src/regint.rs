// regint.rs - Internal types of the node chain.
// Node arena, character predicates, BitSet helpers, TreeInfo and the study
// pass that computes length bounds and determinism of a chain.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::options::{CaseFold, Flags};
use crate::regenc::{CodePoint, MIN_SUPPLEMENTARY_CODE_POINT};
use crate::regexec::CustomContext;
use crate::unicode::{self, Ctype, UnicodeClass};

// === Config Constants ===
pub const REPEAT_INFINITE: u32 = u32::MAX;
pub const MAX_REPEAT_NUM: u32 = 100_000;
pub const BM_MIN_PATTERN_LENGTH: usize = 4;

// === BitSet (256 bits for Latin-1 character classes) ===
pub const BITS_PER_BYTE: usize = 8;
pub const SINGLE_BYTE_SIZE: usize = 1 << BITS_PER_BYTE;
pub const BITS_IN_ROOM: usize = 32;
pub const BITSET_REAL_SIZE: usize = SINGLE_BYTE_SIZE / BITS_IN_ROOM;
pub type Bits = u32;
pub type BitSet = [Bits; BITSET_REAL_SIZE];

#[inline]
pub fn bs_room(pos: usize) -> usize {
    pos >> 5
}

#[inline]
pub fn bs_bit(pos: usize) -> u32 {
    1u32 << (pos & 0x1f)
}

#[inline]
pub fn bitset_at(bs: &BitSet, pos: usize) -> bool {
    pos < SINGLE_BYTE_SIZE && (bs[bs_room(pos)] & bs_bit(pos)) != 0
}

#[inline]
pub fn bitset_set_bit(bs: &mut BitSet, pos: usize) {
    bs[bs_room(pos)] |= bs_bit(pos);
}

/// Add `c` to a class bit set, applying the case-insensitive population
/// rules: ASCII letters add both cases; other Latin-1 letters add their
/// simple case pair only under Unicode folding.
pub fn bitset_add(bs: &mut BitSet, c: CodePoint, fold: CaseFold) {
    debug_assert!((c as usize) < SINGLE_BYTE_SIZE);
    match fold {
        CaseFold::None => {}
        _ if c < 128 => {
            bitset_set_bit(bs, unicode::ascii_to_upper(c) as usize);
            bitset_set_bit(bs, unicode::ascii_to_lower(c) as usize);
        }
        CaseFold::Unicode => {
            for m in [unicode::to_lower(c), unicode::to_upper(c)] {
                if (m as usize) < SINGLE_BYTE_SIZE {
                    bitset_set_bit(bs, m as usize);
                }
            }
        }
        CaseFold::Ascii => {}
    }
    bitset_set_bit(bs, c as usize);
}

// === Node Ids ===

/// Index of a node in its program's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// === Character Predicates ===

/// A test on a single code point.
#[derive(Clone)]
pub enum CharPredicate {
    Single(CodePoint),
    /// ASCII case-insensitive letter, stored as both cases.
    SingleI { lower: CodePoint, upper: CodePoint },
    /// Unicode case-insensitive character, stored folded.
    SingleU(CodePoint),
    Range(CodePoint, CodePoint),
    RangeI(CodePoint, CodePoint),
    RangeU(CodePoint, CodePoint),
    Bits(Box<BitSet>),
    Ctype(Ctype),
    Unicode(UnicodeClass),
    /// `.`: anything but a line terminator.
    Dot,
    /// `.` under UNIX_LINES: anything but `\n`.
    UnixDot,
    /// `.` under DOTALL.
    All,
    HorizWs,
    VertWs,
    Not(Box<CharPredicate>),
    Union(Vec<CharPredicate>),
    Intersection(Vec<CharPredicate>),
    Custom(Arc<dyn Fn(CodePoint) -> bool + Send + Sync>),
}

#[inline]
fn in_range(lo: CodePoint, c: CodePoint, hi: CodePoint) -> bool {
    lo <= c && c <= hi
}

impl CharPredicate {
    pub fn is(&self, c: CodePoint) -> bool {
        match self {
            CharPredicate::Single(x) => c == *x,
            CharPredicate::SingleI { lower, upper } => c == *lower || c == *upper,
            CharPredicate::SingleU(folded) => c == *folded || unicode::fold(c) == *folded,
            CharPredicate::Range(lo, hi) => in_range(*lo, c, *hi),
            CharPredicate::RangeI(lo, hi) => {
                in_range(*lo, c, *hi)
                    || (c < 128
                        && (in_range(*lo, unicode::ascii_to_upper(c), *hi)
                            || in_range(*lo, unicode::ascii_to_lower(c), *hi)))
            }
            CharPredicate::RangeU(lo, hi) => {
                if in_range(*lo, c, *hi) {
                    return true;
                }
                let up = unicode::to_upper(c);
                in_range(*lo, up, *hi) || in_range(*lo, unicode::to_lower(up), *hi)
            }
            CharPredicate::Bits(bs) => bitset_at(bs, c as usize),
            CharPredicate::Ctype(ct) => ct.matches(c),
            CharPredicate::Unicode(uc) => uc.matches(c),
            CharPredicate::Dot => !unicode::is_line_terminator(c),
            CharPredicate::UnixDot => c != '\n' as CodePoint,
            CharPredicate::All => true,
            CharPredicate::HorizWs => unicode::is_horiz_ws(c),
            CharPredicate::VertWs => unicode::is_vert_ws(c),
            CharPredicate::Not(p) => !p.is(c),
            CharPredicate::Union(ps) => ps.iter().any(|p| p.is(c)),
            CharPredicate::Intersection(ps) => ps.iter().all(|p| p.is(c)),
            CharPredicate::Custom(f) => f(c),
        }
    }

    /// True when no supplementary code point can satisfy the predicate.
    pub fn is_bmp_only(&self) -> bool {
        match self {
            CharPredicate::Single(x) | CharPredicate::SingleU(x) => {
                *x < MIN_SUPPLEMENTARY_CODE_POINT
            }
            CharPredicate::Range(_, hi) | CharPredicate::RangeI(_, hi) | CharPredicate::RangeU(_, hi) => {
                *hi < MIN_SUPPLEMENTARY_CODE_POINT
            }
            CharPredicate::SingleI { .. }
            | CharPredicate::Bits(_)
            | CharPredicate::Ctype(_)
            | CharPredicate::HorizWs
            | CharPredicate::VertWs => true,
            CharPredicate::Union(ps) => ps.iter().all(CharPredicate::is_bmp_only),
            CharPredicate::Intersection(ps) => ps.iter().any(CharPredicate::is_bmp_only),
            CharPredicate::Unicode(_)
            | CharPredicate::Dot
            | CharPredicate::UnixDot
            | CharPredicate::All
            | CharPredicate::Not(_)
            | CharPredicate::Custom(_) => false,
        }
    }

    /// Negate, collapsing a double negation.
    pub fn negate(self) -> CharPredicate {
        match self {
            CharPredicate::Not(p) => *p,
            p => CharPredicate::Not(Box::new(p)),
        }
    }
}

impl fmt::Debug for CharPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharPredicate::Single(c) => write!(f, "Single({:#x})", c),
            CharPredicate::SingleI { lower, upper } => {
                write!(f, "SingleI({:#x}, {:#x})", lower, upper)
            }
            CharPredicate::SingleU(c) => write!(f, "SingleU({:#x})", c),
            CharPredicate::Range(lo, hi) => write!(f, "Range({:#x}..={:#x})", lo, hi),
            CharPredicate::RangeI(lo, hi) => write!(f, "RangeI({:#x}..={:#x})", lo, hi),
            CharPredicate::RangeU(lo, hi) => write!(f, "RangeU({:#x}..={:#x})", lo, hi),
            CharPredicate::Bits(_) => write!(f, "Bits"),
            CharPredicate::Ctype(ct) => write!(f, "Ctype({:?})", ct),
            CharPredicate::Unicode(uc) => write!(f, "Unicode({:?})", uc),
            CharPredicate::Dot => write!(f, "Dot"),
            CharPredicate::UnixDot => write!(f, "UnixDot"),
            CharPredicate::All => write!(f, "All"),
            CharPredicate::HorizWs => write!(f, "HorizWs"),
            CharPredicate::VertWs => write!(f, "VertWs"),
            CharPredicate::Not(p) => write!(f, "Not({:?})", p),
            CharPredicate::Union(ps) => f.debug_tuple("Union").field(ps).finish(),
            CharPredicate::Intersection(ps) => f.debug_tuple("Intersection").field(ps).finish(),
            CharPredicate::Custom(_) => write!(f, "Custom"),
        }
    }
}

// === Node Parameters ===

/// Quantifier flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatKind {
    Greedy,
    Lazy,
    Possessive,
}

bitflags! {
    /// Which side of a word boundary `\b` / `\B` accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoundType: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const BOTH = Self::LEFT.bits() | Self::RIGHT.bits();
        const NONE = 1 << 2;
    }
}

/// Whether the final node accepts anywhere or only at the region end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptMode {
    Anywhere,
    End,
}

/// Capture bookkeeping of a numbered group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSlot {
    pub group: usize,
    pub local: usize,
}

/// Resolved target of a recursive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTarget {
    pub head: NodeId,
    pub tail: NodeId,
    pub nav: usize,
}

/// Condition of a conditional node.
#[derive(Debug, Clone)]
pub enum CondNode {
    /// Lookahead body ending at an Accept node.
    Look { cond: NodeId, negate: bool },
    /// Group has participated in the match so far.
    GroupSet(usize),
}

/// Precomputed Boyer-Moore tables for a literal prefix.
#[derive(Debug, Clone)]
pub struct BoyerMoore {
    /// Pattern as UTF-16 units (BnM) or code points (BnMS).
    pub pattern: Box<[u32]>,
    /// `last_occ[c & 0x7F]` is one past the last position of a unit
    /// with those low bits.
    pub last_occ: [usize; 128],
    /// Good-suffix shifts.
    pub opto_sft: Box<[usize]>,
    /// Pattern length in UTF-16 units.
    pub unit_len: usize,
}

/// A user-defined node spliced into the chain.
pub trait CustomNode: fmt::Debug + Send + Sync {
    /// Add this node's length contribution. The default makes the
    /// enclosing chain non-deterministic with unknown maximum.
    fn study(&self, info: &mut TreeInfo) {
        info.max_valid = false;
        info.deterministic = false;
    }

    /// Try to match at `pos`; call `cx.next(end)` to continue the chain.
    fn match_at(&self, cx: &mut CustomContext<'_, '_>, pos: usize) -> bool;
}

// === Nodes ===

/// One step of a compiled pattern. Every node owns the id of its
/// continuation; structural nodes hold the ids of their sub-chains.
#[derive(Debug)]
pub enum Node {
    /// Final node of the top-level chain.
    Last,
    /// Final node of a sub-chain (quantified atoms, lookaround bodies).
    Accept,
    /// Final node of a lookbehind body.
    LookbehindEnd,

    Start { min_length: usize, supplementary: bool, next: NodeId },
    BnM { bm: Box<BoyerMoore>, next: NodeId },
    BnMS { bm: Box<BoyerMoore>, next: NodeId },

    CharProperty { pred: CharPredicate, next: NodeId },
    BmpCharProperty { pred: CharPredicate, next: NodeId },
    BitClass { bits: Box<BitSet>, next: NodeId },
    Ctype { ctype: Ctype, next: NodeId },
    LineEnding { next: NodeId },
    Slice { buf: Box<[u16]>, next: NodeId },
    /// ASCII case-insensitive slice; `buf` is lower-cased.
    SliceI { buf: Box<[u16]>, next: NodeId },
    /// Unicode case-insensitive slice; `buf` is folded.
    SliceU { buf: Box<[u16]>, next: NodeId },
    /// Slice containing supplementary characters, as code points.
    SliceS { buf: Box<[CodePoint]>, fold: CaseFold, next: NodeId },

    Begin { next: NodeId },
    Caret { next: NodeId },
    UnixCaret { next: NodeId },
    Dollar { multiline: bool, next: NodeId },
    UnixDollar { multiline: bool, next: NodeId },
    End { next: NodeId },
    Bound { kind: BoundType, next: NodeId },

    /// Alternatives end at `conn`; a `None` atom continues at `conn`'s next.
    Branch { atoms: Vec<Option<NodeId>>, conn: NodeId },
    BranchConn { next: NodeId },
    GroupHead { slot: Option<GroupSlot>, next: NodeId },
    GroupTail { slot: Option<GroupSlot>, nav: Option<usize>, next: NodeId },

    /// Repeat of a deterministic atom ending at an Accept node.
    Curly { atom: NodeId, cmin: u32, cmax: u32, kind: RepeatKind, next: NodeId },
    /// Repeat of a group whose tail hands control back through `nav`.
    GroupRepeat {
        head: NodeId,
        tail: NodeId,
        nav: usize,
        cmin: u32,
        cmax: u32,
        lazy: bool,
        next: NodeId,
    },
    /// Entry of a Loop; `lp` is the Loop node the body returns to.
    Prolog { lp: NodeId },
    Loop {
        head: NodeId,
        count_slot: usize,
        begin_slot: usize,
        cmin: u32,
        cmax: u32,
        lazy: bool,
        next: NodeId,
    },
    Atomic { body: NodeId, next: NodeId },

    Pos { cond: NodeId, next: NodeId },
    Neg { cond: NodeId, next: NodeId },
    Behind { cond: NodeId, rmin: usize, rmax: usize, next: NodeId },
    NotBehind { cond: NodeId, rmin: usize, rmax: usize, next: NodeId },
    BehindS { cond: NodeId, rmin: usize, rmax: usize, next: NodeId },
    NotBehindS { cond: NodeId, rmin: usize, rmax: usize, next: NodeId },
    Conditional { cond: CondNode, yes: NodeId, no: Option<NodeId>, conn: NodeId },

    BackRef { group: usize, next: NodeId },
    CIBackRef { group: usize, unicode: bool, next: NodeId },
    GroupCall { group: usize, target: Option<CallTarget>, isolate: bool, next: NodeId },

    Custom { node: Arc<dyn CustomNode>, next: NodeId },
}

impl Node {
    /// Static continuation, if the node has exactly one.
    pub fn next(&self) -> Option<NodeId> {
        match self {
            Node::Last | Node::Accept | Node::LookbehindEnd => None,
            Node::Branch { .. } | Node::Prolog { .. } => None,
            Node::Start { next, .. }
            | Node::BnM { next, .. }
            | Node::BnMS { next, .. }
            | Node::CharProperty { next, .. }
            | Node::BmpCharProperty { next, .. }
            | Node::BitClass { next, .. }
            | Node::Ctype { next, .. }
            | Node::LineEnding { next }
            | Node::Slice { next, .. }
            | Node::SliceI { next, .. }
            | Node::SliceU { next, .. }
            | Node::SliceS { next, .. }
            | Node::Begin { next }
            | Node::Caret { next }
            | Node::UnixCaret { next }
            | Node::Dollar { next, .. }
            | Node::UnixDollar { next, .. }
            | Node::End { next }
            | Node::Bound { next, .. }
            | Node::BranchConn { next }
            | Node::GroupHead { next, .. }
            | Node::GroupTail { next, .. }
            | Node::Curly { next, .. }
            | Node::GroupRepeat { next, .. }
            | Node::Loop { next, .. }
            | Node::Atomic { next, .. }
            | Node::Pos { next, .. }
            | Node::Neg { next, .. }
            | Node::Behind { next, .. }
            | Node::NotBehind { next, .. }
            | Node::BehindS { next, .. }
            | Node::NotBehindS { next, .. }
            | Node::BackRef { next, .. }
            | Node::CIBackRef { next, .. }
            | Node::GroupCall { next, .. }
            | Node::Custom { next, .. } => Some(*next),
            Node::Conditional { .. } => None,
        }
    }
}

// === TreeInfo ===

/// Accumulated facts about a chain, filled in by [`study`].
#[derive(Debug, Clone)]
pub struct TreeInfo {
    pub min_length: usize,
    pub max_length: usize,
    pub max_valid: bool,
    pub deterministic: bool,
    /// False once anything that may consume a supplementary character
    /// has been seen.
    pub bmp_only: bool,
    active_calls: HashSet<usize>,
}

impl Default for TreeInfo {
    fn default() -> Self {
        TreeInfo {
            min_length: 0,
            max_length: 0,
            max_valid: true,
            deterministic: true,
            bmp_only: true,
            active_calls: HashSet::new(),
        }
    }
}

impl TreeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset lengths and determinism, keeping `bmp_only` and the call guard.
    pub fn reset(&mut self) {
        self.min_length = 0;
        self.max_length = 0;
        self.max_valid = true;
        self.deterministic = true;
    }

    /// Account for a fixed-width piece of `n` characters.
    pub fn add_fixed(&mut self, n: usize) {
        self.min_length = self.min_length.saturating_add(n);
        self.max_length = self.max_length.saturating_add(n);
    }

    fn add_repeat(&mut self, cmin: u32, cmax: u32, body: impl FnOnce(&mut TreeInfo)) {
        let min0 = self.min_length;
        let max0 = self.max_length;
        let maxv0 = self.max_valid;
        let det0 = self.deterministic;
        self.reset();
        body(self);
        self.min_length = min0.saturating_add(self.min_length.saturating_mul(cmin as usize));
        let max = if maxv0 && self.max_valid && cmax != REPEAT_INFINITE {
            self.max_length
                .checked_mul(cmax as usize)
                .and_then(|m| m.checked_add(max0))
        } else {
            None
        };
        match max {
            Some(m) => self.max_length = m,
            None => self.max_valid = false,
        }
        self.deterministic = self.deterministic && cmin == cmax && det0;
    }

    fn add_alternatives<'a>(
        &mut self,
        atoms: impl Iterator<Item = Option<&'a NodeId>>,
        mut study_atom: impl FnMut(NodeId, &mut TreeInfo),
    ) {
        let min0 = self.min_length;
        let max0 = self.max_length;
        let maxv0 = self.max_valid;
        let mut min2 = usize::MAX;
        let mut max2 = 0;
        let mut maxv = true;
        for atom in atoms {
            self.reset();
            if let Some(a) = atom {
                study_atom(*a, self);
            }
            min2 = min2.min(self.min_length);
            max2 = max2.max(self.max_length);
            maxv &= self.max_valid;
        }
        if min2 == usize::MAX {
            min2 = 0;
        }
        self.min_length = min0.saturating_add(min2);
        self.max_length = max0.saturating_add(max2);
        self.max_valid = maxv0 && maxv;
        self.deterministic = false;
    }
}

/// Walk the chain starting at `start`, accumulating into `info`.
///
/// The walk ends at a terminal node, at a BranchConn (alternatives are
/// studied by their Branch) or when it reaches `stop`.
pub fn study(nodes: &[Node], start: NodeId, info: &mut TreeInfo, stop: Option<NodeId>) {
    let mut id = start;
    loop {
        if Some(id) == stop {
            return;
        }
        id = match &nodes[id.index()] {
            Node::Last
            | Node::Accept
            | Node::LookbehindEnd
            | Node::BranchConn { .. }
            | Node::Loop { .. } => return,

            Node::Start { next, .. } => *next,
            Node::BnM { bm, next } => {
                info.add_fixed(bm.unit_len);
                *next
            }
            Node::BnMS { bm, next } => {
                info.bmp_only = false;
                info.add_fixed(bm.pattern.len());
                *next
            }
            Node::CharProperty { pred, next } => {
                if !pred.is_bmp_only() {
                    info.bmp_only = false;
                }
                info.add_fixed(1);
                *next
            }
            Node::BmpCharProperty { next, .. }
            | Node::BitClass { next, .. }
            | Node::Ctype { next, .. } => {
                info.add_fixed(1);
                *next
            }
            Node::LineEnding { next } => {
                info.min_length = info.min_length.saturating_add(1);
                info.max_length = info.max_length.saturating_add(2);
                *next
            }
            Node::Slice { buf, next } | Node::SliceI { buf, next } | Node::SliceU { buf, next } => {
                info.add_fixed(buf.len());
                *next
            }
            Node::SliceS { buf, next, .. } => {
                info.bmp_only = false;
                info.add_fixed(buf.len());
                *next
            }

            Node::Begin { next }
            | Node::Caret { next }
            | Node::UnixCaret { next }
            | Node::Dollar { next, .. }
            | Node::UnixDollar { next, .. }
            | Node::End { next }
            | Node::Bound { next, .. }
            | Node::GroupHead { next, .. }
            | Node::GroupTail { next, .. }
            | Node::Pos { next, .. }
            | Node::Neg { next, .. }
            | Node::Behind { next, .. }
            | Node::NotBehind { next, .. }
            | Node::BehindS { next, .. }
            | Node::NotBehindS { next, .. } => *next,

            Node::Branch { atoms, conn } => {
                info.add_alternatives(atoms.iter().map(Option::as_ref), |a, info| {
                    study(nodes, a, info, stop)
                });
                conn_next(nodes, *conn)
            }
            Node::Conditional { yes, no, conn, .. } => {
                let atoms = [Some(yes), no.as_ref()];
                info.add_alternatives(atoms.into_iter(), |a, info| study(nodes, a, info, stop));
                conn_next(nodes, *conn)
            }
            Node::Atomic { body, next } => {
                study(nodes, *body, info, None);
                *next
            }
            Node::Curly {
                atom,
                cmin,
                cmax,
                next,
                ..
            } => {
                info.add_repeat(*cmin, *cmax, |info| study(nodes, *atom, info, None));
                *next
            }
            Node::GroupRepeat {
                head,
                tail,
                cmin,
                cmax,
                next,
                ..
            } => {
                info.add_repeat(*cmin, *cmax, |info| study(nodes, *head, info, Some(*tail)));
                info.deterministic = false;
                *next
            }
            Node::Prolog { lp } => match &nodes[lp.index()] {
                Node::Loop {
                    head,
                    cmin,
                    cmax,
                    next,
                    ..
                } => {
                    let lp = *lp;
                    info.add_repeat(*cmin, *cmax, |info| study(nodes, *head, info, Some(lp)));
                    info.max_valid = false;
                    info.deterministic = false;
                    *next
                }
                _ => return,
            },

            Node::BackRef { next, .. } | Node::CIBackRef { next, .. } => {
                info.max_valid = false;
                info.bmp_only = false;
                *next
            }
            Node::GroupCall {
                group,
                target,
                next,
                ..
            } => {
                match target {
                    Some(t) if !info.active_calls.contains(group) => {
                        info.active_calls.insert(*group);
                        study(nodes, t.head, info, Some(t.tail));
                        info.active_calls.remove(group);
                    }
                    _ => {
                        info.max_valid = false;
                        info.bmp_only = false;
                    }
                }
                info.deterministic = false;
                *next
            }
            Node::Custom { node, next } => {
                node.study(info);
                *next
            }
        };
    }
}

fn conn_next(nodes: &[Node], conn: NodeId) -> NodeId {
    match &nodes[conn.index()] {
        Node::BranchConn { next } => *next,
        _ => conn,
    }
}

// === Program ===

/// A compiled pattern: the node arena plus everything the matcher needs
/// to size its per-match state.
#[derive(Debug)]
pub struct Program {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) match_root: NodeId,
    /// Number of capture groups including group 0.
    pub(crate) group_count: usize,
    pub(crate) local_count: usize,
    pub(crate) nav_count: usize,
    pub(crate) min_length: usize,
    pub(crate) max_length: Option<usize>,
    pub(crate) flags: Flags,
    pub(crate) names: Vec<(String, usize)>,
}

impl Program {
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Entry node used by unanchored searches.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Entry node used by anchored matches.
    pub fn match_root(&self) -> NodeId {
        self.match_root
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Named groups in definition order.
    pub fn names(&self) -> &[(String, usize)] {
        &self.names
    }

    /// Group number for `name`.
    pub fn name_to_group(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| *g)
    }

    /// Study the chain starting at `id` with a fresh TreeInfo.
    pub fn study_from(&self, id: NodeId) -> TreeInfo {
        let mut info = TreeInfo::new();
        study(&self.nodes, id, &mut info, None);
        info
    }
}

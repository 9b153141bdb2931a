// regexec.rs - Node chain matcher.
// Recursive-descent interpreter over a Program's node arena. Each node
// tests or consumes, mutates the per-match state, then delegates to its
// continuation. Backtracking is ordinary call-stack unwinding: a node
// that returns false has already undone everything it changed.
//
// Structure: state types -> MatchState -> leaves -> anchors -> groups
// and repeats -> lookaround -> calls -> search drivers -> entry points.

use std::any::Any;
use std::collections::HashMap;

use smallvec::SmallVec;

use crate::options::{CaseFold, Flags};
use crate::regenc::*;
use crate::regint::*;
use crate::region::{Region, TreeBuilder, TreeMark};
use crate::unicode;

// ============================================================================
// State Types
// ============================================================================

/// A dynamic successor installed on a group tail's navigator slot.
#[derive(Debug, Clone, Copy)]
enum Cont {
    /// Hand control back to a GroupRepeat after one more iteration.
    Repeat { node: NodeId, count: u32, start: usize },
    /// Return into the call site of a GroupCall; `frame` is the index of
    /// the call's frame.
    Return { call: NodeId, frame: usize },
}

/// Per-group recursion guard.
#[derive(Debug, Clone, Copy)]
struct CallGuard {
    last_pos: usize,
    snapshot: u64,
    best: u64,
}

const NO_CALL: CallGuard = CallGuard {
    last_pos: usize::MAX,
    snapshot: 0,
    best: 0,
};

#[derive(Debug)]
struct CallFrame {
    guard: CallGuard,
    /// Caller's captures while the callee runs on a fresh array.
    outer: Option<SmallVec<[i32; 16]>>,
}

/// Captures and capture tree at some point of the match.
struct Snapshot {
    groups: SmallVec<[i32; 16]>,
    tree: Option<TreeMark>,
}

// ============================================================================
// MatchState
// ============================================================================

/// Mutable state of one match attempt. The program itself is never
/// written to.
pub(crate) struct MatchState {
    /// `[beg0, end0, beg1, end1, ...]`, -1 when unset.
    groups: Vec<i32>,
    /// Group entry positions and loop counters, one stack per slot.
    locals: Vec<SmallVec<[i32; 2]>>,
    nav: Vec<SmallVec<[Cont; 2]>>,
    guards: Vec<CallGuard>,
    frames: Vec<CallFrame>,

    pub(crate) from: usize,
    pub(crate) to: usize,
    pub(crate) anchoring_bounds: bool,
    pub(crate) transparent_bounds: bool,
    pub(crate) hit_end: bool,
    pub(crate) require_end: bool,
    pub(crate) first: usize,
    pub(crate) last: usize,
    accept_pos: usize,
    lookbehind_to: usize,
    accept_mode: AcceptMode,

    /// Units consumed so far, never rewound.
    activity: u64,
    tree: Option<TreeBuilder>,
    call_pending: bool,
    lookaround_depth: usize,
    scratch: HashMap<NodeId, Box<dyn Any + Send>>,
}

impl MatchState {
    pub(crate) fn new(prog: &Program, text_len: usize) -> Self {
        MatchState {
            groups: vec![-1; prog.group_count * 2],
            locals: vec![SmallVec::new(); prog.local_count],
            nav: vec![SmallVec::new(); prog.nav_count],
            guards: vec![NO_CALL; prog.group_count],
            frames: Vec::new(),
            from: 0,
            to: text_len,
            anchoring_bounds: true,
            transparent_bounds: false,
            hit_end: false,
            require_end: false,
            first: 0,
            last: 0,
            accept_pos: 0,
            lookbehind_to: 0,
            accept_mode: AcceptMode::Anywhere,
            activity: 0,
            tree: prog.flags.contains(Flags::CAPTURE_TREE).then(TreeBuilder::new),
            call_pending: false,
            lookaround_depth: 0,
            scratch: HashMap::new(),
        }
    }

    /// Clear everything a previous attempt may have left behind.
    fn prepare(&mut self, from: usize, mode: AcceptMode) {
        self.hit_end = false;
        self.require_end = false;
        self.first = from;
        self.accept_mode = mode;
        self.groups.fill(-1);
        self.locals.iter_mut().for_each(SmallVec::clear);
        self.nav.iter_mut().for_each(SmallVec::clear);
        self.guards.fill(NO_CALL);
        self.frames.clear();
        self.call_pending = false;
        self.lookaround_depth = 0;
        self.scratch.clear();
        if let Some(tree) = self.tree.as_mut() {
            tree.clear();
        }
    }

    #[cfg(test)]
    fn groups(&self) -> &[i32] {
        &self.groups
    }

    /// Spans and capture tree of the last successful attempt.
    pub(crate) fn region(&self) -> Region {
        let tree = self.tree.as_ref().map(|t| t.finish(self.first, self.last));
        Region::from_groups(&self.groups, tree)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            groups: SmallVec::from_slice(&self.groups),
            tree: self.tree.as_ref().map(TreeBuilder::mark),
        }
    }

    fn restore(&mut self, snap: &Snapshot) {
        self.groups.copy_from_slice(&snap.groups);
        if let (Some(tree), Some(mark)) = (self.tree.as_mut(), snap.tree) {
            tree.rollback(mark);
        }
    }

    fn top_local(&self, slot: usize) -> i32 {
        self.locals[slot].last().copied().unwrap_or(-1)
    }

    fn set_top_local(&mut self, slot: usize, v: i32) {
        if let Some(top) = self.locals[slot].last_mut() {
            *top = v;
        }
    }
}

// ============================================================================
// Custom node context
// ============================================================================

/// What a [`CustomNode`] sees while matching.
pub struct CustomContext<'a, 'b> {
    exec: &'b Exec<'a>,
    st: &'b mut MatchState,
    id: NodeId,
    next: NodeId,
}

impl<'a, 'b> CustomContext<'a, 'b> {
    pub fn text(&self) -> &'a [u16] {
        self.exec.text
    }

    /// Region start.
    pub fn from(&self) -> usize {
        self.st.from
    }

    /// Region end; reading at or past it must call [`Self::set_hit_end`].
    pub fn to(&self) -> usize {
        self.st.to
    }

    pub fn set_hit_end(&mut self) {
        self.st.hit_end = true;
    }

    /// Per-match scratch value of this node, created on first use.
    /// `None` if the slot already holds a value of another type.
    pub fn scratch<T: Any + Send + Default>(&mut self) -> Option<&mut T> {
        self.st
            .scratch
            .entry(self.id)
            .or_insert_with(|| Box::new(T::default()))
            .downcast_mut()
    }

    /// Run the rest of the chain from `pos`.
    pub fn next(&mut self, pos: usize) -> bool {
        self.exec.run(self.st, self.next, pos)
    }
}

// ============================================================================
// Exec
// ============================================================================

pub(crate) struct Exec<'a> {
    prog: &'a Program,
    text: &'a [u16],
}

#[inline]
fn is_word_char(c: CodePoint) -> bool {
    unicode::is_word(c)
}

#[inline]
fn is_letter_or_digit(c: CodePoint) -> bool {
    char::from_u32(c).is_some_and(char::is_alphanumeric)
}

impl<'a> Exec<'a> {
    pub(crate) fn new(prog: &'a Program, text: &'a [u16]) -> Self {
        Exec { prog, text }
    }

    fn run(&self, st: &mut MatchState, id: NodeId, i: usize) -> bool {
        let text = self.text;
        match self.prog.node(id) {
            Node::Last => {
                if st.accept_mode == AcceptMode::End && i != st.to {
                    return false;
                }
                st.last = i;
                st.groups[0] = st.first as i32;
                st.groups[1] = i as i32;
                true
            }
            Node::Accept => {
                st.accept_pos = i;
                true
            }
            Node::LookbehindEnd => i == st.lookbehind_to,

            Node::Start {
                min_length,
                supplementary,
                next,
            } => self.start(st, i, *min_length, *supplementary, *next),
            Node::BnM { bm, next } => self.bnm(st, i, bm, *next),
            Node::BnMS { bm, next } => self.bnms(st, i, bm, *next),

            // === Leaves ===
            Node::CharProperty { pred, next } => {
                if i < st.to {
                    let c = code_point_at(text, i, text.len());
                    let n = char_count(c);
                    if i + n <= st.to {
                        return pred.is(c) && self.consume(st, *next, i, n);
                    }
                }
                st.hit_end = true;
                false
            }
            Node::BmpCharProperty { pred, next } => {
                if i < st.to {
                    pred.is(text[i] as CodePoint) && self.consume(st, *next, i, 1)
                } else {
                    st.hit_end = true;
                    false
                }
            }
            Node::BitClass { bits, next } => {
                if i < st.to {
                    bitset_at(bits, text[i] as usize) && self.consume(st, *next, i, 1)
                } else {
                    st.hit_end = true;
                    false
                }
            }
            Node::Ctype { ctype, next } => {
                if i < st.to {
                    ctype.matches(text[i] as CodePoint) && self.consume(st, *next, i, 1)
                } else {
                    st.hit_end = true;
                    false
                }
            }
            Node::LineEnding { next } => self.line_ending(st, i, *next),
            Node::Slice { buf, next } => {
                for (j, &u) in buf.iter().enumerate() {
                    if i + j >= st.to {
                        st.hit_end = true;
                        return false;
                    }
                    if text[i + j] != u {
                        return false;
                    }
                }
                self.consume(st, *next, i, buf.len())
            }
            Node::SliceI { buf, next } => {
                for (j, &u) in buf.iter().enumerate() {
                    if i + j >= st.to {
                        st.hit_end = true;
                        return false;
                    }
                    let c = text[i + j];
                    if u != c && u as CodePoint != unicode::ascii_to_lower(c as CodePoint) {
                        return false;
                    }
                }
                self.consume(st, *next, i, buf.len())
            }
            Node::SliceU { buf, next } => {
                for (j, &u) in buf.iter().enumerate() {
                    if i + j >= st.to {
                        st.hit_end = true;
                        return false;
                    }
                    let c = text[i + j];
                    if u != c && u as CodePoint != unicode::fold(c as CodePoint) {
                        return false;
                    }
                }
                self.consume(st, *next, i, buf.len())
            }
            Node::SliceS { buf, fold, next } => {
                let mut x = i;
                for &want in buf.iter() {
                    if x >= st.to {
                        st.hit_end = true;
                        return false;
                    }
                    let c = code_point_at(text, x, text.len());
                    let same = c == want
                        || match fold {
                            CaseFold::None => false,
                            CaseFold::Ascii => unicode::ascii_to_lower(c) == want,
                            CaseFold::Unicode => unicode::fold(c) == want,
                        };
                    if !same {
                        return false;
                    }
                    x += char_count(c);
                    if x > st.to {
                        st.hit_end = true;
                        return false;
                    }
                }
                self.consume(st, *next, i, x - i)
            }

            // === Anchors ===
            Node::Begin { next } => {
                // Only Last and the search drivers stamp the match span.
                let from = if st.anchoring_bounds { st.from } else { 0 };
                i == from && self.run(st, *next, i)
            }
            Node::Caret { next } => {
                let (start, end) = self.anchor_bounds(st);
                // No match at the very end, even after a terminator.
                if i == end {
                    st.hit_end = true;
                    return false;
                }
                if i > start {
                    let ch = text[i - 1];
                    if !unicode::is_line_terminator(ch as CodePoint) {
                        return false;
                    }
                    if ch == CARRIAGE_RETURN_CODE && text[i] == NEWLINE_CODE {
                        return false;
                    }
                }
                self.run(st, *next, i)
            }
            Node::UnixCaret { next } => {
                let (start, end) = self.anchor_bounds(st);
                if i == end {
                    st.hit_end = true;
                    return false;
                }
                if i > start && text[i - 1] != NEWLINE_CODE {
                    return false;
                }
                self.run(st, *next, i)
            }
            Node::Dollar { multiline, next } => self.dollar(st, i, *multiline, *next),
            Node::UnixDollar { multiline, next } => self.unix_dollar(st, i, *multiline, *next),
            Node::End { next } => {
                let (_, end) = self.anchor_bounds(st);
                if i == end {
                    st.hit_end = true;
                    self.run(st, *next, i)
                } else {
                    false
                }
            }
            Node::Bound { kind, next } => self.bound(st, i).intersects(*kind) && self.run(st, *next, i),

            // === Structure ===
            Node::Branch { atoms, conn } => atoms.iter().any(|atom| match atom {
                Some(a) => self.run(st, *a, i),
                None => self.run(st, *conn, i),
            }),
            Node::BranchConn { next } => self.run(st, *next, i),
            Node::GroupHead { slot, next } => self.group_head(st, *slot, *next, i),
            Node::GroupTail { slot, nav, next } => self.group_tail(st, *slot, *nav, *next, i),

            // === Repeats ===
            Node::Curly {
                atom,
                cmin,
                cmax,
                kind,
                next,
            } => self.curly(st, i, *atom, *cmin, *cmax, *kind, *next),
            Node::GroupRepeat { nav, .. } => {
                let nav = *nav;
                st.nav[nav].push(Cont::Repeat {
                    node: id,
                    count: 0,
                    start: i,
                });
                let ok = self.repeat_continue(st, id, nav, i);
                if !ok {
                    st.nav[nav].pop();
                }
                ok
            }
            Node::Prolog { lp } => self.loop_init(st, *lp, i),
            Node::Loop { .. } => self.loop_continue(st, id, i),
            Node::Atomic { body, next } => {
                let snap = st.snapshot();
                if !self.run(st, *body, i) {
                    return false;
                }
                let end = st.accept_pos;
                if self.run(st, *next, end) {
                    true
                } else {
                    st.restore(&snap);
                    false
                }
            }

            // === Lookaround ===
            Node::Pos { cond, next } => {
                let snap = st.snapshot();
                if !self.lookahead(st, *cond, i) {
                    return false;
                }
                if self.run(st, *next, i) {
                    true
                } else {
                    st.restore(&snap);
                    false
                }
            }
            Node::Neg { cond, next } => {
                let snap = st.snapshot();
                let limit = if st.transparent_bounds { text.len() } else { st.to };
                // More input could make the body match.
                if i >= limit {
                    st.require_end = true;
                }
                if self.lookahead(st, *cond, i) {
                    st.restore(&snap);
                    return false;
                }
                self.run(st, *next, i)
            }
            Node::Behind {
                cond,
                rmin,
                rmax,
                next,
            } => self.lookbehind(st, i, *cond, *rmin, *rmax, false, false, *next),
            Node::NotBehind {
                cond,
                rmin,
                rmax,
                next,
            } => self.lookbehind(st, i, *cond, *rmin, *rmax, true, false, *next),
            Node::BehindS {
                cond,
                rmin,
                rmax,
                next,
            } => self.lookbehind(st, i, *cond, *rmin, *rmax, false, true, *next),
            Node::NotBehindS {
                cond,
                rmin,
                rmax,
                next,
            } => self.lookbehind(st, i, *cond, *rmin, *rmax, true, true, *next),
            Node::Conditional { cond, yes, no, conn } => {
                let snap = st.snapshot();
                let take = match cond {
                    CondNode::Look { cond, negate } => {
                        let matched = self.lookahead(st, *cond, i);
                        if matched && *negate {
                            st.restore(&snap);
                        }
                        matched != *negate
                    }
                    CondNode::GroupSet(g) => st.groups.get(g * 2).is_some_and(|&b| b >= 0),
                };
                let ok = match (take, no) {
                    (true, _) => self.run(st, *yes, i),
                    (false, Some(no)) => self.run(st, *no, i),
                    (false, None) => self.run(st, *conn, i),
                };
                if !ok {
                    st.restore(&snap);
                }
                ok
            }

            // === References ===
            Node::BackRef { group, next } => {
                let Some((j, k)) = self.group_span(st, *group) else {
                    return false;
                };
                let size = k - j;
                if i + size > st.to {
                    st.hit_end = true;
                    return false;
                }
                text[j..k] == text[i..i + size] && self.consume(st, *next, i, size)
            }
            Node::CIBackRef {
                group,
                unicode,
                next,
            } => {
                let Some((j, k)) = self.group_span(st, *group) else {
                    return false;
                };
                let size = k - j;
                if i + size > st.to {
                    st.hit_end = true;
                    return false;
                }
                self.ci_equal(j, k, i, *unicode) && self.consume(st, *next, i, size)
            }
            Node::GroupCall {
                group,
                target,
                isolate,
                ..
            } => match target {
                Some(t) => self.group_call(st, id, *group, *t, *isolate, i),
                None => false,
            },
            Node::Custom { node, next } => {
                let mut cx = CustomContext {
                    exec: self,
                    st,
                    id,
                    next: *next,
                };
                node.match_at(&mut cx, i)
            }
        }
    }

    #[inline]
    fn consume(&self, st: &mut MatchState, next: NodeId, i: usize, n: usize) -> bool {
        st.activity += n as u64;
        self.run(st, next, i + n)
    }

    fn group_span(&self, st: &MatchState, group: usize) -> Option<(usize, usize)> {
        let b = *st.groups.get(group * 2)?;
        let e = *st.groups.get(group * 2 + 1)?;
        (b >= 0).then_some((b as usize, e as usize))
    }

    fn ci_equal(&self, j: usize, k: usize, i: usize, unicode: bool) -> bool {
        let text = self.text;
        let (mut x1, mut x2) = (j, i);
        while x1 < k {
            let c1 = code_point_at(text, x1, k);
            let c2 = code_point_at(text, x2, text.len());
            if c1 != c2 {
                if unicode {
                    let u1 = unicode::to_upper(c1);
                    let u2 = unicode::to_upper(c2);
                    if u1 != u2 && unicode::to_lower(u1) != unicode::to_lower(u2) {
                        return false;
                    }
                } else if unicode::ascii_to_lower(c1) != unicode::ascii_to_lower(c2) {
                    return false;
                }
            }
            x1 += char_count(c1);
            x2 += char_count(c2);
        }
        true
    }

    // ========================================================================
    // Leaves and anchors
    // ========================================================================

    fn line_ending(&self, st: &mut MatchState, i: usize, next: NodeId) -> bool {
        if i >= st.to {
            st.hit_end = true;
            return false;
        }
        match self.text[i] {
            0x0A | 0x0B | 0x0C | 0x85 | 0x2028 | 0x2029 => self.consume(st, next, i, 1),
            CARRIAGE_RETURN_CODE => {
                if i + 1 < st.to {
                    // CRLF is one terminator; never split it.
                    let n = if self.text[i + 1] == NEWLINE_CODE { 2 } else { 1 };
                    self.consume(st, next, i, n)
                } else {
                    st.hit_end = true;
                    self.consume(st, next, i, 1)
                }
            }
            _ => false,
        }
    }

    fn anchor_bounds(&self, st: &MatchState) -> (usize, usize) {
        if st.anchoring_bounds {
            (st.from, st.to)
        } else {
            (0, self.text.len())
        }
    }

    fn dollar(&self, st: &mut MatchState, i: usize, multiline: bool, next: NodeId) -> bool {
        let text = self.text;
        let (_, end) = self.anchor_bounds(st);
        if !multiline {
            if i + 2 < end {
                return false;
            }
            if i + 2 == end
                && (text[i] != CARRIAGE_RETURN_CODE || text[i + 1] != NEWLINE_CODE)
            {
                return false;
            }
        }
        if i < end {
            match text[i] {
                NEWLINE_CODE => {
                    if i > 0 && text[i - 1] == CARRIAGE_RETURN_CODE {
                        return false;
                    }
                    if multiline {
                        return self.run(st, next, i);
                    }
                }
                CARRIAGE_RETURN_CODE | 0x85 | 0x2028 | 0x2029 => {
                    if multiline {
                        return self.run(st, next, i);
                    }
                }
                _ => return false,
            }
        }
        // Matched at the end, so more input could break it.
        st.hit_end = true;
        st.require_end = true;
        self.run(st, next, i)
    }

    fn unix_dollar(&self, st: &mut MatchState, i: usize, multiline: bool, next: NodeId) -> bool {
        let (_, end) = self.anchor_bounds(st);
        if i < end {
            if self.text[i] != NEWLINE_CODE {
                return false;
            }
            if multiline {
                return self.run(st, next, i);
            }
            if i + 1 != end {
                return false;
            }
        }
        st.hit_end = true;
        st.require_end = true;
        self.run(st, next, i)
    }

    fn has_base_character(&self, st: &MatchState, i: usize) -> bool {
        let start = if st.transparent_bounds { 0 } else { st.from };
        let mut x = i as isize;
        while x >= start as isize {
            let c = code_point_at(self.text, x as usize, self.text.len());
            if is_letter_or_digit(c) {
                return true;
            }
            if !unicode::is_non_spacing_mark(c) {
                return false;
            }
            x -= 1;
        }
        false
    }

    fn bound(&self, st: &mut MatchState, i: usize) -> BoundType {
        let text = self.text;
        let (start, end) = if st.transparent_bounds {
            (0, text.len())
        } else {
            (st.from, st.to)
        };
        let mut left = false;
        if i > start {
            let c = code_point_before(text, i, 0);
            left = is_word_char(c)
                || (unicode::is_non_spacing_mark(c) && self.has_base_character(st, i - 1));
        }
        let mut right = false;
        if i < end {
            let c = code_point_at(text, i, text.len());
            right = is_word_char(c)
                || (unicode::is_non_spacing_mark(c) && self.has_base_character(st, i));
        } else {
            // Another character could create or destroy the boundary.
            st.hit_end = true;
            st.require_end = true;
        }
        match (left, right) {
            (false, true) => BoundType::LEFT,
            (true, false) => BoundType::RIGHT,
            _ => BoundType::NONE,
        }
    }

    // ========================================================================
    // Groups and repeats
    // ========================================================================

    fn group_head(&self, st: &mut MatchState, slot: Option<GroupSlot>, next: NodeId, i: usize) -> bool {
        let recursion = std::mem::take(&mut st.call_pending);
        let Some(slot) = slot else {
            return self.run(st, next, i);
        };
        st.locals[slot.local].push(i as i32);
        let in_lookaround = st.lookaround_depth > 0;
        let mark = st.tree.as_mut().map(|tree| {
            let mark = tree.mark();
            tree.open(slot.group, recursion, in_lookaround);
            mark
        });
        let ok = self.run(st, next, i);
        if !ok {
            st.locals[slot.local].pop();
            if let (Some(tree), Some(mark)) = (st.tree.as_mut(), mark) {
                tree.rollback(mark);
            }
        }
        ok
    }

    fn group_tail(
        &self,
        st: &mut MatchState,
        slot: Option<GroupSlot>,
        nav: Option<usize>,
        next: NodeId,
        i: usize,
    ) -> bool {
        let Some(slot) = slot else {
            return self.tail_next(st, nav, next, i);
        };
        let Some(start) = st.locals[slot.local].pop() else {
            return false;
        };
        let g = slot.group * 2;
        let (prev_beg, prev_end) = (st.groups[g], st.groups[g + 1]);
        st.groups[g] = start;
        st.groups[g + 1] = i as i32;
        let undo = st.tree.as_mut().map(|tree| tree.close(start as usize, i));
        let ok = self.tail_next(st, nav, next, i);
        if !ok {
            st.groups[g] = prev_beg;
            st.groups[g + 1] = prev_end;
            st.locals[slot.local].push(start);
            if let (Some(tree), Some(undo)) = (st.tree.as_mut(), undo) {
                tree.reopen(undo);
            }
        }
        ok
    }

    /// Successor of a group tail: the navigator override if one applies,
    /// otherwise the static link.
    fn tail_next(&self, st: &mut MatchState, nav: Option<usize>, next: NodeId, i: usize) -> bool {
        if let Some(slot) = nav {
            match st.nav[slot].last().copied() {
                Some(Cont::Repeat { node, .. }) => return self.repeat_continue(st, node, slot, i),
                // A newer frame means this tail belongs to a nested
                // instance entered inside a later call.
                Some(Cont::Return { call, frame }) if frame + 1 == st.frames.len() => {
                    return self.call_return(st, call, slot, i)
                }
                _ => {}
            }
        }
        self.run(st, next, i)
    }

    #[allow(clippy::too_many_arguments)]
    fn curly(
        &self,
        st: &mut MatchState,
        mut i: usize,
        atom: NodeId,
        cmin: u32,
        cmax: u32,
        kind: RepeatKind,
        next: NodeId,
    ) -> bool {
        let mut j = 0;
        while j < cmin {
            if !self.run(st, atom, i) {
                return false;
            }
            i = st.accept_pos;
            j += 1;
        }
        match kind {
            RepeatKind::Greedy => {
                let mut stack: SmallVec<[usize; 16]> = SmallVec::new();
                while j < cmax && self.run(st, atom, i) {
                    let end = st.accept_pos;
                    if end == i {
                        break;
                    }
                    stack.push(i);
                    i = end;
                    j += 1;
                }
                loop {
                    if self.run(st, next, i) {
                        return true;
                    }
                    match stack.pop() {
                        Some(prev) => i = prev,
                        None => return false,
                    }
                }
            }
            RepeatKind::Lazy => loop {
                if self.run(st, next, i) {
                    return true;
                }
                if j >= cmax || !self.run(st, atom, i) || st.accept_pos == i {
                    return false;
                }
                i = st.accept_pos;
                j += 1;
            },
            RepeatKind::Possessive => {
                while j < cmax && self.run(st, atom, i) && st.accept_pos != i {
                    i = st.accept_pos;
                    j += 1;
                }
                self.run(st, next, i)
            }
        }
    }

    /// A GroupRepeat decides between one more iteration and leaving.
    fn repeat_continue(&self, st: &mut MatchState, rep: NodeId, slot: usize, i: usize) -> bool {
        let Node::GroupRepeat {
            head,
            cmin,
            cmax,
            lazy,
            next,
            ..
        } = self.prog.node(rep)
        else {
            return false;
        };
        let Some(&Cont::Repeat { count, start, .. }) = st.nav[slot].last() else {
            return false;
        };
        // An empty iteration ends the loop whatever the count.
        if count > 0 && i == start {
            return self.repeat_exit(st, slot, *next, i);
        }
        if count < *cmin {
            return self.repeat_iterate(st, rep, slot, *head, count, i);
        }
        if count >= *cmax {
            return self.repeat_exit(st, slot, *next, i);
        }
        if *lazy {
            self.repeat_exit(st, slot, *next, i) || self.repeat_iterate(st, rep, slot, *head, count, i)
        } else {
            self.repeat_iterate(st, rep, slot, *head, count, i) || self.repeat_exit(st, slot, *next, i)
        }
    }

    fn repeat_iterate(
        &self,
        st: &mut MatchState,
        rep: NodeId,
        slot: usize,
        head: NodeId,
        count: u32,
        i: usize,
    ) -> bool {
        let Some(top) = st.nav[slot].last_mut() else {
            return false;
        };
        let saved = std::mem::replace(
            top,
            Cont::Repeat {
                node: rep,
                count: count + 1,
                start: i,
            },
        );
        let ok = self.run(st, head, i);
        if !ok {
            if let Some(top) = st.nav[slot].last_mut() {
                *top = saved;
            }
        }
        ok
    }

    fn repeat_exit(&self, st: &mut MatchState, slot: usize, next: NodeId, i: usize) -> bool {
        let Some(saved) = st.nav[slot].pop() else {
            return false;
        };
        let ok = self.run(st, next, i);
        if !ok {
            st.nav[slot].push(saved);
        }
        ok
    }

    fn loop_init(&self, st: &mut MatchState, lp: NodeId, i: usize) -> bool {
        let Node::Loop {
            head,
            count_slot,
            begin_slot,
            cmin,
            lazy,
            next,
            ..
        } = self.prog.node(lp)
        else {
            return false;
        };
        let enter = |st: &mut MatchState| {
            st.locals[*count_slot].push(1);
            st.locals[*begin_slot].push(i as i32);
            let ok = self.run(st, *head, i);
            if !ok {
                st.locals[*count_slot].pop();
                st.locals[*begin_slot].pop();
            }
            ok
        };
        if *cmin > 0 {
            enter(st)
        } else if *lazy {
            self.run(st, *next, i) || enter(st)
        } else {
            enter(st) || self.run(st, *next, i)
        }
    }

    fn loop_continue(&self, st: &mut MatchState, lp: NodeId, i: usize) -> bool {
        let Node::Loop {
            head,
            count_slot,
            begin_slot,
            cmin,
            cmax,
            lazy,
            next,
        } = self.prog.node(lp)
        else {
            return false;
        };
        let (cs, bs) = (*count_slot, *begin_slot);
        let count = st.top_local(cs);
        let begin = st.top_local(bs);
        let iterate = |st: &mut MatchState| {
            st.set_top_local(cs, count + 1);
            st.set_top_local(bs, i as i32);
            let ok = self.run(st, *head, i);
            if !ok {
                st.set_top_local(cs, count);
                st.set_top_local(bs, begin);
            }
            ok
        };
        let exit = |st: &mut MatchState| {
            let (c, b) = (st.locals[cs].pop(), st.locals[bs].pop());
            let ok = self.run(st, *next, i);
            if !ok {
                st.locals[cs].extend(c);
                st.locals[bs].extend(b);
            }
            ok
        };
        // Refuse another iteration from where this one started.
        if i as i32 > begin {
            let count_u = count.max(0) as u32;
            if count_u < *cmin {
                return iterate(st);
            }
            if *lazy {
                return exit(st) || (count_u < *cmax && iterate(st));
            }
            if count_u < *cmax && iterate(st) {
                return true;
            }
        }
        exit(st)
    }

    // ========================================================================
    // Lookaround
    // ========================================================================

    /// Run a lookahead body with transparent bounds applied.
    fn lookahead(&self, st: &mut MatchState, cond: NodeId, i: usize) -> bool {
        let saved_to = st.to;
        if st.transparent_bounds {
            st.to = self.text.len();
        }
        st.lookaround_depth += 1;
        let matched = self.run(st, cond, i);
        st.lookaround_depth -= 1;
        st.to = saved_to;
        matched
    }

    #[allow(clippy::too_many_arguments)]
    fn lookbehind(
        &self,
        st: &mut MatchState,
        i: usize,
        cond: NodeId,
        rmin: usize,
        rmax: usize,
        negate: bool,
        supplementary: bool,
        next: NodeId,
    ) -> bool {
        let text = self.text;
        let (rmin, rmax) = if supplementary {
            (
                count_units_backward(text, i, rmin, 0),
                count_units_backward(text, i, rmax, 0),
            )
        } else {
            (rmin, rmax)
        };
        let saved_from = st.from;
        let saved_lbt = st.lookbehind_to;
        let start = if st.transparent_bounds { 0 } else { st.from };
        let from = i.saturating_sub(rmax).max(start) as isize;
        st.lookbehind_to = i;
        if st.transparent_bounds {
            st.from = 0;
        }
        let snap = st.snapshot();
        st.lookaround_depth += 1;
        let mut matched = false;
        let mut j = i as isize - rmin as isize;
        while j >= from {
            if self.run(st, cond, j as usize) {
                matched = true;
                break;
            }
            j -= if supplementary && j > from {
                count_units_backward(text, j as usize, 1, 0) as isize
            } else {
                1
            };
        }
        st.lookaround_depth -= 1;
        st.from = saved_from;
        st.lookbehind_to = saved_lbt;

        if matched == negate {
            if matched {
                st.restore(&snap);
            }
            return false;
        }
        if self.run(st, next, i) {
            true
        } else {
            st.restore(&snap);
            false
        }
    }

    // ========================================================================
    // Recursive calls
    // ========================================================================

    fn group_call(
        &self,
        st: &mut MatchState,
        id: NodeId,
        group: usize,
        target: CallTarget,
        isolate: bool,
        i: usize,
    ) -> bool {
        let saved = st.guards[group];
        let now = st.activity;
        st.guards[group] = if saved.last_pos == i {
            // Same position again: only allowed with more progress.
            let progress = now - saved.snapshot;
            if progress <= saved.best {
                return false;
            }
            CallGuard {
                last_pos: i,
                snapshot: now,
                best: progress,
            }
        } else {
            CallGuard {
                last_pos: i,
                snapshot: now,
                best: 0,
            }
        };
        let outer = isolate.then(|| {
            let outer = SmallVec::from_slice(&st.groups);
            st.groups.fill(-1);
            outer
        });
        st.frames.push(CallFrame { guard: saved, outer });
        let frame = st.frames.len() - 1;
        st.nav[target.nav].push(Cont::Return { call: id, frame });
        st.call_pending = true;

        let ok = self.run(st, target.head, i);
        if !ok {
            st.call_pending = false;
            st.nav[target.nav].pop();
            if let Some(outer) = st.frames.pop().and_then(|f| f.outer) {
                st.groups.copy_from_slice(&outer);
            }
            st.guards[group] = saved;
        }
        ok
    }

    /// The callee's tail was reached: resume after the call site.
    fn call_return(&self, st: &mut MatchState, call: NodeId, slot: usize, i: usize) -> bool {
        let Node::GroupCall { group, next, .. } = self.prog.node(call) else {
            return false;
        };
        let g = *group;
        let Some(cont) = st.nav[slot].pop() else {
            return false;
        };
        let Some(frame) = st.frames.pop() else {
            st.nav[slot].push(cont);
            return false;
        };
        let callee_guard = std::mem::replace(&mut st.guards[g], frame.guard);
        let callee_groups = frame.outer.as_ref().map(|outer| {
            let inner: SmallVec<[i32; 16]> = SmallVec::from_slice(&st.groups);
            let span = (st.groups[g * 2], st.groups[g * 2 + 1]);
            st.groups.copy_from_slice(outer);
            st.groups[g * 2] = span.0;
            st.groups[g * 2 + 1] = span.1;
            inner
        });

        let ok = self.run(st, *next, i);
        if !ok {
            if let Some(inner) = callee_groups {
                st.groups.copy_from_slice(&inner);
            }
            st.guards[g] = callee_guard;
            st.frames.push(frame);
            st.nav[slot].push(cont);
        }
        ok
    }

    // ========================================================================
    // Search drivers
    // ========================================================================

    fn found(&self, st: &mut MatchState, first: usize) -> bool {
        st.first = first;
        st.groups[0] = first as i32;
        st.groups[1] = st.last as i32;
        true
    }

    fn start(
        &self,
        st: &mut MatchState,
        mut i: usize,
        min_length: usize,
        supplementary: bool,
        next: NodeId,
    ) -> bool {
        let text = self.text;
        let Some(guard) = st.to.checked_sub(min_length) else {
            st.hit_end = true;
            return false;
        };
        while i <= guard {
            if self.run(st, next, i) {
                return self.found(st, i);
            }
            if i == guard {
                break;
            }
            // Never start inside a surrogate pair.
            i += if supplementary
                && is_high_surrogate(text[i])
                && i + 1 < text.len()
                && is_low_surrogate(text[i + 1])
            {
                2
            } else {
                1
            };
        }
        st.hit_end = true;
        false
    }

    fn bnm(&self, st: &mut MatchState, mut i: usize, bm: &BoyerMoore, next: NodeId) -> bool {
        let text = self.text;
        let len = bm.pattern.len();
        let Some(last) = st.to.checked_sub(len) else {
            st.hit_end = true;
            return false;
        };
        'next: while i <= last {
            for j in (0..len).rev() {
                let ch = text[i + j] as u32;
                if ch != bm.pattern[j] {
                    let bad = (j + 1) as isize - bm.last_occ[(ch & 0x7F) as usize] as isize;
                    i += bad.max(bm.opto_sft[j] as isize) as usize;
                    continue 'next;
                }
            }
            st.first = i;
            if self.consume(st, next, i, len) {
                return self.found(st, i);
            }
            i += 1;
        }
        st.hit_end = true;
        false
    }

    fn bnms(&self, st: &mut MatchState, mut i: usize, bm: &BoyerMoore, next: NodeId) -> bool {
        let text = self.text;
        let len = bm.pattern.len();
        let Some(last) = st.to.checked_sub(bm.unit_len) else {
            st.hit_end = true;
            return false;
        };
        'next: while i <= last {
            let mut j = count_units_forward(text, i, len, text.len());
            let mut x = len;
            while j > 0 && x > 0 {
                let ch = code_point_before(text, i + j, i);
                x -= 1;
                if ch != bm.pattern[x] {
                    let bad = (x + 1) as isize - bm.last_occ[(ch & 0x7F) as usize] as isize;
                    let n = bad.max(bm.opto_sft[x] as isize) as usize;
                    i += count_units_forward(text, i, n, text.len()).max(1);
                    continue 'next;
                }
                j -= char_count(ch);
            }
            if j == 0 {
                st.first = i;
                if self.consume(st, next, i, bm.unit_len) {
                    return self.found(st, i);
                }
            }
            i += count_units_forward(text, i, 1, text.len()).max(1);
        }
        st.hit_end = true;
        false
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Unanchored search from `from`, leftmost match wins.
pub(crate) fn search(prog: &Program, text: &[u16], st: &mut MatchState, from: usize) -> bool {
    st.prepare(from, AcceptMode::Anywhere);
    let found = Exec::new(prog, text).run(st, prog.root, from);
    if !found {
        log_debug!(
            "search from {} failed: hit_end={} require_end={}",
            from,
            st.hit_end,
            st.require_end
        );
    }
    found
}

/// Match anchored at `from`; with `AcceptMode::End` the match must also
/// reach the region end.
pub(crate) fn match_at(
    prog: &Program,
    text: &[u16],
    st: &mut MatchState,
    from: usize,
    mode: AcceptMode,
) -> bool {
    st.prepare(from, mode);
    Exec::new(prog, text).run(st, prog.match_root, from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regcomp::compile_pattern;

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn search_groups(pattern: &str, flags: Flags, s: &str) -> Option<Vec<i32>> {
        let prog = compile_pattern(pattern, flags).unwrap();
        let text = units(s);
        let mut st = MatchState::new(&prog, text.len());
        search(&prog, &text, &mut st, 0).then(|| st.groups().to_vec())
    }

    fn find(pattern: &str, s: &str) -> Option<Vec<i32>> {
        search_groups(pattern, Flags::empty(), s)
    }

    #[test]
    fn literal_and_classes() {
        assert_eq!(find("bc", "abcd"), Some(vec![1, 3]));
        assert_eq!(find("[c-e]+", "abcdef"), Some(vec![2, 5]));
        assert_eq!(find(r"\d\d", "a1b22"), Some(vec![3, 5]));
        assert_eq!(find("x", "abc"), None);
    }

    #[test]
    fn greedy_lazy_possessive() {
        assert_eq!(find("a{1,3}", "aaaa"), Some(vec![0, 3]));
        assert_eq!(find("a{1,3}?b", "aaab"), Some(vec![0, 4]));
        assert_eq!(find("a{1,3}?", "aaaa"), Some(vec![0, 1]));
        assert_eq!(find("a*+a", "aaaa"), None);
        assert_eq!(find("a*a", "aaaa"), Some(vec![0, 4]));
    }

    #[test]
    fn zero_width_bodies_terminate() {
        assert_eq!(find("(?:)*x", "x"), Some(vec![0, 1]));
        assert_eq!(find("(a?)*", "b"), Some(vec![0, 0, 0, 0]));
        assert_eq!(find("(?:a|)*b", "aab"), Some(vec![0, 3]));
        assert_eq!(find("(?:\\b)*x", "x"), Some(vec![0, 1]));
    }

    #[test]
    fn group_repeat_captures_last_iteration() {
        assert_eq!(find("(a|b)*c", "abac"), Some(vec![0, 4, 2, 3]));
        assert_eq!(find("(a|b)*?c", "abc"), Some(vec![0, 3, 1, 2]));
        assert_eq!(find("(a|bc){2}", "abca"), Some(vec![0, 3, 1, 3]));
    }

    #[test]
    fn atomic_commits() {
        assert_eq!(find("(?>a+)a", "aaaa"), None);
        assert_eq!(find("(?>a|ab)c", "abc"), None);
        assert_eq!(find("(?>(a))b|(a)c", "ac"), Some(vec![0, 2, -1, -1, 0, 1]));
    }

    #[test]
    fn lookahead_keeps_captures_on_success() {
        assert_eq!(find("(?=(a))a", "a"), Some(vec![0, 1, 0, 1]));
        assert_eq!(find("(?=(a))ax|ab", "ab"), Some(vec![0, 2, -1, -1]));
        assert_eq!(find("(?!(a))b", "b"), Some(vec![0, 1, -1, -1]));
    }

    #[test]
    fn lookbehind() {
        assert_eq!(find(r"(?<=\d{3})foo", "123foo"), Some(vec![3, 6]));
        assert_eq!(find(r"(?<=\d{3})foo", "12foo"), None);
        assert_eq!(find("(?<!a)b", "ab cb"), Some(vec![4, 5]));
        assert_eq!(find("(?<=\u{1F600})x", "\u{1F600}x"), Some(vec![2, 3]));
    }

    #[test]
    fn conditional_rolls_back() {
        assert_eq!(find("(a)?(?(1)b|c)", "ab"), Some(vec![0, 2, 0, 1]));
        assert_eq!(find("(a)?(?(1)b|c)", "c"), Some(vec![0, 1, -1, -1]));
        assert_eq!(find("(?(?=(a))ax|c)", "c"), Some(vec![0, 1, -1, -1]));
    }

    #[test]
    fn backrefs() {
        assert_eq!(find(r"(a)\1", "aa"), Some(vec![0, 2, 0, 1]));
        assert!(search_groups(r"(?i)(a)\1", Flags::empty(), "aA").is_some());
        assert!(search_groups(r"(?i)(a)\1", Flags::empty(), "ab").is_none());
        assert_eq!(find(r"(b)?\1", "x"), None);
    }

    #[test]
    fn recursion() {
        assert_eq!(find("^(a(?1)?b)$", "aabb"), Some(vec![0, 4, 0, 4]));
        assert_eq!(find("^(a(?1)?b)$", "aab"), None);
        assert_eq!(find("((?1)a|b)", "ba"), Some(vec![0, 2, 0, 2]));
        assert_eq!(find("((?1)a|b)", "c"), None);
    }

    #[test]
    fn recursion_inside_loop() {
        assert_eq!(find("^(?:(a(?1)?b))*$", "abaabb"), Some(vec![0, 6, 2, 6]));
    }

    #[test]
    fn search_sets_hit_end() {
        let prog = compile_pattern("abc", Flags::empty()).unwrap();
        let text = units("xxab");
        let mut st = MatchState::new(&prog, text.len());
        assert!(!search(&prog, &text, &mut st, 0));
        assert!(st.hit_end);
    }

    #[test]
    fn anchored_end_mode() {
        let prog = compile_pattern("a+", Flags::empty()).unwrap();
        let text = units("aab");
        let mut st = MatchState::new(&prog, text.len());
        assert!(!match_at(&prog, &text, &mut st, 0, AcceptMode::End));
        assert!(match_at(&prog, &text, &mut st, 0, AcceptMode::Anywhere));
        assert_eq!(st.last, 2);
    }

    #[test]
    fn state_is_clean_after_failure() {
        let prog = compile_pattern("(a(?1)?b)|(?>(c)+)d|(?=(e))f", Flags::CAPTURE_TREE).unwrap();
        let text = units("aa ccc e");
        let mut st = MatchState::new(&prog, text.len());
        assert!(!search(&prog, &text, &mut st, 0));
        assert!(st.groups.iter().all(|&g| g == -1));
        assert!(st.locals.iter().all(SmallVec::is_empty));
        assert!(st.nav.iter().all(SmallVec::is_empty));
        assert!(st.frames.is_empty());
        assert_eq!(st.region().tree.map(|t| t.len()), Some(1));
    }
}

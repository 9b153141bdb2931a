// regparse.rs - Pattern front end.
// Recursive-descent parser turning pattern text into a flag-resolved Ast.
//
// Structure: cursor helpers -> numbers and names -> escapes -> character
// classes -> groups -> quantifiers -> sequences and alternation.

use memchr::memmem;

use crate::error::*;
use crate::options::{CaseFold, Flags};
use crate::regenc::{
    is_high_surrogate, is_low_surrogate, to_code_point, CodePoint, MAX_CODE_POINT,
};
use crate::regint::{
    bitset_add, bitset_set_bit, BitSet, CharPredicate, RepeatKind, BITSET_REAL_SIZE,
    MAX_REPEAT_NUM, REPEAT_INFINITE, SINGLE_BYTE_SIZE,
};
use crate::regparse_types::*;
use crate::unicode::{self, Ctype, UnicodeClass};

/// Parse `pattern` under `flags`.
pub fn parse(pattern: &str, flags: Flags) -> Result<ParsedPattern, RegexError> {
    let mut parser = Parser::new(pattern, flags);
    let ast = if flags.contains(Flags::LITERAL) {
        parser.literal_pattern()
    } else {
        parser.parse_top()?
    };
    Ok(ParsedPattern {
        ast,
        capture_count: parser.capture_count,
        names: parser.names,
    })
}

enum ClassItem {
    Char(CodePoint),
    Pred(CharPredicate),
}

struct Parser<'p> {
    pattern: &'p str,
    pos: usize,
    flags: Flags,
    capture_count: usize,
    names: Vec<(String, usize)>,
}

impl<'p> Parser<'p> {
    fn new(pattern: &'p str, flags: Flags) -> Self {
        Parser {
            pattern,
            pos: 0,
            flags,
            capture_count: 0,
            names: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    #[inline]
    fn rest(&self) -> &'p str {
        &self.pattern[self.pos..]
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char, code: i32, at: usize) -> Result<(), RegexError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(RegexError::syntax(code, at))
        }
    }

    /// Skip whitespace and `#` comments in COMMENTS mode.
    fn skip_extended(&mut self) {
        if !self.flags.contains(Flags::COMMENTS) {
            return;
        }
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn literal(&self, cp: CodePoint) -> Ast {
        Ast::Literal {
            cp,
            fold: self.flags.case_fold(),
        }
    }

    fn literal_pattern(&mut self) -> Ast {
        let items: Vec<Ast> = self
            .pattern
            .chars()
            .map(|c| self.literal(c as CodePoint))
            .collect();
        self.pos = self.pattern.len();
        seq_of(items)
    }

    // ------------------------------------------------------------------
    // Numbers and names
    // ------------------------------------------------------------------

    fn parse_decimal(&mut self) -> Option<u64> {
        let mut n: Option<u64> = None;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            self.bump();
            n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as u64));
        }
        n
    }

    fn parse_hex(&mut self, max_digits: usize) -> Option<u32> {
        let mut n: u32 = 0;
        let mut count = 0;
        while count < max_digits {
            let Some(d) = self.peek().and_then(|c| c.to_digit(16)) else {
                break;
            };
            self.bump();
            n = n.saturating_mul(16).saturating_add(d);
            count += 1;
        }
        (count > 0).then_some(n)
    }

    fn parse_name(&mut self, term: char, start: usize) -> Result<String, RegexError> {
        let name_start = self.pos;
        loop {
            match self.bump() {
                None => return Err(RegexError::syntax(ERR_END_PATTERN_IN_GROUP, start)),
                Some(c) if c == term => break,
                Some(_) => {}
            }
        }
        let name = &self.pattern[name_start..self.pos - term.len_utf8()];
        let mut chars = name.chars();
        match chars.next() {
            None => Err(RegexError::syntax(ERR_EMPTY_GROUP_NAME, name_start)),
            Some(c) if !(c.is_alphabetic() || c == '_') => Err(RegexError::syntax_with(
                ERR_INVALID_GROUP_NAME,
                name_start,
                name,
            )),
            Some(_) if !chars.all(|c| c.is_alphanumeric() || c == '_') => Err(
                RegexError::syntax_with(ERR_INVALID_GROUP_NAME, name_start, name),
            ),
            Some(_) => Ok(name.to_string()),
        }
    }

    // ------------------------------------------------------------------
    // Escapes
    // ------------------------------------------------------------------

    /// Escapes that stand for a single code point, shared by classes and
    /// the top level. `c` is the character after the backslash.
    fn escape_literal(&mut self, c: char, start: usize) -> Result<CodePoint, RegexError> {
        let cp = match c {
            't' => 0x09,
            'n' => 0x0A,
            'r' => 0x0D,
            'f' => 0x0C,
            'a' => 0x07,
            'e' => 0x1B,
            '0' => {
                let mut n: u32 = 0;
                let mut count = 0;
                while count < 3 {
                    let Some(d) = self.peek().and_then(|c| c.to_digit(8)) else {
                        break;
                    };
                    if n * 8 + d > 0xFF {
                        break;
                    }
                    self.bump();
                    n = n * 8 + d;
                    count += 1;
                }
                n
            }
            'x' => {
                if self.eat('{') {
                    let n = self
                        .parse_hex(8)
                        .ok_or_else(|| RegexError::syntax(ERR_META_CODE_SYNTAX, start))?;
                    self.expect('}', ERR_META_CODE_SYNTAX, start)?;
                    n
                } else {
                    let at = self.pos;
                    let n = self
                        .parse_hex(2)
                        .ok_or_else(|| RegexError::syntax(ERR_META_CODE_SYNTAX, start))?;
                    if self.pos - at != 2 {
                        return Err(RegexError::syntax(ERR_META_CODE_SYNTAX, start));
                    }
                    n
                }
            }
            'u' => {
                let at = self.pos;
                let high = self
                    .parse_hex(4)
                    .ok_or_else(|| RegexError::syntax(ERR_META_CODE_SYNTAX, start))?;
                if self.pos - at != 4 {
                    return Err(RegexError::syntax(ERR_META_CODE_SYNTAX, start));
                }
                if is_high_surrogate(high as u16) && self.rest().starts_with("\\u") {
                    let save = self.pos;
                    self.pos += 2;
                    match self.parse_hex(4) {
                        Some(low) if self.pos - save == 6 && is_low_surrogate(low as u16) => {
                            return Ok(to_code_point(high as u16, low as u16));
                        }
                        _ => self.pos = save,
                    }
                }
                high
            }
            'c' => {
                let x = self
                    .bump()
                    .ok_or_else(|| RegexError::syntax(ERR_END_PATTERN_AT_CONTROL, start))?;
                (x as u32) ^ 64
            }
            c if !c.is_alphanumeric() => c as CodePoint,
            c => {
                return Err(RegexError::syntax_with(
                    ERR_UNDEFINED_OPERATOR,
                    start,
                    &format!("\\{}", c),
                ))
            }
        };
        if cp > MAX_CODE_POINT {
            return Err(RegexError::syntax(ERR_INVALID_CODE_POINT_VALUE, start));
        }
        Ok(cp)
    }

    /// Predefined class escapes (`\d \w \s \h \v \p` and negations).
    fn escape_class(&mut self, c: char, start: usize) -> Result<Option<CharPredicate>, RegexError> {
        let pred = match c {
            'd' => CharPredicate::Ctype(Ctype::Digit),
            'D' => CharPredicate::Ctype(Ctype::Digit).negate(),
            'w' => CharPredicate::Ctype(Ctype::Word),
            'W' => CharPredicate::Ctype(Ctype::Word).negate(),
            's' => CharPredicate::Ctype(Ctype::Space),
            'S' => CharPredicate::Ctype(Ctype::Space).negate(),
            'h' => CharPredicate::HorizWs,
            'H' => CharPredicate::HorizWs.negate(),
            'v' => CharPredicate::VertWs,
            'V' => CharPredicate::VertWs.negate(),
            'p' | 'P' => self.parse_property(c == 'P', start)?,
            _ => return Ok(None),
        };
        Ok(Some(pred))
    }

    fn parse_property(&mut self, mut negate: bool, start: usize) -> Result<CharPredicate, RegexError> {
        let name = if self.eat('{') {
            if self.eat('^') {
                negate = !negate;
            }
            let name_start = self.pos;
            let end = self
                .rest()
                .find('}')
                .ok_or_else(|| RegexError::syntax(ERR_INVALID_CHAR_PROPERTY_NAME, start))?;
            self.pos += end + 1;
            &self.pattern[name_start..name_start + end]
        } else {
            let name_start = self.pos;
            self.bump()
                .ok_or_else(|| RegexError::syntax(ERR_INVALID_CHAR_PROPERTY_NAME, start))?;
            &self.pattern[name_start..self.pos]
        };
        let pred = if let Some(ct) = Ctype::from_name(name) {
            CharPredicate::Ctype(ct)
        } else if let Some(uc) = UnicodeClass::from_name(name) {
            CharPredicate::Unicode(uc)
        } else {
            return Err(RegexError::syntax_with(
                ERR_INVALID_CHAR_PROPERTY_NAME,
                start,
                name,
            ));
        };
        Ok(if negate { pred.negate() } else { pred })
    }

    /// `\Q...\E`: everything up to `\E` (or the end) is literal.
    fn parse_quoted(&mut self) -> Ast {
        let rest = self.rest();
        let len = memmem::find(rest.as_bytes(), b"\\E").unwrap_or(rest.len());
        let items: Vec<Ast> = rest[..len]
            .chars()
            .map(|c| self.literal(c as CodePoint))
            .collect();
        self.pos += len;
        self.eat_str("\\E");
        seq_of(items)
    }

    fn parse_backref_number(&mut self, first: u32) -> usize {
        let mut n = first as usize;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            let next = n * 10 + d as usize;
            if next > self.capture_count {
                break;
            }
            self.bump();
            n = next;
        }
        n
    }

    fn parse_escape(&mut self, start: usize) -> Result<Ast, RegexError> {
        let c = self
            .bump()
            .ok_or_else(|| RegexError::syntax(ERR_END_PATTERN_AT_ESCAPE, start))?;
        if let Some(pred) = self.escape_class(c, start)? {
            return Ok(Ast::Class(pred));
        }
        let unix = self.flags.contains(Flags::UNIX_LINES);
        let ast = match c {
            'R' => Ast::LineEnding,
            'b' => Ast::Anchor(AnchorType::WordBoundary),
            'B' => Ast::Anchor(AnchorType::NotWordBoundary),
            'A' => Ast::Anchor(AnchorType::Begin),
            'z' => Ast::Anchor(AnchorType::End),
            'Z' => Ast::Anchor(AnchorType::Dollar {
                multiline: false,
                unix,
            }),
            'Q' => self.parse_quoted(),
            'k' => {
                let term = match self.bump() {
                    Some('<') => '>',
                    Some('{') => '}',
                    Some('\'') => '\'',
                    _ => return Err(RegexError::syntax(ERR_INVALID_BACKREF, start)),
                };
                let name = self.parse_name(term, start)?;
                Ast::BackRef {
                    target: GroupRef::Name(name),
                    fold: self.flags.case_fold(),
                }
            }
            '1'..='9' => {
                let n = self.parse_backref_number(c as u32 - '0' as u32);
                Ast::BackRef {
                    target: GroupRef::Number(n),
                    fold: self.flags.case_fold(),
                }
            }
            c => {
                let cp = self.escape_literal(c, start)?;
                self.literal(cp)
            }
        };
        Ok(ast)
    }

    // ------------------------------------------------------------------
    // Character classes
    // ------------------------------------------------------------------

    fn parse_class(&mut self, start: usize) -> Result<CharPredicate, RegexError> {
        let negate = self.eat('^');
        let pred = self.parse_class_body(start, true)?;
        Ok(if negate { pred.negate() } else { pred })
    }

    fn class_item(&mut self, start: usize) -> Result<ClassItem, RegexError> {
        let c = self
            .bump()
            .ok_or_else(|| RegexError::syntax(ERR_PREMATURE_END_OF_CHAR_CLASS, start))?;
        if c != '\\' {
            return Ok(ClassItem::Char(c as CodePoint));
        }
        let e = self
            .bump()
            .ok_or_else(|| RegexError::syntax(ERR_END_PATTERN_AT_ESCAPE, start))?;
        if let Some(pred) = self.escape_class(e, start)? {
            return Ok(ClassItem::Pred(pred));
        }
        Ok(ClassItem::Char(self.escape_literal(e, start)?))
    }

    /// Parse class members up to and including the closing `]`.
    fn parse_class_body(&mut self, start: usize, leading: bool) -> Result<CharPredicate, RegexError> {
        let fold = self.flags.case_fold();
        let mut set = ClassSet::new(fold);
        let mut first = leading;
        loop {
            let Some(c) = self.peek() else {
                return Err(RegexError::syntax(ERR_PREMATURE_END_OF_CHAR_CLASS, start));
            };
            match c {
                ']' if !first => {
                    self.bump();
                    break;
                }
                '[' => {
                    self.bump();
                    let inner = self.parse_class(start)?;
                    set.items.push(inner);
                }
                '&' if self.rest().starts_with("&&") => {
                    self.pos += 2;
                    let left = set.finish();
                    let right = self.parse_class_body(start, false)?;
                    return Ok(CharPredicate::Intersection(vec![left, right]));
                }
                _ => {
                    let item_start = self.pos;
                    let lo = self.class_item(start)?;
                    let is_range = self.peek() == Some('-')
                        && !matches!(self.peek_nth(1), None | Some(']') | Some('['));
                    match (lo, is_range) {
                        (ClassItem::Char(lo), true) => {
                            self.bump();
                            let hi = match self.class_item(start)? {
                                ClassItem::Char(hi) => hi,
                                ClassItem::Pred(_) => {
                                    return Err(RegexError::syntax(
                                        ERR_CHAR_CLASS_VALUE_AT_START_OF_RANGE,
                                        item_start,
                                    ))
                                }
                            };
                            if hi < lo {
                                return Err(RegexError::syntax(
                                    ERR_EMPTY_RANGE_IN_CHAR_CLASS,
                                    item_start,
                                ));
                            }
                            set.add_range(lo, hi);
                        }
                        (ClassItem::Char(c), false) => set.add_single(c),
                        (ClassItem::Pred(_), true) => {
                            return Err(RegexError::syntax(
                                ERR_CHAR_CLASS_VALUE_AT_START_OF_RANGE,
                                item_start,
                            ))
                        }
                        (ClassItem::Pred(p), false) => set.items.push(p),
                    }
                }
            }
            first = false;
        }
        Ok(set.finish())
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    fn next_capture(&mut self) -> usize {
        self.capture_count += 1;
        self.capture_count
    }

    /// Parse an alternation up to the closing `)`, restoring `outer`
    /// flags afterwards.
    fn parse_group_body(&mut self, start: usize, outer: Flags) -> Result<Ast, RegexError> {
        let body = self.parse_alt()?;
        self.flags = outer;
        self.expect(')', ERR_END_PATTERN_WITH_UNMATCHED_PARENTHESIS, start)?;
        Ok(body)
    }

    fn parse_call_number(&mut self, start: usize) -> Result<usize, RegexError> {
        let sign = if self.eat('+') {
            1
        } else if self.eat('-') {
            -1
        } else {
            0
        };
        let n = self
            .parse_decimal()
            .ok_or_else(|| RegexError::syntax(ERR_UNDEFINED_GROUP_OPTION, start))?;
        let n = usize::try_from(n).map_err(|_| RegexError::syntax(ERR_TOO_BIG_NUMBER, start))?;
        let group = match sign {
            1 => self.capture_count.saturating_add(n),
            -1 => {
                if n == 0 || n > self.capture_count {
                    return Err(RegexError::syntax(ERR_UNDEFINED_GROUP_REFERENCE, start));
                }
                self.capture_count + 1 - n
            }
            _ => n,
        };
        self.expect(')', ERR_END_PATTERN_IN_GROUP, start)?;
        Ok(group)
    }

    fn parse_condition(&mut self, start: usize) -> Result<Condition, RegexError> {
        let outer = self.flags;
        let look = if self.eat_str("?=") {
            Some(false)
        } else if self.eat_str("?!") {
            Some(true)
        } else {
            None
        };
        if let Some(negate) = look {
            let body = self.parse_group_body(start, outer)?;
            return Ok(Condition::Look {
                negate,
                body: Box::new(body),
            });
        }
        if let Some(n) = self.parse_decimal() {
            self.expect(')', ERR_INVALID_IF_ELSE_SYNTAX, start)?;
            return Ok(Condition::Group(GroupRef::Number(n as usize)));
        }
        let name = if self.eat('<') {
            let name = self.parse_name('>', start)?;
            self.expect(')', ERR_INVALID_IF_ELSE_SYNTAX, start)?;
            name
        } else if self.eat('\'') {
            let name = self.parse_name('\'', start)?;
            self.expect(')', ERR_INVALID_IF_ELSE_SYNTAX, start)?;
            name
        } else {
            self.parse_name(')', start)?
        };
        Ok(Condition::Group(GroupRef::Name(name)))
    }

    fn parse_conditional(&mut self, start: usize, outer: Flags) -> Result<Ast, RegexError> {
        let cond = self.parse_condition(start)?;
        let yes = self.parse_seq()?;
        let no = if self.eat('|') {
            Some(Box::new(self.parse_seq()?))
        } else {
            None
        };
        if self.peek() == Some('|') {
            return Err(RegexError::syntax(ERR_INVALID_IF_ELSE_SYNTAX, start));
        }
        self.flags = outer;
        self.expect(')', ERR_END_PATTERN_WITH_UNMATCHED_PARENTHESIS, start)?;
        Ok(Ast::Conditional {
            cond,
            yes: Box::new(yes),
            no,
        })
    }

    fn named_capture(&mut self, term: char, start: usize, outer: Flags) -> Result<Ast, RegexError> {
        let name_at = self.pos;
        let name = self.parse_name(term, start)?;
        if self.names.iter().any(|(n, _)| *n == name) {
            return Err(RegexError::syntax_with(ERR_MULTIPLEX_DEFINED_NAME, name_at, &name));
        }
        let group = self.next_capture();
        self.names.push((name, group));
        let body = self.parse_group_body(start, outer)?;
        Ok(Ast::capture(group, body))
    }

    fn look(&mut self, kind: LookKind, start: usize, outer: Flags) -> Result<Ast, RegexError> {
        let body = self.parse_group_body(start, outer)?;
        Ok(Ast::Look {
            kind,
            body: Box::new(body),
        })
    }

    /// Parse after `(`. Returns `None` for groups that only change flags
    /// or hold a comment.
    fn parse_group(&mut self, start: usize) -> Result<Option<Ast>, RegexError> {
        let outer = self.flags;
        if !self.eat('?') {
            let group = self.next_capture();
            let body = self.parse_group_body(start, outer)?;
            return Ok(Some(Ast::capture(group, body)));
        }
        let c = self
            .peek()
            .ok_or_else(|| RegexError::syntax(ERR_END_PATTERN_IN_GROUP, start))?;
        let ast = match c {
            ':' => {
                self.bump();
                let body = self.parse_group_body(start, outer)?;
                Ast::Group {
                    kind: GroupKind::NonCapture,
                    body: Box::new(body),
                }
            }
            '=' => {
                self.bump();
                self.look(LookKind::Ahead, start, outer)?
            }
            '!' => {
                self.bump();
                self.look(LookKind::NegAhead, start, outer)?
            }
            '>' => {
                self.bump();
                Ast::Atomic(Box::new(self.parse_group_body(start, outer)?))
            }
            '<' => {
                self.bump();
                if self.eat('=') {
                    self.look(LookKind::Behind, start, outer)?
                } else if self.eat('!') {
                    self.look(LookKind::NegBehind, start, outer)?
                } else {
                    self.named_capture('>', start, outer)?
                }
            }
            '\'' => {
                self.bump();
                self.named_capture('\'', start, outer)?
            }
            'P' => {
                self.bump();
                if self.eat('<') {
                    self.named_capture('>', start, outer)?
                } else if self.eat('>') {
                    Ast::Call(GroupRef::Name(self.parse_name(')', start)?))
                } else if self.eat('=') {
                    Ast::BackRef {
                        target: GroupRef::Name(self.parse_name(')', start)?),
                        fold: self.flags.case_fold(),
                    }
                } else {
                    return Err(RegexError::syntax(ERR_UNDEFINED_GROUP_OPTION, start));
                }
            }
            '&' => {
                self.bump();
                Ast::Call(GroupRef::Name(self.parse_name(')', start)?))
            }
            'R' => {
                self.bump();
                self.expect(')', ERR_END_PATTERN_IN_GROUP, start)?;
                Ast::Call(GroupRef::Number(0))
            }
            '0'..='9' | '+' => Ast::Call(GroupRef::Number(self.parse_call_number(start)?)),
            '-' if self.peek_nth(1).is_some_and(|d| d.is_ascii_digit()) => {
                Ast::Call(GroupRef::Number(self.parse_call_number(start)?))
            }
            '(' => {
                self.bump();
                self.parse_conditional(start, outer)?
            }
            '#' => {
                while let Some(c) = self.bump() {
                    if c == ')' {
                        return Ok(None);
                    }
                }
                return Err(RegexError::syntax(ERR_END_PATTERN_IN_GROUP, start));
            }
            _ => return self.parse_flag_group(start, outer),
        };
        Ok(Some(ast))
    }

    /// `(?imsuxd-imsuxd)` or `(?imsuxd-imsuxd:...)`.
    fn parse_flag_group(&mut self, start: usize, outer: Flags) -> Result<Option<Ast>, RegexError> {
        let mut flags = self.flags;
        let mut on = true;
        loop {
            match self.bump() {
                Some(')') => {
                    self.flags = flags;
                    return Ok(None);
                }
                Some(':') => {
                    self.flags = flags;
                    let body = self.parse_group_body(start, outer)?;
                    return Ok(Some(Ast::Group {
                        kind: GroupKind::NonCapture,
                        body: Box::new(body),
                    }));
                }
                Some('-') if on => on = false,
                Some(c) => match Flags::from_inline(c) {
                    Some(f) => flags.set(f, on),
                    None => {
                        return Err(RegexError::syntax_with(
                            ERR_UNDEFINED_GROUP_OPTION,
                            start,
                            &c.to_string(),
                        ))
                    }
                },
                None => return Err(RegexError::syntax(ERR_END_PATTERN_IN_GROUP, start)),
            }
        }
    }

    // ------------------------------------------------------------------
    // Atoms and quantifiers
    // ------------------------------------------------------------------

    fn dot(&self) -> CharPredicate {
        if self.flags.contains(Flags::DOTALL) {
            CharPredicate::All
        } else if self.flags.contains(Flags::UNIX_LINES) {
            CharPredicate::UnixDot
        } else {
            CharPredicate::Dot
        }
    }

    fn parse_atom(&mut self) -> Result<Option<Ast>, RegexError> {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(None);
        };
        let ast = match c {
            '(' => return self.parse_group(start),
            '[' => Ast::Class(self.parse_class(start)?),
            '.' => Ast::Class(self.dot()),
            '^' => {
                if self.flags.contains(Flags::MULTILINE) {
                    Ast::Anchor(AnchorType::Caret {
                        unix: self.flags.contains(Flags::UNIX_LINES),
                    })
                } else {
                    Ast::Anchor(AnchorType::Begin)
                }
            }
            '$' => Ast::Anchor(AnchorType::Dollar {
                multiline: self.flags.contains(Flags::MULTILINE),
                unix: self.flags.contains(Flags::UNIX_LINES),
            }),
            '\\' => self.parse_escape(start)?,
            '*' | '+' | '?' => {
                return Err(RegexError::syntax(
                    ERR_TARGET_OF_REPEAT_OPERATOR_NOT_SPECIFIED,
                    start,
                ))
            }
            '{' if self.brace_is_quantifier(start) => {
                return Err(RegexError::syntax(
                    ERR_TARGET_OF_REPEAT_OPERATOR_NOT_SPECIFIED,
                    start,
                ))
            }
            '{' if self.brace_is_unterminated(start) => {
                return Err(RegexError::syntax(ERR_END_PATTERN_AT_LEFT_BRACE, start))
            }
            c => self.literal(c as CodePoint),
        };
        Ok(Some(ast))
    }

    /// Does the text at `at` (a `{`) form `{n}`, `{n,}` or `{n,m}`?
    fn brace_is_quantifier(&self, at: usize) -> bool {
        let s = &self.pattern[at..];
        let Some(inner) = s.strip_prefix('{') else {
            return false;
        };
        let Some(end) = inner.find('}') else {
            return false;
        };
        let body = &inner[..end];
        let (lo, hi) = match body.split_once(',') {
            Some((lo, hi)) => (lo, Some(hi)),
            None => (body, None),
        };
        !lo.is_empty()
            && lo.bytes().all(|b| b.is_ascii_digit())
            && hi.map_or(true, |hi| hi.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Does `{n` or `{n,m` at `at` run to the end of the pattern unclosed?
    fn brace_is_unterminated(&self, at: usize) -> bool {
        let Some(inner) = self.pattern[at..].strip_prefix('{') else {
            return false;
        };
        inner.starts_with(|c: char| c.is_ascii_digit())
            && inner.bytes().filter(|&b| b == b',').count() <= 1
            && inner.bytes().all(|b| b.is_ascii_digit() || b == b',')
    }

    fn repeat_bound(n: u64) -> Result<u32, RegexError> {
        if n > MAX_REPEAT_NUM as u64 {
            return Err(RegexError::TooBigRepeat);
        }
        Ok(n as u32)
    }

    /// Parse one quantifier at the cursor, if any.
    fn parse_quantifier(&mut self) -> Result<Option<(u32, u32)>, RegexError> {
        let start = self.pos;
        let range = match self.peek() {
            Some('*') => (0, REPEAT_INFINITE),
            Some('+') => (1, REPEAT_INFINITE),
            Some('?') => (0, 1),
            Some('{') if self.brace_is_quantifier(start) => {
                self.bump();
                let lo = self.parse_decimal().unwrap_or(0);
                let lo = Self::repeat_bound(lo)?;
                let hi = if self.eat(',') {
                    match self.parse_decimal() {
                        Some(hi) => Self::repeat_bound(hi)?,
                        None => REPEAT_INFINITE,
                    }
                } else {
                    lo
                };
                self.expect('}', ERR_INVALID_REPEAT_RANGE_PATTERN, start)?;
                if hi < lo {
                    return Err(RegexError::InvalidRepeatRange { min: lo, max: hi });
                }
                return Ok(Some((lo, hi)));
            }
            Some('{') if self.brace_is_unterminated(start) => {
                return Err(RegexError::syntax(ERR_END_PATTERN_AT_LEFT_BRACE, start));
            }
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(range))
    }

    /// At most one quantifier (plus its lazy or possessive suffix) per
    /// atom; `a**` and `a?{2}` are errors.
    fn parse_quantifiers(&mut self, atom: Ast) -> Result<Ast, RegexError> {
        self.skip_extended();
        let Some((min, max)) = self.parse_quantifier()? else {
            return Ok(atom);
        };
        let kind = if self.eat('?') {
            RepeatKind::Lazy
        } else if self.eat('+') {
            RepeatKind::Possessive
        } else {
            RepeatKind::Greedy
        };
        self.skip_extended();
        let at = self.pos;
        if self.parse_quantifier()?.is_some() {
            return Err(RegexError::syntax(ERR_NESTED_REPEAT_OPERATOR, at));
        }
        Ok(Ast::Quant {
            body: Box::new(atom),
            min,
            max,
            kind,
        })
    }

    // ------------------------------------------------------------------
    // Sequences and alternation
    // ------------------------------------------------------------------

    fn parse_seq(&mut self) -> Result<Ast, RegexError> {
        let mut items = Vec::new();
        loop {
            self.skip_extended();
            match self.peek() {
                None | Some('|') | Some(')') => break,
                _ => {}
            }
            let Some(atom) = self.parse_atom()? else {
                continue;
            };
            items.push(self.parse_quantifiers(atom)?);
        }
        Ok(seq_of(items))
    }

    fn parse_alt(&mut self) -> Result<Ast, RegexError> {
        let mut alts = vec![self.parse_seq()?];
        while self.eat('|') {
            alts.push(self.parse_seq()?);
        }
        Ok(if alts.len() == 1 {
            alts.pop().unwrap_or(Ast::Empty)
        } else {
            Ast::Alt(alts)
        })
    }

    fn parse_top(&mut self) -> Result<Ast, RegexError> {
        let ast = self.parse_alt()?;
        if self.peek() == Some(')') {
            return Err(RegexError::syntax(ERR_UNMATCHED_CLOSE_PARENTHESIS, self.pos));
        }
        Ok(ast)
    }
}

fn seq_of(mut items: Vec<Ast>) -> Ast {
    match items.len() {
        0 => Ast::Empty,
        1 => items.pop().unwrap_or(Ast::Empty),
        _ => Ast::Concat(items),
    }
}

// Latin-1 characters whose Unicode case partner lies outside Latin-1 or
// that take part in a one-to-many fold; they stay out of the bit set.
const UNICODE_FOLD_EXCEPTIONS: [CodePoint; 10] =
    [0xFF, 0xB5, 0x49, 0x69, 0x53, 0x73, 0x4B, 0x6B, 0xC5, 0xE5];

/// Members of one bracket class while it is being parsed.
struct ClassSet {
    fold: CaseFold,
    bits: BitSet,
    has_bits: bool,
    items: Vec<CharPredicate>,
}

impl ClassSet {
    fn new(fold: CaseFold) -> Self {
        ClassSet {
            fold,
            bits: [0; BITSET_REAL_SIZE],
            has_bits: false,
            items: Vec::new(),
        }
    }

    fn add_single(&mut self, c: CodePoint) {
        let in_bits = (c as usize) < SINGLE_BYTE_SIZE
            && !(self.fold == CaseFold::Unicode && UNICODE_FOLD_EXCEPTIONS.contains(&c));
        if in_bits {
            bitset_add(&mut self.bits, c, self.fold);
            self.has_bits = true;
            return;
        }
        let pred = match self.fold {
            CaseFold::Unicode if unicode::has_case(c) => CharPredicate::SingleU(unicode::fold(c)),
            _ => CharPredicate::Single(c),
        };
        self.items.push(pred);
    }

    fn add_range(&mut self, lo: CodePoint, hi: CodePoint) {
        if self.fold == CaseFold::None && (hi as usize) < SINGLE_BYTE_SIZE {
            for c in lo..=hi {
                bitset_set_bit(&mut self.bits, c as usize);
            }
            self.has_bits = true;
            return;
        }
        let pred = match self.fold {
            CaseFold::None => CharPredicate::Range(lo, hi),
            CaseFold::Ascii => CharPredicate::RangeI(lo, hi),
            CaseFold::Unicode => CharPredicate::RangeU(lo, hi),
        };
        self.items.push(pred);
    }

    fn finish(mut self) -> CharPredicate {
        if self.has_bits {
            self.items.insert(0, CharPredicate::Bits(Box::new(self.bits)));
        }
        if self.items.len() == 1 {
            self.items.pop().unwrap_or(CharPredicate::Union(Vec::new()))
        } else {
            CharPredicate::Union(self.items)
        }
    }
}

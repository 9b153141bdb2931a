// regenc.rs - UTF-16 text helpers.
// Surrogate handling, code point decoding and character stepping in both
// directions over the UTF-16 code units the matcher works on.

pub type CodePoint = u32;

// === Constants ===
pub const MIN_HIGH_SURROGATE: u16 = 0xD800;
pub const MAX_HIGH_SURROGATE: u16 = 0xDBFF;
pub const MIN_LOW_SURROGATE: u16 = 0xDC00;
pub const MAX_LOW_SURROGATE: u16 = 0xDFFF;
pub const MIN_SUPPLEMENTARY_CODE_POINT: CodePoint = 0x10000;
pub const MAX_CODE_POINT: CodePoint = 0x10FFFF;
pub const ASCII_LIMIT: CodePoint = 127;
pub const NEWLINE_CODE: u16 = 0x0a;
pub const CARRIAGE_RETURN_CODE: u16 = 0x0d;

#[inline]
pub fn is_high_surrogate(u: u16) -> bool {
    (MIN_HIGH_SURROGATE..=MAX_HIGH_SURROGATE).contains(&u)
}

#[inline]
pub fn is_low_surrogate(u: u16) -> bool {
    (MIN_LOW_SURROGATE..=MAX_LOW_SURROGATE).contains(&u)
}

#[inline]
pub fn is_supplementary(cp: CodePoint) -> bool {
    cp >= MIN_SUPPLEMENTARY_CODE_POINT
}

/// Number of UTF-16 units `cp` occupies.
#[inline]
pub fn char_count(cp: CodePoint) -> usize {
    if is_supplementary(cp) {
        2
    } else {
        1
    }
}

#[inline]
pub fn to_code_point(high: u16, low: u16) -> CodePoint {
    (((high as u32) - MIN_HIGH_SURROGATE as u32) << 10)
        + ((low as u32) - MIN_LOW_SURROGATE as u32)
        + MIN_SUPPLEMENTARY_CODE_POINT
}

/// Decode the code point starting at `i`.
///
/// A surrogate pair is joined only when its low half lies before `limit`;
/// otherwise the lone high surrogate is returned as is.
pub fn code_point_at(text: &[u16], i: usize, limit: usize) -> CodePoint {
    let c = text[i];
    if is_high_surrogate(c) && i + 1 < limit && i + 1 < text.len() {
        let d = text[i + 1];
        if is_low_surrogate(d) {
            return to_code_point(c, d);
        }
    }
    c as CodePoint
}

/// Decode the code point that ends just before `i`, never reading below
/// `start`.
pub fn code_point_before(text: &[u16], i: usize, start: usize) -> CodePoint {
    let c = text[i - 1];
    if is_low_surrogate(c) && i - 1 > start {
        let h = text[i - 2];
        if is_high_surrogate(h) {
            return to_code_point(h, c);
        }
    }
    c as CodePoint
}

/// Units spanned by `n` code points starting at `i`, stopping at `limit`.
pub fn count_units_forward(text: &[u16], i: usize, n: usize, limit: usize) -> usize {
    let limit = limit.min(text.len());
    if n == 1 && i < limit && !is_high_surrogate(text[i]) {
        return 1;
    }
    let mut x = i;
    let mut k = 0;
    while x < limit && k < n {
        let c = text[x];
        x += 1;
        if is_high_surrogate(c) && x < limit && is_low_surrogate(text[x]) {
            x += 1;
        }
        k += 1;
    }
    x - i
}

/// Units spanned by `n` code points ending at `i`, never going below
/// `start`.
pub fn count_units_backward(text: &[u16], i: usize, n: usize, start: usize) -> usize {
    let mut x = i;
    let mut k = 0;
    while x > start && k < n {
        x -= 1;
        if is_low_surrogate(text[x]) && x > start && is_high_surrogate(text[x - 1]) {
            x -= 1;
        }
        k += 1;
    }
    i - x
}

/// Number of code points in `text[from..to]`.
pub fn code_point_count(text: &[u16], from: usize, to: usize) -> usize {
    let mut n = 0;
    let mut x = from;
    while x < to {
        x += char_count(code_point_at(text, x, to));
        n += 1;
    }
    n
}

/// Append the UTF-16 encoding of `cp` to `out`.
pub fn push_code_point(out: &mut Vec<u16>, cp: CodePoint) {
    if is_supplementary(cp) {
        let v = cp - MIN_SUPPLEMENTARY_CODE_POINT;
        out.push(MIN_HIGH_SURROGATE + (v >> 10) as u16);
        out.push(MIN_LOW_SURROGATE + (v & 0x3FF) as u16);
    } else {
        out.push(cp as u16);
    }
}

/// A `&str` re-encoded as UTF-16, with a map from unit offsets back to
/// byte offsets in the original string.
#[derive(Debug, Clone)]
pub struct Utf16Text {
    units: Vec<u16>,
    byte_offsets: Vec<usize>,
}

impl Utf16Text {
    pub fn new(s: &str) -> Self {
        let mut units = Vec::with_capacity(s.len());
        let mut byte_offsets = Vec::with_capacity(s.len() + 1);
        for (b, ch) in s.char_indices() {
            let mut buf = [0u16; 2];
            let enc = ch.encode_utf16(&mut buf);
            byte_offsets.extend(std::iter::repeat(b).take(enc.len()));
            units.extend_from_slice(enc);
        }
        byte_offsets.push(s.len());
        Utf16Text {
            units,
            byte_offsets,
        }
    }

    #[inline]
    pub fn units(&self) -> &[u16] {
        &self.units
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Byte offset of unit index `i`. An index that falls between the two
    /// halves of a surrogate pair maps to the start of the character.
    #[inline]
    pub fn byte_offset(&self, i: usize) -> usize {
        self.byte_offsets[i]
    }

    /// Unit index of a byte offset on a character boundary.
    pub fn unit_offset(&self, byte: usize) -> Option<usize> {
        let i = self.byte_offsets.partition_point(|&b| b < byte);
        (i < self.byte_offsets.len() && self.byte_offsets[i] == byte).then_some(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn decode_pairs() {
        let t = u("a\u{1F600}b");
        assert_eq!(t.len(), 4);
        assert_eq!(code_point_at(&t, 1, t.len()), 0x1F600);
        // The pair is split by the limit.
        assert_eq!(code_point_at(&t, 1, 2), 0xD83D);
        assert_eq!(code_point_before(&t, 3, 0), 0x1F600);
        assert_eq!(code_point_before(&t, 3, 2), 0xDE00);
    }

    #[test]
    fn stepping() {
        let t = u("\u{1F600}\u{1F600}x");
        assert_eq!(count_units_forward(&t, 0, 2, t.len()), 4);
        assert_eq!(count_units_forward(&t, 0, 9, t.len()), 5);
        assert_eq!(count_units_backward(&t, 4, 1, 0), 2);
        assert_eq!(count_units_backward(&t, 5, 2, 0), 3);
        assert_eq!(count_units_backward(&t, 4, 5, 0), 4);
        assert_eq!(code_point_count(&t, 0, t.len()), 3);
    }

    #[test]
    fn encode_supplementary() {
        let mut out = Vec::new();
        push_code_point(&mut out, 0x1F600);
        push_code_point(&mut out, 'z' as u32);
        assert_eq!(out, u("\u{1F600}z"));
    }

    #[test]
    fn offsets_map_back_to_bytes() {
        let text = Utf16Text::new("é\u{1F600}x");
        assert_eq!(text.len(), 4);
        assert_eq!(text.byte_offset(0), 0);
        assert_eq!(text.byte_offset(1), 2);
        assert_eq!(text.byte_offset(3), 6);
        assert_eq!(text.byte_offset(4), 7);
        assert_eq!(text.unit_offset(6), Some(3));
        assert_eq!(text.unit_offset(1), None);
    }
}

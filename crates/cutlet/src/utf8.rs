//! Bidirectional byte-offset cursor over UTF-8 text.
//!
//! The tokenizer and the string operators both need to step through source
//! text one code point at a time while keeping exact byte offsets, because
//! every position recorded in a token is a byte offset into the stream.
//! `Cursor` keeps the invariant that its index always sits on a code point
//! boundary: a lead byte (top bits not `10`) followed by its continuation
//! bytes (top bits `10`).

use std::fmt;

/// A bidirectional cursor over a borrowed UTF-8 string.
///
/// Dereferencing yields the current code point as a `&str` slice; an empty
/// slice is the end sentinel. All positions are byte offsets.
#[derive(Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    index: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `text`.
    pub fn new(text: &'a str) -> Self {
        Self { text, index: 0 }
    }

    /// Creates a cursor at the given byte offset.
    ///
    /// # Panics
    /// Panics if `offset` is not on a code point boundary.
    pub fn at(text: &'a str, offset: usize) -> Self {
        assert!(
            text.is_char_boundary(offset),
            "offset {offset} is not a utf-8 boundary"
        );
        Self { text, index: offset }
    }

    /// The current code point, or an empty slice at the end of the text.
    pub fn get(&self) -> &'a str {
        match self.text[self.index..].chars().next() {
            Some(ch) => &self.text[self.index..self.index + ch.len_utf8()],
            None => "",
        }
    }

    /// The current code point as a `char`, or `None` at the end.
    pub fn ch(&self) -> Option<char> {
        self.text[self.index..].chars().next()
    }

    /// Byte offset of the current code point.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Byte length of the current code point, 0 at the end.
    pub fn len(&self) -> usize {
        self.ch().map_or(0, char::len_utf8)
    }

    /// True when the cursor has passed the last code point.
    pub fn at_end(&self) -> bool {
        self.index >= self.text.len()
    }

    /// Advances one code point. Does nothing at the end.
    pub fn advance(&mut self) {
        if let Some(ch) = self.ch() {
            self.index += ch.len_utf8();
        }
    }

    /// Retreats one code point, scanning backwards past continuation bytes.
    /// Does nothing at the start.
    pub fn retreat(&mut self) {
        if self.index == 0 {
            return;
        }
        let bytes = self.text.as_bytes();
        let mut index = self.index - 1;
        while index > 0 && bytes[index] & 0xc0 == 0x80 {
            index -= 1;
        }
        self.index = index;
    }

    /// Advances (or retreats for negative `count`) by whole code points.
    pub fn step(&mut self, count: isize) {
        if count >= 0 {
            for _ in 0..count {
                self.advance();
            }
        } else {
            for _ in 0..-count {
                self.retreat();
            }
        }
    }

    /// The slice from this cursor up to, but not including, `end`.
    ///
    /// Fails when the cursors are out of range of each other, mirroring the
    /// checks the string operators rely on.
    pub fn substr(&self, end: &Cursor<'_>) -> Result<&'a str, RangeError> {
        if end.index >= self.index && end.index <= self.text.len() {
            Ok(&self.text[self.index..end.index])
        } else {
            Err(RangeError {
                start: self.index,
                end: end.index,
            })
        }
    }

}

/// Replaces the code points in `[start, end]` (inclusive of `end`'s code
/// point) with `value`, returning the new string.
pub fn replace(start: &Cursor<'_>, end: &Cursor<'_>, value: &str) -> Result<String, RangeError> {
    if end.index >= start.index && !start.at_end() {
        let mut result = String::with_capacity(start.text.len() + value.len());
        result.push_str(&start.text[..start.index]);
        result.push_str(value);
        result.push_str(&start.text[end.index + end.len()..]);
        Ok(result)
    } else {
        Err(RangeError {
            start: start.index,
            end: end.index,
        })
    }
}

/// Number of code points in `text`.
pub fn count(text: &str) -> usize {
    text.chars().count()
}

/// Out-of-range cursor arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeError {
    start: usize,
    end: usize,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "utf-8 sub-string range out of order ({}-{})",
            self.start, self.end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_then_backward_returns_to_start() {
        let text = "héllo wörld";
        let mut cursor = Cursor::new(text);
        let mut steps = 0;
        while !cursor.at_end() {
            cursor.advance();
            steps += 1;
        }
        assert_eq!(steps, count(text));
        for _ in 0..steps {
            cursor.retreat();
        }
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn dereferenced_code_points_reassemble_input() {
        let text = "a¢€𐍈z";
        let mut cursor = Cursor::new(text);
        let mut collected = String::new();
        while !cursor.at_end() {
            collected.push_str(cursor.get());
            cursor.advance();
        }
        assert_eq!(collected, text);
    }

    #[test]
    fn substr_between_cursors() {
        let text = "héllo";
        let start = Cursor::at(text, 0);
        let mut end = Cursor::new(text);
        end.step(2);
        assert_eq!(start.substr(&end).unwrap(), "hé");
    }

    #[test]
    fn substr_out_of_order_fails() {
        let text = "abc";
        let mut start = Cursor::new(text);
        start.advance();
        let end = Cursor::new(text);
        assert!(start.substr(&end).is_err());
    }

    #[test]
    fn replace_inclusive_range() {
        let text = "héllo";
        let mut start = Cursor::new(text);
        start.advance();
        let mut end = start.clone();
        end.advance();
        // Replaces "él" with "a".
        assert_eq!(replace(&start, &end, "a").unwrap(), "halo");
    }

    #[test]
    fn retreat_at_start_is_a_no_op() {
        let mut cursor = Cursor::new("x");
        cursor.retreat();
        assert_eq!(cursor.position(), 0);
    }
}

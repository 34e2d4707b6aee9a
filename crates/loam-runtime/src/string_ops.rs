//! String operations
//!
//! Strings are immutable byte sequences; every operation that produces text
//! registers a new buffer. Operands that are not strings read as empty, so
//! none of these operations fail except on allocation.

use crate::errors::{RuntimeError, RuntimeResult};
use crate::runtime::Runtime;
use crate::value::Value;

const TRIM_BYTES: &[u8] = b" \t\n\r";

impl Runtime {
    pub fn str_length(&self, s: Value) -> i64 {
        self.text(s).len() as i64
    }

    /// Byte at `index`, or 0 when out of range.
    pub fn str_char_at(&self, s: Value, index: i64) -> i64 {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.text(s).get(i))
            .map_or(0, |&b| i64::from(b))
    }

    /// Copy of the byte range `[start, end)`, clamped to the string.
    pub fn str_slice(&mut self, s: Value, start: i64, end: i64) -> RuntimeResult<Value> {
        let text = self.text(s);
        let (start, end) = clamp_range(text.len(), start, end);
        let bytes = owned(&text[start..end], 0)?;
        self.strings.register_owned(bytes)
    }

    pub fn str_slice_window(&mut self, s: Value, start: i64, end: i64) -> RuntimeResult<Value> {
        self.str_slice(s, start, end)
    }

    /// Always registers a fresh copy, even of a registered string.
    pub fn str_copy(&mut self, s: Value) -> RuntimeResult<Value> {
        let bytes = owned(self.text(s), 0)?;
        self.strings.register_owned(bytes)
    }

    pub fn str_concat(&mut self, a: Value, b: Value) -> RuntimeResult<Value> {
        let tail = self.text(b);
        let mut bytes = owned(self.text(a), tail.len())?;
        bytes.extend_from_slice(tail);
        self.strings.register_owned(bytes)
    }

    pub fn str_eq(&self, a: Value, b: Value) -> bool {
        self.values_equal(a, b)
    }

    /// One-byte string; the code is truncated to a byte.
    pub fn str_from_char_code(&mut self, code: i64) -> RuntimeResult<Value> {
        self.strings.register_copy(&[code as u8])
    }

    /// Offset of the first occurrence of `needle`, or -1.
    pub fn str_index_of(&self, s: Value, needle: Value) -> i64 {
        find(self.text(s), self.text(needle)).map_or(-1, |i| i as i64)
    }

    pub fn str_includes(&self, s: Value, needle: Value) -> bool {
        self.str_index_of(s, needle) >= 0
    }

    pub fn str_starts_with(&self, s: Value, prefix: Value) -> bool {
        self.text(s).starts_with(self.text(prefix))
    }

    pub fn str_trim(&mut self, s: Value) -> RuntimeResult<Value> {
        let text = self.text(s);
        let start = text
            .iter()
            .position(|b| !TRIM_BYTES.contains(b))
            .unwrap_or(text.len());
        let end = text
            .iter()
            .rposition(|b| !TRIM_BYTES.contains(b))
            .map_or(start, |i| i + 1);
        self.str_slice(s, start as i64, end as i64)
    }

    /// Replace every non-overlapping occurrence of `from` with `to`.
    ///
    /// An empty `from` yields an unchanged copy.
    pub fn str_replace_all(&mut self, s: Value, from: Value, to: Value) -> RuntimeResult<Value> {
        let (text, from, to) = (self.text(s), self.text(from), self.text(to));
        if from.is_empty() {
            return self.str_copy(s);
        }

        let count = occurrences(text, from).count();
        let out_len = text.len() - count * from.len() + count * to.len();
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(out_len + 1)
            .map_err(|_| RuntimeError::oom("str_replace_all"))?;
        let mut copied = 0;
        for at in occurrences(text, from) {
            bytes.extend_from_slice(&text[copied..at]);
            bytes.extend_from_slice(to);
            copied = at + from.len();
        }
        bytes.extend_from_slice(&text[copied..]);
        debug_assert_eq!(bytes.len(), out_len);
        self.strings.register_owned(bytes)
    }

    /// First byte of `ch`, or 0 for the empty string.
    pub fn char_code(&self, ch: Value) -> i64 {
        self.str_char_at(ch, 0)
    }

    pub fn int_to_string(&mut self, n: i64) -> RuntimeResult<Value> {
        self.strings.register_copy(n.to_string().as_bytes())
    }

    pub fn parse_int(&self, s: Value) -> i64 {
        parse_decimal(self.text(s))
    }
}

fn clamp_range(len: usize, start: i64, end: i64) -> (usize, usize) {
    let clamp = |i: i64| usize::try_from(i.max(0)).map_or(len, |i| i.min(len));
    let start = clamp(start);
    let end = clamp(end).max(start);
    (start, end)
}

/// Owned copy of `bytes` with room for `extra` more bytes and the NUL.
fn owned(bytes: &[u8], extra: usize) -> RuntimeResult<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(bytes.len() + extra + 1)
        .map_err(|_| RuntimeError::oom("string copy"))?;
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Offset of the first occurrence of `needle`; an empty needle matches at 0.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Start offsets of non-overlapping occurrences of a non-empty `needle`.
fn occurrences<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    let mut from = 0;
    std::iter::from_fn(move || {
        let at = from + find(&haystack[from..], needle)?;
        from = at + needle.len();
        Some(at)
    })
}

/// Base-10 parse with `strtoll` rules: leading whitespace, optional sign,
/// digits up to the first non-digit, saturating on overflow. No digits
/// parses as 0.
fn parse_decimal(bytes: &[u8]) -> i64 {
    let mut rest = bytes;
    while let [b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c, tail @ ..] = rest {
        rest = tail;
    }
    let negative = match rest {
        [b'-', tail @ ..] => {
            rest = tail;
            true
        }
        [b'+', tail @ ..] => {
            rest = tail;
            false
        }
        _ => false,
    };

    // Accumulate toward negative so i64::MIN is reachable.
    let mut acc: i64 = 0;
    for &b in rest.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = i64::from(b - b'0');
        match acc.checked_mul(10).and_then(|v| v.checked_sub(digit)) {
            Some(v) => acc = v,
            None => return if negative { i64::MIN } else { i64::MAX },
        }
    }
    if negative {
        acc
    } else {
        acc.checked_neg().unwrap_or(i64::MAX)
    }
}

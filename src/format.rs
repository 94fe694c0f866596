//! modules.builtin.modinfo record format and constants.
//!
//! The file is a flat run of NUL-terminated ASCII records, `modname.key=value`,
//! with no header, length prefix or index. All records of one module are
//! expected to be contiguous; that contiguity is what defines a group.

use std::borrow::Cow;

use crate::error::{BuiltinError, Result};

/// File name inside the module directory.
pub const MODULES_BUILTIN_MODINFO: &str = "modules.builtin.modinfo";

/// Platform path limit in bytes, including the terminating NUL.
pub const PATH_MAX: usize = 4096;

/// Separator between module name and the `key=value` part.
pub const MODNAME_SEP: u8 = b'.';

/// Record terminator.
pub const RECORD_END: u8 = 0;

/// One record borrowed from the file buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Offset of the first byte of the record.
    pub offset: usize,
    /// Bytes before the first `.`.
    pub modname: &'a [u8],
    /// Bytes after the first `.`, without the terminator.
    pub value: &'a [u8],
    /// Offset just past the terminator (or end of buffer for an unterminated tail).
    pub end: usize,
}

impl<'a> Record<'a> {
    /// Module name, lossily decoded.
    #[must_use]
    pub fn modname_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.modname)
    }

    /// Split the value on its first `=` into `(key, value)`.
    ///
    /// Flags without a value (no `=`) yield `None` for the value.
    #[must_use]
    pub fn split_value(&self) -> (&'a [u8], Option<&'a [u8]>) {
        split_key_value(self.value)
    }

    /// Bytes the value occupies once copied out with its terminator.
    #[must_use]
    pub fn value_size(&self) -> usize {
        self.value.len() + 1
    }
}

/// Split `key=value` bytes on the first `=`.
#[must_use]
pub fn split_key_value(bytes: &[u8]) -> (&[u8], Option<&[u8]>) {
    match bytes.iter().position(|&b| b == b'=') {
        Some(eq) => (&bytes[..eq], Some(&bytes[eq + 1..])),
        None => (bytes, None),
    }
}

/// Read the record starting at `offset`.
///
/// The caller guarantees `offset < buf.len()`. The `.` search never crosses
/// the record terminator.
pub fn read_record(buf: &[u8], offset: usize) -> Result<Record<'_>> {
    let rest = &buf[offset..];
    let (line, end) = match rest.iter().position(|&b| b == RECORD_END) {
        Some(nul) => (&rest[..nul], offset + nul + 1),
        None => (rest, buf.len()),
    };

    let dot = line
        .iter()
        .position(|&b| b == MODNAME_SEP)
        .ok_or(BuiltinError::Malformed { offset })?;

    Ok(Record {
        offset,
        modname: &line[..dot],
        value: &line[dot + 1..],
        end,
    })
}

/// Sequential reader over the records in `buf[start..limit]`.
///
/// Yields an error for the first malformed record and then stops.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    buf: &'a [u8],
    offset: usize,
    limit: usize,
    failed: bool,
}

impl<'a> Records<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self::bounded(buf, 0, buf.len())
    }

    /// Records starting at `start`, not starting at or past `limit`.
    #[must_use]
    pub fn bounded(buf: &'a [u8], start: usize, limit: usize) -> Self {
        Self {
            buf,
            offset: start,
            limit: limit.min(buf.len()),
            failed: false,
        }
    }

    /// Offset of the next record to be read.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.limit {
            return None;
        }
        match read_record(self.buf, self.offset) {
            Ok(record) => {
                self.offset = record.end;
                Some(Ok(record))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_splits_on_first_dot() {
        let buf = b"snd.alias=pci:v*d*\0";
        let r = read_record(buf, 0).unwrap();
        assert_eq!(r.modname, b"snd");
        assert_eq!(r.value, b"alias=pci:v*d*");
        assert_eq!(r.end, buf.len());
    }

    #[test]
    fn dot_search_stops_at_terminator() {
        let buf = b"nodot\0next.key=v\0";
        match read_record(buf, 0) {
            Err(BuiltinError::Malformed { offset }) => assert_eq!(offset, 0),
            other => panic!("expected malformed, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_tail_ends_at_buffer_end() {
        let buf = b"a.k=v\0b.k=w";
        let records: Vec<_> = Records::new(buf).collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value, b"k=w");
        assert_eq!(records[1].end, buf.len());
    }

    #[test]
    fn split_value_without_equals() {
        assert_eq!(split_key_value(b"license=GPL"), (&b"license"[..], Some(&b"GPL"[..])));
        assert_eq!(split_key_value(b"intree"), (&b"intree"[..], None));
        assert_eq!(split_key_value(b"parm=a:b=c"), (&b"parm"[..], Some(&b"a:b=c"[..])));
    }
}

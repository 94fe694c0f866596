//! Group-by-group enumeration of built-in modules.
//!
//! A group is a maximal run of consecutive records sharing one module name.
//! [`BuiltinIter`] keeps the two-step cursor protocol (`advance` bounds the
//! next group, `extract` re-walks and consumes it); [`Groups`] folds both
//! steps into a plain iterator.

use std::borrow::Cow;

use log::{trace, warn};

use crate::error::{BuiltinError, Result};
use crate::file::{Context, ModinfoFile};
use crate::format::{read_record, Records};

/// Cursor state of a [`BuiltinIter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterState {
    /// Nothing pending; `advance` may be called.
    Ready,
    /// `advance` bounded a group that has not been extracted yet.
    GroupPending,
    /// The end of the buffer was reached.
    Exhausted,
    /// Enumeration stopped at a malformed record at this offset.
    Failed(usize),
}

/// Offsets describing one group inside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GroupSpan {
    start: usize,
    end: usize,
    name_len: usize,
    count: usize,
}

/// Scan forward from `start` to the end of the group beginning there.
///
/// Returns `Ok(None)` when no record starts before the end of the buffer.
fn scan_group(buf: &[u8], start: usize) -> Result<Option<GroupSpan>> {
    let mut offset = start;
    let mut modname: Option<&[u8]> = None;
    let mut count = 0;

    while offset < buf.len() {
        let record = read_record(buf, offset)?;
        match modname {
            None => modname = Some(record.modname),
            Some(name) if name != record.modname => break,
            Some(_) => {}
        }
        offset = record.end;
        count += 1;
    }

    Ok(modname.map(|name| GroupSpan {
        start,
        end: offset,
        name_len: name.len(),
        count,
    }))
}

/// Re-derive the group at the start of `[start, limit)`.
///
/// A missing `.` here means the range was not produced by `scan_group` over
/// the same buffer.
fn measure_group(buf: &[u8], start: usize, limit: usize) -> Result<GroupSpan> {
    let mut modname: Option<&[u8]> = None;
    let mut span = GroupSpan {
        start,
        end: start,
        name_len: 0,
        count: 0,
    };

    for record in Records::bounded(buf, start, limit) {
        let record = record.map_err(|e| match e {
            BuiltinError::Malformed { offset } => BuiltinError::Inconsistent { offset },
            other => other,
        })?;
        match modname {
            None => {
                modname = Some(record.modname);
                span.name_len = record.modname.len();
            }
            Some(name) if name != record.modname => break,
            Some(_) => {}
        }
        span.end = record.end;
        span.count += 1;
    }

    Ok(span)
}

/// One module's records, borrowed from the file buffer.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    buf: &'a [u8],
    span: GroupSpan,
}

impl<'a> Group<'a> {
    fn new(buf: &'a [u8], span: GroupSpan) -> Self {
        Self { buf, span }
    }

    /// Module name shared by every record in the group.
    #[must_use]
    pub fn name(&self) -> &'a [u8] {
        &self.buf[self.span.start..self.span.start + self.span.name_len]
    }

    #[must_use]
    pub fn name_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name())
    }

    /// Raw bytes of every record in the group, terminators included.
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        &self.buf[self.span.start..self.span.end]
    }

    /// Number of records in the group.
    #[must_use]
    pub fn count(&self) -> usize {
        self.span.count
    }

    /// Offset of the first record in the file.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.span.start
    }

    /// Offset just past the last record.
    #[must_use]
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// `key=value` part of each record, in file order.
    pub fn records(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        Records::bounded(self.buf, self.span.start, self.span.end)
            .take(self.span.count)
            .map_while(|r| r.ok().map(|r| r.value))
    }
}

/// Cursor over the groups of one modules.builtin.modinfo file.
///
/// Owns the file; dropping the iterator releases it.
#[derive(Debug)]
pub struct BuiltinIter {
    file: ModinfoFile,
    pos: usize,
    next: usize,
    state: IterState,
}

impl BuiltinIter {
    /// Open `<dirname>/modules.builtin.modinfo` for enumeration.
    pub fn new(ctx: &Context) -> Result<Self> {
        Ok(Self::from_file(ctx.open_modinfo()?))
    }

    #[must_use]
    pub fn from_file(file: ModinfoFile) -> Self {
        Self {
            file,
            pos: 0,
            next: 0,
            state: IterState::Ready,
        }
    }

    #[must_use]
    pub fn state(&self) -> IterState {
        self.state
    }

    #[must_use]
    pub fn file(&self) -> &ModinfoFile {
        &self.file
    }

    /// Bound the next group. Returns `Ok(false)` once the buffer is exhausted.
    ///
    /// A record without `.` stops enumeration for good: this call and every
    /// later one report it as [`BuiltinError::Malformed`], even when records
    /// of the group being scanned preceded it. Advancing again before
    /// `extract` only moves the end of the range; `extract` still returns the
    /// group at the last extracted position and then consumes the whole range.
    pub fn advance(&mut self) -> Result<bool> {
        match self.state {
            IterState::Exhausted => return Ok(false),
            IterState::Failed(offset) => return Err(BuiltinError::Malformed { offset }),
            IterState::Ready | IterState::GroupPending => {}
        }

        match scan_group(self.file.contents(), self.next) {
            Ok(Some(span)) => {
                trace!("group at {}..{} ({} records)", span.start, span.end, span.count);
                self.next = span.end;
                self.state = IterState::GroupPending;
                Ok(true)
            }
            Ok(None) => {
                self.state = IterState::Exhausted;
                Ok(false)
            }
            Err(e) => {
                if let BuiltinError::Malformed { offset } = e {
                    warn!("stopping enumeration at malformed record, offset {}", offset);
                    self.state = IterState::Failed(offset);
                }
                Err(e)
            }
        }
    }

    /// Consume the group bounded by the last [`advance`](Self::advance).
    pub fn extract(&mut self) -> Result<Group<'_>> {
        if self.state != IterState::GroupPending {
            return Err(BuiltinError::NoPendingGroup);
        }

        let span = measure_group(self.file.contents(), self.pos, self.next)?;
        self.pos = self.next;
        self.state = IterState::Ready;
        Ok(Group::new(self.file.contents(), span))
    }

    /// Every group from the start of the file, independent of the cursor.
    #[must_use]
    pub fn groups(&self) -> Groups<'_> {
        Groups::new(self.file.contents())
    }
}

impl<'a> IntoIterator for &'a BuiltinIter {
    type Item = Result<Group<'a>>;
    type IntoIter = Groups<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups()
    }
}

/// Iterator over the groups of a buffer. Fuses after the first error.
#[derive(Debug, Clone)]
pub struct Groups<'a> {
    buf: &'a [u8],
    next: usize,
    done: bool,
}

impl<'a> Groups<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            next: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for Groups<'a> {
    type Item = Result<Group<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match scan_group(self.buf, self.next) {
            Ok(Some(span)) => {
                self.next = span.end;
                Some(Ok(Group::new(self.buf, span)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Groups<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_reports_inconsistent_range() {
        let buf = b"foo.a=1\0nodot\0";
        match measure_group(buf, 0, buf.len()) {
            Err(BuiltinError::Inconsistent { offset }) => assert_eq!(offset, 8),
            other => panic!("expected inconsistent, got {:?}", other),
        }
    }

    #[test]
    fn measure_is_deterministic_over_scanned_range() {
        let buf = b"foo.license=GPL\0foo.author=X\0bar.license=MIT\0";
        let scanned = scan_group(buf, 0).unwrap().unwrap();
        let first = measure_group(buf, 0, scanned.end).unwrap();
        let second = measure_group(buf, 0, scanned.end).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, scanned);
        assert_eq!(first.count, 2);
        assert_eq!(first.name_len, 3);
    }

    #[test]
    fn measure_stops_at_first_name_change() {
        let buf = b"foo.a=1\0bar.a=2\0";
        let span = measure_group(buf, 0, buf.len()).unwrap();
        assert_eq!(span.count, 1);
        assert_eq!(span.end, 8);
    }
}

//! One-shot modinfo lookup for a single built-in module.
//!
//! Scans the whole file once for the module's contiguous records, then copies
//! their `key=value` strings into one arena owned by [`Modinfo`].

use std::ops::Range;

use log::debug;

use crate::error::{BuiltinError, Result};
use crate::file::{Context, ModinfoFile};
use crate::format::{split_key_value, Records, RECORD_END};

/// A module's modinfo strings: one NUL-separated arena plus one span per string.
///
/// Holds exactly as many spans as matched records; there is no sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modinfo {
    arena: Vec<u8>,
    spans: Vec<Range<usize>>,
}

impl Modinfo {
    fn with_capacity(count: usize, size: usize) -> Result<Self> {
        let mut arena = Vec::new();
        arena.try_reserve_exact(size)?;
        let mut spans = Vec::new();
        spans.try_reserve_exact(count)?;
        Ok(Self { arena, spans })
    }

    fn push(&mut self, value: &[u8]) {
        let start = self.arena.len();
        self.arena.extend_from_slice(value);
        self.spans.push(start..start + value.len());
        self.arena.push(RECORD_END);
    }

    /// Number of strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The `i`-th `key=value` string, without its terminator.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&[u8]> {
        self.spans.get(i).map(|span| &self.arena[span.clone()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.spans.iter().map(|span| &self.arena[span.clone()])
    }

    /// Strings decoded as UTF-8, invalid sequences replaced.
    #[must_use]
    pub fn to_vec_lossy(&self) -> Vec<String> {
        self.iter()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect()
    }

    /// `(key, value)` pairs; keys without `=` have no value.
    pub fn entries(&self) -> impl Iterator<Item = (&[u8], Option<&[u8]>)> + '_ {
        self.iter().map(split_key_value)
    }

    /// Values of every entry whose key is `key`, in file order.
    pub fn get_all(&self, key: &str) -> impl Iterator<Item = &[u8]> + '_ {
        let key = key.as_bytes().to_vec();
        self.entries()
            .filter(move |(k, _)| *k == key.as_slice())
            .filter_map(|(_, v)| v)
    }

    /// The backing arena: every string followed by a NUL, in order.
    #[must_use]
    pub fn arena(&self) -> &[u8] {
        &self.arena
    }
}

/// Serialized as a sequence of strings, lossily decoded.
#[cfg(feature = "serde")]
impl serde::Serialize for Modinfo {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(String::from_utf8_lossy))
    }
}

/// Look up `modname` in `<dirname>/modules.builtin.modinfo`.
pub fn get_modinfo(ctx: &Context, modname: &str) -> Result<Modinfo> {
    let file = ctx.open_modinfo()?;
    lookup_in(&file, modname)
}

/// Look up `modname` in an already opened file.
///
/// Only the first contiguous run of matching records is collected; matches
/// after a different module's records are not searched for. Any record
/// without `.` seen before the run ends fails the whole lookup.
pub fn lookup_in(file: &ModinfoFile, modname: &str) -> Result<Modinfo> {
    let buf = file.contents();
    let wanted = modname.as_bytes();

    let mut section: Option<usize> = None;
    let mut section_end = 0;
    let mut count = 0;
    let mut size = 0;

    for record in Records::new(buf) {
        let record = record?;
        if record.modname != wanted {
            if count > 0 {
                break;
            }
            continue;
        }
        section.get_or_insert(record.offset);
        section_end = record.end;
        size += record.value_size();
        count += 1;
    }

    let Some(section) = section else {
        debug!("{} not found among built-in modules", modname);
        return Err(BuiltinError::NotFound(modname.to_string()));
    };

    let mut modinfo = Modinfo::with_capacity(count, size)?;
    for record in Records::bounded(buf, section, section_end) {
        modinfo.push(record?.value);
    }

    debug!("{}: {} modinfo strings ({} bytes)", modname, count, size);
    Ok(modinfo)
}

//! Lookup tests: collect one module's modinfo strings.

use kmod_builtin::{lookup_in, BuiltinError, BuiltinIter, ModinfoFile};

const SAMPLE: &[u8] = b"foo.license=GPL\0foo.author=X\0bar.license=MIT\0";

fn file(bytes: &[u8]) -> ModinfoFile {
    ModinfoFile::from_bytes(bytes.to_vec())
}

/// The value kept is everything after "modname.", not split on '='.
#[test]
fn lookup_example_module() {
    let info = lookup_in(&file(SAMPLE), "bar").unwrap();
    assert_eq!(info.len(), 1);
    assert_eq!(info.get(0), Some(&b"license=MIT"[..]));
    assert_eq!(info.get(1), None);

    let info = lookup_in(&file(SAMPLE), "foo").unwrap();
    assert_eq!(info.to_vec_lossy(), vec!["license=GPL", "author=X"]);
}

#[test]
fn lookup_unknown_module_is_not_found() {
    let err = lookup_in(&file(SAMPLE), "nonexistent").unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("nonexistent"));
}

/// Name comparison covers length: "fo" and "foobar" do not match "foo".
#[test]
fn lookup_requires_exact_name() {
    let bytes: &[u8] = b"fo.a=1\0foobar.a=2\0foo.a=3\0";
    let info = lookup_in(&file(bytes), "foo").unwrap();
    assert_eq!(info.to_vec_lossy(), vec!["a=3"]);
    assert!(lookup_in(&file(bytes), "f").unwrap_err().is_not_found());
}

/// Only the first contiguous run is collected.
#[test]
fn lookup_stops_after_first_run() {
    let bytes: &[u8] = b"a.x=1\0a.y=2\0b.x=3\0a.z=4\0";
    let info = lookup_in(&file(bytes), "a").unwrap();
    assert_eq!(info.to_vec_lossy(), vec!["x=1", "y=2"]);
}

/// A record without '.' anywhere before the match fails the lookup.
#[test]
fn lookup_malformed_before_match() {
    let bytes: &[u8] = b"a.x=1\0oops\0b.x=2\0";
    match lookup_in(&file(bytes), "b") {
        Err(BuiltinError::Malformed { offset }) => assert_eq!(offset, 6),
        other => panic!("expected malformed, got {:?}", other),
    }
    // Also when the module does not exist at all.
    assert!(matches!(
        lookup_in(&file(bytes), "zzz"),
        Err(BuiltinError::Malformed { .. })
    ));
}

/// The record right after a match is still checked before the run ends.
#[test]
fn lookup_malformed_right_after_match() {
    let bytes: &[u8] = b"a.x=1\0oops\0";
    assert!(matches!(
        lookup_in(&file(bytes), "a"),
        Err(BuiltinError::Malformed { offset: 6 })
    ));
}

/// Malformed data after the run ends is never reached.
#[test]
fn lookup_ignores_malformed_after_run() {
    let bytes: &[u8] = b"a.x=1\0b.x=2\0oops\0";
    let info = lookup_in(&file(bytes), "a").unwrap();
    assert_eq!(info.len(), 1);
}

/// Every span points into the single arena, each value followed by its NUL.
#[test]
fn arena_holds_every_value() {
    let info = lookup_in(&file(SAMPLE), "foo").unwrap();
    assert_eq!(info.arena(), b"license=GPL\0author=X\0");

    let arena = info.arena().as_ptr_range();
    for value in info.iter() {
        let range = value.as_ptr_range();
        assert!(arena.start <= range.start && range.end < arena.end);
    }
    assert_eq!(info.iter().count(), info.len());
}

#[test]
fn entries_split_key_and_value() {
    let bytes: &[u8] = b"e1000e.alias=pci:v00008086d0000105Esv*\0e1000e.intree\0\
        e1000e.alias=pci:v00008086d0000105Fsv*\0e1000e.parm=debug:Debug level (0=none,...,16=all) (int)\0";
    let info = lookup_in(&file(bytes), "e1000e").unwrap();

    let entries: Vec<_> = info.entries().collect();
    assert_eq!(entries[1], (&b"intree"[..], None));
    assert_eq!(
        entries[3],
        (&b"parm"[..], Some(&b"debug:Debug level (0=none,...,16=all) (int)"[..]))
    );

    let aliases: Vec<&[u8]> = info.get_all("alias").collect();
    assert_eq!(
        aliases,
        vec![&b"pci:v00008086d0000105Esv*"[..], &b"pci:v00008086d0000105Fsv*"[..]]
    );
    assert_eq!(info.get_all("license").count(), 0);

    // The key only needs to live for the call.
    let intree: Vec<&[u8]> = {
        let key = String::from("parm");
        info.get_all(&key).collect()
    };
    assert_eq!(intree.len(), 1);
}

/// Lookup and iteration agree for every module in a well-formed file.
#[test]
fn lookup_matches_iterator_groups() {
    let bytes: &[u8] = b"ext4.license=GPL\0ext4.alias=fs-ext4\0jbd2.license=GPL\0\
        mbcache.license=GPL\0mbcache.author=Andreas Gruenbacher\0";
    let f = file(bytes);
    let iter = BuiltinIter::from_file(f.clone());

    for group in iter.groups() {
        let group = group.unwrap();
        let name = group.name_lossy();
        let info = lookup_in(&f, &name).unwrap();
        assert_eq!(info.len(), group.count());
        assert!(info.iter().eq(group.records()), "mismatch for {}", name);
    }
}

#[cfg(feature = "serde")]
#[test]
fn modinfo_serializes_as_string_list() {
    let info = lookup_in(&file(SAMPLE), "foo").unwrap();
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json, serde_json::json!(["license=GPL", "author=X"]));
}

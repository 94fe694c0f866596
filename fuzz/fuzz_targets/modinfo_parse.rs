#![no_main]

use kmod_builtin::{lookup_in, BuiltinIter, ModinfoFile};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut iter = BuiltinIter::from_file(ModinfoFile::from_bytes(data.to_vec()));

    let mut names = Vec::new();
    while let Ok(true) = iter.advance() {
        let group = iter.extract().expect("advanced group must re-parse");
        assert!(group.count() > 0);
        assert_eq!(group.records().count(), group.count());
        names.push(group.name().to_vec());
    }

    for name in names.iter().take(8) {
        if let Ok(name) = std::str::from_utf8(name) {
            let _ = lookup_in(iter.file(), name);
        }
    }
});

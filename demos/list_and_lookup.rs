//! Minimal example: write a small modules.builtin.modinfo to a temp directory,
//! list its modules, then look one up.
//!
//! Run: cargo run --example list_and_lookup

use std::fs;

use kmod_builtin::{get_modinfo, BuiltinIter, Context, MODULES_BUILTIN_MODINFO};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let records: &[u8] = b"ext4.license=GPL\0ext4.alias=fs-ext4\0unix.license=GPL\0unix.alias=net-pf-1\0";

    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(MODULES_BUILTIN_MODINFO), records)?;
    let ctx = Context::new(dir.path());

    let mut iter = BuiltinIter::new(&ctx)?;
    while iter.advance()? {
        let group = iter.extract()?;
        println!("{} ({} records)", group.name_lossy(), group.count());
    }

    let info = get_modinfo(&ctx, "unix")?;
    for line in info.to_vec_lossy() {
        println!("  unix: {}", line);
    }
    Ok(())
}

//! kmod-builtin — reader for `modules.builtin.modinfo`, the packed modinfo of
//! kernel modules compiled into the kernel image.
//!
//! This crate provides:
//! - **Format** (`format`): record grammar (`modname.key=value\0`), constants, record reader.
//! - **File** (`file`): `Context` (module directory) and `ModinfoFile` (immutable buffer).
//! - **Iterator** (`iter`): `BuiltinIter` with `advance`/`extract`, and the `Groups` iterator.
//! - **Lookup** (`lookup`): `get_modinfo(ctx, name)` collecting one module's strings into a `Modinfo`.
//! - **Config** (`config`, feature `serde`): TOML config for the `kmod-builtin` binary.

#[cfg(feature = "serde")]
pub mod config;
pub mod error;
pub mod file;
pub mod format;
pub mod iter;
pub mod lookup;

#[cfg(feature = "serde")]
pub use config::{Config, ConfigError};
pub use error::{BuiltinError, Result};
pub use file::{Context, ModinfoFile};
pub use format::{read_record, Record, Records, MODULES_BUILTIN_MODINFO, PATH_MAX};
pub use iter::{BuiltinIter, Group, Groups, IterState};
pub use lookup::{get_modinfo, lookup_in, Modinfo};

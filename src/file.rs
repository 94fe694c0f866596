//! Module directory context and the immutable file buffer the parser walks.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{BuiltinError, Result};
use crate::format::{MODULES_BUILTIN_MODINFO, PATH_MAX};

/// Where the kernel's release number is exposed on a running system.
pub const OSRELEASE_PATH: &str = "/proc/sys/kernel/osrelease";

/// Root of per-release module directories.
pub const MODULES_ROOT: &str = "/lib/modules";

/// Module directory the metadata file is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    dirname: PathBuf,
}

impl Context {
    pub fn new<P: Into<PathBuf>>(dirname: P) -> Self {
        Self {
            dirname: dirname.into(),
        }
    }

    /// `/lib/modules/<release>`.
    pub fn from_release(release: &str) -> Self {
        Self::new(Path::new(MODULES_ROOT).join(release.trim()))
    }

    /// Directory of the running kernel, from its osrelease.
    pub fn from_running_kernel() -> Result<Self> {
        let release = fs::read_to_string(OSRELEASE_PATH).map_err(|source| BuiltinError::Io {
            path: PathBuf::from(OSRELEASE_PATH),
            source,
        })?;
        Ok(Self::from_release(&release))
    }

    #[must_use]
    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    /// `<dirname>/modules.builtin.modinfo`, rejected before any I/O if it
    /// would not fit in PATH_MAX with its terminator.
    pub fn modinfo_path(&self) -> Result<PathBuf> {
        let dir_len = self.dirname.as_os_str().len();
        let path_len = dir_len + 1 + MODULES_BUILTIN_MODINFO.len() + 1;
        if path_len >= PATH_MAX {
            return Err(BuiltinError::PathTooLong {
                path_len,
                limit: PATH_MAX,
            });
        }
        Ok(self.dirname.join(MODULES_BUILTIN_MODINFO))
    }

    /// Open this context's modules.builtin.modinfo.
    pub fn open_modinfo(&self) -> Result<ModinfoFile> {
        ModinfoFile::open(self.modinfo_path()?)
    }
}

/// Whole contents of a modinfo file, read once and never mutated.
///
/// Dropping the value releases the buffer.
#[derive(Debug, Clone)]
pub struct ModinfoFile {
    path: Option<PathBuf>,
    data: Vec<u8>,
}

impl ModinfoFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| BuiltinError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("opened {} ({} bytes)", path.display(), data.len());
        Ok(Self {
            path: Some(path.to_path_buf()),
            data,
        })
    }

    /// Wrap bytes already in memory.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { path: None, data }
    }

    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Path the file was opened from; `None` for in-memory data.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

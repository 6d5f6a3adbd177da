// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
///
/// Stage runners, `clean` and the image cache only touch the disk through
/// this trait, so the whole pipeline can run against [`mock::MockFileSystem`].
pub trait FileSystem: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write `contents`, creating missing parent directories.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// True for a symbolic link itself, whatever it points at.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Remove everything inside `path` but keep the directory itself.
    ///
    /// Returns the number of direct children removed.
    fn remove_dir_contents(&self, path: &Path) -> Result<usize>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        fs::write(path, contents).with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("removing file {:?}", path))
    }

    fn remove_dir_contents(&self, path: &Path) -> Result<usize> {
        let mut removed = 0;
        for entry in self.read_dir(path)? {
            let file_type = fs::symlink_metadata(&entry)
                .with_context(|| format!("inspecting {:?}", entry))?
                .file_type();
            if file_type.is_dir() {
                fs::remove_dir_all(&entry).with_context(|| format!("removing dir {:?}", entry))?;
            } else {
                fs::remove_file(&entry).with_context(|| format!("removing file {:?}", entry))?;
            }
            removed += 1;
        }
        Ok(removed)
    }
}

/// Lets `grass` resolve `@import`/`@use` through a [`FileSystem`], recording
/// every file it reads.
#[derive(Debug)]
pub struct SassFs<'a> {
    fs: &'a dyn FileSystem,
    reads: Mutex<Vec<PathBuf>>,
}

impl<'a> SassFs<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self {
            fs,
            reads: Mutex::new(Vec::new()),
        }
    }

    /// Files read so far, in first-read order.
    pub fn into_reads(self) -> Vec<PathBuf> {
        self.reads.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl grass::Fs for SassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.fs.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.fs.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let bytes = self
            .fs
            .read(path)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("{e:#}")))?;
        let mut reads = self.reads.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !reads.iter().any(|p| p == path) {
            reads.push(path.to_path_buf());
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_dir_contents_keeps_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem;
        fs.write(&dir.path().join("out/a.txt"), b"a").unwrap();
        fs.write(&dir.path().join("out/nested/b.txt"), b"b").unwrap();

        let removed = fs.remove_dir_contents(&dir.path().join("out")).unwrap();

        assert_eq!(removed, 2);
        assert!(fs.is_dir(&dir.path().join("out")));
        assert!(fs.read_dir(&dir.path().join("out")).unwrap().is_empty());
    }
}

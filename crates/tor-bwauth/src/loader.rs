//! Access to the files that a bandwidth authority reads.

use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

/// An object that can give us the contents of a file.
///
/// Readers in this crate take a `FileLoader` rather than touching the
/// filesystem, so that they can be run against canned contents.
pub trait FileLoader {
    /// Return the contents of the file at `path` as a string.
    fn load(&self, path: &Path) -> Result<String>;
}

/// A [`FileLoader`] that reads from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsLoader;

impl FileLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| Error::Io(path.display().to_string(), Arc::new(e)))
    }
}

impl<L: FileLoader + ?Sized> FileLoader for Arc<L> {
    fn load(&self, path: &Path) -> Result<String> {
        (**self).load(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_file() {
        let r = FsLoader.load(Path::new("/this/path/does/not/exist/bwfile"));
        match r {
            Err(Error::Io(p, e)) => {
                assert_eq!(p, "/this/path/does/not/exist/bwfile");
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("expected an I/O error"),
        }
    }
}

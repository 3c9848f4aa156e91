use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::error::Result;

/// Destination for a rendered document.
///
/// Hosts decide where the bytes end up (a chosen path, a viewer, memory).
pub trait FileSink {
    fn write_document(&mut self, document: &[u8]) -> Result<()>;
}

/// Writes the document to a file, replacing any previous content.
#[derive(Debug, Clone)]
pub struct FileTarget {
    path: PathBuf,
}

impl FileTarget {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSink for FileTarget {
    fn write_document(&mut self, document: &[u8]) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        writer.write_all(document)?;
        writer.flush()?;
        log::info!("wrote {} ({} bytes)", self.path.display(), document.len());
        Ok(())
    }
}

impl FileSink for Vec<u8> {
    fn write_document(&mut self, document: &[u8]) -> Result<()> {
        self.extend_from_slice(document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForensicsError;

    #[test]
    fn test_file_target_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = FileTarget::new(dir.path().join("report.html"));

        target.write_document(b"first version").unwrap();
        target.write_document(b"second").unwrap();

        assert_eq!(std::fs::read(target.path()).unwrap(), b"second");
    }

    #[test]
    fn test_unwritable_target_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = FileTarget::new(dir.path().join("missing").join("report.html"));
        assert!(matches!(target.write_document(b"x"), Err(ForensicsError::Io(_))));
    }
}

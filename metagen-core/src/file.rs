use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use tempfile::NamedTempFile;

/// A generated output file: a relative path plus its rendered content.
#[derive(Debug, Clone)]
pub struct OutputFile {
    path: PathBuf,
    content: String,
}

impl OutputFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// File path relative to the output directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Write the file under `base`, creating parent directories as needed.
    pub fn write(&self, base: &Path) -> Result<PathBuf> {
        let path = base.join(&self.path);
        write_atomic(&path, &self.content)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Write `content` to `path` through a temporary file in the same directory,
/// so a partially written file is never observed at the destination.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let tmp = NamedTempFile::new_in(dir)?;
    std::fs::write(tmp.path(), content)?;
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_write_atomic_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.cs");

        write_atomic(&path, "hello").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_write_atomic_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a").join("b").join("out.cs");

        write_atomic(&path, "nested").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "nested");
    }

    #[test]
    fn test_write_atomic_overwrites_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.cs");

        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_output_file_write_joins_base() {
        let temp = TempDir::new().unwrap();

        let file = OutputFile::new("gen/NativeFormatReaderGen.cs", "// generated");
        let written = file.write(temp.path()).unwrap();

        assert_eq!(written, temp.path().join("gen/NativeFormatReaderGen.cs"));
        assert_eq!(fs::read_to_string(&written).unwrap(), "// generated");
    }
}

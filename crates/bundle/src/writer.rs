use crate::error::{BundleError, Result};
use std::path::{Component, Path, PathBuf};

/// Persists bundle text under a caller-chosen relative path
pub trait BundleWriter: Send + Sync {
    /// Write `text` and return the absolute path it landed at
    fn write_relative(&self, relative: &Path, text: &str) -> Result<PathBuf>;
}

/// Writes bundles below a root directory, atomically per file
#[derive(Debug, Clone)]
pub struct FsBundleWriter {
    root: PathBuf,
}

impl FsBundleWriter {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BundleWriter for FsBundleWriter {
    fn write_relative(&self, relative: &Path, text: &str) -> Result<PathBuf> {
        let escapes_root = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.as_os_str().is_empty() || escapes_root {
            return Err(BundleError::InvalidPath(relative.display().to_string()));
        }

        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file_name = path
            .file_name()
            .ok_or_else(|| BundleError::InvalidPath(relative.display().to_string()))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &path)?;
        log::debug!("Wrote bundle {} ({} bytes)", path.display(), text.len());

        Ok(std::path::absolute(&path).unwrap_or(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_nested_paths() {
        let temp = tempdir().unwrap();
        let writer = FsBundleWriter::new(temp.path());
        let path = writer
            .write_relative(Path::new("context/com.example.UserService/save.txt"), "body")
            .unwrap();

        assert!(path.is_absolute());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "body");
        assert!(!path.with_file_name("save.txt.tmp").exists());

        writer.write_relative(Path::new("context/com.example.UserService/save.txt"), "again").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "again");
    }

    #[test]
    fn rejects_paths_outside_root() {
        let temp = tempdir().unwrap();
        let writer = FsBundleWriter::new(temp.path());
        assert!(writer.write_relative(Path::new("../escape.txt"), "x").is_err());
        assert!(writer.write_relative(Path::new("/etc/passwd"), "x").is_err());
        assert!(writer.write_relative(Path::new(""), "x").is_err());
    }
}

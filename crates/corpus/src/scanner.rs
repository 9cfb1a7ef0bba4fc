use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file found on disk together with its modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub modified: Option<u64>,
}

/// Scanner for finding Java sources and XML descriptors in a project
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Scan directory for corpus files (.gitignore aware)
    pub fn scan(&self) -> Vec<ScannedFile> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);
        builder.filter_entry(move |entry| !Self::is_ignored_scope(entry.path(), &root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() || !Self::is_corpus_file(entry.path()) {
                        continue;
                    }

                    let path = entry.path();
                    let mut modified = None;
                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > MAX_FILE_SIZE_BYTES {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                MAX_FILE_SIZE_BYTES
                            );
                            continue;
                        }
                        modified = meta.modified().ok().and_then(mtime_ms);
                    }

                    files.push(ScannedFile {
                        path: path.to_path_buf(),
                        modified,
                    });
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        log::info!("Found {} corpus files", files.len());
        files
    }

    fn is_corpus_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                CORPUS_EXTENSIONS
                    .iter()
                    .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            })
    }

    fn is_ignored_scope(path: &Path, root: &Path) -> bool {
        if let Ok(relative) = path.strip_prefix(root) {
            for component in relative.components() {
                if let std::path::Component::Normal(name) = component {
                    let lowered = name.to_string_lossy().to_lowercase();
                    if IGNORED_SCOPES.iter().any(|ignored| ignored == &lowered) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

pub(crate) fn mtime_ms(modified: SystemTime) -> Option<u64> {
    let duration = modified.duration_since(SystemTime::UNIX_EPOCH).ok()?;
    Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".gradle",
    ".mvn",
    // caches / builds
    "node_modules",
    "build",
    "target",
    "out",
    "bin",
];

const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MB

const CORPUS_EXTENSIONS: &[&str] = &["java", "xml"];

#[cfg(test)]
mod tests {
    use super::FileScanner;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn collects_java_and_xml_only() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("App.java"), b"class App {}").unwrap();
        fs::write(src.join("UserMapper.xml"), b"<mapper/>").unwrap();
        fs::write(src.join("notes.md"), b"# notes").unwrap();

        let files = FileScanner::new(temp.path()).scan();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.modified.is_some()));
        assert!(files.iter().all(|f| !f.path.ends_with("notes.md")));
    }

    #[test]
    fn skips_build_directories() {
        let temp = tempdir().unwrap();
        let generated = temp.path().join("build").join("generated");
        fs::create_dir_all(&generated).unwrap();
        fs::write(generated.join("Gen.java"), b"class Gen {}").unwrap();
        fs::write(temp.path().join("Main.java"), b"class Main {}").unwrap();

        let files = FileScanner::new(temp.path()).scan();

        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("Main.java"));
    }
}

use crate::error::{CorpusError, Result};
use crate::query::SourceCorpus;
use crate::scanner::FileScanner;
use crate::snapshot::{CorpusSnapshot, SnapshotBuilder};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Live corpus rooted at a project directory.
///
/// Readers take a [`CorpusSnapshot`] with [`Corpus::snapshot`] and run all of
/// their lookups against it; [`Corpus::refresh`] builds the next version off to
/// the side and swaps it in, so readers never observe a partial update.
pub struct Corpus {
    root: PathBuf,
    current: RwLock<Arc<CorpusSnapshot>>,

    /// Last version handed to a refresh
    last_version: AtomicU64,
}

impl Corpus {
    /// Open and index a project directory
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CorpusError::InvalidRoot(root.display().to_string()));
        }
        let corpus = Self {
            root: root.to_path_buf(),
            current: RwLock::new(Arc::new(CorpusSnapshot::default())),
            last_version: AtomicU64::new(0),
        };
        corpus.refresh()?;
        Ok(corpus)
    }

    /// Wrap an already built snapshot (no disk root to refresh from)
    #[must_use]
    pub fn from_snapshot(snapshot: CorpusSnapshot) -> Self {
        Self {
            root: PathBuf::new(),
            last_version: AtomicU64::new(snapshot.version()),
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Consistent read-only view of the current version
    pub fn snapshot(&self) -> Result<Arc<CorpusSnapshot>> {
        self.current
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| CorpusError::unavailable("corpus lock poisoned"))
    }

    /// Re-scan the root, reparsing only files whose modification time changed.
    ///
    /// Returns the new version token.
    pub fn refresh(&self) -> Result<u64> {
        if self.root.as_os_str().is_empty() {
            return Ok(self.snapshot()?.version());
        }

        let previous = self.snapshot()?;
        let version = self.last_version.fetch_add(1, Ordering::SeqCst) + 1;
        let mut builder = SnapshotBuilder::new()?
            .version(version)
            .root(self.root.clone());
        let mut reparsed = 0usize;
        let mut reused = 0usize;

        for file in FileScanner::new(&self.root).scan() {
            if let Some(entry) = previous.entry(&file.path) {
                if file.modified.is_some() && entry.modified == file.modified {
                    builder.reuse(file.path, entry.clone());
                    reused += 1;
                    continue;
                }
            }
            match std::fs::read_to_string(&file.path) {
                Ok(content) => {
                    builder.add_source(file.path, content, file.modified);
                    reparsed += 1;
                }
                Err(e) => log::warn!("Failed to read {}: {e}", file.path.display()),
            }
        }

        let next = Arc::new(builder.build());
        let mut guard = self
            .current
            .write()
            .map_err(|_| CorpusError::unavailable("corpus lock poisoned"))?;
        if guard.version() > version {
            // a refresh that started later already published
            log::debug!("Dropping corpus v{version}, v{} is current", guard.version());
            return Ok(guard.version());
        }
        *guard = next;

        log::info!("Corpus v{version}: {reparsed} files parsed, {reused} reused");
        Ok(version)
    }
}

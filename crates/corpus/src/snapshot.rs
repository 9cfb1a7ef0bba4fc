use crate::error::Result;
use crate::java::JavaParser;
use crate::model::{ClassRef, JavaUnit};
use crate::query::{Scope, SourceCorpus, SourceFile};
use crate::text::SourceText;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub(crate) struct FileEntry {
    pub(crate) modified: Option<u64>,
    pub(crate) text: Arc<SourceText>,
    pub(crate) unit: Option<Arc<JavaUnit>>,
}

/// Immutable, fully indexed corpus version
#[derive(Debug, Default)]
pub struct CorpusSnapshot {
    version: u64,
    root: PathBuf,
    files: BTreeMap<PathBuf, FileEntry>,
    classes: HashMap<String, ClassRef>,
    short_names: HashMap<String, Vec<ClassRef>>,
}

impl CorpusSnapshot {
    pub fn builder() -> Result<SnapshotBuilder> {
        SnapshotBuilder::new()
    }

    /// Build a snapshot from in-memory `(path, content)` pairs.
    ///
    /// The root is the deepest directory shared by all paths.
    pub fn from_sources<I, P, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let mut builder = SnapshotBuilder::new()?;
        for (path, content) in sources {
            builder.add_source(path, content, None);
        }
        Ok(builder.build())
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub(crate) fn entry(&self, path: &Path) -> Option<&FileEntry> {
        self.files.get(path)
    }
}

impl SourceCorpus for CorpusSnapshot {
    fn version(&self) -> u64 {
        self.version
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn files(&self, extension: &str, scope: &Scope) -> Vec<SourceFile> {
        self.files
            .iter()
            .filter(|(path, _)| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .filter(|(path, _)| scope.contains(path))
            .map(|(path, entry)| SourceFile {
                path: path.clone(),
                modified: entry.modified,
            })
            .collect()
    }

    fn unit(&self, path: &Path) -> Option<Arc<JavaUnit>> {
        self.files.get(path).and_then(|entry| entry.unit.clone())
    }

    fn text(&self, path: &Path) -> Option<Arc<SourceText>> {
        self.files.get(path).map(|entry| Arc::clone(&entry.text))
    }

    fn resolve(&self, qualified_name: &str) -> Option<ClassRef> {
        self.classes.get(qualified_name).cloned()
    }

    fn resolve_short_name(&self, name: &str) -> Vec<ClassRef> {
        self.short_names.get(name).cloned().unwrap_or_default()
    }
}

/// Accumulates files, parsing Java sources as they are added
pub struct SnapshotBuilder {
    version: u64,
    root: Option<PathBuf>,
    parser: JavaParser,
    files: BTreeMap<PathBuf, FileEntry>,
}

impl SnapshotBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            version: 0,
            root: None,
            parser: JavaParser::new()?,
            files: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Project root; defaults to the deepest directory shared by all files
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Add a file; `.java` files are parsed, everything else is kept as text
    pub fn add_source(
        &mut self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        modified: Option<u64>,
    ) -> &mut Self {
        let path = path.into();
        let content = content.into();
        let is_java = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("java"));

        let unit = if is_java {
            match self.parser.parse(&path, &content) {
                Ok(unit) => Some(Arc::new(unit)),
                Err(e) => {
                    log::warn!("Failed to parse {}: {e}", path.display());
                    None
                }
            }
        } else {
            None
        };

        self.files.insert(
            path,
            FileEntry {
                modified,
                text: Arc::new(SourceText::new(content)),
                unit,
            },
        );
        self
    }

    pub(crate) fn reuse(&mut self, path: PathBuf, entry: FileEntry) {
        self.files.insert(path, entry);
    }

    /// Index classes and freeze the snapshot
    #[must_use]
    pub fn build(self) -> CorpusSnapshot {
        let mut classes: HashMap<String, ClassRef> = HashMap::new();
        let mut short_names: HashMap<String, Vec<ClassRef>> = HashMap::new();

        for entry in self.files.values() {
            let Some(unit) = &entry.unit else {
                continue;
            };
            for index in 0..unit.classes.len() {
                let Some(class_ref) = ClassRef::new(Arc::clone(unit), index) else {
                    continue;
                };
                short_names
                    .entry(class_ref.name().to_string())
                    .or_default()
                    .push(class_ref.clone());
                classes
                    .entry(class_ref.qualified_name().to_string())
                    .or_insert(class_ref);
            }
        }

        log::debug!(
            "Corpus snapshot v{}: {} files, {} classes",
            self.version,
            self.files.len(),
            classes.len()
        );

        let root = self
            .root
            .unwrap_or_else(|| common_directory(self.files.keys()));

        CorpusSnapshot {
            version: self.version,
            root,
            files: self.files,
            classes,
            short_names,
        }
    }
}

/// Deepest directory containing every path
fn common_directory<'a>(paths: impl Iterator<Item = &'a PathBuf>) -> PathBuf {
    let mut common: Option<PathBuf> = None;
    for path in paths {
        let dir = path.parent().unwrap_or(Path::new(""));
        common = Some(match common {
            None => dir.to_path_buf(),
            Some(current) => current
                .components()
                .zip(dir.components())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }
    common.unwrap_or_default()
}

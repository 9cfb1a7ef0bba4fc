use crate::model::{ClassRef, JavaUnit};
use crate::text::SourceText;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file known to the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,

    /// Modification time in milliseconds since the Unix epoch, when known
    pub modified: Option<u64>,
}

/// Restricts enumeration to part of the corpus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    All,

    /// Files under any of these path prefixes
    Paths(Vec<PathBuf>),
}

impl Scope {
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        match self {
            Self::All => true,
            Self::Paths(prefixes) => prefixes.iter().any(|prefix| path.starts_with(prefix)),
        }
    }
}

/// Read-only view of a source corpus at one version.
///
/// Every lookup made through one value observes the same corpus version, so a
/// scan or a bundle build that holds a single view never sees a half-updated
/// index.
pub trait SourceCorpus: Send + Sync {
    /// Version token of this view
    fn version(&self) -> u64;

    /// Project root; paths below it are what project-relative rules look at
    fn root(&self) -> &Path;

    /// Files with the given extension (without the dot) inside `scope`
    fn files(&self, extension: &str, scope: &Scope) -> Vec<SourceFile>;

    /// Parsed compilation unit for a Java file
    fn unit(&self, path: &Path) -> Option<Arc<JavaUnit>>;

    /// Line-indexed content of any known file
    fn text(&self, path: &Path) -> Option<Arc<SourceText>>;

    /// Class by fully qualified name
    fn resolve(&self, qualified_name: &str) -> Option<ClassRef>;

    /// Classes with the given simple name, in a stable order
    fn resolve_short_name(&self, name: &str) -> Vec<ClassRef>;

    /// Fully qualified name for a type name as written inside `unit`
    fn qualify(&self, unit: &JavaUnit, written: &str) -> Option<String> {
        if let Some(local) = unit.qualify_locally(written) {
            return Some(local);
        }
        let same_package = if unit.package.is_empty() {
            written.to_string()
        } else {
            format!("{}.{written}", unit.package)
        };
        if self.resolve(&same_package).is_some() {
            return Some(same_package);
        }
        unit.wildcard_packages()
            .map(|package| format!("{package}.{written}"))
            .find(|candidate| self.resolve(candidate).is_some())
    }

    /// Class for a type name as written inside `unit`
    fn resolve_in(&self, unit: &JavaUnit, written: &str) -> Option<ClassRef> {
        self.qualify(unit, written)
            .and_then(|qualified| self.resolve(&qualified))
    }
}

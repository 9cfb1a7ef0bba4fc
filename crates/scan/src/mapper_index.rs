use crate::mapper_xml::{is_excluded_path, is_mapper_content, parse_mapper, MapperDocument, MapperStatement};
use entrypack_corpus::{Scope, SourceCorpus, SourceFile};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CachedMapper {
    modified: Option<u64>,
    document: Arc<MapperDocument>,
}

/// Per-file cache of parsed XML mappers, keyed by modification time.
///
/// Not synchronised: concurrent scans should each own an index.
#[derive(Debug, Default)]
pub struct MapperXmlIndex {
    cache: HashMap<PathBuf, CachedMapper>,
    parse_count: usize,
}

impl MapperXmlIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements of every mapper file in `scope`.
    ///
    /// With `related` set, only mappers whose namespace relates to one of the
    /// given class names are kept. Filtering is applied on every call and is
    /// never cached.
    pub fn statements(
        &mut self,
        corpus: &dyn SourceCorpus,
        scope: &Scope,
        related: Option<&HashSet<String>>,
    ) -> Vec<MapperStatement> {
        let mut statements = Vec::new();
        for file in corpus.files("xml", scope) {
            let document = self.document(corpus, &file);
            let Some(namespace) = document.namespace.as_deref() else {
                continue;
            };
            if let Some(services) = related {
                if !is_service_related(namespace, services) {
                    log::debug!(
                        "Skipping mapper {} ({namespace}): no related service",
                        file.path.display()
                    );
                    continue;
                }
            }
            statements.extend(document.statements.iter().cloned());
        }
        statements
    }

    /// Parsed document for one file, from cache when its timestamp is unchanged
    pub fn document(&mut self, corpus: &dyn SourceCorpus, file: &SourceFile) -> Arc<MapperDocument> {
        if let Some(cached) = self.cache.get(&file.path) {
            if file.modified.is_some() && cached.modified == file.modified {
                log::debug!("Mapper cache hit: {}", file.path.display());
                return Arc::clone(&cached.document);
            }
        }

        let document = Arc::new(self.load(corpus, &file.path));
        self.cache.insert(
            file.path.clone(),
            CachedMapper {
                modified: file.modified,
                document: Arc::clone(&document),
            },
        );
        document
    }

    fn load(&mut self, corpus: &dyn SourceCorpus, path: &Path) -> MapperDocument {
        if is_excluded_path(corpus.root(), path) {
            return MapperDocument::default();
        }
        let Some(text) = corpus.text(path) else {
            log::warn!("Mapper file not readable: {}", path.display());
            return MapperDocument::default();
        };
        if !is_mapper_content(text.as_str()) {
            return MapperDocument::default();
        }

        self.parse_count += 1;
        match parse_mapper(path, text.as_str()) {
            Ok(document) => document,
            Err(e) => {
                log::warn!("Failed to parse mapper {}: {e}", path.display());
                MapperDocument::default()
            }
        }
    }

    /// Number of full XML parses performed since creation
    #[must_use]
    pub const fn parse_count(&self) -> usize {
        self.parse_count
    }

    /// `(cached entries, entries with a timestamp)`
    #[must_use]
    pub fn stats(&self) -> (usize, usize) {
        let timestamps = self
            .cache
            .values()
            .filter(|cached| cached.modified.is_some())
            .count();
        (self.cache.len(), timestamps)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Parse a mapper file straight from the corpus, bypassing any cache.
///
/// Ineligible or malformed files yield an empty document.
#[must_use]
pub fn read_mapper(corpus: &dyn SourceCorpus, path: &Path) -> MapperDocument {
    MapperXmlIndex::new().load(corpus, path)
}

/// Whether mapper namespace `namespace` belongs with any class in `services`.
///
/// Related means either a literal match, or both a related package and a
/// related base name (`UserMapper` and `UserService` share `user`).
#[must_use]
pub fn is_service_related(namespace: &str, services: &HashSet<String>) -> bool {
    if services.contains(namespace) {
        return true;
    }
    let (mapper_package, mapper_name) = split_qualified(namespace);
    let mapper_base = strip_role(mapper_name, &["mapper", "dao"]);
    if mapper_base.is_empty() {
        return false;
    }

    services.iter().any(|service| {
        let (service_package, service_name) = split_qualified(service);
        let service_base = strip_role(service_name, &["service", "controller"]);
        !service_base.is_empty()
            && packages_related(mapper_package, service_package)
            && (mapper_base.contains(&service_base) || service_base.contains(&mapper_base))
    })
}

fn split_qualified(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or(("", name))
}

fn strip_role(name: &str, suffixes: &[&str]) -> String {
    let lowered = name.to_lowercase();
    suffixes
        .iter()
        .find_map(|suffix| lowered.strip_suffix(*suffix))
        .unwrap_or(lowered.as_str())
        .to_string()
}

fn packages_related(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return a == b;
    }
    root_package(a) == root_package(b) || is_package_prefix(a, b) || is_package_prefix(b, a)
}

fn root_package(package: &str) -> String {
    package.split('.').take(2).collect::<Vec<_>>().join(".")
}

fn is_package_prefix(prefix: &str, package: &str) -> bool {
    package == prefix
        || package
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

use crate::config::ContextConfig;
use entrypack_corpus::{Annotation, ClassRef};

/// Always-on entity package fragments, on top of configured keywords
pub const DEFAULT_PACKAGE_KEYWORDS: &[&str] = &[".entity", ".model", ".domain", ".po", ".pojo"];

/// Always-on entity name suffixes, on top of configured suffixes
pub const DEFAULT_TYPE_SUFFIXES: &[&str] = &["Entity", "DO", "PO", "POJO"];

/// Runtime and framework packages that never hold project entities
pub const EXCLUDED_PACKAGES: &[&str] = &[
    "java.lang",
    "java.util",
    "java.time",
    "java.math",
    "org.springframework",
    "com.baomidou.mybatisplus.core",
];

/// Role names of behaviour-carrying types
pub const EXCLUDED_NAME_SUFFIXES: &[&str] = &["Mapper", "Service", "Controller", "Config", "Utils"];

/// Decides whether a type is a data entity worth showing next to an entry point.
///
/// A whitelisted annotation always marks an entity. Otherwise an excluded
/// package or role suffix rules the type out before the package keyword and
/// name suffix rules are consulted.
#[derive(Debug, Clone)]
pub struct EntityClassifier {
    annotation_whitelist: Vec<String>,
    package_keywords: Vec<String>,
    type_suffixes: Vec<String>,
}

impl Default for EntityClassifier {
    fn default() -> Self {
        Self::new(&ContextConfig::default())
    }
}

impl EntityClassifier {
    #[must_use]
    pub fn new(config: &ContextConfig) -> Self {
        let package_keywords = config
            .package_keywords
            .iter()
            .map(String::as_str)
            .chain(DEFAULT_PACKAGE_KEYWORDS.iter().copied())
            .map(str::to_lowercase)
            .collect();
        let type_suffixes = config
            .type_suffixes
            .iter()
            .map(String::as_str)
            .chain(DEFAULT_TYPE_SUFFIXES.iter().copied())
            .map(str::to_string)
            .collect();

        Self {
            annotation_whitelist: config.annotation_whitelist.clone(),
            package_keywords,
            type_suffixes,
        }
    }

    #[must_use]
    pub fn is_entity(&self, class: &ClassRef) -> bool {
        self.classify(
            class.qualified_name(),
            class.package(),
            class.name(),
            &class.class().annotations,
        )
    }

    /// Classification from raw facts about a type
    #[must_use]
    pub fn classify(
        &self,
        qualified_name: &str,
        package: &str,
        simple_name: &str,
        annotations: &[Annotation],
    ) -> bool {
        if annotations.iter().any(|a| self.is_whitelisted(a)) {
            return true;
        }
        if is_excluded(qualified_name, simple_name) {
            return false;
        }

        let package = package.to_lowercase();
        self.package_keywords
            .iter()
            .any(|keyword| package.contains(keyword.as_str()))
            || self
                .type_suffixes
                .iter()
                .any(|suffix| simple_name.ends_with(suffix.as_str()))
    }

    fn is_whitelisted(&self, annotation: &Annotation) -> bool {
        let qualified = annotation.best_name();
        let simple = annotation.simple_name();
        self.annotation_whitelist.iter().any(|entry| {
            qualified == entry.as_str()
                || simple == entry.as_str()
                || qualified.ends_with(&format!(".{entry}"))
        })
    }
}

/// Framework types and role-named types are never entities
#[must_use]
pub fn is_excluded(qualified_name: &str, simple_name: &str) -> bool {
    EXCLUDED_PACKAGES.iter().any(|package| {
        qualified_name
            .strip_prefix(*package)
            .is_some_and(|rest| rest.starts_with('.'))
    }) || EXCLUDED_NAME_SUFFIXES
        .iter()
        .any(|suffix| simple_name.ends_with(*suffix))
}

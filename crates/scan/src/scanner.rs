use crate::config::ScanConfig;
use crate::entry::{EntryPoint, Provenance};
use crate::error::{Result, ScanError};
use crate::mapper_index::MapperXmlIndex;
use crate::mapper_xml::MapperStatement;
use crate::reconcile::reconcile;
use entrypack_corpus::{Annotation, ClassRef, Corpus, JavaClass, JavaUnit, Scope, SourceCorpus, TypeRef};
use std::collections::HashSet;
use std::sync::Arc;

pub const BASE_MAPPER_FQN: &str = "com.baomidou.mybatisplus.core.mapper.BaseMapper";
pub const MYBATIS_ANNOTATIONS_PACKAGE: &str = "org.apache.ibatis.annotations";

/// Statement annotations that carry inline SQL
pub const SQL_ANNOTATIONS: &[&str] = &["Select", "Insert", "Update", "Delete"];

/// Base CRUD methods assumed when `BaseMapper` itself is not in the corpus,
/// as `(name, parameter types)` with `T` standing for the entity type
const DEFAULT_BASE_METHODS: &[(&str, &str)] = &[
    ("insert", "T"),
    ("deleteById", "Serializable"),
    ("selectById", "Serializable"),
    ("updateById", "T"),
    ("selectList", "Wrapper<T>"),
    ("selectOne", "Wrapper<T>"),
    ("update", "T,Wrapper<T>"),
    ("delete", "Wrapper<T>"),
    ("selectPage", "P,Wrapper<T>"),
    ("selectMaps", "Wrapper<T>"),
    ("selectObjs", "Wrapper<T>"),
];

/// Finds entry points in a corpus.
///
/// Owns a [`MapperXmlIndex`], so repeated scans with one scanner only reparse
/// mapper files whose timestamp changed.
pub struct EntryPointScanner {
    config: ScanConfig,
    targets: Vec<String>,
    mapper_index: MapperXmlIndex,
}

impl EntryPointScanner {
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        let targets = config.target_annotations();
        Self {
            config,
            targets,
            mapper_index: MapperXmlIndex::new(),
        }
    }

    /// Like [`EntryPointScanner::new`], rejecting configurations that can find nothing
    pub fn try_new(config: ScanConfig) -> Result<Self> {
        config.validate().map_err(ScanError::InvalidConfig)?;
        Ok(Self::new(config))
    }

    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    #[must_use]
    pub const fn mapper_index(&self) -> &MapperXmlIndex {
        &self.mapper_index
    }

    pub fn mapper_index_mut(&mut self) -> &mut MapperXmlIndex {
        &mut self.mapper_index
    }

    /// Scan the current version of a live corpus.
    ///
    /// Fails only when the corpus cannot hand out a snapshot.
    pub fn scan_corpus(&mut self, corpus: &Corpus, scope: &Scope) -> Result<Vec<EntryPoint>> {
        let snapshot = corpus.snapshot()?;
        Ok(self.scan(snapshot.as_ref(), scope))
    }

    /// Scan `scope` and return one reconciled entry point per `(class, method name)`.
    ///
    /// All lookups go through `corpus`, so holding one snapshot for the call
    /// gives a consistent result. Result order is not significant.
    pub fn scan(&mut self, corpus: &dyn SourceCorpus, scope: &Scope) -> Vec<EntryPoint> {
        let mut candidates = Vec::new();
        for file in corpus.files("java", scope) {
            let Some(unit) = corpus.unit(&file.path) else {
                log::debug!("Skipping unparsed source {}", file.path.display());
                continue;
            };
            for index in 0..unit.classes.len() {
                if let Some(class) = ClassRef::new(Arc::clone(&unit), index) {
                    self.scan_class(corpus, &class, &mut candidates);
                }
            }
        }
        let java_count = candidates.len();

        if self.config.mybatis.enabled {
            let related: Option<HashSet<String>> = self
                .config
                .mybatis
                .strict_service_mapping
                .then(|| candidates.iter().map(|c| c.class_fqn.clone()).collect());
            let statements = self
                .mapper_index
                .statements(corpus, scope, related.as_ref());
            candidates.extend(
                statements
                    .into_iter()
                    .map(|statement| xml_entry(corpus, statement)),
            );
        }

        let xml_count = candidates.len() - java_count;
        let entries = reconcile(candidates);
        log::info!(
            "Found {} entry points ({java_count} source candidates, {xml_count} mapper statements)",
            entries.len()
        );
        entries
    }

    fn scan_class(&self, corpus: &dyn SourceCorpus, class_ref: &ClassRef, out: &mut Vec<EntryPoint>) {
        let unit = class_ref.unit();
        let class = class_ref.class();

        let class_tag = class
            .annotations
            .iter()
            .find_map(|annotation| self.entry_tag(corpus, unit, annotation));

        let base_mapper = if self.config.mybatis.enabled {
            base_mapper_type(corpus, unit, class)
        } else {
            None
        };
        let base_methods = match base_mapper {
            Some(super_type) if self.config.mybatis.include_mybatis_plus_base_methods => {
                base_method_signatures(corpus, super_type)
            }
            _ => Vec::new(),
        };

        for method in &class.methods {
            if method.is_constructor() {
                continue;
            }
            let method_tag = method
                .annotations
                .iter()
                .find_map(|annotation| self.entry_tag(corpus, unit, annotation));
            let is_base = base_methods.iter().any(|(name, _)| *name == method.name);

            let provenance = match (method_tag, &class_tag) {
                (Some(tag), _) => Provenance::Annotation(tag),
                (None, Some(tag)) => Provenance::Annotation(tag.clone()),
                (None, None) if is_base => Provenance::BaseMapper,
                (None, None) => continue,
            };

            let sql = method
                .annotations
                .iter()
                .filter(|annotation| is_sql_annotation(unit, annotation))
                .find_map(|annotation| {
                    annotation
                        .attribute("value")
                        .or_else(|| annotation.default_attribute())
                        .and_then(sql_from_literal)
                });

            out.push(EntryPoint {
                class_fqn: class.qualified_name.clone(),
                method: method.signature(),
                file: unit.path.clone(),
                line: method.name_line,
                provenance,
                sql,
                xml_path: None,
            });
        }

        for (name, signature) in &base_methods {
            if class.methods.iter().any(|method| method.name == *name) {
                continue;
            }
            out.push(EntryPoint {
                class_fqn: class.qualified_name.clone(),
                method: signature.clone(),
                file: unit.path.clone(),
                line: class.name_line,
                provenance: Provenance::BaseMapper,
                sql: None,
                xml_path: None,
            });
        }
    }

    /// Short name of a target or SQL statement annotation
    fn entry_tag(&self, corpus: &dyn SourceCorpus, unit: &JavaUnit, annotation: &Annotation) -> Option<String> {
        let simple = annotation.simple_name();
        let qualified = annotation
            .qualified_name
            .clone()
            .or_else(|| corpus.qualify(unit, &annotation.name))
            .unwrap_or_else(|| annotation.name.clone());

        let targeted = self.targets.iter().any(|target| {
            qualified == *target || qualified.ends_with(&format!(".{target}")) || simple == target.as_str()
        });
        (targeted || is_sql_annotation(unit, annotation)).then(|| simple.to_string())
    }
}

/// MyBatis statement annotation, resolved through imports
#[must_use]
pub fn is_sql_annotation(unit: &JavaUnit, annotation: &Annotation) -> bool {
    let simple = annotation.simple_name();
    if !SQL_ANNOTATIONS.contains(&simple) {
        return false;
    }
    let qualified = annotation
        .qualified_name
        .as_deref()
        .or_else(|| annotation.name.contains('.').then_some(annotation.name.as_str()));
    match qualified {
        Some(qualified) => qualified
            .strip_suffix(simple)
            .and_then(|package| package.strip_suffix('.'))
            .is_some_and(|package| package == MYBATIS_ANNOTATIONS_PACKAGE),
        None => unit
            .wildcard_packages()
            .any(|package| package == MYBATIS_ANNOTATIONS_PACKAGE),
    }
}

/// The `BaseMapper<..>` super type of a MyBatis-Plus mapper interface
#[must_use]
pub fn base_mapper_type<'a>(corpus: &dyn SourceCorpus, unit: &JavaUnit, class: &'a JavaClass) -> Option<&'a TypeRef> {
    if !class.is_interface() {
        return None;
    }
    class.super_types.iter().find(|super_type| {
        let resolved = corpus.qualify(unit, &super_type.name);
        resolved.as_deref() == Some(BASE_MAPPER_FQN)
            || (super_type.name == "BaseMapper"
                && unit
                    .wildcard_packages()
                    .any(|package| BASE_MAPPER_FQN.strip_prefix(package) == Some(".BaseMapper")))
    })
}

/// `(name, signature)` of the inherited CRUD methods, one per name
fn base_method_signatures(corpus: &dyn SourceCorpus, super_type: &TypeRef) -> Vec<(String, String)> {
    let entity = super_type
        .args
        .first()
        .map_or("T", TypeRef::simple_name)
        .to_string();

    let mut methods: Vec<(String, String)> = Vec::new();
    if let Some(base) = corpus.resolve(BASE_MAPPER_FQN) {
        let class = base.class();
        for method in &class.methods {
            if method.is_constructor()
                || !class.is_public_member(method)
                || methods.iter().any(|(name, _)| *name == method.name)
            {
                continue;
            }
            methods.push((method.name.clone(), substitute_type_param(&method.signature(), "T", &entity)));
        }
    }

    if methods.is_empty() {
        methods = DEFAULT_BASE_METHODS
            .iter()
            .map(|(name, params)| {
                let signature = format!("{name}({params})");
                ((*name).to_string(), substitute_type_param(&signature, "T", &entity))
            })
            .collect();
    }
    methods
}

/// Replace whole identifier tokens equal to `param`
fn substitute_type_param(signature: &str, param: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(signature.len());
    let mut token = String::new();
    let flush = |token: &mut String, out: &mut String| {
        if token.as_str() == param {
            out.push_str(replacement);
        } else {
            out.push_str(token);
        }
        token.clear();
    };
    for c in signature.chars() {
        if c.is_alphanumeric() || c == '_' || c == '$' {
            token.push(c);
        } else {
            flush(&mut token, &mut out);
            out.push(c);
        }
    }
    flush(&mut token, &mut out);
    out
}

/// SQL text from an annotation value as written in source.
///
/// Handles plain literals, `+` concatenation, `{..}` arrays (joined with a
/// space) and text blocks. Constant references and blank results are `None`.
#[must_use]
pub fn sql_from_literal(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let joined = if let Some(block) = raw.strip_prefix("\"\"\"").and_then(|r| r.strip_suffix("\"\"\"")) {
        block.to_string()
    } else {
        let literals = string_literals(raw);
        if literals.is_empty() {
            return None;
        }
        if raw.starts_with('{') {
            literals.join(" ")
        } else {
            literals.concat()
        }
    };
    let sql = joined.replace("\\\"", "\"").replace("\\n", "\n");
    let sql = sql.trim();
    (!sql.is_empty()).then(|| sql.to_string())
}

fn string_literals(raw: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '"' {
            continue;
        }
        let mut literal = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    literal.push(c);
                    if let Some(escaped) = chars.next() {
                        literal.push(escaped);
                    }
                }
                '"' => break,
                _ => literal.push(c),
            }
        }
        literals.push(literal);
    }
    literals
}

fn xml_entry(corpus: &dyn SourceCorpus, statement: MapperStatement) -> EntryPoint {
    let method = corpus
        .resolve(&statement.namespace)
        .and_then(|class| class.method_named(&statement.id))
        .map_or_else(|| statement.id.clone(), |method| method.method().signature());

    EntryPoint {
        class_fqn: statement.namespace,
        method,
        file: statement.file.clone(),
        line: statement.line,
        provenance: Provenance::MyBatisXml,
        sql: Some(statement.sql),
        xml_path: Some(statement.file),
    }
}

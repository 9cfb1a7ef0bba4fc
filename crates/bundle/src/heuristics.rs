//! Extra related-type signals for SQL-backed entry points

use entrypack_corpus::{JavaUnit, Parameter, SourceCorpus};
use entrypack_scan::{EntryPoint, Provenance, SQL_ANNOTATIONS};
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#$]\{\s*(\w+)[^}]*\}").expect("valid placeholder pattern"));

/// Parameter name fragments that usually carry an entity
pub const ENTITY_PARAM_TOKENS: &[&str] = &["entity", "model", "record", "data", "user", "order", "product"];

/// Packages whose types are never project entities
pub const FRAMEWORK_PACKAGES: &[&str] = &[
    "java.lang",
    "java.util",
    "java.time",
    "java.math",
    "org.springframework",
    "com.baomidou.mybatisplus",
];

/// Root names of `#{..}` and `${..}` placeholders, first-seen order.
///
/// `#{user.name, jdbcType=VARCHAR}` yields `user`.
#[must_use]
pub fn sql_placeholders(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in PLACEHOLDER.captures_iter(sql) {
        let name = &captures[1];
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Whether a parameter looks like it carries an entity, by name or by type
#[must_use]
pub fn is_likely_entity_parameter(corpus: &dyn SourceCorpus, unit: &JavaUnit, param: &Parameter) -> bool {
    let name = param.name.to_lowercase();
    if ENTITY_PARAM_TOKENS.iter().any(|token| name.contains(token)) {
        return true;
    }
    if param.ty.is_primitive() {
        return false;
    }
    corpus.resolve_in(unit, &param.ty.name).is_some_and(|class| {
        !class.class().is_interface() && !is_framework_type(class.qualified_name())
    })
}

#[must_use]
pub fn is_framework_type(qualified_name: &str) -> bool {
    FRAMEWORK_PACKAGES.iter().any(|package| {
        qualified_name
            .strip_prefix(*package)
            .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Entry points whose class is a MyBatis mapper
#[must_use]
pub fn is_mapper_style(entry: &EntryPoint) -> bool {
    match &entry.provenance {
        Provenance::MyBatisXml | Provenance::BaseMapper => true,
        Provenance::Annotation(name) => {
            let lowered = name.to_lowercase();
            SQL_ANNOTATIONS.contains(&name.as_str())
                || lowered.contains("mybatis")
                || lowered.contains("mapper")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrypack_corpus::{CorpusSnapshot, TypeRef};
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    #[test]
    fn extracts_placeholder_roots() {
        let sql = "UPDATE t SET name = #{user.name}, age = #{ age , jdbcType=INTEGER} \
                   WHERE id = #{id} ORDER BY ${sort} LIMIT #{user.limit}";
        assert_eq!(sql_placeholders(sql), vec!["user", "age", "id", "sort"]);
        assert!(sql_placeholders("SELECT 1").is_empty());
    }

    #[test]
    fn recognises_mapper_style_entries() {
        let mut entry = EntryPoint {
            class_fqn: "a.B".into(),
            method: "m()".into(),
            file: PathBuf::from("B.java"),
            line: 1,
            provenance: Provenance::BaseMapper,
            sql: None,
            xml_path: None,
        };
        assert!(is_mapper_style(&entry));
        entry.provenance = Provenance::Annotation("Select".into());
        assert!(is_mapper_style(&entry));
        entry.provenance = Provenance::Annotation("Mapper".into());
        assert!(is_mapper_style(&entry));
        entry.provenance = Provenance::Annotation("Service".into());
        assert!(!is_mapper_style(&entry));
    }

    #[test]
    fn judges_parameters_by_name_and_type() {
        let corpus = CorpusSnapshot::from_sources([
            (
                "/repo/com/example/Repo.java",
                "package com.example;\npublic class Repo { void save(Invoice invoice, Payable p, long id) {} }\n",
            ),
            ("/repo/com/example/Invoice.java", "package com.example;\npublic class Invoice {}\n"),
            ("/repo/com/example/Payable.java", "package com.example;\npublic interface Payable {}\n"),
        ])
        .unwrap();
        let unit = corpus.unit(Path::new("/repo/com/example/Repo.java")).unwrap();
        let params = &unit.classes[0].methods[0].parameters;

        assert!(is_likely_entity_parameter(&corpus, &unit, &params[0]));
        assert!(!is_likely_entity_parameter(&corpus, &unit, &params[1]));
        assert!(!is_likely_entity_parameter(&corpus, &unit, &params[2]));

        let by_name = Parameter {
            name: "userRecord".into(),
            ty: TypeRef::simple("Map"),
        };
        assert!(is_likely_entity_parameter(&corpus, &unit, &by_name));
    }
}

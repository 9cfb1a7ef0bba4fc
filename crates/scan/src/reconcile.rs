use crate::entry::{EntryPoint, Provenance};
use std::collections::HashMap;

/// Collapse candidates that describe the same `(class, method name)` into one.
///
/// Groups keep the order in which their first candidate appeared. Within a
/// group the highest priority provenance wins (annotation > XML > base
/// mapper), first-seen on ties. An annotation winner takes its SQL and XML
/// origin from an XML candidate carrying SQL.
#[must_use]
pub fn reconcile(candidates: Vec<EntryPoint>) -> Vec<EntryPoint> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), Vec<EntryPoint>> = HashMap::new();

    for candidate in candidates {
        let key = candidate.key();
        let group = groups.entry(key.clone()).or_default();
        if group.is_empty() {
            order.push(key);
        }
        group.push(candidate);
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter_map(resolve_group)
        .collect()
}

fn resolve_group(group: Vec<EntryPoint>) -> Option<EntryPoint> {
    let sql_source = group
        .iter()
        .find(|entry| entry.provenance == Provenance::MyBatisXml && entry.has_sql())
        .map(|entry| (entry.sql.clone(), entry.xml_path.clone()));

    let mut winner: Option<EntryPoint> = None;
    for entry in group {
        let better = winner
            .as_ref()
            .map_or(true, |current| entry.provenance.priority() > current.provenance.priority());
        if better {
            winner = Some(entry);
        }
    }

    let mut winner = winner?;
    if winner.provenance.is_annotation() {
        if let Some((sql, xml_path)) = sql_source {
            winner.sql = sql;
            winner.xml_path = xml_path;
        }
    }
    Some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn entry(method: &str, provenance: Provenance, sql: Option<&str>) -> EntryPoint {
        let xml = provenance == Provenance::MyBatisXml;
        EntryPoint {
            class_fqn: "com.example.mapper.UserMapper".into(),
            method: method.into(),
            file: PathBuf::from(if xml { "UserMapper.xml" } else { "UserMapper.java" }),
            line: 7,
            provenance,
            sql: sql.map(str::to_string),
            xml_path: xml.then(|| PathBuf::from("UserMapper.xml")),
        }
    }

    #[test]
    fn java_entry_takes_sql_from_xml() {
        let java = entry("findAll()", Provenance::Annotation("Mapper".into()), None);
        let xml = entry("findAll", Provenance::MyBatisXml, Some("SELECT 1"));

        let merged = reconcile(vec![xml, java.clone()]);
        assert_eq!(
            merged,
            vec![EntryPoint {
                sql: Some("SELECT 1".into()),
                xml_path: Some(PathBuf::from("UserMapper.xml")),
                ..java
            }]
        );
    }

    #[test]
    fn xml_beats_base_mapper() {
        let base = entry("selectById(Serializable)", Provenance::BaseMapper, None);
        let xml = entry("selectById", Provenance::MyBatisXml, Some("SELECT * FROM users"));

        let merged = reconcile(vec![base, xml.clone()]);
        assert_eq!(merged, vec![xml]);
    }

    #[test]
    fn singletons_pass_through_in_first_seen_order() {
        let a = entry("a()", Provenance::BaseMapper, None);
        let b = entry("b()", Provenance::Annotation("Service".into()), None);
        let a_again = entry("a(int)", Provenance::BaseMapper, None);

        let merged = reconcile(vec![a.clone(), b.clone(), a_again]);
        assert_eq!(merged, vec![a, b]);
    }
}

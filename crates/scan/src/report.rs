use crate::entry::{EntryPoint, Provenance};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Problem found in one entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    BlankClass,
    BlankMethod,
    BlankFile,
    InvalidLine,
    MissingSql,
    Duplicate,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::BlankClass => "class name is blank",
            Self::BlankMethod => "method is blank",
            Self::BlankFile => "source file is blank",
            Self::InvalidLine => "line number must be positive",
            Self::MissingSql => "XML entry has no SQL",
            Self::Duplicate => "duplicate (class, method) entry",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanIssue {
    /// Position in the validated list
    pub index: usize,
    pub class_fqn: String,
    pub method: String,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub total: usize,
    pub xml: usize,
    pub java_annotation: usize,
    pub base_mapper: usize,
    pub with_sql: usize,
}

/// Consistency check over a scan result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub stats: ScanStats,
    pub issues: Vec<ScanIssue>,
}

impl ScanReport {
    #[must_use]
    pub fn validate(entries: &[EntryPoint]) -> Self {
        let mut report = Self::default();
        let mut seen = HashSet::new();

        for (index, entry) in entries.iter().enumerate() {
            let stats = &mut report.stats;
            stats.total += 1;
            match entry.provenance {
                Provenance::Annotation(_) => stats.java_annotation += 1,
                Provenance::MyBatisXml => stats.xml += 1,
                Provenance::BaseMapper => stats.base_mapper += 1,
            }
            if entry.has_sql() {
                stats.with_sql += 1;
            }

            let mut flag = |kind| {
                report.issues.push(ScanIssue {
                    index,
                    class_fqn: entry.class_fqn.clone(),
                    method: entry.method.clone(),
                    kind,
                });
            };
            if entry.class_fqn.trim().is_empty() {
                flag(IssueKind::BlankClass);
            }
            if entry.method.trim().is_empty() {
                flag(IssueKind::BlankMethod);
            }
            if entry.file.as_os_str().is_empty() {
                flag(IssueKind::BlankFile);
            }
            if entry.line == 0 {
                flag(IssueKind::InvalidLine);
            }
            if entry.provenance == Provenance::MyBatisXml && !entry.has_sql() {
                flag(IssueKind::MissingSql);
            }
            if !seen.insert(entry.key()) {
                flag(IssueKind::Duplicate);
            }
        }
        report
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(
            f,
            "{} entry points: {} annotated, {} XML, {} base mapper, {} with SQL",
            s.total, s.java_annotation, s.xml, s.base_mapper, s.with_sql
        )?;
        for issue in &self.issues {
            writeln!(
                f,
                "  [{}] {}#{}: {}",
                issue.index, issue.class_fqn, issue.method, issue.kind
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn entry(class: &str, method: &str, provenance: Provenance, sql: Option<&str>) -> EntryPoint {
        EntryPoint {
            class_fqn: class.into(),
            method: method.into(),
            file: PathBuf::from("A.java"),
            line: 1,
            provenance,
            sql: sql.map(str::to_string),
            xml_path: None,
        }
    }

    #[test]
    fn counts_and_flags_entries() {
        let mut no_line = entry("a.B", "c()", Provenance::BaseMapper, None);
        no_line.line = 0;
        let entries = vec![
            entry("a.B", "find()", Provenance::Annotation("Service".into()), Some("SELECT 1")),
            entry("a.M", "list", Provenance::MyBatisXml, None),
            entry(" ", "x()", Provenance::Annotation("Service".into()), None),
            no_line,
            entry("a.B", "find(int)", Provenance::Annotation("Service".into()), None),
        ];

        let report = ScanReport::validate(&entries);
        assert_eq!(
            report.stats,
            ScanStats {
                total: 5,
                xml: 1,
                java_annotation: 3,
                base_mapper: 1,
                with_sql: 1,
            }
        );
        let kinds: Vec<(usize, IssueKind)> =
            report.issues.iter().map(|issue| (issue.index, issue.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (1, IssueKind::MissingSql),
                (2, IssueKind::BlankClass),
                (3, IssueKind::InvalidLine),
                (4, IssueKind::Duplicate),
            ]
        );
        assert!(!report.is_valid());
    }

    #[test]
    fn empty_scan_is_valid() {
        assert!(ScanReport::validate(&[]).is_valid());
    }
}

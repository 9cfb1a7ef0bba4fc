//! Streaming parser for MyBatis XML mapper files
//!
//! Only the parts needed for entry points are extracted: the mapper
//! namespace, each `select`/`insert`/`update`/`delete` statement with its SQL
//! text (including text nested in dynamic SQL tags), and the entity types named
//! by result mappings. DTDs are never loaded.

use crate::error::{Result, ScanError};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

static MAPPER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<mapper\s[^>]*namespace\s*=").expect("valid mapper tag pattern"));

/// Directories that never hold live mapper files
const EXCLUDED_DIRS: &[&str] = &[
    "build",
    "target",
    "out",
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    ".gradle",
    "test-fixtures",
    "testdata",
];

/// Markers of other XML dialects (Spring bean definitions, MyBatis global config)
const FOREIGN_MARKERS: &[&str] = &[
    "spring-beans",
    "http://www.springframework.org/schema/beans",
    "mybatis-3-config",
];

const STATEMENT_TAGS: &[&str] = &["select", "insert", "update", "delete"];

/// One SQL statement declared in a mapper file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperStatement {
    pub namespace: String,
    pub id: String,
    pub sql: String,
    pub file: PathBuf,

    /// Line of the opening statement tag (1-indexed)
    pub line: usize,
}

/// Everything extracted from one mapper file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperDocument {
    pub namespace: Option<String>,
    pub statements: Vec<MapperStatement>,

    /// Type names from `resultMap@type`, `association@javaType`,
    /// `collection@ofType` and any `resultType`, in document order, unique
    pub entity_types: Vec<String>,
}

impl MapperDocument {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.entity_types.is_empty()
    }
}

/// True when a path runs through a build, VCS, dependency or fixture
/// directory below `root`; directories above the project root never count
#[must_use]
pub fn is_excluded_path(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
    })
}

/// Cheap content check run before a full parse
#[must_use]
pub fn is_mapper_content(content: &str) -> bool {
    let declares_mapper = content.contains("<!DOCTYPE mapper") || MAPPER_TAG.is_match(content);
    if !declares_mapper {
        return false;
    }
    let lowered = content.to_lowercase();
    !FOREIGN_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Statement currently accumulating text
struct OpenStatement {
    id: String,
    line: usize,
    runs: Vec<String>,
    depth: usize,
}

/// Parse a mapper file.
///
/// Malformed XML is an error; callers treat it as an empty result.
pub fn parse_mapper(path: &Path, content: &str) -> Result<MapperDocument> {
    let mut reader = Reader::from_str(content);
    let mut lines = LineTracker::new(content);
    let mut doc = MapperDocument::default();
    let mut namespace: Option<String> = None;
    let mut open: Option<OpenStatement> = None;

    loop {
        let position = usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX);
        let event = reader.read_event().map_err(|e| ScanError::Xml {
            position,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                let tag = local_name(&start);
                collect_entity_types(&start, &tag, &mut doc.entity_types);

                if let Some(statement) = open.as_mut() {
                    statement.depth += 1;
                } else if tag == "mapper" {
                    namespace = attribute(&start, "namespace");
                    doc.namespace.clone_from(&namespace);
                } else if STATEMENT_TAGS.contains(&tag.as_str()) {
                    open = Some(OpenStatement {
                        id: attribute(&start, "id").unwrap_or_default(),
                        line: lines.line_at(position),
                        runs: Vec::new(),
                        depth: 0,
                    });
                }
            }
            Event::Empty(start) => {
                let tag = local_name(&start);
                collect_entity_types(&start, &tag, &mut doc.entity_types);
                if open.is_none() && tag == "mapper" {
                    namespace = attribute(&start, "namespace");
                    doc.namespace.clone_from(&namespace);
                }
            }
            Event::Text(text) => {
                if let Some(statement) = open.as_mut() {
                    push_run(&mut statement.runs, &unescape(&text));
                }
            }
            Event::CData(data) => {
                if let Some(statement) = open.as_mut() {
                    push_run(&mut statement.runs, &String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => match open.take() {
                Some(mut statement) if statement.depth > 0 => {
                    statement.depth -= 1;
                    open = Some(statement);
                }
                Some(statement) => {
                    let sql = statement.runs.join(" ");
                    let ns = namespace.clone().unwrap_or_default();
                    if !statement.id.is_empty() && !sql.is_empty() {
                        doc.statements.push(MapperStatement {
                            namespace: ns,
                            id: statement.id,
                            sql,
                            file: path.to_path_buf(),
                            line: statement.line,
                        });
                    }
                }
                None => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(doc)
}

fn push_run(runs: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        runs.push(trimmed.to_string());
    }
}

fn unescape(text: &BytesText<'_>) -> String {
    text.unescape()
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(text).into_owned())
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.trim().to_string()))
        .filter(|value| !value.is_empty())
}

fn collect_entity_types(start: &BytesStart<'_>, tag: &str, out: &mut Vec<String>) {
    let mut push = |value: Option<String>| {
        if let Some(value) = value {
            if !out.contains(&value) {
                out.push(value);
            }
        }
    };
    match tag {
        "resultMap" => push(attribute(start, "type")),
        "association" => push(attribute(start, "javaType")),
        "collection" => push(attribute(start, "ofType")),
        _ => {}
    }
    push(attribute(start, "resultType"));
}

/// Maps forward-moving byte offsets to 1-indexed lines
struct LineTracker<'a> {
    content: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineTracker<'a> {
    const fn new(content: &'a str) -> Self {
        Self {
            content: content.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        let offset = offset.min(self.content.len());
        if offset < self.offset {
            self.offset = 0;
            self.line = 1;
        }
        self.line += self.content[self.offset..offset]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.offset = offset;
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const USER_MAPPER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE mapper PUBLIC "-//mybatis.org//DTD Mapper 3.0//EN" "http://mybatis.org/dtd/mybatis-3-mapper.dtd">
<mapper namespace="com.example.mapper.UserMapper">
  <resultMap id="userMap" type="com.example.entity.User">
    <association property="dept" javaType="com.example.entity.Dept"/>
    <collection property="roles" ofType="Role"/>
  </resultMap>
  <sql id="cols">id, name</sql>
  <select id="findActive" resultType="com.example.entity.User">
    SELECT * FROM users
    <where>
      <if test="name != null">AND name = #{name}</if>
    </where>
  </select>
  <update id="rename"><![CDATA[UPDATE users SET name = #{name} WHERE id < 10]]></update>
  <delete id="empty">   </delete>
</mapper>
"#;

    #[test]
    fn detects_mapper_content() {
        assert!(is_mapper_content(r#"<mapper namespace="x"></mapper>"#));
        assert!(is_mapper_content(USER_MAPPER));
        assert!(!is_mapper_content(
            r#"<mapper namespace="x"><!-- spring-beans --></mapper>"#
        ));
        assert!(!is_mapper_content(
            r#"<!DOCTYPE configuration PUBLIC "-//mybatis.org//DTD Config 3.0//EN" "mybatis-3-config.dtd"><configuration/>"#
        ));
        assert!(!is_mapper_content("<beans/>"));
    }

    #[test]
    fn excludes_build_and_fixture_dirs() {
        let root = Path::new("/repo");
        assert!(is_excluded_path(root, Path::new("/repo/target/classes/UserMapper.xml")));
        assert!(is_excluded_path(root, Path::new("/repo/src/testdata/UserMapper.xml")));
        assert!(!is_excluded_path(
            root,
            Path::new("/repo/src/main/resources/mapper/UserMapper.xml")
        ));
    }

    #[test]
    fn ignores_excluded_names_above_the_root() {
        let root = Path::new("/home/dev/build/repo");
        assert!(!is_excluded_path(
            root,
            Path::new("/home/dev/build/repo/src/main/resources/mapper/UserMapper.xml")
        ));
        assert!(is_excluded_path(
            root,
            Path::new("/home/dev/build/repo/build/resources/main/UserMapper.xml")
        ));
    }

    #[test]
    fn joins_text_nested_in_dynamic_tags() {
        let doc = parse_mapper(
            Path::new("M.xml"),
            r#"<mapper namespace="n"><select id="s">SELECT * FROM t <if test="x">WHERE x=1</if></select></mapper>"#,
        )
        .unwrap();
        assert_eq!(doc.statements.len(), 1);
        assert_eq!(doc.statements[0].sql, "SELECT * FROM t WHERE x=1");
    }

    #[test]
    fn extracts_statements_and_entity_types() {
        let doc = parse_mapper(Path::new("UserMapper.xml"), USER_MAPPER).unwrap();
        assert_eq!(doc.namespace.as_deref(), Some("com.example.mapper.UserMapper"));

        let ids: Vec<&str> = doc.statements.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["findActive", "rename"]);

        let find = &doc.statements[0];
        assert_eq!(find.namespace, "com.example.mapper.UserMapper");
        assert_eq!(find.sql, "SELECT * FROM users AND name = #{name}");
        assert_eq!(find.line, 9);
        assert_eq!(
            doc.statements[1].sql,
            "UPDATE users SET name = #{name} WHERE id < 10"
        );

        assert_eq!(
            doc.entity_types,
            vec!["com.example.entity.User", "com.example.entity.Dept", "Role"]
        );
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let result = parse_mapper(
            Path::new("Broken.xml"),
            r#"<mapper namespace="n"><select id="s">SELECT 1</update></mapper>"#,
        );
        assert!(result.is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const MYBATIS_XML: &str = "MyBatisXml";
pub const MYBATIS_PLUS_BASE_MAPPER: &str = "MyBatis-Plus BaseMapper";

/// Which signal produced an entry point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provenance {
    /// An explicit source annotation, by short name
    Annotation(String),

    /// A statement in an XML mapper file
    MyBatisXml,

    /// An inherited base-CRUD method of a MyBatis-Plus mapper
    BaseMapper,
}

impl Provenance {
    /// Reconciliation priority: annotation > XML > implicit base mapper
    #[must_use]
    pub const fn priority(&self) -> u8 {
        match self {
            Self::Annotation(_) => 3,
            Self::MyBatisXml => 2,
            Self::BaseMapper => 1,
        }
    }

    #[must_use]
    pub const fn is_annotation(&self) -> bool {
        matches!(self, Self::Annotation(_))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Annotation(name) => name,
            Self::MyBatisXml => MYBATIS_XML,
            Self::BaseMapper => MYBATIS_PLUS_BASE_MAPPER,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Provenance {
    fn from(value: String) -> Self {
        match value.as_str() {
            MYBATIS_XML => Self::MyBatisXml,
            MYBATIS_PLUS_BASE_MAPPER => Self::BaseMapper,
            _ => Self::Annotation(value),
        }
    }
}

impl From<Provenance> for String {
    fn from(value: Provenance) -> Self {
        value.as_str().to_string()
    }
}

/// An externally triggered operation worth documenting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Fully qualified name of the declaring class or mapper namespace
    pub class_fqn: String,

    /// `name(ParamType,...)`, or the bare statement id when no declaration is known
    pub method: String,

    /// Source file the signal came from
    pub file: PathBuf,

    /// 1-based line of the declaration
    pub line: usize,

    pub provenance: Provenance,

    /// SQL text from a statement annotation or XML mapper
    pub sql: Option<String>,

    /// Mapper XML the SQL came from
    pub xml_path: Option<PathBuf>,
}

impl EntryPoint {
    /// Method name without the parameter list
    #[must_use]
    pub fn method_name(&self) -> &str {
        self.method.split('(').next().unwrap_or(&self.method)
    }

    /// Uniqueness key: one entry point per class and method name
    #[must_use]
    pub fn key(&self) -> (String, String) {
        (self.class_fqn.clone(), self.method_name().to_string())
    }

    #[must_use]
    pub fn has_sql(&self) -> bool {
        self.sql.as_deref().is_some_and(|sql| !sql.is_empty())
    }
}

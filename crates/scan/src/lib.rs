//! # Entrypack Scan
//!
//! Finds the entry points of a Java project: annotated service and controller
//! methods, MyBatis statement annotations, XML mapper statements and the
//! inherited CRUD methods of MyBatis-Plus `BaseMapper` interfaces.
//!
//! ## Architecture
//!
//! ```text
//! SourceCorpus snapshot
//!     │
//!     ├──> Java classes ──> target / @Select annotations ─┐
//!     │                └──> BaseMapper<T> interfaces ─────┤
//!     │                                                   ├──> reconcile()
//!     └──> XML files ──> MapperXmlIndex (mtime cache) ────┘        │
//!                                                                  ▼
//!                                              one EntryPoint per (class, method)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use entrypack_corpus::{CorpusSnapshot, Scope};
//! use entrypack_scan::{EntryPointScanner, ScanConfig};
//!
//! let corpus = CorpusSnapshot::from_sources([(
//!     "/repo/src/com/example/UserService.java",
//!     "package com.example;\n@Service\npublic class UserService {\n  public void save() {}\n}\n",
//! )])
//! .unwrap();
//!
//! let mut scanner = EntryPointScanner::new(ScanConfig::default());
//! let entries = scanner.scan(&corpus, &Scope::All);
//! assert_eq!(entries[0].method, "save()");
//! ```

mod config;
mod entry;
mod error;
mod mapper_index;
mod mapper_xml;
mod reconcile;
mod report;
mod scanner;

pub use config::{MyBatisConfig, ScanConfig};
pub use entry::{EntryPoint, Provenance, MYBATIS_PLUS_BASE_MAPPER, MYBATIS_XML};
pub use error::{Result, ScanError};
pub use mapper_index::{is_service_related, read_mapper, MapperXmlIndex};
pub use mapper_xml::{is_excluded_path, is_mapper_content, parse_mapper, MapperDocument, MapperStatement};
pub use reconcile::reconcile;
pub use report::{IssueKind, ScanIssue, ScanReport, ScanStats};
pub use scanner::{
    base_mapper_type, is_sql_annotation, sql_from_literal, EntryPointScanner, BASE_MAPPER_FQN,
    MYBATIS_ANNOTATIONS_PACKAGE, SQL_ANNOTATIONS,
};

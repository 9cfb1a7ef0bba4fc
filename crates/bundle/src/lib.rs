//! # Entrypack Bundle
//!
//! Assembles a bounded, self-contained text bundle for one entry point: its
//! source, SQL, call-graph slice, related data types and called methods.
//!
//! ## Architecture
//!
//! ```text
//! EntryPoint + CallgraphSlice
//!     │
//!     ├──> find_entry_method() ──> # Method Source
//!     │
//!     ├──> slice anchors (clamped, deduplicated) ──> # Slices
//!     │
//!     ├──> TypeCollector + BaseMapper<T> / XML result types / SQL params
//!     │        └─> EntityClassifier ──> # Related Types
//!     │
//!     ├──> CalledMethodCollector ──> # Called Methods
//!     │
//!     └──> BundleText (char budget, tail truncation) ──> BundleWriter
//! ```
//!
//! ## Example
//!
//! ```rust
//! use entrypack_bundle::{CallgraphSlice, ContextAssembler, ContextConfig, FsBundleWriter};
//! use entrypack_corpus::CorpusSnapshot;
//! use entrypack_scan::{EntryPoint, Provenance};
//!
//! let corpus = CorpusSnapshot::from_sources([(
//!     "/repo/src/com/example/UserService.java",
//!     "package com.example;\npublic class UserService {\n  public void save() {}\n}\n",
//! )])
//! .unwrap();
//!
//! let entry = EntryPoint {
//!     class_fqn: "com.example.UserService".into(),
//!     method: "save()".into(),
//!     file: "/repo/src/com/example/UserService.java".into(),
//!     line: 3,
//!     provenance: Provenance::Annotation("Service".into()),
//!     sql: None,
//!     xml_path: None,
//! };
//!
//! let assembler = ContextAssembler::new(ContextConfig::default(), FsBundleWriter::new("out")).unwrap();
//! let text = assembler.render(&corpus, &entry, &CallgraphSlice::new("save"));
//! assert!(text.starts_with("# Entry Method\ncom.example.UserService#save()\n"));
//! assert!(text.contains("     3 |   public void save() {}"));
//! ```

mod assembler;
mod classifier;
mod collectors;
mod config;
mod error;
mod heuristics;
mod render;
mod slice;
mod writer;

pub use assembler::{find_entry_method, ContextAssembler, ContextBundle};
pub use classifier::{
    is_excluded, EntityClassifier, DEFAULT_PACKAGE_KEYWORDS, DEFAULT_TYPE_SUFFIXES, EXCLUDED_NAME_SUFFIXES,
    EXCLUDED_PACKAGES,
};
pub use collectors::{CalledMethodCollector, InvocationCollector, SignatureTypeCollector, TypeCollector};
pub use config::ContextConfig;
pub use error::{BundleError, Result};
pub use heuristics::{is_framework_type, is_likely_entity_parameter, is_mapper_style, sql_placeholders};
pub use render::TRUNCATION_MARKER;
pub use slice::{CallgraphSlice, SliceAnchor};
pub use writer::{BundleWriter, FsBundleWriter};

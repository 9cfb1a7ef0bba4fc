//! # Entrypack Corpus
//!
//! Read-only, versioned view of a Java project used by entry point scanning
//! and context assembly.
//!
//! ## Architecture
//!
//! ```text
//! Project root
//!     │
//!     ├──> File Scanner (.gitignore aware, .java + .xml)
//!     │
//!     ├──> Java Parser (tree-sitter)
//!     │      └─> JavaUnit: package, imports, classes, methods, annotations
//!     │
//!     └──> Corpus
//!            ├─ RwLock<Arc<CorpusSnapshot>>  (one version per reader)
//!            └─ refresh(): reuse unchanged files, swap in the next version
//! ```
//!
//! ## Example
//!
//! ```rust
//! use entrypack_corpus::{CorpusSnapshot, Scope, SourceCorpus};
//!
//! let snapshot = CorpusSnapshot::from_sources([(
//!     "/repo/src/com/example/UserDto.java",
//!     "package com.example;\npublic class UserDto {}\n",
//! )])
//! .unwrap();
//!
//! assert!(snapshot.resolve("com.example.UserDto").is_some());
//! assert_eq!(snapshot.files("java", &Scope::All).len(), 1);
//! ```

mod corpus;
mod error;
mod java;
mod model;
mod query;
mod scanner;
mod snapshot;
mod text;

pub use corpus::Corpus;
pub use error::{CorpusError, Result};
pub use java::JavaParser;
pub use model::{
    Annotation, ClassKind, ClassRef, JavaClass, JavaField, JavaMethod, JavaUnit, MethodRef,
    Parameter, Span, TypeRef,
};
pub use query::{Scope, SourceCorpus, SourceFile};
pub use scanner::{FileScanner, ScannedFile};
pub use snapshot::{CorpusSnapshot, SnapshotBuilder};
pub use text::SourceText;

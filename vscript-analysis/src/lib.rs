//! # vscript-analysis
//!
//! Semantic analysis over the trees produced by `vscript-parser`: the binder
//! (scoped symbol tables and the declaration outline), the structural type
//! system, the native-API doc registry, and the type checker.
//!
//! File Layout
//!
//! src
//!   ├── binder    Scope-nested symbol tables and the declaration outline
//!   ├── types     The closed type algebra and assignability rules
//!   ├── docs      Native-API doc registry, NetProp table, detail parsing
//!   └── checker   Top-down type checker producing coded messages
//!
//! The doc registry is an explicit value injected into the checker, never a
//! process-wide mutable global; tests substitute fixtures through
//! [`docs::DocRegistry::from_json`].

pub mod binder;
pub mod checker;
pub mod docs;
pub mod types;

pub use binder::{bind, BindResult, OutlineNode, Symbol, SymbolTable};
pub use checker::{check_file, MessageSeverity, SourceLocation, TypeCheckerMessage};
pub use docs::{Doc, DocRegistry, StringKind};
pub use types::SquirrelType;

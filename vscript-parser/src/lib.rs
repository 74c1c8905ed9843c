//! # vscript-parser
//!
//! Front-end crate for the VScript Squirrel dialect: the tokenizer with
//! position-mapped string scanning, the lexical diagnostics it produces, and
//! the arena-based syntax tree consumed by `vscript-analysis`.
//!
//! File Layout
//!
//! The crate follows the stage layout of the pipeline:
//! src/squirrel
//!   ├── token         Token kinds, classification helpers, keyword table
//!   ├── diagnostics   Lexical diagnostics shared with downstream stages
//!   ├── lexing        The cursor lexer, embedded-script scanning, lookup
//!   └── ast           Arena syntax tree and builder
//!
//! The concrete grammar that turns tokens into a tree lives outside this
//! repository; the `ast` module defines the tree shape it must produce and a
//! builder for constructing trees directly.

#![allow(rustdoc::invalid_html_tags)]

pub mod squirrel;

pub use squirrel::ast;
pub use squirrel::diagnostics::{Diagnostic, Severity};
pub use squirrel::lexing::{tokenize, Tokenization};
pub use squirrel::token::{StringData, Token, TokenKind};

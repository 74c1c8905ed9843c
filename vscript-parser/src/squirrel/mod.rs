//! The Squirrel dialect front end: tokens, lexing, diagnostics, syntax tree.

pub mod ast;
pub mod diagnostics;
pub mod lexing;
pub mod token;

//! AST node definitions for BV.
//!
//! This crate owns only the data shapes a parser hands to the semantic
//! pre-pass and elaborator — it contains no lexer, parser, or pretty-printer.
//! Parsing BV source text into these nodes is an external collaborator's job.
//!
//! Every node carries a [`bv_source::Span`] back to the source text it was
//! parsed from, so later stages can report errors against the original file.

#![warn(missing_docs)]

mod ast;

pub use ast::*;

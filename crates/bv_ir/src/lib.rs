//! `bv_ir` — the elaborated intermediate representation of a BV design.
//!
//! This crate defines the shapes that sit between the AST (`bv_ast`) and the
//! elaborator (`bv_elaborate`): monomorphised module/interface instances
//! ([`module::ModuleInstance`], [`interface::InterfaceInstance`]), their
//! fully resolved type algebra ([`types::Type`], [`types::ExprType`]), typed
//! expression/statement trees ([`expr::TypedExpr`], [`stmt::TypedStmt`]), and
//! the flat-port expansion ([`port::expand_port`]) an eventual Verilog
//! emitter needs. It owns no elaboration logic of its own — only the data
//! shapes `bv_elaborate` builds and an emitter reads.

#![warn(missing_docs)]

pub mod arena;
pub mod expr;
pub mod ids;
pub mod interface;
pub mod module;
pub mod port;
pub mod stmt;
pub mod types;

pub use arena::{Arena, ArenaId};
pub use expr::TypedExpr;
pub use ids::{InterfaceInstanceId, ModuleInstanceId};
pub use interface::{InterfaceInstance, ResolvedPort};
pub use module::{InstInst, ModuleInstance, ResolvedPortMap, ResolvedSignal};
pub use port::{expand_port, FlatPort};
pub use stmt::{CaseArm, TypedAlways, TypedOn, TypedStmt};
pub use types::{ceil_log2, ExprType, Type};

//! The BV semantic analyzer: constant folding, the pre-pass over
//! declarations, and the elaborator/instantiator that turns an AST plus a
//! set of top-level parameter values into a monomorphised module-instance
//! graph (§4).
//!
//! Pipeline order for a single entry point: [`sema::prepass`] indexes every
//! top-level declaration and resolves `use` clauses, [`const_eval::evaluate`]
//! folds parameter and `const` expressions to `i64`, and
//! [`elaborate::instantiate_module`] (driven through an
//! [`elaborate::ElaborationContext`]) recursively expands `inst`/`use` sites,
//! memoising by `(name, folded-args)` and rejecting cycles through
//! [`elaborate::ActiveGuard`]. Failures surface as [`errors::BvError`], which
//! carries enough span information to become a [`bv_diagnostics::Diagnostic`].

#![warn(missing_docs)]

pub mod const_eval;
pub mod elaborate;
pub mod errors;
pub mod scope;
pub mod sema;

pub use const_eval::evaluate;
pub use elaborate::{ActiveGuard, ElaborationContext, Env, InstKey, Tables};
pub use errors::BvError;
pub use scope::{Scope, ScopeArena, ScopeEntry, ScopeId, ScopeKind};
pub use sema::{prepass, PrepassResult};

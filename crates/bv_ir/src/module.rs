//! Monomorphised module instances: the top-level unit the elaborator
//! produces, one per `(module-decl, parameter-tuple)` memoisation key.

use bv_ast::ModuleDecl;
use bv_common::Ident;
use bv_source::Span;

use crate::expr::TypedExpr;
use crate::ids::ModuleInstanceId;
use crate::interface::ResolvedPort;
use crate::stmt::{TypedAlways, TypedOn};
use crate::types::Type;

/// A signal declared inside a module body, with its type fully elaborated.
#[derive(Debug, Clone)]
pub struct ResolvedSignal<'ast> {
    /// The signal's name.
    pub name: Ident,
    /// The signal's fully elaborated type.
    pub ty: Type<'ast>,
    /// Source span of the originating declaration.
    pub span: Span,
}

/// A single resolved `port_map` entry inside an `inst` declaration.
#[derive(Debug, Clone)]
pub struct ResolvedPortMap<'ast> {
    /// The target instance's port name being connected.
    pub target: Ident,
    /// The connecting expression, elaborated against the target port's
    /// type.
    pub source: TypedExpr<'ast>,
    /// Source span.
    pub span: Span,
}

/// A single sub-module instantiation inside a module body.
#[derive(Debug, Clone)]
pub struct InstInst<'ast> {
    /// The instance's local name.
    pub name: Ident,
    /// The monomorphised target this instantiation resolved to.
    pub target: ModuleInstanceId,
    /// The instance's port connections.
    pub port_maps: Vec<ResolvedPortMap<'ast>>,
    /// Source span.
    pub span: Span,
}

/// A monomorphised module instance: `(module-decl, parameter-tuple)`
/// uniquely identifies this entry in the elaborator's module memo table.
#[derive(Debug, Clone)]
pub struct ModuleInstance<'ast> {
    /// The module declaration this instance was monomorphised from.
    pub decl: &'ast ModuleDecl,
    /// The concrete, folded parameter values, in declaration order.
    pub params: Vec<(Ident, i64)>,
    /// The module's ports, fully elaborated.
    pub ports: Vec<ResolvedPort<'ast>>,
    /// The module's internal signals, fully elaborated.
    pub signals: Vec<ResolvedSignal<'ast>>,
    /// Sub-module instantiations.
    pub insts: Vec<InstInst<'ast>>,
    /// Combinational (`always`) blocks.
    pub always: Vec<TypedAlways<'ast>>,
    /// Sequential (`on`) blocks.
    pub on: Vec<TypedOn<'ast>>,
}

impl<'ast> ModuleInstance<'ast> {
    /// Looks up a port by name.
    pub fn find_port(&self, name: Ident) -> Option<&ResolvedPort<'ast>> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Looks up an internal signal by name.
    pub fn find_signal(&self, name: Ident) -> Option<&ResolvedSignal<'ast>> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Looks up a sub-instance by its local name.
    pub fn find_inst(&self, name: Ident) -> Option<&InstInst<'ast>> {
        self.insts.iter().find(|i| i.name == name)
    }
}

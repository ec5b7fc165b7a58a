//! The hierarchical scope graph (§4.1): name → declaration maps with
//! parent-chained lookup, stored in an index-addressed arena so transient
//! per-instance scopes created deep in recursive elaboration never need a
//! lifetime tied to the long-lived root scope.

use std::collections::HashMap;

use bv_ast::{EnumDecl, InterfaceDecl, ModuleDecl};
use bv_common::Ident;
use bv_ir::{ModuleInstanceId, Type};

/// Opaque id addressing a [`Scope`] inside a [`ScopeArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScopeId(u32);

impl ScopeId {
    /// Creates a `ScopeId` from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// What kind of thing a [`ScopeEntry`] binds — used by the kind-filtered
/// [`ScopeArena::lookup_kind`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScopeKind {
    /// An `interface` declaration.
    Interface,
    /// An `enum` declaration.
    Enum,
    /// A `module` declaration.
    Module,
    /// A folded integer constant (a bound parameter).
    Const,
    /// A declared-but-not-yet-bound parameter, registered on a
    /// declaration's own scope by the pre-pass (§4.1's "declarations point
    /// to their enclosing scope"). Elaboration never looks this up: it
    /// creates its own fresh instance scope with `Const` bindings instead.
    Param,
    /// A port inside an interface or module scope.
    Port,
    /// A signal inside a `def` scope.
    Signal,
    /// A sub-module instantiation (`inst`) inside a `def` scope.
    Inst,
}

/// A single name binding in a scope.
#[derive(Clone, Debug)]
pub enum ScopeEntry<'ast> {
    /// Binds to an `interface` declaration.
    Interface(&'ast InterfaceDecl),
    /// Binds to an `enum` declaration.
    Enum(&'ast EnumDecl),
    /// Binds to a `module` declaration.
    Module(&'ast ModuleDecl),
    /// Binds to a folded integer constant (an instantiation parameter).
    Const(i64),
    /// Binds to a declared parameter name before it has a concrete value
    /// (see [`ScopeKind::Param`]).
    Param,
    /// Binds to a port, carrying its own elaborated type directly so a
    /// `ref` inside the owning module's own `always`/`on` bodies can type
    /// itself before that module's `ModuleInstance` is published to the
    /// arena (elaboration only allocates it after the whole body has been
    /// elaborated — see `elaborate.rs`'s `instantiate_module`).
    Port(Type<'ast>),
    /// Binds to a signal declared in a `def` scope, likewise carrying its
    /// own elaborated type for the same reason.
    Signal(Type<'ast>),
    /// Binds to a sub-module instantiation, identified by its monomorphised
    /// target.
    Inst(ModuleInstanceId),
}

impl<'ast> ScopeEntry<'ast> {
    /// Returns this entry's [`ScopeKind`].
    pub fn kind(&self) -> ScopeKind {
        match self {
            ScopeEntry::Interface(_) => ScopeKind::Interface,
            ScopeEntry::Enum(_) => ScopeKind::Enum,
            ScopeEntry::Module(_) => ScopeKind::Module,
            ScopeEntry::Const(_) => ScopeKind::Const,
            ScopeEntry::Param => ScopeKind::Param,
            ScopeEntry::Port(_) => ScopeKind::Port,
            ScopeEntry::Signal(_) => ScopeKind::Signal,
            ScopeEntry::Inst(_) => ScopeKind::Inst,
        }
    }
}

/// A single scope record: a name→entry map plus a parent pointer.
#[derive(Clone, Debug, Default)]
pub struct Scope<'ast> {
    /// The parent scope, if any. `None` only for the root scope.
    pub parent: Option<ScopeId>,
    entries: HashMap<Ident, ScopeEntry<'ast>>,
}

impl<'ast> Scope<'ast> {
    /// Creates an empty scope with the given parent.
    pub fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            entries: HashMap::new(),
        }
    }
}

/// The arena owning every [`Scope`] created during pre-pass and elaboration.
///
/// Addressed by [`ScopeId`] rather than by reference: per-instance scopes
/// created deep in recursive elaboration would otherwise need a lifetime
/// tied to the long-lived root scope, which the borrow checker cannot
/// express across recursive calls that also mutate the arena.
#[derive(Clone, Debug, Default)]
pub struct ScopeArena<'ast> {
    scopes: Vec<Scope<'ast>>,
}

impl<'ast> ScopeArena<'ast> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Creates a new scope with the given parent and returns its id.
    pub fn create_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId::from_raw(self.scopes.len() as u32);
        self.scopes.push(Scope::new(parent));
        id
    }

    /// Adds `name → entry` to the scope `id`.
    ///
    /// Last-writer-wins: the pre-pass is responsible for never double
    /// inserting a name into the same scope (§4.1); this method does not
    /// itself raise a duplicate-name error.
    pub fn add(&mut self, id: ScopeId, name: Ident, entry: ScopeEntry<'ast>) {
        self.scopes[id.as_raw() as usize]
            .entries
            .insert(name, entry);
    }

    /// Returns `true` if `name` is bound directly in scope `id` (not
    /// counting parents) — used by the pre-pass to detect duplicate
    /// declarations within a single scope.
    pub fn contains_local(&self, id: ScopeId, name: Ident) -> bool {
        self.scopes[id.as_raw() as usize].entries.contains_key(&name)
    }

    /// Walks from `id` up through parents, returning the first binding for
    /// `name`.
    pub fn lookup(&self, id: ScopeId, name: Ident) -> Option<&ScopeEntry<'ast>> {
        let mut current = Some(id);
        while let Some(scope_id) = current {
            let scope = &self.scopes[scope_id.as_raw() as usize];
            if let Some(entry) = scope.entries.get(&name) {
                return Some(entry);
            }
            current = scope.parent;
        }
        None
    }

    /// Walks to the nearest binding for `name` exactly as [`Self::lookup`]
    /// does, then applies the kind filter only to that single found entry.
    ///
    /// Deliberately does not keep searching up the parent chain when the
    /// nearest binding's kind doesn't match (see `DESIGN.md`): a kind-scoped
    /// lookup that silently fell through to an outer shadowed binding of a
    /// different kind would resolve references to the wrong declaration.
    pub fn lookup_kind(
        &self,
        id: ScopeId,
        name: Ident,
        kind: ScopeKind,
    ) -> Option<&ScopeEntry<'ast>> {
        match self.lookup(id, name) {
            Some(entry) if entry.kind() == kind => Some(entry),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_common::Interner;
    use bv_source::Span;

    fn make_module(interner: &Interner, name: &str) -> ModuleDecl {
        ModuleDecl {
            name: interner.get_or_intern(name),
            params: vec![],
            ports: vec![],
            span: Span::DUMMY,
        }
    }

    #[test]
    fn lookup_finds_binding_in_own_scope() {
        let interner = Interner::new();
        let mut arena = ScopeArena::new();
        let root = arena.create_scope(None);
        let name = interner.get_or_intern("WIDTH");
        arena.add(root, name, ScopeEntry::Const(8));
        match arena.lookup(root, name) {
            Some(ScopeEntry::Const(8)) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn lookup_walks_to_parent() {
        let interner = Interner::new();
        let mut arena = ScopeArena::new();
        let root = arena.create_scope(None);
        let child = arena.create_scope(Some(root));
        let name = interner.get_or_intern("top");
        let decl = make_module(&interner, "top");
        arena.add(root, name, ScopeEntry::Module(&decl));
        assert!(arena.lookup(child, name).is_some());
    }

    #[test]
    fn lookup_missing_returns_none() {
        let interner = Interner::new();
        let mut arena = ScopeArena::new();
        let root = arena.create_scope(None);
        let name = interner.get_or_intern("nope");
        assert!(arena.lookup(root, name).is_none());
    }

    #[test]
    fn lookup_kind_matches() {
        let interner = Interner::new();
        let mut arena = ScopeArena::new();
        let root = arena.create_scope(None);
        let name = interner.get_or_intern("top");
        let decl = make_module(&interner, "top");
        arena.add(root, name, ScopeEntry::Module(&decl));
        assert!(arena.lookup_kind(root, name, ScopeKind::Module).is_some());
        assert!(arena.lookup_kind(root, name, ScopeKind::Enum).is_none());
    }

    #[test]
    fn lookup_kind_does_not_continue_past_shadowing_mismatch() {
        // The nearest binding for `name` is a Const in the child scope; even
        // though the root scope has a Module binding for the same name, the
        // kind-filtered lookup must not fall through to it.
        let interner = Interner::new();
        let mut arena = ScopeArena::new();
        let root = arena.create_scope(None);
        let child = arena.create_scope(Some(root));
        let name = interner.get_or_intern("shadowed");
        let decl = make_module(&interner, "shadowed");
        arena.add(root, name, ScopeEntry::Module(&decl));
        arena.add(child, name, ScopeEntry::Const(3));
        assert!(arena
            .lookup_kind(child, name, ScopeKind::Module)
            .is_none());
    }

    #[test]
    fn contains_local_ignores_parent_bindings() {
        let interner = Interner::new();
        let mut arena = ScopeArena::new();
        let root = arena.create_scope(None);
        let child = arena.create_scope(Some(root));
        let name = interner.get_or_intern("w");
        arena.add(root, name, ScopeEntry::Const(1));
        assert!(arena.contains_local(root, name));
        assert!(!arena.contains_local(child, name));
    }
}

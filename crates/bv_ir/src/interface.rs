//! Memoised interface instantiations: `(interface-decl, parameter-tuple)`
//! monomorphisations with their ports fully flattened.

use bv_ast::{Dir, InterfaceDecl};
use bv_common::Ident;
use bv_source::Span;

use crate::types::Type;

/// A single port on a flattened interface- or module-instance.
///
/// For an interface instance this list already has `use`-included members
/// spliced in (§4.4); it is still a *structured* list (one entry per BV
/// port, not per flat Verilog wire) — [`crate::port::expand_port`] performs
/// the further scalar expansion an emitter needs.
#[derive(Debug, Clone)]
pub struct ResolvedPort<'ast> {
    /// The port's direction, possibly flipped relative to its declaration
    /// by an enclosing `use` (see §4.4).
    pub dir: Dir,
    /// The port's name.
    pub name: Ident,
    /// The port's fully elaborated type.
    pub ty: Type<'ast>,
    /// Source span of the originating port declaration.
    pub span: Span,
}

/// A monomorphised interface instance: `(interface-decl, parameter-tuple)`
/// uniquely identifies this entry in the elaborator's interface memo table.
#[derive(Debug, Clone)]
pub struct InterfaceInstance<'ast> {
    /// The interface declaration this instance was monomorphised from.
    pub decl: &'ast InterfaceDecl,
    /// The concrete, folded parameter values, in declaration order.
    pub params: Vec<(Ident, i64)>,
    /// The flattened port list (direct ports plus spliced `use` members).
    pub ports: Vec<ResolvedPort<'ast>>,
}

impl<'ast> InterfaceInstance<'ast> {
    /// Looks up a port by name.
    pub fn find_port(&self, name: Ident) -> Option<&ResolvedPort<'ast>> {
        self.ports.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_common::Interner;

    #[test]
    fn find_port_hits_and_misses() {
        let interner = Interner::new();
        let data = interner.get_or_intern("data");
        let other = interner.get_or_intern("other");
        let decl = InterfaceDecl {
            name: interner.get_or_intern("bus"),
            params: vec![],
            members: vec![],
            span: Span::DUMMY,
        };
        let inst = InterfaceInstance {
            decl: Box::leak(Box::new(decl)),
            params: vec![],
            ports: vec![ResolvedPort {
                dir: Dir::In,
                name: data,
                ty: Type::Bit,
                span: Span::DUMMY,
            }],
        };
        assert!(inst.find_port(data).is_some());
        assert!(inst.find_port(other).is_none());
    }
}

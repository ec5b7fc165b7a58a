//! The semantic pre-pass (§4.3): two ordered passes over the unit list that
//! populate the root scope and validate type references, without folding
//! any constant expression (array/slice bounds are only known once an
//! instantiation supplies concrete parameter values, which is elaboration's
//! job, not the pre-pass's).

use std::collections::HashMap;

use bv_ast::{DefDecl, TopDecl, TypeExpr, Unit};
use bv_common::{Ident, Interner};

use crate::errors::BvError;
use crate::scope::{ScopeArena, ScopeEntry, ScopeId, ScopeKind};

/// The pre-pass's output: everything later passes need instead of reading
/// mutated state back off the (immutable) AST.
pub struct PrepassResult<'ast> {
    /// Every scope created during the pre-pass.
    pub scopes: ScopeArena<'ast>,
    /// The single root scope, parent of every top-level declaration.
    pub root: ScopeId,
    /// Each top-level interface/module declaration's own scope (its
    /// parameters registered as [`ScopeEntry::Param`]), keyed by
    /// declaration name.
    pub decl_scopes: HashMap<Ident, ScopeId>,
    /// Every `def` bound to its target module, in source order.
    pub defs_by_module: HashMap<Ident, Vec<&'ast DefDecl>>,
}

/// Runs the two-pass semantic pre-pass over `units`.
pub fn prepass<'ast>(
    units: &'ast [Unit],
    interner: &Interner,
) -> Result<PrepassResult<'ast>, BvError> {
    let mut scopes = ScopeArena::new();
    let root = scopes.create_scope(None);
    let mut decl_scopes = HashMap::new();
    let mut defs_by_module: HashMap<Ident, Vec<&'ast DefDecl>> = HashMap::new();

    // Pass 1: declaration registration.
    for unit in units {
        for decl in &unit.decls {
            match decl {
                TopDecl::Interface(intf) => {
                    scopes.add(root, intf.name, ScopeEntry::Interface(intf));
                    let decl_scope = scopes.create_scope(Some(root));
                    for param in &intf.params {
                        scopes.add(decl_scope, param.name, ScopeEntry::Param);
                    }
                    decl_scopes.insert(intf.name, decl_scope);
                }
                TopDecl::Enum(e) => {
                    scopes.add(root, e.name, ScopeEntry::Enum(e));
                }
                TopDecl::Module(module) => {
                    scopes.add(root, module.name, ScopeEntry::Module(module));
                    let decl_scope = scopes.create_scope(Some(root));
                    for param in &module.params {
                        scopes.add(decl_scope, param.name, ScopeEntry::Param);
                    }
                    for port in &module.ports {
                        // Pre-pass registration only needs the name/kind for
                        // duplicate-name and kind-filtered lookup; no
                        // parameter values exist yet to elaborate a real
                        // type against, so this placeholder is never read —
                        // elaboration replaces it with a freshly elaborated
                        // `Port` entry in its own instance scope.
                        scopes.add(decl_scope, port.name, ScopeEntry::Port(bv_ir::Type::Bit));
                    }
                    decl_scopes.insert(module.name, decl_scope);
                    defs_by_module.entry(module.name).or_default();
                }
                TopDecl::Def(_) => {}
            }
        }
    }

    // Pass 2: type resolution and def binding.
    for unit in units {
        for decl in &unit.decls {
            match decl {
                TopDecl::Interface(intf) => {
                    for member in &intf.members {
                        match member {
                            bv_ast::IntfMember::Port(port) => {
                                resolve_type(&port.ty, root, &scopes, interner)?;
                            }
                            bv_ast::IntfMember::Use(use_decl) => {
                                resolve_use_type(&use_decl.ty, root, &scopes, interner)?;
                            }
                        }
                    }
                }
                TopDecl::Module(module) => {
                    for port in &module.ports {
                        resolve_type(&port.ty, root, &scopes, interner)?;
                    }
                }
                TopDecl::Def(def) => {
                    match scopes.lookup_kind(root, def.name, ScopeKind::Module) {
                        Some(ScopeEntry::Module(_)) => {
                            defs_by_module.entry(def.name).or_default().push(def);
                        }
                        _ => {
                            return Err(BvError::NameError {
                                name: interner.resolve(def.name).to_string(),
                                span: def.span,
                            })
                        }
                    }
                }
                TopDecl::Enum(_) => {}
            }
        }
    }

    Ok(PrepassResult {
        scopes,
        root,
        decl_scopes,
        defs_by_module,
    })
}

/// Validates a type expression's structured references, recursing into
/// array element types. Does not fold any bound expression.
fn resolve_type(
    ty: &TypeExpr,
    root: ScopeId,
    scopes: &ScopeArena<'_>,
    interner: &Interner,
) -> Result<(), BvError> {
    match ty {
        TypeExpr::Bit(_) => Ok(()),
        TypeExpr::Array { subtype, .. } => resolve_type(subtype, root, scopes, interner),
        TypeExpr::Struct { name, span, .. } => {
            match scopes.lookup(root, *name) {
                Some(ScopeEntry::Interface(_)) | Some(ScopeEntry::Enum(_)) => Ok(()),
                Some(ScopeEntry::Module(_)) => Err(BvError::KindError {
                    name: interner.resolve(*name).to_string(),
                    expected: "interface or enum",
                    found: "module",
                    span: *span,
                }),
                Some(_) => Err(BvError::KindError {
                    name: interner.resolve(*name).to_string(),
                    expected: "interface or enum",
                    found: "declaration",
                    span: *span,
                }),
                None => Err(BvError::NameError {
                    name: interner.resolve(*name).to_string(),
                    span: *span,
                }),
            }
        }
        TypeExpr::Set { enum_name, span } => match scopes.lookup(root, *enum_name) {
            Some(ScopeEntry::Enum(_)) => Ok(()),
            Some(_) => Err(BvError::KindError {
                name: interner.resolve(*enum_name).to_string(),
                expected: "enum",
                found: "declaration",
                span: *span,
            }),
            None => Err(BvError::NameError {
                name: interner.resolve(*enum_name).to_string(),
                span: *span,
            }),
        },
    }
}

/// Validates a `use` member's type: must be a `struct-type` naming another
/// `interface` specifically (not merely any structured type).
fn resolve_use_type(
    ty: &TypeExpr,
    root: ScopeId,
    scopes: &ScopeArena<'_>,
    interner: &Interner,
) -> Result<(), BvError> {
    match ty {
        TypeExpr::Struct { name, span, .. } => match scopes.lookup(root, *name) {
            Some(ScopeEntry::Interface(_)) => Ok(()),
            Some(ScopeEntry::Enum(_)) => Err(BvError::KindError {
                name: interner.resolve(*name).to_string(),
                expected: "interface",
                found: "enum",
                span: *span,
            }),
            Some(ScopeEntry::Module(_)) => Err(BvError::KindError {
                name: interner.resolve(*name).to_string(),
                expected: "interface",
                found: "module",
                span: *span,
            }),
            Some(_) => Err(BvError::KindError {
                name: interner.resolve(*name).to_string(),
                expected: "interface",
                found: "declaration",
                span: *span,
            }),
            None => Err(BvError::NameError {
                name: interner.resolve(*name).to_string(),
                span: *span,
            }),
        },
        other => Err(BvError::TypeError {
            message: "a 'use' member must name another interface".to_string(),
            span: other.span(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_ast::{Dir, ModuleDecl, ParamDecl, PortDecl};
    use bv_source::Span;

    fn s() -> Span {
        Span::DUMMY
    }

    #[test]
    fn registers_module_and_ports_in_root() {
        let interner = Interner::new();
        let m_name = interner.get_or_intern("top");
        let clk = interner.get_or_intern("clk");
        let module = ModuleDecl {
            name: m_name,
            params: vec![],
            ports: vec![PortDecl {
                dir: Dir::In,
                name: clk,
                ty: TypeExpr::Bit(s()),
                span: s(),
            }],
            span: s(),
        };
        let unit = Unit {
            decls: vec![TopDecl::Module(module)],
            span: s(),
        };
        let result = prepass(std::slice::from_ref(&unit), &interner).unwrap();
        assert!(matches!(
            result.scopes.lookup(result.root, m_name),
            Some(ScopeEntry::Module(_))
        ));
        assert!(result.decl_scopes.contains_key(&m_name));
        assert!(result.defs_by_module.contains_key(&m_name));
    }

    #[test]
    fn def_targeting_unknown_module_fails() {
        let interner = Interner::new();
        let missing = interner.get_or_intern("missing");
        let def = DefDecl {
            name: missing,
            items: vec![],
            span: s(),
        };
        let unit = Unit {
            decls: vec![TopDecl::Def(def)],
            span: s(),
        };
        let err = prepass(std::slice::from_ref(&unit), &interner).unwrap_err();
        assert!(matches!(err, BvError::NameError { .. }));
    }

    #[test]
    fn def_targeting_known_module_is_registered() {
        let interner = Interner::new();
        let m_name = interner.get_or_intern("top");
        let module = ModuleDecl {
            name: m_name,
            params: vec![],
            ports: vec![],
            span: s(),
        };
        let def = DefDecl {
            name: m_name,
            items: vec![],
            span: s(),
        };
        let unit = Unit {
            decls: vec![TopDecl::Module(module), TopDecl::Def(def)],
            span: s(),
        };
        let result = prepass(std::slice::from_ref(&unit), &interner).unwrap();
        assert_eq!(result.defs_by_module[&m_name].len(), 1);
    }

    #[test]
    fn struct_type_resolving_to_module_is_kind_error() {
        let interner = Interner::new();
        let m_name = interner.get_or_intern("top");
        let p_name = interner.get_or_intern("p");
        let module = ModuleDecl {
            name: m_name,
            params: vec![],
            ports: vec![],
            span: s(),
        };
        let user = ModuleDecl {
            name: p_name,
            params: vec![],
            ports: vec![PortDecl {
                dir: Dir::In,
                name: interner.get_or_intern("x"),
                ty: TypeExpr::Struct {
                    name: m_name,
                    args: vec![],
                    span: s(),
                },
                span: s(),
            }],
            span: s(),
        };
        let unit = Unit {
            decls: vec![TopDecl::Module(module), TopDecl::Module(user)],
            span: s(),
        };
        let err = prepass(std::slice::from_ref(&unit), &interner).unwrap_err();
        assert!(matches!(err, BvError::KindError { found: "module", .. }));
    }

    #[test]
    fn unknown_type_name_is_name_error() {
        let interner = Interner::new();
        let m_name = interner.get_or_intern("top");
        let module = ModuleDecl {
            name: m_name,
            params: vec![],
            ports: vec![PortDecl {
                dir: Dir::In,
                name: interner.get_or_intern("x"),
                ty: TypeExpr::Struct {
                    name: interner.get_or_intern("nope"),
                    args: vec![],
                    span: s(),
                },
                span: s(),
            }],
            span: s(),
        };
        let unit = Unit {
            decls: vec![TopDecl::Module(module)],
            span: s(),
        };
        let err = prepass(std::slice::from_ref(&unit), &interner).unwrap_err();
        assert!(matches!(err, BvError::NameError { .. }));
    }

    #[test]
    fn use_member_must_be_interface() {
        use bv_ast::{InterfaceDecl, IntfMember, UseDecl};

        let interner = Interner::new();
        let e_name = interner.get_or_intern("E");
        let i_name = interner.get_or_intern("bus");
        let e = bv_ast::EnumDecl {
            name: e_name,
            atoms: vec![interner.get_or_intern("A")],
            span: s(),
        };
        let intf = InterfaceDecl {
            name: i_name,
            params: vec![],
            members: vec![IntfMember::Use(UseDecl {
                ty: TypeExpr::Struct {
                    name: e_name,
                    args: vec![],
                    span: s(),
                },
                span: s(),
            })],
            span: s(),
        };
        let unit = Unit {
            decls: vec![TopDecl::Enum(e), TopDecl::Interface(intf)],
            span: s(),
        };
        let err = prepass(std::slice::from_ref(&unit), &interner).unwrap_err();
        assert!(matches!(err, BvError::KindError { found: "enum", .. }));
    }

    #[test]
    fn params_registered_in_decl_scope() {
        let interner = Interner::new();
        let m_name = interner.get_or_intern("bus");
        let w = interner.get_or_intern("w");
        let module = ModuleDecl {
            name: m_name,
            params: vec![ParamDecl {
                name: w,
                ty: TypeExpr::Bit(s()),
                span: s(),
            }],
            ports: vec![],
            span: s(),
        };
        let unit = Unit {
            decls: vec![TopDecl::Module(module)],
            span: s(),
        };
        let result = prepass(std::slice::from_ref(&unit), &interner).unwrap();
        let decl_scope = result.decl_scopes[&m_name];
        assert!(matches!(
            result.scopes.lookup(decl_scope, w),
            Some(ScopeEntry::Param)
        ));
    }
}

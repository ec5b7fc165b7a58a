//! The post-elaboration type algebra (§3) and the expression-intermediate
//! types that sit on top of it during statement/expression elaboration.
//!
//! `Type` is the structural type of a port, signal, or parameter once its
//! `TypeExpr` has been fully elaborated: every array bound is a folded
//! integer and every `struct-type`/`set-type` name has been resolved to its
//! declaration (or, for interfaces, to a memoised [`InterfaceInstanceId`]).
//!
//! `ExprType` is strictly larger: it additionally carries the sentinel
//! intermediate types an expression node can be typed with *before* its
//! enclosing context resolves it (`Atom`, `SetLit`, `X`, `Int`, `Arith`).
//! Per the invariant in §8, none of those sentinels survive outside a
//! literal's own type slot — a `TypedExpr` produced by context-sensitive
//! assignment conversion always carries a `Type`-shaped `ExprType`.

use bv_ast::EnumDecl;

use crate::ids::InterfaceInstanceId;

/// A fully elaborated structural type: every symbolic piece has been
/// resolved to a concrete value or declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Type<'ast> {
    /// A single scalar bit.
    Bit,
    /// A nominal array with folded, concrete bounds.
    Array {
        /// The element type.
        subtype: Box<Type<'ast>>,
        /// The left (most-significant) bound.
        left: i64,
        /// The right (least-significant) bound.
        right: i64,
    },
    /// A memoised interface instantiation.
    IntfInst(InterfaceInstanceId),
    /// A reference to an enum declaration.
    Enum(&'ast EnumDecl),
    /// A `set(E)` bitmask type over an enum's atoms.
    Set(&'ast EnumDecl),
}

impl<'ast> Type<'ast> {
    /// Returns the number of bits this type occupies when expanded to a
    /// scalar Verilog vector width (for `Enum`/`Set`; arrays and interfaces
    /// have no single width and are expanded leaf-by-leaf by
    /// [`crate::port::expand_port`]).
    pub fn enum_code_width(enum_decl: &EnumDecl) -> u32 {
        ceil_log2(enum_decl.atoms.len() as u64)
    }

    /// Returns `true` if two resolved array bounds describe the same shape
    /// (used by `expand_port`'s determinism check, §8).
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match self {
            Type::Array { left, right, .. } => Some((*left, *right)),
            _ => None,
        }
    }
}

/// The expression-intermediate type algebra.
///
/// A superset of [`Type`]: every resolved structural variant has a
/// corresponding entry here, plus the five sentinel intermediate tags the
/// data model (§3) calls out.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprType<'ast> {
    /// A single scalar bit.
    Bit,
    /// A nominal array with folded, concrete bounds.
    Array {
        /// The element type.
        subtype: Box<ExprType<'ast>>,
        /// The left (most-significant) bound.
        left: i64,
        /// The right (least-significant) bound.
        right: i64,
    },
    /// A memoised interface instantiation.
    IntfInst(InterfaceInstanceId),
    /// A memoised module instantiation (the type of an `inst` name
    /// reference, consumed only by `member-expr` elaboration).
    ModuleInst(crate::ids::ModuleInstanceId),
    /// A reference to an enum declaration.
    Enum(&'ast EnumDecl),
    /// A `set(E)` bitmask type over an enum's atoms.
    Set(&'ast EnumDecl),
    /// `atom-type`: an unresolved enum atom or the `'x` don't-care atom,
    /// awaiting the enclosing assignment's LHS type for disambiguation.
    Atom,
    /// `set-lit-type`: a set literal `{A, B, ...}` awaiting the enclosing
    /// assignment's LHS type.
    SetLit,
    /// `x-type`: the structural don't-care, after rewriting from `Atom`.
    X,
    /// `int-type`: an unsized integer constant.
    Int,
    /// `arith-type`: the result of a binary operation.
    Arith,
}

impl<'ast> ExprType<'ast> {
    /// Lifts a fully resolved [`Type`] into the expression-intermediate
    /// algebra. Every `Type` variant has a 1:1 counterpart here.
    pub fn from_resolved(ty: Type<'ast>) -> Self {
        match ty {
            Type::Bit => ExprType::Bit,
            Type::Array {
                subtype,
                left,
                right,
            } => ExprType::Array {
                subtype: Box::new(ExprType::from_resolved(*subtype)),
                left,
                right,
            },
            Type::IntfInst(id) => ExprType::IntfInst(id),
            Type::Enum(decl) => ExprType::Enum(decl),
            Type::Set(decl) => ExprType::Set(decl),
        }
    }

    /// Attempts to narrow back down to a resolved structural [`Type`].
    ///
    /// Returns `None` for any of the five sentinel intermediate tags or for
    /// `ModuleInst` (which has no structural-type counterpart — a module
    /// instance is never itself a port/signal type).
    pub fn to_resolved(&self) -> Option<Type<'ast>> {
        match self {
            ExprType::Bit => Some(Type::Bit),
            ExprType::Array {
                subtype,
                left,
                right,
            } => subtype.to_resolved().map(|s| Type::Array {
                subtype: Box::new(s),
                left: *left,
                right: *right,
            }),
            ExprType::IntfInst(id) => Some(Type::IntfInst(*id)),
            ExprType::Enum(decl) => Some(Type::Enum(decl)),
            ExprType::Set(decl) => Some(Type::Set(decl)),
            ExprType::ModuleInst(_)
            | ExprType::Atom
            | ExprType::SetLit
            | ExprType::X
            | ExprType::Int
            | ExprType::Arith => None,
        }
    }

    /// Returns `true` if this is one of the five sentinel intermediate
    /// types that must not survive outside a literal's type slot (§8).
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            ExprType::Atom | ExprType::SetLit | ExprType::X | ExprType::Int | ExprType::Arith
        )
    }
}

/// Returns `ceil(log2(n))`, the number of bits needed to encode `n` distinct
/// codes (`n >= 1`). `ceil(log2(1)) == 0`: a single-atom enum needs no bits.
pub fn ceil_log2(n: u64) -> u32 {
    if n <= 1 {
        return 0;
    }
    64 - (n - 1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_common::Interner;
    use bv_source::Span;

    fn make_enum(interner: &Interner, name: &str, atoms: &[&str]) -> EnumDecl {
        EnumDecl {
            name: interner.get_or_intern(name),
            atoms: atoms.iter().map(|a| interner.get_or_intern(a)).collect(),
            span: Span::DUMMY,
        }
    }

    #[test]
    fn ceil_log2_values() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(8), 3);
        assert_eq!(ceil_log2(9), 4);
    }

    #[test]
    fn from_resolved_round_trips_bit() {
        let expr_ty = ExprType::from_resolved(Type::Bit);
        assert_eq!(expr_ty, ExprType::Bit);
        assert_eq!(expr_ty.to_resolved(), Some(Type::Bit));
    }

    #[test]
    fn from_resolved_round_trips_array() {
        let ty = Type::Bit;
        let arr = Type::Array {
            subtype: Box::new(ty),
            left: 7,
            right: 0,
        };
        let expr_ty = ExprType::from_resolved(arr.clone());
        assert_eq!(expr_ty.to_resolved(), Some(arr));
    }

    #[test]
    fn sentinels_have_no_resolved_counterpart() {
        assert_eq!(ExprType::Atom.to_resolved(), None);
        assert_eq!(ExprType::SetLit.to_resolved(), None);
        assert_eq!(ExprType::X.to_resolved(), None);
        assert_eq!(ExprType::Int.to_resolved(), None);
        assert_eq!(ExprType::Arith.to_resolved(), None);
    }

    #[test]
    fn is_sentinel_classification() {
        assert!(ExprType::Atom.is_sentinel());
        assert!(!ExprType::Bit.is_sentinel());
        assert!(!ExprType::ModuleInst(crate::ids::ModuleInstanceId::from_raw(0)).is_sentinel());
    }

    #[test]
    fn enum_code_width_matches_atom_count() {
        let interner = Interner::new();
        let e = make_enum(&interner, "E", &["A", "B", "C"]);
        assert_eq!(Type::enum_code_width(&e), 2);
    }
}

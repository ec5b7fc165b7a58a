//! Typed expression trees produced by elaboration.
//!
//! Mirrors the shape of [`bv_ast::Expr`] node-for-node, but every node now
//! carries its elaborated [`ExprType`] and three AST-only literal forms
//! (`Atom`/`Set` when context-sensitively converted, §4.4) are replaced by
//! their resolved counterparts (`EnumCode`/`SetMask`/`XDontCare`).

use bv_ast::{BinOp, UnOp};
use bv_common::Ident;
use bv_source::Span;

use crate::types::ExprType;

/// An expression after elaboration: every sub-expression carries a non-null
/// [`ExprType`] (§8's first invariant).
#[derive(Debug, Clone)]
pub enum TypedExpr<'ast> {
    /// A binary operation; result type is always [`ExprType::Arith`].
    Binary {
        /// The left operand.
        lhs: Box<TypedExpr<'ast>>,
        /// The right operand.
        rhs: Box<TypedExpr<'ast>>,
        /// The operator.
        op: BinOp,
        /// The result type.
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// A unary operation; result type equals the operand's type.
    Unary {
        /// The operand.
        arg: Box<TypedExpr<'ast>>,
        /// The operator.
        op: UnOp,
        /// The result type.
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// An explicit cast; result type is the elaborated target type.
    Cast {
        /// The inner expression.
        expr: Box<TypedExpr<'ast>>,
        /// The result type (equal to the elaborated cast target).
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// A member access, `<expr>.<member>`.
    Member {
        /// The inner expression; elaborated type must be `IntfInst` or
        /// `ModuleInst`.
        expr: Box<TypedExpr<'ast>>,
        /// The accessed member's name.
        member: Ident,
        /// The result type: the resolved member port's type.
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// An array slice with folded, concrete bounds.
    Slice {
        /// The sliced expression; elaborated type must be `Array`.
        expr: Box<TypedExpr<'ast>>,
        /// The folded lower bound.
        lower: i64,
        /// The folded upper bound.
        upper: i64,
        /// The result type: a new array type with the slice's bounds.
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// An array subscript.
    Subscript {
        /// The subscripted expression; elaborated type must be `Array`.
        expr: Box<TypedExpr<'ast>>,
        /// The index expression; elaborated type must be integer-typed.
        index: Box<TypedExpr<'ast>>,
        /// The result type: the array's element type.
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// A call to a built-in function (only `log2` is recognised).
    Call {
        /// The called function's name.
        func: Ident,
        /// The call's elaborated arguments.
        args: Vec<TypedExpr<'ast>>,
        /// The result type, always [`ExprType::Int`].
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// A bare name reference.
    Ref {
        /// The referenced name.
        name: Ident,
        /// The result type: the referenced declaration's elaborated type.
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// An unresolved `'`-prefixed atom, still awaiting context.
    Atom {
        /// The atom's name.
        name: Ident,
        /// Always [`ExprType::Atom`] until context-sensitively rewritten.
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// An unsized integer literal.
    Num {
        /// The literal's value.
        value: i64,
        /// Always [`ExprType::Int`].
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// A sized literal carrying its raw digit string (meta-digits allowed).
    SizedNum {
        /// The literal's declared bit width.
        width: u32,
        /// The literal's digits, MSB first.
        digits: String,
        /// Always [`ExprType::Int`].
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// An unresolved set literal, still awaiting the assignment's LHS type.
    Set {
        /// The named atoms in the literal.
        items: Vec<Ident>,
        /// Always [`ExprType::SetLit`].
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// The resolved form of an `Atom` whose enclosing assignment's LHS was
    /// `enum-type`: `value_index` is the atom's declaration-order code.
    EnumCode {
        /// The atom's numeric code.
        value_index: i64,
        /// Always [`ExprType::Enum`].
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// The resolved form of a `Set` literal whose enclosing assignment's
    /// LHS was `set-type`: bit `i` is `true` iff the enumer at index `i`
    /// appears in the literal.
    SetMask {
        /// The bitmask, index 0 first.
        bits: Vec<bool>,
        /// Always [`ExprType::Set`].
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
    /// The resolved form of the `'x` atom assigned to a structurally typed
    /// (interface-instance) target: a structural don't-care, later expanded
    /// into one `1'sbx` assignment per flat leaf wire by an emitter.
    XDontCare {
        /// Always [`ExprType::X`].
        ty: ExprType<'ast>,
        /// Source span.
        span: Span,
    },
}

impl<'ast> TypedExpr<'ast> {
    /// Returns this expression's elaborated type.
    pub fn ty(&self) -> &ExprType<'ast> {
        match self {
            TypedExpr::Binary { ty, .. }
            | TypedExpr::Unary { ty, .. }
            | TypedExpr::Cast { ty, .. }
            | TypedExpr::Member { ty, .. }
            | TypedExpr::Slice { ty, .. }
            | TypedExpr::Subscript { ty, .. }
            | TypedExpr::Call { ty, .. }
            | TypedExpr::Ref { ty, .. }
            | TypedExpr::Atom { ty, .. }
            | TypedExpr::Num { ty, .. }
            | TypedExpr::SizedNum { ty, .. }
            | TypedExpr::Set { ty, .. }
            | TypedExpr::EnumCode { ty, .. }
            | TypedExpr::SetMask { ty, .. }
            | TypedExpr::XDontCare { ty, .. } => ty,
        }
    }

    /// Returns this expression's source span.
    pub fn span(&self) -> Span {
        match self {
            TypedExpr::Binary { span, .. }
            | TypedExpr::Unary { span, .. }
            | TypedExpr::Cast { span, .. }
            | TypedExpr::Member { span, .. }
            | TypedExpr::Slice { span, .. }
            | TypedExpr::Subscript { span, .. }
            | TypedExpr::Call { span, .. }
            | TypedExpr::Ref { span, .. }
            | TypedExpr::Atom { span, .. }
            | TypedExpr::Num { span, .. }
            | TypedExpr::SizedNum { span, .. }
            | TypedExpr::Set { span, .. }
            | TypedExpr::EnumCode { span, .. }
            | TypedExpr::SetMask { span, .. }
            | TypedExpr::XDontCare { span, .. } => *span,
        }
    }
}

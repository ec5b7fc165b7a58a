//! Typed statement trees: the elaborated counterpart of `bv_ast`'s
//! `always`/`on` bodies.

use bv_source::Span;

use crate::expr::TypedExpr;

/// A single elaborated statement.
#[derive(Debug, Clone)]
pub enum TypedStmt<'ast> {
    /// `lhs <= rhs` (`delayed == true`) or `lhs = rhs` (`delayed == false`).
    /// `rhs` has already been through the LHS-first context-sensitive
    /// conversions of §4.4 (`Atom`/`Set` literals resolved against `lhs`'s
    /// type).
    Assign {
        /// The assignment's target.
        lhs: TypedExpr<'ast>,
        /// The assignment's value, already retyped against `lhs`.
        rhs: TypedExpr<'ast>,
        /// `true` for a clocked (`<=`) assignment.
        delayed: bool,
        /// Source span.
        span: Span,
    },
    /// `if (cond) { then_body } else { else_body }`.
    If {
        /// The branch condition.
        cond: TypedExpr<'ast>,
        /// The taken branch's body.
        then_body: Vec<TypedStmt<'ast>>,
        /// The not-taken branch's body (empty if there was no `else`).
        else_body: Vec<TypedStmt<'ast>>,
        /// Source span.
        span: Span,
    },
    /// `switch (value) { case ...: ... }`.
    Switch {
        /// The switched-on value.
        value: TypedExpr<'ast>,
        /// The case arms, in source order.
        cases: Vec<CaseArm<'ast>>,
        /// Source span.
        span: Span,
    },
}

impl<'ast> TypedStmt<'ast> {
    /// Returns this statement's source span.
    pub fn span(&self) -> Span {
        match self {
            TypedStmt::Assign { span, .. } => *span,
            TypedStmt::If { span, .. } => *span,
            TypedStmt::Switch { span, .. } => *span,
        }
    }
}

/// A single `switch` arm.
#[derive(Debug, Clone)]
pub struct CaseArm<'ast> {
    /// The arm's matched value, retyped against the switched-on value's
    /// type exactly as an assignment's RHS would be.
    pub value: TypedExpr<'ast>,
    /// The arm's body.
    pub body: Vec<TypedStmt<'ast>>,
    /// Source span.
    pub span: Span,
}

/// An elaborated `always` block: combinational logic, re-evaluated on every
/// change to any input it reads.
#[derive(Debug, Clone)]
pub struct TypedAlways<'ast> {
    /// The block's body.
    pub body: Vec<TypedStmt<'ast>>,
    /// Source span.
    pub span: Span,
}

/// An elaborated `on` block: sequential logic, gated on the listed edges.
#[derive(Debug, Clone)]
pub struct TypedOn<'ast> {
    /// The triggering edges. Reused directly from the AST: an edge spec is
    /// just `(port name, polarity)` and needs no elaboration of its own.
    pub specs: Vec<bv_ast::EdgeSpec>,
    /// The block's body.
    pub body: Vec<TypedStmt<'ast>>,
    /// Source span.
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExprType;
    use bv_common::Interner;

    fn num(v: i64) -> TypedExpr<'static> {
        TypedExpr::Num {
            value: v,
            ty: ExprType::Int,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn assign_span_accessor() {
        let span = Span::DUMMY;
        let stmt = TypedStmt::Assign {
            lhs: num(0),
            rhs: num(1),
            delayed: true,
            span,
        };
        assert_eq!(stmt.span(), span);
    }

    #[test]
    fn switch_carries_case_arms_in_order() {
        let arm0 = CaseArm {
            value: num(0),
            body: vec![],
            span: Span::DUMMY,
        };
        let arm1 = CaseArm {
            value: num(1),
            body: vec![],
            span: Span::DUMMY,
        };
        let stmt = TypedStmt::Switch {
            value: num(2),
            cases: vec![arm0, arm1],
            span: Span::DUMMY,
        };
        match stmt {
            TypedStmt::Switch { cases, .. } => assert_eq!(cases.len(), 2),
            _ => panic!("expected Switch"),
        }
    }

    #[test]
    fn on_block_reuses_ast_edge_specs() {
        let interner = Interner::new();
        let spec = bv_ast::EdgeSpec {
            name: interner.get_or_intern("clk"),
            rising: true,
            span: Span::DUMMY,
        };
        let on = TypedOn {
            specs: vec![spec],
            body: vec![],
            span: Span::DUMMY,
        };
        assert_eq!(on.specs.len(), 1);
        assert!(on.specs[0].rising);
    }
}

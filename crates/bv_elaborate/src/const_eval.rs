//! The constant evaluator (§4.2): folds a restricted expression subset to a
//! concrete `i64` over a given scope.
//!
//! The evaluator is pure and always terminates: name references resolve
//! directly to [`crate::scope::ScopeEntry::Const`] bindings produced by
//! argument-folding at instantiation time (§4.4), never to another
//! expression requiring further recursive evaluation — a deliberate
//! simplification of the originating implementation's "`num` node with a
//! back-reference to the scope where the argument expression was parsed"
//! scheme, recorded in `DESIGN.md`. Cycle detection is therefore
//! unnecessary here (only the elaborator's instantiation graph can cycle).

use bv_ast::{BinOp, Expr, UnOp};
use bv_common::Interner;

use crate::errors::BvError;
use crate::scope::{ScopeArena, ScopeEntry, ScopeId, ScopeKind};

/// Folds `expr` to a concrete integer against scope `scope_id`.
pub fn evaluate(
    expr: &Expr,
    scope_id: ScopeId,
    scopes: &ScopeArena<'_>,
    interner: &Interner,
) -> Result<i64, BvError> {
    match expr {
        Expr::Num { value, .. } => Ok(*value),
        Expr::SizedNum { digits, span, .. } => parse_sized_literal(digits, *span),
        Expr::Unary { arg, op, .. } => {
            let v = evaluate(arg, scope_id, scopes, interner)?;
            match op {
                UnOp::Neg => Ok(-v),
                UnOp::Not => Err(BvError::EvalError {
                    message: "logical negation is not a constant-foldable operator".to_string(),
                    span: expr.span(),
                }),
            }
        }
        Expr::Binary { lhs, rhs, op, span } => {
            let l = evaluate(lhs, scope_id, scopes, interner)?;
            let r = evaluate(rhs, scope_id, scopes, interner)?;
            match op {
                BinOp::Add => Ok(l.wrapping_add(r)),
                BinOp::Sub => Ok(l.wrapping_sub(r)),
                BinOp::Mul => Ok(l.wrapping_mul(r)),
                BinOp::Div => {
                    if r == 0 {
                        Err(BvError::EvalError {
                            message: "division by zero".to_string(),
                            span: *span,
                        })
                    } else {
                        // `i64`'s native division already truncates toward
                        // zero, which is what constant folding wants here.
                        Ok(l / r)
                    }
                }
            }
        }
        Expr::Call { func, args, span } => {
            if interner.resolve(*func) != "log2" {
                return Err(BvError::EvalError {
                    message: format!("unknown built-in function '{}'", interner.resolve(*func)),
                    span: *span,
                });
            }
            if args.len() != 1 {
                return Err(BvError::EvalError {
                    message: "log2 takes exactly one argument".to_string(),
                    span: *span,
                });
            }
            let n = evaluate(&args[0], scope_id, scopes, interner)?;
            if n < 1 {
                return Err(BvError::EvalError {
                    message: "log2 requires an argument >= 1".to_string(),
                    span: *span,
                });
            }
            Ok(63 - n.leading_zeros() as i64)
        }
        Expr::Ref { name, span } => match scopes.lookup(scope_id, *name) {
            Some(ScopeEntry::Const(v)) => Ok(*v),
            Some(other) => Err(BvError::KindError {
                name: interner.resolve(*name).to_string(),
                expected: "constant",
                found: scope_kind_name(other.kind()),
                span: *span,
            }),
            None => Err(BvError::NameError {
                name: interner.resolve(*name).to_string(),
                span: *span,
            }),
        },
        _ => Err(BvError::EvalError {
            message: "not a constant expression".to_string(),
            span: expr.span(),
        }),
    }
}

/// Parses a sized literal's digit string as a constant, in contexts where
/// meta-digits (`x`/`z`/`?`) are not permitted: parameter arguments, array
/// bounds, and slice bounds (§4.2). A sized literal appearing as an
/// ordinary (non-constant) expression value keeps its digits unparsed
/// instead, so meta-digits can propagate through to Verilog emission.
pub fn parse_sized_literal(digits: &str, span: bv_source::Span) -> Result<i64, BvError> {
    let mut value: i64 = 0;
    for c in digits.chars() {
        let bit = match c {
            '0' => 0,
            '1' => 1,
            _ => {
                return Err(BvError::EvalError {
                    message: format!(
                        "meta-digit '{c}' is not permitted in a constant expression"
                    ),
                    span,
                })
            }
        };
        value = value * 2 + bit;
    }
    Ok(value)
}

fn scope_kind_name(kind: ScopeKind) -> &'static str {
    match kind {
        ScopeKind::Interface => "interface",
        ScopeKind::Enum => "enum",
        ScopeKind::Module => "module",
        ScopeKind::Const => "constant",
        ScopeKind::Port => "port",
        ScopeKind::Signal => "signal",
        ScopeKind::Inst => "instance",
    }
}

//! The elaborator's single fail-fast error channel (§7).
//!
//! Every fallible function here returns `Result<T, BvError>` and propagates
//! with `?`. There is no accumulating sink and no continuation after the
//! first error — the "no error recovery" rule lives in the type signatures
//! themselves rather than behind a runtime flag. `ParseError` has no variant
//! here: it is raised by the external parser, never by this crate.

use bv_common::Ident;
use bv_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use bv_source::Span;

/// The six elaboration-time error kinds from §7.
#[derive(Debug, thiserror::Error)]
pub enum BvError {
    /// An unknown type, module, interface, port, atom, or parameter name.
    #[error("unknown name '{name}'")]
    NameError {
        /// The unresolved name.
        name: String,
        /// Where the reference occurred.
        span: Span,
    },

    /// A name resolved, but to the wrong kind (e.g. a module used where a
    /// type was expected).
    #[error("'{name}' is a {found}, expected a {expected}")]
    KindError {
        /// The offending name.
        name: String,
        /// The kind that was expected.
        expected: &'static str,
        /// The kind that was actually found.
        found: &'static str,
        /// Where the reference occurred.
        span: Span,
    },

    /// A structural mismatch: a slice on a non-array, a subscript with a
    /// non-integer index, member access on a non-structured expression, or
    /// assignment of `'x` to a non-structural target.
    #[error("type error: {message}")]
    TypeError {
        /// A human-readable description of the mismatch.
        message: String,
        /// Where the mismatch was detected.
        span: Span,
    },

    /// A constant expression could not be folded: it contains a
    /// non-constant construct, a meta-digit literal, division by zero, or
    /// an invalid argument count/name in a parameter-argument list.
    #[error("cannot evaluate constant expression: {message}")]
    EvalError {
        /// A human-readable description of the failure.
        message: String,
        /// Where the failure was detected.
        span: Span,
    },

    /// A module or interface was re-entered while already being
    /// instantiated (a cycle through `inst`/`use`).
    #[error("circular instantiation of '{name}'")]
    RecursiveInstantiation {
        /// The name whose instantiation cycles back to itself.
        name: String,
        /// Where the re-entrant instantiation was attempted.
        span: Span,
    },

    /// A slice's folded bounds fall outside the array's inclusive range.
    #[error("slice bounds [{upper}:{lower}] are outside the array's range")]
    BoundsError {
        /// The slice's folded upper bound.
        upper: i64,
        /// The slice's folded lower bound.
        lower: i64,
        /// Where the slice was written.
        span: Span,
    },
}

impl BvError {
    /// Returns this error's primary span, for callers that need it without
    /// matching on the variant.
    pub fn span(&self) -> Span {
        match self {
            BvError::NameError { span, .. }
            | BvError::KindError { span, .. }
            | BvError::TypeError { span, .. }
            | BvError::EvalError { span, .. }
            | BvError::RecursiveInstantiation { span, .. }
            | BvError::BoundsError { span, .. } => *span,
        }
    }

    /// The sole bridge to the ambient diagnostics crate: renders this error
    /// as a single user-facing [`Diagnostic`] for an external driver to
    /// print.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BvError::NameError { name, span } => Diagnostic::error(
                code(300),
                format!("unknown name '{name}'"),
                *span,
            ),
            BvError::KindError {
                name,
                expected,
                found,
                span,
            } => Diagnostic::error(
                code(301),
                format!("'{name}' is a {found}, expected a {expected}"),
                *span,
            ),
            BvError::TypeError { message, span } => {
                Diagnostic::error(code(302), message.clone(), *span)
            }
            BvError::EvalError { message, span } => Diagnostic::error(
                code(303),
                format!("cannot evaluate constant expression: {message}"),
                *span,
            ),
            BvError::RecursiveInstantiation { name, span } => {
                Diagnostic::error(code(304), format!("circular instantiation of '{name}'"), *span)
                    .with_note("the declaration directly or indirectly instantiates itself")
            }
            BvError::BoundsError { upper, lower, span } => Diagnostic::error(
                code(305),
                format!("slice bounds [{upper}:{lower}] are outside the array's range"),
                *span,
            )
            .with_label(Label::primary(*span, "out-of-range slice")),
        }
    }

    /// Convenience constructor for [`BvError::NameError`] taking the raw
    /// `Ident` and an interner, since callers almost always have both on
    /// hand rather than a pre-resolved `String`.
    pub fn name_error(interner: &bv_common::Interner, name: Ident, span: Span) -> Self {
        BvError::NameError {
            name: interner.resolve(name).to_string(),
            span,
        }
    }
}

fn code(number: u16) -> DiagnosticCode {
    DiagnosticCode::new(Category::Error, number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_common::Interner;

    #[test]
    fn name_error_renders_with_name() {
        let interner = Interner::new();
        let name = interner.get_or_intern("foo");
        let err = BvError::name_error(&interner, name, Span::DUMMY);
        let diag = err.to_diagnostic();
        assert!(diag.message.contains("foo"));
        assert_eq!(format!("{}", diag.code), "E300");
    }

    #[test]
    fn kind_error_mentions_expected_and_found() {
        let err = BvError::KindError {
            name: "top".to_string(),
            expected: "interface",
            found: "module",
            span: Span::DUMMY,
        };
        let diag = err.to_diagnostic();
        assert!(diag.message.contains("interface"));
        assert!(diag.message.contains("module"));
    }

    #[test]
    fn recursive_instantiation_has_note() {
        let err = BvError::RecursiveInstantiation {
            name: "m".to_string(),
            span: Span::DUMMY,
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn bounds_error_carries_both_bounds() {
        let err = BvError::BoundsError {
            upper: 10,
            lower: 0,
            span: Span::DUMMY,
        };
        assert!(format!("{err}").contains("10"));
    }

    #[test]
    fn span_accessor() {
        let span = Span::DUMMY;
        let err = BvError::EvalError {
            message: "division by zero".to_string(),
            span,
        };
        assert_eq!(err.span(), span);
    }
}

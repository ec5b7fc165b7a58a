//! AST node types produced by the (external) BV parser.
//!
//! Every node carries a [`Span`] for source location tracking. There is no
//! error-recovery variant here: the parser that produces this tree is an
//! external collaborator, and this crate only carries the data shape it
//! hands to the semantic pre-pass and elaborator.

use bv_common::Ident;
use bv_source::Span;

// ============================================================================
// Top-level
// ============================================================================

/// A single BV compilation unit (one source file).
#[derive(Debug, Clone)]
pub struct Unit {
    /// The top-level declarations in this unit.
    pub decls: Vec<TopDecl>,
    /// Source span covering the whole unit.
    pub span: Span,
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub enum TopDecl {
    /// An `interface` declaration.
    Interface(InterfaceDecl),
    /// An `enum` declaration.
    Enum(EnumDecl),
    /// A `module` declaration (ports and parameters only).
    Module(ModuleDecl),
    /// A `def`: a module-body block, separate from the module header.
    Def(DefDecl),
}

// ============================================================================
// Interfaces
// ============================================================================

/// A parameterised bundle of ports, possibly including other interfaces via
/// `use`.
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    /// The interface's name, unique within the root scope.
    pub name: Ident,
    /// Ordered, integer-typed parameters.
    pub params: Vec<ParamDecl>,
    /// Member declarations: direct ports or `use` of another interface.
    pub members: Vec<IntfMember>,
    /// Source span.
    pub span: Span,
}

/// A member of an interface body.
#[derive(Debug, Clone)]
pub enum IntfMember {
    /// A directly declared port.
    Port(PortDecl),
    /// A `use` of another interface, splicing its ports in.
    Use(UseDecl),
}

/// `use <interface-type>`: splices another interface's flattened ports into
/// this one.
#[derive(Debug, Clone)]
pub struct UseDecl {
    /// The referenced interface type; must resolve to a `struct-type`
    /// naming another `interface` (enforced by the semantic pre-pass).
    pub ty: TypeExpr,
    /// Source span.
    pub span: Span,
}

// ============================================================================
// Enums
// ============================================================================

/// An enumerated type: an ordered list of atom names whose numeric codes are
/// consecutive from 0 in declaration order.
#[derive(Debug, Clone)]
pub struct EnumDecl {
    /// The enum's name.
    pub name: Ident,
    /// The ordered atom names; atom `i` has numeric code `i`.
    pub atoms: Vec<Ident>,
    /// Source span.
    pub span: Span,
}

// ============================================================================
// Modules
// ============================================================================

/// A module's header: name, parameters, and ports. The module's body lives
/// separately in zero or more [`DefDecl`]s bound to this module by name
/// during the semantic pre-pass.
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    /// The module's name, unique within the root scope.
    pub name: Ident,
    /// Ordered, integer-typed parameters.
    pub params: Vec<ParamDecl>,
    /// The module's ports.
    pub ports: Vec<PortDecl>,
    /// Source span.
    pub span: Span,
}

/// A single ordered parameter of an interface or module.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    /// The parameter's name, bound as an integer constant at instantiation.
    pub name: Ident,
    /// The parameter's declared type (always resolves to an integer).
    pub ty: TypeExpr,
    /// Source span.
    pub span: Span,
}

/// A port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    /// Input (`i`).
    In,
    /// Output (`o`).
    Out,
}

/// A single port declaration.
#[derive(Debug, Clone)]
pub struct PortDecl {
    /// The port's direction.
    pub dir: Dir,
    /// The port's name.
    pub name: Ident,
    /// The port's declared type.
    pub ty: TypeExpr,
    /// Source span.
    pub span: Span,
}

// ============================================================================
// Module bodies (defs)
// ============================================================================

/// A module-body declaration: signals, instantiations, and process blocks
/// for one `module`. Multiple `def`s may target the same module; their
/// declarations are concatenated during elaboration.
#[derive(Debug, Clone)]
pub struct DefDecl {
    /// The name of the `module` this `def` belongs to.
    pub name: Ident,
    /// The body declarations.
    pub items: Vec<DefItem>,
    /// Source span.
    pub span: Span,
}

/// A single declaration inside a `def` body.
#[derive(Debug, Clone)]
pub enum DefItem {
    /// A local signal declaration.
    Signal(SignalDecl),
    /// A sub-module instantiation.
    Inst(InstDecl),
    /// A combinational (`always`) process.
    Always(AlwaysDecl),
    /// An edge-triggered (`on`) process.
    On(OnDecl),
}

/// A signal declared inside a `def`, living in that `def`'s scope.
#[derive(Debug, Clone)]
pub struct SignalDecl {
    /// The signal's name.
    pub name: Ident,
    /// The signal's declared type.
    pub ty: TypeExpr,
    /// Source span.
    pub span: Span,
}

/// An instantiation of another module.
#[derive(Debug, Clone)]
pub struct InstDecl {
    /// The instance's local name.
    pub name: Ident,
    /// The name of the module being instantiated.
    pub module: Ident,
    /// Explicit port connections. Any port not named here remains
    /// unconnected (the elaborator does not require exhaustive port maps).
    pub port_maps: Vec<PortMapDecl>,
    /// Source span.
    pub span: Span,
}

/// A single `{target-port-ref <- source-expression}` binding inside an
/// `inst`.
#[derive(Debug, Clone)]
pub struct PortMapDecl {
    /// The name of the port on the instantiated module this map targets.
    pub target: Ident,
    /// The expression driving (or driven by) that port, evaluated against
    /// the enclosing `def`'s scope.
    pub source: Expr,
    /// Source span.
    pub span: Span,
}

/// A combinational process: `always: <body>`. Sensitivity is implicitly
/// `*`.
#[derive(Debug, Clone)]
pub struct AlwaysDecl {
    /// The statement body.
    pub body: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

/// An edge-triggered process: `on <specs>: <body>`.
#[derive(Debug, Clone)]
pub struct OnDecl {
    /// The sensitivity list.
    pub specs: Vec<EdgeSpec>,
    /// The statement body.
    pub body: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

/// A single edge-sensitivity entry in an `on` process.
#[derive(Debug, Clone)]
pub struct EdgeSpec {
    /// The name of the signal this edge is sensitive to.
    pub name: Ident,
    /// `true` for `posedge`, `false` for `negedge`.
    pub rising: bool,
    /// Source span.
    pub span: Span,
}

// ============================================================================
// Types
// ============================================================================

/// A type expression as written in source, before elaboration resolves
/// `struct-type`/`set-type` references to their declarations.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// A single scalar bit.
    Bit(Span),
    /// A nominal array: `<subtype>[<left>:<right>]`. Multi-dimensional
    /// arrays are represented as an `Array` whose `subtype` is itself an
    /// `Array`.
    Array {
        /// The element type.
        subtype: Box<TypeExpr>,
        /// The (unevaluated) left bound expression.
        left: Box<Expr>,
        /// The (unevaluated) right bound expression.
        right: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// A named structured type: either an interface instantiation or an
    /// enum reference, disambiguated by the semantic pre-pass.
    Struct {
        /// The referenced declaration's name.
        name: Ident,
        /// The instantiation arguments (empty for an enum reference).
        args: Vec<Arg>,
        /// Source span.
        span: Span,
    },
    /// `set(<enum-name>)`: a bitmask type over an enum's atoms.
    Set {
        /// The name of the referenced enum.
        enum_name: Ident,
        /// Source span.
        span: Span,
    },
}

impl TypeExpr {
    /// Returns this type expression's span.
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Bit(span) => *span,
            TypeExpr::Array { span, .. } => *span,
            TypeExpr::Struct { span, .. } => *span,
            TypeExpr::Set { span, .. } => *span,
        }
    }
}

/// A single argument to a parameterised interface or module instantiation.
#[derive(Debug, Clone)]
pub struct Arg {
    /// The keyword name, if this argument was written as `name=value`.
    pub kw_name: Option<Ident>,
    /// The argument's value expression, folded to an integer by the caller.
    pub value: Expr,
    /// Source span.
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

/// A statement inside an `always`/`on` body.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// An assignment, `lhs = rhs` (blocking) or `lhs <= rhs` (delayed).
    Assign {
        /// The assignment target.
        lhs: Expr,
        /// The assigned value, before context-sensitive RHS conversion.
        rhs: Expr,
        /// `true` for `<=`, `false` for `=`.
        delayed: bool,
        /// Source span.
        span: Span,
    },
    /// An `if`/`else` conditional.
    If {
        /// The condition expression.
        cond: Expr,
        /// The taken branch.
        then_body: Vec<Stmt>,
        /// The optional `else` branch.
        else_body: Option<Vec<Stmt>>,
        /// Source span.
        span: Span,
    },
    /// A `switch` over a value with one or more cases.
    Switch {
        /// The switched-on value.
        value: Expr,
        /// The case arms.
        cases: Vec<CaseArm>,
        /// Source span.
        span: Span,
    },
}

impl Stmt {
    /// Returns this statement's span.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign { span, .. } => *span,
            Stmt::If { span, .. } => *span,
            Stmt::Switch { span, .. } => *span,
        }
    }
}

/// A single `case` arm inside a `switch` statement.
#[derive(Debug, Clone)]
pub struct CaseArm {
    /// The case's matched value.
    pub value: Expr,
    /// The case's statement body.
    pub body: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Arithmetic negation, `-`.
    Neg,
    /// Logical/bitwise negation, `not`.
    Not,
}

/// An expression, as written in source.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A binary operation.
    Binary {
        /// The left operand.
        lhs: Box<Expr>,
        /// The right operand.
        rhs: Box<Expr>,
        /// The operator.
        op: BinOp,
        /// Source span.
        span: Span,
    },
    /// A unary operation.
    Unary {
        /// The operand.
        arg: Box<Expr>,
        /// The operator.
        op: UnOp,
        /// Source span.
        span: Span,
    },
    /// An explicit cast, `(<type>)<expr>`.
    Cast {
        /// The target type.
        ty: TypeExpr,
        /// The inner expression.
        expr: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// A member access, `<expr>.<member>`.
    Member {
        /// The inner expression; must elaborate to an interface- or
        /// module-instance type.
        expr: Box<Expr>,
        /// The accessed member's name.
        member: Ident,
        /// Source span.
        span: Span,
    },
    /// An array slice, `<expr>[<upper>:<lower>]`.
    Slice {
        /// The sliced expression; must elaborate to an array type.
        expr: Box<Expr>,
        /// The lower bound expression.
        lower: Box<Expr>,
        /// The upper bound expression.
        upper: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// An array subscript, `<expr>[<index>]`.
    Subscript {
        /// The subscripted expression; must elaborate to an array type.
        expr: Box<Expr>,
        /// The index expression; must elaborate to an integer.
        index: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// A call to a built-in function (only `log2` is recognised).
    Call {
        /// The called function's name.
        func: Ident,
        /// The call arguments.
        args: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// A bare name reference, resolved against the enclosing scope.
    Ref {
        /// The referenced name.
        name: Ident,
        /// Source span.
        span: Span,
    },
    /// A `'`-prefixed atom: an enumerator value or the structural
    /// don't-care `'x`, typed contextually at its use site.
    Atom {
        /// The atom's name (e.g. `B` in `'B`, or `x` in `'x`).
        name: Ident,
        /// Source span.
        span: Span,
    },
    /// An unsized decimal integer literal.
    Num {
        /// The literal's value.
        value: i64,
        /// Source span.
        span: Span,
    },
    /// A sized literal, `<width>'<base><digits>`, normalised to a binary
    /// digit string by the parser. Digits may include the meta-digits `x`,
    /// `z`, `?`; whether that is permitted depends on the evaluation
    /// context (see `bv_elaborate::const_eval`).
    SizedNum {
        /// The literal's declared bit width.
        width: u32,
        /// The literal's digits, most-significant first, one character per
        /// bit, drawn from `{0, 1, x, z, ?}`.
        digits: String,
        /// Source span.
        span: Span,
    },
    /// A set literal, `{A, B, ...}`, typed contextually by the enclosing
    /// assignment's LHS.
    Set {
        /// The named atoms in the literal.
        items: Vec<Ident>,
        /// Source span.
        span: Span,
    },
}

impl Expr {
    /// Returns this expression's span.
    pub fn span(&self) -> Span {
        match self {
            Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Cast { span, .. }
            | Expr::Member { span, .. }
            | Expr::Slice { span, .. }
            | Expr::Subscript { span, .. }
            | Expr::Call { span, .. }
            | Expr::Ref { span, .. }
            | Expr::Atom { span, .. }
            | Expr::Num { span, .. }
            | Expr::SizedNum { span, .. }
            | Expr::Set { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_common::Interner;
    use bv_source::FileId;

    fn dummy_ident(interner: &Interner, s: &str) -> Ident {
        interner.get_or_intern(s)
    }

    #[test]
    fn type_expr_span_matches_variant() {
        let span = Span::new(FileId::from_raw(0), 4, 8);
        let ty = TypeExpr::Bit(span);
        assert_eq!(ty.span(), span);
    }

    #[test]
    fn stmt_span_matches_variant() {
        let interner = Interner::new();
        let span = Span::new(FileId::from_raw(0), 0, 10);
        let name = dummy_ident(&interner, "a");
        let stmt = Stmt::Assign {
            lhs: Expr::Ref { name, span },
            rhs: Expr::Num { value: 1, span },
            delayed: false,
            span,
        };
        assert_eq!(stmt.span(), span);
    }

    #[test]
    fn expr_span_matches_variant() {
        let interner = Interner::new();
        let span = Span::new(FileId::from_raw(0), 2, 6);
        let name = dummy_ident(&interner, "x");
        let expr = Expr::Ref { name, span };
        assert_eq!(expr.span(), span);
    }

    #[test]
    fn sized_num_preserves_meta_digits() {
        let span = Span::DUMMY;
        let expr = Expr::SizedNum {
            width: 4,
            digits: "1x0z".to_string(),
            span,
        };
        match expr {
            Expr::SizedNum { digits, width, .. } => {
                assert_eq!(width, 4);
                assert_eq!(digits, "1x0z");
            }
            _ => panic!("expected SizedNum"),
        }
    }
}

//! The elaborator / instantiator (§4.4): turns a `(declaration, folded
//! parameters)` pair into a monomorphised [`bv_ir::ModuleInstance`] or
//! [`bv_ir::InterfaceInstance`], memoising by that pair and detecting
//! `inst`/`use` cycles through it.
//!
//! The memo tables, the module/interface instance arenas, and the scope
//! arena are threaded as explicit parameters rather than bundled behind one
//! `&mut self` receiver whose methods recurse through `&mut self` freely.
//! `instantiate_module`/`instantiate_interface` recurse into themselves and
//! each other while an [`ActiveGuard`] holds an exclusive borrow of one of
//! the two active-sets; bundling every field behind one struct would make
//! that borrow conflict with the very recursive call it is meant to guard,
//! since a method call needs all of `self` back. Splitting the "active set
//! under a cycle guard" parameters from the "tables mutated freely" ones
//! sidesteps that without reaching for interior mutability.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use bv_ast::{
    Arg, BinOp, DefDecl, DefItem, Dir, Expr, ParamDecl, Stmt, TypeExpr, UnOp,
};
use bv_common::{Ident, Interner};
use bv_ir::{
    Arena, CaseArm, InstInst, InterfaceInstance, ModuleInstance, ResolvedPort, ResolvedPortMap,
    ResolvedSignal, TypedAlways, TypedExpr, TypedOn, TypedStmt,
};
use bv_ir::{ExprType, InterfaceInstanceId, ModuleInstanceId, Type};
use bv_source::Span;

use crate::const_eval;
use crate::errors::BvError;
use crate::scope::{ScopeArena, ScopeEntry, ScopeId, ScopeKind};
use crate::sema::PrepassResult;

/// A `(declaration-name, folded-parameter-tuple)` memoisation/cycle-tracking
/// key (§4.4, §5).
pub type InstKey = (Ident, Vec<i64>);

/// The mutable tables every instantiation reads and writes, minus the two
/// active-sets (kept separate so [`ActiveGuard`] can borrow one of them
/// without fighting the borrow checker over the rest — see the module
/// doc-comment).
pub struct Tables<'ast> {
    /// Every scope created by the pre-pass, plus every per-instance scope
    /// elaboration creates afterwards.
    pub scopes: ScopeArena<'ast>,
    /// Monomorphised module instances, keyed by allocation order.
    pub module_instances: Arena<ModuleInstanceId, ModuleInstance<'ast>>,
    /// Monomorphised interface instances, keyed by allocation order.
    pub interface_instances: Arena<InterfaceInstanceId, InterfaceInstance<'ast>>,
    /// `(name, params) -> id` memo table for modules.
    pub module_memo: HashMap<InstKey, ModuleInstanceId>,
    /// `(name, params) -> id` memo table for interfaces.
    pub interface_memo: HashMap<InstKey, InterfaceInstanceId>,
}

impl<'ast> Tables<'ast> {
    /// Builds the initial table set from a completed pre-pass.
    pub fn new(scopes: ScopeArena<'ast>) -> Self {
        Self {
            scopes,
            module_instances: Arena::new(),
            interface_instances: Arena::new(),
            module_memo: HashMap::new(),
            interface_memo: HashMap::new(),
        }
    }
}

/// The read-only context every elaboration call needs: the interner, the
/// root scope, and the def-by-module table from the pre-pass. Never
/// mutated, so it is shared by plain `&` reference even across recursive
/// calls that also hold a live `&mut` into [`Tables`].
pub struct Env<'ast, 'a> {
    /// The shared string interner.
    pub interner: &'a Interner,
    /// The root scope every top-level declaration lives in.
    pub root: ScopeId,
    /// Every `def` bound to its target module by the pre-pass.
    pub defs_by_module: &'a HashMap<Ident, Vec<&'ast DefDecl>>,
}

/// Owns everything a full elaboration run needs, and the two active-sets
/// cycle detection guards.
pub struct ElaborationContext<'ast, 'a> {
    /// The pre-pass's read-only context.
    pub env: Env<'ast, 'a>,
    /// The mutable tables.
    pub tables: Tables<'ast>,
    active_modules: HashSet<InstKey>,
    active_interfaces: HashSet<InstKey>,
}

impl<'ast, 'a> ElaborationContext<'ast, 'a> {
    /// Builds a fresh elaboration context from a completed pre-pass.
    pub fn new(prepass: PrepassResult<'ast>, interner: &'a Interner) -> Self {
        let env = Env {
            interner,
            root: prepass.root,
            defs_by_module: Box::leak(Box::new(prepass.defs_by_module)),
        };
        Self {
            env,
            tables: Tables::new(prepass.scopes),
            active_modules: HashSet::new(),
            active_interfaces: HashSet::new(),
        }
    }

    /// Instantiates the module named `name` with the given top-level
    /// arguments (folded against the root scope).
    pub fn instantiate_module(
        &mut self,
        name: Ident,
        args: &[Arg],
        span: Span,
    ) -> Result<ModuleInstanceId, BvError> {
        let root = self.env.root;
        instantiate_module(
            &mut self.active_modules,
            &mut self.active_interfaces,
            &mut self.tables,
            &self.env,
            name,
            args,
            root,
            span,
        )
    }

    /// Instantiates the interface named `name` with the given top-level
    /// arguments (folded against the root scope).
    pub fn instantiate_interface(
        &mut self,
        name: Ident,
        args: &[Arg],
        span: Span,
    ) -> Result<InterfaceInstanceId, BvError> {
        let root = self.env.root;
        instantiate_interface(
            &mut self.active_interfaces,
            &mut self.tables,
            &self.env,
            name,
            args,
            root,
            span,
        )
    }
}

/// RAII membership guard over one of the two active-sets (§5): inserts
/// `key` on construction, and unconditionally removes it again in [`Drop`]
/// — on the success path as well as when an early `?` unwinds out of the
/// scope the guard lives in. `set_mut` hands out a reborrow for a nested
/// call without releasing the guard's own eventual removal.
pub struct ActiveGuard<'a, K: Eq + Hash> {
    set: &'a mut HashSet<K>,
    key: K,
}

impl<'a, K: Eq + Hash + Clone> ActiveGuard<'a, K> {
    /// Attempts to enter `key`. Returns `None` if `key` is already active
    /// (a cycle), leaving `set` untouched.
    pub fn enter(set: &'a mut HashSet<K>, key: K) -> Option<Self> {
        if set.contains(&key) {
            return None;
        }
        set.insert(key.clone());
        Some(Self { set, key })
    }

    /// Reborrows the guarded set for a call nested inside the guard's own
    /// scope.
    pub fn set_mut(&mut self) -> &mut HashSet<K> {
        &mut *self.set
    }
}

impl<'a, K: Eq + Hash> Drop for ActiveGuard<'a, K> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

/// Binds `args` to `params` (§4.4): positional arguments fill left to
/// right, keyword arguments fill by name, every slot must end up filled
/// exactly once, and every value is folded by the constant evaluator
/// against the *caller's* scope (never the callee's, which does not exist
/// yet).
fn match_args(
    params: &[ParamDecl],
    args: &[Arg],
    caller_scope: ScopeId,
    scopes: &ScopeArena<'_>,
    interner: &Interner,
) -> Result<Vec<i64>, BvError> {
    let mut slots: Vec<Option<i64>> = vec![None; params.len()];
    let mut next_positional = 0usize;
    for arg in args {
        let folded = const_eval::evaluate(&arg.value, caller_scope, scopes, interner)?;
        let idx = match arg.kw_name {
            Some(kw) => params.iter().position(|p| p.name == kw).ok_or_else(|| {
                BvError::NameError {
                    name: interner.resolve(kw).to_string(),
                    span: arg.span,
                }
            })?,
            None => {
                let idx = next_positional;
                next_positional += 1;
                idx
            }
        };
        let slot = slots.get_mut(idx).ok_or_else(|| BvError::EvalError {
            message: "too many arguments".to_string(),
            span: arg.span,
        })?;
        if slot.is_some() {
            return Err(BvError::EvalError {
                message: format!(
                    "parameter '{}' bound more than once",
                    interner.resolve(params[idx].name)
                ),
                span: arg.span,
            });
        }
        *slot = Some(folded);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| BvError::EvalError {
                message: format!(
                    "missing argument for parameter '{}'",
                    interner.resolve(params[i].name)
                ),
                span: params[i].span,
            })
        })
        .collect()
}

/// Resolves a `TypeExpr` against `scope_id`, folding any array bounds and
/// recursively instantiating any interface it names.
fn elaborate_type<'ast>(
    ty: &'ast TypeExpr,
    scope_id: ScopeId,
    active_interfaces: &mut HashSet<InstKey>,
    tables: &mut Tables<'ast>,
    env: &Env<'ast, '_>,
) -> Result<Type<'ast>, BvError> {
    match ty {
        TypeExpr::Bit(_) => Ok(Type::Bit),
        TypeExpr::Array {
            subtype,
            left,
            right,
            ..
        } => {
            let l = const_eval::evaluate(left, scope_id, &tables.scopes, env.interner)?;
            let r = const_eval::evaluate(right, scope_id, &tables.scopes, env.interner)?;
            let sub = elaborate_type(subtype, scope_id, active_interfaces, tables, env)?;
            Ok(Type::Array {
                subtype: Box::new(sub),
                left: l,
                right: r,
            })
        }
        TypeExpr::Struct { name, args, span } => match tables.scopes.lookup(env.root, *name) {
            Some(ScopeEntry::Interface(_)) => {
                let id = instantiate_interface(
                    active_interfaces,
                    tables,
                    env,
                    *name,
                    args,
                    scope_id,
                    *span,
                )?;
                Ok(Type::IntfInst(id))
            }
            Some(ScopeEntry::Enum(decl)) => Ok(Type::Enum(*decl)),
            Some(ScopeEntry::Module(_)) => Err(BvError::KindError {
                name: env.interner.resolve(*name).to_string(),
                expected: "interface or enum",
                found: "module",
                span: *span,
            }),
            Some(_) => Err(BvError::KindError {
                name: env.interner.resolve(*name).to_string(),
                expected: "interface or enum",
                found: "declaration",
                span: *span,
            }),
            None => Err(BvError::NameError {
                name: env.interner.resolve(*name).to_string(),
                span: *span,
            }),
        },
        TypeExpr::Set { enum_name, span } => match tables.scopes.lookup(env.root, *enum_name) {
            Some(ScopeEntry::Enum(decl)) => Ok(Type::Set(*decl)),
            Some(_) => Err(BvError::KindError {
                name: env.interner.resolve(*enum_name).to_string(),
                expected: "enum",
                found: "declaration",
                span: *span,
            }),
            None => Err(BvError::NameError {
                name: env.interner.resolve(*enum_name).to_string(),
                span: *span,
            }),
        },
    }
}

/// Instantiates (or returns the memoised instance of) the interface named
/// `name` with `args`, folded against `caller_scope`.
pub fn instantiate_interface<'ast>(
    active_interfaces: &mut HashSet<InstKey>,
    tables: &mut Tables<'ast>,
    env: &Env<'ast, '_>,
    name: Ident,
    args: &[Arg],
    caller_scope: ScopeId,
    span: Span,
) -> Result<InterfaceInstanceId, BvError> {
    let decl = match tables.scopes.lookup_kind(env.root, name, ScopeKind::Interface) {
        Some(ScopeEntry::Interface(d)) => *d,
        Some(_) => {
            return Err(BvError::KindError {
                name: env.interner.resolve(name).to_string(),
                expected: "interface",
                found: "declaration",
                span,
            })
        }
        None => return Err(BvError::NameError {
            name: env.interner.resolve(name).to_string(),
            span,
        }),
    };

    let folded = match_args(&decl.params, args, caller_scope, &tables.scopes, env.interner)?;
    let key: InstKey = (name, folded.clone());
    if let Some(&id) = tables.interface_memo.get(&key) {
        return Ok(id);
    }

    let mut guard = ActiveGuard::enter(active_interfaces, key.clone()).ok_or_else(|| {
        BvError::RecursiveInstantiation {
            name: env.interner.resolve(name).to_string(),
            span,
        }
    })?;

    let instance_scope = tables.scopes.create_scope(Some(env.root));
    let params: Vec<(Ident, i64)> = decl
        .params
        .iter()
        .map(|p| p.name)
        .zip(folded.iter().copied())
        .collect();
    for (pname, pval) in &params {
        tables.scopes.add(instance_scope, *pname, ScopeEntry::Const(*pval));
    }

    let result = elaborate_interface_members(decl, instance_scope, guard.set_mut(), tables, env);
    drop(guard);
    let ports = result?;

    let instance = InterfaceInstance { decl, params, ports };
    let id = tables.interface_instances.alloc(instance);
    tables.interface_memo.insert(key, id);
    Ok(id)
}

fn elaborate_interface_members<'ast>(
    decl: &'ast bv_ast::InterfaceDecl,
    instance_scope: ScopeId,
    active_interfaces: &mut HashSet<InstKey>,
    tables: &mut Tables<'ast>,
    env: &Env<'ast, '_>,
) -> Result<Vec<ResolvedPort<'ast>>, BvError> {
    let mut ports = Vec::new();
    for member in &decl.members {
        match member {
            bv_ast::IntfMember::Port(port) => {
                let ty = elaborate_type(&port.ty, instance_scope, active_interfaces, tables, env)?;
                ports.push(ResolvedPort {
                    dir: port.dir,
                    name: port.name,
                    ty,
                    span: port.span,
                });
            }
            bv_ast::IntfMember::Use(use_decl) => {
                let (used_name, used_args, used_span) = match &use_decl.ty {
                    TypeExpr::Struct { name, args, span } => (*name, args.clone(), *span),
                    other => {
                        return Err(BvError::TypeError {
                            message: "a 'use' member must name another interface".to_string(),
                            span: other.span(),
                        })
                    }
                };
                let used_id = instantiate_interface(
                    active_interfaces,
                    tables,
                    env,
                    used_name,
                    &used_args,
                    instance_scope,
                    used_span,
                )?;
                let used_ports = tables.interface_instances.get(used_id).ports.clone();
                ports.extend(used_ports);
            }
        }
    }
    Ok(ports)
}

/// Instantiates (or returns the memoised instance of) the module named
/// `name` with `args`, folded against `caller_scope`.
pub fn instantiate_module<'ast>(
    active_modules: &mut HashSet<InstKey>,
    active_interfaces: &mut HashSet<InstKey>,
    tables: &mut Tables<'ast>,
    env: &Env<'ast, '_>,
    name: Ident,
    args: &[Arg],
    caller_scope: ScopeId,
    span: Span,
) -> Result<ModuleInstanceId, BvError> {
    let decl = match tables.scopes.lookup_kind(env.root, name, ScopeKind::Module) {
        Some(ScopeEntry::Module(d)) => *d,
        Some(_) => {
            return Err(BvError::KindError {
                name: env.interner.resolve(name).to_string(),
                expected: "module",
                found: "declaration",
                span,
            })
        }
        None => return Err(BvError::NameError {
            name: env.interner.resolve(name).to_string(),
            span,
        }),
    };

    let folded = match_args(&decl.params, args, caller_scope, &tables.scopes, env.interner)?;
    let key: InstKey = (name, folded.clone());
    if let Some(&id) = tables.module_memo.get(&key) {
        return Ok(id);
    }

    let mut guard = ActiveGuard::enter(active_modules, key.clone()).ok_or_else(|| {
        BvError::RecursiveInstantiation {
            name: env.interner.resolve(name).to_string(),
            span,
        }
    })?;

    let instance_scope = tables.scopes.create_scope(Some(env.root));
    let params: Vec<(Ident, i64)> = decl
        .params
        .iter()
        .map(|p| p.name)
        .zip(folded.iter().copied())
        .collect();
    for (pname, pval) in &params {
        tables.scopes.add(instance_scope, *pname, ScopeEntry::Const(*pval));
    }

    let mut ports = Vec::new();
    for port in &decl.ports {
        let ty = elaborate_type(&port.ty, instance_scope, active_interfaces, tables, env)?;
        tables
            .scopes
            .add(instance_scope, port.name, ScopeEntry::Port(ty.clone()));
        ports.push(ResolvedPort {
            dir: port.dir,
            name: port.name,
            ty,
            span: port.span,
        });
    }

    let result = elaborate_module_body(
        decl,
        name,
        instance_scope,
        guard.set_mut(),
        active_interfaces,
        tables,
        env,
    );
    drop(guard);
    let (signals, insts, always, on) = result?;

    let instance = ModuleInstance {
        decl,
        params,
        ports,
        signals,
        insts,
        always,
        on,
    };
    let id = tables.module_instances.alloc(instance);
    tables.module_memo.insert(key, id);
    Ok(id)
}

type ModuleBody<'ast> = (
    Vec<ResolvedSignal<'ast>>,
    Vec<InstInst<'ast>>,
    Vec<TypedAlways<'ast>>,
    Vec<TypedOn<'ast>>,
);

/// Elaborates every `def` bound to `decl.name` in three ordered sub-passes
/// (§4.4): first materialise every signal/inst declaration (so later defs
/// can reference an earlier def's instance), then elaborate port maps
/// against the now-complete scope, then elaborate `always`/`on` bodies.
fn elaborate_module_body<'ast>(
    decl: &'ast bv_ast::ModuleDecl,
    name: Ident,
    instance_scope: ScopeId,
    active_modules: &mut HashSet<InstKey>,
    active_interfaces: &mut HashSet<InstKey>,
    tables: &mut Tables<'ast>,
    env: &Env<'ast, '_>,
) -> Result<ModuleBody<'ast>, BvError> {
    let defs: Vec<&'ast DefDecl> = env.defs_by_module.get(&name).cloned().unwrap_or_default();
    let mut def_scopes = Vec::with_capacity(defs.len());
    let mut signals = Vec::new();
    let mut insts: Vec<InstInst<'ast>> = Vec::new();

    // Sub-pass 1: signals and sub-instantiations.
    for def in &defs {
        let def_scope = tables.scopes.create_scope(Some(instance_scope));
        def_scopes.push(def_scope);
        for item in &def.items {
            match item {
                DefItem::Signal(sig) => {
                    let ty = elaborate_type(&sig.ty, def_scope, active_interfaces, tables, env)?;
                    tables
                        .scopes
                        .add(def_scope, sig.name, ScopeEntry::Signal(ty.clone()));
                    signals.push(ResolvedSignal {
                        name: sig.name,
                        ty,
                        span: sig.span,
                    });
                }
                DefItem::Inst(inst) => {
                    // `inst` always instantiates with no arguments — the
                    // AST's `InstDecl` carries no parameter-argument list at
                    // all, so this is a structural fact, not a runtime check.
                    let target = instantiate_module(
                        active_modules,
                        active_interfaces,
                        tables,
                        env,
                        inst.module,
                        &[],
                        def_scope,
                        inst.span,
                    )?;
                    tables.scopes.add(def_scope, inst.name, ScopeEntry::Inst(target));
                    insts.push(InstInst {
                        name: inst.name,
                        target,
                        port_maps: Vec::new(),
                        span: inst.span,
                    });
                }
                DefItem::Always(_) | DefItem::On(_) => {}
            }
        }
    }

    // Sub-pass 2: port maps, now that every sub-instance exists.
    let mut inst_idx = 0usize;
    for (def, def_scope) in defs.iter().zip(def_scopes.iter().copied()) {
        for item in &def.items {
            if let DefItem::Inst(inst) = item {
                let target = insts[inst_idx].target;
                let mut port_maps = Vec::with_capacity(inst.port_maps.len());
                for map in &inst.port_maps {
                    tables
                        .module_instances
                        .get(target)
                        .find_port(map.target)
                        .ok_or_else(|| BvError::NameError {
                            name: env.interner.resolve(map.target).to_string(),
                            span: map.span,
                        })?;
                    // No context-sensitive RHS conversion here: §4.4 scopes
                    // that retyping to the assignment statement alone (the
                    // original's `_inst_expr` elaborates a port-map source
                    // with no conversion either).
                    let source = elaborate_expr(&map.source, def_scope, active_interfaces, tables, env)?;
                    port_maps.push(ResolvedPortMap {
                        target: map.target,
                        source,
                        span: map.span,
                    });
                }
                insts[inst_idx].port_maps = port_maps;
                inst_idx += 1;
            }
        }
    }

    // Sub-pass 3: process bodies.
    let mut always = Vec::new();
    let mut on = Vec::new();
    for (def, def_scope) in defs.iter().zip(def_scopes.iter().copied()) {
        for item in &def.items {
            match item {
                DefItem::Always(a) => {
                    let body = elaborate_stmts(&a.body, def_scope, active_interfaces, tables, env)?;
                    always.push(TypedAlways { body, span: a.span });
                }
                DefItem::On(o) => {
                    let body = elaborate_stmts(&o.body, def_scope, active_interfaces, tables, env)?;
                    on.push(TypedOn {
                        specs: o.specs.clone(),
                        body,
                        span: o.span,
                    });
                }
                DefItem::Signal(_) | DefItem::Inst(_) => {}
            }
        }
    }

    Ok((signals, insts, always, on))
}

/// Elaborates a statement body in order, threading the scope through
/// nested `if`/`switch` blocks.
fn elaborate_stmts<'ast>(
    stmts: &'ast [Stmt],
    scope_id: ScopeId,
    active_interfaces: &mut HashSet<InstKey>,
    tables: &mut Tables<'ast>,
    env: &Env<'ast, '_>,
) -> Result<Vec<TypedStmt<'ast>>, BvError> {
    stmts
        .iter()
        .map(|stmt| elaborate_stmt(stmt, scope_id, active_interfaces, tables, env))
        .collect()
}

fn elaborate_stmt<'ast>(
    stmt: &'ast Stmt,
    scope_id: ScopeId,
    active_interfaces: &mut HashSet<InstKey>,
    tables: &mut Tables<'ast>,
    env: &Env<'ast, '_>,
) -> Result<TypedStmt<'ast>, BvError> {
    match stmt {
        Stmt::Assign {
            lhs,
            rhs,
            delayed,
            span,
        } => {
            let lhs_t = elaborate_expr(lhs, scope_id, active_interfaces, tables, env)?;
            let rhs_t = elaborate_expr(rhs, scope_id, active_interfaces, tables, env)?;
            let rhs_t = convert_rhs(rhs_t, &lhs_t.ty().clone(), *span, env.interner)?;
            Ok(TypedStmt::Assign {
                lhs: lhs_t,
                rhs: rhs_t,
                delayed: *delayed,
                span: *span,
            })
        }
        Stmt::If {
            cond,
            then_body,
            else_body,
            span,
        } => {
            let cond_t = elaborate_expr(cond, scope_id, active_interfaces, tables, env)?;
            let then_t = elaborate_stmts(then_body, scope_id, active_interfaces, tables, env)?;
            let else_t = match else_body {
                Some(body) => elaborate_stmts(body, scope_id, active_interfaces, tables, env)?,
                None => Vec::new(),
            };
            Ok(TypedStmt::If {
                cond: cond_t,
                then_body: then_t,
                else_body: else_t,
                span: *span,
            })
        }
        Stmt::Switch { value, cases, span } => {
            let value_t = elaborate_expr(value, scope_id, active_interfaces, tables, env)?;
            let mut typed_cases = Vec::with_capacity(cases.len());
            for case in cases {
                // No context-sensitive conversion against the switched-on
                // value's type: §4.4 scopes that retyping to the assignment
                // statement alone (the original's `_inst_expr` elaborates
                // each `case.value` with no conversion either).
                let case_value = elaborate_expr(&case.value, scope_id, active_interfaces, tables, env)?;
                let body = elaborate_stmts(&case.body, scope_id, active_interfaces, tables, env)?;
                typed_cases.push(CaseArm {
                    value: case_value,
                    body,
                    span: case.span,
                });
            }
            Ok(TypedStmt::Switch {
                value: value_t,
                cases: typed_cases,
                span: *span,
            })
        }
    }
}

/// Elaborates a single expression node, without any context-sensitive
/// retyping (that only happens to an assignment's RHS, via `convert_rhs`).
/// §4.4 lists `call-expr` only under the constant evaluator, never
/// under general expression elaboration: a `log2(...)` call may only appear
/// in a constant-fold position (a parameter argument or an array/slice
/// bound), never as a statement-level value.
fn elaborate_expr<'ast>(
    expr: &'ast Expr,
    scope_id: ScopeId,
    active_interfaces: &mut HashSet<InstKey>,
    tables: &mut Tables<'ast>,
    env: &Env<'ast, '_>,
) -> Result<TypedExpr<'ast>, BvError> {
    match expr {
        Expr::Binary { lhs, rhs, op, span } => {
            let l = elaborate_expr(lhs, scope_id, active_interfaces, tables, env)?;
            let r = elaborate_expr(rhs, scope_id, active_interfaces, tables, env)?;
            Ok(TypedExpr::Binary {
                lhs: Box::new(l),
                rhs: Box::new(r),
                op: *op,
                ty: ExprType::Arith,
                span: *span,
            })
        }
        Expr::Unary { arg, op, span } => {
            let a = elaborate_expr(arg, scope_id, active_interfaces, tables, env)?;
            let ty = match op {
                UnOp::Neg => a.ty().clone(),
                UnOp::Not => ExprType::Arith,
            };
            Ok(TypedExpr::Unary {
                arg: Box::new(a),
                op: *op,
                ty,
                span: *span,
            })
        }
        Expr::Cast {
            ty: target_ty,
            expr: inner,
            span,
        } => {
            let resolved = elaborate_type(target_ty, scope_id, active_interfaces, tables, env)?;
            // The inner expression keeps its own elaborated type unconverted
            // here: §4.4 scopes the context-sensitive RHS conversion to the
            // assignment statement alone (the original's cast handling
            // wraps the resolved type around the inner expression's
            // unconverted type too).
            let inner_t = elaborate_expr(inner, scope_id, active_interfaces, tables, env)?;
            let target = ExprType::from_resolved(resolved);
            Ok(TypedExpr::Cast {
                expr: Box::new(inner_t),
                ty: target,
                span: *span,
            })
        }
        Expr::Member {
            expr: inner,
            member,
            span,
        } => {
            let inner_t = elaborate_expr(inner, scope_id, active_interfaces, tables, env)?;
            let port = match inner_t.ty() {
                ExprType::IntfInst(id) => tables
                    .interface_instances
                    .get(*id)
                    .find_port(*member)
                    .cloned(),
                ExprType::ModuleInst(id) => tables
                    .module_instances
                    .get(*id)
                    .find_port(*member)
                    .cloned(),
                _ => {
                    return Err(BvError::TypeError {
                        message: "member access requires an interface- or module-instance"
                            .to_string(),
                        span: *span,
                    })
                }
            };
            let port = port.ok_or_else(|| BvError::NameError {
                name: env.interner.resolve(*member).to_string(),
                span: *span,
            })?;
            Ok(TypedExpr::Member {
                expr: Box::new(inner_t),
                member: *member,
                ty: ExprType::from_resolved(port.ty),
                span: *span,
            })
        }
        Expr::Slice {
            expr: inner,
            lower,
            upper,
            span,
        } => {
            let inner_t = elaborate_expr(inner, scope_id, active_interfaces, tables, env)?;
            let (sub, arr_left, arr_right) = match inner_t.ty() {
                ExprType::Array {
                    subtype,
                    left,
                    right,
                } => (subtype.as_ref().clone(), *left, *right),
                _ => {
                    return Err(BvError::TypeError {
                        message: "slice requires an array-typed expression".to_string(),
                        span: *span,
                    })
                }
            };
            let lower_v = const_eval::evaluate(lower, scope_id, &tables.scopes, env.interner)?;
            let upper_v = const_eval::evaluate(upper, scope_id, &tables.scopes, env.interner)?;
            let (lo, hi) = (arr_left.min(arr_right), arr_left.max(arr_right));
            if lower_v < lo || upper_v > hi || lower_v > upper_v {
                return Err(BvError::BoundsError {
                    upper: upper_v,
                    lower: lower_v,
                    span: *span,
                });
            }
            Ok(TypedExpr::Slice {
                expr: Box::new(inner_t),
                lower: lower_v,
                upper: upper_v,
                ty: ExprType::Array {
                    subtype: Box::new(sub),
                    left: upper_v,
                    right: lower_v,
                },
                span: *span,
            })
        }
        Expr::Subscript {
            expr: inner,
            index,
            span,
        } => {
            let inner_t = elaborate_expr(inner, scope_id, active_interfaces, tables, env)?;
            let sub = match inner_t.ty() {
                ExprType::Array { subtype, .. } => subtype.as_ref().clone(),
                _ => {
                    return Err(BvError::TypeError {
                        message: "subscript requires an array-typed expression".to_string(),
                        span: *span,
                    })
                }
            };
            let index_t = elaborate_expr(index, scope_id, active_interfaces, tables, env)?;
            if !matches!(index_t.ty(), ExprType::Int | ExprType::Arith) {
                return Err(BvError::TypeError {
                    message: "subscript index must be integer-typed".to_string(),
                    span: *span,
                });
            }
            Ok(TypedExpr::Subscript {
                expr: Box::new(inner_t),
                index: Box::new(index_t),
                ty: sub,
                span: *span,
            })
        }
        Expr::Call { span, .. } => Err(BvError::TypeError {
            message: "a function call is only permitted in a constant-folding position \
                      (a parameter argument or an array/slice bound)"
                .to_string(),
            span: *span,
        }),
        Expr::Ref { name, span } => match tables.scopes.lookup(scope_id, *name) {
            Some(ScopeEntry::Const(_)) => Ok(TypedExpr::Ref {
                name: *name,
                ty: ExprType::Int,
                span: *span,
            }),
            Some(ScopeEntry::Signal(ty)) => Ok(TypedExpr::Ref {
                name: *name,
                ty: ExprType::from_resolved(ty.clone()),
                span: *span,
            }),
            Some(ScopeEntry::Port(ty)) => Ok(TypedExpr::Ref {
                name: *name,
                ty: ExprType::from_resolved(ty.clone()),
                span: *span,
            }),
            Some(ScopeEntry::Inst(id)) => Ok(TypedExpr::Ref {
                name: *name,
                ty: ExprType::ModuleInst(*id),
                span: *span,
            }),
            Some(_) => Err(BvError::KindError {
                name: env.interner.resolve(*name).to_string(),
                expected: "signal, port, constant, or instance",
                found: "declaration",
                span: *span,
            }),
            None => Err(BvError::NameError {
                name: env.interner.resolve(*name).to_string(),
                span: *span,
            }),
        },
        Expr::Atom { name, span } => Ok(TypedExpr::Atom {
            name: *name,
            ty: ExprType::Atom,
            span: *span,
        }),
        Expr::Num { value, span } => Ok(TypedExpr::Num {
            value: *value,
            ty: ExprType::Int,
            span: *span,
        }),
        Expr::SizedNum {
            width,
            digits,
            span,
        } => Ok(TypedExpr::SizedNum {
            width: *width,
            digits: digits.clone(),
            ty: ExprType::Int,
            span: *span,
        }),
        Expr::Set { items, span } => Ok(TypedExpr::Set {
            items: items.clone(),
            ty: ExprType::SetLit,
            span: *span,
        }),
    }
}

/// Applies §4.4's three context-sensitive RHS conversions against `target`,
/// the already-elaborated assignment LHS's type. Any `TypedExpr` whose type
/// is not one of the three sentinel literal forms passes through unchanged
/// — this is where a structural `'x` becomes an [`TypedExpr::XDontCare`], an
/// atom becomes an [`TypedExpr::EnumCode`], and a set literal becomes a
/// [`TypedExpr::SetMask`].
fn convert_rhs<'ast>(
    expr: TypedExpr<'ast>,
    target: &ExprType<'ast>,
    span: Span,
    interner: &Interner,
) -> Result<TypedExpr<'ast>, BvError> {
    match &expr {
        TypedExpr::Atom { name, .. } => {
            // The `'x` structural don't-care is only meaningful against an
            // interface-instance-typed target, and only for the literal
            // atom named `x` — any other atom assigned to a structurally
            // typed target is a type error, not a silent don't-care.
            if let ExprType::IntfInst(id) = target {
                if interner.resolve(*name) == "x" {
                    return Ok(TypedExpr::XDontCare {
                        ty: ExprType::IntfInst(*id),
                        span,
                    });
                }
                return Err(BvError::TypeError {
                    message: "only the 'x' atom may be assigned to an interface-instance-typed \
                              target"
                        .to_string(),
                    span,
                });
            }
            if let ExprType::Enum(decl) = target {
                let idx = decl.atoms.iter().position(|a| a == name);
                return match idx {
                    Some(i) => Ok(TypedExpr::EnumCode {
                        value_index: i as i64,
                        ty: ExprType::Enum(decl),
                        span,
                    }),
                    None => Err(BvError::TypeError {
                        message: "atom is not a member of the target enum".to_string(),
                        span,
                    }),
                };
            }
            Err(BvError::TypeError {
                message: "an atom literal requires an enum- or interface-instance-typed target"
                    .to_string(),
                span,
            })
        }
        TypedExpr::Set { items, .. } => match target {
            ExprType::Set(decl) => {
                let mut bits = vec![false; decl.atoms.len()];
                for item in items {
                    let idx = decl.atoms.iter().position(|a| a == item).ok_or_else(|| {
                        BvError::TypeError {
                            message: "set literal contains an atom outside the target enum"
                                .to_string(),
                            span,
                        }
                    })?;
                    bits[idx] = true;
                }
                Ok(TypedExpr::SetMask {
                    bits,
                    ty: ExprType::Set(decl),
                    span,
                })
            }
            _ => Err(BvError::TypeError {
                message: "a set literal requires a set-typed target".to_string(),
                span,
            }),
        },
        _ => Ok(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_ast::{Dir as AstDir, ModuleDecl, ParamDecl, PortDecl};
    use bv_source::Span;

    fn s() -> Span {
        Span::DUMMY
    }

    fn num(v: i64) -> Expr {
        Expr::Num { value: v, span: s() }
    }

    #[test]
    fn active_guard_blocks_reentry_and_releases_on_drop() {
        let mut set: HashSet<(u32, Vec<i64>)> = HashSet::new();
        let key = (1u32, vec![4]);
        {
            let guard = ActiveGuard::enter(&mut set, key.clone());
            assert!(guard.is_some());
            assert!(set.contains(&key));
            assert!(ActiveGuard::enter(&mut set, key.clone()).is_none());
        }
        assert!(!set.contains(&key));
    }

    #[test]
    fn match_args_binds_positional_then_keyword() {
        let interner = Interner::new();
        let mut scopes = ScopeArena::new();
        let scope = scopes.create_scope(None);
        let w = interner.get_or_intern("w");
        let h = interner.get_or_intern("h");
        let params = vec![
            ParamDecl {
                name: w,
                ty: TypeExpr::Bit(s()),
                span: s(),
            },
            ParamDecl {
                name: h,
                ty: TypeExpr::Bit(s()),
                span: s(),
            },
        ];
        let args = vec![
            Arg {
                kw_name: None,
                value: num(8),
                span: s(),
            },
            Arg {
                kw_name: Some(h),
                value: num(16),
                span: s(),
            },
        ];
        let folded = match_args(&params, &args, scope, &scopes, &interner).unwrap();
        assert_eq!(folded, vec![8, 16]);
    }

    #[test]
    fn match_args_missing_parameter_errors() {
        let interner = Interner::new();
        let scopes = ScopeArena::new();
        let w = interner.get_or_intern("w");
        let params = vec![ParamDecl {
            name: w,
            ty: TypeExpr::Bit(s()),
            span: s(),
        }];
        let err = match_args(&params, &[], ScopeId::from_raw(0), &scopes, &interner).unwrap_err();
        assert!(matches!(err, BvError::EvalError { .. }));
    }

    #[test]
    fn instantiate_module_memoises_identical_parameters() {
        let interner = Interner::new();
        let top = interner.get_or_intern("top");
        let module = ModuleDecl {
            name: top,
            params: vec![],
            ports: vec![],
            span: s(),
        };
        let unit = bv_ast::Unit {
            decls: vec![bv_ast::TopDecl::Module(module)],
            span: s(),
        };
        let units = vec![unit];
        let prepass = crate::sema::prepass(&units, &interner).unwrap();
        let mut ctx = ElaborationContext::new(prepass, &interner);
        let id1 = ctx.instantiate_module(top, &[], s()).unwrap();
        let id2 = ctx.instantiate_module(top, &[], s()).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(ctx.tables.module_instances.len(), 1);
    }

    #[test]
    fn instantiate_module_detects_self_recursive_inst() {
        let interner = Interner::new();
        let top = interner.get_or_intern("top");
        let module = ModuleDecl {
            name: top,
            params: vec![],
            ports: vec![],
            span: s(),
        };
        let def = DefDecl {
            name: top,
            items: vec![DefItem::Inst(bv_ast::InstDecl {
                name: interner.get_or_intern("u0"),
                module: top,
                port_maps: vec![],
                span: s(),
            })],
            span: s(),
        };
        let unit = bv_ast::Unit {
            decls: vec![bv_ast::TopDecl::Module(module), bv_ast::TopDecl::Def(def)],
            span: s(),
        };
        let units = vec![unit];
        let prepass = crate::sema::prepass(&units, &interner).unwrap();
        let mut ctx = ElaborationContext::new(prepass, &interner);
        let err = ctx.instantiate_module(top, &[], s()).unwrap_err();
        assert!(matches!(err, BvError::RecursiveInstantiation { .. }));
    }

    #[test]
    fn module_with_port_and_signal_elaborates() {
        let interner = Interner::new();
        let top = interner.get_or_intern("top");
        let clk = interner.get_or_intern("clk");
        let acc = interner.get_or_intern("acc");
        let module = ModuleDecl {
            name: top,
            params: vec![],
            ports: vec![PortDecl {
                dir: AstDir::In,
                name: clk,
                ty: TypeExpr::Bit(s()),
                span: s(),
            }],
            span: s(),
        };
        let def = DefDecl {
            name: top,
            items: vec![DefItem::Signal(bv_ast::SignalDecl {
                name: acc,
                ty: TypeExpr::Bit(s()),
                span: s(),
            })],
            span: s(),
        };
        let unit = bv_ast::Unit {
            decls: vec![bv_ast::TopDecl::Module(module), bv_ast::TopDecl::Def(def)],
            span: s(),
        };
        let units = vec![unit];
        let prepass = crate::sema::prepass(&units, &interner).unwrap();
        let mut ctx = ElaborationContext::new(prepass, &interner);
        let id = ctx.instantiate_module(top, &[], s()).unwrap();
        let inst = ctx.tables.module_instances.get(id);
        assert_eq!(inst.ports.len(), 1);
        assert_eq!(inst.signals.len(), 1);
    }

    #[test]
    fn convert_rhs_atom_against_enum_becomes_enum_code() {
        let interner = Interner::new();
        let a = interner.get_or_intern("A");
        let b = interner.get_or_intern("B");
        let decl = bv_ast::EnumDecl {
            name: interner.get_or_intern("E"),
            atoms: vec![a, b],
            span: s(),
        };
        let atom = TypedExpr::Atom {
            name: b,
            ty: ExprType::Atom,
            span: s(),
        };
        let converted = convert_rhs(atom, &ExprType::Enum(&decl), s(), &interner).unwrap();
        match converted {
            TypedExpr::EnumCode { value_index, .. } => assert_eq!(value_index, 1),
            other => panic!("expected EnumCode, got {other:?}"),
        }
    }

    #[test]
    fn convert_rhs_set_literal_becomes_bitmask() {
        let interner = Interner::new();
        let a = interner.get_or_intern("A");
        let b = interner.get_or_intern("B");
        let decl = bv_ast::EnumDecl {
            name: interner.get_or_intern("E"),
            atoms: vec![a, b],
            span: s(),
        };
        let set = TypedExpr::Set {
            items: vec![b],
            ty: ExprType::SetLit,
            span: s(),
        };
        let converted = convert_rhs(set, &ExprType::Set(&decl), s(), &interner).unwrap();
        match converted {
            TypedExpr::SetMask { bits, .. } => assert_eq!(bits, vec![false, true]),
            other => panic!("expected SetMask, got {other:?}"),
        }
    }

    #[test]
    fn convert_rhs_x_atom_against_interface_becomes_dont_care() {
        let interner = Interner::new();
        let x = interner.get_or_intern("x");
        let atom = TypedExpr::Atom {
            name: x,
            ty: ExprType::Atom,
            span: s(),
        };
        let id = InterfaceInstanceId::from_raw(0);
        let converted = convert_rhs(atom, &ExprType::IntfInst(id), s(), &interner).unwrap();
        assert!(matches!(converted, TypedExpr::XDontCare { .. }));
    }

    #[test]
    fn convert_rhs_non_x_atom_against_interface_is_type_error() {
        let interner = Interner::new();
        let foo = interner.get_or_intern("foo");
        let atom = TypedExpr::Atom {
            name: foo,
            ty: ExprType::Atom,
            span: s(),
        };
        let id = InterfaceInstanceId::from_raw(0);
        let err = convert_rhs(atom, &ExprType::IntfInst(id), s(), &interner).unwrap_err();
        assert!(matches!(err, BvError::TypeError { .. }));
    }

    #[test]
    fn slice_out_of_bounds_is_bounds_error() {
        let interner = Interner::new();
        let mut tables = Tables::new(ScopeArena::new());
        let root = tables.scopes.create_scope(None);
        let defs_by_module = HashMap::new();
        let env = Env {
            interner: &interner,
            root,
            defs_by_module: &defs_by_module,
        };
        let mut active_interfaces = HashSet::new();
        let data = interner.get_or_intern("data");
        tables.scopes.add(
            root,
            data,
            ScopeEntry::Signal(Type::Array {
                subtype: Box::new(Type::Bit),
                left: 7,
                right: 0,
            }),
        );
        let slice = Expr::Slice {
            expr: Box::new(Expr::Ref { name: data, span: s() }),
            lower: Box::new(num(0)),
            upper: Box::new(num(9)),
            span: s(),
        };
        let err = elaborate_expr(&slice, root, &mut active_interfaces, &mut tables, &env)
            .unwrap_err();
        assert!(matches!(err, BvError::BoundsError { .. }));
    }
}

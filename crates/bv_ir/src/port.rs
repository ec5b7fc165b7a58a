//! Flat-port expansion (§4.4): turning a single, possibly structured BV
//! port into the scalar Verilog ports/leaf-assignments an emitter or the
//! elaborator's `'x` expansion needs.
//!
//! Factored once here so both call sites the design notes (§9) require —
//! the elaborator (for structural `'x` expansion) and an eventual emitter
//! (for port lists) — share the exact same recursion instead of drifting
//! apart. This module never resolves an [`Ident`] to text: the interner
//! lives in `bv_common` and is reachable from every caller, so a leaf's
//! mangled name is built lazily from its `path` wherever one is actually
//! printed.

use bv_ast::Dir;
use bv_common::Ident;

use crate::arena::Arena;
use crate::ids::InterfaceInstanceId;
use crate::interface::InterfaceInstance;
use crate::types::Type;

/// A single scalar leaf produced by expanding a structured port.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatPort {
    /// `true` for an output leaf, `false` for an input leaf.
    pub is_output: bool,
    /// The name path from the outer port down to this leaf, e.g. `[p,
    /// data]` for the `data` member of an interface-typed port `p`. Joined
    /// with `__` by a caller holding the interner, this is the mangled flat
    /// name (`p__data`).
    pub path: Vec<Ident>,
    /// Bit ranges, one per array dimension traversed to reach this leaf,
    /// outermost first. Empty for a scalar bit.
    pub bit_ranges: Vec<(i64, i64)>,
}

/// Recursively expands a single named, directed, typed port into its flat
/// scalar leaves.
///
/// `interfaces` resolves an [`InterfaceInstanceId`] to its flattened member
/// port list, since an interface-typed port may itself contain interface-
/// typed members.
pub fn expand_port(
    name: Ident,
    dir: Dir,
    ty: &Type<'_>,
    interfaces: &Arena<InterfaceInstanceId, InterfaceInstance<'_>>,
) -> Vec<FlatPort> {
    expand(vec![name], dir, ty, &[], interfaces)
}

fn expand(
    path: Vec<Ident>,
    dir: Dir,
    ty: &Type<'_>,
    outer_ranges: &[(i64, i64)],
    interfaces: &Arena<InterfaceInstanceId, InterfaceInstance<'_>>,
) -> Vec<FlatPort> {
    match ty {
        Type::Bit => vec![FlatPort {
            is_output: dir == Dir::Out,
            path,
            bit_ranges: outer_ranges.to_vec(),
        }],
        Type::Array {
            subtype,
            left,
            right,
        } => {
            let mut ranges = outer_ranges.to_vec();
            ranges.push((*left, *right));
            expand(path, dir, subtype, &ranges, interfaces)
        }
        Type::IntfInst(id) => {
            let inst = interfaces.get(*id);
            let mut out = Vec::new();
            for member in &inst.ports {
                let mut member_path = path.clone();
                member_path.push(member.name);
                out.extend(expand(
                    member_path,
                    member.dir,
                    &member.ty,
                    outer_ranges,
                    interfaces,
                ));
            }
            out
        }
        Type::Enum(decl) => {
            let width = Type::enum_code_width(decl);
            let mut ranges = outer_ranges.to_vec();
            if width > 0 {
                ranges.push((width as i64 - 1, 0));
            }
            vec![FlatPort {
                is_output: dir == Dir::Out,
                path,
                bit_ranges: ranges,
            }]
        }
        Type::Set(decl) => {
            let width = decl.atoms.len() as i64;
            let mut ranges = outer_ranges.to_vec();
            if width > 0 {
                ranges.push((width - 1, 0));
            }
            vec![FlatPort {
                is_output: dir == Dir::Out,
                path,
                bit_ranges: ranges,
            }]
        }
    }
}

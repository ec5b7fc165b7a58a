//! Strongly-typed shape of a `bv.toml` project descriptor, deserialized
//! directly from TOML with `serde`.

use serde::Deserialize;

/// A parsed `bv.toml` project descriptor.
///
/// Trimmed to the fields a BV project actually needs: there is no physical
/// device to target, so this carries no `targets`/`pins`/`constraints`/
/// `clocks` sections — BV has no notion of a device family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
}

/// Core project metadata required in every `bv.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectMeta {
    /// The project's human-readable name.
    pub name: String,
    /// The default entry-point specification, e.g. `"top(8)"`.
    #[serde(default)]
    pub entry: String,
    /// Directories searched for `.bv` source files.
    #[serde(default)]
    pub search_paths: Vec<String>,
}

//! # evs-cli — Command-Line Interface
//!
//! ```bash
//! evs validate events/user_event.json --queue valid-events-queue
//! evs ddl --table-config config/tb_user.yaml --out-dir out/
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; behaviour lives in the library crates.
//! - Handlers return an exit code; unexpected failures bubble up as
//!   `anyhow::Error` and are reported once by `main`.
//! - Flags win over environment variables, which win over built-in defaults.

pub mod ddl;
pub mod logging;
pub mod validate;

use std::path::{Path, PathBuf};

use evs_core::SchemaNode;

/// Schema used when neither `--schema` nor `EVS_SCHEMA` is given.
pub const DEFAULT_SCHEMA_PATH: &str = "schemas/event.schema.json";

/// Resolve a path that may be relative to the repository root.
///
/// Absolute paths are returned as-is. A relative path that exists under
/// `repo_root` resolves there; otherwise it stays relative to the current
/// directory.
pub fn resolve_path(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let repo_relative = repo_root.join(path);
    if repo_relative.exists() {
        repo_relative
    } else {
        path.to_path_buf()
    }
}

/// Load the schema at `path` (or the default), or `None` when it cannot be
/// used. The loader has already logged why.
pub fn load_schema_or_none(path: Option<&Path>, repo_root: &Path) -> Option<SchemaNode> {
    let path = resolve_path(
        path.unwrap_or_else(|| Path::new(DEFAULT_SCHEMA_PATH)),
        repo_root,
    );
    evs_core::load_schema(&path).ok()
}

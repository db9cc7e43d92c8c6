//! Deployment functions used across test cases.

use std::path::PathBuf;

/// Find the project root via the crate root provided by `cargo test`.
/// This depends on the convention that all our crates live in `/crates/<group>/<name>`.
pub fn get_path_from_project_root(deployment_path: &str) -> PathBuf {
    let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    d.push("../../../");
    d.push(deployment_path);
    d
}

//! Paths command handler.

use anyhow::Result;
use lector_core::ResolvedPaths;

/// Print every resolved data path.
pub fn execute(data_dir: Option<&str>, library_dir: Option<&str>) -> Result<()> {
    let paths = ResolvedPaths::resolve_with(data_dir, library_dir)?;
    println!("{paths}");
    Ok(())
}

use std::path::Path;

use anyhow::Context;
use dotpdb::prelude::{JsonDecompiler, ModuleInfo, PortablePdb};

/// Load the module view of a .NET assembly.
pub fn load_module(path: &Path) -> anyhow::Result<ModuleInfo> {
    ModuleInfo::from_file(path)
        .with_context(|| format!("failed to load assembly: {}", path.display()))
}

/// Load a decompiled-source manifest.
pub fn load_manifest(path: &Path) -> anyhow::Result<JsonDecompiler> {
    JsonDecompiler::from_file(path)
        .with_context(|| format!("failed to load manifest: {}", path.display()))
}

/// Read and parse a Portable PDB.
pub fn load_pdb(path: &Path) -> anyhow::Result<PortablePdb> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read: {}", path.display()))?;
    PortablePdb::parse(&data)
        .with_context(|| format!("not a Portable PDB: {}", path.display()))
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}

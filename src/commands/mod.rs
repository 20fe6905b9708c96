//! CLI subcommand implementations
//!
//! Each subcommand lives in its own module with a `clap::Args` struct and an
//! `execute` function. Shared here: assembling the layer provider every
//! command reads through.

pub mod compose;
pub mod tree;
pub mod validate;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ifcx_core::provider::{
    FetchLayerProvider, FileFetchOperations, InMemoryLayerProvider, StackedLayerProvider,
};

/// Build the provider stack used by every subcommand.
///
/// Priority order: an in-memory provider preloaded from the optional deps
/// directory (keyed by each layer's declared identity, so canonical URIs
/// resolve offline), then a file-backed fetching provider rooted next to
/// the entry file, with an optional URI redirection table.
pub fn build_provider(
    entry: &Path,
    deps: Option<&Path>,
    import_map: Option<&Path>,
) -> Result<StackedLayerProvider> {
    let mut stacked = StackedLayerProvider::new();

    if let Some(deps_dir) = deps {
        let preloaded = InMemoryLayerProvider::from_directory(deps_dir)
            .with_context(|| format!("failed to load layers from {}", deps_dir.display()))?;
        stacked.push(Box::new(preloaded));
    }

    let redirects = match import_map {
        Some(path) => load_import_map(path)?,
        None => HashMap::new(),
    };
    let root = entry
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let fetcher = FileFetchOperations::with_root(root);
    stacked.push(Box::new(FetchLayerProvider::with_import_map(
        fetcher, redirects,
    )));

    Ok(stacked)
}

/// Read a JSON object mapping layer URIs to local candidate paths.
fn load_import_map(path: &Path) -> Result<HashMap<String, String>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read import map {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("invalid import map {}", path.display()))
}

/// The entry file's URI as passed to the provider stack: the literal path
/// string, which the file fetcher resolves as-is.
pub fn entry_uri(entry: &Path) -> String {
    entry.to_string_lossy().into_owned()
}

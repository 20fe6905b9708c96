//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the
//! transitive import graph of an entry layer in a hierarchical format.
//!
//! ## Functionality
//!
//! - **Import Graph Visualization**: Displays which layer imports which
//! - **Depth Control**: Supports `--depth` flag to limit tree depth
//! - **Deduplication Markers**: A layer already shown elsewhere in the tree
//!   is printed once with a reuse marker instead of being re-expanded
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::collections::HashSet;
use std::path::PathBuf;

use ifcx_core::provider::LayerProvider;

use super::{build_provider, entry_uri};

/// Print the transitive import graph of a layer
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Path to the entry layer file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Directory of offline layers consulted before fetching.
    #[arg(long, value_name = "DIR")]
    pub deps: Option<PathBuf>,

    /// JSON file mapping import URIs to local replacement paths.
    #[arg(long, value_name = "FILE")]
    pub import_map: Option<PathBuf>,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree.
    /// Use 0 to show only the entry layer, 1 to show its direct imports, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
///
/// Fetches the entry layer and walks its imports recursively, printing each
/// layer's declared identity and the URI it was requested under.
pub fn execute(args: TreeArgs) -> Result<()> {
    println!("🌳 Import graph for: {}", args.file.display());

    let provider = build_provider(
        &args.file,
        args.deps.as_deref(),
        args.import_map.as_deref(),
    )?;

    let mut visited = HashSet::new();
    let tree_root = build_tree_node(
        &provider,
        &entry_uri(&args.file),
        &mut visited,
        args.depth.unwrap_or(usize::MAX),
        0,
    )?;
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

/// Build a tree node for the layer at `uri`, recursing into its imports.
fn build_tree_node(
    provider: &dyn LayerProvider,
    uri: &str,
    visited: &mut HashSet<String>,
    max_depth: usize,
    current_depth: usize,
) -> Result<TreeNode> {
    let layer = provider
        .layer_by_uri(uri)
        .map_err(|e| anyhow::anyhow!("Failed to load layer {}: {}", uri, e))?;

    let first_visit = visited.insert(layer.header.id.clone());
    let label = if first_visit {
        format!("{} ({})", layer.header.id, uri)
    } else {
        format!("{} (already shown)", layer.header.id)
    };

    let expand = first_visit && current_depth < max_depth && !layer.imports.is_empty();
    let children = if expand {
        layer
            .imports
            .iter()
            .map(|import| {
                build_tree_node(provider, &import.uri, visited, max_depth, current_depth + 1)
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![]
    };

    Ok(TreeNode { label, children })
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}

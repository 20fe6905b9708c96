//! # Compose Command Implementation
//!
//! This module implements the `compose` subcommand, which resolves a layer
//! stack from an entry file and prints the fully composed tree.
//!
//! ## Functionality
//!
//! - **Stack Resolution**: Fetches the entry layer and its transitive
//!   imports through the provider stack.
//! - **Composition**: Federates, flattens, validates, and composes the
//!   layer list into one resolved tree.
//! - **Tree Visualization**: Prints the composed hierarchy, optionally
//!   scoped to a subtree and including attribute values.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::path::PathBuf;

use ifcx_core::compose::PostCompositionNode;
use ifcx_core::stack::LayerStack;

use super::{build_provider, entry_uri};

/// Resolve a layer stack and print the composed tree
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Path to the entry layer file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Directory of offline layers consulted before fetching.
    ///
    /// Every `*.ifcx` file under this directory is preloaded and served by
    /// its declared identity.
    #[arg(long, value_name = "DIR")]
    pub deps: Option<PathBuf>,

    /// JSON file mapping import URIs to local replacement paths.
    #[arg(long, value_name = "FILE")]
    pub import_map: Option<PathBuf>,

    /// Only print the subtree at this path (e.g. `site/building`).
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Include attribute values in the printed tree.
    #[arg(long)]
    pub attributes: bool,
}

/// Execute the `compose` command.
///
/// Resolves the entry file's transitive imports, composes the resulting
/// layer stack, and prints the resolved tree.
pub fn execute(args: ComposeArgs) -> Result<()> {
    let provider = build_provider(
        &args.file,
        args.deps.as_deref(),
        args.import_map.as_deref(),
    )?;

    let stack = LayerStack::open(&provider, &entry_uri(&args.file))?;
    println!(
        "🧩 Composed {} layer(s) from {}",
        stack.layers().len(),
        args.file.display()
    );

    let node = match &args.path {
        Some(path) => stack
            .tree()
            .descend(path)
            .ok_or_else(|| anyhow::anyhow!("no composed node at path \"{}\"", path))?,
        None => stack.tree(),
    };

    let tree_root = build_tree_node(node, args.attributes);
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

/// Build a printable tree node from a composed node.
fn build_tree_node(node: &PostCompositionNode, with_attributes: bool) -> TreeNode {
    let name = node.path.rsplit('/').next().unwrap_or("");
    let label = if name.is_empty() {
        "(root)".to_string()
    } else {
        name.to_string()
    };

    let mut children = Vec::new();
    if with_attributes {
        for (key, value) in &node.attributes {
            children.push(TreeNode {
                label: format!("{} = {}", key, value),
                children: vec![],
            });
        }
    }
    for child in node.children.values() {
        children.push(build_tree_node(child, with_attributes));
    }

    TreeNode { label, children }
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

//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks a layer
//! stack without printing the composed tree.
//!
//! ## Functionality
//!
//! - **Stack Resolution**: Fetches the entry layer and its transitive
//!   imports, reporting unresolvable imports.
//! - **Schema Validation**: Type-checks every flattened attribute against
//!   the effective schema table.
//! - **Cycle Detection**: Checks the dependency graph for inherit/children
//!   cycles and reports the discovered root candidates.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use ifcx_core::flatten::{federate, flatten};
use ifcx_core::graph::find_root_candidates;
use ifcx_core::schema::validate;
use ifcx_core::stack::resolve_layer_list;

use super::{build_provider, entry_uri};

/// Check a layer stack against its effective schema table
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the entry layer file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Directory of offline layers consulted before fetching.
    #[arg(long, value_name = "DIR")]
    pub deps: Option<PathBuf>,

    /// JSON file mapping import URIs to local replacement paths.
    #[arg(long, value_name = "FILE")]
    pub import_map: Option<PathBuf>,
}

/// Execute the `validate` command.
///
/// Runs every check of a full composition short of building the tree and
/// reports each stage's outcome.
pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("🔍 Validating layer stack: {}", args.file.display());

    let provider = build_provider(
        &args.file,
        args.deps.as_deref(),
        args.import_map.as_deref(),
    )?;

    // Stack resolution
    let layers = match resolve_layer_list(&provider, &entry_uri(&args.file)) {
        Ok(layers) => {
            println!("✅ Resolved {} layer(s)", layers.len());
            layers
        }
        Err(e) => {
            println!("❌ Stack resolution failed: {}", e);
            return Err(anyhow::anyhow!("Stack resolution failed: {}", e));
        }
    };

    let record_count: usize = layers.iter().map(|layer| layer.data.len()).sum();
    let federated = federate(&layers);
    let flattened = flatten(&federated);

    println!("\n📊 Stack Summary:");
    println!("   Layers: {}", layers.len());
    println!("   Override records: {}", record_count);
    println!("   Distinct paths: {}", flattened.len());
    println!("   Schemas: {}", federated.schemas.len());

    let mut has_errors = false;

    // Schema validation
    println!("\n🔍 Checking attributes against schemas...");
    match validate(&federated.schemas, &flattened) {
        Ok(()) => println!("✅ All attributes conform to their schemas"),
        Err(e) => {
            println!("❌ Schema violation: {}", e);
            has_errors = true;
        }
    }

    // Cycle detection and root discovery
    println!("\n🔄 Checking for dependency cycles...");
    match find_root_candidates(&flattened) {
        Ok(roots) => {
            println!("✅ No cycles detected");
            println!("   Root candidates: {}", roots.len());
            for root in &roots {
                println!("   - {}", root);
            }
        }
        Err(e) => {
            println!("❌ {}", e);
            has_errors = true;
        }
    }

    println!("\n🎯 Validation Result:");
    if has_errors {
        println!("❌ Layer stack has errors that must be fixed");
        return Err(anyhow::anyhow!("Layer stack validation failed"));
    }

    println!("✅ Layer stack is valid");
    Ok(())
}

//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `ifcx-core` crate. It uses the `thiserror` library to create a single
//! `Error` enum that covers all anticipated failure modes, providing clear
//! and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur while loading and composing a layer stack. Each variant
//!   corresponds to a specific type of error and includes contextual
//!   information to aid in debugging.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the crate to simplify function signatures.
//!
//! ## Propagation policy
//!
//! Lower-level components never swallow structural problems. A typed error
//! is returned upward and the caller either recovers by trying an
//! alternative (provider fallback, multi-candidate URI resolution) or
//! propagates it unchanged. Any fatal condition aborts the entire
//! load/compose operation; no partial tree is ever returned on failure.

use thiserror::Error;

/// Main error type for ifcx-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The node dependency graph (inherits + children edges) is cyclic.
    ///
    /// This is fatal: composition must not be attempted on a cyclic graph,
    /// even when the cycle is unreachable from the paths of interest.
    #[error("Cycle detected in node dependencies: {cycle}")]
    CycleDetected { cycle: String },

    /// An inherit or children target does not resolve to an existing node.
    ///
    /// Includes the full target path and the segment that failed to resolve.
    #[error("Unknown node referenced while resolving '{target}': missing segment '{segment}'")]
    UnknownReference { target: String, segment: String },

    /// An attribute value or shape violates its declared schema, or the
    /// schema id itself is undeclared.
    #[error("Schema validation error at '{path}' for attribute '{attribute}': {message}")]
    SchemaValidation {
        path: String,
        attribute: String,
        message: String,
    },

    /// No candidate source could supply the requested layer URI.
    ///
    /// Recoverable by a caller trying alternate providers, fatal if it
    /// reaches the top of a layer-stack build.
    #[error("Layer with id \"{uri}\" not found")]
    LayerNotFound { uri: String },

    /// Two layer documents with the same declared identity were given to an
    /// in-memory provider. This is a configuration error, not a soft result.
    #[error("Duplicate layer identity: \"{id}\"")]
    DuplicateLayer { id: String },

    /// Every provider in a stacked provider failed for the requested URI.
    ///
    /// Carries each sub-provider's individual failure.
    #[error("No provider could supply \"{uri}\": {}", failures.join("; "))]
    ProviderExhausted { uri: String, failures: Vec<String> },

    /// Single-root expansion was requested but the graph has no root
    /// candidate at all.
    #[error("No root candidates found in composed input")]
    NoRoots,

    /// An error indicating that a provider's internal cache lock has been
    /// poisoned by a panicking thread.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// A JSON parsing or serialization error, wrapped from `serde_json`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

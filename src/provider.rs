//! # Layer Providers
//!
//! This module defines the capability used to assemble a layer stack from a
//! single entry point: fetch a raw layer document by URI.
//!
//! ## Design
//!
//! The provider logic is separated from the concrete transport through the
//! `FetchOperations` trait, which defines the single external action the
//! engine needs: retrieve raw bytes at a URI. In the main application
//! `FileFetchOperations` reads local files (including `file://` URLs); in
//! tests the trait is replaced with mock implementations to simulate
//! retrieval failures without touching the filesystem or the network.
//! Network transports are collaborator-supplied implementations of the same
//! trait.
//!
//! Three provider variants exist:
//!
//! - **`InMemoryLayerProvider`**: a mapping keyed by each layer's own
//!   declared identity. Inserting a duplicate identity is a hard error.
//! - **`FetchLayerProvider`**: caches by *requested* URI and, on a miss,
//!   tries candidate URIs in order: a local import-map redirect first, the
//!   literal URI second. A candidate that fails to retrieve or parse is
//!   logged and skipped; only exhausting every candidate is an error.
//! - **`StackedLayerProvider`**: tries wrapped providers in priority order
//!   and aggregates every failure when all of them miss.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use indexmap::IndexMap;
use log::{debug, warn};
use url::Url;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::layer::IfcxFile;

/// Capability to fetch a raw layer document by URI.
pub trait LayerProvider {
    /// Retrieve the layer document for `uri`, or a not-found condition.
    fn layer_by_uri(&self, uri: &str) -> Result<IfcxFile>;
}

/// Trait for raw retrieval operations - allows mocking in tests
pub trait FetchOperations: Send + Sync {
    /// Retrieve the raw bytes at a URI.
    ///
    /// Retrieval failure must be reported distinctly from success; the
    /// calling provider decides whether it is fatal.
    fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

/// The default implementation of `FetchOperations`, reading layer documents
/// from the local filesystem. Plain paths and `file://` URLs are supported;
/// relative paths are resolved against an optional root directory.
pub struct FileFetchOperations {
    root: Option<PathBuf>,
}

impl FileFetchOperations {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Resolve relative URIs against `root`.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root: Some(root) }
    }

    fn resolve(&self, uri: &str) -> std::result::Result<PathBuf, std::io::Error> {
        if let Ok(url) = Url::parse(uri) {
            if url.scheme() == "file" {
                return url.to_file_path().map_err(|_| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("invalid file URL: {}", uri),
                    )
                });
            }
            if url.scheme().len() > 1 {
                // A real remote scheme; this fetcher only serves local files.
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    format!("unsupported URL scheme \"{}\" for {}", url.scheme(), uri),
                ));
            }
        }
        let path = PathBuf::from(uri);
        Ok(match (&self.root, path.is_relative()) {
            (Some(root), true) => root.join(path),
            _ => path,
        })
    }
}

impl Default for FileFetchOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchOperations for FileFetchOperations {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.resolve(uri)?;
        Ok(std::fs::read(path)?)
    }
}

/// In-memory provider keyed by each layer's own declared identity.
#[derive(Debug, Default)]
pub struct InMemoryLayerProvider {
    layers: IndexMap<String, IfcxFile>,
}

impl InMemoryLayerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer under its declared `header.id`.
    ///
    /// A duplicate identity is a configuration error, not a soft result.
    pub fn add_layer(&mut self, layer: IfcxFile) -> Result<()> {
        let id = layer.header.id.clone();
        if self.layers.contains_key(&id) {
            return Err(Error::DuplicateLayer { id });
        }
        self.layers.insert(id, layer);
        Ok(())
    }

    /// Build a provider holding the given layers.
    pub fn from_layers(layers: Vec<IfcxFile>) -> Result<Self> {
        let mut provider = Self::new();
        for layer in layers {
            provider.add_layer(layer)?;
        }
        Ok(provider)
    }

    /// Load every `*.ifcx` file under a directory into a provider.
    ///
    /// Matches the conventional `deps/` layout for offline standard layers.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let mut provider = Self::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_ifcx = entry
                .path()
                .extension()
                .map(|ext| ext == "ifcx")
                .unwrap_or(false);
            if !is_ifcx {
                continue;
            }
            debug!("loading layer from {}", entry.path().display());
            provider.add_layer(IfcxFile::from_file(entry.path())?)?;
        }
        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl LayerProvider for InMemoryLayerProvider {
    fn layer_by_uri(&self, uri: &str) -> Result<IfcxFile> {
        self.layers
            .get(uri)
            .cloned()
            .ok_or_else(|| Error::LayerNotFound {
                uri: uri.to_string(),
            })
    }
}

/// Remote-style provider that retrieves and parses documents on demand.
///
/// The cache is keyed by the *requested* URI, which is distinct from a
/// layer's declared identity: a URI can be redirected to a local candidate
/// before falling back to the literal URI.
pub struct FetchLayerProvider<F: FetchOperations> {
    fetcher: F,
    /// Local redirection table consulted before the literal URI.
    import_map: HashMap<String, String>,
    cache: Mutex<HashMap<String, IfcxFile>>,
}

impl<F: FetchOperations> FetchLayerProvider<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_import_map(fetcher, HashMap::new())
    }

    pub fn with_import_map(fetcher: F, import_map: HashMap<String, String>) -> Self {
        Self {
            fetcher,
            import_map,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Candidate URIs in attempt order: local redirect first, literal
    /// URI second.
    fn candidate_uris(&self, uri: &str) -> Vec<String> {
        let mut candidates = Vec::new();
        if let Some(local) = self.import_map.get(uri) {
            candidates.push(local.clone());
        }
        candidates.push(uri.to_string());
        candidates
    }

    fn fetch_and_parse(&self, candidate: &str) -> Result<IfcxFile> {
        let bytes = self.fetcher.fetch(candidate)?;
        IfcxFile::from_slice(&bytes)
    }
}

impl<F: FetchOperations> LayerProvider for FetchLayerProvider<F> {
    fn layer_by_uri(&self, uri: &str) -> Result<IfcxFile> {
        {
            let cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
                context: "fetch provider cache".to_string(),
            })?;
            if let Some(cached) = cache.get(uri) {
                return Ok(cached.clone());
            }
        }

        for candidate in self.candidate_uris(uri) {
            match self.fetch_and_parse(&candidate) {
                Ok(layer) => {
                    let mut cache = self.cache.lock().map_err(|_| Error::LockPoisoned {
                        context: "fetch provider cache".to_string(),
                    })?;
                    cache.insert(uri.to_string(), layer.clone());
                    return Ok(layer);
                }
                // Soft per-candidate failure: log and try the next one.
                Err(e) => {
                    warn!("failed to load {} from candidate {}: {}", uri, candidate, e);
                }
            }
        }

        Err(Error::LayerNotFound {
            uri: uri.to_string(),
        })
    }
}

/// Provider that tries several sub-providers in priority order.
#[derive(Default)]
pub struct StackedLayerProvider {
    providers: Vec<Box<dyn LayerProvider>>,
}

impl StackedLayerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, provider: Box<dyn LayerProvider>) {
        self.providers.push(provider);
    }

    pub fn with(mut self, provider: Box<dyn LayerProvider>) -> Self {
        self.push(provider);
        self
    }
}

impl LayerProvider for StackedLayerProvider {
    fn layer_by_uri(&self, uri: &str) -> Result<IfcxFile> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.layer_by_uri(uri) {
                Ok(layer) => return Ok(layer),
                Err(e) => failures.push(e.to_string()),
            }
        }
        Err(Error::ProviderExhausted {
            uri: uri.to_string(),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn layer(id: &str) -> IfcxFile {
        IfcxFile::new(id)
    }

    fn layer_bytes(id: &str) -> Vec<u8> {
        json!({"header": {"id": id}}).to_string().into_bytes()
    }

    /// Mock fetch operations serving canned byte responses.
    struct MockFetchOperations {
        responses: HashMap<String, Vec<u8>>,
        calls: AtomicUsize,
    }

    impl MockFetchOperations {
        fn new(responses: HashMap<String, Vec<u8>>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FetchOperations for MockFetchOperations {
        fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(uri)
                .cloned()
                .ok_or_else(|| Error::LayerNotFound {
                    uri: uri.to_string(),
                })
        }
    }

    // ========================================================================
    // InMemoryLayerProvider
    // ========================================================================

    #[test]
    fn test_in_memory_lookup() {
        let provider = InMemoryLayerProvider::from_layers(vec![layer("a"), layer("b")]).unwrap();
        assert_eq!(provider.layer_by_uri("a").unwrap().header.id, "a");
        assert!(matches!(
            provider.layer_by_uri("missing"),
            Err(Error::LayerNotFound { .. })
        ));
    }

    #[test]
    fn test_in_memory_duplicate_identity_is_hard_error() {
        let mut provider = InMemoryLayerProvider::new();
        provider.add_layer(layer("a")).unwrap();
        let err = provider.add_layer(layer("a")).unwrap_err();
        assert!(matches!(err, Error::DuplicateLayer { id } if id == "a"));
    }

    #[test]
    fn test_from_directory_loads_ifcx_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.ifcx"), layer_bytes("one")).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/two.ifcx"), layer_bytes("two")).unwrap();
        std::fs::write(dir.path().join("ignored.txt"), b"not a layer").unwrap();

        let provider = InMemoryLayerProvider::from_directory(dir.path()).unwrap();
        assert_eq!(provider.len(), 2);
        assert!(provider.layer_by_uri("one").is_ok());
        assert!(provider.layer_by_uri("two").is_ok());
    }

    // ========================================================================
    // FetchLayerProvider
    // ========================================================================

    #[test]
    fn test_fetch_provider_caches_by_requested_uri() {
        let mut responses = HashMap::new();
        responses.insert("https://example.com/a".to_string(), layer_bytes("a"));
        let provider = FetchLayerProvider::new(MockFetchOperations::new(responses));

        assert_eq!(
            provider.layer_by_uri("https://example.com/a").unwrap().header.id,
            "a"
        );
        assert_eq!(
            provider.layer_by_uri("https://example.com/a").unwrap().header.id,
            "a"
        );
        // Second lookup is served from cache.
        assert_eq!(provider.fetcher.call_count(), 1);
    }

    #[test]
    fn test_fetch_provider_prefers_import_map_candidate() {
        let mut responses = HashMap::new();
        responses.insert("deps/a.ifcx".to_string(), layer_bytes("local-a"));
        responses.insert("https://example.com/a".to_string(), layer_bytes("remote-a"));
        let mut import_map = HashMap::new();
        import_map.insert(
            "https://example.com/a".to_string(),
            "deps/a.ifcx".to_string(),
        );
        let provider =
            FetchLayerProvider::with_import_map(MockFetchOperations::new(responses), import_map);

        let fetched = provider.layer_by_uri("https://example.com/a").unwrap();
        assert_eq!(fetched.header.id, "local-a");
    }

    #[test]
    fn test_fetch_provider_falls_back_to_literal_uri() {
        // The import-map candidate is missing, the literal URI works.
        let mut responses = HashMap::new();
        responses.insert("https://example.com/a".to_string(), layer_bytes("remote-a"));
        let mut import_map = HashMap::new();
        import_map.insert(
            "https://example.com/a".to_string(),
            "deps/missing.ifcx".to_string(),
        );
        let provider =
            FetchLayerProvider::with_import_map(MockFetchOperations::new(responses), import_map);

        let fetched = provider.layer_by_uri("https://example.com/a").unwrap();
        assert_eq!(fetched.header.id, "remote-a");
    }

    #[test]
    fn test_fetch_provider_skips_unparseable_candidate() {
        let mut responses = HashMap::new();
        responses.insert("deps/a.ifcx".to_string(), b"{garbage".to_vec());
        responses.insert("https://example.com/a".to_string(), layer_bytes("remote-a"));
        let mut import_map = HashMap::new();
        import_map.insert(
            "https://example.com/a".to_string(),
            "deps/a.ifcx".to_string(),
        );
        let provider =
            FetchLayerProvider::with_import_map(MockFetchOperations::new(responses), import_map);

        // Parse failure at the first candidate is soft.
        let fetched = provider.layer_by_uri("https://example.com/a").unwrap();
        assert_eq!(fetched.header.id, "remote-a");
    }

    #[test]
    fn test_fetch_provider_exhausted_candidates_is_not_found() {
        let provider = FetchLayerProvider::new(MockFetchOperations::new(HashMap::new()));
        let err = provider.layer_by_uri("https://example.com/a").unwrap_err();
        assert!(matches!(err, Error::LayerNotFound { uri } if uri == "https://example.com/a"));
    }

    // ========================================================================
    // FileFetchOperations
    // ========================================================================

    #[test]
    fn test_file_fetch_reads_plain_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("layer.ifcx");
        std::fs::write(&file_path, layer_bytes("disk")).unwrap();

        let fetcher = FileFetchOperations::new();
        let bytes = fetcher.fetch(file_path.to_str().unwrap()).unwrap();
        assert_eq!(IfcxFile::from_slice(&bytes).unwrap().header.id, "disk");
    }

    #[test]
    fn test_file_fetch_resolves_relative_against_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("layer.ifcx"), layer_bytes("disk")).unwrap();

        let fetcher = FileFetchOperations::with_root(dir.path().to_path_buf());
        assert!(fetcher.fetch("layer.ifcx").is_ok());
        assert!(fetcher.fetch("missing.ifcx").is_err());
    }

    #[test]
    fn test_file_fetch_rejects_remote_schemes() {
        let fetcher = FileFetchOperations::new();
        assert!(fetcher.fetch("https://example.com/layer.ifcx").is_err());
    }

    // ========================================================================
    // StackedLayerProvider
    // ========================================================================

    #[test]
    fn test_stacked_provider_returns_first_success() {
        let first = InMemoryLayerProvider::from_layers(vec![layer("a")]).unwrap();
        let second = InMemoryLayerProvider::from_layers(vec![layer("a"), layer("b")]).unwrap();
        let stacked = StackedLayerProvider::new()
            .with(Box::new(first))
            .with(Box::new(second));

        assert!(stacked.layer_by_uri("a").is_ok());
        // "b" is only in the second provider.
        assert!(stacked.layer_by_uri("b").is_ok());
    }

    #[test]
    fn test_stacked_provider_aggregates_all_failures() {
        let first = InMemoryLayerProvider::new();
        let second = InMemoryLayerProvider::new();
        let stacked = StackedLayerProvider::new()
            .with(Box::new(first))
            .with(Box::new(second));

        let err = stacked.layer_by_uri("missing").unwrap_err();
        match err {
            Error::ProviderExhausted { uri, failures } => {
                assert_eq!(uri, "missing");
                assert_eq!(failures.len(), 2);
            }
            other => panic!("expected ProviderExhausted, got {}", other),
        }
    }

    #[test]
    fn test_stacked_provider_empty_fails() {
        let stacked = StackedLayerProvider::new();
        assert!(matches!(
            stacked.layer_by_uri("anything"),
            Err(Error::ProviderExhausted { failures, .. }) if failures.is_empty()
        ));
    }
}

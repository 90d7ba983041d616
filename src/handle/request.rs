use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Descriptor of one logical image request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ImageRequest {
    /// Image source (URI, path, or asset key).
    pub source: String,
    /// Request options such as resize hints, in a stable order.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ImageRequest {
    /// Request for `source` without options.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            options: BTreeMap::new(),
        }
    }

    /// Add an option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Per-request metadata set by the fetch pipeline and read by listeners on release.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Extras(serde_json::Map<String, serde_json::Value>);

impl Extras {
    /// Empty extras.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Option<serde_json::Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`Extras::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` without entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Opaque caller-supplied value attached to a bound handle.
pub type CallerContext = Arc<dyn Any + Send + Sync>;

//! Registry of metadata fields exposed through the API.
//!
//! Site metadata is an open string-keyed mapping, but the API only reads
//! and writes keys that have been declared here. The `meta` property shows
//! up in the resource schema and representations only when at least one
//! field is registered.

/// A declared metadata field.
#[derive(Debug, Clone)]
pub struct MetaField {
    pub key: String,
    pub description: String,
    /// JSON Schema type name (`"string"`, `"integer"`, ...).
    pub schema_type: &'static str,
}

/// The set of metadata fields the API exposes.
#[derive(Debug, Clone, Default)]
pub struct MetaRegistry {
    fields: Vec<MetaField>,
}

impl MetaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a metadata field. Later registrations of the same key win.
    pub fn register(
        mut self,
        key: impl Into<String>,
        description: impl Into<String>,
        schema_type: &'static str,
    ) -> Self {
        let key = key.into();
        self.fields.retain(|f| f.key != key);
        self.fields.push(MetaField {
            key,
            description: description.into(),
            schema_type,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    pub fn fields(&self) -> &[MetaField] {
        &self.fields
    }
}

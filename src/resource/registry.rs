//! Resource Registry - Load resource definitions from JSON
//!
//! Resource type schemas are declared in embedded JSON files and loaded once
//! on first access. Lifecycle operations are bound to the type names in
//! [`super::dispatch`].

use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/pipedream.json")];

/// Attribute value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
}

impl AttributeKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            AttributeKind::String => value.is_string(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            AttributeKind::String => "string",
        }
    }
}

/// Attribute definition from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeKind,
    #[serde(default)]
    pub required: bool,
    /// Value used when an optional attribute is not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Collection path below the API base URL
    pub endpoint: String,
    /// Field of the create response carrying the remote identifier
    pub id_field: String,
    pub attributes: Vec<AttributeDef>,
}

impl ResourceDef {
    /// Look up an attribute definition by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check required attributes are set and every value has the declared type
    ///
    /// A JSON `null` counts as unset.
    pub fn validate(&self, attributes: &BTreeMap<String, Value>) -> Result<()> {
        for name in attributes.keys() {
            if self.attribute(name).is_none() {
                return Err(ProviderError::UnknownAttribute(name.clone()));
            }
        }

        for def in &self.attributes {
            match attributes.get(&def.name) {
                None | Some(Value::Null) => {
                    if def.required {
                        return Err(ProviderError::MissingAttribute(def.name.clone()));
                    }
                }
                Some(value) if !def.kind.matches(value) => {
                    return Err(ProviderError::InvalidAttribute {
                        name: def.name.clone(),
                        expected: def.kind.as_str().to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Attribute map with defaults filled in for unset optional attributes
    pub fn with_defaults(&self, attributes: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        self.attributes
            .iter()
            .filter_map(|def| {
                let value = match attributes.get(&def.name) {
                    Some(v) if !v.is_null() => Some(v.clone()),
                    _ => def.default.clone(),
                };
                value.map(|v| (def.name.clone(), v))
            })
            .collect()
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by type name
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get a resource definition or fail with [`ProviderError::UnknownResourceType`]
pub fn require_resource(key: &str) -> Result<&'static ResourceDef> {
    get_resource(key).ok_or_else(|| ProviderError::UnknownResourceType(key.to_string()))
}

/// Get all resource type names, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}

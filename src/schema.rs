//! Service schema export.
//!
//! Describes hosted services and their method IDs as JSON, for tooling
//! that needs to check both peers agree on the protocol constants.
//!
//! # Example
//!
//! ```
//! use servicewire::descriptor::{MethodDescriptor, ServiceDescriptor};
//! use servicewire::schema::{build_schema_document, MethodSchema, ServiceSchema};
//!
//! let mut schema = ServiceSchema::new("AuthService", ServiceDescriptor::named(1, "Auth", 0));
//! schema.add_method(MethodDescriptor::new(1), MethodSchema::new("logon"));
//!
//! let json = build_schema_document(&[schema]).unwrap();
//! assert!(json.contains("\"logon\""));
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::descriptor::{MethodDescriptor, ServiceDescriptor};
use crate::error::Result;

/// Schema format version.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// A single method in a service schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSchema {
    /// Name the handler was registered with.
    pub name: String,
}

impl MethodSchema {
    /// Create a method entry.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Schema for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSchema {
    /// Service type name.
    pub service: String,
    /// Protocol identity.
    #[serde(flatten)]
    pub descriptor: ServiceDescriptor,
    /// Methods keyed by method ID.
    pub methods: BTreeMap<u8, MethodSchema>,
}

impl ServiceSchema {
    /// Create a schema with no methods.
    pub fn new(service: &str, descriptor: ServiceDescriptor) -> Self {
        Self {
            service: service.to_string(),
            descriptor,
            methods: BTreeMap::new(),
        }
    }

    /// Add a method to the schema.
    pub fn add_method(&mut self, method: MethodDescriptor, schema: MethodSchema) {
        self.methods.insert(method.method_id, schema);
    }

    /// Get a method by ID.
    pub fn get_method(&self, method_id: u8) -> Option<&MethodSchema> {
        self.methods.get(&method_id)
    }

    /// Serialize this schema alone.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Build a versioned JSON document describing several services.
///
/// Services are listed in ascending service ID order.
pub fn build_schema_document(schemas: &[ServiceSchema]) -> Result<String> {
    let mut services: Vec<&ServiceSchema> = schemas.iter().collect();
    services.sort_by_key(|s| s.descriptor.service_id);

    let doc = json!({
        "version": SCHEMA_VERSION,
        "services": services,
    });

    Ok(serde_json::to_string(&doc)?)
}

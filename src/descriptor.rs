//! Service and method descriptors.
//!
//! A [`ServiceDescriptor`] carries the protocol identity of a service:
//! its numeric service ID, the server hash peers bind against, and the
//! client hash expected from the remote side. It can be declared from
//! numeric constants or from the service's name, and both forms produce
//! the same value:
//!
//! ```
//! use servicewire::descriptor::ServiceDescriptor;
//! use servicewire::hash::service_hash;
//!
//! const BY_HASH: ServiceDescriptor = ServiceDescriptor::new(1, service_hash("Foo"), 0x42);
//! const BY_NAME: ServiceDescriptor = ServiceDescriptor::named(1, "Foo", 0x42);
//! assert_eq!(BY_HASH, BY_NAME);
//! ```
//!
//! [`ServiceDeclaration`] is the serde form of the same data, for
//! descriptor tables loaded from JSON configuration.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, ServiceError};
use crate::hash::service_hash;

/// Protocol identity of a service. Immutable once declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Numeric service identifier carried in frame headers.
    pub service_id: u32,
    /// Identity this side presents during binding.
    pub server_hash: u32,
    /// Identity expected from the remote peer.
    pub client_hash: u32,
}

impl ServiceDescriptor {
    /// Declare a descriptor from numeric constants.
    pub const fn new(service_id: u32, server_hash: u32, client_hash: u32) -> Self {
        Self {
            service_id,
            server_hash,
            client_hash,
        }
    }

    /// Declare a descriptor whose server hash is derived from `service_name`.
    pub const fn named(service_id: u32, service_name: &str, client_hash: u32) -> Self {
        Self::new(service_id, service_hash(service_name), client_hash)
    }

    /// Check whether a peer-supplied hash identifies this service.
    #[inline]
    pub fn matches_server_hash(&self, hash: u32) -> bool {
        self.server_hash == hash
    }
}

/// Method identity within a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodDescriptor {
    /// Single-byte method identifier, unique within its service.
    pub method_id: u8,
}

impl MethodDescriptor {
    /// Create a method descriptor.
    pub const fn new(method_id: u8) -> Self {
        Self { method_id }
    }
}

impl From<u8> for MethodDescriptor {
    fn from(method_id: u8) -> Self {
        Self::new(method_id)
    }
}

/// How a declaration states the server hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerIdentity {
    /// Precomputed numeric hash.
    Hash {
        /// The server hash.
        server_hash: u32,
    },
    /// Human-readable name, hashed on resolution.
    Name {
        /// Fully qualified service name.
        service_name: String,
    },
}

/// Serde form of a service descriptor.
///
/// Exactly one of `serverHash` and `serviceName` must be present:
///
/// ```json
/// { "serviceId": 1, "serviceName": "bnet.protocol.authentication.AuthenticationServer", "clientHash": 1897085827 }
/// { "serviceId": 2, "serverHash": 233634817, "clientHash": 1897085827 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDeclaration {
    /// Numeric service identifier.
    pub service_id: u32,
    /// Server hash, given directly or by name.
    pub server: ServerIdentity,
    /// Identity expected from the remote peer.
    pub client_hash: u32,
}

/// Wire shape of a declaration before the identity fields are checked.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawDeclaration {
    service_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server_hash: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_name: Option<String>,
    client_hash: u32,
}

impl ServiceDeclaration {
    fn from_raw(raw: RawDeclaration) -> Result<Self> {
        let server = match (raw.server_hash, raw.service_name) {
            (Some(server_hash), None) => ServerIdentity::Hash { server_hash },
            (None, Some(service_name)) => ServerIdentity::Name { service_name },
            (Some(_), Some(_)) => {
                return Err(ServiceError::InvalidDeclaration {
                    service_id: raw.service_id,
                    reason: "both serverHash and serviceName given",
                });
            }
            (None, None) => {
                return Err(ServiceError::InvalidDeclaration {
                    service_id: raw.service_id,
                    reason: "one of serverHash or serviceName is required",
                });
            }
        };

        Ok(Self {
            service_id: raw.service_id,
            server,
            client_hash: raw.client_hash,
        })
    }

    fn to_raw(&self) -> RawDeclaration {
        let (server_hash, service_name) = match &self.server {
            ServerIdentity::Hash { server_hash } => (Some(*server_hash), None),
            ServerIdentity::Name { service_name } => (None, Some(service_name.clone())),
        };

        RawDeclaration {
            service_id: self.service_id,
            server_hash,
            service_name,
            client_hash: self.client_hash,
        }
    }

    /// Resolve to the in-memory descriptor.
    pub fn resolve(&self) -> ServiceDescriptor {
        match &self.server {
            ServerIdentity::Hash { server_hash } => {
                ServiceDescriptor::new(self.service_id, *server_hash, self.client_hash)
            }
            ServerIdentity::Name { service_name } => {
                ServiceDescriptor::named(self.service_id, service_name, self.client_hash)
            }
        }
    }

    /// Parse a JSON array of declarations and resolve each one.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON and on any declaration that gives both or
    /// neither of `serverHash` and `serviceName`.
    pub fn resolve_all_json(json: &str) -> Result<Vec<ServiceDescriptor>> {
        let declarations: Vec<ServiceDeclaration> = serde_json::from_str(json)?;
        Ok(declarations.iter().map(ServiceDeclaration::resolve).collect())
    }
}

impl Serialize for ServiceDeclaration {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> std::result::Result<Ser::Ok, Ser::Error> {
        self.to_raw().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ServiceDeclaration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawDeclaration::deserialize(deserializer)?;
        ServiceDeclaration::from_raw(raw).map_err(de::Error::custom)
    }
}

impl From<ServiceDescriptor> for ServiceDeclaration {
    fn from(descriptor: ServiceDescriptor) -> Self {
        Self {
            service_id: descriptor.service_id,
            server: ServerIdentity::Hash {
                server_hash: descriptor.server_hash,
            },
            client_hash: descriptor.client_hash,
        }
    }
}

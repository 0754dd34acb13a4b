//! Transport-agnostic message model.
//!
//! A [`MessageEnvelope`] bundles an opaque payload with named binary
//! attachments and string properties partitioned into scopes. Scopes decide
//! what is propagated to the wire: `Invocation` and `Outbound` properties
//! travel with the call, `Session` and `Inbound` stay local.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property scopes, in precedence order.
///
/// The declaration order doubles as the iteration order of
/// [`SCOPE_ORDER`]: when the same name exists in several scopes, later
/// scopes win wherever an all-scope pass is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyScope {
    /// Per-invocation metadata, propagated to the wire.
    Invocation,
    /// Outbound metadata, propagated to the wire.
    Outbound,
    /// Session-local metadata, never propagated.
    Session,
    /// Metadata received from the transport, never propagated.
    Inbound,
}

/// All scopes, in precedence order.
pub const SCOPE_ORDER: [PropertyScope; 4] = [
    PropertyScope::Invocation,
    PropertyScope::Outbound,
    PropertyScope::Session,
    PropertyScope::Inbound,
];

/// Reserved prefix marking internal property values that must never leak
/// onto the wire as custom headers.
pub const RESERVED_PROPERTY_PREFIX: &str = "ZENTINEL";

/// Outbound-scope property carrying a SOAP-action template override.
pub const SOAP_ACTION_PROPERTY: &str = "soapAction";

/// An opaque message payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Payload {
    /// Distinguished "no payload" marker, distinct from an empty value.
    #[default]
    Null,
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    /// Ordered sequence of values, e.g. multiple RPC return values.
    Sequence(Vec<Payload>),
    /// Named values, marshalled per declared operation parameter.
    Record(BTreeMap<String, Payload>),
}

impl Payload {
    /// True for the distinguished no-payload marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }
}

/// A named binary attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME content type of the attachment data.
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A structured fault carried by an error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultPayload {
    pub message: String,
    /// Transport status code that triggered synthesis, when applicable.
    pub status: Option<u16>,
}

/// The in-memory request/response unit handed across the dispatch boundary.
///
/// An envelope carries at most one fault payload. Payload and fault are not
/// mutually exclusive: a faulted response may still carry a best-effort
/// payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageEnvelope {
    payload: Payload,
    attachments: BTreeMap<String, Attachment>,
    properties: BTreeMap<PropertyScope, BTreeMap<String, String>>,
    fault: Option<FaultPayload>,
}

impl MessageEnvelope {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    /// Look up a property in a single scope.
    pub fn property(&self, scope: PropertyScope, name: &str) -> Option<&str> {
        self.properties
            .get(&scope)
            .and_then(|m| m.get(name))
            .map(String::as_str)
    }

    /// Set a property in the given scope.
    ///
    /// Keeping a name in a single scope is a caller convention; the setter
    /// does not remove the name from other scopes, so the cross-scope
    /// precedence rules stay observable.
    pub fn set_property(
        &mut self,
        scope: PropertyScope,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.properties
            .entry(scope)
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Iterate the name/value pairs of one scope, in name order.
    pub fn scope_properties(
        &self,
        scope: PropertyScope,
    ) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.properties
            .get(&scope)
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Iterate every property of every scope, following [`SCOPE_ORDER`].
    pub fn all_properties(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        SCOPE_ORDER
            .iter()
            .flat_map(move |scope| self.scope_properties(*scope))
    }

    pub fn attachments(&self) -> &BTreeMap<String, Attachment> {
        &self.attachments
    }

    pub fn add_attachment(&mut self, name: impl Into<String>, attachment: Attachment) {
        self.attachments.insert(name.into(), attachment);
    }

    pub fn fault(&self) -> Option<&FaultPayload> {
        self.fault.as_ref()
    }

    /// Override the envelope's fault payload (at most one is kept).
    pub fn set_fault(&mut self, fault: FaultPayload) {
        self.fault = Some(fault);
    }
}

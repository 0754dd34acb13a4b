//! Response reassembly.
//!
//! Rebuilds a [`MessageEnvelope`] from the RPC return values and the raw
//! transport response captured through the correlation handle. A non-success
//! transport status always synthesizes a fault payload, independently of
//! whether a result payload was set.

use crate::client::TransportResponse;
use crate::message::{FaultPayload, MessageEnvelope, Payload, PropertyScope};
use tracing::warn;

/// The transport success code. Any other status synthesizes a fault.
pub const STATUS_OK: u16 = 200;

/// Build the response envelope for one completed call.
pub fn build(transport: Option<TransportResponse>, returns: Vec<Payload>) -> MessageEnvelope {
    // One-way dispatches over an asynchronous transport capture nothing.
    let Some(transport) = transport else {
        return MessageEnvelope::new(Payload::Null);
    };

    let mut envelope = MessageEnvelope::default();
    for (name, value) in &transport.headers {
        envelope.set_property(PropertyScope::Inbound, name.clone(), value.clone());
    }

    let mut returns = returns;
    match returns.len() {
        0 => {}
        1 => envelope.set_payload(returns.remove(0)),
        _ => envelope.set_payload(Payload::Sequence(returns)),
    }

    if let Some(status) = transport.status {
        if status != STATUS_OK {
            let message = transport
                .body
                .as_deref()
                .and_then(|body| std::str::from_utf8(body).ok())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Invalid status code: {status}"));
            warn!(status, "non-success transport status, synthesizing fault");
            envelope.set_fault(FaultPayload {
                message,
                status: Some(status),
            });
        }
    }

    envelope
}

//! Error types for the SOAP dispatch layer.

use thiserror::Error;

/// Errors raised while dispatching a message to a remote SOAP service.
///
/// Transport-level failures signalled through a status code are *not*
/// represented here: they are embedded into the response envelope as a
/// [`FaultPayload`](crate::message::FaultPayload) by the response builder
/// and never interrupt control flow.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A proxy-mode invocation failed with a security-related fault.
    ///
    /// Carries the id of the originating dispatch event for diagnostics.
    #[error("web service security failure dispatching event {event_id}: {message}")]
    Security { event_id: u64, message: String },

    /// Payload-to-argument conversion failed (e.g. shape mismatch).
    #[error("payload transformation error: {0}")]
    Transformation(String),

    /// The underlying SOAP client reported an invocation failure.
    #[error("invocation error: {0}")]
    Invocation(String),

    /// `send` was called on a dispatcher that has not been connected.
    #[error("dispatcher is not connected")]
    NotConnected,

    /// A second transport response was deposited into a correlation handle.
    #[error("transport response already deposited for this call")]
    CorrelationFilled,
}

//! Outbound SOAP dispatch layer for Zentinel integration runtimes.
//!
//! Turns a transport-agnostic message (payload plus scoped key/value
//! metadata) into a SOAP RPC invocation against an externally established
//! client capability, and turns the result (or fault) back into a message.
//!
//! # Features
//!
//! - Direct-operation and generated-proxy invocation modes
//! - Payload-to-argument marshalling with a pluggable strategy
//! - SOAP-action `${token}` template resolution
//! - Scoped property propagation with reserved-prefix filtering
//! - Transport-status-driven fault synthesis on responses
//! - Passivation-safe clearing of retained client contexts
//!
//! # Example
//!
//! ```ignore
//! use zentinel_dispatch_soap::{DispatchEvent, Endpoint, SoapDispatcher};
//!
//! let endpoint = Endpoint::new("http://soap.example.org/services/stock".parse()?);
//! let mut dispatcher = SoapDispatcher::new(endpoint);
//! dispatcher.connect(client)?;
//! let response = dispatcher.send(DispatchEvent::new(envelope))?;
//! ```
//!
//! The SOAP/XML wire codec, WSDL binding and transport networking live in
//! the client capability behind the [`client::SoapClient`] trait; this
//! crate only covers the dispatch-mode decision, marshalling, header and
//! SOAP-action construction, and response reassembly.

pub mod action;
pub mod client;
pub mod context;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod marshal;
pub mod message;
pub mod response;

pub use client::{CorrelationHandle, MethodHandle, OperationDescriptor, SoapClient, TransportResponse};
pub use dispatch::{DispatchEvent, SoapDispatcher};
pub use endpoint::Endpoint;
pub use error::DispatchError;
pub use message::{Attachment, FaultPayload, MessageEnvelope, Payload, PropertyScope};

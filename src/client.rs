//! External SOAP client capability surface.
//!
//! The dispatch core does not speak SOAP itself: it drives an externally
//! established client through [`SoapClient`] and reads the out-of-band
//! transport response back through a [`CorrelationHandle`]. Tests implement
//! the trait with an in-memory mock; production implementations wrap a real
//! SOAP/RPC client stack.

use crate::context::InvocationContext;
use crate::error::DispatchError;
use crate::marshal::Argument;
use crate::message::Payload;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Identity of a bound SOAP operation: local name, namespace and the
/// declared parameter names used to marshal record-shaped payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: String,
    pub namespace: String,
    pub parameters: Vec<String>,
}

/// Identity of a generated-proxy method. Proxy methods carry no namespace;
/// the proxy layer resolves its own binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodHandle {
    pub name: String,
}

/// Raw transport-level response captured out-of-band by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResponse {
    /// Transport status code, when the transport carries one.
    pub status: Option<u16>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// Write-once cell through which the invoked client deposits the raw
/// transport response alongside the RPC return value.
///
/// The dispatcher owns the cell for the duration of one call: the client
/// writes exactly once, the response builder reads it afterwards. Only the
/// write is enforced single-shot; reads are repeatable.
#[derive(Debug, Clone, Default)]
pub struct CorrelationHandle {
    cell: Arc<OnceCell<TransportResponse>>,
}

impl CorrelationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit the transport response. Fails on a second write.
    pub fn deposit(&self, response: TransportResponse) -> Result<(), DispatchError> {
        self.cell
            .set(response)
            .map_err(|_| DispatchError::CorrelationFilled)
    }

    /// Read the deposited response, if any. One-way dispatches over an
    /// asynchronous transport leave the cell empty.
    pub fn get(&self) -> Option<TransportResponse> {
        self.cell.get().cloned()
    }
}

/// Abstract SOAP client capability established per endpoint by the host
/// runtime's connection management.
pub trait SoapClient {
    /// The operation this endpoint is bound to (direct-operation mode).
    fn operation(&self) -> Result<OperationDescriptor, DispatchError>;

    /// The proxy method this endpoint is bound to (proxy mode).
    fn method(&self) -> Result<MethodHandle, DispatchError>;

    /// Generic operation invocation. `args` of `None` means "no arguments",
    /// which clients must distinguish from an empty argument list.
    fn invoke(
        &mut self,
        operation: &OperationDescriptor,
        args: Option<Vec<Argument>>,
        context: &InvocationContext,
    ) -> Result<Vec<Payload>, DispatchError>;

    /// Dynamic invocation through the generated client proxy.
    fn invoke_method(
        &mut self,
        method: &MethodHandle,
        args: Option<Vec<Argument>>,
        context: &InvocationContext,
    ) -> Result<Payload, DispatchError>;

    /// Whether a generated client proxy is available for this binding.
    fn client_proxy_available(&self) -> bool;

    /// Whether the binding runs in proxy (raw passthrough) mode.
    fn is_proxy(&self) -> bool;

    /// Propagate the caller-specified timeout before a call. Enforcement
    /// is the client's responsibility.
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Retained per-client request context. Accumulates per-call entries
    /// and must be cleared on passivation.
    fn request_context(&mut self) -> &mut BTreeMap<String, String>;

    /// Retained per-client response context, cleared on passivation.
    fn response_context(&mut self) -> &mut BTreeMap<String, String>;

    /// Client-side passivation step, run before the dispatcher clears the
    /// retained contexts.
    fn passivate(&mut self) -> Result<(), DispatchError> {
        Ok(())
    }
}

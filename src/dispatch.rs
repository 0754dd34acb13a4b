//! Outbound dispatch orchestration.
//!
//! [`SoapDispatcher`] drives one endpoint's externally established SOAP
//! client capability through the call lifecycle:
//! `Disconnected → Connected → (Sending)* → Connected → Disconnected`.
//! Each `send` is a synchronous, blocking call; per-call state (context,
//! correlation handle) is call-local, so concurrent dispatchers never share
//! mutable state. At most one in-flight `send` per dispatcher instance is
//! assumed, enforced by the surrounding pooling collaborator.

use crate::action::SoapActionResolver;
use crate::client::{MethodHandle, OperationDescriptor, SoapClient};
use crate::context;
use crate::endpoint::Endpoint;
use crate::error::DispatchError;
use crate::marshal::{
    self, DefaultPayloadToArguments, MarshalMode, PayloadToArguments, Transformer,
};
use crate::message::{MessageEnvelope, Payload};
use crate::response;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// One outbound dispatch request.
#[derive(Debug, Clone)]
pub struct DispatchEvent {
    /// Process-unique event id, used for correlation in logs and faults.
    pub id: u64,
    pub envelope: MessageEnvelope,
    /// Caller-specified timeout, propagated to the client before the call.
    pub timeout: Option<Duration>,
    /// Name of the flow/pipeline dispatching this event, when available.
    pub flow_name: Option<String>,
}

impl DispatchEvent {
    pub fn new(envelope: MessageEnvelope) -> Self {
        Self {
            id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
            envelope,
            timeout: None,
            flow_name: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_flow_name(mut self, flow_name: impl Into<String>) -> Self {
        self.flow_name = Some(flow_name.into());
        self
    }
}

/// The invocation target, selected once per endpoint at connect time so the
/// per-call hot path never inspects the binding again.
#[derive(Debug, Clone)]
enum CallTarget {
    DirectOperation(OperationDescriptor),
    ProxyMethod(MethodHandle),
}

struct Connection<C> {
    client: C,
    target: CallTarget,
}

/// Dispatches [`DispatchEvent`]s to a remote SOAP service through an
/// externally established [`SoapClient`] capability.
pub struct SoapDispatcher<C: SoapClient> {
    endpoint: Endpoint,
    resolver: SoapActionResolver,
    payload_to_arguments: Box<dyn PayloadToArguments>,
    transformers: Vec<Box<dyn Transformer>>,
    connection: Option<Connection<C>>,
}

impl<C: SoapClient> SoapDispatcher<C> {
    pub fn new(endpoint: Endpoint) -> Self {
        let payload_to_arguments =
            Box::new(DefaultPayloadToArguments::new(endpoint.null_payload));
        Self {
            endpoint,
            resolver: SoapActionResolver::new(),
            payload_to_arguments,
            transformers: Vec::new(),
            connection: None,
        }
    }

    /// Replace the endpoint's payload-to-arguments strategy.
    pub fn with_payload_to_arguments(mut self, strategy: Box<dyn PayloadToArguments>) -> Self {
        self.payload_to_arguments = strategy;
        self
    }

    /// Append an application-level payload transformer. The chain is
    /// skipped when the client operates directly on the wire-level payload.
    pub fn with_transformer(mut self, transformer: Box<dyn Transformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The connected client capability, if any.
    pub fn client(&self) -> Option<&C> {
        self.connection.as_ref().map(|c| &c.client)
    }

    /// Mutable access to the connected client capability, for the host
    /// runtime's connection management.
    pub fn client_mut(&mut self) -> Option<&mut C> {
        self.connection.as_mut().map(|c| &mut c.client)
    }

    /// Enter the `Connected` state with an established client capability.
    ///
    /// The invocation target is resolved here, once per endpoint: the
    /// generated client proxy when one is available, the bound operation
    /// otherwise.
    pub fn connect(&mut self, client: C) -> Result<(), DispatchError> {
        let target = if client.client_proxy_available() {
            CallTarget::ProxyMethod(client.method()?)
        } else {
            CallTarget::DirectOperation(client.operation()?)
        };
        info!(
            endpoint = %self.endpoint.address,
            proxy = matches!(target, CallTarget::ProxyMethod(_)),
            "SOAP client connected"
        );
        self.connection = Some(Connection { client, target });
        Ok(())
    }

    /// Drop the client capability and return to `Disconnected`.
    pub fn disconnect(&mut self) {
        self.connection = None;
    }

    /// Dispatch one event and return the reassembled response envelope.
    pub fn send(&mut self, mut event: DispatchEvent) -> Result<MessageEnvelope, DispatchError> {
        let Self {
            endpoint,
            resolver,
            payload_to_arguments,
            transformers,
            connection,
        } = self;
        let connection = connection.as_mut().ok_or(DispatchError::NotConnected)?;

        connection
            .client
            .set_timeout(event.timeout.or_else(|| endpoint.timeout()));

        match connection.target.clone() {
            CallTarget::DirectOperation(op) => {
                let ctx = context::build(&mut event, endpoint, &op.name, &op.namespace, resolver);
                mirror_headers(&mut connection.client, &ctx);

                let payload = select_payload(endpoint, &event, transformers)?;
                let mode = if connection.client.is_proxy() {
                    MarshalMode::ProxyPassthrough
                } else {
                    MarshalMode::OperationInvoke(&op)
                };
                let args = marshal::to_arguments(
                    &event.envelope,
                    &payload,
                    mode,
                    payload_to_arguments.as_ref(),
                )?;

                debug!(event_id = event.id, operation = %op.name, "invoking operation");
                let returns = connection.client.invoke(&op, args, &ctx)?;

                let transport = ctx.correlation.get();
                Ok(response::build(transport, returns))
            }
            CallTarget::ProxyMethod(method) => {
                let ctx = context::build(&mut event, endpoint, &method.name, "", resolver);
                // The context rides on the proxy's own request-context map.
                mirror_headers(&mut connection.client, &ctx);

                let args = marshal::to_arguments(
                    &event.envelope,
                    event.envelope.payload(),
                    MarshalMode::ProxyPassthrough,
                    payload_to_arguments.as_ref(),
                )?;

                debug!(event_id = event.id, method = %method.name, "invoking proxy method");
                let result = connection.client.invoke_method(&method, args, &ctx);
                let value = match result {
                    Ok(value) => value,
                    Err(DispatchError::Invocation(message)) if message.contains("Security") => {
                        return Err(DispatchError::Security {
                            event_id: event.id,
                            message,
                        });
                    }
                    Err(other) => return Err(other),
                };

                let transport = ctx.correlation.get();
                Ok(response::build(transport, vec![value]))
            }
        }
    }

    /// Prepare the dispatcher for return to a reuse pool.
    ///
    /// The client's retained request and response contexts accumulate
    /// per-call entries; leaving them in place leaks data across reuses.
    /// They are cleared even when the client's own passivation step fails,
    /// and that failure is still reported.
    pub fn passivate(&mut self) -> Result<(), DispatchError> {
        let Some(connection) = self.connection.as_mut() else {
            return Ok(());
        };
        let result = connection.client.passivate();
        connection.client.request_context().clear();
        connection.client.response_context().clear();
        result
    }
}

/// Copy the per-call custom headers into the client's retained request
/// context, where downstream interceptors expect them.
fn mirror_headers<C: SoapClient>(client: &mut C, ctx: &context::InvocationContext) {
    client.request_context().extend(
        ctx.headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
}

/// Raw payload when the endpoint operates on the wire-level payload,
/// otherwise the payload run through the transformer chain.
fn select_payload(
    endpoint: &Endpoint,
    event: &DispatchEvent,
    transformers: &[Box<dyn Transformer>],
) -> Result<Payload, DispatchError> {
    if endpoint.apply_transformers_to_protocol {
        return Ok(event.envelope.payload().clone());
    }
    let mut payload = event.envelope.payload().clone();
    for transformer in transformers {
        payload = transformer.transform(&payload)?;
    }
    Ok(payload)
}

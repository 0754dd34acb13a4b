//! Payload-to-argument marshalling.
//!
//! Turns an envelope payload (plus named attachments) into the positional
//! argument list a SOAP call expects. Proxy-mode calls bypass marshalling
//! entirely: the envelope itself travels as the single argument and the
//! downstream proxy layer does its own extraction.

use crate::client::OperationDescriptor;
use crate::error::DispatchError;
use crate::message::{Attachment, MessageEnvelope, Payload};
use serde::{Deserialize, Serialize};

/// How the argument list is produced.
#[derive(Debug, Clone, Copy)]
pub enum MarshalMode<'a> {
    /// Marshal the payload through the configured strategy against the
    /// target operation's declared parameters.
    OperationInvoke(&'a OperationDescriptor),
    /// Hand the whole envelope through as a single argument.
    ProxyPassthrough,
}

/// One positional call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Value(Payload),
    /// The raw envelope, used only in proxy passthrough mode.
    Envelope(MessageEnvelope),
    /// Trailing array argument collecting the envelope's attachments.
    Attachments(Vec<Attachment>),
}

/// How a null payload is marshalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NullPayloadRule {
    /// A null payload produces no argument.
    #[default]
    AsVoid,
    /// A null payload is passed through as a single null argument.
    AsParameter,
}

/// Converts an arbitrary payload shape into an ordered argument list.
/// Configurable per endpoint.
pub trait PayloadToArguments {
    fn to_arguments(
        &self,
        payload: &Payload,
        operation: &OperationDescriptor,
    ) -> Result<Vec<Argument>, DispatchError>;
}

/// Default strategy: one argument per value, sequences spread element-wise,
/// records matched against the operation's declared parameter names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPayloadToArguments {
    pub null_payload: NullPayloadRule,
}

impl DefaultPayloadToArguments {
    pub fn new(null_payload: NullPayloadRule) -> Self {
        Self { null_payload }
    }
}

impl PayloadToArguments for DefaultPayloadToArguments {
    fn to_arguments(
        &self,
        payload: &Payload,
        operation: &OperationDescriptor,
    ) -> Result<Vec<Argument>, DispatchError> {
        match payload {
            Payload::Null => match self.null_payload {
                NullPayloadRule::AsVoid => Ok(Vec::new()),
                NullPayloadRule::AsParameter => Ok(vec![Argument::Value(Payload::Null)]),
            },
            Payload::Sequence(items) => Ok(items
                .iter()
                .map(|item| Argument::Value(item.clone()))
                .collect()),
            Payload::Record(fields) => {
                if operation.parameters.is_empty() {
                    return Err(DispatchError::Transformation(format!(
                        "operation '{}' declares no parameters for a record payload",
                        operation.name
                    )));
                }
                operation
                    .parameters
                    .iter()
                    .map(|name| {
                        fields
                            .get(name)
                            .map(|value| Argument::Value(value.clone()))
                            .ok_or_else(|| {
                                DispatchError::Transformation(format!(
                                    "record payload has no value for parameter '{name}'"
                                ))
                            })
                    })
                    .collect()
            }
            other => Ok(vec![Argument::Value(other.clone())]),
        }
    }
}

/// Application-level payload transformation, applied before marshalling
/// unless the endpoint operates directly on the wire-level payload.
pub trait Transformer {
    fn transform(&self, payload: &Payload) -> Result<Payload, DispatchError>;
}

/// Marshal an envelope into the argument list for one call.
///
/// `payload` is the already raw-or-transformed payload selected by the
/// dispatcher. Returns `None` as a distinguished "no arguments" marker when
/// the final list is empty; downstream clients require null and empty-list
/// to be distinguishable.
pub fn to_arguments(
    envelope: &MessageEnvelope,
    payload: &Payload,
    mode: MarshalMode<'_>,
    strategy: &dyn PayloadToArguments,
) -> Result<Option<Vec<Argument>>, DispatchError> {
    let operation = match mode {
        MarshalMode::ProxyPassthrough => {
            return Ok(Some(vec![Argument::Envelope(envelope.clone())]));
        }
        MarshalMode::OperationInvoke(operation) => operation,
    };

    let mut args = strategy.to_arguments(payload, operation)?;

    // Attachments ride as a single trailing array argument, in name order.
    if !envelope.attachments().is_empty() {
        args.push(Argument::Attachments(
            envelope.attachments().values().cloned().collect(),
        ));
    }

    if args.is_empty() {
        Ok(None)
    } else {
        Ok(Some(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn operation(parameters: &[&str]) -> OperationDescriptor {
        OperationDescriptor {
            name: "GetStockPrice".to_string(),
            namespace: "http://example.org/stock".to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn attachment(byte: u8) -> Attachment {
        Attachment {
            content_type: "application/octet-stream".to_string(),
            data: vec![byte],
        }
    }

    #[test]
    fn test_null_payload_yields_no_arguments_marker() {
        let envelope = MessageEnvelope::default();
        let strategy = DefaultPayloadToArguments::default();

        let args = to_arguments(
            &envelope,
            envelope.payload(),
            MarshalMode::OperationInvoke(&operation(&[])),
            &strategy,
        )
        .unwrap();

        // The distinguished marker, not an empty list.
        assert!(args.is_none());
    }

    #[test]
    fn test_null_payload_as_parameter() {
        let envelope = MessageEnvelope::default();
        let strategy = DefaultPayloadToArguments::new(NullPayloadRule::AsParameter);

        let args = to_arguments(
            &envelope,
            envelope.payload(),
            MarshalMode::OperationInvoke(&operation(&[])),
            &strategy,
        )
        .unwrap()
        .unwrap();

        assert_eq!(args, vec![Argument::Value(Payload::Null)]);
    }

    #[test]
    fn test_single_value_becomes_one_argument() {
        let envelope = MessageEnvelope::new(Payload::Text("Apples".to_string()));
        let strategy = DefaultPayloadToArguments::default();

        let args = to_arguments(
            &envelope,
            envelope.payload(),
            MarshalMode::OperationInvoke(&operation(&[])),
            &strategy,
        )
        .unwrap()
        .unwrap();

        assert_eq!(args, vec![Argument::Value(Payload::Text("Apples".to_string()))]);
    }

    #[test]
    fn test_sequence_spreads_element_wise() {
        let payload = Payload::Sequence(vec![
            Payload::Text("Apples".to_string()),
            Payload::Json(serde_json::json!(12)),
        ]);
        let envelope = MessageEnvelope::new(payload);
        let strategy = DefaultPayloadToArguments::default();

        let args = to_arguments(
            &envelope,
            envelope.payload(),
            MarshalMode::OperationInvoke(&operation(&[])),
            &strategy,
        )
        .unwrap()
        .unwrap();

        assert_eq!(args.len(), 2);
        assert_eq!(args[0], Argument::Value(Payload::Text("Apples".to_string())));
    }

    #[test]
    fn test_record_marshals_per_declared_parameter() {
        let mut fields = BTreeMap::new();
        fields.insert("symbol".to_string(), Payload::Text("ACME".to_string()));
        fields.insert("currency".to_string(), Payload::Text("EUR".to_string()));
        let envelope = MessageEnvelope::new(Payload::Record(fields));
        let strategy = DefaultPayloadToArguments::default();

        // Declared order wins, not record key order.
        let args = to_arguments(
            &envelope,
            envelope.payload(),
            MarshalMode::OperationInvoke(&operation(&["symbol", "currency"])),
            &strategy,
        )
        .unwrap()
        .unwrap();

        assert_eq!(args[0], Argument::Value(Payload::Text("ACME".to_string())));
        assert_eq!(args[1], Argument::Value(Payload::Text("EUR".to_string())));
    }

    #[test]
    fn test_record_with_missing_parameter_is_a_transformation_error() {
        let mut fields = BTreeMap::new();
        fields.insert("symbol".to_string(), Payload::Text("ACME".to_string()));
        let envelope = MessageEnvelope::new(Payload::Record(fields));
        let strategy = DefaultPayloadToArguments::default();

        let err = to_arguments(
            &envelope,
            envelope.payload(),
            MarshalMode::OperationInvoke(&operation(&["symbol", "currency"])),
            &strategy,
        )
        .unwrap_err();

        assert!(matches!(err, DispatchError::Transformation(_)));
        assert!(err.to_string().contains("currency"));
    }

    #[test]
    fn test_attachments_appended_as_trailing_array_in_name_order() {
        let mut envelope = MessageEnvelope::new(Payload::Text("order".to_string()));
        envelope.add_attachment("manifest", attachment(2));
        envelope.add_attachment("contract", attachment(1));
        let strategy = DefaultPayloadToArguments::default();

        let args = to_arguments(
            &envelope,
            envelope.payload(),
            MarshalMode::OperationInvoke(&operation(&[])),
            &strategy,
        )
        .unwrap()
        .unwrap();

        assert_eq!(args.len(), 2);
        match &args[1] {
            Argument::Attachments(all) => {
                // "contract" sorts before "manifest"
                assert_eq!(all[0].data, vec![1]);
                assert_eq!(all[1].data, vec![2]);
            }
            other => panic!("expected trailing attachments argument, got {other:?}"),
        }
    }

    #[test]
    fn test_attachments_alone_still_produce_arguments() {
        let mut envelope = MessageEnvelope::default();
        envelope.add_attachment("blob", attachment(7));
        let strategy = DefaultPayloadToArguments::default();

        let args = to_arguments(
            &envelope,
            envelope.payload(),
            MarshalMode::OperationInvoke(&operation(&[])),
            &strategy,
        )
        .unwrap()
        .unwrap();

        assert_eq!(args.len(), 1);
        assert!(matches!(args[0], Argument::Attachments(_)));
    }

    #[test]
    fn test_proxy_passthrough_wraps_the_envelope() {
        let mut envelope = MessageEnvelope::new(Payload::Text("raw".to_string()));
        envelope.add_attachment("ignored", attachment(9));
        let strategy = DefaultPayloadToArguments::default();

        let args = to_arguments(
            &envelope,
            envelope.payload(),
            MarshalMode::ProxyPassthrough,
            &strategy,
        )
        .unwrap()
        .unwrap();

        // Exactly one argument, no payload inspection, no attachment handling.
        assert_eq!(args.len(), 1);
        assert_eq!(args[0], Argument::Envelope(envelope));
    }
}

//! SOAP-action template resolution.
//!
//! A configured SOAP action may be a `${token}` template referencing
//! envelope properties, the target operation and the endpoint address.
//! Resolution is pure and total: unresolved tokens render as the empty
//! string, never as an error.

use crate::message::{MessageEnvelope, PropertyScope};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

const TEMPLATE_PATTERN: &str = r"\$\{([^}]+)\}";

/// Resolves SOAP-action templates against a per-call token map.
///
/// The template pattern is compiled lazily, once per resolver instance.
#[derive(Debug, Default)]
pub struct SoapActionResolver {
    pattern: OnceCell<Regex>,
}

impl SoapActionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn pattern(&self) -> &Regex {
        self.pattern
            .get_or_init(|| Regex::new(TEMPLATE_PATTERN).expect("template pattern is valid"))
    }

    /// Resolve `template` for one call.
    ///
    /// Token precedence, lowest to highest:
    /// 1. Invocation-scope properties.
    /// 2. Outbound-scope properties (outbound wins over invocation).
    /// 3. Every property of every scope, in scope order. This legacy pass
    ///    intentionally includes scopes that are never propagated to the
    ///    wire; it is preserved verbatim pending product-owner review.
    /// 4. Fixed operation and endpoint tokens.
    pub fn resolve(
        &self,
        template: &str,
        operation_name: &str,
        operation_namespace: &str,
        envelope: &MessageEnvelope,
        address: &Url,
        flow_name: Option<&str>,
    ) -> String {
        let mut tokens: BTreeMap<String, String> = BTreeMap::new();

        for (name, value) in envelope.scope_properties(PropertyScope::Invocation) {
            tokens.insert(name.to_string(), value.to_string());
        }
        for (name, value) in envelope.scope_properties(PropertyScope::Outbound) {
            tokens.insert(name.to_string(), value.to_string());
        }
        for (name, value) in envelope.all_properties() {
            tokens.insert(name.to_string(), value.to_string());
        }

        tokens.insert("method".to_string(), operation_name.to_string());
        tokens.insert(
            "methodNamespace".to_string(),
            operation_namespace.to_string(),
        );
        tokens.insert("address".to_string(), address.as_str().to_string());
        tokens.insert("scheme".to_string(), address.scheme().to_string());
        tokens.insert(
            "host".to_string(),
            address.host_str().unwrap_or_default().to_string(),
        );
        tokens.insert(
            "port".to_string(),
            address.port().map(|p| p.to_string()).unwrap_or_default(),
        );
        tokens.insert("path".to_string(), address.path().to_string());
        tokens.insert("hostInfo".to_string(), host_info(address));
        if let Some(flow) = flow_name {
            tokens.insert("serviceName".to_string(), flow.to_string());
        }

        let resolved = self
            .pattern()
            .replace_all(template, |caps: &regex::Captures<'_>| {
                tokens.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned();

        debug!(soap_action = %resolved, "resolved SOAP action for this call");

        resolved
    }
}

/// `scheme://host`, with a `:port` segment only when the address carries a
/// non-default port.
///
/// `Url` normalizes scheme-default ports away at parse time, so an address
/// written as `http://host:80/` is indistinguishable from `http://host/`:
/// `${port}` renders empty and `${hostInfo}` omits the segment for both.
/// The same normalization applies to the `port` token above.
fn host_info(address: &Url) -> String {
    let host = address.host_str().unwrap_or_default();
    match address.port() {
        Some(port) => format!("{}://{}:{}", address.scheme(), host, port),
        None => format!("{}://{}", address.scheme(), host),
    }
}

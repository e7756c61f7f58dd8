//! # Endpoint References
//!
//! WS-Addressing endpoint references and the helpers that turn them into
//! message headers. Reference parameters stored on an EPR are echoed as
//! headers on every message addressed to that EPR.

use crate::constants::{IDENTIFIER_LOCAL_NAME, WSE_NAMESPACE};
use crate::envelope::Header;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// One opaque reference parameter carried by an endpoint reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceParameter {
    /// Namespace URI of the header element.
    pub namespace: String,
    /// Local name of the header element.
    pub local_name: String,
    /// Text content.
    pub value: String,
}

impl ReferenceParameter {
    pub fn new(
        namespace: impl Into<String>,
        local_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    /// The WS-Eventing `Identifier` parameter naming a subscription.
    pub fn identifier(subscription_id: impl Into<String>) -> Self {
        Self::new(WSE_NAMESPACE, IDENTIFIER_LOCAL_NAME, subscription_id)
    }

    /// A parameter can only be copied onto an envelope if it is a qualified element.
    #[must_use]
    pub fn is_conforming(&self) -> bool {
        !self.namespace.trim().is_empty() && !self.local_name.trim().is_empty()
    }
}

/// An address plus optional reference parameters identifying a logical recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointReference {
    pub address: String,
    #[serde(default)]
    pub reference_parameters: Vec<ReferenceParameter>,
}

impl EndpointReference {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            reference_parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, parameter: ReferenceParameter) -> Self {
        self.reference_parameters.push(parameter);
        self
    }

    /// An EPR is usable as a push target only with an absolute address.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self.address.split_once("://") {
            Some((scheme, rest)) => !scheme.is_empty() && !rest.is_empty(),
            None => false,
        }
    }

    /// Value of the `Identifier` reference parameter, if present.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        find_identifier(&self.reference_parameters)
    }
}

/// Header for a fresh request to a plain address.
pub fn request(action: &str, to: &str) -> Header {
    Header {
        action: action.to_string(),
        to: to.to_string(),
        message_id: Uuid::new_v4(),
        relates_to: None,
        reference_parameters: Vec::new(),
    }
}

/// Header for a response to `request`.
pub fn reply(request: &Header, action: &str) -> Header {
    Header {
        action: action.to_string(),
        to: crate::constants::WSA_ANONYMOUS.to_string(),
        message_id: Uuid::new_v4(),
        relates_to: Some(request.message_id),
        reference_parameters: Vec::new(),
    }
}

/// Header addressed to `epr`, with its reference parameters copied on.
///
/// Non-conforming parameters are skipped with a warning; the header is
/// produced regardless.
pub fn to_epr(epr: &EndpointReference, action: &str) -> Header {
    let mut header = request(action, &epr.address);
    copy_reference_parameters(epr, &mut header);
    header
}

/// Copy `epr`'s reference parameters onto `header`. Returns the number copied.
pub fn copy_reference_parameters(epr: &EndpointReference, header: &mut Header) -> usize {
    let mut copied = 0;
    for parameter in &epr.reference_parameters {
        if !parameter.is_conforming() {
            warn!(
                address = %epr.address,
                namespace = %parameter.namespace,
                local_name = %parameter.local_name,
                "Skipping non-conforming reference parameter"
            );
            continue;
        }
        header.reference_parameters.push(parameter.clone());
        copied += 1;
    }
    copied
}

/// Subscription identifier echoed in a request header, if any.
pub fn identifier(header: &Header) -> Option<&str> {
    find_identifier(&header.reference_parameters)
}

fn find_identifier(parameters: &[ReferenceParameter]) -> Option<&str> {
    parameters
        .iter()
        .find(|p| p.namespace == WSE_NAMESPACE && p.local_name == IDENTIFIER_LOCAL_NAME)
        .map(|p| p.value.as_str())
}

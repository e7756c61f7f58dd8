//! # Protocol Literals
//!
//! Namespace URIs, WS-Addressing actions and fixed URIs of the WS-Eventing
//! (2004/08 member submission) push profile, as used by DPWS.

/// WS-Eventing namespace.
pub const WSE_NAMESPACE: &str = "http://schemas.xmlsoap.org/ws/2004/08/eventing";

/// WS-Addressing namespace.
pub const WSA_NAMESPACE: &str = "http://www.w3.org/2005/08/addressing";

/// Action used on every WS-Addressing fault message.
pub const WSA_FAULT_ACTION: &str = "http://www.w3.org/2005/08/addressing/fault";

/// Anonymous WS-Addressing endpoint.
pub const WSA_ANONYMOUS: &str = "http://www.w3.org/2005/08/addressing/anonymous";

// =============================================================================
// ACTIONS
// =============================================================================

pub const ACTION_SUBSCRIBE: &str = "http://schemas.xmlsoap.org/ws/2004/08/eventing/Subscribe";
pub const ACTION_SUBSCRIBE_RESPONSE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/SubscribeResponse";
pub const ACTION_RENEW: &str = "http://schemas.xmlsoap.org/ws/2004/08/eventing/Renew";
pub const ACTION_RENEW_RESPONSE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/RenewResponse";
pub const ACTION_GET_STATUS: &str = "http://schemas.xmlsoap.org/ws/2004/08/eventing/GetStatus";
pub const ACTION_GET_STATUS_RESPONSE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/GetStatusResponse";
pub const ACTION_UNSUBSCRIBE: &str = "http://schemas.xmlsoap.org/ws/2004/08/eventing/Unsubscribe";
pub const ACTION_UNSUBSCRIBE_RESPONSE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/UnsubscribeResponse";
pub const ACTION_SUBSCRIPTION_END: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/SubscriptionEnd";

// =============================================================================
// DELIVERY & FILTERING
// =============================================================================

/// The only supported delivery mode.
pub const DELIVERY_MODE_PUSH: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/DeliveryModes/Push";

/// The only supported filter dialect: a whitespace-separated list of action URIs.
pub const FILTER_DIALECT_ACTION: &str = "http://docs.oasis-open.org/ws-dd/ns/dpws/2009/01/Action";

/// DPWS namespace, home of the action filter dialect and its fault.
pub const DPWS_NAMESPACE: &str = "http://docs.oasis-open.org/ws-dd/ns/dpws/2009/01";

/// Local name of the reference parameter identifying a subscription.
pub const IDENTIFIER_LOCAL_NAME: &str = "Identifier";

// =============================================================================
// SUBSCRIPTION END STATUS
// =============================================================================

pub const STATUS_DELIVERY_FAILURE: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/DeliveryFailure";
pub const STATUS_SOURCE_SHUTTING_DOWN: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/SourceShuttingDown";
pub const STATUS_SOURCE_CANCELING: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/eventing/SourceCanceling";

/// Default maximum lease granted when the subscriber does not ask for one.
pub const DEFAULT_MAX_EXPIRES_SECS: u64 = 3600;

/// Default number of pending notifications per subscription.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

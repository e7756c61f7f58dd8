//! Validation of Subscribe and Renew request fields.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use wse_types::constants::{DELIVERY_MODE_PUSH, FILTER_DIALECT_ACTION};
use wse_types::{EndpointReference, EventingFault, Expires, Filter};

/// Only push delivery is supported; an absent mode means push.
pub fn validate_delivery_mode(mode: Option<&str>) -> Result<(), EventingFault> {
    match mode {
        None | Some(DELIVERY_MODE_PUSH) => Ok(()),
        Some(other) => Err(EventingFault::DeliveryModeRequestedUnavailable(other.to_string())),
    }
}

/// The NotifyTo element must hold exactly one valid endpoint reference.
pub fn validate_notify_to(notify_to: &[EndpointReference]) -> Result<EndpointReference, EventingFault> {
    match notify_to {
        [epr] if epr.is_valid() => Ok(epr.clone()),
        [epr] => Err(EventingFault::InvalidMessage(format!(
            "NotifyTo address is not an absolute URI: {}",
            epr.address
        ))),
        _ => Err(EventingFault::InvalidMessage(format!(
            "NotifyTo must contain exactly one endpoint reference, got {}",
            notify_to.len()
        ))),
    }
}

pub fn validate_end_to(end_to: Option<&EndpointReference>) -> Result<(), EventingFault> {
    match end_to {
        Some(epr) if !epr.is_valid() => Err(EventingFault::InvalidMessage(format!(
            "EndTo address is not an absolute URI: {}",
            epr.address
        ))),
        _ => Ok(()),
    }
}

/// Lease to grant for a requested Expires.
///
/// Absent grants `max`; a non-positive request is rejected; anything else
/// is capped at `max`.
pub fn grant_expires(
    requested: Option<&Expires>,
    max: chrono::Duration,
    now: DateTime<Utc>,
) -> Result<chrono::Duration, EventingFault> {
    let Some(expires) = requested else {
        return Ok(max);
    };

    let duration = expires.relative_to(now);
    if duration <= chrono::Duration::zero() {
        return Err(EventingFault::InvalidExpirationTime(expires.to_string()));
    }
    Ok(duration.min(max))
}

/// Parse an action-list filter into its set of action URIs.
///
/// `offered` is the set of actions the source publishes; when non-empty, every
/// filtered action must be in it.
pub fn parse_action_filter(
    filter: Option<&Filter>,
    offered: &BTreeSet<String>,
) -> Result<BTreeSet<String>, EventingFault> {
    let Some(filter) = filter else {
        return Err(EventingFault::EventSourceUnableToProcess(
            "subscriptions without a filter are not supported".to_string(),
        ));
    };

    match filter.dialect.as_deref() {
        Some(FILTER_DIALECT_ACTION) => {}
        Some(other) => return Err(EventingFault::FilteringRequestedUnavailable(other.to_string())),
        None => {
            return Err(EventingFault::FilteringRequestedUnavailable(
                "filter dialect missing".to_string(),
            ))
        }
    }

    let mut actions = BTreeSet::new();
    for token in filter.content.split_whitespace() {
        if !is_absolute_uri(token) {
            return Err(EventingFault::InvalidMessage(format!(
                "filter action is not an absolute URI: {token}"
            )));
        }
        actions.insert(token.to_string());
    }

    if actions.is_empty() {
        return Err(EventingFault::EventSourceUnableToProcess(
            "filter names no actions".to_string(),
        ));
    }

    if !offered.is_empty() {
        if let Some(unknown) = actions.iter().find(|a| !offered.contains(*a)) {
            return Err(EventingFault::FilterActionNotSupported(unknown.clone()));
        }
    }

    Ok(actions)
}

/// `scheme:rest` with an alphabetic first scheme character.
fn is_absolute_uri(token: &str) -> bool {
    match token.split_once(':') {
        Some((scheme, rest)) => {
            !rest.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

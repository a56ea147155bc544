//! Matching a requested call against a controller's allowed calls.
//!
//! An entry grants a request when each of its four dimensions matches:
//! - call types: every required bit is present in the entry
//! - address: wildcard or equal to the target
//! - standard: wildcard or the target reports supporting the interface id
//! - selector: wildcard, equal to the first four payload bytes, or all-zero for empty payloads

use alloy_primitives::Address;
use key_manager_types::CallTypes;
use tracing::trace;

use crate::{
    context::{cost, CostMeter},
    decoder::AllowedCall,
    errors::{KeyManagerError, Result},
    store::InterfaceSupport,
};

/// The shape of a call being authorized.
#[derive(Clone, Copy, Debug)]
pub struct RequestedCall<'a> {
    pub call_types: CallTypes,
    pub target: Address,
    pub data: &'a [u8],
}

impl RequestedCall<'_> {
    fn selector_matches(&self, selector: [u8; 4]) -> bool {
        match self.data.get(..4) {
            Some(head) => head == selector,
            None => selector == [0u8; 4],
        }
    }
}

/// First entry granting `request`, scanning in stored order.
///
/// Fails with `InvalidWhitelistedCall` as soon as an all-wildcard entry is reached.
pub fn find_match<'e>(
    controller: Address,
    entries: &'e [AllowedCall],
    request: &RequestedCall<'_>,
    interfaces: &dyn InterfaceSupport,
    meter: &mut CostMeter,
) -> Result<Option<&'e AllowedCall>> {
    for entry in entries {
        meter.charge(cost::ALLOWED_CALL_ENTRY)?;
        if entry.is_unrestricted() {
            return Err(KeyManagerError::InvalidWhitelistedCall { controller });
        }
        if matches(entry, request, interfaces) {
            trace!(%controller, target = %request.target, "allowed call matched");
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

pub fn is_allowed(
    controller: Address,
    entries: &[AllowedCall],
    request: &RequestedCall<'_>,
    interfaces: &dyn InterfaceSupport,
    meter: &mut CostMeter,
) -> Result<bool> {
    Ok(find_match(controller, entries, request, interfaces, meter)?.is_some())
}

fn matches(entry: &AllowedCall, request: &RequestedCall<'_>, interfaces: &dyn InterfaceSupport) -> bool {
    entry.call_types.covers(request.call_types)
        && (entry.any_target() || entry.target == request.target)
        && (entry.any_standard() || interfaces.supports_interface(request.target, entry.standard))
        && (entry.any_selector() || request.selector_matches(entry.selector))
}

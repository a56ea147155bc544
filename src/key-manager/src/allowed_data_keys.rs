//! Matching data keys against a controller's allowed data key prefixes.

use alloy_primitives::B256;

use crate::{
    context::{cost, CostMeter},
    decoder::AllowedDataKey,
    errors::Result,
};

/// Some entry is equal to `key` or a prefix of it.
pub fn is_allowed(entries: &[AllowedDataKey], key: &B256, meter: &mut CostMeter) -> Result<bool> {
    for entry in entries {
        meter.charge(cost::ALLOWED_DATA_KEY_ENTRY)?;
        if entry.matches(key) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// First key in `keys` no entry covers.
pub fn first_disallowed<'k>(
    entries: &[AllowedDataKey],
    keys: impl IntoIterator<Item = &'k B256>,
    meter: &mut CostMeter,
) -> Result<Option<B256>> {
    for key in keys {
        if !is_allowed(entries, key, meter)? {
            return Ok(Some(*key));
        }
    }
    Ok(None)
}

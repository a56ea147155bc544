//! Reads of controller configuration from the account store.
//!
//! Every read is charged to the request's meter. Allow-lists are decoded here so callers only
//! ever see typed entries.

use alloy_primitives::{Address, U256};
use key_manager_types::{keys, Permissions};

use crate::{
    context::{cost, CostMeter},
    decoder::{decode_allowed_calls, decode_allowed_data_keys, AllowedCall, AllowedDataKey},
    errors::{AllowListKind, KeyManagerError, Result},
    store::DataStore,
    utils::bytes::be_value_to_u256,
};

pub fn read_permissions(store: &dyn DataStore, controller: Address, meter: &mut CostMeter) -> Result<Permissions> {
    meter.charge(cost::STORAGE_READ)?;
    Ok(Permissions::from_word(&store.get(&keys::permissions_key(controller))))
}

pub fn read_allowed_calls(
    store: &dyn DataStore,
    controller: Address,
    meter: &mut CostMeter,
) -> Result<Vec<AllowedCall>> {
    meter.charge(cost::STORAGE_READ)?;
    let value = store.get(&keys::allowed_calls_key(controller));
    decode_allowed_calls(&value)
        .map_err(|reason| KeyManagerError::malformed_allow_list(AllowListKind::Calls, &value, reason))
}

pub fn read_allowed_data_keys(
    store: &dyn DataStore,
    controller: Address,
    meter: &mut CostMeter,
) -> Result<Vec<AllowedDataKey>> {
    meter.charge(cost::STORAGE_READ)?;
    let value = store.get(&keys::allowed_data_keys_key(controller));
    decode_allowed_data_keys(&value)
        .map_err(|reason| KeyManagerError::malformed_allow_list(AllowListKind::DataKeys, &value, reason))
}

/// Length stored under `AddressPermissions[]`. Values wider than 32 bytes read as `U256::MAX`.
pub fn read_controller_count(store: &dyn DataStore, meter: &mut CostMeter) -> Result<U256> {
    meter.charge(cost::STORAGE_READ)?;
    let value = store.get(&keys::ADDRESS_PERMISSIONS_ARRAY);
    Ok(be_value_to_u256(&value).unwrap_or(U256::MAX))
}

/// No controller has been configured yet.
pub fn is_bootstrap(store: &dyn DataStore, meter: &mut CostMeter) -> Result<bool> {
    Ok(read_controller_count(store, meter)?.is_zero())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Bytes;
    use key_manager_types::{Permission, ALL_PERMISSIONS};

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn missing_entries_read_as_empty() {
        let store = MemoryStore::new();
        let mut meter = CostMeter::unlimited();
        let who = Address::repeat_byte(1);
        assert!(read_permissions(&store, who, &mut meter).unwrap().is_empty());
        assert!(read_allowed_calls(&store, who, &mut meter).unwrap().is_empty());
        assert!(read_allowed_data_keys(&store, who, &mut meter).unwrap().is_empty());
        assert!(is_bootstrap(&store, &mut meter).unwrap());
        assert_eq!(meter.used(), 4 * cost::STORAGE_READ);
    }

    #[test]
    fn reads_stored_values() {
        let who = Address::repeat_byte(1);
        let store = MemoryStore::with_entries([
            (
                keys::permissions_key(who),
                Bytes::copy_from_slice(&Permissions::from(Permission::Call).to_word()),
            ),
            (keys::ADDRESS_PERMISSIONS_ARRAY, Bytes::from(vec![0u8; 15].into_iter().chain([1]).collect::<Vec<_>>())),
        ]);
        let mut meter = CostMeter::unlimited();
        let permissions = read_permissions(&store, who, &mut meter).unwrap();
        assert!(permissions.has(Permission::Call));
        assert!(!permissions.contains(ALL_PERMISSIONS));
        assert_eq!(read_controller_count(&store, &mut meter).unwrap(), U256::from(1u8));
        assert!(!is_bootstrap(&store, &mut meter).unwrap());
    }

    #[test]
    fn malformed_allow_list_reports_kind() {
        let who = Address::repeat_byte(1);
        let store = MemoryStore::with_entries([(keys::allowed_calls_key(who), Bytes::from_static(&[0x00]))]);
        let err = read_allowed_calls(&store, who, &mut CostMeter::unlimited()).unwrap_err();
        assert!(matches!(
            err,
            KeyManagerError::MalformedAllowList {
                kind: AllowListKind::Calls,
                ..
            }
        ));
    }
}

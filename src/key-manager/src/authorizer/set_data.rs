//! Capability and allow-list checks for ERC725Y writes.
//!
//! Keys that configure the account itself (controllers, permissions, allow-lists, extensions,
//! universal receiver delegates) need the matching management permission. Everything else is
//! plain data governed by SETDATA and the allowed data keys.

use alloy_primitives::{Bytes, B256};
use key_manager_types::{keys, Permission};

use super::Checker;
use crate::{
    allowed_data_keys,
    context::{cost, CostMeter},
    controller,
    decoder::{decode_allowed_calls, decode_allowed_data_keys, AllowedDataKey},
    errors::{AllowListKind, KeyManagerError, Result},
    utils::bytes::be_value_to_u256,
};

/// What a single key write needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Requirement {
    Permission(Permission),
    DataKey,
}

impl Checker<'_, '_> {
    pub(super) fn verify_set_data<'k>(
        &self,
        meter: &mut CostMeter,
        entries: impl IntoIterator<Item = (&'k B256, &'k Bytes)>,
    ) -> Result<()> {
        let mut allowed: Option<Vec<AllowedDataKey>> = None;
        for (key, value) in entries {
            match self.classify(meter, key, value)? {
                Requirement::Permission(permission) => self.require(permission)?,
                Requirement::DataKey => {
                    if self.has(Permission::SuperSetData) {
                        continue;
                    }
                    self.require(Permission::SetData)?;
                    if allowed.is_none() {
                        allowed = Some(controller::read_allowed_data_keys(
                            self.account.store,
                            self.controller,
                            meter,
                        )?);
                    }
                    let prefixes = allowed.as_deref().unwrap_or_default();
                    if !allowed_data_keys::is_allowed(prefixes, key, meter)? {
                        return Err(KeyManagerError::NotAllowedDataKey {
                            controller: self.controller,
                            key: *key,
                        });
                    }
                },
            }
        }
        Ok(())
    }

    fn classify(&self, meter: &mut CostMeter, key: &B256, value: &Bytes) -> Result<Requirement> {
        if *key == keys::ADDRESS_PERMISSIONS_ARRAY {
            let new_len = (value.len() <= 16)
                .then(|| be_value_to_u256(value))
                .flatten()
                .ok_or_else(|| invalid_array_value(key, value))?;
            let current = controller::read_controller_count(self.account.store, meter)?;
            return Ok(add_or_edit(new_len > current));
        }
        if keys::has_prefix(key, &keys::ADDRESS_PERMISSIONS_ARRAY_PREFIX) {
            if !value.is_empty() && value.len() != 20 {
                return Err(invalid_array_value(key, value));
            }
            return Ok(add_or_edit(self.is_unset(meter, key)?));
        }
        if keys::has_prefix(key, &keys::PERMISSIONS_PREFIX) {
            return Ok(add_or_edit(self.is_unset(meter, key)?));
        }
        if keys::has_prefix(key, &keys::ALLOWED_CALLS_PREFIX) {
            decode_allowed_calls(value)
                .map_err(|reason| KeyManagerError::malformed_allow_list(AllowListKind::Calls, value, reason))?;
            return Ok(add_or_edit(self.is_unset(meter, key)?));
        }
        if keys::has_prefix(key, &keys::ALLOWED_DATA_KEYS_PREFIX) {
            decode_allowed_data_keys(value)
                .map_err(|reason| KeyManagerError::malformed_allow_list(AllowListKind::DataKeys, value, reason))?;
            return Ok(add_or_edit(self.is_unset(meter, key)?));
        }
        if keys::has_prefix(key, &keys::ADDRESS_PERMISSIONS_PREFIX) {
            return Err(KeyManagerError::NotRecognisedPermissionKey { key: *key });
        }
        if keys::has_prefix(key, &keys::EXTENSION_PREFIX) {
            return Ok(Requirement::Permission(if self.is_unset(meter, key)? {
                Permission::AddExtensions
            } else {
                Permission::ChangeExtensions
            }));
        }
        if *key == keys::UNIVERSAL_RECEIVER_DELEGATE
            || keys::has_prefix(key, &keys::UNIVERSAL_RECEIVER_DELEGATE_PREFIX)
        {
            return Ok(Requirement::Permission(if self.is_unset(meter, key)? {
                Permission::AddUniversalReceiverDelegate
            } else {
                Permission::ChangeUniversalReceiverDelegate
            }));
        }
        Ok(Requirement::DataKey)
    }

    fn is_unset(&self, meter: &mut CostMeter, key: &B256) -> Result<bool> {
        meter.charge(cost::STORAGE_READ)?;
        Ok(self.account.store.get(key).is_empty())
    }
}

fn add_or_edit(adds: bool) -> Requirement {
    Requirement::Permission(if adds {
        Permission::AddController
    } else {
        Permission::EditPermissions
    })
}

fn invalid_array_value(key: &B256, value: &Bytes) -> KeyManagerError {
    KeyManagerError::InvalidPermissionArrayValue {
        key: *key,
        value: value.clone(),
    }
}

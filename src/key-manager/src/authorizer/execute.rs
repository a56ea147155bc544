//! Capability and allow-list checks for ERC725X calls.

use alloy_primitives::Address;
use key_manager_types::{CallTypes, OperationType, Permission};
use tracing::trace;

use super::Checker;
use crate::{
    allowed_calls::{self, RequestedCall},
    config::SuperPrecedence,
    context::CostMeter,
    controller,
    errors::{KeyManagerError, Result},
    operation::ExecuteCall,
    utils::bytes::selector_of,
};

impl Checker<'_, '_> {
    pub(super) fn verify_execute(&self, meter: &mut CostMeter, call: &ExecuteCall) -> Result<()> {
        match call.operation {
            OperationType::Call => self.verify_call(meter, call),
            OperationType::StaticCall => self.verify_static_call(meter, call),
            OperationType::Create | OperationType::Create2 => self.verify_deploy(meter, call),
            OperationType::DelegateCall => Err(KeyManagerError::DelegateCallDisallowed),
        }
    }

    fn verify_call(&self, meter: &mut CostMeter, call: &ExecuteCall) -> Result<()> {
        let sends_value = !call.value.is_zero();
        let can_transfer = self.has_either(Permission::TransferValue);

        if sends_value && !can_transfer {
            return Err(self.not_authorised(Permission::TransferValue));
        }
        if call.data.is_empty() {
            // Plain value transfer: decided by the value bits alone.
            return if can_transfer {
                Ok(())
            } else {
                Err(self.not_authorised(Permission::TransferValue))
            };
        }
        if !self.has_either(Permission::Call) {
            return Err(self.not_authorised(Permission::Call));
        }
        if call.data.len() < 4 && sends_value {
            trace!(len = call.data.len(), "graffiti payload");
            return Ok(());
        }
        if self.bypasses_allow_list(Permission::SuperCall, sends_value) {
            return Ok(());
        }

        let mut required = CallTypes::CALL;
        if sends_value {
            required = required | CallTypes::VALUE;
        }
        self.verify_allowed_call(meter, required, call.target, &call.data)
    }

    fn verify_static_call(&self, meter: &mut CostMeter, call: &ExecuteCall) -> Result<()> {
        if !call.value.is_zero() {
            return Err(KeyManagerError::ValueNotAllowedInStaticCall);
        }
        if !self.has_either(Permission::StaticCall) {
            return Err(self.not_authorised(Permission::StaticCall));
        }
        if self.has(Permission::SuperStaticCall) {
            return Ok(());
        }
        self.verify_allowed_call(meter, CallTypes::STATICCALL, call.target, &call.data)
    }

    fn verify_deploy(&self, meter: &mut CostMeter, call: &ExecuteCall) -> Result<()> {
        self.require(Permission::Deploy)?;
        if call.value.is_zero() {
            return Ok(());
        }
        if !self.has_either(Permission::TransferValue) {
            return Err(self.not_authorised(Permission::TransferValue));
        }
        if self.has(Permission::SuperTransferValue) {
            return Ok(());
        }
        self.verify_allowed_call(meter, CallTypes::CALL | CallTypes::VALUE, Address::ZERO, &[])
    }

    /// SUPER permission for the call type skips the allow-list, subject to the precedence rule.
    fn bypasses_allow_list(&self, super_permission: Permission, sends_value: bool) -> bool {
        if !self.has(super_permission) {
            return false;
        }
        match self.authorizer.super_precedence {
            SuperPrecedence::Advisory => true,
            SuperPrecedence::Strict => !sends_value || self.has(Permission::SuperTransferValue),
        }
    }

    fn verify_allowed_call(
        &self,
        meter: &mut CostMeter,
        call_types: CallTypes,
        target: Address,
        data: &[u8],
    ) -> Result<()> {
        let entries = controller::read_allowed_calls(self.account.store, self.controller, meter)?;
        if entries.is_empty() {
            return Err(KeyManagerError::NoCallsAllowed {
                controller: self.controller,
            });
        }
        let request = RequestedCall {
            call_types,
            target,
            data,
        };
        if allowed_calls::is_allowed(self.controller, &entries, &request, self.account.interfaces, meter)? {
            Ok(())
        } else {
            Err(KeyManagerError::NotAllowedCall {
                controller: self.controller,
                target,
                selector: selector_of(data),
            })
        }
    }

    fn not_authorised(&self, permission: Permission) -> KeyManagerError {
        KeyManagerError::not_authorised(self.controller, permission)
    }
}

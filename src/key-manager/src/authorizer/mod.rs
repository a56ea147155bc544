//! Permission authorizer: the central allow/deny decision for one controller request.
//!
//! The decision procedure fails fast and the order of checks is observable through the error
//! returned:
//! 1. resolve the controller's permissions (bootstrap controller or stored bitmask)
//! 2. reject delegate calls unconditionally
//! 3. channel and nesting gates (EXECUTE_RELAY_CALL, REENTRANCY)
//! 4. per-operation capability bits, then the allow-lists for non-SUPER holders

mod execute;
mod set_data;

use alloy_primitives::Address;
use key_manager_types::{OperationType, Permission, Permissions, ALL_PERMISSIONS};
use tracing::{debug, instrument, warn};

use crate::{
    config::{KeyManagerConfig, SuperPrecedence},
    context::CostMeter,
    controller,
    errors::{KeyManagerError, Result},
    operation::Operation,
    store::AccountView,
    verification::VerificationResult,
};

/// How the request reached the key manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Direct,
    /// Signed by `controller` and submitted by a third party.
    Relay,
}

#[derive(Clone, Copy, Debug)]
pub struct AuthorizationRequest<'a> {
    pub controller: Address,
    pub operation: &'a Operation,
    pub channel: Channel,
    /// Zero for top-level requests, one more for each re-entrant call.
    pub depth: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermissionAuthorizer {
    initial_controller: Option<Address>,
    super_precedence: SuperPrecedence,
}

impl PermissionAuthorizer {
    pub fn new(config: &KeyManagerConfig) -> Self {
        Self {
            initial_controller: config.initial_controller,
            super_precedence: config.super_precedence,
        }
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(controller = %request.controller, operation = request.operation.name(), depth = request.depth)
    )]
    pub fn authorize(
        &self,
        account: &AccountView<'_>,
        meter: &mut CostMeter,
        request: &AuthorizationRequest<'_>,
    ) -> Result<VerificationResult> {
        let outcome = self.check(account, meter, request);
        match &outcome {
            Ok(()) => debug!(used = meter.used(), "authorized"),
            Err(err) => warn!(error = %err, "authorization rejected"),
        }
        outcome.map(|()| VerificationResult::Approved)
    }

    fn check(
        &self,
        account: &AccountView<'_>,
        meter: &mut CostMeter,
        request: &AuthorizationRequest<'_>,
    ) -> Result<()> {
        let controller = request.controller;
        let permissions = self.resolve_permissions(account, meter, controller)?;

        let execute_calls = request.operation.execute_calls();
        if execute_calls
            .iter()
            .any(|call| call.operation == OperationType::DelegateCall)
        {
            return Err(KeyManagerError::DelegateCallDisallowed);
        }

        if request.channel == Channel::Relay {
            require(controller, permissions, Permission::ExecuteRelayCall)?;
        }
        if request.depth > 0 {
            require(controller, permissions, Permission::Reentrancy)?;
        }

        let checker = Checker {
            authorizer: self,
            account,
            controller,
            permissions,
        };
        match request.operation {
            Operation::SetData { key, value } => checker.verify_set_data(meter, [(key, value)]),
            Operation::SetDataBatch { keys, values } => {
                checker.verify_set_data(meter, keys.iter().zip(values.iter()))
            },
            Operation::Execute(_) | Operation::ExecuteBatch(_) => execute_calls
                .iter()
                .try_for_each(|call| checker.verify_execute(meter, call)),
            Operation::TransferOwnership { .. } => require(controller, permissions, Permission::ChangeOwner),
        }
    }

    /// Stored bitmask of `controller`, or every permission for the bootstrap controller.
    pub fn resolve_permissions(
        &self,
        account: &AccountView<'_>,
        meter: &mut CostMeter,
        controller: Address,
    ) -> Result<Permissions> {
        let permissions = controller::read_permissions(account.store, controller, meter)?;
        if !permissions.is_empty() {
            return Ok(permissions);
        }
        if self.initial_controller == Some(controller) && controller::is_bootstrap(account.store, meter)? {
            debug!(%controller, "bootstrap controller");
            return Ok(ALL_PERMISSIONS);
        }
        Err(KeyManagerError::NoPermissionsSet { controller })
    }

    /// Whether `signer` may sign relay calls or messages for the account.
    pub fn is_permitted_signer(
        &self,
        account: &AccountView<'_>,
        meter: &mut CostMeter,
        signer: Address,
    ) -> Result<bool> {
        match self.resolve_permissions(account, meter, signer) {
            Ok(_) => Ok(true),
            Err(KeyManagerError::NoPermissionsSet { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Per-request state shared by the operation checks.
struct Checker<'r, 'a> {
    authorizer: &'r PermissionAuthorizer,
    account: &'r AccountView<'a>,
    controller: Address,
    permissions: Permissions,
}

impl Checker<'_, '_> {
    fn require(&self, permission: Permission) -> Result<()> {
        require(self.controller, self.permissions, permission)
    }

    fn has(&self, permission: Permission) -> bool {
        self.permissions.has(permission)
    }

    /// Either the permission or its SUPER variant.
    fn has_either(&self, permission: Permission) -> bool {
        self.has(permission) || permission.super_variant().is_some_and(|p| self.has(p))
    }
}

fn require(controller: Address, permissions: Permissions, permission: Permission) -> Result<()> {
    if permissions.has(permission) {
        Ok(())
    } else {
        Err(KeyManagerError::not_authorised(controller, permission))
    }
}

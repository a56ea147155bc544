//! Permission-based access control and call verification for controlled accounts.
//!
//! A [`KeyManager`] owns a [`ControlledAccount`] and lets any number of controllers act on it,
//! each limited by a permission bitmask and by allow-lists of calls and data keys stored in the
//! account itself. Controllers call in directly, through signed relay calls, or by calling the
//! account, which then asks the key manager to verify the call before and after executing it.

pub mod account;
pub mod allowed_calls;
pub mod allowed_data_keys;
pub mod authorizer;
pub mod config;
pub mod context;
pub mod controller;
pub mod decoder;
pub mod errors;
pub mod key_manager;
pub mod lsp20;
pub mod nonce;
pub mod operation;
pub mod relay;
pub mod store;
pub mod utils;
pub mod verification;

pub use account::{ControlledAccount, Owner};
pub use authorizer::{AuthorizationRequest, Channel, PermissionAuthorizer};
pub use config::{ConfigError, KeyManagerConfig, SuperPrecedence};
pub use context::{CostMeter, RequestContext};
pub use decoder::{AllowedCall, AllowedDataKey};
pub use errors::{AllowListKind, DecodeError, KeyManagerError, Result};
pub use key_manager::{KeyManager, RelayCall};
pub use nonce::NonceChannelManager;
pub use operation::{ExecuteCall, Operation};
pub use relay::RelaySignatureVerifier;
pub use store::{
    AccountView, DataStore, ExecutionOutcome, Executor, ExtensionResolver, InterfaceSupport, Journaled,
    MemoryStore, ReentrantCall, RecordingExecutor,
};
pub use verification::{CallDescriptor, CallVerifier, RemoteVerifier, VerificationResult, VerifierTransport};

pub use key_manager_types::{
    keys, CallTypes, OperationType, Permission, Permissions, RelayCallEnvelope, ValidityWindow, ALL_PERMISSIONS,
};

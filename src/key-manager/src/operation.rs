//! Typed view of the calldata a controller sends to an account.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use key_manager_types::OperationType;

use crate::{
    errors::{KeyManagerError, Result},
    lsp20::interfaces::IERC725,
    utils::bytes::selector_of,
};

/// One ERC725X call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecuteCall {
    pub operation: OperationType,
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
}

impl ExecuteCall {
    pub fn call(target: Address, value: U256, data: impl Into<Bytes>) -> Self {
        Self {
            operation: OperationType::Call,
            target,
            value,
            data: data.into(),
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        selector_of(&self.data)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    SetData { key: B256, value: Bytes },
    SetDataBatch { keys: Vec<B256>, values: Vec<Bytes> },
    Execute(ExecuteCall),
    ExecuteBatch(Vec<ExecuteCall>),
    TransferOwnership { new_owner: Address },
}

impl Operation {
    /// Decode an account payload. Unknown selectors fail with `InvalidErc725Function`.
    pub fn decode(calldata: &[u8]) -> Result<Self> {
        Self::try_decode(calldata)?
            .ok_or_else(|| KeyManagerError::InvalidErc725Function(selector_of(calldata)))
    }

    /// Like [`Operation::decode`], but returns `None` for selectors outside the ERC725 surface.
    pub fn try_decode(calldata: &[u8]) -> Result<Option<Self>> {
        if calldata.len() < 4 {
            return Ok(None);
        }
        let selector = selector_of(calldata);
        let operation = match selector {
            IERC725::setDataCall::SELECTOR => {
                let call = IERC725::setDataCall::abi_decode(calldata, true).map_err(malformed)?;
                Operation::SetData {
                    key: call.dataKey,
                    value: call.dataValue,
                }
            },
            IERC725::setDataBatchCall::SELECTOR => {
                let call = IERC725::setDataBatchCall::abi_decode(calldata, true).map_err(malformed)?;
                if call.dataKeys.len() != call.dataValues.len() {
                    return Err(KeyManagerError::BatchParamsLengthMismatch);
                }
                Operation::SetDataBatch {
                    keys: call.dataKeys,
                    values: call.dataValues,
                }
            },
            IERC725::executeCall::SELECTOR => {
                let call = IERC725::executeCall::abi_decode(calldata, true).map_err(malformed)?;
                Operation::Execute(ExecuteCall {
                    operation: operation_type(call.operationType)?,
                    target: call.target,
                    value: call.value,
                    data: call.data,
                })
            },
            IERC725::executeBatchCall::SELECTOR => {
                let call = IERC725::executeBatchCall::abi_decode(calldata, true).map_err(malformed)?;
                let len = call.operationsType.len();
                if call.targets.len() != len || call.values.len() != len || call.datas.len() != len {
                    return Err(KeyManagerError::BatchParamsLengthMismatch);
                }
                let calls = call
                    .operationsType
                    .into_iter()
                    .zip(call.targets)
                    .zip(call.values)
                    .zip(call.datas)
                    .map(|(((operation, target), value), data)| {
                        Ok(ExecuteCall {
                            operation: operation_type(operation)?,
                            target,
                            value,
                            data,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Operation::ExecuteBatch(calls)
            },
            IERC725::transferOwnershipCall::SELECTOR => {
                let call = IERC725::transferOwnershipCall::abi_decode(calldata, true).map_err(malformed)?;
                Operation::TransferOwnership {
                    new_owner: call.newOwner,
                }
            },
            _ => return Ok(None),
        };
        Ok(Some(operation))
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Operation::SetData { key, value } => IERC725::setDataCall {
                dataKey: *key,
                dataValue: value.clone(),
            }
            .abi_encode(),
            Operation::SetDataBatch { keys, values } => IERC725::setDataBatchCall {
                dataKeys: keys.clone(),
                dataValues: values.clone(),
            }
            .abi_encode(),
            Operation::Execute(call) => IERC725::executeCall {
                operationType: U256::from(call.operation as u8),
                target: call.target,
                value: call.value,
                data: call.data.clone(),
            }
            .abi_encode(),
            Operation::ExecuteBatch(calls) => IERC725::executeBatchCall {
                operationsType: calls.iter().map(|c| U256::from(c.operation as u8)).collect(),
                targets: calls.iter().map(|c| c.target).collect(),
                values: calls.iter().map(|c| c.value).collect(),
                datas: calls.iter().map(|c| c.data.clone()).collect(),
            }
            .abi_encode(),
            Operation::TransferOwnership { new_owner } => IERC725::transferOwnershipCall {
                newOwner: *new_owner,
            }
            .abi_encode(),
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::SetData { .. } => "setData",
            Operation::SetDataBatch { .. } => "setDataBatch",
            Operation::Execute(_) => "execute",
            Operation::ExecuteBatch(_) => "executeBatch",
            Operation::TransferOwnership { .. } => "transferOwnership",
        }
    }

    /// Execute calls carried by the operation, in order.
    pub fn execute_calls(&self) -> &[ExecuteCall] {
        match self {
            Operation::Execute(call) => core::slice::from_ref(call),
            Operation::ExecuteBatch(calls) => calls,
            _ => &[],
        }
    }
}

fn malformed(err: alloy_sol_types::Error) -> KeyManagerError {
    KeyManagerError::MalformedPayload(err.to_string())
}

fn operation_type(raw: U256) -> Result<OperationType> {
    u8::try_from(raw)
        .ok()
        .and_then(|byte| OperationType::try_from(byte).ok())
        .ok_or_else(|| KeyManagerError::MalformedPayload(format!("unknown operation type {raw}")))
}

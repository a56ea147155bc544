//! Solidity ABI of the account surface and the LSP20 verifier.

use alloy_sol_types::sol;

sol! {
    /// ERC725 account functions a controller can ask for.
    interface IERC725 {
        function setData(bytes32 dataKey, bytes dataValue) external payable;
        function setDataBatch(bytes32[] dataKeys, bytes[] dataValues) external payable;
        function execute(uint256 operationType, address target, uint256 value, bytes data)
            external
            payable
            returns (bytes);
        function executeBatch(uint256[] operationsType, address[] targets, uint256[] values, bytes[] datas)
            external
            payable
            returns (bytes[]);
        function transferOwnership(address newOwner) external;
    }

    interface ILSP20 {
        function lsp20VerifyCall(address requestor, address target, address caller, uint256 value, bytes callData)
            external
            returns (bytes4);
        function lsp20VerifyCallResult(bytes32 callHash, bytes callResult) external returns (bytes4);
    }
}

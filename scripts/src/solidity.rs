//! Definitions of Solidity functions called during deployment

use alloy::sol;

sol! {
    /// The metadata and balance methods of an ERC20 token
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
    }

    /// A token wrapping other tokens into a single bridged token
    #[sol(rpc)]
    interface IFungibleTokenWrapper {
        function DEFAULT_ADMIN_ROLE() external view returns (bytes32);
        function MINTER_ROLE() external view returns (bytes32);
        function PAUSER_ROLE() external view returns (bytes32);
        function hasRole(bytes32 role, address account) external view returns (bool);
        function grantRole(bytes32 role, address account) external;
        function revokeRole(bytes32 role, address account) external;
        function mint(address to, uint256 amount) external;
        function initialize(
            uint16 feePercentage,
            address feeRecipient,
            address handler,
            uint256 limit,
            bool isNativeAllowed,
            address admin
        ) external;
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function proposalNonce() external view returns (uint32);
    }

    /// The bridge entrypoint, executing proposals signed by its governor
    #[sol(rpc)]
    interface ISignatureBridge {
        function governor() external view returns (address);
        function proposalNonce() external view returns (uint32);
        function transferOwnership(address newOwner, uint32 nonce) external;
        function adminSetResourceWithSignature(
            bytes32 resourceID,
            bytes4 functionSig,
            uint32 nonce,
            bytes32 newResourceID,
            address handlerAddress,
            bytes memory sig
        ) external;
        function executeProposalWithSignature(bytes calldata data, bytes memory sig) external;
    }

    /// The external data of a VAnchor transaction, bound into the proof by its hash
    #[derive(Debug, Default)]
    struct ExtData {
        address recipient;
        int256 extAmount;
        address relayer;
        uint256 fee;
        uint256 refund;
        address token;
        bytes encryptedOutput1;
        bytes encryptedOutput2;
    }

    /// The external data of a VAnchor transaction, without the encryptions
    #[derive(Debug, Default)]
    struct CommonExtData {
        address recipient;
        int256 extAmount;
        address relayer;
        uint256 fee;
        uint256 refund;
        address token;
    }

    /// The public inputs of a VAnchor transaction proof
    #[derive(Debug, Default)]
    struct PublicInputs {
        bytes roots;
        bytes extensionRoots;
        uint256[] inputNullifiers;
        uint256[2] outputCommitments;
        uint256 publicAmount;
        uint256 extDataHash;
    }

    /// The encrypted outputs of a VAnchor transaction
    #[derive(Debug, Default)]
    struct Encryptions {
        bytes encryptedOutput1;
        bytes encryptedOutput2;
    }

    /// A variable anchor with an on-chain Merkle tree
    #[sol(rpc)]
    interface IVAnchor {
        function initialize(uint256 minimalWithdrawalAmount, uint256 maximumDepositAmount) external;
        function transact(
            bytes memory proof,
            bytes memory auxPublicInputs,
            CommonExtData memory externalData,
            PublicInputs memory publicInputs,
            Encryptions memory encryptions
        ) external payable;
        function getLastRoot() external view returns (uint256);
        function getLatestNeighborRoots() external view returns (uint256[] memory);
        function maxEdges() external view returns (uint8);
        function token() external view returns (address);
    }
}

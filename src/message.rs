//! CCIP message construction and fee quoting
//!
//! Builds the `EVM2AnyMessage` struct the router consumes and asks the
//! router for a fee quote. The wire format is the router's: the receiver is
//! an ABI-encoded address, extra args are the 4-byte `EVMExtraArgsV1` tag
//! followed by an ABI-encoded gas limit, and the fee token defaults to the
//! zero-address sentinel meaning "pay in native gas".
//!
//! Messages are built fresh for every quote and consumed exactly once by
//! the submit call; nothing here mutates chain state.

use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::{format_units, parse_units};
use tracing::debug;

use crate::contracts::BridgeRouter;
use crate::error::BridgeError;
use crate::lanes;
use crate::types::Chain;

/// 4-byte tag identifying the `EVMExtraArgsV1` encoding,
/// `bytes4(keccak256("CCIP EVMExtraArgsV1"))`.
pub const EVM_EXTRA_ARGS_V1_TAG: [u8; 4] = [0x97, 0xa6, 0x57, 0xc9];

/// A single token transfer carried by a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTokenAmount {
    pub token: Address,
    pub amount: U256,
}

impl EvmTokenAmount {
    fn into_token(self) -> Token {
        Token::Tuple(vec![Token::Address(self.token), Token::Uint(self.amount)])
    }
}

/// Message handed to the router's `getFee`/`ccipSend` entry points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evm2AnyMessage {
    /// ABI-encoded receiver address on the destination chain
    pub receiver: Bytes,
    /// Arbitrary payload; always empty for token-only transfers
    pub data: Bytes,
    /// Token transfers carried by the message
    pub token_amounts: Vec<EvmTokenAmount>,
    /// Fee token address; `Address::zero()` pays the fee in native gas
    pub fee_token: Address,
    /// Opaque extra-args blob (`EVMExtraArgsV1` tag + encoded gas limit)
    pub extra_args: Bytes,
}

impl Evm2AnyMessage {
    /// Token-only transfer of `amount` of `token` to `receiver`, paying the
    /// fee in native gas. The destination gas limit is zero: a pure token
    /// transfer executes no receiver code.
    pub fn token_transfer(receiver: Address, token: Address, amount: U256) -> Self {
        Self {
            receiver: abi::encode(&[Token::Address(receiver)]).into(),
            data: Bytes::default(),
            token_amounts: vec![EvmTokenAmount { token, amount }],
            fee_token: Address::zero(),
            extra_args: encode_extra_args_v1(U256::zero()),
        }
    }

    /// ABI tuple representation for router calls
    pub fn into_token(self) -> Token {
        Token::Tuple(vec![
            Token::Bytes(self.receiver.to_vec()),
            Token::Bytes(self.data.to_vec()),
            Token::Array(
                self.token_amounts
                    .into_iter()
                    .map(EvmTokenAmount::into_token)
                    .collect(),
            ),
            Token::Address(self.fee_token),
            Token::Bytes(self.extra_args.to_vec()),
        ])
    }
}

/// Encode `EVMExtraArgsV1 { gasLimit }` with its function-selector tag
pub fn encode_extra_args_v1(gas_limit: U256) -> Bytes {
    let mut out = EVM_EXTRA_ARGS_V1_TAG.to_vec();
    out.extend_from_slice(&abi::encode(&[Token::Uint(gas_limit)]));
    out.into()
}

/// A priced, ready-to-submit bridge message
#[derive(Debug, Clone)]
pub struct BridgeQuote {
    pub message: Evm2AnyMessage,
    /// Destination chain selector the message was priced against
    pub dest_selector: u64,
    /// Fee in smallest native units
    pub fee_raw: U256,
    /// Fee as a human-readable decimal string
    pub fee_formatted: String,
    /// Transfer amount in smallest token units
    pub amount: U256,
}

/// Build a token-transfer message and price it against the router.
///
/// Resolves the lane configuration for both ends (failing fast on an
/// unsupported chain), verifies the token against the router's
/// destination-supported list, encodes the message and fetches the fee.
/// Read-only: issues no writes.
pub async fn build_and_quote(
    router: &dyn BridgeRouter,
    source: Chain,
    destination: Chain,
    token: Address,
    amount_human: &str,
    decimals: u8,
    destination_account: Address,
) -> Result<BridgeQuote, BridgeError> {
    let _source_lane = lanes::config_for(source)?;
    let dest_selector = lanes::chain_selector_for(destination)?;

    let amount: U256 = parse_units(amount_human, decimals as u32)
        .map_err(|e| BridgeError::InvalidInput(format!("invalid amount {}: {}", amount_human, e)))?
        .into();
    if amount.is_zero() {
        return Err(BridgeError::InvalidInput("amount must be non-zero".into()));
    }

    let supported = router.supported_tokens(dest_selector).await?;
    if !supported.iter().any(|t| *t == token) {
        return Err(BridgeError::UnsupportedToken {
            token: format!("{:#x}", token),
            destination,
        });
    }

    let message = Evm2AnyMessage::token_transfer(destination_account, token, amount);
    let fee_raw = router.fee(dest_selector, &message).await?;
    let fee_formatted = format_units(fee_raw, 18)
        .map_err(|e| BridgeError::QuoteError(format!("fee formatting failed: {}", e)))?;

    debug!(
        %source, %destination, amount = %amount, fee = %fee_formatted,
        "built and priced bridge message"
    );

    Ok(BridgeQuote {
        message,
        dest_selector,
        fee_raw,
        fee_formatted,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ethers::types::H256;
    use std::str::FromStr;

    struct StubRouter {
        tokens: Vec<Address>,
        fee: U256,
    }

    #[async_trait]
    impl BridgeRouter for StubRouter {
        async fn supported_tokens(&self, _dest: u64) -> Result<Vec<Address>, BridgeError> {
            Ok(self.tokens.clone())
        }

        async fn fee(&self, _dest: u64, _message: &Evm2AnyMessage) -> Result<U256, BridgeError> {
            Ok(self.fee)
        }

        async fn ccip_send(
            &self,
            _dest: u64,
            _message: &Evm2AnyMessage,
            _fee: U256,
        ) -> Result<H256, BridgeError> {
            Ok(H256::zero())
        }
    }

    fn gho() -> Address {
        Address::from_str("0x40D16FC0246aD3160Ccc09B8D0D3A2cD28aE6C2f").unwrap()
    }

    fn receiver() -> Address {
        Address::from_str("0x388C818CA8B9251b393131C08a736A67ccB19297").unwrap()
    }

    #[test]
    fn test_extra_args_encoding() {
        let args = encode_extra_args_v1(U256::zero());
        // 4-byte tag plus one ABI word
        assert_eq!(args.len(), 4 + 32);
        assert_eq!(&args[..4], &EVM_EXTRA_ARGS_V1_TAG);
        assert!(args[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_token_transfer_message_shape() {
        let msg = Evm2AnyMessage::token_transfer(receiver(), gho(), U256::from(1u64));

        // Receiver is a single ABI word with the address right-aligned
        assert_eq!(msg.receiver.len(), 32);
        assert_eq!(&msg.receiver[12..], receiver().as_bytes());

        assert!(msg.data.is_empty());
        assert_eq!(msg.token_amounts.len(), 1);
        assert_eq!(msg.fee_token, Address::zero());
    }

    #[tokio::test]
    async fn test_quote_scales_amount_and_returns_fee() {
        let router = StubRouter {
            tokens: vec![gho()],
            fee: U256::from(10_000_000_000_000_000u64), // 0.01 ETH
        };

        let quote = build_and_quote(
            &router,
            Chain::Ethereum,
            Chain::Arbitrum,
            gho(),
            "100",
            18,
            receiver(),
        )
        .await
        .unwrap();

        let expected = U256::from_dec_str("100000000000000000000").unwrap();
        assert_eq!(quote.amount, expected);
        assert_eq!(quote.message.token_amounts[0].amount, expected);
        assert_eq!(quote.message.token_amounts[0].token, gho());
        assert!(!quote.fee_formatted.is_empty());
        assert_eq!(quote.fee_raw, router.fee);
    }

    #[tokio::test]
    async fn test_unsupported_token_rejected() {
        let router = StubRouter {
            tokens: vec![receiver()], // arbitrary other token
            fee: U256::one(),
        };

        let err = build_and_quote(
            &router,
            Chain::Ethereum,
            Chain::Arbitrum,
            gho(),
            "100",
            18,
            receiver(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BridgeError::UnsupportedToken { .. }));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let router = StubRouter {
            tokens: vec![gho()],
            fee: U256::one(),
        };

        let err = build_and_quote(
            &router,
            Chain::Ethereum,
            Chain::Arbitrum,
            gho(),
            "0",
            18,
            receiver(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BridgeError::InvalidInput(_)));
    }
}

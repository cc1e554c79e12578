//! Lane configuration registry
//!
//! Static table describing every chain the bridge can send from: the CCIP
//! router to call, the protocol chain selector identifying the network, the
//! fee oracle, the GHO token pool and the fee tokens the router accepts.
//! Built once at process start; all lookups are pure reads over the table.
//!
//! Exactly one token pool is configured per lane: Ethereum locks and
//! releases canonical GHO, every other chain burns and mints it.

use ethers::types::Address;
use once_cell::sync::Lazy;

use crate::error::BridgeError;
use crate::types::Chain;

/// A fee token accepted by the router on a given lane
#[derive(Debug, Clone)]
pub struct FeeTokenInfo {
    /// Token contract address; `Address::zero()` is the sentinel for the
    /// native gas token
    pub address: Address,
    /// Display symbol
    pub symbol: &'static str,
    /// Token decimals
    pub decimals: u8,
    /// Whether this is the native gas token
    pub is_native: bool,
}

/// Static configuration of a bridge lane originating on `chain`
#[derive(Debug, Clone)]
pub struct LaneConfig {
    /// Source chain this lane sends from
    pub chain: Chain,
    /// CCIP router contract on the source chain
    pub router: Address,
    /// Protocol chain selector identifying this network to remote routers.
    /// Distinct from the EVM chain id.
    pub chain_selector: u64,
    /// Fee oracle (price registry) consulted by the router
    pub fee_oracle: Address,
    /// Lock/release GHO token pool, set only on Ethereum
    pub lock_release_token_pool: Option<Address>,
    /// Burn/mint GHO token pool, set on every non-Ethereum chain
    pub burn_mint_token_pool: Option<Address>,
    /// GHO token contract on this chain
    pub token: Address,
    /// Fee tokens the router accepts on this lane
    pub supported_fee_tokens: Vec<FeeTokenInfo>,
}

impl LaneConfig {
    /// The token pool backing this lane, whichever flavor is configured
    pub fn token_pool(&self) -> Address {
        self.lock_release_token_pool
            .or(self.burn_mint_token_pool)
            .expect("lane has a token pool")
    }

    fn validate(&self) {
        let pools = [self.lock_release_token_pool, self.burn_mint_token_pool];
        assert_eq!(
            pools.iter().filter(|p| p.is_some()).count(),
            1,
            "lane {} must configure exactly one token pool",
            self.chain
        );
    }
}

fn addr(s: &str) -> Address {
    s.parse().expect("static lane address is well-formed")
}

fn native_fee_token() -> FeeTokenInfo {
    FeeTokenInfo {
        address: Address::zero(),
        symbol: "ETH",
        decimals: 18,
        is_native: true,
    }
}

static LANES: Lazy<Vec<LaneConfig>> = Lazy::new(|| {
    let lanes = vec![
        LaneConfig {
            chain: Chain::Ethereum,
            router: addr("0x80226fc0Ee2b096224EeAc085Bb9a8cba1146f7D"),
            chain_selector: 5009297550715157269,
            fee_oracle: addr("0x8c9b2Efb7c64C394677B7607C9F34839e0a8A4dd"),
            lock_release_token_pool: Some(addr("0x5756880B6a1EAba0175227bf02a7E87c1e02B28C")),
            burn_mint_token_pool: None,
            token: addr("0x40D16FC0246aD3160Ccc09B8D0D3A2cD28aE6C2f"),
            supported_fee_tokens: vec![
                native_fee_token(),
                FeeTokenInfo {
                    address: addr("0x514910771AF9Ca656af840dff83E8264EcF986CA"),
                    symbol: "LINK",
                    decimals: 18,
                    is_native: false,
                },
            ],
        },
        LaneConfig {
            chain: Chain::Arbitrum,
            router: addr("0x141fa059441E0ca23ce184B6A78bafD2A517DdE8"),
            chain_selector: 4949039107694359620,
            fee_oracle: addr("0x13015e4E6f839E1Aa1016DF521ea458ecA20438c"),
            lock_release_token_pool: None,
            burn_mint_token_pool: Some(addr("0xF168B83598516A532a85995b52504a2Fa058C068")),
            token: addr("0x7dfF72693f6A4149b17e7C6314655f6A9F7c8B33"),
            supported_fee_tokens: vec![
                native_fee_token(),
                FeeTokenInfo {
                    address: addr("0xf97f4df75117a78c1A5a0DBb814Af92458539FB4"),
                    symbol: "LINK",
                    decimals: 18,
                    is_native: false,
                },
            ],
        },
        LaneConfig {
            chain: Chain::Base,
            router: addr("0x881e3A65B4d4a04dD529061dd0071cf975F58bCD"),
            chain_selector: 15971525489660198786,
            fee_oracle: addr("0x6337a58D4BD7Ba691B66341779e8f87d4679923a"),
            lock_release_token_pool: None,
            burn_mint_token_pool: Some(addr("0x98217A06721Ebf727f2C8d9aD7718ec28b7aAe34")),
            token: addr("0x6Bb7a212910682DCFdbd5BCBb3e28FB4E8da10Ee"),
            supported_fee_tokens: vec![
                native_fee_token(),
                FeeTokenInfo {
                    address: addr("0x88Fb150BDc53A65fe94Dea0c9BA0a6dAf8C6e196"),
                    symbol: "LINK",
                    decimals: 18,
                    is_native: false,
                },
            ],
        },
    ];

    for lane in &lanes {
        lane.validate();
    }
    lanes
});

/// Full lane configuration for a source chain
pub fn config_for(chain: Chain) -> Result<&'static LaneConfig, BridgeError> {
    LANES
        .iter()
        .find(|lane| lane.chain == chain)
        .ok_or(BridgeError::UnsupportedChain(chain))
}

/// Router contract address for a chain
pub fn router_for(chain: Chain) -> Result<Address, BridgeError> {
    config_for(chain).map(|lane| lane.router)
}

/// Protocol chain selector for a chain
pub fn chain_selector_for(chain: Chain) -> Result<u64, BridgeError> {
    config_for(chain).map(|lane| lane.chain_selector)
}

/// Reverse lookup from a protocol chain selector
pub fn chain_for_selector(selector: u64) -> Option<Chain> {
    LANES
        .iter()
        .find(|lane| lane.chain_selector == selector)
        .map(|lane| lane.chain)
}

/// Chains that can originate a bridge transfer
pub fn supported_source_chains() -> Vec<Chain> {
    LANES.iter().map(|lane| lane.chain).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_round_trip() {
        for chain in supported_source_chains() {
            let selector = chain_selector_for(chain).unwrap();
            assert_eq!(chain_for_selector(selector), Some(chain));
        }
    }

    #[test]
    fn test_unsupported_chain_is_an_error() {
        // All Chain variants are configured today, so exercise the error
        // path through the selector reverse lookup instead
        assert_eq!(chain_for_selector(0), None);
        assert!(config_for(Chain::Ethereum).is_ok());
    }

    #[test]
    fn test_exactly_one_pool_per_lane() {
        for chain in supported_source_chains() {
            let lane = config_for(chain).unwrap();
            let count = [lane.lock_release_token_pool, lane.burn_mint_token_pool]
                .iter()
                .filter(|p| p.is_some())
                .count();
            assert_eq!(count, 1, "lane {} has {} pools", chain, count);
            if chain == Chain::Ethereum {
                assert!(lane.lock_release_token_pool.is_some());
            } else {
                assert!(lane.burn_mint_token_pool.is_some());
            }
        }
    }

    #[test]
    fn test_every_lane_accepts_native_fee_token() {
        for chain in supported_source_chains() {
            let lane = config_for(chain).unwrap();
            let native = lane
                .supported_fee_tokens
                .iter()
                .find(|t| t.is_native)
                .expect("native fee token configured");
            assert_eq!(native.address, Address::zero());
        }
    }
}

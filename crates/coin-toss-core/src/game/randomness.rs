//! Block-derived toss randomness, mirrored from the contract.
//!
//! The contract settles a round with
//! `uint256(keccak256(abi.encodePacked(block.timestamp, block.prevrandao))) % 2`,
//! 0 meaning heads. The player recomputes it after the second bet to show the
//! outcome before the authoritative state is read back; the two can disagree
//! if the settling block is not the latest one observed.

use super::{CoinSide, Seat};
use ethers::types::{Address, U256};
use ethers::utils::keccak256;
use serde::Serialize;

/// Outcome computed locally after the second bet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LocalOutcome {
    pub winning_side: CoinSide,
    pub winner: Address,
    pub block_number: u64,
}

/// Side selected by a block's timestamp and prevrandao
pub fn toss_side(timestamp: U256, prev_randao: U256) -> CoinSide {
    let mut packed = [0u8; 64];
    timestamp.to_big_endian(&mut packed[..32]);
    prev_randao.to_big_endian(&mut packed[32..]);
    let hash = keccak256(packed);
    CoinSide::from_is_heads(hash[31] & 1 == 0)
}

/// Player one wins iff the toss lands on their side
pub fn resolve_winner(player1: Seat, player2: Seat, toss: CoinSide) -> Seat {
    if toss == player1.side {
        player1
    } else {
        player2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toss_side_matches_keccak_parity() {
        for (ts, randao) in [(1u64, 2u64), (1_700_000_000, 42), (0, 0), (12, 99)] {
            let mut packed = Vec::with_capacity(64);
            let mut word = [0u8; 32];
            U256::from(ts).to_big_endian(&mut word);
            packed.extend_from_slice(&word);
            U256::from(randao).to_big_endian(&mut word);
            packed.extend_from_slice(&word);
            let as_number = U256::from_big_endian(&keccak256(&packed));
            let expected = CoinSide::from_is_heads((as_number % 2).is_zero());
            assert_eq!(toss_side(U256::from(ts), U256::from(randao)), expected);
        }
    }

    #[test]
    fn test_toss_side_is_deterministic() {
        let a = toss_side(U256::from(1000u64), U256::from(7u64));
        let b = toss_side(U256::from(1000u64), U256::from(7u64));
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_winner() {
        let p1 = Seat {
            address: Address::from_low_u64_be(1),
            side: CoinSide::Heads,
        };
        let p2 = Seat {
            address: Address::from_low_u64_be(2),
            side: CoinSide::Tails,
        };
        assert_eq!(resolve_winner(p1, p2, CoinSide::Heads), p1);
        assert_eq!(resolve_winner(p1, p2, CoinSide::Tails), p2);
    }
}

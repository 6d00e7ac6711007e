//! Coin toss contract client abstraction.

mod mock;
mod rpc;
mod traits;

pub use mock::MockTossContract;
pub use rpc::RpcTossContract;
pub use traits::{BlockInfo, ContractError, TossContract, TxReceipt};

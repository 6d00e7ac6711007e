//! Coin Toss Player
//!
//! Places bets, reads the round and runs owner utilities against the coin toss
//! contract. The signing key is read from `PLAYER_PRIVATE_KEY`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use coin_toss_core::{
    chain::parse_address,
    game::{format_token_amount, shorten_address, wager, TOKEN_DECIMALS},
    BetError, BetFlow, BetOutcome, ChainConfig, CoinSide, GameState, MockTossContract,
    RpcTossContract, TossContract, TxReceipt,
};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const KEY_ENV: &str = "PLAYER_PRIVATE_KEY";
/// Stand-in account when `--mock` runs without a key
const MOCK_PLAYER: u64 = 0xA11CE;
/// Opponent seated first in mock rounds
const MOCK_OPPONENT: u64 = 0xB0B;

#[derive(Parser, Debug)]
#[command(
    name = "coin-toss-player",
    about = "Play the on-chain coin toss game",
    version
)]
struct Args {
    /// Override RPC URL (defaults to RPC_URL or Base Sepolia)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Coin toss contract address
    #[arg(long)]
    contract: Option<String>,

    /// Wager token address
    #[arg(long)]
    token: Option<String>,

    /// Address allowed to reset the game
    #[arg(long)]
    owner: Option<String>,

    /// Play against an in-memory contract instead of the network
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bet on a side
    Bet { side: CoinSide },
    /// Show the current round
    State,
    /// Force a new round (owner only)
    Reset,
    /// Mint test tokens to the signer
    Mint {
        /// Amount in mUSDT
        #[arg(long, default_value = "1")]
        amount: String,
    },
}

fn chain_config(args: &Args) -> Result<ChainConfig> {
    let mut config = ChainConfig::from_env().context("invalid chain configuration")?;
    if let Some(url) = &args.rpc_url {
        config.rpc_url = url.clone();
    }
    if let Some(contract) = &args.contract {
        config.contract = parse_address(contract).context("invalid --contract")?;
    }
    if let Some(token) = &args.token {
        config.token = parse_address(token).context("invalid --token")?;
    }
    if let Some(owner) = &args.owner {
        config.owner = parse_address(owner).context("invalid --owner")?;
    }
    Ok(config)
}

fn private_key() -> Option<String> {
    std::env::var(KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}

/// Parse a decimal mUSDT amount into base units
fn parse_token_amount(input: &str) -> Result<U256> {
    let (whole, frac) = input.trim().split_once('.').unwrap_or((input.trim(), ""));
    if whole.is_empty() && frac.is_empty() {
        bail!("empty amount");
    }
    if frac.len() > TOKEN_DECIMALS as usize {
        bail!("at most {} decimals", TOKEN_DECIMALS);
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        bail!("invalid amount: {}", input);
    }
    let padded = format!("{:0<width$}", frac, width = TOKEN_DECIMALS as usize);
    let units = U256::from_dec_str(&format!("{}{}", whole, padded))
        .with_context(|| format!("invalid amount: {}", input))?;
    if units.is_zero() {
        bail!("amount must be positive");
    }
    Ok(units)
}

/// Mock chain seeded with a funded player, an opponent seated on `against`
/// when given, and the player as owner
async fn mock_contract(against: Option<CoinSide>) -> Result<MockTossContract> {
    let player = match private_key() {
        Some(key) => key
            .parse::<LocalWallet>()
            .context("invalid PLAYER_PRIVATE_KEY")?
            .address(),
        None => Address::from_low_u64_be(MOCK_PLAYER),
    };
    let mock = MockTossContract::new(player);
    mock.fund(player, wager() * 10);

    if let Some(side) = against {
        let opponent = Address::from_low_u64_be(MOCK_OPPONENT);
        mock.fund(opponent, wager());
        let seat = mock.as_player(opponent);
        seat.approve_token(wager()).await?;
        seat.place_bet(side).await?;
        tracing::info!("Mock opponent {} bet on {}", shorten_address(&opponent), side);
    }
    Ok(mock)
}

fn rpc_contract(config: &ChainConfig, signing: bool) -> Result<RpcTossContract> {
    let client = RpcTossContract::new(config).context("failed to create RPC client")?;
    match private_key() {
        Some(key) => client.with_signer(&key).context("invalid PLAYER_PRIVATE_KEY"),
        None if signing => bail!("{} is not set", KEY_ENV),
        None => Ok(client),
    }
}

fn print_state(state: &GameState) {
    println!("Toss #{}", state.toss_number);
    match state.player1() {
        Some(seat) => println!("  Player 1: {:#x} ({})", seat.address, seat.side.label()),
        None => println!("  Player 1: -"),
    }
    match state.player2() {
        Some(seat) => println!("  Player 2: {:#x} ({})", seat.address, seat.side.label()),
        None => println!("  Player 2: -"),
    }
    if let Some(winner) = state.winner() {
        println!("  Winner:   {:#x}", winner);
    }
    println!("  {}", state.status_message());
}

fn print_receipt(label: &str, receipt: &TxReceipt) {
    println!("{}: {}", label, receipt.explorer_url());
}

fn print_outcome(outcome: &BetOutcome) {
    if let Some(approval) = &outcome.approval {
        print_receipt("Approval", approval);
    }
    print_receipt("Bet", &outcome.receipt);
    if outcome.attempts > 1 {
        println!("Confirmed after {} attempts", outcome.attempts);
    }
    if let Some(local) = &outcome.local {
        println!(
            "Coin landed on {} in block {}: {} wins",
            local.winning_side.label(),
            local.block_number,
            shorten_address(&local.winner)
        );
    }
    print_state(&outcome.state);
}

async fn run(args: Args) -> Result<()> {
    let config = chain_config(&args)?;

    let contract: Arc<dyn TossContract> = if args.mock {
        let against = match &args.command {
            Command::Bet { side } => Some(side.opposite()),
            _ => None,
        };
        Arc::new(mock_contract(against).await?)
    } else {
        let signing = !matches!(args.command, Command::State);
        tracing::info!("Using contract {:#x} via {}", config.contract, config.rpc_url);
        Arc::new(rpc_contract(&config, signing)?)
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            println!("> {}", line);
        }
    });
    let flow = BetFlow::new(contract.clone()).with_status(tx);

    let result: Result<(), BetError> = match args.command {
        Command::Bet { side } => flow.place_bet(side).await.map(|outcome| print_outcome(&outcome)),
        Command::State => contract
            .get_state()
            .await
            .map(|state| print_state(&state))
            .map_err(BetError::from),
        Command::Reset => {
            let owner = if args.mock {
                contract.signer_address().unwrap_or(config.owner)
            } else {
                config.owner
            };
            flow.reset_game(owner)
                .await
                .map(|receipt| print_receipt("Reset", &receipt))
        }
        Command::Mint { amount } => {
            let units = parse_token_amount(&amount)?;
            flow.mint(units).await.map(|receipt| {
                print_receipt("Mint", &receipt);
                println!("Minted {} mUSDT", format_token_amount(units));
            })
        }
    };

    drop(flow);
    printer.await.ok();

    result.map_err(|e| {
        tracing::error!("{:?}", e);
        anyhow::anyhow!(e.user_message())
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    run(Args::parse()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_amount() {
        assert_eq!(parse_token_amount("1").unwrap(), U256::from(1_000_000u64));
        assert_eq!(parse_token_amount("0.1").unwrap(), wager());
        assert_eq!(parse_token_amount(".5").unwrap(), U256::from(500_000u64));
        assert_eq!(parse_token_amount("2.000001").unwrap(), U256::from(2_000_001u64));
        assert!(parse_token_amount("0").is_err());
        assert!(parse_token_amount("").is_err());
        assert!(parse_token_amount("1.0000001").is_err());
        assert!(parse_token_amount("abc").is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["coin-toss-player", "--mock", "bet", "heads"]).unwrap();
        assert!(args.mock);
        assert!(matches!(args.command, Command::Bet { side: CoinSide::Heads }));

        let args = Args::try_parse_from(["coin-toss-player", "mint", "--amount", "5"]).unwrap();
        assert!(matches!(args.command, Command::Mint { ref amount } if amount == "5"));

        assert!(Args::try_parse_from(["coin-toss-player", "bet", "edge"]).is_err());
    }

    #[tokio::test]
    async fn test_mock_round_completes() {
        let mock = mock_contract(Some(CoinSide::Tails)).await.unwrap();
        let flow = BetFlow::new(Arc::new(mock.clone()));
        let outcome = flow.place_bet(CoinSide::Heads).await.unwrap();
        assert!(outcome.local.is_some());
        assert!(mock.last_winner().is_some());
    }
}

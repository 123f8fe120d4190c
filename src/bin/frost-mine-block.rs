#![forbid(unsafe_code)]
//! One-shot miner: build a candidate on the current head, solve it,
//! append it, and print a summary.

use clap::Parser;
use colored::Colorize;
use frostchain::config::load_config;
use frostchain::crypto::address_from_string;
use frostchain::ledger::Ledger;
use frostchain::miner::Miner;
use frostchain::storage::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "frost-mine-block", about = "Mine and append a single block")]
struct Args {
    /// Beneficiary address (base64 text form)
    address: String,

    /// Path to frostchain.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let address = address_from_string(&args.address)?;

    let store = SqliteStore::open(&config.storage.path)?;
    let ledger = Arc::new(Ledger::open(Box::new(store))?);

    let height = ledger.len()?;
    let difficulty = ledger.current_difficulty()?;
    println!(
        "{} height {} difficulty {}",
        "⛏  mining on".cyan().bold(),
        height,
        difficulty
    );

    let miner = Miner::new(
        Arc::clone(&ledger),
        address,
        config.miner.reward,
        config.miner.batch_size,
    );

    let started = Instant::now();
    let hash = miner
        .mine_one()?
        .ok_or("mining cancelled before a block was found")?;
    let elapsed = started.elapsed();

    let block = ledger.block(&hash)?;
    println!("{}", "✅ block mined".green().bold());
    println!("  hash:      {}", hex::encode(hash));
    println!("  parent:    {}", hex::encode(block.parent));
    println!("  nonce:     {}", block.nonce);
    println!("  timestamp: {}", block.timestamp);
    println!("  took:      {:.3}s", elapsed.as_secs_f64());
    println!("  height:    {}", ledger.len()?);
    println!(
        "  balance:   {:.6} for {}",
        ledger.balance(&address)?,
        args.address
    );

    Ok(())
}

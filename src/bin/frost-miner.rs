#![forbid(unsafe_code)]
//! Continuous miner daemon: mines on the current head until killed,
//! reporting each appended block.

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
use tracing::info;

#[derive(Parser)]
#[command(name = "frost-miner", about = "Mine blocks continuously")]
struct Args {
    /// Beneficiary address (base64 text form); falls back to
    /// miner.beneficiary_address from the config file
    #[arg(long)]
    address: Option<String>,

    /// Path to frostchain.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many blocks (run forever when omitted)
    #[arg(long)]
    blocks: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let address_text = args
        .address
        .or_else(|| config.miner.beneficiary_address.clone())
        .ok_or("no beneficiary address: pass --address or set miner.beneficiary_address")?;
    let address = address_from_string(&address_text)?;

    let store = SqliteStore::open(&config.storage.path)?;
    let ledger = Arc::new(Ledger::open(Box::new(store))?);
    info!(
        height = ledger.len()?,
        head = %hex::encode(ledger.head()?),
        "starting miner"
    );

    let miner = Arc::new(Miner::new(
        Arc::clone(&ledger),
        address,
        config.miner.reward,
        config.miner.batch_size,
    ));
    let cancel = miner.cancel_handle();
    let (handle, events) = miner.spawn();

    let started = Instant::now();
    let mut mined: u64 = 0;
    for hash in events.iter() {
        mined += 1;
        let uptime = humantime::format_duration(std::time::Duration::from_secs(
            started.elapsed().as_secs(),
        ));
        println!(
            "{} #{:<4} {}  height {}  difficulty {}  up {}",
            "⛏".yellow(),
            mined,
            hex::encode(hash),
            ledger.len()?,
            ledger.current_difficulty()?,
            uptime
        );
        if args.blocks.is_some_and(|limit| mined >= limit) {
            cancel.store(true, std::sync::atomic::Ordering::Relaxed);
            break;
        }
    }

    drop(events);
    handle.join().expect("miner thread panicked")?;
    info!(mined, "miner stopped");
    Ok(())
}

#![forbid(unsafe_code)]
//! Balance query: sum the unspent outputs owned by an address.

use clap::Parser;
use frostchain::config::load_config;
use frostchain::crypto::address_from_string;
use frostchain::ledger::Ledger;
use frostchain::storage::SqliteStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "frost-balance", about = "Query the balance of an address")]
struct Args {
    /// Address to query (base64 text form)
    address: String,

    /// Path to frostchain.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit machine-readable JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let address = address_from_string(&args.address)?;

    let store = SqliteStore::open(&config.storage.path)?;
    let ledger = Ledger::open(Box::new(store))?;

    let height = ledger.len()?;
    let balance = ledger.balance(&address)?;

    if args.json {
        let report = serde_json::json!({
            "address": args.address,
            "height": height,
            "head": hex::encode(ledger.head()?),
            "balance": balance,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("address: {}", args.address);
        println!("height:  {}", height);
        println!("balance: {:.6}", balance);
    }

    Ok(())
}

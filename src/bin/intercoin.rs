#![forbid(unsafe_code)]
//! Intercoin driver: replays the tamper-detection demo or mines blocks.

use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use intercoin::blockchain::{Ledger, ValidationReport};
use intercoin::config::{load_config_from, DEFAULT_CONFIG_PATH};
use intercoin::transaction::{Payload, Transaction};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Override the configured proof-of-work difficulty
    #[arg(long)]
    difficulty: Option<u32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal two transfers, validate, tamper with block 1 and validate again
    Demo {
        /// Skip the final JSON dump of the ledger
        #[arg(long)]
        quiet: bool,
    },
    /// Seal a number of reward-only blocks for a beneficiary
    Mine {
        /// Who receives the mining reward
        beneficiary: String,
        /// How many blocks to seal
        #[arg(long, default_value_t = 1)]
        blocks: u32,
        /// Give up on a block after this many hash attempts
        #[arg(long)]
        max_attempts: Option<u64>,
        /// Print the resulting ledger as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = load_config_from(&cli.config)?;
    if let Some(difficulty) = cli.difficulty {
        config.ledger.difficulty = difficulty;
    }

    println!(
        "{}",
        format!("⛓️  Creating ledger (difficulty {})...", config.ledger.difficulty).bright_cyan()
    );
    let mut ledger = Ledger::from_config(&config.ledger)?;

    match cli.command {
        Commands::Demo { quiet } => demo(&mut ledger, quiet),
        Commands::Mine {
            beneficiary,
            blocks,
            max_attempts,
            json,
        } => mine(&mut ledger, &beneficiary, blocks, max_attempts, json),
    }
}

fn demo(ledger: &mut Ledger, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    ledger.add_pending(Transaction::transfer("Alice", "Bob", 50));
    ledger.add_pending(Transaction::transfer("Charlie", "Dave", 20));

    println!("{}", "⛏️  Mining pending transactions...".bright_yellow());
    let summary = ledger.seal_block("Miner1")?;
    println!(
        "Block {} mined in {:.3}s after {} attempts: {}",
        summary.position,
        summary.elapsed.as_secs_f64(),
        summary.attempts,
        summary.hash.bright_white()
    );
    print_report("Is blockchain valid?", &ledger.validate());

    println!();
    println!("{}", "🕵️  Tampering with Block 1...".bright_red());
    // Edit the stored ledger document the way an attacker with file access
    // would: swap block 1's payload and leave its hash alone.
    let mut snapshot = serde_json::to_value(&*ledger)?;
    snapshot["chain"][1]["payload"] = serde_json::to_value(Payload::from(vec![
        Transaction::transfer("Hacker", "Hacker", 100),
    ]))?;
    *ledger = Ledger::from_json(&snapshot.to_string())?;
    print_report("Is blockchain valid after tampering?", &ledger.validate());

    println!();
    print_blocks(ledger);

    if !quiet {
        println!();
        println!("{}", "🔍 Blockchain Data:".bright_green().underline());
        println!("{}", ledger.to_json_pretty()?);
    }
    Ok(())
}

fn mine(
    ledger: &mut Ledger,
    beneficiary: &str,
    blocks: u32,
    max_attempts: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for _ in 0..blocks {
        let summary = match max_attempts {
            Some(max) => ledger.try_seal_block(beneficiary, max)?,
            None => ledger.seal_block(beneficiary)?,
        };
        println!(
            "{} #{} nonce {} ({:.3}s)",
            "✅ Sealed".bright_green(),
            summary.position,
            summary.nonce,
            summary.elapsed.as_secs_f64()
        );
    }

    println!();
    print_blocks(ledger);
    print_report("Is blockchain valid?", &ledger.validate());

    if json {
        println!("{}", ledger.to_json_pretty()?);
    }
    Ok(())
}

fn print_report(label: &str, report: &ValidationReport) {
    match report {
        ValidationReport::Valid => println!("{} {}", label, "true".bright_green().bold()),
        ValidationReport::Invalid { index, reason } => {
            println!("{} {}", label, "false".bright_red().bold());
            println!("  {} block {}: {}", "↳".red(), index, reason);
        }
    }
}

fn short(hash: &str) -> String {
    if hash.len() > 16 {
        format!("{}…{}", &hash[..8], &hash[hash.len() - 6..])
    } else {
        hash.to_string()
    }
}

fn print_blocks(ledger: &Ledger) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Timestamp").add_attribute(Attribute::Bold),
            Cell::new("Txs").add_attribute(Attribute::Bold),
            Cell::new("Nonce").add_attribute(Attribute::Bold),
            Cell::new("Hash").add_attribute(Attribute::Bold),
            Cell::new("Previous").add_attribute(Attribute::Bold),
        ]);

    for block in ledger.blocks() {
        let txs = match block.payload() {
            Payload::Genesis(label) => label.clone(),
            Payload::Transactions(txs) => txs.len().to_string(),
        };
        table.add_row(vec![
            Cell::new(block.position()),
            Cell::new(block.timestamp()),
            Cell::new(txs),
            Cell::new(block.nonce()),
            Cell::new(short(block.hash())),
            Cell::new(short(block.previous_hash())),
        ]);
    }

    println!("{table}");
}

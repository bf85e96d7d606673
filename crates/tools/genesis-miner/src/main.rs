//! CLI for inspecting network parameters and mining genesis blocks
//!
//! This tool allows:
//! - Verifying every network's genesis block against its recorded hash
//! - Printing a network's parameters
//! - Searching for a genesis nonce for new inputs

use anyhow::Context;
use atb_params::genesis::{genesis_output_script, GENESIS_MESSAGE};
use atb_params::script::OP_CHECKSIG;
use atb_params::{
    check_proof_of_work, ChainConfig, ChainParams, ChainRegistry, CompactTarget, GenesisMiner,
    GenesisSpec, MinerOptions, NetworkType, Script,
};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "genesis-miner")]
#[command(about = "Aitibicoin network parameter and genesis tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild every network's genesis block and check it
    Verify,

    /// Print a network's parameters
    Show {
        #[command(flatten)]
        chain: ChainArgs,

        /// Print the full parameter set as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search for a genesis nonce
    Mine {
        #[command(flatten)]
        chain: ChainArgs,

        /// Coinbase message (defaults to the network's genesis message)
        #[arg(short, long)]
        message: Option<String>,

        /// Uncompressed public key paid by the coinbase, hex
        #[arg(long)]
        pubkey: Option<String>,

        /// Block time (defaults to the network's genesis time)
        #[arg(short, long, conflicts_with = "now")]
        time: Option<u32>,

        /// Use the current time
        #[arg(long)]
        now: bool,

        /// Compact difficulty bits, hex (defaults to the network's genesis bits)
        #[arg(short, long, value_parser = parse_bits)]
        bits: Option<u32>,

        /// First nonce to try
        #[arg(long, default_value = "0")]
        nonce: u32,

        /// Worker threads
        #[arg(short = 'j', long, default_value = "1")]
        threads: usize,

        /// Give up after this many hashes
        #[arg(long)]
        max_attempts: Option<u64>,

        /// Give up after N seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// Network selection shared by subcommands
#[derive(Args, Debug, Default)]
struct ChainArgs {
    /// Network name (main, test, regtest)
    #[arg(short, long)]
    network: Option<String>,

    /// Use the public test network
    #[arg(long)]
    testnet: bool,

    /// Use the regression test network
    #[arg(long)]
    regtest: bool,

    /// JSON chain config file; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ChainArgs {
    fn to_config(&self) -> anyhow::Result<ChainConfig> {
        let mut config = match &self.config {
            Some(path) => ChainConfig::from_file(path)
                .with_context(|| format!("loading chain config {}", path.display()))?,
            None => ChainConfig::default(),
        };
        config.apply_overrides(self.network.clone(), self.testnet, self.regtest);
        Ok(config)
    }
}

fn parse_bits(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid bits {}: {}", s, e))
}

fn format_time(time: u32) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(time as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| time.to_string())
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Verify => run_verify(),
        Commands::Show { chain, json } => run_show(&chain, json),
        Commands::Mine {
            chain,
            message,
            pubkey,
            time,
            now,
            bits,
            nonce,
            threads,
            max_attempts,
            timeout,
        } => {
            let time = if now {
                let now = chrono::Utc::now().timestamp();
                Some(u32::try_from(now).context("current time out of range")?)
            } else {
                time
            };
            let request = MineRequest {
                message,
                pubkey,
                time,
                bits,
                nonce,
            };
            let options = MinerOptions {
                threads: threads.max(1),
                max_attempts,
                cancel: Some(Arc::new(AtomicBool::new(false))),
            };
            run_mine(&chain, request, options, timeout.map(Duration::from_secs))
        }
    };

    if let Err(err) = &result {
        if let Some(params_err) = err.downcast_ref::<atb_params::Error>() {
            if params_err.is_fatal() {
                error!("Fatal configuration error: {}", params_err);
            }
        }
    }
    result
}

fn run_verify() -> anyhow::Result<()> {
    let mut failures = 0;

    for network in NetworkType::ALL {
        match ChainParams::from_network(network) {
            Ok(params) => {
                let header = &params.genesis.header;
                if check_proof_of_work(&header.hash(), header.bits, params.consensus.pow_limit) {
                    info!("{}: genesis {} ok", network, params.genesis_hash());
                } else {
                    warn!("{}: genesis {} misses its target", network, params.genesis_hash());
                    failures += 1;
                }
            }
            Err(e) => {
                warn!("{}: {}", network, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} network(s) failed verification", failures);
    }
    info!("All networks verified");
    Ok(())
}

fn run_show(chain: &ChainArgs, json: bool) -> anyhow::Result<()> {
    let registry = ChainRegistry::new()?;
    let params = chain.to_config()?.select_in(&registry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(params)?);
        return Ok(());
    }

    let header = &params.genesis.header;
    let consensus = &params.consensus;
    println!("Network:            {}", params.network_id());
    println!("Message start:      {}", hex::encode(params.message_start));
    println!("Default port:       {}", params.default_port);
    println!("Prune after height: {}", params.prune_after_height);
    println!("Genesis hash:       {}", params.genesis_hash());
    println!("Merkle root:        {}", header.merkle_root);
    println!("Genesis time:       {} ({})", header.time, format_time(header.time));
    println!("Genesis nonce:      {}", header.nonce);
    println!("Genesis bits:       {}", CompactTarget::from_consensus(header.bits));
    println!("PoW limit:          {:#x}", consensus.pow_limit);
    println!("Halving interval:   {}", consensus.subsidy_halving_interval);
    println!(
        "Target spacing:     {}s (timespan {}s)",
        consensus.target_spacing, consensus.target_timespan
    );
    println!("Last PoW block:     {}", params.last_pow_block);
    println!(
        "DNS seeds:          {}",
        params
            .dns_seeds
            .iter()
            .map(|s| s.host.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    for (height, hash) in params.checkpoints.iter() {
        println!("Checkpoint:         {} {}", height, hash);
    }

    Ok(())
}

struct MineRequest {
    message: Option<String>,
    pubkey: Option<String>,
    time: Option<u32>,
    bits: Option<u32>,
    nonce: u32,
}

fn run_mine(
    chain: &ChainArgs,
    request: MineRequest,
    options: MinerOptions,
    timeout: Option<Duration>,
) -> anyhow::Result<()> {
    let registry = ChainRegistry::new()?;
    let params = chain.to_config()?.select_in(&registry)?;
    let genesis = &params.genesis.header;

    let output_script = match &request.pubkey {
        Some(key) => {
            let key = hex::decode(key).context("pubkey is not hex")?;
            Script::builder().push_slice(&key).push_opcode(OP_CHECKSIG).into_script()
        }
        None => genesis_output_script()?,
    };
    let reward = params
        .genesis
        .transactions
        .first()
        .and_then(|tx| tx.outputs.first())
        .map(|out| out.value)
        .context("genesis has no coinbase output")?;

    let spec = GenesisSpec {
        message: request.message.unwrap_or_else(|| GENESIS_MESSAGE.to_string()).into_bytes(),
        output_script,
        reward,
        time: request.time.unwrap_or(genesis.time),
        nonce: request.nonce,
        bits: request.bits.unwrap_or(genesis.bits),
        version: genesis.version,
    };
    let mut block = spec.build();

    info!("Mining genesis for {}", params.network_id());
    info!("  Time: {} ({})", spec.time, format_time(spec.time));
    info!("  Bits: {}", CompactTarget::from_consensus(spec.bits));
    info!("  Merkle root: {}", block.header.merkle_root);

    let cancel = options.cancel.clone();
    let miner = GenesisMiner::with_options(params.consensus.pow_limit, options);
    let counter = miner.attempts_counter();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let done = AtomicBool::new(false);
    let started = Instant::now();
    let result = std::thread::scope(|scope| {
        scope.spawn(|| {
            while !done.load(Ordering::Relaxed) {
                let attempts = counter.load(Ordering::Relaxed);
                let rate = attempts as f64 / started.elapsed().as_secs_f64().max(0.001);
                pb.set_message(format!("{} hashes, {:.0} H/s", attempts, rate));

                if let (Some(limit), Some(flag)) = (timeout, &cancel) {
                    if started.elapsed() >= limit {
                        flag.store(true, Ordering::Relaxed);
                    }
                }
                std::thread::sleep(Duration::from_millis(200));
            }
        });

        let result = miner.solve(&mut block);
        done.store(true, Ordering::Relaxed);
        result
    });
    pb.finish_and_clear();

    let solution = match result {
        Ok(solution) => solution,
        Err(e @ atb_params::Error::SearchCancelled(_)) => {
            warn!("Search timed out");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    info!("Found genesis in {:.2}s", solution.elapsed.as_secs_f64());
    info!("  Attempts: {} ({:.0} H/s)", solution.attempts, solution.hash_rate());
    println!("nonce:       {}", solution.nonce);
    println!("time:        {} ({})", solution.time, format_time(solution.time));
    println!("bits:        {}", CompactTarget::from_consensus(block.header.bits));
    println!("hash:        {}", solution.hash);
    println!("merkle root: {}", block.header.merkle_root);

    Ok(())
}

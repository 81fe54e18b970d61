//! wasm-harness CLI entry point.
//!
//! Thin glue around the lifecycle controller: parses flags, reads the
//! program binary from disk, builds the memory pool, runs one lifecycle,
//! and prints the result.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wasm_harness_common::HarnessConfig;
use wasm_harness_core::{MemoryArena, run_program};

#[derive(Parser, Debug)]
#[command(name = "wasm-harness", about = "Pool-backed WebAssembly benchmark harness")]
struct Args {
    /// Path of the wasm file to run.
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of times to invoke the entry function.
    #[arg(short = 'n', long)]
    iterations: Option<u32>,

    /// Capacity of the memory pool in bytes.
    #[arg(long)]
    pool_capacity: Option<usize>,

    /// Call stack size in bytes.
    #[arg(long)]
    stack_size: Option<u32>,

    /// Linear-memory budget in bytes.
    #[arg(long)]
    heap_size: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wasm_harness=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    // Command-line flags override the config file.
    if let Some(iterations) = args.iterations {
        config.run.iterations = iterations;
    }
    if let Some(pool_capacity) = args.pool_capacity {
        config.pool_capacity = pool_capacity;
    }
    if let Some(stack_size) = args.stack_size {
        config.run.stack_size = stack_size;
    }
    if let Some(heap_size) = args.heap_size {
        config.run.heap_size = heap_size;
    }

    let wasm = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read wasm file {}", args.file.display()))?;

    info!(
        file = %args.file.display(),
        bytes = wasm.len(),
        pool_capacity = config.pool_capacity,
        iterations = config.run.iterations,
        "Starting harness run"
    );

    let arena = MemoryArena::with_capacity(config.pool_capacity);
    let result = run_program(&wasm, arena, &config.run);

    println!("Program return value: {}", result.return_value);
    println!("Program error message: {}", result.error_message);

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

//! Command-line harness for the ARM7 simulator.
//!
//! Loads a flat binary or S-record image into driver memory, runs the
//! drive loop for a cycle budget (or until the guest invokes the exit
//! SWI), then reports statistics and, on request, the final register
//! state.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use clap::Parser;

use arm7_core::sim::{Simulator, load_binary, load_srec};
use arm7_core::{ArmProcessor, Config};

/// Host SWI number the guest calls to stop the simulation; R0 carries the
/// exit code.
const SWI_EXIT: u32 = 0x0080_0001;

/// Cycle-accurate ARM7 system simulator.
#[derive(Debug, Parser)]
#[command(name = "sim", version, about)]
struct Args {
    /// Flat binary image loaded at address 0.
    #[arg(long, conflicts_with = "srec")]
    image: Option<PathBuf>,

    /// Motorola S-record image.
    #[arg(long)]
    srec: Option<PathBuf>,

    /// Bus-cycle budget.
    #[arg(long, default_value_t = 1_000_000)]
    cycles: u64,

    /// JSON configuration file (cache organisation, sizes, bus speed).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the final register state.
    #[arg(long)]
    dump_registers: bool,
}

fn load_config(args: &Args) -> Result<Config, String> {
    let Some(path) = &args.config else {
        return Ok(Config::default());
    };
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("parsing {}: {e}", path.display()))
}

fn load_image(sim: &mut Simulator, args: &Args) -> Result<(), String> {
    if let Some(path) = &args.image {
        let image =
            std::fs::read(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
        load_binary(&mut sim.memory, &image, 0).map_err(|e| e.to_string())?;
    } else if let Some(path) = &args.srec {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("reading {}: {e}", path.display()))?;
        let entry = load_srec(&mut sim.memory, &text).map_err(|e| e.to_string())?;
        if let Some(entry) = entry {
            tracing::info!(entry = format_args!("{entry:#010x}"), "image entry point");
        }
    } else {
        return Err("no image given; use --image or --srec".into());
    }
    Ok(())
}

/// Wires the exit SWI into the core; the returned flags observe it.
fn register_exit_swi(processor: &mut ArmProcessor) -> (Arc<AtomicBool>, Arc<AtomicU32>) {
    let halted = Arc::new(AtomicBool::new(false));
    let code = Arc::new(AtomicU32::new(0));

    let halted_hook = Arc::clone(&halted);
    let code_hook = Arc::clone(&code);
    let result = processor.core_mut().register_swi(
        SWI_EXIT,
        Box::new(move |r0, _r1, _r2, _r3| {
            halted_hook.store(true, Ordering::Relaxed);
            code_hook.store(r0, Ordering::Relaxed);
            r0
        }),
    );
    // The table starts empty; the exit slot cannot be taken.
    debug_assert!(result.is_ok());

    (halted, code)
}

fn run(args: &Args) -> Result<u32, String> {
    let config = load_config(args)?;
    let mut sim = Simulator::new(&config);
    load_image(&mut sim, args)?;

    let (halted, code) = register_exit_swi(&mut sim.processor);

    let mut budget = args.cycles;
    while budget > 0 && !halted.load(Ordering::Relaxed) {
        sim.step().map_err(|e| e.to_string())?;
        budget -= 1;
    }

    if args.dump_registers {
        println!("{}", sim.processor.debug_dump());
    }
    println!("{}", sim.processor.stats());

    Ok(code.load(Ordering::Relaxed))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => ExitCode::from(code.min(255) as u8),
        Err(message) => {
            eprintln!("sim: {message}");
            ExitCode::FAILURE
        }
    }
}

//! Caracterizar CLI - workload characterization without a host simulator
//!
//! # Commands
//!
//! - `demo` - Replay a built-in synthetic workload through the full
//!   characterization pipeline and emit its reports
//! - `info` - Show version info
//!
//! The demo workloads exercise every part of the pipeline: multiple
//! work-groups with barriers and local-memory traffic (`reduce`), pure
//! streaming global traffic (`stream`), and data-dependent branching
//! (`branchy`).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use caracterizar::{
    report, AddressSpace, BlockId, Characterizer, InstructionEvent, Result,
};

/// Caracterizar - architecture-independent workload characterization
///
/// Observes simulated kernel execution and reduces it to
/// architecture-independent metrics.
#[derive(Parser)]
#[command(name = "caracterizar")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a built-in synthetic workload and report its metrics
    ///
    /// Examples:
    ///   caracterizar demo
    ///   caracterizar demo --workload branchy --format json
    ///   caracterizar demo --format csv --out ./reports
    Demo {
        /// Which synthetic workload to replay
        #[arg(short, long, value_enum, default_value_t = Workload::Reduce)]
        workload: Workload,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Directory for CSV output
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Show version info
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum Workload {
    /// Tree reduction: barriers, local memory, uniform branches
    Reduce,
    /// Streaming copy: global loads/stores, no control flow
    Stream,
    /// Data-dependent branching: mixed branch outcomes
    Branchy,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Markdown summary on stdout
    Text,
    /// JSON reports on stdout
    Json,
    /// CSV files under --out
    Csv,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Demo {
            workload,
            format,
            out,
        } => demo(workload, format, &out),
        Commands::Info => {
            println!("caracterizar {}", caracterizar::VERSION);
            Ok(())
        }
    }
}

fn demo(workload: Workload, format: Format, out: &std::path::Path) -> Result<()> {
    let characterizer = Characterizer::new();
    match workload {
        Workload::Reduce => replay_reduce(&characterizer)?,
        Workload::Stream => replay_stream(&characterizer)?,
        Workload::Branchy => replay_branchy(&characterizer)?,
    }

    let kernel_report = characterizer.kernel_end()?;
    let transfer_report = characterizer.transfer_summary();

    match format {
        Format::Text => {
            println!("{}", report::render_markdown(&kernel_report));
        }
        Format::Json => {
            let body = serde_json::json!({
                "kernel": kernel_report,
                "transfers": transfer_report,
            });
            println!("{}", serde_json::to_string_pretty(&body).expect("report is serializable"));
        }
        Format::Csv => {
            let kernel_path = report::write_kernel_csv(&kernel_report, out)?;
            let transfer_path = report::write_transfer_csv(&transfer_report, out)?;
            println!("wrote {}", kernel_path.display());
            println!("wrote {}", transfer_path.display());
        }
    }
    Ok(())
}

/// Tree reduction over 4 work-groups of 16 items: global loads, local
/// scratch traffic, a barrier per halving round, uniform loop branches.
fn replay_reduce(characterizer: &Characterizer) -> Result<()> {
    characterizer.host_memory_store(0x1_0000, 4096);
    characterizer.kernel_begin("reduce_demo");

    let loop_body = BlockId(1);
    let loop_exit = BlockId(2);

    for group in 0..4u64 {
        let mut tracker = characterizer.begin_work_group();
        for item in 0..16u64 {
            tracker.work_item_begin();
            // initial load from global into local scratch
            tracker.instruction(&InstructionEvent::new("load", loop_body))?;
            tracker.memory_load(
                AddressSpace::Global,
                0x1_0000 + (group * 16 + item) * 4,
                4,
                "input",
            );
            tracker.instruction(&InstructionEvent::new("store", loop_body))?;
            tracker.memory_store(AddressSpace::Local, item * 4, 4, "scratch");

            for round in 0..4u64 {
                let active_items = 16 >> (round + 1);
                if item < active_items {
                    tracker.instruction(&InstructionEvent::new("load", loop_body))?;
                    tracker.memory_load(AddressSpace::Local, (item * 2) * 4, 4, "scratch");
                    tracker.instruction(&InstructionEvent::new("fadd", loop_body))?;
                    tracker.instruction(&InstructionEvent::new("store", loop_body))?;
                    tracker.memory_store(AddressSpace::Local, item * 4, 4, "scratch");
                }
                // uniform loop-bound test: taken while rounds remain
                let branch = InstructionEvent::new("br", loop_body)
                    .at_line(14)
                    .with_branch(loop_body, loop_exit);
                tracker.instruction(&branch)?;
                let next = if round < 3 { loop_body } else { loop_exit };
                tracker.instruction(&InstructionEvent::new("add", next))?;
                tracker.barrier();
                tracker.barrier_cleared();
            }
            tracker.work_item_complete();
        }
        characterizer.complete_work_group(tracker);
    }
    characterizer.host_memory_load(0x2_0000, 16);
    Ok(())
}

/// Streaming copy: 2 work-groups of 32 items, one global load and one
/// global store per item, vectorized arithmetic in between.
fn replay_stream(characterizer: &Characterizer) -> Result<()> {
    characterizer.host_memory_store(0x4_0000, 8192);
    characterizer.kernel_begin("stream_demo");

    let body = BlockId(0);
    for group in 0..2u64 {
        let mut tracker = characterizer.begin_work_group();
        for item in 0..32u64 {
            let index = group * 32 + item;
            tracker.work_item_begin();
            tracker.instruction(&InstructionEvent::new("load", body).with_width(4))?;
            tracker.memory_load(AddressSpace::Global, 0x4_0000 + index * 16, 16, "src");
            tracker.instruction(&InstructionEvent::new("fmul", body).with_width(4))?;
            tracker.instruction(&InstructionEvent::new("store", body).with_width(4))?;
            tracker.memory_store(AddressSpace::Global, 0x8_0000 + index * 16, 16, "dst");
            tracker.work_item_complete();
        }
        characterizer.complete_work_group(tracker);
    }
    characterizer.host_memory_load(0x8_0000, 8192);
    Ok(())
}

/// Data-dependent branching: one work-group, 32 items, a branch whose
/// outcome alternates with the item index plus a constant-table lookup.
fn replay_branchy(characterizer: &Characterizer) -> Result<()> {
    characterizer.host_memory_store(0xC_0000, 1024);
    characterizer.kernel_begin("branchy_demo");

    let head = BlockId(0);
    let then_block = BlockId(1);
    let else_block = BlockId(2);

    let mut tracker = characterizer.begin_work_group();
    for item in 0..32u64 {
        tracker.work_item_begin();
        for step in 0..8u64 {
            tracker.instruction(&InstructionEvent::new("load", head))?;
            tracker.memory_load(AddressSpace::Constant, (step % 4) * 8, 8, "table");
            tracker.instruction(&InstructionEvent::new("icmp", head))?;
            let branch = InstructionEvent::new("br", head)
                .at_line(21)
                .with_branch(then_block, else_block);
            tracker.instruction(&branch)?;
            let target = if (item + step) % 2 == 0 {
                then_block
            } else {
                else_block
            };
            tracker.instruction(&InstructionEvent::new("add", target))?;
        }
        tracker.work_item_complete();
    }
    characterizer.complete_work_group(tracker);
    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

use kernel::{Kernel, KernelConfig, Snapshot};
use types::Pid;

mod operator;

use operator::OperatorConsole;

/// Operator console for the paging kernel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Physical memory in words
    #[arg(long, default_value_t = 1024)]
    memory: usize,

    /// Words per page
    #[arg(long, default_value_t = 16)]
    page_size: usize,

    /// Instructions per time slice
    #[arg(short, long, default_value_t = 4)]
    quantum: usize,

    /// Disk latency in continuous mode (ms)
    #[arg(long, default_value_t = 50)]
    disk_latency: u64,

    /// Console latency in continuous mode (ms)
    #[arg(long, default_value_t = 50)]
    device_latency: u64,

    /// Write every scheduler transition to this file as JSON lines
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Start with instruction tracing on
    #[arg(short, long)]
    trace: bool,
}

/// One console command line.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a process from a built-in program
    New { program: String },
    /// Remove a process
    Rm { pid: Pid },
    /// List processes and scheduler queues
    Ps,
    /// Show a process's registers, page table and resident frames
    Dump { pid: Pid },
    /// Show physical memory in [start, end)
    Dumpm { start: usize, end: usize },
    /// Turn instruction tracing on or off
    Trace { state: Toggle },
    /// Run every process to completion (blocking mode)
    Execall,
    /// Switch to continuous mode with worker threads
    Threads,
    /// Answer a console read in continuous mode
    In { value: i32 },
    /// List built-in programs
    Programs,
    /// Leave the console
    Exit,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Toggle {
    On,
    Off,
}

enum Flow {
    Continue,
    Exit,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let config = KernelConfig::default()
        .with_memory_size(args.memory)
        .with_page_size(args.page_size)
        .with_quantum(args.quantum)
        .with_disk_latency(Duration::from_millis(args.disk_latency))
        .with_device_latency(Duration::from_millis(args.device_latency))
        .with_trace(args.trace);
    if config.frame_count() == 0 {
        bail!(
            "memory of {} words holds no page of {} words",
            config.memory_size(),
            config.page_size()
        );
    }

    let continuous = Arc::new(AtomicBool::new(false));
    let (input, input_rx) = mpsc::channel();
    let kernel = Kernel::new(
        config,
        Box::new(OperatorConsole::new(Arc::clone(&continuous), input_rx)),
    );

    if let Some(path) = &args.log_file {
        let file = File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))?;
        kernel.set_journal_sink(Box::new(BufWriter::new(file)));
    }

    println!("{}", "Paging kernel console".bold().blue());
    println!("{}", "=====================".blue());
    println!(
        "  memory {} words, {} frames of {} words, quantum {}",
        kernel.config().memory_size(),
        kernel.config().frame_count(),
        kernel.config().page_size(),
        kernel.config().quantum()
    );
    println!("  type {} for the command list", "help".bold());

    let stdin = io::stdin();
    loop {
        print!("{} ", ">".bold());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read command")? == 0 {
            break;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let command = match Line::try_parse_from(tokens) {
            Ok(line) => line.command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        match execute(&kernel, &continuous, &input, command) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => println!("{} {:#}", "error:".red().bold(), e),
        }
    }

    drop(input);
    kernel.shutdown();
    Ok(())
}

fn execute(kernel: &Kernel, continuous: &AtomicBool, input: &Sender<i32>, command: Command) -> Result<Flow> {
    match command {
        Command::New { program } => {
            let pid = kernel.spawn(&program)?;
            println!("{} process {} ({})", "created".green(), pid, program);
        }
        Command::Rm { pid } => {
            kernel.remove_process(pid)?;
            println!("{} process {}", "removed".green(), pid);
        }
        Command::Ps => print_snapshot(&kernel.snapshot()),
        Command::Dump { pid } => print!("{}", kernel.dump_process(pid)?),
        Command::Dumpm { start, end } => {
            if start > end {
                bail!("empty range [{}, {})", start, end);
            }
            print!("{}", kernel.dump_memory(start, end));
        }
        Command::Trace { state } => {
            let on = matches!(state, Toggle::On);
            kernel.set_trace(on);
            println!("trace {}", if on { "on" } else { "off" });
        }
        Command::Execall => {
            if continuous.load(Ordering::SeqCst) {
                bail!("processes already run on their own in continuous mode");
            }
            let steps = kernel.run_blocking()?;
            println!("{} after {} steps", "all processes finished".green(), steps);
        }
        Command::Threads => {
            continuous.store(true, Ordering::SeqCst);
            kernel.start_continuous()?;
            println!("{}", "continuous mode: scheduler, disk and console workers started".green());
        }
        Command::In { value } => {
            if !continuous.load(Ordering::SeqCst) {
                bail!("input is requested directly in blocking mode");
            }
            input.send(value).context("No console worker is listening")?;
        }
        Command::Programs => {
            for name in programs::names() {
                println!("  {}", name);
            }
        }
        Command::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

fn print_snapshot(snap: &Snapshot) {
    if snap.processes.is_empty() {
        println!("no processes");
    } else {
        for p in &snap.processes {
            let state = p.state.to_string();
            let state = match p.state {
                kernel::ProcessState::Running => state.green(),
                kernel::ProcessState::Blocked => state.yellow(),
                _ => state.normal(),
            };
            println!("  {:>3}  {:<12} {:<10} pc={}", p.id, p.name, state, p.pc);
        }
    }
    println!("  running:         {:?}", snap.running);
    println!("  ready:           {:?}", snap.ready);
    println!("  blocked console: {:?}", snap.blocked_io);
    println!("  blocked vm:      {:?}", snap.blocked_vm);
}

// crates/tactrace-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tactrace_core::{
    codec::CodecOptions, dataset::dataset_line, io::ReadProgress, load, save, LoadOptions,
    Producer, SaveOptions, Trace,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "tactrace",
    about = "Proof-session trace tools",
    long_about = "Proof-session trace tools.\n\nThe format of every file is chosen by its suffix: `.pickle` is binary, `.zst` adds compression, anything else is text.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Deep-load a trace and write it, flattened, in the output's format
    Convert {
        /// Input trace (its referenced files are followed)
        input: PathBuf,

        /// Output trace
        output: PathBuf,

        /// Log read progress for every file
        #[arg(long, default_value_t = false)]
        progress: bool,

        /// Stack reserved up front for one encode/decode, in MiB (0 = caller's stack); not a depth limit
        #[arg(long, default_value_t = 256)]
        stack_size_mb: usize,
    },

    /// Print `path: references` for every declaration of a deep-loaded trace
    Dataset {
        /// Input trace (its referenced files are followed)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Convert {
            input,
            output,
            progress,
            stack_size_mb,
        } => convert(input, output, progress, stack_size_mb),

        Cmd::Dataset { input } => dataset(input),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn log_progress(p: &ReadProgress) {
    match p.total {
        Some(total) => info!(
            file = %p.path.display(),
            read = p.bytes_read,
            total,
            done = p.done,
            "reading"
        ),
        None => info!(file = %p.path.display(), read = p.bytes_read, done = p.done, "reading"),
    }
}

fn convert(input: PathBuf, output: PathBuf, progress: bool, stack_size_mb: usize) -> Result<()> {
    let codec = CodecOptions {
        stack_size: stack_size_mb << 20,
        ..CodecOptions::default()
    };
    let mut opts = LoadOptions {
        deep: true,
        codec,
        progress: None,
    };
    if progress {
        opts = opts.with_progress(log_progress);
    }

    info!(infile=%input.display(), outfile=%output.display(), "converting");
    let trace = load(&input, &opts).with_context(|| format!("loading {}", input.display()))?;

    // Count declarations as the writer drains them, without forcing the trace.
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let declarations = Producer::new(trace.declarations.inspect(move |item| {
        if item.is_ok() {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }));
    let trace = Trace::new(trace.sub_filenames, declarations);

    save(&output, trace, &SaveOptions { codec })
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Converted {} → {} ({} declarations)",
        input.display(),
        output.display(),
        seen.load(Ordering::Relaxed)
    );
    Ok(())
}

fn dataset(input: PathBuf) -> Result<()> {
    info!(infile=%input.display(), "extracting dataset");
    let trace = load(&input, &LoadOptions::deep())
        .with_context(|| format!("loading {}", input.display()))?;

    let stdout = io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    for item in trace.declarations {
        let decl = item.with_context(|| format!("reading declarations of {}", input.display()))?;
        writeln!(w, "{}", dataset_line(&decl))?;
    }
    w.flush()?;
    Ok(())
}

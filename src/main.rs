//! CLI entrypoint for `krbng2john`.
//!
//! Processes each PDML dump in argument order, streaming `$krb5ng$` lines to
//! stdout. Optionally prints a run summary to stderr and writes TXT/CSV
//! exports when an output directory is provided.
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};
use krbng2john::{
    engine::Engine,
    export::{save_exchanges_csv, save_hashes_txt},
    io::DEFAULT_MMAP_THRESHOLD_BYTES,
    report::render_summary,
};
use log::{LevelFilter, error};

#[derive(Parser, Debug)]
#[command(
    name = "krbng2john",
    version,
    about = "Extract Kerberos pre-auth exchanges from PDML dumps (tshark -T pdml) as $krb5ng$ lines"
)]
struct Args {
    /// PDML dump file(s)
    #[arg(value_name = "PDML_FILE")]
    files: Vec<PathBuf>,

    /// Also write hash and CSV exports into this directory
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Override mmap threshold in bytes. If zero, disable mmap.
    #[arg(long = "mmap-threshold", default_value_t = DEFAULT_MMAP_THRESHOLD_BYTES)]
    mmap_threshold: u64,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print a run summary to stderr
    #[arg(long = "summary")]
    summary: bool,

    /// Control color output of the summary (auto, always, never)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);
    if args.files.is_empty() {
        eprintln!("{}", Args::command().render_usage());
        std::process::exit(1);
    }
    match args.color {
        ColorChoice::Always => {
            colored::control::set_override(true);
        }
        ColorChoice::Never => {
            colored::control::set_override(false);
        }
        ColorChoice::Auto => {}
    }

    let threshold = if args.mmap_threshold == 0 {
        u64::MAX
    } else {
        args.mmap_threshold
    };
    let mut engine = Engine::with_mmap_threshold(threshold);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for path in &args.files {
        if let Err(e) = engine.process_path(path, &mut out) {
            error!("{}: {:#}", path.display(), e);
        }
    }
    let _ = out.flush();
    drop(out);

    if args.summary {
        eprintln!("{}", render_summary(&engine));
    }

    if let Some(outdir) = args.output {
        if let Err(e) = fs::create_dir_all(&outdir) {
            error!(
                "failed to create output directory {}: {}",
                outdir.display(),
                e
            );
            std::process::exit(4);
        }
        let ts = chrono::Local::now().format("%Y.%m.%d_%H.%M.%S");
        let txt = outdir.join(format!("krbng2john_hashes_{}.txt", ts));
        let csv = outdir.join(format!("krbng2john_exchanges_{}.csv", ts));
        if let Err(e) = save_hashes_txt(&engine, &txt) {
            error!("failed to write {}: {}", txt.display(), e);
            std::process::exit(5);
        }
        if let Err(e) = save_exchanges_csv(&engine, &csv) {
            error!("failed to write {}: {}", csv.display(), e);
            std::process::exit(5);
        }
    }

    if engine.stats.files_failed > 0 {
        std::process::exit(3);
    }
}

//! kmod-builtin: list built-in kernel modules and print their modinfo.
//!
//! Reads `<dir>/modules.builtin.modinfo`. The directory is taken from `--dir`,
//! then the config's `dirname`, then `--release` (or the config's `release`),
//! then the running kernel.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::{LevelFilter, Log, Metadata, Record};
use serde::Serialize;

use kmod_builtin::{get_modinfo, BuiltinIter, Config, Context};

#[derive(Parser)]
#[command(name = "kmod-builtin", version)]
#[command(about = "Inspect modules compiled into the kernel image")]
struct Args {
    /// Module directory containing modules.builtin.modinfo
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Kernel release; resolves to /lib/modules/<release>
    #[arg(short, long, global = true)]
    release: Option<String>,

    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (repeat for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List built-in module names in file order
    List {
        /// Also print the number of modinfo records per module
        #[arg(long)]
        count: bool,
    },
    /// Print the modinfo strings of one built-in module
    Modinfo {
        /// Module name (e.g. "ext4")
        name: String,

        /// Only print values of this key (e.g. "alias")
        #[arg(short = 'F', long)]
        field: Option<String>,
    },
}

#[derive(Serialize)]
struct ModuleSummary {
    name: String,
    records: usize,
}

/// Minimal stderr logger.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("kmod-builtin: {}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn resolve_context(args: &Args, config: &Config) -> kmod_builtin::Result<Context> {
    if let Some(dir) = &args.dir {
        return Ok(Context::new(dir.clone()));
    }
    if config.dirname.is_none() {
        if let Some(release) = &args.release {
            return Ok(Context::from_release(release));
        }
    }
    config.context()
}

fn list(ctx: &Context, counts: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let iter = BuiltinIter::new(ctx)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if json {
        let modules = iter
            .groups()
            .map(|g| {
                g.map(|g| ModuleSummary {
                    name: g.name_lossy().into_owned(),
                    records: g.count(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        serde_json::to_writer_pretty(&mut out, &modules)?;
        writeln!(out)?;
        return Ok(());
    }

    for group in &iter {
        let group = group?;
        if counts {
            writeln!(out, "{} {}", group.name_lossy(), group.count())?;
        } else {
            writeln!(out, "{}", group.name_lossy())?;
        }
    }
    Ok(())
}

fn modinfo(
    ctx: &Context,
    name: &str,
    field: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let info = get_modinfo(ctx, name)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match (field, json) {
        (Some(key), true) => {
            let values: Vec<String> = info
                .get_all(key)
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .collect();
            serde_json::to_writer_pretty(&mut out, &values)?;
            writeln!(out)?;
        }
        (Some(key), false) => {
            for value in info.get_all(key) {
                out.write_all(value)?;
                writeln!(out)?;
            }
        }
        (None, true) => {
            serde_json::to_writer_pretty(&mut out, &info)?;
            writeln!(out)?;
        }
        (None, false) => {
            for line in info.iter() {
                out.write_all(line)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let ctx = resolve_context(&args, &config)?;
    log::debug!("module directory: {}", ctx.dirname().display());
    let json = args.json || config.json;

    match &args.command {
        Command::List { count } => list(&ctx, *count, json),
        Command::Modinfo { name, field } => modinfo(&ctx, name, field.as_deref(), json),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("kmod-builtin: {}", e);
            ExitCode::FAILURE
        }
    }
}

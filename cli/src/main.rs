use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use cache_sim::{
    config::{CacheConfig, LookupScope, MappingDirection},
    sim::Simulator,
    trace::Trace,
};
use clap::{Parser, ValueEnum};

#[cfg(feature = "stat")]
use terminal_size::terminal_size;

/// Replays a trace of hexadecimal addresses through a FIFO cache
/// and reports the cache contents after every access.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Total cache size in bytes
    total_size: u32,
    /// Line size in bytes
    line_size: u32,
    /// Lines per set (1 = direct-mapped, all lines = fully associative)
    set_size: u32,
    /// File with one hexadecimal address per line
    trace: PathBuf,
    /// File path to the report (`-` for stdout)
    #[arg(short, long, default_value = "saida.txt")]
    output: PathBuf,
    /// File path to a JSON dump of the run
    #[arg(long)]
    json: Option<PathBuf>,
    /// How blocks are folded onto sets
    #[arg(long, value_enum, default_value_t = Mapping::Forward)]
    mapping: Mapping,
    /// Where hits are searched for
    #[arg(long, value_enum, default_value_t = Lookup::Global)]
    lookup: Lookup,
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mapping {
    /// set = block mod sets
    Forward,
    /// set = sets - 1 - (block mod sets)
    Reverse,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Lookup {
    /// search every line
    Global,
    /// search the mapped set only
    Set,
}

impl From<Mapping> for MappingDirection {
    fn from(m: Mapping) -> Self {
        match m {
            Mapping::Forward => MappingDirection::Forward,
            Mapping::Reverse => MappingDirection::Reverse,
        }
    }
}

impl From<Lookup> for LookupScope {
    fn from(l: Lookup) -> Self {
        match l {
            Lookup::Global => LookupScope::Global,
            Lookup::Set => LookupScope::Set,
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::init();
    }
    run(args)
}

fn run(args: Cli) -> Result<()> {
    let config = CacheConfig::new(args.total_size, args.line_size, args.set_size)
        .with_mapping(args.mapping.into())
        .with_lookup(args.lookup.into());
    let mut sim = Simulator::new(&config).context("invalid cache configuration")?;
    let trace = Trace::read(&args.trace)?;
    sim.run(&trace);
    output_stat(&sim);
    let result = sim.into_result();

    let mut report = Vec::new();
    result.write_report(&mut report)?;
    let to_stdout = args.output == Path::new("-");
    let mut outputs = Vec::new();
    if let Some(path) = args.json {
        let mut json = Vec::new();
        result.write_json(&mut json)?;
        outputs.push((path, json));
    }
    if to_stdout {
        write_outputs(&outputs)?;
        io::stdout().lock().write_all(&report)?;
    } else {
        outputs.push((args.output, report));
        write_outputs(&outputs)?;
    }
    Ok(())
}

/// creates every file before writing any of them; none is left behind if one fails.
fn write_outputs(outputs: &[(PathBuf, Vec<u8>)]) -> Result<()> {
    let mut files = Vec::with_capacity(outputs.len());
    for (path, _) in outputs {
        match File::create(path) {
            Ok(file) => files.push(file),
            Err(e) => {
                for (created, _) in &outputs[..files.len()] {
                    let _ = fs::remove_file(created);
                }
                return Err(e).with_context(|| format!("failed to create {}", path.display()));
            }
        }
    }
    for (mut file, (path, content)) in files.into_iter().zip(outputs) {
        file.write_all(content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("written to {}.", path.display());
    }
    Ok(())
}

#[cfg(not(feature = "stat"))]
fn output_stat(_: &Simulator) {}

#[cfg(feature = "stat")]
fn output_stat(sim: &Simulator) {
    let stats = sim.collect_stat();
    if stats.is_empty() {
        return;
    }
    let max_width = get_terminal_width().unwrap_or(120) as usize;
    log::info!("statistics:\n{}", stats.view(max_width));
}

#[cfg(feature = "stat")]
fn get_terminal_width() -> Option<u16> {
    terminal_size().map(|(w, _)| w.0.saturating_sub(20))
}

//! rulematch CLI
//!
//! Usage:
//!   rulematch [OPTIONS] <RULES> [INPUT]
//!
//! Options:
//!   -c, --config <FILE>  Engine configuration (TOML format)
//!       --check          Only compile the rules
//!   -t, --tree           Print each compiled rule and exit
//!   -s, --strict         Fail when an input line matches no rule
//!   -v, --verbose        Log rule dispatch to stderr
//!   -h, --help           Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing::warn;

use rulematch::{CollectingSink, EngineConfig, RuleCompiler, RuleSet, RuleSetError};

#[derive(Parser)]
#[command(name = "rulematch")]
#[command(about = "Rewrite input lines with `pattern => template` rules")]
struct Cli {
    /// Rules file, one rule per line
    rules: PathBuf,

    /// Input file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Engine configuration (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only compile the rules and report errors
    #[arg(long)]
    check: bool,

    /// Print each compiled rule rebuilt from its tree, then exit
    #[arg(short, long)]
    tree: bool,

    /// Exit with an error when an input line matches no rule
    #[arg(short, long)]
    strict: bool,

    /// Log rule dispatch to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default = if verbose {
        "rulematch=debug"
    } else {
        "rulematch=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let rules = match RuleSet::from_file(&cli.rules, RuleCompiler::with_config(config)) {
        Ok(rules) => rules,
        Err(RuleSetError::Rule { line, text, source }) => {
            let filename = format!("{}:{}", cli.rules.display(), line);
            eprint!("{}", source.format(&text, &filename));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error reading rules '{}': {}", cli.rules.display(), e);
            std::process::exit(1);
        }
    };

    if cli.tree {
        for (index, rule) in rules.rules().iter().enumerate() {
            println!("{:>3}: {}", index, rule);
        }
        return;
    }

    if cli.check {
        eprintln!("{} rules compiled", rules.len());
        return;
    }

    // Read input
    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let mut unmatched = 0;
    let mut failed = 0;
    for (index, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let input: Vec<char> = line.chars().collect();
        let mut sink = CollectingSink::new();
        match rules.process_line(&input, 0, &mut sink) {
            Ok(Some(_)) => {
                for statement in sink.lines() {
                    println!("{}", statement);
                }
            }
            Ok(None) => {
                warn!(line = index + 1, text = line, "no rule matched");
                unmatched += 1;
            }
            Err(e) => {
                eprintln!("Error on line {}: {}", index + 1, e);
                failed += 1;
            }
        }
    }

    if failed > 0 || (cli.strict && unmatched > 0) {
        std::process::exit(1);
    }
}

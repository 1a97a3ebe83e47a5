//! rustible-tags - inspect which tasks a tag selection runs
//!
//! This is the main entry point for the rustible-tags CLI.

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::output::OutputFormatter;
use cli::{Cli, Commands};
use rustible_tags::config::Config;
use rustible_tags::logging::LoggingBuilder;

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            let output = OutputFormatter::new(!cli.no_color, cli.is_json(), cli.verbosity());
            output.error(&format!("{:#}", e));
            exit_code_for(&e)
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    // An explicitly requested config must load; implicit ones fall back to defaults
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_none() => {
            if cli.verbosity() >= 1 {
                eprintln!("Warning: Failed to load config: {:#}", e);
            }
            Config::default()
        }
        Err(e) => return Err(e),
    };

    init_logging(cli, &config);

    if cli.verbosity() >= 2 {
        eprintln!("rustible-tags v{}", VERSION);
    }

    let mut ctx = CommandContext::new(cli, config)?;

    match &cli.command {
        Commands::ListTasks(args) => args.execute(&mut ctx),
        Commands::ListTags(args) => args.execute(&mut ctx),
        Commands::Check(args) => args.execute(&mut ctx),
    }
}

/// Initialize logging from `-v` or, without it, from the configuration
fn init_logging(cli: &Cli, config: &Config) {
    let builder = if cli.verbose > 0 {
        LoggingBuilder::from_verbosity(cli.verbosity())
    } else {
        config.logging_builder()
    };

    let builder = builder.with_ansi(!cli.no_color && config.output.color);
    if let Err(e) = builder.init() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
}

/// Exit status for an error, using the library's mapping when available
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<rustible_tags::Error>())
        .map(rustible_tags::Error::exit_code)
        .unwrap_or(1)
}

// File: ./src/bin/mdtasks.rs
use anyhow::Result;
use mdtasks::cli::{self, Command};
use mdtasks::config::Settings;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::env;
use std::io;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = cli::parse_args(&args)?;

    if invocation.command == Command::Help {
        cli::print_help("mdtasks");
        return Ok(());
    }

    let level = match invocation.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if let Err(e) = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Logging disabled: {}", e);
    }

    let settings = Settings::load_or_default(invocation.config.as_deref())?;
    log::debug!("Using settings {:?}", settings);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::run(&invocation, &settings, &mut out)
}

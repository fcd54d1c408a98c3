//! Logger setup for the `binder` command: the terminal always, plus
//! `./binder.log` when asked for.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use crate::cli::Cli;

const LOG_FILE: &str = "./binder.log";

/// Crates whose debug output drowns out the binder's own.
const QUIET_TARGETS: &[&str] = &["html5ever", "selectors", "hyper", "reqwest", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub level: LevelFilter,
    pub to_file: bool,
}

impl LogOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            level: if cli.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
            to_file: cli.log_file,
        }
    }
}

pub fn initialize(options: LogOptions) {
    let config = logger_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        options.level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if options.to_file {
        match File::create(LOG_FILE) {
            Ok(file) => loggers.push(WriteLogger::new(options.level, config, file)),
            Err(err) => eprintln!(
                "Warning: no log file at {}: {}",
                Path::new(LOG_FILE).display(),
                err
            ),
        }
    }

    let _ = CombinedLogger::init(loggers);
}

fn logger_config() -> Config {
    let mut builder = ConfigBuilder::new();
    builder
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error);
    for &target in QUIET_TARGETS {
        builder.add_filter_ignore_str(target);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn verbose_flag_lowers_the_level() {
        let cli = Cli::try_parse_from(["binder", "-v", "--log-file", "https://x/series/a"]).unwrap();
        assert_eq!(
            LogOptions::from_cli(&cli),
            LogOptions {
                level: LevelFilter::Debug,
                to_file: true
            }
        );

        let cli = Cli::try_parse_from(["binder", "https://x/series/a"]).unwrap();
        assert_eq!(LogOptions::from_cli(&cli).level, LevelFilter::Info);
    }
}

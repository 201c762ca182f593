use std::path::PathBuf;

use clap::{value_parser, Arg, ArgMatches, Command};

use crate::config::Config;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Command-line values win over the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref file) = self.log_file {
            config.log.file = Some(file.clone());
        }

        if let Some(ref level) = self.log_level {
            config.log.level = level.clone();
        }
    }
}

pub fn command() -> Command {
    Command::new("hoststat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live host metrics with the top processes by CPU, memory, disk I/O and connections")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a TOML configuration file")
                .value_name("PATH")
                .env("HOSTSTAT_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .num_args(1)
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write logs to this file (logging is off otherwise)")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .num_args(1)
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Log filter, e.g. info or hoststat=debug (RUST_LOG takes precedence)")
                .value_name("LEVEL")
                .num_args(1)
        )
}

fn from_matches(matches: &ArgMatches) -> CliArgs {
    CliArgs {
        config: matches.get_one::<PathBuf>("config").cloned(),
        log_file: matches.get_one::<PathBuf>("log-file").cloned(),
        log_level: matches.get_one::<String>("log-level").cloned(),
    }
}

pub fn parse_args() -> CliArgs {
    from_matches(&command().get_matches())
}

use clap::{Parser, Subcommand, ValueEnum};
use common::StablecoinFilter;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "stablemap.yaml";

#[derive(Parser, Debug)]
#[command(name = "stablemap")]
#[command(about = "Stablemap - per-country stablecoin trading volume estimates")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the volume API, refreshing upstream data in the background
    Serve {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG, env = "STABLEMAP_CONFIG")]
        config: PathBuf,

        /// Override HTTP port
        #[arg(long)]
        http: Option<u16>,
    },

    /// Fetch once, aggregate, and print the result as JSON
    Snapshot {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG, env = "STABLEMAP_CONFIG")]
        config: PathBuf,

        /// Stablecoin to estimate
        #[arg(short, long, value_enum, default_value = "all")]
        filter: FilterArg,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,

        /// Read inputs from a JSON fixture instead of the live APIs
        #[arg(long)]
        fixture: Option<PathBuf>,
    },

    /// Validate configuration without starting the service
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG, env = "STABLEMAP_CONFIG")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterArg {
    /// Every stablecoin
    All,
    Usdt,
    Usdc,
    Dai,
}

impl From<FilterArg> for StablecoinFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => StablecoinFilter::All,
            FilterArg::Usdt => StablecoinFilter::Usdt,
            FilterArg::Usdc => StablecoinFilter::Usdc,
            FilterArg::Dai => StablecoinFilter::Dai,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_with_port_override() {
        let cli = Cli::try_parse_from(["stablemap", "serve", "-c", "prod.yaml", "--http", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { config, http } => {
                assert_eq!(config, PathBuf::from("prod.yaml"));
                assert_eq!(http, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_defaults() {
        let cli = Cli::try_parse_from(["stablemap", "snapshot"]).unwrap();
        match cli.command {
            Commands::Snapshot { filter, pretty, fixture, .. } => {
                assert_eq!(StablecoinFilter::from(filter), StablecoinFilter::All);
                assert!(!pretty);
                assert!(fixture.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_filter() {
        let cli = Cli::try_parse_from(["stablemap", "snapshot", "--filter", "usdc", "--pretty"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Snapshot { filter: FilterArg::Usdc, pretty: true, .. }
        ));
        assert!(Cli::try_parse_from(["stablemap", "snapshot", "--filter", "busd"]).is_err());
    }
}

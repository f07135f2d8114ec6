use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "paysyncd")]
#[command(about = "PaySync - account state and settlement synchronizer")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the synchronizer service
    Start {
        /// Path to the configuration file
        #[arg(short, long, default_value = "paysync.yaml")]
        config: PathBuf,

        /// Override the listen port
        #[arg(long)]
        port: Option<u16>,

        /// Run with the in-memory store instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },

    /// Validate configuration without starting the service
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "paysync.yaml")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "paysync.yaml")]
        output: PathBuf,
    },
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
    fn test_parse_start() {
        let cli = Cli::try_parse_from(["paysyncd", "start", "--port", "9000", "--in-memory"])
            .expect("start should parse");
        match cli.command {
            Commands::Start {
                port, in_memory, ..
            } => {
                assert_eq!(port, Some(9000));
                assert!(in_memory);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_validate_default_path() {
        let cli = Cli::try_parse_from(["paysyncd", "validate"]).expect("validate should parse");
        match cli.command {
            Commands::Validate { config } => {
                assert_eq!(config, PathBuf::from("paysync.yaml"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

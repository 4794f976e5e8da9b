use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "adblock-gateway-sync")]
#[command(about = "Sync ad-block feeds into a Cloudflare Zero Trust Gateway DNS policy")]
pub struct Cli {
    /// Path to TOML configuration file (defaults to ./gateway-sync.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch feeds and replace the gateway lists and policy (default)
    Sync {
        /// Compute the target and report the plan without writing to the gateway
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete the managed policy and every managed list
    Delete,
    /// Write the computed block list to a local file
    Export {
        #[arg(short, long, default_value = "domains.txt")]
        output: String,
    },
}

impl Cli {
    /// No subcommand means a plain sync.
    pub fn resolved_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Sync { dry_run: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_sync() {
        let cli = Cli::try_parse_from(["adblock-gateway-sync"]).unwrap();
        assert!(matches!(cli.resolved_command(), Command::Sync { dry_run: false }));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "adblock-gateway-sync",
            "export",
            "--output",
            "out.txt",
            "--verbose",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.resolved_command(), Command::Export { ref output } if output == "out.txt"));
    }

    #[test]
    fn test_dry_run_flag() {
        let cli = Cli::try_parse_from(["adblock-gateway-sync", "sync", "--dry-run"]).unwrap();
        assert!(matches!(cli.resolved_command(), Command::Sync { dry_run: true }));
    }
}

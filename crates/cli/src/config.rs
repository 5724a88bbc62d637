//! Command-line configuration.

use crate::commands::{Command, RunContext};
use anyhow::Result;
use clap::Parser;
use std::num::NonZeroUsize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Simulate reshard churn under bounded-load consistent hashing.
#[derive(Debug, Parser)]
#[command(name = "reshard-sim", version, about)]
pub struct CliConfig {
    /// Base seed; trial `i` uses `seed + i`. Random when omitted.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Worker threads for repeated trials. Defaults to the available cores.
    #[arg(long, global = true)]
    pub threads: Option<NonZeroUsize>,

    /// Print the report as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> Result<()> {
        init_tracing();

        let ctx = self.context();
        info!(seed = ctx.seed, threads = ctx.threads, "starting");

        let result = self.command.execute(&ctx)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{result}");
        }
        Ok(())
    }

    pub fn context(&self) -> RunContext {
        RunContext {
            seed: self.seed.unwrap_or_else(rand::random),
            threads: self
                .threads
                .or_else(|| std::thread::available_parallelism().ok())
                .map_or(1, NonZeroUsize::get),
        }
    }
}

/// Logs go to stderr so `--json` output stays parseable. `RUST_LOG` overrides
/// the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        CliConfig::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let config =
            CliConfig::try_parse_from(["reshard-sim", "perturb", "--trials", "3", "--seed", "9", "--json"])
                .unwrap();
        assert_eq!(config.seed, Some(9));
        assert!(config.json);
        assert!(matches!(config.command, Command::Perturb(ref args) if args.trials == 3));
        assert_eq!(config.context().seed, 9);
    }

    #[test]
    fn test_negative_delta_parses() {
        let config =
            CliConfig::try_parse_from(["reshard-sim", "stability", "--min-delta", "-80"]).unwrap();
        match config.command {
            Command::Stability(args) => assert_eq!(args.min_delta, -80),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(CliConfig::try_parse_from(["reshard-sim", "grow", "--threads", "0"]).is_err());
    }
}

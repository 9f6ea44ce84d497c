//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// lambda-view - watch and tune running strategies
#[derive(Parser, Debug)]
#[command(name = "lambda-view")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file listing environments
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Connect here instead of the environment's host
    #[arg(long, global = true)]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List environments and their instances
    Envs,

    /// Print states and params whenever they change, until Ctrl-C
    Watch(TargetArgs),

    /// Edit one parameter
    Set {
        #[command(flatten)]
        target: TargetArgs,

        /// Parameter key
        key: String,

        /// New value, coerced to the parameter's type
        value: String,

        /// Seconds to wait for the parameter to be reported
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },

    /// Set the strategy's run state to Live
    Start(TargetArgs),

    /// Set the strategy's run state to Stopped
    Stop(TargetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Environment name, e.g. Local
    pub env: String,

    /// Strategy instance, e.g. swap-mm-ethusd
    pub instance: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set() {
        let cli = Cli::try_parse_from([
            "lambda-view",
            "--host",
            "redis://127.0.0.1:6379",
            "set",
            "Local",
            "swap-mm-ethusd",
            "size",
            "42",
        ])
        .unwrap();

        assert_eq!(cli.host.as_deref(), Some("redis://127.0.0.1:6379"));
        match cli.command {
            Command::Set {
                target,
                key,
                value,
                timeout,
            } => {
                assert_eq!(target.env, "Local");
                assert_eq!(target.instance, "swap-mm-ethusd");
                assert_eq!(key, "size");
                assert_eq!(value, "42");
                assert_eq!(timeout, 10);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["lambda-view", "watch", "Tokyo", "latency-mm", "--config", "c.json"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        assert!(matches!(cli.command, Command::Watch(_)));
    }

    #[test]
    fn start_requires_instance() {
        assert!(Cli::try_parse_from(["lambda-view", "start", "Local"]).is_err());
    }
}

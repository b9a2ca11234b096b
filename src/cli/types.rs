//! CLI type definitions
//!
//! Top-level clap structures. Each subcommand's arguments live next to its
//! implementation in `crate::cli::commands`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::{
    area::AreaArgs, compat::CompatArgs, init::InitArgs, profile::ProfileArgs,
    session::SessionArgs, stats::StatsArgs,
};

#[derive(Parser, Debug)]
#[command(name = "hotlabel-users")]
#[command(about = "HotLabel user profiling and task compatibility service", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .hotlabel/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the .hotlabel directory, default config and database
    Init(InitArgs),
    /// Expertise area taxonomy
    Area(AreaArgs),
    /// Anonymous sessions
    Session(SessionArgs),
    /// Expert profiles
    Profile(ProfileArgs),
    /// Task statistics
    Stats(StatsArgs),
    /// Task compatibility scoring
    Compat(CompatArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hotlabel-users",
            "area",
            "list",
            "--json",
            "--config",
            "custom.yaml",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        assert!(matches!(cli.command, Commands::Area(_)));
    }

    #[test]
    fn test_compat_score_requires_task_file() {
        let result = Cli::try_parse_from(["hotlabel-users", "compat", "score", "sess_1234abcd"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_report_subcommands_parse() {
        let cli = Cli::try_parse_from(["hotlabel-users", "stats", "publisher", "pub_1", "--days", "7"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Stats(_)));

        let cli = Cli::try_parse_from(["hotlabel-users", "profile", "top", "-l", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::Profile(_)));

        assert!(Cli::try_parse_from(["hotlabel-users", "profile", "verify"]).is_err());
    }
}

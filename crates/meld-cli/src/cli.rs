use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "MELD CLI - Validate MELD restraint files and replay the restraint transformer against an in-memory force engine.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output, including errors (failures are still printed to stderr)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate a restraint file, then print what it contains.
    Check(CheckArgs),
    /// Register the restraints of a file and replay a schedule of updates.
    DryRun(DryRunArgs),
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the restraint file in TOML format.
    #[arg(required = true, value_name = "PATH")]
    pub file: PathBuf,
}

/// Arguments for the `dry-run` subcommand.
#[derive(Args, Debug)]
pub struct DryRunArgs {
    /// Path to the restraint file in TOML format.
    #[arg(required = true, value_name = "PATH")]
    pub file: PathBuf,

    /// Number of update steps to replay.
    #[arg(short = 'n', long, default_value_t = 10, value_name = "INT")]
    pub steps: u64,

    /// Alpha at the first step.
    #[arg(long, default_value_t = 0.0, value_name = "FLOAT")]
    pub alpha_start: f64,

    /// Alpha at the last step.
    #[arg(long, default_value_t = 0.0, value_name = "FLOAT")]
    pub alpha_end: f64,

    /// Timesteps between consecutive steps.
    #[arg(long, default_value_t = 1, value_name = "INT")]
    pub stride: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn dry_run_arguments_parse_with_defaults() {
        let cli = Cli::try_parse_from(["meld", "dry-run", "restraints.toml"]).unwrap();
        let Commands::DryRun(args) = cli.command else {
            panic!("expected dry-run");
        };
        assert_eq!(args.file, PathBuf::from("restraints.toml"));
        assert_eq!(args.steps, 10);
        assert_eq!(args.stride, 1);
        assert_eq!(args.alpha_start, 0.0);
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "meld", "check", "r.toml", "-vv", "--log-file", "out.log",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_file, Some(PathBuf::from("out.log")));
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn quiet_help_matches_disabled_logging() {
        let command = Cli::command();
        let quiet = command
            .get_arguments()
            .find(|arg| arg.get_id() == "quiet")
            .unwrap();
        let help = quiet.get_help().unwrap().to_string();
        assert!(help.contains("including errors"));
        assert!(!help.contains("except for errors"));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["meld", "-q", "-v", "check", "r.toml"]).is_err());
    }
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bioc2pubann::{
    ConvertConfig, ReconcileConfig, ReconcilePolicy, analyze_path, convert_path,
    ensure_output_dir,
};

#[derive(Parser)]
#[command(name = "bioc2pubann")]
#[command(author, version, about = "Convert PubTator BioC XML into PubAnnotation JSON Lines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert BioC XML files (or .tar.gz archives of them) to JSON Lines
    Convert {
        /// Input files: BioC XML or .tar.gz/.tgz archives
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory, created if missing
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Verbose output
        #[arg(long)]
        verbose: bool,
    },

    /// Check annotation spans without writing any output
    Analyze {
        /// Input files: BioC XML or .tar.gz/.tgz archives
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Verbose output
        #[arg(long)]
        verbose: bool,
    },
}

/// Reconciliation flags; the last one given wins
#[derive(Args, Debug, Clone)]
struct PolicyArgs {
    /// Warn about annotations whose span does not match their text
    #[arg(short, long, visible_alias = "validate", short_alias = 'v', overrides_with_all = ["skip", "fix"])]
    report: bool,

    /// Drop annotations whose span does not match their text
    #[arg(long, overrides_with_all = ["report", "fix"])]
    skip: bool,

    /// Shift mismatched spans back onto their text when possible
    #[arg(long, overrides_with_all = ["report", "skip"])]
    fix: bool,

    /// Characters searched backwards by --fix
    #[arg(long, default_value = "5")]
    lookback: i64,
}

impl PolicyArgs {
    fn to_config(&self, default: ReconcilePolicy) -> ReconcileConfig {
        let policy = if self.report {
            ReconcilePolicy::Report
        } else if self.skip {
            ReconcilePolicy::Skip
        } else if self.fix {
            ReconcilePolicy::Fix
        } else {
            default
        };
        ReconcileConfig {
            policy,
            lookback: self.lookback,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            inputs,
            output,
            policy,
            verbose,
        } => {
            setup_logging(verbose);
            let config = ConvertConfig {
                reconcile: policy.to_config(ReconcilePolicy::Go),
                output_dir: output,
            };
            convert_inputs(&inputs, &config)
        }
        Commands::Analyze {
            inputs,
            policy,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_inputs(&inputs, &policy.to_config(ReconcilePolicy::Report))
        }
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn convert_inputs(inputs: &[PathBuf], config: &ConvertConfig) -> Result<()> {
    let created = ensure_output_dir(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {:?}",
            config.output_dir
        )
    })?;
    if created {
        info!("The output directory {:?} is created", config.output_dir);
    } else {
        info!("The output will be stored in the directory {:?}", config.output_dir);
    }
    info!("Reconciliation policy: {}", config.reconcile.policy);

    for input in inputs {
        info!("processing {:?}", input);
        let outcome = convert_path(input, config)
            .with_context(|| format!("Failed to convert {:?}", input))?;

        info!(
            "{:?}: {} documents, {} records written to {:?}",
            input,
            outcome.documents,
            outcome.records,
            outcome.output_path.unwrap_or_default()
        );
        info!("{:?}: {}", input, outcome.stats);
    }

    Ok(())
}

fn analyze_inputs(inputs: &[PathBuf], config: &ReconcileConfig) -> Result<()> {
    println!("Annotation Analysis (policy: {})", config.policy);
    println!("===================");

    for input in inputs {
        let outcome = analyze_path(input, config)
            .with_context(|| format!("Failed to analyze {:?}", input))?;
        let stats = outcome.stats;

        println!();
        println!("{}", input.display());
        println!("Documents: {}", outcome.documents);
        println!("Records: {}", outcome.records);
        println!("Total annotations: {}", stats.total);
        println!(
            "Invalid: {} ({})",
            stats.invalid,
            format_percent(stats.invalid_percent())
        );
        println!(
            "Fixed: {} ({})",
            stats.fixed,
            format_percent(stats.fixed_percent())
        );
        println!("Skipped: {}", stats.skipped);
    }

    Ok(())
}

fn format_percent(value: Option<f64>) -> String {
    value
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_of(args: &[&str]) -> ReconcilePolicy {
        let mut argv = vec!["bioc2pubann", "convert"];
        argv.extend_from_slice(args);
        argv.push("in.xml");
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Convert { policy, .. } => policy.to_config(ReconcilePolicy::Go).policy,
            Commands::Analyze { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_policy_flags() {
        assert_eq!(policy_of(&[]), ReconcilePolicy::Go);
        assert_eq!(policy_of(&["--report"]), ReconcilePolicy::Report);
        assert_eq!(policy_of(&["-v"]), ReconcilePolicy::Report);
        assert_eq!(policy_of(&["--skip"]), ReconcilePolicy::Skip);
        assert_eq!(policy_of(&["--fix"]), ReconcilePolicy::Fix);
    }

    #[test]
    fn test_last_policy_flag_wins() {
        assert_eq!(policy_of(&["--skip", "--fix"]), ReconcilePolicy::Fix);
        assert_eq!(policy_of(&["--fix", "--skip"]), ReconcilePolicy::Skip);
        assert_eq!(policy_of(&["--fix", "--validate"]), ReconcilePolicy::Report);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

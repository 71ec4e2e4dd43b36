use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use ela_exp::{
    compute, load_config, run_plan_from_path, write_feature_csv, EngineConfig, FeatureMatrix,
    RunOpts, TestSuite,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ela", version, about = "Exploratory landscape analysis feature engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the features of one (function, dimension, instance) problem.
    Features(FeaturesArgs),
    /// Execute a batch plan of feature jobs.
    Run(RunArgs),
    /// Merge feature tables into one sanitized table.
    Sanitize(SanitizeArgs),
    /// Print the default engine configuration as YAML.
    ExampleConfig(ExampleConfigArgs),
}

#[derive(ClapArgs, Debug)]
struct FeaturesArgs {
    /// Function identifier.
    #[arg(long)]
    fid: u64,
    /// Search-space dimension.
    #[arg(long)]
    dim: usize,
    /// Instance identifier.
    #[arg(long)]
    iid: u64,
    /// YAML engine configuration; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output directory for the feature table.
    #[arg(long)]
    out: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// YAML plan listing functions, dimensions and instances.
    #[arg(long)]
    plan: PathBuf,
    /// Output directory for feature tables and the run report.
    #[arg(long)]
    out: PathBuf,
    /// Jobs executed in parallel.
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
    /// Skip jobs whose feature table already exists.
    #[arg(long)]
    resume: bool,
}

#[derive(ClapArgs, Debug)]
struct SanitizeArgs {
    /// Feature tables to merge.
    #[arg(long = "input", value_name = "CSV", required = true)]
    inputs: Vec<PathBuf>,
    /// Destination of the sanitized table.
    #[arg(long)]
    out: PathBuf,
    /// Keep the `costs_runtime` columns.
    #[arg(long)]
    keep_runtime: bool,
}

#[derive(ClapArgs, Debug)]
struct ExampleConfigArgs {
    /// Sample-size factor whose budget preset is printed.
    #[arg(long, default_value_t = 50)]
    sample_size_factor: usize,
}

fn setup_logging(verbose: bool) -> Result<(), Box<dyn Error>> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    match cli.command {
        Command::Features(args) => run_features(args),
        Command::Run(args) => run_batch(args),
        Command::Sanitize(args) => run_sanitize(args),
        Command::ExampleConfig(args) => {
            let config = EngineConfig::for_sample_size_factor(args.sample_size_factor);
            print!("{}", config.to_yaml_string()?);
            Ok(())
        }
    }
}

fn run_features(args: FeaturesArgs) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    fs::create_dir_all(&args.out)?;
    let rows = compute(&TestSuite, args.fid, args.dim, args.iid, &config)?;
    let path = write_feature_csv(&args.out, &rows, config.sample_size_factor)?;
    let failures: usize = rows.iter().map(|row| row.failures().len()).sum();
    info!(path = %path.display(), rows = rows.len(), failures, "feature table written");
    Ok(())
}

fn run_batch(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let opts = RunOpts {
        concurrency: args.concurrency,
        resume: args.resume,
    };
    let report = run_plan_from_path(&args.plan, &TestSuite, &args.out, &opts)?;
    info!(
        jobs = report.jobs.len(),
        completed = report.completed(),
        plan_hash = %report.plan_hash,
        "plan finished"
    );
    if report.completed() < report.jobs.len() {
        return Err(format!(
            "{} of {} jobs failed",
            report.jobs.len() - report.completed(),
            report.jobs.len()
        )
        .into());
    }
    Ok(())
}

fn run_sanitize(args: SanitizeArgs) -> Result<(), Box<dyn Error>> {
    let mut merged = FeatureMatrix::default();
    for input in &args.inputs {
        merged.extend(FeatureMatrix::read_csv(input)?)?;
    }
    let clean = merged.sanitize(!args.keep_runtime);
    clean.write_csv(&args.out)?;
    info!(
        rows = clean.rows.len(),
        columns = clean.width(),
        dropped = merged.width() - clean.width(),
        "sanitized table written"
    );
    Ok(())
}

use anyhow::{Context, Result};
use catalog_fetch::{AdvertizerSource, CatalogLinks, FetchConfig, GithubFetcher};
use catalog_model::SelectionSet;
use catalog_render::{recompute_breakdown, write_catalog};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "policy-catalog")]
#[command(about = "Extract a reviewable catalog of landing-zone policy assignments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, resolve and write the full catalog
    Extract(ExtractArgs),

    /// Recompute breakdown.csv from edited include flags, offline
    Breakdown(BreakdownArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Directory the catalog tables are written to
    #[arg(short, long, default_value = "policy_catalog")]
    output_dir: PathBuf,

    /// GitHub repository slug holding the landing-zone module
    #[arg(long)]
    repo: Option<String>,

    /// AzAdvertizer base URL
    #[arg(long)]
    advertizer_base: Option<String>,

    /// Minimum milliseconds between GitHub requests
    #[arg(long)]
    github_interval_ms: Option<u64>,

    /// Minimum milliseconds between AzAdvertizer requests
    #[arg(long)]
    advertizer_interval_ms: Option<u64>,
}

#[derive(Args)]
struct BreakdownArgs {
    /// Directory holding a previously extracted catalog
    #[arg(short, long, default_value = "policy_catalog")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Breakdown(args) => run_breakdown(args),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let mut config = FetchConfig::default();
    if let Some(repo) = args.repo {
        config.github_repo = repo;
    }
    if let Some(base) = args.advertizer_base {
        config.advertizer_base = base;
    }
    if let Some(ms) = args.github_interval_ms {
        config.github_min_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = args.advertizer_interval_ms {
        config.advertizer_min_interval = Duration::from_millis(ms);
    }

    let github = GithubFetcher::new(config.clone()).context("Cannot build GitHub fetcher")?;
    let archetypes = github
        .fetch_archetypes()
        .context("Cannot enumerate archetypes")?;

    let source = AdvertizerSource::new(&config).context("Cannot build definition source")?;
    let links = CatalogLinks::new(
        config.advertizer_base.clone(),
        config.github_repo.clone(),
        config.assignment_dir.clone(),
    );

    let catalog = catalog_resolver::run(&archetypes, &source, &links)?;
    catalog.report.log_summary();

    write_catalog(
        &args.output_dir,
        &catalog.initiatives,
        &catalog.direct_policies,
        &catalog.initiative_policies,
        &SelectionSet::default(),
    )
    .with_context(|| format!("Cannot write catalog to {}", args.output_dir.display()))?;

    log::info!(
        "Catalog ready. Set include=Yes in {}/initiatives.csv or direct_policies.csv, then run `policy-catalog breakdown`",
        args.output_dir.display()
    );
    Ok(())
}

fn run_breakdown(args: BreakdownArgs) -> Result<()> {
    let rows = recompute_breakdown(&args.output_dir).with_context(|| {
        format!(
            "Cannot recompute breakdown in {}",
            args.output_dir.display()
        )
    })?;
    log::info!("breakdown.csv now has {rows} row(s)");
    Ok(())
}

use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tracing::error;
use tracing_subscriber::EnvFilter;

use toolfix::config;
use toolfix::ecosystem::{self, Ecosystem, EcosystemConfig};
use toolfix::fixer::registry::build_fixers;
use toolfix::fixer::runner::{RunOutcome, run_ecosystem};
use toolfix::version::cache::VersionCache;
use toolfix::version::normalize::resolve;
use toolfix::version::source::GithubSource;

#[derive(Parser)]
#[command(name = "toolfix")]
#[command(version, about = "Keeps pinned toolchain versions in build definition files up to date")]
struct Cli {
    /// Base directory that target file paths resolve against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Override the version cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the fixers registered for the given (or all) ecosystems
    List { ecosystem: Option<String> },
    /// Pin each named ecosystem's targets to its latest discovered version
    Run {
        /// Ecosystems to run (e.g. rust node ruby)
        ecosystems: Vec<String>,

        /// Run every builtin ecosystem
        #[arg(long)]
        all: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

fn select_configs(names: &[String]) -> anyhow::Result<Vec<EcosystemConfig>> {
    names
        .iter()
        .map(|name| {
            let id: Ecosystem = name
                .parse()
                .map_err(|_| anyhow!("unknown ecosystem: {name}"))?;
            ecosystem::find(id).ok_or_else(|| anyhow!("unknown ecosystem: {name}"))
        })
        .collect()
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cache_dir = cli.cache_dir.unwrap_or_else(config::cache_dir);
    let cache = VersionCache::new(cache_dir, config::CACHE_TTL_MS);
    let source = GithubSource::new();

    match cli.command {
        Command::List { ecosystem: name } => {
            let configs = match name {
                Some(name) => select_configs(&[name])?,
                None => ecosystem::builtin(),
            };
            for config in &configs {
                let versions = resolve(config, &source, &cache).await;
                for fixer in build_fixers(config, &cli.root, &versions) {
                    println!("{:<24} {}", fixer.name, fixer.description);
                }
            }
            Ok(())
        }
        Command::Run { ecosystems, all } => {
            let configs = if all {
                ecosystem::builtin()
            } else {
                select_configs(&ecosystems)?
            };
            if configs.is_empty() {
                bail!("no ecosystems selected; name at least one or pass --all");
            }

            // Fetches and runs fan out across ecosystems; each run touches a
            // disjoint set of target files
            let runs = configs
                .iter()
                .map(|config| run_ecosystem(config, &cli.root, &source, &cache));

            let mut fatal = false;
            for outcome in join_all(runs).await {
                match outcome {
                    Ok(summary) => {
                        let state = match summary.outcome {
                            RunOutcome::Updated => "updated",
                            RunOutcome::UpToDate => "up to date",
                            RunOutcome::Failed => "failed",
                        };
                        println!(
                            "{:<8} {:<10} {}",
                            summary.ecosystem.as_str(),
                            summary.version,
                            state
                        );
                    }
                    Err(e) => {
                        error!("{e:#}");
                        fatal = true;
                    }
                }
            }
            if fatal {
                bail!("at least one ecosystem failed fatally");
            }
            Ok(())
        }
    }
}

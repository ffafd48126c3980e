use anyhow::Result;
use clap::{Parser, Subcommand};
use review_site_tools::cta::CtaPatcherBuilder;
use review_site_tools::evidence::{Dataset, EvidenceGeneratorBuilder};
use review_site_tools::homepage::HomepageUpdaterBuilder;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Maintenance tooling for the AI website-builder review site.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Root of the Astro site; default paths are resolved under it
    #[arg(long, global = true, default_value = ".")]
    site_root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add the affiliate CTA component to comparison pages
    Ctas {
        /// [default: src/pages/comparisons]
        #[arg(long)]
        comparisons_dir: Option<PathBuf>,

        /// [default: backups/comparison-ctas]
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Import statement added to patched pages, e.g. with `../components/`
        /// for pages directly under `src/pages`
        #[arg(long)]
        import_line: Option<String>,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Rebuild the homepage tools array from review pages
    Homepage {
        /// [default: src/pages/reviews]
        #[arg(long)]
        reviews_dir: Option<PathBuf>,

        /// [default: src/pages/index.astro]
        #[arg(long)]
        homepage: Option<PathBuf>,

        /// [default: backups]
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate SVG evidence charts from a TOML dataset
    Evidence {
        /// Product dataset
        #[arg(long, default_value = "evidence.toml")]
        dataset: PathBuf,

        /// [default: public/images/evidence]
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("review_site_tools=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let root = cli.site_root.as_path();

    match cli.command {
        Command::Ctas {
            comparisons_dir,
            backup_dir,
            import_line,
            dry_run,
        } => {
            let mut builder = CtaPatcherBuilder::default();
            builder
                .comparisons_dir(resolve(root, comparisons_dir, "src/pages/comparisons"))
                .backup_dir(resolve(root, backup_dir, "backups/comparison-ctas"))
                .dry_run(dry_run);
            if let Some(import_line) = import_line {
                builder.import_line(import_line);
            }
            let patcher = builder.build()?;

            let report = patcher.run()?;
            print!("{report}");
            anyhow::ensure!(
                report.errors() == 0,
                "{} comparison pages failed",
                report.errors()
            );
        }
        Command::Homepage {
            reviews_dir,
            homepage,
            backup_dir,
            dry_run,
        } => {
            let updater = HomepageUpdaterBuilder::default()
                .reviews_dir(resolve(root, reviews_dir, "src/pages/reviews"))
                .homepage(resolve(root, homepage, "src/pages/index.astro"))
                .backup_dir(resolve(root, backup_dir, "backups"))
                .dry_run(dry_run)
                .build()?;

            let report = updater.run()?;
            print!("{report}");
        }
        Command::Evidence {
            dataset,
            output_dir,
        } => {
            let generator = EvidenceGeneratorBuilder::default()
                .dataset(Dataset::load(&root.join(dataset))?)
                .output_dir(resolve(root, output_dir, "public/images/evidence"))
                .build()?;

            let written = generator.generate().await?;
            println!("Generated {} evidence images", written.len());
        }
    }

    Ok(())
}

/// Explicit paths are taken relative to the site root too; absolute ones win.
fn resolve(root: &Path, explicit: Option<PathBuf>, default: &str) -> PathBuf {
    root.join(explicit.unwrap_or_else(|| PathBuf::from(default)))
}

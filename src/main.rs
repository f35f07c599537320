use std::path::PathBuf;

use anyhow::Context;
use brand_tokens::{build_brand_dictionaries, BuildConfig};
use clap::Parser;

mod logging;

/// Builds per-brand design token stylesheets from `configs/<brand>/*.json`.
#[derive(Debug, Parser)]
#[command(name = "brand-tokens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Builds per-brand design token stylesheets")]
struct Cli {
    /// TOML brand list; the built-in brands are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding `configs/` and receiving `lib/`
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Build only these brands (repeatable)
    #[arg(short, long = "brand")]
    brands: Vec<String>,

    /// Log every file as it is read and written
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => BuildConfig::load(path)
            .with_context(|| format!("Invalid brand configuration {}", path.display()))?,
        None => BuildConfig::default(),
    };
    if let Some(root) = cli.root {
        config.root = root;
    }
    let config = config.only(&cli.brands)?;

    build_brand_dictionaries(&config).await?;
    Ok(())
}

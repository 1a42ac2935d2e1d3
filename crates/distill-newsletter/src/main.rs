use anyhow::{Context, Result};
use clap::Parser;
use shared::{Config, Distiller, Refinement};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "distill-newsletter")]
#[command(about = "Distill an HTML email newsletter into a short list of news items")]
struct Args {
    /// HTML file to distill (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Directory for the digest audit trail (overrides DIGEST_DIR)
    #[arg(long)]
    digest_dir: Option<PathBuf>,

    /// Save the digest to the default data directory
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if args.digest_dir.is_some() {
        config.digest_dir = args.digest_dir;
    } else if args.save {
        config.digest_dir = Some(shared::default_digest_dir()?);
    }

    let html = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read HTML from stdin")?;
            buffer
        }
    };

    let distiller = match Distiller::new(config) {
        Ok(distiller) => distiller,
        Err(e) => anyhow::bail!("{}: {}", e.code(), e),
    };

    eprintln!("📰 Distilling newsletter...");
    eprintln!("  (This may take a minute...)");

    let result = match distiller.distill(&html).await {
        Ok(result) => result,
        Err(e) => anyhow::bail!("{}: {}", e.code(), e),
    };

    if result.items.is_empty() {
        eprintln!("No news content found in this newsletter.");
    } else {
        eprintln!(
            "✓ Distilled {} items from {} groups",
            result.items.len(),
            result.groups_total
        );
    }
    if result.groups_failed > 0 {
        eprintln!(
            "⚠ {} of {} groups failed and were skipped",
            result.groups_failed, result.groups_total
        );
    }
    if result.refinement == Refinement::PassThrough {
        eprintln!("⚠ Refinement failed; returning unmerged group summaries");
    }

    // The item list itself is the program's output; everything above goes to
    // stderr so stdout stays pipeable.
    println!("{}", serde_json::to_string_pretty(&result.items)?);

    Ok(())
}

//! Render the static frame image into the public directory.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coin_toss_frame::{frame::STATIC_IMAGE, render};

#[derive(Parser, Debug)]
#[command(
    name = "generate-frame-image",
    about = "Render the static coin toss frame image",
    version
)]
struct Args {
    /// Output file (defaults to <PUBLIC_DIR>/coin-toss-frame.png)
    output: Option<PathBuf>,

    /// Static files directory
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,
}

impl Args {
    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.public_dir.join(STATIC_IMAGE.trim_start_matches('/')))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let output = Args::parse().output_path();

    let png = render::static_frame_card()
        .render()
        .context("failed to render frame image")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, &png)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!("Frame image generated: {} ({} bytes)", output.display(), png.len());
    Ok(())
}

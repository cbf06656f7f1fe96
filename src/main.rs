use anyhow::Context;
use clap::Parser;
use elemshot::{BoxRenderer, CaptureConfig, Rgba, Session, Viewport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Capture an element of an HTML page as a PNG download.
#[derive(Parser, Debug)]
#[command(name = "elemshot", version, about)]
struct Args {
    /// HTML file containing the element to capture
    input: PathBuf,

    /// JSON configuration file; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Selector of the element to capture
    #[arg(long)]
    selector: Option<String>,

    /// Selector of the download control
    #[arg(long)]
    trigger: Option<String>,

    /// Where to write the PNG (defaults to the configured filename)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the forced-download data URL instead of writing a file
    #[arg(long)]
    data_url: bool,

    /// Device pixel ratio
    #[arg(long)]
    scale: Option<u32>,

    /// Containing block width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Containing block height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Surface background color (`none` for transparent)
    #[arg(long)]
    background: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<CaptureConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
            CaptureConfig::from_json(&json)?
        }
        None => CaptureConfig::default(),
    };

    if let Some(s) = &args.selector {
        config.source_selector = s.clone();
    }
    if let Some(t) = &args.trigger {
        config.trigger_selector = t.clone();
    }
    if let Some(scale) = args.scale {
        config.scale = scale;
    }
    config.viewport = Viewport {
        width: args.width.unwrap_or(config.viewport.width),
        height: args.height.unwrap_or(config.viewport.height),
    };
    if let Some(bg) = &args.background {
        config.background = if bg.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(Rgba::parse(bg).with_context(|| format!("unrecognized background color `{}`", bg))?)
        };
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let html = std::fs::read_to_string(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let mut session = Session::load(&html, config, Arc::new(BoxRenderer))?;
    session.settle().await?;
    let download = session.click_download()?;

    if args.data_url {
        println!("{}", download.href);
        return Ok(());
    }

    let output = args.output.clone().unwrap_or_else(|| PathBuf::from(&download.filename));
    let png = download.payload()?;
    std::fs::write(&output, &png).with_context(|| format!("writing {}", output.display()))?;
    log::info!("wrote {} ({} bytes)", output.display(), png.len());
    Ok(())
}

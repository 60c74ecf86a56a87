//! snapclean - remove people from a photo through the SnapClean API

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use snapclean_models::ImagePayload;
use snapclean_session::{HttpBackend, SessionState, Workflow};
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::TerminalObserver;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Photo to clean.
    image: PathBuf,
    /// Base URL of the SnapClean API.
    #[arg(long, env = "SNAPCLEAN_API_URL", default_value = "http://localhost:8000")]
    api: String,
    /// Keep this detected person in the photo (repeatable).
    #[arg(long = "keep", value_name = "ID")]
    keep: Vec<String>,
    /// Output path for the cleaned image (default: cleaned_<name> next to the input).
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Request timeout in seconds.
    #[arg(long, default_value_t = 180)]
    timeout_s: u64,
    /// Stop after listing the detected people.
    #[arg(long)]
    detect_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let media_type = media_type_for(&args.image)
        .ok_or_else(|| anyhow!("{} is not a supported image type", args.image.display()))?;
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    let file_name = args
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    let backend = HttpBackend::new(&args.api, Duration::from_secs(args.timeout_s))?;
    let mut workflow = Workflow::with_observer(backend, TerminalObserver::new());

    workflow
        .upload(ImagePayload::from_bytes(&bytes, media_type), file_name)
        .await
        .context("detection failed")?;

    if workflow.state().detections().is_empty() {
        eprintln!("Nothing to remove.");
        return Ok(());
    }
    if args.detect_only {
        return Ok(());
    }

    for id in &args.keep {
        workflow.set_selected(id, false)?;
    }
    if workflow.state().selected_count() == 0 {
        bail!("every detected person is kept; nothing to remove");
    }

    workflow.remove_selected().await.context("removal failed")?;

    let state = workflow.state();
    let result = state
        .result_image()
        .ok_or_else(|| anyhow!("session finished without a result image"))?;

    if result.is_remote() {
        println!("{}", result.as_str());
        return Ok(());
    }

    let output = match args.output {
        Some(path) => path,
        None => default_output(&args.image, state)?,
    };
    write_result(result, &output)?;
    println!("{}", output.display());

    Ok(())
}

/// Media type for an image file, from its extension.
fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// `cleaned_<name>` next to the input image.
fn default_output(input: &Path, state: &SessionState) -> Result<PathBuf> {
    let name = state
        .download_name()
        .ok_or_else(|| anyhow!("no result to save"))?;
    Ok(input.with_file_name(name))
}

fn write_result(image: &ImagePayload, output: &Path) -> Result<()> {
    let bytes = image.decode_bytes()?;
    std::fs::write(output, bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

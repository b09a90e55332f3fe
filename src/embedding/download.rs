// Model download helper for the ONNX sentence embedders.
//
// Each model lives in its own subdirectory of the model root
// (~/.local/share/examsim/models/<model>/ on Linux) holding `model.onnx`
// and `tokenizer.json`, so several models can sit side by side.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::model::EmbeddingModel;

/// Path of the ONNX graph inside each model repo.
const REMOTE_MODEL_FILE: &str = "onnx/model.onnx";
const REMOTE_TOKENIZER_FILE: &str = "tokenizer.json";

/// Local file names inside a model directory.
pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/examsim/models/ on Linux.
pub fn default_model_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("examsim")
        .join("models")
}

/// Subdirectory of `root` holding one model's files.
pub fn model_dir(root: &Path, model: EmbeddingModel) -> PathBuf {
    root.join(model.dir_name())
}

/// Check whether both files for `model` exist under `root`.
pub fn model_files_present(root: &Path, model: EmbeddingModel) -> bool {
    let dir = model_dir(root, model);
    dir.join(MODEL_FILE).exists() && dir.join(TOKENIZER_FILE).exists()
}

/// Download the tokenizer and ONNX graph for `model` into `root`.
///
/// Shows a progress bar for the model file. Skips files that already exist.
/// Creates directories as needed.
pub async fn download_model(root: &Path, model: EmbeddingModel) -> Result<()> {
    let dir = model_dir(root, model);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\nSentence embedding model ({}):", model.dir_name());

    let tokenizer_path = dir.join(TOKENIZER_FILE);
    if tokenizer_path.exists() {
        info!(model = model.id(), "Tokenizer already exists, skipping");
        println!("  {} (already exists)", TOKENIZER_FILE);
    } else {
        println!("  Downloading {}...", TOKENIZER_FILE);
        download_file(
            &format!("{}/{}", model.hf_url(), REMOTE_TOKENIZER_FILE),
            &tokenizer_path,
            false,
        )
        .await?;
    }

    let model_path = dir.join(MODEL_FILE);
    if model_path.exists() {
        info!(model = model.id(), "Model already exists, skipping");
        println!("  {} (already exists)", MODEL_FILE);
    } else {
        println!("  Downloading {}...", MODEL_FILE);
        download_file(
            &format!("{}/{}", model.hf_url(), REMOTE_MODEL_FILE),
            &model_path,
            true,
        )
        .await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        let pb = match response.content_length() {
            Some(size) => {
                let pb = ProgressBar::new(size);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                        .context("Invalid progress bar template")?
                        .progress_chars("=> "),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("    {spinner} {bytes}")
                        .context("Invalid progress spinner template")?,
                );
                pb
            }
        };
        Some(pb)
    } else {
        None
    };

    // Renamed into place only once the body is complete.
    let partial = dest.with_extension("part");
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        body.extend_from_slice(&chunk);
        if let Some(ref pb) = pb {
            pb.set_position(body.len() as u64);
        }
    }

    std::fs::write(&partial, &body)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

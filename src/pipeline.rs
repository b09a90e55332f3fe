// End-to-end pipeline: question files -> cleaned papers -> vectors -> pairs.
//
// Each stage can run on its own (the `clean`, `vectorize` and `compare`
// commands read and write the JSON artifacts) or all of them back to back
// through `Pipeline::run`, which vectorizes both papers concurrently.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::cleaning::{CleaningOptions, PaperCleaner};
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, VectorAggregator};
use crate::models::{ComparisonResult, Paper, QuestionRecord, VectorizedPaper};
use crate::report::Reporter;
use crate::similarity::{self, FusionConfig};

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Serialize `value` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Paper id for an input file: the file name, unless overridden.
pub fn paper_id_for(path: &Path, override_id: Option<&str>) -> String {
    if let Some(id) = override_id {
        return id.to_string();
    }
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A question file handed to [`Pipeline::run`], with an optional paper id
/// to use instead of the file name.
#[derive(Debug, Clone, Copy)]
pub struct PaperInput<'a> {
    pub path: &'a Path,
    pub paper_id: Option<&'a str>,
}

impl<'a> PaperInput<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self {
            path,
            paper_id: None,
        }
    }

    pub fn with_paper_id(mut self, paper_id: Option<&'a str>) -> Self {
        self.paper_id = paper_id;
        self
    }
}

/// Where a full run keeps its intermediate files.
///
/// A temporary directory is removed when the run ends, whether it
/// succeeded or not.
enum ArtifactDir {
    Temp(TempDir),
    Kept(PathBuf),
}

impl ArtifactDir {
    fn open(requested: Option<&Path>) -> Result<Self> {
        match requested {
            Some(dir) => {
                fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create artifact directory {}", dir.display())
                })?;
                Ok(Self::Kept(dir.to_path_buf()))
            }
            None => {
                let dir = tempfile::Builder::new()
                    .prefix("examsim-")
                    .tempdir()
                    .context("Failed to create temporary artifact directory")?;
                Ok(Self::Temp(dir))
            }
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Temp(dir) => dir.path(),
            Self::Kept(dir) => dir,
        }
    }
}

/// The configured clean -> vectorize -> compare chain.
pub struct Pipeline {
    cleaner: PaperCleaner,
    fusion: FusionConfig,
}

impl Pipeline {
    /// Build a pipeline, rejecting invalid settings before any work is done.
    pub fn new(options: CleaningOptions, fusion: FusionConfig) -> Result<Self> {
        fusion.validate()?;
        Ok(Self {
            cleaner: PaperCleaner::new(options)?,
            fusion,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(config.cleaning_options(), config.fusion_config())
    }

    pub fn fusion(&self) -> &FusionConfig {
        &self.fusion
    }

    /// Read a question file and clean it into a paper.
    pub fn clean_file(
        &self,
        input: &Path,
        paper_id: Option<&str>,
        reporter: &dyn Reporter,
    ) -> Result<Paper> {
        let records: Vec<QuestionRecord> = read_json(input)?;
        let paper_id = paper_id_for(input, paper_id);
        let paper = self
            .cleaner
            .clean_paper(&paper_id, &records, reporter)
            .with_context(|| format!("Failed to clean {}", input.display()))?;
        Ok(paper)
    }

    /// Attach vectors to every question of `paper`.
    pub async fn vectorize(
        &self,
        paper: Paper,
        provider: &dyn EmbeddingProvider,
        reporter: &dyn Reporter,
    ) -> VectorizedPaper {
        VectorAggregator::new(provider, self.cleaner.extractor())
            .vectorize_paper(paper, reporter)
            .await
    }

    /// Compare two vectorized papers with this pipeline's fusion settings.
    pub fn compare(
        &self,
        paper_a: &VectorizedPaper,
        paper_b: &VectorizedPaper,
        reporter: &dyn Reporter,
    ) -> Result<ComparisonResult> {
        if paper_a.model != paper_b.model {
            tracing::warn!(
                model_a = %paper_a.model,
                model_b = %paper_b.model,
                "Comparing papers vectorized with different models"
            );
        }
        Ok(similarity::compare(paper_a, paper_b, &self.fusion, reporter)?)
    }

    /// Run every stage on two question files.
    ///
    /// Intermediate artifacts go to `artifacts` when given, otherwise to a
    /// temporary directory that is gone once this returns.
    pub async fn run(
        &self,
        input_a: PaperInput<'_>,
        input_b: PaperInput<'_>,
        provider: &dyn EmbeddingProvider,
        artifacts: Option<&Path>,
        reporter: &dyn Reporter,
    ) -> Result<ComparisonResult> {
        let dir = ArtifactDir::open(artifacts)?;
        info!(artifacts = %dir.path().display(), "Starting comparison run");

        let paper_a = self.clean_file(input_a.path, input_a.paper_id, reporter)?;
        let paper_b = self.clean_file(input_b.path, input_b.paper_id, reporter)?;
        write_json(&dir.path().join("a.cleaned.json"), &paper_a)?;
        write_json(&dir.path().join("b.cleaned.json"), &paper_b)?;

        let (vec_a, vec_b) = tokio::join!(
            self.vectorize(paper_a, provider, reporter),
            self.vectorize(paper_b, provider, reporter)
        );
        write_json(&dir.path().join("a.vectorized.json"), &vec_a)?;
        write_json(&dir.path().join("b.vectorized.json"), &vec_b)?;

        let result = self.compare(&vec_a, &vec_b, reporter)?;
        write_json(&dir.path().join("comparison.json"), &result)?;

        Ok(result)
    }
}

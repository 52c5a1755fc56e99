//! The templates step: render every template file of a directory
//!
//! Each `name.ext.tmpl` file under the source directory is rendered and
//! written to the output directory as `name.ext`, keeping its relative path.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::template::{Diagnostic, Document, Engine};

/// Errors that can occur while running the templates step
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to list {}: {source}", path.display())]
    Discover {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where templates come from and where rendered files go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateJob {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Template extension, without the dot
    pub extension: String,
    /// Descend into subdirectories
    pub recursive: bool,
}

impl TemplateJob {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            extension: "tmpl".to_string(),
            recursive: false,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// Outcome for one rendered template
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Path relative to the source directory, used as the diagnostic label
    pub relative: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Original template text, kept for source-annotated reports
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Template files under `job.source_dir`, relative to it and sorted
///
/// The output directory is never searched.
pub fn discover(job: &TemplateJob) -> Result<Vec<PathBuf>, PipelineError> {
    let mut found = Vec::new();
    walk(job, &job.source_dir, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(job: &TemplateJob, dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), PipelineError> {
    let discover_err = |source| PipelineError::Discover {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(discover_err)? {
        let entry = entry.map_err(discover_err)?;
        // file_type does not follow symlinks
        let file_type = entry.file_type().map_err(discover_err)?;
        let path = entry.path();
        if file_type.is_dir() {
            if job.recursive && path != job.output_dir {
                walk(job, &path, found)?;
            }
            continue;
        }
        if file_type.is_symlink() && path.is_dir() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some(job.extension.as_str()) {
            if let Ok(relative) = path.strip_prefix(&job.source_dir) {
                found.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}

/// Output location for a template: the template extension is dropped
pub fn output_path(job: &TemplateJob, relative: &Path) -> PathBuf {
    job.output_dir.join(relative.with_extension(""))
}

/// Render every template of the job with `engine`
///
/// Diagnostics never stop the run; they are returned per file.
pub fn run(engine: &Engine, job: &TemplateJob) -> Result<Vec<FileReport>, PipelineError> {
    discover(job)?
        .into_iter()
        .map(|relative| render_file(engine, job, relative))
        .collect()
}

fn render_file(
    engine: &Engine,
    job: &TemplateJob,
    relative: PathBuf,
) -> Result<FileReport, PipelineError> {
    let input = job.source_dir.join(&relative);
    let output = output_path(job, &relative);

    let source = fs::read_to_string(&input).map_err(|source| PipelineError::Read {
        path: input.clone(),
        source,
    })?;

    let label = path_label(&relative);
    let rendered = engine.apply(&Document::new(&source, &label));

    let write_err = |source| PipelineError::Write {
        path: output.clone(),
        source,
    };
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(&output, &rendered.text).map_err(write_err)?;

    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        diagnostics = rendered.diagnostics.len(),
        "rendered template"
    );

    Ok(FileReport {
        relative,
        input,
        output,
        source,
        diagnostics: rendered.diagnostics,
    })
}

/// Forward-slash label for a relative path
fn path_label(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

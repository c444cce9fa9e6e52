//! One run of the generator: validate, lay out, render, write.

use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use crate::cli::Args;
use crate::config::{load_layout_config, SheetGeometry};
use crate::error::{stage_of, LabelError};
use crate::labels::LabelRequest;
use crate::layout::SheetLayout;
use crate::manifest::manifest_bytes;
use crate::output::stage_file;
use crate::pdf::{create_output_pdf, load_template, to_pdf_bytes, Background, StandardFont};

/// Fully resolved settings for a run.
#[derive(Debug, Clone)]
pub struct LabelJob {
    pub request: LabelRequest,
    pub output: PathBuf,
    /// `None` prints on blank pages
    pub template: Option<PathBuf>,
    pub geometry: SheetGeometry,
    pub font: StandardFont,
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub output: PathBuf,
    pub first_identifier: String,
    pub last_identifier: String,
    pub label_count: usize,
    pub sheet_count: usize,
}

impl LabelJob {
    /// Blank-page job with the default geometry and font.
    pub fn new(request: LabelRequest, output: impl Into<PathBuf>) -> Self {
        Self {
            request,
            output: output.into(),
            template: None,
            geometry: SheetGeometry::default(),
            font: StandardFont::default(),
            manifest: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    pub fn from_args(args: &Args) -> Result<Self, LabelError> {
        let request = LabelRequest {
            base_url: args.base_url.clone(),
            prefix: args.prefix.clone(),
            start: args.start,
            count: args.count,
        };
        request.validate()?;

        let geometry = match &args.layout {
            Some(path) => load_layout_config(path)?,
            None => SheetGeometry::default(),
        };

        Ok(Self {
            request,
            output: args.output.clone(),
            template: (!args.no_template).then(|| args.template.clone()),
            geometry,
            font: StandardFont::parse(&args.font)?,
            manifest: args.manifest.clone(),
        })
    }
}

/// Errors without a stage of their own happened while assembling the PDF
fn as_rendering_error(err: anyhow::Error) -> anyhow::Error {
    if stage_of(&err).is_some() {
        err
    } else {
        LabelError::PdfAssembly(format!("{:#}", err)).into()
    }
}

/// Generate the labels and write the output file(s).
///
/// Nothing is written unless every label rendered, and the PDF only appears
/// once the manifest (if any) has been written as well.
pub fn run_job(job: &LabelJob) -> Result<JobSummary> {
    job.geometry.validate()?;
    let entries = job.request.entries()?;
    let label_count = entries.len();
    let first_identifier = job.request.first_identifier()?;
    let last_identifier = job.request.last_identifier()?;

    info!(
        "Generating {} labels starting from {}",
        label_count, first_identifier
    );

    let background = match &job.template {
        Some(path) => {
            info!("Loading template {:?}", path);
            Background::Template(load_template(path)?)
        }
        None => Background::Blank,
    };

    let sheets = SheetLayout::new(job.geometry.clone()).paginate(entries);
    info!("Laid out {} sheets", sheets.len());

    let doc = create_output_pdf(&sheets, &job.geometry, job.font, background)
        .map_err(as_rendering_error)
        .with_context(|| "Failed to render labels")?;
    let pdf_bytes = to_pdf_bytes(doc).map_err(as_rendering_error)?;
    let manifest = match &job.manifest {
        Some(path) => Some((path, manifest_bytes(&sheets).map_err(as_rendering_error)?)),
        None => None,
    };

    // Both files are on disk before either becomes visible
    let staged_pdf = stage_file(&job.output, &pdf_bytes)?;
    let staged_manifest = match &manifest {
        Some((path, bytes)) => Some(stage_file(path, bytes)?),
        None => None,
    };

    staged_pdf.commit()?;
    info!("Wrote {} bytes to {:?}", pdf_bytes.len(), job.output);
    if let Some(staged) = staged_manifest {
        let path = staged.path().to_path_buf();
        staged.commit()?;
        info!("Wrote manifest to {:?}", path);
    }

    Ok(JobSummary {
        output: job.output.clone(),
        first_identifier,
        last_identifier,
        label_count,
        sheet_count: sheets.len(),
    })
}

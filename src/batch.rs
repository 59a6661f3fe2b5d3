use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use rayon::prelude::*;
use tracing::{info, info_span, warn};

use crate::{
    config::ProcessConfig,
    error::{PixelizeError, Result},
    palette::Palette,
    pipeline::Pipeline,
    utils::image::{read_image, write_image},
};

pub const DEFAULT_OUTPUT_DIR: &str = "output_images";

/// A file the batch could not process.
#[derive(Debug)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: PixelizeError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output paths, in input file name order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.written.len() + self.failures.len()
    }
}

/// Files directly inside `dir`, sorted by name.
///
/// Symlinks are followed. Entries that cannot be inspected come back as
/// failures instead of failing the listing; sub-directories are skipped.
pub fn list_inputs(dir: &Path) -> Result<(Vec<PathBuf>, Vec<BatchFailure>)> {
    let mut files = Vec::new();
    let mut failures = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(error) => {
                failures.push(BatchFailure {
                    input: dir.to_path_buf(),
                    error: error.into(),
                });
                continue;
            }
        };
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => {}
            Err(error) => failures.push(BatchFailure {
                input: path,
                error: error.into(),
            }),
        }
    }
    files.sort();
    failures.sort_by(|a, b| a.input.cmp(&b.input));
    Ok((files, failures))
}

/// Run the pipeline over one file and write the result under `output_dir`
/// with the same file name.
pub fn process_file(
    input: &Path,
    output_dir: &Path,
    config: &ProcessConfig,
    palette: Arc<Palette>,
) -> Result<PathBuf> {
    let file_name = input.file_name().ok_or_else(|| {
        PixelizeError::invalid_argument(format!("{} has no file name", input.display()))
    })?;
    let output = output_dir.join(file_name);

    let grid = read_image(input)?;
    let result = Pipeline::new(config, palette)?.run(grid)?;
    write_image(&result, &output)?;
    Ok(output)
}

/// Pixelize every file of `input_dir` into `output_dir`.
///
/// Files are processed in parallel. A failing file is recorded in the report
/// and never stops the others, and so is a directory entry that cannot be
/// inspected. Only an unreadable input directory or an uncreatable output
/// directory fails the whole batch.
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    config: &ProcessConfig,
    palette: Arc<Palette>,
) -> Result<BatchReport> {
    let _span = info_span!("batch", input = %input_dir.display()).entered();

    let (inputs, unreadable) = list_inputs(input_dir)?;
    fs::create_dir_all(output_dir)?;
    info!(files = inputs.len(), output = %output_dir.display(), "starting batch");

    let results: Vec<(PathBuf, Result<PathBuf>)> = inputs
        .into_par_iter()
        .map(|input| {
            let result = process_file(&input, output_dir, config, palette.clone());
            (input, result)
        })
        .collect();

    let mut report = BatchReport::default();
    for failure in unreadable {
        warn!(input = %failure.input.display(), error = %failure.error, "skipping entry");
        report.failures.push(failure);
    }
    for (input, result) in results {
        match result {
            Ok(output) => {
                info!(input = %input.display(), output = %output.display(), "pixelized");
                report.written.push(output);
            }
            Err(error) => {
                warn!(input = %input.display(), %error, "skipping file");
                report.failures.push(BatchFailure { input, error });
            }
        }
    }

    info!(
        written = report.written.len(),
        failed = report.failures.len(),
        "batch done"
    );
    Ok(report)
}

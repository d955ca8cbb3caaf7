//! JSON job files for masking a detector image stored on disk.
//!
//! ```json
//! {
//!   "image": "frames/sample_0001.tif",
//!   "geometry": "calib/ni.poni",
//!   "userMask": "calib/beamstop.png",
//!   "unit": "q_A^-1",
//!   "params": { "alpha": 3.0, "max_iterations": 5 },
//!   "output": { "mask": "out/sample_0001_mask.png", "reportJson": "out/report.json" }
//! }
//! ```
//!
//! `params` takes the [`AutoMaskParams`] field names (snake_case) and any
//! omitted field keeps its default.
use crate::binning::Binner;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::MaskReport;
use crate::error::{MaskError, Result};
use crate::geometry::{load_poni, ScatteringUnit};
use crate::image::io::{load_intensity_image, load_mask_image, save_mask_png, write_json_file};
use crate::masking::AutoMaskParams;
use crate::pipeline::run_pipeline;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskJobOutput {
    /// Mask PNG, 255 = masked.
    pub mask: PathBuf,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskJobConfig {
    pub image: PathBuf,
    /// `.poni` calibration file.
    pub geometry: PathBuf,
    #[serde(default)]
    pub user_mask: Option<PathBuf>,
    /// Overrides the binning quantity, Q in 1/Å otherwise.
    #[serde(default)]
    pub unit: Option<ScatteringUnit>,
    #[serde(default)]
    pub params: AutoMaskParams,
    pub output: MaskJobOutput,
}

pub fn load_config(path: &Path) -> Result<MaskJobConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| MaskError::Io(format!("Failed to read config {}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| MaskError::Config(format!("Failed to parse config {}: {e}", path.display())))
}

/// Mask the configured image and write the outputs.
pub fn run_job(config: &MaskJobConfig) -> Result<MaskReport> {
    config.params.validate()?;
    let image = load_intensity_image(&config.image)?;
    let mut geometry = load_poni(&config.geometry)?;
    if let Some(unit) = config.unit {
        geometry = geometry.with_unit(unit);
    }
    let user_mask = config
        .user_mask
        .as_deref()
        .map(load_mask_image)
        .transpose()?;
    debug!(
        "run_job image={} geometry={} user_mask={}",
        config.image.display(),
        config.geometry.display(),
        user_mask.is_some()
    );

    let start = Instant::now();
    let binner = Binner::build(&geometry, image.shape(), &config.params.binner_options())?;
    let binning_ms = elapsed_ms(start);
    let report = run_pipeline(
        &image,
        &binner,
        user_mask.as_ref(),
        &config.params,
        binning_ms,
    )?;

    save_mask_png(&report.mask, &config.output.mask)?;
    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)?;
    }
    debug!(
        "run_job wrote {} masked={}",
        config.output.mask.display(),
        report.summary.masked_pixels
    );
    Ok(report)
}

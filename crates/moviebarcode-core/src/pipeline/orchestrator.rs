use std::sync::Arc;

use tracing::info;

use crate::compose::{compose_barcode, output_format, write_barcode};
use crate::error::Result;
use crate::frame::SourceInfo;
use crate::io::source::{open_source, FrameSource};
use crate::profile::{ProfileReport, Profiler};
use crate::sampler::{ColumnSampler, SampledColumns};

use super::config::BarcodeConfig;
use super::types::{NoOpReporter, PipelineStage, ProgressReporter};

/// What a finished run produced, for reporting.
#[derive(Clone, Debug)]
pub struct BarcodeSummary {
    pub source: SourceInfo,
    pub columns: SampledColumns,
    pub profile: ProfileReport,
}

/// Open `config.input`, build the barcode and write it to `config.output`.
///
/// The output format is checked before any decoding starts. Nothing is
/// written unless every stage succeeded.
pub fn run_barcode_reported(
    config: &BarcodeConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BarcodeSummary> {
    config.validate()?;
    output_format(&config.output)?;

    let source = open_source(&config.input)?;
    let info = source.info();
    info!(
        file = %info.filename.display(),
        width = info.width,
        height = info.height,
        declared_frames = ?info.declared_frames,
        backend = info.backend,
        "Opened video"
    );

    run_barcode_with_source(source.as_ref(), config, reporter.as_ref())
}

/// Run the pipeline over an already opened source. `config.input` is ignored.
pub fn run_barcode_with_source(
    source: &dyn FrameSource,
    config: &BarcodeConfig,
    reporter: &dyn ProgressReporter,
) -> Result<BarcodeSummary> {
    config.validate()?;
    output_format(&config.output)?;

    let mut profiler = Profiler::new();

    let mut sampler = ColumnSampler::new(source, config.sampler_settings());
    let columns = sampler.run(&mut profiler, reporter)?;
    info!(
        columns = columns.colors.len(),
        frames = columns.frame_count,
        stride = columns.stride,
        "Sampling complete"
    );

    reporter.begin_stage(PipelineStage::Composing, None);
    let image = compose_barcode(&columns.colors, config.output_width, config.output_height)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Writing, None);
    profiler.measure("write_barcode", || write_barcode(&image, &config.output))?;
    reporter.finish_stage();
    info!(path = %config.output.display(), "Barcode saved");

    Ok(BarcodeSummary {
        source: source.info().clone(),
        columns,
        profile: profiler.finish(),
    })
}

/// Run the full pipeline without progress reporting.
pub fn run_barcode(config: &BarcodeConfig) -> Result<BarcodeSummary> {
    run_barcode_reported(config, Arc::new(NoOpReporter))
}

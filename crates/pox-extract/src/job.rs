//! Run a configured extraction job end to end.

use std::path::PathBuf;

use pox_core::Result;

use crate::config::{ExtractorConfig, OutputFormat};
use crate::pipeline::{Extractor, RunSummary};
use crate::selector::selector_for;
use crate::sink::{ColumnarOptions, ColumnarSink, DelimitedSink, TabularSink};
use crate::source::JsonLinesSource;

/// Result of [`run_job`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobReport {
    /// Where the output was written.
    pub output: PathBuf,
    /// Output discipline.
    pub format: OutputFormat,
    /// Run counters.
    pub summary: RunSummary,
}

/// Validate `config`, open inputs and output, process events, close the output.
///
/// Inputs are opened before the output so a missing input never truncates an
/// existing output file.
pub fn run_job(config: &ExtractorConfig) -> Result<JobReport> {
    config.validate()?;
    let source = JsonLinesSource::open(config.inputs.iter().cloned())?;
    let output = config.output_path();

    let sink: Box<dyn TabularSink> = match config.output.format {
        OutputFormat::Columnar => {
            let options = ColumnarOptions {
                input_collection: config.input_collection.clone(),
                row_group_size: config.output.row_group_size,
            };
            Box::new(ColumnarSink::create(&output, config.object, &options)?)
        }
        OutputFormat::Delimited => {
            Box::new(DelimitedSink::create(&output, config.output.max_slots)?)
        }
    };

    tracing::info!(
        collection = %config.input_collection,
        object = %config.object,
        inputs = config.inputs.len(),
        "starting extraction"
    );

    let mut extractor =
        Extractor::new(config.input_collection.clone(), selector_for(config.object), sink);
    let limit = config.max_events.unwrap_or(usize::MAX);
    extractor.process_all(source.take(limit))?;
    let summary = extractor.finish()?;

    Ok(JobReport { output, format: config.output.format, summary })
}

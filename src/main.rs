use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use care_dash::error::util::safe_read_to_string;
use care_dash::utils::logging::init_logging;
use care_dash::{
    DashboardConfig, DashboardPipeline, FilterSelection, emit_outcome, load_dataset, run_selections,
};

fn run_once(pipeline: &DashboardPipeline, config: &DashboardConfig) -> Result<()> {
    let selection = match &config.selection_path {
        Some(path) => {
            let text = safe_read_to_string(path, "reading filter selection")?;
            FilterSelection::from_json(&text, pipeline.options())
                .with_context(|| format!("Invalid filter selection in {}", path.display()))?
        }
        None => pipeline.default_selection(),
    };

    let outcome = pipeline.evaluate(&selection)?;
    emit_outcome(&mut io::stdout().lock(), pipeline, &selection, &outcome, config.output_format)
        .context("Failed to write report")?;
    Ok(())
}

fn run_interactive(pipeline: &DashboardPipeline, config: &DashboardConfig) -> Result<()> {
    info!("Reading one JSON filter selection per line from stdin");
    let evaluated = run_selections(
        pipeline,
        io::stdin().lock(),
        &mut io::stdout().lock(),
        config.output_format,
    )
    .context("Interactive session failed")?;
    info!("Evaluated {evaluated} selections");
    Ok(())
}

fn main() -> Result<()> {
    init_logging();

    let mut config = DashboardConfig::from_env().context("Invalid configuration")?;
    if let Some(path) = std::env::args_os().nth(1) {
        config = config.with_dataset_path(path);
    }

    let dataset = load_dataset(&config)
        .with_context(|| format!("Failed to load dataset {}", config.dataset_path.display()))?;
    let pipeline = DashboardPipeline::new(Arc::new(dataset))?;
    info!("Serving {} patient records", pipeline.dataset().num_rows());

    if config.interactive {
        run_interactive(&pipeline, &config)
    } else {
        run_once(&pipeline, &config)
    }
}

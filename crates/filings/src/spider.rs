use filings_spider::facts::ExtractionProfile;
use filings_spider::{pipeline, Config, Stage};
use tracing::info;

/// Run one stage over the given entities (or every entity it finds input for).
pub(crate) async fn stage(
    config: &Config,
    stage: Stage,
    entities: Option<Vec<String>>,
    profile: ExtractionProfile,
    tui: bool,
) -> anyhow::Result<()> {
    let time = std::time::Instant::now();

    let summary = pipeline::run_stage(config, stage, entities, profile, tui).await?;

    info!(
        "{stage} finished: {summary}, time elapsed: {:?}",
        time.elapsed()
    );
    Ok(())
}

/// Run every stage in order.
pub(crate) async fn run(
    config: &Config,
    profile: ExtractionProfile,
    tui: bool,
) -> anyhow::Result<()> {
    let time = std::time::Instant::now();

    for (stage, summary) in pipeline::run(config, profile, tui).await? {
        info!("{stage}: {summary}");
    }

    info!("pipeline finished, time elapsed: {:?}", time.elapsed());
    Ok(())
}

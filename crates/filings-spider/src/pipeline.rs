use crate::config::Config;
use crate::facts::{self, ExtractionProfile};
use crate::filings::{convert, fetch, listings};
use crate::summary::Summary;
use std::fmt;
use tracing::{error, info, warn};

/// The pipeline stages, in the order a full run executes them. Each stage reads the previous
/// stage's output directory and writes its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Symbols file to `<listings>/<entity>.json`.
    Listings,
    /// Record collection to `<data>/<entity>/XBRL/`.
    Fetch,
    /// `XBRL/` to `XLSX/` through the remote converter.
    Convert,
    /// `XLSX/` to `CSV/<entity>.csv`.
    Extract,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Listings => "listings",
            Stage::Fetch => "fetch",
            Stage::Convert => "convert",
            Stage::Extract => "extract",
        };
        f.write_str(name)
    }
}

impl Stage {
    /// Entities the stage has input for.
    pub async fn entities(self, config: &Config) -> anyhow::Result<Vec<String>> {
        match self {
            Stage::Listings => match &config.symbols_file {
                Some(path) => listings::read_symbols(path).await,
                None => Err(anyhow::anyhow!(
                    "no symbols file configured (set FILINGS_SYMBOLS or pass --symbols)"
                )),
            },
            Stage::Fetch => config.listed_entities().await,
            Stage::Convert => config.entities_with_documents().await,
            Stage::Extract => config.entities_with_spreadsheets().await,
        }
    }
}

/// Run `stage` over `entities`, or over every entity it has input for.
///
/// Entities are processed one after another. An entity that fails outright (missing input
/// directory, unreadable record collection, ...) is logged and counted as one failure; the next
/// entity is still processed.
pub async fn run_stage(
    config: &Config,
    stage: Stage,
    entities: Option<Vec<String>>,
    profile: ExtractionProfile,
    tui: bool,
) -> anyhow::Result<Summary> {
    let time = std::time::Instant::now();
    let entities = match entities {
        Some(entities) => entities.iter().map(|e| e.to_uppercase()).collect(),
        None => stage.entities(config).await.map_err(|err| {
            error!("failed to discover entities for {stage}, error({err})");
            err
        })?,
    };

    if tui {
        println!(
            "{bar}\n{name:^40}\n{bar}",
            bar = "=".repeat(40),
            name = format!("{stage} ({} entities)", entities.len())
        );
    }
    if entities.is_empty() {
        warn!("no entities to {stage}");
        return Ok(Summary::default());
    }

    // built on the first listings request and shared by the rest; the other stages build their
    // own per entity
    let mut listings_client: Option<crate::http::HttpClient> = None;

    let mut total = Summary::default();
    for (i, entity) in entities.iter().enumerate() {
        info!("[{}/{}] {stage} {entity} ...", i + 1, entities.len());

        let result = match stage {
            Stage::Listings => {
                let http_client = match listings_client.take() {
                    Some(http_client) => http_client,
                    None => crate::std_client_build(config, config.fetch_timeout)?,
                };
                let result = listings::scrape(config, &http_client, entity, tui).await;
                listings_client = Some(http_client);
                result
            }
            Stage::Fetch => fetch::scrape(config, entity, tui).await,
            Stage::Convert => convert::scrape(config, entity, tui).await,
            Stage::Extract => facts::scrape(config, entity, profile, tui).await,
        };

        match result {
            Ok(summary) => total += summary,
            Err(err) => {
                error!("{stage} failed for {entity}, error({err})");
                total.failed += 1;
            }
        }

        if stage == Stage::Listings && i + 1 < entities.len() {
            tokio::time::sleep(config.listings_delay).await;
        }
    }

    info!("{stage} finished, {}", crate::time_elapsed(time));
    total.report(&stage.to_string(), "all entities", tui);

    Ok(total)
}

/// Every stage in order: listings (only when a symbols file is configured), fetch, convert and
/// extract, each over the entities it finds input for.
pub async fn run(
    config: &Config,
    profile: ExtractionProfile,
    tui: bool,
) -> anyhow::Result<Vec<(Stage, Summary)>> {
    let mut stages = vec![Stage::Fetch, Stage::Convert, Stage::Extract];
    if config.symbols_file.is_some() {
        stages.insert(0, Stage::Listings);
    }

    let mut summaries = vec![];
    for stage in stages {
        let summary = run_stage(config, stage, None, profile, tui).await?;
        summaries.push((stage, summary));
    }
    Ok(summaries)
}

use super::records::FilingRecord;
use crate::config::Config;
use crate::error::SpiderError;
use crate::summary::Summary;
use crate::tui::StageProgress;
use tracing::{debug, error, info, trace, warn};

// scrape
// -------------------------------------------------------------------------------------------------
/// Download every fetchable document in the record collection of `entity` into its `XBRL/`
/// directory. Documents already on disk are skipped; a failed download is logged and the rest are
/// still attempted.
pub async fn scrape(config: &Config, entity: &str, tui: bool) -> anyhow::Result<Summary> {
    let time = std::time::Instant::now();
    let paths = config.entity(entity);

    if !paths.listing.is_file() {
        error!(
            "no record collection for {}: {}",
            paths.name,
            paths.listing.display()
        );
        return Err(SpiderError::Missing(paths.listing).into());
    }

    let records: Vec<FilingRecord> = crate::fs::read_json(&paths.listing)
        .await
        .map_err(|err| {
            error!(
                "failed to read record collection {}, error({err})",
                paths.listing.display()
            );
            SpiderError::InvalidListing {
                entity: paths.name.clone(),
                reason: err.to_string(),
            }
        })?;
    if records.is_empty() {
        warn!("no records in the collection for {}", paths.name);
        return Ok(Summary::default());
    }

    let total = records.len();
    let records: Vec<FilingRecord> = records.into_iter().filter(FilingRecord::is_fetchable).collect();
    debug!(
        "{} of {total} records for {} have no document",
        total - records.len(),
        paths.name
    );

    tokio::fs::create_dir_all(&paths.documents).await?;
    let http_client = crate::std_client_build(config, config.fetch_timeout)?;
    let mut progress = StageProgress::new(records.len(), "fetch", tui)?;

    info!(
        "fetching {} documents for {} into {} ...",
        records.len(),
        paths.name,
        paths.documents.display()
    );
    for record in &records {
        let name = record.stored_name();
        let path = paths.documents.join(&name);

        if path.exists() {
            trace!("{name} already exists; skipping");
            progress.skipped();
            continue;
        }

        match crate::fs::download_file(&http_client, &record.document_url, &path, &config.referer)
            .await
        {
            Ok(len) => {
                debug!("downloaded {name} ({len} bytes) for {}", paths.name);
                progress.succeeded();
            }
            Err(err) => {
                error!(
                    "failed to download {name} for {} from {}, error({err})",
                    paths.name, record.document_url
                );
                progress.failed();
            }
        }

        tokio::time::sleep(config.fetch_delay).await;
    }

    let summary = progress.finish();
    debug!("documents fetched for {}, {}", paths.name, crate::time_elapsed(time));
    summary.report("fetch", &paths.name, tui);

    Ok(summary)
}

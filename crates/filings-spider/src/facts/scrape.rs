use super::dataset::{EntityDataset, ExtractedRecord, Insertion};
use super::date::normalize_filing_date;
use super::profile::ExtractionProfile;
use crate::config::{list_spreadsheets, Config};
use crate::error::SpiderError;
use crate::summary::Summary;
use crate::tui::StageProgress;
use tracing::{debug, error, info, warn};

// scrape
// -------------------------------------------------------------------------------------------------
/// Extract the profile's facts from every spreadsheet of `entity` and write its dataset.
///
/// A spreadsheet that cannot be read, or that holds neither fact, counts as a failure and the
/// rest are still processed. Only a missing spreadsheet directory (or an unwritable dataset) is an
/// error for the entity.
pub async fn scrape(
    config: &Config,
    entity: &str,
    profile: ExtractionProfile,
    tui: bool,
) -> anyhow::Result<Summary> {
    let time = std::time::Instant::now();
    let paths = config.entity(entity);

    if !paths.spreadsheets.is_dir() {
        error!(
            "no spreadsheet directory for {}: {}",
            paths.name,
            paths.spreadsheets.display()
        );
        return Err(SpiderError::Missing(paths.spreadsheets).into());
    }

    let files = list_spreadsheets(&paths.spreadsheets).await.map_err(|err| {
        error!("failed to list spreadsheets for {}, error({err})", paths.name);
        err
    })?;
    if files.is_empty() {
        warn!("no spreadsheets to extract for {}", paths.name);
        return Ok(Summary::default());
    }

    info!(
        "extracting {profile} facts from {} spreadsheets for {} ...",
        files.len(),
        paths.name
    );
    let extractor = profile.extractor();
    let mut dataset = EntityDataset::new(extractor.share_count);
    let mut progress = StageProgress::new(files.len(), "extract", tui)?;

    for file in &files {
        let filing_date = normalize_filing_date(file);
        let extraction = match extractor.extract_file(&paths.spreadsheets.join(file)) {
            Ok(extraction) => extraction,
            Err(err) => {
                error!("failed to read {file} for {}, error({err})", paths.name);
                progress.failed();
                continue;
            }
        };

        if extraction.is_empty() {
            warn!("no data in {file} for {}", paths.name);
            progress.failed();
            continue;
        }

        debug!(
            "{file}: {}={}, {}={}",
            extractor.primary.name,
            extraction.primary,
            extractor.secondary.name,
            extraction.secondary
        );
        let record = ExtractedRecord::new(
            filing_date,
            extraction.primary,
            extraction.secondary,
            extractor.share_count,
        );
        match dataset.insert(record) {
            Insertion::Inserted | Insertion::Completed => progress.succeeded(),
            Insertion::Dropped => progress.skipped(),
        }
    }

    let summary = progress.finish();

    dataset
        .write_csv(
            &paths.dataset,
            &extractor.primary.name,
            &extractor.secondary.name,
        )
        .await
        .map_err(|err| {
            error!(
                "failed to write dataset {} for {}, error({err})",
                paths.dataset.display(),
                paths.name
            );
            err
        })?;

    info!(
        "{} records written to {} for {}, {}",
        dataset.len(),
        paths.dataset.display(),
        paths.name,
        crate::time_elapsed(time)
    );
    summary.report("extract", &paths.name, tui);

    Ok(summary)
}

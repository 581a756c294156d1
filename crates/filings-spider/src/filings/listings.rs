use crate::config::Config;
use crate::error::SpiderError;
use crate::http::*;
use crate::summary::Summary;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error, info, trace, warn};

/// Symbols listed in `path`, one per line; blank lines are ignored. Upper-cased, sorted and
/// deduplicated.
pub async fn read_symbols(path: &Path) -> anyhow::Result<Vec<String>> {
    trace!("reading symbols from {}", path.display());
    let contents = tokio::fs::read_to_string(path).await.map_err(|err| {
        error!("failed to read symbols file {}, error({err})", path.display());
        err
    })?;

    let mut symbols: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_uppercase)
        .collect();
    symbols.sort();
    symbols.dedup();
    Ok(symbols)
}

// scrape
// -------------------------------------------------------------------------------------------------
/// Fetch the quarterly results of `entity` from the exchange and store them as its record
/// collection. The collection is written as returned, every field kept.
pub async fn scrape(
    config: &Config,
    http_client: &HttpClient,
    entity: &str,
    tui: bool,
) -> anyhow::Result<Summary> {
    let paths = config.entity(entity);

    let records = fetch_listing(config, http_client, &paths.name)
        .await
        .map_err(|err| {
            error!("failed to fetch results for {}, error({err})", paths.name);
            err
        })?;

    let mut summary = Summary::default();
    if records.is_empty() {
        warn!("no results listed for {}", paths.name);
        summary.skipped += 1;
    } else {
        crate::fs::write_json(&paths.listing, &records).await?;
        info!(
            "{} results for {} written to {}",
            records.len(),
            paths.name,
            paths.listing.display()
        );
        summary.succeeded += 1;
    }
    summary.report("listings", &paths.name, tui);

    Ok(summary)
}

/// GET the quarterly results of `symbol`; the array of records, either bare or under `data`.
pub async fn fetch_listing(
    config: &Config,
    http_client: &HttpClient,
    symbol: &str,
) -> anyhow::Result<Vec<Value>> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(REFERER, HeaderValue::from_str(&config.referer)?);

    trace!("fetching {} results for {symbol}", config.listings_url);
    let body: Value = http_client
        .get(&config.listings_url)
        .query(&[
            ("index", "equities"),
            ("symbol", symbol),
            ("period", "Quarterly"),
        ])
        .headers(headers)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let records = listing_records(symbol, body)?;
    debug!("{} results listed for {symbol}", records.len());
    Ok(records)
}

/// The records of a listings response: a JSON array, or an object holding one under `data`
/// (`null` there means no records).
pub fn listing_records(entity: &str, body: Value) -> Result<Vec<Value>, SpiderError> {
    let invalid = |reason: &str| SpiderError::InvalidListing {
        entity: entity.to_string(),
        reason: reason.to_string(),
    };

    match body {
        Value::Array(records) => Ok(records),
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            Some(Value::Null) => Ok(vec![]),
            Some(_) => Err(invalid("\"data\" is not an array")),
            None => Err(invalid("no \"data\" field")),
        },
        _ => Err(invalid("expected an array or an object")),
    }
}

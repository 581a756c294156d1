use super::records::spreadsheet_name;
use crate::config::Config;
use crate::error::SpiderError;
use crate::fs::list_files;
use crate::http::*;
use crate::summary::Summary;
use crate::tui::StageProgress;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_DISPOSITION, CONTENT_TYPE,
};
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tracing::{debug, error, info, trace, warn};

// bodies at least this large starting with the zip signature are taken as workbooks
const MIN_SPREADSHEET_LEN: usize = 10_000;

lazy_static! {
    static ref VIEWSTATE: Regex = hidden_field("__VIEWSTATE");
    static ref VIEWSTATE_GENERATOR: Regex = hidden_field("__VIEWSTATEGENERATOR");
    static ref EVENT_VALIDATION: Regex = hidden_field("__EVENTVALIDATION");
}

fn hidden_field(name: &str) -> Regex {
    Regex::new(&format!(r#"(?s)name="{name}".*?value="([^"]*)""#))
        .expect("valid hidden field pattern")
}

// scrape
// -------------------------------------------------------------------------------------------------
/// Convert every document in the `XBRL/` directory of `entity` into a spreadsheet in its `XLSX/`
/// directory. Spreadsheets already on disk are skipped; a rejected or failed conversion is logged
/// and the rest are still attempted.
pub async fn scrape(config: &Config, entity: &str, tui: bool) -> anyhow::Result<Summary> {
    let time = std::time::Instant::now();
    let paths = config.entity(entity);

    if !paths.documents.is_dir() {
        error!(
            "no document directory for {}: {}",
            paths.name,
            paths.documents.display()
        );
        return Err(SpiderError::Missing(paths.documents).into());
    }

    let documents = list_files(&paths.documents, "xml").await?;
    if documents.is_empty() {
        warn!("no documents to convert for {}", paths.name);
        return Ok(Summary::default());
    }

    tokio::fs::create_dir_all(&paths.spreadsheets).await?;
    let converter = Converter::new(config)?;
    let mut progress = StageProgress::new(documents.len(), "convert", tui)?;

    info!(
        "converting {} documents for {} into {} ...",
        documents.len(),
        paths.name,
        paths.spreadsheets.display()
    );
    for document in &documents {
        let name = spreadsheet_name(document);
        let path = paths.spreadsheets.join(&name);

        if path.exists() {
            trace!("{name} already exists; skipping");
            progress.skipped();
            continue;
        }

        let result = match converter.convert(&paths.documents.join(document)).await {
            Ok(bytes) => tokio::fs::write(&path, &bytes)
                .await
                .map(|_| bytes.len())
                .map_err(anyhow::Error::from),
            Err(err) => Err(err),
        };
        match result {
            Ok(len) => {
                debug!("converted {document} to {name} ({len} bytes) for {}", paths.name);
                progress.succeeded();
            }
            Err(err) => {
                error!("failed to convert {document} for {}, error({err})", paths.name);
                progress.failed();
            }
        }

        tokio::time::sleep(config.convert_delay).await;
    }

    let summary = progress.finish();
    debug!("documents converted for {}, {}", paths.name, crate::time_elapsed(time));
    summary.report("convert", &paths.name, tui);

    Ok(summary)
}

// converter
// -------------------------------------------------------------------------------------------------
/// Client of the remote XBRL to Excel converter, an ASP.NET upload form.
pub struct Converter {
    http_client: HttpClient,
    url: String,
}

impl Converter {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            http_client: crate::std_client_build(config, config.convert_timeout)?,
            url: config.converter_url.clone(),
        })
    }

    /// Upload the document at `path` and return the spreadsheet bytes the converter answers with.
    ///
    /// The form page is loaded first for its hidden state fields; the client's cookie jar carries
    /// the session over to the upload.
    pub async fn convert(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("invalid document path {}", path.display()))?
            .to_string();

        trace!("loading converter form {}", self.url);
        let page = self
            .http_client
            .get(&self.url)
            .headers(form_headers())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let state = FormState::scrape(&page);

        let document = tokio::fs::read(path).await?;
        let part = Part::bytes(document)
            .file_name(file_name.clone())
            .mime_str("application/xml")?;
        let form = Form::new()
            .text("__EVENTTARGET", "Button1")
            .text("__EVENTARGUMENT", "")
            .text("__VIEWSTATE", state.viewstate)
            .text("__VIEWSTATEGENERATOR", state.viewstate_generator)
            .text("__EVENTVALIDATION", state.event_validation)
            .text("Button1", "Validate")
            .part("FileUploadControl", part);

        trace!("uploading {file_name}");
        let response = self
            .http_client
            .post(&self.url)
            .headers(form_headers())
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let status = response.status().as_u16();
        let content_type = header_str(response.headers(), CONTENT_TYPE);
        let disposition = header_str(response.headers(), CONTENT_DISPOSITION);
        let body = response.bytes().await?;

        if is_spreadsheet(&content_type, &disposition, &body) {
            Ok(body.to_vec())
        } else {
            Err(SpiderError::ConversionRejected {
                file: file_name,
                status,
                content_type,
                len: body.len(),
            }
            .into())
        }
    }
}

fn form_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Whether a converter response carries a workbook rather than the form page again.
pub fn is_spreadsheet(content_type: &str, disposition: &str, body: &[u8]) -> bool {
    let content_type = content_type.to_lowercase();
    content_type.contains("spreadsheetml")
        || content_type.contains("application/octet-stream")
        || content_type.contains("excel")
        || disposition.starts_with("attachment")
        || (body.len() > MIN_SPREADSHEET_LEN && body.starts_with(b"PK"))
}

/// Hidden ASP.NET fields the upload has to echo back; absent ones are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormState {
    pub viewstate: String,
    pub viewstate_generator: String,
    pub event_validation: String,
}

impl FormState {
    pub fn scrape(page: &str) -> Self {
        let field = |regex: &Regex| {
            regex
                .captures(page)
                .map(|caps| caps[1].to_string())
                .unwrap_or_default()
        };
        Self {
            viewstate: field(&VIEWSTATE),
            viewstate_generator: field(&VIEWSTATE_GENERATOR),
            event_validation: field(&EVENT_VALIDATION),
        }
    }
}

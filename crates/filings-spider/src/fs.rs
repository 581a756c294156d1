use crate::http::*;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use std::path::Path;
use tracing::{debug, trace};

/// GET request a file from `url` and write it to `path`, creating the parent directory as
/// necessary. Returns the number of bytes written.
///
/// Any non-2xx status is an error and nothing is written.
pub async fn download_file(
    http_client: &HttpClient,
    url: &str,
    path: &Path,
    referer: &str,
) -> anyhow::Result<usize> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/xml, text/xml, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(REFERER, HeaderValue::from_str(referer)?);

    trace!("fetching {url}");
    let body = http_client
        .get(url)
        .headers(headers)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    // ensure the directory exists
    trace!("checking directory path: {:?}", path);
    let dir_path = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("failed to get directory path"))?;
    tokio::fs::create_dir_all(dir_path).await?;

    tokio::fs::write(path, &body).await?;
    debug!("{url} downloaded to {} ({} bytes)", path.display(), body.len());

    Ok(body.len())
}

/// Reads a `.json` file from `path`.
pub async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    trace!("reading file path: {}", path.display());
    let file = tokio::fs::read(path).await?;
    trace!("file read; deserializing bytes ...");
    let data: T = serde_json::from_slice(&file)?;
    Ok(data)
}

/// Writes `data` to `path` as pretty-printed JSON, creating the parent directory as necessary.
pub async fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let bytes = serde_json::to_vec_pretty(data)?;
    tokio::fs::write(path, bytes).await?;
    trace!("json written to {}", path.display());
    Ok(())
}

/// Names of the regular files in `dir` ending in `.{extension}`, sorted.
pub async fn list_files(dir: &Path, extension: &str) -> anyhow::Result<Vec<String>> {
    let suffix = format!(".{extension}");
    let mut names = vec![];
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|err| anyhow::anyhow!("failed to read {}, error({err})", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(&suffix) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Names of the subdirectories of `dir`, sorted; an absent `dir` has none.
pub async fn list_dirs(dir: &Path) -> anyhow::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(vec![]);
    }

    let mut names = vec![];
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_round_trips_through_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/records.json");

        write_json(&path, &vec!["x", "y"]).await.unwrap();
        let back: Vec<String> = read_json(&path).await.unwrap();
        assert_eq!(back, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn lists_only_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.xml"), "").unwrap();
        std::fs::write(dir.path().join("a.xml"), "").unwrap();
        std::fs::write(dir.path().join("a.xlsx"), "").unwrap();
        std::fs::create_dir(dir.path().join("c.xml")).unwrap();

        assert_eq!(list_files(dir.path(), "xml").await.unwrap(), vec!["a.xml", "b.xml"]);
        assert_eq!(list_dirs(dir.path()).await.unwrap(), vec!["c.xml"]);
        assert!(list_dirs(&dir.path().join("missing")).await.unwrap().is_empty());
    }
}

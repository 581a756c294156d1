use crate::fs::{list_dirs, list_files};
use dotenv::var;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Converter host the filings were historically uploaded to.
pub const DEFAULT_CONVERTER_URL: &str = "http://ec2-3-221-41-38.compute-1.amazonaws.com/";

/// Exchange endpoint listing an entity's quarterly results, each with its XBRL document link.
pub const DEFAULT_LISTINGS_URL: &str = "https://www.nseindia.com/api/corporates-financial-results";

pub const DEFAULT_REFERER: &str = "https://www.nseindia.com/";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Everything a stage needs to know about where files live and how to reach the remote hosts.
///
/// Built once (normally from the environment, see [`Config::from_env`]) and passed by reference
/// into every stage; nothing is derived from the working directory.
#[derive(Clone, Debug)]
pub struct Config {
    /// Root of the per-entity `XBRL/`, `XLSX/` and `CSV/` directories.
    pub data_dir: PathBuf,
    /// Directory of `<entity>.json` record collections.
    pub listings_dir: PathBuf,
    /// Symbols file (one per line) read by the listings stage.
    pub symbols_file: Option<PathBuf>,
    pub listings_url: String,
    pub converter_url: String,
    pub referer: String,
    pub user_agent: String,
    pub listings_delay: Duration,
    pub fetch_delay: Duration,
    pub convert_delay: Duration,
    pub fetch_timeout: Duration,
    pub convert_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("DATA"),
            listings_dir: PathBuf::from("JSON"),
            symbols_file: None,
            listings_url: DEFAULT_LISTINGS_URL.to_string(),
            converter_url: DEFAULT_CONVERTER_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            listings_delay: Duration::from_millis(2000),
            fetch_delay: Duration::from_millis(1000),
            convert_delay: Duration::from_millis(2000),
            fetch_timeout: Duration::from_secs(30),
            convert_timeout: Duration::from_secs(120),
        }
    }
}

impl Config {
    /// Read the configuration from environment variables (and `.env`, if already loaded),
    /// falling back to [`Config::default`] for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let default = Self::default();
        Ok(Self {
            data_dir: var("FILINGS_DATA_DIR").map_or(default.data_dir, PathBuf::from),
            listings_dir: var("FILINGS_LISTINGS_DIR").map_or(default.listings_dir, PathBuf::from),
            symbols_file: var("FILINGS_SYMBOLS").ok().map(PathBuf::from),
            listings_url: var("LISTINGS_URL").unwrap_or(default.listings_url),
            converter_url: var("CONVERTER_URL").unwrap_or(default.converter_url),
            referer: var("EXCHANGE_REFERER").unwrap_or(default.referer),
            user_agent: var("USER_AGENT").unwrap_or(default.user_agent),
            listings_delay: millis_or("LISTINGS_DELAY_MS", default.listings_delay)?,
            fetch_delay: millis_or("FETCH_DELAY_MS", default.fetch_delay)?,
            convert_delay: millis_or("CONVERT_DELAY_MS", default.convert_delay)?,
            fetch_timeout: secs_or("FETCH_TIMEOUT_SECS", default.fetch_timeout)?,
            convert_timeout: secs_or("CONVERT_TIMEOUT_SECS", default.convert_timeout)?,
        })
    }

    /// Paths of a single entity's files.
    pub fn entity(&self, entity: &str) -> EntityPaths {
        let key = entity.to_lowercase();
        let root = self.data_dir.join(&key);
        EntityPaths {
            name: entity.to_uppercase(),
            listing: self.listings_dir.join(format!("{key}.json")),
            documents: root.join("XBRL"),
            spreadsheets: root.join("XLSX"),
            dataset: root.join("CSV").join(format!("{key}.csv")),
        }
    }

    /// Entities with a record collection in the listings directory; an absent directory lists
    /// none.
    pub async fn listed_entities(&self) -> anyhow::Result<Vec<String>> {
        if !self.listings_dir.is_dir() {
            warn!(
                "listings directory {} not found, no entities listed",
                self.listings_dir.display()
            );
            return Ok(vec![]);
        }
        let files = list_files(&self.listings_dir, "json").await?;
        Ok(sorted_upper(
            files.iter().filter_map(|f| f.strip_suffix(".json")),
        ))
    }

    /// Entities with an `XBRL/` directory under the data directory.
    pub async fn entities_with_documents(&self) -> anyhow::Result<Vec<String>> {
        let mut entities = vec![];
        for dir in list_dirs(&self.data_dir).await? {
            if self.data_dir.join(&dir).join("XBRL").is_dir() {
                entities.push(dir);
            }
        }
        Ok(sorted_upper(entities.iter().map(String::as_str)))
    }

    /// Entities whose `XLSX/` directory holds at least one spreadsheet.
    pub async fn entities_with_spreadsheets(&self) -> anyhow::Result<Vec<String>> {
        let mut entities = vec![];
        for dir in list_dirs(&self.data_dir).await? {
            let spreadsheets = self.data_dir.join(&dir).join("XLSX");
            if spreadsheets.is_dir() && !list_spreadsheets(&spreadsheets).await?.is_empty() {
                entities.push(dir);
            }
        }
        Ok(sorted_upper(entities.iter().map(String::as_str)))
    }
}

/// Where one entity's files live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityPaths {
    /// Upper-case display name.
    pub name: String,
    pub listing: PathBuf,
    pub documents: PathBuf,
    pub spreadsheets: PathBuf,
    pub dataset: PathBuf,
}

/// Spreadsheet file names in `dir`, without office lock files (`~$...`).
pub(crate) async fn list_spreadsheets(dir: &Path) -> anyhow::Result<Vec<String>> {
    Ok(list_files(dir, "xlsx")
        .await?
        .into_iter()
        .filter(|name| !name.starts_with("~$"))
        .collect())
}

fn sorted_upper<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = names.map(str::to_uppercase).collect();
    names.sort();
    names.dedup();
    names
}

fn millis_or(key: &str, default: Duration) -> anyhow::Result<Duration> {
    parse_var(key).map(|ms| ms.map_or(default, Duration::from_millis))
}

fn secs_or(key: &str, default: Duration) -> anyhow::Result<Duration> {
    parse_var(key).map(|secs| secs.map_or(default, Duration::from_secs))
}

fn parse_var(key: &str) -> anyhow::Result<Option<u64>> {
    match var(key) {
        Ok(value) => value.trim().parse::<u64>().map(Some).map_err(|err| {
            anyhow::anyhow!("invalid {key} format - must be a valid integer, error({err})")
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_paths_are_lower_case_under_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/data"),
            listings_dir: PathBuf::from("/json"),
            ..Config::default()
        };

        let paths = config.entity("Reliance");
        assert_eq!(paths.name, "RELIANCE");
        assert_eq!(paths.listing, PathBuf::from("/json/reliance.json"));
        assert_eq!(paths.documents, PathBuf::from("/data/reliance/XBRL"));
        assert_eq!(paths.spreadsheets, PathBuf::from("/data/reliance/XLSX"));
        assert_eq!(paths.dataset, PathBuf::from("/data/reliance/CSV/reliance.csv"));
    }

    #[tokio::test]
    async fn discovers_entities_per_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().join("DATA"),
            listings_dir: dir.path().join("JSON"),
            ..Config::default()
        };

        std::fs::create_dir_all(&config.listings_dir).unwrap();
        std::fs::write(config.listings_dir.join("tcs.json"), "[]").unwrap();
        std::fs::write(config.listings_dir.join("infy.json"), "[]").unwrap();
        std::fs::write(config.listings_dir.join("notes.txt"), "").unwrap();

        std::fs::create_dir_all(config.data_dir.join("tcs/XBRL")).unwrap();
        std::fs::create_dir_all(config.data_dir.join("tcs/XLSX")).unwrap();
        std::fs::write(config.data_dir.join("tcs/XLSX/~$lock.xlsx"), "").unwrap();
        std::fs::create_dir_all(config.data_dir.join("infy/XLSX")).unwrap();
        std::fs::write(config.data_dir.join("infy/XLSX/a.xlsx"), "").unwrap();

        assert_eq!(config.listed_entities().await.unwrap(), vec!["INFY", "TCS"]);
        assert_eq!(config.entities_with_documents().await.unwrap(), vec!["TCS"]);
        assert_eq!(config.entities_with_spreadsheets().await.unwrap(), vec!["INFY"]);

        std::fs::remove_dir_all(&config.listings_dir).unwrap();
        assert!(config.listed_entities().await.unwrap().is_empty());
    }
}

use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};

/// One entry of an entity's record collection: where its XBRL document lives and when it was
/// filed (e.g. `03-Jun-2020 11:45`).
///
/// The exchange publishes many more fields per result; only these two are read. Either may be
/// `null` or absent, which reads as empty.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FilingRecord {
    #[serde(rename = "xbrl", default, deserialize_with = "de_trimmed")]
    pub document_url: String,
    #[serde(rename = "filingDate", default, deserialize_with = "de_trimmed")]
    pub filing_date: String,
}

fn de_trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()).unwrap_or_default())
}

impl FilingRecord {
    /// Whether the record points at an actual XML document; the exchange lists results without
    /// one as `.../xbrl/-` or a bare directory.
    pub fn is_fetchable(&self) -> bool {
        let url = &self.document_url;
        !url.is_empty()
            && !url.ends_with("xbrl/-")
            && !url.ends_with("xbrl/")
            && url.to_lowercase().contains(".xml")
    }

    /// File name the document is stored under: the cleaned filing date, `_`, and the base name of
    /// the URL path (with `.xml` appended if it has no such extension).
    ///
    /// `03-Jun-2020 11:45` and `.../INDAS_123.xml` give `03Jun2020_1145_INDAS_123.xml`.
    pub fn stored_name(&self) -> String {
        let mut name = url_basename(&self.document_url);
        if !name.ends_with(".xml") {
            name.push_str(".xml");
        }

        let date = self
            .filing_date
            .replace(':', "")
            .replace(' ', "_")
            .replace('-', "");
        if date.is_empty() {
            name
        } else {
            format!("{date}_{name}")
        }
    }
}

/// Name of the spreadsheet converted from the document `document_name`.
pub fn spreadsheet_name(document_name: &str) -> String {
    let stem = document_name
        .strip_suffix(".xml")
        .unwrap_or(document_name);
    format!("{stem}.xlsx")
}

fn url_basename(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(url) => url.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    path.rsplit('/').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, date: &str) -> FilingRecord {
        FilingRecord {
            document_url: url.to_string(),
            filing_date: date.to_string(),
        }
    }

    #[test]
    fn reads_exchange_fields_tolerating_nulls() {
        let records: Vec<FilingRecord> = serde_json::from_str(
            r#"[
                {"symbol": "TCS", "xbrl": " https://x.com/xbrl/a.xml ", "filingDate": "03-Jun-2020 11:45"},
                {"symbol": "TCS", "xbrl": null, "filingDate": "15-Mar-2020 09:30"},
                {"symbol": "TCS"}
            ]"#,
        )
        .unwrap();

        assert_eq!(records[0], record("https://x.com/xbrl/a.xml", "03-Jun-2020 11:45"));
        assert_eq!(records[1], record("", "15-Mar-2020 09:30"));
        assert_eq!(records[2], FilingRecord::default());
    }

    #[test]
    fn only_xml_documents_are_fetchable() {
        let date = "03-Jun-2020 11:45";
        assert!(record("https://x.com/xbrl/INDAS_1.xml", date).is_fetchable());
        assert!(record("https://x.com/xbrl/INDAS_1.XML", date).is_fetchable());
        assert!(!record("", date).is_fetchable());
        assert!(!record("https://x.com/xbrl/-", date).is_fetchable());
        assert!(!record("https://x.com/xbrl/", date).is_fetchable());
        assert!(!record("https://x.com/xbrl/report.pdf", date).is_fetchable());
    }

    #[test]
    fn stored_name_is_prefixed_with_cleaned_date() {
        assert_eq!(
            record("https://x.com/corporate/xbrl/INDAS_123.xml", "03-Jun-2020 11:45").stored_name(),
            "03Jun2020_1145_INDAS_123.xml"
        );
        assert_eq!(
            record("https://x.com/xbrl/INDAS_9.xml?v=2", "").stored_name(),
            "INDAS_9.xml"
        );
        assert_eq!(
            record("https://x.com/xbrl/file.xml.bak", "15-Mar-2020 09:30").stored_name(),
            "15Mar2020_0930_file.xml.bak.xml"
        );
    }

    #[test]
    fn spreadsheet_replaces_xml_extension() {
        assert_eq!(
            spreadsheet_name("03Jun2020_1145_INDAS_123.xml"),
            "03Jun2020_1145_INDAS_123.xlsx"
        );
        assert_eq!(spreadsheet_name("report"), "report.xlsx");
    }
}

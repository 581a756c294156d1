use super::date::sort_key;
use std::fmt;
use std::path::Path;
use tracing::{debug, trace};

/// Written in place of any unresolved value.
pub const MISSING: &str = "N/A";

/// Header of the derived count column.
pub const COUNT_COLUMN: &str = "NumberOfShares";

/// A scraped numeric fact, kept as the decimal string it was read as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fact {
    Value(String),
    Missing,
}

impl Fact {
    pub fn value(&self) -> Option<&str> {
        match self {
            Fact::Value(value) => Some(value),
            Fact::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Fact::Missing)
    }
}

impl From<Option<String>> for Fact {
    fn from(value: Option<String>) -> Self {
        value.map_or(Fact::Missing, Fact::Value)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or(MISSING))
    }
}

/// How the share count is derived from `primary / secondary`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareCount {
    /// Truncated quotient, sign kept.
    Signed,
    /// Truncated quotient, absolute value.
    Absolute,
}

impl ShareCount {
    /// `None` when either fact is missing or not a number, or when the divisor is zero.
    pub fn derive(self, primary: &Fact, secondary: &Fact) -> Option<i64> {
        let primary = primary.value()?.parse::<f64>().ok()?;
        let secondary = secondary.value()?.parse::<f64>().ok()?;
        if secondary == 0.0 {
            return None;
        }

        let quotient = primary / secondary;
        if !quotient.is_finite() {
            return None;
        }
        let quotient = match self {
            ShareCount::Signed => quotient,
            ShareCount::Absolute => quotient.abs(),
        };
        Some(quotient.trunc() as i64)
    }
}

/// One row of an entity's dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub filing_date: String,
    pub primary: Fact,
    pub secondary: Fact,
    pub count: Option<i64>,
}

impl ExtractedRecord {
    pub fn new(
        filing_date: impl Into<String>,
        primary: Fact,
        secondary: Fact,
        share_count: ShareCount,
    ) -> Self {
        let count = share_count.derive(&primary, &secondary);
        Self {
            filing_date: filing_date.into(),
            primary,
            secondary,
            count,
        }
    }

    /// Whether `self` resolves a field `existing` left missing.
    fn completes(&self, existing: &Self) -> bool {
        (existing.primary.is_missing() && !self.primary.is_missing())
            || (existing.secondary.is_missing() && !self.secondary.is_missing())
    }

    fn row(&self) -> [String; 4] {
        [
            self.filing_date.clone(),
            self.primary.to_string(),
            self.secondary.to_string(),
            self.count
                .map_or_else(|| MISSING.to_string(), |count| count.to_string()),
        ]
    }
}

/// What [`EntityDataset::insert`] did with a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// First record for its filing date.
    Inserted,
    /// Filled fields the existing record for its filing date was missing.
    Completed,
    /// Nothing new for its filing date; discarded.
    Dropped,
}

/// An entity's records, unique per filing date.
#[derive(Clone, Debug)]
pub struct EntityDataset {
    share_count: ShareCount,
    records: Vec<ExtractedRecord>,
}

impl EntityDataset {
    pub fn new(share_count: ShareCount) -> Self {
        Self {
            share_count,
            records: vec![],
        }
    }

    /// Add `record`, deduplicating on filing date.
    ///
    /// A record sharing its date with an existing one only matters if it resolves a field the
    /// existing record left missing: those fields are filled in, values already resolved are
    /// kept, and the count is derived again. Otherwise the record is dropped.
    pub fn insert(&mut self, record: ExtractedRecord) -> Insertion {
        let Some(index) = self
            .records
            .iter()
            .position(|existing| existing.filing_date == record.filing_date)
        else {
            trace!("inserted record for {}", record.filing_date);
            self.records.push(record);
            return Insertion::Inserted;
        };
        let existing = &mut self.records[index];

        if !record.completes(existing) {
            debug!(
                "duplicate filing date {} with nothing new; keeping existing record",
                record.filing_date
            );
            return Insertion::Dropped;
        }

        if existing.primary.is_missing() {
            existing.primary = record.primary;
        }
        if existing.secondary.is_missing() {
            existing.secondary = record.secondary;
        }
        existing.count = self
            .share_count
            .derive(&existing.primary, &existing.secondary);
        debug!(
            "completed record for {}: {}, {}",
            existing.filing_date, existing.primary, existing.secondary
        );
        Insertion::Completed
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records by filing date, most recent first; ties keep insertion order.
    pub fn sorted(&self) -> Vec<&ExtractedRecord> {
        let mut records: Vec<&ExtractedRecord> = self.records.iter().collect();
        records.sort_by(|a, b| sort_key(&b.filing_date).cmp(&sort_key(&a.filing_date)));
        records
    }

    /// Write the sorted records to `writer` as CSV, headed by
    /// `FilingDate,<primary>,<secondary>,NumberOfShares`.
    pub fn write_csv_to<W: std::io::Write>(
        &self,
        writer: W,
        primary: &str,
        secondary: &str,
    ) -> anyhow::Result<()> {
        let mut csv = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        csv.write_record(["FilingDate", primary, secondary, COUNT_COLUMN])?;
        for record in self.sorted() {
            csv.write_record(record.row())?;
        }
        csv.flush()?;
        Ok(())
    }

    /// [`EntityDataset::write_csv_to`] a file at `path`, creating its directory as necessary.
    pub async fn write_csv(
        &self,
        path: &Path,
        primary: &str,
        secondary: &str,
    ) -> anyhow::Result<()> {
        let mut bytes = vec![];
        self.write_csv_to(&mut bytes, primary, secondary)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(path, bytes).await?;
        debug!("{} records written to {}", self.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(v: &str) -> Fact {
        Fact::Value(v.to_string())
    }

    fn record(date: &str, primary: Fact, secondary: Fact) -> ExtractedRecord {
        ExtractedRecord::new(date, primary, secondary, ShareCount::Signed)
    }

    #[test]
    fn derives_share_count() {
        let signed = ShareCount::Signed;
        assert_eq!(signed.derive(&value("1000"), &value("10")), Some(100));
        assert_eq!(signed.derive(&value("1000"), &value("0")), None);
        assert_eq!(signed.derive(&Fact::Missing, &value("10")), None);
        assert_eq!(signed.derive(&value("1000"), &Fact::Missing), None);
        assert_eq!(signed.derive(&value("abc"), &value("10")), None);
        assert_eq!(signed.derive(&value("-1001"), &value("10")), Some(-100));
        assert_eq!(
            ShareCount::Absolute.derive(&value("-1001"), &value("10")),
            Some(100)
        );
    }

    #[test]
    fn completing_record_fills_only_missing_fields() {
        let mut dataset = EntityDataset::new(ShareCount::Signed);
        assert_eq!(
            dataset.insert(record("03Jun2020", value("100"), Fact::Missing)),
            Insertion::Inserted
        );
        assert_eq!(
            dataset.insert(record("03Jun2020", Fact::Missing, value("5"))),
            Insertion::Completed
        );

        let records = dataset.sorted();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].primary, value("100"));
        assert_eq!(records[0].secondary, value("5"));
        assert_eq!(records[0].count, Some(20));
    }

    #[test]
    fn completing_both_fields_keeps_existing_values() {
        let mut dataset = EntityDataset::new(ShareCount::Signed);
        dataset.insert(record("03Jun2020", value("100"), Fact::Missing));
        assert_eq!(
            dataset.insert(record("03Jun2020", value("200"), value("10"))),
            Insertion::Completed
        );

        let records = dataset.sorted();
        assert_eq!(records[0].primary, value("100"));
        assert_eq!(records[0].secondary, value("10"));
        assert_eq!(records[0].count, Some(10));
    }

    #[test]
    fn record_without_new_information_is_dropped() {
        let mut dataset = EntityDataset::new(ShareCount::Signed);
        dataset.insert(record("03Jun2020", value("100"), value("5")));
        assert_eq!(
            dataset.insert(record("03Jun2020", value("999"), Fact::Missing)),
            Insertion::Dropped
        );
        assert_eq!(
            dataset.insert(record("03Jun2020", Fact::Missing, Fact::Missing)),
            Insertion::Dropped
        );

        let records = dataset.sorted();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].primary, value("100"));
        assert_eq!(records[0].count, Some(20));
    }

    #[test]
    fn sorts_most_recent_first_with_bad_dates_last() {
        let mut dataset = EntityDataset::new(ShareCount::Signed);
        for date in ["garbage", "01Jan2021", "15Mar2020", "03Jun2020"] {
            dataset.insert(record(date, value("1"), value("1")));
        }

        let dates: Vec<&str> = dataset
            .sorted()
            .iter()
            .map(|r| r.filing_date.as_str())
            .collect();
        assert_eq!(dates, vec!["01Jan2021", "03Jun2020", "15Mar2020", "garbage"]);
    }

    #[test]
    fn writes_header_and_sentinels() {
        let mut dataset = EntityDataset::new(ShareCount::Signed);
        dataset.insert(record("15Mar2020", value("500"), Fact::Missing));
        dataset.insert(record("03Jun2020", value("-500"), value("10")));

        let mut out = vec![];
        dataset.write_csv_to(&mut out, "Primary", "Secondary").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "FilingDate,Primary,Secondary,NumberOfShares\n\
             03Jun2020,-500,10,-50\n\
             15Mar2020,500,N/A,N/A\n"
        );
    }
}

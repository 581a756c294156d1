use super::dataset::{Fact, ShareCount};
use super::workbook::{Cell, Sheet, Workbook};
use crate::error::SpiderError;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use tracing::trace;

/// Cells to the right of a label checked for its value.
pub const SCAN_WIDTH: usize = 4;

// rows searched for a fact table header
const HEADER_ROWS: usize = 10;

// Sr.No. | Element Name | Period | Unit | Decimals | Fact Value
const ELEMENT_COLUMN: usize = 1;
const FACT_VALUE_COLUMN: usize = 5;

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"^-?\d+\.?\d*$").expect("valid decimal pattern");
    static ref PARENTHESIZED: Regex =
        Regex::new(r"^\((\d+\.?\d*)\)$").expect("valid parenthesized pattern");
}

/// A fact to extract, known by one or more labels in priority order. The first label names the
/// output column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLabels {
    pub name: String,
    pub labels: Vec<String>,
}

impl FieldLabels {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            name: labels.first().copied().unwrap_or_default().to_string(),
            labels: labels.iter().map(|label| label.to_string()).collect(),
        }
    }

    /// The first label `text` contains.
    pub fn matches(&self, text: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|label| text.contains(label.as_str()))
            .map(String::as_str)
    }
}

/// Where labels and values sit in a spreadsheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// One fact per row on the instance sheet; element name and fact value in fixed columns.
    FactTable,
    /// Labels anywhere on any sheet, values within [`SCAN_WIDTH`] cells to their right.
    FreeScan,
    /// [`Layout::FactTable`] when the instance sheet looks like one and yields anything,
    /// [`Layout::FreeScan`] otherwise.
    Auto,
}

/// What one spreadsheet yielded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    pub primary: Fact,
    pub secondary: Fact,
}

impl Extraction {
    fn new(primary: Option<String>, secondary: Option<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Neither fact was found.
    pub fn is_empty(&self) -> bool {
        self.primary.is_missing() && self.secondary.is_missing()
    }
}

/// Locates two labeled facts in a spreadsheet.
#[derive(Clone, Debug)]
pub struct Extractor {
    pub primary: FieldLabels,
    pub secondary: FieldLabels,
    pub layout: Layout,
    pub share_count: ShareCount,
}

impl Extractor {
    /// Open the spreadsheet at `path` and extract from it.
    pub fn extract_file(&self, path: &Path) -> Result<Extraction, SpiderError> {
        let workbook = Workbook::open(path)?;
        Ok(self.extract(&workbook))
    }

    pub fn extract(&self, workbook: &Workbook) -> Extraction {
        match self.layout {
            Layout::FreeScan => self.free_scan(workbook),
            Layout::FactTable => match instance_sheet(workbook) {
                Some(sheet) => {
                    let columns = FactColumns::locate(sheet).unwrap_or_default();
                    self.fact_table(sheet, columns)
                }
                None => Extraction::new(None, None),
            },
            Layout::Auto => {
                let table = instance_sheet(workbook).and_then(|sheet| {
                    let columns = match FactColumns::locate(sheet) {
                        Some(columns) => columns,
                        None if is_instance_name(&sheet.name) => FactColumns::default(),
                        None => return None,
                    };
                    Some(self.fact_table(sheet, columns))
                });
                match table {
                    Some(extraction) if !extraction.is_empty() => extraction,
                    _ => {
                        trace!("no fact table results; scanning all sheets");
                        self.free_scan(workbook)
                    }
                }
            }
        }
    }

    fn fact_table(&self, sheet: &Sheet, columns: FactColumns) -> Extraction {
        trace!("scanning fact table on sheet \"{}\"", sheet.name);
        let (mut primary, mut secondary) = (None, None);

        for row in sheet.rows().skip(columns.first_row) {
            let element = match row.get(columns.element).and_then(Cell::as_text) {
                Some(element) => element,
                None => continue,
            };
            let value = match row.get(columns.value).and_then(numeric) {
                Some(value) => value,
                None => continue,
            };

            if primary.is_none() && self.primary.matches(element).is_some() {
                primary = Some(value.clone());
            }
            if secondary.is_none() && self.secondary.matches(element).is_some() {
                secondary = Some(value);
            }
            if primary.is_some() && secondary.is_some() {
                break;
            }
        }

        Extraction::new(primary, secondary)
    }

    fn free_scan(&self, workbook: &Workbook) -> Extraction {
        let (mut primary, mut secondary) = (None, None);

        'sheets: for sheet in &workbook.sheets {
            trace!("scanning sheet \"{}\"", sheet.name);
            for row in sheet.rows() {
                for (col, cell) in row.iter().enumerate() {
                    let text = match cell.as_text() {
                        Some(text) => text,
                        None => continue,
                    };

                    for (field, found) in [
                        (&self.primary, &mut primary),
                        (&self.secondary, &mut secondary),
                    ] {
                        if found.is_none() && field.matches(text).is_some() {
                            *found = adjacent_value(row, col);
                        }
                    }

                    if primary.is_some() && secondary.is_some() {
                        break 'sheets;
                    }
                }
            }
        }

        Extraction::new(primary, secondary)
    }
}

/// The first numeric cell among the [`SCAN_WIDTH`] cells right of `col`.
fn adjacent_value(row: &[Cell], col: usize) -> Option<String> {
    row.iter()
        .skip(col + 1)
        .take(SCAN_WIDTH)
        .find_map(numeric)
}

/// A cell's value as a decimal string, if it is a number.
pub fn numeric(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Number(number) => Some(number.to_string()),
        Cell::Text(text) => parse_numeric(text),
        Cell::Empty => None,
    }
}

/// Accept `1,234.5`, `-12` or `(500)`; the parenthesized form is negative.
pub fn parse_numeric(text: &str) -> Option<String> {
    let cleaned = text.trim().replace(',', "");
    if DECIMAL.is_match(&cleaned) {
        return Some(cleaned);
    }
    PARENTHESIZED
        .captures(&cleaned)
        .map(|caps| format!("-{}", &caps[1]))
}

fn is_instance_name(name: &str) -> bool {
    let name = name.to_lowercase();
    ["instance", "intance", "data"]
        .iter()
        .any(|hint| name.contains(hint))
}

/// The sheet holding the fact table: the first named like an instance/data sheet, else the
/// first sheet.
pub fn instance_sheet(workbook: &Workbook) -> Option<&Sheet> {
    workbook
        .sheets
        .iter()
        .find(|sheet| is_instance_name(&sheet.name))
        .or_else(|| workbook.sheets.first())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FactColumns {
    element: usize,
    value: usize,
    first_row: usize,
}

impl Default for FactColumns {
    fn default() -> Self {
        Self {
            element: ELEMENT_COLUMN,
            value: FACT_VALUE_COLUMN,
            first_row: 0,
        }
    }
}

impl FactColumns {
    /// Columns named by a header row with an "element" and a "fact value" cell.
    fn locate(sheet: &Sheet) -> Option<Self> {
        sheet
            .rows()
            .take(HEADER_ROWS)
            .enumerate()
            .find_map(|(index, row)| {
                let position = |needle: &str| {
                    row.iter().position(|cell| {
                        cell.as_text()
                            .is_some_and(|text| text.to_lowercase().contains(needle))
                    })
                };
                Some(Self {
                    element: position("element")?,
                    value: position("fact value")?,
                    first_row: index + 1,
                })
            })
    }
}

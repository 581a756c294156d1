use crate::error::SpiderError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{trace, warn};
use zip::ZipArchive;

static EMPTY: Cell = Cell::Empty;

// worksheet grid limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Content of one spreadsheet cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// A named 2-D grid of cells; rows and columns are 0-based.
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// The cell at (`row`, `col`); anything outside the grid is [`Cell::Empty`].
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// The sheets of an `.xlsx` workbook, in workbook order.
#[derive(Clone, Debug, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self, SpiderError> {
        trace!("opening workbook {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Read an Office Open XML workbook: the sheet list, its relationships, shared strings and
    /// every worksheet they point to.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, SpiderError> {
        let mut archive = ZipArchive::new(reader)?;

        let shared = match read_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => vec![],
        };

        let workbook = read_part(&mut archive, "xl/workbook.xml")?
            .ok_or_else(|| SpiderError::Spreadsheet("missing xl/workbook.xml".to_string()))?;
        let relationships = match read_part(&mut archive, "xl/_rels/workbook.xml.rels")? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };

        let mut sheets = vec![];
        for (index, (name, rel_id)) in parse_sheet_list(&workbook)?.into_iter().enumerate() {
            // without relationships, fall back to the conventional part names
            let part = match relationships.get(&rel_id) {
                Some(target) => resolve_target(target),
                None => format!("xl/worksheets/sheet{}.xml", index + 1),
            };
            match read_part(&mut archive, &part)? {
                Some(xml) => sheets.push(Sheet::new(name, parse_sheet(&xml, &shared)?)),
                None => warn!("worksheet \"{name}\" missing its part {part}"),
            }
        }

        if sheets.is_empty() {
            return Err(SpiderError::Spreadsheet("no worksheets found".to_string()));
        }

        Ok(Self { sheets })
    }
}

// parts
// ----------------------------------------------------------------------------

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, SpiderError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

// relationship targets are relative to `xl/` unless absolute within the package
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

fn attribute(e: &BytesStart, local_name: &[u8]) -> Result<Option<String>, SpiderError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local_name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

// (sheet name, relationship id), in workbook order
fn parse_sheet_list(xml: &str) -> Result<Vec<(String, String)>, SpiderError> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = vec![];
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attribute(&e, b"name")?.unwrap_or_default();
                let rel_id = attribute(&e, b"id")?.unwrap_or_default();
                sheets.push((name, rel_id));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, SpiderError> {
    let mut reader = Reader::from_str(xml);
    let mut relationships = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) =
                    (attribute(&e, b"Id")?, attribute(&e, b"Target")?)
                {
                    relationships.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(relationships)
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, SpiderError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = vec![];
    let mut current = String::new();
    let (mut in_text, mut in_phonetic) = (false, false);
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text && !in_phonetic => current.push_str(&t.unescape()?),
            Event::CData(t) if in_text && !in_phonetic => {
                current.push_str(&String::from_utf8_lossy(&t))
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

// a cell waiting for its closing tag
struct Pending {
    row: usize,
    col: usize,
    kind: Option<String>,
    raw: String,
}

fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<Cell>>, SpiderError> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Vec<Cell>> = vec![];
    let (mut row, mut next_row, mut next_col) = (0, 0, 0);
    let mut pending: Option<Pending> = None;
    let mut in_value = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_index(&e)?.unwrap_or(next_row);
                    next_col = 0;
                }
                b"c" => {
                    let (r, c) = cell_position(&e)?.unwrap_or((row, next_col));
                    pending = Some(Pending {
                        row: r,
                        col: c,
                        kind: attribute(&e, b"t")?,
                        raw: String::new(),
                    });
                }
                b"v" | b"t" => in_value = pending.is_some(),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_index(&e)?.unwrap_or(next_row);
                    next_row = row + 1;
                }
                b"c" => {
                    let (_, c) = cell_position(&e)?.unwrap_or((row, next_col));
                    next_col = c + 1;
                }
                _ => {}
            },
            Event::Text(t) if in_value => {
                if let Some(cell) = pending.as_mut() {
                    cell.raw.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        next_col = cell.col + 1;
                        let value = resolve(cell.kind.as_deref(), &cell.raw, shared);
                        place(&mut rows, cell.row, cell.col, value);
                    }
                }
                b"row" => next_row = row + 1,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

fn resolve(kind: Option<&str>, raw: &str, shared: &[String]) -> Cell {
    let text = match kind {
        Some("s") => match raw.trim().parse::<usize>().ok().and_then(|i| shared.get(i)) {
            Some(text) => text.clone(),
            None => return Cell::Empty,
        },
        Some("b") => match raw.trim() {
            "1" => "TRUE".to_string(),
            _ => "FALSE".to_string(),
        },
        Some("inlineStr") | Some("str") | Some("e") | Some("d") => raw.to_string(),
        _ => match raw.trim().parse::<f64>() {
            Ok(number) => return Cell::Number(number),
            Err(_) => raw.to_string(),
        },
    };

    if text.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(text)
    }
}

fn place(rows: &mut Vec<Vec<Cell>>, row: usize, col: usize, cell: Cell) {
    if cell.is_empty() {
        return;
    }
    if rows.len() <= row {
        rows.resize_with(row + 1, Vec::new);
    }
    let cells = &mut rows[row];
    if cells.len() <= col {
        cells.resize(col + 1, Cell::Empty);
    }
    cells[col] = cell;
}

fn row_index(e: &BytesStart) -> Result<Option<usize>, SpiderError> {
    match attribute(e, b"r")?.and_then(|r| r.trim().parse::<u64>().ok()) {
        Some(r) if r > MAX_ROWS as u64 => Err(SpiderError::Spreadsheet(format!(
            "row {r} is beyond the last row {MAX_ROWS}"
        ))),
        Some(r) => Ok((r as usize).checked_sub(1)),
        None => Ok(None),
    }
}

fn cell_position(e: &BytesStart) -> Result<Option<(usize, usize)>, SpiderError> {
    match attribute(e, b"r")? {
        Some(r) => parse_reference(&r),
        None => Ok(None),
    }
}

/// "B12" -> (11, 1); references outside the sheet grid are an error.
fn parse_reference(reference: &str) -> Result<Option<(usize, usize)>, SpiderError> {
    let Some(split) = reference.find(|c: char| c.is_ascii_digit()) else {
        return Ok(None);
    };
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(None);
    }

    let out_of_grid =
        || SpiderError::Spreadsheet(format!("cell reference {reference} is outside the sheet"));

    let mut col = 0usize;
    for c in letters.chars() {
        col = col
            .checked_mul(26)
            .and_then(|acc| acc.checked_add(c.to_ascii_uppercase() as usize - 'A' as usize + 1))
            .filter(|&col| col <= MAX_COLUMNS)
            .ok_or_else(out_of_grid)?;
    }

    let row = match digits.parse::<u64>() {
        Ok(row) if row > MAX_ROWS as u64 => return Err(out_of_grid()),
        Ok(row) => row as usize,
        Err(_) if digits.bytes().all(|b| b.is_ascii_digit()) => return Err(out_of_grid()),
        Err(_) => return Ok(None),
    };

    Ok(row.checked_sub(1).zip(col.checked_sub(1)))
}

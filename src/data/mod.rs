//! CSV ingestion for the video-game sales table.
//!
//! Accepts both the raw export (`;`-separated, `NA_Sales`, `Platform Company`,
//! ...) and the cleaned variant with short column names. Rows without a usable
//! year are dropped; every other defect is repaired and reported.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::dataset::{Dataset, Sales, SalesRecord, MISSING};
use crate::demo;
use crate::dimension::{Dimension, Region};
use crate::error::DataError;
use crate::logging::{self, obj, v_str, Domain};

const MAX_WARNINGS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// Pick `;` or `,` from the header line.
    Auto,
    Byte(u8),
}

impl Delimiter {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "auto" => Delimiter::Auto,
            ";" | "semicolon" => Delimiter::Byte(b';'),
            "," | "comma" => Delimiter::Byte(b','),
            "\\t" | "tab" => Delimiter::Byte(b'\t'),
            other => other
                .bytes()
                .next()
                .map(Delimiter::Byte)
                .unwrap_or(Delimiter::Auto),
        }
    }

    fn resolve(self, content: &[u8]) -> u8 {
        match self {
            Delimiter::Byte(b) => b,
            Delimiter::Auto => detect_delimiter(content),
        }
    }
}

/// `;` when the first line has more semicolons than commas, else `,`.
pub fn detect_delimiter(content: &[u8]) -> u8 {
    let first_line = content.split(|b| *b == b'\n').next().unwrap_or(&[]);
    let semis = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semis > commas {
        b';'
    } else {
        b','
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Dim(Dimension),
    Year,
    Sales(Region),
}

fn resolve_column(header: &str) -> Option<Column> {
    let col = match header.trim().to_ascii_lowercase().as_str() {
        "name" => Column::Name,
        "platform" => Column::Dim(Dimension::Platform),
        "company" | "platform company" => Column::Dim(Dimension::Company),
        "publisher" => Column::Dim(Dimension::Publisher),
        "genre" => Column::Dim(Dimension::Genre),
        "console" | "type of console" => Column::Dim(Dimension::Console),
        "year" => Column::Year,
        "na_sales" | "north america" | "northamerica" => Column::Sales(Region::NorthAmerica),
        "eu_sales" | "europe" => Column::Sales(Region::Europe),
        "jp_sales" | "japan" => Column::Sales(Region::Japan),
        "other_sales" | "others" => Column::Sales(Region::Others),
        "global_sales" | "global" => Column::Sales(Region::Global),
        _ => return None,
    };
    Some(col)
}

const REQUIRED: [Column; 11] = [
    Column::Dim(Dimension::Platform),
    Column::Dim(Dimension::Company),
    Column::Dim(Dimension::Publisher),
    Column::Dim(Dimension::Genre),
    Column::Dim(Dimension::Console),
    Column::Year,
    Column::Sales(Region::NorthAmerica),
    Column::Sales(Region::Europe),
    Column::Sales(Region::Japan),
    Column::Sales(Region::Others),
    Column::Sales(Region::Global),
];

fn required_name(col: Column) -> String {
    match col {
        Column::Name => "Name".to_string(),
        Column::Dim(d) => d.as_str().to_string(),
        Column::Year => "Year".to_string(),
        Column::Sales(r) => r.label().to_string(),
    }
}

/// Header positions keyed by logical column.
#[derive(Debug, Default)]
struct ColumnMap {
    name: Option<usize>,
    dims: [Option<usize>; 5],
    year: Option<usize>,
    sales: [Option<usize>; 5],
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = ColumnMap::default();
        for (idx, header) in headers.iter().enumerate() {
            // first occurrence wins
            match resolve_column(header) {
                Some(Column::Name) => {
                    map.name.get_or_insert(idx);
                }
                Some(Column::Dim(d)) => {
                    map.dims[d.index()].get_or_insert(idx);
                }
                Some(Column::Year) => {
                    map.year.get_or_insert(idx);
                }
                Some(Column::Sales(r)) => {
                    map.sales[region_slot(r)].get_or_insert(idx);
                }
                None => {}
            }
        }
        map
    }

    fn position(&self, col: Column) -> Option<usize> {
        match col {
            Column::Name => self.name,
            Column::Dim(d) => self.dims[d.index()],
            Column::Year => self.year,
            Column::Sales(r) => self.sales[region_slot(r)],
        }
    }

    fn missing(&self) -> Vec<String> {
        REQUIRED
            .iter()
            .filter(|c| self.position(**c).is_none())
            .map(|c| required_name(*c))
            .collect()
    }
}

fn region_slot(region: Region) -> usize {
    match region {
        Region::NorthAmerica => 0,
        Region::Europe => 1,
        Region::Japan => 2,
        Region::Others => 3,
        Region::Global => 4,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub columns: Vec<String>,
    pub missing: Vec<String>,
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub delimiter: String,
    pub row_count: u64,
    pub dropped_rows: u64,
    pub repaired_values: u64,
    pub year_min: i32,
    pub year_max: i32,
    pub columns: Vec<String>,
    pub warnings: Vec<String>,
    pub generated_at_epoch: u64,
}

#[derive(Debug, Clone, Default)]
struct Warnings {
    kept: Vec<String>,
    overflow: u64,
}

impl Warnings {
    fn push(&mut self, msg: String) {
        if self.kept.len() < MAX_WARNINGS {
            self.kept.push(msg);
        } else {
            self.overflow += 1;
        }
    }

    fn finish(mut self) -> Vec<String> {
        if self.overflow > 0 {
            self.kept.push(format!("... {} more warnings", self.overflow));
        }
        self.kept
    }
}

/// Result of cleaning one CSV payload.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub dataset: Dataset,
    pub columns: Vec<String>,
    pub dropped_rows: u64,
    pub repaired_values: u64,
    pub warnings: Vec<String>,
}

/// Coerce-or-drop: integers and integral floats (`"2006.0"`) are accepted,
/// anything else is `None`.
pub fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Non-negative sales figure; `Err` carries the reason the value was zeroed.
fn parse_sales(raw: &str) -> Result<f64, &'static str> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("missing");
    }
    let v = s
        .parse::<f64>()
        .or_else(|_| s.replace(',', ".").parse::<f64>())
        .map_err(|_| "not a number")?;
    if !v.is_finite() {
        Err("not a number")
    } else if v < 0.0 {
        Err("negative")
    } else {
        Ok(v)
    }
}

fn categorical(raw: Option<&str>) -> (String, bool) {
    match raw.map(str::trim) {
        Some(v) if !v.is_empty() => (v.to_string(), false),
        _ => (MISSING.to_string(), true),
    }
}

/// Parses and cleans CSV bytes already in memory.
pub fn clean_csv(content: &[u8], delimiter: u8) -> Result<Cleaned, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(content);

    let headers = reader.headers()?.clone();
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    let map = ColumnMap::from_headers(&headers);
    if let Some(missing) = map.missing().into_iter().next() {
        return Err(DataError::MissingColumn(missing));
    }

    let mut rows = Vec::new();
    let mut dropped_rows = 0u64;
    let mut repaired_values = 0u64;
    let mut warnings = Warnings::default();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |col: Column| map.position(col).and_then(|i| record.get(i));

        let year_raw = field(Column::Year).unwrap_or("");
        let year = match parse_year(year_raw) {
            Some(y) => y,
            None => {
                dropped_rows += 1;
                warnings.push(format!("line {}: dropped, bad year {:?}", line, year_raw));
                continue;
            }
        };

        let mut dims: [String; 5] = Default::default();
        for dim in Dimension::ALL {
            let (value, repaired) = categorical(field(Column::Dim(dim)));
            if repaired {
                repaired_values += 1;
            }
            dims[dim.index()] = value;
        }
        let (name, _) = categorical(field(Column::Name));

        let mut figures = [0.0f64; 5];
        for region in Region::ALL {
            let raw = field(Column::Sales(region)).unwrap_or("");
            match parse_sales(raw) {
                Ok(v) => figures[region_slot(region)] = v,
                Err(reason) => {
                    repaired_values += 1;
                    warnings.push(format!("line {}: {} {} {:?}, using 0", line, region.label(), reason, raw));
                }
            }
        }

        let [platform, company, publisher, genre, console] = dims;
        rows.push(SalesRecord {
            name,
            platform,
            company,
            publisher,
            genre,
            console,
            year,
            sales: Sales::new(figures[0], figures[1], figures[2], figures[3], figures[4]),
        });
    }

    Ok(Cleaned {
        dataset: Dataset::new(rows)?,
        columns,
        dropped_rows,
        repaired_values,
        warnings: warnings.finish(),
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>, DataError> {
    fs::read(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads, cleans and fingerprints a CSV file.
pub fn load_csv(path: &Path, delimiter: Delimiter) -> Result<(Dataset, DatasetManifest), DataError> {
    let content = read_file(path)?;
    let delim = delimiter.resolve(&content);
    let cleaned = clean_csv(&content, delim)?;

    let bounds = cleaned.dataset.year_bounds();
    let manifest = DatasetManifest {
        path: path.display().to_string(),
        hash_sha256: sha256_hex(&content),
        delimiter: (delim as char).to_string(),
        row_count: cleaned.dataset.len() as u64,
        dropped_rows: cleaned.dropped_rows,
        repaired_values: cleaned.repaired_values,
        year_min: bounds.min,
        year_max: bounds.max,
        columns: cleaned.columns,
        warnings: cleaned.warnings,
        generated_at_epoch: Utc::now().timestamp().max(0) as u64,
    };

    logging::log_dataset_loaded(
        &manifest.path,
        cleaned.dataset.len(),
        manifest.dropped_rows,
        bounds.min,
        bounds.max,
    );
    if manifest.dropped_rows > 0 || manifest.repaired_values > 0 {
        logging::warn(
            Domain::Data,
            "dataset_repaired",
            obj(&[
                ("path", v_str(&manifest.path)),
                ("dropped_rows", json!(manifest.dropped_rows)),
                ("repaired_values", json!(manifest.repaired_values)),
            ]),
        );
    }

    Ok((cleaned.dataset, manifest))
}

/// Where the session's dataset came from.
#[derive(Debug, Clone)]
pub enum Source {
    Csv(DatasetManifest),
    Demo { seed: u64, rows: usize },
}

/// Loads `cfg.dataset_path`, or the synthetic table when that file does not
/// exist.
pub fn load_configured(cfg: &Config) -> Result<(Dataset, Source), DataError> {
    let path = Path::new(&cfg.dataset_path);
    if path.exists() {
        let (dataset, manifest) = load_csv(path, cfg.delimiter)?;
        return Ok((dataset, Source::Csv(manifest)));
    }
    logging::warn(
        Domain::Data,
        "dataset_missing",
        obj(&[
            ("path", v_str(&cfg.dataset_path)),
            ("msg", v_str("falling back to synthetic dataset")),
            ("demo_rows", json!(cfg.demo_rows)),
        ]),
    );
    let dataset = demo::sample_dataset(cfg.demo_seed, cfg.demo_rows)?;
    Ok((
        dataset,
        Source::Demo {
            seed: cfg.demo_seed,
            rows: cfg.demo_rows,
        },
    ))
}

/// Checks that every required column can be resolved from the header.
pub fn validate_schema(path: &Path, delimiter: Delimiter) -> Result<SchemaReport, DataError> {
    let content = read_file(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.resolve(&content))
        .has_headers(true)
        .from_reader(content.as_slice());
    let headers = reader.headers()?.clone();
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    let missing = ColumnMap::from_headers(&headers).missing();
    let ok = missing.is_empty();
    let message = if ok {
        "schema ok".to_string()
    } else {
        format!("missing columns: {}", missing.join(", "))
    };
    Ok(SchemaReport {
        columns,
        missing,
        ok,
        message,
    })
}

pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

pub fn file_sha256(path: &Path) -> Result<String, DataError> {
    Ok(sha256_hex(&read_file(path)?))
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_HEADER: &str = "Rank;Name;Platform;Year;Genre;Publisher;NA_Sales;EU_Sales;JP_Sales;Other_Sales;Global_Sales;Platform Company;type of console";

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter(RAW_HEADER.as_bytes()), b';');
        assert_eq!(detect_delimiter(b"Name,Platform,Year\n1;2;3;4"), b',');
    }

    #[test]
    fn test_parse_year_coerces() {
        assert_eq!(parse_year("2006"), Some(2006));
        assert_eq!(parse_year(" 2006.0 "), Some(2006));
        assert_eq!(parse_year("2006.5"), None);
        assert_eq!(parse_year("N/A"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_parse_sales() {
        assert_eq!(parse_sales("41.49"), Ok(41.49));
        assert_eq!(parse_sales("0,5"), Ok(0.5));
        assert_eq!(parse_sales("-1"), Err("negative"));
        assert_eq!(parse_sales(""), Err("missing"));
    }

    #[test]
    fn test_clean_raw_export() {
        let csv = format!(
            "{}\n1;Wii Sports;Wii;2006;Sports;Nintendo;41.49;29.02;3.77;8.46;82.74;Nintendo;stationary\n2;Lost;PS2;N/A;Action;;1;1;1;1;4;Sony;stationary\n3;Pong;2600;1980.0;;Atari;1;0;0;0;1;Atari;\n",
            RAW_HEADER
        );
        let cleaned = clean_csv(csv.as_bytes(), b';').unwrap();
        assert_eq!(cleaned.dataset.len(), 2);
        assert_eq!(cleaned.dropped_rows, 1);
        // Genre and Console blank on the Pong row
        assert_eq!(cleaned.repaired_values, 2);
        let pong = &cleaned.dataset.rows()[1];
        assert_eq!(pong.platform, "2600");
        assert_eq!(pong.genre, MISSING);
        assert_eq!(pong.console, MISSING);
        assert_eq!(pong.year, 1980);
        let wii = &cleaned.dataset.rows()[0];
        assert_eq!(wii.company, "Nintendo");
        assert_eq!(wii.console, "stationary");
        assert_eq!(wii.sales.global, 82.74);
    }

    #[test]
    fn test_clean_short_names() {
        let csv = "Name,Platform,Company,Publisher,Genre,Console,Year,North America,Europe,Japan,Others,Global\n\
                   A,PS4,Sony,EA,Sports,stationary,2015,1,1,,0,2\n";
        let cleaned = clean_csv(csv.as_bytes(), b',').unwrap();
        assert_eq!(cleaned.dataset.len(), 1);
        assert_eq!(cleaned.repaired_values, 1);
        assert!(cleaned.warnings[0].contains("Japan"));
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "Name,Platform,Year\nA,PS4,2015\n";
        match clean_csv(csv.as_bytes(), b',') {
            Err(DataError::MissingColumn(col)) => assert_eq!(col, "Company"),
            other => panic!("unexpected: {:?}", other.map(|c| c.dataset.len())),
        }
    }

    #[test]
    fn test_all_rows_dropped_is_error() {
        let csv = format!("{}\n1;X;PS2;;Action;Sony;1;1;1;1;4;Sony;stationary\n", RAW_HEADER);
        assert!(matches!(clean_csv(csv.as_bytes(), b';'), Err(DataError::NoRows)));
    }

    #[test]
    fn test_warnings_capped() {
        let mut w = Warnings::default();
        for i in 0..(MAX_WARNINGS + 5) {
            w.push(format!("w{}", i));
        }
        let out = w.finish();
        assert_eq!(out.len(), MAX_WARNINGS + 1);
        assert_eq!(out.last().unwrap(), "... 5 more warnings");
    }

    #[test]
    fn test_manifest_path() {
        let p = default_manifest_path(Path::new("data/sales.csv"));
        assert_eq!(p, PathBuf::from("data/sales.csv.manifest.json"));
    }
}

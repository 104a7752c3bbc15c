use crate::data::Delimiter;
use crate::dimension::Dimension;

#[derive(Debug, Clone)]
pub struct Config {
    pub dataset_path: String,
    pub delimiter: Delimiter,
    pub bind_addr: String,
    pub default_grouping: Dimension,
    pub ranking_page_size: usize,
    /// Per-connection read and write timeout of the dashboard server.
    pub request_timeout_ms: u64,
    /// Rows of the synthetic table used when `dataset_path` does not exist.
    pub demo_rows: usize,
    pub demo_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: "data/videogames_sales.csv".to_string(),
            delimiter: Delimiter::Auto,
            bind_addr: "127.0.0.1:8000".to_string(),
            default_grouping: Dimension::Platform,
            ranking_page_size: 15,
            request_timeout_ms: 5_000,
            demo_rows: 500,
            demo_seed: 7,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            dataset_path: std::env::var("DATASET_PATH").unwrap_or(d.dataset_path),
            delimiter: std::env::var("CSV_DELIMITER").map(|v| Delimiter::parse(&v)).unwrap_or(d.delimiter),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(d.bind_addr),
            default_grouping: std::env::var("DEFAULT_GROUPING").ok().and_then(|v| v.parse().ok()).unwrap_or(d.default_grouping),
            ranking_page_size: std::env::var("RANKING_PAGE_SIZE").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(d.ranking_page_size),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(d.request_timeout_ms),
            demo_rows: std::env::var("DEMO_ROWS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.demo_rows),
            demo_seed: std::env::var("DEMO_SEED").ok().and_then(|v| v.parse().ok()).unwrap_or(d.demo_seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.default_grouping, Dimension::Platform);
        assert_eq!(cfg.ranking_page_size, 15);
        assert_eq!(cfg.delimiter, Delimiter::Auto);
        assert_eq!(cfg.request_timeout_ms, 5_000);
    }

    #[test]
    fn test_delimiter_names() {
        assert_eq!(Delimiter::parse(";"), Delimiter::Byte(b';'));
        assert_eq!(Delimiter::parse("comma"), Delimiter::Byte(b','));
        assert_eq!(Delimiter::parse("tab"), Delimiter::Byte(b'\t'));
        assert_eq!(Delimiter::parse(""), Delimiter::Auto);
    }
}

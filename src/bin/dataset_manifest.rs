use salesboard::config::Config;
use salesboard::data::{default_manifest_path, load_csv, validate_schema, Delimiter};
use serde_json::json;
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let cfg = Config::from_env();
    let path = env::args().nth(1).unwrap_or_else(|| cfg.dataset_path.clone());
    let delimiter = env::args()
        .nth(2)
        .map(|d| Delimiter::parse(&d))
        .unwrap_or(cfg.delimiter);
    let path = PathBuf::from(&path);

    let schema = match validate_schema(&path, delimiter) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("schema check failed: {}", err);
            std::process::exit(1);
        }
    };

    if !schema.ok {
        eprintln!("schema mismatch: {}", schema.message);
        eprintln!("found columns: {:?}", schema.columns);
        std::process::exit(2);
    }

    let (dataset, manifest) = match load_csv(&path, delimiter) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("load failed: {}", err);
            std::process::exit(3);
        }
    };

    let out_path = default_manifest_path(&path);
    let payload = json!({
        "manifest": manifest,
        "schema": schema,
        "distinct": {
            "Platform": dataset.distinct_values(salesboard::Dimension::Platform).len(),
            "Company": dataset.distinct_values(salesboard::Dimension::Company).len(),
            "Publisher": dataset.distinct_values(salesboard::Dimension::Publisher).len(),
            "Genre": dataset.distinct_values(salesboard::Dimension::Genre).len(),
            "Console": dataset.distinct_values(salesboard::Dimension::Console).len(),
        },
    });
    let body = match serde_json::to_string_pretty(&payload) {
        Ok(b) => b,
        Err(err) => {
            eprintln!("failed to encode manifest: {}", err);
            std::process::exit(4);
        }
    };
    if let Err(err) = fs::write(&out_path, body) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    println!("wrote manifest {}", out_path.display());
}

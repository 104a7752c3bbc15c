use anyhow::{Context, Result};
use serde_json::json;
use std::fs;

use salesboard::config::Config;
use salesboard::data::{load_configured, Source};
use salesboard::logging::{self, obj, v_str, Domain};
use salesboard::view::{recompute, SelectionRequest};

/// One-shot recompute: `salesboard [selection.json] [--page N]`.
///
/// Prints the dashboard view for the selection (or the initial selection)
/// as JSON on stdout; logs go to stderr and `LOG_DIR`.
fn main() -> Result<()> {
    let cfg = Config::from_env();
    let mut selection_path: Option<String> = None;
    let mut page = 0usize;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--page" => {
                let raw = args.next().context("--page needs a value")?;
                page = raw.parse().with_context(|| format!("bad page number {raw:?}"))?;
            }
            _ => selection_path = Some(arg),
        }
    }

    let (dataset, source) = load_configured(&cfg).context("loading dataset")?;
    let source_label = match &source {
        Source::Csv(manifest) => manifest.path.clone(),
        Source::Demo { seed, rows } => format!("demo(seed={seed}, rows={rows})"),
    };
    logging::info(
        Domain::System,
        "startup",
        obj(&[
            ("source", v_str(&source_label)),
            ("rows", json!(dataset.len())),
        ]),
    );

    let request = match &selection_path {
        Some(path) => {
            let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<SelectionRequest>(&raw).with_context(|| format!("parsing {path}"))?
        }
        None => SelectionRequest::default(),
    };
    let state = request.into_state(&dataset, cfg.default_grouping);

    let view = recompute(&dataset, &state, page, cfg.ranking_page_size);
    let payload = json!({
        "source": source_label,
        "view": view,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

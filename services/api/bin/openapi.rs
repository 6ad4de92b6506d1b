//! Writes the OpenAPI document of the training API.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use cxse_api::router::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));

    let doc = ApiDoc::openapi();
    let json = doc.to_pretty_json()?;
    std::fs::write(&output, json)?;
    println!(
        "Wrote {} paths to {}",
        doc.paths.paths.len(),
        output.display()
    );
    Ok(())
}

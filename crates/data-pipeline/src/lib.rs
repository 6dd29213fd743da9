#![deny(warnings)]

//! Seed import and document export for country data.
//!
//! A seed file is JSON, either an array of country objects carrying an `id`
//! key or an object mapping ids to country bodies. Both the editor's keys
//! and the dashboard's capitalized keys are accepted.

use anyhow::{bail, Context, Result};
use nation_core::CountryRecord;
use nation_econ::{CountryDocument, TuningTable};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

fn seed_id(value: Option<Value>) -> Option<String> {
    let id = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn push(out: &mut BTreeMap<String, CountryRecord>, id: String, body: Value) {
    match CountryRecord::from_document(&id, body) {
        Ok(record) => {
            if out.insert(id.clone(), record).is_some() {
                warn!(%id, "duplicate seed id, keeping the later entry");
            }
        }
        Err(e) => warn!(%id, error = %e, "skipping unreadable seed entry"),
    }
}

/// Parse seed text into records ordered by id.
///
/// Entries without a usable id or that fail to parse are skipped with a
/// warning. Anything other than an array or object at the top level is an
/// error.
pub fn parse_seed(text: &str) -> Result<Vec<CountryRecord>> {
    let root: Value = serde_json::from_str(text).context("seed is not valid JSON")?;
    let mut out = BTreeMap::new();
    match root {
        Value::Array(items) => {
            for (pos, item) in items.into_iter().enumerate() {
                let Value::Object(mut body) = item else {
                    warn!(pos, "skipping non-object seed entry");
                    continue;
                };
                match seed_id(body.remove("id")) {
                    Some(id) => push(&mut out, id, Value::Object(body)),
                    None => warn!(pos, "skipping seed entry without id"),
                }
            }
        }
        Value::Object(map) => {
            for (id, body) in map {
                let id = id.trim().to_string();
                if id.is_empty() || !body.is_object() {
                    warn!(%id, "skipping seed entry without id or body");
                    continue;
                }
                push(&mut out, id, body);
            }
        }
        _ => bail!("seed must be a JSON array or object"),
    }
    Ok(out.into_values().collect())
}

/// Read and parse a seed file.
pub fn load_seed(path: impl AsRef<Path>) -> Result<Vec<CountryRecord>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed {}", path.display()))?;
    let records = parse_seed(&text).with_context(|| format!("parsing seed {}", path.display()))?;
    info!(path = %path.display(), count = records.len(), "seed loaded");
    Ok(records)
}

/// Build storable documents for every record.
pub fn build_documents(records: Vec<CountryRecord>, tuning: &TuningTable) -> Vec<CountryDocument> {
    records
        .into_iter()
        .map(|r| CountryDocument::build(r, tuning))
        .collect()
}

/// Pretty JSON object keyed by country id, raw and derived fields together.
pub fn export_documents(docs: &[CountryDocument]) -> Result<String> {
    let mut map = Map::new();
    for doc in docs {
        map.insert(doc.id().to_string(), serde_json::to_value(doc)?);
    }
    Ok(serde_json::to_string_pretty(&Value::Object(map))?)
}

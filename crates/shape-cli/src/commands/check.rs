use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Serialize;
use shape_config::ShapeConfig;
use shape_core::Value;
use shape_schema::{InitOptions, Record, RecordType};

use crate::cli::CheckArgs;
use crate::output;

/// Result of building one record from one payload entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub source: String,
    /// Position inside a top-level array payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handle `shape check`.
pub fn handle(args: &CheckArgs, config: &ShapeConfig) -> anyhow::Result<()> {
    let catalog = super::load_catalog(&args.schema, config)?;
    let record_type = super::resolve_type(&catalog, args.schema.type_name.as_deref())?;

    let mut outcomes = Vec::new();
    for path in &args.payloads {
        outcomes.extend(check_file(&record_type, path)?);
    }
    output::output(&outcomes, &config.output)?;

    let failed = outcomes.iter().filter(|outcome| !outcome.ok).count();
    if failed > 0 {
        bail!("{failed} of {} records failed validation", outcomes.len());
    }
    Ok(())
}

/// Read and check one payload file.
pub fn check_file(
    record_type: &Arc<RecordType>,
    path: &Path,
) -> anyhow::Result<Vec<CheckOutcome>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payload {}", path.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&source)
        .with_context(|| format!("payload {} is not valid JSON", path.display()))?;
    Ok(check_payload(record_type, &path.display().to_string(), payload))
}

/// Build a record from an object payload, or one record per element of an array payload.
pub fn check_payload(
    record_type: &Arc<RecordType>,
    source: &str,
    payload: serde_json::Value,
) -> Vec<CheckOutcome> {
    match payload {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| check_one(record_type, source, Some(index), item))
            .collect(),
        other => vec![check_one(record_type, source, None, other)],
    }
}

fn check_one(
    record_type: &Arc<RecordType>,
    source: &str,
    index: Option<usize>,
    payload: serde_json::Value,
) -> CheckOutcome {
    let built = Record::from_value(record_type, Value::from(payload), InitOptions::new());
    match built {
        Ok(record) => CheckOutcome {
            source: source.to_string(),
            index,
            ok: true,
            record: Some(record.to_json()),
            error: None,
        },
        Err(error) => {
            tracing::debug!(source, ?index, %error, "payload rejected");
            CheckOutcome {
                source: source.to_string(),
                index,
                ok: false,
                record: None,
                error: Some(error.to_string()),
            }
        }
    }
}

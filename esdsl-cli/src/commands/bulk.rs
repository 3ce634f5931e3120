use anyhow::{Context, Result};
use esdsl::bulk::{BulkOperation, BulkRequest};
use esdsl::indices::RefreshRequest;
use esdsl_client::ElasticsearchClient;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reads one JSON document per line, skipping blank lines.
pub fn read_jsonl(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut documents = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Value = serde_json::from_str(&line)
            .with_context(|| format!("Invalid JSON on line {}", number + 1))?;
        documents.push(doc);
    }
    Ok(documents)
}

/// `_id` taken from a document field; strings and numbers qualify.
pub fn document_id(doc: &Value, id_field: Option<&str>) -> Option<String> {
    match doc.get(id_field?)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn build_batch(index: &str, documents: &[Value], id_field: Option<&str>) -> Result<BulkRequest> {
    let mut bulk = BulkRequest::new().with_index(index);
    for doc in documents {
        let mut operation = BulkOperation::index(doc)?;
        if let Some(id) = document_id(doc, id_field) {
            operation = operation.with_id(&id);
        }
        bulk.add(operation);
    }
    Ok(bulk)
}

/// Bulk index a JSONL file
pub async fn run_bulk(
    client: &ElasticsearchClient,
    index: &str,
    path: &Path,
    id_field: Option<&str>,
    batch_size: usize,
    refresh: bool,
) -> Result<()> {
    let documents = read_jsonl(path)?;
    let total = documents.len();
    tracing::info!("Indexing {} documents from {} into {}", total, path.display(), index);

    let mut indexed = 0;
    let mut failed = 0;
    for chunk in documents.chunks(batch_size.max(1)) {
        let bulk = build_batch(index, chunk, id_field)?;
        let response = client.bulk(&bulk).await?;
        let failures = response.failed_items();
        for (position, action, item) in &failures {
            let reason = item
                .error
                .as_ref()
                .and_then(|e| e.reason.as_deref())
                .unwrap_or("unknown error");
            eprintln!(
                "  ✗ {} #{} ({}): {}",
                action.as_str(),
                indexed + failed + position,
                item.status,
                reason
            );
        }
        failed += failures.len();
        indexed += chunk.len() - failures.len();
    }

    if refresh {
        client.refresh(&RefreshRequest::new([index])).await?;
    }

    println!("Indexed {} of {} documents ({} failed)", indexed, total, failed);
    Ok(())
}

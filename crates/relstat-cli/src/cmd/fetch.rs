//! `rst fetch` — refresh node and relation type metadata from the catalog.
//!
//! The catalog's detail documents are loosely shaped, so this module
//! navigates `serde_json::Value` with explicit presence checks: wrong-typed
//! fields degrade to absent or empty rather than failing the fetch. List
//! endpoints are fatal on failure; individual detail documents are warned
//! and skipped so one broken type does not abort a refresh.

use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use relstat_core::config::{self, ProjectConfig};
use relstat_core::layout::{DataLayout, MetadataKind};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `rst fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Catalog API base URL (overrides project and user config).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Fetch node types only.
    #[arg(long, conflicts_with = "relations_only")]
    pub nodes_only: bool,

    /// Fetch relation types only.
    #[arg(long)]
    pub relations_only: bool,
}

/// Report payload for `rst fetch`.
#[derive(Debug, Default, Serialize)]
struct FetchReport {
    node_types: usize,
    relation_types: usize,
    skipped: usize,
    requests: u64,
}

/// Execute `rst fetch`.
pub fn run_fetch(
    args: &FetchArgs,
    output: OutputMode,
    layout: &DataLayout,
    project: &ProjectConfig,
) -> anyhow::Result<()> {
    let user = config::load_user_config()?;
    let Some(base_url) = config::resolve_base_url(args.base_url.as_deref(), project, &user) else {
        render_error(
            output,
            &CliError::with_details(
                "no catalog base URL configured",
                "pass --base-url or set fetch.base_url in relstat.toml",
                "no_base_url",
            ),
        )?;
        anyhow::bail!("fetch failed");
    };
    let base_url = base_url.trim_end_matches('/').to_string();

    let client = CatalogClient::new(project.fetch.timeout_secs, project.fetch.max_attempts);
    let mut report = FetchReport::default();

    if !args.relations_only {
        report.node_types =
            fetch_kind(&client, layout, &base_url, MetadataKind::Nodes, &mut report.skipped)?;
    }
    if !args.nodes_only {
        report.relation_types =
            fetch_kind(&client, layout, &base_url, MetadataKind::Relations, &mut report.skipped)?;
    }
    report.requests = client.requests();

    render(output, &report, |report, w| {
        writeln!(
            w,
            "Fetched {} node type(s), {} relation type(s) ({} skipped, {} requests)",
            report.node_types, report.relation_types, report.skipped, report.requests
        )
    })
}

// ---------------------------------------------------------------------------
// HTTP client with retry/backoff
// ---------------------------------------------------------------------------

struct CatalogClient {
    agent: ureq::Agent,
    max_attempts: u32,
    requests: Cell<u64>,
}

impl CatalogClient {
    fn new(timeout_secs: u64, max_attempts: u32) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(timeout_secs))
                .build(),
            max_attempts: max_attempts.max(1),
            requests: Cell::new(0),
        }
    }

    fn requests(&self) -> u64 {
        self.requests.get()
    }

    /// GET a JSON document, retrying transport errors and HTTP 5xx with
    /// exponential backoff (1s initial delay, doubling). 4xx responses are
    /// permanent failures and are not retried.
    fn get_json(&self, url: &str) -> anyhow::Result<Value> {
        let mut delay = Duration::from_secs(1);

        for attempt in 1..=self.max_attempts {
            self.requests.set(self.requests.get() + 1);

            let retryable = match self.agent.get(url).call() {
                Ok(response) => {
                    return response
                        .into_json::<Value>()
                        .with_context(|| format!("failed to decode JSON from {url}"));
                }
                Err(ureq::Error::Status(code, _)) if code >= 500 => {
                    format!("HTTP {code}")
                }
                Err(ureq::Error::Status(code, _)) => {
                    anyhow::bail!("catalog request failed for {url}: HTTP {code}");
                }
                Err(err) => err.to_string(),
            };

            if attempt < self.max_attempts {
                warn!(
                    url,
                    attempt,
                    max_attempts = self.max_attempts,
                    error = %retryable,
                    "request failed, retrying in {}s",
                    delay.as_secs()
                );
                thread::sleep(delay);
                delay *= 2;
            } else {
                anyhow::bail!(
                    "catalog request failed for {url} after {} attempts: {retryable}",
                    self.max_attempts
                );
            }
        }

        unreachable!("retry loop always returns or bails")
    }
}

// ---------------------------------------------------------------------------
// Fetch flow
// ---------------------------------------------------------------------------

trait MetadataKindExt {
    fn list_path(self) -> &'static str;
    fn detail_path(self) -> &'static str;
    fn index_wrapper_key(self) -> &'static str;
}

impl MetadataKindExt for MetadataKind {
    fn list_path(self) -> &'static str {
        match self {
            Self::Nodes => "citypes/list",
            Self::Relations => "relationshiptypes/list",
        }
    }

    fn detail_path(self) -> &'static str {
        match self {
            Self::Nodes => "citypes/citype",
            Self::Relations => "relationshiptypes/relationshiptype",
        }
    }

    fn index_wrapper_key(self) -> &'static str {
        match self {
            Self::Nodes => "types",
            Self::Relations => "relations",
        }
    }
}

/// Fetch one metadata family: list the types, pull each detail document,
/// persist it, and write the compact index. Returns the number of types
/// indexed; bumps `skipped` for detail documents that could not be fetched.
fn fetch_kind(
    client: &CatalogClient,
    layout: &DataLayout,
    base_url: &str,
    kind: MetadataKind,
    skipped: &mut usize,
) -> anyhow::Result<usize> {
    let list_url = format!("{base_url}/{}", kind.list_path());
    info!(url = %list_url, "fetching type list");

    let raw_list = client.get_json(&list_url)?;
    let items = extract_list(&raw_list)
        .with_context(|| format!("cannot extract a type list from {list_url}"))?;

    let mut index = serde_json::Map::new();

    for item in items {
        let Some(technical) = technical_name(&item) else {
            continue;
        };
        let base_info = if item.is_object() { item.clone() } else { json!({}) };

        let detail_url = format!("{base_url}/{}/{technical}", kind.detail_path());
        let detail = match client.get_json(&detail_url) {
            Ok(detail) => detail,
            Err(err) => {
                warn!(name = %technical, error = %err, "failed to fetch detail, skipping");
                *skipped += 1;
                continue;
            }
        };

        write_json(&layout.metadata_doc(kind, &technical), &detail)?;

        let entry = match kind {
            MetadataKind::Nodes => node_index_entry(&technical, &detail, &base_info),
            MetadataKind::Relations => relation_index_entry(&technical, &detail, &base_info),
        };
        index.insert(technical, entry);
    }

    let count = index.len();
    let mut wrapper = serde_json::Map::new();
    wrapper.insert(kind.index_wrapper_key().to_string(), Value::Object(index));
    write_json(&layout.metadata_index(kind), &Value::Object(wrapper))?;
    info!(kind = kind.dir_name(), count, "wrote metadata index");

    Ok(count)
}

/// Normalize a catalog `/list` response into a list of items.
///
/// Accepts a JSON array; an object with a list under one of the preferred
/// keys; otherwise the first list-valued member; as a last resort the keys
/// of an all-string-keyed object. Anything else is an error.
fn extract_list(raw: &Value) -> anyhow::Result<Vec<Value>> {
    const PREFERRED_KEYS: [&str; 4] = ["result", "items", "types", "data"];

    if let Value::Array(items) = raw {
        return Ok(items.clone());
    }

    if let Value::Object(map) = raw {
        for key in PREFERRED_KEYS {
            if let Some(Value::Array(items)) = map.get(key) {
                return Ok(items.clone());
            }
        }
        for value in map.values() {
            if let Value::Array(items) = value {
                return Ok(items.clone());
            }
        }
        // Some list endpoints answer with a name-keyed object.
        return Ok(map.keys().map(|k| Value::String(k.clone())).collect());
    }

    anyhow::bail!("response is neither a list nor an object containing one")
}

/// The technical name of a list item: a bare string, or an object's
/// `technicalName` with `name` as fallback.
fn technical_name(item: &Value) -> Option<String> {
    match item {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(_) => ["technicalName", "name"]
            .iter()
            .find_map(|key| item.get(key).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// `meta[key]`, falling back to `base[key]`, null when absent from both.
fn meta_or_base(meta: &Value, base: &Value, key: &str) -> Value {
    meta.get(key)
        .filter(|v| !v.is_null())
        .or_else(|| base.get(key))
        .cloned()
        .unwrap_or(Value::Null)
}

fn labels_of(meta: &Value, base: &Value) -> Vec<Value> {
    base.get("labels")
        .and_then(Value::as_array)
        .or_else(|| meta.get("labels").and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

/// Compact per-attribute map keyed by attribute technical name.
fn attributes_entry(meta: &Value) -> Value {
    let mut attributes = serde_json::Map::new();
    let attr_list = meta.get("attributes").and_then(Value::as_array);

    for attr in attr_list.into_iter().flatten() {
        let Some(tech) = attr.get("technicalName").and_then(Value::as_str) else {
            continue;
        };
        attributes.insert(
            tech.to_string(),
            json!({
                "name": attr.get("name").cloned().unwrap_or(Value::Null),
                "description": attr.get("description").cloned().unwrap_or(Value::Null),
                "mandatory": attr
                    .get("mandatory")
                    .and_then(|m| m.get("type"))
                    .cloned()
                    .unwrap_or(Value::Null),
                "opendata": attr.get("opendata").cloned().unwrap_or(Value::Null),
                "attributeTypeEnum": attr.get("attributeTypeEnum").cloned().unwrap_or(Value::Null),
                "readOnly": attr.get("readOnly").cloned().unwrap_or(Value::Null),
                "invisible": attr.get("invisible").cloned().unwrap_or(Value::Null),
            }),
        );
    }

    Value::Object(attributes)
}

fn node_index_entry(technical: &str, meta: &Value, base: &Value) -> Value {
    let type_kind = meta_or_base(meta, base, "type");
    let labels = labels_of(meta, base);

    let is_application = type_kind.as_str() == Some("application");
    let is_system = type_kind.as_str() == Some("system");
    let is_codelist = is_application && labels.iter().any(|l| l.as_str() == Some("codelist"));

    json!({
        "technicalName": technical,
        "name": meta_or_base(meta, base, "name"),
        "description": meta_or_base(meta, base, "description"),
        "typeKind": type_kind,
        "labels": labels,
        "isApplication": is_application,
        "isSystem": is_system,
        "isCodelist": is_codelist,
        "attributes": attributes_entry(meta),
    })
}

/// First endpoint of `sources`/`targets`, reduced to its identifying fields.
fn endpoint_entry(meta: &Value, key: &str) -> Value {
    let endpoint = meta
        .get(key)
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .cloned()
        .unwrap_or(Value::Null);

    json!({
        "technicalName": endpoint.get("technicalName").cloned().unwrap_or(Value::Null),
        "name": endpoint.get("name").cloned().unwrap_or(Value::Null),
        "type": endpoint.get("type").cloned().unwrap_or(Value::Null),
        "labels": endpoint.get("labels").and_then(Value::as_array).cloned().unwrap_or_default(),
    })
}

fn relation_index_entry(technical: &str, meta: &Value, base: &Value) -> Value {
    json!({
        "technicalName": technical,
        "name": meta_or_base(meta, base, "name"),
        "description": meta_or_base(meta, base, "description"),
        "engDescription": meta.get("engDescription").cloned().unwrap_or(Value::Null),
        "type": meta_or_base(meta, base, "type"),
        "category": meta.get("category").cloned().unwrap_or(Value::Null),
        "source": endpoint_entry(meta, "sources"),
        "target": endpoint_entry(meta, "targets"),
        "sourceCardinality": meta.get("sourceCardinality").cloned().unwrap_or(Value::Null),
        "targetCardinality": meta.get("targetCardinality").cloned().unwrap_or(Value::Null),
        "attributes": attributes_entry(meta),
    })
}

fn write_json(path: &Path, value: &Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{extract_list, node_index_entry, relation_index_entry, technical_name};
    use serde_json::json;

    #[test]
    fn extract_list_accepts_plain_arrays() {
        let items = extract_list(&json!(["A", "B"])).expect("list");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn extract_list_prefers_known_keys() {
        let raw = json!({"other": ["x"], "result": ["A"], "items": ["B"]});
        let items = extract_list(&raw).expect("list");
        assert_eq!(items, vec![json!("A")]);
    }

    #[test]
    fn extract_list_falls_back_to_first_list_member() {
        let raw = json!({"count": 1, "payload": ["A", "B"]});
        let items = extract_list(&raw).expect("list");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn extract_list_uses_keys_as_last_resort() {
        let raw = json!({"TypeA": {"x": 1}, "TypeB": {"x": 2}});
        let mut items = extract_list(&raw).expect("list");
        items.sort_by_key(|v| v.as_str().map(str::to_string));
        assert_eq!(items, vec![json!("TypeA"), json!("TypeB")]);
    }

    #[test]
    fn extract_list_rejects_scalars() {
        assert!(extract_list(&json!(42)).is_err());
    }

    #[test]
    fn technical_name_resolution() {
        assert_eq!(technical_name(&json!("PO")).as_deref(), Some("PO"));
        assert_eq!(
            technical_name(&json!({"technicalName": "PO", "name": "Org"})).as_deref(),
            Some("PO")
        );
        assert_eq!(
            technical_name(&json!({"name": "Org"})).as_deref(),
            Some("Org")
        );
        assert!(technical_name(&json!(7)).is_none());
        assert!(technical_name(&json!({"label": "x"})).is_none());
    }

    #[test]
    fn node_entry_derives_kind_flags() {
        let meta = json!({
            "name": "Codelists",
            "type": "application",
            "labels": ["codelist", "public"],
            "attributes": [
                {"technicalName": "Gen_name", "name": "Name", "mandatory": {"type": "critical"}},
                {"name": "anonymous attribute"}
            ]
        });
        let entry = node_index_entry("CL", &meta, &json!({}));

        assert_eq!(entry["technicalName"], "CL");
        assert_eq!(entry["isApplication"], true);
        assert_eq!(entry["isSystem"], false);
        assert_eq!(entry["isCodelist"], true);
        assert_eq!(entry["attributes"]["Gen_name"]["mandatory"], "critical");
        // Attributes without a technical name are dropped.
        assert_eq!(entry["attributes"].as_object().map(serde_json::Map::len), Some(1));
    }

    #[test]
    fn node_entry_falls_back_to_base_info() {
        let entry = node_index_entry(
            "PO",
            &json!({"type": null}),
            &json!({"name": "Org", "type": "system", "labels": ["core"]}),
        );
        assert_eq!(entry["name"], "Org");
        assert_eq!(entry["typeKind"], "system");
        assert_eq!(entry["isSystem"], true);
        assert_eq!(entry["labels"], json!(["core"]));
    }

    #[test]
    fn relation_entry_reduces_first_endpoints() {
        let meta = json!({
            "name": "manages",
            "sourceCardinality": "1..*",
            "sources": [{"technicalName": "PO", "name": "Org", "type": "system"}],
            "targets": []
        });
        let entry = relation_index_entry("PO_manages_KS", &meta, &json!({}));

        assert_eq!(entry["source"]["technicalName"], "PO");
        assert_eq!(entry["source"]["labels"], json!([]));
        assert_eq!(entry["target"]["technicalName"], serde_json::Value::Null);
        assert_eq!(entry["sourceCardinality"], "1..*");
    }
}

use super::Extractor;
use crate::record::{Field, richer_by_length};
use crate::text::strip_html;
use crate::{Document, Record};
use serde_json::{Map, Value};

/// Reads schema.org `JobPosting` nodes from `application/ld+json` scripts.
///
/// A script may hold a single node, an array of nodes, or an object with an
/// `@graph` array. Scripts that are not valid JSON are skipped. Every
/// `JobPosting` node marks the record; the description is the one field
/// where nodes compete, the longest one winning.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLd;

impl Extractor for JsonLd {
    fn name(&self) -> &'static str {
        "json-ld"
    }

    fn extract(&self, document: &Document, record: &mut Record) {
        for (index, raw) in document.jsonld().iter().enumerate() {
            let payload: Value = match serde_json::from_str(raw) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::debug!(script = index + 1, error = %err, "Skipping unparseable JSON-LD script");
                    continue;
                },
            };
            for node in nodes(&payload).filter(|node| is_job_posting(node)) {
                record.mark_jobposting();
                apply(node, record);
            }
        }
    }
}

fn nodes(payload: &Value) -> Box<dyn Iterator<Item = &Map<String, Value>> + '_> {
    let items: &[Value] = match payload {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("@graph") {
            Some(Value::Array(graph)) => graph,
            _ => return Box::new(std::iter::once(object)),
        },
        _ => &[],
    };
    Box::new(items.iter().filter_map(Value::as_object))
}

fn is_job_posting(node: &Map<String, Value>) -> bool {
    match node.get("@type") {
        Some(Value::String(kind)) => kind == "JobPosting",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn apply(node: &Map<String, Value>, record: &mut Record) {
    record.set_if_absent(Field::Title, as_text(node.get("title")));
    if let Some(Value::Object(hiring)) = node.get("hiringOrganization") {
        record.set_if_absent(Field::Company, as_text(hiring.get("name")));
    }
    let location = match node.get("jobLocation") {
        Some(Value::Array(locations)) => locations.first(),
        other => other,
    };
    if let Some(Value::Object(address)) = location.and_then(|location| location.get("address")) {
        record.set_if_absent(Field::Location, as_text(address.get("addressLocality")));
    }
    record.set_if_absent(Field::ContractType, as_text(node.get("employmentType")));
    let description = strip_html(&as_text(node.get("description")));
    record.replace_if_richer(Field::Description, description, richer_by_length);
}

/// Coerces a JSON-LD value into display text.
///
/// Strings are trimmed, arrays join their non-empty items with `", "`, objects
/// are represented by their `name` (or their JSON text when they have none),
/// and scalars by their JSON text. `null` and absent values are empty.
pub fn as_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| as_text(Some(item)))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Object(object)) => match object.get("name") {
            Some(name) => as_text(Some(name)),
            None => Value::Object(object.clone()).to_string(),
        },
        Some(other) => other.to_string(),
    }
}

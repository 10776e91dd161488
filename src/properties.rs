//! Reading and building typed page properties
//!
//! Pages in the workspace store carry their fields as a map of typed property
//! objects. The agency renames columns now and then, so every reader takes a
//! list of candidate property names and uses the first one present in the map.
//! Reads are lenient: a missing or differently typed property yields the
//! type's default instead of an error.

use serde_json::{Map, Value};

use crate::models::FileRef;

/// Property bag of a page, keyed by property name
pub type PropertyMap = Map<String, Value>;

/// Resolve the first candidate name present in the property map
#[must_use]
pub fn first_of<'a>(props: &'a PropertyMap, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| props.get(*name))
}

/// Text of a title property, empty when absent
#[must_use]
pub fn title(props: &PropertyMap, names: &[&str]) -> String {
    first_of(props, names)
        .map(|p| first_run_text(&p["title"]))
        .unwrap_or_default()
}

/// Text of the first run of a rich text property, empty when absent
#[must_use]
pub fn rich_text(props: &PropertyMap, names: &[&str]) -> String {
    first_of(props, names)
        .map(|p| first_run_text(&p["rich_text"]))
        .unwrap_or_default()
}

/// Pages read from the store carry `plain_text` on each run; payloads built
/// by [`build`] carry only `text.content`. Accept both so pages written and
/// read back through an in-memory store keep their text.
fn first_run_text(runs: &Value) -> String {
    let run = &runs[0];
    run["plain_text"]
        .as_str()
        .or_else(|| run["text"]["content"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Value of a number property, `0.0` when absent
#[must_use]
pub fn number(props: &PropertyMap, names: &[&str]) -> f64 {
    opt_number(props, names).unwrap_or_default()
}

/// Value of a number property, `None` when absent or empty
#[must_use]
pub fn opt_number(props: &PropertyMap, names: &[&str]) -> Option<f64> {
    first_of(props, names).and_then(|p| p["number"].as_f64())
}

/// Name of the selected option of a select property, empty when absent
#[must_use]
pub fn select(props: &PropertyMap, names: &[&str]) -> String {
    first_of(props, names)
        .and_then(|p| p["select"]["name"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Name of the current option of a status property, empty when absent
#[must_use]
pub fn status(props: &PropertyMap, names: &[&str]) -> String {
    first_of(props, names)
        .and_then(|p| p["status"]["name"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Status of a page that may use either a status or a select column
#[must_use]
pub fn status_or_select(props: &PropertyMap, names: &[&str]) -> String {
    let value = status(props, names);
    if value.is_empty() { select(props, names) } else { value }
}

/// Same as [`status_or_select`] but prefers the select column
#[must_use]
pub fn select_or_status(props: &PropertyMap, names: &[&str]) -> String {
    let value = select(props, names);
    if value.is_empty() { status(props, names) } else { value }
}

/// Option names of a multi-select property
#[must_use]
pub fn multi_select(props: &PropertyMap, names: &[&str]) -> Vec<String> {
    first_of(props, names)
        .and_then(|p| p["multi_select"].as_array())
        .map(|options| {
            options
                .iter()
                .filter_map(|o| o["name"].as_str())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Start of a date property as an ISO 8601 string
#[must_use]
pub fn date(props: &PropertyMap, names: &[&str]) -> Option<String> {
    first_of(props, names)
        .and_then(|p| p["date"]["start"].as_str())
        .map(ToString::to_string)
}

/// Value of a checkbox property, `false` when absent
#[must_use]
pub fn checkbox(props: &PropertyMap, names: &[&str]) -> bool {
    first_of(props, names)
        .and_then(|p| p["checkbox"].as_bool())
        .unwrap_or_default()
}

/// Value of a URL property, empty when absent
#[must_use]
pub fn url(props: &PropertyMap, names: &[&str]) -> String {
    string_field(props, names, "url")
}

/// Value of an email property, empty when absent
#[must_use]
pub fn email(props: &PropertyMap, names: &[&str]) -> String {
    string_field(props, names, "email")
}

/// Value of a phone number property, empty when absent
#[must_use]
pub fn phone(props: &PropertyMap, names: &[&str]) -> String {
    string_field(props, names, "phone_number")
}

/// Ids referenced by a relation property
#[must_use]
pub fn relation(props: &PropertyMap, names: &[&str]) -> Vec<String> {
    first_of(props, names)
        .and_then(|p| p["relation"].as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// First id referenced by a relation property
#[must_use]
pub fn first_relation(props: &PropertyMap, names: &[&str]) -> Option<String> {
    relation(props, names).into_iter().next()
}

/// Attachments of a files property
///
/// Uploaded files expose their URL under `file`, linked ones under
/// `external`; the uploaded URL wins when both are present.
#[must_use]
pub fn files(props: &PropertyMap, names: &[&str]) -> Vec<FileRef> {
    first_of(props, names)
        .and_then(|p| p["files"].as_array())
        .map(|entries| {
            entries
                .iter()
                .map(|entry| FileRef {
                    name: entry["name"].as_str().unwrap_or_default().to_string(),
                    url: entry["file"]["url"]
                        .as_str()
                        .or_else(|| entry["external"]["url"].as_str())
                        .unwrap_or_default()
                        .to_string(),
                    kind: entry["type"].as_str().unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Numeric result of a formula property
#[must_use]
pub fn formula_number(props: &PropertyMap, names: &[&str]) -> Option<f64> {
    first_of(props, names).and_then(|p| p["formula"]["number"].as_f64())
}

/// Text result of a formula property, empty when absent
#[must_use]
pub fn formula_text(props: &PropertyMap, names: &[&str]) -> String {
    first_of(props, names)
        .and_then(|p| p["formula"]["string"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Boolean result of a formula property, `false` when absent
#[must_use]
pub fn formula_bool(props: &PropertyMap, names: &[&str]) -> bool {
    first_of(props, names)
        .and_then(|p| p["formula"]["boolean"].as_bool())
        .unwrap_or_default()
}

/// Numeric result of a rollup property
#[must_use]
pub fn rollup_number(props: &PropertyMap, names: &[&str]) -> Option<f64> {
    first_of(props, names).and_then(|p| p["rollup"]["number"].as_f64())
}

/// Items aggregated by an array rollup property
#[must_use]
pub fn rollup_items(props: &PropertyMap, names: &[&str]) -> Vec<Value> {
    first_of(props, names)
        .and_then(|p| p["rollup"]["array"].as_array())
        .cloned()
        .unwrap_or_default()
}

/// Value of a created time property
#[must_use]
pub fn created_time(props: &PropertyMap, names: &[&str]) -> Option<String> {
    first_of(props, names)
        .and_then(|p| p["created_time"].as_str())
        .map(ToString::to_string)
}

/// Value of a last edited time property
#[must_use]
pub fn last_edited_time(props: &PropertyMap, names: &[&str]) -> Option<String> {
    first_of(props, names)
        .and_then(|p| p["last_edited_time"].as_str())
        .map(ToString::to_string)
}

fn string_field(props: &PropertyMap, names: &[&str], field: &str) -> String {
    first_of(props, names)
        .and_then(|p| p[field].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Builders producing property payloads the store accepts on page writes
pub mod build {
    use serde_json::{Value, json};

    /// Title property with a single plain run
    #[must_use]
    pub fn title(value: &str) -> Value {
        json!({ "title": [{ "text": { "content": value } }] })
    }

    /// Rich text property with a single plain run
    #[must_use]
    pub fn rich_text(value: &str) -> Value {
        json!({ "rich_text": [{ "text": { "content": value } }] })
    }

    /// Number property
    #[must_use]
    pub fn number(value: f64) -> Value {
        json!({ "number": value })
    }

    /// Select property, cleared when `value` is `None`
    #[must_use]
    pub fn select(value: Option<&str>) -> Value {
        match value {
            Some(name) => json!({ "select": { "name": name } }),
            None => json!({ "select": null }),
        }
    }

    /// Status property, cleared when `value` is `None`
    #[must_use]
    pub fn status(value: Option<&str>) -> Value {
        match value {
            Some(name) => json!({ "status": { "name": name } }),
            None => json!({ "status": null }),
        }
    }

    /// Multi-select property
    #[must_use]
    pub fn multi_select(values: &[&str]) -> Value {
        let options: Vec<Value> = values.iter().map(|name| json!({ "name": name })).collect();
        json!({ "multi_select": options })
    }

    /// Date property holding a start instant, cleared when `value` is `None`
    #[must_use]
    pub fn date(value: Option<&str>) -> Value {
        match value {
            Some(start) => json!({ "date": { "start": start } }),
            None => json!({ "date": null }),
        }
    }

    /// Checkbox property
    #[must_use]
    pub fn checkbox(value: bool) -> Value {
        json!({ "checkbox": value })
    }

    /// URL property, cleared when `value` is `None`
    #[must_use]
    pub fn url(value: Option<&str>) -> Value {
        json!({ "url": value })
    }

    /// Email property, cleared when `value` is `None`
    #[must_use]
    pub fn email(value: Option<&str>) -> Value {
        json!({ "email": value })
    }

    /// Phone number property, cleared when `value` is `None`
    #[must_use]
    pub fn phone(value: Option<&str>) -> Value {
        json!({ "phone_number": value })
    }

    /// Relation property referencing the given page ids
    #[must_use]
    pub fn relation(ids: &[&str]) -> Value {
        let refs: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
        json!({ "relation": refs })
    }
}

/// Build a property map from `(name, payload)` pairs, used by page writes
#[must_use]
pub fn map_of(entries: Vec<(&str, Value)>) -> PropertyMap {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

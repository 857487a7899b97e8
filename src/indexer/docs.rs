//! API reference record extraction
//!
//! The Azure Maps TypeScript reference ships as one YAML document per
//! class/interface/type. Records keep the identifying fields plus
//! simplified property and method summaries, and a combined `content`
//! string for semantic search.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use uuid::Uuid;

/// One search-ready API reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id: String,
    pub uid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub summary: String,
    pub package: String,
    #[serde(rename = "isDeprecation")]
    pub is_deprecation: bool,
    pub properties: Vec<PropertySummary>,
    pub methods: Vec<MethodSummary>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySummary {
    pub name: String,
    pub description: String,
    #[serde(rename = "isDeprecated")]
    pub is_deprecated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSummary {
    pub name: String,
    pub description: String,
    pub parameters: Vec<String>,
}

/// Build a search record from one YAML reference document.
pub fn process_reference_doc(yaml_content: &str) -> Result<ReferenceRecord, serde_yaml::Error> {
    let doc: Value = serde_yaml::from_str(yaml_content)?;

    let properties: Vec<PropertySummary> = seq(&doc, "properties")
        .iter()
        .filter(|prop| !str_field(prop, "name").is_empty())
        .map(|prop| PropertySummary {
            name: str_field(prop, "name"),
            description: str_field(prop, "summary"),
            is_deprecated: bool_field(prop, "isDeprecated"),
        })
        .collect();

    let methods: Vec<MethodSummary> = seq(&doc, "inheritedMethods")
        .iter()
        .filter(|method| {
            !str_field(method, "name").is_empty() && !str_field(method, "summary").is_empty()
        })
        .map(|method| MethodSummary {
            name: str_field(method, "name"),
            description: str_field(method, "summary"),
            parameters: method_parameters(method),
        })
        .collect();

    let content = [
        str_field(&doc, "name"),
        str_field(&doc, "summary"),
        str_field(&doc, "fullName"),
        properties
            .iter()
            .map(|p| p.description.clone())
            .collect::<Vec<_>>()
            .join(" "),
        methods
            .iter()
            .map(|m| m.description.clone())
            .collect::<Vec<_>>()
            .join(" "),
    ]
    .join(" ")
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ");

    Ok(ReferenceRecord {
        id: Uuid::new_v4().to_string(),
        uid: str_field(&doc, "uid"),
        name: str_field(&doc, "name"),
        doc_type: str_field(&doc, "type"),
        summary: str_field(&doc, "summary"),
        package: str_field(&doc, "package"),
        is_deprecation: bool_field(&doc, "isDeprecation"),
        properties,
        methods,
        content,
    })
}

/// Walk a reference tree and build a record per YAML file.
///
/// A file that fails to parse is skipped with a warning; one bad
/// document does not abort the run.
pub fn collect_docs(root: &Path) -> io::Result<Vec<ReferenceRecord>> {
    let mut records = Vec::new();
    walk_yaml_files(root, &mut |path| {
        let content = std::fs::read_to_string(path)?;
        match process_reference_doc(&content) {
            Ok(record) => records.push(record),
            Err(error) => {
                tracing::warn!(file = %path.display(), %error, "Skipping unparsable reference doc");
            }
        }
        Ok(())
    })?;
    Ok(records)
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn seq<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn method_parameters(method: &Value) -> Vec<String> {
    let parameters = method
        .get("syntax")
        .and_then(|syntax| syntax.get("parameters"))
        .and_then(Value::as_sequence);

    parameters
        .map(|params| {
            params
                .iter()
                .filter(|param| {
                    !str_field(param, "id").is_empty()
                        && !str_field(param, "description").is_empty()
                })
                .map(|param| {
                    format!(
                        "{}: {}",
                        str_field(param, "id"),
                        str_field(param, "description")
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

fn walk_yaml_files(
    dir: &Path,
    visit: &mut dyn FnMut(&Path) -> io::Result<()>,
) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_yaml_files(&path, visit)?;
        } else if matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yml") | Some("yaml")
        ) {
            visit(&path)?;
        }
    }
    Ok(())
}

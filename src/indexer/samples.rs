//! Code-sample record extraction
//!
//! Each Azure Maps code sample is a standalone HTML page whose
//! `<script>` elements hold the SDK usage and whose `<fieldset>` holds
//! the on-page usage description. Records carry both plus the page
//! metadata, and a combined `embedding_content` string for semantic
//! search.

use std::io;
use std::path::Path;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const NO_CODE_FOUND: &str = "No Azure Maps code found";
pub const NO_USAGE_FOUND: &str = "No usage description found";

/// One search-ready code sample record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    pub id: String,
    pub file_name: String,
    pub content_type: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub code_snippet: String,
    pub content: String,
    pub usage_description: String,
    pub embedding_content: String,
}

/// Script and usage text pulled out of one sample page.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedSample {
    pub code_snippet: String,
    pub usage_description: String,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

/// Extract script content and usage description from sample HTML.
///
/// Placeholder strings are substituted when a page has no inline
/// scripts or no fieldset, so records always carry searchable text.
pub fn extract_sample_code(content: &str) -> ExtractedSample {
    let document = Html::parse_document(content);

    let scripts: Vec<String> = document
        .select(&selector("script"))
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect();

    let usage: Vec<String> = document
        .select(&selector("fieldset"))
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    ExtractedSample {
        code_snippet: if scripts.is_empty() {
            NO_CODE_FOUND.to_string()
        } else {
            scripts.join("\n")
        },
        usage_description: if usage.is_empty() {
            NO_USAGE_FOUND.to_string()
        } else {
            usage.join("\n")
        },
    }
}

/// Build a full search record from one sample page.
pub fn process_html_sample(content: &str, file_name: &str, category: &str) -> SampleRecord {
    let extracted = extract_sample_code(content);

    let document = Html::parse_document(content);
    let title = document
        .select(&selector("title"))
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let description = meta_content(&document, "description").unwrap_or_default();
    let keywords: Vec<String> = meta_content(&document, "keywords")
        .map(|value| {
            value
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let embedding_content = format!(
        "title: {title} | category: {category} | description: {description} | usage_description: {usage} | keywords: {keywords}",
        usage = extracted.usage_description,
        keywords = keywords.join(", ")
    );

    SampleRecord {
        id: Uuid::new_v4().to_string(),
        file_name: file_name.to_string(),
        content_type: "azmaps_code_sample".to_string(),
        category: category.to_string(),
        title,
        description,
        keywords,
        code_snippet: extracted.code_snippet,
        content: content.to_string(),
        usage_description: extracted.usage_description,
        embedding_content,
    }
}

/// Walk a samples tree and build a record per HTML file.
///
/// The tree is laid out `<category>/<sample>/<page>.html`; the category
/// folder name (with `-` as spaces) becomes the record category.
pub fn collect_samples(root: &Path) -> io::Result<Vec<SampleRecord>> {
    let mut records = Vec::new();
    walk_html_files(root, &mut |path| {
        let content = std::fs::read_to_string(path)?;

        let category = path
            .parent()
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().replace('-', " "))
            .unwrap_or_else(|| "uncategorized".to_string());
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = format!("{category}-{file}");

        tracing::debug!(file = %path.display(), category = %category, "Indexing sample");
        records.push(process_html_sample(&content, &file_name, &category));
        Ok(())
    })?;
    Ok(records)
}

fn meta_content(document: &Html, name: &str) -> Option<String> {
    document
        .select(&selector(&format!(r#"meta[name="{name}"]"#)))
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|value| value.to_string())
}

fn walk_html_files(
    dir: &Path,
    visit: &mut dyn FnMut(&Path) -> io::Result<()>,
) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_html_files(&path, visit)?;
        } else if matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("html") | Some("htm")
        ) {
            visit(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Bubble Layer</title>
    <meta name="description" content="Render points as scaled circles." />
    <meta name="keywords" content="azure maps, bubble, circle" />
    <script src="https://atlas.microsoft.com/sdk/javascript/mapcontrol/3/atlas.min.js"></script>
    <script>
        var map = new atlas.Map('myMap');
    </script>
</head>
<body>
    <div id="myMap"></div>
    <fieldset>
        <legend>Bubble Layer</legend>
        This sample shows how to render point data with a bubble layer.
    </fieldset>
</body>
</html>"#;

    #[test]
    fn test_extracts_inline_script_only() {
        let extracted = extract_sample_code(SAMPLE_PAGE);
        assert!(extracted.code_snippet.contains("new atlas.Map"));
        // The src-only script tag contributes no text.
        assert!(!extracted.code_snippet.contains("atlas.min.js"));
    }

    #[test]
    fn test_extracts_fieldset_usage() {
        let extracted = extract_sample_code(SAMPLE_PAGE);
        assert!(extracted.usage_description.contains("bubble layer"));
    }

    #[test]
    fn test_placeholders_for_empty_page() {
        let extracted = extract_sample_code("<html><body><p>nothing here</p></body></html>");
        assert_eq!(extracted.code_snippet, NO_CODE_FOUND);
        assert_eq!(extracted.usage_description, NO_USAGE_FOUND);
    }

    #[test]
    fn test_full_record() {
        let record = process_html_sample(SAMPLE_PAGE, "Bubble Layer-bubble.html", "Bubble Layer");
        assert_eq!(record.title, "Bubble Layer");
        assert_eq!(record.description, "Render points as scaled circles.");
        assert_eq!(record.keywords, vec!["azure maps", "bubble", "circle"]);
        assert_eq!(record.content_type, "azmaps_code_sample");
        assert!(record.embedding_content.starts_with("title: Bubble Layer | category: Bubble Layer |"));
        assert!(record.embedding_content.contains("keywords: azure maps, bubble, circle"));
    }

    #[test]
    fn test_collect_samples_walks_tree() {
        let dir = tempfile::tempdir().unwrap();
        let sample_dir = dir.path().join("Bubble-Layer").join("Simple-Bubble");
        std::fs::create_dir_all(&sample_dir).unwrap();
        std::fs::write(sample_dir.join("bubble.html"), SAMPLE_PAGE).unwrap();
        std::fs::write(sample_dir.join("notes.txt"), "ignored").unwrap();

        let records = collect_samples(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "Bubble Layer");
        assert_eq!(records[0].file_name, "Bubble Layer-bubble.html");
    }
}

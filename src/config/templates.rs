//! Prompt and skeleton templates
//!
//! The system prompts and the HTML/CSS skeletons the extractor
//! assembles code blocks into. Deployments can override the built-in
//! set with a TOML file:
//!
//! ```toml
//! [system_prompt]
//! content = "..."
//!
//! [system_prompt_search]
//! content = "..."
//!
//! [html]
//! content = "..."
//!
//! [css]
//! content = "..."
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

/// One named template's text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub content: String,
}

/// The full template set used by the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSet {
    /// System instructions for ungrounded conversations.
    pub system_prompt: Template,
    /// System instructions when search augmentation is on.
    pub system_prompt_search: Template,
    /// HTML skeleton with `{title}`, `{description}`, `{css}`, `{html}`,
    /// `{js}` placeholders.
    pub html: Template,
    /// Base stylesheet layered under any model-provided CSS.
    pub css: Template,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            system_prompt: Template {
                content: builtin::SYSTEM_PROMPT.to_string(),
            },
            system_prompt_search: Template {
                content: builtin::SYSTEM_PROMPT_SEARCH.to_string(),
            },
            html: Template {
                content: builtin::HTML_SKELETON.to_string(),
            },
            css: Template {
                content: builtin::CSS_BASE.to_string(),
            },
        }
    }
}

impl TemplateSet {
    /// Load a template set from a TOML file.
    pub async fn load_from_file(path: &Path) -> Result<Self, TemplateError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| TemplateError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| TemplateError::Parse(e.to_string()))
    }

    /// System prompt for a conversation, selected by the search flag.
    pub fn system_prompt_for(&self, use_search: bool) -> &str {
        if use_search {
            &self.system_prompt_search.content
        } else {
            &self.system_prompt.content
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Built-in templates used when no override file is configured.
pub mod builtin {
    pub const SYSTEM_PROMPT: &str = r#"You are an Azure Maps visualization assistant. The user gives you a sample of a data file and asks for a map visualization built with the Azure Maps Web SDK (the atlas namespace).

Rules for every reply that contains code:
1. Put the map container markup inside <code-html>...</code-html>.
2. Put stylesheet rules inside <code-css>...</code-css>.
3. Put the JavaScript inside <code-js>...</code-js>. Authenticate with subscriptionKey: 'AZURE_MAPS_SUBSCRIPTION_KEY' and load the user's data from the URL placeholder USER_FILE_NAME (or USER_FILE_NAME_1, USER_FILE_NAME_2, ... when several files were provided, numbered in upload order).
4. Put a short title inside <sample-title>...</sample-title> and a one-sentence summary inside <sample-description>...</sample-description>.
5. Suggest one natural next refinement inside <follow-up>...</follow-up>.

Only the sampled portion of each file is shown to you; write code that loads the full file from its URL. Keep any prose outside the tags brief."#;

    pub const SYSTEM_PROMPT_SEARCH: &str = r#"You are an Azure Maps visualization assistant. The user gives you a sample of a data file and asks for a map visualization built with the Azure Maps Web SDK (the atlas namespace). Retrieved Azure Maps code samples and API reference documents are provided with each request; ground your code in them and prefer their patterns over inventions.

Rules for every reply that contains code:
1. Put the map container markup inside <code-html>...</code-html>.
2. Put stylesheet rules inside <code-css>...</code-css>.
3. Put the JavaScript inside <code-js>...</code-js>. Authenticate with subscriptionKey: 'AZURE_MAPS_SUBSCRIPTION_KEY' and load the user's data from the URL placeholder USER_FILE_NAME (or USER_FILE_NAME_1, USER_FILE_NAME_2, ... when several files were provided, numbered in upload order).
4. Put a short title inside <sample-title>...</sample-title> and a one-sentence summary inside <sample-description>...</sample-description>.
5. Suggest one natural next refinement inside <follow-up>...</follow-up>.

Only the sampled portion of each file is shown to you; write code that loads the full file from its URL. Keep any prose outside the tags brief."#;

    pub const HTML_SKELETON: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1, shrink-to-fit=no" />
    <title>{title}</title>
    <meta name="description" content="{description}" />
    <link href="https://atlas.microsoft.com/sdk/javascript/mapcontrol/3/atlas.min.css" rel="stylesheet" />
    <script src="https://atlas.microsoft.com/sdk/javascript/mapcontrol/3/atlas.min.js"></script>
    {css}
</head>
<body>
    {html}
    {js}
</body>
</html>"#;

    pub const CSS_BASE: &str = r#"html, body {
    margin: 0;
    padding: 0;
    width: 100%;
    height: 100%;
}

#myMap {
    width: 100%;
    height: 100%;
}"#;
}

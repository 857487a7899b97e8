//! Response block extraction
//!
//! Partitions one assistant reply into named slots (markup, style,
//! script, title, description, follow-up) plus the explanation — the
//! reply with every recognized span removed. Two reply formats are
//! supported: tag-delimited sections (`<code-html>...</code-html>`) and
//! a single generic code fence assumed to hold a complete document.
//!
//! Extraction is best-effort and pure: a malformed or absent closing
//! marker leaves its slot empty, and the same reply always produces the
//! same result.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Token replaced with the configured Azure Maps subscription key.
pub const SUBSCRIPTION_KEY_TOKEN: &str = "AZURE_MAPS_SUBSCRIPTION_KEY";

/// Token family replaced with attached-file URLs: either the bare token
/// or `USER_FILE_NAME_1`, `USER_FILE_NAME_2`, ... matching upload order.
pub const FILE_NAME_TOKEN: &str = "USER_FILE_NAME";

const DEFAULT_TITLE: &str = "Azure Maps Sample";
const DEFAULT_DESCRIPTION: &str = "Azure Maps Sample Description";

/// Which reply format the generation model was instructed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockScheme {
    /// `<code-html>`, `<code-css>`, `<code-js>`, `<sample-title>`,
    /// `<sample-description>`, `<follow-up>` sections.
    TagDelimited,
    /// One ``` fence holding a complete HTML document; `<follow-up>`
    /// may still appear as a tag.
    SingleFence,
}

impl FromStr for BlockScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tags" | "tag-delimited" => Ok(BlockScheme::TagDelimited),
            "fence" | "single-fence" => Ok(BlockScheme::SingleFence),
            other => Err(format!("unknown block scheme: {other}")),
        }
    }
}

/// Slots extracted from one assistant reply.
///
/// `explanation` always holds the reply text with every recognized span
/// deleted and surrounding whitespace trimmed, so the slots partition
/// the reply losslessly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedBlocks {
    pub html: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub followup: Option<String>,
    pub explanation: String,
}

impl ExtractedBlocks {
    /// Whether any deliverable code slot was produced.
    pub fn has_code(&self) -> bool {
        self.html.is_some() || self.css.is_some() || self.js.is_some()
    }
}

struct TagPatterns {
    html: Regex,
    css: Regex,
    js: Regex,
    title: Regex,
    description: Regex,
    followup: Regex,
}

impl TagPatterns {
    fn all(&self) -> [&Regex; 6] {
        [
            &self.html,
            &self.css,
            &self.js,
            &self.title,
            &self.description,
            &self.followup,
        ]
    }
}

// Non-greedy so the first opening marker pairs with the nearest closing
// marker; (?s) so blocks span lines.
fn tag_regex(name: &str) -> Regex {
    Regex::new(&format!("(?s)<{name}>(.*?)</{name}>")).expect("invalid tag regex")
}

static TAG_PATTERNS: LazyLock<TagPatterns> = LazyLock::new(|| TagPatterns {
    html: tag_regex("code-html"),
    css: tag_regex("code-css"),
    js: tag_regex("code-js"),
    title: tag_regex("sample-title"),
    description: tag_regex("sample-description"),
    followup: tag_regex("follow-up"),
});

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[a-zA-Z]*\n?(.*?)```").expect("invalid fence regex"));

static FILE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"USER_FILE_NAME(?:_(\d+))?").expect("invalid token regex"));

/// Extract the slot triple from one assistant reply.
pub fn extract_blocks(reply: &str, scheme: BlockScheme) -> ExtractedBlocks {
    match scheme {
        BlockScheme::TagDelimited => extract_tag_delimited(reply),
        BlockScheme::SingleFence => extract_single_fence(reply),
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_tag_delimited(reply: &str) -> ExtractedBlocks {
    let patterns = &*TAG_PATTERNS;

    let mut explanation = reply.to_string();
    for re in patterns.all() {
        explanation = re.replace_all(&explanation, "").into_owned();
    }

    ExtractedBlocks {
        html: first_capture(&patterns.html, reply),
        css: first_capture(&patterns.css, reply),
        js: first_capture(&patterns.js, reply),
        title: first_capture(&patterns.title, reply),
        description: first_capture(&patterns.description, reply),
        followup: first_capture(&patterns.followup, reply),
        explanation: explanation.trim().to_string(),
    }
}

fn extract_single_fence(reply: &str) -> ExtractedBlocks {
    let followup_re = &TAG_PATTERNS.followup;

    let explanation = FENCE_RE.replace(reply, "");
    let explanation = followup_re.replace_all(&explanation, "");

    ExtractedBlocks {
        html: first_capture(&FENCE_RE, reply),
        followup: first_capture(followup_re, reply),
        explanation: explanation.trim().to_string(),
        ..Default::default()
    }
}

/// Turn extracted slots into a complete HTML document, or `None` when
/// no code slot was produced.
///
/// Under the tag-delimited scheme the slots are interpolated into the
/// skeleton template by its named placeholders; under the single-fence
/// scheme the fence content already is the document.
pub fn materialize_document(
    blocks: &ExtractedBlocks,
    scheme: BlockScheme,
    html_skeleton: &str,
    css_base: &str,
) -> Option<String> {
    match scheme {
        BlockScheme::SingleFence => blocks.html.clone(),
        BlockScheme::TagDelimited => {
            if !blocks.has_code() {
                return None;
            }

            let css = match &blocks.css {
                Some(css) => format!("{css_base}\n{css}"),
                None => css_base.to_string(),
            };
            let style = format!("<style>\n{css}\n</style>");
            let script = blocks
                .js
                .as_ref()
                .map(|js| format!("<script>\n{js}\n</script>"))
                .unwrap_or_default();

            Some(
                html_skeleton
                    .replace("{title}", blocks.title.as_deref().unwrap_or(DEFAULT_TITLE))
                    .replace(
                        "{description}",
                        blocks.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION),
                    )
                    .replace("{css}", &style)
                    .replace("{js}", &script)
                    .replace("{html}", blocks.html.as_deref().unwrap_or_default()),
            )
        }
    }
}

/// Replace placeholder tokens in an assembled document.
///
/// The subscription-key token becomes `subscription_key`. File tokens
/// resolve against `file_names` in upload order: `USER_FILE_NAME_3` is
/// the third attached file, the bare token is the first. A token whose
/// index has no matching file is left verbatim.
pub fn substitute_placeholders(
    document: &str,
    subscription_key: &str,
    file_base_url: &str,
    file_names: &[String],
) -> String {
    let keyed = document.replace(SUBSCRIPTION_KEY_TOKEN, subscription_key);

    FILE_TOKEN_RE
        .replace_all(&keyed, |caps: &Captures| {
            let name = match caps.get(1) {
                None => file_names.first(),
                Some(index) => index
                    .as_str()
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| file_names.get(i)),
            };
            match name {
                Some(name) => file_url(file_base_url, name),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn file_url(base_url: &str, file_name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), file_name)
}

//! Input cleaning by content kind.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::value::{as_text, to_int};

/// Cleans submitted values.
pub trait Sanitizer: Send + Sync {
    /// Cleans a value according to a kind tag such as `int`, `word` or
    /// `html`. Unknown kinds strip all markup.
    fn clean(&self, value: &Value, kind: &str) -> Value;

    /// Keeps only block and text level tags that are safe to echo back.
    fn safe_html(&self, value: &Value) -> Value;
}

static INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?[0-9]+").expect("valid regex"));
static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").expect("valid regex"));
static NOT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[^A-Z_]").expect("valid regex"));
static NOT_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[^A-Z0-9]").expect("valid regex"));
static NOT_CMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[^A-Z0-9_.\-]").expect("valid regex"));
static NOT_BASE64: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[^A-Z0-9/+=]").expect("valid regex"));
static PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+[A-Za-z0-9_.-]*(?:[\\/][A-Za-z0-9_-]+[A-Za-z0-9_.-]*)*$")
        .expect("valid regex")
});
static USERNAME_BANNED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\x00-\x1F\x7F<>"'%&]"#).expect("valid regex"));
static DANGEROUS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|iframe|object|embed|applet|noscript)\b[^>]*>.*?</(?:script|style|iframe|object|embed|applet|noscript)\s*>")
        .expect("valid regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<\s*(/?)\s*([A-Za-z][A-Za-z0-9]*)([^>]*)>").expect("valid regex")
});
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*("[^"]*"|'[^']*'|[^\s>"']+)"#)
        .expect("valid regex")
});
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid regex"));

/// Tags kept by [`InputFilter::safe_html`].
pub const SAFE_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "cite", "code", "dd", "del", "div", "dl",
    "dt", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "ins", "li", "ol", "p",
    "pre", "q", "s", "small", "span", "strong", "sub", "sup", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "u", "ul",
];

/// The default [`Sanitizer`].
#[derive(Debug, Clone)]
pub struct InputFilter {
    safe_tags: Vec<String>,
}

impl Default for InputFilter {
    fn default() -> Self {
        Self {
            safe_tags: SAFE_TAGS.iter().map(|tag| (*tag).to_string()).collect(),
        }
    }
}

impl InputFilter {
    /// Creates a filter with the default safe tag list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the list of tags kept by `safe_html`.
    #[must_use]
    pub fn safe_tags(mut self, tags: &[&str]) -> Self {
        self.safe_tags = tags.iter().map(|tag| tag.to_ascii_lowercase()).collect();
        self
    }

    fn clean_text(&self, text: &str, kind: &str) -> Value {
        match kind {
            "int" | "integer" => INT
                .find(text)
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .unwrap_or_default()
                .into(),
            "uint" => INT
                .find(text)
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .unwrap_or_default()
                .unsigned_abs()
                .into(),
            "float" | "double" => FLOAT
                .find(text)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or_default()
                .into(),
            "bool" | "boolean" => Value::Bool(!text.is_empty() && text != "0"),
            "word" => NOT_WORD.replace_all(text, "").into_owned().into(),
            "alnum" => NOT_ALNUM.replace_all(text, "").into_owned().into(),
            "cmd" => NOT_CMD
                .replace_all(text, "")
                .trim_start_matches('.')
                .to_string()
                .into(),
            "base64" => NOT_BASE64.replace_all(text, "").into_owned().into(),
            "path" => {
                if PATH.is_match(text) {
                    text.into()
                } else {
                    String::new().into()
                }
            }
            "username" => USERNAME_BANNED.replace_all(text, "").into_owned().into(),
            _ => strip_tags(&decode_entities(text)).into(),
        }
    }

    fn keep_safe_tags(&self, text: &str) -> String {
        let without_blocks = DANGEROUS_BLOCK.replace_all(text, "");
        TAG.replace_all(&without_blocks, |caps: &Captures<'_>| {
            let closing = &caps[1];
            let tag = caps[2].to_ascii_lowercase();
            if !self.safe_tags.iter().any(|safe| *safe == tag) {
                return String::new();
            }
            if !closing.is_empty() {
                return format!("</{tag}>");
            }
            let rest = &caps[3];
            let self_closing = if rest.trim_end().ends_with('/') { " /" } else { "" };
            format!("<{tag}{}{self_closing}>", safe_attributes(rest))
        })
        .into_owned()
    }
}

impl Sanitizer for InputFilter {
    fn clean(&self, value: &Value, kind: &str) -> Value {
        let kind = kind.to_ascii_lowercase();
        match (kind.as_str(), value) {
            ("raw", _) => value.clone(),
            ("array", Value::Array(_)) => value.clone(),
            ("array", Value::Null) => Value::Array(Vec::new()),
            ("array", _) => Value::Array(vec![value.clone()]),
            ("int" | "integer", Value::Number(_) | Value::Bool(_)) => to_int(value).into(),
            ("bool" | "boolean", Value::Bool(_)) => value.clone(),
            (_, Value::Array(items)) => {
                Value::Array(items.iter().map(|item| self.clean(item, &kind)).collect())
            }
            (_, Value::Object(map)) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.clean(item, &kind)))
                    .collect(),
            ),
            (_, Value::Null) => Value::Null,
            _ => self.clean_text(&as_text(value), &kind),
        }
    }

    fn safe_html(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.keep_safe_tags(text)),
            Value::Array(items) => Value::Array(items.iter().map(|item| self.safe_html(item)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.safe_html(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

fn safe_attributes(raw: &str) -> String {
    let mut out = String::new();
    for caps in ATTRIBUTE.captures_iter(raw) {
        let name = caps[1].to_ascii_lowercase();
        if name.starts_with("on") || name == "style" {
            continue;
        }
        let value = caps[2].trim_matches(|ch| ch == '"' || ch == '\'');
        let compact: String = value
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if compact.starts_with("javascript:") || compact.starts_with("vbscript:") {
            continue;
        }
        out.push_str(&format!(r#" {name}="{}""#, value.replace('"', "&quot;")));
    }
    out
}

fn strip_tags(text: &str) -> String {
    let without_blocks = DANGEROUS_BLOCK.replace_all(text, "");
    ANY_TAG.replace_all(&without_blocks, "").into_owned()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

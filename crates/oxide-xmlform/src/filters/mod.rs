//! Value filters applied before data is stored.
//!
//! A field's `filter` attribute selects the filter. The built-in names
//! (`UNSET`, `RAW`, `INT_ARRAY`, `SAFEHTML`, `URL`, `TEL`) match
//! case-insensitively. Any other name is looked up in the
//! [`FilterRegistry`]: `Type::method` names first, then plain function
//! names. Names that are not registered are passed to the [`Sanitizer`]
//! as a cleaning kind.

pub mod phone;
mod sanitize;
pub mod url;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

pub use sanitize::{InputFilter, Sanitizer, SAFE_TAGS};

use crate::context::FormContext;
use crate::schema::Element;
use crate::value::{as_text, is_empty, to_int};

/// An externally supplied filter.
pub trait Filter: Send + Sync {
    /// Filters a raw value.
    fn filter(&self, value: &Value) -> Value;
}

impl<F> Filter for F
where
    F: Fn(&Value) -> Value + Send + Sync,
{
    fn filter(&self, value: &Value) -> Value {
        self(value)
    }
}

/// Named filters available to the `filter` attribute.
///
/// Names of the form `Type::method` and plain function names are kept
/// apart so that lookup follows the same order as dispatch.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    methods: HashMap<String, Arc<dyn Filter>>,
    functions: HashMap<String, Arc<dyn Filter>>,
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.methods.keys().chain(self.functions.keys()).collect();
        names.sort();
        f.debug_struct("FilterRegistry").field("filters", &names).finish()
    }
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a filter under an exact name, such as `Content::slug` or
    /// `trim`.
    pub fn register(&mut self, name: impl Into<String>, filter: impl Filter + 'static) {
        let name = name.into();
        let filter: Arc<dyn Filter> = Arc::new(filter);
        if name.contains("::") {
            self.methods.insert(name, filter);
        } else {
            self.functions.insert(name, filter);
        }
    }

    /// Resolves a filter name: `Type::method` names first, then functions.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        if name.contains("::") {
            if let Some(filter) = self.methods.get(name) {
                return Some(filter);
            }
        }
        self.functions.get(name)
    }
}

/// Filters with built-in behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFilter {
    /// Discards the value.
    Unset,
    /// Keeps the value untouched.
    Raw,
    /// Casts to a list of integers.
    IntArray,
    /// Keeps only safe markup.
    SafeHtml,
    /// Canonicalizes a URL.
    Url,
    /// Normalizes a phone number.
    Tel,
}

impl BuiltinFilter {
    /// Matches a filter name case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "UNSET" => Some(Self::Unset),
            "RAW" => Some(Self::Raw),
            "INT_ARRAY" => Some(Self::IntArray),
            "SAFEHTML" => Some(Self::SafeHtml),
            "URL" => Some(Self::Url),
            "TEL" => Some(Self::Tel),
            _ => None,
        }
    }
}

/// Applies the filter declared on `element` to `value`.
///
/// Filters never fail. An empty value for the `URL` filter yields
/// `Value::Bool(false)`.
pub fn filter_value(context: &FormContext, element: Element<'_>, value: &Value) -> Value {
    let name = element.attr("filter").unwrap_or_default();

    match BuiltinFilter::from_name(name) {
        Some(BuiltinFilter::Unset) => Value::Null,
        Some(BuiltinFilter::Raw) => value.clone(),
        Some(BuiltinFilter::IntArray) => int_array(value),
        Some(BuiltinFilter::SafeHtml) => context.sanitizer().safe_html(value),
        Some(BuiltinFilter::Url) => filter_url(context, element, value),
        Some(BuiltinFilter::Tel) => Value::String(phone::normalize(&as_text(value))),
        None => match context.filters().get(name) {
            Some(filter) => filter.filter(value),
            None => context.sanitizer().clean(value, name),
        },
    }
}

fn int_array(value: &Value) -> Value {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        other => vec![other],
    };
    Value::Array(items.into_iter().map(|item| to_int(item).into()).collect())
}

fn filter_url(context: &FormContext, element: Element<'_>, value: &Value) -> Value {
    if is_empty(value) || value.is_array() || value.is_object() {
        return Value::Bool(false);
    }
    let cleaned = as_text(&context.sanitizer().clean(value, "html"));
    Value::String(url::canonicalize(
        cleaned.trim(),
        element.attr("type") == Some("url"),
        element.flag("relative"),
        context.site(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaTree;
    use serde_json::json;

    fn apply(context: &FormContext, field: &str, value: Value) -> Value {
        let tree = SchemaTree::parse(&format!("<form>{field}</form>")).unwrap();
        let id = tree.children(tree.root())[0];
        filter_value(context, tree.element(id), &value)
    }

    #[test]
    fn test_builtin_names_are_case_insensitive() {
        assert_eq!(BuiltinFilter::from_name("safeHtml"), Some(BuiltinFilter::SafeHtml));
        assert_eq!(BuiltinFilter::from_name("int_array"), Some(BuiltinFilter::IntArray));
        assert_eq!(BuiltinFilter::from_name("trim"), None);
    }

    #[test]
    fn test_unset_and_raw() {
        let context = FormContext::new();
        assert_eq!(apply(&context, r#"<field name="a" filter="unset"/>"#, json!("x")), Value::Null);
        assert_eq!(
            apply(&context, r#"<field name="a" filter="raw"/>"#, json!("<b>x</b>")),
            json!("<b>x</b>")
        );
    }

    #[test]
    fn test_default_filter_strips_tags() {
        let context = FormContext::new();
        assert_eq!(apply(&context, r#"<field name="a"/>"#, json!("<b>x</b>")), json!("x"));
    }

    #[test]
    fn test_int_array() {
        let context = FormContext::new();
        let field = r#"<field name="a" filter="INT_ARRAY"/>"#;
        assert_eq!(apply(&context, field, json!(["1", "2x", 3.7])), json!([1, 2, 3]));
        assert_eq!(apply(&context, field, json!({"a": "4"})), json!([4]));
        assert_eq!(apply(&context, field, json!("5")), json!([5]));
    }

    #[test]
    fn test_url() {
        let context = FormContext::new();
        let field = r#"<field name="a" type="url" filter="url"/>"#;
        assert_eq!(apply(&context, field, json!("")), json!(false));
        assert_eq!(apply(&context, field, json!(" example.com ")), json!("http://example.com"));
        assert_eq!(
            apply(&context, field, json!("<b>example.com</b>")),
            json!("http://example.com")
        );
    }

    #[test]
    fn test_tel() {
        let context = FormContext::new();
        let field = r#"<field name="a" filter="tel"/>"#;
        assert_eq!(apply(&context, field, json!("555-123-4567")), json!("1.5551234567"));
        assert_eq!(apply(&context, field, json!(12345678)), json!(".12345678"));
    }

    #[test]
    fn test_registered_filters() {
        let context = FormContext::builder()
            .filter("Text::upper", |value: &Value| json!(as_text(value).to_uppercase()))
            .filter("trim", |value: &Value| json!(as_text(value).trim()))
            .build();

        assert_eq!(
            apply(&context, r#"<field name="a" filter="Text::upper"/>"#, json!("abc")),
            json!("ABC")
        );
        assert_eq!(apply(&context, r#"<field name="a" filter="trim"/>"#, json!("  x ")), json!("x"));
        assert_eq!(
            apply(&context, r#"<field name="a" filter="Missing::call"/>"#, json!("<i>7</i>")),
            json!("7")
        );
        assert_eq!(apply(&context, r#"<field name="a" filter="int"/>"#, json!("42abc")), json!(42));
    }
}

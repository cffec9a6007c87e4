//! Built-in validation rules.
//!
//! A value that is blank passes every rule: whether a field must be filled
//! in is decided by its `required` attribute alone.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{FailureKind, Rule, RuleOutcome, ValidationFailure};
use crate::data::{data_key, lookup_path};
use crate::filters::{phone, url};
use crate::form::Form;
use crate::schema::Element;
use crate::value::{as_text, is_blank};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});
static COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex")
});

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !is_blank(Some(*value)))
}

/// Accepts e-mail addresses; with `multiple` set, a comma-separated list.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailRule;

impl Rule for EmailRule {
    fn test(
        &self,
        element: Element<'_>,
        value: Option<&Value>,
        _group: Option<&str>,
        _input: &Value,
        _form: &Form,
    ) -> RuleOutcome {
        let Some(value) = present(value) else {
            return RuleOutcome::Valid;
        };
        let text = as_text(value);
        let valid = if element.flag("multiple") {
            text.split(',').all(|address| EMAIL.is_match(address.trim()))
        } else {
            EMAIL.is_match(&text)
        };
        valid.into()
    }
}

/// Accepts URLs with a scheme and something after it.
///
/// A `schemes` attribute restricts the accepted schemes (comma-separated).
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlRule;

impl Rule for UrlRule {
    fn test(
        &self,
        element: Element<'_>,
        value: Option<&Value>,
        _group: Option<&str>,
        _input: &Value,
        _form: &Form,
    ) -> RuleOutcome {
        let Some(value) = present(value) else {
            return RuleOutcome::Valid;
        };
        let text = as_text(value);
        let Some(scheme) = url::scheme(&text) else {
            return RuleOutcome::Invalid;
        };
        let rest = text[scheme.len() + 1..].trim_start_matches('/');
        if rest.is_empty() {
            return RuleOutcome::Invalid;
        }
        match element.non_empty_attr("schemes") {
            Some(schemes) => schemes
                .split(',')
                .any(|allowed| allowed.trim().eq_ignore_ascii_case(scheme))
                .into(),
            None => RuleOutcome::Valid,
        }
    }
}

/// Accepts phone numbers of the numbering plan named by `plan`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelRule;

impl Rule for TelRule {
    fn test(
        &self,
        element: Element<'_>,
        value: Option<&Value>,
        _group: Option<&str>,
        _input: &Value,
        _form: &Form,
    ) -> RuleOutcome {
        match present(value) {
            Some(value) => phone::matches_plan(&as_text(value), element.non_empty_attr("plan")).into(),
            None => RuleOutcome::Valid,
        }
    }
}

/// Accepts `0`, `1`, `true` and `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanRule;

impl Rule for BooleanRule {
    fn test(
        &self,
        _element: Element<'_>,
        value: Option<&Value>,
        _group: Option<&str>,
        _input: &Value,
        _form: &Form,
    ) -> RuleOutcome {
        match present(value) {
            None | Some(Value::Bool(_)) => RuleOutcome::Valid,
            Some(Value::Number(number)) => matches!(number.as_i64(), Some(0 | 1)).into(),
            Some(other) => {
                let text = as_text(other).to_ascii_lowercase();
                matches!(text.as_str(), "0" | "1" | "true" | "false").into()
            }
        }
    }
}

/// Accepts hex colors, `#rgb` or `#rrggbb`, with or without the `#`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorRule;

impl Rule for ColorRule {
    fn test(
        &self,
        _element: Element<'_>,
        value: Option<&Value>,
        _group: Option<&str>,
        _input: &Value,
        _form: &Form,
    ) -> RuleOutcome {
        match present(value) {
            Some(value) => COLOR.is_match(as_text(value).trim()).into(),
            None => RuleOutcome::Valid,
        }
    }
}

/// Requires the value to equal the field named by the `field` attribute in
/// the same group.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualsRule;

impl Rule for EqualsRule {
    fn test(
        &self,
        element: Element<'_>,
        value: Option<&Value>,
        group: Option<&str>,
        input: &Value,
        _form: &Form,
    ) -> RuleOutcome {
        let Some(other) = element.non_empty_attr("field") else {
            return RuleOutcome::Failed(ValidationFailure::new(
                FailureKind::Rule,
                element.key(),
                format!("Rule 'equals' on field '{}' needs a 'field' attribute", element.name()),
            ));
        };
        let other_value = lookup_path(input, &data_key(group, other));
        let mine = value.map(as_text).unwrap_or_default();
        let theirs = other_value.map(as_text).unwrap_or_default();
        (mine == theirs).into()
    }
}

/// Requires every submitted value to be one of the `<option value>`
/// children of the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionsRule;

impl Rule for OptionsRule {
    fn test(
        &self,
        element: Element<'_>,
        value: Option<&Value>,
        _group: Option<&str>,
        _input: &Value,
        _form: &Form,
    ) -> RuleOutcome {
        let Some(value) = present(value) else {
            return RuleOutcome::Valid;
        };
        let allowed: Vec<&str> = element
            .children_named("option")
            .map(|option| option.option_value())
            .collect();
        let is_allowed = |item: &Value| allowed.contains(&as_text(item).as_str());
        match value {
            Value::Array(items) => items.iter().all(is_allowed).into(),
            other => is_allowed(other).into(),
        }
    }
}

/// Matches the whole value against the regular expression in `pattern`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexRule;

impl Rule for RegexRule {
    fn test(
        &self,
        element: Element<'_>,
        value: Option<&Value>,
        _group: Option<&str>,
        _input: &Value,
        _form: &Form,
    ) -> RuleOutcome {
        let Some(value) = present(value) else {
            return RuleOutcome::Valid;
        };
        let Some(pattern) = element.non_empty_attr("pattern") else {
            return RuleOutcome::Valid;
        };
        match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(regex) => regex.is_match(&as_text(value)).into(),
            Err(err) => RuleOutcome::Failed(ValidationFailure::new(
                FailureKind::Rule,
                element.key(),
                format!("Invalid pattern on field '{}': {err}", element.name()),
            )),
        }
    }
}

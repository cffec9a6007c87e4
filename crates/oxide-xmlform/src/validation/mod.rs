//! Per-field validation.
//!
//! Every field in scope goes through two checks: a required check and,
//! when the field names one in its `validate` attribute, a rule check.
//! Failures are collected as [`ValidationFailure`] records; a rule that is
//! not registered is a configuration error and stops the pass.

mod rules;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

pub use rules::{
    BooleanRule, ColorRule, EmailRule, EqualsRule, OptionsRule, RegexRule, TelRule, UrlRule,
};

use crate::form::Form;
use crate::schema::Element;
use crate::text::{Text, FIELD_INVALID, FIELD_REQUIRED, RULE_MISSING};
use crate::value::is_blank;

/// What kind of check a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A required field had no value.
    Required,
    /// A rule rejected the value.
    Invalid,
    /// A rule reported its own failure.
    Rule,
    /// The field names a rule that is not registered.
    RuleMissing,
}

/// One recorded validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// What failed.
    pub kind: FailureKind,
    /// Data key of the field (`group.name`).
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationFailure {
    /// Creates a failure record.
    pub fn new(kind: FailureKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of a rule test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The value passes.
    Valid,
    /// The value is rejected; the engine builds the message.
    Invalid,
    /// The value is rejected with a rule-specific failure.
    Failed(ValidationFailure),
}

impl From<bool> for RuleOutcome {
    fn from(valid: bool) -> Self {
        if valid {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}

/// A named validation rule.
pub trait Rule: Send + Sync {
    /// Tests the value of the field `element`.
    ///
    /// `value` is the field's entry in `input`, `group` its group path.
    fn test(
        &self,
        element: Element<'_>,
        value: Option<&Value>,
        group: Option<&str>,
        input: &Value,
        form: &Form,
    ) -> RuleOutcome;
}

/// Rules available to the `validate` attribute.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn Rule>>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.rules.keys().collect();
        names.sort();
        f.debug_struct("RuleRegistry").field("rules", &names).finish()
    }
}

impl RuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in rules.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("email", EmailRule);
        registry.register("url", UrlRule);
        registry.register("tel", TelRule);
        registry.register("boolean", BooleanRule);
        registry.register("color", ColorRule);
        registry.register("equals", EqualsRule);
        registry.register("options", OptionsRule);
        registry.register("regex", RegexRule);
        registry
    }

    /// Registers a rule, replacing any rule of the same name.
    pub fn register(&mut self, name: impl Into<String>, rule: impl Rule + 'static) {
        self.rules.insert(name.into().to_ascii_lowercase(), Arc::new(rule));
    }

    /// Looks a rule up by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.get(&name.to_ascii_lowercase())
    }

    /// Returns whether a rule is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Returns whether a field's `required` attribute is set.
pub fn is_required(element: Element<'_>) -> bool {
    matches!(element.attr("required"), Some("true" | "required"))
}

/// Translated label of a field, falling back to its name.
pub(crate) fn field_label(element: Element<'_>, text: Text<'_>) -> String {
    match element.non_empty_attr("label") {
        Some(label) => text.translate(label),
        None => element.name().to_string(),
    }
}

/// Runs both checks for one field.
///
/// `Ok(())` means the field passed. A failure of kind
/// [`FailureKind::RuleMissing`] means the pass must stop.
pub(crate) fn validate_field(
    form: &Form,
    element: Element<'_>,
    group: Option<&str>,
    value: Option<&Value>,
    input: &Value,
) -> Result<(), ValidationFailure> {
    let text = form.context().text();
    let key = element.key();

    if is_required(element) && is_blank(value) {
        let label = field_label(element, text);
        return Err(ValidationFailure::new(
            FailureKind::Required,
            key,
            text.sprintf(FIELD_REQUIRED, &[label.as_str()]),
        ));
    }

    let Some(rule_name) = element.non_empty_attr("validate") else {
        return Ok(());
    };
    let Some(rule) = form.context().rules().get(rule_name) else {
        warn!(rule = rule_name, field = %key, "validation rule is not registered");
        return Err(ValidationFailure::new(
            FailureKind::RuleMissing,
            key,
            text.sprintf(RULE_MISSING, &[rule_name]),
        ));
    };

    match rule.test(element, value, group, input, form) {
        RuleOutcome::Valid => Ok(()),
        RuleOutcome::Failed(failure) => Err(failure),
        RuleOutcome::Invalid => {
            let message = match element.non_empty_attr("message") {
                Some(message) => text.translate(message),
                None => text.sprintf(FIELD_INVALID, &[field_label(element, text).as_str()]),
            };
            Err(ValidationFailure::new(FailureKind::Invalid, key, message))
        }
    }
}

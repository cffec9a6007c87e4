//! Translation of labels and messages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Message key for a missing required value.
pub const FIELD_REQUIRED: &str = "XMLFORM_VALIDATE_FIELD_REQUIRED";
/// Message key for a value rejected by a rule.
pub const FIELD_INVALID: &str = "XMLFORM_VALIDATE_FIELD_INVALID";
/// Message key for a rule that is not registered.
pub const RULE_MISSING: &str = "XMLFORM_VALIDATE_FIELD_RULE_MISSING";

/// A translation catalogue.
pub trait Translator: Send + Sync {
    /// Translates a key. Unknown keys are returned in some readable form.
    fn translate(&self, key: &str) -> String;

    /// Returns whether the catalogue knows a key.
    fn has_key(&self, key: &str) -> bool;

    /// Toggles debug output for unknown keys and returns the previous state.
    fn set_debug(&self, debug: bool) -> bool;

    /// Translates a key and substitutes `%s` placeholders in order.
    fn sprintf(&self, key: &str, args: &[&str]) -> String {
        format_message(&self.translate(key), args)
    }
}

/// Replaces each `%s` in `format` with the next argument.
pub fn format_message(format: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut parts = format.split("%s").peekable();
    while let Some(part) = parts.next() {
        out.push_str(part);
        if parts.peek().is_some() {
            out.push_str(args.next().copied().unwrap_or_default());
        }
    }
    out
}

fn fallback(key: &str) -> Option<&'static str> {
    match key {
        FIELD_REQUIRED => Some("Field required: %s"),
        FIELD_INVALID => Some("Invalid field: %s"),
        RULE_MISSING => Some("Validation rule missing: %s"),
        _ => None,
    }
}

/// Translation access that tolerates a missing translator.
#[derive(Clone, Copy)]
pub struct Text<'a> {
    translator: Option<&'a dyn Translator>,
}

impl<'a> Text<'a> {
    /// Wraps an optional translator.
    pub fn new(translator: Option<&'a dyn Translator>) -> Self {
        Self { translator }
    }

    /// Returns the wrapped translator.
    pub fn translator(&self) -> Option<&'a dyn Translator> {
        self.translator
    }

    /// Translates a key; without a known translation the built-in English
    /// message or the key itself is used.
    pub fn translate(&self, key: &str) -> String {
        match self.translator {
            Some(translator) if translator.has_key(key) || fallback(key).is_none() => {
                translator.translate(key)
            }
            _ => fallback(key).unwrap_or(key).to_string(),
        }
    }

    /// Translates a format key and substitutes `%s` placeholders.
    pub fn sprintf(&self, key: &str, args: &[&str]) -> String {
        format_message(&self.translate(key), args)
    }
}

impl std::fmt::Debug for Text<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Text")
            .field("translator", &self.translator.is_some())
            .finish()
    }
}

/// A translator backed by an in-memory catalogue.
#[derive(Debug, Default)]
pub struct MapTranslator {
    strings: HashMap<String, String>,
    debug: AtomicBool,
}

impl MapTranslator {
    /// Creates an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a translation.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.insert(key.into(), value.into());
        self
    }
}

impl Translator for MapTranslator {
    fn translate(&self, key: &str) -> String {
        match self.strings.get(key) {
            Some(value) => value.clone(),
            None if self.debug.load(Ordering::Relaxed) => format!("??{key}??"),
            None => key.to_string(),
        }
    }

    fn has_key(&self, key: &str) -> bool {
        self.strings.contains_key(key)
    }

    fn set_debug(&self, debug: bool) -> bool {
        self.debug.swap(debug, Ordering::Relaxed)
    }
}

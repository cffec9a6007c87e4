//! Single-line, hidden and multi-line text fields.

use serde_json::Value;

use super::{html_escape, FieldBase, FieldContext, FormField};
use crate::schema::Element;

/// An `<input>` of a text-like type (text, password, email, url, tel).
#[derive(Debug, Clone)]
pub struct TextField {
    input_type: &'static str,
    base: FieldBase,
}

impl TextField {
    /// Creates a field rendering `<input type="{input_type}">`.
    pub fn new(input_type: &'static str) -> Self {
        Self {
            input_type,
            base: FieldBase::default(),
        }
    }

    /// Returns the HTML input type.
    pub fn input_type(&self) -> &str {
        self.input_type
    }
}

impl Default for TextField {
    fn default() -> Self {
        Self::new("text")
    }
}

impl FormField for TextField {
    fn setup(
        &mut self,
        context: FieldContext<'_>,
        element: Element<'_>,
        value: &Value,
        group: Option<&str>,
    ) -> bool {
        self.base = FieldBase::from_element(context, element, value, group);
        true
    }

    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn input(&self) -> String {
        // Passwords are never echoed back.
        let value_attr = if self.input_type == "password" {
            String::new()
        } else {
            format!(r#" value="{}""#, html_escape(&self.base.value_text()))
        };
        format!(
            r#"<input type="{}" class="{}" id="{}" name="{}"{value_attr}{}>"#,
            self.input_type,
            self.base.css_class("form-control"),
            self.base.id,
            self.base.name,
            self.base.extra_attrs()
        )
    }
}

/// A hidden input. It has no visible label.
#[derive(Debug, Clone, Default)]
pub struct HiddenField {
    base: FieldBase,
}

impl FormField for HiddenField {
    fn setup(
        &mut self,
        context: FieldContext<'_>,
        element: Element<'_>,
        value: &Value,
        group: Option<&str>,
    ) -> bool {
        self.base = FieldBase::from_element(context, element, value, group);
        true
    }

    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn input(&self) -> String {
        format!(
            r#"<input type="hidden" id="{}" name="{}" value="{}">"#,
            self.base.id,
            self.base.name,
            html_escape(&self.base.value_text())
        )
    }

    fn label(&self) -> String {
        String::new()
    }

    fn render(&self, _errors: &[String]) -> String {
        self.input()
    }
}

/// A `<textarea>`; `rows` and `cols` come from the schema.
#[derive(Debug, Clone)]
pub struct TextareaField {
    rows: usize,
    cols: Option<usize>,
    base: FieldBase,
}

impl Default for TextareaField {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: None,
            base: FieldBase::default(),
        }
    }
}

impl FormField for TextareaField {
    fn setup(
        &mut self,
        context: FieldContext<'_>,
        element: Element<'_>,
        value: &Value,
        group: Option<&str>,
    ) -> bool {
        self.base = FieldBase::from_element(context, element, value, group);
        if let Some(rows) = element.attr("rows").and_then(|rows| rows.parse().ok()) {
            self.rows = rows;
        }
        self.cols = element.attr("cols").and_then(|cols| cols.parse().ok());
        true
    }

    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn input(&self) -> String {
        let cols_attr = self
            .cols
            .map(|cols| format!(r#" cols="{cols}""#))
            .unwrap_or_default();
        format!(
            r#"<textarea class="{}" id="{}" name="{}" rows="{}"{cols_attr}{}>{}</textarea>"#,
            self.base.css_class("form-control"),
            self.base.id,
            self.base.name,
            self.rows,
            self.base.extra_attrs(),
            html_escape(&self.base.value_text())
        )
    }
}

//! Checkbox and option list fields.

use serde_json::Value;

use super::{html_escape, FieldBase, FieldContext, FormField};
use crate::schema::Element;
use crate::value::as_text;

/// A single checkbox. Checked when the current value equals the `value`
/// attribute (default `1`).
#[derive(Debug, Clone, Default)]
pub struct CheckboxField {
    checked_value: String,
    base: FieldBase,
}

impl CheckboxField {
    /// Returns whether the box is checked.
    pub fn is_checked(&self) -> bool {
        self.base.value_text() == self.checked_value
    }
}

impl FormField for CheckboxField {
    fn setup(
        &mut self,
        context: FieldContext<'_>,
        element: Element<'_>,
        value: &Value,
        group: Option<&str>,
    ) -> bool {
        self.base = FieldBase::from_element(context, element, value, group);
        self.checked_value = element.non_empty_attr("value").unwrap_or("1").to_string();
        true
    }

    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn input(&self) -> String {
        let checked_attr = if self.is_checked() { " checked" } else { "" };
        format!(
            r#"<div class="form-check"><input class="{}" type="checkbox" id="{}" name="{}" value="{}"{checked_attr}{}></div>"#,
            self.base.css_class("form-check-input"),
            self.base.id,
            self.base.name,
            html_escape(&self.checked_value),
            self.base.extra_attrs()
        )
    }
}

/// A `<select>` built from the `<option>` children of the field.
#[derive(Debug, Clone, Default)]
pub struct ListField {
    options: Vec<(String, String)>,
    base: FieldBase,
}

impl ListField {
    /// Returns the `(value, label)` pairs in declaration order.
    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    fn is_selected(&self, option: &str) -> bool {
        match &self.base.value {
            Value::Array(items) => items.iter().any(|item| as_text(item) == option),
            other => as_text(other) == option,
        }
    }
}

impl FormField for ListField {
    fn setup(
        &mut self,
        context: FieldContext<'_>,
        element: Element<'_>,
        value: &Value,
        group: Option<&str>,
    ) -> bool {
        self.base = FieldBase::from_element(context, element, value, group);
        let text = context.text();
        self.options = element
            .children_named("option")
            .map(|option| {
                let label = text.translate(option.text().trim());
                (option.option_value().to_string(), label)
            })
            .collect();
        true
    }

    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn input(&self) -> String {
        let mut options = String::new();
        for (value, label) in &self.options {
            let selected_attr = if self.is_selected(value) { " selected" } else { "" };
            options.push_str(&format!(
                r#"<option value="{}"{selected_attr}>{}</option>"#,
                html_escape(value),
                html_escape(label)
            ));
        }
        let multiple_attr = if self.base.multiple { " multiple" } else { "" };
        format!(
            r#"<select class="{}" id="{}" name="{}"{multiple_attr}{}>{options}</select>"#,
            self.base.css_class("form-select"),
            self.base.id,
            self.base.name,
            self.base.extra_attrs()
        )
    }
}

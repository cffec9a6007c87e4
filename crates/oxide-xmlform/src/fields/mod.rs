//! Field instances built from schema nodes.
//!
//! A [`FieldType`] creates a blank [`FormField`]; the factory then calls
//! [`FormField::setup`] with the schema node, the resolved value and the
//! group path. Built-in types render Bootstrap 5 markup.

mod choice;
mod text;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ironhtml::html;
use ironhtml::typed::Element as HtmlElement;
use ironhtml_elements::Div;
use serde_json::Value;
use tracing::warn;

pub use choice::{CheckboxField, ListField};
pub use text::{HiddenField, TextField, TextareaField};

use crate::form::Form;
use crate::schema::Element;
use crate::text::{Text, Translator};
use crate::validation::{field_label, is_required};
use crate::value::as_text;

/// Attributes copied onto the rendered input when present.
const PASSTHROUGH: &[&str] = &["placeholder", "maxlength", "size", "pattern", "autocomplete"];

/// What a field gets injected during setup.
#[derive(Clone, Copy)]
pub struct FieldContext<'a> {
    /// The owning form.
    pub form: &'a Form,
    /// The translator, when one is installed.
    pub translator: Option<&'a dyn Translator>,
}

impl<'a> FieldContext<'a> {
    /// Translation access that tolerates a missing translator.
    pub fn text(&self) -> Text<'a> {
        Text::new(self.translator)
    }
}

impl fmt::Debug for FieldContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldContext")
            .field("form", &self.form.name())
            .field("translator", &self.translator.is_some())
            .finish()
    }
}

/// A renderable field.
pub trait FormField: Send + Sync {
    /// Prepares the field from its schema node. Returning `false` rejects
    /// the node.
    fn setup(
        &mut self,
        context: FieldContext<'_>,
        element: Element<'_>,
        value: &Value,
        group: Option<&str>,
    ) -> bool;

    /// Shared state filled in by `setup`.
    fn base(&self) -> &FieldBase;

    /// Markup of the input control.
    fn input(&self) -> String;

    /// Markup of the label.
    fn label(&self) -> String {
        self.base().label_html()
    }

    /// HTML id of the input.
    fn id(&self) -> &str {
        &self.base().id
    }

    /// Input name, e.g. `jform[params][title]`.
    fn name(&self) -> &str {
        &self.base().name
    }

    /// Field name as declared in the schema.
    fn field_name(&self) -> &str {
        &self.base().field_name
    }

    /// Group path of the field.
    fn group(&self) -> Option<&str> {
        self.base().group.as_deref()
    }

    /// Current value.
    fn value(&self) -> &Value {
        &self.base().value
    }

    /// Renders label, input, errors and description as one block.
    fn render(&self, errors: &[String]) -> String {
        render_field(self.label(), self.input(), self.base().description.clone(), errors)
    }
}

impl fmt::Debug for dyn FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormField")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("value", self.value())
            .finish_non_exhaustive()
    }
}

/// State every built-in field type shares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBase {
    /// Field name as declared.
    pub field_name: String,
    /// Dot-joined group path.
    pub group: Option<String>,
    /// HTML id.
    pub id: String,
    /// Input name.
    pub name: String,
    /// Translated label text.
    pub label: String,
    /// Translated description.
    pub description: Option<String>,
    /// Whether the field must be filled in.
    pub required: bool,
    /// Whether the field takes several values.
    pub multiple: bool,
    /// Current value.
    pub value: Value,
    /// Extra attributes rendered onto the input.
    pub attributes: Vec<(String, String)>,
    /// `readonly` flag.
    pub readonly: bool,
    /// `disabled` flag.
    pub disabled: bool,
    /// Extra CSS classes.
    pub class: Option<String>,
}

impl FieldBase {
    /// Reads the common attributes of a field node.
    pub fn from_element(
        context: FieldContext<'_>,
        element: Element<'_>,
        value: &Value,
        group: Option<&str>,
    ) -> Self {
        let text = context.text();
        let field_name = element.name().to_string();
        let multiple = element.flag("multiple");
        let control = context.form.form_control();
        let group = group.filter(|group| !group.is_empty()).map(str::to_string);

        Self {
            id: field_id(control, group.as_deref(), &field_name),
            name: input_name(control, group.as_deref(), &field_name, multiple),
            label: field_label(element, text),
            description: element
                .non_empty_attr("description")
                .map(|description| text.translate(description)),
            required: is_required(element),
            multiple,
            value: value.clone(),
            attributes: PASSTHROUGH
                .iter()
                .filter_map(|name| {
                    element
                        .non_empty_attr(name)
                        .map(|value| ((*name).to_string(), value.to_string()))
                })
                .collect(),
            readonly: element.flag("readonly"),
            disabled: element.flag("disabled"),
            class: element.non_empty_attr("class").map(str::to_string),
            field_name,
            group,
        }
    }

    /// Value rendered as text.
    pub fn value_text(&self) -> String {
        as_text(&self.value)
    }

    /// `class` attribute of the control, starting with `base_class`.
    pub fn css_class(&self, base_class: &str) -> String {
        match &self.class {
            Some(extra) => format!("{base_class} {extra}"),
            None => base_class.to_string(),
        }
    }

    /// Common trailing attributes of the control, each with a leading space.
    pub fn extra_attrs(&self) -> String {
        let mut out: String = self
            .attributes
            .iter()
            .map(|(name, value)| format!(r#" {name}="{}""#, html_escape(value)))
            .collect();
        if self.required {
            out.push_str(r#" required="required""#);
        }
        if self.readonly {
            out.push_str(" readonly");
        }
        if self.disabled {
            out.push_str(" disabled");
        }
        out
    }

    /// Label markup; required fields get a ` *` marker.
    pub fn label_html(&self) -> String {
        let id = self.id.clone();
        let required_marker = if self.required { " *" } else { "" };
        let label_text = format!("{}{}", self.label, required_marker);

        html! {
            label.for_(#id).class("form-label") { #label_text }
        }
        .render()
    }
}

/// Joins form control, group path and name into an HTML id.
pub fn field_id(control: Option<&str>, group: Option<&str>, name: &str) -> String {
    let group = group.map(|group| group.replace('.', "_"));
    [control, group.as_deref(), Some(name)]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Builds the input name: `control[g1][g2][name]`, `g1[g2][name]` without a
/// control, with a trailing `[]` for multi-valued fields.
pub fn input_name(control: Option<&str>, group: Option<&str>, name: &str, multiple: bool) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(control) = control.filter(|control| !control.is_empty()) {
        parts.push(control);
    }
    if let Some(group) = group.filter(|group| !group.is_empty()) {
        parts.extend(group.split('.'));
    }
    parts.push(name);

    let mut out = parts[0].to_string();
    for part in &parts[1..] {
        out.push('[');
        out.push_str(part);
        out.push(']');
    }
    if multiple {
        out.push_str("[]");
    }
    out
}

/// Wraps label and input markup in a Bootstrap form group.
pub fn render_field(
    label: String,
    input: String,
    description: Option<String>,
    errors: &[String],
) -> String {
    html! { div.class("mb-3") }
        .raw(label)
        .raw(&input)
        .children(errors, |error, div: HtmlElement<Div>| {
            div.class("invalid-feedback d-block").text(error)
        })
        .when(description.is_some(), |d| {
            d.child::<Div, _>(|h| h.class("form-text").text(description.as_deref().unwrap_or("")))
        })
        .render()
}

/// Escapes HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Creates blank field instances.
pub trait FieldType: Send + Sync {
    /// Creates an instance ready for `setup`.
    fn create(&self) -> Box<dyn FormField>;
}

impl<F> FieldType for F
where
    F: Fn() -> Box<dyn FormField> + Send + Sync,
{
    fn create(&self) -> Box<dyn FormField> {
        self()
    }
}

/// Field types available to the `type` attribute.
#[derive(Clone, Default)]
pub struct FieldTypeRegistry {
    types: HashMap<String, Arc<dyn FieldType>>,
}

impl fmt::Debug for FieldTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.types.keys().collect();
        names.sort();
        f.debug_struct("FieldTypeRegistry").field("types", &names).finish()
    }
}

impl FieldTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for input_type in ["text", "password", "email", "url", "tel"] {
            registry.register(input_type, move || -> Box<dyn FormField> {
                Box::new(TextField::new(input_type))
            });
        }
        registry.register("hidden", || -> Box<dyn FormField> { Box::new(HiddenField::default()) });
        registry.register("textarea", || -> Box<dyn FormField> {
            Box::new(TextareaField::default())
        });
        registry.register("checkbox", || -> Box<dyn FormField> {
            Box::new(CheckboxField::default())
        });
        registry.register("list", || -> Box<dyn FormField> { Box::new(ListField::default()) });
        registry
    }

    /// Registers a type, replacing any type of the same name.
    pub fn register(&mut self, name: impl Into<String>, field_type: impl FieldType + 'static) {
        self.types.insert(name.into().to_ascii_lowercase(), Arc::new(field_type));
    }

    /// Creates an instance of a case-insensitively named type.
    pub fn create(&self, name: &str) -> Option<Box<dyn FormField>> {
        self.types
            .get(&name.to_ascii_lowercase())
            .map(|field_type| field_type.create())
    }

    /// Returns whether a type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(&name.to_ascii_lowercase())
    }
}

/// Computes the default of a field: its `default` attribute, translated
/// when `translate_default` is set and the catalogue knows the key.
fn default_value(element: Element<'_>, translator: Option<&dyn Translator>) -> Value {
    let Some(default) = element.attr("default") else {
        return Value::Null;
    };
    let translate = matches!(element.attr("translate_default"), Some("true" | "1"));
    match translator {
        Some(translator) if translate => {
            let debug = translator.set_debug(false);
            let value = if translator.has_key(default) {
                translator.translate(default)
            } else {
                default.to_string()
            };
            translator.set_debug(debug);
            Value::String(value)
        }
        _ => Value::String(default.to_string()),
    }
}

/// Instantiates the field for `element`.
///
/// Unknown types fall back to `text`. Without an explicit `value` the
/// bound value is used, falling back to the field default. Returns `None`
/// when setup rejects the node.
pub(crate) fn load_field(
    form: &Form,
    element: Element<'_>,
    group: Option<&str>,
    value: Option<&Value>,
) -> Option<Box<dyn FormField>> {
    let context = form.context();
    let type_name = element.non_empty_attr("type").unwrap_or("text");
    let mut field = match context.field_types().create(type_name) {
        Some(field) => field,
        None => {
            warn!(field = element.name(), r#type = type_name, "unknown field type, using text");
            context.field_types().create("text")?
        }
    };

    let element_group = element.group();
    let group = group.filter(|group| !group.is_empty()).or(element_group.as_deref());
    let value = match value {
        Some(value) => value.clone(),
        None => {
            let default = default_value(element, context.translator());
            form.get_value(element.name(), group, default)
        }
    };

    let field_context = FieldContext {
        form,
        translator: context.translator(),
    };
    if field.setup(field_context, element, &value, group) {
        Some(field)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_id() {
        assert_eq!(field_id(Some("jform"), Some("params.advanced"), "css"), "jform_params_advanced_css");
        assert_eq!(field_id(None, None, "title"), "title");
        assert_eq!(field_id(Some(""), Some("a"), "b"), "a_b");
    }

    #[test]
    fn test_input_name() {
        assert_eq!(input_name(Some("jform"), Some("params"), "title", false), "jform[params][title]");
        assert_eq!(input_name(None, Some("a.b"), "c", false), "a[b][c]");
        assert_eq!(input_name(None, None, "tags", true), "tags[]");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("\"test\""), "&quot;test&quot;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
    }

    #[test]
    fn test_render_field() {
        let html = render_field(
            "<label>Title</label>".to_string(),
            "<input>".to_string(),
            Some("Shown in lists".to_string()),
            &["Field required: Title".to_string()],
        );
        assert!(html.contains("mb-3"));
        assert!(html.contains("<input>"));
        assert!(html.contains("invalid-feedback"));
        assert!(html.contains("Shown in lists"));
    }

    #[test]
    fn test_builtin_types() {
        let registry = FieldTypeRegistry::with_builtins();
        for name in ["text", "hidden", "password", "email", "url", "tel", "textarea", "checkbox", "list"] {
            assert!(registry.contains(name), "{name}");
        }
        assert!(registry.create("Calendar").is_none());
    }
}

#![allow(dead_code)]

use std::sync::Arc;

use oxide_xmlform::{Form, FormContext, FormOptions, SchemaTree};

/// An article form with ungrouped, grouped and nested fields.
pub const ARTICLE: &str = r#"<form>
    <fieldset name="content" label="Content"/>
    <field name="title" type="text" label="Title" required="true" fieldset="content"/>
    <field name="alias" type="text" fieldset="content"/>
    <fields name="params">
        <field name="title" type="text" label="Browser title"/>
        <field name="website" type="url" filter="url" validate="url" fieldset="links"/>
        <fields name="advanced">
            <field name="css" type="text" filter="raw"/>
        </fields>
    </fields>
    <fields name="metadata">
        <field name="robots" type="list" default="index">
            <option value="index">Index</option>
            <option value="noindex">No index</option>
        </field>
    </fields>
</form>"#;

pub fn form(markup: &str) -> Form {
    form_with(FormContext::new(), markup)
}

pub fn form_with(context: FormContext, markup: &str) -> Form {
    let mut form = Form::new("test", FormOptions::new(), Arc::new(context));
    form.load_str(markup, true, None)
        .unwrap_or_else(|e| panic!("Failed to load: {markup}\nError: {e:?}"));
    form
}

pub fn control_form(control: &str, markup: &str) -> Form {
    let mut form = Form::new("test", FormOptions::new().control(control), Arc::new(FormContext::new()));
    form.load_str(markup, true, None)
        .unwrap_or_else(|e| panic!("Failed to load: {markup}\nError: {e:?}"));
    form
}

pub fn article() -> Form {
    form(ARTICLE)
}

pub fn parse(markup: &str) -> SchemaTree {
    SchemaTree::parse(markup).unwrap_or_else(|e| panic!("Failed to parse: {markup}\nError: {e:?}"))
}

/// Number of `<field>` nodes called `name` anywhere in the schema.
pub fn count_fields(form: &Form, name: &str) -> usize {
    let tree = form.tree().expect("form has a schema");
    tree.descendants(tree.root())
        .into_iter()
        .filter(|id| tree.is_field_named(*id, name))
        .count()
}

/// An attribute of a field, `None` when the field or attribute is missing.
pub fn field_attr(form: &Form, name: &str, group: Option<&str>, attr: &str) -> Option<String> {
    let tree = form.tree()?;
    let id = tree.find_field(name, group)?;
    tree.attr(id, attr).map(str::to_string)
}

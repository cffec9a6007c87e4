//! Tests for loading and merging schema fragments.

mod common;
use common::*;

use std::sync::Arc;

use oxide_xmlform::{Form, FormContext, FormError, FormOptions};

#[test]
fn replace_keeps_one_node_with_the_latest_attributes() {
    let mut form = article();
    form.load_str(
        r#"<form><fields name="params"><field name="title" label="Page title"/></fields></form>"#,
        true,
        None,
    )
    .unwrap();

    assert_eq!(
        field_attr(&form, "title", Some("params"), "label").as_deref(),
        Some("Page title")
    );
    assert_eq!(count_fields(&form, "title"), 2);
    // The ungrouped title is a different field.
    assert_eq!(field_attr(&form, "title", None, "label").as_deref(), Some("Title"));
}

#[test]
fn replace_preserves_document_position() {
    let mut form = form(r#"<form><field name="a"/><field name="b"/><field name="c"/></form>"#);
    form.load_str(r#"<form><field name="b" label="new"/></form>"#, true, None)
        .unwrap();

    let tree = form.tree().unwrap();
    let names: Vec<&str> = tree
        .children(tree.root())
        .iter()
        .map(|id| tree.element(*id).name())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn keep_preserves_the_first_attributes() {
    let mut form = article();
    form.load_str(
        r#"<form><field name="title" label="Other" required="false"/></form>"#,
        false,
        None,
    )
    .unwrap();

    assert_eq!(field_attr(&form, "title", None, "label").as_deref(), Some("Title"));
    assert_eq!(field_attr(&form, "title", None, "required").as_deref(), Some("true"));
    assert_eq!(count_fields(&form, "title"), 2);
}

#[test]
fn keep_still_merges_new_siblings() {
    let mut form = article();
    form.load_str(
        r#"<form>
            <fields name="params">
                <field name="title" label="Ignored"/>
                <field name="keywords"/>
            </fields>
        </form>"#,
        false,
        None,
    )
    .unwrap();

    assert_eq!(
        field_attr(&form, "title", Some("params"), "label").as_deref(),
        Some("Browser title")
    );
    assert!(form.tree().unwrap().find_field("keywords", Some("params")).is_some());
}

#[test]
fn selector_loads_part_of_a_foreign_document() {
    let mut form = Form::new("plugin", FormOptions::new(), Arc::new(FormContext::new()));
    form.load_str(
        r#"<extension>
            <name>Example</name>
            <config>
                <fields name="params">
                    <field name="mode" default="fast"/>
                </fields>
            </config>
        </extension>"#,
        true,
        Some("/extension/config/fields"),
    )
    .unwrap();

    let tree = form.tree().unwrap();
    assert_eq!(tree.tag(tree.root()), "form");
    assert_eq!(field_attr(&form, "mode", Some("params"), "default").as_deref(), Some("fast"));
}

#[test]
fn malformed_markup_leaves_the_schema_untouched() {
    let mut form = article();
    let before = form.to_xml().unwrap();

    let result = form.load_str(r#"<form><field name="broken"></form>"#, true, None);
    assert!(result.is_err());
    assert_eq!(form.to_xml().unwrap(), before);
}

#[test]
fn deeply_nested_markup_is_rejected() {
    let mut form = common::form(r#"<form><field name="a"/></form>"#);
    let before = form.to_xml().unwrap();

    let depth = 20_000;
    let markup = format!(
        "<form>{}{}</form>",
        "<fields>".repeat(depth),
        "</fields>".repeat(depth)
    );
    let result = form.load_str(&markup, true, None);
    assert!(matches!(result, Err(FormError::Document(_))));
    assert_eq!(form.to_xml().unwrap(), before);
}

#[test]
fn invalid_selector_is_an_error() {
    let mut form = article();
    let result = form.load_str("<form/>", true, Some("//field[@name="));
    assert!(matches!(result, Err(FormError::Selector { .. })));
}

#[test]
fn serialized_schema_loads_back() {
    let form = article();
    let xml = form.to_xml().unwrap();

    let reloaded = common::form(&xml);
    assert_eq!(reloaded.to_xml().unwrap(), xml);
    assert_eq!(count_fields(&reloaded, "title"), 2);
}

#[test]
fn set_field_adds_and_replaces() {
    let mut form = article();

    let added = form
        .set_field(&parse(r#"<field name="keywords"/>"#), Some("params"), true)
        .unwrap();
    assert!(added);
    assert!(form.tree().unwrap().find_field("keywords", Some("params")).is_some());

    form.set_field(&parse(r#"<field name="alias" label="Slug"/>"#), None, false)
        .unwrap();
    assert_eq!(field_attr(&form, "alias", None, "label"), None);

    form.set_field(&parse(r#"<field name="alias" label="Slug"/>"#), None, true)
        .unwrap();
    assert_eq!(field_attr(&form, "alias", None, "label").as_deref(), Some("Slug"));
    assert_eq!(count_fields(&form, "alias"), 1);
}

#[test]
fn set_fields_rejects_non_field_roots() {
    let mut form = article();
    let result = form.set_fields(&[parse(r#"<field name="a"/>"#), parse("<fields/>")], None, true);
    assert!(matches!(result, Err(FormError::Document(_))));
    // Nothing was added.
    assert!(form.tree().unwrap().find_field("a", None).is_none());
}

#[test]
fn remove_field_and_group() {
    let mut form = article();
    assert!(form.remove_field("alias", None));
    assert!(form.tree().unwrap().find_field("alias", None).is_none());

    assert!(form.remove_group("params"));
    assert!(form.tree().unwrap().find_group("params").is_empty());
    assert!(form.tree().unwrap().find_field("css", Some("params.advanced")).is_none());

    // Missing targets are ignored.
    assert!(form.remove_field("nope", None));
    assert!(form.remove_group("nope"));
}

#[test]
fn repeated_edits_do_not_grow_the_schema() {
    let mut form = article();
    let size = form.tree().unwrap().node_count();

    for _ in 0..20 {
        form.set_field(&parse(r#"<field name="alias" label="Slug"/>"#), None, true)
            .unwrap();
        form.load_str(r#"<form><field name="title" label="Headline"/></form>"#, true, None)
            .unwrap();
    }
    assert_eq!(form.tree().unwrap().node_count(), size);

    form.remove_field("alias", None);
    assert_eq!(form.tree().unwrap().node_count(), size - 1);
}

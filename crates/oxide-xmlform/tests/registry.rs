//! Tests for schema files, search paths and shared form instances.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use oxide_xmlform::{Form, FormContext, FormError, FormOptions, FormRegistry};

fn schema_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("article.xml"),
        r#"<form addformpath="/extra"><field name="title" required="true"/></form>"#,
    )
    .unwrap();
    fs::create_dir(dir.path().join("extra")).unwrap();
    fs::write(
        dir.path().join("extra").join("metadata.xml"),
        r#"<form><fields name="metadata"><field name="robots"/></fields></form>"#,
    )
    .unwrap();
    dir
}

fn context(dir: &TempDir) -> Arc<FormContext> {
    FormContext::builder()
        .base_path(dir.path())
        .form_path(dir.path())
        .build()
        .shared()
}

#[test]
fn load_file_by_path() {
    let dir = schema_dir();
    let mut form = Form::new("article", FormOptions::new(), Arc::new(FormContext::new()));
    let path = dir.path().join("article.xml");

    form.load_file(path.to_str().unwrap(), true, None).unwrap();
    assert!(form.tree().unwrap().find_field("title", None).is_some());
}

#[test]
fn load_file_by_name_on_search_paths() {
    let dir = schema_dir();
    let mut form = Form::new("article", FormOptions::new(), context(&dir));

    form.load_file("Article", true, None).unwrap();
    assert!(form.tree().unwrap().find_field("title", None).is_some());
}

#[test]
fn declared_form_paths_are_searched() {
    let dir = schema_dir();
    let context = context(&dir);
    let mut form = Form::new("article", FormOptions::new(), Arc::clone(&context));

    form.load_file("article", true, None).unwrap();
    assert_eq!(context.search_paths().forms()[0], dir.path().join("extra"));

    form.load_file("metadata", true, None).unwrap();
    assert!(form.tree().unwrap().find_field("robots", Some("metadata")).is_some());
}

#[test]
fn declared_extension_paths_are_exposed() {
    let dir = schema_dir();
    let context = context(&dir);
    let mut form = Form::new("custom", FormOptions::new(), Arc::clone(&context));

    form.load_str(
        r#"<form addfieldpath="fields"><field name="a" addrulepath="/rules"/></form>"#,
        true,
        None,
    )
    .unwrap();
    let paths = context.search_paths();
    assert_eq!(paths.fields(), &[dir.path().join("fields")]);
    assert_eq!(paths.rules(), &[dir.path().join("rules")]);
}

#[test]
fn unknown_schema_name() {
    let dir = schema_dir();
    let mut form = Form::new("x", FormOptions::new(), context(&dir));

    match form.load_file("missing", true, None) {
        Err(FormError::SchemaNotFound { name, searched }) => {
            assert_eq!(name, "missing");
            assert_eq!(searched, vec![PathBuf::from(dir.path())]);
        }
        other => panic!("Expected SchemaNotFound, got {other:?}"),
    }
    assert!(form.tree().is_none());
}

#[test]
fn registry_loads_from_markup_or_files() {
    let dir = schema_dir();
    let mut registry = FormRegistry::new(context(&dir));

    registry
        .get_instance("article", "article", FormOptions::new(), true, None)
        .unwrap();
    registry
        .get_instance(
            "contact",
            r#"<form><field name="email" validate="email"/></form>"#,
            FormOptions::new().control("contact"),
            true,
            None,
        )
        .unwrap();

    assert_eq!(registry.len(), 2);
    let contact = registry.get_mut("contact").unwrap();
    assert!(!contact.validate(&json!({"email": "nope"}), None).unwrap());
    assert_eq!(contact.get_field("email", None, None).unwrap().name(), "contact[email]");
}

#[test]
fn registries_are_independent() {
    let mut first = FormRegistry::new(Arc::new(FormContext::new()));
    let second = FormRegistry::new(Arc::new(FormContext::new()));

    first
        .get_instance("a", "<form/>", FormOptions::new(), true, None)
        .unwrap();
    assert!(first.contains("a"));
    assert!(!second.contains("a"));
}

#[test]
fn cached_instance_keeps_its_state() {
    let mut registry = FormRegistry::new(Arc::new(FormContext::new()));
    let form = registry
        .get_instance("a", r#"<form><field name="x"/></form>"#, FormOptions::new(), true, None)
        .unwrap();
    form.bind(&json!({"x": 1})).unwrap();

    let form = registry
        .get_instance("a", "", FormOptions::new(), true, None)
        .unwrap();
    assert_eq!(form.get_value("x", None, json!(null)), json!(1));
}

//! Tests for field filters applied through a form.

mod common;
use common::*;

use serde_json::{json, Value};

use oxide_xmlform::FormContext;

fn tel_form() -> oxide_xmlform::Form {
    form(r#"<form><field name="phone" type="tel" filter="tel"/></form>"#)
}

fn tel(value: &str) -> Value {
    tel_form().filter_field("phone", None, &json!(value)).unwrap()
}

#[test]
fn tel_north_american_number() {
    assert_eq!(tel("555-123-4567"), json!("1.5551234567"));
    assert_eq!(tel("+1 (555) 123-4567"), json!("1.5551234567"));
}

#[test]
fn tel_international_and_epp() {
    assert_eq!(tel("+49 30123456"), json!("49.30123456"));
    assert_eq!(tel("+44.2071234567x12"), json!("44.2071234567"));
    assert_eq!(tel("33.612345678"), json!("33.612345678"));
}

#[test]
fn tel_bare_digits() {
    assert_eq!(tel("12345678"), json!(".12345678"));
    assert_eq!(tel("4930123456789"), json!("4.930123456789"));
    assert_eq!(tel("12345678901234567890"), json!(""));
    assert_eq!(tel("no digits"), json!(""));
}

#[test]
fn url_without_scheme_gets_http() {
    let form = article();
    assert_eq!(
        form.filter_field("website", Some("params"), &json!("example.com")),
        Some(json!("http://example.com"))
    );
    assert_eq!(
        form.filter_field("website", Some("params"), &json!(" https://example.com/a ")),
        Some(json!("https://example.com/a"))
    );
}

#[test]
fn empty_url_is_false() {
    let form = article();
    assert_eq!(form.filter_field("website", Some("params"), &json!("")), Some(json!(false)));
}

#[test]
fn non_scalar_url_is_false() {
    let form = article();
    assert_eq!(
        form.filter_field("website", Some("params"), &json!(["example.com"])),
        Some(json!(false))
    );
    assert_eq!(
        form.filter_field("website", Some("params"), &json!({"host": "example.com"})),
        Some(json!(false))
    );
}

#[test]
fn url_internal_link_uses_root_url() {
    let context = FormContext::builder().root_url("http://www.example.org/").build();
    let form = form_with(context, r#"<form><field name="link" type="url" filter="url"/></form>"#);
    assert_eq!(
        form.filter_field("link", None, &json!("index.php?option=com_users")),
        Some(json!("http://www.example.org/index.php?option=com_users"))
    );
}

#[test]
fn relative_url_against_host() {
    let context = FormContext::builder()
        .root_url("http://www.example.org/")
        .host("www.example.org")
        .build();
    let form = form_with(
        context,
        r#"<form><field name="link" type="url" filter="url" relative="true"/></form>"#,
    );
    assert_eq!(
        form.filter_field("link", None, &json!("www.example.org/about")),
        Some(json!("http://www.example.org/about"))
    );
    assert_eq!(
        form.filter_field("link", None, &json!("images/logo.png")),
        Some(json!("http://www.example.org/images/logo.png"))
    );
}

#[test]
fn builtin_filters() {
    let form = form(
        r#"<form>
            <field name="gone" filter="unset"/>
            <field name="html" filter="RAW"/>
            <field name="ids" filter="int_array"/>
            <field name="body" filter="safehtml"/>
            <field name="plain"/>
        </form>"#,
    );

    assert_eq!(form.filter_field("gone", None, &json!("x")), Some(Value::Null));
    assert_eq!(
        form.filter_field("html", None, &json!("<script>x</script>")),
        Some(json!("<script>x</script>"))
    );
    assert_eq!(
        form.filter_field("ids", None, &json!(["1", "2x", "y"])),
        Some(json!([1, 2, 0]))
    );
    assert_eq!(form.filter_field("ids", None, &json!("7")), Some(json!([7])));
    assert_eq!(
        form.filter_field("body", None, &json!("<p onclick=\"x()\">Hi</p><script>x</script>")),
        Some(json!("<p>Hi</p>"))
    );
    assert_eq!(
        form.filter_field("plain", None, &json!("<b>bold</b> &amp; more")),
        Some(json!("bold & more"))
    );
}

#[test]
fn registered_filters_take_precedence_over_the_sanitizer() {
    let context = FormContext::builder()
        .filter("Text::upper", |value: &Value| {
            Value::String(value.as_str().unwrap_or_default().to_uppercase())
        })
        .filter("trim", |value: &Value| {
            Value::String(value.as_str().unwrap_or_default().trim().to_string())
        })
        .build();
    let form = form_with(
        context,
        r#"<form>
            <field name="a" filter="Text::upper"/>
            <field name="b" filter="trim"/>
            <field name="c" filter="Missing::call"/>
        </form>"#,
    );

    assert_eq!(form.filter_field("a", None, &json!("abc")), Some(json!("ABC")));
    assert_eq!(form.filter_field("b", None, &json!("  abc ")), Some(json!("abc")));
    // Unknown names fall through to the sanitizer.
    assert_eq!(form.filter_field("c", None, &json!("<i>7</i>")), Some(json!("7")));
}

#[test]
fn filter_returns_only_present_keys() {
    let form = article();
    let filtered = form
        .filter(
            &json!({
                "title": "<b>Hello</b>",
                "params": {"website": "example.com", "advanced": {"css": "<style>"}},
                "stray": "x"
            }),
            None,
        )
        .unwrap();

    assert_eq!(
        filtered,
        json!({
            "title": "Hello",
            "params": {"website": "http://example.com", "advanced": {"css": "<style>"}}
        })
    );
}

#[test]
fn filter_limited_to_a_group() {
    let form = article();
    let filtered = form
        .filter(&json!({"title": "x", "params": {"title": "<b>y</b>"}}), Some("params"))
        .unwrap();
    assert_eq!(filtered, json!({"params": {"title": "y"}}));
}

#[test]
fn missing_field_has_no_filtered_value() {
    let form = article();
    assert_eq!(form.filter_field("nope", None, &json!("x")), None);
}

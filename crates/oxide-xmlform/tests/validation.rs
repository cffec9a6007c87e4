//! Tests for validation passes over whole forms.

mod common;
use common::*;

use serde_json::{json, Value};

use oxide_xmlform::{
    Element, FailureKind, Form, FormContext, FormError, MapTranslator, Rule, RuleOutcome,
    ValidationFailure,
};

const SIGNUP: &str = r#"<form>
    <field name="username" label="Username" required="true"/>
    <field name="email" label="E-mail" required="required" validate="email"/>
    <field name="website" validate="url"/>
    <field name="password" type="password" required="true"/>
    <field name="password2" validate="equals" field="password" message="Passwords differ"/>
    <field name="color" validate="color"/>
    <field name="lang" validate="options">
        <option value="en">English</option>
        <option value="fr">French</option>
    </field>
    <field name="zip" validate="regex" pattern="[0-9]{5}"/>
    <field name="phone" validate="tel" plan="northamerica"/>
</form>"#;

fn valid_signup() -> Value {
    json!({
        "username": "jane",
        "email": "jane@example.com",
        "website": "https://example.com",
        "password": "secret",
        "password2": "secret",
        "color": "#a0c",
        "lang": "fr",
        "zip": "75001",
        "phone": "555-123-4567"
    })
}

#[test]
fn valid_data_passes() {
    let mut form = form(SIGNUP);
    assert!(form.validate(&valid_signup(), None).unwrap());
    assert!(form.errors().is_empty());
}

#[test]
fn missing_required_field_fails_exactly_once() {
    let mut form = form(SIGNUP);
    let mut data = valid_signup();
    data["username"] = json!("");

    assert!(!form.validate(&data, None).unwrap());
    assert_eq!(form.errors().len(), 1);
    assert_eq!(form.errors()[0].kind, FailureKind::Required);
    assert_eq!(form.errors()[0].field, "username");
    assert_eq!(form.errors()[0].message, "Field required: Username");
}

#[test]
fn absent_required_field_fails() {
    let mut form = form(SIGNUP);
    let mut data = valid_signup();
    data.as_object_mut().unwrap().remove("email");

    assert!(!form.validate(&data, None).unwrap());
    assert_eq!(form.field_errors("email", None), vec!["Field required: E-mail".to_string()]);
}

#[test]
fn every_failing_field_is_recorded() {
    let mut form = form(SIGNUP);
    let data = json!({
        "username": "",
        "email": "not-an-address",
        "website": "example.com",
        "password": "secret",
        "password2": "other",
        "color": "blue",
        "lang": "de",
        "zip": "7500",
        "phone": "12"
    });

    assert!(!form.validate(&data, None).unwrap());
    let fields: Vec<&str> = form.errors().iter().map(|error| error.field.as_str()).collect();
    assert_eq!(
        fields,
        vec!["username", "email", "website", "password2", "color", "lang", "zip", "phone"]
    );
    assert_eq!(form.field_errors("password2", None), vec!["Passwords differ".to_string()]);
    assert_eq!(form.field_errors("color", None), vec!["Invalid field: color".to_string()]);
}

#[test]
fn optional_blank_values_pass_rules() {
    let mut form = form(SIGNUP);
    let mut data = valid_signup();
    data["website"] = json!("");
    data["color"] = Value::Null;
    data.as_object_mut().unwrap().remove("zip");

    assert!(form.validate(&data, None).unwrap());
}

#[test]
fn missing_rule_is_a_configuration_error() {
    let mut form = form(
        r#"<form>
            <field name="a" required="true"/>
            <field name="b" validate="nosuchrule"/>
            <field name="c" required="true"/>
        </form>"#,
    );

    let result = form.validate(&json!({"a": "", "b": "x", "c": ""}), None);
    assert!(matches!(result, Err(FormError::RuleMissing(ref rule)) if rule == "nosuchrule"));
    let kinds: Vec<FailureKind> = form.errors().iter().map(|error| error.kind).collect();
    assert_eq!(kinds, vec![FailureKind::Required, FailureKind::RuleMissing]);
}

#[test]
fn validation_scoped_to_a_group() {
    let mut form = form(
        r#"<form>
            <field name="title" required="true"/>
            <fields name="params">
                <field name="limit" required="true" validate="regex" pattern="[0-9]+"/>
            </fields>
        </form>"#,
    );

    assert!(form.validate(&json!({"params": {"limit": "10"}}), Some("params")).unwrap());
    assert!(!form.validate(&json!({"params": {"limit": "ten"}}), Some("params")).unwrap());
    assert_eq!(form.errors().len(), 1);
    assert_eq!(form.errors()[0].field, "params.limit");
}

#[test]
fn errors_reset_between_passes() {
    let mut form = form(SIGNUP);
    let mut data = valid_signup();
    data["username"] = json!("");
    assert!(!form.validate(&data, None).unwrap());

    assert!(form.validate(&valid_signup(), None).unwrap());
    assert!(form.errors().is_empty());
}

#[test]
fn validate_requires_object_data() {
    let mut form = form(SIGNUP);
    assert!(matches!(form.validate(&json!(1), None), Err(FormError::InvalidData(_))));
}

#[test]
fn messages_use_the_translator() {
    let translator = MapTranslator::new()
        .with("XMLFORM_VALIDATE_FIELD_REQUIRED", "Champ requis : %s")
        .with("USER_NAME", "Nom d'utilisateur");
    let context = FormContext::builder().translator(translator).build();
    let mut form = form_with(context, r#"<form><field name="username" label="USER_NAME" required="true"/></form>"#);

    assert!(!form.validate(&json!({}), None).unwrap());
    assert_eq!(form.errors()[0].message, "Champ requis : Nom d'utilisateur");
}

#[test]
fn untranslated_keys_fall_back() {
    // The catalogue lacks the message key, so the built-in text is used; the
    // label has no translation and is shown as is.
    let context = FormContext::builder().translator(MapTranslator::new()).build();
    let mut form = form_with(context, r#"<form><field name="username" label="USER_NAME" required="true"/></form>"#);

    assert!(!form.validate(&json!({}), None).unwrap());
    assert_eq!(form.errors()[0].message, "Field required: USER_NAME");
}

#[test]
fn unlabelled_fields_use_their_name() {
    let mut form = form(r#"<form><field name="nickname" required="true"/></form>"#);
    assert!(!form.validate(&json!({}), None).unwrap());
    assert_eq!(form.errors()[0].message, "Field required: nickname");
}

struct EvenRule;

impl Rule for EvenRule {
    fn test(
        &self,
        element: Element<'_>,
        value: Option<&Value>,
        _group: Option<&str>,
        _input: &Value,
        _form: &Form,
    ) -> RuleOutcome {
        match value.and_then(Value::as_i64) {
            Some(number) if number % 2 == 0 => RuleOutcome::Valid,
            Some(_) => RuleOutcome::Failed(ValidationFailure::new(
                FailureKind::Rule,
                element.key(),
                "Must be even",
            )),
            None => RuleOutcome::Invalid,
        }
    }
}

#[test]
fn registered_rules() {
    let context = FormContext::builder().rule("Even", EvenRule).build();
    let mut form = form_with(context, r#"<form><field name="n" validate="even"/></form>"#);

    assert!(form.validate(&json!({"n": 4}), None).unwrap());

    assert!(!form.validate(&json!({"n": 3}), None).unwrap());
    assert_eq!(form.errors()[0].kind, FailureKind::Rule);
    assert_eq!(form.errors()[0].message, "Must be even");

    assert!(!form.validate(&json!({"n": "x"}), None).unwrap());
    assert_eq!(form.errors()[0].kind, FailureKind::Invalid);
    assert_eq!(form.errors()[0].message, "Invalid field: n");
}

#[test]
fn translated_options_accept_their_rendered_value() {
    let translator = MapTranslator::new().with("COM_YES", "Yes");
    let context = FormContext::builder().translator(translator).build();
    let mut form = form_with(
        context,
        r#"<form><field name="c" type="list" validate="options"><option>COM_YES</option></field></form>"#,
    );

    let input = form.get_input("c", None, None);
    assert!(input.contains(r#"<option value="COM_YES""#));
    assert!(input.contains(">Yes</option>"));

    assert!(form.validate(&json!({"c": "COM_YES"}), None).unwrap());
    assert!(!form.validate(&json!({"c": "Yes"}), None).unwrap());
    assert_eq!(form.errors()[0].message, "Invalid field: c");
}

//! The form document model.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::context::FormContext;
use crate::data::{bind_level, data_key, insert_path, lookup_path, DataStore};
use crate::error::{FormError, Result};
use crate::fields::{load_field, FormField};
use crate::filters::filter_value;
use crate::merge::merge_fragment;
use crate::resolver::GroupScope;
use crate::schema::{NodeId, SchemaTree, Selector, FIELD, FIELDSET};
use crate::validation::{validate_field, FailureKind, ValidationFailure};
use crate::value::kind_name;

/// Per-form settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Name input names are nested under, e.g. `jform`.
    pub control: Option<String>,
}

impl FormOptions {
    /// Creates options without a form control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the form control.
    #[must_use]
    pub fn control(mut self, control: impl Into<String>) -> Self {
        self.control = Some(control.into());
        self
    }
}

/// A fieldset as declared by a `<fieldset>` node or referenced by a
/// `fieldset` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldsetDescriptor {
    /// Fieldset name.
    pub name: String,
    /// Label key, empty when not declared.
    pub label: String,
    /// Description key, empty when not declared.
    pub description: String,
    /// All attributes of the declaring node.
    pub attributes: Vec<(String, String)>,
}

impl FieldsetDescriptor {
    fn declared(tree: &SchemaTree, id: NodeId) -> Self {
        let element = tree.element(id);
        Self {
            name: element.name().to_string(),
            label: element.attr("label").unwrap_or_default().to_string(),
            description: element.attr("description").unwrap_or_default().to_string(),
            attributes: element.attributes().to_vec(),
        }
    }

    fn referenced(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// A form built from one or more XML schema fragments.
///
/// The form owns its schema tree, the bound data and the errors of the
/// last validation pass. Collaborators come from a shared [`FormContext`].
pub struct Form {
    name: String,
    options: FormOptions,
    context: Arc<FormContext>,
    tree: Option<SchemaTree>,
    data: DataStore,
    errors: Vec<ValidationFailure>,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("loaded", &self.tree.is_some())
            .field("data", &self.data)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Creates a form without a schema.
    pub fn new(name: impl Into<String>, options: FormOptions, context: Arc<FormContext>) -> Self {
        Self {
            name: name.into(),
            options,
            context,
            tree: None,
            data: DataStore::new(),
            errors: Vec::new(),
        }
    }

    /// Returns the form name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the form options.
    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Returns the form control, if one is set.
    pub fn form_control(&self) -> Option<&str> {
        self.options.control.as_deref().filter(|control| !control.is_empty())
    }

    /// Returns the shared collaborators.
    pub fn context(&self) -> &FormContext {
        &self.context
    }

    /// Returns the schema tree, if one is loaded.
    pub fn tree(&self) -> Option<&SchemaTree> {
        self.tree.as_ref()
    }

    fn require_tree(&self) -> Result<&SchemaTree> {
        self.tree
            .as_ref()
            .ok_or_else(|| FormError::NoSchema(self.name.clone()))
    }

    /// Parses `markup` and merges it into the schema.
    ///
    /// Malformed markup leaves the schema untouched.
    pub fn load_str(&mut self, markup: &str, replace: bool, selector: Option<&str>) -> Result<()> {
        let fragment = SchemaTree::parse(markup).inspect_err(|err| {
            warn!(form = %self.name, error = %err, "failed to parse schema");
        })?;
        self.load_tree(fragment, replace, selector)
    }

    /// Merges an already parsed fragment into the schema.
    pub fn load_tree(&mut self, fragment: SchemaTree, replace: bool, selector: Option<&str>) -> Result<()> {
        let selector = selector.map(Selector::parse).transpose()?;
        merge_fragment(&mut self.tree, fragment, replace, selector.as_ref());
        if let Some(tree) = self.tree.as_mut() {
            tree.compact();
        }
        self.sync_paths();
        Ok(())
    }

    /// Loads a schema file.
    ///
    /// `name` is tried as a path first, then as `<name>.xml` (lowercased)
    /// in each form search directory.
    pub fn load_file(&mut self, name: &str, replace: bool, selector: Option<&str>) -> Result<()> {
        let direct = Path::new(name);
        let path = if direct.is_file() {
            direct.to_path_buf()
        } else {
            let file_name = format!("{}.xml", name.to_lowercase());
            self.context
                .find_form(&file_name)
                .ok_or_else(|| FormError::SchemaNotFound {
                    name: name.to_string(),
                    searched: self.context.search_paths().forms().to_vec(),
                })?
        };
        debug!(form = %self.name, path = %path.display(), "loading schema file");
        let markup = std::fs::read_to_string(&path)?;
        self.load_str(&markup, replace, selector)
    }

    fn sync_paths(&self) {
        if let Some(tree) = &self.tree {
            self.context.sync_paths(tree);
        }
    }

    /// Binds nested data to the declared fields.
    ///
    /// Values whose key is a field at the current group level are stored;
    /// objects under other keys are descended into as groups; the rest is
    /// dropped.
    pub fn bind(&mut self, data: &Value) -> Result<()> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| FormError::NoSchema(self.name.clone()))?;
        let Value::Object(map) = data else {
            return Err(FormError::InvalidData(kind_name(data).to_string()));
        };
        bind_level(tree, &mut self.data, None, map);
        Ok(())
    }

    /// Returns the bound value of a field, or `default`.
    pub fn get_value(&self, name: &str, group: Option<&str>, default: Value) -> Value {
        self.data
            .get(&data_key(group, name))
            .cloned()
            .unwrap_or(default)
    }

    /// Stores a value for a declared field. Returns `false` when the field
    /// does not exist.
    pub fn set_value(&mut self, name: &str, group: Option<&str>, value: Value) -> bool {
        let exists = self
            .tree
            .as_ref()
            .is_some_and(|tree| tree.find_field(name, group).is_some());
        if exists {
            self.data.set(data_key(group, name), value);
        }
        exists
    }

    /// Returns the bound data.
    pub fn data(&self) -> &DataStore {
        &self.data
    }

    /// Clears bound data and errors; a full reset drops the schema too.
    pub fn reset(&mut self, full: bool) {
        self.data.clear();
        self.errors.clear();
        if full {
            self.tree = None;
        }
    }

    /// Filters every field in scope whose key is present in `data`.
    ///
    /// The result is a nested object holding only those keys.
    pub fn filter(&self, data: &Value, group: Option<&str>) -> Result<Value> {
        let tree = self.require_tree()?;
        if !data.is_object() {
            return Err(FormError::InvalidData(kind_name(data).to_string()));
        }

        let mut output = Map::new();
        for id in tree.find_fields_by_group(GroupScope::from_group(group), false) {
            let element = tree.element(id);
            let key = element.key();
            if let Some(value) = lookup_path(data, &key) {
                insert_path(&mut output, &key, filter_value(&self.context, element, value));
            }
        }
        Ok(Value::Object(output))
    }

    /// Filters one value through the filter of a declared field.
    pub fn filter_field(&self, name: &str, group: Option<&str>, value: &Value) -> Option<Value> {
        let tree = self.tree.as_ref()?;
        let id = tree.find_field(name, group)?;
        Some(filter_value(&self.context, tree.element(id), value))
    }

    /// Validates every field in scope against `data`.
    ///
    /// Returns `Ok(false)` when any field failed; the failures are in
    /// [`errors`](Self::errors). A field naming an unregistered rule stops
    /// the pass with [`FormError::RuleMissing`], after recording it.
    pub fn validate(&mut self, data: &Value, group: Option<&str>) -> Result<bool> {
        self.errors.clear();
        if !data.is_object() {
            self.require_tree()?;
            return Err(FormError::InvalidData(kind_name(data).to_string()));
        }

        let mut failures = Vec::new();
        let mut missing_rule = None;
        {
            let tree = self.require_tree()?;
            for id in tree.find_fields_by_group(GroupScope::from_group(group), false) {
                let element = tree.element(id);
                let field_group = element.group();
                let value = lookup_path(data, &element.key());
                let Err(failure) = validate_field(self, element, field_group.as_deref(), value, data) else {
                    continue;
                };
                let stop = failure.kind == FailureKind::RuleMissing;
                failures.push(failure);
                if stop {
                    missing_rule = element.attr("validate").map(str::to_string);
                    break;
                }
            }
        }

        debug!(form = %self.name, failures = failures.len(), "validated");
        self.errors = failures;
        match missing_rule {
            Some(rule) => Err(FormError::RuleMissing(rule)),
            None => Ok(self.errors.is_empty()),
        }
    }

    /// Failures of the last validation pass.
    pub fn errors(&self) -> &[ValidationFailure] {
        &self.errors
    }

    /// Messages of the recorded failures for one field.
    pub fn field_errors(&self, name: &str, group: Option<&str>) -> Vec<String> {
        let key = data_key(group, name);
        self.errors
            .iter()
            .filter(|failure| failure.field == key)
            .map(|failure| failure.message.clone())
            .collect()
    }

    /// Instantiates a field. Without `value` the bound value or the field
    /// default is used.
    pub fn get_field(
        &self,
        name: &str,
        group: Option<&str>,
        value: Option<&Value>,
    ) -> Option<Box<dyn FormField>> {
        let tree = self.tree.as_ref()?;
        let id = tree.find_field(name, group)?;
        load_field(self, tree.element(id), group, value)
    }

    /// Input markup of a field, empty when the field does not exist.
    pub fn get_input(&self, name: &str, group: Option<&str>, value: Option<&Value>) -> String {
        self.get_field(name, group, value)
            .map(|field| field.input())
            .unwrap_or_default()
    }

    /// Label markup of a field, empty when the field does not exist.
    pub fn get_label(&self, name: &str, group: Option<&str>) -> String {
        self.get_field(name, group, None)
            .map(|field| field.label())
            .unwrap_or_default()
    }

    /// Label, input and recorded errors of a field as one block.
    pub fn render_field(&self, name: &str, group: Option<&str>) -> String {
        self.get_field(name, group, None)
            .map(|field| field.render(&self.field_errors(name, group)))
            .unwrap_or_default()
    }

    /// Field instances of a fieldset, or of the whole form without a name.
    ///
    /// Instances are keyed by id: a later field with the same id replaces
    /// the earlier one in place.
    pub fn get_fieldset(&self, name: Option<&str>) -> Vec<Box<dyn FormField>> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let ids = match name.filter(|name| !name.is_empty()) {
            Some(name) => tree.find_fields_by_fieldset(name),
            None => tree.find_fields_by_group(GroupScope::All, false),
        };
        self.load_fields(tree, ids)
    }

    /// Field instances of a group.
    pub fn get_group(&self, group: &str, nested: bool) -> Vec<Box<dyn FormField>> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let ids = tree.find_fields_by_group(GroupScope::from_group(Some(group)), nested);
        self.load_fields(tree, ids)
    }

    fn load_fields(&self, tree: &SchemaTree, ids: Vec<NodeId>) -> Vec<Box<dyn FormField>> {
        let mut fields: Vec<Box<dyn FormField>> = Vec::new();
        for id in ids {
            let Some(field) = load_field(self, tree.element(id), None, None) else {
                continue;
            };
            match fields.iter().position(|existing| existing.id() == field.id()) {
                Some(index) => fields[index] = field,
                None => fields.push(field),
            }
        }
        fields
    }

    /// Fieldset descriptors, one per name, in document order.
    ///
    /// With a group only fieldsets declared or referenced beneath that
    /// group count. Fieldsets inside nested field forms and fieldsets
    /// declared `hidden="true"` are left out.
    pub fn get_fieldsets(&self, group: Option<&str>) -> Vec<FieldsetDescriptor> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let scopes = match group.filter(|group| !group.is_empty()) {
            Some(group) => tree.find_group(group),
            None => vec![tree.root()],
        };

        let mut fieldsets: Vec<FieldsetDescriptor> = Vec::new();
        for scope in scopes {
            for id in tree.descendants(scope) {
                if tree.ancestors(id).any(|ancestor| tree.tag(ancestor) == FIELD) {
                    continue;
                }
                let name = match tree.tag(id) {
                    FIELDSET => tree.attr(id, "name"),
                    FIELD => tree.attr(id, "fieldset"),
                    _ => None,
                };
                let Some(name) = name.filter(|name| !name.is_empty()) else {
                    continue;
                };
                if fieldsets.iter().any(|fieldset| fieldset.name == name) {
                    continue;
                }
                let declaring = if tree.tag(id) == FIELDSET {
                    Some(id)
                } else {
                    declared_fieldset(tree, name)
                };
                if declaring.is_some_and(|node| tree.attr(node, "hidden") == Some("true")) {
                    continue;
                }
                fieldsets.push(match declaring {
                    Some(node) => FieldsetDescriptor::declared(tree, node),
                    None => FieldsetDescriptor::referenced(name),
                });
            }
        }
        fieldsets
    }

    /// Returns an attribute of a field, or `default` when the field does
    /// not exist or the attribute is empty.
    pub fn get_field_attribute(&self, name: &str, attribute: &str, default: &str, group: Option<&str>) -> String {
        self.tree
            .as_ref()
            .and_then(|tree| tree.find_field(name, group).map(|id| tree.element(id)))
            .and_then(|element| element.non_empty_attr(attribute))
            .unwrap_or(default)
            .to_string()
    }

    /// Sets an attribute on a field. Missing fields are ignored; only a
    /// form without schema returns `false`.
    pub fn set_field_attribute(&mut self, name: &str, attribute: &str, value: &str, group: Option<&str>) -> bool {
        let Some(tree) = self.tree.as_mut() else {
            return false;
        };
        if let Some(id) = tree.find_field(name, group) {
            tree.set_attr(id, attribute, value);
            self.sync_paths();
        }
        true
    }

    /// Sets the same attribute on several fields.
    pub fn set_fields_attribute(&mut self, names: &[&str], attribute: &str, value: &str, group: Option<&str>) -> bool {
        if self.tree.is_none() {
            return false;
        }
        for name in names {
            self.set_field_attribute(name, attribute, value, group);
        }
        true
    }

    /// Adds a `<field>` to the schema, at the end of the first container of
    /// `group` or of the root.
    ///
    /// An existing field of the same name is replaced when `replace` is set
    /// and kept otherwise. A root element other than `<field>` is an error.
    pub fn set_field(&mut self, field: &SchemaTree, group: Option<&str>, replace: bool) -> Result<bool> {
        if field.tag(field.root()) != FIELD {
            return Err(FormError::Document(format!(
                "expected a <field> element, got <{}>",
                field.tag(field.root())
            )));
        }
        let Some(tree) = self.tree.as_mut() else {
            return Ok(false);
        };

        let name = field.attr(field.root(), "name").unwrap_or_default();
        if let Some(existing) = tree.find_field(name, group) {
            if !replace {
                return Ok(true);
            }
            tree.detach(existing);
        }

        let parent = match group.filter(|group| !group.is_empty()) {
            Some(group) => tree.find_group(group).first().copied(),
            None => Some(tree.root()),
        };
        if let Some(parent) = parent {
            let copy = tree.import(field, field.root());
            tree.append_child(parent, copy);
            debug!(form = %self.name, field = name, group = ?group, "set field");
        }
        tree.compact();
        self.sync_paths();
        Ok(true)
    }

    /// Adds several `<field>` elements. All roots are checked before any
    /// is added.
    pub fn set_fields(&mut self, fields: &[SchemaTree], group: Option<&str>, replace: bool) -> Result<bool> {
        if let Some(bad) = fields.iter().find(|field| field.tag(field.root()) != FIELD) {
            return Err(FormError::Document(format!(
                "expected a <field> element, got <{}>",
                bad.tag(bad.root())
            )));
        }
        if self.tree.is_none() {
            return Ok(false);
        }
        for field in fields {
            self.set_field(field, group, replace)?;
        }
        Ok(true)
    }

    /// Removes a field. Missing fields are ignored.
    pub fn remove_field(&mut self, name: &str, group: Option<&str>) -> bool {
        let Some(tree) = self.tree.as_mut() else {
            return false;
        };
        if let Some(id) = tree.find_field(name, group) {
            tree.detach(id);
            tree.compact();
        }
        true
    }

    /// Removes every container of a group. Missing groups are ignored.
    pub fn remove_group(&mut self, group: &str) -> bool {
        let Some(tree) = self.tree.as_mut() else {
            return false;
        };
        for id in tree.find_group(group) {
            tree.detach(id);
        }
        tree.compact();
        true
    }

    /// Serializes the current schema.
    pub fn to_xml(&self) -> Result<String> {
        self.require_tree()?.to_xml()
    }
}

fn declared_fieldset(tree: &SchemaTree, name: &str) -> Option<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .find(|id| tree.tag(*id) == FIELDSET && tree.attr(*id, "name") == Some(name))
}

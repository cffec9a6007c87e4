//! Collaborators shared by every form.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::fields::{FieldType, FieldTypeRegistry};
use crate::filters::url::Site;
use crate::filters::{Filter, FilterRegistry, InputFilter, Sanitizer};
use crate::schema::SchemaTree;
use crate::text::{Text, Translator};
use crate::validation::{Rule, RuleRegistry};

/// Attribute declaring an extra schema search directory.
pub const ADD_FORM_PATH: &str = "addformpath";
/// Attribute declaring an extra field type directory.
pub const ADD_FIELD_PATH: &str = "addfieldpath";
/// Attribute declaring an extra rule directory.
pub const ADD_RULE_PATH: &str = "addrulepath";

/// Directories searched for schema files, field types and rules.
///
/// Lists are kept newest first and never contain duplicates. Only the
/// schema list is searched by this crate. Field types and rules are
/// registered as code on [`FormContextBuilder`], so the field and rule
/// lists are recorded for callers that load their own extensions from
/// the directories a schema declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    base: PathBuf,
    forms: Vec<PathBuf>,
    fields: Vec<PathBuf>,
    rules: Vec<PathBuf>,
}

impl SearchPaths {
    /// Creates empty lists; declared paths are resolved against `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }

    /// Returns the base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Schema search directories, newest first.
    pub fn forms(&self) -> &[PathBuf] {
        &self.forms
    }

    /// Field type directories declared through `addfieldpath`, newest first.
    pub fn fields(&self) -> &[PathBuf] {
        &self.fields
    }

    /// Rule directories declared through `addrulepath`, newest first.
    pub fn rules(&self) -> &[PathBuf] {
        &self.rules
    }

    /// Adds a schema search directory.
    pub fn add_form_path(&mut self, path: impl Into<PathBuf>) {
        push_front_unique(&mut self.forms, path.into());
    }

    /// Adds a field type directory.
    pub fn add_field_path(&mut self, path: impl Into<PathBuf>) {
        push_front_unique(&mut self.fields, path.into());
    }

    /// Adds a rule directory.
    pub fn add_rule_path(&mut self, path: impl Into<PathBuf>) {
        push_front_unique(&mut self.rules, path.into());
    }

    /// Finds `file_name` in the schema search directories.
    pub fn find_form(&self, file_name: &str) -> Option<PathBuf> {
        self.forms
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.is_file())
    }

    /// Registers every path declared through `addformpath`, `addfieldpath`
    /// and `addrulepath` attributes anywhere in `tree`.
    pub fn sync_from(&mut self, tree: &SchemaTree) {
        for id in tree.descendants_or_self(tree.root()) {
            for (name, value) in tree.attributes(id) {
                let path = self.base.join(value.trim_start_matches('/'));
                match name.as_str() {
                    ADD_FORM_PATH => self.add_form_path(path),
                    ADD_FIELD_PATH => self.add_field_path(path),
                    ADD_RULE_PATH => self.add_rule_path(path),
                    _ => continue,
                }
                debug!(attribute = %name, path = %value, "registered search path");
            }
        }
    }
}

fn push_front_unique(list: &mut Vec<PathBuf>, path: PathBuf) {
    if !list.contains(&path) {
        list.insert(0, path);
    }
}

/// Collaborators and site settings shared by forms.
///
/// Build one with [`FormContext::builder`] and share it through an `Arc`.
pub struct FormContext {
    root_url: String,
    host: Option<String>,
    translator: Option<Arc<dyn Translator>>,
    sanitizer: Arc<dyn Sanitizer>,
    field_types: FieldTypeRegistry,
    rules: RuleRegistry,
    filters: FilterRegistry,
    paths: RwLock<SearchPaths>,
}

impl std::fmt::Debug for FormContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormContext")
            .field("root_url", &self.root_url)
            .field("host", &self.host)
            .field("translator", &self.translator.is_some())
            .field("field_types", &self.field_types)
            .field("rules", &self.rules)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl Default for FormContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FormContext {
    /// Creates a context with the built-in field types, rules and sanitizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a context.
    pub fn builder() -> FormContextBuilder {
        FormContextBuilder::new()
    }

    /// Wraps the context for sharing between forms.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Root URL internal links are resolved against.
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// Host of the current request.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Site settings for URL canonicalization.
    pub fn site(&self) -> Site<'_> {
        Site {
            root: &self.root_url,
            host: self.host(),
        }
    }

    /// Returns the translator, if one is installed.
    pub fn translator(&self) -> Option<&dyn Translator> {
        self.translator.as_deref()
    }

    /// Translation access that tolerates a missing translator.
    pub fn text(&self) -> Text<'_> {
        Text::new(self.translator())
    }

    /// Returns the sanitizer.
    pub fn sanitizer(&self) -> &dyn Sanitizer {
        self.sanitizer.as_ref()
    }

    /// Returns the field type registry.
    pub fn field_types(&self) -> &FieldTypeRegistry {
        &self.field_types
    }

    /// Returns the rule registry.
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Returns the external filter registry.
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Returns a snapshot of the search paths.
    pub fn search_paths(&self) -> SearchPaths {
        self.paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Adds a schema search directory.
    pub fn add_form_path(&self, path: impl Into<PathBuf>) {
        self.paths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_form_path(path);
    }

    /// Finds a schema file in the search directories.
    pub fn find_form(&self, file_name: &str) -> Option<PathBuf> {
        self.paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .find_form(file_name)
    }

    /// Registers the search paths declared in `tree`.
    pub fn sync_paths(&self, tree: &SchemaTree) {
        self.paths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .sync_from(tree);
    }
}

/// Builder for [`FormContext`].
pub struct FormContextBuilder {
    root_url: String,
    host: Option<String>,
    translator: Option<Arc<dyn Translator>>,
    sanitizer: Arc<dyn Sanitizer>,
    field_types: FieldTypeRegistry,
    rules: RuleRegistry,
    filters: FilterRegistry,
    paths: SearchPaths,
}

impl std::fmt::Debug for FormContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormContextBuilder")
            .field("root_url", &self.root_url)
            .field("host", &self.host)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl Default for FormContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormContextBuilder {
    /// Starts from the built-in collaborators.
    pub fn new() -> Self {
        Self {
            root_url: "/".to_string(),
            host: None,
            translator: None,
            sanitizer: Arc::new(InputFilter::new()),
            field_types: FieldTypeRegistry::with_builtins(),
            rules: RuleRegistry::with_builtins(),
            filters: FilterRegistry::new(),
            paths: SearchPaths::default(),
        }
    }

    /// Sets the root URL internal links are resolved against.
    #[must_use]
    pub fn root_url(mut self, url: impl Into<String>) -> Self {
        self.root_url = url.into();
        self
    }

    /// Sets the host of the current request.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Installs a translator.
    #[must_use]
    pub fn translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Some(Arc::new(translator));
        self
    }

    /// Replaces the sanitizer.
    #[must_use]
    pub fn sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Arc::new(sanitizer);
        self
    }

    /// Registers a field type.
    #[must_use]
    pub fn field_type(mut self, name: &str, field_type: impl FieldType + 'static) -> Self {
        self.field_types.register(name, field_type);
        self
    }

    /// Registers a validation rule.
    #[must_use]
    pub fn rule(mut self, name: &str, rule: impl Rule + 'static) -> Self {
        self.rules.register(name, rule);
        self
    }

    /// Registers an external filter.
    #[must_use]
    pub fn filter(mut self, name: &str, filter: impl Filter + 'static) -> Self {
        self.filters.register(name, filter);
        self
    }

    /// Sets the directory declared paths are resolved against.
    #[must_use]
    pub fn base_path(mut self, base: impl Into<PathBuf>) -> Self {
        let mut paths = SearchPaths::new(base);
        for dir in self.paths.forms().iter().rev() {
            paths.add_form_path(dir.clone());
        }
        self.paths = paths;
        self
    }

    /// Adds a schema search directory.
    #[must_use]
    pub fn form_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.add_form_path(dir);
        self
    }

    /// Finishes the context.
    pub fn build(self) -> FormContext {
        FormContext {
            root_url: self.root_url,
            host: self.host,
            translator: self.translator,
            sanitizer: self.sanitizer,
            field_types: self.field_types,
            rules: self.rules,
            filters: self.filters,
            paths: RwLock::new(self.paths),
        }
    }
}

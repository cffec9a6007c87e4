//! Named form instances.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::context::FormContext;
use crate::error::{FormError, Result};
use crate::form::{Form, FormOptions};

/// Caches forms by name.
///
/// The first request for a name builds and loads the form; later requests
/// get the cached instance whatever source and options they pass.
#[derive(Debug)]
pub struct FormRegistry {
    context: Arc<FormContext>,
    forms: HashMap<String, Form>,
}

impl FormRegistry {
    /// Creates an empty registry whose forms share `context`.
    pub fn new(context: Arc<FormContext>) -> Self {
        Self {
            context,
            forms: HashMap::new(),
        }
    }

    /// Returns the shared context.
    pub fn context(&self) -> &Arc<FormContext> {
        &self.context
    }

    /// Returns the form called `name`, creating it on first use.
    ///
    /// A `source` starting with `<` is schema markup, anything else a file
    /// name for [`Form::load_file`]. A failed load caches nothing.
    pub fn get_instance(
        &mut self,
        name: &str,
        source: &str,
        options: FormOptions,
        replace: bool,
        selector: Option<&str>,
    ) -> Result<&mut Form> {
        match self.forms.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let source = source.trim();
                if source.is_empty() {
                    return Err(FormError::EmptySource(name.to_string()));
                }

                let mut form = Form::new(name, options, Arc::clone(&self.context));
                if source.starts_with('<') {
                    form.load_str(source, replace, selector)?;
                } else {
                    form.load_file(source, replace, selector)?;
                }
                debug!(form = name, "created form instance");
                Ok(entry.insert(form))
            }
        }
    }

    /// Returns a cached form.
    pub fn get(&self, name: &str) -> Option<&Form> {
        self.forms.get(name)
    }

    /// Returns a cached form for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Form> {
        self.forms.get_mut(name)
    }

    /// Returns whether a form is cached.
    pub fn contains(&self, name: &str) -> bool {
        self.forms.contains_key(name)
    }

    /// Removes a form from the cache.
    pub fn remove(&mut self, name: &str) -> Option<Form> {
        self.forms.remove(name)
    }

    /// Returns the number of cached forms.
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Returns whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

//! # oxide-xmlform
//!
//! Forms defined in XML: grouped fields, data binding, filtering and
//! validation.
//!
//! A schema is a `<form>` root holding `<field>` elements, named
//! `<fields>` groups (nestable) and `<fieldset>` declarations. Several
//! fragments can be merged into one form, replacing or keeping fields that
//! already exist. Fields are addressed by name plus a dot-separated group
//! path such as `params.advanced`.
//!
//! This crate provides:
//! - Schema loading and merging with a node selector
//! - Group, field and fieldset lookup
//! - Data binding into an ordered dot-path store
//! - Filters (`RAW`, `INT_ARRAY`, `SAFEHTML`, `URL`, `TEL`, ...) and
//!   named external filters
//! - Validation with built-in and registered rules
//! - Bootstrap 5 field rendering
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use oxide_xmlform::{Form, FormContext, FormOptions};
//! use serde_json::json;
//!
//! let mut form = Form::new(
//!     "article",
//!     FormOptions::new().control("jform"),
//!     Arc::new(FormContext::new()),
//! );
//! form.load_str(
//!     r#"<form>
//!         <field name="title" label="Title" required="true"/>
//!         <fields name="params">
//!             <field name="website" type="url" filter="url" validate="url"/>
//!         </fields>
//!     </form>"#,
//!     true,
//!     None,
//! )?;
//!
//! let input = json!({"title": "Hello", "params": {"website": "example.com"}});
//! let filtered = form.filter(&input, None)?;
//! assert_eq!(filtered["params"]["website"], "http://example.com");
//!
//! assert!(form.validate(&filtered, None)?);
//! form.bind(&filtered)?;
//! assert_eq!(form.get_value("title", None, json!("")), "Hello");
//!
//! let input = form.get_input("website", Some("params"), None);
//! assert!(input.contains(r#"name="jform[params][website]""#));
//! # Ok::<(), oxide_xmlform::FormError>(())
//! ```
//!
//! ## Shared Instances
//!
//! [`FormRegistry`] caches forms by name. The first request for a name
//! loads the form; later requests get the cached instance.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use oxide_xmlform::{FormContext, FormOptions, FormRegistry};
//!
//! let mut registry = FormRegistry::new(Arc::new(FormContext::new()));
//! registry.get_instance("contact", "<form><field name=\"email\"/></form>", FormOptions::new(), true, None)?;
//! assert!(registry.contains("contact"));
//! # Ok::<(), oxide_xmlform::FormError>(())
//! ```

pub mod context;
mod data;
mod error;
pub mod fields;
pub mod filters;
mod form;
mod merge;
mod path;
mod registry;
mod resolver;
pub mod schema;
pub mod text;
pub mod validation;
pub mod value;

pub use context::{FormContext, FormContextBuilder, SearchPaths};
pub use data::{data_key, insert_path, lookup_path, DataStore};
pub use error::{FormError, Result};
pub use fields::{FieldBase, FieldContext, FieldType, FieldTypeRegistry, FormField};
pub use filters::{BuiltinFilter, Filter, FilterRegistry, InputFilter, Sanitizer};
pub use form::{FieldsetDescriptor, Form, FormOptions};
pub use registry::FormRegistry;
pub use resolver::GroupScope;
pub use schema::{Element, NodeId, SchemaTree, Selector};
pub use text::{MapTranslator, Translator};
pub use validation::{FailureKind, Rule, RuleOutcome, RuleRegistry, ValidationFailure};

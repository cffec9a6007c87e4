//! Error types for form definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Form-specific errors.
///
/// Data validation failures are not errors: they are collected as
/// [`ValidationFailure`](crate::ValidationFailure) records on the form.
#[derive(Debug, Error)]
pub enum FormError {
    /// The markup is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An element carries a malformed attribute.
    #[error("malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// The markup is well-formed at the token level but not as a document.
    #[error("invalid document: {0}")]
    Document(String),

    /// A schema file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A bare schema name was not found on any form search path.
    #[error("schema not found: {name} (searched {searched:?})")]
    SchemaNotFound {
        /// The requested name.
        name: String,
        /// Directories that were searched.
        searched: Vec<PathBuf>,
    },

    /// The operation needs a loaded schema.
    #[error("no schema loaded for form '{0}'")]
    NoSchema(String),

    /// A form instance was requested without any schema source.
    #[error("no schema source given for form '{0}'")]
    EmptySource(String),

    /// A field declares a validation rule that is not registered.
    #[error("validation rule missing: {0}")]
    RuleMissing(String),

    /// Bound or filtered data is not an object.
    #[error("invalid form data: expected an object, got {0}")]
    InvalidData(String),

    /// A node selector could not be parsed.
    #[error("invalid selector '{selector}': {message}")]
    Selector {
        /// The selector expression.
        selector: String,
        /// What went wrong.
        message: String,
    },
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

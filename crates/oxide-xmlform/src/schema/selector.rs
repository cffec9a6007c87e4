//! A small XPath subset for picking nodes out of a schema fragment.
//!
//! Supported syntax:
//! - `/form/fields` - absolute child steps from the document
//! - `//field` - descendant steps
//! - `fields/field` - steps relative to the root element
//! - `*` - any element
//! - `[@name]`, `[@name='x']`, `[@name="x"]` - attribute predicates

use std::collections::HashSet;

use super::{NodeId, SchemaTree};
use crate::error::{FormError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Has(String),
    Equals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    tag: Option<String>,
    predicates: Vec<Predicate>,
}

/// A compiled node selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    expression: String,
    absolute: bool,
    steps: Vec<Step>,
}

/// Evaluation context: the virtual document node or an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Context {
    Document,
    Node(NodeId),
}

impl Selector {
    /// Parses a selector expression.
    pub fn parse(expression: &str) -> Result<Self> {
        let error = |message: &str| FormError::Selector {
            selector: expression.to_string(),
            message: message.to_string(),
        };

        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(error("empty expression"));
        }

        let absolute = trimmed.starts_with('/');
        let chars: Vec<char> = trimmed.chars().collect();
        let mut steps = Vec::new();
        let mut pos = 0;

        while pos < chars.len() {
            let axis = if chars[pos..].starts_with(&['/', '/']) {
                pos += 2;
                Axis::Descendant
            } else if chars[pos] == '/' {
                pos += 1;
                Axis::Child
            } else if steps.is_empty() {
                Axis::Child
            } else {
                return Err(error("expected '/' between steps"));
            };

            let start = pos;
            while pos < chars.len() && chars[pos] != '/' && chars[pos] != '[' {
                pos += 1;
            }
            let name: String = chars[start..pos].iter().collect();
            let name = name.trim();
            if name.is_empty() {
                return Err(error("missing element name"));
            }
            let tag = (name != "*").then(|| name.to_string());

            let mut predicates = Vec::new();
            while pos < chars.len() && chars[pos] == '[' {
                let close = find_predicate_end(&chars, pos).ok_or_else(|| error("unclosed '['"))?;
                let body: String = chars[pos + 1..close].iter().collect();
                predicates.push(parse_predicate(body.trim()).ok_or_else(|| {
                    error("only [@attr] and [@attr='value'] predicates are supported")
                })?);
                pos = close + 1;
            }

            steps.push(Step {
                axis,
                tag,
                predicates,
            });
        }

        Ok(Self {
            expression: trimmed.to_string(),
            absolute,
            steps,
        })
    }

    /// Returns the source expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluates the selector and returns matching nodes in document order.
    pub fn select(&self, tree: &SchemaTree) -> Vec<NodeId> {
        let mut current = vec![if self.absolute {
            Context::Document
        } else {
            Context::Node(tree.root())
        }];

        for step in &self.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for context in &current {
                for candidate in candidates(tree, *context, step.axis) {
                    if step.matches(tree, candidate) && seen.insert(candidate) {
                        next.push(Context::Node(candidate));
                    }
                }
            }
            current = next;
        }

        let selected: HashSet<NodeId> = current
            .into_iter()
            .filter_map(|context| match context {
                Context::Node(id) => Some(id),
                Context::Document => None,
            })
            .collect();

        tree.descendants_or_self(tree.root())
            .into_iter()
            .filter(|id| selected.contains(id))
            .collect()
    }
}

impl Step {
    fn matches(&self, tree: &SchemaTree, id: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if tree.tag(id) != tag {
                return false;
            }
        }
        self.predicates.iter().all(|predicate| match predicate {
            Predicate::Has(name) => tree.attr(id, name).is_some(),
            Predicate::Equals(name, value) => tree.attr(id, name) == Some(value.as_str()),
        })
    }
}

fn candidates(tree: &SchemaTree, context: Context, axis: Axis) -> Vec<NodeId> {
    match (context, axis) {
        (Context::Document, Axis::Child) => vec![tree.root()],
        (Context::Document, Axis::Descendant) => tree.descendants_or_self(tree.root()),
        (Context::Node(id), Axis::Child) => tree.children(id).to_vec(),
        (Context::Node(id), Axis::Descendant) => tree.descendants(id),
    }
}

fn find_predicate_end(chars: &[char], open: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, ch) in chars[open + 1..].iter().enumerate() {
        match (quote, *ch) {
            (Some(q), c) if c == q => quote = None,
            (None, '\'' | '"') => quote = Some(*ch),
            (None, ']') => return Some(open + 1 + offset),
            _ => {}
        }
    }
    None
}

fn parse_predicate(body: &str) -> Option<Predicate> {
    let body = body.strip_prefix('@')?;
    match body.split_once('=') {
        None => {
            let name = body.trim();
            (!name.is_empty()).then(|| Predicate::Has(name.to_string()))
        }
        Some((name, value)) => {
            let name = name.trim();
            let value = value.trim();
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))?;
            (!name.is_empty()).then(|| Predicate::Equals(name.to_string(), unquoted.to_string()))
        }
    }
}

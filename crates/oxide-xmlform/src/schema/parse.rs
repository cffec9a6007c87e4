//! Markup to [`SchemaTree`] conversion.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{NodeId, SchemaTree};
use crate::error::{FormError, Result};

/// Deepest element nesting accepted by [`SchemaTree::parse`].
pub const MAX_DEPTH: usize = 256;

impl SchemaTree {
    /// Parses XML markup into a tree.
    ///
    /// Only well-formedness is checked. Whitespace-only text is dropped and
    /// element text is trimmed. Comments, processing instructions and the
    /// declaration are ignored. Nesting deeper than [`MAX_DEPTH`] elements
    /// is rejected.
    pub fn parse(markup: &str) -> Result<Self> {
        let mut reader = Reader::from_str(markup);
        reader.config_mut().trim_text(true);

        let mut tree: Option<SchemaTree> = None;
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(FormError::Document(format!(
                            "elements nested deeper than {MAX_DEPTH} levels"
                        )));
                    }
                    let id = open_element(&mut tree, &stack, &start)?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    open_element(&mut tree, &stack, &start)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    append_text(&mut tree, &stack, text.trim())?;
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    append_text(&mut tree, &stack, &String::from_utf8_lossy(&bytes))?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(FormError::Document(
                "unexpected end of input inside an element".to_string(),
            ));
        }
        tree.ok_or_else(|| FormError::Document("no root element".to_string()))
    }
}

fn open_element(
    tree: &mut Option<SchemaTree>,
    stack: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let id = if let Some(doc) = tree.as_mut() {
        let Some(parent) = stack.last() else {
            return Err(FormError::Document(format!(
                "unexpected second root element <{tag}>"
            )));
        };
        let id = doc.create_element(tag);
        doc.append_child(*parent, id);
        id
    } else {
        let doc = SchemaTree::new(tag);
        let root = doc.root();
        *tree = Some(doc);
        root
    };

    if let Some(doc) = tree.as_mut() {
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?;
            doc.set_attr(id, &key, value);
        }
    }

    Ok(id)
}

fn append_text(tree: &mut Option<SchemaTree>, stack: &[NodeId], text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    match (tree.as_mut(), stack.last()) {
        (Some(tree), Some(node)) => {
            let mut current = tree.text(*node).to_string();
            current.push_str(text);
            tree.set_text(*node, current);
            Ok(())
        }
        _ => Err(FormError::Document(
            "text content outside of the root element".to_string(),
        )),
    }
}

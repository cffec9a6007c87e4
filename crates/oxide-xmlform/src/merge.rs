//! Merging schema fragments into a form document.

use tracing::debug;

use crate::schema::{NodeId, SchemaTree, Selector, FIELD, FORM};

/// Merges `fragment` into `document`.
///
/// Without a document, a `<form>` fragment loaded without a selector
/// becomes the document as is. Otherwise the elements to merge are the
/// selector matches, or the children of a `<form>` root; other roots
/// contribute nothing. Every field an element declares is matched against
/// the document by name and group path: with `replace` the document node
/// is swapped for a copy of the incoming one in place, without it the
/// incoming field is dropped. What remains of each element is then copied
/// under the document root.
pub(crate) fn merge_fragment(
    document: &mut Option<SchemaTree>,
    mut fragment: SchemaTree,
    replace: bool,
    selector: Option<&Selector>,
) {
    let fragment_is_form = fragment.tag(fragment.root()) == FORM;

    if document.is_none() && selector.is_none() && fragment_is_form {
        debug!("adopting fragment as form document");
        *document = Some(fragment);
        return;
    }
    let doc = document.get_or_insert_with(SchemaTree::empty_form);

    let elements = match selector {
        Some(selector) => outermost(&fragment, selector.select(&fragment)),
        None if fragment_is_form => fragment.children(fragment.root()).to_vec(),
        None => {
            debug!(root = fragment.tag(fragment.root()), "fragment root is not a form, nothing to merge");
            Vec::new()
        }
    };

    for element in elements {
        let mut consumed = false;

        for field in fragment.descendants_or_self(element) {
            if fragment.tag(field) != FIELD || !is_within(&fragment, field, element) {
                continue;
            }
            let Some(name) = fragment.attr(field, "name").map(str::to_string) else {
                continue;
            };
            let group = fragment.group_of(field);
            let Some(existing) = doc.find_field(&name, group.as_deref()) else {
                continue;
            };

            if replace {
                debug!(field = %name, group = ?group, "replacing field");
                let copy = doc.import(&fragment, field);
                doc.replace(existing, copy);
            } else {
                debug!(field = %name, group = ?group, "keeping existing field");
            }
            fragment.detach(field);
            consumed |= field == element;
        }

        if consumed {
            continue;
        }
        let copy = doc.import(&fragment, element);
        let root = doc.root();
        doc.append_child(root, copy);
        debug!(element = fragment.tag(element), "merged element");
    }
}

/// Returns whether `node` is `top` or still hangs below it.
fn is_within(tree: &SchemaTree, node: NodeId, top: NodeId) -> bool {
    node == top || tree.ancestors(node).any(|ancestor| ancestor == top)
}

/// Drops matches that lie inside another match so nothing is copied twice.
fn outermost(tree: &SchemaTree, matches: Vec<NodeId>) -> Vec<NodeId> {
    matches
        .iter()
        .copied()
        .filter(|node| !tree.ancestors(*node).any(|ancestor| matches.contains(&ancestor)))
        .collect()
}

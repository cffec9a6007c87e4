//! Field lookup by name, group and fieldset.

use crate::schema::{NodeId, SchemaTree, FIELD, FIELDSET};

/// Which fields [`SchemaTree::find_fields_by_group`] enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupScope<'a> {
    /// Every field in the document.
    All,
    /// Only fields without a named group ancestor.
    Ungrouped,
    /// Fields of a dot-separated group path.
    Named(&'a str),
}

impl<'a> GroupScope<'a> {
    /// Maps an optional group path to a scope: `None` and `""` mean all fields.
    pub fn from_group(group: Option<&'a str>) -> Self {
        match group {
            Some(group) if !group.is_empty() => Self::Named(group),
            _ => Self::All,
        }
    }
}

impl SchemaTree {
    /// Finds the unique field with `name` in `group`.
    ///
    /// With a group, the field must sit in one of the group's containers and
    /// its full group path must equal `group`. Without a group (or with an
    /// empty one) only ungrouped fields are considered, so an unscoped lookup
    /// never returns a grouped field.
    pub fn find_field(&self, name: &str, group: Option<&str>) -> Option<NodeId> {
        match group.filter(|group| !group.is_empty()) {
            Some(group) => {
                let wanted: Vec<&str> = group.split('.').collect();
                self.find_group(group)
                    .into_iter()
                    .flat_map(|container| self.descendants(container))
                    .find(|id| self.is_field_named(*id, name) && self.group_path(*id) == wanted)
            }
            None => self
                .descendants(self.root())
                .into_iter()
                .find(|id| self.is_field_named(*id, name) && !self.has_named_group_ancestor(*id)),
        }
    }

    /// Enumerates fields in document order.
    ///
    /// For a named scope, `nested` controls whether fields of deeper groups
    /// below the resolved containers are included.
    pub fn find_fields_by_group(&self, scope: GroupScope<'_>, nested: bool) -> Vec<NodeId> {
        match scope {
            GroupScope::All => self.fields_where(|_| true),
            GroupScope::Ungrouped => self.fields_where(|id| !self.has_named_group_ancestor(id)),
            GroupScope::Named(group) => {
                let wanted: Vec<&str> = group.split('.').collect();
                let mut fields: Vec<NodeId> = Vec::new();
                for container in self.find_group(group) {
                    for id in self.descendants(container) {
                        if self.tag(id) != FIELD || fields.contains(&id) {
                            continue;
                        }
                        if nested || self.group_path(id) == wanted {
                            fields.push(id);
                        }
                    }
                }
                fields
            }
        }
    }

    /// Enumerates the fields of a fieldset in document order.
    ///
    /// A field belongs to the fieldset when it is declared under a
    /// `<fieldset name="...">` node or carries a matching `fieldset`
    /// attribute. Fields nested inside another field are skipped.
    pub fn find_fields_by_fieldset(&self, name: &str) -> Vec<NodeId> {
        self.fields_where(|id| {
            if self.ancestors(id).any(|ancestor| self.tag(ancestor) == FIELD) {
                return false;
            }
            self.attr(id, "fieldset") == Some(name)
                || self.ancestors(id).any(|ancestor| {
                    self.tag(ancestor) == FIELDSET && self.attr(ancestor, "name") == Some(name)
                })
        })
    }

    fn fields_where(&self, keep: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.tag(*id) == FIELD && keep(*id))
            .collect()
    }
}

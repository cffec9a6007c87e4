//! Group path resolution.

use crate::schema::{NodeId, SchemaTree, FIELDS};

impl SchemaTree {
    /// Resolves a dot-separated group path to its `<fields>` containers.
    ///
    /// The first segment only matches top-level named groups. Every further
    /// segment descends through the containers resolved so far and keeps a
    /// candidate only when its full chain of group names (itself included)
    /// equals the path prefix. The same group may be declared several times,
    /// so more than one container can be returned. An unknown path yields an
    /// empty list.
    pub fn find_group(&self, path: &str) -> Vec<NodeId> {
        let segments: Vec<&str> = path.split('.').collect();
        let Some(first) = segments.first().filter(|segment| !segment.is_empty()) else {
            return Vec::new();
        };

        let mut current: Vec<NodeId> = self
            .descendants_or_self(self.root())
            .into_iter()
            .filter(|id| {
                self.tag(*id) == FIELDS
                    && self.attr(*id, "name") == Some(*first)
                    && !self.has_named_group_ancestor(*id)
            })
            .collect();

        for depth in 1..segments.len() {
            let prefix = &segments[..=depth];
            let mut next: Vec<NodeId> = Vec::new();
            for container in &current {
                for candidate in self.descendants(*container) {
                    if self.tag(candidate) == FIELDS
                        && self.attr(candidate, "name") == Some(segments[depth])
                        && self.group_path_or_self(candidate) == prefix
                        && !next.contains(&candidate)
                    {
                        next.push(candidate);
                    }
                }
            }
            current = next;
        }

        current
    }
}

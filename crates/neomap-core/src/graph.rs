// Dweve Neomap - Object-Graph Mapping for Property Graphs
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The object graph: an arena of entities with their raw snapshots.

use std::collections::{HashMap, VecDeque};
use std::ops::{Index, IndexMut};

use crate::entity::{Entity, EntityRef};
use crate::identity::NodeId;
use crate::snapshot::NodeSnapshot;

/// Arena of entity instances forming one unit of work.
///
/// Entities are addressed by [`EntityRef`]. Loaded entities are also indexed
/// by their store identity and carry the [`NodeSnapshot`] captured when they
/// were read. The graph may contain cycles.
#[derive(Debug, Clone, Default)]
pub struct ObjectGraph {
    entities: Vec<Entity>,
    by_node: HashMap<NodeId, EntityRef>,
    roots: Vec<EntityRef>,
    snapshots: HashMap<EntityRef, NodeSnapshot>,
}

impl ObjectGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity and return its reference.
    pub fn add(&mut self, entity: Entity) -> EntityRef {
        let r = EntityRef(self.entities.len());
        if let Some(id) = entity.native_id {
            self.by_node.insert(id, r);
        }
        self.entities.push(entity);
        r
    }

    /// Add an entity and mark it as a root.
    pub fn add_root(&mut self, entity: Entity) -> EntityRef {
        let r = self.add(entity);
        self.roots.push(r);
        r
    }

    /// Mark an existing entity as a root.
    pub fn mark_root(&mut self, r: EntityRef) {
        if !self.roots.contains(&r) {
            self.roots.push(r);
        }
    }

    /// An entity, if the reference belongs to this graph.
    pub fn get(&self, r: EntityRef) -> Option<&Entity> {
        self.entities.get(r.0)
    }

    /// Mutable access to an entity.
    pub fn get_mut(&mut self, r: EntityRef) -> Option<&mut Entity> {
        self.entities.get_mut(r.0)
    }

    /// The entity backed by a store node.
    pub fn find(&self, id: NodeId) -> Option<EntityRef> {
        self.by_node.get(&id).copied()
    }

    /// Record the store identity of an entity after it was persisted.
    pub fn bind_native_id(&mut self, r: EntityRef, id: NodeId) {
        if let Some(entity) = self.entities.get_mut(r.0) {
            if let Some(old) = entity.native_id.replace(id) {
                self.by_node.remove(&old);
            }
            self.by_node.insert(id, r);
        }
    }

    /// Root entities in the order they were added.
    pub fn roots(&self) -> &[EntityRef] {
        &self.roots
    }

    /// The first root.
    pub fn root(&self) -> Option<EntityRef> {
        self.roots.first().copied()
    }

    /// Every entity with its reference, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityRef, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityRef(i), e))
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the graph holds no entity.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The last-known raw state of a loaded entity.
    pub fn snapshot(&self, r: EntityRef) -> Option<&NodeSnapshot> {
        self.snapshots.get(&r)
    }

    /// Mutable access to the raw state of a loaded entity.
    pub fn snapshot_mut(&mut self, r: EntityRef) -> Option<&mut NodeSnapshot> {
        self.snapshots.get_mut(&r)
    }

    /// Replace the raw state of an entity.
    pub fn set_snapshot(&mut self, r: EntityRef, snapshot: NodeSnapshot) {
        self.snapshots.insert(r, snapshot);
    }

    /// Drop the raw state of an entity. A later save treats it as unloaded.
    pub fn evict(&mut self, r: EntityRef) -> Option<NodeSnapshot> {
        self.snapshots.remove(&r)
    }

    /// Move every entity of `other` into this graph.
    ///
    /// An incoming entity backed by a node this graph already holds is
    /// folded into the existing instance, which keeps its state. Returns the
    /// references of `other`'s roots in this graph; they also become roots
    /// here.
    pub fn merge_from(&mut self, other: ObjectGraph) -> Vec<EntityRef> {
        let ObjectGraph {
            entities,
            roots,
            mut snapshots,
            ..
        } = other;

        let mut mapping = Vec::with_capacity(entities.len());
        let mut fresh = Vec::new();
        for (i, entity) in entities.into_iter().enumerate() {
            match entity.native_id.and_then(|id| self.find(id)) {
                Some(existing) => mapping.push(existing),
                None => {
                    let snapshot = snapshots.remove(&EntityRef(i));
                    let r = self.add(entity);
                    if let Some(s) = snapshot {
                        self.snapshots.insert(r, s);
                    }
                    mapping.push(r);
                    fresh.push(r);
                }
            }
        }

        for r in fresh {
            for related in self.entities[r.0].relationships.values_mut() {
                for link in related.links_mut() {
                    link.target = mapping[link.target.0];
                }
            }
        }

        let merged: Vec<EntityRef> = roots.into_iter().map(|r| mapping[r.0]).collect();
        for r in &merged {
            self.mark_root(*r);
        }
        merged
    }

    /// Every entity reachable from `start` through links, `start` first.
    pub fn reachable(&self, start: EntityRef) -> Vec<EntityRef> {
        let mut seen = vec![false; self.entities.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(r) = queue.pop_front() {
            match seen.get_mut(r.0) {
                Some(flag) if !*flag => *flag = true,
                _ => continue,
            }
            order.push(r);
            for related in self.entities[r.0].relationships.values() {
                queue.extend(related.targets());
            }
        }
        order
    }
}

impl Index<EntityRef> for ObjectGraph {
    type Output = Entity;

    fn index(&self, r: EntityRef) -> &Entity {
        &self.entities[r.0]
    }
}

impl IndexMut<EntityRef> for ObjectGraph {
    fn index_mut(&mut self, r: EntityRef) -> &mut Entity {
        &mut self.entities[r.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Link;
    use std::collections::BTreeSet;

    fn loaded(type_name: &str, id: i64) -> Entity {
        let mut e = Entity::new(type_name);
        e.native_id = Some(NodeId(id));
        e
    }

    #[test]
    fn test_add_and_find() {
        let mut g = ObjectGraph::new();
        let a = g.add_root(loaded("Person", 10));
        let b = g.add(Entity::new("Person"));
        assert_eq!(g.find(NodeId(10)), Some(a));
        assert_eq!(g.roots(), &[a]);
        assert_eq!(g.len(), 2);

        g.bind_native_id(b, NodeId(11));
        assert_eq!(g.find(NodeId(11)), Some(b));
        assert_eq!(g[b].native_id, Some(NodeId(11)));
    }

    #[test]
    fn test_reachable_terminates_on_cycles() {
        let mut g = ObjectGraph::new();
        let a = g.add_root(Entity::new("Person"));
        let b = g.add(Entity::new("Person"));
        let c = g.add(Entity::new("Person"));
        g[a].link("friends", Link::to(b));
        g[b].link("friends", Link::to(a));
        assert_eq!(g.reachable(a), vec![a, b]);
        assert_eq!(g.reachable(c), vec![c]);
    }

    #[test]
    fn test_merge_from_remaps_links_and_snapshots() {
        let mut first = ObjectGraph::new();
        first.add_root(loaded("Person", 1));

        let mut second = ObjectGraph::new();
        let x = second.add_root(loaded("Person", 2));
        let y = second.add(loaded("Person", 3));
        second[x].link("friends", Link::to(y));
        second.set_snapshot(
            x,
            NodeSnapshot::new(NodeId(2), BTreeSet::new(), Default::default()),
        );

        let merged = first.merge_from(second);
        assert_eq!(merged.len(), 1);
        let x2 = merged[0];
        assert_eq!(first.roots().len(), 2);
        assert_eq!(first[x2].native_id, Some(NodeId(2)));
        let target = first[x2].targets("friends")[0];
        assert_eq!(first[target].native_id, Some(NodeId(3)));
        assert!(first.snapshot(x2).is_some());
    }

    #[test]
    fn test_merge_from_folds_known_nodes() {
        let mut first = ObjectGraph::new();
        let a = first.add_root(loaded("Person", 1).with("name", "first"));

        let mut second = ObjectGraph::new();
        second.add_root(loaded("Person", 1).with("name", "second"));

        let merged = first.merge_from(second);
        assert_eq!(merged, vec![a]);
        assert_eq!(first.len(), 1);
        assert_eq!(first[a].get("name").and_then(|v| v.as_str()), Some("first"));
    }

    #[test]
    fn test_evict_drops_snapshot() {
        let mut g = ObjectGraph::new();
        let a = g.add(loaded("Person", 1));
        g.set_snapshot(a, NodeSnapshot::new(NodeId(1), BTreeSet::new(), Default::default()));
        assert!(g.evict(a).is_some());
        assert!(g.snapshot(a).is_none());
    }
}

use crate::properties::Attributes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Security zone tier. 1 is the most critical zone, higher is more exposed.
pub type Level = u32;

/// Level assumed for any node whose level is unknown.
pub const DEFAULT_LEVEL: Level = 1;
/// Level given to the source of an ingested row that carries no explicit level.
pub const DEFAULT_SOURCE_LEVEL: Level = 2;
/// Level given to the target of an ingested row that carries no explicit level.
pub const DEFAULT_TARGET_LEVEL: Level = 1;

/// Where a node's level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelOrigin {
    /// Supplied by input or sample data.
    Explicit,
    /// Assigned by the default level policy.
    Defaulted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrs {
    pub level: Level,
    #[serde(default)]
    pub role: String,
    pub level_origin: LevelOrigin,
}

impl NodeAttrs {
    pub fn new(level: Level, role: impl Into<String>) -> Self {
        Self {
            level: level.max(1),
            role: role.into(),
            level_origin: LevelOrigin::Explicit,
        }
    }

    pub fn defaulted(level: Level) -> Self {
        Self {
            level: level.max(1),
            role: String::new(),
            level_origin: LevelOrigin::Defaulted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub attrs: Attributes,
}

/// Directed network topology annotated with zone levels.
///
/// Nodes are kept in insertion order. Edges are unique per (source, target)
/// pair and iterate in the order the pair was first inserted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopologyModel {
    nodes: IndexMap<String, NodeAttrs>,
    /// Adjacency list: node index -> Vec<(target index, edge index)>
    adj: Vec<Vec<(u32, u32)>>,
    edges: Vec<Edge>,
}

impl TopologyModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&NodeAttrs> {
        self.nodes.get(id)
    }

    /// Level of a node, `DEFAULT_LEVEL` if the node is unknown.
    pub fn level(&self, id: &str) -> Level {
        self.nodes.get(id).map(|n| n.level).unwrap_or(DEFAULT_LEVEL)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeAttrs)> + '_ {
        self.nodes.iter().map(|(id, attrs)| (id.as_str(), attrs))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter()
    }

    /// Insert or replace a node. Existing edges are kept.
    pub fn add_node(&mut self, id: &str, attrs: NodeAttrs) {
        if let Some(existing) = self.nodes.get_mut(id) {
            *existing = attrs;
            return;
        }
        self.nodes.insert(id.to_string(), attrs);
        self.adj.push(Vec::new());
    }

    /// Index of `id`, creating it with a defaulted level if missing.
    /// An existing node is never modified.
    pub fn ensure_node(&mut self, id: &str, default_level: Level) -> usize {
        if let Some(index) = self.nodes.get_index_of(id) {
            return index;
        }
        self.add_node(id, NodeAttrs::defaulted(default_level));
        self.nodes.len() - 1
    }

    /// Give `id` a role default. Creates the node if missing and replaces a
    /// level that was itself only defaulted; explicit levels are kept.
    pub fn apply_default_level(&mut self, id: &str, default_level: Level) -> usize {
        let index = self.ensure_node(id, default_level);
        if let Some((_, node)) = self.nodes.get_index_mut(index) {
            if node.level_origin == LevelOrigin::Defaulted {
                node.level = default_level.max(1);
            }
        }
        index
    }

    /// Set an explicit level. Creates the node if needed; last write wins.
    pub fn set_level(&mut self, id: &str, level: Level) {
        self.ensure_node(id, level);
        if let Some(node) = self.nodes.get_mut(id) {
            node.level = level.max(1);
            node.level_origin = LevelOrigin::Explicit;
        }
    }

    pub fn set_role(&mut self, id: &str, role: impl Into<String>) {
        self.ensure_node(id, DEFAULT_LEVEL);
        if let Some(node) = self.nodes.get_mut(id) {
            node.role = role.into();
        }
    }

    /// Insert a directed edge, creating missing endpoints at `DEFAULT_LEVEL`.
    ///
    /// Returns `false` when the pair already existed; its attributes are
    /// merged with the new ones (last write wins per key) and its position
    /// in edge order is kept.
    pub fn add_edge(&mut self, source: &str, target: &str, attrs: Attributes) -> bool {
        let src = self.ensure_node(source, DEFAULT_LEVEL);
        let dst = self.ensure_node(target, DEFAULT_LEVEL);

        if let Some(&(_, edge_id)) = self.adj[src].iter().find(|(t, _)| *t as usize == dst) {
            self.edges[edge_id as usize].attrs.extend(attrs);
            return false;
        }

        let edge_id = self.edges.len() as u32;
        self.adj[src].push((dst as u32, edge_id));
        self.edges.push(Edge {
            source: source.to_string(),
            target: target.to_string(),
            attrs,
        });
        true
    }

    pub fn contains_edge(&self, source: &str, target: &str) -> bool {
        match (self.nodes.get_index_of(source), self.nodes.get_index_of(target)) {
            (Some(src), Some(dst)) => self.adj[src].iter().any(|(t, _)| *t as usize == dst),
            _ => false,
        }
    }

    pub fn successors(&self, id: &str) -> impl Iterator<Item = &str> + '_ {
        self.nodes
            .get_index_of(id)
            .and_then(move |index| self.adj.get(index))
            .into_iter()
            .flatten()
            .filter_map(move |(dst, _)| self.nodes.get_index(*dst as usize))
            .map(|(id, _)| id.as_str())
    }

    /// In-degree plus out-degree. A self loop counts twice.
    pub fn degree(&self, id: &str) -> usize {
        self.edges
            .iter()
            .map(|e| usize::from(e.source == id) + usize::from(e.target == id))
            .sum()
    }

    /// Nodes that take part in no edge, in insertion order.
    pub fn isolated_nodes(&self) -> Vec<String> {
        let mut touched = vec![false; self.nodes.len()];
        for (src, neighbors) in self.adj.iter().enumerate() {
            if !neighbors.is_empty() {
                touched[src] = true;
            }
            for (dst, _) in neighbors {
                touched[*dst as usize] = true;
            }
        }
        self.nodes
            .keys()
            .zip(touched)
            .filter(|(_, t)| !t)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Node count per level, ascending by level.
    pub fn level_histogram(&self) -> BTreeMap<Level, usize> {
        let mut histogram = BTreeMap::new();
        for attrs in self.nodes.values() {
            *histogram.entry(attrs.level).or_insert(0) += 1;
        }
        histogram
    }

    /// Position of a node in insertion order.
    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.get_index_of(id)
    }
}

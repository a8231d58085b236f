//! Operation type forest.
//!
//! Nodes live in a flat arena; `parent` and `children` hold arena indices.
//! All traversals use an explicit queue or loop with a visited set, so deep
//! trees cannot overflow the stack and cyclic data cannot loop forever.

use std::collections::{BTreeSet, HashMap, VecDeque};

use org_directory_sdk::OperationType;
use tracing::warn;

/// Flat operation type row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTypeRecord {
    pub id: i64,
    pub title: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug)]
struct Node {
    id: i64,
    title: String,
    folded_title: String,
    parent_id: Option<i64>,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct CategoryForest {
    nodes: Vec<Node>,
    index: HashMap<i64, usize>,
}

impl CategoryForest {
    /// Builds the arena. Nodes are kept in identifier order; a parent id that
    /// does not resolve leaves the node without a parent link.
    #[must_use]
    pub fn build(mut records: Vec<OperationTypeRecord>) -> Self {
        records.sort_by_key(|r| r.id);
        records.dedup_by_key(|r| r.id);

        let index: HashMap<i64, usize> = records
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.id, idx))
            .collect();

        let mut nodes: Vec<Node> = records
            .into_iter()
            .map(|r| Node {
                id: r.id,
                folded_title: r.title.to_lowercase(),
                title: r.title,
                parent_id: r.parent_id,
                parent: None,
                children: Vec::new(),
            })
            .collect();

        for idx in 0..nodes.len() {
            let Some(parent_id) = nodes[idx].parent_id else {
                continue;
            };
            match index.get(&parent_id) {
                Some(&parent) => {
                    nodes[idx].parent = Some(parent);
                    nodes[parent].children.push(idx);
                }
                None => warn!(
                    operation_type_id = nodes[idx].id,
                    parent_id, "Operation type references a missing parent"
                ),
            }
        }

        let forest = Self { nodes, index };
        if let Some(id) = forest.find_cycle_member() {
            warn!(
                operation_type_id = id,
                "Operation type hierarchy contains a cycle"
            );
        }
        forest
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    /// Arena indices of nodes whose title contains `pattern`, ignoring case.
    /// An empty pattern matches every node.
    #[must_use]
    pub fn matching(&self, pattern: &str) -> Vec<usize> {
        let needle = pattern.trim().to_lowercase();
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.folded_title.contains(needle.as_str()))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Seeds plus every node reachable from them along parent-to-child edges.
    /// Each node is visited at most once. Out-of-range seeds are skipped.
    #[must_use]
    pub fn closure(&self, seeds: &[usize]) -> Vec<usize> {
        let mut visited = vec![false; self.nodes.len()];
        let mut queue: VecDeque<usize> = VecDeque::with_capacity(seeds.len());
        let mut out = Vec::new();

        for &seed in seeds {
            if seed < self.nodes.len() && !visited[seed] {
                visited[seed] = true;
                queue.push_back(seed);
            }
        }

        while let Some(idx) = queue.pop_front() {
            out.push(idx);
            for &child in &self.nodes[idx].children {
                if !visited[child] {
                    visited[child] = true;
                    queue.push_back(child);
                }
            }
        }

        out
    }

    /// Identifiers of the categories matching `pattern` and all their
    /// descendants, or `None` when no title matches.
    #[must_use]
    pub fn resolve_pattern(&self, pattern: &str) -> Option<BTreeSet<i64>> {
        let seeds = self.matching(pattern);
        if seeds.is_empty() {
            return None;
        }
        Some(self.closure(&seeds).into_iter().map(|idx| self.nodes[idx].id).collect())
    }

    /// Hydrated operation type with its ancestor chain, root last.
    #[must_use]
    pub fn operation_type(&self, id: i64) -> Option<OperationType> {
        let start = *self.index.get(&id)?;

        let mut chain = vec![start];
        let mut visited = vec![false; self.nodes.len()];
        visited[start] = true;
        let mut cursor = self.nodes[start].parent;
        while let Some(idx) = cursor {
            if visited[idx] {
                break;
            }
            visited[idx] = true;
            chain.push(idx);
            cursor = self.nodes[idx].parent;
        }

        let mut hydrated: Option<OperationType> = None;
        for &idx in chain.iter().rev() {
            let node = &self.nodes[idx];
            hydrated = Some(OperationType {
                id: node.id,
                title: node.title.clone(),
                parent_id: node.parent_id,
                parent: hydrated.map(Box::new),
            });
        }
        hydrated
    }

    /// Some node lying on a parent cycle, if there is one.
    fn find_cycle_member(&self) -> Option<i64> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            OnPath,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut path = Vec::new();

        for start in 0..self.nodes.len() {
            let mut cursor = Some(start);
            while let Some(idx) = cursor {
                match marks[idx] {
                    Mark::Done => break,
                    Mark::OnPath => return Some(self.nodes[idx].id),
                    Mark::Unvisited => {
                        marks[idx] = Mark::OnPath;
                        path.push(idx);
                        cursor = self.nodes[idx].parent;
                    }
                }
            }
            for idx in path.drain(..) {
                marks[idx] = Mark::Done;
            }
        }
        None
    }
}

use std::collections::{BTreeSet, HashMap};

use crate::debruijn::kmer_encoding::KmerEncodingUtils;
use crate::debruijn::positional::kmer_path_node::{KmerPathNode, NodeId};
use crate::utils::errors::AssemblyError;
use crate::utils::interval_utils::IntervalUtils;

/**
 * One occurrence of a kmer within a live path node.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerOccurrence {
    pub node: NodeId,
    pub offset: usize,
    pub collapsed: bool,
}

/**
 * Owner of all live path nodes.
 *
 * Nodes are arena-allocated with never-reused integer ids; adjacency is
 * stored as id sets on each node and derived at insertion time from the kmer
 * successor relation plus first-interval overlap. Two ordered views are kept
 * over the arena, one over all nodes and one over non-reference nodes, both
 * keyed by (first_start, first_kmer, id), plus a lookup from every primary
 * and collapsed kmer to its occurrences.
 */
#[derive(Debug)]
pub struct PathNodeGraph {
    k: usize,
    nodes: HashMap<NodeId, KmerPathNode>,
    by_position: BTreeSet<(i32, u64, NodeId)>,
    non_reference_by_position: BTreeSet<(i32, u64, NodeId)>,
    by_kmer: HashMap<u64, Vec<KmerOccurrence>>,
    next_id: u64,
}

impl PathNodeGraph {
    pub fn new(k: usize) -> Self {
        assert!(k >= 1 && k <= KmerEncodingUtils::MAX_K);
        PathNodeGraph {
            k,
            nodes: HashMap::new(),
            by_position: BTreeSet::new(),
            non_reference_by_position: BTreeSet::new(),
            by_kmer: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /**
     * Live node for the given id. Panics on a dead id; callers holding ids
     * across mutations must check liveness with contains() first.
     */
    pub fn node(&self, id: NodeId) -> &KmerPathNode {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("Lookup of dead node {}", id))
    }

    pub fn get(&self, id: NodeId) -> Option<&KmerPathNode> {
        self.nodes.get(&id)
    }

    /**
     * First start position of the earliest live node, or i32::MAX when the
     * graph is empty
     */
    pub fn first_start(&self) -> i32 {
        self.by_position
            .iter()
            .next()
            .map(|(start, _, _)| *start)
            .unwrap_or(i32::MAX)
    }

    /**
     * First start position of the earliest live non-reference node, or
     * i32::MAX when no non-reference node is loaded
     */
    pub fn first_non_reference_start(&self) -> i32 {
        self.non_reference_by_position
            .iter()
            .next()
            .map(|(start, _, _)| *start)
            .unwrap_or(i32::MAX)
    }

    /**
     * All occurrences of the given kmer, primary and collapsed
     */
    pub fn lookup(&self, kmer: u64) -> &[KmerOccurrence] {
        self.by_kmer.get(&kmer).map(Vec::as_slice).unwrap_or(&[])
    }

    /**
     * Live nodes in (first_start, first_kmer, id) order
     */
    pub fn iter_by_position(&self) -> impl Iterator<Item = &KmerPathNode> {
        self.by_position.iter().map(|(_, _, id)| &self.nodes[id])
    }

    /**
     * Largest number of live occurrences sharing a single kmer
     */
    pub fn max_kmer_occurrence_count(&self) -> usize {
        self.by_kmer
            .values()
            .map(|occurrences| occurrences.len())
            .max()
            .unwrap_or(0)
    }

    /**
     * Adds the given node, assigning it a fresh id, indexing its kmers and
     * linking it to its positional neighbours.
     *
     * Fails when the node's first kmer occurs in a live node over an
     * intersecting first interval; each (kmer, interval) in the live graph
     * must be unique.
     */
    pub fn add(&mut self, mut node: KmerPathNode) -> Result<NodeId, AssemblyError> {
        for occurrence in self.lookup(node.first_kmer()) {
            if occurrence.collapsed || occurrence.offset != 0 {
                continue;
            }
            let existing = &self.nodes[&occurrence.node];
            if IntervalUtils::overlaps_closed(
                existing.first_start(),
                existing.first_end(),
                node.first_start(),
                node.first_end(),
            ) {
                return Err(AssemblyError::InvariantViolation(format!(
                    "First kmer of new node over [{}, {}] already live in {} over [{}, {}]",
                    node.first_start(),
                    node.first_end(),
                    existing.id(),
                    existing.first_start(),
                    existing.first_end()
                )));
            }
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        node.set_id(id);

        for (offset, kmer) in node.kmers().iter().enumerate() {
            self.by_kmer.entry(*kmer).or_default().push(KmerOccurrence {
                node: id,
                offset,
                collapsed: false,
            });
        }
        for (kmer, offset) in node
            .collapsed_kmers()
            .iter()
            .zip(node.collapsed_offsets().iter())
        {
            self.by_kmer.entry(*kmer).or_default().push(KmerOccurrence {
                node: id,
                offset: *offset,
                collapsed: true,
            });
        }
        self.by_position
            .insert((node.first_start(), node.first_kmer(), id));
        if !node.is_reference() {
            self.non_reference_by_position
                .insert((node.first_start(), node.first_kmer(), id));
        }

        let successors = self.adjacent_successors(&node, id);
        let predecessors = self.adjacent_predecessors(&node, id);
        for successor in &successors {
            node.add_next(*successor);
        }
        for predecessor in &predecessors {
            node.add_prev(*predecessor);
        }
        self.nodes.insert(id, node);
        for successor in successors {
            if let Some(next) = self.nodes.get_mut(&successor) {
                next.add_prev(id);
            }
        }
        for predecessor in predecessors {
            if let Some(prev) = self.nodes.get_mut(&predecessor) {
                prev.add_next(id);
            }
        }
        Ok(id)
    }

    /**
     * Removes the node, unlinking it from its neighbours and dropping all of
     * its index entries. Returns the removed node.
     */
    pub fn remove(&mut self, id: NodeId) -> Option<KmerPathNode> {
        let node = self.nodes.remove(&id)?;
        self.by_position
            .remove(&(node.first_start(), node.first_kmer(), id));
        self.non_reference_by_position
            .remove(&(node.first_start(), node.first_kmer(), id));
        let mut kmers: Vec<u64> = node.kmers().to_vec();
        kmers.extend_from_slice(node.collapsed_kmers());
        kmers.sort_unstable();
        kmers.dedup();
        for kmer in kmers {
            if let Some(occurrences) = self.by_kmer.get_mut(&kmer) {
                occurrences.retain(|occurrence| occurrence.node != id);
                if occurrences.is_empty() {
                    self.by_kmer.remove(&kmer);
                }
            }
        }
        for neighbour in node.prev().iter().chain(node.next().iter()) {
            if let Some(other) = self.nodes.get_mut(neighbour) {
                other.remove_next(id);
                other.remove_prev(id);
            }
        }
        Some(node)
    }

    fn adjacent_successors(&self, node: &KmerPathNode, id: NodeId) -> Vec<NodeId> {
        let length = node.length() as i32;
        let mut successors = Vec::new();
        for base in 0..4u64 {
            let next_kmer = KmerEncodingUtils::next_state(self.k, node.last_kmer(), base);
            for occurrence in self.lookup(next_kmer) {
                if occurrence.collapsed || occurrence.offset != 0 || occurrence.node == id {
                    continue;
                }
                let candidate = &self.nodes[&occurrence.node];
                if IntervalUtils::overlaps_closed(
                    node.first_start() + length,
                    node.first_end() + length,
                    candidate.first_start(),
                    candidate.first_end(),
                ) && !successors.contains(&occurrence.node)
                {
                    successors.push(occurrence.node);
                }
            }
        }
        // a node may chain onto itself when its interval is wide enough
        if KmerEncodingUtils::is_next(self.k, node.last_kmer(), node.first_kmer())
            && IntervalUtils::overlaps_closed(
                node.first_start() + length,
                node.first_end() + length,
                node.first_start(),
                node.first_end(),
            )
            && !successors.contains(&id)
        {
            successors.push(id);
        }
        successors
    }

    fn adjacent_predecessors(&self, node: &KmerPathNode, id: NodeId) -> Vec<NodeId> {
        let mut predecessors = Vec::new();
        for base in 0..4u64 {
            let prev_kmer = KmerEncodingUtils::prev_state(self.k, node.first_kmer(), base);
            for occurrence in self.lookup(prev_kmer) {
                if occurrence.collapsed || occurrence.node == id {
                    continue;
                }
                let candidate = &self.nodes[&occurrence.node];
                if occurrence.offset != candidate.length() - 1 {
                    continue;
                }
                let length = candidate.length() as i32;
                if IntervalUtils::overlaps_closed(
                    candidate.first_start() + length,
                    candidate.first_end() + length,
                    node.first_start(),
                    node.first_end(),
                ) && !predecessors.contains(&occurrence.node)
                {
                    predecessors.push(occurrence.node);
                }
            }
        }
        predecessors
    }

    /**
     * Sanity check hook: no two live nodes may share a first kmer over
     * intersecting first intervals.
     */
    pub fn sanity_check_disjoint_node_intervals(&self) -> bool {
        let mut by_first_kmer: HashMap<u64, Vec<(i32, i32, NodeId)>> = HashMap::new();
        for node in self.nodes.values() {
            by_first_kmer.entry(node.first_kmer()).or_default().push((
                node.first_start(),
                node.first_end(),
                node.id(),
            ));
        }
        for intervals in by_first_kmer.values_mut() {
            if intervals.len() == 1 {
                continue;
            }
            intervals.sort_unstable();
            for pair in intervals.windows(2) {
                if pair[0].1 >= pair[1].0 {
                    error!(
                        "Nodes {} and {} share a first kmer over intersecting intervals",
                        pair[0].2, pair[1].2
                    );
                    return false;
                }
            }
        }
        true
    }
}

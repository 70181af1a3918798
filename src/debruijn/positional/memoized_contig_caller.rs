use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::io::Write;
use std::rc::Rc;

use crate::debruijn::positional::kmer_path_node::{KmerPathNode, NodeId};
use crate::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use crate::debruijn::positional::path_node_graph::PathNodeGraph;
use crate::debruijn::positional::traversal_node::TraversalNode;
use crate::utils::interval_utils::IntervalUtils;

/**
 * Score contributed by each reference node on a path.
 *
 * Unanchored path scores are sums of evidence weights and reference kmers
 * are not scored, so the highest weighted path would otherwise prefer to end
 * at sequencing-error tails rather than at the reference. Reference nodes
 * are instead given a score far above any achievable evidence weight sum, so
 * the longest anchored extension always outranks unanchored alternatives.
 */
pub const ANCHORED_SCORE: i64 = i64::MAX >> 21;

/**
 * Frontier ordering key. Entries are processed in order of the position of
 * their first successor kmer, which is the earliest position whose
 * memoization they can still change.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FrontierKey {
    extension_start: i32,
    kmer: u64,
    node: NodeId,
    first_start: i32,
}

/**
 * A memoized piece, or the remainder of one, still awaiting forward
 * propagation over [first_start, first_end].
 */
#[derive(Debug, Clone)]
struct FrontierEntry {
    first_start: i32,
    first_end: i32,
    tn: Rc<TraversalNode>,
}

/**
 * Incrementally memoizes the best-scoring path ending at every loaded node.
 *
 * Every loaded node owns a partition of its first interval into traversal
 * pieces of constant best score and predecessor, always covering the full
 * interval. Newly added nodes wait in a pending queue; advancing the
 * frontier seeds them in position order and then relaxes the frontier to
 * exhaustion: a piece is propagated into its successors only over the
 * positions whose successor set is fully loaded, that is whose extension
 * positions all precede the first unloaded input position. Relaxation is
 * monotone (a memoized piece is only displaced by a strictly better one), so
 * repeated propagation converges on the same memoization a from-scratch
 * replay of the live node set would produce.
 *
 * Node removal purges the removed nodes' partitions, resets every node whose
 * memoized path ran through a removed node back to its self-seeded
 * partition, and re-queues the predecessors of each reset node so the next
 * relaxation restores the fixpoint.
 */
pub struct MemoizedContigCaller {
    anchored_score: i64,
    memoized: HashMap<NodeId, Vec<Rc<TraversalNode>>>,
    frontier: BTreeMap<FrontierKey, FrontierEntry>,
    pending: BTreeSet<(i32, u64, NodeId)>,
}

impl MemoizedContigCaller {
    pub fn new(anchored_score: i64) -> Self {
        MemoizedContigCaller {
            anchored_score,
            memoized: HashMap::new(),
            frontier: BTreeMap::new(),
            pending: BTreeSet::new(),
        }
    }

    /**
     * Announces a node newly added to the graph
     */
    pub fn add(&mut self, node: &KmerPathNode) {
        self.pending
            .insert((node.first_start(), node.first_kmer(), node.id()));
    }

    /**
     * Announces the impending removal of the given nodes. Must be called
     * while the nodes are still live in the graph.
     */
    pub fn remove(&mut self, nodes: &[NodeId], graph: &PathNodeGraph) {
        let removed: HashSet<NodeId> = nodes.iter().cloned().collect();
        for id in nodes {
            self.memoized.remove(id);
            let node = graph.node(*id);
            self.pending
                .remove(&(node.first_start(), node.first_kmer(), *id));
        }
        let stale: Vec<NodeId> = self
            .memoized
            .iter()
            .filter(|(_, pieces)| pieces.iter().any(|p| p.path_contains_any(&removed)))
            .map(|(id, _)| *id)
            .collect();
        let stale_set: HashSet<NodeId> = stale.iter().cloned().collect();
        self.frontier.retain(|_, entry| {
            let owner = entry.tn.subnode().node();
            !removed.contains(&owner)
                && !stale_set.contains(&owner)
                && !entry.tn.path_contains_any(&removed)
        });
        for id in &stale {
            self.memoized.remove(id);
            self.seed(graph, *id);
        }
        for id in &stale {
            let predecessors: Vec<NodeId> = graph.node(*id).prev().to_vec();
            for prev_id in predecessors {
                if let Some(pieces) = self.memoized.get(&prev_id) {
                    for piece in pieces.clone() {
                        self.insert_frontier_piece(piece, graph);
                    }
                }
            }
        }
    }

    /**
     * Best completed contig given that all input before unprocessed_position
     * has been loaded.
     *
     * A piece is callable over the positions from which no extension exists:
     * every successor position is past the loaded graph and precedes no
     * loaded successor node. Only paths containing a non-reference node are
     * candidates, and leading and trailing reference nodes are stripped from
     * the returned path. Ties between equally scored candidates resolve to
     * the earliest first start, then the lowest first kmer, then the lowest
     * node id.
     */
    pub fn best_contig(
        &mut self,
        graph: &PathNodeGraph,
        unprocessed_position: i32,
    ) -> Option<VecDeque<KmerPathSubnode>> {
        self.advance_frontier(graph, unprocessed_position);
        let mut best: Option<(i64, i32, u64, NodeId, i32, Rc<TraversalNode>)> = None;
        for (id, pieces) in self.memoized.iter() {
            let node = graph.node(*id);
            let length = node.length() as i32;
            // callable positions must have every extension position unloaded
            let bound = if unprocessed_position == i32::MAX {
                i32::MAX - length
            } else {
                unprocessed_position - length - 1
            };
            for piece in pieces {
                if !piece.has_non_reference() {
                    continue;
                }
                let limit_end = std::cmp::min(piece.subnode().first_end(), bound);
                if piece.subnode().first_start() > limit_end {
                    continue;
                }
                let mut ranges = vec![(piece.subnode().first_start(), limit_end)];
                for next_id in node.next() {
                    let next = graph.node(*next_id);
                    ranges = subtract_range(
                        ranges,
                        next.first_start() - length,
                        next.first_end() - length,
                    );
                    if ranges.is_empty() {
                        break;
                    }
                }
                for (start, end) in ranges {
                    if is_better(
                        &best,
                        piece.score(),
                        start,
                        node.first_kmer(),
                        *id,
                    ) {
                        best = Some((
                            piece.score(),
                            start,
                            node.first_kmer(),
                            *id,
                            end,
                            piece.clone(),
                        ));
                    }
                }
            }
        }
        let (_, start, _, _, end, piece) = best?;
        self.strip_reference_ends(piece.to_subnode_path(start, end, graph), graph)
    }

    /**
     * Forces a call of the best path whose final kmer ends before the given
     * position bound, even when that path could still be extended. Used to
     * bound the loaded graph width.
     */
    pub fn call_best_contig_before(
        &mut self,
        graph: &PathNodeGraph,
        unprocessed_position: i32,
        end_before: i32,
    ) -> Option<VecDeque<KmerPathSubnode>> {
        self.advance_frontier(graph, unprocessed_position);
        let mut best: Option<(i64, i32, u64, NodeId, i32, Rc<TraversalNode>)> = None;
        for (id, pieces) in self.memoized.iter() {
            let node = graph.node(*id);
            let length = node.length() as i32;
            let bound = end_before - length;
            for piece in pieces {
                if !piece.has_non_reference() {
                    continue;
                }
                let limit_end = std::cmp::min(piece.subnode().first_end(), bound);
                if piece.subnode().first_start() > limit_end {
                    continue;
                }
                if is_better(
                    &best,
                    piece.score(),
                    piece.subnode().first_start(),
                    node.first_kmer(),
                    *id,
                ) {
                    best = Some((
                        piece.score(),
                        piece.subnode().first_start(),
                        node.first_kmer(),
                        *id,
                        limit_end,
                        piece.clone(),
                    ));
                }
            }
        }
        let (_, start, _, _, end, piece) = best?;
        self.strip_reference_ends(piece.to_subnode_path(start, end, graph), graph)
    }

    /**
     * Earliest first start still awaiting processing, bounded above by the
     * first unloaded input position
     */
    pub fn frontier_start(&self, unprocessed_position: i32) -> i32 {
        let mut start = unprocessed_position;
        if let Some((pending_start, _, _)) = self.pending.iter().next() {
            start = std::cmp::min(start, *pending_start);
        }
        for entry in self.frontier.values() {
            start = std::cmp::min(start, entry.first_start);
        }
        start
    }

    /**
     * Path of a frontier traversal reaching back past the lookback floor, if
     * any. Used to identify over-long partial contigs that can only be
     * misassemblies.
     */
    pub fn frontier_path(
        &mut self,
        graph: &PathNodeGraph,
        unprocessed_position: i32,
        lookback_floor: i32,
    ) -> Option<VecDeque<KmerPathSubnode>> {
        self.advance_frontier(graph, unprocessed_position);
        for entry in self.frontier.values() {
            if entry.tn.path_first_start() < lookback_floor {
                return Some(
                    entry
                        .tn
                        .to_subnode_path(entry.first_start, entry.first_end, graph),
                );
            }
        }
        None
    }

    /**
     * Writes one line per memoized piece for diagnostic export
     */
    pub fn export_state<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(
            writer,
            "node,kmer,first_start,first_end,score,path_nodes,path_first_start,has_non_reference"
        )?;
        for id in self.memoized.keys().cloned().sorted() {
            for piece in &self.memoized[&id] {
                writeln!(
                    writer,
                    "{},{},{},{},{},{},{},{}",
                    id,
                    piece.subnode().node(),
                    piece.subnode().first_start(),
                    piece.subnode().first_end(),
                    piece.score(),
                    piece.path_nodes(),
                    piece.path_first_start(),
                    piece.has_non_reference()
                )?;
            }
        }
        Ok(())
    }

    fn node_score(&self, node: &KmerPathNode) -> i64 {
        if node.is_reference() {
            self.anchored_score
        } else {
            node.total_weight() as i64
        }
    }

    fn seed(&mut self, graph: &PathNodeGraph, id: NodeId) {
        let node = graph.node(id);
        let piece = Rc::new(TraversalNode::starting(
            KmerPathSubnode::whole(node),
            self.node_score(node),
            node.is_reference(),
        ));
        self.memoized.insert(id, vec![piece.clone()]);
        self.insert_frontier_piece(piece, graph);
    }

    fn ensure_seeded(&mut self, graph: &PathNodeGraph, id: NodeId) {
        if !self.memoized.contains_key(&id) {
            let node = graph.node(id);
            self.pending
                .remove(&(node.first_start(), node.first_kmer(), id));
            self.seed(graph, id);
        }
    }

    fn insert_frontier_piece(&mut self, piece: Rc<TraversalNode>, graph: &PathNodeGraph) {
        let node = graph.node(piece.subnode().node());
        let first_start = piece.subnode().first_start();
        let first_end = piece.subnode().first_end();
        self.frontier.insert(
            FrontierKey {
                extension_start: first_start + node.length() as i32,
                kmer: node.first_kmer(),
                node: piece.subnode().node(),
                first_start,
            },
            FrontierEntry {
                first_start,
                first_end,
                tn: piece,
            },
        );
    }

    /**
     * Seeds every loaded node and relaxes the frontier to exhaustion over
     * all positions whose successors are fully loaded
     */
    fn advance_frontier(&mut self, graph: &PathNodeGraph, unprocessed_position: i32) {
        while let Some(&(first_start, kmer, id)) = self.pending.iter().next() {
            if first_start >= unprocessed_position {
                break;
            }
            self.pending.remove(&(first_start, kmer, id));
            if graph.contains(id) && !self.memoized.contains_key(&id) {
                self.seed(graph, id);
            }
        }
        loop {
            let key = match self.frontier.keys().next() {
                Some(key) if key.extension_start < unprocessed_position => *key,
                _ => break,
            };
            let entry = match self.frontier.remove(&key) {
                Some(entry) => entry,
                None => continue,
            };
            let length = graph.node(key.node).length() as i32;
            let propagate_end = std::cmp::min(entry.first_end, unprocessed_position - 1 - length);
            debug_assert!(entry.first_start <= propagate_end);
            if propagate_end < entry.first_end {
                self.insert_frontier_range(
                    entry.tn.clone(),
                    propagate_end + 1,
                    entry.first_end,
                    graph,
                );
            }
            self.propagate(graph, &entry.tn, entry.first_start, propagate_end);
        }
    }

    fn insert_frontier_range(
        &mut self,
        piece: Rc<TraversalNode>,
        first_start: i32,
        first_end: i32,
        graph: &PathNodeGraph,
    ) {
        let node = graph.node(piece.subnode().node());
        self.frontier.insert(
            FrontierKey {
                extension_start: first_start + node.length() as i32,
                kmer: node.first_kmer(),
                node: piece.subnode().node(),
                first_start,
            },
            FrontierEntry {
                first_start,
                first_end,
                tn: piece,
            },
        );
    }

    fn propagate(
        &mut self,
        graph: &PathNodeGraph,
        piece: &Rc<TraversalNode>,
        first_start: i32,
        first_end: i32,
    ) {
        let node_id = piece.subnode().node();
        let length = graph.node(node_id).length();
        let window_start = first_start + length as i32;
        let window_end = first_end + length as i32;
        let successors: Vec<NodeId> = graph.node(node_id).next().to_vec();
        for next_id in successors {
            let next = graph.node(next_id);
            if let Some((start, end)) = IntervalUtils::intersection_closed(
                window_start,
                window_end,
                next.first_start(),
                next.first_end(),
            ) {
                let child = Rc::new(TraversalNode::extending(
                    piece,
                    length,
                    KmerPathSubnode::new(next_id, start, end),
                    self.node_score(next),
                    next.is_reference(),
                ));
                self.memoize(graph, child);
            }
        }
    }

    /**
     * Merges a candidate piece into its node's partition, splitting existing
     * pieces where the candidate scores strictly higher. Winning sub-ranges
     * are queued for forward propagation.
     */
    fn memoize(&mut self, graph: &PathNodeGraph, candidate: Rc<TraversalNode>) {
        let node_id = candidate.subnode().node();
        self.ensure_seeded(graph, node_id);
        let candidate_start = candidate.subnode().first_start();
        let candidate_end = candidate.subnode().first_end();
        let pieces = self
            .memoized
            .remove(&node_id)
            .expect("memoized partition missing for live node");
        let mut result: Vec<Rc<TraversalNode>> = Vec::with_capacity(pieces.len() + 2);
        let mut won: Vec<(i32, i32)> = Vec::new();
        for piece in pieces {
            let piece_start = piece.subnode().first_start();
            let piece_end = piece.subnode().first_end();
            if piece_end < candidate_start
                || piece_start > candidate_end
                || candidate.score() <= piece.score()
            {
                result.push(piece);
                continue;
            }
            let overlap_start = std::cmp::max(piece_start, candidate_start);
            let overlap_end = std::cmp::min(piece_end, candidate_end);
            if piece_start < overlap_start {
                result.push(Rc::new(piece.narrowed(piece_start, overlap_start - 1)));
            }
            if overlap_end < piece_end {
                result.push(Rc::new(piece.narrowed(overlap_end + 1, piece_end)));
            }
            won.push((overlap_start, overlap_end));
        }
        for (start, end) in won {
            self.trim_frontier_overlaps(node_id, start, end, graph);
            let piece = Rc::new(candidate.narrowed(start, end));
            result.push(piece.clone());
            self.insert_frontier_range(piece, start, end, graph);
        }
        result.sort_by_key(|piece| piece.subnode().first_start());
        self.memoized.insert(node_id, result);
    }

    /**
     * Trims pending propagation of the given node to the positions outside
     * [start, end]. A displaced range must not leave a queued entry behind:
     * inserting the winner at the same range start would silently replace
     * it, losing the propagation of whatever survives outside the range.
     */
    fn trim_frontier_overlaps(
        &mut self,
        node_id: NodeId,
        start: i32,
        end: i32,
        graph: &PathNodeGraph,
    ) {
        let keys: Vec<FrontierKey> = self
            .frontier
            .iter()
            .filter(|(key, entry)| {
                key.node == node_id && entry.first_start <= end && start <= entry.first_end
            })
            .map(|(key, _)| *key)
            .collect();
        for key in keys {
            if let Some(entry) = self.frontier.remove(&key) {
                if entry.first_start < start {
                    self.insert_frontier_range(
                        entry.tn.clone(),
                        entry.first_start,
                        start - 1,
                        graph,
                    );
                }
                if entry.first_end > end {
                    self.insert_frontier_range(entry.tn.clone(), end + 1, entry.first_end, graph);
                }
            }
        }
    }

    fn strip_reference_ends(
        &self,
        mut path: VecDeque<KmerPathSubnode>,
        graph: &PathNodeGraph,
    ) -> Option<VecDeque<KmerPathSubnode>> {
        while path
            .front()
            .map(|sn| graph.node(sn.node()).is_reference())
            .unwrap_or(false)
        {
            path.pop_front();
        }
        while path
            .back()
            .map(|sn| graph.node(sn.node()).is_reference())
            .unwrap_or(false)
        {
            path.pop_back();
        }
        if path.is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /**
     * Sanity check hook: every memoized node is live and its partition is a
     * sorted, disjoint cover of its full first interval; every live node is
     * either memoized or pending; every memoized path runs over live nodes.
     */
    pub fn sanity_check(&self, graph: &PathNodeGraph) -> bool {
        for (id, pieces) in self.memoized.iter() {
            if !graph.contains(*id) {
                error!("Memoized partition for dead node {}", id);
                return false;
            }
            let node = graph.node(*id);
            let mut expected_start = node.first_start();
            for piece in pieces {
                if piece.subnode().first_start() != expected_start {
                    error!("Memoized partition of {} has a gap at {}", id, expected_start);
                    return false;
                }
                expected_start = piece.subnode().first_end() + 1;
                let mut current = Some(piece.as_ref());
                while let Some(tn) = current {
                    if !graph.contains(tn.subnode().node()) {
                        error!("Memoized path of {} runs through a dead node", id);
                        return false;
                    }
                    current = tn.parent().map(|p| p.as_ref());
                }
            }
            if expected_start != node.first_end() + 1 {
                error!("Memoized partition of {} stops short at {}", id, expected_start);
                return false;
            }
        }
        for node in graph.iter_by_position() {
            if !self.memoized.contains_key(&node.id())
                && !self
                    .pending
                    .contains(&(node.first_start(), node.first_kmer(), node.id()))
            {
                error!("Live node {} is neither memoized nor pending", node.id());
                return false;
            }
        }
        true
    }

    /**
     * Sanity check hook: per-position best scores must equal those of the
     * other caller. Piece boundaries may differ when equal scores were
     * reached through different predecessors, so partitions are normalised
     * by merging equal-score neighbours before comparison.
     */
    pub fn sanity_check_matches(&self, other: &MemoizedContigCaller) -> bool {
        let mine = self.normalised_scores();
        let theirs = other.normalised_scores();
        if mine != theirs {
            error!(
                "Memoization mismatch: {} nodes scored here, {} there",
                mine.len(),
                theirs.len()
            );
            return false;
        }
        true
    }

    fn normalised_scores(&self) -> BTreeMap<NodeId, Vec<(i32, i32, i64)>> {
        let mut scores = BTreeMap::new();
        for (id, pieces) in self.memoized.iter() {
            let mut merged: Vec<(i32, i32, i64)> = Vec::with_capacity(pieces.len());
            for piece in pieces {
                let start = piece.subnode().first_start();
                let end = piece.subnode().first_end();
                match merged.last_mut() {
                    Some(last) if last.1 + 1 == start && last.2 == piece.score() => {
                        last.1 = end;
                    }
                    _ => merged.push((start, end, piece.score())),
                }
            }
            scores.insert(*id, merged);
        }
        scores
    }
}

fn is_better(
    best: &Option<(i64, i32, u64, NodeId, i32, Rc<TraversalNode>)>,
    score: i64,
    first_start: i32,
    kmer: u64,
    id: NodeId,
) -> bool {
    match best {
        None => true,
        Some((best_score, best_start, best_kmer, best_id, _, _)) => {
            (score, std::cmp::Reverse(first_start), std::cmp::Reverse(kmer), std::cmp::Reverse(id))
                > (
                    *best_score,
                    std::cmp::Reverse(*best_start),
                    std::cmp::Reverse(*best_kmer),
                    std::cmp::Reverse(*best_id),
                )
        }
    }
}

/**
 * Subtracts the closed interval [cover_start, cover_end] from each range
 */
fn subtract_range(ranges: Vec<(i32, i32)>, cover_start: i32, cover_end: i32) -> Vec<(i32, i32)> {
    let mut result = Vec::with_capacity(ranges.len() + 1);
    for (start, end) in ranges {
        if cover_end < start || cover_start > end {
            result.push((start, end));
            continue;
        }
        if start < cover_start {
            result.push((start, cover_start - 1));
        }
        if cover_end < end {
            result.push((cover_end + 1, end));
        }
    }
    result
}

use crate::debruijn::positional::kmer_path_node::{KmerPathNode, NodeId};
use crate::debruijn::positional::path_node_graph::PathNodeGraph;
use crate::utils::errors::AssemblyError;
use crate::utils::interval_utils::IntervalUtils;

/**
 * A weight subtraction requested at one kmer offset of a node: the interval
 * over which the contributing support node is valid, and its weight.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportInterval {
    pub start: i32,
    pub end: i32,
    pub weight: u32,
}

impl SupportInterval {
    pub fn new(start: i32, end: i32, weight: u32) -> Self {
        assert!(start <= end);
        SupportInterval { start, end, weight }
    }
}

/**
 * Subtracts per-offset support weight from a node, splitting the node where
 * the subtraction is not uniform.
 *
 * The node is removed from the graph and replaced by zero or more fresh
 * nodes covering the surviving (position, offset) space:
 *
 * - the first interval is partitioned wherever the set of covering support
 *   changes, so that within each positional piece every subtraction is
 *   all-or-nothing;
 * - within a piece, maximal offset runs of surviving (non-zero) weight each
 *   become one replacement node, with collapsed kmers remapped onto the run
 *   that retains their offset.
 *
 * A uniform reduction that leaves every offset alive therefore yields a
 * single replacement over the original interval, and removal of all weight
 * yields none. Replacements are re-added through the graph, which re-derives
 * their adjacency; the caller must re-announce the returned ids to the
 * memoized contig caller.
 *
 * to_remove may be shorter than the node; missing trailing offsets have
 * nothing subtracted.
 */
pub fn remove_weight(
    graph: &mut PathNodeGraph,
    node_id: NodeId,
    to_remove: Vec<Vec<SupportInterval>>,
) -> Result<Vec<NodeId>, AssemblyError> {
    let node = graph.remove(node_id).ok_or_else(|| {
        AssemblyError::InvariantViolation(format!(
            "Weight removal requested for dead node {}",
            node_id
        ))
    })?;
    if to_remove.len() > node.length() {
        return Err(AssemblyError::InvariantViolation(format!(
            "Weight removal for {} offsets requested on {} of length {}",
            to_remove.len(),
            node_id,
            node.length()
        )));
    }

    let pieces = positional_pieces(&node, &to_remove);
    let mut replacements = Vec::new();
    for (piece_start, piece_end) in pieces {
        let reduced = reduced_weights(&node, &to_remove, piece_start, piece_end)?;
        for (run_start, run_end) in surviving_runs(&reduced) {
            let replacement = KmerPathNode::new(
                node.kmers()[run_start..=run_end].to_vec(),
                reduced[run_start..=run_end].to_vec(),
                piece_start + run_start as i32,
                piece_end + run_start as i32,
                node.is_reference(),
            );
            let (collapsed, offsets) = remapped_collapsed(&node, run_start, run_end);
            let replacement = replacement.with_collapsed_kmers(collapsed, offsets);
            replacements.push(graph.add(replacement)?);
        }
    }
    Ok(replacements)
}

/**
 * Partition of the node's first interval into maximal pieces over which the
 * covering support set is constant at every offset.
 */
fn positional_pieces(node: &KmerPathNode, to_remove: &[Vec<SupportInterval>]) -> Vec<(i32, i32)> {
    // closed-interval boundaries expressed as piece start positions
    let mut cuts = vec![node.first_start(), node.first_end() + 1];
    for (offset, supports) in to_remove.iter().enumerate() {
        for support in supports {
            let start = support.start - offset as i32;
            let end = support.end - offset as i32;
            if start > node.first_start() && start <= node.first_end() {
                cuts.push(start);
            }
            if end >= node.first_start() && end < node.first_end() {
                cuts.push(end + 1);
            }
        }
    }
    cuts.sort_unstable();
    cuts.dedup();
    cuts.windows(2)
        .map(|pair| (pair[0], pair[1] - 1))
        .collect()
}

/**
 * Post-subtraction weights of every offset over the given positional piece.
 * By construction of the pieces, a support either covers the whole piece at
 * its offset or none of it.
 */
fn reduced_weights(
    node: &KmerPathNode,
    to_remove: &[Vec<SupportInterval>],
    piece_start: i32,
    piece_end: i32,
) -> Result<Vec<u32>, AssemblyError> {
    let mut weights = node.weights().to_vec();
    for (offset, supports) in to_remove.iter().enumerate() {
        for support in supports {
            let start = support.start - offset as i32;
            let end = support.end - offset as i32;
            if !IntervalUtils::overlaps_closed(start, end, piece_start, piece_end) {
                continue;
            }
            if support.weight > weights[offset] {
                return Err(AssemblyError::InvariantViolation(format!(
                    "Removing weight {} at offset {} of {} exceeds node weight {}",
                    support.weight,
                    offset,
                    node.id(),
                    weights[offset]
                )));
            }
            weights[offset] -= support.weight;
        }
    }
    Ok(weights)
}

/**
 * Maximal offset runs with non-zero weight
 */
fn surviving_runs(weights: &[u32]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut run_start = None;
    for (offset, weight) in weights.iter().enumerate() {
        match (run_start, *weight > 0) {
            (None, true) => run_start = Some(offset),
            (Some(start), false) => {
                runs.push((start, offset - 1));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        runs.push((start, weights.len() - 1));
    }
    runs
}

/**
 * Collapsed kmers whose offsets fall within the given run, remapped to the
 * run's offset origin
 */
fn remapped_collapsed(
    node: &KmerPathNode,
    run_start: usize,
    run_end: usize,
) -> (Vec<u64>, Vec<usize>) {
    let mut kmers = Vec::new();
    let mut offsets = Vec::new();
    for (kmer, offset) in node
        .collapsed_kmers()
        .iter()
        .zip(node.collapsed_offsets().iter())
    {
        if *offset >= run_start && *offset <= run_end {
            kmers.push(*kmer);
            offsets.push(*offset - run_start);
        }
    }
    (kmers, offsets)
}

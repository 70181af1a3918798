use std::collections::VecDeque;

use crate::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use crate::debruijn::positional::path_node_graph::PathNodeGraph;

/**
 * Greedy traversal from a seed subnode, used to attach reference-anchored
 * flanking paths to a called contig.
 *
 * The traversal walks forward over next links or backward over prev links
 * from the seed, at each step taking the best allowed candidate: reference
 * nodes over non-reference, then highest total weight, then lowest first
 * kmer, then lowest id. It stops when the path reaches the kmer length cap
 * or no allowed candidate remains. Positions shift monotonically along the
 * traversal, so it terminates even over graph cycles.
 *
 * The returned subnodes are in positional order and include the seed; the
 * caller discards the seed end.
 */
pub struct PathGreedyTraversal<'a> {
    graph: &'a PathNodeGraph,
    path: VecDeque<KmerPathSubnode>,
    traverse_forward: bool,
    kmers_remaining: i64,
}

impl<'a> PathGreedyTraversal<'a> {
    pub fn new(
        graph: &'a PathNodeGraph,
        seed: KmerPathSubnode,
        traverse_forward: bool,
        max_kmer_length: usize,
    ) -> Self {
        let mut path = VecDeque::new();
        let seed_length = seed.length(graph) as i64;
        path.push_back(seed);
        PathGreedyTraversal {
            graph,
            path,
            traverse_forward,
            kmers_remaining: max_kmer_length as i64 - seed_length,
        }
    }

    /**
     * Extends the path while an allowed candidate exists and the length cap
     * is not exceeded
     * @param traverse_reference allow traversal of reference nodes
     * @param traverse_non_reference allow traversal of non-reference nodes
     */
    pub fn greedy_traverse(&mut self, traverse_reference: bool, traverse_non_reference: bool) {
        loop {
            if self.kmers_remaining <= 0 {
                return;
            }
            let tip = if self.traverse_forward {
                *self.path.back().expect("traversal path is never empty")
            } else {
                *self.path.front().expect("traversal path is never empty")
            };
            let candidates = if self.traverse_forward {
                tip.next_subnodes(self.graph)
            } else {
                tip.prev_subnodes(self.graph)
            };
            let best = candidates
                .into_iter()
                .filter(|candidate| {
                    let node = self.graph.node(candidate.node());
                    if node.is_reference() {
                        traverse_reference
                    } else {
                        traverse_non_reference
                    }
                })
                .filter(|candidate| candidate.length(self.graph) as i64 <= self.kmers_remaining)
                .min_by_key(|candidate| {
                    let node = self.graph.node(candidate.node());
                    (
                        !node.is_reference(),
                        std::cmp::Reverse(node.total_weight()),
                        node.first_kmer(),
                        node.id(),
                    )
                });
            match best {
                None => return,
                Some(next) => {
                    self.kmers_remaining -= next.length(self.graph) as i64;
                    if self.traverse_forward {
                        self.path.push_back(next);
                    } else {
                        self.path.push_front(next);
                    }
                }
            }
        }
    }

    /**
     * The traversed path in positional order, seed included
     */
    pub fn into_subnodes(self) -> VecDeque<KmerPathSubnode> {
        self.path
    }
}

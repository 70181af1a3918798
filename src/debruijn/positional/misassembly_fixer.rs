use std::collections::{HashMap, VecDeque};

use crate::debruijn::positional::kmer_evidence::KmerEvidence;
use crate::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use crate::debruijn::positional::path_node_graph::PathNodeGraph;
use crate::utils::interval_utils::IntervalUtils;

/**
 * One kmer of the concatenated contig path.
 */
#[derive(Debug, Clone)]
struct ContigKmer {
    subnode_index: usize,
    expected_start: i32,
    expected_end: i32,
}

/**
 * Re-segments a called contig containing a repeated kmer.
 *
 * When the same kmer occurs at two offsets of a contig, evidence supporting
 * one occurrence may have been gathered against the other, inflating the
 * contig past what its evidence actually supports. Each supporting evidence
 * is greedily re-placed at the contig alignment minimising the total
 * positional misalignment between its support intervals and the contig kmer
 * intervals it would land on; evidence with no consistent placement does not
 * support the contig at all. The contig is then truncated to its longest
 * prefix of subnodes in which every kmer is supported by a re-placed
 * evidence.
 */
pub struct MisassemblyFixer {
    contig: Vec<KmerPathSubnode>,
    kmers: Vec<ContigKmer>,
    /**
     * Contig kmer indices of every primary and collapsed kmer
     */
    by_kmer: HashMap<u64, Vec<usize>>,
}

impl MisassemblyFixer {
    pub fn new(contig: &VecDeque<KmerPathSubnode>, graph: &PathNodeGraph) -> Self {
        let mut kmers = Vec::new();
        let mut by_kmer: HashMap<u64, Vec<usize>> = HashMap::new();
        for (subnode_index, subnode) in contig.iter().enumerate() {
            let node = graph.node(subnode.node());
            for offset in 0..node.length() {
                let index = kmers.len();
                kmers.push(ContigKmer {
                    subnode_index,
                    expected_start: subnode.first_start() + offset as i32,
                    expected_end: subnode.first_end() + offset as i32,
                });
                by_kmer.entry(node.kmer(offset)).or_default().push(index);
                for (kmer, collapsed_offset) in node
                    .collapsed_kmers()
                    .iter()
                    .zip(node.collapsed_offsets().iter())
                {
                    if *collapsed_offset == offset {
                        by_kmer.entry(*kmer).or_default().push(index);
                    }
                }
            }
        }
        MisassemblyFixer {
            contig: contig.iter().cloned().collect(),
            kmers,
            by_kmer,
        }
    }

    /**
     * Re-places the given supporting evidence and truncates the contig to
     * its longest fully supported subnode prefix.
     */
    pub fn correct_misassigned_evidence(&self, support: &[&KmerEvidence]) -> Vec<KmerPathSubnode> {
        let mut supported = vec![false; self.kmers.len()];
        for evidence in support {
            if let Some(placement) = self.best_placement(evidence) {
                for node in evidence.nodes() {
                    let index = placement + node.offset() as i64;
                    if index >= 0 && (index as usize) < self.kmers.len() {
                        supported[index as usize] = true;
                    }
                }
            }
        }
        let mut keep = 0;
        let mut index = 0;
        'prefix: for subnode_index in 0..self.contig.len() {
            while index < self.kmers.len() && self.kmers[index].subnode_index == subnode_index {
                if !supported[index] {
                    break 'prefix;
                }
                index += 1;
            }
            keep = subnode_index + 1;
        }
        self.contig[0..keep].to_vec()
    }

    /**
     * Contig index at which the evidence's first usable kmer is placed, for
     * the placement minimising total misalignment, or None when the evidence
     * has no placement at which every usable kmer matches the contig.
     */
    fn best_placement(&self, evidence: &KmerEvidence) -> Option<i64> {
        let first = evidence.nodes().next()?;
        let candidates = self.by_kmer.get(&first.kmer())?;
        let mut best: Option<(i64, i64)> = None;
        for candidate in candidates {
            // anchor the first usable kmer here; every other usable kmer
            // must land on a matching contig kmer
            let base = *candidate as i64 - first.offset() as i64;
            let mut cost = 0i64;
            let mut consistent = true;
            for node in evidence.nodes() {
                let index = base + node.offset() as i64;
                if index < 0 || index as usize >= self.kmers.len() {
                    consistent = false;
                    break;
                }
                let matches = self
                    .by_kmer
                    .get(&node.kmer())
                    .map(|indices| indices.contains(&(index as usize)))
                    .unwrap_or(false);
                if !matches {
                    consistent = false;
                    break;
                }
                let contig_kmer = &self.kmers[index as usize];
                cost += IntervalUtils::distance_closed(
                    node.start(),
                    node.end(),
                    contig_kmer.expected_start,
                    contig_kmer.expected_end,
                ) as i64;
            }
            if !consistent {
                continue;
            }
            let anchor = base + first.offset() as i64;
            match best {
                None => best = Some((cost, anchor)),
                Some((best_cost, best_anchor)) => {
                    if cost < best_cost || (cost == best_cost && anchor < best_anchor) {
                        best = Some((cost, anchor));
                    }
                }
            }
        }
        best.map(|(_, anchor)| anchor - first.offset() as i64)
    }
}

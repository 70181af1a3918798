use hashlink::{LinkedHashMap, LinkedHashSet};
use std::collections::HashMap;

use crate::debruijn::positional::kmer_evidence::KmerEvidence;
use crate::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use crate::debruijn::positional::path_node_graph::PathNodeGraph;
use crate::utils::interval_utils::IntervalUtils;

/**
 * Compact record of one tracked support node in the kmer lookup.
 */
#[derive(Debug, Clone)]
struct SupportEntry {
    start: i32,
    end: i32,
    weight: u32,
    evidence_id: String,
}

/**
 * Tracks evidence contributing to the positional de Bruijn graph.
 *
 * The tracker owns every tracked KmerEvidence keyed by evidence id, with a
 * kmer lookup from each supported kmer to the intervals of its support
 * nodes. Untracking a contig gathers every evidence id whose support
 * overlaps the contig, retires those ids entirely and hands their evidence
 * back to the caller, which uses it to decide which graph weight to
 * subtract.
 */
#[derive(Debug, Default)]
pub struct EvidenceTracker {
    by_evidence: LinkedHashMap<String, KmerEvidence>,
    by_kmer: HashMap<u64, Vec<SupportEntry>>,
}

impl EvidenceTracker {
    pub fn new() -> Self {
        EvidenceTracker {
            by_evidence: LinkedHashMap::new(),
            by_kmer: HashMap::new(),
        }
    }

    /**
     * Number of currently tracked evidence records
     */
    pub fn tracked_count(&self) -> usize {
        self.by_evidence.len()
    }

    pub fn is_tracked(&self, evidence_id: &str) -> bool {
        self.by_evidence.contains_key(evidence_id)
    }

    /**
     * Starts tracking the given evidence, indexing each of its support
     * nodes under the supported kmer. Re-tracking an id replaces the
     * previous record.
     */
    pub fn track(&mut self, evidence: KmerEvidence) {
        if self.is_tracked(evidence.id()) {
            warn!(
                "Evidence {} already tracked; replacing previous record",
                evidence.id()
            );
            self.remove_by_id(&evidence.id().to_string());
        }
        for support in evidence.nodes() {
            self.by_kmer
                .entry(support.kmer())
                .or_default()
                .push(SupportEntry {
                    start: support.start(),
                    end: support.end(),
                    weight: support.weight(),
                    evidence_id: support.evidence_id().to_string(),
                });
        }
        self.by_evidence
            .insert(evidence.id().to_string(), evidence);
    }

    /**
     * Gathers every evidence id whose support overlaps the given contig,
     * retires those ids entirely and returns the retired evidence.
     *
     * Every support node of a retired id is removed from the tracker, not
     * just those overlapping the contig. Untracking an empty contig returns
     * the empty set and retiring an id twice is a no-op.
     */
    pub fn untrack<'a, I>(&mut self, contig: I, graph: &PathNodeGraph) -> Vec<KmerEvidence>
    where
        I: IntoIterator<Item = &'a KmerPathSubnode>,
    {
        let ids = self.overlapping_ids(contig, graph);
        let mut untracked = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(evidence) = self.remove_by_id(&id) {
                untracked.push(evidence);
            }
        }
        untracked
    }

    /**
     * Read-only view of the evidence currently supporting the given contig,
     * in deterministic gather order
     */
    pub fn support<'a, I>(&self, contig: I, graph: &PathNodeGraph) -> Vec<&KmerEvidence>
    where
        I: IntoIterator<Item = &'a KmerPathSubnode>,
    {
        self.overlapping_ids(contig, graph)
            .iter()
            .filter_map(|id| self.by_evidence.get(id))
            .collect()
    }

    /**
     * Retires the given evidence records by id. Unknown ids are ignored.
     */
    pub fn remove(&mut self, evidence: &[KmerEvidence]) {
        for e in evidence {
            self.remove_by_id(&e.id().to_string());
        }
    }

    fn remove_by_id(&mut self, id: &String) -> Option<KmerEvidence> {
        let evidence = self.by_evidence.remove(id)?;
        for support in evidence.nodes() {
            if let Some(entries) = self.by_kmer.get_mut(&support.kmer()) {
                entries.retain(|entry| entry.evidence_id != *id);
                if entries.is_empty() {
                    self.by_kmer.remove(&support.kmer());
                }
            }
        }
        Some(evidence)
    }

    fn overlapping_ids<'a, I>(&self, contig: I, graph: &PathNodeGraph) -> LinkedHashSet<String>
    where
        I: IntoIterator<Item = &'a KmerPathSubnode>,
    {
        let mut ids = LinkedHashSet::new();
        for subnode in contig {
            let node = graph.node(subnode.node());
            for offset in 0..node.length() {
                self.gather(
                    node.kmer(offset),
                    subnode.first_start() + offset as i32,
                    subnode.first_end() + offset as i32,
                    &mut ids,
                );
            }
            for (kmer, offset) in node
                .collapsed_kmers()
                .iter()
                .zip(node.collapsed_offsets().iter())
            {
                self.gather(
                    *kmer,
                    subnode.first_start() + *offset as i32,
                    subnode.first_end() + *offset as i32,
                    &mut ids,
                );
            }
        }
        ids
    }

    fn gather(&self, kmer: u64, start: i32, end: i32, ids: &mut LinkedHashSet<String>) {
        if let Some(entries) = self.by_kmer.get(&kmer) {
            for entry in entries {
                if IntervalUtils::overlaps_closed(entry.start, entry.end, start, end) {
                    ids.insert(entry.evidence_id.clone());
                }
            }
        }
    }

    /**
     * Sanity check hook: verifies that the weight of each kmer of the given
     * subnode equals the summed weight of the tracked support covering its
     * full positional interval.
     */
    pub fn matches_expected(&self, subnode: &KmerPathSubnode, graph: &PathNodeGraph) -> bool {
        let node = graph.node(subnode.node());
        for offset in 0..node.length() {
            let start = subnode.first_start() + offset as i32;
            let end = subnode.first_end() + offset as i32;
            let mut expected = 0u64;
            for kmer in std::iter::once(node.kmer(offset)).chain(
                node.collapsed_kmers()
                    .iter()
                    .zip(node.collapsed_offsets().iter())
                    .filter(|(_, o)| **o == offset)
                    .map(|(kmer, _)| *kmer),
            ) {
                if let Some(entries) = self.by_kmer.get(&kmer) {
                    for entry in entries {
                        if IntervalUtils::contains_closed(entry.start, entry.end, start, end) {
                            expected += entry.weight as u64;
                        }
                    }
                }
            }
            if expected != node.weight(offset) as u64 {
                error!(
                    "Weight mismatch on {} offset {}: tracked {} node {}",
                    node.id(),
                    offset,
                    expected,
                    node.weight(offset)
                );
                return false;
            }
        }
        true
    }
}

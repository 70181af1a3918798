use std::collections::HashSet;

use crate::assembly::configuration::PositionalAssemblyConfiguration;
use crate::debruijn::kmer_encoding::KmerEncodingUtils;
use crate::debruijn::positional::evidence_tracker::EvidenceTracker;
use crate::debruijn::positional::kmer_evidence::KmerEvidence;
use crate::debruijn::positional::kmer_path_node::KmerPathNode;
use crate::model::breakend::{BreakendDirection, BreakendSummary};

/**
 * Builds a path node from a DNA string. Every kmer of the string becomes a
 * path kmer with the given per-kmer weight.
 */
pub fn kpn_with_weight(
    k: usize,
    bases: &str,
    first_start: i32,
    first_end: i32,
    reference: bool,
    weight: u32,
) -> KmerPathNode {
    let kmers = KmerEncodingUtils::encode_all(k, bases.as_bytes());
    let weights = vec![weight; kmers.len()];
    KmerPathNode::new(kmers, weights, first_start, first_end, reference)
}

/**
 * Path node with unit weight per kmer
 */
pub fn kpn(
    k: usize,
    bases: &str,
    first_start: i32,
    first_end: i32,
    reference: bool,
) -> KmerPathNode {
    kpn_with_weight(k, bases, first_start, first_end, reference, 1)
}

/**
 * Evidence with one support node per kmer of the given read sequence, the
 * breakend interval defaulting to the read's own interval
 */
pub fn evidence(
    id: &str,
    k: usize,
    bases: &str,
    first_start: i32,
    first_end: i32,
    weight: u32,
    anchored: bool,
) -> KmerEvidence {
    KmerEvidence::from_read(
        id,
        k,
        bases.as_bytes(),
        first_start,
        first_end,
        weight,
        false,
        BreakendSummary::new(0, BreakendDirection::Forward, first_start, first_end),
        weight as f64,
        anchored,
    )
}

/**
 * Tracker pre-loaded with the given evidence
 */
pub fn tracker_with(evidence: Vec<KmerEvidence>) -> EvidenceTracker {
    let mut tracker = EvidenceTracker::new();
    for e in evidence {
        tracker.track(e);
    }
    tracker
}

/**
 * Assembly configuration small enough for handcrafted test graphs
 */
pub fn test_config(k: usize) -> PositionalAssemblyConfiguration {
    let mut config = PositionalAssemblyConfiguration::new(k, 0, 50, 10, 30, 10)
        .expect("test configuration must validate");
    config.anchor_length = 10;
    config.sanity_check_memoization = true;
    config.sanity_check_graph = true;
    config
}

/**
 * Builds DNA sequences in which no kmer ever repeats, across every sequence
 * produced by the same builder. Repeated kmers would collapse distinct graph
 * positions, so handcrafted graph tests route all sequence generation
 * through one of these.
 */
pub struct DistinctSequenceBuilder {
    k: usize,
    seen: HashSet<u64>,
}

impl DistinctSequenceBuilder {
    pub fn new(k: usize) -> Self {
        assert!(k >= 2 && k <= KmerEncodingUtils::MAX_K);
        DistinctSequenceBuilder {
            k,
            seen: HashSet::new(),
        }
    }

    /**
     * A sequence of the given kmer count starting from the lowest unseen
     * kmer
     */
    pub fn fresh(&mut self, kmers: usize) -> String {
        assert!(kmers >= 1);
        let mut start = 0u64;
        while self.seen.contains(&start) {
            assert!(
                start < KmerEncodingUtils::kmer_mask(self.k),
                "kmer space exhausted"
            );
            start += 1;
        }
        let mut picked = vec![start];
        let mut local = HashSet::new();
        local.insert(start);
        let found = self.search(
            start & KmerEncodingUtils::kmer_mask(self.k - 1),
            kmers - 1,
            &mut picked,
            &mut local,
        );
        assert!(found, "no distinct kmer extension of length {}", kmers);
        self.seen.extend(picked.iter());
        let mut bases = KmerEncodingUtils::base_string(self.k, start);
        for kmer in &picked[1..] {
            bases.push(KmerEncodingUtils::decoded_base(
                KmerEncodingUtils::last_base_encoded(*kmer),
            ));
        }
        String::from_utf8(bases).expect("decoded bases are ASCII")
    }

    /**
     * A sequence branching off the end of an existing one: it begins with
     * the final k-1 bases of `from` and continues with the given number of
     * fresh kmers, so its first kmer immediately follows `from`'s last.
     */
    pub fn branch(&mut self, from: &str, kmers: usize) -> String {
        assert!(kmers >= 1);
        assert!(from.len() >= self.k);
        let overlap = &from.as_bytes()[from.len() - (self.k - 1)..];
        let suffix = KmerEncodingUtils::encode(self.k - 1, overlap);
        let mut picked = Vec::new();
        let mut local = HashSet::new();
        let found = self.search(suffix, kmers, &mut picked, &mut local);
        assert!(found, "no distinct kmer branch of length {}", kmers);
        self.seen.extend(picked.iter());
        let mut bases = overlap.to_vec();
        for kmer in &picked {
            bases.push(KmerEncodingUtils::decoded_base(
                KmerEncodingUtils::last_base_encoded(*kmer),
            ));
        }
        String::from_utf8(bases).expect("decoded bases are ASCII")
    }

    fn search(
        &self,
        suffix: u64,
        remaining: usize,
        picked: &mut Vec<u64>,
        local: &mut HashSet<u64>,
    ) -> bool {
        if remaining == 0 {
            return true;
        }
        for base in 0..4u64 {
            let kmer = ((suffix << 2) | base) & KmerEncodingUtils::kmer_mask(self.k);
            if self.seen.contains(&kmer) || local.contains(&kmer) {
                continue;
            }
            picked.push(kmer);
            local.insert(kmer);
            let next_suffix = kmer & KmerEncodingUtils::kmer_mask(self.k - 1);
            if self.search(next_suffix, remaining - 1, picked, local) {
                return true;
            }
            picked.pop();
            local.remove(&kmer);
        }
        false
    }
}

/**
 * Cuts a sequence into a chain of consecutive path nodes of equal kmer
 * count, each valid at a single position.
 */
pub fn chain_nodes(
    k: usize,
    bases: &str,
    first_start: i32,
    kmers_per_node: usize,
    node_count: usize,
    reference: bool,
    weight: u32,
) -> Vec<KmerPathNode> {
    assert!(bases.len() >= kmers_per_node * node_count + k - 1);
    (0..node_count)
        .map(|i| {
            let offset = i * kmers_per_node;
            let node_bases = &bases[offset..offset + kmers_per_node + k - 1];
            kpn_with_weight(
                k,
                node_bases,
                first_start + offset as i32,
                first_start + offset as i32,
                reference,
                weight,
            )
        })
        .collect()
}

/**
 * One evidence per chain node, each exactly covering its node
 */
pub fn chain_evidence(
    id_prefix: &str,
    k: usize,
    bases: &str,
    first_start: i32,
    kmers_per_node: usize,
    node_count: usize,
    weight: u32,
) -> Vec<KmerEvidence> {
    (0..node_count)
        .map(|i| {
            let offset = i * kmers_per_node;
            let node_bases = &bases[offset..offset + kmers_per_node + k - 1];
            evidence(
                &format!("{}{}", id_prefix, i),
                k,
                node_bases,
                first_start + offset as i32,
                first_start + offset as i32,
                weight,
                false,
            )
        })
        .collect()
}

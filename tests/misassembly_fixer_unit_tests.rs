use std::collections::VecDeque;

use currawong::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use currawong::debruijn::positional::misassembly_fixer::MisassemblyFixer;
use currawong::debruijn::positional::path_node_graph::PathNodeGraph;
use currawong::test_utils::{evidence, kpn_with_weight};

/**
 * Contig with AAAA at concatenated offsets 0 and 12:
 *   node1  AAAATTTTGTT   kmers 0..=7  at 100
 *   node2  GTTCAAA       kmers 8..=11 at 108
 *   node3  AAAA          kmer  12     at 112
 */
fn repeat_graph() -> (PathNodeGraph, Vec<KmerPathSubnode>) {
    let k = 4;
    let mut graph = PathNodeGraph::new(k);
    let node1 = graph
        .add(kpn_with_weight(k, "AAAATTTTGTT", 100, 100, false, 2))
        .unwrap();
    let node2 = graph
        .add(kpn_with_weight(k, "GTTCAAA", 108, 108, false, 2))
        .unwrap();
    let node3 = graph
        .add(kpn_with_weight(k, "AAAA", 112, 112, false, 2))
        .unwrap();
    let contig = vec![
        KmerPathSubnode::whole(graph.node(node1)),
        KmerPathSubnode::whole(graph.node(node2)),
        KmerPathSubnode::whole(graph.node(node3)),
    ];
    (graph, contig)
}

#[test]
fn test_consistently_placed_evidence_keeps_contig() {
    let (graph, contig) = repeat_graph();
    let deque: VecDeque<KmerPathSubnode> = contig.iter().cloned().collect();
    let fixer = MisassemblyFixer::new(&deque, &graph);
    let e1 = evidence("E1", 4, "AAAATTTTGTT", 100, 100, 2, false);
    let e2 = evidence("E2", 4, "GTTCAAAA", 108, 108, 2, false);
    let support = vec![&e1, &e2];
    let fixed = fixer.correct_misassigned_evidence(&support);
    assert_eq!(fixed.len(), 3, "fully supported contig is unchanged");
}

#[test]
fn test_misassigned_evidence_truncates_at_repeat() {
    let (graph, contig) = repeat_graph();
    let deque: VecDeque<KmerPathSubnode> = contig.iter().cloned().collect();
    let fixer = MisassemblyFixer::new(&deque, &graph);
    let e1 = evidence("E1", 4, "AAAATTTTGTT", 100, 100, 2, false);
    let e2 = evidence("E2", 4, "GTTCAAA", 108, 108, 2, false);
    // positioned at the second AAAA occurrence, but only consistent with an
    // alignment at the first
    let e3 = evidence("E3", 4, "AAAATTT", 112, 112, 2, false);
    let support = vec![&e1, &e2, &e3];
    let fixed = fixer.correct_misassigned_evidence(&support);
    assert_eq!(fixed.len(), 2, "the repeat occurrence is truncated");
    assert_eq!(fixed[0], contig[0]);
    assert_eq!(fixed[1], contig[1]);
}

#[test]
fn test_unplaceable_evidence_is_dropped() {
    let (graph, contig) = repeat_graph();
    let deque: VecDeque<KmerPathSubnode> = contig.iter().cloned().collect();
    let fixer = MisassemblyFixer::new(&deque, &graph);
    let e1 = evidence("E1", 4, "AAAATTTTGTT", 100, 100, 2, false);
    let e2 = evidence("E2", 4, "GTTCAAA", 108, 108, 2, false);
    // no contiguous contig alignment contains both of these kmers
    let e3 = evidence("E3", 4, "AAAAC", 112, 112, 2, false);
    let support = vec![&e1, &e2, &e3];
    let fixed = fixer.correct_misassigned_evidence(&support);
    assert_eq!(fixed.len(), 2);
}

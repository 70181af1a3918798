use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};

use currawong::debruijn::positional::kmer_path_node::NodeId;
use currawong::debruijn::positional::memoized_contig_caller::{
    MemoizedContigCaller, ANCHORED_SCORE,
};
use currawong::debruijn::positional::path_node_graph::PathNodeGraph;
use currawong::test_utils::{chain_nodes, kpn_with_weight, DistinctSequenceBuilder};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn caller_over(graph: &PathNodeGraph) -> MemoizedContigCaller {
    let mut caller = MemoizedContigCaller::new(ANCHORED_SCORE);
    for node in graph.iter_by_position() {
        caller.add(node);
    }
    caller
}

#[test]
fn test_straight_line_best_contig() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let bases = builder.fresh(12);
    let mut graph = PathNodeGraph::new(k);
    let mut ids = Vec::new();
    for node in chain_nodes(k, &bases, 100, 4, 3, false, 2) {
        ids.push(graph.add(node).unwrap());
    }
    let mut caller = caller_over(&graph);
    let contig = caller.best_contig(&graph, i32::MAX).unwrap();
    let path: Vec<NodeId> = contig.iter().map(|sn| sn.node()).collect();
    assert_eq!(path, ids);
    assert_eq!(contig[0].first_start(), 100);
    assert_eq!(contig[2].first_start(), 108);
}

#[test]
fn test_nothing_callable_while_extension_is_loadable() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let bases = builder.fresh(8);
    let mut graph = PathNodeGraph::new(k);
    for node in chain_nodes(k, &bases, 100, 4, 2, false, 2) {
        graph.add(node).unwrap();
    }
    let mut caller = caller_over(&graph);
    // the second node ends its last kmer at 107; input at 108 could extend
    assert!(caller.best_contig(&graph, 104).is_none());
    assert!(caller.best_contig(&graph, 108).is_none());
    assert!(caller.best_contig(&graph, 109).is_some());
}

#[test]
fn test_anchored_path_beats_heavier_unanchored_path() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let anchored = builder.fresh(8);
    let heavy = builder.fresh(4);
    let mut graph = PathNodeGraph::new(k);
    let reference = graph
        .add(kpn_with_weight(k, &anchored[0..7], 100, 100, true, 1))
        .unwrap();
    let variant = graph
        .add(kpn_with_weight(k, &anchored[4..11], 104, 104, false, 1))
        .unwrap();
    let lone = graph
        .add(kpn_with_weight(k, &heavy, 100, 100, false, 1000))
        .unwrap();
    let mut caller = caller_over(&graph);
    let contig = caller.best_contig(&graph, i32::MAX).unwrap();
    // the anchor bonus dominates the heavy unanchored path, and the
    // reference anchor itself is stripped from the returned contig
    let path: Vec<NodeId> = contig.iter().map(|sn| sn.node()).collect();
    assert_eq!(path, vec![variant]);
    assert_ne!(path, vec![lone]);
    assert!(graph.contains(reference));
}

#[test]
fn test_export_state_lists_memoized_pieces() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let bases = builder.fresh(8);
    let mut graph = PathNodeGraph::new(k);
    for node in chain_nodes(k, &bases, 100, 4, 2, false, 2) {
        graph.add(node).unwrap();
    }
    let mut caller = caller_over(&graph);
    caller.best_contig(&graph, i32::MAX);
    let mut out = Vec::new();
    caller.export_state(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("node,kmer,first_start"));
    assert!(text.lines().count() >= 3, "one header and one line per piece");
}

#[test]
fn test_remove_matches_fresh_recomputation() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let bases = builder.fresh(20);
    let mut graph = PathNodeGraph::new(k);
    let mut ids = Vec::new();
    for node in chain_nodes(k, &bases, 100, 4, 5, false, 2) {
        ids.push(graph.add(node).unwrap());
    }
    let mut caller = caller_over(&graph);
    caller.best_contig(&graph, i32::MAX);
    // removing a mid-chain node invalidates every downstream memoized path
    caller.remove(&[ids[1]], &graph);
    graph.remove(ids[1]);
    caller.best_contig(&graph, i32::MAX);
    let mut fresh = caller_over(&graph);
    fresh.best_contig(&graph, i32::MAX);
    assert!(caller.sanity_check_matches(&fresh));
    assert!(caller.sanity_check(&graph));
}

#[test]
fn test_incremental_add_matches_fresh_recomputation() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let trunk = builder.fresh(12);
    let tail_a = builder.branch(&trunk, 8);
    let tail_b = builder.branch(&trunk, 8);
    let mut graph = PathNodeGraph::new(k);
    let mut caller = MemoizedContigCaller::new(ANCHORED_SCORE);
    for node in chain_nodes(k, &trunk, 100, 4, 3, true, 1) {
        let id = graph.add(node).unwrap();
        caller.add(graph.node(id));
        caller.best_contig(&graph, graph.node(id).first_start() + 1);
    }
    for node in chain_nodes(k, &tail_a, 112, 4, 2, false, 2) {
        let id = graph.add(node).unwrap();
        caller.add(graph.node(id));
    }
    for node in chain_nodes(k, &tail_b, 112, 4, 2, false, 3) {
        let id = graph.add(node).unwrap();
        caller.add(graph.node(id));
    }
    caller.best_contig(&graph, i32::MAX);
    let mut fresh = caller_over(&graph);
    fresh.best_contig(&graph, i32::MAX);
    assert!(caller.sanity_check_matches(&fresh));
}

#[test]
fn test_random_mutations_match_fresh_recomputation() {
    init();
    let k = 5;
    let mut rng = StdRng::seed_from_u64(1842);
    for _round in 0..10 {
        let mut builder = DistinctSequenceBuilder::new(k);
        let mut graph = PathNodeGraph::new(k);
        let mut caller = MemoizedContigCaller::new(ANCHORED_SCORE);
        let mut ids = Vec::new();
        let trunk = builder.fresh(20);
        for node in chain_nodes(k, &trunk, 100, 4, 5, rng.gen_bool(0.3), 2) {
            let id = graph.add(node).unwrap();
            caller.add(graph.node(id));
            ids.push(id);
        }
        for _ in 0..4 {
            let branch_kmers = rng.gen_range(3..9);
            let branch = builder.branch(&trunk, branch_kmers);
            let position = 100 + rng.gen_range(0..20) as i32;
            let node = kpn_with_weight(
                k,
                &branch,
                position,
                position + rng.gen_range(0..4) as i32,
                rng.gen_bool(0.2),
                rng.gen_range(1..5),
            );
            if let Ok(id) = graph.add(node) {
                caller.add(graph.node(id));
                ids.push(id);
            }
        }
        // interleave queries and removals
        caller.best_contig(&graph, 110);
        while !ids.is_empty() {
            let victim = ids.swap_remove(rng.gen_range(0..ids.len()));
            caller.remove(&[victim], &graph);
            graph.remove(victim);
            let position = 100 + rng.gen_range(0..40) as i32;
            caller.best_contig(&graph, position);
            caller.best_contig(&graph, i32::MAX);
            let mut fresh = caller_over(&graph);
            fresh.best_contig(&graph, i32::MAX);
            assert!(
                caller.sanity_check_matches(&fresh),
                "mismatch after removing {:?}",
                victim
            );
            assert!(caller.sanity_check(&graph));
        }
    }
}

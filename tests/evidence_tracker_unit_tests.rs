use currawong::debruijn::positional::evidence_tracker::EvidenceTracker;
use currawong::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use currawong::debruijn::positional::path_node_graph::PathNodeGraph;
use currawong::test_utils::{evidence, kpn};

#[test]
fn should_track_when_iterated() {
    let k = 4;
    let mut graph = PathNodeGraph::new(k);
    let node = graph.add(kpn(k, "AAAA", 1, 1, true)).unwrap();
    let subnode = KmerPathSubnode::whole(graph.node(node));
    let mut tracker = EvidenceTracker::new();
    let result = tracker.untrack([subnode].iter(), &graph);
    assert_eq!(result.len(), 0);
    tracker.track(evidence("read1", k, "AAAAT", 1, 1, 1, false));
    let result = tracker.untrack([subnode].iter(), &graph);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id(), "read1");
}

#[test]
fn should_untrack_all_evidence_nodes() {
    let k = 4;
    let mut graph = PathNodeGraph::new(k);
    let first = graph.add(kpn(k, "AAAA", 1, 1, true)).unwrap();
    let shifted = graph.add(kpn(k, "AAAA", 2, 2, true)).unwrap();
    let first_subnode = KmerPathSubnode::whole(graph.node(first));
    let shifted_subnode = KmerPathSubnode::whole(graph.node(shifted));
    let mut tracker = EvidenceTracker::new();
    // both kmers of the read are support nodes of the same evidence
    tracker.track(evidence("read1", k, "AAAAA", 1, 1, 1, false));
    let result = tracker.untrack([first_subnode].iter(), &graph);
    assert_eq!(result.len(), 1);
    let result = tracker.untrack([first_subnode].iter(), &graph);
    assert_eq!(result.len(), 0);
    let result = tracker.untrack([shifted_subnode].iter(), &graph);
    assert_eq!(result.len(), 0);
}

#[test]
fn should_track_evidence_id() {
    let k = 4;
    let mut tracker = EvidenceTracker::new();
    let e = evidence("read1", k, "AAAAT", 1, 1, 1, false);
    assert!(!tracker.is_tracked("read1"));
    tracker.track(e.clone());
    assert!(tracker.is_tracked("read1"));
    tracker.remove(&[e]);
    assert!(!tracker.is_tracked("read1"));
}

#[test]
fn should_only_gather_positionally_overlapping_support() {
    let k = 4;
    let mut graph = PathNodeGraph::new(k);
    let node = graph.add(kpn(k, "AAAA", 10, 12, true)).unwrap();
    let subnode = KmerPathSubnode::whole(graph.node(node));
    let mut tracker = EvidenceTracker::new();
    tracker.track(evidence("near", k, "AAAA", 12, 12, 1, false));
    tracker.track(evidence("far", k, "AAAA", 50, 50, 1, false));
    let result = tracker.untrack([subnode].iter(), &graph);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id(), "near");
    assert!(tracker.is_tracked("far"));
}

#[test]
fn support_should_be_read_only() {
    let k = 4;
    let mut graph = PathNodeGraph::new(k);
    let node = graph.add(kpn(k, "AAAA", 1, 1, true)).unwrap();
    let subnode = KmerPathSubnode::whole(graph.node(node));
    let mut tracker = EvidenceTracker::new();
    tracker.track(evidence("read1", k, "AAAAT", 1, 1, 1, false));
    {
        let support = tracker.support([subnode].iter(), &graph);
        assert_eq!(support.len(), 1);
        assert_eq!(support[0].id(), "read1");
    }
    assert!(tracker.is_tracked("read1"));
    assert_eq!(tracker.tracked_count(), 1);
}

#[test]
fn should_gather_through_collapsed_kmers() {
    let k = 4;
    let mut graph = PathNodeGraph::new(k);
    let collapsed = currawong::debruijn::kmer_encoding::KmerEncodingUtils::encode(k, b"AGAA");
    let node = graph
        .add(kpn(k, "AAAA", 1, 1, false).with_collapsed_kmers(vec![collapsed], vec![0]))
        .unwrap();
    let subnode = KmerPathSubnode::whole(graph.node(node));
    let mut tracker = EvidenceTracker::new();
    tracker.track(evidence("alternate", k, "AGAA", 1, 1, 1, false));
    let result = tracker.untrack([subnode].iter(), &graph);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id(), "alternate");
}

#[test]
fn should_remove_efficiently_in_degenerate_sequence() {
    let k = 4;
    let mut tracker = EvidenceTracker::new();
    let mut all = Vec::new();
    for i in 0..1000 {
        let e = evidence(&format!("read{}", i), k, "AAAAAAAA", 1, 1, 1, false);
        tracker.track(e.clone());
        all.push(e);
    }
    tracker.remove(&all);
    assert_eq!(tracker.tracked_count(), 0);
}

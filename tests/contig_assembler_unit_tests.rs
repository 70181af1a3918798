use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use currawong::assembly::configuration::PositionalAssemblyConfiguration;
use currawong::debruijn::positional::contig_assembler::ContigAssembler;
use currawong::debruijn::positional::kmer_path_node::KmerPathNode;
use currawong::model::assembled_contig::{AssembledContig, ContigCategory};
use currawong::model::breakend::{BreakendDirection, BreakendSummary};
use currawong::test_utils::{
    chain_evidence, chain_nodes, evidence, kpn_with_weight, test_config, tracker_with,
    DistinctSequenceBuilder,
};
use currawong::utils::errors::AssemblyError;
use currawong::visualisation::assembly_telemetry::{AssemblyTelemetry, ContigStats};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assemble(
    nodes: Vec<KmerPathNode>,
    evidence: Vec<currawong::debruijn::positional::kmer_evidence::KmerEvidence>,
    config: PositionalAssemblyConfiguration,
) -> Vec<AssembledContig> {
    let assembler = ContigAssembler::new(nodes.into_iter(), config, tracker_with(evidence))
        .expect("test configuration must validate");
    assembler
        .map(|result| result.expect("assembly must not fail"))
        .collect()
}

fn evidence_ids(contig: &AssembledContig) -> HashSet<String> {
    contig.evidence_ids.iter().cloned().collect()
}

#[test]
fn test_straight_line_graph_produces_single_unanchored_contig() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let bases = builder.fresh(40);
    let nodes = chain_nodes(k, &bases, 100, 4, 10, false, 2);
    let support = chain_evidence("R", k, &bases, 100, 4, 10, 2);
    let contigs = assemble(nodes, support, test_config(k));

    assert_eq!(contigs.len(), 1);
    let contig = &contigs[0];
    assert_eq!(contig.category, ContigCategory::UnanchoredBreakend);
    assert_eq!(contig.bases, bases.as_bytes().to_vec());
    assert!(contig.quals.iter().all(|q| *q == 2));
    assert_eq!(
        contig.breakend,
        Some(BreakendSummary::new(0, BreakendDirection::Forward, 100, 100))
    );
    let expected: HashSet<String> = (0..10).map(|i| format!("R{}", i)).collect();
    assert_eq!(evidence_ids(contig), expected);
}

#[test]
fn test_divergent_tails_produce_two_forward_anchored_breakends() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let reference = builder.fresh(20);
    let tail_a = builder.branch(&reference, 6);
    let tail_b = builder.branch(&reference, 6);

    let mut nodes = chain_nodes(k, &reference, 100, 4, 5, true, 1);
    nodes.push(kpn_with_weight(k, &tail_a, 120, 120, false, 2));
    nodes.push(kpn_with_weight(k, &tail_b, 120, 120, false, 2));
    let mut support = chain_evidence("REF", k, &reference, 100, 4, 5, 1);
    support.push(evidence("A", k, &tail_a, 120, 120, 2, false));
    support.push(evidence("B", k, &tail_b, 120, 120, 2, false));

    let contigs = assemble(nodes, support, test_config(k));
    assert_eq!(contigs.len(), 2);
    for contig in &contigs {
        assert_eq!(
            contig.category,
            ContigCategory::AnchoredBreakend(BreakendDirection::Forward)
        );
        // anchored at the last reference base before the divergence
        assert_eq!(contig.start_anchor_position, Some(122));
        assert_eq!(contig.start_anchor_base_count, 10);
        // 10 anchor bases plus the 6 breakend bases
        assert_eq!(contig.bases.len(), 16);
        assert_eq!(&contig.bases[0..10], &reference.as_bytes()[13..23]);
    }
    let first = evidence_ids(&contigs[0]);
    let second = evidence_ids(&contigs[1]);
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    let union: HashSet<String> = first.union(&second).cloned().collect();
    assert_eq!(
        union,
        HashSet::from(["A".to_string(), "B".to_string()]),
        "each tail is called with its own evidence"
    );
    assert_eq!(
        &contigs[0].bases[10..16],
        &tail_a.as_bytes()[3..9],
        "the lower kmer tail is called first"
    );
}

#[test]
fn test_kmer_repeat_truncates_contig_and_evidence() {
    init();
    let k = 4;
    // AAAA occurs at concatenated kmer offsets 0 and 12
    let nodes = vec![
        kpn_with_weight(k, "AAAATTTTGTT", 100, 100, false, 2),
        kpn_with_weight(k, "GTTCAAA", 108, 108, false, 2),
        kpn_with_weight(k, "AAAA", 112, 112, false, 2),
    ];
    let support = vec![
        evidence("E1", k, "AAAATTTTGTT", 100, 100, 2, false),
        evidence("E2", k, "GTTCAAA", 108, 108, 2, false),
        // positionally tracked to the second AAAA occurrence but only
        // alignable at the first
        evidence("E3", k, "AAAATTT", 112, 112, 2, false),
    ];
    let contigs = assemble(nodes, support, test_config(k));

    assert_eq!(contigs.len(), 2);
    let truncated = &contigs[0];
    assert_eq!(truncated.bases, b"AAAATTTTGTTCAAA".to_vec());
    assert_eq!(
        evidence_ids(truncated),
        HashSet::from(["E1".to_string(), "E2".to_string()]),
        "the truncated contig keeps a strict subset of the raw support"
    );
    // the mis-tracked support is called on its own afterwards
    let residual = &contigs[1];
    assert_eq!(residual.bases, b"AAAA".to_vec());
    assert_eq!(evidence_ids(residual), HashSet::from(["E3".to_string()]));
}

#[test]
fn test_wide_graph_forces_premature_flush_calls() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let bases = builder.fresh(200);
    let nodes = chain_nodes(k, &bases, 100, 4, 50, false, 2);
    let support = chain_evidence("R", k, &bases, 100, 4, 50, 2);
    let mut config = test_config(k);
    config.retain_width_multiple = 1.0;
    config.flush_width_multiple = 1.0;
    config.remove_misassembled_partial_contigs_during_assembly = false;
    let full_length = bases.len();

    let contigs = assemble(nodes, support, config);
    assert!(
        contigs.len() >= 2,
        "bounding the graph width must split the chain"
    );
    assert!(
        contigs.iter().all(|c| c.bases.len() < full_length),
        "no contig may span the whole over-wide chain"
    );
    let mut seen: HashSet<String> = HashSet::new();
    for contig in &contigs {
        for id in &contig.evidence_ids {
            assert!(seen.insert(id.clone()), "evidence {} retired twice", id);
        }
    }
    let expected: HashSet<String> = (0..50).map(|i| format!("R{}", i)).collect();
    assert_eq!(seen, expected, "every piece of evidence is called exactly once");
}

#[test]
fn test_reference_allele_is_assembled_but_not_emitted() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let left = builder.fresh(8);
    let variant = builder.branch(&left, 2);
    let right = builder.branch(&variant, 8);

    let nodes = vec![
        kpn_with_weight(k, &left, 100, 100, true, 1),
        kpn_with_weight(k, &variant, 108, 108, false, 2),
        kpn_with_weight(k, &right, 110, 110, true, 1),
    ];
    let support = vec![
        evidence("LEFT", k, &left, 100, 100, 1, false),
        evidence("VAR", k, &variant, 108, 108, 2, false),
        evidence("RIGHT", k, &right, 110, 110, 1, false),
    ];
    let mut assembler = ContigAssembler::new(
        nodes.into_iter(),
        test_config(k),
        tracker_with(support),
    )
    .unwrap();
    let contigs: Vec<_> = (&mut assembler)
        .map(|result| result.expect("assembly must not fail"))
        .collect();

    assert!(contigs.is_empty(), "a reference allele is not emitted");
    assert_eq!(
        assembler.tracking_contigs_called(),
        1,
        "the allele was still called and its evidence consumed"
    );
    assert_eq!(assembler.tracking_active_nodes(), 0);
}

#[test]
fn test_evidence_overreach_is_soft_and_still_retired() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let near = builder.fresh(4);
    let far = builder.fresh(4);
    let nodes = vec![
        kpn_with_weight(k, &near, 100, 100, false, 2),
        kpn_with_weight(k, &far, 5000, 5000, false, 2),
    ];
    let support = vec![
        // support reaching far past the input position at removal time
        evidence("E1", k, &near, 100, 6000, 2, false),
        evidence("E2", k, &far, 5000, 5000, 2, false),
    ];
    let contigs = assemble(nodes, support, test_config(k));

    assert_eq!(contigs.len(), 2);
    assert_eq!(evidence_ids(&contigs[0]), HashSet::from(["E1".to_string()]));
    assert_eq!(evidence_ids(&contigs[1]), HashSet::from(["E2".to_string()]));
}

#[test]
fn test_out_of_order_input_is_fatal() {
    init();
    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let first = builder.fresh(4);
    let second = builder.fresh(4);
    let nodes = vec![
        kpn_with_weight(k, &first, 100, 100, false, 2),
        kpn_with_weight(k, &second, 50, 50, false, 2),
    ];
    let mut assembler =
        ContigAssembler::new(nodes.into_iter(), test_config(k), tracker_with(Vec::new()))
            .unwrap();
    match assembler.next() {
        Some(Err(AssemblyError::InvariantViolation(_))) => {}
        other => panic!("expected a fatal ordering violation, got {:?}", other),
    }
    assert!(assembler.next().is_none(), "the stream is fused after a fatal error");
}

#[test]
fn test_configuration_failures_are_fatal_at_construction() {
    init();
    assert!(matches!(
        PositionalAssemblyConfiguration::new(0, 0, 50, 10, 30, 10),
        Err(AssemblyError::ConfigurationFailure(_))
    ));
    assert!(matches!(
        PositionalAssemblyConfiguration::new(33, 0, 50, 10, 30, 10),
        Err(AssemblyError::ConfigurationFailure(_))
    ));
    let mut config = test_config(4);
    config.flush_width_multiple = 0.0;
    let nodes: Vec<KmerPathNode> = Vec::new();
    assert!(matches!(
        ContigAssembler::new(nodes.into_iter(), config, tracker_with(Vec::new())),
        Err(AssemblyError::ConfigurationFailure(_))
    ));
}

#[test]
fn test_telemetry_sinks_observe_assembly_without_affecting_it() {
    init();
    struct FailingWriter;
    impl std::io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "sink failed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let k = 4;
    let mut builder = DistinctSequenceBuilder::new(k);
    let bases = builder.fresh(40);
    let nodes = chain_nodes(k, &bases, 100, 4, 10, false, 2);
    let support = chain_evidence("R", k, &bases, 100, 4, 10, 2);

    let stats: Rc<RefCell<Vec<ContigStats>>> = Rc::new(RefCell::new(Vec::new()));
    let stats_sink = stats.clone();
    let telemetry = AssemblyTelemetry::new()
        .with_contig_stats_sink(Box::new(move |s: &ContigStats| {
            stats_sink.borrow_mut().push(s.clone());
        }))
        .with_graph_sink(Box::new(FailingWriter))
        .with_memoization_sink(Box::new(Vec::new()));

    let assembler = ContigAssembler::new(
        nodes.into_iter(),
        test_config(k),
        tracker_with(support),
    )
    .unwrap()
    .with_telemetry(telemetry);
    let contigs: Vec<_> = assembler
        .map(|result| result.expect("a failing sink must not fail assembly"))
        .collect();

    assert_eq!(contigs.len(), 1);
    let recorded = stats.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].contig_nodes, 10);
    assert_eq!(recorded[0].contig_start_position, 100);
}

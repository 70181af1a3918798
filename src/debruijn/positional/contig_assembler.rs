use hashlink::LinkedHashMap;
use std::collections::{HashSet, VecDeque};
use std::iter::Peekable;

use crate::assembly::configuration::PositionalAssemblyConfiguration;
use crate::debruijn::kmer_encoding::KmerEncodingUtils;
use crate::debruijn::positional::anchor_extender::PathGreedyTraversal;
use crate::debruijn::positional::evidence_tracker::EvidenceTracker;
use crate::debruijn::positional::kmer_evidence::KmerEvidence;
use crate::debruijn::positional::kmer_path_node::{KmerPathNode, NodeId};
use crate::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use crate::debruijn::positional::memoized_contig_caller::{MemoizedContigCaller, ANCHORED_SCORE};
use crate::debruijn::positional::misassembly_fixer::MisassemblyFixer;
use crate::debruijn::positional::path_node_graph::PathNodeGraph;
use crate::debruijn::positional::weight_splitter::{remove_weight, SupportInterval};
use crate::model::assembled_contig::AssembledContig;
use crate::model::breakend::{calculate_breakend, BreakendDirection, BreakendSummary};
use crate::utils::errors::AssemblyError;
use crate::utils::interval_utils::IntervalUtils;
use crate::utils::quality_utils::QualityUtils;
use crate::visualisation::assembly_telemetry::{AssemblyTelemetry, ContigStats};

/**
 * Calls optimal contigs from a positional de Bruijn graph.
 *
 * Input is a position-sorted stream of path nodes. Nodes are loaded in
 * batches into the working graph, the memoized caller continuously tracks
 * the best anchored path through the loaded graph, and contigs are emitted
 * as soon as no unloaded input could extend them. Each called contig is
 * re-segmented when it contains a kmer repeat, extended with
 * reference-anchored flanking paths, synthesised into bases and qualities
 * and classified by its anchors; the weight contributed by its supporting
 * evidence is then subtracted from the graph.
 *
 * Fatal errors are yielded once through the iterator, which is fused
 * afterwards. Soft inconsistencies are logged and assembly continues.
 */
pub struct ContigAssembler<I: Iterator<Item = KmerPathNode>> {
    underlying: Peekable<I>,
    config: PositionalAssemblyConfiguration,
    graph: PathNodeGraph,
    evidence_tracker: EvidenceTracker,
    best_contig_caller: MemoizedContigCaller,
    telemetry: AssemblyTelemetry,
    called: VecDeque<AssembledContig>,
    stats: ContigStats,
    last_underlying_start_position: i32,
    consumed: u64,
    contigs_called: u64,
    max_kmer_active_node_count: usize,
    finished: bool,
}

impl<I: Iterator<Item = KmerPathNode>> ContigAssembler<I> {
    pub fn new(
        underlying: I,
        config: PositionalAssemblyConfiguration,
        evidence_tracker: EvidenceTracker,
    ) -> Result<Self, AssemblyError> {
        config.validate()?;
        let graph = PathNodeGraph::new(config.k);
        Ok(ContigAssembler {
            underlying: underlying.peekable(),
            config,
            graph,
            evidence_tracker,
            best_contig_caller: MemoizedContigCaller::new(ANCHORED_SCORE),
            telemetry: AssemblyTelemetry::new(),
            called: VecDeque::new(),
            stats: ContigStats::default(),
            last_underlying_start_position: i32::MIN,
            consumed: 0,
            contigs_called: 0,
            max_kmer_active_node_count: 0,
            finished: false,
        })
    }

    pub fn with_telemetry(mut self, telemetry: AssemblyTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    fn next_position(&mut self) -> i32 {
        self.underlying
            .peek()
            .map(|node| node.first_start())
            .unwrap_or(i32::MAX)
    }

    fn ensure_called_contig(&mut self) -> Result<(), AssemblyError> {
        if !self.called.is_empty() {
            return Ok(());
        }
        while self.called.is_empty() {
            // Safety calling to ensure the loaded graph width stays bounded
            if self.graph.first_non_reference_start() != i32::MAX {
                let retain_width = self.config.retain_width();
                let flush_width = self.config.flush_width();
                let loaded_start = self.graph.first_non_reference_start();
                let next_position = self.next_position();
                let frontier_start = self.best_contig_caller.frontier_start(next_position);
                if loaded_start
                    .saturating_add(retain_width)
                    .saturating_add(flush_width)
                    < frontier_start
                {
                    loop {
                        // keep calling until no contigs remain, even though
                        // the calls may be suboptimal
                        let next_position = self.next_position();
                        let forced = self.best_contig_caller.call_best_contig_before(
                            &self.graph,
                            next_position,
                            frontier_start.saturating_sub(flush_width),
                        );
                        let exhausted = forced.is_none();
                        self.call_contig(forced)?;
                        if exhausted {
                            break;
                        }
                    }
                    self.flush_reference_nodes()?;
                    if !self.called.is_empty() {
                        return Ok(());
                    }
                }
            }
            // Call the next contig
            let next_position = self.next_position();
            let best = self
                .best_contig_caller
                .best_contig(&self.graph, next_position);
            let was_callable = best.is_some();
            self.call_contig(best)?;
            if self.called.is_empty() && !was_callable {
                if self.underlying.peek().is_some() {
                    self.advance_underlying()?;
                    if self
                        .config
                        .remove_misassembled_partial_contigs_during_assembly
                    {
                        self.remove_misassembled_partial_contig()?;
                    }
                    self.flush_reference_nodes()?;
                } else {
                    self.flush_reference_nodes()?;
                    if !self.graph.is_empty() {
                        error!("Sanity check failure: non-empty graph with no contigs called");
                    }
                    break;
                }
            }
        }
        if self.config.sanity_check_memoization {
            if !self.verify_memoization() {
                return Err(AssemblyError::InvariantViolation(
                    "memoization does not match a fresh recomputation".to_string(),
                ));
            }
        }
        Ok(())
    }

    /**
     * Removes reference nodes that can no longer contribute to any contig
     * or contig anchor
     */
    fn flush_reference_nodes(&mut self) -> Result<(), AssemblyError> {
        let next_position = self.next_position();
        let position_base = {
            let non_reference_start = self.graph.first_non_reference_start();
            if non_reference_start == i32::MAX {
                next_position
            } else {
                non_reference_start
            }
        };
        // first position guaranteed to be clear of every contig anchor
        let position = position_base
            .saturating_sub(self.config.max_evidence_support_interval_width)
            .saturating_sub(self.config.max_contig_anchor_length());
        if !self.graph.is_empty() && self.graph.first_start() < position {
            let nodes: Vec<KmerPathSubnode> = self
                .graph
                .iter_by_position()
                .take_while(|node| node.first_start() < position)
                .filter(|node| node.is_reference())
                .map(KmerPathSubnode::whole)
                .collect();
            let to_remove = self.evidence_tracker.untrack(nodes.iter(), &self.graph);
            if !to_remove.is_empty() {
                self.remove_evidence_from_graph(to_remove)?;
            }
        }
        Ok(())
    }

    /**
     * Removes partial contigs longer than the maximum theoretical breakend
     * contig length
     */
    fn remove_misassembled_partial_contig(&mut self) -> Result<(), AssemblyError> {
        let loaded_before = self.next_position();
        let misassembly_length = self.config.misassembly_length();
        let misassembly = self.best_contig_caller.frontier_path(
            &self.graph,
            loaded_before,
            loaded_before.saturating_sub(misassembly_length),
        );
        if let Some(path) = misassembly {
            let width = self.config.max_evidence_support_interval_width;
            // only remove nodes whose every contributing read has been fully
            // loaded; a read may also contribute to an unprocessed node
            let filtered: Vec<KmerPathSubnode> = path
                .iter()
                .filter(|sn| sn.last_end(&self.graph).saturating_add(width) < loaded_before)
                .cloned()
                .collect();
            let evidence = self.evidence_tracker.untrack(filtered.iter(), &self.graph);
            if !evidence.is_empty() {
                self.remove_evidence_from_graph(evidence)?;
            }
        }
        Ok(())
    }

    /**
     * Loads additional nodes into the graph. Loading in batches reduces the
     * memoization frontier advancement overhead.
     */
    fn advance_underlying(&mut self) -> Result<(), AssemblyError> {
        let mut load_until = self.next_position();
        if load_until < i32::MAX {
            load_until = load_until
                .saturating_add(self.config.max_evidence_support_interval_width)
                .saturating_add(1);
        }
        self.advance_underlying_until(load_until)
    }

    fn advance_underlying_until(&mut self, load_until: i32) -> Result<(), AssemblyError> {
        while let Some(first_start) = self.underlying.peek().map(|node| node.first_start()) {
            if first_start > load_until {
                break;
            }
            let node = match self.underlying.next() {
                Some(node) => node,
                None => break,
            };
            if node.first_start() < self.last_underlying_start_position {
                return Err(AssemblyError::InvariantViolation(format!(
                    "Input node at {} precedes previously loaded node at {}",
                    node.first_start(),
                    self.last_underlying_start_position
                )));
            }
            self.last_underlying_start_position = node.first_start();
            self.add_to_graph(node)?;
            self.consumed += 1;
        }
        Ok(())
    }

    fn add_to_graph(&mut self, node: KmerPathNode) -> Result<(), AssemblyError> {
        let id = self.graph.add(node)?;
        self.best_contig_caller.add(self.graph.node(id));
        self.max_kmer_active_node_count = std::cmp::max(
            self.max_kmer_active_node_count,
            self.graph.max_kmer_occurrence_count(),
        );
        if self.config.sanity_check_graph {
            let subnode = KmerPathSubnode::whole(self.graph.node(id));
            if !self.evidence_tracker.matches_expected(&subnode, &self.graph) {
                error!(
                    "Loaded node {} weight does not match its tracked evidence",
                    id
                );
            }
        }
        Ok(())
    }

    fn call_contig(
        &mut self,
        rawcontig: Option<VecDeque<KmerPathSubnode>>,
    ) -> Result<(), AssemblyError> {
        let Some(rawcontig) = rawcontig else {
            return Ok(());
        };
        let mut contig = rawcontig.clone();
        if self.contains_kmer_repeat(&contig) {
            // recalculate the called contig; this may break the contig at
            // the repeated kmer
            let fixer = MisassemblyFixer::new(&contig, &self.graph);
            let support = self.evidence_tracker.support(contig.iter(), &self.graph);
            contig = fixer.correct_misassigned_evidence(&support).into();
        }
        if contig.is_empty() {
            // nothing assemblable remains; the raw nodes must still come out
            // of the graph or the caller would return the same path forever
            error!(
                "Sanity check failure: contig at {} has no support at all. \
                 Removing its nodes directly",
                rawcontig
                    .front()
                    .map(|sn| sn.first_start())
                    .unwrap_or(i32::MIN)
            );
            self.remove_contig_nodes_directly(&rawcontig);
            return Ok(());
        }
        let evidence = self.evidence_tracker.untrack(contig.iter(), &self.graph);

        let contig_length: usize = contig.iter().map(|sn| sn.length(&self.graph)).sum();
        let target_anchor_length = std::cmp::max(contig_length, self.config.max_anchor_length);
        let width = self.config.max_evidence_support_interval_width;

        let Some(&first) = contig.front() else {
            return Ok(());
        };
        let start_budget = target_anchor_length + width as usize + first.length(&self.graph);
        let mut start_traversal = PathGreedyTraversal::new(&self.graph, first, false, start_budget);
        start_traversal.greedy_traverse(true, false);
        let mut starting_anchor = start_traversal.into_subnodes();
        starting_anchor.pop_back();

        // make sure enough of the graph is loaded that the forward anchor
        // traversal is fully defined
        let Some(&last) = contig.back() else {
            return Ok(());
        };
        let advance_to = last
            .last_end(&self.graph)
            .saturating_add(target_anchor_length as i32)
            .saturating_add(width);
        self.advance_underlying_until(advance_to)?;
        let end_budget = target_anchor_length + width as usize + last.length(&self.graph);
        let mut end_traversal = PathGreedyTraversal::new(&self.graph, last, true, end_budget);
        end_traversal.greedy_traverse(true, false);
        let mut ending_anchor = end_traversal.into_subnodes();
        ending_anchor.pop_front();

        let full_contig: Vec<KmerPathSubnode> = starting_anchor
            .iter()
            .chain(contig.iter())
            .chain(ending_anchor.iter())
            .cloned()
            .collect();
        let mut path_kmers = Vec::new();
        let mut path_weights = Vec::new();
        for subnode in &full_contig {
            let node = self.graph.node(subnode.node());
            path_kmers.extend_from_slice(node.kmers());
            path_weights.extend_from_slice(node.weights());
        }
        let k = self.config.k;
        let mut bases = KmerEncodingUtils::base_calls(&path_kmers, k);
        let mut quals = QualityUtils::kmer_weights_to_base_quals(
            k,
            &path_weights,
            self.config.quality_scaling,
        );
        debug_assert_eq!(bases.len(), quals.len());

        // left aligned anchor position, although anchoring should be a
        // single base wide
        let start_anchor_position = starting_anchor
            .back()
            .map(|sn| sn.last_start(&self.graph) + k as i32 - 1);
        let end_anchor_position = ending_anchor.front().map(|sn| sn.first_start());
        let start_anchor_base_count = if starting_anchor.is_empty() {
            0
        } else {
            starting_anchor
                .iter()
                .map(|sn| sn.length(&self.graph))
                .sum::<usize>()
                + k
                - 1
        };
        let end_anchor_base_count = if ending_anchor.is_empty() {
            0
        } else {
            ending_anchor
                .iter()
                .map(|sn| sn.length(&self.graph))
                .sum::<usize>()
                + k
                - 1
        };
        let start_bases_to_trim = start_anchor_base_count.saturating_sub(target_anchor_length);
        let end_bases_to_trim = end_anchor_base_count.saturating_sub(target_anchor_length);
        bases.drain(0..start_bases_to_trim);
        bases.truncate(bases.len() - end_bases_to_trim);
        quals.drain(0..start_bases_to_trim);
        quals.truncate(quals.len() - end_bases_to_trim);

        let evidence_ids: Vec<String> = evidence.iter().map(|e| e.id().to_string()).collect();
        let assembled = if starting_anchor.is_empty() && ending_anchor.is_empty() {
            debug_assert_eq!(start_bases_to_trim, 0);
            debug_assert_eq!(end_bases_to_trim, 0);
            // unanchored
            let breakends: Vec<BreakendSummary> =
                evidence.iter().map(|e| *e.breakend()).collect();
            let qualities: Vec<f64> = evidence.iter().map(|e| e.quality()).collect();
            let breakend = calculate_breakend(&breakends, &qualities);
            if evidence.iter().any(|e| e.is_anchored()) {
                debug!(
                    "Unanchored assembly at {} contains anchored evidence",
                    first.first_start()
                );
            }
            Some(AssembledContig::unanchored_breakend(
                self.config.reference_index,
                breakend,
                evidence_ids,
                bases,
                quals,
            ))
        } else if starting_anchor.is_empty() {
            // end anchored
            Some(AssembledContig::anchored_breakend(
                self.config.reference_index,
                BreakendDirection::Backward,
                end_anchor_position.unwrap_or(0),
                end_anchor_base_count - end_bases_to_trim,
                evidence_ids,
                bases,
                quals,
            ))
        } else if ending_anchor.is_empty() {
            // start anchored
            Some(AssembledContig::anchored_breakend(
                self.config.reference_index,
                BreakendDirection::Forward,
                start_anchor_position.unwrap_or(0),
                start_anchor_base_count - start_bases_to_trim,
                evidence_ids,
                bases,
                quals,
            ))
        } else if start_anchor_base_count + end_anchor_base_count >= quals.len() {
            // no unanchored bases: the path is a reference allele, not a
            // structural variant
            None
        } else {
            Some(AssembledContig::anchored_breakpoint(
                self.config.reference_index,
                start_anchor_position.unwrap_or(0),
                start_anchor_base_count - start_bases_to_trim,
                end_anchor_position.unwrap_or(0),
                end_anchor_base_count - end_bases_to_trim,
                evidence_ids,
                bases,
                quals,
            ))
        };
        if assembled.is_some() {
            self.telemetry.export_graph(k, &self.graph, &full_contig);
            self.telemetry.export_memoization(&self.best_contig_caller);
        }
        self.stats = ContigStats {
            contig_nodes: contig.len(),
            truncated_nodes: rawcontig.len() - contig.len(),
            contig_start_position: first.first_start(),
            start_anchor_nodes: starting_anchor.len(),
            end_anchor_nodes: ending_anchor.len(),
        };
        self.telemetry.track_assembly(&self.stats);

        // remove all evidence contributing to this assembly from the graph
        if !evidence.is_empty() {
            self.remove_evidence_from_graph(evidence)?;
        } else {
            error!(
                "Sanity check failure: found path with no support. \
                 Attempting to recover by direct node removal"
            );
            self.remove_contig_nodes_directly(&contig);
        }
        self.contigs_called += 1;
        if let Some(contig) = assembled {
            self.called.push_back(contig);
        }
        Ok(())
    }

    fn remove_contig_nodes_directly(&mut self, contig: &VecDeque<KmerPathSubnode>) {
        let mut ids: Vec<NodeId> = Vec::new();
        for subnode in contig {
            if self.graph.contains(subnode.node()) && !ids.contains(&subnode.node()) {
                ids.push(subnode.node());
            }
        }
        self.best_contig_caller.remove(&ids, &self.graph);
        for id in ids {
            self.graph.remove(id);
        }
    }

    fn contains_kmer_repeat(&self, contig: &VecDeque<KmerPathSubnode>) -> bool {
        let mut existing: HashSet<u64> = HashSet::new();
        for subnode in contig {
            let node = self.graph.node(subnode.node());
            for offset in 0..node.length() {
                if !existing.insert(node.kmer(offset)) {
                    return true;
                }
            }
            for kmer in node.collapsed_kmers() {
                if !existing.insert(*kmer) {
                    return true;
                }
            }
        }
        false
    }

    /**
     * Removes the given evidence from the graph, splitting nodes where the
     * subtraction is not uniform and re-announcing the replacements to the
     * caller
     */
    fn remove_evidence_from_graph(
        &mut self,
        evidence: Vec<KmerEvidence>,
    ) -> Result<(), AssemblyError> {
        debug_assert!(!evidence.is_empty());
        let next_position = self.next_position();
        let mut to_remove: LinkedHashMap<NodeId, Vec<Vec<SupportInterval>>> = LinkedHashMap::new();
        for e in &evidence {
            for offset in 0..e.len() {
                if let Some(support) = e.node(offset) {
                    if support.end() >= next_position {
                        error!(
                            "Sanity check failure: evidence {} extending to {} removed when \
                             input at {}",
                            e.id(),
                            support.end(),
                            next_position
                        );
                        // try to recover by removing the support anyway
                    }
                    for occurrence in self.graph.lookup(support.kmer()) {
                        let node = self.graph.node(occurrence.node);
                        let kmer_start = node.first_start() + occurrence.offset as i32;
                        let kmer_end = node.first_end() + occurrence.offset as i32;
                        if IntervalUtils::overlaps_closed(
                            support.start(),
                            support.end(),
                            kmer_start,
                            kmer_end,
                        ) {
                            let lists = to_remove
                                .entry(occurrence.node)
                                .or_insert_with(|| vec![Vec::new(); node.length()]);
                            lists[occurrence.offset].push(SupportInterval::new(
                                support.start(),
                                support.end(),
                                support.weight(),
                            ));
                        }
                    }
                }
            }
        }
        let node_ids: Vec<NodeId> = to_remove.keys().cloned().collect();
        self.best_contig_caller.remove(&node_ids, &self.graph);
        for (id, lists) in to_remove {
            let replacements = remove_weight(&mut self.graph, id, lists)?;
            for replacement in replacements {
                if self.config.sanity_check_graph {
                    let subnode = KmerPathSubnode::whole(self.graph.node(replacement));
                    if !self.evidence_tracker.matches_expected(&subnode, &self.graph) {
                        error!(
                            "Replacement node {} weight does not match its tracked evidence",
                            replacement
                        );
                    }
                }
                self.best_contig_caller.add(self.graph.node(replacement));
            }
        }
        if self.config.sanity_check_graph && !self.sanity_check() {
            return Err(AssemblyError::InvariantViolation(
                "graph consistency check failed after weight removal".to_string(),
            ));
        }
        if self.config.sanity_check_memoization {
            // force the memoization recalculation now so the removal can be
            // verified
            let next_position = self.next_position();
            self.best_contig_caller
                .best_contig(&self.graph, next_position);
            if !self.verify_memoization() {
                return Err(AssemblyError::InvariantViolation(
                    "memoization does not match a fresh recomputation after removal".to_string(),
                ));
            }
        }
        Ok(())
    }

    /**
     * Verifies that the memoization matches a freshly calculated one over
     * the current live node set
     */
    fn verify_memoization(&mut self) -> bool {
        let next_position = self.next_position();
        // both callers must have seen the same input position before their
        // memoizations are comparable
        self.best_contig_caller
            .best_contig(&self.graph, next_position);
        let mut fresh = MemoizedContigCaller::new(ANCHORED_SCORE);
        for node in self.graph.iter_by_position() {
            fresh.add(node);
        }
        fresh.best_contig(&self.graph, next_position);
        self.best_contig_caller.sanity_check_matches(&fresh)
    }

    pub fn sanity_check(&self) -> bool {
        if !self.graph.sanity_check_disjoint_node_intervals() {
            return false;
        }
        for node in self.graph.iter_by_position() {
            let subnode = KmerPathSubnode::whole(node);
            if !self.evidence_tracker.matches_expected(&subnode, &self.graph) {
                return false;
            }
        }
        self.best_contig_caller.sanity_check(&self.graph)
    }

    pub fn tracking_active_nodes(&self) -> usize {
        self.graph.len()
    }

    pub fn tracking_max_kmer_active_node_count(&self) -> usize {
        self.max_kmer_active_node_count
    }

    pub fn tracking_underlying_consumed(&self) -> u64 {
        self.consumed
    }

    pub fn tracking_input_position(&mut self) -> i32 {
        self.next_position()
    }

    pub fn tracking_first_position(&self) -> i32 {
        self.graph.first_start()
    }

    pub fn tracking_contigs_called(&self) -> u64 {
        self.contigs_called
    }

    pub fn tracking_last_contig(&self) -> &ContigStats {
        &self.stats
    }
}

impl<I: Iterator<Item = KmerPathNode>> Iterator for ContigAssembler<I> {
    type Item = Result<AssembledContig, AssemblyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Err(e) = self.ensure_called_contig() {
            self.finished = true;
            return Some(Err(e));
        }
        match self.called.pop_front() {
            Some(contig) => Some(Ok(contig)),
            None => {
                self.finished = true;
                None
            }
        }
    }
}

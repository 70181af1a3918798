use std::io::Write;

use crate::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use crate::debruijn::positional::memoized_contig_caller::MemoizedContigCaller;
use crate::debruijn::positional::path_node_graph::PathNodeGraph;
use crate::visualisation::positional_exporter::PositionalExporter;

/**
 * Per-contig assembly statistics, updated after each call.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContigStats {
    pub contig_nodes: usize,
    pub truncated_nodes: usize,
    pub contig_start_position: i32,
    pub start_anchor_nodes: usize,
    pub end_anchor_nodes: usize,
}

/**
 * Optional diagnostic sinks. Each sink is write-only and has no effect on
 * assembly output; a sink whose write fails is disabled with a warning and
 * assembly continues.
 */
#[derive(Default)]
pub struct AssemblyTelemetry {
    contig_stats_sink: Option<Box<dyn FnMut(&ContigStats)>>,
    memoization_sink: Option<Box<dyn Write>>,
    graph_sink: Option<Box<dyn Write>>,
}

impl AssemblyTelemetry {
    pub fn new() -> Self {
        AssemblyTelemetry::default()
    }

    pub fn with_contig_stats_sink(mut self, sink: Box<dyn FnMut(&ContigStats)>) -> Self {
        self.contig_stats_sink = Some(sink);
        self
    }

    pub fn with_memoization_sink(mut self, sink: Box<dyn Write>) -> Self {
        self.memoization_sink = Some(sink);
        self
    }

    pub fn with_graph_sink(mut self, sink: Box<dyn Write>) -> Self {
        self.graph_sink = Some(sink);
        self
    }

    pub fn track_assembly(&mut self, stats: &ContigStats) {
        if let Some(sink) = self.contig_stats_sink.as_mut() {
            sink(stats);
        }
    }

    pub fn export_memoization(&mut self, caller: &MemoizedContigCaller) {
        if let Some(sink) = self.memoization_sink.as_mut() {
            if let Err(e) = caller.export_state(sink) {
                warn!("Disabling memoization export: {}", e);
                self.memoization_sink = None;
            }
        }
    }

    pub fn export_graph(&mut self, k: usize, graph: &PathNodeGraph, contig: &[KmerPathSubnode]) {
        if let Some(sink) = self.graph_sink.as_mut() {
            if let Err(e) = PositionalExporter::export_dot(sink, k, graph, contig) {
                warn!("Disabling graph export: {}", e);
                self.graph_sink = None;
            }
        }
    }
}

use std::collections::HashSet;
use std::io::Write;

use crate::debruijn::kmer_encoding::KmerEncodingUtils;
use crate::debruijn::positional::kmer_path_node::NodeId;
use crate::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use crate::debruijn::positional::path_node_graph::PathNodeGraph;

pub struct PositionalExporter {}

impl PositionalExporter {
    /**
     * Writes the live graph in GraphViz dot format, highlighting the nodes
     * of the given contig path.
     */
    pub fn export_dot<W: Write>(
        writer: &mut W,
        k: usize,
        graph: &PathNodeGraph,
        contig: &[KmerPathSubnode],
    ) -> std::io::Result<()> {
        let highlighted: HashSet<NodeId> = contig.iter().map(|sn| sn.node()).collect();
        writeln!(writer, "digraph assembly {{")?;
        writeln!(writer, "  rankdir=LR;")?;
        for node in graph.iter_by_position() {
            let bases = KmerEncodingUtils::base_calls(node.kmers(), k);
            let mut attributes = format!(
                "label=\"{}\\n[{},{}] w={}\"",
                String::from_utf8_lossy(&bases),
                node.first_start(),
                node.first_end(),
                node.total_weight()
            );
            if node.is_reference() {
                attributes.push_str(" shape=box");
            }
            if highlighted.contains(&node.id()) {
                attributes.push_str(" color=red penwidth=2");
            }
            writeln!(writer, "  \"{}\" [{}];", node.id(), attributes)?;
        }
        for node in graph.iter_by_position() {
            for next in node.next() {
                writeln!(writer, "  \"{}\" -> \"{}\";", node.id(), next)?;
            }
        }
        writeln!(writer, "}}")?;
        Ok(())
    }
}

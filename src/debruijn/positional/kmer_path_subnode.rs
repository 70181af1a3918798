use crate::debruijn::positional::kmer_path_node::{KmerPathNode, NodeId};
use crate::debruijn::positional::path_node_graph::PathNodeGraph;
use crate::utils::interval_utils::IntervalUtils;

/**
 * A path node restricted to a sub-interval of its first-kmer positions.
 *
 * Subnodes are how paths through the graph are expressed: the interval of
 * each subnode on a path is the shift of its predecessor's interval by the
 * predecessor's kmer length.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KmerPathSubnode {
    node: NodeId,
    first_start: i32,
    first_end: i32,
}

impl KmerPathSubnode {
    pub fn new(node: NodeId, first_start: i32, first_end: i32) -> Self {
        assert!(first_start <= first_end);
        KmerPathSubnode {
            node,
            first_start,
            first_end,
        }
    }

    /**
     * Subnode covering the full first-kmer interval of the given node
     */
    pub fn whole(node: &KmerPathNode) -> Self {
        KmerPathSubnode {
            node: node.id(),
            first_start: node.first_start(),
            first_end: node.first_end(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn first_start(&self) -> i32 {
        self.first_start
    }

    pub fn first_end(&self) -> i32 {
        self.first_end
    }

    /**
     * Number of positions in this subnode's first-kmer interval
     */
    pub fn width(&self) -> i32 {
        self.first_end - self.first_start + 1
    }

    /**
     * Number of kmers in the underlying node
     */
    pub fn length(&self, graph: &PathNodeGraph) -> usize {
        graph.node(self.node).length()
    }

    pub fn last_start(&self, graph: &PathNodeGraph) -> i32 {
        self.first_start + self.length(graph) as i32 - 1
    }

    pub fn last_end(&self, graph: &PathNodeGraph) -> i32 {
        self.first_end + self.length(graph) as i32 - 1
    }

    /**
     * Successor subnodes reachable from this subnode in the live graph.
     * A successor node is clipped to the positions actually reachable from
     * this subnode's interval.
     */
    pub fn next_subnodes(&self, graph: &PathNodeGraph) -> Vec<KmerPathSubnode> {
        let length = self.length(graph) as i32;
        let window_start = self.first_start + length;
        let window_end = self.first_end + length;
        let mut successors = Vec::new();
        for next_id in graph.node(self.node).next() {
            let next = graph.node(*next_id);
            if let Some((start, end)) = IntervalUtils::intersection_closed(
                window_start,
                window_end,
                next.first_start(),
                next.first_end(),
            ) {
                successors.push(KmerPathSubnode::new(*next_id, start, end));
            }
        }
        successors
    }

    /**
     * Predecessor subnodes which can immediately precede this subnode in the
     * live graph, clipped to the positions from which this subnode's
     * interval is reachable.
     */
    pub fn prev_subnodes(&self, graph: &PathNodeGraph) -> Vec<KmerPathSubnode> {
        let mut predecessors = Vec::new();
        for prev_id in graph.node(self.node).prev() {
            let prev = graph.node(*prev_id);
            let length = prev.length() as i32;
            if let Some((start, end)) = IntervalUtils::intersection_closed(
                self.first_start - length,
                self.first_end - length,
                prev.first_start(),
                prev.first_end(),
            ) {
                predecessors.push(KmerPathSubnode::new(*prev_id, start, end));
            }
        }
        predecessors
    }
}

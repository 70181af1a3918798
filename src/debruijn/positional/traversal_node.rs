use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use crate::debruijn::positional::kmer_path_node::NodeId;
use crate::debruijn::positional::kmer_path_subnode::KmerPathSubnode;
use crate::debruijn::positional::path_node_graph::PathNodeGraph;

/**
 * One piece of the best-path memoization: a sub-interval of a node's first
 * positions over which the best path ending at that node has a constant
 * score and predecessor.
 *
 * Traversal nodes form immutable parent chains shared through Rc; a chain is
 * the traceback of the best path. path_offset is the total kmer length of
 * all ancestors, so the position of the path's starting kmer for any
 * position x in this piece is x - path_offset.
 */
#[derive(Debug)]
pub struct TraversalNode {
    subnode: KmerPathSubnode,
    score: i64,
    path_offset: i32,
    path_nodes: u32,
    has_non_reference: bool,
    parent: Option<Rc<TraversalNode>>,
}

impl TraversalNode {
    /**
     * Path of a single node over its full interval
     */
    pub fn starting(subnode: KmerPathSubnode, score: i64, is_reference: bool) -> Self {
        TraversalNode {
            subnode,
            score,
            path_offset: 0,
            path_nodes: 1,
            has_non_reference: !is_reference,
            parent: None,
        }
    }

    /**
     * Extension of the parent path into the given successor subnode
     */
    pub fn extending(
        parent: &Rc<TraversalNode>,
        parent_length: usize,
        subnode: KmerPathSubnode,
        node_score: i64,
        is_reference: bool,
    ) -> Self {
        TraversalNode {
            subnode,
            score: parent.score + node_score,
            path_offset: parent.path_offset + parent_length as i32,
            path_nodes: parent.path_nodes + 1,
            has_non_reference: parent.has_non_reference || !is_reference,
            parent: Some(parent.clone()),
        }
    }

    /**
     * Copy of this piece narrowed to a sub-range of its interval
     */
    pub fn narrowed(&self, first_start: i32, first_end: i32) -> Self {
        debug_assert!(first_start >= self.subnode.first_start());
        debug_assert!(first_end <= self.subnode.first_end());
        TraversalNode {
            subnode: KmerPathSubnode::new(self.subnode.node(), first_start, first_end),
            score: self.score,
            path_offset: self.path_offset,
            path_nodes: self.path_nodes,
            has_non_reference: self.has_non_reference,
            parent: self.parent.clone(),
        }
    }

    pub fn subnode(&self) -> &KmerPathSubnode {
        &self.subnode
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn path_nodes(&self) -> u32 {
        self.path_nodes
    }

    pub fn has_non_reference(&self) -> bool {
        self.has_non_reference
    }

    pub fn parent(&self) -> Option<&Rc<TraversalNode>> {
        self.parent.as_ref()
    }

    /**
     * Start position of the path's first kmer, for the earliest position of
     * this piece
     */
    pub fn path_first_start(&self) -> i32 {
        self.subnode.first_start() - self.path_offset
    }

    /**
     * @return true if any node on the path through this piece is in the
     * given set
     */
    pub fn path_contains_any(&self, nodes: &HashSet<NodeId>) -> bool {
        let mut current = Some(self);
        while let Some(tn) = current {
            if nodes.contains(&tn.subnode.node()) {
                return true;
            }
            current = tn.parent.as_deref();
        }
        false
    }

    /**
     * Traceback of the path ending at the given sub-range of this piece.
     * Each ancestor subnode is narrowed so consecutive subnodes are offset
     * by exactly the predecessor's length.
     */
    pub fn to_subnode_path(
        &self,
        first_start: i32,
        first_end: i32,
        graph: &PathNodeGraph,
    ) -> VecDeque<KmerPathSubnode> {
        debug_assert!(first_start >= self.subnode.first_start());
        debug_assert!(first_end <= self.subnode.first_end());
        let mut path = VecDeque::with_capacity(self.path_nodes as usize);
        let mut start = first_start;
        let mut end = first_end;
        let mut current = Some(self);
        while let Some(tn) = current {
            path.push_front(KmerPathSubnode::new(tn.subnode.node(), start, end));
            if let Some(parent) = tn.parent.as_deref() {
                let length = graph.node(parent.subnode.node()).length() as i32;
                start = std::cmp::max(start - length, parent.subnode.first_start());
                end = std::cmp::min(end - length, parent.subnode.first_end());
                debug_assert!(start <= end);
            }
            current = tn.parent.as_deref();
        }
        path
    }
}

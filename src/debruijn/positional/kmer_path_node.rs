use std::fmt;

/**
 * Arena identity of a live path node. Ids are allocated by the graph and
 * never reused, so a stale id held elsewhere (such as by the memoized contig
 * caller) can always be detected as no longer live.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl NodeId {
    pub const UNSET: NodeId = NodeId(u64::MAX);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/**
 * A path of kmers valid over a closed interval of first-kmer positions.
 *
 * The kmer at offset i occurs over positions
 * [first_start + i, first_end + i]. Weights are per kmer offset and are the
 * sum of the contributions of all currently tracked evidence. Collapsed
 * kmers are alternate kmers merged into this node during bubble collapse;
 * they contribute lookup entries at their recorded offsets but are not part
 * of the primary path.
 *
 * Once added to a graph a node is immutable. Weight subtraction replaces a
 * node with freshly-identified subnodes rather than mutating it in place.
 */
#[derive(Debug, Clone)]
pub struct KmerPathNode {
    id: NodeId,
    kmers: Vec<u64>,
    weights: Vec<u32>,
    total_weight: u64,
    first_start: i32,
    first_end: i32,
    reference: bool,
    collapsed_kmers: Vec<u64>,
    collapsed_offsets: Vec<usize>,
    prev: Vec<NodeId>,
    next: Vec<NodeId>,
}

impl KmerPathNode {
    pub fn new(
        kmers: Vec<u64>,
        weights: Vec<u32>,
        first_start: i32,
        first_end: i32,
        reference: bool,
    ) -> Self {
        assert!(!kmers.is_empty());
        assert_eq!(kmers.len(), weights.len());
        assert!(first_start <= first_end);
        let total_weight = weights.iter().map(|w| *w as u64).sum();
        KmerPathNode {
            id: NodeId::UNSET,
            kmers,
            weights,
            total_weight,
            first_start,
            first_end,
            reference,
            collapsed_kmers: Vec::new(),
            collapsed_offsets: Vec::new(),
            prev: Vec::new(),
            next: Vec::new(),
        }
    }

    /**
     * Records alternate kmers merged into this node, each at the path offset
     * of the primary kmer it was merged with
     */
    pub fn with_collapsed_kmers(mut self, kmers: Vec<u64>, offsets: Vec<usize>) -> Self {
        assert_eq!(kmers.len(), offsets.len());
        assert!(offsets.iter().all(|offset| *offset < self.kmers.len()));
        self.collapsed_kmers = kmers;
        self.collapsed_offsets = offsets;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    /**
     * Number of kmers in this node
     */
    pub fn length(&self) -> usize {
        self.kmers.len()
    }

    /**
     * Number of positions in the first-kmer interval
     */
    pub fn width(&self) -> i32 {
        self.first_end - self.first_start + 1
    }

    pub fn kmer(&self, offset: usize) -> u64 {
        self.kmers[offset]
    }

    pub fn kmers(&self) -> &[u64] {
        &self.kmers
    }

    pub fn first_kmer(&self) -> u64 {
        self.kmers[0]
    }

    pub fn last_kmer(&self) -> u64 {
        self.kmers[self.kmers.len() - 1]
    }

    pub fn weight(&self, offset: usize) -> u32 {
        self.weights[offset]
    }

    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    /**
     * Total weight across all kmer offsets
     */
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn first_start(&self) -> i32 {
        self.first_start
    }

    pub fn first_end(&self) -> i32 {
        self.first_end
    }

    pub fn last_start(&self) -> i32 {
        self.first_start + self.length() as i32 - 1
    }

    pub fn last_end(&self) -> i32 {
        self.first_end + self.length() as i32 - 1
    }

    pub fn is_reference(&self) -> bool {
        self.reference
    }

    pub fn collapsed_kmers(&self) -> &[u64] {
        &self.collapsed_kmers
    }

    pub fn collapsed_offsets(&self) -> &[usize] {
        &self.collapsed_offsets
    }

    pub fn prev(&self) -> &[NodeId] {
        &self.prev
    }

    pub fn next(&self) -> &[NodeId] {
        &self.next
    }

    pub(crate) fn add_prev(&mut self, id: NodeId) {
        if !self.prev.contains(&id) {
            self.prev.push(id);
        }
    }

    pub(crate) fn add_next(&mut self, id: NodeId) {
        if !self.next.contains(&id) {
            self.next.push(id);
        }
    }

    pub(crate) fn remove_prev(&mut self, id: NodeId) {
        self.prev.retain(|other| *other != id);
    }

    pub(crate) fn remove_next(&mut self, id: NodeId) {
        self.next.retain(|other| *other != id);
    }
}

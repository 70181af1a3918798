use crate::debruijn::kmer_encoding::KmerEncodingUtils;
use crate::model::breakend::BreakendSummary;

/**
 * A single kmer of supporting evidence: the kmer, the closed interval of
 * positions at which it may occur, and the weight it contributes to any path
 * node containing it at an overlapping position.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct KmerSupportNode {
    kmer: u64,
    start: i32,
    end: i32,
    weight: u32,
    reference: bool,
    evidence_id: String,
    offset: usize,
}

impl KmerSupportNode {
    pub fn new(
        kmer: u64,
        start: i32,
        end: i32,
        weight: u32,
        reference: bool,
        evidence_id: String,
        offset: usize,
    ) -> Self {
        assert!(start <= end);
        KmerSupportNode {
            kmer,
            start,
            end,
            weight,
            reference,
            evidence_id,
            offset,
        }
    }

    pub fn kmer(&self) -> u64 {
        self.kmer
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn is_reference(&self) -> bool {
        self.reference
    }

    pub fn evidence_id(&self) -> &str {
        &self.evidence_id
    }

    /**
     * Offset of this kmer within its evidence read
     */
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/**
 * All kmer support derived from a single piece of evidence (a read or read
 * pair), identified by an opaque evidence id.
 *
 * Offsets with no usable kmer (such as masked or low quality bases) are
 * None. The breakend summary locates the evidence when an unanchored contig
 * must infer its own interval; quality is the evidence-level weight used for
 * that aggregation.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct KmerEvidence {
    id: String,
    nodes: Vec<Option<KmerSupportNode>>,
    breakend: BreakendSummary,
    quality: f64,
    anchored: bool,
}

impl KmerEvidence {
    pub fn new(
        id: String,
        nodes: Vec<Option<KmerSupportNode>>,
        breakend: BreakendSummary,
        quality: f64,
        anchored: bool,
    ) -> Self {
        assert!(!nodes.is_empty());
        KmerEvidence {
            id,
            nodes,
            breakend,
            quality,
            anchored,
        }
    }

    /**
     * Builds evidence from a read: one support node per kmer of the read
     * sequence, each valid over the read's first-kmer interval shifted by
     * its offset.
     */
    pub fn from_read(
        id: &str,
        k: usize,
        bases: &[u8],
        first_start: i32,
        first_end: i32,
        weight: u32,
        reference: bool,
        breakend: BreakendSummary,
        quality: f64,
        anchored: bool,
    ) -> Self {
        let kmers = KmerEncodingUtils::encode_all(k, bases);
        let nodes = kmers
            .iter()
            .enumerate()
            .map(|(i, kmer)| {
                Some(KmerSupportNode::new(
                    *kmer,
                    first_start + i as i32,
                    first_end + i as i32,
                    weight,
                    reference,
                    id.to_string(),
                    i,
                ))
            })
            .collect();
        KmerEvidence::new(id.to_string(), nodes, breakend, quality, anchored)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /**
     * Number of kmer offsets, including unusable ones
     */
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, offset: usize) -> Option<&KmerSupportNode> {
        self.nodes[offset].as_ref()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &KmerSupportNode> {
        self.nodes.iter().flatten()
    }

    pub fn breakend(&self) -> &BreakendSummary {
        &self.breakend
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    /**
     * @return true if this evidence contains reference-anchored bases
     */
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }
}

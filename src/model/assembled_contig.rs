use crate::model::breakend::{BreakendDirection, BreakendSummary};

/**
 * Classification of an assembled contig by the reference anchors attached to
 * each end.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContigCategory {
    /**
     * No reference-anchored bases on either side; the positional interval is
     * inferred from the supporting evidence breakends.
     */
    UnanchoredBreakend,
    /**
     * Reference anchor on exactly one side. A forward breakend is anchored at
     * its start, a backward breakend at its end.
     */
    AnchoredBreakend(BreakendDirection),
    /**
     * Reference anchors on both sides with unanchored bases between them.
     */
    AnchoredBreakpoint,
}

/**
 * A called contig together with its supporting evidence and anchoring.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContig {
    pub reference_index: usize,
    pub category: ContigCategory,
    pub bases: Vec<u8>,
    pub quals: Vec<u8>,
    /**
     * Inferred breakend interval; only present for unanchored breakends.
     */
    pub breakend: Option<BreakendSummary>,
    pub start_anchor_position: Option<i32>,
    pub start_anchor_base_count: usize,
    pub end_anchor_position: Option<i32>,
    pub end_anchor_base_count: usize,
    pub evidence_ids: Vec<String>,
}

impl AssembledContig {
    pub fn unanchored_breakend(
        reference_index: usize,
        breakend: Option<BreakendSummary>,
        evidence_ids: Vec<String>,
        bases: Vec<u8>,
        quals: Vec<u8>,
    ) -> Self {
        AssembledContig {
            reference_index,
            category: ContigCategory::UnanchoredBreakend,
            bases,
            quals,
            breakend,
            start_anchor_position: None,
            start_anchor_base_count: 0,
            end_anchor_position: None,
            end_anchor_base_count: 0,
            evidence_ids,
        }
    }

    pub fn anchored_breakend(
        reference_index: usize,
        direction: BreakendDirection,
        anchor_position: i32,
        anchor_base_count: usize,
        evidence_ids: Vec<String>,
        bases: Vec<u8>,
        quals: Vec<u8>,
    ) -> Self {
        let (start_anchor_position, start_count, end_anchor_position, end_count) = match direction {
            BreakendDirection::Forward => (Some(anchor_position), anchor_base_count, None, 0),
            BreakendDirection::Backward => (None, 0, Some(anchor_position), anchor_base_count),
        };
        AssembledContig {
            reference_index,
            category: ContigCategory::AnchoredBreakend(direction),
            bases,
            quals,
            breakend: None,
            start_anchor_position,
            start_anchor_base_count: start_count,
            end_anchor_position,
            end_anchor_base_count: end_count,
            evidence_ids,
        }
    }

    pub fn anchored_breakpoint(
        reference_index: usize,
        start_anchor_position: i32,
        start_anchor_base_count: usize,
        end_anchor_position: i32,
        end_anchor_base_count: usize,
        evidence_ids: Vec<String>,
        bases: Vec<u8>,
        quals: Vec<u8>,
    ) -> Self {
        AssembledContig {
            reference_index,
            category: ContigCategory::AnchoredBreakpoint,
            bases,
            quals,
            breakend: None,
            start_anchor_position: Some(start_anchor_position),
            start_anchor_base_count,
            end_anchor_position: Some(end_anchor_position),
            end_anchor_base_count,
            evidence_ids,
        }
    }
}

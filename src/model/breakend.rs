use crate::utils::interval_utils::IntervalUtils;

/**
 * Direction of a breakend relative to its anchoring reference bases.
 * Forward breakends extend past the end of their anchor, backward breakends
 * extend before the start of their anchor.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakendDirection {
    Forward,
    Backward,
}

/**
 * Positional interval over which a breakend may occur.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BreakendSummary {
    pub reference_index: usize,
    pub direction: BreakendDirection,
    pub start: i32,
    pub end: i32,
}

impl BreakendSummary {
    pub fn new(reference_index: usize, direction: BreakendDirection, start: i32, end: i32) -> Self {
        assert!(start <= end);
        BreakendSummary {
            reference_index,
            direction,
            start,
            end,
        }
    }

    pub fn overlaps(&self, other: &BreakendSummary) -> bool {
        self.reference_index == other.reference_index
            && self.direction == other.direction
            && IntervalUtils::overlaps_closed(self.start, self.end, other.start, other.end)
    }
}

/**
 * Aggregates the breakend intervals of supporting evidence into the breakend
 * interval of an unanchored assembly.
 *
 * The winning direction is the direction carrying the most evidence weight.
 * Within that direction, the reported interval is the intersection of the
 * maximal-cumulative-weight set of overlapping intervals: every interval
 * endpoint is a sweep candidate, the candidate covered by the most weight
 * wins, and ties resolve to the earliest position.
 *
 * @param breakends breakend interval of each supporting evidence
 * @param weights weight of each supporting evidence
 * @return aggregate breakend, or None if no evidence was supplied
 */
pub fn calculate_breakend(breakends: &[BreakendSummary], weights: &[f64]) -> Option<BreakendSummary> {
    assert_eq!(breakends.len(), weights.len());
    if breakends.is_empty() {
        return None;
    }
    let forward_weight: f64 = breakends
        .iter()
        .zip(weights.iter())
        .filter(|(be, _)| be.direction == BreakendDirection::Forward)
        .map(|(_, w)| *w)
        .sum();
    let backward_weight: f64 = breakends
        .iter()
        .zip(weights.iter())
        .filter(|(be, _)| be.direction == BreakendDirection::Backward)
        .map(|(_, w)| *w)
        .sum();
    let direction = if forward_weight >= backward_weight {
        BreakendDirection::Forward
    } else {
        BreakendDirection::Backward
    };
    let candidates: Vec<(&BreakendSummary, f64)> = breakends
        .iter()
        .zip(weights.iter())
        .filter(|(be, _)| be.direction == direction)
        .map(|(be, w)| (be, *w))
        .collect();
    let reference_index = candidates[0].0.reference_index;

    let mut sweep_points: Vec<i32> = candidates
        .iter()
        .flat_map(|(be, _)| [be.start, be.end])
        .collect();
    sweep_points.sort_unstable();
    sweep_points.dedup();

    let mut best_point = sweep_points[0];
    let mut best_weight = f64::MIN;
    for point in sweep_points {
        let covering: f64 = candidates
            .iter()
            .filter(|(be, _)| be.start <= point && point <= be.end)
            .map(|(_, w)| *w)
            .sum();
        if covering > best_weight {
            best_weight = covering;
            best_point = point;
        }
    }
    let mut start = i32::MIN;
    let mut end = i32::MAX;
    for (be, _) in candidates
        .iter()
        .filter(|(be, _)| be.start <= best_point && best_point <= be.end)
    {
        start = std::cmp::max(start, be.start);
        end = std::cmp::min(end, be.end);
    }
    Some(BreakendSummary::new(reference_index, direction, start, end))
}

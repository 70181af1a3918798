pub struct IntervalUtils {}

impl IntervalUtils {
    /**
     * Determines whether the given closed intervals overlap
     * @param start1 first interval start position
     * @param end1 first interval end position (inclusive)
     * @param start2 second interval start position
     * @param end2 second interval end position (inclusive)
     * @return true if the closed intervals share at least one position
     */
    pub fn overlaps_closed(start1: i32, end1: i32, start2: i32, end2: i32) -> bool {
        start1 <= end2 && start2 <= end1
    }

    /**
     * Intersection of two closed intervals
     * @return the shared closed interval, or None if the intervals are disjoint
     */
    pub fn intersection_closed(
        start1: i32,
        end1: i32,
        start2: i32,
        end2: i32,
    ) -> Option<(i32, i32)> {
        let start = std::cmp::max(start1, start2);
        let end = std::cmp::min(end1, end2);
        if start <= end {
            Some((start, end))
        } else {
            None
        }
    }

    /**
     * Determines whether the first closed interval fully contains the second
     */
    pub fn contains_closed(start1: i32, end1: i32, start2: i32, end2: i32) -> bool {
        start1 <= start2 && end2 <= end1
    }

    /**
     * Distance between two closed intervals, zero if they overlap
     */
    pub fn distance_closed(start1: i32, end1: i32, start2: i32, end2: i32) -> i32 {
        if Self::overlaps_closed(start1, end1, start2, end2) {
            0
        } else if end1 < start2 {
            start2 - end1
        } else {
            start1 - end2
        }
    }
}

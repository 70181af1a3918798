pub struct QualityUtils {}

impl QualityUtils {
    /**
     * Largest representable base quality. Qualities are stored as raw bytes
     * and 255 is reserved by SAM for a missing value.
     */
    pub const MAX_QUAL: u8 = 254;

    /**
     * Expands per-kmer weights into per-base qualities.
     *
     * A base of the assembled sequence is covered by every kmer whose window
     * includes it; the base is assigned the weight of its best supporting
     * kmer, scaled and clamped to MAX_QUAL.
     *
     * @param k kmer size
     * @param kmer_weights weight of each kmer along the assembled path
     * @param scaling weight to quality scaling factor
     * @return base qualities of length kmer_weights.len() + k - 1
     */
    pub fn kmer_weights_to_base_quals(k: usize, kmer_weights: &[u32], scaling: f32) -> Vec<u8> {
        assert!(k >= 1);
        if kmer_weights.is_empty() {
            return Vec::new();
        }
        let base_count = kmer_weights.len() + k - 1;
        let mut quals = Vec::with_capacity(base_count);
        for i in 0..base_count {
            let first_kmer = i.saturating_sub(k - 1);
            let last_kmer = std::cmp::min(i, kmer_weights.len() - 1);
            let mut best = 0u32;
            for w in &kmer_weights[first_kmer..=last_kmer] {
                best = std::cmp::max(best, *w);
            }
            quals.push(Self::scale_weight(best, scaling));
        }
        quals
    }

    fn scale_weight(weight: u32, scaling: f32) -> u8 {
        let scaled = (weight as f64 * scaling as f64).round();
        if scaled <= 0.0 {
            0
        } else if scaled >= Self::MAX_QUAL as f64 {
            Self::MAX_QUAL
        } else {
            scaled as u8
        }
    }
}

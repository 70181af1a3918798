use crate::debruijn::kmer_encoding::KmerEncodingUtils;
use crate::utils::errors::AssemblyError;

/**
 * Configuration of the positional de Bruijn contig assembler.
 *
 * All width and length options are in base positions. Construction
 * validates every option; the assembler re-validates on creation so a
 * field mutated after construction cannot smuggle in a bad value.
 */
#[derive(Debug, Clone)]
pub struct PositionalAssemblyConfiguration {
    /**
     * De Bruijn graph kmer size
     */
    pub k: usize,
    /**
     * Reference sequence identifier attached to emitted contigs
     */
    pub reference_index: usize,
    /**
     * Maximum distance from the first position of the first kmer of a piece
     * of evidence to the last position of its last kmer. Worst case is read
     * length plus the max-min concordant fragment size.
     */
    pub max_evidence_support_interval_width: i32,
    /**
     * Maximum number of reference-supporting anchor bases to assemble
     */
    pub max_anchor_length: usize,
    /**
     * Minimum length in bases of reference anchor assembly. A breakend
     * longer than this causes anchor assembly at least as long as the
     * breakend.
     */
    pub anchor_length: usize,
    /**
     * Maximum expected breakend assembly length as a multiple of the
     * maximum concordant fragment size. Longer partial assemblies are
     * overwhelmingly likely to be misassemblies.
     */
    pub max_expected_breakend_length_multiple: f32,
    /**
     * Loaded graph width retained before force-flushing, as a multiple of
     * the maximum concordant fragment size
     */
    pub retain_width_multiple: f32,
    /**
     * Width of each force-flush, as a multiple of the maximum concordant
     * fragment size
     */
    pub flush_width_multiple: f32,
    /**
     * Determines whether over-long partial contigs are removed as each
     * loading increment exceeds the misassembly length. Waiting until
     * assembly is complete is computationally prohibitive.
     */
    pub remove_misassembled_partial_contigs_during_assembly: bool,
    pub max_concordant_fragment_size: i32,
    pub max_read_length: i32,
    /**
     * Scaling applied when converting kmer weights to base qualities
     */
    pub quality_scaling: f32,
    /**
     * Verifies the incremental memoization against a freshly built caller
     * after every mutation. Extremely expensive; test and debug use only.
     */
    pub sanity_check_memoization: bool,
    /**
     * Verifies graph index and evidence tracking consistency after every
     * mutation. Expensive; test and debug use only.
     */
    pub sanity_check_graph: bool,
}

impl PositionalAssemblyConfiguration {
    pub fn new(
        k: usize,
        reference_index: usize,
        max_evidence_support_interval_width: i32,
        max_anchor_length: usize,
        max_concordant_fragment_size: i32,
        max_read_length: i32,
    ) -> Result<Self, AssemblyError> {
        let config = PositionalAssemblyConfiguration {
            k,
            reference_index,
            max_evidence_support_interval_width,
            max_anchor_length,
            anchor_length: 100,
            max_expected_breakend_length_multiple: 3.0,
            retain_width_multiple: 16.0,
            flush_width_multiple: 2.0,
            remove_misassembled_partial_contigs_during_assembly: true,
            max_concordant_fragment_size,
            max_read_length,
            quality_scaling: 1.0,
            sanity_check_memoization: false,
            sanity_check_graph: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.k < 1 || self.k > KmerEncodingUtils::MAX_K {
            return Err(AssemblyError::ConfigurationFailure(format!(
                "k must be between 1 and {}, got {}",
                KmerEncodingUtils::MAX_K,
                self.k
            )));
        }
        if self.max_evidence_support_interval_width < 0 {
            return Err(AssemblyError::ConfigurationFailure(format!(
                "maxEvidenceSupportIntervalWidth must be non-negative, got {}",
                self.max_evidence_support_interval_width
            )));
        }
        if self.max_concordant_fragment_size < 1 {
            return Err(AssemblyError::ConfigurationFailure(format!(
                "maxConcordantFragmentSize must be positive, got {}",
                self.max_concordant_fragment_size
            )));
        }
        if self.max_read_length < 1 {
            return Err(AssemblyError::ConfigurationFailure(format!(
                "maxReadLength must be positive, got {}",
                self.max_read_length
            )));
        }
        if !(self.max_expected_breakend_length_multiple > 0.0) {
            return Err(AssemblyError::ConfigurationFailure(format!(
                "maxExpectedBreakendLengthMultiple must be positive, got {}",
                self.max_expected_breakend_length_multiple
            )));
        }
        if !(self.retain_width_multiple > 0.0) || !(self.flush_width_multiple > 0.0) {
            return Err(AssemblyError::ConfigurationFailure(format!(
                "retainWidthMultiple and flushWidthMultiple must be positive, got {} and {}",
                self.retain_width_multiple, self.flush_width_multiple
            )));
        }
        if !(self.quality_scaling > 0.0) {
            return Err(AssemblyError::ConfigurationFailure(format!(
                "qualityScaling must be positive, got {}",
                self.quality_scaling
            )));
        }
        Ok(())
    }

    pub fn retain_width(&self) -> i32 {
        (self.retain_width_multiple * self.max_concordant_fragment_size as f32) as i32
    }

    pub fn flush_width(&self) -> i32 {
        (self.flush_width_multiple * self.max_concordant_fragment_size as f32) as i32
    }

    /**
     * Longest credible partial assembly; anything longer is treated as a
     * misassembly when incremental removal is enabled
     */
    pub fn misassembly_length(&self) -> i32 {
        let positional_width = self.max_evidence_support_interval_width - self.max_read_length;
        (self.max_expected_breakend_length_multiple * self.max_concordant_fragment_size as f32)
            as i32
            + positional_width
    }

    /**
     * Longest anchor sequence any contig can carry
     */
    pub fn max_contig_anchor_length(&self) -> i32 {
        std::cmp::max(
            (self.max_expected_breakend_length_multiple * self.max_concordant_fragment_size as f32)
                as i32,
            self.anchor_length as i32,
        )
    }
}

/**
 * 2-bit packed kmer encoding.
 *
 * A kmer of up to 32 bases is packed into a u64 with the first base in the
 * highest occupied bit pair. Packing the first base high makes the encoded
 * value ordering match the lexicographic ordering of the base string, which
 * the positional graph relies on for deterministic tie-breaking.
 *
 * Ambiguous bases (anything outside ACGT) encode as A.
 */
pub struct KmerEncodingUtils {}

impl KmerEncodingUtils {
    pub const MAX_K: usize = 32;

    pub fn encoded_base(base: u8) -> u64 {
        match base {
            b'A' | b'a' => 0,
            b'C' | b'c' => 1,
            b'G' | b'g' => 2,
            b'T' | b't' => 3,
            _ => 0,
        }
    }

    pub fn decoded_base(encoded: u64) -> u8 {
        match encoded & 3 {
            0 => b'A',
            1 => b'C',
            2 => b'G',
            _ => b'T',
        }
    }

    /**
     * Bitmask covering all 2k bits of a k-length kmer
     */
    pub fn kmer_mask(k: usize) -> u64 {
        assert!(k >= 1 && k <= Self::MAX_K);
        if k == Self::MAX_K {
            u64::MAX
        } else {
            (1u64 << (2 * k)) - 1
        }
    }

    /**
     * Packs the first k bases of the given sequence
     */
    pub fn encode(k: usize, bases: &[u8]) -> u64 {
        assert!(bases.len() >= k);
        let mut kmer = 0u64;
        for base in &bases[0..k] {
            kmer = (kmer << 2) | Self::encoded_base(*base);
        }
        kmer
    }

    /**
     * Packs every kmer of the given sequence in order
     */
    pub fn encode_all(k: usize, bases: &[u8]) -> Vec<u64> {
        assert!(bases.len() >= k);
        let mut kmers = Vec::with_capacity(bases.len() - k + 1);
        let mut kmer = Self::encode(k, bases);
        kmers.push(kmer);
        for base in &bases[k..] {
            kmer = Self::next_state(k, kmer, Self::encoded_base(*base));
            kmers.push(kmer);
        }
        kmers
    }

    pub fn first_base_encoded(k: usize, kmer: u64) -> u64 {
        (kmer >> (2 * (k - 1))) & 3
    }

    pub fn last_base_encoded(kmer: u64) -> u64 {
        kmer & 3
    }

    /**
     * Successor kmer: drop the first base, append the given encoded base
     */
    pub fn next_state(k: usize, kmer: u64, encoded_base: u64) -> u64 {
        ((kmer << 2) | (encoded_base & 3)) & Self::kmer_mask(k)
    }

    /**
     * Predecessor kmer: drop the last base, prepend the given encoded base
     */
    pub fn prev_state(k: usize, kmer: u64, encoded_base: u64) -> u64 {
        (kmer >> 2) | ((encoded_base & 3) << (2 * (k - 1)))
    }

    /**
     * @return true if next can immediately follow kmer on a de Bruijn path,
     * that is the k-1 base suffix of kmer equals the k-1 base prefix of next
     */
    pub fn is_next(k: usize, kmer: u64, next: u64) -> bool {
        if k == 1 {
            return true;
        }
        let suffix_mask = Self::kmer_mask(k - 1);
        (kmer & suffix_mask) == (next >> 2)
    }

    /**
     * Unpacks a single kmer into its base string
     */
    pub fn base_string(k: usize, kmer: u64) -> Vec<u8> {
        let mut bases = Vec::with_capacity(k);
        for i in (0..k).rev() {
            bases.push(Self::decoded_base(kmer >> (2 * i)));
        }
        bases
    }

    /**
     * Base calls of a kmer path. The first kmer contributes k bases and each
     * subsequent kmer contributes its final base, overlapping by k-1.
     */
    pub fn base_calls(kmers: &[u64], k: usize) -> Vec<u8> {
        if kmers.is_empty() {
            return Vec::new();
        }
        let mut bases = Vec::with_capacity(kmers.len() + k - 1);
        bases.extend_from_slice(&Self::base_string(k, kmers[0]));
        for kmer in &kmers[1..] {
            bases.push(Self::decoded_base(Self::last_base_encoded(*kmer)));
        }
        bases
    }
}

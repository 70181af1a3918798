use currawong::debruijn::kmer_encoding::KmerEncodingUtils;
use currawong::utils::quality_utils::QualityUtils;

#[test]
fn test_encode_decode_roundtrip() {
    let k = 4;
    let kmer = KmerEncodingUtils::encode(k, b"ACGT");
    assert_eq!(KmerEncodingUtils::base_string(k, kmer), b"ACGT".to_vec());
    let kmer = KmerEncodingUtils::encode(k, b"TTTT");
    assert_eq!(KmerEncodingUtils::base_string(k, kmer), b"TTTT".to_vec());
}

#[test]
fn test_encoding_is_lexicographic() {
    let k = 4;
    assert!(KmerEncodingUtils::encode(k, b"AAAA") < KmerEncodingUtils::encode(k, b"AAAC"));
    assert!(KmerEncodingUtils::encode(k, b"ACGT") < KmerEncodingUtils::encode(k, b"CAAA"));
    assert!(KmerEncodingUtils::encode(k, b"GTTT") < KmerEncodingUtils::encode(k, b"TAAA"));
}

#[test]
fn test_ambiguous_bases_encode_as_a() {
    let k = 4;
    assert_eq!(
        KmerEncodingUtils::encode(k, b"NCGT"),
        KmerEncodingUtils::encode(k, b"ACGT")
    );
}

#[test]
fn test_encode_all_matches_sliding_windows() {
    let k = 4;
    let bases = b"ACGTACAA";
    let kmers = KmerEncodingUtils::encode_all(k, bases);
    assert_eq!(kmers.len(), 5);
    for (i, kmer) in kmers.iter().enumerate() {
        assert_eq!(*kmer, KmerEncodingUtils::encode(k, &bases[i..i + k]));
    }
}

#[test]
fn test_next_state_shifts_left() {
    let k = 4;
    let kmer = KmerEncodingUtils::encode(k, b"ACGT");
    let next = KmerEncodingUtils::next_state(k, kmer, KmerEncodingUtils::encoded_base(b'C'));
    assert_eq!(KmerEncodingUtils::base_string(k, next), b"CGTC".to_vec());
}

#[test]
fn test_prev_state_shifts_right() {
    let k = 4;
    let kmer = KmerEncodingUtils::encode(k, b"ACGT");
    let prev = KmerEncodingUtils::prev_state(k, kmer, KmerEncodingUtils::encoded_base(b'T'));
    assert_eq!(KmerEncodingUtils::base_string(k, prev), b"TACG".to_vec());
}

#[test]
fn test_is_next() {
    let k = 4;
    let acgt = KmerEncodingUtils::encode(k, b"ACGT");
    let cgta = KmerEncodingUtils::encode(k, b"CGTA");
    let cgtt = KmerEncodingUtils::encode(k, b"CGTT");
    let gtac = KmerEncodingUtils::encode(k, b"GTAC");
    assert!(KmerEncodingUtils::is_next(k, acgt, cgta));
    assert!(KmerEncodingUtils::is_next(k, acgt, cgtt));
    assert!(!KmerEncodingUtils::is_next(k, acgt, gtac));
    assert!(!KmerEncodingUtils::is_next(k, cgta, acgt));
}

#[test]
fn test_base_calls_overlap_by_k_minus_one() {
    let k = 4;
    let bases = b"ACGTACAATG";
    let kmers = KmerEncodingUtils::encode_all(k, bases);
    assert_eq!(KmerEncodingUtils::base_calls(&kmers, k), bases.to_vec());
}

#[test]
fn test_base_calls_of_empty_path() {
    assert!(KmerEncodingUtils::base_calls(&[], 4).is_empty());
}

#[test]
fn test_kmer_weights_to_base_quals_takes_best_covering_kmer() {
    let quals = QualityUtils::kmer_weights_to_base_quals(4, &[1, 5, 2], 1.0);
    // 3 kmers of size 4 span 6 bases
    assert_eq!(quals, vec![1, 5, 5, 5, 5, 2]);
}

#[test]
fn test_kmer_weights_to_base_quals_scales_and_clamps() {
    let quals = QualityUtils::kmer_weights_to_base_quals(2, &[10, 1000], 2.0);
    assert_eq!(quals, vec![20, QualityUtils::MAX_QUAL, QualityUtils::MAX_QUAL]);
}

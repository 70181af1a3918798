pub mod kmer_encoding;
pub mod positional;

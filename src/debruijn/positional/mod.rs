pub mod anchor_extender;
pub mod contig_assembler;
pub mod evidence_tracker;
pub mod kmer_evidence;
pub mod kmer_path_node;
pub mod kmer_path_subnode;
pub mod memoized_contig_caller;
pub mod misassembly_fixer;
pub mod path_node_graph;
pub mod traversal_node;
pub mod weight_splitter;

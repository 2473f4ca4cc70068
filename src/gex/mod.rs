pub mod archive;
pub mod index;

pub use archive::MoleculeArchive;
pub use archive::MoleculeRecord;

pub use index::collapsed_index;
pub use index::label_names_gene;
pub use index::target_gene_set;
pub use index::LabeledMolecule;

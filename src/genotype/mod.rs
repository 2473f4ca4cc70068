pub mod aggregate;
pub mod classify;
pub mod table;
pub mod threshold;

pub use table::expand_rows;
pub use table::read_genotype_table;
pub use table::Call;
pub use table::GenotypeRow;
pub use table::UmiObservation;

pub use classify::classify_observations;
pub use classify::GenotypeObservation;
pub use classify::MatchClass;

pub use threshold::estimate_threshold;
pub use threshold::ThresholdStrategy;

pub use aggregate::aggregate_level;
pub use aggregate::merge_summaries;
pub use aggregate::BarcodeSummary;
pub use aggregate::FilterLevel;
pub use aggregate::GenotypeLabel;
pub use aggregate::LevelSummary;

pub mod command;
pub mod fileformat;
pub mod genotype;
pub mod gex;
pub mod umi;

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use itertools::Itertools;

use crate::gex::MoleculeArchive;

const NUM_TOP_FEATURES: usize = 10;

////////////////
/// Print an overview of a molecule archive
#[derive(Args)]
pub struct InspectCMD {
    /// Molecule archive (HDF5)
    #[arg(short = 'm', value_parser)]
    pub path_archive: PathBuf,
}

impl InspectCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let archive = MoleculeArchive::load(&self.path_archive, None)?;

        let barcodes_seen: HashSet<&String> =
            archive.records.iter().map(|r| &r.barcode).collect();
        let total_reads: u64 = archive.records.iter().map(|r| r.read_count as u64).sum();

        println!("molecules:        {}", archive.records.len());
        println!("reads:            {}", total_reads);
        println!("barcodes seen:    {}", barcodes_seen.len());
        println!("barcode table:    {}", archive.barcodes.len());
        println!("feature table:    {}", archive.feature_names.len());

        println!("top features by molecule count:");
        let mut feature_counts: Vec<(&String, usize)> = archive
            .records
            .iter()
            .counts_by(|r| &r.gene_name)
            .into_iter()
            .collect();
        feature_counts.sort_by_key(|&(gene, count)| (std::cmp::Reverse(count), gene.clone()));
        for (gene, count) in feature_counts.iter().take(NUM_TOP_FEATURES) {
            println!("  {}\t{}", gene, count);
        }

        Ok(())
    }
}

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::command::determine_thread_count;
use crate::fileformat::{read_barcode_list_file, write_summary_table, write_support_plot};
use crate::genotype::{
    aggregate_level, classify_observations, estimate_threshold, expand_rows, merge_summaries,
    read_genotype_table, FilterLevel, MatchClass, ThresholdStrategy,
};
use crate::gex::{collapsed_index, target_gene_set, MoleculeArchive};

pub const DEFAULT_UMI_LENGTH: usize = 12;
pub const DEFAULT_QUANTILE: f64 = 0.8;

pub const SUMMARY_FILENAME: &str = "refined_genotypes.tsv";
pub const PLOT_FILENAME: &str = "read_support_density.html";

////////////////
/// Refine genotype calls by cross-validating them against the expression
/// archive
#[derive(Args)]
pub struct RefineCMD {
    /// Genotyping summary table (tab separated)
    #[arg(short = 'i', value_parser)]
    pub path_genotypes: PathBuf,

    /// Molecule archive (HDF5)
    #[arg(short = 'm', value_parser)]
    pub path_archive: PathBuf,

    /// Reference barcode list, one barcode per line
    #[arg(short = 'b', value_parser)]
    pub path_barcodes: PathBuf,

    /// Output directory
    #[arg(short = 'o', value_parser)]
    pub path_out: PathBuf,

    /// Target gene symbol
    #[arg(short = 'g')]
    pub target_gene: String,

    /// UMI length in bases
    #[arg(long = "umi-len", default_value_t = DEFAULT_UMI_LENGTH)]
    pub umi_len: usize,

    /// Quantile for the quantile threshold strategy
    #[arg(long = "quantile", default_value_t = DEFAULT_QUANTILE)]
    pub quantile: f64,

    /// Threshold strategy
    #[arg(long = "strategy", value_enum, default_value = "quantile")]
    pub strategy: ThresholdStrategy,

    //Thread settings
    #[arg(short = '@', value_parser = clap::value_parser!(usize))]
    num_threads_total: Option<usize>,
}

impl RefineCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let num_threads = determine_thread_count(self.num_threads_total)?;
        println!("Using threads {}", num_threads);

        Refine::run(&Refine {
            path_genotypes: self.path_genotypes.clone(),
            path_archive: self.path_archive.clone(),
            path_barcodes: self.path_barcodes.clone(),
            path_out: self.path_out.clone(),
            target_gene: self.target_gene.clone(),
            umi_len: self.umi_len,
            quantile: self.quantile,
            strategy: self.strategy,
            num_threads,
        })?;

        log::info!("Refine has finished succesfully");
        Ok(())
    }
}

pub struct Refine {
    pub path_genotypes: PathBuf,
    pub path_archive: PathBuf,
    pub path_barcodes: PathBuf,
    pub path_out: PathBuf,
    pub target_gene: String,
    pub umi_len: usize,
    pub quantile: f64,
    pub strategy: ThresholdStrategy,
    pub num_threads: usize,
}

impl Refine {
    pub fn run(params: &Refine) -> Result<()> {
        //The reference universe: every one of these barcodes gets a row in
        //the output, whether or not the genotyping table mentions it
        let reference_barcodes = read_barcode_list_file(&params.path_barcodes)?;
        log::info!("{} barcodes in the reference list", reference_barcodes.len());

        let rows = read_genotype_table(&params.path_genotypes)?;
        let table_barcodes: HashSet<String> = rows.iter().map(|r| r.bc.clone()).collect();
        log::info!(
            "{} genotyping rows over {} barcodes",
            rows.len(),
            table_barcodes.len()
        );

        //Molecules from barcodes outside the genotyping table can never
        //corroborate an observation, so they are dropped on load
        let archive = MoleculeArchive::load(&params.path_archive, Some(&table_barcodes))?;

        let observations = expand_rows(&rows)?;
        println!(
            "Expanded {} rows into {} UMI observations",
            rows.len(),
            observations.len()
        );

        let targets = target_gene_set(&archive, &params.target_gene, params.umi_len)?;
        let index = collapsed_index(&archive, &table_barcodes, &params.target_gene);
        log::info!(
            "{} target-gene molecules, {} collapsed (barcode,UMI) pairs",
            targets.len(),
            index.len()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.num_threads)
            .build()?;
        let classified = pool.install(|| {
            classify_observations(observations, &targets, &index, &params.target_gene)
        });

        for class in MatchClass::ALL {
            let count = classified
                .iter()
                .filter(|o| o.match_class == class)
                .count();
            log::info!("{} observations classified {}", count, class.name());
        }

        let threshold = estimate_threshold(params.strategy, &classified, params.quantile)?;
        println!("Read-support threshold: {:.2}", threshold);

        let supports = classified.iter().map(|o| o.total_dups_wt_mut);
        if let (Some(min), Some(max)) = (supports.clone().min(), supports.max()) {
            if threshold < min as f64 || threshold > max as f64 {
                log::warn!(
                    "threshold {:.2} is outside the observed read-support range {}..{}; the support distribution may not be bimodal",
                    threshold,
                    min,
                    max
                );
            }
        }

        //Three independent passes over the same classified set, merged once
        let summaries = merge_summaries(
            &reference_barcodes,
            &aggregate_level(&classified, FilterLevel::Unfiltered, threshold),
            &aggregate_level(&classified, FilterLevel::GeneFiltered, threshold),
            &aggregate_level(&classified, FilterLevel::ThresholdFiltered, threshold),
        );

        std::fs::create_dir_all(&params.path_out)?;
        write_summary_table(&params.path_out.join(SUMMARY_FILENAME), &summaries)?;
        write_support_plot(&params.path_out.join(PLOT_FILENAME), &classified, threshold)?;

        Ok(())
    }
}

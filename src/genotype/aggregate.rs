use std::collections::HashMap;

use crate::genotype::classify::{GenotypeObservation, MatchClass};
use crate::genotype::table::Call;

////////////////
/// The three progressively stricter filtering levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterLevel {
    /// Keep everything
    Unfiltered,
    /// Drop observations the expression data attributes to another gene
    GeneFiltered,
    /// Additionally require read support above the threshold for
    /// observations with no expression evidence at all
    ThresholdFiltered,
}

////////////////
/// Keep/drop decision for one observation at one filtering level
pub fn keep_observation(obs: &GenotypeObservation, level: FilterLevel, threshold: f64) -> bool {
    match level {
        FilterLevel::Unfiltered => true,
        FilterLevel::GeneFiltered => obs.match_class != MatchClass::OtherGene,
        FilterLevel::ThresholdFiltered => match obs.match_class {
            MatchClass::Exact | MatchClass::Approx => true,
            MatchClass::OtherGene => false,
            MatchClass::NoGene => (obs.total_dups_wt_mut as f64) > threshold,
        },
    }
}

////////////////
/// Genotype label of one barcode at one filtering level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenotypeLabel {
    Mut,
    Wt,
    /// Observations existed but no WT/MUT call survived
    Na,
    /// The barcode contributed no observations at all
    NoData,
}

impl GenotypeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenotypeLabel::Mut => "MUT",
            GenotypeLabel::Wt => "WT",
            GenotypeLabel::Na => "NA",
            GenotypeLabel::NoData => "No Data",
        }
    }
}

////////////////
/// Per-barcode call counts and genotype label at one filtering level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub genotype: GenotypeLabel,
    pub wt_calls: Option<u32>,
    pub mut_calls: Option<u32>,
    pub total_calls: Option<u32>,
}

impl LevelSummary {
    pub fn no_data() -> LevelSummary {
        LevelSummary {
            genotype: GenotypeLabel::NoData,
            wt_calls: None,
            mut_calls: None,
            total_calls: None,
        }
    }
}

////////////////
/// One row of the final output: a barcode with its summary at every level
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeSummary {
    pub barcode: String,
    pub unfiltered: LevelSummary,
    pub gene_filtered: LevelSummary,
    pub threshold_filtered: LevelSummary,
}

////////////////
/// Recount calls per barcode from the observations kept at one level.
/// Pure over the classified set; each level is computed independently.
pub fn aggregate_level(
    observations: &[GenotypeObservation],
    level: FilterLevel,
    threshold: f64,
) -> HashMap<String, LevelSummary> {
    //A barcode with observations always gets an entry, even when every one
    //of them is dropped; absence means the barcode had no data at all
    let mut per_barcode: HashMap<String, (u32, u32, u32)> = HashMap::new();
    for obs in observations {
        let counts = per_barcode.entry(obs.barcode.clone()).or_insert((0, 0, 0));
        if keep_observation(obs, level, threshold) {
            match obs.call {
                Call::Wt => counts.0 += 1,
                Call::Mut => counts.1 += 1,
                Call::Amb => counts.2 += 1,
            }
        }
    }

    per_barcode
        .into_iter()
        .map(|(barcode, (wt, mutant, amb))| {
            let genotype = if mutant > 0 {
                GenotypeLabel::Mut
            } else if wt >= 1 {
                GenotypeLabel::Wt
            } else {
                GenotypeLabel::Na
            };
            (
                barcode,
                LevelSummary {
                    genotype,
                    wt_calls: Some(wt),
                    mut_calls: Some(mutant),
                    total_calls: Some(wt + mutant + amb),
                },
            )
        })
        .collect()
}

////////////////
/// Merge the three level summaries into one row per barcode of the
/// reference universe. Barcodes absent from the genotyping table resolve
/// to "No Data" at every level.
pub fn merge_summaries(
    reference_barcodes: &[String],
    unfiltered: &HashMap<String, LevelSummary>,
    gene_filtered: &HashMap<String, LevelSummary>,
    threshold_filtered: &HashMap<String, LevelSummary>,
) -> Vec<BarcodeSummary> {
    reference_barcodes
        .iter()
        .map(|bc| BarcodeSummary {
            barcode: bc.clone(),
            unfiltered: unfiltered.get(bc).cloned().unwrap_or_else(LevelSummary::no_data),
            gene_filtered: gene_filtered
                .get(bc)
                .cloned()
                .unwrap_or_else(LevelSummary::no_data),
            threshold_filtered: threshold_filtered
                .get(bc)
                .cloned()
                .unwrap_or_else(LevelSummary::no_data),
        })
        .collect()
}

use std::collections::{HashMap, HashSet};

use bio::alignment::distance::simd::bounded_levenshtein;
use rayon::prelude::*;

use crate::genotype::table::{Call, UmiObservation};
use crate::gex::{label_names_gene, LabeledMolecule};

/// Edit-distance budget for the near-match scan, over the concatenated
/// barcode+UMI string
pub const APPROX_MAX_DISTANCE: u32 = 2;

////////////////
/// Four-way classification of one genotyping UMI against the expression
/// archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchClass {
    Exact,
    Approx,
    OtherGene,
    NoGene,
}

impl MatchClass {
    pub const ALL: [MatchClass; 4] = [
        MatchClass::Exact,
        MatchClass::Approx,
        MatchClass::OtherGene,
        MatchClass::NoGene,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MatchClass::Exact => "Exact",
            MatchClass::Approx => "Approx",
            MatchClass::OtherGene => "OtherGene",
            MatchClass::NoGene => "NoGene",
        }
    }
}

////////////////
/// One per-UMI observation after classification
#[derive(Debug, Clone)]
pub struct GenotypeObservation {
    pub barcode: String,
    pub umi_sequence: String,
    pub umi_code: u64,
    pub call: Call,

    pub dup_wt: u32,
    pub dup_mut: u32,
    pub dup_amb: u32,
    pub total_dups: u32,
    pub total_dups_wt_mut: u32,

    pub match_class: MatchClass,
    pub in_gex: bool,
    pub gene_label: Option<String>,
}

////////////////
/// Classify every observation against the molecule index. Observations are
/// independent, so the work fans out over the rayon pool; collect keeps the
/// input order for downstream joins.
pub fn classify_observations(
    observations: Vec<UmiObservation>,
    target_set: &HashSet<(String, String)>,
    collapsed: &HashMap<(String, u64), LabeledMolecule>,
    target_gene: &str,
) -> Vec<GenotypeObservation> {
    //Flat list of composite keys for the fuzzy scan
    let target_keys: Vec<String> = target_set
        .iter()
        .map(|(bc, umi)| format!("{}{}", bc, umi))
        .collect();

    observations
        .into_par_iter()
        .map(|obs| classify_one(obs, target_set, &target_keys, collapsed, target_gene))
        .collect()
}

fn classify_one(
    obs: UmiObservation,
    target_set: &HashSet<(String, String)>,
    target_keys: &[String],
    collapsed: &HashMap<(String, u64), LabeledMolecule>,
    target_gene: &str,
) -> GenotypeObservation {
    let exact = target_set.contains(&(obs.barcode.clone(), obs.umi_sequence.clone()));

    //Not short-circuited on exact; the near-match flag stands on its own
    let composite = format!("{}{}", obs.barcode, obs.umi_sequence);
    let approx = target_keys.iter().any(|key| {
        bounded_levenshtein(key.as_bytes(), composite.as_bytes(), APPROX_MAX_DISTANCE).is_some()
    });

    let hit = collapsed.get(&(obs.barcode.clone(), obs.umi_code));
    let in_gex = hit.is_some();
    let gene_label = hit.map(|m| m.gene.clone());

    //Precedence: first match wins
    let match_class = if exact {
        MatchClass::Exact
    } else if approx {
        MatchClass::Approx
    } else if matches!(&gene_label, Some(label) if !label_names_gene(label, target_gene)) {
        MatchClass::OtherGene
    } else {
        MatchClass::NoGene
    };

    GenotypeObservation {
        barcode: obs.barcode,
        umi_sequence: obs.umi_sequence,
        umi_code: obs.umi_code,
        call: obs.call,
        dup_wt: obs.dup_wt,
        dup_mut: obs.dup_mut,
        dup_amb: obs.dup_amb,
        total_dups: obs.total_dups,
        total_dups_wt_mut: obs.total_dups_wt_mut,
        match_class,
        in_gex,
        gene_label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::umi;

    fn observation(barcode: &str, umi_sequence: &str, call: Call) -> UmiObservation {
        UmiObservation {
            barcode: barcode.to_string(),
            umi_sequence: umi_sequence.to_string(),
            umi_code: umi::encode(umi_sequence.as_bytes()).unwrap(),
            call,
            dup_wt: 2,
            dup_mut: 0,
            dup_amb: 0,
            total_dups: 2,
            total_dups_wt_mut: 2,
        }
    }

    fn target_set(pairs: &[(&str, &str)]) -> HashSet<(String, String)> {
        pairs
            .iter()
            .map(|(bc, umi)| (bc.to_string(), umi.to_string()))
            .collect()
    }

    fn collapsed(
        entries: &[(&str, &str, &str)],
    ) -> HashMap<(String, u64), LabeledMolecule> {
        entries
            .iter()
            .map(|(bc, umi_sequence, gene)| {
                (
                    (bc.to_string(), umi::encode(umi_sequence.as_bytes()).unwrap()),
                    LabeledMolecule {
                        gene: gene.to_string(),
                        read_count: 1,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn exact_match_wins() {
        let targets = target_set(&[("AAAA", "ACGTACGT")]);
        let index = collapsed(&[("AAAA", "ACGTACGT", "TET2")]);

        let out = classify_observations(
            vec![observation("AAAA", "ACGTACGT", Call::Wt)],
            &targets,
            &index,
            "TET2",
        );

        //precedence is exclusive: one class per observation
        assert_eq!(out[0].match_class, MatchClass::Exact);
        assert!(out[0].in_gex);
        assert_eq!(out[0].gene_label.as_deref(), Some("TET2"));
    }

    #[test]
    fn near_match_within_two_edits() {
        let targets = target_set(&[("AAAA", "ACGTACGT")]);
        let index = collapsed(&[]);

        //two substitutions from the target key
        let out = classify_observations(
            vec![observation("AAAA", "ACGTACCC", Call::Wt)],
            &targets,
            &index,
            "TET2",
        );
        assert_eq!(out[0].match_class, MatchClass::Approx);
        assert!(!out[0].in_gex);

        //far from any target key
        let out = classify_observations(
            vec![observation("AAAA", "GGGGGGGG", Call::Wt)],
            &targets,
            &index,
            "TET2",
        );
        assert_eq!(out[0].match_class, MatchClass::NoGene);
    }

    #[test]
    fn other_gene_when_index_names_a_different_gene() {
        let targets = target_set(&[]);
        let index = collapsed(&[("AAAA", "TTTTTTTT", "GAPDH")]);

        let out = classify_observations(
            vec![observation("AAAA", "TTTTTTTT", Call::Wt)],
            &targets,
            &index,
            "TET2",
        );
        assert_eq!(out[0].match_class, MatchClass::OtherGene);
        assert_eq!(out[0].gene_label.as_deref(), Some("GAPDH"));
    }

    #[test]
    fn multiple_label_not_naming_target_is_other_gene() {
        let targets = target_set(&[]);
        let index = collapsed(&[("AAAA", "TTTTTTTT", "Multiple")]);

        let out = classify_observations(
            vec![observation("AAAA", "TTTTTTTT", Call::Wt)],
            &targets,
            &index,
            "TET2",
        );
        assert_eq!(out[0].match_class, MatchClass::OtherGene);
    }

    #[test]
    fn no_gene_when_absent_from_index() {
        let targets = target_set(&[]);
        let index = collapsed(&[]);

        let out = classify_observations(
            vec![observation("AAAA", "TTTTTTTT", Call::Wt)],
            &targets,
            &index,
            "TET2",
        );
        assert_eq!(out[0].match_class, MatchClass::NoGene);
        assert!(!out[0].in_gex);
        assert_eq!(out[0].gene_label, None);
    }

    #[test]
    fn output_keeps_input_order() {
        let targets = target_set(&[("AAAA", "ACGTACGT")]);
        let index = collapsed(&[]);

        let input = vec![
            observation("CCCC", "TTTTTTTT", Call::Wt),
            observation("AAAA", "ACGTACGT", Call::Mut),
            observation("GGGG", "TTTTTTTT", Call::Amb),
        ];
        let out = classify_observations(input, &targets, &index, "TET2");
        assert_eq!(out[0].barcode, "CCCC");
        assert_eq!(out[1].barcode, "AAAA");
        assert_eq!(out[1].match_class, MatchClass::Exact);
        assert_eq!(out[2].barcode, "GGGG");
    }
}

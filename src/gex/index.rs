use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use crate::gex::{MoleculeArchive, MoleculeRecord};
use crate::umi;

/// Gene names containing this marker are antibody capture channels,
/// not transcripts
const ANTIBODY_MARKER: &str = "TotalSeq";

const MULTIPLE_PREFIX: &str = "Multiple_";
const ANTIBODY_SUFFIX: &str = "_Ab";

////////////////
/// Label and retained fields for one collapsed (barcode, UMI) molecule.
/// When a group collapses, retained fields come from its first record.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMolecule {
    pub gene: String,
    pub read_count: u32,
}

////////////////
/// All (barcode, UMI sequence) pairs supporting the target gene.
/// Fails if the gene is not in the feature table at all; an empty set is
/// only returned for a known gene without observed molecules.
pub fn target_gene_set(
    archive: &MoleculeArchive,
    gene_name: &str,
    umi_len: usize,
) -> Result<HashSet<(String, String)>> {
    if !archive.feature_names.iter().any(|f| f == gene_name) {
        bail!(
            "gene {} is not in the feature table of the molecule archive",
            gene_name
        );
    }

    let mut set = HashSet::new();
    for rec in &archive.records {
        if rec.gene_name == gene_name {
            let seq = umi::decode(rec.umi_code, umi_len)?;
            set.insert((rec.barcode.clone(), seq));
        }
    }
    Ok(set)
}

////////////////
/// Collapse molecules to one gene label per (barcode, UMI) pair,
/// restricted to the given barcode universe.
///
/// A UMI observed against multiple genes is a multi-mapping artifact; the
/// group gets a Multiple* label instead of one gene per record.
pub fn collapsed_index(
    archive: &MoleculeArchive,
    universe: &HashSet<String>,
    target_gene: &str,
) -> HashMap<(String, u64), LabeledMolecule> {
    //Group records in archive order
    let mut groups: HashMap<(String, u64), Vec<&MoleculeRecord>> = HashMap::new();
    for rec in &archive.records {
        if !universe.contains(&rec.barcode) {
            continue;
        }
        groups
            .entry((rec.barcode.clone(), rec.umi_code))
            .or_default()
            .push(rec);
    }

    //Reduce each group to a single labeled molecule
    let mut collapsed = HashMap::with_capacity(groups.len());
    for (key, group) in groups {
        let gene = collapse_label(&group, target_gene);
        collapsed.insert(
            key,
            LabeledMolecule {
                gene,
                read_count: group[0].read_count,
            },
        );
    }
    collapsed
}

fn collapse_label(group: &[&MoleculeRecord], target_gene: &str) -> String {
    if group.len() == 1 {
        return group[0].gene_name.clone();
    }

    if group.iter().any(|r| r.gene_name == target_gene) {
        if group.iter().any(|r| r.gene_name.contains(ANTIBODY_MARKER)) {
            format!("{}{}{}", MULTIPLE_PREFIX, target_gene, ANTIBODY_SUFFIX)
        } else {
            format!("{}{}", MULTIPLE_PREFIX, target_gene)
        }
    } else {
        "Multiple".to_string()
    }
}

////////////////
/// Does a collapsed label name this gene? Covers the plain gene name and
/// its Multiple_* variants, but not other genes' Multiple labels.
pub fn label_names_gene(label: &str, gene: &str) -> bool {
    label == gene
        || label
            .strip_prefix(MULTIPLE_PREFIX)
            .is_some_and(|rest| rest == gene || rest.strip_suffix(ANTIBODY_SUFFIX) == Some(gene))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(barcode: &str, umi_code: u64, gene: &str, count: u32) -> MoleculeRecord {
        MoleculeRecord {
            barcode: barcode.to_string(),
            umi_code,
            gene_id: format!("ENSG_{}", gene),
            gene_name: gene.to_string(),
            read_count: count,
        }
    }

    fn archive(records: Vec<MoleculeRecord>, features: &[&str]) -> MoleculeArchive {
        MoleculeArchive {
            records,
            barcodes: Vec::new(),
            feature_names: features.iter().map(|f| f.to_string()).collect(),
            feature_ids: features.iter().map(|f| format!("ENSG_{}", f)).collect(),
        }
    }

    fn universe(barcodes: &[&str]) -> HashSet<String> {
        barcodes.iter().map(|b| b.to_string()).collect()
    }

    #[test]
    fn singleton_keeps_gene_name() {
        let a = archive(vec![record("AAAA", 7, "TET2", 5)], &["TET2"]);
        let idx = collapsed_index(&a, &universe(&["AAAA"]), "TET2");

        let hit = idx.get(&("AAAA".to_string(), 7)).unwrap();
        assert_eq!(hit.gene, "TET2");
        assert_eq!(hit.read_count, 5);
    }

    #[test]
    fn multi_gene_with_target_collapses_to_multiple_target() {
        let a = archive(
            vec![record("AAAA", 7, "TET2", 5), record("AAAA", 7, "GAPDH", 2)],
            &["TET2", "GAPDH"],
        );
        let idx = collapsed_index(&a, &universe(&["AAAA"]), "TET2");

        //one entry, not two
        assert_eq!(idx.len(), 1);
        let hit = idx.get(&("AAAA".to_string(), 7)).unwrap();
        assert_eq!(hit.gene, "Multiple_TET2");
        //tie-break: retained count comes from the first record in group order
        assert_eq!(hit.read_count, 5);
    }

    #[test]
    fn antibody_channel_gets_suffix() {
        let a = archive(
            vec![
                record("AAAA", 7, "TET2", 1),
                record("AAAA", 7, "CD19_TotalSeqB", 9),
            ],
            &["TET2", "CD19_TotalSeqB"],
        );
        let idx = collapsed_index(&a, &universe(&["AAAA"]), "TET2");
        assert_eq!(
            idx.get(&("AAAA".to_string(), 7)).unwrap().gene,
            "Multiple_TET2_Ab"
        );
    }

    #[test]
    fn multi_gene_without_target_is_plain_multiple() {
        let a = archive(
            vec![record("AAAA", 7, "GAPDH", 1), record("AAAA", 7, "ACTB", 1)],
            &["TET2", "GAPDH", "ACTB"],
        );
        let idx = collapsed_index(&a, &universe(&["AAAA"]), "TET2");
        assert_eq!(idx.get(&("AAAA".to_string(), 7)).unwrap().gene, "Multiple");
    }

    #[test]
    fn universe_restricts_barcodes() {
        let a = archive(
            vec![record("AAAA", 7, "TET2", 1), record("CCCC", 9, "TET2", 1)],
            &["TET2"],
        );
        let idx = collapsed_index(&a, &universe(&["AAAA"]), "TET2");
        assert_eq!(idx.len(), 1);
        assert!(idx.contains_key(&("AAAA".to_string(), 7)));
    }

    #[test]
    fn target_set_decodes_umis() {
        //AAAC encodes to 1
        let a = archive(vec![record("AAAA", 1, "TET2", 3)], &["TET2"]);
        let set = target_gene_set(&a, "TET2", 4).unwrap();
        assert!(set.contains(&("AAAA".to_string(), "AAAC".to_string())));
    }

    #[test]
    fn missing_gene_is_fatal() {
        let a = archive(vec![record("AAAA", 1, "TET2", 3)], &["TET2"]);
        assert!(target_gene_set(&a, "IDH2", 4).is_err());
    }

    #[test]
    fn label_matching() {
        assert!(label_names_gene("TET2", "TET2"));
        assert!(label_names_gene("Multiple_TET2", "TET2"));
        assert!(label_names_gene("Multiple_TET2_Ab", "TET2"));
        assert!(!label_names_gene("Multiple", "TET2"));
        assert!(!label_names_gene("Multiple_IDH2", "TET2"));
        assert!(!label_names_gene("TET2L", "TET2"));
    }
}

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use hdf5::types::VarLenUnicode;
use hdf5::File;

// how to use: https://docs.rs/crate/hdf5/latest
// most active fork: https://github.com/metno/hdf5-rust

////////////////
/// One molecule from the expression archive, with the barcode and feature
/// indices already dereferenced against the string tables
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeRecord {
    pub barcode: String,
    pub umi_code: u64,
    pub gene_id: String,
    pub gene_name: String,
    pub read_count: u32,
}

////////////////
/// The molecule-level expression archive, fully materialized.
///
/// The string tables are kept in full even when the records are filtered to
/// a barcode subset; target_gene_set needs the complete feature table to
/// tell "gene absent" apart from "gene present but unobserved".
pub struct MoleculeArchive {
    pub records: Vec<MoleculeRecord>,
    pub barcodes: Vec<String>,
    pub feature_names: Vec<String>,
    pub feature_ids: Vec<String>,
}

impl MoleculeArchive {
    ////////////////
    /// Load the archive from HDF5. If a barcode filter is given, only
    /// molecules from those barcodes are kept.
    ///
    /// Index datasets are zero-based in storage and we index zero-based
    /// vectors with them, so no adjustment happens here.
    pub fn load(path: &PathBuf, keep_barcodes: Option<&HashSet<String>>) -> Result<MoleculeArchive> {
        let file = File::open(path)
            .with_context(|| format!("could not open molecule archive {}", path.display()))?;

        let barcode_idx: Vec<u64> = file.dataset("barcode_idx")?.read_raw()?;
        let feature_idx: Vec<u32> = file.dataset("feature_idx")?.read_raw()?;
        let umi: Vec<u64> = file.dataset("umi")?.read_raw()?;
        let count: Vec<u32> = file.dataset("count")?.read_raw()?;

        let barcodes = read_string_table(&file, "barcodes")?;
        let features = file.group("features")?;
        let feature_names = read_string_table(&features, "name")?;
        let feature_ids = read_string_table(&features, "id")?;

        let n = barcode_idx.len();
        if feature_idx.len() != n || umi.len() != n || count.len() != n {
            bail!(
                "ragged molecule archive: barcode_idx has {} entries, feature_idx {}, umi {}, count {}",
                n,
                feature_idx.len(),
                umi.len(),
                count.len()
            );
        }
        if feature_names.len() != feature_ids.len() {
            bail!(
                "feature name table has {} entries but id table has {}",
                feature_names.len(),
                feature_ids.len()
            );
        }

        let mut records = Vec::new();
        for i in 0..n {
            let bi = barcode_idx[i] as usize;
            let fi = feature_idx[i] as usize;
            if bi >= barcodes.len() {
                bail!("molecule {} points at barcode {} but the barcode table has {} entries", i, bi, barcodes.len());
            }
            if fi >= feature_names.len() {
                bail!("molecule {} points at feature {} but the feature table has {} entries", i, fi, feature_names.len());
            }

            if let Some(keep) = keep_barcodes {
                if !keep.contains(&barcodes[bi]) {
                    continue;
                }
            }

            records.push(MoleculeRecord {
                barcode: barcodes[bi].clone(),
                umi_code: umi[i],
                gene_id: feature_ids[fi].clone(),
                gene_name: feature_names[fi].clone(),
                read_count: count[i],
            });
        }

        log::info!(
            "loaded molecule archive: {} of {} molecules kept, {} barcodes, {} features",
            records.len(),
            n,
            barcodes.len(),
            feature_names.len()
        );

        Ok(MoleculeArchive {
            records,
            barcodes,
            feature_names,
            feature_ids,
        })
    }
}

fn read_string_table(location: &hdf5::Group, name: &str) -> Result<Vec<String>> {
    let raw: Vec<VarLenUnicode> = location
        .dataset(name)?
        .read_raw()
        .with_context(|| format!("could not read string table {}", name))?;
    Ok(raw.iter().map(|s| s.as_str().to_string()).collect())
}

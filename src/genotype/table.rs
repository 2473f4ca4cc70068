use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::umi;

/// Separator inside list-valued columns (one element per supporting UMI)
pub const LIST_SEPARATOR: char = ';';

////////////////
/// One row of the genotyping summary table, one row per barcode.
///
/// Which columns hold per-molecule lists and which hold per-barcode scalars
/// is declared here once: UMI, call.in.dups and the num.*.in.dups columns
/// are ;-joined lists, everything else is a scalar.
#[derive(Debug, Clone, Deserialize)]
pub struct GenotypeRow {
    #[serde(rename = "BC")]
    pub bc: String,

    #[serde(rename = "UMI")]
    pub umi: String,

    #[serde(rename = "WT.calls")]
    pub wt_calls: u32,
    #[serde(rename = "MUT.calls")]
    pub mut_calls: u32,
    #[serde(rename = "amb.calls")]
    pub amb_calls: u32,

    #[serde(rename = "call.in.dups")]
    pub call_in_dups: String,
    #[serde(rename = "num.WT.in.dups")]
    pub num_wt_in_dups: String,
    #[serde(rename = "num.MUT.in.dups")]
    pub num_mut_in_dups: String,
    #[serde(rename = "num.amb.in.dups")]
    pub num_amb_in_dups: String,
}

////////////////
/// Genotype call supported by one UMI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Wt,
    Mut,
    Amb,
}

impl Call {
    fn parse(s: &str) -> Result<Call> {
        match s {
            "WT" => Ok(Call::Wt),
            "MUT" => Ok(Call::Mut),
            "amb" | "AMB" => Ok(Call::Amb),
            other => bail!("unknown genotype call '{}'", other),
        }
    }
}

////////////////
/// One expanded per-UMI observation, before classification
#[derive(Debug, Clone)]
pub struct UmiObservation {
    pub barcode: String,
    pub umi_sequence: String,
    pub umi_code: u64,
    pub call: Call,

    //PCR-duplicate support within this UMI's read group
    pub dup_wt: u32,
    pub dup_mut: u32,
    pub dup_amb: u32,
    pub total_dups: u32,
    pub total_dups_wt_mut: u32,
}

////////////////
/// Read the genotyping summary table
pub fn read_genotype_table(path: &PathBuf) -> Result<Vec<GenotypeRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("could not open genotyping table {}", path.display()))?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: GenotypeRow =
            result.with_context(|| format!("malformed genotyping table {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

////////////////
/// Expand summary rows into one observation per supporting UMI.
/// Rows with an empty UMI field are dropped.
pub fn expand_rows(rows: &[GenotypeRow]) -> Result<Vec<UmiObservation>> {
    let mut observations = Vec::new();
    for row in rows {
        if row.umi.is_empty() {
            log::debug!("barcode {} has no supporting UMIs, dropped", row.bc);
            continue;
        }
        observations.extend(expand_row(row)?);
    }
    Ok(observations)
}

fn expand_row(row: &GenotypeRow) -> Result<Vec<UmiObservation>> {
    //The declared replication count; every list column must agree with it
    let n = (row.wt_calls + row.mut_calls + row.amb_calls) as usize;

    let umis = split_list(&row.umi);
    let calls = split_list(&row.call_in_dups);
    let dups_wt = split_list(&row.num_wt_in_dups);
    let dups_mut = split_list(&row.num_mut_in_dups);
    let dups_amb = split_list(&row.num_amb_in_dups);

    for (column, list) in [
        ("UMI", &umis),
        ("call.in.dups", &calls),
        ("num.WT.in.dups", &dups_wt),
        ("num.MUT.in.dups", &dups_mut),
        ("num.amb.in.dups", &dups_amb),
    ] {
        if list.len() != n {
            bail!(
                "barcode {}: column {} splits into {} elements but WT.calls+MUT.calls+amb.calls = {}",
                row.bc,
                column,
                list.len(),
                n
            );
        }
    }

    let mut observations = Vec::with_capacity(n);
    for i in 0..n {
        let dup_wt = parse_count(dups_wt[i], "num.WT.in.dups", &row.bc)?;
        let dup_mut = parse_count(dups_mut[i], "num.MUT.in.dups", &row.bc)?;
        let dup_amb = parse_count(dups_amb[i], "num.amb.in.dups", &row.bc)?;

        //Malformed UMIs mean upstream corruption, so encoding failures abort the run
        let umi_code = umi::encode(umis[i].as_bytes())
            .with_context(|| format!("barcode {}: bad UMI '{}'", row.bc, umis[i]))?;

        observations.push(UmiObservation {
            barcode: row.bc.clone(),
            umi_sequence: umis[i].to_string(),
            umi_code,
            call: Call::parse(calls[i])
                .with_context(|| format!("barcode {}: bad call entry", row.bc))?,
            dup_wt,
            dup_mut,
            dup_amb,
            total_dups: dup_wt + dup_mut + dup_amb,
            total_dups_wt_mut: dup_wt + dup_mut,
        });
    }
    Ok(observations)
}

fn split_list(field: &str) -> Vec<&str> {
    field.split(LIST_SEPARATOR).collect()
}

fn parse_count(s: &str, column: &str, barcode: &str) -> Result<u32> {
    s.parse::<u32>()
        .with_context(|| format!("barcode {}: column {} holds non-numeric entry '{}'", barcode, column, s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> GenotypeRow {
        GenotypeRow {
            bc: "AAAA".to_string(),
            umi: "ACGT;TTTT;CCCC".to_string(),
            wt_calls: 1,
            mut_calls: 1,
            amb_calls: 1,
            call_in_dups: "WT;MUT;amb".to_string(),
            num_wt_in_dups: "3;1;0".to_string(),
            num_mut_in_dups: "0;4;0".to_string(),
            num_amb_in_dups: "1;0;2".to_string(),
        }
    }

    #[test]
    fn expands_one_observation_per_umi() {
        let obs = expand_rows(&[row()]).unwrap();
        assert_eq!(obs.len(), 3);

        assert_eq!(obs[0].barcode, "AAAA");
        assert_eq!(obs[0].umi_sequence, "ACGT");
        assert_eq!(obs[0].call, Call::Wt);
        assert_eq!(obs[0].total_dups, 4);
        assert_eq!(obs[0].total_dups_wt_mut, 3);

        assert_eq!(obs[1].call, Call::Mut);
        assert_eq!(obs[1].total_dups, 5);
        assert_eq!(obs[1].total_dups_wt_mut, 5);

        assert_eq!(obs[2].call, Call::Amb);
        assert_eq!(obs[2].total_dups_wt_mut, 0);
    }

    #[test]
    fn umi_codes_match_codec() {
        let obs = expand_rows(&[row()]).unwrap();
        assert_eq!(obs[0].umi_code, crate::umi::encode(b"ACGT").unwrap());
    }

    #[test]
    fn length_mismatch_is_fatal_and_names_the_barcode() {
        let mut bad = row();
        bad.umi = "ACGT;TTTT".to_string(); //two UMIs, three declared calls

        let err = expand_rows(&[bad]).unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("AAAA"));
        assert!(msg.contains("UMI"));
    }

    #[test]
    fn empty_umi_rows_are_dropped() {
        let mut empty = row();
        empty.umi = String::new();

        let obs = expand_rows(&[empty, row()]).unwrap();
        assert_eq!(obs.len(), 3);
    }

    #[test]
    fn bad_umi_character_is_fatal() {
        let mut bad = row();
        bad.umi = "ACGT;TTNT;CCCC".to_string();
        assert!(expand_rows(&[bad]).is_err());
    }
}

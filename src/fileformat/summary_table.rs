use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::genotype::aggregate::{BarcodeSummary, LevelSummary};

const HEADER: [&str; 13] = [
    "BC",
    "genotype.unfiltered",
    "WT.calls.unfiltered",
    "MUT.calls.unfiltered",
    "total.calls.unfiltered",
    "genotype.gene.filtered",
    "WT.calls.gene.filtered",
    "MUT.calls.gene.filtered",
    "total.calls.gene.filtered",
    "genotype.threshold.filtered",
    "WT.calls.threshold.filtered",
    "MUT.calls.threshold.filtered",
    "total.calls.threshold.filtered",
];

////////////////
/// Persist the per-barcode summary as a tab-separated table.
/// An existing file is left alone so reruns stay idempotent.
pub fn write_summary_table(path: &PathBuf, summaries: &[BarcodeSummary]) -> Result<()> {
    if path.exists() {
        log::warn!("summary table {} already exists, skipping write", path.display());
        return Ok(());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("could not open summary table {} for writing", path.display()))?;

    writer.write_record(HEADER)?;
    for summary in summaries {
        let mut record: Vec<String> = vec![summary.barcode.clone()];
        for level in [
            &summary.unfiltered,
            &summary.gene_filtered,
            &summary.threshold_filtered,
        ] {
            push_level(&mut record, level);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn push_level(record: &mut Vec<String>, level: &LevelSummary) {
    record.push(level.genotype.as_str().to_string());
    record.push(format_count(level.wt_calls));
    record.push(format_count(level.mut_calls));
    record.push(format_count(level.total_calls));
}

fn format_count(count: Option<u32>) -> String {
    match count {
        Some(count) => count.to_string(),
        None => "NA".to_string(),
    }
}

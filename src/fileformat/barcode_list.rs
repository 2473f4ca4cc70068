use std::fs::read_to_string;
use std::path::PathBuf;

use anyhow::{Context, Result};

////////////////
/// Read the reference barcode list, one identifier per line.
/// Identifiers may carry a sample-index tag ("AAACCTGAGCGT-1"); the tag is
/// stripped so the bare barcode is the key everywhere downstream.
pub fn read_barcode_list_file(filename: &PathBuf) -> Result<Vec<String>> {
    let content = read_to_string(filename)
        .with_context(|| format!("failed to read barcode list {}", filename.display()))?;

    Ok(content
        .lines()
        .filter(|line| !line.is_empty())
        .map(strip_sample_suffix)
        .collect())
}

fn strip_sample_suffix(line: &str) -> String {
    match line.split_once('-') {
        Some((barcode, _tag)) => barcode.to_string(),
        None => line.to_string(),
    }
}

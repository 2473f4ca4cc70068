use std::path::PathBuf;

use anyhow::Result;
use plotly::common::color::NamedColor;
use plotly::layout::{Axis, BarMode, Shape, ShapeLine, ShapeType};
use plotly::{Histogram, Layout, Plot};

use crate::genotype::classify::{GenotypeObservation, MatchClass};

////////////////
/// Diagnostic chart: log10 read-support histograms per match class with the
/// chosen threshold overlaid. Written as a standalone HTML file.
/// An existing file is left alone so reruns stay idempotent.
pub fn write_support_plot(
    path: &PathBuf,
    observations: &[GenotypeObservation],
    threshold: f64,
) -> Result<()> {
    if path.exists() {
        log::warn!("plot {} already exists, skipping write", path.display());
        return Ok(());
    }

    let mut plot = Plot::new();
    for class in MatchClass::ALL {
        let values: Vec<f64> = observations
            .iter()
            .filter(|o| o.match_class == class && o.total_dups_wt_mut > 0)
            .map(|o| (o.total_dups_wt_mut as f64).log10())
            .collect();
        if values.is_empty() {
            continue;
        }
        plot.add_trace(Histogram::new(values).name(class.name()).opacity(0.6));
    }

    let cutoff = threshold.log10();
    let threshold_line = Shape::new()
        .shape_type(ShapeType::Line)
        .x_ref("x")
        .y_ref("paper")
        .x0(cutoff)
        .x1(cutoff)
        .y0(0.)
        .y1(1.)
        .line(ShapeLine::new().color(NamedColor::Black).width(2.));

    let layout = Layout::new()
        .bar_mode(BarMode::Overlay)
        .x_axis(Axis::new().title("log10 supporting reads (WT+MUT)"))
        .y_axis(Axis::new().title("UMIs"))
        .shapes(vec![threshold_line]);
    plot.set_layout(layout);

    plot.write_html(path);
    log::info!("wrote diagnostic plot {}", path.display());
    Ok(())
}

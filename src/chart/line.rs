use tracing::debug;

use super::canvas::{num, render_placeholder, title, Element, Frame, Margins, Surface};
use crate::models::XpPoint;
use crate::transform::to_mb;

pub const TITLE: &str = "Project XP Progress Over Time";

pub const FRAME: Frame = Frame {
    width: 600.0,
    height: 300.0,
    margin: Margins {
        top: 20.0,
        right: 30.0,
        bottom: 60.0,
        left: 70.0,
    },
};

const MAX_X_LABELS: usize = 5;
const Y_TICKS: usize = 5;

/// Plot-area positions of each point, before margins are applied.
pub fn point_positions(series: &[XpPoint]) -> Vec<(f64, f64)> {
    let max_index = if series.len() < 2 { 1.0 } else { (series.len() - 1) as f64 };
    let max_mb = max_value_mb(series);
    let inner_width = FRAME.inner_width();
    let inner_height = FRAME.inner_height();

    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let x = (i as f64 / max_index) * inner_width;
            let y = inner_height - (to_mb(point.total_xp) / max_mb) * inner_height;
            (x, y)
        })
        .collect()
}

/// Indices that receive an x-axis date label, evenly sampled across the series.
pub fn x_label_indices(count: usize) -> Vec<usize> {
    if count <= MAX_X_LABELS {
        return (0..count).collect();
    }
    let last = (count - 1) as f64;
    let steps = (MAX_X_LABELS - 1) as f64;
    let mut indices: Vec<usize> = (0..MAX_X_LABELS)
        .map(|i| ((i as f64 * last) / steps).round() as usize)
        .collect();
    indices.dedup();
    indices
}

fn max_value_mb(series: &[XpPoint]) -> f64 {
    let max = series
        .iter()
        .map(|point| to_mb(point.total_xp))
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

pub fn render(surface: &mut impl Surface, series: &[XpPoint]) {
    surface.clear();
    surface.set_view_box(FRAME.width, FRAME.height);
    if series.is_empty() {
        render_placeholder(surface, FRAME.width, FRAME.height);
        return;
    }

    let inner_width = FRAME.inner_width();
    let inner_height = FRAME.inner_height();
    let max_mb = max_value_mb(series);

    let (ox, oy) = FRAME.at(0.0, 0.0);
    let (bx, by) = FRAME.at(inner_width, inner_height);
    surface.push(Element::line(ox, by, bx, by).attr("class", "axis"));
    surface.push(Element::line(ox, oy, ox, by).attr("class", "axis"));

    for tick in 0..Y_TICKS {
        let fraction = tick as f64 / (Y_TICKS - 1) as f64;
        let (_, y) = FRAME.at(0.0, inner_height - fraction * inner_height);
        surface.push(
            Element::text(ox - 10.0, y + 4.0, format!("{:.2}", max_mb * fraction))
                .attr("text-anchor", "end")
                .attr("class", "axis-label"),
        );
    }

    let positions: Vec<(f64, f64)> = point_positions(series)
        .into_iter()
        .map(|(x, y)| FRAME.at(x, y))
        .collect();

    for index in x_label_indices(series.len()) {
        let (x, _) = positions[index];
        let y = by + 15.0;
        surface.push(
            Element::text(x, y, series[index].date.as_str())
                .attr("text-anchor", "end")
                .attr("class", "axis-label")
                .rotate(-45.0, x, y),
        );
    }

    if positions.len() >= 2 {
        surface.push(
            Element::polyline(positions.clone())
                .attr("fill", "none")
                .attr("class", "series-line"),
        );
    } else if let Some(&(x, y)) = positions.first() {
        surface.push(Element::circle(x, y, 5.0).attr("class", "series-single"));
    }

    for (point, &(x, y)) in series.iter().zip(&positions) {
        surface.push(
            Element::circle(x, y, 3.0)
                .attr("class", "series-dot")
                .tooltip(format!("{}: {} MB", point.date, point.total_xp_mb)),
        );
    }

    surface.push(
        Element::text(18.0, FRAME.height / 2.0, "XP (MB)")
            .attr("text-anchor", "middle")
            .attr("class", "axis-caption")
            .rotate(-90.0, 18.0, FRAME.height / 2.0),
    );
    title(surface, FRAME.width / 2.0, 14.0, TITLE);

    debug!(points = series.len(), max_mb = %num(max_mb), "rendered xp progress chart");
}

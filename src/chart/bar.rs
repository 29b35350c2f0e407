use std::collections::HashMap;

use tracing::debug;

use super::canvas::{render_placeholder, title, Element, Frame, Margins, Surface};
use crate::transform::ranked_projects;

pub const TITLE: &str = "XP Earned by Project (Top 10)";
pub const MAX_BARS: usize = 10;

pub const FRAME: Frame = Frame {
    width: 600.0,
    height: 300.0,
    margin: Margins {
        top: 20.0,
        right: 30.0,
        bottom: 100.0,
        left: 70.0,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub name: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Top projects by XP, laid out in plot-area coordinates.
pub fn bar_layout(totals: &HashMap<String, f64>) -> Vec<Bar> {
    let mut ranked = ranked_projects(totals);
    ranked.truncate(MAX_BARS);
    if ranked.is_empty() {
        return Vec::new();
    }

    let inner_height = FRAME.inner_height();
    let band = FRAME.inner_width() / ranked.len() as f64;
    let max_value = ranked.iter().map(|(_, value)| *value).fold(0.0_f64, f64::max);

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (name, value))| {
            let height = if max_value > 0.0 {
                (value / max_value) * inner_height
            } else {
                0.0
            };
            Bar {
                name,
                value,
                x: i as f64 * band + band * 0.1,
                y: inner_height - height,
                width: band * 0.8,
                height,
            }
        })
        .collect()
}

pub fn render(surface: &mut impl Surface, totals: &HashMap<String, f64>) {
    surface.clear();
    surface.set_view_box(FRAME.width, FRAME.height);
    let bars = bar_layout(totals);
    if bars.is_empty() {
        render_placeholder(surface, FRAME.width, FRAME.height);
        return;
    }

    let (ox, oy) = FRAME.at(0.0, 0.0);
    let (bx, by) = FRAME.at(FRAME.inner_width(), FRAME.inner_height());
    surface.push(Element::line(ox, by, bx, by).attr("class", "axis"));
    surface.push(Element::line(ox, oy, ox, by).attr("class", "axis"));

    for bar in &bars {
        let (x, y) = FRAME.at(bar.x, bar.y);
        let center = x + bar.width / 2.0;

        surface.push(
            Element::rect(x, y, bar.width, bar.height)
                .attr("class", "bar")
                .tooltip(format!("{}: {:.0} XP", bar.name, bar.value)),
        );
        surface.push(
            Element::text(center, y - 5.0, format!("{:.0}", bar.value))
                .attr("text-anchor", "middle")
                .attr("class", "bar-value"),
        );
        let label_y = by + 15.0;
        surface.push(
            Element::text(center, label_y, bar.name.as_str())
                .attr("text-anchor", "end")
                .attr("class", "axis-label")
                .rotate(-45.0, center, label_y),
        );
    }

    title(surface, FRAME.width / 2.0, 14.0, TITLE);
    debug!(bars = bars.len(), projects = totals.len(), "rendered xp by project chart");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::canvas::{Shape, SvgCanvas};

    fn totals(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn keeps_the_ten_largest_in_descending_order() {
        let many: HashMap<String, f64> = (1..=15)
            .map(|i| (format!("project-{i:02}"), i as f64 * 1000.0))
            .collect();

        let bars = bar_layout(&many);
        let names: Vec<&str> = bars.iter().map(|bar| bar.name.as_str()).collect();
        let expected: Vec<String> = (6..=15).rev().map(|i| format!("project-{i:02}")).collect();
        assert_eq!(names, expected.iter().map(String::as_str).collect::<Vec<_>>());

        let mut canvas = SvgCanvas::new();
        render(&mut canvas, &many);
        let rects = canvas
            .elements()
            .iter()
            .filter(|el| matches!(el.shape, Shape::Rect { .. }))
            .count();
        assert_eq!(rects, 10);
        assert!(!canvas.texts().contains(&"project-05"));
    }

    #[test]
    fn bars_share_a_baseline_and_scale_to_max() {
        let bars = bar_layout(&totals(&[("go-reloaded", 400.0), ("ascii-art", 100.0)]));
        assert_eq!(bars.len(), 2);

        let band = 500.0 / 2.0;
        assert_eq!(bars[0].x, band * 0.1);
        assert_eq!(bars[0].width, band * 0.8);
        assert_eq!(bars[0].height, 180.0);
        assert_eq!(bars[0].y, 0.0);
        assert_eq!(bars[1].x, band + band * 0.1);
        assert_eq!(bars[1].height, 45.0);
        for bar in &bars {
            assert_eq!(bar.y + bar.height, 180.0);
        }
    }

    #[test]
    fn tooltip_names_project_and_value() {
        let mut canvas = SvgCanvas::new();
        render(&mut canvas, &totals(&[("groupie-tracker", 24500.0)]));
        let index = canvas
            .elements()
            .iter()
            .position(|el| el.tooltip.is_some())
            .unwrap();
        assert!(canvas.pointer_enter(index));
        assert_eq!(canvas.active_tooltip(), Some("groupie-tracker: 24500 XP"));
        assert!(canvas.texts().contains(&"24500"));
        assert!(canvas.texts().contains(&TITLE));
    }

    #[test]
    fn empty_mapping_renders_placeholder() {
        let mut canvas = SvgCanvas::new();
        render(&mut canvas, &totals(&[("a", 1.0)]));
        render(&mut canvas, &HashMap::new());
        assert!(canvas.is_placeholder());
    }

    #[test]
    fn all_zero_values_render_flat_bars() {
        let bars = bar_layout(&totals(&[("a", 0.0), ("b", 0.0)]));
        assert!(bars.iter().all(|bar| bar.height == 0.0 && bar.y == 180.0));
    }

    #[test]
    fn rendering_is_idempotent() {
        let data = totals(&[("a", 3.0), ("b", 2.0), ("c", 1.0)]);
        let mut once = SvgCanvas::new();
        render(&mut once, &data);
        let mut twice = once.clone();
        render(&mut twice, &data);
        assert_eq!(once.to_svg(), twice.to_svg());
    }
}

use std::f64::consts::{FRAC_PI_2, TAU};

use tracing::debug;

use super::canvas::{num, render_placeholder, title, Element, Surface};
use crate::models::SkillPoint;

pub const TITLE: &str = "Skills Overview";
pub const SIZE: f64 = 500.0;
pub const RADIUS: f64 = SIZE / 2.0 - 80.0;
pub const SCALE_FLOOR: f64 = 10.0;

const RINGS: usize = 5;
const LABEL_OFFSET: f64 = 20.0;
const CENTER: (f64, f64) = (SIZE / 2.0, SIZE / 2.0);

/// Radius denominator, floored so small values do not fill the chart.
pub fn scale_max(skills: &[SkillPoint]) -> f64 {
    skills
        .iter()
        .map(|skill| skill.value)
        .fold(SCALE_FLOOR, f64::max)
}

/// Angle of axis `index`, starting at the top and going clockwise.
pub fn axis_angle(index: usize, count: usize) -> f64 {
    -FRAC_PI_2 + index as f64 * (TAU / count as f64)
}

pub fn polar(radius: f64, angle: f64) -> (f64, f64) {
    (CENTER.0 + radius * angle.cos(), CENTER.1 + radius * angle.sin())
}

/// Text anchor keeping labels outside the shape: left half-plane labels end at the anchor point.
pub fn label_anchor(angle: f64) -> &'static str {
    let cos = angle.cos();
    if cos < -1e-9 {
        "end"
    } else if cos > 1e-9 {
        "start"
    } else {
        "middle"
    }
}

pub fn vertex_positions(skills: &[SkillPoint]) -> Vec<(f64, f64)> {
    let max = scale_max(skills);
    skills
        .iter()
        .enumerate()
        .map(|(i, skill)| polar(skill.value / max * RADIUS, axis_angle(i, skills.len())))
        .collect()
}

fn threshold_label(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

pub fn render(surface: &mut impl Surface, skills: &[SkillPoint]) {
    surface.clear();
    surface.set_view_box(SIZE, SIZE);
    if skills.is_empty() {
        render_placeholder(surface, SIZE, SIZE);
        return;
    }

    let max = scale_max(skills);
    let (cx, cy) = CENTER;

    for level in 1..=RINGS {
        let fraction = level as f64 / RINGS as f64;
        let radius = RADIUS * fraction;
        surface.push(
            Element::circle(cx, cy, radius)
                .attr("fill", "none")
                .attr("class", "grid-ring"),
        );
        surface.push(
            Element::text(cx + 4.0, cy - radius - 2.0, threshold_label(max * fraction))
                .attr("class", "grid-label"),
        );
    }

    for (i, skill) in skills.iter().enumerate() {
        let angle = axis_angle(i, skills.len());
        let (x, y) = polar(RADIUS, angle);
        surface.push(Element::line(cx, cy, x, y).attr("class", "spoke"));

        let (lx, ly) = polar(RADIUS + LABEL_OFFSET, angle);
        surface.push(
            Element::text(lx, ly, skill.name.as_str())
                .attr("text-anchor", label_anchor(angle))
                .attr("dominant-baseline", "middle")
                .attr("class", "axis-label"),
        );
    }

    let vertices = vertex_positions(skills);
    surface.push(
        Element::polygon(vertices.clone())
            .attr("fill-opacity", "0.3")
            .attr("class", "skill-area"),
    );
    for (skill, &(x, y)) in skills.iter().zip(&vertices) {
        surface.push(
            Element::circle(x, y, 4.0)
                .attr("class", "skill-dot")
                .tooltip(format!("{}: {}", skill.name, num(skill.value))),
        );
    }

    title(surface, cx, 30.0, TITLE);
    debug!(skills = skills.len(), scale = max, "rendered skills radar");
}

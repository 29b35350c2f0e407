use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::controller::Dashboard;
use crate::transform::{format_mb, ranked_projects};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Series {
    /// Cumulative project XP over time
    Progress,
    /// XP summed per project, largest first
    Projects,
    /// Skill levels
    Skills,
}

#[derive(Serialize)]
struct ProjectRow<'a> {
    project: &'a str,
    xp: f64,
    xp_mb: String,
}

/// Writes one chart-ready series as CSV with a header row. Returns the row count.
pub fn write_series<W: Write>(
    dashboard: &Dashboard,
    series: Series,
    out: W,
) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_writer(out);

    let rows = match series {
        Series::Progress => {
            for point in &dashboard.xp_series {
                writer.serialize(point)?;
            }
            dashboard.xp_series.len()
        }
        Series::Projects => {
            let ranked = ranked_projects(&dashboard.project_totals);
            for (project, xp) in &ranked {
                writer.serialize(ProjectRow {
                    project,
                    xp: *xp,
                    xp_mb: format_mb(*xp),
                })?;
            }
            ranked.len()
        }
        Series::Skills => {
            for skill in &dashboard.skills {
                writer.serialize(skill)?;
            }
            dashboard.skills.len()
        }
    };

    writer.flush()?;
    Ok(rows)
}

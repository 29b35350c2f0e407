use std::fmt::Write;

use crate::chart::canvas::escape;
use crate::controller::Dashboard;
use crate::models::Summary;
use crate::transform::{format_mb, ranked_projects};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #0f172a; color: #e2e8f0; }
header { padding: 24px 32px; border-bottom: 1px solid #1e293b; }
main {
  padding: 24px 32px; display: grid; gap: 24px;
  grid-template-columns: repeat(auto-fit, minmax(420px, 1fr));
}
section { background: #111c33; border-radius: 10px; padding: 16px; }
.stats {
  display: flex; flex-wrap: wrap; gap: 24px; list-style: none; padding: 0; margin: 16px 0 0;
}
.stats strong { display: block; font-size: 1.4em; }
svg { width: 100%; height: auto; }
svg text { fill: #cbd5e1; font-size: 11px; }
svg .chart-title { font-size: 15px; font-weight: 600; }
svg .axis, svg .spoke, svg .grid-ring { stroke: #475569; }
svg .series-line { stroke: #38bdf8; stroke-width: 2; }
svg .series-dot, svg .series-single, svg .skill-dot { fill: #38bdf8; }
svg .bar { fill: #818cf8; }
svg .skill-area { fill: #38bdf8; stroke: #38bdf8; }
"#;

fn optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "N/A".to_string(),
    }
}

fn summary_rows(summary: &Summary) -> Vec<(&'static str, String)> {
    vec![
        ("Total XP", format!("{} MB", format_mb(summary.total_xp))),
        ("Project XP", format!("{} MB", format_mb(summary.project_xp))),
        ("Average grade", optional(summary.average_grade, 2)),
        ("Audit ratio", optional(summary.audit_ratio, 1)),
    ]
}

/// Self-contained HTML page: summary statistics plus the three charts.
pub fn build_page(dashboard: &Dashboard) -> String {
    let mut output = String::new();
    let name = escape(&dashboard.display_name);

    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"en\">");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<meta charset=\"utf-8\">");
    let _ = writeln!(output, "<title>{name} - Progress Dashboard</title>");
    let _ = writeln!(output, "<style>{STYLE}</style>");
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "<header>");
    let _ = writeln!(
        output,
        "<h1>Welcome, {name}</h1><p>@{}</p>",
        escape(&dashboard.login)
    );
    let _ = writeln!(output, "<ul class=\"stats\">");
    for (label, value) in summary_rows(&dashboard.summary) {
        let _ = writeln!(output, "<li>{label}<strong>{}</strong></li>", escape(&value));
    }
    let _ = writeln!(output, "</ul>");
    let _ = writeln!(output, "</header>");
    let _ = writeln!(output, "<main>");
    for canvas in [
        &dashboard.xp_progress,
        &dashboard.xp_by_project,
        &dashboard.skill_radar,
    ] {
        let _ = writeln!(output, "<section>{}</section>", canvas.to_svg());
    }
    let _ = writeln!(output, "</main>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");

    output
}

/// Plain-text rendition of the statistics for the terminal.
pub fn build_summary(dashboard: &Dashboard) -> String {
    let summary = &dashboard.summary;
    let mut output = String::new();

    let _ = writeln!(output, "{} (@{})", dashboard.display_name, dashboard.login);
    for (label, value) in summary_rows(summary) {
        let _ = writeln!(output, "- {label}: {value}");
    }
    if let (Some(up), Some(down)) = (summary.total_up, summary.total_down) {
        let _ = writeln!(
            output,
            "- Audits done / received: {} MB / {} MB",
            format_mb(up),
            format_mb(down)
        );
    }
    let counts = summary.pass_fail;
    let _ = writeln!(
        output,
        "- Tester results: {} passed, {} failed, {} tested",
        counts.passed, counts.failed, counts.tested
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "Top projects by XP:");
    let projects = ranked_projects(&dashboard.project_totals);
    if projects.is_empty() {
        let _ = writeln!(output, "No project XP recorded.");
    } else {
        for (name, amount) in projects.iter().take(5) {
            let _ = writeln!(output, "- {name}: {amount:.0} XP");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Skills:");
    if dashboard.skills.is_empty() {
        let _ = writeln!(output, "No skills recorded.");
    } else {
        for skill in &dashboard.skills {
            let _ = writeln!(output, "- {}: {}", skill.name, skill.value);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordObject, SkillNode, Transaction, User};

    fn dashboard() -> Dashboard {
        let user = User {
            login: "alee".to_string(),
            first_name: Some("Avery <3".to_string()),
            audit_ratio: Some(1.26),
            total_up: Some(2_500_000.0),
            total_down: Some(1_000_000.0),
            transactions: vec![Transaction {
                amount: 1_250_000.0,
                kind: "xp".to_string(),
                created_at: "2024-05-01".to_string(),
                object: Some(RecordObject {
                    name: Some("go-reloaded".to_string()),
                    kind: Some("project".to_string()),
                }),
            }],
            skills: vec![SkillNode {
                kind: "skill_go".to_string(),
                amount: 35.0,
            }],
            ..User::default()
        };
        Dashboard::build(&user)
    }

    #[test]
    fn page_embeds_stats_and_three_charts() {
        let page = build_page(&dashboard());
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("Welcome, Avery &lt;3"));
        assert!(page.contains("<strong>1.25 MB</strong>"));
        assert!(page.contains("<strong>1.3</strong>"));
        assert!(page.contains("<strong>N/A</strong>"));
        assert_eq!(page.matches("<svg ").count(), 3);
        assert!(page.contains("Project XP Progress Over Time"));
        assert!(page.contains("XP Earned by Project (Top 10)"));
        assert!(page.contains("Skills Overview"));
    }

    #[test]
    fn summary_lists_projects_and_skills() {
        let text = build_summary(&dashboard());
        assert!(text.contains("- Total XP: 1.25 MB"));
        assert!(text.contains("- Audit ratio: 1.3"));
        assert!(text.contains("- Audits done / received: 2.50 MB / 1.00 MB"));
        assert!(text.contains("- go-reloaded: 1250000 XP"));
        assert!(text.contains("- go: 35"));
        assert!(text.contains("0 passed, 0 failed, 0 tested"));
    }
}

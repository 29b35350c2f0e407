use std::collections::HashMap;

use crate::models::{
    display_date, parse_timestamp, PassFailCounts, ResultRecord, SkillNode, SkillPoint, Summary,
    Transaction, User, XpPoint,
};

pub const XP_PER_MB: f64 = 1_000_000.0;
const SKILL_PREFIX: &str = "skill_";

pub fn to_mb(xp: f64) -> f64 {
    xp / XP_PER_MB
}

pub fn format_mb(xp: f64) -> String {
    format!("{:.2}", to_mb(xp))
}

pub fn cumulative_xp_series(transactions: &[Transaction]) -> Vec<XpPoint> {
    let mut project_xp: Vec<&Transaction> =
        transactions.iter().filter(|tx| tx.is_project_xp()).collect();
    project_xp.sort_by_key(|tx| parse_timestamp(&tx.created_at));

    let mut running = 0.0;
    project_xp
        .into_iter()
        .map(|tx| {
            running += tx.amount;
            XpPoint {
                date: display_date(&tx.created_at),
                total_xp: running,
                total_xp_mb: format_mb(running),
            }
        })
        .collect()
}

pub fn xp_by_project(transactions: &[Transaction]) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.is_project_xp()) {
        *totals.entry(tx.project_name().to_string()).or_insert(0.0) += tx.amount;
    }
    totals
}

pub fn skill_series(skills: &[SkillNode]) -> Vec<SkillPoint> {
    skills
        .iter()
        .filter_map(|node| {
            node.kind.strip_prefix(SKILL_PREFIX).map(|name| SkillPoint {
                name: name.replacen('-', " ", 1),
                value: node.amount,
            })
        })
        .collect()
}

pub fn pass_fail_counts(results: &[ResultRecord]) -> PassFailCounts {
    let mut counts = PassFailCounts::default();
    for grade in results
        .iter()
        .filter(|result| result.kind == "tester")
        .filter_map(|result| result.grade)
    {
        counts.tested += 1;
        if grade == 1.0 {
            counts.passed += 1;
        } else if (0.0..1.0).contains(&grade) {
            counts.failed += 1;
        }
    }
    counts
}

/// Mean of the graded records, skipping the ungraded sentinel `0`.
pub fn average_grade(records: &[ResultRecord]) -> Option<f64> {
    let grades: Vec<f64> = records
        .iter()
        .filter_map(|record| record.grade)
        .filter(|grade| *grade != 0.0)
        .collect();
    if grades.is_empty() {
        None
    } else {
        Some(grades.iter().sum::<f64>() / grades.len() as f64)
    }
}

pub fn summarize(user: &User) -> Summary {
    let total_xp = user
        .transactions
        .iter()
        .filter(|tx| tx.kind == "xp")
        .map(|tx| tx.amount)
        .sum();
    let project_xp = user
        .transactions
        .iter()
        .filter(|tx| tx.is_project_xp())
        .map(|tx| tx.amount)
        .sum();

    Summary {
        total_xp,
        project_xp,
        average_grade: average_grade(&user.progresses).or_else(|| average_grade(&user.results)),
        audit_ratio: user.audit_ratio,
        total_up: user.total_up,
        total_down: user.total_down,
        pass_fail: pass_fail_counts(&user.results),
    }
}

/// Project totals ordered by descending XP, ties broken by name.
pub fn ranked_projects(totals: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = totals
        .iter()
        .map(|(name, amount)| (name.clone(), *amount))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked
}

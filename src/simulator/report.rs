//! Simulation report generation.

use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one simulated actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub final_level: u32,
    pub final_xp: u64,
    pub kills: u64,
    pub deaths: u64,
    pub xp_earned: u64,
    pub xp_lost: u64,
    pub full_resets: u64,
    pub level_ups: u64,
    pub ability_points: u32,
}

/// Aggregated results from all simulated actors.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub formula: String,
    pub num_actors: u32,

    // Aggregated stats
    pub avg_final_level: f64,
    pub max_final_level: u32,
    pub avg_kills: f64,
    pub avg_deaths: f64,
    pub avg_xp_lost: f64,
    pub total_level_downs: u64,

    // Distribution data
    pub level_distribution: BTreeMap<u32, u32>,
    /// XP floor of the first levels of the curve
    pub xp_curve: Vec<(u32, u64)>,

    #[serde(skip)]
    pub run_stats: Vec<RunStats>,
}

impl SimReport {
    pub fn from_runs(
        runs: Vec<RunStats>,
        formula: &str,
        total_level_downs: u64,
        xp_curve: Vec<(u32, u64)>,
    ) -> Self {
        let num_actors = runs.len() as u32;
        let divisor = num_actors.max(1) as f64;

        let avg_final_level = runs.iter().map(|r| r.final_level as f64).sum::<f64>() / divisor;
        let max_final_level = runs.iter().map(|r| r.final_level).max().unwrap_or(0);
        let avg_kills = runs.iter().map(|r| r.kills as f64).sum::<f64>() / divisor;
        let avg_deaths = runs.iter().map(|r| r.deaths as f64).sum::<f64>() / divisor;
        let avg_xp_lost = runs.iter().map(|r| r.xp_lost as f64).sum::<f64>() / divisor;

        let mut level_distribution = BTreeMap::new();
        for run in &runs {
            *level_distribution.entry(run.final_level).or_insert(0) += 1;
        }

        Self {
            formula: formula.to_string(),
            num_actors,
            avg_final_level,
            max_final_level,
            avg_kills,
            avg_deaths,
            avg_xp_lost,
            total_level_downs,
            level_distribution,
            xp_curve,
            run_stats: runs,
        }
    }

    /// Generate a text report.
    pub fn to_text(&self) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════════════════════\n");
        report.push_str("                    PROGRESSION REPORT\n");
        report.push_str("═══════════════════════════════════════════════════════════════\n\n");

        report.push_str(&format!(
            "Formula: {}    Actors: {}\n\n",
            self.formula, self.num_actors
        ));

        report.push_str("── PROGRESSION ──────────────────────────────────────────────────\n");
        report.push_str(&format!("  Avg Final Level:   {:.1}\n", self.avg_final_level));
        report.push_str(&format!("  Max Final Level:   {}\n", self.max_final_level));
        report.push_str(&format!("  Avg Kills:         {:.0}\n", self.avg_kills));
        report.push_str(&format!("  Avg Deaths:        {:.1}\n", self.avg_deaths));
        report.push_str(&format!("  Avg XP Lost:       {:.0}\n", self.avg_xp_lost));
        report.push_str(&format!("  Level Downs:       {}\n\n", self.total_level_downs));

        report.push_str("── LEVEL DISTRIBUTION ───────────────────────────────────────────\n");
        for (level, count) in &self.level_distribution {
            let pct = (*count as f64 / self.num_actors.max(1) as f64) * 100.0;
            let bar: String = "█".repeat((pct / 5.0) as usize);
            report.push_str(&format!("  Level {:4}: {:>5.1}% {}\n", level, pct, bar));
        }
        report.push_str("\n═══════════════════════════════════════════════════════════════\n");

        report
    }

    /// XP floor table for the first levels of the curve.
    pub fn level_curve_text(&self) -> String {
        let mut text = String::new();
        text.push_str("── XP CURVE ─────────────────────────────────────────────────────\n");
        text.push_str("  Level        XP     Delta\n");
        let mut previous = 0u64;
        for &(level, xp) in &self.xp_curve {
            text.push_str(&format!(
                "  {:5} {:9} {:9}\n",
                level,
                xp,
                xp.saturating_sub(previous)
            ));
            previous = xp;
        }
        text
    }

    /// Generate a JSON report for further analysis.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

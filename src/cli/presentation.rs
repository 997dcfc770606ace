//! CLI presentation: text and json formatters for simulate and table.

use crate::cli::route::SimulationReport;
use crate::game::autopilot::{Answer, TranscriptEntry};
use crate::game::effects::Effect;
use crate::game::session::{GameMode, RunOutcome, RunSummary};
use crate::gate::GateValue;
use crate::outcome::WeightedTable;
use crate::game::rewards::ChestOutcome;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

fn format_section_heading(title: &str) -> String {
    format!("{}\n{}", title, "-".repeat(title.len()))
}

fn mode_label(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Classic => "classic",
        GameMode::Daily => "daily",
    }
}

fn outcome_label(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Victory => "victory",
        RunOutcome::Defeat => "defeat",
    }
}

fn describe_effect(effect: &Effect) -> String {
    match effect {
        Effect::Text { key, tokens } if tokens.is_empty() => key.clone(),
        Effect::Text { key, tokens } => {
            let tokens: Vec<String> = tokens.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("{} [{}]", key, tokens.join(", "))
        }
        Effect::Prompt { key, options } => format!("{} ({})", key, options.join("/")),
        Effect::Animation { key } => key.clone(),
        Effect::Fade { millis } => format!("{}ms", millis),
        Effect::StarterSelect { slots } => format!("{} slot(s)", slots),
        Effect::DailySeed => "request daily seed".to_string(),
        Effect::Battle { wave, boss, double } => {
            let mut text = format!("wave {}", wave);
            if let Some(boss) = boss {
                text.push_str(&format!(" boss={}", boss));
            }
            if *double {
                text.push_str(" double");
            }
            text
        }
        Effect::RewardOffer { tiers } => {
            let tiers: Vec<String> = tiers.iter().map(|t| t.to_string()).collect();
            tiers.join(", ")
        }
        Effect::Evolution { member, from, into } => {
            format!("slot {}: {} -> {}", member, from, into)
        }
    }
}

fn describe_answer(answer: &Answer) -> String {
    match answer {
        Answer::Resolve { value } => match value {
            GateValue::Ack => "ack".to_string(),
            GateValue::Choice(index) => format!("choice {}", index),
            GateValue::Confirm(yes) => if *yes { "yes" } else { "no" }.to_string(),
            GateValue::Data(data) => data.to_string(),
        },
        Answer::Reject { reason } => format!("rejected: {}", reason),
        Answer::None => "-".to_string(),
    }
}

fn format_summary_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Outcome: {}\n", outcome_label(summary.outcome)));
    out.push_str(&format!("Mode: {}\n", mode_label(summary.mode)));
    out.push_str(&format!("Wave: {}\n", summary.wave));
    out.push_str(&format!("Items: {}\n", summary.items));
    out.push_str("Party:\n");
    for member in summary.party.members() {
        let status = if member.fainted { " (fainted)" } else { "" };
        out.push_str(&format!("  {:<12} lv {}{}\n", member.species, member.level, status));
    }
    out
}

/// Human-readable transcript followed by the run summary.
pub fn format_simulation_text(report: &SimulationReport, summary_only: bool) -> String {
    let mut out = format!(
        "{}\n\nSeed: {} ({})\n",
        format_section_heading("Simulated run"),
        report.seed,
        report.fingerprint
    );

    if !summary_only {
        out.push('\n');
        for entry in &report.transcript {
            out.push_str(&format_transcript_line(entry));
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&format_summary_text(&report.summary));
    out.push_str(&format!(
        "\nPhases: {} started, {} skipped, {} discarded, {} clear(s)\n",
        report.stats.started, report.stats.skipped, report.stats.discarded, report.stats.clears
    ));
    out
}

fn format_transcript_line(entry: &TranscriptEntry) -> String {
    let ignored = if entry.ignored { " (stale)" } else { "" };
    format!(
        "{:>5}  w{:<3} {:<10} {:<40} {}{}",
        entry.step,
        entry.wave,
        entry.effect.kind(),
        describe_effect(&entry.effect),
        describe_answer(&entry.answer),
        ignored
    )
}

pub fn format_simulation_json(
    report: &SimulationReport,
    summary_only: bool,
) -> Result<String, serde_json::Error> {
    if summary_only {
        let out = json!({
            "seed": report.seed,
            "fingerprint": report.fingerprint,
            "summary": report.summary,
            "stats": report.stats,
        });
        return serde_json::to_string_pretty(&out);
    }
    serde_json::to_string_pretty(report)
}

/// Chest outcomes with the draw interval each one owns.
pub fn format_chest_table(table: &WeightedTable<ChestOutcome>, json: bool) -> String {
    if json {
        let rows: Vec<_> = table
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let (start, end) = table.interval(index).unwrap_or((0, 0));
                json!({
                    "outcome": entry.outcome,
                    "weight": entry.weight,
                    "start": start,
                    "end": end,
                })
            })
            .collect();
        let out = json!({ "total": table.total(), "outcomes": rows });
        return serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string());
    }

    let mut out = format!("{}\n\n", format_section_heading("Mysterious chest"));
    let mut rows = Table::new();
    rows.load_preset(UTF8_BORDERS_ONLY);
    rows.set_header(vec!["Outcome", "Weight", "Rolls", "Share"]);
    for (index, entry) in table.entries().iter().enumerate() {
        let rolls = match table.interval(index) {
            Some((start, end)) if end > start => format!("{}..{}", start, end),
            _ => "-".to_string(),
        };
        let share = f64::from(entry.weight) * 100.0 / f64::from(table.total());
        rows.add_row(vec![
            entry.outcome.to_string(),
            entry.weight.to_string(),
            rolls,
            format!("{:.1}%", share),
        ]);
    }
    out.push_str(&format!("{}\n\nTotal: {}\n", rows, table.total()));
    out
}

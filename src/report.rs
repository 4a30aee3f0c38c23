//! Human-readable and JSON renderings of an analysis.
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use colored::Colorize;
use serde_json::{Value, json};

use crate::config::{AnalysisConfig, ReportOptions};
use crate::repair::RepairOutcome;
use crate::walker::Analysis;

// ————————————————————————————————————————————————————————————————————————————
// TEXT
// ————————————————————————————————————————————————————————————————————————————

pub fn render_report(
    source: &Path,
    analysis: &Analysis,
    config: &AnalysisConfig,
    options: &ReportOptions,
) -> String {
    ReportView { source, analysis, config, options }.to_string()
}

pub fn render_outcome(outcome: &RepairOutcome) -> String {
    OutcomeView(outcome).to_string()
}

struct ReportView<'a> {
    source: &'a Path,
    analysis: &'a Analysis,
    config: &'a AnalysisConfig,
    options: &'a ReportOptions,
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { source, analysis, config, options } = self;
        let title = "NBT Depth Analysis Report";
        writeln!(f, "{}", title.bold().cyan())?;
        writeln!(f, "{}", "=".repeat(title.len()).cyan())?;
        writeln!(f, "File: {}", source.display())?;
        writeln!(f, "Total nodes: {}", analysis.total_nodes)?;

        let max_depth = analysis.max_depth.to_string();
        let max_depth = if analysis.max_depth >= config.warning_depth { max_depth.red().bold() } else { max_depth.green() };
        writeln!(f, "Maximum depth: {max_depth}")?;
        writeln!(f, "Path to maximum depth: {}", options.render_path(&analysis.max_path))?;

        let deepest = deepest_samples(analysis, options);
        if !deepest.is_empty() {
            writeln!(f, "\n{}", "Deepest structures:".bold())?;
            for (depth, path) in deepest {
                writeln!(f, "  [{depth}] {path}")?;
            }
        }

        if !analysis.top_level.is_empty() {
            writeln!(f, "\n{}", "Top-level tags:".bold())?;
            for entry in &analysis.top_level {
                writeln!(f, "  {}: {}", entry.segment, entry.depth)?;
                if entry.depth > config.warning_depth {
                    let line = format!("  Deep path in {}: {}", entry.segment, options.render_path(&entry.deep_path));
                    writeln!(f, "{}", line.yellow())?;
                }
            }
        }

        writeln!(f)?;
        let flagged = analysis.problematic.len();
        if flagged == 0 {
            let line = format!("No structures reach the warning depth of {}.", config.warning_depth);
            return writeln!(f, "{}", line.green());
        }
        let line = format!("Warnings: {flagged} structure(s) at or beyond depth {}", config.warning_depth);
        writeln!(f, "{}", line.yellow().bold())?;
        if options.full_paths {
            for node in analysis.problematic.iter().take(options.warning_samples) {
                writeln!(f, "  - {} (depth {})", node.path, node.max_depth)?;
            }
            if flagged > options.warning_samples {
                writeln!(f, "  ... and {} more", flagged - options.warning_samples)?;
            }
        }
        Ok(())
    }
}

struct OutcomeView<'a>(&'a RepairOutcome);

impl fmt::Display for OutcomeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        writeln!(f, "Backup created: {}", outcome.backup.display())?;
        let reduction = &outcome.reduction;
        if !reduction.skipped.is_empty() {
            writeln!(f, "{}", format!("Skipped {} structure(s):", reduction.skipped.len()).yellow())?;
            for (path, reason) in &reduction.skipped {
                writeln!(f, "  - {path}: {reason}")?;
            }
        }
        if outcome.written {
            let line = format!("Reduced {} structure(s) and saved the file.", reduction.applied);
            writeln!(f, "{}", line.green().bold())
        } else {
            writeln!(f, "{}", "No structures were reduced; the file was left unchanged.".yellow())
        }
    }
}

/// Up to `deepest_samples` distinct rendered paths, deepest first.
/// Truncation can make distinct paths render alike, so dedup happens here.
fn deepest_samples(analysis: &Analysis, options: &ReportOptions) -> Vec<(usize, String)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (depth, paths) in analysis.histogram.iter().rev() {
        for path in paths {
            if out.len() >= options.deepest_samples {
                return out;
            }
            let rendered = options.render_path(path);
            if seen.insert(rendered.clone()) {
                out.push((*depth, rendered));
            }
        }
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// JSON
// ————————————————————————————————————————————————————————————————————————————

pub fn summary_json(
    source: &Path,
    analysis: &Analysis,
    config: &AnalysisConfig,
    options: &ReportOptions,
) -> Value {
    let deepest: Vec<Value> = deepest_samples(analysis, options)
        .into_iter()
        .map(|(depth, path)| json!({ "depth": depth, "path": path }))
        .collect();
    json!({
        "file": source.display().to_string(),
        "total_nodes": analysis.total_nodes,
        "max_depth": analysis.max_depth,
        "max_path": analysis.max_path,
        "warning_depth": config.warning_depth,
        "deepest": deepest,
        "top_level": analysis.top_level,
        "problematic": analysis.problematic,
    })
}

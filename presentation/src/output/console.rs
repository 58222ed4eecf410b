//! Console output formatter for generation results

use crate::cli::commands::OutputFormat;
use colored::Colorize;
use vibe_application::{ErrorKind, RunGenerationError};
use vibe_domain::{GenerationResult, Version};

/// Formats generation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a committed result in the requested format
    pub fn format(result: &GenerationResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Artifact => Self::format_artifact(result),
            OutputFormat::Diff => Self::format_diff(&result.diff),
            OutputFormat::Full => Self::format_full(result),
            OutputFormat::Json => Self::format_json(result),
        }
    }

    /// The artifact, exactly as committed
    pub fn format_artifact(result: &GenerationResult) -> String {
        result.artifact.clone()
    }

    /// Reply, colored diff and a one-line summary
    pub fn format_full(result: &GenerationResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!("Version {}", result.version)));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Model:".cyan().bold(),
            result.model
        ));
        if result.attempted_models.len() > 1 {
            output.push_str(&format!(
                "{} {}\n",
                "Tried:".cyan().bold(),
                result
                    .attempted_models
                    .iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ")
            ));
        }

        output.push_str(&Self::section_header("Assistant"));
        output.push_str(&result.assistant_text);
        output.push('\n');

        output.push_str(&Self::section_header("Changes"));
        output.push_str(&Self::format_diff(&result.diff));
        output.push('\n');

        output.push_str(&format!(
            "\n{}\n",
            Self::summary_line(result).dimmed()
        ));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(result: &GenerationResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Color a unified diff line by line
    pub fn format_diff(diff: &str) -> String {
        if diff.is_empty() {
            return "(no changes)".dimmed().to_string();
        }
        diff.lines()
            .map(|line| {
                if line.starts_with("+++") || line.starts_with("---") {
                    line.bold().to_string()
                } else if line.starts_with("@@") {
                    line.cyan().to_string()
                } else if line.starts_with('+') {
                    line.green().to_string()
                } else if line.starts_with('-') {
                    line.red().to_string()
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One line per version, oldest first
    pub fn format_versions(versions: &[Version]) -> String {
        if versions.is_empty() {
            return "No versions yet.".dimmed().to_string();
        }
        versions
            .iter()
            .map(|v| {
                let (added, removed) = Self::diff_stat(&v.diff);
                format!(
                    "  {} {}  {} chars  {} {}",
                    format!("v{}", v.version).yellow().bold(),
                    v.created_at.format("%H:%M:%S"),
                    v.artifact.chars().count(),
                    format!("+{added}").green(),
                    format!("-{removed}").red(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Human-readable failure, with a hint for configuration problems
    pub fn format_error(error: &RunGenerationError) -> String {
        let mut output = format!("{} {}", "Error:".red().bold(), error);
        match error.kind() {
            ErrorKind::Configuration => {
                output.push_str(&format!(
                    "\n{}",
                    "hint: set OPENROUTER_API_KEY and a model, or run with --show-config".dimmed()
                ));
            }
            ErrorKind::AccessDenied => {
                output.push_str(&format!(
                    "\n{}",
                    "hint: add a fallback model with --fallback or models.fallbacks".dimmed()
                ));
            }
            _ => {}
        }
        output
    }

    /// "vN · model · +a -r"
    pub fn summary_line(result: &GenerationResult) -> String {
        let (added, removed) = Self::diff_stat(&result.diff);
        if result.is_unchanged() {
            format!("v{} · {} · unchanged", result.version, result.model)
        } else {
            format!(
                "v{} · {} · +{} -{}",
                result.version, result.model, added, removed
            )
        }
    }

    /// Count added and removed lines, ignoring file headers
    pub fn diff_stat(diff: &str) -> (usize, usize) {
        diff.lines().fold((0, 0), |(added, removed), line| {
            if line.starts_with("+++") || line.starts_with("---") {
                (added, removed)
            } else if line.starts_with('+') {
                (added + 1, removed)
            } else if line.starts_with('-') {
                (added, removed + 1)
            } else {
                (added, removed)
            }
        })
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}

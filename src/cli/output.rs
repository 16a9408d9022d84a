use crate::{CheckResult, Match};
use colored::*;
use dialoguer::theme::{ColorfulTheme, SimpleTheme, Theme};
use dialoguer::Select;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// 1-based line and column of a byte offset. Columns count grapheme clusters.
pub fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = content[line_start..offset].graphemes(true).count() + 1;
    (line, column)
}

fn line_containing(content: &str, offset: usize) -> &str {
    let start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = content[offset..]
        .find('\n')
        .map_or(content.len(), |i| offset + i);
    content[start..end].trim_end_matches('\r')
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonMatch<'a> {
    line: usize,
    column: usize,
    #[serde(flatten)]
    inner: &'a Match,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFile<'a> {
    file: String,
    total_errors: usize,
    category_counts: &'a BTreeMap<String, usize>,
    processing_time_ms: f64,
    matches: Vec<JsonMatch<'a>>,
}

pub fn print_matches(
    file_path: &Path,
    content: &str,
    result: &CheckResult,
    colored_output: bool,
    format: &OutputFormat,
) {
    match format {
        OutputFormat::Text => print_text_matches(file_path, content, result, colored_output),
        OutputFormat::Json => print_json_matches(file_path, content, result),
    }
}

fn print_text_matches(file_path: &Path, content: &str, result: &CheckResult, colored_output: bool) {
    if result.matches.is_empty() {
        return;
    }

    let file_name = file_path.display().to_string();

    if colored_output {
        println!("\n{}", file_name.bold().underline());
    } else {
        println!("\n{}", file_name);
    }

    for m in &result.matches {
        let (line, column) = line_column(content, m.start_index);
        let line_info = format!("{}:{}", line, column);

        if colored_output {
            println!(
                "  {} {} {} {} {}",
                line_info.blue().bold(),
                m.original.red().bold(),
                "→".dimmed(),
                m.corrected.green(),
                format!("[{}/{}]", m.category, m.rule_id).dimmed()
            );
            if !m.description.is_empty() {
                println!("    {}", m.description.dimmed());
            }
        } else {
            println!(
                "  {} {} → {} [{}/{}]",
                line_info, m.original, m.corrected, m.category, m.rule_id
            );
            if !m.description.is_empty() {
                println!("    {}", m.description);
            }
        }
    }
}

fn print_json_matches(file_path: &Path, content: &str, result: &CheckResult) {
    let matches = result
        .matches
        .iter()
        .map(|m| {
            let (line, column) = line_column(content, m.start_index);
            JsonMatch {
                line,
                column,
                inner: m,
            }
        })
        .collect();

    let output = JsonFile {
        file: file_path.display().to_string(),
        total_errors: result.total_errors,
        category_counts: &result.category_counts,
        processing_time_ms: result.processing_time.as_secs_f64() * 1000.0,
        matches,
    };

    // One compact document per line so several files stream as NDJSON
    match serde_json::to_string(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize results: {}", e),
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}

fn check_summary(total_errors: usize, files_flagged: usize, files_checked: usize) -> String {
    if total_errors == 0 {
        return format!(
            "✓ No rule violations in {} {}",
            files_checked,
            plural(files_checked, "file", "files")
        );
    }
    format!(
        "✗ {} {} in {} {} ({} checked)",
        total_errors,
        plural(total_errors, "violation", "violations"),
        files_flagged,
        plural(files_flagged, "file", "files"),
        files_checked
    )
}

fn fix_summary(total_fixed: usize, files_fixed: usize) -> String {
    if total_fixed == 0 {
        return "No corrections applied".to_string();
    }
    format!(
        "✓ {} {} applied to {} {}",
        total_fixed,
        plural(total_fixed, "correction", "corrections"),
        files_fixed,
        plural(files_fixed, "file", "files")
    )
}

/// `files_flagged` counts files with at least one match.
pub fn print_check_summary(total_errors: usize, files_flagged: usize, files_checked: usize, colored: bool) {
    let line = check_summary(total_errors, files_flagged, files_checked);
    println!();
    match (colored, total_errors) {
        (false, _) => println!("{}", line),
        (true, 0) => println!("{}", line.green().bold()),
        (true, _) => println!("{}", line.red().bold()),
    }
}

pub fn print_fix_summary(total_fixed: usize, files_fixed: usize, colored: bool) {
    let line = fix_summary(total_fixed, files_fixed);
    println!();
    if colored && total_fixed > 0 {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixChoice {
    Apply,
    Skip,
    Quit,
}

/// Ask whether to apply one correction. Returns `Quit` if the prompt fails.
pub fn prompt_correction(content: &str, m: &Match, colored: bool) -> FixChoice {
    let (line, column) = line_column(content, m.start_index);
    let context = line_containing(content, m.start_index);

    if colored {
        println!(
            "\n{} {}:{} {}",
            "Rule violation:".yellow().bold(),
            line.to_string().blue(),
            column.to_string().blue(),
            format!("[{}/{}]", m.category, m.rule_id).dimmed()
        );
        println!("  {}", context.replace(&m.original, &m.original.red().bold().to_string()));
    } else {
        println!("\nRule violation: {}:{} [{}/{}]", line, column, m.category, m.rule_id);
        println!("  {}", context);
    }
    if !m.description.is_empty() {
        println!("  {}", m.description);
    }

    let items = [
        format!("Replace with \"{}\"", m.corrected),
        "Skip".to_string(),
        "Quit".to_string(),
    ];

    let colorful = ColorfulTheme::default();
    let theme: &dyn Theme = if colored { &colorful } else { &SimpleTheme };

    match Select::with_theme(theme).items(&items).default(0).interact_opt() {
        Ok(Some(0)) => FixChoice::Apply,
        Ok(Some(1)) => FixChoice::Skip,
        _ => FixChoice::Quit,
    }
}

//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use serde::Serialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use codemap_graph::{FileEntry, GraphCounts, ImportDiagnostic, ImportReport, LabelCount, TopNode};

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the outcome of an import.
pub fn print_import_report(report: &ImportReport, project_id: &str) {
    println!("\n{} {}", "Import complete:".green().bold(), project_id.cyan());
    println!("  Files:                 {}", report.files);
    println!("  Nodes merged:          {}", report.nodes_merged);
    println!("  Relationships merged:  {}", report.relationships_merged);
    println!("  Calls resolved:        {}", report.calls_resolved);
    println!("  Internal imports:      {}", report.internal_imports);
    println!("  External dependencies: {}", report.external_dependencies);

    if report.diagnostics.is_empty() {
        return;
    }

    println!("\n{} ({}):", "Diagnostics".bold(), report.diagnostics.len());
    let width = term_width().saturating_sub(4).max(40);
    for diagnostic in &report.diagnostics {
        let (tag, text) = describe(diagnostic);
        println!("  {} {}", tag, truncate_visual(&text, width.saturating_sub(12)));
    }
}

fn describe(diagnostic: &ImportDiagnostic) -> (ColoredString, String) {
    match diagnostic {
        ImportDiagnostic::AnalyzerError { path, message } => {
            (pad_right("analyzer", 10).yellow(), format!("{path}: {message}"))
        }
        ImportDiagnostic::Unresolved { link, from, target } => (
            pad_right("unresolved", 10).dimmed(),
            format!("{link:?} {from} -> {target}"),
        ),
        ImportDiagnostic::Ambiguous { link, from, target, chosen, candidates } => (
            pad_right("ambiguous", 10).magenta(),
            format!("{link:?} {from} -> {target}: chose {chosen} of {}", candidates.len()),
        ),
        ImportDiagnostic::LinkFailed { link, from, target, error } => (
            pad_right("failed", 10).red(),
            format!("{link:?} {from} -> {target}: {error}"),
        ),
    }
}

/// Print node counts by label.
pub fn print_summary(summary: &[LabelCount]) {
    if summary.is_empty() {
        println!("{}", "Graph is empty.".dimmed());
        return;
    }

    let label_width = summary
        .iter()
        .map(|c| UnicodeWidthStr::width(c.label.as_str()))
        .max()
        .unwrap_or(0)
        .max(5);

    println!("{}  {}", pad_right("LABEL", label_width).bold(), "COUNT".bold());
    println!("{}", "─".repeat(label_width + 10).dimmed());
    for entry in summary {
        println!("{}  {}", pad_right(&entry.label, label_width).cyan(), entry.count);
    }
    let total: i64 = summary.iter().map(|c| c.count).sum();
    println!("{}", "─".repeat(label_width + 10).dimmed());
    println!("{}  {}", pad_right("total", label_width), total.to_string().bold());
}

/// Print the file listing.
pub fn print_files(files: &[FileEntry]) {
    if files.is_empty() {
        println!("{}", "No files found.".dimmed());
        return;
    }

    let width = term_width();
    let path_width = width.saturating_sub(12 + 6 + 4).clamp(20, 70);

    println!(
        "{} {} {} {}",
        pad_right("PATH", path_width).bold(),
        pad_right("LANGUAGE", 12).bold(),
        pad_right("ITEMS", 6).bold(),
        "CONTENTS".bold()
    );
    println!("{}", "─".repeat(width.min(path_width + 40)).dimmed());

    for file in files {
        let path = truncate_visual(&file.path, path_width);
        println!(
            "{} {} {} {}",
            pad_right(&path, path_width),
            pad_right(&file.language, 12).dimmed(),
            pad_right(&file.item_count.to_string(), 6),
            content_summary(&file.content_types).dimmed()
        );
    }

    println!();
    println!("{} file(s)", files.len());
}

/// Collapse `[Function, Function, Class]` into `Function x2, Class`.
fn content_summary(types: &[String]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for t in types {
        match counts.iter_mut().find(|(name, _)| *name == t.as_str()) {
            Some((_, n)) => *n += 1,
            None => counts.push((t.as_str(), 1)),
        }
    }
    counts
        .into_iter()
        .map(|(name, n)| if n > 1 { format!("{name} x{n}") } else { name.to_string() })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print the most connected nodes.
pub fn print_top_nodes(nodes: &[TopNode]) {
    if nodes.is_empty() {
        println!("{}", "No connected nodes found.".dimmed());
        return;
    }

    let name_width = term_width().saturating_sub(20 + 8 + 4).clamp(20, 60);
    println!(
        "{} {} {}",
        pad_right("LABEL", 20).bold(),
        pad_right("NAME", name_width).bold(),
        "LINKS".bold()
    );
    println!("{}", "─".repeat(20 + name_width + 8).dimmed());

    for node in nodes {
        println!(
            "{} {} {}",
            label_colored(&pad_right(&node.label, 20)),
            pad_right(&truncate_visual(&node.name, name_width), name_width),
            node.connections.to_string().bold()
        );
    }
}

/// Print graph totals.
pub fn print_counts(counts: &GraphCounts, project_id: Option<&str>) {
    println!("{}", "Code Graph Status".bold());
    println!("{}", "─".repeat(40));
    if let Some(project_id) = project_id {
        println!("  Project:       {}", project_id.yellow());
    }
    println!("  Nodes:         {}", counts.nodes.to_string().cyan());
    println!("  Relationships: {}", counts.relationships.to_string().cyan());
    println!("{}", "─".repeat(40));
}

fn label_colored(label: &str) -> ColoredString {
    match label.trim_end() {
        "File" => label.cyan(),
        "Class" => label.magenta(),
        "Function" => label.green(),
        "ExternalDependency" => label.yellow(),
        "Project" => label.blue(),
        _ => label.normal(),
    }
}

/// Get terminal width, defaulting to 80.
fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_visual() {
        assert_eq!(truncate_visual("src/a.ts", 20), "src/a.ts");
        assert_eq!(truncate_visual("src/components/Button.tsx", 10), "src/comp..");
        assert_eq!(UnicodeWidthStr::width(truncate_visual("日本語のファイル名.ts", 8).as_str()), 8);
    }

    #[test]
    fn test_pad_right_uses_visual_width() {
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(UnicodeWidthStr::width(pad_right("日本", 6).as_str()), 6);
    }

    #[test]
    fn test_content_summary() {
        let types = ["Function", "Class", "Function"].map(String::from);
        assert_eq!(content_summary(&types), "Function x2, Class");
        assert_eq!(content_summary(&[]), "");
    }
}

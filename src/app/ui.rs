//! Plain-text presentation of statistics, summaries and hotspot rankings.

use std::fmt::Write;

use crate::types::{AuthorStats, FileHotspot, Statistics};

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// One-line status, e.g. `"3 files, +12/-4"`. Empty when hidden or nothing changed.
pub fn status_text(stats: &Statistics, visible: bool) -> String {
    let file_count = stats.total_files();
    if !visible || file_count == 0 {
        return String::new();
    }

    let mut text = plural(file_count, "file");
    if stats.total_lines() > 0 {
        let _ = write!(text, ", +{}/-{}", stats.lines_added, stats.lines_deleted);
    }
    text
}

/// Multi-line breakdown listing only the non-zero categories.
pub fn tooltip_text(stats: &Statistics, visible: bool) -> Option<String> {
    if !visible || stats.total_files() == 0 {
        return None;
    }

    let mut lines = Vec::new();
    if stats.files_modified > 0 {
        lines.push(format!("{} modified", plural(stats.files_modified, "file")));
    }
    if stats.files_added > 0 {
        lines.push(format!("{} added", plural(stats.files_added, "file")));
    }
    if stats.files_deleted > 0 {
        lines.push(format!("{} deleted", plural(stats.files_deleted, "file")));
    }
    if stats.binary_files_modified > 0 {
        lines.push(plural(stats.binary_files_modified, "binary file"));
    }
    if stats.total_lines() > 0 {
        lines.push(format!("+{} lines added", stats.lines_added));
        lines.push(format!("-{} lines deleted", stats.lines_deleted));
    }
    Some(lines.join("\n"))
}

/// True when the changed line count is above `threshold`.
pub fn is_large_commit(stats: &Statistics, threshold: usize) -> bool {
    stats.total_lines() > threshold
}

pub fn large_commit_message(stats: &Statistics) -> String {
    format!(
        "This commit changes {} lines. Large commits are harder to review; consider splitting it.",
        stats.total_lines()
    )
}

/// Summary table of an aggregation, newest commits first.
pub fn render_summary(stats: &AuthorStats) -> String {
    let mut out = String::new();
    if stats.total_commits == 0 {
        out.push_str("No commits found\n");
        return out;
    }

    let totals = &stats.aggregated_stats;
    let label = if stats.author.is_empty() { "All" } else { &stats.author };
    let _ = writeln!(out, "Author:          {label}");
    if let Some(range) = &stats.time_range {
        let _ = writeln!(
            out,
            "Period:          {} .. {}",
            range.start.format("%Y-%m-%d"),
            range.end.format("%Y-%m-%d")
        );
    }
    let _ = writeln!(out, "Commits:         {}", stats.total_commits);
    let _ = writeln!(
        out,
        "Files:           {} modified, {} added, {} deleted ({} binary)",
        totals.files_modified,
        totals.files_added,
        totals.files_deleted,
        totals.binary_files_modified
    );
    let _ = writeln!(
        out,
        "Lines:           +{} / -{}",
        totals.lines_added, totals.lines_deleted
    );

    let _ = writeln!(out, "\nDaily activity:");
    for (day, day_stats) in &stats.daily_activity {
        let _ = writeln!(
            out,
            "  {day}  {:>4} files  +{:<6} -{}",
            day_stats.total_files(),
            day_stats.lines_added,
            day_stats.lines_deleted
        );
    }

    let _ = writeln!(out, "\nCommits:");
    for commit in &stats.commits {
        let short = commit.hash.get(..8).unwrap_or(&commit.hash);
        let _ = writeln!(
            out,
            "  {short}  {}  {:<20}  +{:<5} -{:<5} {}",
            commit.timestamp.format("%Y-%m-%d %H:%M"),
            commit.author,
            commit.stats.lines_added,
            commit.stats.lines_deleted,
            commit.message
        );
    }
    out
}

/// Hotspot ranking, one file per line.
pub fn render_hotspots(hotspots: &[FileHotspot]) -> String {
    let mut out = String::new();
    if hotspots.is_empty() {
        return out;
    }
    let _ = writeln!(out, "{:<50} {:>8} {:>8}", "Path", "Commits", "Lines");
    for hotspot in hotspots {
        let _ = writeln!(
            out,
            "{:<50} {:>8} {:>8}",
            hotspot.file_path, hotspot.modification_count, hotspot.total_lines_changed
        );
    }
    out
}

//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use kiln_types::ColorChoice;
use serde::Serialize;
use std::io;
use std::path::PathBuf;

/// One package line of a fetch report
#[derive(Debug, Clone, Serialize)]
pub struct FetchRow {
    pub name: String,
    pub version: String,
    pub transport: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of `kiln fetch`
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub packages: Vec<FetchRow>,
    pub fetched: usize,
    pub cached: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub lockfile_updated: bool,
}

/// One package line of a status report
#[derive(Debug, Clone, Serialize)]
pub struct StatusRow {
    pub name: String,
    pub version: String,
    pub transport: String,
    pub cached: bool,
    pub dest: PathBuf,
}

/// Result of `kiln status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub cache_dir: PathBuf,
    pub packages: Vec<StatusRow>,
}

impl StatusReport {
    pub fn missing(&self) -> usize {
        self.packages.iter().filter(|row| !row.cached).count()
    }
}

/// Result of any command
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandResult {
    Fetch(FetchReport),
    Status(StatusReport),
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    json_output: bool,
    color_choice: ColorChoice,
    term: Term,
}

impl OutputRenderer {
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandResult) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            CommandResult::Fetch(report) => self.render_fetch_report(report),
            CommandResult::Status(report) => self.render_status_report(report),
        }
    }

    fn render_fetch_report(&self, report: &FetchReport) -> io::Result<()> {
        if report.packages.is_empty() {
            println!("No packages to fetch.");
            return Ok(());
        }

        let mut table = self.new_table(&["Package", "Version", "Transport", "Status", "Hash"]);
        for row in &report.packages {
            let hash = row
                .hash
                .as_deref()
                .map(short_hash)
                .unwrap_or_default()
                .to_string();
            table.add_row(vec![
                Cell::new(self.style_package_name(&row.name)),
                Cell::new(&row.version),
                Cell::new(&row.transport),
                self.status_cell(&row.status),
                Cell::new(hash),
            ]);
        }
        println!("{table}");
        println!();

        for row in &report.packages {
            if let Some(error) = &row.error {
                println!("{} {}: {error}", self.warning_marker(), row.name);
            }
        }

        println!(
            "{} fetched, {} cached, {} skipped in {}ms",
            report.fetched, report.cached, report.skipped, report.duration_ms
        );
        if report.lockfile_updated {
            println!("Lockfile updated.");
        }
        Ok(())
    }

    fn render_status_report(&self, report: &StatusReport) -> io::Result<()> {
        println!("Cache: {}", report.cache_dir.display());
        if report.packages.is_empty() {
            println!("No packages in lockfile.");
            return Ok(());
        }

        let mut table = self.new_table(&["Package", "Version", "Transport", "Cached"]);
        for row in &report.packages {
            let cached = if row.cached { "cached" } else { "missing" };
            table.add_row(vec![
                Cell::new(self.style_package_name(&row.name)),
                Cell::new(&row.version),
                Cell::new(&row.transport),
                self.status_cell(cached),
            ]);
        }
        println!("{table}");

        let missing = report.missing();
        if missing == 0 {
            println!("All {} packages are cached.", report.packages.len());
        } else {
            println!(
                "{missing} of {} packages need fetching.",
                report.packages.len()
            );
        }
        Ok(())
    }

    fn new_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if self.supports_color() {
            table.set_header(
                headers
                    .iter()
                    .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
            );
        } else {
            table.set_header(headers.iter().map(Cell::new));
        }
        table
    }

    fn status_cell(&self, status: &str) -> Cell {
        let cell = Cell::new(status);
        if !self.supports_color() {
            return cell;
        }
        match status {
            "fetched" => cell.fg(Color::Green),
            "cached" => cell.fg(Color::Cyan),
            "skipped" | "missing" => cell.fg(Color::Yellow),
            _ => cell,
        }
    }

    fn warning_marker(&self) -> String {
        if self.supports_color() {
            Style::new().yellow().bold().apply_to("skipped").to_string()
        } else {
            "skipped".to_string()
        }
    }

    fn style_package_name(&self, name: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(name).to_string()
        } else {
            name.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_handles_short_input() {
        assert_eq!(short_hash("abc"), "abc");
        assert_eq!(short_hash("0123456789abcdef"), "0123456789ab");
    }

    #[test]
    fn json_result_is_tagged_by_kind() {
        let result = CommandResult::Status(StatusReport {
            cache_dir: PathBuf::from("/cache"),
            packages: vec![StatusRow {
                name: "a".into(),
                version: "1.0.0".into(),
                transport: "copy".into(),
                cached: false,
                dest: PathBuf::from("/cache/a"),
            }],
        });
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["kind"], "status");
        assert_eq!(value["packages"][0]["cached"], false);
    }
}

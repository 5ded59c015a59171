//! Output formatting utilities for the CLI
//!
//! Batch results can be printed as per-host text blocks, a summary table
//! or JSON. Status messages go through the colored `print_*` helpers.

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use gs_core::config::OutputFormat;
use gs_core::{BatchSummary, EndpointResult};

/// Print a batch in the requested format
pub fn print_results(results: &[EndpointResult], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print_text(results),
        OutputFormat::Table => println!("{}", format_table(results)),
        OutputFormat::Json => println!("{}", format_json(results)?),
    }
    Ok(())
}

/// One block per endpoint, successes on stdout and failures on stderr
fn print_text(results: &[EndpointResult]) {
    for result in results {
        match &result.error {
            None => {
                print_success(&format!("{} ({})", result.display_name(), endpoint_address(result)));
                print!("{}", with_trailing_newline(&result.stdout));
            }
            Some(err) => {
                print_error(&format!("{}: {}", result.display_name(), err));
                print!("{}", with_trailing_newline(&result.stdout));
            }
        }
        if !result.stderr.is_empty() {
            eprint!("{}", with_trailing_newline(&result.stderr));
        }
    }
}

/// Format a batch as an ASCII table
///
/// Output is cut to its first line. Use text or JSON output for the full
/// captured streams.
pub fn format_table(results: &[EndpointResult]) -> String {
    if results.is_empty() {
        return "No endpoints".to_string();
    }

    #[derive(Tabled)]
    struct ResultRow {
        #[tabled(rename = "HOST")]
        host: String,
        #[tabled(rename = "ADDRESS")]
        address: String,
        #[tabled(rename = "STATUS")]
        status: String,
        #[tabled(rename = "EXIT")]
        exit: String,
        #[tabled(rename = "OUTPUT")]
        output: String,
    }

    let rows: Vec<ResultRow> = results
        .iter()
        .map(|r| ResultRow {
            host: r.display_name().to_string(),
            address: endpoint_address(r),
            status: if r.is_success() { "ok" } else { "failed" }.to_string(),
            exit: r
                .exit_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            output: match &r.error {
                Some(err) => truncate(&err.to_string(), 60),
                None => truncate(r.stdout.lines().next().unwrap_or(""), 60),
            },
        })
        .collect();

    let summary = BatchSummary::of(results);
    format!(
        "{}\n{} succeeded, {} failed",
        Table::new(rows).with(Style::rounded()),
        summary.succeeded,
        summary.failed
    )
}

/// Format a batch as pretty JSON with a summary object
pub fn format_json(results: &[EndpointResult]) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct Report<'a> {
        results: &'a [EndpointResult],
        summary: BatchSummary,
    }

    serde_json::to_string_pretty(&Report {
        results,
        summary: BatchSummary::of(results),
    })
}

fn endpoint_address(result: &EndpointResult) -> String {
    if result.host.contains(':') {
        format!("[{}]:{}", result.host, result.port)
    } else {
        format!("{}:{}", result.host, result.port)
    }
}

fn with_trailing_newline(s: &str) -> String {
    if s.is_empty() || s.ends_with('\n') {
        s.to_string()
    } else {
        format!("{}\n", s)
    }
}

/// Truncate a string with ellipsis if too long
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow to stderr
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

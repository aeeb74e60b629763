//! Pretty formatter for terminal output.
//!
//! Results render as numbered cards: bold title, clickable link, dimmed
//! snippet. Page content is wrapped to the terminal width.

use super::OutputData;
use owo_colors::OwoColorize;
use sieve_core::{PageResult, WebPage};

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

/// Indent for card content (after number)
const CARD_INDENT: usize = 6;

pub fn render(data: &OutputData) -> String {
    let width = terminal_width();
    let mut output = String::new();

    match data {
        OutputData::SearchResults {
            engine,
            query,
            results,
        } => {
            let label = format!("{} · {} ({} results)", engine, query, results.len());
            output.push_str(&section_rule(&label, width));
            output.push('\n');
            if results.is_empty() {
                output.push_str(&format!("      {}\n", "No results.".dimmed()));
            }
            for (i, page) in results.web_pages.iter().enumerate() {
                if i > 0 {
                    output.push('\n');
                }
                output.push_str(&format_result_card(page, i + 1, width));
            }
        }
        OutputData::Pages { requested, pages } => {
            let label = format!("{} of {} pages", pages.len(), requested);
            output.push_str(&section_rule(&label, width));
            output.push('\n');
            for page in pages {
                output.push('\n');
                output.push_str(&format_page(page, width));
            }
        }
    }

    output
}

fn format_result_card(page: &WebPage, index: usize, width: usize) -> String {
    let mut output = String::new();
    let index_str = format!(" {:>3}. ", index).cyan().bold().to_string();
    output.push_str(&format!("{}{}\n", index_str, page.title.bold()));

    let hyperlink = format_hyperlink(&page.url_string, &page.url_string);
    output.push_str(&format!("      {}\n", hyperlink.blue()));

    let clean = clean_snippet(&page.snippet);
    if !clean.is_empty() {
        for line in textwrap::wrap(&clean, width.saturating_sub(CARD_INDENT + 2).max(20)) {
            output.push_str(&format!("      {}\n", line.dimmed()));
        }
    }

    output
}

fn format_page(page: &PageResult, width: usize) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", page.title.green().bold()));
    let url = page.url.as_str();
    output.push_str(&format!("{}\n\n", format_hyperlink(url, url).blue()));

    for paragraph in page.content.lines() {
        if paragraph.trim().is_empty() {
            output.push('\n');
            continue;
        }
        for line in textwrap::wrap(paragraph, width.max(20)) {
            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}

/// `── label ─────`, with the trailing rule filling out the line up to 60 columns.
fn section_rule(label: &str, width: usize) -> String {
    let fill = width.saturating_sub(label.chars().count() + 4).min(60);
    format!("{} {} {}", "──".cyan(), label.green().bold(), "─".repeat(fill).cyan())
}

fn clean_snippet(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// OSC 8 terminal hyperlink, BEL-terminated.
fn format_hyperlink(url: &str, display_text: &str) -> String {
    format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", url, display_text)
}

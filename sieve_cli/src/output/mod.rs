use crate::cli::OutputFormat;
use crate::commands::Result;
use sieve_core::types::to_sorted_json;
use sieve_core::{PageResult, SearchResult};

mod pretty;

#[derive(Debug, Clone)]
pub enum OutputData {
    SearchResults {
        engine: String,
        query: String,
        results: SearchResult,
    },
    Pages {
        requested: usize,
        pages: Vec<PageResult>,
    },
}

pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", render_json(data)?),
        OutputFormat::Text => print!("{}", render_text(data)),
        OutputFormat::Pretty => print!("{}", pretty::render(data)),
    }
    Ok(())
}

/// Sorted-key pretty JSON of the payload alone: the result list for a
/// search, the page list for a read.
fn render_json(data: &OutputData) -> Result<String> {
    Ok(match data {
        OutputData::SearchResults { results, .. } => to_sorted_json(&results.web_pages)?,
        OutputData::Pages { pages, .. } => to_sorted_json(pages)?,
    })
}

fn render_text(data: &OutputData) -> String {
    let mut out = String::new();
    match data {
        OutputData::SearchResults { results, .. } => {
            for page in &results.web_pages {
                out.push_str(&format!(
                    "- {}\n  {}\n  {}\n\n",
                    page.title, page.url_string, page.snippet
                ));
            }
        }
        OutputData::Pages { pages, .. } => {
            for page in pages {
                out.push_str(&format!("# {}\n{}\n\n{}\n\n", page.title, page.url, page.content));
            }
        }
    }
    out
}

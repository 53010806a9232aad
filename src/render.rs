//! Plain-text listing of papers for the terminal.

use crate::arxiv::Paper;

/// Collapse runs of whitespace (arXiv titles wrap with newline + indent).
pub(crate) fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn authors_label(authors: &[String]) -> String {
    match authors {
        [] => String::new(),
        [only] => format!(" ({only})"),
        [first, ..] => format!(" ({first} et al.)"),
    }
}

pub fn paper_line(number: usize, paper: &Paper) -> String {
    format!(
        "{number}. {}  {}{}",
        paper.published,
        single_line(&paper.title),
        authors_label(&paper.authors)
    )
}

pub fn translated_line(number: usize, paper: &Paper) -> String {
    let title = paper.translated_title.as_deref().unwrap_or(&paper.title);
    format!(
        "{number}. {}  {} ({})",
        paper.published,
        single_line(title),
        paper.entry_id
    )
}

pub fn paper_list(papers: &[Paper]) -> String {
    papers
        .iter()
        .enumerate()
        .map(|(i, paper)| paper_line(i + 1, paper))
        .collect::<Vec<_>>()
        .join("\n")
}

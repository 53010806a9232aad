//! Atom feed parsing for arXiv API responses.
//!
//! Elements are matched by local name, so the Atom, OpenSearch and arXiv
//! namespace prefixes do not matter. Every per-entry field is optional, but
//! the document itself must be a complete `<feed>`.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::types::Paper;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("malformed Atom feed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed Atom feed: root element is not <feed>")]
    NotAFeed,

    #[error("malformed Atom feed: document ends inside <{0}>")]
    Truncated(&'static str),
}

/// One page of search results.
#[derive(Debug, Default)]
pub struct Feed {
    pub total_results: Option<u64>,
    pub papers: Vec<Paper>,
}

pub fn parse_feed(xml: &str) -> Result<Feed, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut feed = Feed::default();
    let mut buf = Vec::new();
    let mut root_seen = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if !root_seen => {
                if e.local_name().as_ref() != b"feed" {
                    return Err(FeedError::NotAFeed);
                }
                root_seen = true;
            }
            Event::Empty(e) if !root_seen => {
                if e.local_name().as_ref() != b"feed" {
                    return Err(FeedError::NotAFeed);
                }
                return Ok(feed);
            }
            Event::Text(_) | Event::CData(_) if !root_seen => return Err(FeedError::NotAFeed),
            Event::Start(e) => match e.local_name().as_ref() {
                b"totalResults" => {
                    let total = read_text(&mut reader, "totalResults")?;
                    feed.total_results = total.trim().parse().ok();
                }
                b"entry" => feed.papers.push(parse_entry(&mut reader)?),
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"feed" => return Ok(feed),
            Event::Eof if root_seen => return Err(FeedError::Truncated("feed")),
            Event::Eof => return Err(FeedError::NotAFeed),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_entry(reader: &mut Reader<&[u8]>) -> Result<Paper, FeedError> {
    let mut paper = Paper::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"title" => paper.title = read_text(reader, "title")?.trim().to_string(),
                b"summary" => paper.summary = read_text(reader, "summary")?.trim().to_string(),
                b"published" => paper.published = read_text(reader, "published")?,
                b"updated" => paper.updated = read_text(reader, "updated")?,
                b"id" => paper.entry_id = read_text(reader, "id")?.trim().to_string(),
                b"author" => {
                    if let Some(name) = parse_author(reader)? {
                        paper.authors.push(name);
                    }
                }
                b"primary_category" => {
                    let term = term_attribute(&e);
                    let text = read_text(reader, "primary_category")?;
                    paper.primary_category = if term.is_empty() {
                        text.trim().to_string()
                    } else {
                        term
                    };
                }
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"primary_category" => {
                paper.primary_category = term_attribute(&e);
            }
            Event::End(e) if e.local_name().as_ref() == b"entry" => break,
            Event::Eof => return Err(FeedError::Truncated("entry")),
            _ => {}
        }
        buf.clear();
    }

    Ok(paper)
}

fn parse_author(reader: &mut Reader<&[u8]>) -> Result<Option<String>, FeedError> {
    let mut name = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"name" => {
                let text = read_text(reader, "name")?.trim().to_string();
                if !text.is_empty() {
                    name = Some(text);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"author" => break,
            Event::Eof => return Err(FeedError::Truncated("author")),
            _ => {}
        }
        buf.clear();
    }

    Ok(name)
}

/// Collect the text of the current element, including text inside nested tags.
fn read_text(reader: &mut Reader<&[u8]>, element: &'static str) -> Result<String, FeedError> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(FeedError::Truncated(element)),
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// `term` attribute of a category element; empty when absent or undecodable.
fn term_attribute(e: &BytesStart<'_>) -> String {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"term")
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.trim().to_string()))
        .unwrap_or_default()
}

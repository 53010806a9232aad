//! XML export of a paper list.
//!
//! Layout: `<papers>` root, one `<paper number="N">` per record numbered
//! from 1, text fields (empty when absent), translated fields when set, and
//! empty `categories`/`authors`/`links` containers.

use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::info;

use crate::arxiv::Paper;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("XML write failed: {0}")]
    Xml(String),

    #[error("could not write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

pub fn to_xml(papers: &[Paper]) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write(&mut writer, Event::Start(BytesStart::new("papers")))?;

    for (i, paper) in papers.iter().enumerate() {
        let number = (i + 1).to_string();
        let mut start = BytesStart::new("paper");
        start.push_attribute(("number", number.as_str()));
        write(&mut writer, Event::Start(start))?;

        text_element(&mut writer, "title", &paper.title)?;
        if let Some(title) = &paper.translated_title {
            text_element(&mut writer, "translated_title", title)?;
        }
        text_element(&mut writer, "summary", &paper.summary)?;
        if let Some(summary) = &paper.translated_summary {
            text_element(&mut writer, "translated_summary", summary)?;
        }
        text_element(&mut writer, "published", &paper.published)?;
        text_element(&mut writer, "updated", &paper.updated)?;
        text_element(&mut writer, "entry_id", &paper.entry_id)?;
        text_element(&mut writer, "primary_category", &paper.primary_category)?;
        for container in ["categories", "authors", "links"] {
            write(&mut writer, Event::Empty(BytesStart::new(container)))?;
        }

        write(&mut writer, Event::End(BytesEnd::new("paper")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("papers")))?;

    let mut xml = writer.into_inner();
    xml.push(b'\n');
    Ok(xml)
}

pub fn write_xml(path: &Path, papers: &[Paper]) -> Result<(), ExportError> {
    let xml = to_xml(papers)?;
    std::fs::write(path, xml).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), papers = papers.len(), "export written");
    Ok(())
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), ExportError> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), ExportError> {
    writer
        .write_event(event)
        .map_err(|e| ExportError::Xml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arxiv::feed::parse_feed;

    fn paper(title: &str) -> Paper {
        Paper {
            title: title.into(),
            summary: "A study of <cats> & dogs.".into(),
            published: "2023-01-30T17:00:00Z".into(),
            updated: "2023-01-31T09:00:00Z".into(),
            entry_id: "http://arxiv.org/abs/2301.00002v1".into(),
            primary_category: "q-bio.PE".into(),
            ..Paper::default()
        }
    }

    fn export(papers: &[Paper]) -> String {
        String::from_utf8(to_xml(papers).unwrap()).unwrap()
    }

    #[test]
    fn numbers_papers_from_one() {
        let xml = export(&[paper("Cats"), paper("Dogs")]);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<paper number=\"1\">"));
        assert!(xml.contains("<paper number=\"2\">"));
        assert!(!xml.contains("number=\"0\""));
    }

    #[test]
    fn writes_text_fields_escaped() {
        let xml = export(&[paper("Cats")]);
        assert!(xml.contains("<title>Cats</title>"));
        assert!(xml.contains("<summary>A study of &lt;cats&gt; &amp; dogs.</summary>"));
        assert!(xml.contains("<published>2023-01-30T17:00:00Z</published>"));
        assert!(xml.contains("<updated>2023-01-31T09:00:00Z</updated>"));
        assert!(xml.contains("<entry_id>http://arxiv.org/abs/2301.00002v1</entry_id>"));
        assert!(xml.contains("<primary_category>q-bio.PE</primary_category>"));
    }

    #[test]
    fn writes_empty_placeholder_containers() {
        let xml = export(&[paper("Cats")]);
        assert!(xml.contains("<categories/>"));
        assert!(xml.contains("<authors/>"));
        assert!(xml.contains("<links/>"));
    }

    #[test]
    fn is_indented() {
        let xml = export(&[paper("Cats")]);
        assert!(xml.contains("\n  <paper number=\"1\">"));
        assert!(xml.contains("\n    <title>Cats</title>"));
    }

    #[test]
    fn translated_fields_only_when_present() {
        let plain = export(&[paper("Cats")]);
        assert!(!plain.contains("translated_title"));

        let mut translated = paper("Cats");
        translated.translated_title = Some("Gatos".into());
        translated.translated_summary = Some("Um estudo.".into());
        let xml = export(&[translated]);
        assert!(xml.contains("<translated_title>Gatos</translated_title>"));
        assert!(xml.contains("<translated_summary>Um estudo.</translated_summary>"));
    }

    #[test]
    fn empty_list_is_a_bare_root() {
        let xml = export(&[]);
        assert!(xml.contains("<papers>"));
        assert!(xml.contains("</papers>"));
        assert!(!xml.contains("<paper "));
    }

    #[test]
    fn output_is_well_formed() {
        let xml = export(&[paper("Cats"), Paper::default()]);
        assert!(parse_feed(&xml).is_ok());
    }

    #[test]
    fn write_xml_creates_file() {
        let path = std::env::temp_dir().join(format!("arxiv-triage-export-{}.xml", std::process::id()));
        write_xml(&path, &[paper("Cats")]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(written.contains("<title>Cats</title>"));
    }
}

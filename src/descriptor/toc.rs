//! Table-of-contents descriptor: an ordered, recursive tree of labeled links.
//!
//! The expected shape is a `<toc label=".." topic="..">` root whose first-level
//! `<topic>` children each carry a required `label`, an optional `href` (which
//! may include a `#fragment`), and nested `<topic>` children.
//!
//! Parser policy: nested `<topic>` trees are descended in full (the recursive
//! variant). Any non-`topic` element encountered at an expected level bumps a
//! skip-depth counter instead of becoming a child, so wrapper dialects parse
//! cleanly.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::descriptor::{attribute, required_attribute};
use crate::DocshelfError;

/// One node of the navigation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub label: String,
    /// Page-relative link target; absent on pure grouping nodes.
    pub href: Option<String>,
    pub children: Vec<TocEntry>,
}

/// A bundle's top-level table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toc {
    pub root: TocEntry,
}

/// Parses a TOC descriptor document.
pub fn parse(xml: &str) -> Result<Toc, DocshelfError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                expect_toc_root(&e)?;
                let label = attribute(&e, b"label")?.unwrap_or_default();
                let href = attribute(&e, b"topic")?;
                let children = parse_children(&mut reader)?;
                return Ok(Toc { root: TocEntry { label, href, children } });
            }
            Event::Empty(e) => {
                expect_toc_root(&e)?;
                let label = attribute(&e, b"label")?.unwrap_or_default();
                let href = attribute(&e, b"topic")?;
                return Ok(Toc { root: TocEntry { label, href, children: Vec::new() } });
            }
            Event::Eof => {
                return Err(DocshelfError::MalformedDescriptor(
                    "expecting a start element".into(),
                ))
            }
            _ => {}
        }
    }
}

fn expect_toc_root(e: &BytesStart<'_>) -> Result<(), DocshelfError> {
    if e.local_name().as_ref() != b"toc" {
        return Err(DocshelfError::MalformedDescriptor(format!(
            "expecting a <toc> root element, found <{}>",
            String::from_utf8_lossy(e.local_name().as_ref())
        )));
    }
    Ok(())
}

/// Consumes first-level `<topic>` children of the element just opened, up to
/// and including its end tag.
fn parse_children(reader: &mut Reader<&[u8]>) -> Result<Vec<TocEntry>, DocshelfError> {
    let mut children = Vec::new();
    let mut skip_depth = 0u32;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if skip_depth == 0 && e.local_name().as_ref() == b"topic" {
                    let label = required_attribute(&e, "label")?;
                    let href = attribute(&e, b"href")?;
                    let nested = parse_children(reader)?;
                    children.push(TocEntry { label, href, children: nested });
                } else {
                    skip_depth += 1;
                }
            }
            Event::Empty(e) => {
                if skip_depth == 0 && e.local_name().as_ref() == b"topic" {
                    let label = required_attribute(&e, "label")?;
                    let href = attribute(&e, b"href")?;
                    children.push(TocEntry { label, href, children: Vec::new() });
                }
            }
            Event::End(_) => {
                if skip_depth == 0 {
                    return Ok(children);
                }
                skip_depth -= 1;
            }
            Event::Eof => {
                return Err(DocshelfError::MalformedDescriptor(
                    "unterminated <toc> document".into(),
                ))
            }
            _ => {}
        }
    }
}

/// Serializes a TOC back to its descriptor form. `parse(serialize(t)) == t`
/// on label, href and children.
pub fn serialize(toc: &Toc) -> Result<String, DocshelfError> {
    let mut writer = Writer::new(Vec::new());
    let mut root = BytesStart::new("toc");
    root.push_attribute(("label", toc.root.label.as_str()));
    if let Some(href) = &toc.root.href {
        root.push_attribute(("topic", href.as_str()));
    }
    writer.write_event(Event::Start(root))?;
    for child in &toc.root.children {
        write_topic(&mut writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new("toc")))?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| DocshelfError::Other(Box::new(e)))
}

fn write_topic(writer: &mut Writer<Vec<u8>>, entry: &TocEntry) -> Result<(), DocshelfError> {
    let mut elem = BytesStart::new("topic");
    elem.push_attribute(("label", entry.label.as_str()));
    if let Some(href) = &entry.href {
        elem.push_attribute(("href", href.as_str()));
    }
    if entry.children.is_empty() {
        writer.write_event(Event::Empty(elem))?;
    } else {
        writer.write_event(Event::Start(elem))?;
        for child in &entry.children {
            write_topic(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new("topic")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_topics_in_order() {
        let xml = r#"<?xml version="1.0"?>
            <toc label="Guide" topic="index.html">
                <topic label="Intro" href="intro.html">
                    <topic label="Why" href="intro.html#why"/>
                </topic>
                <topic label="FAQ" href="faq.html"/>
            </toc>"#;
        let toc = parse(xml).unwrap();
        assert_eq!(toc.root.label, "Guide");
        assert_eq!(toc.root.href.as_deref(), Some("index.html"));
        assert_eq!(toc.root.children.len(), 2);
        assert_eq!(toc.root.children[0].label, "Intro");
        assert_eq!(toc.root.children[0].children[0].href.as_deref(), Some("intro.html#why"));
        assert_eq!(toc.root.children[1].label, "FAQ");
    }

    #[test]
    fn grouping_nodes_have_no_href() {
        let xml = r#"<toc label="Guide"><topic label="Part One"><topic label="A" href="a.html"/></topic></toc>"#;
        let toc = parse(xml).unwrap();
        assert_eq!(toc.root.href, None);
        assert_eq!(toc.root.children[0].href, None);
        assert_eq!(toc.root.children[0].children.len(), 1);
    }

    #[test]
    fn unknown_wrapper_elements_are_depth_skipped() {
        // A dialect that wraps extra markup around and inside topics. The
        // wrapper's nested topics are swallowed by the skip, not adopted.
        let xml = r#"<toc label="Guide">
                <anchor id="extras"><topic label="Hidden" href="h.html"/></anchor>
                <topic label="Visible" href="v.html"/>
            </toc>"#;
        let toc = parse(xml).unwrap();
        assert_eq!(toc.root.children.len(), 1);
        assert_eq!(toc.root.children[0].label, "Visible");
    }

    #[test]
    fn wrong_root_element_is_rejected() {
        let err = parse("<index></index>").unwrap_err();
        assert!(err.to_string().contains("<toc>"));
    }

    #[test]
    fn missing_label_on_topic_is_rejected() {
        let err = parse(r#"<toc label="G"><topic href="a.html"/></toc>"#).unwrap_err();
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn unterminated_document_is_rejected() {
        assert!(parse(r#"<toc label="G"><topic label="A""#).is_err());
    }

    #[test]
    fn serialize_parse_round_trip() {
        let toc = Toc {
            root: TocEntry {
                label: "Guide".into(),
                href: Some("index.html".into()),
                children: vec![
                    TocEntry {
                        label: "Intro".into(),
                        href: Some("intro.html".into()),
                        children: vec![TocEntry {
                            label: "Why \"quotes\" & ampersands".into(),
                            href: Some("intro.html#why".into()),
                            children: Vec::new(),
                        }],
                    },
                    TocEntry { label: "Group".into(), href: None, children: Vec::new() },
                ],
            },
        };
        let xml = serialize(&toc).unwrap();
        assert_eq!(parse(&xml).unwrap(), toc);
    }
}

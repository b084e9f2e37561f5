//! Keyword-index descriptor: labeled keywords pointing at pages, used for
//! topic lookup by key (full-text search is handled elsewhere).
//!
//! Expected shape: an `<index>` root with `<entry keyword="...">` elements;
//! an entry may carry a `<topic href="..."/>` child naming its target and
//! nested `<entry>` children. Every parsed entry is stamped with the owning
//! bundle's key so a federated lookup can report where a match came from.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::descriptor::{attribute, required_attribute};
use crate::DocshelfError;

/// One keyword node of a bundle's index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub keyword: String,
    /// The bundle this entry was loaded from.
    pub bundle_key: String,
    /// Target page, absent on grouping keywords.
    pub target_href: Option<String>,
    pub children: Vec<IndexEntry>,
}

/// Parses an index descriptor, stamping each entry with `bundle_key`.
pub fn parse(bundle_key: &str, xml: &str) -> Result<Vec<IndexEntry>, DocshelfError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() != b"index" {
                    return Err(DocshelfError::MalformedDescriptor(format!(
                        "expecting an <index> root element, found <{}>",
                        String::from_utf8_lossy(e.local_name().as_ref())
                    )));
                }
                return parse_entries(&mut reader, bundle_key);
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"index" {
                    return Ok(Vec::new());
                }
                return Err(DocshelfError::MalformedDescriptor(
                    "expecting an <index> root element".into(),
                ));
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

/// Consumes `<entry>` children of the element just opened, up to and
/// including its end tag. An entry's first `<topic>` child supplies the
/// target; unknown elements are depth-skipped.
fn parse_entries(
    reader: &mut Reader<&[u8]>,
    bundle_key: &str,
) -> Result<Vec<IndexEntry>, DocshelfError> {
    let mut entries = Vec::new();
    let mut skip_depth = 0u32;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if skip_depth == 0 && e.local_name().as_ref() == b"entry" {
                    let keyword = required_attribute(&e, "keyword")?;
                    let mut entry = IndexEntry {
                        keyword,
                        bundle_key: bundle_key.to_string(),
                        target_href: None,
                        children: Vec::new(),
                    };
                    parse_entry_body(reader, bundle_key, &mut entry)?;
                    entries.push(entry);
                } else {
                    skip_depth += 1;
                }
            }
            Event::Empty(e) => {
                if skip_depth == 0 && e.local_name().as_ref() == b"entry" {
                    let keyword = required_attribute(&e, "keyword")?;
                    entries.push(IndexEntry {
                        keyword,
                        bundle_key: bundle_key.to_string(),
                        target_href: None,
                        children: Vec::new(),
                    });
                }
            }
            Event::End(_) => {
                if skip_depth == 0 {
                    return Ok(entries);
                }
                skip_depth -= 1;
            }
            Event::Eof => {
                return Err(DocshelfError::MalformedDescriptor(
                    "unterminated <index> document".into(),
                ))
            }
            _ => {}
        }
    }
}

fn parse_entry_body(
    reader: &mut Reader<&[u8]>,
    bundle_key: &str,
    entry: &mut IndexEntry,
) -> Result<(), DocshelfError> {
    let mut skip_depth = 0u32;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if skip_depth == 0 && e.local_name().as_ref() == b"entry" {
                    let keyword = required_attribute(&e, "keyword")?;
                    let mut child = IndexEntry {
                        keyword,
                        bundle_key: bundle_key.to_string(),
                        target_href: None,
                        children: Vec::new(),
                    };
                    parse_entry_body(reader, bundle_key, &mut child)?;
                    entry.children.push(child);
                } else if skip_depth == 0 && e.local_name().as_ref() == b"topic" {
                    if entry.target_href.is_none() {
                        entry.target_href = attribute(&e, b"href")?;
                    }
                    skip_depth += 1;
                } else {
                    skip_depth += 1;
                }
            }
            Event::Empty(e) => {
                if skip_depth == 0 {
                    if e.local_name().as_ref() == b"entry" {
                        let keyword = required_attribute(&e, "keyword")?;
                        entry.children.push(IndexEntry {
                            keyword,
                            bundle_key: bundle_key.to_string(),
                            target_href: None,
                            children: Vec::new(),
                        });
                    } else if e.local_name().as_ref() == b"topic" && entry.target_href.is_none() {
                        entry.target_href = attribute(&e, b"href")?;
                    }
                }
            }
            Event::End(_) => {
                if skip_depth == 0 {
                    return Ok(());
                }
                skip_depth -= 1;
            }
            Event::Eof => {
                return Err(DocshelfError::MalformedDescriptor(
                    "unterminated <entry> element".into(),
                ))
            }
            _ => {}
        }
    }
}

//! Plugin descriptor: the extension-point list that names a bundle's other
//! descriptor files.
//!
//! Expected shape: a `<plugin>` root with first-level
//! `<extension point="...">` elements; inside an extension, each child element
//! contributes its name and `file` attribute (e.g. `<toc file="toc.xml"/>`).
//! Deeper or unknown markup is depth-skipped.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::descriptor::{attribute, required_attribute};
use crate::DocshelfError;

/// One declared extension and the files it references, keyed by the child
/// element name that carried them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub point: String,
    files: HashMap<String, String>,
}

impl Extension {
    /// The file reference contributed by the child element named `name`.
    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

/// A parsed plugin descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    extensions: Vec<Extension>,
}

impl Plugin {
    /// The first extension declared for `point`, if any.
    pub fn extension(&self, point: &str) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.point == point)
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }
}

/// Parses a plugin descriptor document.
pub fn parse(xml: &str) -> Result<Plugin, DocshelfError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() != b"plugin" {
                    return Err(DocshelfError::MalformedDescriptor(format!(
                        "expecting a <plugin> root element, found <{}>",
                        String::from_utf8_lossy(e.local_name().as_ref())
                    )));
                }
                return parse_extensions(&mut reader);
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"plugin" {
                    return Ok(Plugin { extensions: Vec::new() });
                }
                return Err(DocshelfError::MalformedDescriptor(
                    "expecting a <plugin> root element".into(),
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

fn parse_extensions(reader: &mut Reader<&[u8]>) -> Result<Plugin, DocshelfError> {
    let mut extensions = Vec::new();
    let mut skip_depth = 0u32;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if skip_depth == 0 && e.local_name().as_ref() == b"extension" {
                    let point = required_attribute(&e, "point")?;
                    let files = parse_extension_files(reader)?;
                    extensions.push(Extension { point, files });
                } else {
                    skip_depth += 1;
                }
            }
            Event::Empty(e) => {
                if skip_depth == 0 && e.local_name().as_ref() == b"extension" {
                    let point = required_attribute(&e, "point")?;
                    extensions.push(Extension { point, files: HashMap::new() });
                }
            }
            Event::End(_) => {
                if skip_depth == 0 {
                    return Ok(Plugin { extensions });
                }
                skip_depth -= 1;
            }
            Event::Eof => {
                return Err(DocshelfError::MalformedDescriptor(
                    "unterminated <plugin> document".into(),
                ))
            }
            _ => {}
        }
    }
}

/// Collects `element name -> file attribute` for the extension just opened.
fn parse_extension_files(
    reader: &mut Reader<&[u8]>,
) -> Result<HashMap<String, String>, DocshelfError> {
    let mut files = HashMap::new();
    let mut skip_depth = 0u32;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if skip_depth == 0 {
                    if let Some(file) = attribute(&e, b"file")? {
                        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                        files.entry(name).or_insert(file);
                    }
                }
                skip_depth += 1;
            }
            Event::Empty(e) => {
                if skip_depth == 0 {
                    if let Some(file) = attribute(&e, b"file")? {
                        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                        files.entry(name).or_insert(file);
                    }
                }
            }
            Event::End(_) => {
                if skip_depth == 0 {
                    return Ok(files);
                }
                skip_depth -= 1;
            }
            Event::Eof => {
                return Err(DocshelfError::MalformedDescriptor(
                    "unterminated <extension> element".into(),
                ))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLUGIN_XML: &str = r#"<?xml version="1.0"?>
        <plugin>
            <extension point="org.eclipse.help.toc">
                <toc file="toc.xml" primary="true"/>
            </extension>
            <extension point="org.eclipse.help.index">
                <index file="index.xml"/>
            </extension>
        </plugin>"#;

    #[test]
    fn finds_extension_files_by_point() {
        let plugin = parse(PLUGIN_XML).unwrap();
        let toc = plugin.extension("org.eclipse.help.toc").unwrap();
        assert_eq!(toc.file("toc"), Some("toc.xml"));
        assert_eq!(toc.file("index"), None);
        let index = plugin.extension("org.eclipse.help.index").unwrap();
        assert_eq!(index.file("index"), Some("index.xml"));
        assert!(plugin.extension("org.example.unknown").is_none());
    }

    #[test]
    fn unknown_markup_is_tolerated() {
        let xml = r#"<plugin>
            <requires><import plugin="other"/></requires>
            <extension point="org.eclipse.help.toc">
                <description>extra<b>rich</b>text</description>
                <toc file="toc.xml"/>
            </extension>
        </plugin>"#;
        let plugin = parse(xml).unwrap();
        assert_eq!(plugin.extensions().len(), 1);
        assert_eq!(
            plugin.extension("org.eclipse.help.toc").unwrap().file("toc"),
            Some("toc.xml")
        );
    }

    #[test]
    fn extension_without_point_is_rejected() {
        let err = parse(r#"<plugin><extension><toc file="t.xml"/></extension></plugin>"#)
            .unwrap_err();
        assert!(err.to_string().contains("point"));
    }

    #[test]
    fn wrong_root_is_rejected() {
        assert!(parse("<toc label=\"x\"/>").is_err());
    }
}

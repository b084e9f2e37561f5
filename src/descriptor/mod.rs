//! # Descriptor Parsers
//!
//! Three independent parsers turn a bundle's XML descriptors into typed trees:
//!
//! - [`plugin`]: the extension-point list that names the other descriptor files.
//! - [`toc`]: the recursive table-of-contents tree.
//! - [`index`]: the flat-ish keyword index used for topic lookup.
//!
//! All three share the same tolerance policy: a single forward pass over the
//! event stream, and any element nested deeper than the expected schema is
//! skipped by depth counting rather than rejected, so descriptor dialects with
//! extra wrapper markup keep parsing. Structural violations (wrong root
//! element, missing required attribute, unterminated stream) surface as
//! [`DocshelfError::MalformedDescriptor`](crate::DocshelfError::MalformedDescriptor).

pub mod index;
pub mod plugin;
pub mod toc;

use quick_xml::events::BytesStart;

use crate::DocshelfError;

/// Fetches a named attribute off an element, unescaping its value.
pub(crate) fn attribute(
    element: &BytesStart<'_>,
    name: &[u8],
) -> Result<Option<String>, DocshelfError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| {
            DocshelfError::MalformedDescriptor(format!("bad attribute: {}", e))
        })?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| DocshelfError::MalformedDescriptor(format!("bad attribute value: {}", e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Fetches a required attribute, failing with the element name in the reason.
pub(crate) fn required_attribute(
    element: &BytesStart<'_>,
    name: &str,
) -> Result<String, DocshelfError> {
    attribute(element, name.as_bytes())?.ok_or_else(|| {
        DocshelfError::MalformedDescriptor(format!(
            "<{}> element is missing the required '{}' attribute",
            String::from_utf8_lossy(element.local_name().as_ref()),
            name
        ))
    })
}

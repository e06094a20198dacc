//! The XML parts documents read and write themselves.
//!
//! Everything else in a package is carried through untouched.

pub mod core_xml;
pub mod styles_xml;
pub mod template;
pub mod theme_xml;
pub mod workbook_xml;

use std::fmt::Display;

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};

use crate::common::{Error, Result};

/// Error for a part whose XML cannot be understood.
pub(crate) fn malformed(part: &str, err: impl Display) -> Error {
    Error::MalformedBuffer(format!("{}: {}", part, err))
}

/// Collect the text of the element whose start tag was just read, up to and
/// including its end tag. Text of nested elements is included.
pub(crate) fn read_text(reader: &mut Reader<&[u8]>, part: &str) -> Result<String> {
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event().map_err(|e| malformed(part, e))? {
            Event::Text(e) => {
                text.push_str(std::str::from_utf8(e.as_ref()).map_err(|e| malformed(part, e))?)
            },
            Event::CData(e) => {
                text.push_str(std::str::from_utf8(e.as_ref()).map_err(|e| malformed(part, e))?)
            },
            Event::GeneralRef(e) => text.push_str(&resolve_reference(&e, part)?),
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(malformed(part, "unexpected end of document")),
            _ => {},
        }
    }

    Ok(text)
}

/// Expand `&name;` or `&#N;` appearing in text content.
fn resolve_reference(reference: &BytesRef<'_>, part: &str) -> Result<String> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| malformed(part, e))?
    {
        return Ok(ch.to_string());
    }

    let name = std::str::from_utf8(reference).map_err(|e| malformed(part, e))?;
    resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| malformed(part, format!("unknown entity &{};", name)))
}

/// The `prefix:` of a qualified element name, or an empty string.
pub(crate) fn prefix_of(qualified: &[u8]) -> &str {
    qualified
        .iter()
        .position(|&b| b == b':')
        .and_then(|pos| std::str::from_utf8(&qualified[..=pos]).ok())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(xml: &str) -> Result<String> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event().map_err(|e| malformed("test", e))? {
                Event::Start(_) => return read_text(&mut reader, "test"),
                Event::Eof => return Err(malformed("test", "no element")),
                _ => {},
            }
        }
    }

    #[test]
    fn test_read_text_resolves_references() {
        assert_eq!(
            text_of("<t>Q1 &amp; Q2 &#x263A; &lt;draft&gt;</t>").unwrap(),
            "Q1 & Q2 \u{263A} <draft>"
        );
    }

    #[test]
    fn test_read_text_keeps_inner_whitespace_and_cdata() {
        assert_eq!(text_of("<t>  a <![CDATA[<b>]]> c </t>").unwrap(), "  a <b> c ");
    }

    #[test]
    fn test_read_text_unterminated() {
        assert!(matches!(text_of("<t>open"), Err(Error::MalformedBuffer(_))));
    }

    #[test]
    fn test_prefix_of() {
        assert_eq!(prefix_of(b"a:dk1"), "a:");
        assert_eq!(prefix_of(b"sheets"), "");
    }
}

//! `docProps/core.xml`: core document properties.
//!
//! Dublin Core title, subject, description and creator plus the OPC
//! `keywords` (tags) and `category`, and the created/modified timestamps.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use super::{malformed, read_text};
use crate::common::Result;
use crate::models::CoreProperties;

const PART: &str = "core properties";

/// Separator written between tags in `cp:keywords`.
const TAG_SEPARATOR: &str = ", ";

/// Contents of a core properties part.
#[derive(Debug, Clone)]
pub struct CorePart {
    pub properties: CoreProperties,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl CorePart {
    /// Parse a core properties part.
    ///
    /// Unknown elements are ignored; unparsable timestamps are dropped with
    /// a warning.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut properties = CoreProperties::new();
        let mut created = None;
        let mut modified = None;

        loop {
            match reader.read_event().map_err(|e| malformed(PART, e))? {
                Event::Start(e) => {
                    let name = e.local_name();
                    match name.as_ref() {
                        b"title" => properties.set_title(read_text(&mut reader, PART)?)?,
                        b"subject" => properties.set_subject(read_text(&mut reader, PART)?)?,
                        b"description" => {
                            properties.set_description(read_text(&mut reader, PART)?)?
                        },
                        b"creator" => properties.set_creator(read_text(&mut reader, PART)?)?,
                        b"category" => properties.set_category(read_text(&mut reader, PART)?)?,
                        b"keywords" => {
                            properties.set_tags(split_tags(&read_text(&mut reader, PART)?))?
                        },
                        b"created" => created = parse_datetime(&read_text(&mut reader, PART)?),
                        b"modified" => modified = parse_datetime(&read_text(&mut reader, PART)?),
                        _ => {},
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        Ok(Self {
            properties,
            created,
            modified,
        })
    }

    /// Whether `record` carries what this part carries, as far as the XML
    /// can express it.
    ///
    /// A record that disagrees was saved before the part was edited by
    /// another producer.
    pub fn agrees_with(&self, record: &CoreProperties) -> Result<bool> {
        let projected = CorePart {
            properties: record.clone(),
            created: None,
            modified: None,
        };
        let projected = CorePart::parse(&projected.to_xml()?)?;
        Ok(fields(&projected.properties)? == fields(&self.properties)?)
    }

    /// Serialize as a core properties part. Empty fields are omitted;
    /// `lastModifiedBy` repeats the creator.
    pub fn to_xml(&self) -> Result<String> {
        let props = &self.properties;
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(concat!(
            r#"<cp:coreProperties"#,
            r#" xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties""#,
            r#" xmlns:dc="http://purl.org/dc/elements/1.1/""#,
            r#" xmlns:dcterms="http://purl.org/dc/terms/""#,
            r#" xmlns:dcmitype="http://purl.org/dc/dcmitype/""#,
            r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
        ));

        let creator = props.creator()?;
        push_element(&mut xml, "dc:title", &props.title()?);
        push_element(&mut xml, "dc:subject", &props.subject()?);
        push_element(&mut xml, "dc:creator", &creator);
        push_element(&mut xml, "cp:keywords", &props.tags()?.join(TAG_SEPARATOR));
        push_element(&mut xml, "dc:description", &props.description()?);
        push_element(&mut xml, "cp:lastModifiedBy", &creator);
        for (name, stamp) in [
            ("dcterms:created", self.created),
            ("dcterms:modified", self.modified),
        ] {
            if let Some(stamp) = stamp {
                xml.push_str(&format!(
                    r#"<{0} xsi:type="dcterms:W3CDTF">{1}</{0}>"#,
                    name,
                    stamp.to_rfc3339_opts(SecondsFormat::Secs, true)
                ));
            }
        }
        push_element(&mut xml, "cp:category", &props.category()?);

        xml.push_str("</cp:coreProperties>");
        Ok(xml)
    }
}

type Fields = (String, String, String, Vec<String>, String, String);

fn fields(props: &CoreProperties) -> Result<Fields> {
    Ok((
        props.title()?,
        props.subject()?,
        props.description()?,
        props.tags()?,
        props.category()?,
        props.creator()?,
    ))
}

fn push_element(xml: &mut String, name: &str, value: &str) {
    if !value.is_empty() {
        xml.push_str(&format!("<{0}>{1}</{0}>", name, escape(value)));
    }
}

/// Tags are stored comma-separated; semicolons written by other producers
/// are accepted too.
fn split_tags(keywords: &str) -> Vec<String> {
    keywords
        .split([',', ';'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a W3CDTF timestamp such as `2024-05-01T09:30:00Z`.
fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    tracing::warn!("ignoring unparsable timestamp {:?} in core properties", text);
    None
}

//! Sheet list and active tab of `xl/workbook.xml`.
//!
//! The workbook part holds much more (defined names, calculation settings,
//! pivot caches). Saving rewrites `<sheets>` and the first `<workbookView>`,
//! points defined names at renamed sheets, and copies everything else
//! through.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{malformed, prefix_of, read_text};
use crate::common::Result;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::xlsx::SheetState;

const PART: &str = "workbook";

/// One `<sheet>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub state: SheetState,
    /// Relationship from the workbook part to the worksheet part
    pub r_id: String,
}

/// What the workbook part says about its sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookInfo {
    pub sheets: Vec<SheetEntry>,
    /// Index into `sheets` of the sheet shown on open
    pub active_tab: usize,
}

pub fn parse(xml: &str) -> Result<WorkbookInfo> {
    let mut reader = Reader::from_str(xml);
    let mut info = WorkbookInfo::default();
    let mut seen_view = false;

    loop {
        match reader.read_event().map_err(|e| malformed(PART, e))? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"sheet" => info.sheets.push(sheet_entry(&e)?),
                b"workbookView" if !seen_view => {
                    seen_view = true;
                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| malformed(PART, err))?;
                        if attr.key.local_name().as_ref() == b"activeTab" {
                            let value = attr.unescape_value().map_err(|err| malformed(PART, err))?;
                            info.active_tab = value.trim().parse().map_err(|_| {
                                malformed(PART, format!("invalid activeTab {:?}", value))
                            })?;
                        }
                    }
                },
                _ => {},
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(info)
}

fn sheet_entry(e: &BytesStart<'_>) -> Result<SheetEntry> {
    let mut name = None;
    let mut sheet_id = None;
    let mut state = SheetState::Visible;
    let mut r_id = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(PART, err))?;
        let value = attr.unescape_value().map_err(|err| malformed(PART, err))?;
        match (attr.key.prefix().is_some(), attr.key.local_name().as_ref()) {
            (false, b"name") => name = Some(value.into_owned()),
            (false, b"sheetId") => {
                sheet_id = Some(value.trim().parse::<u32>().map_err(|_| {
                    malformed(PART, format!("invalid sheetId {:?}", value))
                })?)
            },
            (false, b"state") => {
                state = SheetState::from_xml(&value)
                    .ok_or_else(|| malformed(PART, format!("invalid sheet state {:?}", value)))?
            },
            (true, b"id") => r_id = Some(value.into_owned()),
            _ => {},
        }
    }

    let missing = |what: &str| malformed(PART, format!("<sheet> without {}", what));
    Ok(SheetEntry {
        name: name.ok_or_else(|| missing("name"))?,
        sheet_id: sheet_id.ok_or_else(|| missing("sheetId"))?,
        state,
        r_id: r_id.ok_or_else(|| missing("r:id"))?,
    })
}

/// Copy `xml`, replacing the sheet list with `sheets` and the active tab
/// with `active_tab`. `renames` pairs the name each sheet had in `xml` with
/// its new name; references to those sheets in `<definedName>` formulas
/// follow the rename.
///
/// A `<bookViews>` element is inserted before `<sheets>` when the workbook
/// has none, and the relationships namespace is declared on the root when
/// missing.
pub fn patch(
    xml: &str,
    sheets: &[SheetEntry],
    active_tab: usize,
    renames: &[(String, String)],
) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 64 * sheets.len()));
    let io = |e: std::io::Error| malformed(PART, e);

    let mut rel_prefix: Option<String> = None;
    let mut seen_view = false;

    loop {
        match reader.read_event().map_err(|e| malformed(PART, e))? {
            Event::Start(e) if rel_prefix.is_none() => {
                let (root, prefix) = declare_relationships(&e)?;
                rel_prefix = Some(prefix);
                writer.write_event(Event::Start(root)).map_err(io)?;
            },
            Event::Start(e) if e.local_name().as_ref() == b"sheets" => {
                reader
                    .read_to_end(e.name())
                    .map_err(|err| malformed(PART, err))?;
                if !seen_view {
                    write_book_views(&mut writer, prefix_of(e.name().as_ref()), active_tab)?;
                    seen_view = true;
                }
                write_sheets(&mut writer, &e, rel_prefix.as_deref().unwrap_or("r"), sheets)?;
            },
            Event::Empty(e) if e.local_name().as_ref() == b"sheets" => {
                if !seen_view {
                    write_book_views(&mut writer, prefix_of(e.name().as_ref()), active_tab)?;
                    seen_view = true;
                }
                write_sheets(&mut writer, &e, rel_prefix.as_deref().unwrap_or("r"), sheets)?;
            },
            Event::Start(e) if e.local_name().as_ref() == b"workbookView" && !seen_view => {
                seen_view = true;
                writer
                    .write_event(Event::Start(with_active_tab(&e, active_tab)?))
                    .map_err(io)?;
            },
            Event::Empty(e) if e.local_name().as_ref() == b"workbookView" && !seen_view => {
                seen_view = true;
                writer
                    .write_event(Event::Empty(with_active_tab(&e, active_tab)?))
                    .map_err(io)?;
            },
            Event::Start(e) if e.local_name().as_ref() == b"definedName" && !renames.is_empty() => {
                let qualified = std::str::from_utf8(e.name().as_ref())
                    .map_err(|err| malformed(PART, err))?
                    .to_string();
                let formula = rename_sheet_refs(&read_text(&mut reader, PART)?, renames);
                writer.write_event(Event::Start(e)).map_err(io)?;
                writer
                    .write_event(Event::Text(BytesText::from_escaped(partial_escape(&formula))))
                    .map_err(io)?;
                writer
                    .write_event(Event::End(BytesEnd::new(qualified)))
                    .map_err(io)?;
            },
            Event::Eof => break,
            event => writer.write_event(event).map_err(io)?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| malformed(PART, e))
}

/// Rewrite the sheet prefixes of the references in `formula` (`Q1!A1`,
/// `'Q1 (final)'!A1`, `Jan:Mar!A1`) according to `renames`.
///
/// String literals and error values such as `#REF!` are left alone.
pub fn rename_sheet_refs(formula: &str, renames: &[(String, String)]) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                let end = literal_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            },
            '\'' => {
                let end = literal_end(&chars, i);
                let quoted: String = chars[i..end].iter().collect();
                let renamed = (chars.get(end) == Some(&'!'))
                    .then(|| rename_range(&unquote(&quoted), renames))
                    .flatten();
                match renamed {
                    Some(name) => out.push_str(&quote(&name)),
                    None => out.push_str(&quoted),
                }
                i = end;
            },
            c if is_name_char(c) => {
                let start = i;
                while i < chars.len() && (is_name_char(chars[i]) || chars[i] == ':') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let renamed = (chars.get(i) == Some(&'!') && !out.ends_with('#'))
                    .then(|| rename_range(&word, renames))
                    .flatten();
                match renamed {
                    Some(name) if needs_quotes(&name) => out.push_str(&quote(&name)),
                    Some(name) => out.push_str(&name),
                    None => out.push_str(&word),
                }
            },
            c => {
                out.push(c);
                i += 1;
            },
        }
    }
    out
}

/// Rename a sheet name or a `First:Last` sheet range; `None` when no part
/// of it was renamed.
fn rename_range(range: &str, renames: &[(String, String)]) -> Option<String> {
    let lookup = |name: &str| {
        renames
            .iter()
            .find(|(from, _)| from == name)
            .map(|(_, to)| to.as_str())
    };
    let mut changed = false;
    let parts: Vec<&str> = range
        .split(':')
        .map(|name| match lookup(name) {
            Some(to) => {
                changed = true;
                to
            },
            None => name,
        })
        .collect();
    changed.then(|| parts.join(":"))
}

/// Index just past the literal opened at `start`; a doubled quote
/// character inside is an escaped quote.
fn literal_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn unquote(quoted: &str) -> String {
    quoted
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(quoted)
        .replace("''", "'")
}

fn quote(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Whether a sheet name must be quoted in a reference: anything beyond
/// letters, digits, `_` and `.`, a leading digit, or a name that reads as a
/// cell reference.
fn needs_quotes(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return true;
    };
    if first.is_ascii_digit() || !name.chars().all(is_name_char) {
        return true;
    }
    let letters = name.chars().take_while(char::is_ascii_alphabetic).count();
    letters > 0
        && letters < name.len()
        && name[letters..].chars().all(|c| c.is_ascii_digit())
}

/// The root start tag, with the relationships namespace declared, and the
/// prefix bound to it.
fn declare_relationships(root: &BytesStart<'_>) -> Result<(BytesStart<'static>, String)> {
    for attr in root.attributes() {
        let attr = attr.map_err(|err| malformed(PART, err))?;
        let key = attr.key.as_ref();
        if let Some(prefix) = key.strip_prefix(b"xmlns:")
            && attr.value.as_ref() == namespace::OFC_RELATIONSHIPS.as_bytes()
        {
            let prefix = std::str::from_utf8(prefix).map_err(|e| malformed(PART, e))?;
            return Ok((root.clone().into_owned(), prefix.to_string()));
        }
    }

    let mut root = root.clone().into_owned();
    root.push_attribute(("xmlns:r", namespace::OFC_RELATIONSHIPS));
    Ok((root, "r".to_string()))
}

fn with_active_tab(view: &BytesStart<'_>, active_tab: usize) -> Result<BytesStart<'static>> {
    let name = std::str::from_utf8(view.name().as_ref())
        .map_err(|e| malformed(PART, e))?
        .to_string();
    let mut out = BytesStart::new(name);
    for attr in view.attributes() {
        let attr = attr.map_err(|err| malformed(PART, err))?;
        if attr.key.local_name().as_ref() != b"activeTab" {
            out.push_attribute(attr);
        }
    }
    out.push_attribute(("activeTab", active_tab.to_string().as_str()));
    Ok(out.into_owned())
}

fn write_book_views(writer: &mut Writer<Vec<u8>>, prefix: &str, active_tab: usize) -> Result<()> {
    let io = |e: std::io::Error| malformed(PART, e);
    let book_views = format!("{}bookViews", prefix);
    let view = format!("{}workbookView", prefix);
    let tab = active_tab.to_string();

    writer
        .write_event(Event::Start(BytesStart::new(book_views.as_str())))
        .map_err(io)?;
    writer
        .write_event(Event::Empty(
            BytesStart::new(view.as_str()).with_attributes([("activeTab", tab.as_str())]),
        ))
        .map_err(io)?;
    writer
        .write_event(Event::End(BytesEnd::new(book_views.as_str())))
        .map_err(io)?;
    Ok(())
}

fn write_sheets(
    writer: &mut Writer<Vec<u8>>,
    sheets_start: &BytesStart<'_>,
    rel_prefix: &str,
    sheets: &[SheetEntry],
) -> Result<()> {
    let io = |e: std::io::Error| malformed(PART, e);
    let qualified = sheets_start.name();
    let sheets_name = std::str::from_utf8(qualified.as_ref()).map_err(|e| malformed(PART, e))?;
    let sheet_name = format!("{}sheet", prefix_of(qualified.as_ref()));
    let id_attr = format!("{}:id", rel_prefix);

    let mut start = BytesStart::new(sheets_name);
    start.extend_attributes(sheets_start.attributes().filter_map(|a| a.ok()));
    writer.write_event(Event::Start(start)).map_err(io)?;

    for sheet in sheets {
        let sheet_id = sheet.sheet_id.to_string();
        let mut element = BytesStart::new(sheet_name.as_str());
        element.push_attribute(("name", sheet.name.as_str()));
        element.push_attribute(("sheetId", sheet_id.as_str()));
        if sheet.state != SheetState::Visible {
            element.push_attribute(("state", sheet.state.as_xml()));
        }
        element.push_attribute((id_attr.as_str(), sheet.r_id.as_str()));
        writer.write_event(Event::Empty(element)).map_err(io)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(sheets_name)))
        .map_err(io)?;
    Ok(())
}

//! Theme colour scheme (`a:clrScheme`) inside a theme part.
//!
//! Only the twelve scheme colours are interpreted. Saving rewrites the
//! scheme slots the caller changed and copies everything else, other slots
//! included, unchanged.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::{malformed, prefix_of};
use crate::common::Result;
use crate::models::{PropertyModel, ThemeColor, ThemePalette, ThemeSlot};
use crate::schema::TableBuilder;

const PART: &str = "theme";

/// Read the colour scheme of a theme part into a palette.
///
/// Every slot found is stored explicitly. `a:sysClr` slots use their
/// `lastClr` value; slots using other colour models are left unset. The
/// palette starts without changes, so [`apply_palette`] leaves the part as
/// it is until a slot is set.
pub fn parse_palette(xml: &str) -> Result<ThemePalette> {
    let mut reader = Reader::from_str(xml);
    let mut colors = TableBuilder::new();
    let mut in_scheme = false;
    let mut current: Option<ThemeSlot> = None;

    loop {
        match reader.read_event().map_err(|e| malformed(PART, e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"clrScheme" => in_scheme = true,
                name if in_scheme => {
                    if let Some(slot) = std::str::from_utf8(name).ok().and_then(ThemeSlot::from_xml_name) {
                        current = Some(slot);
                    } else if let Some(slot) = current
                        && let Some(color) = color_of(&e)?
                    {
                        colors.set(slot.vt(), &color)?;
                    }
                },
                _ => {},
            },
            Event::Empty(e) if in_scheme => {
                if let Some(slot) = current
                    && let Some(color) = color_of(&e)?
                {
                    colors.set(slot.vt(), &color)?;
                }
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"clrScheme" => break,
                name if in_scheme => {
                    if current.is_some_and(|slot| slot.xml_name().as_bytes() == name) {
                        current = None;
                    }
                },
                _ => {},
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(ThemePalette::from_bytes(colors.finish()?)?)
}

/// Colour carried by an `a:srgbClr` or `a:sysClr` element.
fn color_of(e: &BytesStart<'_>) -> Result<Option<ThemeColor>> {
    let attr_name: &[u8] = match e.local_name().as_ref() {
        b"srgbClr" => b"val",
        b"sysClr" => b"lastClr",
        _ => return Ok(None),
    };

    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(PART, err))?;
        if attr.key.local_name().as_ref() == attr_name {
            let value = attr.unescape_value().map_err(|err| malformed(PART, err))?;
            return ThemeColor::from_hex(&value)
                .map(Some)
                .ok_or_else(|| malformed(PART, format!("invalid colour {:?}", value)));
        }
    }
    Ok(None)
}

/// Rewrite the scheme slots `palette` has changed with their effective
/// colours. Each rewritten slot ends up holding a single `srgbClr`; slots
/// not changed keep their original markup.
pub fn apply_palette(xml: &str, palette: &ThemePalette) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 64));
    let mut in_scheme = false;

    loop {
        let event = reader.read_event().map_err(|e| malformed(PART, e))?;
        let slot = match &event {
            Event::Start(e) | Event::Empty(e) if in_scheme => {
                std::str::from_utf8(e.local_name().as_ref())
                    .ok()
                    .and_then(ThemeSlot::from_xml_name)
                    .filter(|slot| palette.is_modified(*slot))
            },
            _ => None,
        };

        match (event, slot) {
            (Event::Start(e), Some(slot)) => {
                reader
                    .read_to_end(e.name())
                    .map_err(|err| malformed(PART, err))?;
                write_slot(&mut writer, &e, palette.color(slot)?)?;
            },
            (Event::Empty(e), Some(slot)) => {
                write_slot(&mut writer, &e, palette.color(slot)?)?;
            },
            (Event::Eof, _) => break,
            (event, _) => {
                match &event {
                    Event::Start(e) if e.local_name().as_ref() == b"clrScheme" => in_scheme = true,
                    Event::End(e) if e.local_name().as_ref() == b"clrScheme" => in_scheme = false,
                    _ => {},
                }
                writer
                    .write_event(event)
                    .map_err(|e| malformed(PART, e))?;
            },
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| malformed(PART, e))
}

fn write_slot(
    writer: &mut Writer<Vec<u8>>,
    slot_start: &BytesStart<'_>,
    color: ThemeColor,
) -> Result<()> {
    let io = |e: std::io::Error| malformed(PART, e);
    let qualified = slot_start.name();
    let slot_name = std::str::from_utf8(qualified.as_ref()).map_err(|e| malformed(PART, e))?;
    let srgb = format!("{}srgbClr", prefix_of(qualified.as_ref()));
    let hex = color.to_hex();

    let mut start = BytesStart::new(slot_name);
    start.extend_attributes(slot_start.attributes().filter_map(|a| a.ok()));
    writer.write_event(Event::Start(start)).map_err(io)?;
    writer
        .write_event(Event::Empty(
            BytesStart::new(srgb.as_str()).with_attributes([("val", hex.as_str())]),
        ))
        .map_err(io)?;
    writer
        .write_event(Event::End(BytesEnd::new(slot_name)))
        .map_err(io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::parts::template;

    #[test]
    fn test_parse_default_theme() {
        let palette = parse_palette(template::THEME_XML).unwrap();
        for slot in ThemeSlot::ALL {
            assert_eq!(
                palette.explicit_color(slot).unwrap(),
                Some(slot.default_color()),
                "{:?}",
                slot
            );
        }
    }

    #[test]
    fn test_apply_then_parse() {
        let mut palette = ThemePalette::new();
        palette
            .set_color(ThemeSlot::Accent1, ThemeColor::rgb(0x12, 0x34, 0x56))
            .unwrap();
        palette
            .set_color(ThemeSlot::Dark1, ThemeColor::rgb(0x10, 0x10, 0x10))
            .unwrap();

        let xml = apply_palette(template::THEME_XML, &palette).unwrap();
        assert!(xml.contains(r#"<a:accent1><a:srgbClr val="123456"/></a:accent1>"#));
        assert!(!xml.contains("windowText"));
        // Everything outside the colour scheme survives.
        assert!(xml.contains(r#"<a:latin typeface="Calibri Light"/>"#));

        let reread = parse_palette(&xml).unwrap();
        assert_eq!(
            reread.color(ThemeSlot::Accent1).unwrap(),
            ThemeColor::rgb(0x12, 0x34, 0x56)
        );
        assert_eq!(
            reread.color(ThemeSlot::Dark1).unwrap(),
            ThemeColor::rgb(0x10, 0x10, 0x10)
        );
        assert_eq!(
            reread.color(ThemeSlot::Hyperlink).unwrap(),
            ThemeSlot::Hyperlink.default_color()
        );
    }

    #[test]
    fn test_apply_is_stable() {
        let palette = ThemePalette::new();
        let once = apply_palette(template::THEME_XML, &palette).unwrap();
        let twice = apply_palette(&once, &palette).unwrap();
        assert_eq!(once, twice);
    }

    const MIXED_SCHEME: &str = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:themeElements><a:clrScheme name="Mixed">
        <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
        <a:accent1><a:hslClr hue="0" sat="100%" lum="50%"/></a:accent1>
        <a:accent2><a:srgbClr val="ED7D31"/></a:accent2>
    </a:clrScheme></a:themeElements></a:theme>"#;

    #[test]
    fn test_unchanged_palette_keeps_markup() {
        let palette = parse_palette(MIXED_SCHEME).unwrap();
        assert!(!palette.has_changes());
        assert_eq!(palette.explicit_color(ThemeSlot::Accent1).unwrap(), None);

        let xml = apply_palette(MIXED_SCHEME, &palette).unwrap();
        assert_eq!(xml, MIXED_SCHEME);
    }

    #[test]
    fn test_only_changed_slots_are_rewritten() {
        let mut palette = parse_palette(MIXED_SCHEME).unwrap();
        palette
            .set_color(ThemeSlot::Accent2, ThemeColor::rgb(0xAB, 0xCD, 0xEF))
            .unwrap();

        let xml = apply_palette(MIXED_SCHEME, &palette).unwrap();
        assert!(xml.contains(r#"<a:accent2><a:srgbClr val="ABCDEF"/></a:accent2>"#));
        assert!(xml.contains(r#"<a:accent1><a:hslClr hue="0" sat="100%" lum="50%"/></a:accent1>"#));
        assert!(xml.contains(r#"<a:sysClr val="windowText" lastClr="000000"/>"#));
    }

    #[test]
    fn test_invalid_colour_is_malformed() {
        let xml = r#"<a:theme xmlns:a="x"><a:themeElements><a:clrScheme name="x">
            <a:accent1><a:srgbClr val="ZZZZZZ"/></a:accent1>
        </a:clrScheme></a:themeElements></a:theme>"#;
        assert!(parse_palette(xml).is_err());
    }
}

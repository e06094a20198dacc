//! Cell formats of a workbook stylesheet (`xl/styles.xml`).
//!
//! Loading reads the number formats, fonts, fills, borders and cell formats
//! into lookup tables, so a requested style reuses whatever the stylesheet
//! already holds. Entries using markup the tables do not model (theme or
//! indexed colours, gradients, protection) keep their position but are never
//! shared. Saving appends new entries to their collections, updates the
//! `count` attributes and copies everything else through.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use phf::phf_map;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::{malformed, prefix_of};
use crate::common::Result;
use crate::models::{
    BorderLine, BorderSide, BorderStyle, HorizontalAlignment, StyleSetting, ThemeColor,
    VerticalAlignment,
};

const PART: &str = "styles";

/// Ids below this are reserved for built-in number formats.
pub const FIRST_CUSTOM_NUM_FMT: u32 = 164;

/// Built-in number formats by format code.
static BUILTIN_NUM_FMTS: phf::Map<&'static str, u32> = phf_map! {
    "General" => 0,
    "0" => 1,
    "0.00" => 2,
    "#,##0" => 3,
    "#,##0.00" => 4,
    "0%" => 9,
    "0.00%" => 10,
    "0.00E+00" => 11,
    "# ?/?" => 12,
    "# ??/??" => 13,
    "mm-dd-yy" => 14,
    "d-mmm-yy" => 15,
    "d-mmm" => 16,
    "mmm-yy" => 17,
    "h:mm AM/PM" => 18,
    "h:mm:ss AM/PM" => 19,
    "h:mm" => 20,
    "h:mm:ss" => 21,
    "m/d/yy h:mm" => 22,
    "#,##0 ;(#,##0)" => 37,
    "#,##0 ;[Red](#,##0)" => 38,
    "#,##0.00;(#,##0.00)" => 39,
    "#,##0.00;[Red](#,##0.00)" => 40,
    "mm:ss" => 45,
    "[h]:mm:ss" => 46,
    "mmss.0" => 47,
    "##0.0E+0" => 48,
    "@" => 49,
};

/// The `<styleSheet>` collections this module appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

impl Section {
    const ALL: [Section; 5] = [
        Section::NumFmts,
        Section::Fonts,
        Section::Fills,
        Section::Borders,
        Section::CellXfs,
    ];

    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"numFmts" => Some(Section::NumFmts),
            b"fonts" => Some(Section::Fonts),
            b"fills" => Some(Section::Fills),
            b"borders" => Some(Section::Borders),
            b"cellXfs" => Some(Section::CellXfs),
            _ => None,
        }
    }

    fn xml_name(self) -> &'static str {
        match self {
            Section::NumFmts => "numFmts",
            Section::Fonts => "fonts",
            Section::Fills => "fills",
            Section::Borders => "borders",
            Section::CellXfs => "cellXfs",
        }
    }
}

/// Position of a `<styleSheet>` child in schema order.
fn rank_of(name: &[u8]) -> u8 {
    match name {
        b"numFmts" => 0,
        b"fonts" => 1,
        b"fills" => 2,
        b"borders" => 3,
        b"cellStyleXfs" => 4,
        b"cellXfs" => 5,
        _ => 6,
    }
}

/// Entries of one collection, indexed by position.
#[derive(Debug, Clone)]
struct Pool<K> {
    lookup: HashMap<K, u32>,
    len: u32,
    /// Entries created since loading, in index order
    added: Vec<K>,
}

impl<K: Clone + Eq + Hash> Pool<K> {
    fn new() -> Self {
        Self {
            lookup: HashMap::new(),
            len: 0,
            added: Vec::new(),
        }
    }

    /// Count an existing entry. `None` marks one that is never shared.
    fn load(&mut self, key: Option<K>) {
        if let Some(key) = key {
            self.lookup.entry(key).or_insert(self.len);
        }
        self.len += 1;
    }

    fn intern(&mut self, key: K) -> u32 {
        match self.lookup.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let index = self.len;
                self.added.push(entry.key().clone());
                entry.insert(index);
                self.len += 1;
                index
            },
        }
    }
}

/// Number formats are keyed by code and identified by `numFmtId`.
#[derive(Debug, Clone)]
struct NumFmts {
    lookup: HashMap<String, u32>,
    len: u32,
    next_id: u32,
    added: Vec<(u32, String)>,
}

impl NumFmts {
    fn new() -> Self {
        Self {
            lookup: HashMap::new(),
            len: 0,
            next_id: FIRST_CUSTOM_NUM_FMT,
            added: Vec::new(),
        }
    }

    fn load(&mut self, id: u32, code: String) {
        self.lookup.entry(code).or_insert(id);
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.len += 1;
    }

    fn intern(&mut self, code: &str) -> u32 {
        if code.is_empty() {
            return 0;
        }
        if let Some(&id) = BUILTIN_NUM_FMTS.get(code) {
            return id;
        }
        if let Some(&id) = self.lookup.get(code) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.lookup.insert(code.to_string(), id);
        self.added.push((id, code.to_string()));
        self.len += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Underline {
    None,
    Single,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    name: String,
    /// Point size as written in `<sz val>`, without a trailing `.0`
    size: String,
    color: Option<ThemeColor>,
    bold: bool,
    italic: bool,
    underline: Underline,
}

impl FontKey {
    fn from_setting(setting: &StyleSetting) -> Result<Self> {
        let underline = if setting.is_double_underline()? {
            Underline::Double
        } else if setting.is_underline()? {
            Underline::Single
        } else {
            Underline::None
        };
        Ok(Self {
            name: setting.font_family()?,
            size: setting.font_size()?.to_string(),
            color: setting.text_color()?,
            bold: setting.is_bold()?,
            italic: setting.is_italic()?,
            underline,
        })
    }

    fn from_node(node: &Node) -> Option<Self> {
        let mut key = Self {
            name: String::new(),
            size: String::new(),
            color: None,
            bold: false,
            italic: false,
            underline: Underline::None,
        };
        for child in &node.children {
            match child.name.as_str() {
                "b" => key.bold = child.flag()?,
                "i" => key.italic = child.flag()?,
                "u" => {
                    key.underline = match child.attr("val") {
                        None | Some("single") => Underline::Single,
                        Some("double") => Underline::Double,
                        Some("none") => Underline::None,
                        Some(_) => return None,
                    }
                },
                "sz" => key.size = normalize_size(child.attr("val")?),
                "name" => key.name = child.attr("val")?.to_string(),
                "color" => key.color = color_of(child)?,
                "family" | "scheme" | "charset" => {},
                _ => return None,
            }
        }
        Some(key)
    }
}

fn normalize_size(value: &str) -> String {
    match value.trim().parse::<f64>() {
        Ok(points) => points.to_string(),
        Err(_) => value.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FillKey {
    pattern: String,
    fg: Option<ThemeColor>,
    bg: Option<ThemeColor>,
}

impl FillKey {
    fn none() -> Self {
        Self {
            pattern: "none".to_string(),
            fg: None,
            bg: None,
        }
    }

    /// A solid fill painted with the foreground colour, or with the
    /// background colour when only that one is set.
    fn from_setting(setting: &StyleSetting) -> Result<Self> {
        let background = setting.background_color()?;
        let foreground = setting.foreground_color()?;
        if background.is_none() && foreground.is_none() {
            return Ok(Self::none());
        }
        Ok(Self {
            pattern: "solid".to_string(),
            fg: foreground.or(background),
            bg: background,
        })
    }

    fn from_node(node: &Node) -> Option<Self> {
        let mut key = Self::none();
        for child in &node.children {
            match child.name.as_str() {
                "patternFill" => {
                    if let Some(pattern) = child.attr("patternType") {
                        key.pattern = pattern.to_string();
                    }
                    for color in &child.children {
                        match color.name.as_str() {
                            "fgColor" => key.fg = color_of(color)?,
                            "bgColor" => key.bg = color_of(color)?,
                            _ => return None,
                        }
                    }
                },
                _ => return None,
            }
        }
        Some(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
struct BorderKey([BorderLine; 4]);

impl BorderKey {
    fn from_setting(setting: &StyleSetting) -> Result<Self> {
        let mut key = Self::default();
        for (index, side) in BorderSide::ALL.into_iter().enumerate() {
            key.0[index] = normalize_line(setting.border(side)?);
        }
        Ok(key)
    }

    fn from_node(node: &Node) -> Option<Self> {
        let mut key = Self::default();
        for child in &node.children {
            let index = match child.name.as_str() {
                "left" | "start" => 0,
                "right" | "end" => 1,
                "top" => 2,
                "bottom" => 3,
                "diagonal" | "vertical" | "horizontal" => {
                    if line_of(child)?.style != BorderStyle::None {
                        return None;
                    }
                    continue;
                },
                _ => return None,
            };
            key.0[index] = line_of(child)?;
        }
        Some(key)
    }
}

fn normalize_line(line: BorderLine) -> BorderLine {
    match line.style {
        BorderStyle::None => BorderLine::default(),
        _ => line,
    }
}

fn line_of(node: &Node) -> Option<BorderLine> {
    let style = match node.attr("style") {
        None | Some("none") => BorderStyle::None,
        Some(value) => BorderStyle::from_xml_value(value)?,
    };
    let mut color = None;
    for child in &node.children {
        match child.name.as_str() {
            "color" => color = color_of(child)?,
            _ => return None,
        }
    }
    Some(normalize_line(BorderLine { style, color }))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
struct XfKey {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    xf_id: u32,
    horizontal: HorizontalAlignment,
    vertical: VerticalAlignment,
    wrap: bool,
}

impl XfKey {
    fn has_alignment(&self) -> bool {
        self.horizontal != HorizontalAlignment::None
            || self.vertical != VerticalAlignment::None
            || self.wrap
    }

    fn from_node(node: &Node) -> Option<Self> {
        let mut key = Self::default();
        for (name, value) in &node.attrs {
            match name.as_str() {
                "numFmtId" => key.num_fmt_id = value.trim().parse().ok()?,
                "fontId" => key.font_id = value.trim().parse().ok()?,
                "fillId" => key.fill_id = value.trim().parse().ok()?,
                "borderId" => key.border_id = value.trim().parse().ok()?,
                "xfId" => key.xf_id = value.trim().parse().ok()?,
                "quotePrefix" | "pivotButton" if is_true(value) => return None,
                _ => {},
            }
        }
        for child in &node.children {
            if child.name != "alignment" {
                return None;
            }
            for (name, value) in &child.attrs {
                match name.as_str() {
                    "horizontal" if value == "general" => {},
                    "horizontal" => key.horizontal = HorizontalAlignment::from_xml_value(value)?,
                    "vertical" => key.vertical = VerticalAlignment::from_xml_value(value)?,
                    "wrapText" => key.wrap = is_true(value),
                    _ => return None,
                }
            }
        }
        Some(key)
    }
}

fn is_true(value: &str) -> bool {
    matches!(value, "1" | "true")
}

/// The RGB value of a colour element, `Some(None)` for an automatic colour,
/// or `None` when only a theme or the legacy palette can resolve it.
fn color_of(node: &Node) -> Option<Option<ThemeColor>> {
    if let Some(rgb) = node.attr("rgb") {
        let hex = match rgb.len() {
            8 if rgb.get(..2).is_some_and(|alpha| alpha.eq_ignore_ascii_case("FF")) => &rgb[2..],
            6 => rgb,
            _ => return None,
        };
        return ThemeColor::from_hex(hex).map(Some);
    }
    let automatic = node.attr("auto").is_some_and(is_true)
        || node.attr("indexed") == Some("64")
        || node.attrs.is_empty();
    automatic.then_some(None)
}

fn argb(color: ThemeColor) -> String {
    format!("FF{}", color.to_hex())
}

/// A parsed element with local names, used to key existing entries.
#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Node {
    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| malformed(PART, err))?;
            let value = attr.unescape_value().map_err(|err| malformed(PART, err))?;
            attrs.push((
                String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(Self {
            name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
            attrs,
            children: Vec::new(),
        })
    }

    /// Read the element whose start tag was just read, through its end tag.
    fn read(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Self> {
        let mut node = Self::from_start(start)?;
        loop {
            match reader.read_event().map_err(|e| malformed(PART, e))? {
                Event::Start(e) => node.children.push(Self::read(reader, &e)?),
                Event::Empty(e) => node.children.push(Self::from_start(&e)?),
                Event::End(_) => return Ok(node),
                Event::Eof => return Err(malformed(PART, "unexpected end of document")),
                _ => {},
            }
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of a boolean property element such as `<b/>` or `<b val="0"/>`.
    fn flag(&self) -> Option<bool> {
        match self.attr("val") {
            None => Some(true),
            Some("1" | "true") => Some(true),
            Some("0" | "false") => Some(false),
            Some(_) => None,
        }
    }
}

/// A workbook stylesheet and the cell formats requested from it.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    xml: String,
    present: Vec<Section>,
    num_fmts: NumFmts,
    fonts: Pool<FontKey>,
    fills: Pool<FillKey>,
    borders: Pool<BorderKey>,
    xfs: Pool<XfKey>,
}

impl StyleSheet {
    /// Index the entries of a stylesheet part.
    ///
    /// A collection the part lacks starts with Excel's default entries so
    /// that index 0 keeps its usual meaning.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut sheet = Self {
            xml: xml.to_string(),
            present: Vec::new(),
            num_fmts: NumFmts::new(),
            fonts: Pool::new(),
            fills: Pool::new(),
            borders: Pool::new(),
            xfs: Pool::new(),
        };

        let mut reader = Reader::from_str(xml);
        let mut depth = 0usize;
        let mut section: Option<Section> = None;

        loop {
            match reader.read_event().map_err(|e| malformed(PART, e))? {
                Event::Start(e) if depth == 2 && section.is_some() => {
                    let node = Node::read(&mut reader, &e)?;
                    sheet.load(section, &node);
                },
                Event::Empty(e) if depth == 2 && section.is_some() => {
                    let node = Node::from_start(&e)?;
                    sheet.load(section, &node);
                },
                Event::Start(e) => {
                    depth += 1;
                    if depth == 2 {
                        section = Section::from_name(e.local_name().as_ref());
                        sheet.present.extend(section);
                    }
                },
                Event::Empty(e) if depth == 1 => {
                    sheet.present.extend(Section::from_name(e.local_name().as_ref()));
                },
                Event::End(_) => {
                    if depth == 2 {
                        section = None;
                    }
                    depth = depth.saturating_sub(1);
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if !sheet.present.contains(&Section::Fonts) {
            sheet.fonts.intern(FontKey::from_setting(&StyleSetting::new())?);
        }
        if !sheet.present.contains(&Section::Fills) {
            sheet.fills.intern(FillKey::none());
            sheet.fills.intern(FillKey {
                pattern: "gray125".to_string(),
                ..FillKey::none()
            });
        }
        if !sheet.present.contains(&Section::Borders) {
            sheet.borders.intern(BorderKey::default());
        }
        if !sheet.present.contains(&Section::CellXfs) {
            sheet.xfs.intern(XfKey::default());
        }
        Ok(sheet)
    }

    fn load(&mut self, section: Option<Section>, node: &Node) {
        match section {
            Some(Section::NumFmts) => {
                let id = node.attr("numFmtId").and_then(|id| id.trim().parse().ok());
                match (id, node.attr("formatCode")) {
                    (Some(id), Some(code)) => self.num_fmts.load(id, code.to_string()),
                    _ => self.num_fmts.len += 1,
                }
            },
            Some(Section::Fonts) => self.fonts.load(FontKey::from_node(node)),
            Some(Section::Fills) => self.fills.load(FillKey::from_node(node)),
            Some(Section::Borders) => self.borders.load(BorderKey::from_node(node)),
            Some(Section::CellXfs) => self.xfs.load(XfKey::from_node(node)),
            None => {},
        }
    }

    /// Index into `<cellXfs>` of the format described by `setting`, adding
    /// it and whatever font, fill, border or number format it needs.
    pub fn style_id(&mut self, setting: &StyleSetting) -> Result<u32> {
        let key = XfKey {
            num_fmt_id: self.num_fmts.intern(&setting.number_format()?),
            font_id: self.fonts.intern(FontKey::from_setting(setting)?),
            fill_id: self.fills.intern(FillKey::from_setting(setting)?),
            border_id: self.borders.intern(BorderKey::from_setting(setting)?),
            xf_id: 0,
            horizontal: setting.horizontal_alignment()?,
            vertical: setting.vertical_alignment()?,
            wrap: setting.is_wrap_text()?,
        };
        Ok(self.xfs.intern(key))
    }

    /// Whether any entry was added since the part was read.
    pub fn has_changes(&self) -> bool {
        Section::ALL.into_iter().any(|section| self.added_count(section) > 0)
    }

    pub fn cell_format_count(&self) -> u32 {
        self.xfs.len
    }

    fn added_count(&self, section: Section) -> usize {
        match section {
            Section::NumFmts => self.num_fmts.added.len(),
            Section::Fonts => self.fonts.added.len(),
            Section::Fills => self.fills.added.len(),
            Section::Borders => self.borders.added.len(),
            Section::CellXfs => self.xfs.added.len(),
        }
    }

    fn total(&self, section: Section) -> u32 {
        match section {
            Section::NumFmts => self.num_fmts.len,
            Section::Fonts => self.fonts.len,
            Section::Fills => self.fills.len,
            Section::Borders => self.borders.len,
            Section::CellXfs => self.xfs.len,
        }
    }

    /// The part with added entries written in.
    pub fn to_xml(&self) -> Result<String> {
        if !self.has_changes() {
            return Ok(self.xml.clone());
        }

        let mut reader = Reader::from_str(&self.xml);
        let mut writer = Writer::new(Vec::with_capacity(self.xml.len() + 1024));
        let io = |e: std::io::Error| malformed(PART, e);

        let mut depth = 0usize;
        let mut prefix = String::new();
        let mut open: Option<Section> = None;
        let mut inserted = Vec::new();

        loop {
            match reader.read_event().map_err(|e| malformed(PART, e))? {
                Event::Start(e) if depth == 0 => {
                    prefix = prefix_of(e.name().as_ref()).to_string();
                    depth = 1;
                    writer.write_event(Event::Start(e)).map_err(io)?;
                },
                Event::Empty(e) if depth == 0 => {
                    prefix = prefix_of(e.name().as_ref()).to_string();
                    let name = qualified_name(&e)?;
                    writer.write_event(Event::Start(e)).map_err(io)?;
                    self.insert_missing(&mut writer, &prefix, u8::MAX, &mut inserted)?;
                    writer
                        .write_event(Event::End(BytesEnd::new(name)))
                        .map_err(io)?;
                },
                Event::Start(e) if depth == 1 => {
                    let local = e.local_name();
                    self.insert_missing(&mut writer, &prefix, rank_of(local.as_ref()), &mut inserted)?;
                    depth = 2;
                    open = Section::from_name(local.as_ref())
                        .filter(|section| self.added_count(*section) > 0);
                    match open {
                        Some(section) => writer
                            .write_event(Event::Start(with_count(&e, self.total(section))?))
                            .map_err(io)?,
                        None => writer.write_event(Event::Start(e)).map_err(io)?,
                    }
                },
                Event::Empty(e) if depth == 1 => {
                    let local = e.local_name();
                    self.insert_missing(&mut writer, &prefix, rank_of(local.as_ref()), &mut inserted)?;
                    match Section::from_name(local.as_ref())
                        .filter(|section| self.added_count(*section) > 0)
                    {
                        Some(section) => {
                            let name = qualified_name(&e)?;
                            writer
                                .write_event(Event::Start(with_count(&e, self.total(section))?))
                                .map_err(io)?;
                            self.write_added(&mut writer, &prefix, section)?;
                            writer
                                .write_event(Event::End(BytesEnd::new(name)))
                                .map_err(io)?;
                        },
                        None => writer.write_event(Event::Empty(e)).map_err(io)?,
                    }
                },
                Event::End(e) if depth == 2 => {
                    if let Some(section) = open.take() {
                        self.write_added(&mut writer, &prefix, section)?;
                    }
                    depth = 1;
                    writer.write_event(Event::End(e)).map_err(io)?;
                },
                Event::End(e) if depth == 1 => {
                    self.insert_missing(&mut writer, &prefix, u8::MAX, &mut inserted)?;
                    depth = 0;
                    writer.write_event(Event::End(e)).map_err(io)?;
                },
                Event::Start(e) => {
                    depth += 1;
                    writer.write_event(Event::Start(e)).map_err(io)?;
                },
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    writer.write_event(Event::End(e)).map_err(io)?;
                },
                Event::Eof => break,
                event => writer.write_event(event).map_err(io)?,
            }
        }

        String::from_utf8(writer.into_inner()).map_err(|e| malformed(PART, e))
    }

    /// Write the collections the part lacks that sort before `rank`.
    fn insert_missing(
        &self,
        writer: &mut Writer<Vec<u8>>,
        prefix: &str,
        rank: u8,
        inserted: &mut Vec<Section>,
    ) -> Result<()> {
        let io = |e: std::io::Error| malformed(PART, e);
        for section in Section::ALL {
            if rank_of(section.xml_name().as_bytes()) >= rank
                || self.present.contains(&section)
                || inserted.contains(&section)
                || self.added_count(section) == 0
            {
                continue;
            }
            let name = format!("{}{}", prefix, section.xml_name());
            let count = self.total(section).to_string();
            writer
                .write_event(Event::Start(
                    BytesStart::new(name.as_str()).with_attributes([("count", count.as_str())]),
                ))
                .map_err(io)?;
            self.write_added(writer, prefix, section)?;
            writer
                .write_event(Event::End(BytesEnd::new(name.as_str())))
                .map_err(io)?;
            inserted.push(section);
        }
        Ok(())
    }

    fn write_added(&self, writer: &mut Writer<Vec<u8>>, prefix: &str, section: Section) -> Result<()> {
        let mut out = ElementWriter { writer, prefix };
        match section {
            Section::NumFmts => {
                for (id, code) in &self.num_fmts.added {
                    let id = id.to_string();
                    out.empty("numFmt", &[("numFmtId", id.as_str()), ("formatCode", code.as_str())])?;
                }
            },
            Section::Fonts => {
                for font in &self.fonts.added {
                    out.font(font)?;
                }
            },
            Section::Fills => {
                for fill in &self.fills.added {
                    out.fill(fill)?;
                }
            },
            Section::Borders => {
                for border in &self.borders.added {
                    out.border(border)?;
                }
            },
            Section::CellXfs => {
                for xf in &self.xfs.added {
                    out.xf(xf)?;
                }
            },
        }
        Ok(())
    }
}

fn qualified_name(e: &BytesStart<'_>) -> Result<String> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .map_err(|err| malformed(PART, err))
}

fn with_count(e: &BytesStart<'_>, count: u32) -> Result<BytesStart<'static>> {
    let mut out = BytesStart::new(qualified_name(e)?);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(PART, err))?;
        if attr.key.local_name().as_ref() != b"count" {
            out.push_attribute(attr);
        }
    }
    out.push_attribute(("count", count.to_string().as_str()));
    Ok(out.into_owned())
}

/// Writes prefixed stylesheet elements.
struct ElementWriter<'w> {
    writer: &'w mut Writer<Vec<u8>>,
    prefix: &'w str,
}

impl ElementWriter<'_> {
    fn element(&self, name: &str, attrs: &[(&str, &str)]) -> BytesStart<'static> {
        let mut element = BytesStart::new(format!("{}{}", self.prefix, name));
        for &attr in attrs {
            element.push_attribute(attr);
        }
        element
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let element = self.element(name, attrs);
        self.writer
            .write_event(Event::Empty(element))
            .map_err(|e| malformed(PART, e))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let element = self.element(name, attrs);
        self.writer
            .write_event(Event::Start(element))
            .map_err(|e| malformed(PART, e))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        let name = format!("{}{}", self.prefix, name);
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(|e| malformed(PART, e))
    }

    fn font(&mut self, font: &FontKey) -> Result<()> {
        self.start("font", &[])?;
        if font.bold {
            self.empty("b", &[])?;
        }
        if font.italic {
            self.empty("i", &[])?;
        }
        match font.underline {
            Underline::None => {},
            Underline::Single => self.empty("u", &[])?,
            Underline::Double => self.empty("u", &[("val", "double")])?,
        }
        self.empty("sz", &[("val", font.size.as_str())])?;
        if let Some(color) = font.color {
            self.empty("color", &[("rgb", argb(color).as_str())])?;
        }
        self.empty("name", &[("val", font.name.as_str())])?;
        self.end("font")
    }

    fn fill(&mut self, fill: &FillKey) -> Result<()> {
        self.start("fill", &[])?;
        let pattern = [("patternType", fill.pattern.as_str())];
        if fill.fg.is_none() && fill.bg.is_none() {
            self.empty("patternFill", &pattern)?;
        } else {
            self.start("patternFill", &pattern)?;
            if let Some(color) = fill.fg {
                self.empty("fgColor", &[("rgb", argb(color).as_str())])?;
            }
            if let Some(color) = fill.bg {
                self.empty("bgColor", &[("rgb", argb(color).as_str())])?;
            }
            self.end("patternFill")?;
        }
        self.end("fill")
    }

    fn border(&mut self, border: &BorderKey) -> Result<()> {
        self.start("border", &[])?;
        for (side, line) in BorderSide::ALL.into_iter().zip(&border.0) {
            let name = side.xml_name();
            match (line.style, line.color) {
                (BorderStyle::None, _) => self.empty(name, &[])?,
                (style, None) => self.empty(name, &[("style", style.xml_value())])?,
                (style, Some(color)) => {
                    self.start(name, &[("style", style.xml_value())])?;
                    self.empty("color", &[("rgb", argb(color).as_str())])?;
                    self.end(name)?;
                },
            }
        }
        self.empty("diagonal", &[])?;
        self.end("border")
    }

    fn xf(&mut self, xf: &XfKey) -> Result<()> {
        let ids = [
            xf.num_fmt_id.to_string(),
            xf.font_id.to_string(),
            xf.fill_id.to_string(),
            xf.border_id.to_string(),
            xf.xf_id.to_string(),
        ];
        let mut attrs = vec![
            ("numFmtId", ids[0].as_str()),
            ("fontId", ids[1].as_str()),
            ("fillId", ids[2].as_str()),
            ("borderId", ids[3].as_str()),
            ("xfId", ids[4].as_str()),
        ];
        if xf.num_fmt_id != 0 {
            attrs.push(("applyNumberFormat", "1"));
        }
        if xf.font_id != 0 {
            attrs.push(("applyFont", "1"));
        }
        if xf.fill_id != 0 {
            attrs.push(("applyFill", "1"));
        }
        if xf.border_id != 0 {
            attrs.push(("applyBorder", "1"));
        }
        if !xf.has_alignment() {
            return self.empty("xf", &attrs);
        }

        attrs.push(("applyAlignment", "1"));
        self.start("xf", &attrs)?;
        let mut alignment = Vec::new();
        if xf.horizontal != HorizontalAlignment::None {
            alignment.push(("horizontal", xf.horizontal.xml_value()));
        }
        if xf.vertical != VerticalAlignment::None {
            alignment.push(("vertical", xf.vertical.xml_value()));
        }
        if xf.wrap {
            alignment.push(("wrapText", "1"));
        }
        self.empty("alignment", &alignment)?;
        self.end("xf")
    }
}

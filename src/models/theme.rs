//! Theme colour palette record.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::table::{FieldSpec, PropertyModel, PropertyTable, Schema};
use crate::schema::{FieldKind, FieldType, Result, SchemaError};

/// A 24-bit RGB colour.
///
/// Serialized as six upper-case hex digits, the form used by theme XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThemeColor(u32);

impl ThemeColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Build from a packed `0xRRGGBB` value; the top byte must be zero.
    pub fn from_u32(value: u32) -> Option<Self> {
        (value <= 0x00FF_FFFF).then_some(Self(value))
    }

    /// Parse `RRGGBB`, with or without a leading `#`.
    ///
    /// ```
    /// use officekit::models::ThemeColor;
    /// assert_eq!(ThemeColor::from_hex("#4472c4"), Some(ThemeColor::rgb(0x44, 0x72, 0xC4)));
    /// assert_eq!(ThemeColor::from_hex("4472C"), None);
    /// ```
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Self)
    }

    pub fn to_hex(self) -> String {
        format!("{:06X}", self.0)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

impl TryFrom<String> for ThemeColor {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid RGB hex colour: {}", value))
    }
}

impl From<ThemeColor> for String {
    fn from(color: ThemeColor) -> Self {
        color.to_hex()
    }
}

impl FieldType for ThemeColor {
    const KIND: FieldKind = FieldKind::U32;

    fn encode(&self, slot: u16, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(slot, out)
    }

    fn decode(slot: u16, payload: &Bytes) -> Result<Self> {
        let value = u32::decode(slot, payload)?;
        Self::from_u32(value).ok_or_else(|| {
            SchemaError::mismatch(slot, FieldKind::U32, format!("non-RGB value {:#010X}", value))
        })
    }
}

/// The twelve colour slots of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeSlot {
    Accent1,
    Accent2,
    Accent3,
    Accent4,
    Accent5,
    Accent6,
    Dark1,
    Dark2,
    Light1,
    Light2,
    Hyperlink,
    FollowedHyperlink,
}

impl ThemeSlot {
    pub const ALL: [ThemeSlot; 12] = [
        ThemeSlot::Accent1,
        ThemeSlot::Accent2,
        ThemeSlot::Accent3,
        ThemeSlot::Accent4,
        ThemeSlot::Accent5,
        ThemeSlot::Accent6,
        ThemeSlot::Dark1,
        ThemeSlot::Dark2,
        ThemeSlot::Light1,
        ThemeSlot::Light2,
        ThemeSlot::Hyperlink,
        ThemeSlot::FollowedHyperlink,
    ];

    /// Field offset of this slot.
    pub fn vt(self) -> u16 {
        match self {
            ThemeSlot::Accent1 => ThemePalette::VT_ACCENT1,
            ThemeSlot::Accent2 => ThemePalette::VT_ACCENT2,
            ThemeSlot::Accent3 => ThemePalette::VT_ACCENT3,
            ThemeSlot::Accent4 => ThemePalette::VT_ACCENT4,
            ThemeSlot::Accent5 => ThemePalette::VT_ACCENT5,
            ThemeSlot::Accent6 => ThemePalette::VT_ACCENT6,
            ThemeSlot::Dark1 => ThemePalette::VT_DARK1,
            ThemeSlot::Dark2 => ThemePalette::VT_DARK2,
            ThemeSlot::Light1 => ThemePalette::VT_LIGHT1,
            ThemeSlot::Light2 => ThemePalette::VT_LIGHT2,
            ThemeSlot::Hyperlink => ThemePalette::VT_HYPERLINK,
            ThemeSlot::FollowedHyperlink => ThemePalette::VT_FOLLOWED_HYPERLINK,
        }
    }

    /// Element name inside `<a:clrScheme>`.
    pub fn xml_name(self) -> &'static str {
        match self {
            ThemeSlot::Accent1 => "accent1",
            ThemeSlot::Accent2 => "accent2",
            ThemeSlot::Accent3 => "accent3",
            ThemeSlot::Accent4 => "accent4",
            ThemeSlot::Accent5 => "accent5",
            ThemeSlot::Accent6 => "accent6",
            ThemeSlot::Dark1 => "dk1",
            ThemeSlot::Dark2 => "dk2",
            ThemeSlot::Light1 => "lt1",
            ThemeSlot::Light2 => "lt2",
            ThemeSlot::Hyperlink => "hlink",
            ThemeSlot::FollowedHyperlink => "folHlink",
        }
    }

    pub fn from_xml_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.xml_name() == name)
    }

    /// Colour used when the slot is unset (the stock Office theme).
    pub fn default_color(self) -> ThemeColor {
        match self {
            ThemeSlot::Accent1 => ThemeColor::rgb(0x44, 0x72, 0xC4),
            ThemeSlot::Accent2 => ThemeColor::rgb(0xED, 0x7D, 0x31),
            ThemeSlot::Accent3 => ThemeColor::rgb(0xA5, 0xA5, 0xA5),
            ThemeSlot::Accent4 => ThemeColor::rgb(0xFF, 0xC0, 0x00),
            ThemeSlot::Accent5 => ThemeColor::rgb(0x5B, 0x9B, 0xD5),
            ThemeSlot::Accent6 => ThemeColor::rgb(0x70, 0xAD, 0x47),
            ThemeSlot::Dark1 => ThemeColor::rgb(0x00, 0x00, 0x00),
            ThemeSlot::Dark2 => ThemeColor::rgb(0x44, 0x54, 0x6A),
            ThemeSlot::Light1 => ThemeColor::rgb(0xFF, 0xFF, 0xFF),
            ThemeSlot::Light2 => ThemeColor::rgb(0xE7, 0xE6, 0xE6),
            ThemeSlot::Hyperlink => ThemeColor::rgb(0x05, 0x63, 0xC1),
            ThemeSlot::FollowedHyperlink => ThemeColor::rgb(0x95, 0x4F, 0x72),
        }
    }
}

const fn color_field(slot: u16, name: &'static str) -> FieldSpec {
    FieldSpec {
        slot,
        name,
        kind: FieldKind::U32,
    }
}

/// Theme palette: twelve optional colours.
#[derive(Debug, Clone)]
pub struct ThemePalette {
    table: PropertyTable,
}

impl ThemePalette {
    pub const VT_ACCENT1: u16 = 4;
    pub const VT_ACCENT2: u16 = 6;
    pub const VT_ACCENT3: u16 = 8;
    pub const VT_ACCENT4: u16 = 10;
    pub const VT_ACCENT5: u16 = 12;
    pub const VT_ACCENT6: u16 = 14;
    pub const VT_DARK1: u16 = 16;
    pub const VT_DARK2: u16 = 18;
    pub const VT_LIGHT1: u16 = 20;
    pub const VT_LIGHT2: u16 = 22;
    pub const VT_HYPERLINK: u16 = 24;
    pub const VT_FOLLOWED_HYPERLINK: u16 = 26;

    pub fn new() -> Self {
        Self::empty()
    }

    /// Effective colour of `slot`, falling back to the theme default.
    pub fn color(&self, slot: ThemeSlot) -> Result<ThemeColor> {
        Ok(self
            .explicit_color(slot)?
            .unwrap_or_else(|| slot.default_color()))
    }

    /// Colour of `slot` only if one was set.
    pub fn explicit_color(&self, slot: ThemeSlot) -> Result<Option<ThemeColor>> {
        self.get_field(slot.vt())
    }

    pub fn set_color(&mut self, slot: ThemeSlot, color: ThemeColor) -> Result<()> {
        self.set_field(slot.vt(), color)
    }

    /// Revert `slot` to the default colour.
    pub fn reset_color(&mut self, slot: ThemeSlot) -> Result<()> {
        self.clear_field(slot.vt())
    }

    /// Whether `slot` was set or reset since the palette was decoded.
    pub fn is_modified(&self, slot: ThemeSlot) -> bool {
        self.table.is_pending(slot.vt())
    }

    /// Whether any slot was set or reset since the palette was decoded.
    pub fn has_changes(&self) -> bool {
        self.table.is_dirty()
    }
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyModel for ThemePalette {
    const SCHEMA: &'static Schema = &Schema {
        name: "ThemePalletModel",
        fields: &[
            color_field(ThemePalette::VT_ACCENT1, "accent1"),
            color_field(ThemePalette::VT_ACCENT2, "accent2"),
            color_field(ThemePalette::VT_ACCENT3, "accent3"),
            color_field(ThemePalette::VT_ACCENT4, "accent4"),
            color_field(ThemePalette::VT_ACCENT5, "accent5"),
            color_field(ThemePalette::VT_ACCENT6, "accent6"),
            color_field(ThemePalette::VT_DARK1, "dark1"),
            color_field(ThemePalette::VT_DARK2, "dark2"),
            color_field(ThemePalette::VT_LIGHT1, "light1"),
            color_field(ThemePalette::VT_LIGHT2, "light2"),
            color_field(ThemePalette::VT_HYPERLINK, "hyperlink"),
            color_field(ThemePalette::VT_FOLLOWED_HYPERLINK, "followed_hyperlink"),
        ],
    };

    fn from_table(table: PropertyTable) -> Self {
        Self { table }
    }

    fn table(&self) -> &PropertyTable {
        &self.table
    }

    fn table_mut(&mut self) -> &mut PropertyTable {
        &mut self.table
    }
}

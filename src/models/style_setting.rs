//! Cell style request record.
//!
//! A [`StyleSetting`] describes how a cell should look. Workbooks turn it
//! into a cell format index with `Excel::get_style_id_mut`, sharing fonts,
//! fills, borders and number formats with formats already in the workbook.

use bytes::Bytes;

use super::table::{FieldSpec, PropertyModel, PropertyTable, Schema};
use super::theme::ThemeColor;
use crate::schema::{FieldKind, FieldType, Result, SchemaError};

/// Implements [`FieldType`] for a fieldless enum stored as its `u32` index.
macro_rules! u32_enum_field {
    ($name:ident { $($variant:ident = $value:literal => $xml:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_u32(self) -> u32 {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            /// Attribute value used by SpreadsheetML, empty for the unset variant.
            pub fn xml_value(self) -> &'static str {
                match self {
                    $($name::$variant => $xml,)+
                }
            }

            pub fn from_xml_value(value: &str) -> Option<Self> {
                match value {
                    $($xml => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl FieldType for $name {
            const KIND: FieldKind = FieldKind::U32;

            fn encode(&self, slot: u16, out: &mut Vec<u8>) -> Result<()> {
                self.as_u32().encode(slot, out)
            }

            fn decode(slot: u16, payload: &Bytes) -> Result<Self> {
                let value = u32::decode(slot, payload)?;
                Self::from_u32(value).ok_or_else(|| {
                    SchemaError::mismatch(
                        slot,
                        FieldKind::U32,
                        format!("unknown {} {}", stringify!($name), value),
                    )
                })
            }
        }
    };
}

/// Line style of one cell edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Thick,
    Dotted,
    Double,
    Dashed,
    DashDot,
    DashDotDot,
    Medium,
    MediumDashed,
    MediumDashDot,
    MediumDashDotDot,
    SlantDashDot,
    Hair,
}

u32_enum_field!(BorderStyle {
    None = 0 => "",
    Thin = 1 => "thin",
    Thick = 2 => "thick",
    Dotted = 3 => "dotted",
    Double = 4 => "double",
    Dashed = 5 => "dashed",
    DashDot = 6 => "dashDot",
    DashDotDot = 7 => "dashDotDot",
    Medium = 8 => "medium",
    MediumDashed = 9 => "mediumDashed",
    MediumDashDot = 10 => "mediumDashDot",
    MediumDashDotDot = 11 => "mediumDashDotDot",
    SlantDashDot = 12 => "slantDashDot",
    Hair = 13 => "hair",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    None,
    Left,
    Center,
    Right,
    Justify,
}

u32_enum_field!(HorizontalAlignment {
    None = 0 => "",
    Left = 1 => "left",
    Center = 2 => "center",
    Right = 3 => "right",
    Justify = 4 => "justify",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    #[default]
    None,
    Top,
    Middle,
    Bottom,
}

u32_enum_field!(VerticalAlignment {
    None = 0 => "",
    Top = 1 => "top",
    Middle = 2 => "center",
    Bottom = 3 => "bottom",
});

/// The four cell edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl BorderSide {
    pub const ALL: [BorderSide; 4] = [
        BorderSide::Left,
        BorderSide::Right,
        BorderSide::Top,
        BorderSide::Bottom,
    ];

    /// Element name inside `<border>`.
    pub fn xml_name(self) -> &'static str {
        match self {
            BorderSide::Left => "left",
            BorderSide::Right => "right",
            BorderSide::Top => "top",
            BorderSide::Bottom => "bottom",
        }
    }

    fn slots(self) -> (u16, u16) {
        match self {
            BorderSide::Left => (StyleSetting::VT_BORDER_LEFT, StyleSetting::VT_BORDER_LEFT_COLOR),
            BorderSide::Right => {
                (StyleSetting::VT_BORDER_RIGHT, StyleSetting::VT_BORDER_RIGHT_COLOR)
            },
            BorderSide::Top => (StyleSetting::VT_BORDER_TOP, StyleSetting::VT_BORDER_TOP_COLOR),
            BorderSide::Bottom => {
                (StyleSetting::VT_BORDER_BOTTOM, StyleSetting::VT_BORDER_BOTTOM_COLOR)
            },
        }
    }
}

/// One cell edge: its line style and, optionally, its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderLine {
    pub style: BorderStyle,
    pub color: Option<ThemeColor>,
}

/// The look of a cell.
///
/// Unset fields read as Excel's defaults: General number format, 11 point
/// Calibri, no fill, no borders and no alignment.
#[derive(Debug, Clone)]
pub struct StyleSetting {
    table: PropertyTable,
}

impl StyleSetting {
    pub const VT_NUMBER_FORMAT: u16 = 4;
    pub const VT_FONT_FAMILY: u16 = 6;
    pub const VT_FONT_SIZE: u16 = 8;
    pub const VT_TEXT_COLOR: u16 = 10;
    pub const VT_IS_BOLD: u16 = 12;
    pub const VT_IS_ITALIC: u16 = 14;
    pub const VT_IS_UNDERLINE: u16 = 16;
    pub const VT_IS_DOUBLE_UNDERLINE: u16 = 18;
    pub const VT_BACKGROUND_COLOR: u16 = 20;
    pub const VT_FOREGROUND_COLOR: u16 = 22;
    pub const VT_BORDER_LEFT: u16 = 24;
    pub const VT_BORDER_LEFT_COLOR: u16 = 26;
    pub const VT_BORDER_RIGHT: u16 = 28;
    pub const VT_BORDER_RIGHT_COLOR: u16 = 30;
    pub const VT_BORDER_TOP: u16 = 32;
    pub const VT_BORDER_TOP_COLOR: u16 = 34;
    pub const VT_BORDER_BOTTOM: u16 = 36;
    pub const VT_BORDER_BOTTOM_COLOR: u16 = 38;
    pub const VT_HORIZONTAL_ALIGNMENT: u16 = 40;
    pub const VT_VERTICAL_ALIGNMENT: u16 = 42;
    pub const VT_IS_WRAP_TEXT: u16 = 44;

    pub const DEFAULT_FONT_FAMILY: &'static str = "Calibri";
    pub const DEFAULT_FONT_SIZE: u32 = 11;

    pub fn new() -> Self {
        Self::empty()
    }

    /// Number format code; empty means General.
    pub fn number_format(&self) -> Result<String> {
        Ok(self.get_field(Self::VT_NUMBER_FORMAT)?.unwrap_or_default())
    }

    pub fn set_number_format(&mut self, code: &str) -> Result<()> {
        self.set_field(Self::VT_NUMBER_FORMAT, code.to_string())
    }

    pub fn font_family(&self) -> Result<String> {
        Ok(self
            .get_field(Self::VT_FONT_FAMILY)?
            .unwrap_or_else(|| Self::DEFAULT_FONT_FAMILY.to_string()))
    }

    pub fn set_font_family(&mut self, family: &str) -> Result<()> {
        self.set_field(Self::VT_FONT_FAMILY, family.to_string())
    }

    /// Size in points.
    pub fn font_size(&self) -> Result<u32> {
        Ok(self.get_field(Self::VT_FONT_SIZE)?.unwrap_or(Self::DEFAULT_FONT_SIZE))
    }

    pub fn set_font_size(&mut self, points: u32) -> Result<()> {
        self.set_field(Self::VT_FONT_SIZE, points)
    }

    /// `None` leaves the text colour automatic.
    pub fn text_color(&self) -> Result<Option<ThemeColor>> {
        self.get_field(Self::VT_TEXT_COLOR)
    }

    pub fn set_text_color(&mut self, color: ThemeColor) -> Result<()> {
        self.set_field(Self::VT_TEXT_COLOR, color)
    }

    pub fn is_bold(&self) -> Result<bool> {
        Ok(self.get_field(Self::VT_IS_BOLD)?.unwrap_or(false))
    }

    pub fn set_bold(&mut self, bold: bool) -> Result<()> {
        self.set_field(Self::VT_IS_BOLD, bold)
    }

    pub fn is_italic(&self) -> Result<bool> {
        Ok(self.get_field(Self::VT_IS_ITALIC)?.unwrap_or(false))
    }

    pub fn set_italic(&mut self, italic: bool) -> Result<()> {
        self.set_field(Self::VT_IS_ITALIC, italic)
    }

    pub fn is_underline(&self) -> Result<bool> {
        Ok(self.get_field(Self::VT_IS_UNDERLINE)?.unwrap_or(false))
    }

    pub fn set_underline(&mut self, underline: bool) -> Result<()> {
        self.set_field(Self::VT_IS_UNDERLINE, underline)
    }

    /// Takes precedence over [`StyleSetting::is_underline`].
    pub fn is_double_underline(&self) -> Result<bool> {
        Ok(self.get_field(Self::VT_IS_DOUBLE_UNDERLINE)?.unwrap_or(false))
    }

    pub fn set_double_underline(&mut self, double: bool) -> Result<()> {
        self.set_field(Self::VT_IS_DOUBLE_UNDERLINE, double)
    }

    pub fn background_color(&self) -> Result<Option<ThemeColor>> {
        self.get_field(Self::VT_BACKGROUND_COLOR)
    }

    pub fn set_background_color(&mut self, color: ThemeColor) -> Result<()> {
        self.set_field(Self::VT_BACKGROUND_COLOR, color)
    }

    pub fn foreground_color(&self) -> Result<Option<ThemeColor>> {
        self.get_field(Self::VT_FOREGROUND_COLOR)
    }

    pub fn set_foreground_color(&mut self, color: ThemeColor) -> Result<()> {
        self.set_field(Self::VT_FOREGROUND_COLOR, color)
    }

    pub fn border(&self, side: BorderSide) -> Result<BorderLine> {
        let (style, color) = side.slots();
        Ok(BorderLine {
            style: self.get_field(style)?.unwrap_or_default(),
            color: self.get_field(color)?,
        })
    }

    pub fn set_border(&mut self, side: BorderSide, line: BorderLine) -> Result<()> {
        let (style, color) = side.slots();
        self.set_field(style, line.style)?;
        match line.color {
            Some(value) => self.set_field(color, value),
            None => self.clear_field(color),
        }
    }

    pub fn horizontal_alignment(&self) -> Result<HorizontalAlignment> {
        Ok(self.get_field(Self::VT_HORIZONTAL_ALIGNMENT)?.unwrap_or_default())
    }

    pub fn set_horizontal_alignment(&mut self, alignment: HorizontalAlignment) -> Result<()> {
        self.set_field(Self::VT_HORIZONTAL_ALIGNMENT, alignment)
    }

    pub fn vertical_alignment(&self) -> Result<VerticalAlignment> {
        Ok(self.get_field(Self::VT_VERTICAL_ALIGNMENT)?.unwrap_or_default())
    }

    pub fn set_vertical_alignment(&mut self, alignment: VerticalAlignment) -> Result<()> {
        self.set_field(Self::VT_VERTICAL_ALIGNMENT, alignment)
    }

    pub fn is_wrap_text(&self) -> Result<bool> {
        Ok(self.get_field(Self::VT_IS_WRAP_TEXT)?.unwrap_or(false))
    }

    pub fn set_wrap_text(&mut self, wrap: bool) -> Result<()> {
        self.set_field(Self::VT_IS_WRAP_TEXT, wrap)
    }
}

impl Default for StyleSetting {
    fn default() -> Self {
        Self::new()
    }
}

const fn field(slot: u16, name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { slot, name, kind }
}

impl PropertyModel for StyleSetting {
    const SCHEMA: &'static Schema = &Schema {
        name: "StyleSetting",
        fields: &[
            field(StyleSetting::VT_NUMBER_FORMAT, "number_format", FieldKind::String),
            field(StyleSetting::VT_FONT_FAMILY, "font_family", FieldKind::String),
            field(StyleSetting::VT_FONT_SIZE, "font_size", FieldKind::U32),
            field(StyleSetting::VT_TEXT_COLOR, "text_color", FieldKind::U32),
            field(StyleSetting::VT_IS_BOLD, "is_bold", FieldKind::Bool),
            field(StyleSetting::VT_IS_ITALIC, "is_italic", FieldKind::Bool),
            field(StyleSetting::VT_IS_UNDERLINE, "is_underline", FieldKind::Bool),
            field(StyleSetting::VT_IS_DOUBLE_UNDERLINE, "is_double_underline", FieldKind::Bool),
            field(StyleSetting::VT_BACKGROUND_COLOR, "background_color", FieldKind::U32),
            field(StyleSetting::VT_FOREGROUND_COLOR, "foreground_color", FieldKind::U32),
            field(StyleSetting::VT_BORDER_LEFT, "border_left", FieldKind::U32),
            field(StyleSetting::VT_BORDER_LEFT_COLOR, "border_left_color", FieldKind::U32),
            field(StyleSetting::VT_BORDER_RIGHT, "border_right", FieldKind::U32),
            field(StyleSetting::VT_BORDER_RIGHT_COLOR, "border_right_color", FieldKind::U32),
            field(StyleSetting::VT_BORDER_TOP, "border_top", FieldKind::U32),
            field(StyleSetting::VT_BORDER_TOP_COLOR, "border_top_color", FieldKind::U32),
            field(StyleSetting::VT_BORDER_BOTTOM, "border_bottom", FieldKind::U32),
            field(StyleSetting::VT_BORDER_BOTTOM_COLOR, "border_bottom_color", FieldKind::U32),
            field(StyleSetting::VT_HORIZONTAL_ALIGNMENT, "horizontal_alignment", FieldKind::U32),
            field(StyleSetting::VT_VERTICAL_ALIGNMENT, "vertical_alignment", FieldKind::U32),
            field(StyleSetting::VT_IS_WRAP_TEXT, "is_wrap_text", FieldKind::Bool),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let setting = StyleSetting::new();
        assert_eq!(setting.number_format().unwrap(), "");
        assert_eq!(setting.font_family().unwrap(), "Calibri");
        assert_eq!(setting.font_size().unwrap(), 11);
        assert_eq!(setting.text_color().unwrap(), None);
        assert!(!setting.is_bold().unwrap());
        assert_eq!(setting.border(BorderSide::Top).unwrap(), BorderLine::default());
        assert_eq!(setting.horizontal_alignment().unwrap(), HorizontalAlignment::None);
        assert_eq!(setting.vertical_alignment().unwrap(), VerticalAlignment::None);
    }

    #[test]
    fn test_fields_round_trip() {
        let red = ThemeColor::rgb(0xFF, 0, 0);
        let mut setting = StyleSetting::new();
        setting.set_number_format("0.00%").unwrap();
        setting.set_font_family("Arial").unwrap();
        setting.set_font_size(14).unwrap();
        setting.set_text_color(red).unwrap();
        setting.set_italic(true).unwrap();
        setting.set_double_underline(true).unwrap();
        setting.set_foreground_color(ThemeColor::rgb(0xDD, 0xEB, 0xF7)).unwrap();
        setting
            .set_border(
                BorderSide::Bottom,
                BorderLine {
                    style: BorderStyle::MediumDashDot,
                    color: Some(red),
                },
            )
            .unwrap();
        setting.set_horizontal_alignment(HorizontalAlignment::Justify).unwrap();
        setting.set_vertical_alignment(VerticalAlignment::Middle).unwrap();
        setting.set_wrap_text(true).unwrap();

        let decoded = StyleSetting::from_bytes(setting.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.number_format().unwrap(), "0.00%");
        assert_eq!(decoded.font_family().unwrap(), "Arial");
        assert_eq!(decoded.font_size().unwrap(), 14);
        assert_eq!(decoded.text_color().unwrap(), Some(red));
        assert!(decoded.is_italic().unwrap());
        assert!(decoded.is_double_underline().unwrap());
        assert!(!decoded.is_bold().unwrap());
        assert_eq!(
            decoded.border(BorderSide::Bottom).unwrap(),
            BorderLine {
                style: BorderStyle::MediumDashDot,
                color: Some(red)
            }
        );
        assert_eq!(decoded.border(BorderSide::Left).unwrap().style, BorderStyle::None);
        assert_eq!(decoded.horizontal_alignment().unwrap(), HorizontalAlignment::Justify);
        assert_eq!(decoded.vertical_alignment().unwrap(), VerticalAlignment::Middle);
        assert!(decoded.is_wrap_text().unwrap());
    }

    #[test]
    fn test_border_colour_can_be_dropped() {
        let mut setting = StyleSetting::new();
        let line = BorderLine {
            style: BorderStyle::Thin,
            color: Some(ThemeColor::rgb(1, 2, 3)),
        };
        setting.set_border(BorderSide::Left, line).unwrap();
        setting
            .set_border(
                BorderSide::Left,
                BorderLine {
                    color: None,
                    ..line
                },
            )
            .unwrap();
        assert_eq!(setting.border(BorderSide::Left).unwrap().color, None);
    }

    #[test]
    fn test_unknown_enum_value_is_a_mismatch() {
        let mut builder = crate::schema::TableBuilder::new();
        builder.set(StyleSetting::VT_BORDER_TOP, &99u32).unwrap();
        let setting = StyleSetting::from_bytes(builder.finish().unwrap()).unwrap();
        assert!(matches!(
            setting.border(BorderSide::Top),
            Err(SchemaError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_xml_values() {
        for style in BorderStyle::ALL {
            assert_eq!(BorderStyle::from_xml_value(style.xml_value()), Some(*style));
        }
        assert_eq!(VerticalAlignment::Middle.xml_value(), "center");
        assert_eq!(HorizontalAlignment::from_xml_value("fill"), None);
    }
}

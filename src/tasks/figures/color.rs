use anyhow::Result;
use log::error;
use plotters::prelude::RGBColor;

pub static FONT_FAMILY: &str = "serif";
pub static TITLE_FONT_SIZE: u32 = 28;
pub static LABEL_FONT_SIZE: u32 = 22;
pub static TICK_FONT_SIZE: u32 = 18;
pub static NOTE_FONT_SIZE: u32 = 16;
pub static STROKE_WIDTH: u32 = 3;

/// Resolve a palette label, or a `#rrggbb` literal, to a colour.
pub fn get_color_from_label(label: &str) -> Result<RGBColor> {
    match label {
        "helios" | "dark-blue" => Ok(RGBColor(0x1a, 0x54, 0x90)),
        "steel-blue" => Ok(RGBColor(0x2c, 0x5f, 0x8d)),
        "sky-blue" => Ok(RGBColor(0x5d, 0xad, 0xe2)),
        "light-blue" => Ok(RGBColor(0x74, 0xad, 0xd1)),
        "pale-blue" => Ok(RGBColor(0x85, 0xc1, 0xe9)),
        "ocean" => Ok(RGBColor(0x2e, 0x86, 0xab)),
        "orange" => Ok(RGBColor(0xe6, 0x7e, 0x22)),
        "amber" => Ok(RGBColor(0xf3, 0x9c, 0x12)),
        "peach" => Ok(RGBColor(0xfd, 0xae, 0x61)),
        "gray" => Ok(RGBColor(0x7f, 0x7f, 0x7f)),
        "dark-gray" => Ok(RGBColor(0x33, 0x33, 0x33)),
        "red" => Ok(RGBColor(0xd6, 0x27, 0x28)),
        "plum" => Ok(RGBColor(0xa2, 0x3b, 0x72)),
        _ => parse_hex(label).ok_or_else(|| {
            error!("unrecognized label for color (label={label})");
            anyhow::anyhow!("unrecognized label (label={label})")
        }),
    }
}

fn parse_hex(label: &str) -> Option<RGBColor> {
    let hex = label.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 130, g: 210, b: 130 };
pub const ACCENT: Color = Color::TrueColor { r: 240, g: 200, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 200, g: 200, b: 200 };
pub const IPV4_ADDR: Color = Color::TrueColor { r: 100, g: 180, b: 255 };
pub const IPV4_PREFIX: Color = Color::TrueColor { r: 70, g: 130, b: 200 };
pub const MAC_ADDR: Color = Color::TrueColor { r: 230, g: 140, b: 220 };

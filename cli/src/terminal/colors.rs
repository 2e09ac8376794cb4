use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 120, g: 200, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 190, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_ADDR: Color = Color::TrueColor { r: 110, g: 230, b: 150 };
pub const IPV6_ADDR: Color = Color::TrueColor { r: 170, g: 140, b: 255 };
pub const IPV4_PREFIX: Color = Color::TrueColor { r: 60, g: 160, b: 100 };

pub const PORT_OPEN: Color = Color::Green;

// src/ui.rs
use iced::Color;
use once_cell::sync::Lazy;

pub struct Styles {
    pub bg: Color,
    pub fg: Color,
    pub panel_bg: Color,
    pub muted_fg: Color,
    pub header_bg: Color,
    pub grid_line: Color,
    pub accent: Color,
    pub accent_fg: Color,
    pub danger: Color,
    pub footer_bg: Color,
    pub footer_fg: Color,
}

pub static LIGHT_THEME: Lazy<Styles> = Lazy::new(|| Styles {
    bg: Color::from_rgb(0.945, 0.961, 0.976), // #f1f5f9
    fg: Color::from_rgb(0.059, 0.090, 0.165), // #0f172a
    panel_bg: Color::from_rgb(1.0, 1.0, 1.0),
    muted_fg: Color::from_rgb(0.392, 0.455, 0.545), // #64748b
    header_bg: Color::from_rgb(0.886, 0.910, 0.941), // #e2e8f0
    grid_line: Color::from_rgb(0.796, 0.835, 0.882), // #cbd5e1
    accent: Color::from_rgb(0.310, 0.275, 0.898), // #4f46e5
    accent_fg: Color::from_rgb(1.0, 1.0, 1.0),
    danger: Color::from_rgb(0.882, 0.114, 0.282), // #e11d48
    footer_bg: Color::from_rgb(0.118, 0.161, 0.231), // #1e293b
    footer_fg: Color::from_rgb(0.886, 0.910, 0.941),
});

use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub primary: Color,   // Blue
    pub secondary: Color, // Orange
    pub comment: Color,   // Grey
    pub error: Color,     // Red
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    pub selected_bg: Color,
    pub tag: Color,      // Markup tags / tree node kinds
    pub attr_key: Color, // Attribute names
    pub literal: Color,  // Strings and numbers
    pub selector: Color, // CSS selectors
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),   // Blue
    secondary: Color::Rgb(250, 179, 135), // Orange
    comment: Color::Rgb(108, 112, 134),
    error: Color::Rgb(243, 139, 168),
    border_focused: Color::Rgb(249, 226, 175), // Yellow border for focus
    border_normal: Color::Rgb(108, 112, 134),  // Grey border for normal
    current_line_bg: Color::Rgb(50, 50, 70),   // Slightly lighter BG for cursor line
    selected_bg: Color::Rgb(69, 71, 90),       // Selected tree row
    tag: Color::Rgb(137, 180, 250),            // Blue for tags
    attr_key: Color::Rgb(148, 226, 213),       // Cyan/teal for attribute names
    literal: Color::Rgb(250, 179, 135),        // Orange for strings and numbers
    selector: Color::Rgb(249, 226, 175),       // Yellow for CSS selectors
};

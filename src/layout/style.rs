//! Page geometry and the fixed text style table.

/// A4 portrait in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

/// Distance from the bottom edge to the footer baseline.
pub const FOOTER_OFFSET: f32 = 20.0;

/// Vertical space a blank body line adds.
pub const BLANK_LINE_ADVANCE: f32 = 10.0;

/// Fixed page dimensions shared by every content page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin: 50.0,
        }
    }
}

impl PageGeometry {
    pub fn printable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest y (measured from the top) any block may reach.
    pub fn bottom(&self) -> f32 {
        self.height - self.margin
    }
}

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const LABEL: Color = Color::rgb(40, 40, 40);
    pub const LINK: Color = Color::rgb(0, 0, 238);
    pub const FOOTER: Color = Color::rgb(150, 150, 150);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components scaled to 0.0..=1.0 for PDF colour operators.
    pub fn unit(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

/// Every kind of text the layout engine places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    Title,
    Heading,
    Body,
    SourcesHeading,
    SourceLabel,
    SourceLink,
    Footer,
}

/// Font and spacing for one [`TextStyle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageStyle {
    pub bold: bool,
    pub size: f32,
    pub line_height: f32,
    /// Space above the block; dropped at the top of a page.
    pub pre: f32,
    /// Space below the block.
    pub post: f32,
    pub color: Color,
}

impl TextStyle {
    pub fn page_style(self) -> PageStyle {
        let (bold, size, line_height, pre, post, color) = match self {
            TextStyle::Title => (true, 24.0, 28.0, 0.0, 20.0, Color::BLACK),
            TextStyle::Heading => (true, 16.0, 20.0, 6.0, 15.0, Color::BLACK),
            TextStyle::Body => (false, 11.0, 14.0, 0.0, 5.0, Color::BLACK),
            TextStyle::SourcesHeading => (true, 18.0, 25.0, 0.0, 0.0, Color::BLACK),
            TextStyle::SourceLabel => (false, 9.0, 12.0, 0.0, 0.0, Color::LABEL),
            TextStyle::SourceLink => (false, 9.0, 12.0, 0.0, 6.0, Color::LINK),
            TextStyle::Footer => (false, 8.0, 10.0, 0.0, 0.0, Color::FOOTER),
        };
        PageStyle {
            bold,
            size,
            line_height,
            pre,
            post,
            color,
        }
    }
}

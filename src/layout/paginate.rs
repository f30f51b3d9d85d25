//! Flow the title, body and sources into fixed-size pages.
//!
//! Produces a page model with absolute positions (y measured from the top
//! edge); [`super::pdf`] only draws what is placed here. Every placed block
//! satisfies `top + height <= geometry.bottom()`.

use super::metrics::{elide, text_width, wrap_text};
use super::style::{PageGeometry, TextStyle, BLANK_LINE_ADVANCE};
use super::LayoutOptions;
use crate::sources::Source;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s+").unwrap());

/// Where the next block goes: content page index (covers excluded) and
/// offset from the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page: usize,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One or more lines of the same style drawn together.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub style: TextStyle,
    pub align: Align,
    pub lines: Vec<String>,
    /// Top edge of the first line.
    pub top: f32,
    /// `lines.len() * line_height`; spacing is not included.
    pub height: f32,
    /// Target of a URI link annotation covering the block.
    pub link: Option<String>,
}

impl PlacedBlock {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFooter {
    pub page_label: String,
    pub attribution: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentPage {
    /// 1-based over content pages.
    pub number: usize,
    pub blocks: Vec<PlacedBlock>,
    pub footer: Option<PageFooter>,
}

/// A physical page of the finished book.
#[derive(Debug, Clone, PartialEq)]
pub enum LaidOutPage {
    FrontCover,
    Content(ContentPage),
    BackCover,
}

impl LaidOutPage {
    pub fn as_content(&self) -> Option<&ContentPage> {
        match self {
            LaidOutPage::Content(page) => Some(page),
            _ => None,
        }
    }
}

/// Lay out a whole book: front cover, content pages, back cover.
pub fn paginate(
    geometry: PageGeometry,
    options: &LayoutOptions,
    title: &str,
    body: &str,
    sources: &[Source],
) -> Vec<LaidOutPage> {
    let mut p = Paginator::new(geometry);

    p.place_text(TextStyle::Title, Align::Center, title, None);

    for raw in body.lines().skip(1) {
        let line = raw.trim();
        if line.is_empty() {
            p.cursor.y += BLANK_LINE_ADVANCE;
            continue;
        }
        let style = if line.starts_with("## ") {
            TextStyle::Heading
        } else {
            TextStyle::Body
        };
        let text = RE_HEADING_MARKER.replace(line, "");
        p.place_text(style, Align::Left, &text, None);
    }

    if !sources.is_empty() {
        p.place_sources(&options.sources_heading, sources);
    }

    let mut pages = p.finish();
    for page in &mut pages {
        page.footer = Some(PageFooter {
            page_label: format!("{} {}", options.page_label, page.number),
            attribution: options.attribution.clone(),
        });
    }
    debug!("Laid out {} content page(s)", pages.len());

    std::iter::once(LaidOutPage::FrontCover)
        .chain(pages.into_iter().map(LaidOutPage::Content))
        .chain(std::iter::once(LaidOutPage::BackCover))
        .collect()
}

struct Paginator {
    geometry: PageGeometry,
    pages: Vec<ContentPage>,
    cursor: LayoutCursor,
}

impl Paginator {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![ContentPage {
                number: 1,
                blocks: Vec::new(),
                footer: None,
            }],
            cursor: LayoutCursor {
                page: 0,
                y: geometry.margin,
            },
        }
    }

    fn at_page_top(&self) -> bool {
        self.cursor.y <= self.geometry.margin
    }

    fn remaining(&self) -> f32 {
        self.geometry.bottom() - self.cursor.y
    }

    fn new_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(ContentPage {
            number,
            blocks: Vec::new(),
            footer: None,
        });
        self.cursor = LayoutCursor {
            page: number - 1,
            y: self.geometry.margin,
        };
    }

    fn push_block(&mut self, block: PlacedBlock) {
        debug_assert!(block.bottom() <= self.geometry.bottom() + 1e-3);
        self.pages[self.cursor.page].blocks.push(block);
    }

    /// Wrap `text` and place it, breaking to a new page when the whole block
    /// (spacing included) does not fit in what is left of this one.
    fn place_text(&mut self, style: TextStyle, align: Align, text: &str, link: Option<String>) {
        let ps = style.page_style();
        let lines = wrap_text(text, self.geometry.printable_width(), ps.bold, ps.size);
        if lines.is_empty() {
            return;
        }

        let block_height = lines.len() as f32 * ps.line_height;
        let mut pre = if self.at_page_top() { 0.0 } else { ps.pre };
        if pre + block_height + ps.post > self.remaining() && !self.at_page_top() {
            self.new_page();
            pre = 0.0;
        }

        // Taller than a whole page: fill page after page line by line.
        let mut rest = lines.as_slice();
        loop {
            let top = self.cursor.y + pre;
            let fit = ((self.geometry.bottom() - top) / ps.line_height).floor().max(0.0) as usize;
            if fit == 0 && !self.at_page_top() {
                self.new_page();
                pre = 0.0;
                continue;
            }
            let (now, later) = rest.split_at(fit.clamp(1, rest.len()));
            let height = now.len() as f32 * ps.line_height;
            self.push_block(PlacedBlock {
                style,
                align,
                lines: now.to_vec(),
                top,
                height,
                link: link.clone(),
            });
            self.cursor.y = top + height;
            if later.is_empty() {
                break;
            }
            rest = later;
            self.new_page();
            pre = 0.0;
        }
        self.cursor.y += ps.post;
    }

    fn place_sources(&mut self, heading: &str, sources: &[Source]) {
        if !self.at_page_top() {
            self.new_page();
        }
        self.place_text(TextStyle::SourcesHeading, Align::Left, heading, None);

        let width = self.geometry.printable_width();
        let label_style = TextStyle::SourceLabel.page_style();
        let link_style = TextStyle::SourceLink.page_style();
        let entry_height = label_style.line_height + link_style.line_height + link_style.post;

        for source in sources {
            if entry_height > self.remaining() && !self.at_page_top() {
                self.new_page();
            }
            let label = elide(source.label(), width, label_style.bold, label_style.size);
            self.place_line(TextStyle::SourceLabel, label, None);

            let link_text = elide(
                &format!("({})", source.uri),
                width,
                link_style.bold,
                link_style.size,
            );
            self.place_line(TextStyle::SourceLink, link_text, Some(source.uri.clone()));
        }
    }

    /// Place a single pre-fitted line at the cursor.
    fn place_line(&mut self, style: TextStyle, text: String, link: Option<String>) {
        let ps = style.page_style();
        let top = self.cursor.y;
        self.push_block(PlacedBlock {
            style,
            align: Align::Left,
            lines: vec![text],
            top,
            height: ps.line_height,
            link,
        });
        self.cursor.y = top + ps.line_height + ps.post;
    }

    fn finish(self) -> Vec<ContentPage> {
        self.pages
    }
}

/// Horizontal start of a line.
pub fn line_x(geometry: &PageGeometry, style: TextStyle, align: Align, line: &str) -> f32 {
    match align {
        Align::Left => geometry.margin,
        Align::Center => {
            let ps = style.page_style();
            let w = text_width(line, ps.bold, ps.size);
            geometry.margin + (geometry.printable_width() - w).max(0.0) / 2.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(body: &str, sources: &[Source]) -> Vec<LaidOutPage> {
        paginate(
            PageGeometry::default(),
            &LayoutOptions::default(),
            "The Deep",
            body,
            sources,
        )
    }

    fn content(pages: &[LaidOutPage]) -> Vec<&ContentPage> {
        pages.iter().filter_map(LaidOutPage::as_content).collect()
    }

    fn assert_no_overflow(pages: &[LaidOutPage]) {
        let g = PageGeometry::default();
        for page in content(pages) {
            for block in &page.blocks {
                assert!(
                    block.bottom() <= g.bottom() + 1e-3,
                    "block {:?} overflows page {}",
                    block.lines.first(),
                    page.number
                );
                assert!(block.top >= g.margin - 1e-3);
            }
        }
    }

    #[test]
    fn covers_wrap_the_content() {
        let pages = layout("# The Deep\nHello", &[]);
        assert_eq!(pages.first(), Some(&LaidOutPage::FrontCover));
        assert_eq!(pages.last(), Some(&LaidOutPage::BackCover));
        assert_eq!(pages.len(), 3);
    }

    #[test]
    fn title_then_headings_and_body() {
        let pages = layout("# The Deep\n\n## Chapter 1: Water\nWaves.\n### Small\n", &[]);
        let page = content(&pages)[0];
        let styles: Vec<_> = page.blocks.iter().map(|b| (b.style, b.lines[0].as_str())).collect();
        assert_eq!(
            styles,
            vec![
                (TextStyle::Title, "The Deep"),
                (TextStyle::Heading, "Chapter 1: Water"),
                (TextStyle::Body, "Waves."),
                (TextStyle::Body, "Small"),
            ]
        );
        assert_eq!(page.blocks[0].align, Align::Center);
        // Title 28 + 20 post, blank 10, heading pre 6.
        assert!((page.blocks[1].top - (50.0 + 48.0 + 10.0 + 6.0)).abs() < 1e-3);
    }

    #[test]
    fn long_text_never_overflows() {
        let paragraph = "The abyssal plain stretches across the ocean floor. ".repeat(12);
        let mut body = String::from("# The Deep\n");
        for i in 1..=10 {
            body.push_str(&format!("## Chapter {i}\n{paragraph}\n\n"));
        }
        let pages = layout(&body, &[]);
        assert!(content(&pages).len() > 2);
        assert_no_overflow(&pages);
    }

    #[test]
    fn paragraph_taller_than_a_page_is_split() {
        let huge = "word ".repeat(5000);
        let pages = layout(&format!("# T\n{huge}"), &[]);
        assert_no_overflow(&pages);
        let body_pages = content(&pages)
            .iter()
            .filter(|p| p.blocks.iter().any(|b| b.style == TextStyle::Body))
            .count();
        assert!(body_pages >= 2);
    }

    #[test]
    fn footers_number_content_pages() {
        let huge = "word ".repeat(5000);
        let pages = layout(&format!("# T\n{huge}"), &[]);
        for (i, page) in content(&pages).iter().enumerate() {
            let footer = page.footer.as_ref().unwrap();
            assert_eq!(footer.page_label, format!("Page {}", i + 1));
            assert_eq!(footer.attribution, "Content synthesized by Google Gemini.");
        }
    }

    #[test]
    fn sources_on_their_own_page_in_order() {
        let sources = vec![
            Source::new("https://a.example", "Alpha"),
            Source::new("https://b.example", ""),
            Source::new("https://c.example", "Gamma"),
        ];
        let pages = layout("# The Deep\nBody", &sources);
        let cp = content(&pages);
        assert_eq!(cp.len(), 2);
        let src = cp[1];
        assert_eq!(src.blocks[0].style, TextStyle::SourcesHeading);
        assert_eq!(src.blocks[0].lines[0], "Sources");

        let labels: Vec<_> = src
            .blocks
            .iter()
            .filter(|b| b.style == TextStyle::SourceLabel)
            .map(|b| b.lines[0].as_str())
            .collect();
        assert_eq!(labels, vec!["Alpha", "https://b.example", "Gamma"]);

        let links: Vec<_> = src.blocks.iter().filter_map(|b| b.link.as_deref()).collect();
        assert_eq!(
            links,
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
        let link_lines: Vec<_> = src
            .blocks
            .iter()
            .filter(|b| b.style == TextStyle::SourceLink)
            .map(|b| b.lines[0].as_str())
            .collect();
        assert_eq!(link_lines[0], "(https://a.example)");
    }

    #[test]
    fn many_sources_keep_entries_together() {
        let sources: Vec<_> = (0..80)
            .map(|i| Source::new(format!("https://s{i}.example"), format!("Source {i}")))
            .collect();
        let pages = layout("# T\nBody", &sources);
        assert_no_overflow(&pages);
        for page in content(&pages) {
            if let Some(first) = page
                .blocks
                .iter()
                .find(|b| matches!(b.style, TextStyle::SourceLabel | TextStyle::SourceLink))
            {
                assert_eq!(first.style, TextStyle::SourceLabel, "entry split across pages");
            }
        }
    }

    #[test]
    fn no_sources_no_sources_page() {
        let pages = layout("# T\nBody", &[]);
        assert!(content(&pages)
            .iter()
            .all(|p| p.blocks.iter().all(|b| b.style != TextStyle::SourcesHeading)));
    }
}

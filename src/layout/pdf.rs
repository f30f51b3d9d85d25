//! PDF serialisation of a laid-out book with `lopdf`.
//!
//! Builds the object graph directly: one shared font resource dictionary for
//! content pages, one image XObject per cover, FlateDecode content streams
//! and URI link annotations for the source list.

use super::cover::EncodedImage;
use super::metrics::{encode_win_ansi, text_width};
use super::paginate::{line_x, Align, ContentPage, LaidOutPage, PlacedBlock};
use super::style::{Color, PageGeometry, TextStyle, FOOTER_OFFSET};
use crate::error::EbookError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;

/// Baseline sits this fraction of the font size below the line top.
const ASCENT: f32 = 0.8;

fn deflate(raw: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    encoder.finish()
}

/// Writes a sequence of [`LaidOutPage`]s into a single PDF document.
pub struct PdfWriter {
    document: Document,
    geometry: PageGeometry,
    pages_id: ObjectId,
    text_resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl PdfWriter {
    pub fn new(geometry: PageGeometry) -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let regular = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let text_resources_id = document.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        Self {
            document,
            geometry,
            pages_id,
            text_resources_id,
            page_ids: Vec::new(),
        }
    }

    /// Serialise `pages`, drawing `front`/`back` on the cover pages.
    pub fn write(
        mut self,
        title: &str,
        pages: &[LaidOutPage],
        front: &EncodedImage,
        back: &EncodedImage,
    ) -> Result<Vec<u8>, EbookError> {
        for page in pages {
            match page {
                LaidOutPage::FrontCover => self.add_cover_page(front)?,
                LaidOutPage::Content(content) => self.add_content_page(content)?,
                LaidOutPage::BackCover => self.add_cover_page(back)?,
            }
        }
        self.finish(title)
    }

    fn add_cover_page(&mut self, image: &EncodedImage) -> Result<(), EbookError> {
        let g = self.geometry;
        let image_id = self.document.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.width),
                "Height" => i64::from(image.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.jpeg.clone(),
        ));

        // Stretched to the full page; no margins on covers.
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        g.width.into(),
                        0.into(),
                        0.into(),
                        g.height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im1".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let resources = dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        };
        self.add_page(content, Object::Dictionary(resources), Vec::new())
    }

    fn add_content_page(&mut self, page: &ContentPage) -> Result<(), EbookError> {
        let mut ops = PageOps::new(self.geometry);
        let mut annots = Vec::new();

        for block in &page.blocks {
            ops.draw_block(block);
            if let Some(uri) = &block.link {
                annots.push(self.link_annotation(block, uri));
            }
        }
        if let Some(footer) = &page.footer {
            let g = self.geometry;
            let baseline = g.height - FOOTER_OFFSET;
            let label_x = line_x(&g, TextStyle::Footer, Align::Center, &footer.page_label);
            ops.draw_line(TextStyle::Footer, label_x, baseline, &footer.page_label);
            ops.draw_line(TextStyle::Footer, g.margin, baseline, &footer.attribution);
        }

        let resources = Object::Reference(self.text_resources_id);
        self.add_page(ops.finish(), resources, annots)
    }

    fn link_annotation(&mut self, block: &PlacedBlock, uri: &str) -> ObjectId {
        let g = self.geometry;
        let ps = block.style.page_style();
        let width = block
            .lines
            .iter()
            .map(|l| text_width(l, ps.bold, ps.size))
            .fold(0.0_f32, f32::max);
        let x = line_x(&g, block.style, block.align, block.lines.first().map_or("", |l| l));
        let rect: Vec<Object> = vec![
            x.into(),
            (g.height - block.bottom()).into(),
            (x + width).into(),
            (g.height - block.top).into(),
        ];
        let no_border: Vec<Object> = vec![0.into(), 0.into(), 0.into()];
        self.document.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => rect,
            "Border" => no_border,
            "A" => dictionary! {
                "S" => "URI",
                "URI" => Object::string_literal(uri.as_bytes().to_vec()),
            },
        })
    }

    fn add_page(
        &mut self,
        content: Content,
        resources: Object,
        annots: Vec<ObjectId>,
    ) -> Result<(), EbookError> {
        let g = self.geometry;
        let raw = content
            .encode()
            .map_err(|e| EbookError::LayoutFailed(format!("encoding page content: {e}")))?;
        let compressed = deflate(&raw)
            .map_err(|e| EbookError::LayoutFailed(format!("compressing page content: {e}")))?;
        let content_id = self.document.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            compressed,
        ));

        let media_box: Vec<Object> = vec![0.into(), 0.into(), g.width.into(), g.height.into()];
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => resources,
        };
        if !annots.is_empty() {
            let refs: Vec<Object> = annots.into_iter().map(Object::Reference).collect();
            page.set("Annots", refs);
        }
        let page_id = self.document.add_object(page);
        self.page_ids.push(page_id);
        Ok(())
    }

    fn finish(mut self, title: &str) -> Result<Vec<u8>, EbookError> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let info_id = self.document.add_object(info_dictionary(title));
        self.document.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|e| EbookError::LayoutFailed(format!("writing PDF: {e}")))?;
        Ok(bytes)
    }
}

/// Document info with the title as a UTF-16BE text string.
fn info_dictionary(title: &str) -> Dictionary {
    let mut utf16 = vec![0xFE, 0xFF];
    for unit in title.encode_utf16() {
        utf16.extend_from_slice(&unit.to_be_bytes());
    }
    dictionary! {
        "Title" => Object::String(utf16, StringFormat::Hexadecimal),
        "Producer" => Object::string_literal(concat!("edgequake-ebook ", env!("CARGO_PKG_VERSION"))),
    }
}

/// Content-stream builder for one text page; tracks font and colour to
/// avoid redundant state operators.
struct PageOps {
    geometry: PageGeometry,
    operations: Vec<Operation>,
    font: Option<(bool, f32)>,
    color: Option<Color>,
}

impl PageOps {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            operations: Vec::new(),
            font: None,
            color: None,
        }
    }

    fn draw_block(&mut self, block: &PlacedBlock) {
        let ps = block.style.page_style();
        for (i, line) in block.lines.iter().enumerate() {
            let top = block.top + i as f32 * ps.line_height;
            let x = line_x(&self.geometry, block.style, block.align, line);
            let baseline = top + ps.size * ASCENT;
            self.draw_line(block.style, x, baseline, line);
        }
    }

    /// Draw `text` with its baseline `baseline` points below the top edge.
    fn draw_line(&mut self, style: TextStyle, x: f32, baseline: f32, text: &str) {
        let ps = style.page_style();
        let y = self.geometry.height - baseline;

        self.operations.push(Operation::new("BT", vec![]));
        if self.font != Some((ps.bold, ps.size)) {
            let name = if ps.bold { "F2" } else { "F1" };
            self.operations
                .push(Operation::new("Tf", vec![name.into(), ps.size.into()]));
            self.font = Some((ps.bold, ps.size));
        }
        if self.color != Some(ps.color) {
            let [r, g, b] = ps.color.unit();
            self.operations
                .push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
            self.color = Some(ps.color);
        }
        self.operations
            .push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(text))],
        ));
        self.operations.push(Operation::new("ET", vec![]));
    }

    fn finish(self) -> Content {
        Content {
            operations: self.operations,
        }
    }
}

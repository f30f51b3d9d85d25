//! Document layout: from generated text and covers to a paginated PDF.
//!
//! ## Page Sequence
//!
//! | Page | Content |
//! |------|---------|
//! | 1 | Front cover, full bleed |
//! | 2… | Title (centered), then headings and paragraphs |
//! | … | Sources with clickable links (only when there are any) |
//! | last | Back cover, full bleed |
//!
//! Every content page carries a "Page k" footer and the attribution line.
//! Layout is deterministic: the same input always yields the same page model.

pub mod cover;
pub mod metrics;
pub mod paginate;
pub mod pdf;
pub mod style;

use crate::document::{GeneratedDocument, RenderedEbook};
use crate::error::EbookError;
use crate::filename::pdf_file_name;
use crate::sources::Source;
use cover::prepare_cover;
use paginate::{paginate, LaidOutPage};
use pdf::PdfWriter;
use serde::{Deserialize, Serialize};
use style::PageGeometry;
use tracing::info;

/// Fixed labels printed by the layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Heading of the citation page.
    pub sources_heading: String,
    /// Footer prefix; the page number follows after a space.
    pub page_label: String,
    /// Footer line at the left margin of every content page.
    pub attribution: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            sources_heading: "Sources".to_string(),
            page_label: "Page".to_string(),
            attribution: "Content synthesized by Google Gemini.".to_string(),
        }
    }
}

impl LayoutOptions {
    /// Labels translated for a request's language code.
    ///
    /// Codes without a translation get the English defaults.
    pub fn for_language(code: &str) -> Self {
        let (sources_heading, page_label, attribution) = match code.to_ascii_lowercase().as_str() {
            "pt" => ("Fontes", "Página", "Conteúdo sintetizado por Google Gemini."),
            "es" => ("Fuentes", "Página", "Contenido sintetizado por Google Gemini."),
            "fr" => ("Sources", "Page", "Contenu synthétisé par Google Gemini."),
            "de" => ("Quellen", "Seite", "Inhalt erstellt von Google Gemini."),
            _ => return Self::default(),
        };
        Self {
            sources_heading: sources_heading.to_string(),
            page_label: page_label.to_string(),
            attribution: attribution.to_string(),
        }
    }
}

/// Turns a [`GeneratedDocument`] into a [`RenderedEbook`].
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    options: LayoutOptions,
    geometry: PageGeometry,
}

impl LayoutEngine {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            geometry: PageGeometry::default(),
        }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Compute the page model without drawing anything.
    pub fn paginate(&self, title: &str, body: &str, sources: &[Source]) -> Vec<LaidOutPage> {
        paginate(self.geometry, &self.options, title, body, sources)
    }

    /// Lay out and serialise the whole book.
    ///
    /// # Errors
    /// [`EbookError::LayoutFailed`] when a cover cannot be decoded or the PDF
    /// cannot be written. No partial output is returned.
    pub fn render(
        &self,
        document: &GeneratedDocument,
        title: &str,
    ) -> Result<RenderedEbook, EbookError> {
        let front = prepare_cover(&document.front_cover, "front cover")?;
        let back = prepare_cover(&document.back_cover, "back cover")?;

        let pages = self.paginate(title, &document.body, &document.sources);
        let page_count = pages.len();
        let bytes = PdfWriter::new(self.geometry).write(title, &pages, &front, &back)?;

        let file_name = pdf_file_name(title);
        info!(
            "Rendered {} ({} pages, {} bytes)",
            file_name,
            page_count,
            bytes.len()
        );
        Ok(RenderedEbook {
            bytes,
            file_name,
            page_count,
        })
    }
}

//! PDF text and image extraction using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    /// Per-page text from pdf-extract, `None` when it failed on this file.
    page_texts: OnceLock<Option<Vec<String>>>,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            page_texts: OnceLock::new(),
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document()?
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    fn page_texts(&self) -> Option<&Vec<String>> {
        self.page_texts
            .get_or_init(|| {
                // pdf-extract panics on some malformed content streams
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
                }));
                match result {
                    Ok(Ok(pages)) => Some(pages),
                    Ok(Err(e)) => {
                        warn!("pdf-extract failed, using lopdf text extraction: {}", e);
                        None
                    }
                    Err(payload) => {
                        warn!(
                            "pdf-extract panicked, using lopdf text extraction: {}",
                            crate::assembler::panic_message(payload.as_ref())
                        );
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Look up a page attribute, following the `Parent` chain for inherited ones.
    fn inherited<'a>(&self, doc: &'a Document, node_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
        let mut current = node_id;
        // page trees are shallow; the bound guards against reference cycles
        for _ in 0..32 {
            let dict = doc.get_dictionary(current).ok()?;
            if let Ok(value) = dict.get(key) {
                return doc.dereference(value).ok().map(|(_, obj)| obj);
            }
            current = dict.get(b"Parent").ok()?.as_reference().ok()?;
        }
        None
    }

    fn page_resources<'a>(&self, doc: &'a Document, page_id: ObjectId) -> Option<&'a Dictionary> {
        self.inherited(doc, page_id, b"Resources")?.as_dict().ok()
    }

    /// Page width in points from its MediaBox.
    fn page_width_points(&self, doc: &Document, page_id: ObjectId) -> Option<f32> {
        let media_box = self.inherited(doc, page_id, b"MediaBox")?.as_array().ok()?;
        let coords: Vec<f32> = media_box.iter().filter_map(|o| o.as_float().ok()).collect();
        match coords.as_slice() {
            [x0, _, x1, _] if x1 > x0 => Some(x1 - x0),
            _ => None,
        }
    }

    /// Images placed on a page through its XObject resources.
    fn page_images(&self, doc: &Document, page_id: ObjectId) -> Vec<DynamicImage> {
        let Some(resources) = self.page_resources(doc, page_id) else {
            return Vec::new();
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Vec::new();
        };
        let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) else {
            return Vec::new();
        };

        xobj_dict
            .iter()
            .filter_map(|(_, obj_ref)| doc.dereference(obj_ref).ok())
            .filter_map(|(_, obj)| self.decode_image(doc, obj))
            .collect()
    }

    fn decode_image(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                        .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Unsupported image filter");
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        raw_image(&data, width, height, color_space)
    }
}

/// Decode uncompressed 8-bit RGB or gray samples.
fn raw_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);

    let rgba: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => data[..pixels * 3]
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            data[..pixels].iter().flat_map(|&g| [g, g, g, 255]).collect()
        }
        _ => {
            trace!("Could not decode image: data_len={}, pixels={}", data.len(), pixels);
            return None;
        }
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads the decrypted bytes
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        self.page_texts = OnceLock::new();
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;

        if let Some(text) = self.page_texts().and_then(|pages| pages.get(page as usize - 1)) {
            return Ok(text.clone());
        }

        self.document()?
            .extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// The largest image on the page, resized to the page width at `dpi`.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;

        let image = self
            .page_images(doc, page_id)
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| PdfError::ImageExtraction(format!("no image on page {}", page)))?;

        let Some(points) = self.page_width_points(doc, page_id) else {
            return Ok(image);
        };

        let target_width = (points / POINTS_PER_INCH * dpi as f32).round() as u32;
        if target_width == 0 || target_width == image.width() {
            return Ok(image);
        }

        let target_height =
            (u64::from(image.height()) * u64::from(target_width) / u64::from(image.width().max(1))) as u32;
        debug!(
            "Page {}: scaling {}x{} image to {}x{} for {} DPI",
            page,
            image.width(),
            image.height(),
            target_width,
            target_height,
            dpi
        );
        Ok(image.resize_exact(target_width, target_height.max(1), FilterType::Triangle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.extract_page_text(1).is_err());
    }

    #[test]
    fn test_load_garbage_fails() {
        let mut extractor = PdfExtractor::new();
        let err = extractor.load(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_page_texts_on_garbage_falls_back() {
        let extractor = PdfExtractor {
            raw_data: b"%PDF-1.4 truncated".to_vec(),
            ..PdfExtractor::new()
        };
        assert!(extractor.page_texts().is_none());
    }

    #[test]
    fn test_raw_gray_image() {
        let img = raw_image(&[0, 128, 255, 64], 2, 2, b"DeviceGray").unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        assert_eq!(img.to_rgba8().get_pixel(1, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_raw_image_too_short() {
        assert!(raw_image(&[0, 0, 0], 2, 2, b"DeviceRGB").is_none());
        assert!(raw_image(&[0; 16], 2, 2, b"Indexed").is_none());
    }
}

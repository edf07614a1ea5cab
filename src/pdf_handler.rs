// src/pdf_handler.rs
//
// Turns a printable region into a finished PDF. Layout happens in top-down
// page coordinates (points, origin at the top-left margin) and is flipped to
// PDF's bottom-up space only when the content streams are written. Text is
// set in the built-in Helvetica faces with WinAnsi encoding, so no font files
// are embedded; images are re-encoded as JPEG and placed as DCTDecode
// XObjects.

use std::ops::Range;

use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use crate::error::ExportError;
use crate::font_metrics;
use crate::render_region::{Block, ImageBlock, Region, TableBlock};

const MM_TO_PT: f32 = 72.0 / 25.4;

const HEADING_SIZE: f32 = 18.0;
const PARAGRAPH_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 9.0;
const LINE_FACTOR: f32 = 1.25;
const ASCENT: f32 = 0.8;
const CELL_PAD: f32 = 4.0;
const BLOCK_GAP: f32 = 10.0;

const PARAGRAPH_GRAY: f32 = 0.4;
const GRID_GRAY: f32 = 0.7;
const GRID_WIDTH: f32 = 0.5;
const HEADER_FILL: f32 = 0.93;
const ZEBRA_FILL: f32 = 0.96;

/// Output geometry and encoding settings. The defaults give an A4 portrait
/// page with 10 mm margins, JPEG quality 0.98 and a 2x capture scale for
/// embedded images.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_mm: f32,
    /// JPEG quality for embedded images, 0.0 to 1.0.
    pub jpeg_quality: f32,
    /// Pixel density of captured image blocks relative to CSS points.
    pub render_scale: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            page_width: 595.276,
            page_height: 841.89,
            margin_mm: 10.0,
            jpeg_quality: 0.98,
            render_scale: 2.0,
        }
    }
}

impl ExportOptions {
    fn margin_pt(&self) -> f32 {
        self.margin_mm * MM_TO_PT
    }

    fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin_pt()
    }
}

/// Renders the region into a complete PDF document.
///
/// Fails with `RasterizationFailed` when the region yields nothing drawable,
/// mirroring an export target that produced no payload.
pub fn render_pdf(region: &Region, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let lost = unencodable_chars(region);
    if lost > 0 {
        log::warn!(
            "region '{}' holds {lost} character(s) with no WinAnsi byte; they will print as '?'",
            region.id
        );
    }
    let images = encode_images(region, options.jpeg_quality)?;
    let pages = layout_region(region, options);
    if pages.iter().all(|page| page.ops.is_empty()) {
        return Err(ExportError::RasterizationFailed(
            "region produced no drawable content".to_string(),
        ));
    }
    log::debug!("laid out {} page(s) for region '{}'", pages.len(), region.id);
    write_document(&pages, &images, options)
}

#[derive(Debug)]
enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        gray: f32,
        content: String,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        gray: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        gray: f32,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        index: usize,
    },
}

#[derive(Debug, Default)]
struct Page {
    ops: Vec<DrawOp>,
}

struct EncodedImage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

fn encode_images(region: &Region, quality: f32) -> Result<Vec<EncodedImage>, ExportError> {
    let mut images = Vec::new();
    for block in &region.blocks {
        if let Block::Image(img) = block {
            images.push(encode_jpeg(img, quality)?);
        }
    }
    Ok(images)
}

fn encode_jpeg(img: &ImageBlock, quality: f32) -> Result<EncodedImage, ExportError> {
    let expected = img.width as usize * img.height as usize * 3;
    if img.pixels.len() != expected {
        return Err(ExportError::RasterizationFailed(format!(
            "image buffer holds {} bytes, expected {expected}",
            img.pixels.len()
        )));
    }
    let q = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, q)
        .encode(&img.pixels, img.width, img.height, ColorType::Rgb8)
        .map_err(|e| ExportError::RasterizationFailed(e.to_string()))?;
    Ok(EncodedImage {
        jpeg,
        width: img.width,
        height: img.height,
    })
}

/// Characters across all text blocks that the WinAnsi fonts cannot show.
fn unencodable_chars(region: &Region) -> usize {
    region
        .blocks
        .iter()
        .map(|block| match block {
            Block::Heading(text) | Block::Paragraph(text) => font_metrics::unencodable_count(text),
            Block::Table(table) => table
                .header
                .iter()
                .chain(table.rows.iter().flatten())
                .map(|cell| font_metrics::unencodable_count(&cell.text))
                .sum(),
            Block::Image(_) => 0,
        })
        .sum()
}

fn layout_region(region: &Region, opts: &ExportOptions) -> Vec<Page> {
    let mut pager = Paginator::new(opts);
    let mut image_index = 0;
    for block in &region.blocks {
        match block {
            Block::Heading(text) => pager.emit_text_block(text, HEADING_SIZE, true, 0.0),
            Block::Paragraph(text) => {
                pager.emit_text_block(text, PARAGRAPH_SIZE, false, PARAGRAPH_GRAY)
            }
            Block::Table(table) => pager.emit_table(table),
            Block::Image(img) => {
                pager.emit_image(img, image_index);
                image_index += 1;
            }
        }
    }
    pager.finish()
}

/// Walks content down the page, breaking to a new page when a block (or a
/// table row) would cross the bottom margin. A table row taller than one
/// page is sliced across pages rather than drawn past the margin.
struct Paginator<'a> {
    opts: &'a ExportOptions,
    done: Vec<Page>,
    current: Page,
    y: f32,
}

impl<'a> Paginator<'a> {
    fn new(opts: &'a ExportOptions) -> Self {
        Paginator {
            opts,
            done: Vec::new(),
            current: Page::default(),
            y: opts.margin_pt(),
        }
    }

    fn limit(&self) -> f32 {
        self.opts.page_height - self.opts.margin_pt()
    }

    fn break_page(&mut self) {
        self.done.push(std::mem::take(&mut self.current));
        self.y = self.opts.margin_pt();
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > self.limit() && self.y > self.opts.margin_pt() + 0.01 {
            self.break_page();
        }
    }

    fn finish(mut self) -> Vec<Page> {
        self.done.push(self.current);
        self.done
    }

    /// Centered, wrapped text block (headings and paragraphs).
    fn emit_text_block(&mut self, text: &str, size: f32, bold: bool, gray: f32) {
        let margin = self.opts.margin_pt();
        let content_w = self.opts.content_width();
        let line_h = size * LINE_FACTOR;
        for line in wrap_text(text, content_w, size, bold) {
            self.ensure_room(line_h);
            let w = font_metrics::text_width(&line, size, bold);
            let x = (margin + (content_w - w) / 2.0).max(margin);
            self.current.ops.push(DrawOp::Text {
                x,
                y: self.y + size * ASCENT,
                size,
                bold,
                gray,
                content: line,
            });
            self.y += line_h;
        }
        self.y += BLOCK_GAP;
    }

    fn emit_table(&mut self, table: &TableBlock) {
        let ncols = table.header.len().max(1);
        let col_w = self.opts.content_width() / ncols as f32;
        let text_w = col_w - 2.0 * CELL_PAD;

        let header: Vec<Vec<String>> = table
            .header
            .iter()
            .map(|cell| wrap_text(&cell.text, text_w, TABLE_SIZE, true))
            .collect();
        let header_h = row_height(&header);
        let header_depth = line_depth(&header);

        // Never strand the header alone at the bottom of a page.
        self.ensure_room(header_h + TABLE_SIZE * LINE_FACTOR + 2.0 * CELL_PAD);
        self.draw_row(&header, col_w, 0..header_depth, true, Some(HEADER_FILL));

        for (i, row) in table.rows.iter().enumerate() {
            let cells: Vec<Vec<String>> = row
                .iter()
                .map(|cell| wrap_text(&cell.text, text_w, TABLE_SIZE, false))
                .collect();
            let depth = line_depth(&cells);
            let fill = if i % 2 == 1 { Some(ZEBRA_FILL) } else { None };

            // A row that fits a fresh page moves there whole; a row taller
            // than a page is sliced line by line, with the header repeated
            // above each continuation.
            let mut start = 0;
            while start < depth {
                let mut fit = self.lines_that_fit();
                let move_whole =
                    start == 0 && fit < depth && depth <= self.fresh_page_capacity(header_h);
                if fit == 0 || move_whole {
                    self.break_page();
                    self.draw_row(&header, col_w, 0..header_depth, true, Some(HEADER_FILL));
                    fit = self.lines_that_fit().max(1);
                }
                let end = depth.min(start + fit);
                self.draw_row(&cells, col_w, start..end, false, fill);
                start = end;
            }
        }
        self.y += BLOCK_GAP;
    }

    /// Table text lines that still fit above the bottom margin.
    fn lines_that_fit(&self) -> usize {
        let free = self.limit() - self.y - 2.0 * CELL_PAD;
        (free / (TABLE_SIZE * LINE_FACTOR)).max(0.0) as usize
    }

    /// Table text lines a fresh page holds below a repeated header.
    fn fresh_page_capacity(&self, header_h: f32) -> usize {
        let free = self.limit() - self.opts.margin_pt() - header_h - 2.0 * CELL_PAD;
        (free / (TABLE_SIZE * LINE_FACTOR)).max(0.0) as usize
    }

    /// One slice of a table row: optional fill, grid lines, then the cell
    /// text lines in `lines`. A whole row arrives as its full line range.
    fn draw_row(
        &mut self,
        cells: &[Vec<String>],
        col_w: f32,
        lines: Range<usize>,
        bold: bool,
        fill: Option<f32>,
    ) {
        let x0 = self.opts.margin_pt();
        let width = col_w * cells.len() as f32;
        let slice_h = lines.len() as f32 * TABLE_SIZE * LINE_FACTOR + 2.0 * CELL_PAD;
        let y0 = self.y;
        let y1 = self.y + slice_h;

        if let Some(gray) = fill {
            self.current.ops.push(DrawOp::FillRect {
                x: x0,
                y: y0,
                w: width,
                h: slice_h,
                gray,
            });
        }
        for k in 0..=cells.len() {
            let x = x0 + col_w * k as f32;
            self.current.ops.push(DrawOp::Line {
                x1: x,
                y1: y0,
                x2: x,
                y2: y1,
                width: GRID_WIDTH,
                gray: GRID_GRAY,
            });
        }
        for y in [y0, y1] {
            self.current.ops.push(DrawOp::Line {
                x1: x0,
                y1: y,
                x2: x0 + width,
                y2: y,
                width: GRID_WIDTH,
                gray: GRID_GRAY,
            });
        }
        for (c, cell) in cells.iter().enumerate() {
            let mut ty = y0 + CELL_PAD;
            for line in cell.iter().take(lines.end).skip(lines.start) {
                self.current.ops.push(DrawOp::Text {
                    x: x0 + col_w * c as f32 + CELL_PAD,
                    y: ty + TABLE_SIZE * ASCENT,
                    size: TABLE_SIZE,
                    bold,
                    gray: 0.0,
                    content: line.clone(),
                });
                ty += TABLE_SIZE * LINE_FACTOR;
            }
        }
        self.y = y1;
    }

    fn emit_image(&mut self, img: &ImageBlock, index: usize) {
        // Captured pixels are render_scale times denser than CSS points.
        let px_to_pt = 0.75 / self.opts.render_scale;
        let mut w = img.width as f32 * px_to_pt;
        let mut h = img.height as f32 * px_to_pt;
        let content_w = self.opts.content_width();
        if w > content_w {
            h *= content_w / w;
            w = content_w;
        }
        let max_h = self.opts.page_height - 2.0 * self.opts.margin_pt();
        if h > max_h {
            w *= max_h / h;
            h = max_h;
        }
        self.ensure_room(h);
        let x = self.opts.margin_pt() + (content_w - w) / 2.0;
        self.current.ops.push(DrawOp::Image {
            x,
            y: self.y,
            w,
            h,
            index,
        });
        self.y += h + BLOCK_GAP;
    }
}

fn line_depth(cells: &[Vec<String>]) -> usize {
    cells.iter().map(Vec::len).max().unwrap_or(1).max(1)
}

fn row_height(cells: &[Vec<String>]) -> f32 {
    line_depth(cells) as f32 * TABLE_SIZE * LINE_FACTOR + 2.0 * CELL_PAD
}

/// Greedy word wrap against the Helvetica metrics. Words wider than the
/// column are hard-broken so a single long token cannot overflow the cell.
fn wrap_text(text: &str, max_width: f32, size: f32, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if font_metrics::text_width(&candidate, size, bold) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        let mut piece = String::new();
        for ch in word.chars() {
            piece.push(ch);
            if font_metrics::text_width(&piece, size, bold) > max_width && piece.len() > ch.len_utf8()
            {
                let split = piece.len() - ch.len_utf8();
                lines.push(piece[..split].to_string());
                piece = piece[split..].to_string();
            }
        }
        current = piece;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn write_document(
    pages: &[Page],
    images: &[EncodedImage],
    opts: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let font_bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut xobjects = Dictionary::new();
    for (i, image) in images.iter().enumerate() {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.jpeg.clone(),
        );
        xobjects.set(format!("Im{i}"), doc.add_object(stream));
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_regular,
            "F2" => font_bold,
        },
        "XObject" => xobjects,
    });

    let page_h = opts.page_height;
    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        for op in &page.ops {
            emit_operations(&mut operations, op, page_h);
        }
        let content = Content { operations };
        let data = content
            .encode()
            .map_err(|e| ExportError::RasterizationFailed(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, data));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0f32.into(),
                0f32.into(),
                opts.page_width.into(),
                opts.page_height.into(),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::RasterizationFailed(e.to_string()))?;
    Ok(bytes)
}

/// Translates one draw op into PDF content-stream operations, flipping the
/// top-down layout y into PDF's bottom-up coordinates.
fn emit_operations(out: &mut Vec<Operation>, op: &DrawOp, page_h: f32) {
    match op {
        DrawOp::Text {
            x,
            y,
            size,
            bold,
            gray,
            content,
        } => {
            let font = if *bold { "F2" } else { "F1" };
            out.push(Operation::new("BT", vec![]));
            out.push(Operation::new("Tf", vec![font.into(), (*size).into()]));
            out.push(Operation::new("g", vec![(*gray).into()]));
            out.push(Operation::new("Td", vec![(*x).into(), (page_h - y).into()]));
            out.push(Operation::new(
                "Tj",
                vec![Object::String(
                    font_metrics::encode_winansi(content),
                    StringFormat::Literal,
                )],
            ));
            out.push(Operation::new("ET", vec![]));
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            gray,
        } => {
            out.push(Operation::new("w", vec![(*width).into()]));
            out.push(Operation::new("G", vec![(*gray).into()]));
            out.push(Operation::new("m", vec![(*x1).into(), (page_h - y1).into()]));
            out.push(Operation::new("l", vec![(*x2).into(), (page_h - y2).into()]));
            out.push(Operation::new("S", vec![]));
        }
        DrawOp::FillRect { x, y, w, h, gray } => {
            out.push(Operation::new("g", vec![(*gray).into()]));
            out.push(Operation::new(
                "re",
                vec![
                    (*x).into(),
                    (page_h - y - h).into(),
                    (*w).into(),
                    (*h).into(),
                ],
            ));
            out.push(Operation::new("f", vec![]));
        }
        DrawOp::Image { x, y, w, h, index } => {
            out.push(Operation::new("q", vec![]));
            out.push(Operation::new(
                "cm",
                vec![
                    (*w).into(),
                    0f32.into(),
                    0f32.into(),
                    (*h).into(),
                    (*x).into(),
                    (page_h - y - h).into(),
                ],
            ));
            out.push(Operation::new("Do", vec![format!("Im{index}").into()]));
            out.push(Operation::new("Q", vec![]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::TableState;
    use crate::render_region::build_print_region;

    fn committed_region(state: &TableState) -> Region {
        let mut region = build_print_region(state, "Inventory", "Countsheet");
        region.commit_inputs();
        region
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = render_pdf(&committed_region(&TableState::initial()), &ExportOptions::default())
            .expect("render should succeed");
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"Helvetica"));
        assert!(contains(&bytes, b"Helvetica-Bold"));
    }

    #[test]
    fn empty_region_is_a_rasterization_error() {
        let region = Region::new("empty");
        let err = render_pdf(&region, &ExportOptions::default());
        assert!(matches!(err, Err(ExportError::RasterizationFailed(_))));
    }

    #[test]
    fn tall_tables_break_across_pages_and_repeat_the_header() {
        let state = TableState {
            headers: vec!["Item".into(), "Qty".into()],
            rows: (0..120)
                .map(|i| vec![format!("Row {i}"), i.to_string()])
                .collect(),
        };
        let region = committed_region(&state);
        let pages = layout_region(&region, &ExportOptions::default());
        assert!(pages.len() > 1, "120 rows should not fit one A4 page");

        let first_text = pages[1].ops.iter().find_map(|op| match op {
            DrawOp::Text { content, bold, .. } => Some((content.clone(), *bold)),
            _ => None,
        });
        assert_eq!(first_text, Some(("Item".to_string(), true)));
    }

    #[test]
    fn a_row_taller_than_a_page_is_sliced_across_pages() {
        let words: Vec<String> = (0..900).map(|i| format!("word{i}")).collect();
        let state = TableState {
            headers: vec!["Item".into(), "Notes".into(), "Qty".into()],
            rows: vec![vec!["Bulk lot".into(), words.join(" "), "1".into()]],
        };
        let opts = ExportOptions::default();
        let pages = layout_region(&committed_region(&state), &opts);
        assert!(pages.len() > 1, "a 900-word cell cannot fit one A4 page");

        let bottom = opts.page_height - opts.margin_mm * MM_TO_PT;
        let mut drawn = String::new();
        for page in &pages {
            for op in &page.ops {
                if let DrawOp::Text { y, content, .. } = op {
                    assert!(*y >= 0.0);
                    assert!(*y <= bottom, "text baseline {y} crosses the bottom margin");
                    drawn.push_str(content);
                    drawn.push(' ');
                }
            }
        }
        for needle in ["word0", "word450", "word899"] {
            assert!(drawn.contains(needle), "{needle} was dropped from the layout");
        }
    }

    #[test]
    fn row_continuations_repeat_the_header() {
        let state = TableState {
            headers: vec!["Item".into(), "Notes".into()],
            rows: vec![vec!["Lot".into(), "note ".repeat(2000)]],
        };
        let pages = layout_region(&committed_region(&state), &ExportOptions::default());
        assert!(pages.len() > 2, "2000 words should span several pages");
        for page in &pages[1..] {
            let first = page.ops.iter().find_map(|op| match op {
                DrawOp::Text { content, bold, .. } => Some((content.clone(), *bold)),
                _ => None,
            });
            assert_eq!(first, Some(("Item".to_string(), true)));
        }
    }

    #[test]
    fn text_outside_winansi_degrades_to_question_marks() {
        let state = TableState {
            headers: vec!["Item".into()],
            rows: vec![vec!["مرحبا".into()]],
        };
        let bytes = render_pdf(&committed_region(&state), &ExportOptions::default())
            .expect("render should succeed");
        assert!(contains(&bytes, b"(?????)"));
    }

    #[test]
    fn wrapped_lines_stay_inside_the_column() {
        let lines = wrap_text(
            "a reasonably long sentence that cannot fit in a narrow cell",
            60.0,
            9.0,
            false,
        );
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(font_metrics::text_width(line, 9.0, false) <= 60.0);
        }
    }

    #[test]
    fn overlong_words_are_hard_broken() {
        let lines = wrap_text(&"x".repeat(200), 40.0, 9.0, false);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(font_metrics::text_width(line, 9.0, false) <= 40.0);
        }
    }

    #[test]
    fn empty_text_still_occupies_one_line() {
        assert_eq!(wrap_text("", 100.0, 9.0, false), vec![String::new()]);
    }

    #[test]
    fn image_blocks_are_embedded_as_jpeg_xobjects() {
        let mut region = committed_region(&TableState::initial());
        region.blocks.push(Block::Image(ImageBlock {
            pixels: vec![200; 4 * 2 * 3],
            width: 4,
            height: 2,
        }));
        let bytes = render_pdf(&region, &ExportOptions::default()).expect("render should succeed");
        assert!(contains(&bytes, b"DCTDecode"));
    }

    #[test]
    fn mismatched_image_buffer_is_rejected() {
        let mut region = Region::new("img");
        region.blocks.push(Block::Image(ImageBlock {
            pixels: vec![0; 5],
            width: 4,
            height: 2,
        }));
        let err = render_pdf(&region, &ExportOptions::default());
        assert!(matches!(err, Err(ExportError::RasterizationFailed(_))));
    }
}

// src/render_region.rs
//
// The printable region model. Mirrors the subtree of the UI that gets
// exported: a small list of blocks, with editable cells carrying both their
// static text and the live input value. The PDF renderer only ever reads the
// static text, so `commit_inputs` must run before rasterization.

use std::collections::HashMap;

use crate::data_types::TableState;

/// Identifier of the region the app exports.
pub const PRINT_REGION_ID: &str = "printable-area";

/// A renderable subtree, addressable by id through `RegionRegistry`.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
pub enum Block {
    /// Large centered title line.
    Heading(String),
    /// Centered secondary text.
    Paragraph(String),
    /// The grid itself.
    Table(TableBlock),
    /// Raw RGB8 pixels, embedded as a JPEG in the output.
    Image(ImageBlock),
}

#[derive(Debug, Clone)]
pub struct TableBlock {
    pub header: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
}

/// One grid cell. `text` is what the renderer snapshots; `input` is the live
/// editable value, present for cells backed by a text input.
#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub input: Option<String>,
}

impl Cell {
    pub fn fixed(text: impl Into<String>) -> Self {
        Cell {
            text: text.into(),
            input: None,
        }
    }

    pub fn input(value: impl Into<String>) -> Self {
        Cell {
            text: String::new(),
            input: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageBlock {
    /// Row-major RGB8 samples, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(id: impl Into<String>) -> Self {
        Region {
            id: id.into(),
            blocks: Vec::new(),
        }
    }

    /// Copies every live input value into the cell's static text. The
    /// rasterizer reads static text only, so skipping this step would export
    /// a blank grid regardless of what the user typed.
    pub fn commit_inputs(&mut self) {
        for block in &mut self.blocks {
            if let Block::Table(table) = block {
                for cell in table.header.iter_mut().chain(table.rows.iter_mut().flatten()) {
                    if let Some(value) = &cell.input {
                        cell.text = value.clone();
                    }
                }
            }
        }
    }
}

/// Id -> region lookup, the stand-in for "find the element to print".
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: HashMap<String, Region>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        RegionRegistry::default()
    }

    /// Registers a region, replacing any previous one with the same id.
    pub fn register(&mut self, region: Region) {
        self.regions.insert(region.id.clone(), region);
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }
}

/// Builds the printable region for the current table: title, subtitle, the
/// grid with all cells as live inputs, and the empty-table placeholder when
/// there are no rows.
pub fn build_print_region(state: &TableState, title: &str, subtitle: &str) -> Region {
    let mut region = Region::new(PRINT_REGION_ID);
    region.blocks.push(Block::Heading(title.to_string()));
    region.blocks.push(Block::Paragraph(subtitle.to_string()));

    let table = TableBlock {
        header: state.headers.iter().map(Cell::input).collect(),
        rows: state
            .rows
            .iter()
            .map(|row| row.iter().map(Cell::input).collect())
            .collect(),
    };
    region.blocks.push(Block::Table(table));

    if state.rows.is_empty() {
        region.blocks.push(Block::Paragraph(
            "The table is empty. Add rows to get started.".to_string(),
        ));
    }

    region
}

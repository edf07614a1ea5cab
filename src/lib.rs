// src/lib.rs
//! Editable table with JSON persistence, PDF export and sharing.
//!
//! The binary in `main.rs` drives the iced UI; the pieces live here so the
//! export pipeline and the autofill client can be exercised directly.

pub mod ai_handler;
pub mod data_types;
pub mod error;
pub mod font_metrics;
pub mod pdf_handler;
pub mod render_region;
pub mod share_handler;
pub mod storage_handler;
pub mod table_state;
pub mod ui;

pub use ai_handler::AiHandler;
pub use data_types::{ExportOutcome, ShareOptions, TableState};
pub use error::{AiError, ExportError};
pub use pdf_handler::{render_pdf, ExportOptions};
pub use render_region::{build_print_region, Region, RegionRegistry, PRINT_REGION_ID};
pub use share_handler::{export_and_share, export_with_delivery, Delivery};
pub use storage_handler::StorageHandler;
pub use table_state::{ChangeListener, TableManager};

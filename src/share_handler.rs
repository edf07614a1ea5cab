// src/share_handler.rs
//
// The export pipeline: look up the printable region, commit its live inputs,
// render the PDF off the UI thread, then hand the file over. Sharing goes
// through the platform save dialog; where no dialog can be shown the file is
// written straight into the download directory instead. A dismissed dialog is
// a normal `Cancelled` outcome.

use std::future::Future;
use std::path::PathBuf;

use crate::data_types::{ExportOutcome, ShareOptions};
use crate::error::ExportError;
use crate::pdf_handler::{render_pdf, ExportOptions};
use crate::render_region::RegionRegistry;

/// How the finished PDF leaves the app.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// Offer the file through the platform save dialog.
    ShareSheet,
    /// Write the file into the given directory without asking.
    DirectDownload(PathBuf),
}

/// Whether a share dialog can be presented at all. Headless sessions get the
/// download fallback.
pub fn can_share_files() -> bool {
    if cfg!(target_os = "linux") {
        std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
    } else {
        true
    }
}

pub fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Entry point used by the UI: share when possible, download otherwise.
pub async fn export_and_share(
    registry: RegionRegistry,
    region_id: String,
    options: ShareOptions,
) -> Result<ExportOutcome, ExportError> {
    let delivery = if can_share_files() {
        Delivery::ShareSheet
    } else {
        Delivery::DirectDownload(default_download_dir())
    };
    export_with_delivery(registry, region_id, options, ExportOptions::default(), delivery).await
}

/// Same pipeline with the delivery mode pinned by the caller.
pub async fn export_with_delivery(
    registry: RegionRegistry,
    region_id: String,
    options: ShareOptions,
    export_options: ExportOptions,
    delivery: Delivery,
) -> Result<ExportOutcome, ExportError> {
    export_with_prompt(
        registry,
        region_id,
        options,
        export_options,
        delivery,
        prompt_save_path,
    )
    .await
}

/// The platform save dialog. Tests swap this out so the dismissal path can
/// run without a display.
async fn prompt_save_path(options: ShareOptions) -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title(&options.title)
        .set_file_name(&options.filename)
        .add_filter("PDF", &["pdf"])
        .save_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}

async fn export_with_prompt<F, Fut>(
    registry: RegionRegistry,
    region_id: String,
    options: ShareOptions,
    export_options: ExportOptions,
    delivery: Delivery,
    prompt: F,
) -> Result<ExportOutcome, ExportError>
where
    F: FnOnce(ShareOptions) -> Fut,
    Fut: Future<Output = Option<PathBuf>>,
{
    let mut region = registry
        .get(&region_id)
        .cloned()
        .ok_or_else(|| ExportError::RegionNotFound(region_id.clone()))?;
    validate_filename(&options.filename)?;

    log::info!("exporting region '{region_id}' as '{}'", options.filename);

    region.commit_inputs();
    let bytes = tokio::task::spawn_blocking(move || render_pdf(&region, &export_options))
        .await
        .map_err(|e| ExportError::Failure(format!("render task failed: {e}")))??;

    match delivery {
        Delivery::ShareSheet => {
            // The save dialog has no message slot, so the share text only
            // reaches the log.
            log::info!("share message: {}", options.text);
            let filename = options.filename.clone();
            match prompt(options).await {
                Some(path) => {
                    tokio::fs::write(&path, &bytes)
                        .await
                        .map_err(|e| ExportError::Failure(e.to_string()))?;
                    log::info!("shared '{filename}'");
                    Ok(ExportOutcome::Shared)
                }
                None => {
                    log::info!("share dialog dismissed");
                    Ok(ExportOutcome::Cancelled)
                }
            }
        }
        Delivery::DirectDownload(dir) => {
            let path = dir.join(&options.filename);
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| ExportError::Failure(e.to_string()))?;
            log::info!("saved '{}'", path.display());
            Ok(ExportOutcome::Downloaded(path))
        }
    }
}

fn validate_filename(name: &str) -> Result<(), ExportError> {
    if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
        return Err(ExportError::Failure(format!("invalid file name '{name}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::TableState;
    use crate::render_region::{build_print_region, PRINT_REGION_ID};
    use tempfile::tempdir;

    fn registry_with_table() -> RegionRegistry {
        let mut registry = RegionRegistry::new();
        registry.register(build_print_region(
            &TableState::initial(),
            "Inventory",
            "Countsheet",
        ));
        registry
    }

    fn options(filename: &str) -> ShareOptions {
        ShareOptions {
            filename: filename.to_string(),
            title: "Inventory".to_string(),
            text: "Table attached.".to_string(),
        }
    }

    #[tokio::test]
    async fn direct_download_writes_the_pdf() {
        let dir = tempdir().expect("tempdir");
        let outcome = export_with_delivery(
            registry_with_table(),
            PRINT_REGION_ID.to_string(),
            options("inventory.pdf"),
            ExportOptions::default(),
            Delivery::DirectDownload(dir.path().to_path_buf()),
        )
        .await
        .expect("export should succeed");

        let ExportOutcome::Downloaded(path) = outcome else {
            panic!("expected a download outcome");
        };
        let bytes = std::fs::read(&path).expect("file should exist");
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn live_cell_values_end_up_in_the_exported_file() {
        let dir = tempdir().expect("tempdir");
        let outcome = export_with_delivery(
            registry_with_table(),
            PRINT_REGION_ID.to_string(),
            options("inventory.pdf"),
            ExportOptions::default(),
            Delivery::DirectDownload(dir.path().to_path_buf()),
        )
        .await
        .expect("export should succeed");

        let ExportOutcome::Downloaded(path) = outcome else {
            panic!("expected a download outcome");
        };
        let bytes = std::fs::read(&path).expect("file should exist");
        let needle = b"Product 1";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[tokio::test]
    async fn a_dismissed_dialog_cancels_without_writing() {
        let dir = tempdir().expect("tempdir");
        let outcome = export_with_prompt(
            registry_with_table(),
            PRINT_REGION_ID.to_string(),
            options("inventory.pdf"),
            ExportOptions::default(),
            Delivery::ShareSheet,
            |_| async { None },
        )
        .await
        .expect("a dismissed dialog is not an error");

        assert!(matches!(outcome, ExportOutcome::Cancelled));
        assert_eq!(dir.path().read_dir().expect("read_dir").count(), 0);
    }

    #[tokio::test]
    async fn an_accepted_dialog_writes_to_the_picked_path() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("picked.pdf");
        let picked = target.clone();
        let outcome = export_with_prompt(
            registry_with_table(),
            PRINT_REGION_ID.to_string(),
            options("inventory.pdf"),
            ExportOptions::default(),
            Delivery::ShareSheet,
            move |_| async move { Some(picked) },
        )
        .await
        .expect("export should succeed");

        assert!(matches!(outcome, ExportOutcome::Shared));
        let bytes = std::fs::read(&target).expect("file should exist");
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn unknown_region_fails_before_any_io() {
        let err = export_with_delivery(
            RegionRegistry::new(),
            PRINT_REGION_ID.to_string(),
            options("inventory.pdf"),
            ExportOptions::default(),
            Delivery::DirectDownload(std::env::temp_dir()),
        )
        .await;
        assert!(matches!(err, Err(ExportError::RegionNotFound(_))));
    }

    #[tokio::test]
    async fn path_separators_in_file_names_are_rejected() {
        let err = export_with_delivery(
            registry_with_table(),
            PRINT_REGION_ID.to_string(),
            options("../escape.pdf"),
            ExportOptions::default(),
            Delivery::DirectDownload(std::env::temp_dir()),
        )
        .await;
        assert!(matches!(err, Err(ExportError::Failure(_))));
    }
}

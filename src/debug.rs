use image::GrayImage;
use std::path::PathBuf;
use std::sync::OnceLock;

static DUMP_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Directory named by `QR_STREAM_DUMP_DIR`, read once per process
pub(crate) fn dump_dir() -> Option<&'static PathBuf> {
    DUMP_DIR
        .get_or_init(|| std::env::var_os("QR_STREAM_DUMP_DIR").map(PathBuf::from))
        .as_ref()
}

/// Write a stage's enhanced image as PNG when dumping is enabled
pub(crate) fn dump_stage_image(label: &str, image: &GrayImage) {
    let Some(dir) = dump_dir() else {
        return;
    };
    let path = dir.join(format!("{label}.png"));
    if let Err(error) = image.save(&path) {
        tracing::debug!(path = %path.display(), %error, "stage dump failed");
    }
}

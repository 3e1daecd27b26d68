//! Loading fields from disk and saving merged frames.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use fieldmerge_common::config::ChannelMode;
use fieldmerge_common::error::{FieldMergeError, FieldMergeResult};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::raster::{Field, Raster};

/// JPEG quality used when saving merged frames.
pub const JPEG_QUALITY: u8 = 95;

/// Container formats a merged frame can be saved as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
}

impl SaveFormat {
    /// Pick the container from the destination's extension.
    pub fn from_path(path: &Path) -> FieldMergeResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => Ok(Self::Png),
            Some("jpg") | Some("jpeg") => Ok(Self::Jpeg),
            Some(other) => Err(FieldMergeError::save(
                path,
                format!("Unsupported extension .{other} (use .png, .jpg or .jpeg)"),
            )),
            None => Err(FieldMergeError::save(
                path,
                "Missing file extension (use .png, .jpg or .jpeg)",
            )),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Decode any common image format into a field.
///
/// The format is guessed from the file contents, not its extension.
pub fn load_field(path: &Path, mode: ChannelMode) -> FieldMergeResult<Field> {
    if !path.exists() {
        return Err(FieldMergeError::load(path, "File not found"));
    }

    let image = ImageReader::open(path)
        .map_err(|e| FieldMergeError::load(path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| FieldMergeError::load(path, e.to_string()))?
        .decode()
        .map_err(|e| FieldMergeError::load(path, e.to_string()))?;

    let field = Raster::from_dynamic(image, mode);
    tracing::info!(path = %path.display(), shape = %field.shape(), "Loaded field");
    Ok(field)
}

/// Save a raster as PNG or JPEG, chosen by the destination extension.
pub fn save_frame(frame: &Raster, path: &Path) -> FieldMergeResult<()> {
    let format = SaveFormat::from_path(path)?;
    let image = frame.to_dynamic()?;
    write_image(&image, path, format)?;
    tracing::info!(path = %path.display(), format = ?format, "Saved frame");
    Ok(())
}

/// Encode an already converted image.
pub fn write_image(image: &DynamicImage, path: &Path, format: SaveFormat) -> FieldMergeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| FieldMergeError::save(path, e.to_string()))?;
    }

    match format {
        SaveFormat::Png => image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| FieldMergeError::save(path, e.to_string())),
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel.
            let flattened = if image.color().has_alpha() {
                match image.color().channel_count() {
                    2 => DynamicImage::ImageLuma8(image.to_luma8()),
                    _ => DynamicImage::ImageRgb8(image.to_rgb8()),
                }
            } else {
                image.clone()
            };
            let file = File::create(path).map_err(|e| FieldMergeError::save(path, e.to_string()))?;
            let mut writer = BufWriter::new(file);
            flattened
                .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY))
                .map_err(|e| FieldMergeError::save(path, e.to_string()))
        }
    }
}

//! Image probing, display sizing and thumbnail generation.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ImageConfig;
use crate::error::{PublishError, Result};

/// Width and height in pixels
pub type Size = (u32, u32);

/// An image referenced from a post body, with its natural size
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescriptor {
    /// Local path or absolute URL
    pub reference: String,
    pub is_remote: bool,
    pub width: u32,
    pub height: u32,
}

impl ImageDescriptor {
    pub fn size(&self) -> Size {
        (self.width, self.height)
    }
}

/// Aspect-preserving downscale of `natural` to fit within `max`
///
/// A maximum of 0 leaves that axis unconstrained. Images that already fit
/// are returned unchanged; nothing is ever upscaled.
pub fn compute_display_size(natural: Size, max: Size) -> Size {
    let (width, height) = natural;
    let (max_width, max_height) = max;
    if width == 0 || height == 0 {
        return natural;
    }

    let width_over = max_width > 0 && width > max_width;
    let height_over = max_height > 0 && height > max_height;

    let fit_width = || (max_width, scale(height, max_width, width));
    let fit_height = || (scale(width, max_height, height), max_height);

    match (width_over, height_over) {
        (false, false) => natural,
        (true, false) => fit_width(),
        (false, true) => fit_height(),
        (true, true) => {
            // width/max_width >= height/max_height, cross-multiplied
            if u64::from(width) * u64::from(max_height) >= u64::from(height) * u64::from(max_width)
            {
                fit_width()
            } else {
                fit_height()
            }
        }
    }
}

/// floor(value * numerator / denominator), at least 1
fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator);
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}

/// Natural size of a local image file, read from its header
pub fn probe_local(path: &Path) -> Result<Size> {
    if !path.exists() {
        return Err(PublishError::LocalFileMissing(path.to_path_buf()));
    }
    let probe_error = |message: String| PublishError::ImageProbe {
        reference: path.display().to_string(),
        message,
    };
    ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| probe_error(e.to_string()))
}

/// Natural size from the leading bytes of an image
pub fn probe_bytes(reference: &str, bytes: &[u8]) -> Result<Size> {
    let probe_error = |message: String| PublishError::ImageProbe {
        reference: reference.to_string(),
        message,
    };
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| probe_error(e.to_string()))
}

/// Path of the resized copy of `original`: `<dir>/<stem>-<w>x<h><ext>`
pub fn thumbnail_path(original: &Path, size: Size) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{}-{}x{}", stem, size.0, size.1);
    if let Some(ext) = original.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    original.with_file_name(name)
}

/// Write a copy of `source` resized to exactly `size` at `dest`
///
/// The encoder follows the source format: JPEG at the configured quality,
/// PNG optionally reduced to a 256-color palette, anything else re-encoded
/// as-is.
pub fn write_thumbnail(source: &Path, dest: &Path, size: Size, config: &ImageConfig) -> Result<()> {
    let thumbnail_error = |message: String| PublishError::Thumbnail {
        path: source.to_path_buf(),
        message,
    };

    let format = ImageFormat::from_path(source).map_err(|e| thumbnail_error(e.to_string()))?;
    let image = image::open(source).map_err(|e| thumbnail_error(e.to_string()))?;
    let resized = image.resize_exact(size.0, size.1, FilterType::Lanczos3);
    debug!(source = %source.display(), dest = %dest.display(), width = size.0, height = size.1, "writing thumbnail");

    let written = match format {
        ImageFormat::Jpeg => write_jpeg(&resized, dest, config.jpeg_quality),
        ImageFormat::Png if config.png_palette => write_palette_png(&resized, dest),
        _ => resized
            .save_with_format(dest, format)
            .map_err(|e| e.to_string()),
    };
    written.map_err(thumbnail_error)
}

fn write_jpeg(image: &DynamicImage, dest: &Path, quality: u8) -> std::result::Result<(), String> {
    let file = File::create(dest).map_err(|e| e.to_string())?;
    let mut writer = BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
    encoder
        .encode_image(&image.to_rgb8())
        .map_err(|e| e.to_string())
}

/// Quantize to at most 256 colors and write an indexed PNG
fn write_palette_png(image: &DynamicImage, dest: &Path) -> std::result::Result<(), String> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels = rgba.as_raw();

    let quantizer = color_quant::NeuQuant::new(10, 256, pixels);
    let indices: Vec<u8> = pixels
        .chunks_exact(4)
        .map(|pixel| quantizer.index_of(pixel) as u8)
        .collect();

    let color_map = quantizer.color_map_rgba();
    let mut palette = Vec::with_capacity(color_map.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(color_map.len() / 4);
    for color in color_map.chunks_exact(4) {
        palette.extend_from_slice(&color[..3]);
        alpha.push(color[3]);
    }

    let file = File::create(dest).map_err(|e| e.to_string())?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(palette);
    encoder.set_trns(alpha);

    let mut writer = encoder.write_header().map_err(|e| e.to_string())?;
    writer.write_image_data(&indices).map_err(|e| e.to_string())
}

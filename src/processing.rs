//! Upload image processing.
//!
//! Two opaque steps run on every upload:
//! - EXIF extraction (camera, lens, exposure) into the stored `Exif` record
//! - Optimization: orientation applied, downscaled to the configured width,
//!   re-encoded as JPEG

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;
use little_exif::rational::uR64;

use crate::error::Result;
use crate::photos::Exif;

/// Camera name stored when the file has EXIF data but no model tag.
const UNKNOWN_CAMERA: &str = "Unknown";

/// Map sniffed image bytes to a little_exif container type.
fn file_extension(data: &[u8]) -> Option<FileExtension> {
    match image::guess_format(data).ok()? {
        ImageFormat::Jpeg => Some(FileExtension::JPEG),
        ImageFormat::Png => Some(FileExtension::PNG { as_zTXt_chunk: true }),
        ImageFormat::WebP => Some(FileExtension::WEBP),
        _ => None,
    }
}

fn read_metadata(data: &[u8]) -> Option<Metadata> {
    let file_type = file_extension(data)?;
    Metadata::new_from_vec(&data.to_vec(), file_type).ok()
}

/// Extract the EXIF summary record. `None` when the file carries no
/// readable EXIF block.
pub fn extract_exif(data: &[u8]) -> Option<Exif> {
    let metadata = read_metadata(data)?;

    let camera = metadata
        .get_tag(&ExifTag::Model(String::new()))
        .next()
        .and_then(|t| match t {
            ExifTag::Model(s) => clean_string(s),
            _ => None,
        })
        .unwrap_or_else(|| UNKNOWN_CAMERA.to_string());

    let lens = metadata
        .get_tag(&ExifTag::LensModel(String::new()))
        .next()
        .and_then(|t| match t {
            ExifTag::LensModel(s) => clean_string(s),
            _ => None,
        })
        .unwrap_or_default();

    let iso = metadata
        .get_tag(&ExifTag::ISO(Vec::new()))
        .next()
        .and_then(|t| match t {
            ExifTag::ISO(vals) => vals.first().map(|&v| u32::from(v)),
            _ => None,
        });

    let aperture = metadata
        .get_tag(&ExifTag::FNumber(Vec::new()))
        .next()
        .and_then(|t| match t {
            ExifTag::FNumber(vals) => first_rational(vals),
            _ => None,
        })
        .map(format_aperture)
        .unwrap_or_default();

    let shutter = metadata
        .get_tag(&ExifTag::ExposureTime(Vec::new()))
        .next()
        .and_then(|t| match t {
            ExifTag::ExposureTime(vals) => first_rational(vals),
            _ => None,
        })
        .map(format_shutter)
        .unwrap_or_default();

    let focal = metadata
        .get_tag(&ExifTag::FocalLength(Vec::new()))
        .next()
        .and_then(|t| match t {
            ExifTag::FocalLength(vals) => first_rational(vals),
            _ => None,
        })
        .map(|f| format!("{}mm", format_number(f)))
        .unwrap_or_default();

    Some(Exif {
        camera: Some(camera),
        lens: Some(lens),
        aperture: Some(aperture),
        shutter: Some(shutter),
        iso,
        focal: Some(focal),
    })
}

/// Decode, orient, downscale to at most `max_width` and encode as JPEG.
pub fn optimize(data: &[u8], max_width: u32, quality: u8) -> Result<Vec<u8>> {
    let orientation = read_orientation(data);
    let img = image::load_from_memory(data)?;
    let img = apply_orientation(img, orientation);

    let (width, height) = (img.width(), img.height());
    let img = if width > max_width {
        img.resize(max_width, u32::MAX, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut output = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut output, quality).encode_image(&rgb)?;

    tracing::debug!(
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", rgb.width(), rgb.height()),
        orientation,
        quality,
        "optimized image"
    );

    Ok(output.into_inner())
}

/// EXIF orientation (1-8), 1 when absent.
fn read_orientation(data: &[u8]) -> u16 {
    read_metadata(data)
        .and_then(|metadata| {
            metadata
                .get_tag(&ExifTag::Orientation(Vec::new()))
                .next()
                .and_then(|t| match t {
                    ExifTag::Orientation(vals) => vals.first().copied(),
                    _ => None,
                })
        })
        .unwrap_or(1)
}

fn apply_orientation(img: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

fn first_rational(vals: &[uR64]) -> Option<f64> {
    let first = vals.first()?;
    if first.denominator == 0 {
        return None;
    }
    Some(first.nominator as f64 / first.denominator as f64)
}

/// EXIF ASCII values often carry NUL padding.
fn clean_string(s: &str) -> Option<String> {
    let trimmed = s.trim_end_matches('\0').trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Whole numbers without decimals, otherwise one decimal place.
fn format_number(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

fn format_aperture(f_number: f64) -> String {
    format!("f/{}", format_number(f_number))
}

/// Sub-second exposures as a fraction (`1/250s`), longer ones in seconds.
fn format_shutter(seconds: f64) -> String {
    if seconds > 0.0 && seconds < 1.0 {
        format!("1/{}s", (1.0 / seconds).round() as u64)
    } else {
        format!("{}s", format_number(seconds))
    }
}

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use tracing::debug;

use crate::color::DominantColor;
use crate::error::{BarcodeError, Result};

/// Lay `colors` out as full-height columns, left to right.
///
/// Column `i` is filled with `colors[i]`; columns past the end of the
/// sequence stay black. More colors than columns is an error, never a crop.
pub fn compose_barcode(colors: &[DominantColor], width: u32, height: u32) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        return Err(BarcodeError::Config(format!(
            "output size must be non-zero (got {width}x{height})"
        )));
    }
    if colors.len() > width as usize {
        return Err(BarcodeError::OversizedSequence {
            columns: colors.len(),
            width: width as usize,
        });
    }

    let mut img = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
    for (col, color) in colors.iter().enumerate() {
        let pixel = color.to_rgb8();
        for row in 0..height {
            img.put_pixel(col as u32, row, pixel);
        }
    }

    Ok(img)
}

/// Image format implied by the output path's extension.
pub fn output_format(path: &Path) -> Result<ImageFormat> {
    ImageFormat::from_path(path).map_err(|e| {
        BarcodeError::Write(format!("{}: unsupported output format ({e})", path.display()))
    })
}

/// Encode the barcode in memory, then write it to `path` in one go.
pub fn write_barcode(img: &RgbImage, path: &Path) -> Result<()> {
    let format = output_format(path)?;

    let mut encoded = Cursor::new(Vec::new());
    img.write_to(&mut encoded, format)
        .map_err(|e| BarcodeError::Write(format!("{}: {e}", path.display())))?;

    let bytes = encoded.into_inner();
    std::fs::write(path, &bytes)
        .map_err(|e| BarcodeError::Write(format!("{}: {e}", path.display())))?;

    debug!(path = %path.display(), bytes = bytes.len(), ?format, "Barcode written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(output_format(Path::new("a/b.png")).unwrap(), ImageFormat::Png);
        assert_eq!(output_format(Path::new("b.jpg")).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_output_format_rejects_directory_path() {
        assert!(matches!(
            output_format(Path::new("./")),
            Err(BarcodeError::Write(_))
        ));
    }

    #[test]
    fn test_zero_height_rejected() {
        assert!(compose_barcode(&[], 10, 0).is_err());
    }
}

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat, ImageReader};

use super::ImageCodec;
use crate::error::{CropError, Result};
use crate::state::data::SourceRect;

/// A decoded raster image plus the format it came from, so the crop is
/// written back in the same encoding.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub pixels: DynamicImage,
    pub format: ImageFormat,
}

impl RasterImage {
    /// RGBA8 bytes for handing to the renderer
    pub fn to_rgba_pixels(&self) -> (u32, u32, Vec<u8>) {
        let (w, h) = self.pixels.dimensions();
        (w, h, self.pixels.to_rgba8().into_raw())
    }
}

/// `image`-crate backed codec
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    type Image = RasterImage;

    fn decode(&self, path: &Path) -> Result<RasterImage> {
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| CropError::decode(path, image::ImageError::IoError(e)))?;

        // Content sniffing wins, the extension is only a fallback
        let format = match reader.format() {
            Some(format) => format,
            None => ImageFormat::from_path(path).map_err(|e| CropError::decode(path, e))?,
        };

        let pixels = reader.decode().map_err(|e| CropError::decode(path, e))?;

        log::debug!(
            "Decoded {} ({}x{}, {:?})",
            path.display(),
            pixels.width(),
            pixels.height(),
            format
        );

        Ok(RasterImage { pixels, format })
    }

    fn dimensions(&self, image: &RasterImage) -> (u32, u32) {
        image.pixels.dimensions()
    }

    fn resize(&self, image: &RasterImage, width: u32, height: u32) -> RasterImage {
        RasterImage {
            pixels: image.pixels.resize_exact(width, height, FilterType::Lanczos3),
            format: image.format,
        }
    }

    fn crop(&self, image: &RasterImage, rect: SourceRect) -> RasterImage {
        RasterImage {
            pixels: image
                .pixels
                .crop_imm(rect.left, rect.top, rect.width(), rect.height()),
            format: image.format,
        }
    }

    fn encode(&self, image: &RasterImage, path: &Path) -> Result<()> {
        image
            .pixels
            .save_with_format(path, image.format)
            .map_err(|e| CropError::persistence(path, e))?;

        log::info!("Saved {} ({}x{})", path.display(), image.pixels.width(), image.pixels.height());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_pixel(width, height, Rgb([200, 80, 40]));
        img.save_with_format(&path, ImageFormat::Jpeg).unwrap();
        path
    }

    #[test]
    fn test_decode_reports_native_size_and_format() {
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(dir.path(), "a.jpg", 64, 48);

        let image = RasterCodec.decode(&path).unwrap();
        assert_eq!(RasterCodec.dimensions(&image), (64, 48));
        assert_eq!(image.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_crop_and_encode_keeps_jpeg() {
        let dir = TempDir::new().unwrap();
        let source = write_jpeg(dir.path(), "a.jpeg", 64, 48);
        let out = dir.path().join("cropped.jpeg");

        let image = RasterCodec.decode(&source).unwrap();
        let rect = SourceRect { left: 8, top: 4, right: 40, bottom: 36 };
        let cropped = RasterCodec.crop(&image, rect);
        RasterCodec.encode(&cropped, &out).unwrap();

        let reloaded = RasterCodec.decode(&out).unwrap();
        assert_eq!(RasterCodec.dimensions(&reloaded), (32, 32));
        assert_eq!(reloaded.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_resize_stretches_exactly() {
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(dir.path(), "wide.jpg", 90, 30);

        let image = RasterCodec.decode(&path).unwrap();
        let preview = RasterCodec.resize(&image, 40, 40);
        assert_eq!(RasterCodec.dimensions(&preview), (40, 40));

        let (w, h, rgba) = preview.to_rgba_pixels();
        assert_eq!((w, h), (40, 40));
        assert_eq!(rgba.len(), 40 * 40 * 4);
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        assert!(matches!(RasterCodec.decode(&path), Err(CropError::Decode { .. })));
    }

    #[test]
    fn test_unwritable_destination_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(dir.path(), "a.jpg", 16, 16);
        let image = RasterCodec.decode(&path).unwrap();

        let out = dir.path().join("missing-folder").join("a.jpg");
        assert!(matches!(
            RasterCodec.encode(&image, &out),
            Err(CropError::Persistence { .. })
        ));
    }
}

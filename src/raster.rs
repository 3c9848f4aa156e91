use std::{fs, path::Path};

use image::{ColorType, DynamicImage, GrayImage, Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

use crate::{
    analysis::recompress::JpegRecompressor,
    error::{ForensicsError, Result},
};

/// Channel layout of a [`Raster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Gray,
    Rgb,
}

impl Layout {
    pub fn channels(self) -> usize {
        match self {
            Layout::Gray => 1,
            Layout::Rgb => 3,
        }
    }
}

/// A decoded, flat, 8-bit pixel buffer.
///
/// The buffer always holds exactly `width * height * channels` bytes and both
/// dimensions are non-zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl Raster {
    /// Wraps a packed buffer, validating its length against the dimensions.
    pub fn from_raw(width: u32, height: u32, layout: Layout, data: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;

        let expected = width as usize * height as usize * layout.channels();
        if data.len() != expected {
            return Err(ForensicsError::InvalidInput(format!(
                "buffer holds {} bytes, {}x{} {:?} needs {}",
                data.len(),
                width,
                height,
                layout,
                expected
            )));
        }

        let raster = match layout {
            Layout::Gray => GrayImage::from_raw(width, height, data).map(Raster::Gray),
            Layout::Rgb => RgbImage::from_raw(width, height, data).map(Raster::Rgb),
        };

        raster.ok_or_else(|| ForensicsError::InvalidInput("buffer does not match dimensions".into()))
    }

    /// An all-black raster.
    pub fn black(width: u32, height: u32, layout: Layout) -> Result<Self> {
        check_dimensions(width, height)?;

        Ok(match layout {
            Layout::Gray => Raster::Gray(GrayImage::new(width, height)),
            Layout::Rgb => Raster::Rgb(RgbImage::new(width, height)),
        })
    }

    /// Converts a decoded image into a flat raster.
    ///
    /// Luma images stay grayscale, everything else becomes RGB. Transparency is
    /// composited over black.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        check_dimensions(image.width(), image.height())?;

        let color = image.color();
        let raster = match image {
            DynamicImage::ImageLuma8(gray) => Raster::Gray(gray),
            DynamicImage::ImageRgb8(rgb) => Raster::Rgb(rgb),
            other if is_luma(color) => Raster::Gray(composite_luma_over_black(&other.to_luma_alpha8())),
            other if color.has_alpha() => Raster::Rgb(composite_rgba_over_black(&other.to_rgba8())),
            other => Raster::Rgb(other.to_rgb8()),
        };

        Ok(raster)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = image::open(&path)?;
        log::debug!(
            "opened {} ({}x{}, {:?})",
            path.as_ref().display(),
            image.width(),
            image.height(),
            image.color()
        );
        Self::from_dynamic(image)
    }

    pub fn width(&self) -> u32 {
        match self {
            Raster::Gray(gray) => gray.width(),
            Raster::Rgb(rgb) => rgb.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Raster::Gray(gray) => gray.height(),
            Raster::Rgb(rgb) => rgb.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn layout(&self) -> Layout {
        match self {
            Raster::Gray(_) => Layout::Gray,
            Raster::Rgb(_) => Layout::Rgb,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Packed channel bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        match self {
            Raster::Gray(gray) => gray.as_raw(),
            Raster::Rgb(rgb) => rgb.as_raw(),
        }
    }

    pub fn into_raw(self) -> Vec<u8> {
        match self {
            Raster::Gray(gray) => gray.into_raw(),
            Raster::Rgb(rgb) => rgb.into_raw(),
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            Raster::Gray(gray) => DynamicImage::ImageLuma8(gray.clone()),
            Raster::Rgb(rgb) => DynamicImage::ImageRgb8(rgb.clone()),
        }
    }

    /// Alpha-blends an overlay layer into the raster.
    ///
    /// A fully transparent overlay leaves the raster untouched. Any visible
    /// overlay pixel promotes a grayscale raster to RGB first.
    pub fn flatten_overlay(&mut self, overlay: &RgbaImage) -> Result<()> {
        if overlay.dimensions() != self.dimensions() {
            return Err(ForensicsError::InvalidInput(format!(
                "overlay is {}x{}, raster is {}x{}",
                overlay.width(),
                overlay.height(),
                self.width(),
                self.height()
            )));
        }

        if overlay.pixels().all(|p| p[3] == 0) {
            return Ok(());
        }

        if let Raster::Gray(gray) = self {
            *self = Raster::Rgb(DynamicImage::ImageLuma8(gray.clone()).into_rgb8());
        }

        if let Raster::Rgb(rgb) = self {
            for (base, over) in rgb.pixels_mut().zip(overlay.pixels()) {
                let alpha = over[3] as u16;
                for c in 0..3 {
                    base[c] = blend(over[c], base[c], alpha);
                }
            }
        }

        Ok(())
    }

    /// Persists the raster, picking the format from the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_dynamic().save(&path)?;
        log::info!("saved {}", path.as_ref().display());
        Ok(())
    }

    /// Persists the raster as a JPEG at an explicit quality.
    pub fn save_jpeg<P: AsRef<Path>>(&self, path: P, quality: u8) -> Result<()> {
        let bytes = JpegRecompressor::new().encode(self, quality)?;
        fs::write(&path, bytes)?;
        log::info!("saved {} (JPEG quality {})", path.as_ref().display(), quality);
        Ok(())
    }
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ForensicsError::InvalidInput(format!(
            "image dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

fn is_luma(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16
    )
}

fn blend(top: u8, bottom: u8, alpha: u16) -> u8 {
    ((top as u16 * alpha + bottom as u16 * (255 - alpha) + 127) / 255) as u8
}

fn composite_luma_over_black(image: &image::GrayAlphaImage) -> GrayImage {
    let mut gray = GrayImage::new(image.width(), image.height());
    for (x, y, &LumaA([v, a])) in image.enumerate_pixels() {
        gray.put_pixel(x, y, Luma([blend(v, 0, a as u16)]));
    }
    gray
}

fn composite_rgba_over_black(image: &RgbaImage) -> RgbImage {
    let mut rgb = RgbImage::new(image.width(), image.height());
    for (x, y, &Rgba([r, g, b, a])) in image.enumerate_pixels() {
        let a = a as u16;
        rgb.put_pixel(x, y, Rgb([blend(r, 0, a), blend(g, 0, a), blend(b, 0, a)]));
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        let err = Raster::from_raw(2, 2, Layout::Rgb, vec![0; 11]).unwrap_err();
        assert!(matches!(err, ForensicsError::InvalidInput(_)));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            Raster::from_raw(0, 4, Layout::Gray, Vec::new()),
            Err(ForensicsError::InvalidInput(_))
        ));
        assert!(matches!(
            Raster::from_dynamic(DynamicImage::new_rgb8(3, 0)),
            Err(ForensicsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_luma_alpha_stays_gray_and_is_flattened() {
        let mut image = image::GrayAlphaImage::new(2, 1);
        image.put_pixel(0, 0, LumaA([200, 255]));
        image.put_pixel(1, 0, LumaA([200, 0]));

        let raster = Raster::from_dynamic(DynamicImage::ImageLumaA8(image)).unwrap();
        assert_eq!(raster.layout(), Layout::Gray);
        assert_eq!(raster.as_raw(), &[200, 0]);
    }

    #[test]
    fn test_rgba_becomes_rgb_over_black() {
        let mut image = RgbaImage::new(1, 1);
        image.put_pixel(0, 0, Rgba([255, 100, 0, 128]));

        let raster = Raster::from_dynamic(DynamicImage::ImageRgba8(image)).unwrap();
        assert_eq!(raster.layout(), Layout::Rgb);
        assert_eq!(raster.as_raw(), &[128, 50, 0]);
    }

    #[test]
    fn test_transparent_overlay_keeps_gray_layout() {
        let mut raster = Raster::black(3, 3, Layout::Gray).unwrap();
        raster.flatten_overlay(&RgbaImage::new(3, 3)).unwrap();
        assert_eq!(raster.layout(), Layout::Gray);
    }

    #[test]
    fn test_visible_overlay_promotes_to_rgb() {
        let mut raster = Raster::from_raw(2, 1, Layout::Gray, vec![10, 10]).unwrap();
        let mut overlay = RgbaImage::new(2, 1);
        overlay.put_pixel(1, 0, Rgba([255, 0, 0, 255]));

        raster.flatten_overlay(&overlay).unwrap();

        assert_eq!(raster.layout(), Layout::Rgb);
        assert_eq!(raster.as_raw(), &[10, 10, 10, 255, 0, 0]);
    }

    #[test]
    fn test_overlay_size_mismatch() {
        let mut raster = Raster::black(4, 4, Layout::Rgb).unwrap();
        assert!(raster.flatten_overlay(&RgbaImage::new(2, 2)).is_err());
    }
}

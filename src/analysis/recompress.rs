use image::ImageFormat;
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};

use crate::{
    error::{ForensicsError, Result},
    raster::{Layout, Raster, check_dimensions},
};

/// Produces the recompressed counterpart of a raster.
///
/// Implementations must return a raster with the same dimensions and channel
/// layout as their input.
pub trait Recompressor: Send + Sync {
    fn recompress(&self, raster: &Raster, quality: u8) -> Result<Raster>;

    fn name(&self) -> &str;
}

/// Baseline JPEG round trip held entirely in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegRecompressor;

impl JpegRecompressor {
    pub fn new() -> Self {
        Self
    }

    /// Chroma sampling for a quality factor. Full quality keeps chroma at full
    /// resolution so the baseline error does not come from subsampling.
    pub fn sampling_for(quality: u8) -> SamplingFactor {
        if quality >= 100 {
            SamplingFactor::F_1_1
        } else {
            SamplingFactor::F_2_2
        }
    }

    /// Encodes the raster as a JPEG stream.
    pub fn encode(&self, raster: &Raster, quality: u8) -> Result<Vec<u8>> {
        if quality > 100 {
            return Err(ForensicsError::InvalidInput(format!(
                "JPEG quality must be in 0..=100, got {}",
                quality
            )));
        }

        let (width, height) = raster.dimensions();
        check_dimensions(width, height)?;

        let too_large = || {
            ForensicsError::InvalidInput(format!(
                "{}x{} exceeds the JPEG limit of {} pixels per side",
                width,
                height,
                u16::MAX
            ))
        };
        let width = u16::try_from(width).map_err(|_| too_large())?;
        let height = u16::try_from(height).map_err(|_| too_large())?;

        let mut buffer = Vec::new();
        // The encoder's scale starts at 1.
        let mut encoder = Encoder::new(&mut buffer, quality.max(1));

        let color_type = match raster.layout() {
            Layout::Gray => ColorType::Luma,
            Layout::Rgb => {
                encoder.set_sampling_factor(Self::sampling_for(quality));
                ColorType::Rgb
            }
        };

        encoder.encode(raster.as_raw(), width, height, color_type)?;

        Ok(buffer)
    }

    /// Decodes a JPEG stream into the requested channel layout.
    pub fn decode(&self, bytes: &[u8], layout: Layout) -> Result<Raster> {
        // Reads from memory cannot fail as I/O, so every fault here is the codec's.
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|err| ForensicsError::Codec(err.to_string()))?;

        Ok(match layout {
            Layout::Gray => Raster::Gray(decoded.into_luma8()),
            Layout::Rgb => Raster::Rgb(decoded.into_rgb8()),
        })
    }
}

impl Recompressor for JpegRecompressor {
    fn recompress(&self, raster: &Raster, quality: u8) -> Result<Raster> {
        let bytes = self.encode(raster, quality)?;
        let reduced = self.decode(&bytes, raster.layout())?;

        if reduced.dimensions() != raster.dimensions() {
            return Err(ForensicsError::Codec(format!(
                "decoded {}x{} from a {}x{} source",
                reduced.width(),
                reduced.height(),
                raster.width(),
                raster.height()
            )));
        }

        log::debug!(
            "recompressed {}x{} {:?} at quality {} ({} bytes)",
            raster.width(),
            raster.height(),
            raster.layout(),
            quality,
            bytes.len()
        );

        Ok(reduced)
    }

    fn name(&self) -> &str {
        "JPEG"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(width: u32, height: u32, layout: Layout) -> Raster {
        let mut state = 0x2545_f491u32;
        let len = (width * height) as usize * layout.channels();
        let data = (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();
        Raster::from_raw(width, height, layout, data).unwrap()
    }

    #[test]
    fn test_stream_is_jpeg() {
        let raster = noise(16, 16, Layout::Rgb);
        let bytes = JpegRecompressor::new().encode(&raster, 88).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_higher_quality_produces_larger_stream() {
        let raster = noise(32, 32, Layout::Rgb);
        let recompressor = JpegRecompressor::new();
        let low = recompressor.encode(&raster, 20).unwrap();
        let high = recompressor.encode(&raster, 95).unwrap();
        assert!(high.len() > low.len());
    }

    #[test]
    fn test_layout_and_dimensions_preserved() {
        let recompressor = JpegRecompressor::new();
        for layout in [Layout::Gray, Layout::Rgb] {
            let raster = noise(13, 7, layout);
            let reduced = recompressor.recompress(&raster, 75).unwrap();
            assert_eq!(reduced.layout(), layout);
            assert_eq!(reduced.dimensions(), (13, 7));
        }
    }

    #[test]
    fn test_quality_zero_is_accepted() {
        let raster = noise(8, 8, Layout::Gray);
        assert!(JpegRecompressor::new().recompress(&raster, 0).is_ok());
    }

    #[test]
    fn test_quality_out_of_range() {
        let raster = noise(8, 8, Layout::Rgb);
        assert!(matches!(
            JpegRecompressor::new().encode(&raster, 101),
            Err(ForensicsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_full_quality_disables_subsampling() {
        assert_eq!(JpegRecompressor::sampling_for(100), SamplingFactor::F_1_1);
        assert_eq!(JpegRecompressor::sampling_for(88), SamplingFactor::F_2_2);
    }

    /// Sampling byte of the first component in the SOF0 frame header.
    fn luma_sampling(stream: &[u8]) -> u8 {
        let sof = stream
            .windows(2)
            .position(|w| w == [0xFF, 0xC0])
            .unwrap();
        // marker(2) length(2) precision(1) height(2) width(2) count(1) id(1)
        stream[sof + 11]
    }

    #[test]
    fn test_encoded_stream_carries_sampling() {
        let raster = noise(16, 16, Layout::Rgb);
        let recompressor = JpegRecompressor::new();

        let full = recompressor.encode(&raster, 100).unwrap();
        let reduced = recompressor.encode(&raster, 88).unwrap();

        assert_eq!(luma_sampling(&full), 0x11);
        assert_eq!(luma_sampling(&reduced), 0x22);
    }

    #[test]
    fn test_empty_raster_rejected_before_encoding() {
        let empty = Raster::Rgb(image::RgbImage::new(0, 3));
        assert!(matches!(
            JpegRecompressor::new().encode(&empty, 88),
            Err(ForensicsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_garbage_stream_is_codec_error() {
        let err = JpegRecompressor::new()
            .decode(&[0xFF, 0xD8, 0x00, 0x01], Layout::Rgb)
            .unwrap_err();
        assert!(matches!(err, ForensicsError::Codec(_)));
    }
}

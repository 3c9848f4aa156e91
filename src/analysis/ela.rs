use std::path::Path;

use rayon::prelude::*;

use crate::{
    analysis::recompress::{JpegRecompressor, Recompressor},
    error::{ForensicsError, Result},
    raster::{Raster, check_dimensions},
};

pub const MAX_QUALITY: u8 = 100;
pub const MAX_SCALE: u8 = 50;

/// Recompression quality and amplification for one ELA run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElaParameters {
    quality: u8,
    scale: u8,
}

impl ElaParameters {
    pub fn new(quality: u8, scale: u8) -> Result<Self> {
        if quality > MAX_QUALITY {
            return Err(ForensicsError::InvalidInput(format!(
                "quality must be in 0..={}, got {}",
                MAX_QUALITY, quality
            )));
        }
        if scale > MAX_SCALE {
            return Err(ForensicsError::InvalidInput(format!(
                "scale must be in 0..={}, got {}",
                MAX_SCALE, scale
            )));
        }

        Ok(Self { quality, scale })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }
}

impl Default for ElaParameters {
    fn default() -> Self {
        Self {
            quality: 88,
            scale: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElaResult {
    /// Scaled error levels, in the layout of `recompressed`.
    pub image: Raster,
    pub recompressed: Raster,
    /// Largest unscaled channel difference.
    pub max_difference: u8,
    /// Mean unscaled channel difference.
    pub mean_difference: f64,
}

impl ElaResult {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save(path)
    }
}

pub struct ElaAnalyzer<R = JpegRecompressor> {
    params: ElaParameters,
    recompressor: R,
}

impl ElaAnalyzer {
    pub fn new(params: ElaParameters) -> Self {
        Self::with_recompressor(params, JpegRecompressor::new())
    }
}

impl<R: Recompressor> ElaAnalyzer<R> {
    pub fn with_recompressor(params: ElaParameters, recompressor: R) -> Self {
        Self {
            params,
            recompressor,
        }
    }

    pub fn parameters(&self) -> ElaParameters {
        self.params
    }

    pub fn analyze(&self, original: &Raster) -> Result<ElaResult> {
        // The enum variants can be built directly, bypassing the constructors.
        check_dimensions(original.width(), original.height())?;

        let reduced = self.recompressor.recompress(original, self.params.quality)?;

        if reduced.dimensions() != original.dimensions() || reduced.layout() != original.layout() {
            return Err(ForensicsError::Codec(format!(
                "{} recompressor returned {}x{} {:?} for a {}x{} {:?} source",
                self.recompressor.name(),
                reduced.width(),
                reduced.height(),
                reduced.layout(),
                original.width(),
                original.height(),
                original.layout()
            )));
        }

        let differences = absolute_differences(original.as_raw(), reduced.as_raw());
        let max_difference = differences.iter().copied().max().unwrap_or(0);
        let mean_difference = differences.iter().map(|&d| d as f64).sum::<f64>() / differences.len() as f64;

        let levels = scale_levels(&differences, self.params.scale);
        let (width, height) = reduced.dimensions();
        let image = Raster::from_raw(width, height, reduced.layout(), levels)?;

        log::debug!(
            "ELA {}x{} quality={} scale={}: max diff {}, mean diff {:.3}",
            width,
            height,
            self.params.quality,
            self.params.scale,
            max_difference,
            mean_difference
        );

        Ok(ElaResult {
            image,
            recompressed: reduced,
            max_difference,
            mean_difference,
        })
    }

    /// Analyzes independent images in parallel; results keep input order.
    pub fn analyze_batch(&self, images: &[Raster]) -> Vec<Result<ElaResult>> {
        images.par_iter().map(|image| self.analyze(image)).collect()
    }
}

/// Runs ELA with the JPEG recompressor and returns the visualization.
pub fn compute_ela(original: &Raster, quality: u8, scale: u8) -> Result<Raster> {
    let params = ElaParameters::new(quality, scale)?;
    Ok(ElaAnalyzer::new(params).analyze(original)?.image)
}

/// Per-channel error levels: `(|reduced - original| * scale) & 0xFF`.
///
/// Products above 255 wrap rather than saturate. The resulting banding at high
/// scale is part of how the visualization looks and is kept on purpose.
pub fn error_levels(original: &[u8], reduced: &[u8], scale: u8) -> Vec<u8> {
    scale_levels(&absolute_differences(original, reduced), scale)
}

fn absolute_differences(original: &[u8], reduced: &[u8]) -> Vec<u8> {
    original
        .iter()
        .zip(reduced)
        .map(|(&o, &r)| o.abs_diff(r))
        .collect()
}

fn scale_levels(differences: &[u8], scale: u8) -> Vec<u8> {
    differences
        .iter()
        .map(|&d| ((d as u32 * scale as u32) & 0xFF) as u8)
        .collect()
}

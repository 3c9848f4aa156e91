use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::{
    analysis::ela::{ElaAnalyzer, ElaParameters, ElaResult},
    error::{ForensicsError, Result},
    raster::Raster,
    report::ReportBuilder,
};

pub mod analysis;
pub mod digest;
pub mod error;
pub mod raster;
pub mod report;

pub const ELA_OPERATION: &str = "Error Level Analysis";
pub const ELA_REFERENCE: &str =
    "Neal Krawetz, A Picture's Worth - Digital Image Analysis and Forensics, Black Hat Briefings, USA 2007.";

pub struct ForensicsAnalyzer {
    original: Raster,
    params: ElaParameters,
    path: Option<PathBuf>,
}

impl ForensicsAnalyzer {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let original = Raster::open(&path)?;

        Ok(Self {
            original,
            params: ElaParameters::default(),
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    pub fn from_raster(raster: Raster) -> Self {
        Self {
            original: raster,
            params: ElaParameters::default(),
            path: None,
        }
    }

    pub fn with_parameters(mut self, params: ElaParameters) -> Self {
        self.params = params;
        self
    }

    /// Burns a visible overlay into the image before any recompression.
    pub fn with_overlay(mut self, overlay: &RgbaImage) -> Result<Self> {
        self.original.flatten_overlay(overlay)?;
        Ok(self)
    }

    pub fn original(&self) -> &Raster {
        &self.original
    }

    pub fn parameters(&self) -> ElaParameters {
        self.params
    }

    pub fn ela(&self) -> Result<ElaResult> {
        ElaAnalyzer::new(self.params).analyze(&self.original)
    }

    /// Report preset covering the source file and a saved ELA image.
    pub fn report<P: AsRef<Path>>(&self, ela_path: P) -> Result<ReportBuilder> {
        let source = self.path.as_ref().ok_or_else(|| {
            ForensicsError::InvalidInput("no source file available for the report".into())
        })?;
        ela_report(&self.params, source, ela_path)
    }
}

/// Builds the standard ELA report over the original and the ELA image files.
pub fn ela_report<P: AsRef<Path>, Q: AsRef<Path>>(
    params: &ElaParameters,
    original_path: P,
    ela_path: Q,
) -> Result<ReportBuilder> {
    let mut builder = ReportBuilder::new();

    builder
        .set_operation(ELA_OPERATION)
        .set_summary("Error Level Analysis of a JPEG image")
        .set_details(
            "Error Level Analysis resaves the image at a known JPEG quality and amplifies \
             the per-pixel difference against the original, exposing regions whose \
             compression history differs from the rest of the image.",
        )
        .add_parameter(
            "Quality",
            "JPEG quality used for the resaved image.",
            params.quality().to_string(),
        )
        .add_parameter(
            "Scale",
            "Factor amplifying the differences between the original and the resaved image.",
            params.scale().to_string(),
        )
        .add_reference(ELA_REFERENCE);

    builder.add_file(original_path)?;
    builder.add_file(ela_path)?;

    Ok(builder)
}

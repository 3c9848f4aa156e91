pub mod html;
pub mod sink;

use std::{env, fs, path::{Path, PathBuf}};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::{
    digest::{DigestAlgorithm, digest_file},
    error::{ForensicsError, Result},
};

pub use sink::{FileSink, FileTarget};

pub const DEFAULT_TITLE: &str = "Image Forensics Report";
pub const UNKNOWN_IDENTITY: &str = "Unknown";
pub const MAX_FILES: usize = 2;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Who produced the report and where, plus the document title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub title: String,
    pub operator: String,
    pub host: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            operator: UNKNOWN_IDENTITY.to_string(),
            host: UNKNOWN_IDENTITY.to_string(),
        }
    }
}

impl ReportConfig {
    /// Reads operator and host names from the process environment.
    pub fn from_environment() -> Self {
        let operator = env::var("USER")
            .or_else(|_| env::var("USERNAME"))
            .ok()
            .filter(|name| !name.trim().is_empty());

        let host = env::var("HOSTNAME")
            .or_else(|_| env::var("COMPUTERNAME"))
            .ok()
            .or_else(|| fs::read_to_string("/etc/hostname").ok())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        if operator.is_none() {
            log::warn!("operator name unavailable, reporting as {}", UNKNOWN_IDENTITY);
        }
        if host.is_none() {
            log::warn!("host name unavailable, reporting as {}", UNKNOWN_IDENTITY);
        }

        Self {
            title: DEFAULT_TITLE.to_string(),
            operator: operator.unwrap_or_else(|| UNKNOWN_IDENTITY.to_string()),
            host: host.unwrap_or_else(|| UNKNOWN_IDENTITY.to_string()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterEntry {
    pub name: String,
    pub detail: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDigestSet {
    pub path: String,
    pub md5: String,
    pub sha1: String,
}

impl FileDigestSet {
    pub fn compute<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            path: path.as_ref().display().to_string(),
            md5: digest_file(&path, DigestAlgorithm::Md5)?,
            sha1: digest_file(&path, DigestAlgorithm::Sha1)?,
        })
    }
}

/// A finalized report. Produced once by [`ReportBuilder::finish`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportRecord {
    pub title: String,
    pub operation: String,
    pub summary: String,
    pub details: String,
    pub parameters: Vec<ParameterEntry>,
    pub references: Vec<String>,
    pub generated_at: String,
    pub operator: String,
    pub host: String,
    pub files: Vec<FileDigestSet>,
}

impl ReportRecord {
    pub fn to_html(&self) -> String {
        html::render(self)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Collects the fields of a report before it is finalized.
///
/// Parameters and references keep insertion order; duplicate entries are kept.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    operation: Option<String>,
    summary: String,
    details: String,
    parameters: Vec<ParameterEntry>,
    references: Vec<String>,
    files: Vec<PathBuf>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_operation(&mut self, operation: impl Into<String>) -> &mut Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) -> &mut Self {
        self.summary = summary.into();
        self
    }

    pub fn set_details(&mut self, details: impl Into<String>) -> &mut Self {
        self.details = details.into();
        self
    }

    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        detail: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.parameters.push(ParameterEntry {
            name: name.into(),
            detail: detail.into(),
            value: value.into(),
        });
        self
    }

    pub fn add_reference(&mut self, reference: impl Into<String>) -> &mut Self {
        self.references.push(reference.into());
        self
    }

    /// Registers a file whose digests go into the report.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        if self.files.len() >= MAX_FILES {
            return Err(ForensicsError::BuilderMisuse(format!(
                "a report covers at most {} files",
                MAX_FILES
            )));
        }
        self.files.push(path.as_ref().to_path_buf());
        Ok(self)
    }

    pub fn finish(self, config: &ReportConfig) -> Result<ReportRecord> {
        self.finish_at(config, Local::now().naive_local())
    }

    /// Finalizes the report with an explicit generation time.
    ///
    /// Every registered file is digested here, so they must exist and be
    /// complete by now.
    pub fn finish_at(self, config: &ReportConfig, generated_at: NaiveDateTime) -> Result<ReportRecord> {
        let operation = self
            .operation
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ForensicsError::BuilderMisuse("no operation name set".into()))?;

        let files = self
            .files
            .iter()
            .map(FileDigestSet::compute)
            .collect::<Result<Vec<_>>>()?;

        Ok(ReportRecord {
            title: config.title.clone(),
            operation,
            summary: self.summary,
            details: self.details,
            parameters: self.parameters,
            references: self.references,
            generated_at: generated_at.format(TIMESTAMP_FORMAT).to_string(),
            operator: config.operator.clone(),
            host: config.host.clone(),
            files,
        })
    }

    /// Finalizes the report and hands the HTML document to `sink`.
    pub fn render<S: FileSink + ?Sized>(self, config: &ReportConfig, sink: &mut S) -> Result<ReportRecord> {
        let record = self.finish(config)?;
        sink.write_document(record.to_html().as_bytes())?;
        log::info!("rendered report '{}' ({} files)", record.operation, record.files.len());
        Ok(record)
    }
}

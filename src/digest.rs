use std::{
    fmt::{self, LowerHex},
    fs::File,
    io::{BufReader, Read},
    path::Path,
    str::FromStr,
};

use md5::Md5;
use sha1::{Digest, Sha1, digest::Output};

use crate::error::{ForensicsError, Result};

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
}

impl DigestAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha1 => "SHA-1",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ForensicsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MD5" => Ok(DigestAlgorithm::Md5),
            "SHA-1" | "SHA1" => Ok(DigestAlgorithm::Sha1),
            _ => Err(ForensicsError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Hashes everything `reader` yields and returns the lowercase hex digest.
///
/// The source is read to exhaustion in fixed-size chunks.
pub fn digest_reader<R: Read>(reader: R, algorithm: DigestAlgorithm) -> Result<String> {
    match algorithm {
        DigestAlgorithm::Md5 => stream::<Md5, _>(reader),
        DigestAlgorithm::Sha1 => stream::<Sha1, _>(reader),
    }
}

pub fn digest_file<P: AsRef<Path>>(path: P, algorithm: DigestAlgorithm) -> Result<String> {
    let file = File::open(&path)?;
    let hex = digest_reader(BufReader::new(file), algorithm)?;
    log::debug!("{} {} = {}", algorithm, path.as_ref().display(), hex);
    Ok(hex)
}

/// Like [`digest_file`], with the algorithm given by name.
pub fn digest_named<P: AsRef<Path>>(path: P, algorithm: &str) -> Result<String> {
    digest_file(path, algorithm.parse()?)
}

fn stream<D: Digest, R: Read>(mut reader: R) -> Result<String>
where
    Output<D>: LowerHex,
{
    let mut hasher = D::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        hasher.update(&chunk[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

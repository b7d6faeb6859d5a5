//! Decoder provisioning.
//!
//! The decoder is cached at `<install_dir>/<binary_name>`. When it is missing
//! it is downloaded from `<base_url>/<build_id>/<binary_name>`, falling back
//! to a fixed URL, and installed executable. Both downloads failing aborts
//! the run before any suite starts.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::error::{CiError, Result};

pub const DEFAULT_INSTALL_DIR: &str = "/opt/cros-codecs";
pub const DEFAULT_BINARY_NAME: &str = "ccdec";
pub const DEFAULT_BASE_URL: &str = "https://people.collabora.com/~detlev/cros-codecs-tests";
pub const DEFAULT_FALLBACK_URL: &str =
    "https://people.collabora.com/~detlev/cros-codecs-tests/ccdec";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("remote object not found")]
    NotFound,
    #[error("remote object is empty")]
    Empty,
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Transport used to download the decoder.
pub trait Fetch {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// `http`, `https` and `file` downloads through a shared `ureq` agent.
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl UreqFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .redirects(5)
            .timeout_connect(Duration::from_secs(30))
            .timeout(Duration::from_secs(600))
            .build();
        Self { agent }
    }
}

impl Fetch for UreqFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| FetchError::Transport("invalid file url".to_string()))?;
                match fs::read(path) {
                    Ok(bytes) => Ok(bytes),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound),
                    Err(err) => Err(err.into()),
                }
            }
            "http" | "https" => {
                let response = match self.agent.get(url.as_str()).call() {
                    Ok(response) => response,
                    Err(ureq::Error::Status(404, _)) => return Err(FetchError::NotFound),
                    Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
                    Err(err) => return Err(FetchError::Transport(err.to_string())),
                };
                if response.status() != 200 {
                    return Err(FetchError::Status(response.status()));
                }
                let mut buf = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut buf)
                    .map_err(|err| FetchError::Transport(err.to_string()))?;
                Ok(buf)
            }
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Where the decoder came from on this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Already installed; nothing was downloaded.
    Cached,
    Primary(Url),
    Fallback(Url),
}

/// A decoder executable ready to be run by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderBinary {
    pub path: PathBuf,
    pub provenance: Provenance,
}

impl DecoderBinary {
    /// Directory the harness must be able to find the decoder in.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    pub install_dir: PathBuf,
    pub binary_name: String,
    pub base_url: String,
    pub fallback_url: String,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            binary_name: DEFAULT_BINARY_NAME.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
        }
    }
}

pub struct Provisioner<F> {
    settings: ProvisionSettings,
    fetcher: F,
}

impl<F: Fetch> Provisioner<F> {
    pub fn new(settings: ProvisionSettings, fetcher: F) -> Self {
        Self { settings, fetcher }
    }

    pub fn binary_path(&self) -> PathBuf {
        self.settings.install_dir.join(&self.settings.binary_name)
    }

    /// `<base_url>/<build_id>/<binary_name>`
    ///
    /// The build id is always exactly one percent-encoded path segment.
    pub fn primary_url(&self, build_id: &str) -> Result<Url> {
        let build_id = build_id.trim();
        if build_id.is_empty() || build_id.contains('/') || build_id == ".." || build_id == "." {
            return Err(CiError::InvalidUrl(format!("invalid build id: {build_id:?}")));
        }
        let base = &self.settings.base_url;
        let mut url =
            Url::parse(base).map_err(|err| CiError::InvalidUrl(format!("{base}: {err}")))?;
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| CiError::InvalidUrl(format!("{base}: not a base url")))?
            .pop_if_empty()
            .push(build_id)
            .push(&self.settings.binary_name);
        Ok(url)
    }

    pub fn fallback_url(&self) -> Result<Url> {
        Url::parse(&self.settings.fallback_url)
            .map_err(|err| CiError::InvalidUrl(format!("{}: {err}", self.settings.fallback_url)))
    }

    /// Make sure the decoder is installed and executable.
    ///
    /// A cached binary short-circuits without touching the network.
    pub fn ensure(&self, build_id: &str) -> Result<DecoderBinary> {
        let path = self.binary_path();
        if path.is_file() {
            make_executable(&path)?;
            info!(path = %path.display(), "using cached decoder");
            return Ok(DecoderBinary {
                path,
                provenance: Provenance::Cached,
            });
        }

        let primary = self.primary_url(build_id)?;
        let fallback = self.fallback_url()?;

        let (bytes, provenance) = match self.fetch_object(&primary) {
            Ok(bytes) => (bytes, Provenance::Primary(primary)),
            Err(primary_err) => {
                warn!(url = %primary, error = %primary_err, "primary decoder download failed, trying fallback");
                match self.fetch_object(&fallback) {
                    Ok(bytes) => (bytes, Provenance::Fallback(fallback)),
                    Err(fallback_err) => {
                        return Err(CiError::ProvisioningFailed {
                            build_id: build_id.to_string(),
                            primary: format!("{primary}: {primary_err}"),
                            fallback: format!("{fallback}: {fallback_err}"),
                        });
                    }
                }
            }
        };

        self.install(&bytes, &path)?;
        info!(path = %path.display(), bytes = bytes.len(), ?provenance, "installed decoder");
        Ok(DecoderBinary { path, provenance })
    }

    fn fetch_object(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        info!(%url, "downloading decoder");
        let bytes = self.fetcher.fetch(url)?;
        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(bytes)
    }

    /// A partial download never appears at the final path.
    fn install(&self, bytes: &[u8], path: &Path) -> Result<()> {
        fs::create_dir_all(&self.settings.install_dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".ccdec-download-")
            .tempfile_in(&self.settings.install_dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        make_executable(tmp.path())?;
        tmp.persist(path).map_err(|err| CiError::Io(err.error))?;
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    let mode = perms.mode();
    if mode & 0o111 != 0o111 {
        perms.set_mode(mode | 0o755);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "tests/provision.rs"]
mod tests;

//! The conformance matrix: which codecs each architecture exercises, which
//! fluster suites cover each codec, and which vectors are skipped where.
//!
//! All tables are keyed by typed values. A `Matrix` is built once (either
//! [`Matrix::builtin`] or [`crate::matrix_file::load`]) and only read
//! afterwards.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CiError, Result};
use crate::skip_list::SkipList;

/// Target hardware profile under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Architecture {
    Amd,
    Intel,
}

impl Architecture {
    pub const ALL: [Architecture; 2] = [Architecture::Amd, Architecture::Intel];

    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::Amd => "amd",
            Architecture::Intel => "intel",
        }
    }
}

impl FromStr for Architecture {
    type Err = CiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amd" => Ok(Architecture::Amd),
            "intel" => Ok(Architecture::Intel),
            _ => Err(CiError::UnknownArchitecture(s.to_string())),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Video compression format under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Codec {
    Vp8,
    Vp9,
    H264,
    H265,
}

impl Codec {
    pub const ALL: [Codec; 4] = [Codec::Vp8, Codec::Vp9, Codec::H264, Codec::H265];

    pub fn as_str(self) -> &'static str {
        match self {
            Codec::Vp8 => "vp8",
            Codec::Vp9 => "vp9",
            Codec::H264 => "h.264",
            Codec::H265 => "h.265",
        }
    }

    /// Codec spelling used in fluster decoder names.
    pub fn fluster_name(self) -> &'static str {
        match self {
            Codec::Vp8 => "VP8",
            Codec::Vp9 => "VP9",
            Codec::H264 => "H.264",
            Codec::H265 => "H.265",
        }
    }

    /// The fluster decoder adapter that drives `ccdec` for this codec.
    pub fn decoder_adapter(self) -> String {
        format!("ccdec-{}", self.fluster_name())
    }
}

impl FromStr for Codec {
    type Err = CiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vp8" => Ok(Codec::Vp8),
            "vp9" => Ok(Codec::Vp9),
            "h.264" | "h264" => Ok(Codec::H264),
            "h.265" | "h265" => Ok(Codec::H265),
            _ => Err(CiError::UnknownCodec(s.to_string())),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a fluster test-vector collection, e.g. `VP9-TEST-VECTORS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestSuite(String);

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the execution plan for an architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitePlan {
    pub codec: Codec,
    pub suite: TestSuite,
    pub skip: SkipList,
}

// =============================================================================
// Built-in tables
// =============================================================================

const ARCH_CODECS: &[(Architecture, &[Codec])] = &[
    (Architecture::Intel, &[Codec::Vp8, Codec::Vp9]),
    (Architecture::Amd, &[Codec::H264, Codec::H265, Codec::Vp9]),
];

const CODEC_SUITES: &[(Codec, &[&str])] = &[
    (Codec::Vp8, &["VP8-TEST-VECTORS"]),
    (Codec::Vp9, &["VP9-TEST-VECTORS"]),
    (Codec::H264, &["JVT-AVC_V1"]),
    (Codec::H265, &["JCT-VC-HEVC_V1"]),
];

/// Profile 1 (non-4:2:0) VP9 streams are not supported by the hardware decoders.
const SKIP_VECTORS: &[(Architecture, &str, &[&str])] = &[
    (
        Architecture::Intel,
        "VP9-TEST-VECTORS",
        &["vp91-2-04-yuv422.webm"],
    ),
    (
        Architecture::Amd,
        "VP9-TEST-VECTORS",
        &[
            "vp91-2-04-yuv422.webm",
            "vp91-2-04-yuv440.webm",
            "vp91-2-04-yuv444.webm",
        ],
    ),
];

/// LAVA device types the CI jobs are scheduled on.
const DEVICE_TYPES: &[(Architecture, &str)] = &[
    (Architecture::Intel, "hp-x360-12b-ca0010nr-n4020-octopus"),
    (Architecture::Amd, "hp-11A-G6-EE-grunt"),
];

/// Architecture × codec × suite tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    codecs: FxHashMap<Architecture, Vec<Codec>>,
    suites: FxHashMap<Codec, Vec<TestSuite>>,
    skips: FxHashMap<(Architecture, TestSuite), SkipList>,
    device_types: FxHashMap<Architecture, String>,
}

impl Matrix {
    /// The matrix compiled into the binary.
    pub fn builtin() -> Self {
        let mut matrix = Matrix::default();
        for (arch, codecs) in ARCH_CODECS {
            matrix.codecs.insert(*arch, codecs.to_vec());
        }
        for (codec, suites) in CODEC_SUITES {
            matrix
                .suites
                .insert(*codec, suites.iter().map(|s| TestSuite::new(*s)).collect());
        }
        for (arch, suite, vectors) in SKIP_VECTORS {
            matrix.skips.insert(
                (*arch, TestSuite::new(*suite)),
                vectors.iter().copied().collect(),
            );
        }
        for (arch, device_type) in DEVICE_TYPES {
            matrix.device_types.insert(*arch, (*device_type).to_string());
        }
        matrix
    }

    pub(crate) fn set_codecs(&mut self, arch: Architecture, codecs: Vec<Codec>) {
        self.codecs.insert(arch, codecs);
    }

    pub(crate) fn set_suites(&mut self, codec: Codec, suites: Vec<TestSuite>) {
        self.suites.insert(codec, suites);
    }

    pub(crate) fn set_skip_list(&mut self, arch: Architecture, suite: TestSuite, skip: SkipList) {
        if skip.is_empty() {
            self.skips.remove(&(arch, suite));
        } else {
            self.skips.insert((arch, suite), skip);
        }
    }

    pub(crate) fn set_device_type(&mut self, arch: Architecture, device_type: String) {
        self.device_types.insert(arch, device_type);
    }

    /// Architectures with a codec entry, in a stable order.
    pub fn architectures(&self) -> Vec<Architecture> {
        let mut archs: Vec<_> = self.codecs.keys().copied().collect();
        archs.sort();
        archs
    }

    /// Ordered codecs exercised on `arch`.
    pub fn codecs_for(&self, arch: Architecture) -> Result<&[Codec]> {
        self.codecs
            .get(&arch)
            .map(Vec::as_slice)
            .ok_or_else(|| CiError::UnknownArchitecture(arch.to_string()))
    }

    /// All suites covering `codec`, in execution order.
    pub fn suites_for(&self, codec: Codec) -> Result<&[TestSuite]> {
        match self.suites.get(&codec) {
            Some(suites) if !suites.is_empty() => Ok(suites),
            _ => Err(CiError::UnknownCodec(codec.to_string())),
        }
    }

    /// The primary suite for `codec`.
    pub fn suite_for(&self, codec: Codec) -> Result<&TestSuite> {
        // suites_for never hands back an empty slice
        Ok(&self.suites_for(codec)?[0])
    }

    /// Vectors to exclude for `(arch, suite)`; empty when nothing is configured.
    pub fn skip_list_for(&self, arch: Architecture, suite: &TestSuite) -> SkipList {
        self.skips
            .get(&(arch, suite.clone()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn device_type_for(&self, arch: Architecture) -> Result<&str> {
        self.device_types
            .get(&arch)
            .map(String::as_str)
            .ok_or_else(|| CiError::UnknownArchitecture(arch.to_string()))
    }

    /// Flatten the matrix into the ordered list of suites to run on `arch`.
    ///
    /// Every lookup is resolved up front so a configuration error surfaces
    /// before anything is provisioned or executed.
    pub fn plan(&self, arch: Architecture) -> Result<Vec<SuitePlan>> {
        let mut plan = Vec::new();
        for &codec in self.codecs_for(arch)? {
            for suite in self.suites_for(codec)? {
                plan.push(SuitePlan {
                    codec,
                    suite: suite.clone(),
                    skip: self.skip_list_for(arch, suite),
                });
            }
        }
        Ok(plan)
    }
}

#[cfg(test)]
#[path = "tests/matrix.rs"]
mod tests;

//! Ordered user-agent signature tables.
//!
//! Tables are evaluated top to bottom and the first matching pattern wins, so
//! a browser whose user agent embeds another's token (Edge and Opera both
//! carry `Chrome/`) must sit above it.

use regex::Regex;

/// How a signature turns its capture group into a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRule {
    /// No version is reported.
    None,
    /// Capture group 1 as-is.
    Capture,
    /// Capture group 1 with `_` separators rewritten to `.`.
    Dotted,
    /// Capture group 1 is a Windows NT version, mapped to a release name.
    WindowsNt,
}

#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub pattern: &'static str,
    pub name: &'static str,
    pub version: VersionRule,
}

impl Signature {
    pub const fn new(pattern: &'static str, name: &'static str, version: VersionRule) -> Self {
        Self {
            pattern,
            name,
            version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch {
    pub name: &'static str,
    pub version: Option<String>,
}

impl SignatureMatch {
    /// `name` followed by the version when there is one.
    pub fn display(&self) -> String {
        match &self.version {
            Some(version) => format!("{} {}", self.name, version),
            None => self.name.to_string(),
        }
    }
}

/// Compiles every pattern in `table`. Tables are static, so a bad pattern
/// is a programming error.
pub(crate) fn compile(table: &[Signature]) -> Vec<Regex> {
    table
        .iter()
        .map(|sig| {
            Regex::new(sig.pattern)
                .unwrap_or_else(|err| panic!("invalid signature for {}: {err}", sig.name))
        })
        .collect()
}

/// First signature in `table` whose pattern matches `input`.
pub fn match_signature(
    table: &[Signature],
    compiled: &[Regex],
    input: &str,
) -> Option<SignatureMatch> {
    table
        .iter()
        .zip(compiled)
        .find_map(|(sig, regex)| {
            let caps = regex.captures(input)?;
            let raw = caps.get(1).map(|m| m.as_str());
            let version = match sig.version {
                VersionRule::None => None,
                VersionRule::Capture => raw.map(str::to_string),
                VersionRule::Dotted => raw.map(|v| v.replace('_', ".")),
                VersionRule::WindowsNt => raw.and_then(windows_release),
            };
            Some(SignatureMatch {
                name: sig.name,
                version,
            })
        })
}

fn windows_release(nt_version: &str) -> Option<String> {
    let release = match nt_version {
        "10.0" => "10/11",
        "6.3" => "8.1",
        "6.2" => "8",
        "6.1" => "7",
        "6.0" => "Vista",
        "5.1" | "5.2" => "XP",
        other => return Some(format!("NT {other}")),
    };
    Some(release.to_string())
}

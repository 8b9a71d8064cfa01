//! Release naming and `sha256sum`-style checksum manifests.

use crate::error::{Result, VigilError};
use crate::platform::Platform;
use regex::Regex;
use vigil_api::Digest;

pub const TOOL_NAME: &str = "grype";

/// `grype_<version>_<platform>.tar.gz`
pub fn archive_name(version: &str, platform: Platform) -> String {
    format!("{}_{}_{}.tar.gz", TOOL_NAME, version, platform)
}

/// `grype_<version>_checksums.txt`
pub fn checksums_name(version: &str) -> String {
    format!("{}_{}_checksums.txt", TOOL_NAME, version)
}

/// Find the digest recorded for `file_name` in a checksums manifest.
///
/// Lines look like `<64 hex>  <file name>`. Exactly one line must name the
/// file; none or several is an error.
pub fn lookup_digest(manifest: &str, file_name: &str) -> Result<Digest> {
    let pattern = format!(
        r"(?m)^([0-9a-f]{{64}}) [ *]{}\r?$",
        regex::escape(file_name)
    );
    let regex = Regex::new(&pattern).map_err(|e| VigilError::Internal(e.to_string()))?;

    let found: Vec<&str> = regex
        .captures_iter(manifest)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    match found.as_slice() {
        [hex] => Digest::from_hex(hex)
            .ok_or_else(|| VigilError::Internal(format!("invalid digest in manifest: {}", hex))),
        _ => Err(VigilError::ManifestEntryNotFound {
            archive: file_name.to_string(),
            matches: found.len(),
        }),
    }
}

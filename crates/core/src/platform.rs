use crate::error::{Result, VigilError};
use std::fmt;

/// Release target identifier as it appears in scanner archive names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    LinuxAmd64,
    LinuxArm64,
    DarwinAmd64,
    DarwinArm64,
}

impl Platform {
    /// Platform of the running process.
    pub fn detect() -> Result<Self> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self> {
        match (os, arch) {
            ("linux", "x86_64") => Ok(Platform::LinuxAmd64),
            ("linux", "aarch64") => Ok(Platform::LinuxArm64),
            ("macos", "x86_64") => Ok(Platform::DarwinAmd64),
            ("macos", "aarch64") => Ok(Platform::DarwinArm64),
            _ => Err(VigilError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinuxAmd64 => "linux_amd64",
            Platform::LinuxArm64 => "linux_arm64",
            Platform::DarwinAmd64 => "darwin_amd64",
            Platform::DarwinArm64 => "darwin_arm64",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

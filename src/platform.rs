//! Platform identity used to pick release assets and executable names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    #[serde(alias = "darwin")]
    MacOS,
    Windows,
    FreeBSD,
}

impl Os {
    /// Detect the operating system this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Os::MacOS
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "freebsd") {
            Os::FreeBSD
        } else {
            Os::Linux
        }
    }

    /// Names release authors use for this OS in asset file names.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Os::Linux => &["linux"],
            Os::MacOS => &["darwin", "macos", "apple", "osx"],
            Os::Windows => &["windows", "win64", "win32", "win"],
            Os::FreeBSD => &["freebsd"],
        }
    }

    /// Executable file extension, including the dot.
    pub fn exe_extension(&self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            _ => "",
        }
    }

    /// Whether a running executable can be overwritten in place.
    ///
    /// Windows holds a lock on the image of every running executable, so the
    /// file has to be renamed aside first and removed after exit.
    pub fn locks_running_executables(&self) -> bool {
        matches!(self, Os::Windows)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Os::Linux => "linux",
            Os::MacOS => "macos",
            Os::Windows => "windows",
            Os::FreeBSD => "freebsd",
        };
        f.write_str(name)
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Os::Linux),
            "macos" | "darwin" | "osx" => Ok(Os::MacOS),
            "windows" | "win" => Ok(Os::Windows),
            "freebsd" => Ok(Os::FreeBSD),
            _ => Err(format!("unknown operating system: {}", s)),
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Amd64,
    Arm64,
    Arm,
    X86,
}

impl Arch {
    /// Detect the architecture this binary was built for.
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "aarch64" => Arch::Arm64,
            "arm" => Arch::Arm,
            "x86" => Arch::X86,
            _ => Arch::Amd64,
        }
    }

    /// Names release authors use for this architecture in asset file names.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Arch::Amd64 => &["amd64", "x86_64", "x64", "64bit"],
            Arch::Arm64 => &["arm64", "aarch64"],
            Arch::Arm => &["armv7", "armhf", "arm"],
            Arch::X86 => &["386", "i686", "i386", "x86", "32bit"],
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Arm => "arm",
            Arch::X86 => "x86",
        };
        f.write_str(name)
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" => Ok(Arch::Amd64),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "arm" | "armv7" | "armhf" => Ok(Arch::Arm),
            "x86" | "386" | "i386" | "i686" => Ok(Arch::X86),
            _ => Err(format!("unknown architecture: {}", s)),
        }
    }
}

/// C library / ABI flavour, used as a tie-breaker between assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Library {
    Gnu,
    Musl,
    Msvc,
    None,
}

impl Library {
    /// Default library for an operating system.
    pub fn default_for(os: Os) -> Self {
        match os {
            Os::Linux if cfg!(target_env = "musl") => Library::Musl,
            Os::Linux => Library::Gnu,
            Os::Windows => Library::Msvc,
            _ => Library::None,
        }
    }

    /// Asset name fragment, if this library is ever spelled out.
    pub fn alias(&self) -> Option<&'static str> {
        match self {
            Library::Gnu => Some("gnu"),
            Library::Musl => Some("musl"),
            Library::Msvc => Some("msvc"),
            Library::None => None,
        }
    }
}

/// The platform tools are installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
    pub library: Library,
}

impl Platform {
    /// Detect the current platform.
    pub fn current() -> Self {
        Self::new(Os::current(), Arch::current())
    }

    /// Build a platform, deriving the library from the OS.
    pub fn new(os: Os, arch: Arch) -> Self {
        Self {
            os,
            arch,
            library: Library::default_for(os),
        }
    }

    /// Append the OS executable extension to a bare name.
    pub fn exe_name(&self, name: &str) -> String {
        let ext = self.os.exe_extension();
        if ext.is_empty() || name.ends_with(ext) {
            name.to_string()
        } else {
            format!("{}{}", name, ext)
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

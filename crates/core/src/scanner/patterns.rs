use vigil_api::GlobPatternSource;

/// Files the scanner's catalogers read: lockfiles, manifests and installed
/// package databases, per ecosystem.
///
/// Hard-coded until the scanner can report its own cataloger globs.
pub const PACKAGE_GLOBS: &[&str] = &[
    // javascript
    "**/package.json",
    "**/package-lock.json",
    "**/yarn.lock",
    "**/pnpm-lock.yaml",
    // python
    "**/*requirements*.txt",
    "**/setup.py",
    "**/poetry.lock",
    "**/Pipfile.lock",
    "**/*.egg-info/PKG-INFO",
    "**/*dist-info/METADATA",
    // ruby
    "**/Gemfile.lock",
    "**/*.gemspec",
    // java
    "**/*.jar",
    "**/*.war",
    "**/*.ear",
    "**/*.jpi",
    "**/*.hpi",
    "**/pom.xml",
    // go
    "**/go.mod",
    // rust
    "**/Cargo.lock",
    // php
    "**/composer.lock",
    // os package databases
    "**/var/lib/dpkg/status",
    "**/var/lib/rpm/Packages",
    "**/lib/apk/db/installed",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGlobPatterns;

impl GlobPatternSource for StaticGlobPatterns {
    fn glob_patterns(&self) -> Vec<String> {
        PACKAGE_GLOBS.iter().map(|p| p.to_string()).collect()
    }
}

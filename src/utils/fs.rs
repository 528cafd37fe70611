//! File system utilities.

use crate::Result;
use std::path::Path;

/// Copy a file, creating the destination's parent directories as needed.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    if let Some(parent) = to.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let bytes = std::fs::copy(from, to)?;
    Ok(bytes)
}

/// Get file extension in lowercase.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check if a file is treated as binary based on extension.
pub fn is_binary_file(path: &Path) -> bool {
    const BINARY_EXTENSIONS: &[&str] = &[
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "pdf", "zip", "tar", "gz", "bz2",
        "xz", "7z", "exe", "dll", "so", "dylib", "a", "o", "bin", "dat", "db", "sqlite",
        "woff", "woff2", "ttf", "otf", "mp3", "mp4", "avi", "mkv", "wasm", "class", "jar",
    ];

    get_extension(path)
        .map(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a path names a dependency manifest or lockfile.
pub fn is_dependency_manifest(path: &Path) -> bool {
    const MANIFESTS: &[&str] = &[
        "package.json",
        "package-lock.json",
        "yarn.lock",
        "pnpm-lock.yaml",
        "Cargo.toml",
        "Cargo.lock",
        "requirements.txt",
        "Pipfile",
        "pyproject.toml",
        "go.mod",
        "go.sum",
        "Gemfile",
        "pom.xml",
        "build.gradle",
        "composer.json",
    ];

    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| MANIFESTS.contains(&name))
        .unwrap_or(false)
}

/// Check if a path names a build-system file.
pub fn is_build_file(path: &Path) -> bool {
    const BUILD_FILES: &[&str] = &[
        "Makefile",
        "makefile",
        "CMakeLists.txt",
        "build.rs",
        "webpack.config.js",
        "vite.config.ts",
        "vite.config.js",
        "rollup.config.js",
        "tsconfig.json",
        "babel.config.js",
        "Dockerfile",
        "docker-compose.yml",
        "Justfile",
    ];

    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| BUILD_FILES.contains(&name))
        .unwrap_or(false)
}

/// Check if a path looks like system or security-sensitive configuration.
pub fn is_system_path(path: &Path) -> bool {
    const SYSTEM_PREFIXES: &[&str] = &["/etc", "/usr", "/bin", "/sbin", "/boot", "/sys", "/proc"];
    const SYSTEM_SEGMENTS: &[&str] = &[".git", ".ssh", ".gnupg"];

    let text = path.to_string_lossy();
    if SYSTEM_PREFIXES.iter().any(|p| text.starts_with(p)) {
        return true;
    }
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| SYSTEM_SEGMENTS.contains(&s))
            .unwrap_or(false)
    }) || is_dependency_manifest(path)
}

/// Check if a path looks like application configuration.
pub fn is_config_path(path: &Path) -> bool {
    if matches!(
        get_extension(path).as_deref(),
        Some("toml") | Some("yaml") | Some("yml") | Some("ini") | Some("conf") | Some("cfg")
    ) {
        return true;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with(".env") || name.ends_with("rc") && name.starts_with('.'))
        .unwrap_or(false)
}

/// Check if a path looks security-related (credentials, keys, policies).
pub fn is_security_path(path: &Path) -> bool {
    const SECURITY_HINTS: &[&str] = &[
        "secret", "credential", "password", "token", "auth", "certificate",
    ];
    const SECURITY_EXTENSIONS: &[&str] = &["pem", "key", "crt", "p12", "pfx", "keystore"];

    if let Some(ext) = get_extension(path) {
        if SECURITY_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
    }
    let text = path.to_string_lossy().to_lowercase();
    SECURITY_HINTS.iter().any(|h| text.contains(h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_binary_file() {
        assert!(is_binary_file(&PathBuf::from("logo.png")));
        assert!(is_binary_file(&PathBuf::from("archive.ZIP")));
        assert!(!is_binary_file(&PathBuf::from("main.rs")));
        assert!(!is_binary_file(&PathBuf::from("README.md")));
    }

    #[test]
    fn test_is_dependency_manifest() {
        assert!(is_dependency_manifest(&PathBuf::from("package.json")));
        assert!(is_dependency_manifest(&PathBuf::from("app/Cargo.lock")));
        assert!(!is_dependency_manifest(&PathBuf::from("src/package.rs")));
    }

    #[test]
    fn test_is_system_path() {
        assert!(is_system_path(&PathBuf::from("/etc/hosts")));
        assert!(is_system_path(&PathBuf::from("repo/.git/config")));
        assert!(is_system_path(&PathBuf::from("package.json")));
        assert!(!is_system_path(&PathBuf::from("src/lib.rs")));
    }

    #[test]
    fn test_is_config_path() {
        assert!(is_config_path(&PathBuf::from("settings.toml")));
        assert!(is_config_path(&PathBuf::from(".env.local")));
        assert!(!is_config_path(&PathBuf::from("main.go")));
    }

    #[test]
    fn test_is_security_path() {
        assert!(is_security_path(&PathBuf::from("server.pem")));
        assert!(is_security_path(&PathBuf::from("config/credentials.yml")));
        assert!(!is_security_path(&PathBuf::from("src/parser.rs")));
    }
}

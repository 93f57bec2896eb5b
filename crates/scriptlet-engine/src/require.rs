//! Classification of `require(..)` identifiers.

use std::path::Path;

/// What a `require` identifier refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A script file to embed into the namespace.
    File(String),
    /// A package to install through the package manager.
    Package(String),
}

impl Requirement {
    /// An identifier is a file when it starts with `.` or `/`, is an absolute
    /// path, or ends with one of `script_extensions` (compared case-insensitively).
    /// Everything else is a package name.
    pub fn classify(identifier: &str, script_extensions: &[String]) -> Self {
        if is_file_reference(identifier, script_extensions) {
            Self::File(identifier.to_string())
        } else {
            Self::Package(identifier.to_string())
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::File(id) | Self::Package(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Package(_) => "package",
        }
    }
}

fn is_file_reference(identifier: &str, script_extensions: &[String]) -> bool {
    if identifier.starts_with('.') || identifier.starts_with('/') {
        return true;
    }
    let path = Path::new(identifier);
    if path.is_absolute() {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => script_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec!["rhai".to_string()]
    }

    #[test]
    fn test_script_files() {
        for id in ["helpers.rhai", "lib/util.RHAI", "./helpers.rhai", "/abs/helpers.rhai"] {
            assert_eq!(
                Requirement::classify(id, &exts()),
                Requirement::File(id.to_string()),
                "{id}"
            );
        }
    }

    #[test]
    fn test_dot_and_slash_prefixes_are_files_without_extension() {
        assert!(matches!(Requirement::classify("./setup", &exts()), Requirement::File(_)));
        assert!(matches!(Requirement::classify("../shared/x", &exts()), Requirement::File(_)));
        assert!(matches!(Requirement::classify("/opt/x", &exts()), Requirement::File(_)));
    }

    #[test]
    fn test_packages() {
        for id in ["numpy", "left-pad", "scikit_learn", "pkg.name"] {
            assert_eq!(
                Requirement::classify(id, &exts()),
                Requirement::Package(id.to_string()),
                "{id}"
            );
        }
    }

    #[test]
    fn test_custom_extensions() {
        let exts = vec!["script".to_string()];
        assert!(matches!(Requirement::classify("a.script", &exts), Requirement::File(_)));
        assert!(matches!(Requirement::classify("a.rhai", &exts), Requirement::Package(_)));
    }

    #[test]
    fn test_accessors() {
        let req = Requirement::classify("numpy", &exts());
        assert_eq!(req.identifier(), "numpy");
        assert_eq!(req.kind(), "package");
    }
}

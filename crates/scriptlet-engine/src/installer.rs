//! Dependency resolver: best-effort "install if missing" for named packages.
//!
//! The resolver never raises. Every outcome, including a failed install, is
//! reported back to the script as a status string so the call can continue.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

use scriptlet_core::config::{PackageConfig, PackageManagerKind};

use crate::info_log;

/// Replaced by the package name in command templates.
const PACKAGE_PLACEHOLDER: &str = "{package}";

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("invalid package name '{0}'")]
    InvalidName(String),

    #[error("package installation is disabled")]
    Disabled,

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {detail}")]
    Exit {
        program: String,
        status: String,
        detail: String,
    },
}

/// Backend that checks for and installs packages.
///
/// Implementations must be callable from any thread; the resolver holds one
/// behind an `Arc` and shares it across calls.
pub trait PackageInstaller: Send + Sync {
    /// Short label used in logs, e.g. `pip`.
    fn name(&self) -> &str;

    fn is_installed(&self, package: &str) -> Result<bool, InstallError>;

    fn install(&self, package: &str) -> Result<(), InstallError>;
}

/// Installer that drives an external package manager as a blocking subprocess.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    label: String,
    program: PathBuf,
    check_args: Vec<String>,
    install_args: Vec<String>,
}

impl CommandInstaller {
    /// Custom command. `{package}` in either argument list is replaced by the
    /// package name; the check command must exit 0 iff the package is present.
    pub fn new(
        label: impl Into<String>,
        program: impl Into<PathBuf>,
        check_args: &[&str],
        install_args: &[&str],
    ) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            check_args: check_args.iter().map(|s| s.to_string()).collect(),
            install_args: install_args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// `<python> -m pip show <package>` / `<python> -m pip install <package> --no-input`.
    pub fn pip(python: impl Into<PathBuf>) -> Self {
        Self::new(
            "pip",
            python,
            &["-m", "pip", "show", PACKAGE_PLACEHOLDER],
            &["-m", "pip", "install", PACKAGE_PLACEHOLDER, "--no-input"],
        )
    }

    /// `npm ls <package> --depth=0` / `npm install <package>`.
    pub fn npm(npm: impl Into<PathBuf>) -> Self {
        Self::new(
            "npm",
            npm,
            &["ls", PACKAGE_PLACEHOLDER, "--depth=0"],
            &["install", PACKAGE_PLACEHOLDER],
        )
    }

    fn command(&self, args: &[String], package: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args.iter().map(|a| {
            if a == PACKAGE_PLACEHOLDER {
                package.to_string()
            } else {
                a.clone()
            }
        }));
        cmd
    }

    fn output(&self, args: &[String], package: &str) -> Result<Output, InstallError> {
        self.command(args, package)
            .output()
            .map_err(|source| InstallError::Spawn {
                program: self.program.display().to_string(),
                source,
            })
    }
}

impl PackageInstaller for CommandInstaller {
    fn name(&self) -> &str {
        &self.label
    }

    fn is_installed(&self, package: &str) -> Result<bool, InstallError> {
        let out = self.output(&self.check_args, package)?;
        Ok(out.status.success())
    }

    fn install(&self, package: &str) -> Result<(), InstallError> {
        let out = self.output(&self.install_args, package)?;
        log_output(&self.label, &out);
        if out.status.success() {
            return Ok(());
        }
        Err(InstallError::Exit {
            program: self.program.display().to_string(),
            status: out.status.to_string(),
            detail: failure_detail(&out),
        })
    }
}

fn log_output(label: &str, out: &Output) {
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    if !stdout.trim().is_empty() {
        tracing::debug!(manager = label, "{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        tracing::debug!(manager = label, "{}", stderr.trim_end());
    }
}

/// Last non-empty stderr line, else stdout's, else a placeholder.
fn failure_detail(out: &Output) -> String {
    let last_line = |bytes: &[u8]| {
        String::from_utf8_lossy(bytes)
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(String::from)
    };
    last_line(&out.stderr)
        .or_else(|| last_line(&out.stdout))
        .unwrap_or_else(|| "no output".to_string())
}

/// Installer used when package management is turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstaller;

impl PackageInstaller for NoopInstaller {
    fn name(&self) -> &str {
        "none"
    }

    fn is_installed(&self, _package: &str) -> Result<bool, InstallError> {
        Ok(false)
    }

    fn install(&self, _package: &str) -> Result<(), InstallError> {
        Err(InstallError::Disabled)
    }
}

/// Build the installer named by the configuration.
pub fn installer_from_config(config: &PackageConfig) -> Arc<dyn PackageInstaller> {
    match config.manager {
        PackageManagerKind::Pip => {
            let python = config
                .python
                .as_ref()
                .map(PathBuf::from)
                .or_else(which_python)
                .unwrap_or_else(|| PathBuf::from("python3"));
            Arc::new(CommandInstaller::pip(python))
        }
        PackageManagerKind::Npm => Arc::new(CommandInstaller::npm(&config.npm)),
        PackageManagerKind::None => Arc::new(NoopInstaller),
    }
}

fn which_python() -> Option<PathBuf> {
    ["python3", "python"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}

/// Package names that are never handed to a subprocess.
fn validate_package_name(package: &str) -> Result<(), InstallError> {
    if package.is_empty()
        || package.starts_with('-')
        || package.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(InstallError::InvalidName(package.to_string()));
    }
    Ok(())
}

/// Checks and installs packages, remembering which are known to be ready.
///
/// Clones share the installer and the memo. Installs are never undone.
#[derive(Clone)]
pub struct DependencyResolver {
    installer: Arc<dyn PackageInstaller>,
    ready: Arc<Mutex<HashSet<String>>>,
}

impl std::fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("installer", &self.installer.name())
            .finish_non_exhaustive()
    }
}

impl DependencyResolver {
    pub fn new(installer: Arc<dyn PackageInstaller>) -> Self {
        Self {
            installer,
            ready: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn installer_name(&self) -> &str {
        self.installer.name()
    }

    /// Make `package` available, installing it if missing. Returns the status
    /// message handed back to the script.
    pub fn ensure_package(&self, package: &str) -> String {
        if let Err(e) = validate_package_name(package) {
            tracing::warn!("Rejected package request: {}", e);
            return format!("Error installing {package}: {e}");
        }
        if self.is_memoized(package) {
            return format!("{package} is ready to use.");
        }

        let installed = match self.installer.is_installed(package) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!("Presence check for {} failed: {}", package, e);
                false
            }
        };
        if installed {
            self.memoize(package);
            return format!("{package} is ready to use.");
        }

        info_log!("Installing {} with {}", package, self.installer.name());
        match self.installer.install(package) {
            Ok(()) => {
                self.memoize(package);
                format!("Successfully installed {package}")
            }
            Err(e) => {
                tracing::warn!("Installing {} failed: {}", package, e);
                format!("Error installing {package}: {e}")
            }
        }
    }

    fn is_memoized(&self, package: &str) -> bool {
        self.ready
            .lock()
            .map(|set| set.contains(package))
            .unwrap_or(false)
    }

    fn memoize(&self, package: &str) {
        if let Ok(mut set) = self.ready.lock() {
            set.insert(package.to_string());
        }
    }
}

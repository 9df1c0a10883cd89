//! Inventory data sources
//!
//! A source enumerates raw records from the operating system (or a fixture).
//! Sources report total failure as a `ScanError`; deciding what to do about it
//! is up to the scanner.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Device names matching any of these are virtual or bus devices
pub const GENERIC_DEVICE_MARKERS: &[&str] = &["Generic", "Standard", "Basic", "Microsoft", "Windows"];

/// System libraries whose presence means the multimedia runtime is installed
pub const MULTIMEDIA_RUNTIME_FILES: &[&str] = &["d3d11.dll", "d3d12.dll", "dxgi.dll", "xinput1_4.dll"];

const UNINSTALL_ROOTS: [&str; 3] = [
    r"HKLM\Software\Microsoft\Windows\CurrentVersion\Uninstall",
    r"HKLM\Software\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
    r"HKCU\Software\Microsoft\Windows\CurrentVersion\Uninstall",
];

/// One "installed applications" record as the source reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub display_name: Option<String>,
    #[serde(default)]
    pub display_version: Option<String>,
}

impl ApplicationRecord {
    pub fn new(display_name: &str, display_version: Option<&str>) -> Self {
        Self {
            display_name: Some(display_name.to_string()),
            display_version: display_version.map(str::to_string),
        }
    }
}

/// One signed-driver record as the source reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRecord {
    #[serde(alias = "DeviceName")]
    pub device_name: Option<String>,
    #[serde(default, alias = "DriverVersion")]
    pub driver_version: Option<String>,
    #[serde(default, alias = "DriverDate")]
    pub driver_date: Option<String>,
}

impl DriverRecord {
    pub fn new(device_name: &str, driver_version: Option<&str>) -> Self {
        Self {
            device_name: Some(device_name.to_string()),
            driver_version: driver_version.map(str::to_string),
            driver_date: None,
        }
    }
}

/// True if a device name carries one of the generic markers
pub fn is_generic_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    GENERIC_DEVICE_MARKERS
        .iter()
        .any(|marker| lower.contains(&marker.to_lowercase()))
}

/// Enumerates installed software and drivers
pub trait InventorySource: Send + Sync {
    fn applications(&self) -> Result<Vec<ApplicationRecord>, ScanError>;

    /// Driver records; generic devices are already filtered out
    fn drivers(&self) -> Result<Vec<DriverRecord>, ScanError>;

    fn multimedia_runtime_present(&self) -> bool;
}

/// Reads the Windows uninstall registry and signed-driver listing
#[derive(Debug, Clone)]
pub struct SystemInventorySource {
    system_dir: PathBuf,
}

impl SystemInventorySource {
    pub fn new() -> Self {
        let windir = std::env::var_os("WINDIR").unwrap_or_else(|| r"C:\Windows".into());
        Self {
            system_dir: PathBuf::from(windir).join("System32"),
        }
    }

    /// Look for runtime libraries in `system_dir` instead of `%WINDIR%\System32`
    pub fn with_system_dir(system_dir: impl Into<PathBuf>) -> Self {
        Self {
            system_dir: system_dir.into(),
        }
    }

    fn query_uninstall_root(root: &str) -> Result<Vec<ApplicationRecord>, ScanError> {
        let output = hidden_command("cmd")
            .args(reg_query_args(root))
            .output()
            .map_err(|e| ScanError::CommandFailed {
                command: format!("reg query {root}"),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ScanError::CommandFailed {
                command: format!("reg query {root}"),
                detail: output.status.to_string(),
            });
        }

        Ok(parse_reg_query_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Default for SystemInventorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl InventorySource for SystemInventorySource {
    fn applications(&self) -> Result<Vec<ApplicationRecord>, ScanError> {
        if !cfg!(windows) {
            return Err(ScanError::SourceUnavailable(
                "uninstall registry is only available on Windows".to_string(),
            ));
        }

        let mut records = Vec::new();
        let mut failures = Vec::new();
        for root in UNINSTALL_ROOTS {
            match Self::query_uninstall_root(root) {
                Ok(found) => records.extend(found),
                Err(e) => {
                    debug!(root, error = %e, "Uninstall root unreadable");
                    failures.push(e.to_string());
                }
            }
        }

        if failures.len() == UNINSTALL_ROOTS.len() {
            return Err(ScanError::SourceUnavailable(failures.join("; ")));
        }
        Ok(records)
    }

    fn drivers(&self) -> Result<Vec<DriverRecord>, ScanError> {
        if !cfg!(windows) {
            return Err(ScanError::SourceUnavailable(
                "driver listing is only available on Windows".to_string(),
            ));
        }

        let script = driver_query_script();
        let output = hidden_command("powershell")
            .args(["-NoProfile", "-Command", &script])
            .output()
            .map_err(|e| ScanError::CommandFailed {
                command: "powershell Win32_PnPSignedDriver".to_string(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ScanError::CommandFailed {
                command: "powershell Win32_PnPSignedDriver".to_string(),
                detail: output.status.to_string(),
            });
        }

        parse_driver_json(&String::from_utf8_lossy(&output.stdout))
    }

    fn multimedia_runtime_present(&self) -> bool {
        runtime_files_present(&self.system_dir)
    }
}

/// Inventory read from a JSON fixture file.
///
/// Useful on hosts without the Windows data sources and for reproducible
/// runs. The file is re-read on every call so a scan sees its current content.
#[derive(Debug, Clone)]
pub struct FixtureInventorySource {
    path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    applications: Vec<ApplicationRecord>,
    #[serde(default)]
    drivers: Vec<DriverRecord>,
    #[serde(default)]
    multimedia_runtime: bool,
}

impl FixtureInventorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<FixtureFile, ScanError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            ScanError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| ScanError::Parse(format!("{}: {}", self.path.display(), e)))
    }
}

impl InventorySource for FixtureInventorySource {
    fn applications(&self) -> Result<Vec<ApplicationRecord>, ScanError> {
        Ok(self.read()?.applications)
    }

    fn drivers(&self) -> Result<Vec<DriverRecord>, ScanError> {
        Ok(without_generic_devices(self.read()?.drivers))
    }

    fn multimedia_runtime_present(&self) -> bool {
        self.read().map(|fixture| fixture.multimedia_runtime).unwrap_or(false)
    }
}

/// Fixed in-memory inventory
#[derive(Debug, Clone, Default)]
pub struct StaticInventorySource {
    applications: Vec<ApplicationRecord>,
    drivers: Vec<DriverRecord>,
    multimedia_runtime: bool,
}

impl StaticInventorySource {
    pub fn new(applications: Vec<ApplicationRecord>, drivers: Vec<DriverRecord>) -> Self {
        Self {
            applications,
            drivers,
            multimedia_runtime: false,
        }
    }

    pub fn with_multimedia_runtime(mut self, present: bool) -> Self {
        self.multimedia_runtime = present;
        self
    }
}

impl InventorySource for StaticInventorySource {
    fn applications(&self) -> Result<Vec<ApplicationRecord>, ScanError> {
        Ok(self.applications.clone())
    }

    fn drivers(&self) -> Result<Vec<DriverRecord>, ScanError> {
        Ok(without_generic_devices(self.drivers.clone()))
    }

    fn multimedia_runtime_present(&self) -> bool {
        self.multimedia_runtime
    }
}

fn without_generic_devices(records: Vec<DriverRecord>) -> Vec<DriverRecord> {
    records
        .into_iter()
        .filter(|record| {
            record
                .device_name
                .as_deref()
                .map_or(true, |name| !is_generic_device(name))
        })
        .collect()
}

fn hidden_command(program: &str) -> Command {
    #[allow(unused_mut)]
    let mut command = Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }
    command
}

fn runtime_files_present(system_dir: &Path) -> bool {
    MULTIMEDIA_RUNTIME_FILES
        .iter()
        .any(|file| system_dir.join(file).exists())
}

/// `cmd` arguments running `reg query <root> /s` on a UTF-8 console.
///
/// `reg` writes in the console code page; switching it to 65001 first keeps
/// non-ASCII display names intact through the pipe.
pub fn reg_query_args(root: &str) -> [String; 3] {
    [
        "/d".to_string(),
        "/c".to_string(),
        format!("chcp 65001 >nul & reg query {root} /s"),
    ]
}

/// PowerShell query listing signed drivers, generic devices excluded
pub fn driver_query_script() -> String {
    let exclusions: String = GENERIC_DEVICE_MARKERS
        .iter()
        .map(|marker| format!(" -and $_.DeviceName -notlike \"*{marker}*\""))
        .collect();
    format!(
        "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8; \
         Get-CimInstance Win32_PnPSignedDriver | Where-Object {{ $_.DeviceName -and $_.DriverVersion{exclusions} }} | \
         Select-Object DeviceName, DriverVersion, @{{Name='DriverDate';Expression={{[string]$_.DriverDate}}}} | ConvertTo-Json -Compress"
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<DriverRecord>),
    One(DriverRecord),
}

/// Parse `ConvertTo-Json` output: an array, a single object, or nothing
pub fn parse_driver_json(stdout: &str) -> Result<Vec<DriverRecord>, ScanError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let parsed: OneOrMany =
        serde_json::from_str(trimmed).map_err(|e| ScanError::Parse(e.to_string()))?;
    Ok(match parsed {
        OneOrMany::Many(records) => records,
        OneOrMany::One(record) => vec![record],
    })
}

/// Parse `reg query <root> /s` output into application records.
///
/// Keys without a `DisplayName` value (updates, components) are skipped.
pub fn parse_reg_query_output(stdout: &str) -> Vec<ApplicationRecord> {
    let mut records = Vec::new();
    let mut in_key = false;
    let mut values: HashMap<String, String> = HashMap::new();

    let mut flush = |values: &mut HashMap<String, String>| {
        if let Some(name) = values.remove("DisplayName").filter(|name| !name.trim().is_empty()) {
            records.push(ApplicationRecord {
                display_name: Some(name),
                display_version: values.remove("DisplayVersion"),
            });
        }
        values.clear();
    };

    for raw_line in stdout.lines() {
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if !raw_line.starts_with(' ') && line.starts_with("HKEY_") {
            flush(&mut values);
            in_key = true;
            continue;
        }

        if !in_key {
            continue;
        }

        if let Some((name, value)) = parse_reg_value_line(line.trim_start()) {
            values.insert(name, value);
        }
    }
    flush(&mut values);

    records
}

fn parse_reg_value_line(line: &str) -> Option<(String, String)> {
    let mut parts = line.split_whitespace();
    let name = parts.next()?;
    let type_name = parts.next()?;
    if !type_name.starts_with("REG_") {
        return None;
    }
    let start = line.find(type_name)? + type_name.len();
    Some((name.to_string(), line[start..].trim().to_string()))
}

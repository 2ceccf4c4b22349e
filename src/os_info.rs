//! Read-only facts about the host machine, and the `os` sub-command namespace.

use std::env as stdenv;
use std::fs;
use std::num::NonZeroUsize;
use std::thread;

#[cfg(windows)]
pub(crate) const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub(crate) const LINE_ENDING: &str = "\n";

const CPUINFO_PATH: &str = "/proc/cpuinfo";
const UNKNOWN: &str = "unknown";

/// Sub-commands of `os`, selected by exact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsCommand {
    Eol,
    Cpus,
    HomeDir,
    UserName,
    Architecture,
}

impl OsCommand {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "EOL" => Some(OsCommand::Eol),
            "cpus" => Some(OsCommand::Cpus),
            "homedir" => Some(OsCommand::HomeDir),
            "username" => Some(OsCommand::UserName),
            "architecture" => Some(OsCommand::Architecture),
            _ => None,
        }
    }
}

/// Model name and clock speed of one logical core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CpuInfo {
    pub model: String,
    /// Speed in MHz, when the platform reports it.
    pub speed_mhz: Option<u64>,
}

/// One entry per logical core.
pub(crate) fn cpus() -> Vec<CpuInfo> {
    let parsed = fs::read_to_string(CPUINFO_PATH)
        .map(|text| parse_cpuinfo(&text))
        .unwrap_or_default();
    if !parsed.is_empty() {
        return parsed;
    }
    let count = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    vec![
        CpuInfo {
            model: UNKNOWN.to_string(),
            speed_mhz: None,
        };
        count
    ]
}

/// Parse the Linux `/proc/cpuinfo` format: blank-line separated blocks of `key : value`.
fn parse_cpuinfo(text: &str) -> Vec<CpuInfo> {
    let mut cpus = Vec::new();
    for block in text.split("\n\n") {
        let mut model = None;
        let mut speed_mhz = None;
        let mut is_processor = false;
        for line in block.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "processor" => is_processor = true,
                "model name" | "Model" | "cpu model" => model = Some(value.to_string()),
                "cpu MHz" => speed_mhz = value.parse::<f64>().ok().map(|mhz| mhz.round() as u64),
                _ => {}
            }
        }
        if is_processor {
            cpus.push(CpuInfo {
                model: model.unwrap_or_else(|| UNKNOWN.to_string()),
                speed_mhz,
            });
        }
    }
    cpus
}

/// Name of the OS user running the process.
pub(crate) fn user_name() -> Option<String> {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| stdenv::var(key).ok().filter(|v| !v.is_empty()))
}

pub(crate) fn architecture() -> &'static str {
    stdenv::consts::ARCH
}

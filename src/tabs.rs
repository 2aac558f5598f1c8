//! Dashboard tabs: built-in defaults and startup validation.
//!
//! A tab is validated once. A tool that is not on `PATH` turns the tab into
//! [`TabStatus::Disabled`] with an install hint, and it is never executed.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::monitor::{CommandError, Host};

/// Tools whose output is a system summary, in order of preference.
pub const FETCH_CANDIDATES: &[&str] = &["fastfetch", "neofetch", "screenfetch"];

/// Tools from the sysstat suite; their hint names the tab.
const SYSSTAT_TOOLS: &[&str] = &["mpstat", "pidstat", "sar", "iostat"];

/// Whether a tab may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabStatus {
    Enabled { argv: Vec<String> },
    Disabled { reason: String },
}

/// A validated tab. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub title: String,
    pub refresh: Duration,
    pub status: TabStatus,
}

impl Tab {
    pub fn is_enabled(&self) -> bool {
        matches!(self.status, TabStatus::Enabled { .. })
    }

    /// Command to run, `None` when disabled.
    pub fn argv(&self) -> Option<&[String]> {
        match &self.status {
            TabStatus::Enabled { argv } => Some(argv),
            TabStatus::Disabled { .. } => None,
        }
    }

    /// Hint shown in place of output, `None` when enabled.
    pub fn disabled_reason(&self) -> Option<&str> {
        match &self.status {
            TabStatus::Enabled { .. } => None,
            TabStatus::Disabled { reason } => Some(reason),
        }
    }
}

/// A tab as configured, before tool lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct TabSpec {
    pub title: String,
    pub argv: Vec<String>,
    /// Per-tab interval; `None` uses the global one.
    pub refresh: Option<Duration>,
}

impl TabSpec {
    pub fn new(title: &str, argv: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            argv: argv.iter().map(|a| a.to_string()).collect(),
            refresh: None,
        }
    }

    /// Check the tool and freeze the tab.
    pub fn validate(self, host: &dyn Host, global_refresh: Duration) -> Tab {
        let refresh = self.refresh.unwrap_or(global_refresh);
        let status = match self.argv.first().map(String::as_str) {
            None => TabStatus::Disabled {
                reason: "No command configured for this tab.".to_string(),
            },
            Some("echo") => TabStatus::Enabled { argv: self.argv },
            Some(cmd) if host.tool_available(cmd) => TabStatus::Enabled { argv: self.argv },
            Some(cmd) => {
                let reason = missing_hint(cmd, &self.title);
                info!(tab = %self.title, cmd, "tab disabled: tool not found");
                TabStatus::Disabled { reason }
            }
        };
        Tab {
            title: self.title,
            refresh,
            status,
        }
    }
}

/// Install hint for a missing tool.
pub fn missing_hint(cmd: &str, title: &str) -> String {
    if SYSSTAT_TOOLS.contains(&cmd) {
        return format!("Missing {}. Install sysstat to enable this tab.", title);
    }
    match cmd {
        "vm_stat" => "Missing vm_stat. This tab requires macOS.".to_string(),
        "vmstat" => "Missing vmstat. Install procps/sysstat to enable this tab.".to_string(),
        "free" => "Missing free. Install procps to enable this tab.".to_string(),
        "top" => "Missing top. Install procps to enable this tab.".to_string(),
        "uptime" => "Missing uptime. Install coreutils to enable this tab.".to_string(),
        _ => format!("Missing {}. Install the command to enable this tab.", cmd),
    }
}

/// Operating system flavour, which picks a few default commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

/// First installed fetch tool, or an `echo` placeholder.
pub fn fetch_spec(host: &dyn Host) -> TabSpec {
    FETCH_CANDIDATES
        .iter()
        .copied()
        .find(|tool| host.tool_available(tool))
        .map(|tool| TabSpec::new(tool, &[tool]))
        .unwrap_or_else(|| {
            TabSpec::new(
                "fetch (missing)",
                &["echo", "No fetch tool found. Install fastfetch to enable this tab."],
            )
        })
}

/// Built-in tab list, before validation.
pub fn default_specs(platform: Platform, host: &dyn Host) -> Vec<TabSpec> {
    let (free_title, free_cmd): (&str, &[&str]) = match platform {
        Platform::MacOs => ("vm_stat (free)", &["vm_stat"]),
        Platform::Linux => ("free -m", &["free", "-m"]),
    };
    let (top_title, top_cmd): (&str, &[&str]) = match platform {
        Platform::MacOs => ("top -l 1", &["top", "-l", "1"]),
        Platform::Linux => ("top -b -n 1", &["top", "-b", "-n", "1"]),
    };

    vec![
        TabSpec::new("uptime", &["uptime"]),
        TabSpec::new("vmstat", &["vmstat"]),
        TabSpec::new("mpstat -P ALL", &["mpstat", "-P", "ALL"]),
        TabSpec::new("pidstat -p ALL", &["pidstat", "-p", "ALL"]),
        TabSpec::new("iostat", &["iostat"]),
        TabSpec::new(free_title, free_cmd),
        TabSpec::new("sar -n DEV", &["sar", "-n", "DEV"]),
        TabSpec::new("sar -n TCP,ETCP", &["sar", "-n", "TCP,ETCP"]),
        TabSpec::new(top_title, top_cmd),
        fetch_spec(host),
    ]
}

/// Validate every spec against the host.
pub fn validate_all(specs: Vec<TabSpec>, host: &dyn Host, global_refresh: Duration) -> Vec<Tab> {
    specs
        .into_iter()
        .map(|spec| spec.validate(host, global_refresh))
        .collect()
}

/// What a tab run produced. Output read before a failure is kept.
#[derive(Debug)]
pub struct TabOutput {
    pub text: String,
    pub error: Option<CommandError>,
}

async fn read_chunk<R: AsyncRead + Unpin>(pipe: &mut Option<R>, chunk: &mut [u8]) -> std::io::Result<usize> {
    match pipe {
        Some(pipe) => pipe.read(chunk).await,
        None => std::future::pending().await,
    }
}

/// Read stdout and stderr into `buf` in arrival order until both close.
async fn read_combined<O, E>(mut stdout: Option<O>, mut stderr: Option<E>, buf: &mut Vec<u8>)
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out_chunk = [0u8; 4096];
    let mut err_chunk = [0u8; 4096];
    while stdout.is_some() || stderr.is_some() {
        let (read, from_stdout) = tokio::select! {
            n = read_chunk(&mut stdout, &mut out_chunk) => (n, true),
            n = read_chunk(&mut stderr, &mut err_chunk) => (n, false),
        };
        match (read, from_stdout) {
            (Ok(n), true) if n > 0 => buf.extend_from_slice(&out_chunk[..n]),
            (Ok(n), false) if n > 0 => buf.extend_from_slice(&err_chunk[..n]),
            (_, true) => stdout = None,
            (_, false) => stderr = None,
        }
    }
}

/// Run a tab's command with a deadline, capturing stdout and stderr as
/// they arrive.
pub async fn run_tab_command(argv: &[String], limit: Duration) -> TabOutput {
    let failed = |error| TabOutput {
        text: String::new(),
        error: Some(error),
    };
    let Some((program, args)) = argv.split_first() else {
        return failed(CommandError::Empty);
    };

    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return failed(CommandError::NotFound(program.clone()))
        }
        Err(e) => {
            return failed(CommandError::Spawn {
                program: program.clone(),
                source: e,
            })
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut out = Vec::new();
    let finished = timeout(limit, async {
        let (_, status) = tokio::join!(read_combined(stdout, stderr, &mut out), child.wait());
        status
    })
    .await;

    let error = match finished {
        Ok(Ok(status)) if status.success() => None,
        Ok(Ok(status)) => Some(CommandError::Exit {
            program: program.clone(),
            status: status.to_string(),
        }),
        Ok(Err(e)) => Some(CommandError::Spawn {
            program: program.clone(),
            source: e,
        }),
        Err(_) => {
            let _ = child.kill().await;
            Some(CommandError::Timeout {
                program: program.clone(),
                after: limit,
            })
        }
    };
    if let Some(e) = &error {
        warn!(error = %e, "tab command failed");
    }

    TabOutput {
        text: String::from_utf8_lossy(&out).into_owned(),
        error,
    }
}

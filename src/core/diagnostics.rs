use crate::utils::error::Result;
use crate::utils::system::HostInfo;
use serde::ser::{Serialize, Serializer};
use std::path::Path;
use std::process::Command;

const RULE_WIDTH: usize = 60;
const ENV_VARS: &[&str] = &["VIRTUAL_ENV", "CI", "GITHUB_ACTIONS", "SHELL"];
const CHECKED_PATHS: &[(&str, &str)] = &[
    ("Cargo.toml", "Cargo.toml"),
    ("src/", "src"),
    (".git/", ".git"),
    (".git/hooks/pre-commit", ".git/hooks/pre-commit"),
    (".git/hooks/commit-msg", ".git/hooks/commit-msg"),
    (".git/hooks/pre-push", ".git/hooks/pre-push"),
];

/// Ordered key/value pairs; serialises as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section(pub Vec<(String, String)>);

impl Section {
    fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DiagnosticsReport {
    pub timestamp: String,
    pub system: Section,
    pub environment: Section,
    pub tools: Section,
    pub package: Section,
    pub paths: Section,
}

/// First line of `<tool> --version`, `not found`, or `error`.
pub fn tool_version(tool: &str) -> String {
    match Command::new(tool).arg("--version").output() {
        Ok(output) => {
            let first_line = |bytes: &[u8]| {
                String::from_utf8_lossy(bytes)
                    .trim()
                    .lines()
                    .next()
                    .unwrap_or("")
                    .to_string()
            };
            let line = first_line(&output.stdout);
            if line.is_empty() {
                first_line(&output.stderr)
            } else {
                line
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => "not found".to_string(),
        Err(e) => {
            tracing::debug!("{} --version failed: {}", tool, e);
            "error".to_string()
        }
    }
}

pub fn path_kind(path: &Path) -> &'static str {
    if path.is_dir() {
        "directory"
    } else if path.exists() {
        "file"
    } else {
        "missing"
    }
}

pub fn collect(root: &Path, tools: &[String]) -> DiagnosticsReport {
    let host = HostInfo::collect();
    let mut system = Section::default();
    system.push("os", host.os);
    system.push("kernel", host.kernel);
    system.push("arch", host.arch);
    system.push("host", host.host);
    system.push("cpus", host.cpu_count.to_string());
    system.push("memory", format!("{} MB", host.total_memory_mb));

    let mut environment = Section::default();
    for var in ENV_VARS {
        let value = std::env::var(var).unwrap_or_else(|_| "none".to_string());
        environment.push(var.to_lowercase(), value);
    }

    let mut tool_section = Section::default();
    for tool in tools {
        tool_section.push(tool.as_str(), tool_version(tool));
    }

    let mut package = Section::default();
    package.push(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut paths = Section::default();
    paths.push("root", root.display().to_string());
    for (label, rel) in CHECKED_PATHS {
        paths.push(*label, path_kind(&root.join(rel)));
    }

    DiagnosticsReport {
        timestamp: chrono::Local::now().to_rfc3339(),
        system,
        environment,
        tools: tool_section,
        package,
        paths,
    }
}

impl DiagnosticsReport {
    fn sections(&self) -> [(&'static str, &Section); 5] {
        [
            ("system", &self.system),
            ("environment", &self.environment),
            ("tools", &self.tools),
            ("package", &self.package),
            ("paths", &self.paths),
        ]
    }

    pub fn to_plain(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec![rule.clone(), "DIAGNOSTICS REPORT".to_string(), rule, String::new()];
        lines.push("[TIMESTAMP]".to_string());
        lines.push(format!("  {}", self.timestamp));
        lines.push(String::new());
        for (name, section) in self.sections() {
            lines.push(format!("[{}]", name.to_uppercase()));
            lines.extend(section.0.iter().map(|(k, v)| format!("  {}: {}", k, v)));
            lines.push(String::new());
        }
        lines.join("\n")
    }

    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            "<details>".to_string(),
            "<summary>Environment diagnostics</summary>".to_string(),
            String::new(),
            "```".to_string(),
            "[timestamp]".to_string(),
            format!("  {}", self.timestamp),
        ];
        for (name, section) in self.sections() {
            lines.push(format!("[{}]", name));
            lines.extend(section.0.iter().map(|(k, v)| format!("  {}: {}", k, v)));
        }
        lines.push("```".to_string());
        lines.push("</details>".to_string());
        lines.join("\n")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Writes `content` to `path`, creating parent directories.
pub fn save(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

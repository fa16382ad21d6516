#[cfg(feature = "cli")]
use sysinfo::System;

/// Host facts for the diagnostics report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os: String,
    pub kernel: String,
    pub arch: String,
    pub host: String,
    pub cpu_count: usize,
    pub total_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl HostInfo {
    pub fn collect() -> Self {
        let mut system = System::new_all();
        system.refresh_all();

        Self {
            os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
            arch: std::env::consts::ARCH.to_string(),
            host: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            cpu_count: system.cpus().len(),
            total_memory_mb: system.total_memory() / 1024 / 1024,
        }
    }
}

// Without the cli feature only compile-time facts are available.
#[cfg(not(feature = "cli"))]
impl HostInfo {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            kernel: "unknown".to_string(),
            arch: std::env::consts::ARCH.to_string(),
            host: "unknown".to_string(),
            cpu_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(0),
            total_memory_mb: 0,
        }
    }
}

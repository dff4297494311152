//! Per-phase resource logging for job runs.
//!
//! Only active with the `cli` feature; otherwise every call is a no-op.

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct ResourceSnapshot {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub memory_percent: f32,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    state: Mutex<MonitorState>,
    pid: Option<Pid>,
    started: Instant,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                if enabled {
                    tracing::warn!("System monitoring unavailable: {}", e);
                }
                None
            }
        };

        let mut system = System::new();
        if enabled {
            system.refresh_all();
        }

        Self {
            state: Mutex::new(MonitorState {
                system,
                peak_memory_mb: 0,
            }),
            pid,
            started: Instant::now(),
            enabled,
        }
    }

    pub fn snapshot(&self) -> Option<ResourceSnapshot> {
        if !self.enabled {
            return None;
        }
        let pid = self.pid?;
        let mut state = self.state.lock().ok()?;
        state.system.refresh_all();

        let (cpu_usage, memory_mb) = {
            let process = state.system.process(pid)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };
        let total_mb = state.system.total_memory() / 1024 / 1024;
        let memory_percent = if total_mb > 0 {
            (memory_mb as f32 / total_mb as f32) * 100.0
        } else {
            0.0
        };

        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);

        Some(ResourceSnapshot {
            cpu_usage,
            memory_mb,
            memory_percent,
            peak_memory_mb: state.peak_memory_mb,
            elapsed: self.started.elapsed(),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(s) = self.snapshot() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB, Time: {:?}",
                phase,
                s.cpu_usage,
                s.memory_mb,
                s.memory_percent,
                s.peak_memory_mb,
                s.elapsed
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(s) = self.snapshot() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                s.elapsed,
                s.peak_memory_mb
            );
        }
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}
}

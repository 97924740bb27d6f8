//! Operating-system accessors backed by `sysinfo`, with per-OS readers for
//! the figures `sysinfo` does not expose (unique set size, rated CPU clock).

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod fallback;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(not(target_os = "linux"))]
use fallback as platform_impl;

use sysinfo::{
    CpuRefreshKind, Networks, Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate,
    RefreshKind, System,
};
use tracing::debug;

use crate::error::Result;
use crate::monitor::{MetricsSource, NetCounters, ProcessMetrics};

/// Result of reading a process's private memory.
#[derive(Debug, PartialEq, Eq)]
pub enum UniqueMemory {
    Bytes(u64),
    ProcessGone,
    Unsupported,
}

/// Highest clock the CPU is rated for, in MHz.
pub fn max_cpu_mhz() -> f64 {
    if let Some(mhz) = platform_impl::max_cpu_mhz() {
        return mhz;
    }
    let system = System::new_with_specifics(
        RefreshKind::new().with_cpu(CpuRefreshKind::new().with_frequency()),
    );
    let mhz = system.cpus().iter().map(|cpu| cpu.frequency()).max().unwrap_or(0);
    debug!(mhz, "rated clock unavailable, using highest reported frequency");
    mhz as f64
}

pub struct SysinfoSource {
    pid: Pid,
    system: System,
    networks: Networks,
    primed: bool,
}

impl SysinfoSource {
    pub fn new(pid: u32) -> Self {
        Self {
            pid: Pid::from_u32(pid),
            system: System::new(),
            networks: Networks::new_with_refreshed_list(),
            primed: false,
        }
    }

    fn refresh_process(&mut self) -> Option<&Process> {
        // sysinfo only computes per-process CPU usage on a full refresh
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );
        self.system
            .process(self.pid)
            .filter(|process| !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
    }
}

impl MetricsSource for SysinfoSource {
    fn pid(&self) -> u32 {
        self.pid.as_u32()
    }

    fn process_name(&mut self) -> Result<Option<String>> {
        Ok(self
            .refresh_process()
            .map(|process| process.name().to_string_lossy().into_owned()))
    }

    fn process_metrics(&mut self) -> Result<Option<ProcessMetrics>> {
        let Some(process) = self.refresh_process() else {
            return Ok(None);
        };
        let cpu_usage = process.cpu_usage() as f64;
        let virtual_mem = process.virtual_memory();
        let resident = process.memory();

        // no interval has elapsed before the first poll
        let cpu_percent = if self.primed { cpu_usage } else { 0.0 };
        self.primed = true;

        let used_mem = match platform_impl::unique_memory(self.pid.as_u32())? {
            UniqueMemory::Bytes(bytes) => bytes,
            UniqueMemory::ProcessGone => return Ok(None),
            UniqueMemory::Unsupported => resident,
        };

        Ok(Some(ProcessMetrics {
            cpu_percent,
            virtual_mem,
            used_mem,
        }))
    }

    fn net_counters(&mut self) -> NetCounters {
        self.networks.refresh();
        self.networks
            .iter()
            .fold(NetCounters::default(), |acc, (_, data)| NetCounters {
                bytes_sent: acc.bytes_sent + data.total_transmitted(),
                bytes_recv: acc.bytes_recv + data.total_received(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn samples_the_current_process() {
        let mut source = SysinfoSource::new(std::process::id());
        assert!(source.process_name().unwrap().is_some());

        let first = source.process_metrics().unwrap().unwrap();
        assert_eq!(first.cpu_percent, 0.0);
        assert!(first.virtual_mem > 0);
        assert!(first.used_mem > 0);
    }

    #[test]
    fn busy_process_reports_cpu() {
        let stop = Arc::new(AtomicBool::new(false));
        let spinner = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut n = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    n = n.wrapping_add(1);
                }
                n
            })
        };

        let mut source = SysinfoSource::new(std::process::id());
        source.process_metrics().unwrap().unwrap();
        thread::sleep(Duration::from_millis(700));
        let busy = source.process_metrics().unwrap().unwrap();

        stop.store(true, Ordering::Relaxed);
        spinner.join().unwrap();
        assert!(busy.cpu_percent > 0.0, "cpu_percent = {}", busy.cpu_percent);
    }

    #[test]
    fn max_cpu_mhz_is_finite() {
        let mhz = max_cpu_mhz();
        assert!(mhz.is_finite());
        assert!(mhz >= 0.0);
    }

    #[test]
    fn unknown_pid_is_absent() {
        let mut source = SysinfoSource::new(0x7fff_fff0);
        assert_eq!(source.process_name().unwrap(), None);
        assert_eq!(source.process_metrics().unwrap(), None);
    }

    #[test]
    fn network_counters_do_not_go_backwards() {
        let mut source = SysinfoSource::new(std::process::id());
        let first = source.net_counters();
        let second = source.net_counters();
        assert!(second.bytes_sent >= first.bytes_sent);
        assert!(second.bytes_recv >= first.bytes_recv);
    }
}

use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::export::Exporter;

/// Host-wide cumulative network byte counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// One poll of the monitored process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessMetrics {
    /// CPU usage since the previous poll; may exceed 100 on multi-core hosts.
    pub cpu_percent: f64,
    pub virtual_mem: u64,
    pub used_mem: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub cpu_mhz: f64,
    pub virtual_mem: u64,
    pub used_mem: u64,
    pub net_sent: u64,
    pub net_recv: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Sample(Sample),
    ProcessEnded,
}

/// How a monitoring run finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    NotFound { pid: u32 },
    Ended { pid: u32, name: String, samples: u64 },
    Completed { samples: u64 },
}

impl fmt::Display for RunEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEnd::NotFound { pid } => write!(f, "process PID not found (pid={})", pid),
            RunEnd::Ended { pid, name, .. } => {
                write!(f, "process no longer exists (pid={}, name='{}')", pid, name)
            }
            RunEnd::Completed { samples } => write!(f, "recorded {} samples", samples),
        }
    }
}

/// Operating-system accessors used by the sampling loop.
pub trait MetricsSource {
    fn pid(&self) -> u32;

    /// Name of the target process, `None` if it does not exist.
    fn process_name(&mut self) -> Result<Option<String>>;

    /// Metrics of the target process, `None` once it has exited.
    fn process_metrics(&mut self) -> Result<Option<ProcessMetrics>>;

    fn net_counters(&mut self) -> NetCounters;
}

/// Takes one sample. `prev` is the counter state carried from the last
/// iteration; the returned counters replace it for the next one.
pub fn step<S: MetricsSource>(
    source: &mut S,
    max_mhz: f64,
    prev: NetCounters,
) -> Result<(SampleOutcome, NetCounters)> {
    let Some(metrics) = source.process_metrics()? else {
        return Ok((SampleOutcome::ProcessEnded, prev));
    };
    let current = source.net_counters();

    let sample = Sample {
        timestamp: Local::now(),
        cpu_mhz: metrics.cpu_percent * max_mhz / 100.0,
        virtual_mem: metrics.virtual_mem,
        used_mem: metrics.used_mem,
        net_sent: counter_delta("sent", current.bytes_sent, prev.bytes_sent),
        net_recv: counter_delta("recv", current.bytes_recv, prev.bytes_recv),
    };
    Ok((SampleOutcome::Sample(sample), current))
}

/// A counter that went backwards was reset; the interval is re-baselined to 0.
fn counter_delta(direction: &str, current: u64, prev: u64) -> u64 {
    match current.checked_sub(prev) {
        Some(delta) => delta,
        None => {
            warn!(direction, prev, current, "network counter went backwards, re-baselining");
            0
        }
    }
}

pub fn run<S: MetricsSource, W: Write>(
    cfg: &MonitorConfig,
    source: &mut S,
    exporter: &mut Exporter<W>,
    max_mhz: f64,
) -> Result<RunEnd> {
    let pid = source.pid();
    let Some(name) = source.process_name()? else {
        return Ok(RunEnd::NotFound { pid });
    };
    info!(pid, name = %name, max_mhz, interval_ms = cfg.interval.as_millis() as u64, "monitoring");

    let mut prev = source.net_counters();
    exporter.write_header(&name)?;

    let mut samples = 0u64;
    let mut next_tick = Instant::now();
    loop {
        if cfg.max_samples.is_some_and(|max| samples >= max) {
            return Ok(RunEnd::Completed { samples });
        }

        let (outcome, counters) = step(source, max_mhz, prev)?;
        prev = counters;
        match outcome {
            SampleOutcome::ProcessEnded => {
                return Ok(RunEnd::Ended { pid, name, samples });
            }
            SampleOutcome::Sample(sample) => {
                debug!(
                    cpu_mhz = sample.cpu_mhz,
                    vms = sample.virtual_mem,
                    used = sample.used_mem,
                    sent = sample.net_sent,
                    recv = sample.net_recv,
                    "sample"
                );
                exporter.write_sample(&sample)?;
                samples += 1;
            }
        }

        if cfg.max_samples.is_some_and(|max| samples >= max) {
            return Ok(RunEnd::Completed { samples });
        }
        wait_for_tick(&mut next_tick, cfg.interval);
    }
}

/// Sleeps until the next absolute tick. An overrun tick is dropped rather
/// than made up.
fn wait_for_tick(next_tick: &mut Instant, interval: Duration) {
    *next_tick += interval;
    let now = Instant::now();
    if *next_tick > now {
        std::thread::sleep(*next_tick - now);
    } else {
        if !interval.is_zero() {
            debug!(late_ms = (now - *next_tick).as_millis() as u64, "sampling overran interval");
        }
        *next_tick = now;
    }
}

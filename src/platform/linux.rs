use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::UniqueMemory;
use crate::error::{Error, Result};

const CPUFREQ_MAX: &str = "/sys/devices/system/cpu/cpu0/cpufreq/cpuinfo_max_freq";

/// Private fields summed into the unique set size.
const PRIVATE_FIELDS: [&str; 3] = ["Private_Clean:", "Private_Dirty:", "Private_Hugetlb:"];

pub fn max_cpu_mhz() -> Option<f64> {
    let khz: u64 = fs::read_to_string(CPUFREQ_MAX).ok()?.trim().parse().ok()?;
    Some(khz as f64 / 1000.0)
}

pub fn unique_memory(pid: u32) -> Result<UniqueMemory> {
    let path = PathBuf::from(format!("/proc/{}/smaps_rollup", pid));
    match fs::read_to_string(&path) {
        Ok(content) => Ok(UniqueMemory::Bytes(parse_smaps_rollup(&content))),
        Err(err) => match err.kind() {
            ErrorKind::NotFound if Path::new(&format!("/proc/{}", pid)).exists() => {
                // kernels before 4.14 have no smaps_rollup
                Ok(UniqueMemory::Unsupported)
            }
            ErrorKind::NotFound => Ok(UniqueMemory::ProcessGone),
            ErrorKind::PermissionDenied => Err(Error::AccessDenied { pid, path }),
            _ => Err(Error::Read { path, source: err }),
        },
    }
}

/// Sums the private page counters (reported in kB) of a smaps_rollup file.
fn parse_smaps_rollup(content: &str) -> u64 {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let key = parts.next()?;
            if !PRIVATE_FIELDS.contains(&key) {
                return None;
            }
            let kb: u64 = parts.next()?.parse().ok()?;
            Some(kb * 1024)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLLUP: &str = "\
55d4c0a2b000-7ffd1c1f2000 ---p 00000000 00:00 0                          [rollup]
Rss:                4412 kB
Pss:                1077 kB
Shared_Clean:       3200 kB
Shared_Dirty:          0 kB
Private_Clean:       160 kB
Private_Dirty:      1052 kB
Referenced:         4412 kB
Anonymous:          1048 kB
Private_Hugetlb:       0 kB
Swap:                  0 kB
";

    #[test]
    fn sums_private_pages() {
        assert_eq!(parse_smaps_rollup(ROLLUP), (160 + 1052) * 1024);
    }

    #[test]
    fn empty_rollup_is_zero() {
        assert_eq!(parse_smaps_rollup(""), 0);
    }

    #[test]
    fn own_process_has_unique_memory() {
        match unique_memory(std::process::id()).unwrap() {
            UniqueMemory::Bytes(bytes) => assert!(bytes > 0),
            other => assert_eq!(other, UniqueMemory::Unsupported),
        }
    }

    #[test]
    fn missing_process_is_gone() {
        assert_eq!(unique_memory(0x7fff_fff0).unwrap(), UniqueMemory::ProcessGone);
    }
}

use super::UniqueMemory;
use crate::error::Result;

pub fn max_cpu_mhz() -> Option<f64> {
    None
}

pub fn unique_memory(_pid: u32) -> Result<UniqueMemory> {
    Ok(UniqueMemory::Unsupported)
}

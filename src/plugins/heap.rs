//! `heap`: merges memory statistics into every record.

use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use sysinfo::{Pid, System};

use crate::configs::Settings;
use crate::core::error::LogError;
use crate::loggers::core::Fields;
use crate::plugins::enrich::Enrichment;

/// Memory figures in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeapStats {
    pub total_memory: u64,
    pub used_memory: u64,
    pub available_memory: u64,
    pub free_memory: u64,
    pub total_swap: u64,
    pub used_swap: u64,
    pub process_rss: u64,
    pub process_virtual_memory: u64,
}

pub struct MemoryProbe {
    sys: Mutex<System>,
    pid: Option<Pid>,
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn sample(&self) -> HeapStats {
        let mut sys = self.sys.lock().unwrap_or_else(PoisonError::into_inner);
        sys.refresh_memory();

        let (process_rss, process_virtual_memory) = match self.pid {
            Some(pid) if sys.refresh_process(pid) => sys
                .process(pid)
                .map(|p| (p.memory(), p.virtual_memory()))
                .unwrap_or_default(),
            _ => (0, 0),
        };

        HeapStats {
            total_memory: sys.total_memory(),
            used_memory: sys.used_memory(),
            available_memory: sys.available_memory(),
            free_memory: sys.free_memory(),
            total_swap: sys.total_swap(),
            used_swap: sys.used_swap(),
            process_rss,
            process_virtual_memory,
        }
    }

    pub fn record(&self, data: &mut Fields) {
        if let Ok(Value::Object(stats)) = serde_json::to_value(self.sample()) {
            data.extend(stats);
        }
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

pub fn plugin(_settings: &Settings) -> Result<Enrichment, LogError> {
    let probe = MemoryProbe::new();
    Ok(Enrichment::wrap(move |data, _msg| probe.record(data), &[]))
}

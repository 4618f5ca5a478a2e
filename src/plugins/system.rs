use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use sysinfo::System;

use crate::configs::Settings;
use crate::core::error::LogError;
use crate::loggers::core::Fields;
use crate::plugins::enrich::Enrichment;

pub const SYS_FIELD: &str = "sys";

#[derive(Debug, Clone, Serialize)]
pub struct SysInfo {
    pub cpu_usage: f32,
    pub mem_used_kb: u64,
    pub load_avg: Vec<f64>,
    pub uptime_secs: u64,
}

pub struct SystemProbe {
    sys: Mutex<System>,
}

impl SystemProbe {
    pub fn new() -> Self {
        // cpu usage is a delta, so prime it once before the first sample
        let mut sys = System::new_all();
        sys.refresh_all();
        Self { sys: Mutex::new(sys) }
    }

    pub fn sample(&self) -> SysInfo {
        let mut sys = self.sys.lock().unwrap_or_else(PoisonError::into_inner);
        sys.refresh_cpu();
        sys.refresh_memory();

        let load = System::load_average();
        SysInfo {
            cpu_usage: sys.global_cpu_info().cpu_usage(),
            mem_used_kb: sys.used_memory() / 1024,
            load_avg: vec![load.one, load.five, load.fifteen],
            uptime_secs: System::uptime(),
        }
    }

    pub fn record(&self, data: &mut Fields) {
        if let Ok(sys) = serde_json::to_value(self.sample()) {
            data.insert(SYS_FIELD.to_string(), sys);
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// `system`: attaches CPU, memory, load and uptime under `sys`.
pub fn plugin(_settings: &Settings) -> Result<Enrichment, LogError> {
    let probe = SystemProbe::new();
    Ok(Enrichment::wrap(move |data, _msg| probe.record(data), &[]))
}

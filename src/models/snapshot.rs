// Per-rig and per-GPU poll results

use crate::error::{ParseError, PollError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuStatus {
    Alive,
    Other(String),
}

impl GpuStatus {
    /// Parse the miner's `Status=` value (e.g. "Alive", "Sick", "Dead").
    pub fn from_api(s: &str) -> Self {
        if s.contains("Alive") {
            GpuStatus::Alive
        } else {
            GpuStatus::Other(s.to_string())
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, GpuStatus::Alive)
    }

    pub fn as_str(&self) -> &str {
        match self {
            GpuStatus::Alive => "Alive",
            GpuStatus::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuReport {
    pub index: u32,
    /// KH/s as reported by `KHS av=`.
    pub hashrate_khs: f64,
    pub accepted: u64,
    pub rejected: u64,
    pub hardware_errors: u64,
    pub temperature_c: Option<f64>,
    pub fan_percent: Option<f64>,
    pub clock_mhz: Option<f64>,
    pub enabled: bool,
    pub status: GpuStatus,
}

/// A GPU whose `gpu|i` exchange failed; it contributes nothing to the rig total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuFailure {
    pub index: u32,
    pub reason: String,
}

impl GpuFailure {
    pub fn parse(index: u32, e: &ParseError) -> Self {
        Self {
            index,
            reason: e.to_string(),
        }
    }
}

/// Result of one poll of one rig. Built once per sweep and not mutated after.
#[derive(Debug, Clone, PartialEq)]
pub struct RigSnapshot {
    pub rig_index: usize,
    pub gpu_reports: Vec<GpuReport>,
    pub total_hashrate_khs: f64,
    pub miner_description: Option<String>,
    pub algorithm_name: Option<String>,
    pub miner_version: Option<String>,
    pub poll_error: Option<PollError>,
    pub skipped_gpus: Vec<GpuFailure>,
}

impl RigSnapshot {
    /// Snapshot for a rig that could not be polled at all.
    pub fn unavailable(rig_index: usize, error: PollError) -> Self {
        Self {
            rig_index,
            gpu_reports: Vec::new(),
            total_hashrate_khs: 0.0,
            miner_description: None,
            algorithm_name: None,
            miner_version: None,
            poll_error: Some(error),
            skipped_gpus: Vec::new(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.poll_error.is_none()
    }

    /// True when the rig answered but some GPU or metadata could not be read.
    pub fn is_degraded(&self) -> bool {
        self.poll_error.is_some() || !self.skipped_gpus.is_empty()
    }
}

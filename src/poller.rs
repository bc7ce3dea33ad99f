// Poll one rig: gpucount → (version) → gpu|i for each GPU → coin.
// Never fails: transport and parse errors are folded into the snapshot.

use tracing::{debug, instrument, warn};

use crate::config::RigConfig;
use crate::error::{ParseError, PollError};
use crate::models::{GpuFailure, GpuReport, RigSnapshot};
use crate::rig_api::parse::{self, GpuFields, HwFields};
use crate::rig_api::{CMD_COIN, CMD_GPU_COUNT, CMD_VERSION, RigClient, gpu_command};

/// More GPUs than any rig carries; larger counts are treated as a corrupt response.
const MAX_GPUS: u32 = 64;

/// How much of the rig to fetch. Summary only needs rig-level totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDepth {
    Summary,
    Detail,
}

#[instrument(skip(rig, client), fields(rig = %rig.display_name))]
pub async fn poll(
    rig_index: usize,
    rig: &RigConfig,
    client: &RigClient,
    depth: PollDepth,
) -> RigSnapshot {
    let count_text = match client.send(rig, CMD_GPU_COUNT).await {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, operation = CMD_GPU_COUNT, "rig unreachable");
            return RigSnapshot::unavailable(rig_index, e.into());
        }
    };
    if count_text.trim().is_empty() {
        warn!(operation = CMD_GPU_COUNT, "no response from API");
        return RigSnapshot::unavailable(rig_index, PollError::NoResponse);
    }
    let Some(gpu_count) = parse::parse_gpu_count(&count_text) else {
        warn!(response = %count_text, "unparseable gpucount response");
        return RigSnapshot::unavailable(
            rig_index,
            PollError::BadGpuCount(ParseError::FieldNotFound { field: "GPUS=" }),
        );
    };
    if gpu_count > MAX_GPUS {
        warn!(gpu_count, "implausible gpucount response");
        return RigSnapshot::unavailable(
            rig_index,
            PollError::BadGpuCount(ParseError::InvalidValue {
                field: "GPUS=",
                value: gpu_count.to_string(),
            }),
        );
    }

    let version_text = match depth {
        PollDepth::Summary => None,
        PollDepth::Detail => match client.send(rig, CMD_VERSION).await {
            Ok(t) => Some(t),
            Err(e) => {
                debug!(error = %e, operation = CMD_VERSION, "version request failed");
                None
            }
        },
    };
    let miner_version = version_text.as_deref().and_then(parse::parse_miner_version);

    let mut gpu_reports = Vec::with_capacity(gpu_count as usize);
    let mut skipped_gpus = Vec::new();
    for index in 0..gpu_count {
        let command = gpu_command(index);
        let text = match client.send(rig, &command).await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, operation = %command, "gpu request failed");
                skipped_gpus.push(GpuFailure {
                    index,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        match parse::parse_gpu_report(&text) {
            Ok(fields) => {
                let hw = version_text
                    .as_deref()
                    .and_then(|v| parse::parse_hardware_fields(&text, v));
                gpu_reports.push(gpu_report(index, fields, hw));
            }
            Err(e) => {
                warn!(error = %e, operation = %command, "could not parse gpu stats");
                skipped_gpus.push(GpuFailure::parse(index, &e));
            }
        }
    }

    let total_hashrate_khs: f64 = gpu_reports.iter().map(|g| g.hashrate_khs).sum();

    let coin = match client.send(rig, CMD_COIN).await {
        Ok(t) => parse::parse_coin_info(&t)
            .inspect_err(|e| debug!(error = %e, operation = CMD_COIN, "coin info unavailable"))
            .ok(),
        Err(e) => {
            debug!(error = %e, operation = CMD_COIN, "coin request failed");
            None
        }
    };
    let (miner_description, algorithm_name) = match coin {
        Some(c) => (Some(c.description), Some(c.algorithm)),
        None => (None, None),
    };

    RigSnapshot {
        rig_index,
        gpu_reports,
        total_hashrate_khs,
        miner_description,
        algorithm_name,
        miner_version,
        poll_error: None,
        skipped_gpus,
    }
}

fn gpu_report(index: u32, fields: GpuFields, hw: Option<HwFields>) -> GpuReport {
    GpuReport {
        index,
        hashrate_khs: fields.hashrate_khs,
        accepted: fields.accepted,
        rejected: fields.rejected,
        hardware_errors: fields.hardware_errors,
        temperature_c: hw.map(|h| h.temperature_c),
        fan_percent: hw.map(|h| h.fan_percent),
        clock_mhz: hw.map(|h| h.clock_mhz),
        enabled: fields.enabled,
        status: fields.status,
    }
}

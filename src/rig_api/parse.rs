// Field extraction for sgminer-style API responses.
// Responses look like `STATUS=S,...,Description=sgminer 5.6.0|GPU=0,Enabled=Y,...|`.
// Every field is found by key, then sliced up to a fixed end marker. The end markers
// are the neighbouring keys rig firmware emits, so they must not be loosened.

use crate::error::ParseError;
use crate::models::GpuStatus;

const KHS_AV: &str = "KHS av=";
const MARKER_5S: &str = "KHS 5s";
const MARKER_30S: &str = "KHS 30s";

/// Miner names known to report temperature / fan / clock in `gpu|i` responses.
const HW_TELEMETRY_MINERS: [&str; 2] = ["sgminer", "TeamRedMiner"];

/// Fields from one `gpu|i` response, before hardware telemetry is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuFields {
    pub hashrate_khs: f64,
    pub accepted: u64,
    pub rejected: u64,
    pub hardware_errors: u64,
    pub enabled: bool,
    pub status: GpuStatus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HwFields {
    pub temperature_c: f64,
    pub fan_percent: f64,
    pub clock_mhz: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinInfo {
    pub description: String,
    pub algorithm: String,
}

/// Slice between the first `key` at or after `start` and the next `delim` after it.
/// Returns the value and the offset just past it.
pub fn extract_field<'a>(
    text: &'a str,
    key: &'static str,
    delim: &str,
    start: usize,
) -> Result<(&'a str, usize), ParseError> {
    let not_found = ParseError::FieldNotFound { field: key };
    let rest = text.get(start..).ok_or(not_found.clone())?;
    let key_pos = rest.find(key).ok_or(not_found.clone())?;
    let value_start = start + key_pos + key.len();
    let len = text[value_start..].find(delim).ok_or(not_found)?;
    let value_end = value_start + len;
    Ok((&text[value_start..value_end], value_end))
}

fn field<'a>(text: &'a str, key: &'static str, delim: &str) -> Result<&'a str, ParseError> {
    extract_field(text, key, delim, 0).map(|(v, _)| v)
}

fn number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidValue {
            field,
            value: value.to_string(),
        })
}

/// `GPUS=2|` → `Some(2)`. Value sits between the last `=` and the `|` after it.
pub fn parse_gpu_count(text: &str) -> Option<u32> {
    let eq = text.rfind('=')?;
    let value_start = eq + 1;
    let len = text[value_start..].find('|')?;
    text[value_start..value_start + len].trim().parse().ok()
}

/// Parse one `gpu|i` response. Two miner variants exist: one reports `KHS 5s`, the
/// other `KHS 30s`; the average hashrate is bounded by whichever marker is present.
pub fn parse_gpu_report(text: &str) -> Result<GpuFields, ParseError> {
    let marker = if text.contains(MARKER_5S) {
        ",KHS 5s"
    } else if text.contains(MARKER_30S) {
        ",KHS 30s"
    } else {
        return Err(ParseError::UnknownFormat);
    };

    let hashrate_khs = number(KHS_AV, field(text, KHS_AV, marker)?)?;
    let accepted = number("Accepted=", field(text, "Accepted=", ",Rejected")?)?;
    let rejected = number("Rejected=", field(text, "Rejected=", ",Hardware Errors")?)?;
    let hardware_errors = number(
        "Hardware Errors=",
        field(text, "Hardware Errors=", ",Utility")?,
    )?;
    let enabled = field(text, "Enabled=", ",Status")?.trim() == "Y";
    let status = GpuStatus::from_api(field(text, "Status=", ",Temperature")?.trim());

    Ok(GpuFields {
        hashrate_khs,
        accepted,
        rejected,
        hardware_errors,
        enabled,
        status,
    })
}

/// True when the `version` response names a miner that exposes GPU hardware telemetry.
pub fn supports_hw_telemetry(miner_version: &str) -> bool {
    HW_TELEMETRY_MINERS
        .iter()
        .any(|name| miner_version.contains(name))
}

/// Temperature, fan and clock from a `gpu|i` response. `None` for miners that don't
/// expose hardware telemetry, or when any of the three fields is missing.
pub fn parse_hardware_fields(text: &str, miner_version: &str) -> Option<HwFields> {
    if !supports_hw_telemetry(miner_version) {
        return None;
    }
    let temperature_c = number("Temperature=", field(text, "Temperature=", ",Fan").ok()?).ok()?;
    let fan_percent = number("Fan Percent=", field(text, "Fan Percent=", ",GPU Clock").ok()?).ok()?;
    let clock_mhz = number("GPU Clock=", field(text, "GPU Clock=", ",").ok()?).ok()?;
    Some(HwFields {
        temperature_c,
        fan_percent,
        clock_mhz,
    })
}

pub fn parse_coin_info(text: &str) -> Result<CoinInfo, ParseError> {
    let description = field(text, "Description=", "|COIN")?;
    let algorithm = field(text, "Hash Method=", ",Current Block Time")?;
    Ok(CoinInfo {
        description: description.to_string(),
        algorithm: algorithm.to_string(),
    })
}

/// Miner name + version from a `version` response (`Miner=` field, else `Description=`).
pub fn parse_miner_version(text: &str) -> Option<String> {
    field(text, "Miner=", ",")
        .or_else(|_| field(text, "Description=", "|"))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

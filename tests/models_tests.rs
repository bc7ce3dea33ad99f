// Model tests: GPU status parsing, view state encoding, report accessors

use rigpoller::config::RigConfig;
use rigpoller::error::PollError;
use rigpoller::models::*;

#[test]
fn test_gpu_status_from_api() {
    assert_eq!(GpuStatus::from_api("Alive"), GpuStatus::Alive);
    assert!(GpuStatus::from_api("Alive").is_alive());
    let sick = GpuStatus::from_api("Sick");
    assert_eq!(sick, GpuStatus::Other("Sick".into()));
    assert!(!sick.is_alive());
    assert_eq!(sick.as_str(), "Sick");
}

#[test]
fn test_view_state_u8_roundtrip() {
    for v in [ViewState::Menu, ViewState::Summary, ViewState::Detail] {
        assert_eq!(ViewState::from_u8(v.as_u8()), v);
    }
    assert_eq!(ViewState::from_u8(200), ViewState::Menu);
    assert_eq!(ViewState::default(), ViewState::Menu);
}

#[test]
fn test_unavailable_snapshot_is_degraded() {
    let s = RigSnapshot::unavailable(2, PollError::NoResponse);
    assert_eq!(s.rig_index, 2);
    assert!(!s.is_reachable());
    assert!(s.is_degraded());
    assert!(s.gpu_reports.is_empty());
    assert_eq!(s.total_hashrate_khs, 0.0);
}

#[test]
fn test_report_accessors() {
    let rig = RigReport {
        rig: RigConfig {
            address: "127.0.0.1".into(),
            port: 4028,
            display_name: "LocalHost".into(),
        },
        snapshot: RigSnapshot::unavailable(0, PollError::NoResponse),
        moving_average_khs: 0.0,
    };
    assert_eq!(Report::Menu.view(), ViewState::Menu);
    assert!(Report::Menu.rigs().is_empty());
    let detail = Report::Detail(vec![rig.clone()]);
    assert_eq!(detail.view(), ViewState::Detail);
    assert_eq!(detail.rigs(), &[rig][..]);
}

// Console rendering. Views are built as plain styled lines first (testable),
// then written to the terminal with crossterm.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};

use crate::models::{Frame, GpuReport, Report, RigReport};
use crate::version::{NAME, VERSION};

const SEPARATOR: &str = "------------------";
const NOT_AVAILABLE: &str = "n/a";
const COMPATIBILITY_NOTE: &str = "Compatible with 'sgminer-gm' and 'TeamRedMiner-v0.3.8' onwards.";
const KEYS_HINT: &str = "Press (m) to display the menu. Press (q) to quit the program.";

/// Receives one frame per tick.
pub trait RenderSink {
    fn render(&mut self, frame: &Frame) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub color: Option<Color>,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line(pub Vec<Span>);

impl Line {
    fn plain(text: impl Into<String>) -> Self {
        Line(vec![Span::plain(text)])
    }

    fn push(&mut self, span: Span) -> &mut Self {
        self.0.push(span);
        self
    }

    /// Text without styling.
    pub fn text(&self) -> String {
        self.0.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Total is low when it drops below `threshold_percent` of the moving average.
/// No history (average 0) never counts as low.
pub fn hashrate_is_low(total_khs: f64, average_khs: f64, threshold_percent: f64) -> bool {
    average_khs > 0.0 && total_khs / average_khs * 100.0 < threshold_percent
}

pub fn format_khs(khs: f64) -> String {
    format!("{:.2}KH/s", khs)
}

/// Per-GPU rates are shown in H/s.
pub fn format_gpu_hashrate(khs: f64) -> String {
    format!("{:.1}H/s", khs * 1000.0)
}

fn or_na(v: Option<&str>) -> &str {
    v.unwrap_or(NOT_AVAILABLE)
}

pub fn menu_lines() -> Vec<Line> {
    vec![
        Line::plain("->Main Menu"),
        Line::plain("==========="),
        Line::plain("Press (1) to display a summary view of all monitored rigs."),
        Line::plain("Press (2) to display a detailed view of all monitored rigs."),
        Line::plain("Press (m) to display this menu."),
        Line::plain("Press (q) to quit the program."),
        Line::default(),
        Line::plain(format!("{} v{}", NAME, VERSION)),
    ]
}

fn total_spans(line: &mut Line, r: &RigReport, threshold_percent: f64) {
    let total = r.snapshot.total_hashrate_khs;
    let avg = r.moving_average_khs;
    let color = if hashrate_is_low(total, avg, threshold_percent) {
        Color::Red
    } else {
        Color::Green
    };
    line.push(Span::colored(format!("Total:{} ", format_khs(total)), color));
    if avg > 0.0 {
        line.push(Span::plain(format!(" Avg:{} ", format_khs(avg))));
    }
}

fn rig_identity(r: &RigReport) -> Line {
    Line::plain(format!(
        "RIG IP:{}, Port:{}, Name:{}",
        r.rig.address, r.rig.port, r.rig.display_name
    ))
}

fn footer(lines: &mut Vec<Line>) {
    lines.push(Line::default());
    lines.push(Line::plain(COMPATIBILITY_NOTE));
    lines.push(Line::default());
    lines.push(Line::plain(KEYS_HINT));
}

/// One line per rig.
pub fn summary_lines(rigs: &[RigReport], threshold_percent: f64) -> Vec<Line> {
    let mut lines = vec![Line::plain("->Summary View")];
    for r in rigs {
        let mut line = Line::plain(format!("Name:{} ", r.rig.display_name));
        match &r.snapshot.poll_error {
            Some(e) => {
                line.push(Span::colored("Unable to contact rig!", Color::Red))
                    .push(Span::plain(format!(
                        " Total:{} ({}) RIG IP:{}, Port:{}",
                        NOT_AVAILABLE, e, r.rig.address, r.rig.port
                    )));
            }
            None => {
                total_spans(&mut line, r, threshold_percent);
                line.push(Span::plain(format!(
                    " Miner:{}, Algo:{}",
                    or_na(r.snapshot.miner_description.as_deref()),
                    or_na(r.snapshot.algorithm_name.as_deref())
                )));
                if !r.snapshot.skipped_gpus.is_empty() {
                    line.push(Span::colored(
                        format!(" [{} GPU(s) unavailable]", r.snapshot.skipped_gpus.len()),
                        Color::Red,
                    ));
                }
            }
        }
        lines.push(line);
    }
    footer(&mut lines);
    lines
}

fn gpu_line(gpu: &GpuReport) -> Line {
    let mut line = Line::plain(format!(
        "GPU{}:{}, A:{}, R:{}, HW:{}, ",
        gpu.index,
        format_gpu_hashrate(gpu.hashrate_khs),
        gpu.accepted,
        gpu.rejected,
        gpu.hardware_errors
    ));
    match (gpu.temperature_c, gpu.fan_percent, gpu.clock_mhz) {
        (Some(t), Some(f), Some(c)) => {
            line.push(Span::colored(
                format!("Temp:{}C, Fan%:{}, GPU Clock={}, ", t, f, c),
                Color::Yellow,
            ));
        }
        _ => {
            line.push(Span::plain(
                "Miner version unknown, will not track GPU information, ",
            ));
        }
    }
    line.push(Span::colored(
        format!("Enabled:{}, ", if gpu.enabled { "Y" } else { "N" }),
        Color::Cyan,
    ));
    let status_color = if gpu.status.is_alive() {
        Color::Cyan
    } else {
        Color::DarkRed
    };
    line.push(Span::colored(
        format!("Status:{}", gpu.status.as_str()),
        status_color,
    ));
    line
}

/// A block per rig: GPU lines, total, miner, identity, timestamp.
pub fn detail_lines(rigs: &[RigReport], threshold_percent: f64, updated_at: &str) -> Vec<Line> {
    let mut lines = vec![Line::plain("->Detailed View")];
    for r in rigs {
        if let Some(e) = &r.snapshot.poll_error {
            lines.push(Line(vec![
                Span::colored("Unable to contact rig!", Color::Red),
                Span::plain(format!(" ({})", e)),
            ]));
            for _ in 0..3 {
                lines.push(Line::plain(NOT_AVAILABLE));
            }
        } else {
            lines.extend(r.snapshot.gpu_reports.iter().map(gpu_line));
            for skipped in &r.snapshot.skipped_gpus {
                lines.push(Line(vec![Span::colored(
                    format!("GPU{}: unavailable ({})", skipped.index, skipped.reason),
                    Color::Red,
                )]));
            }
            let mut total = Line::default();
            total_spans(&mut total, r, threshold_percent);
            lines.push(total);
            let mut miner = Line::plain(format!(
                "Miner:{}, Algo:{}",
                or_na(r.snapshot.miner_description.as_deref()),
                or_na(r.snapshot.algorithm_name.as_deref())
            ));
            if let Some(v) = &r.snapshot.miner_version {
                miner.push(Span::plain(format!(", Version:{}", v)));
            }
            lines.push(miner);
        }
        lines.push(rig_identity(r));
        lines.push(Line::plain(format!("Updated:{}", updated_at)));
        lines.push(Line::plain(SEPARATOR));
    }
    footer(&mut lines);
    lines
}

pub fn frame_lines(frame: &Frame, threshold_percent: f64) -> Vec<Line> {
    let updated_at = frame.updated_at.format("%Y-%m-%d %H:%M:%S").to_string();
    match &frame.report {
        Report::Menu => menu_lines(),
        Report::Summary(rigs) => summary_lines(rigs, threshold_percent),
        Report::Detail(rigs) => detail_lines(rigs, threshold_percent, &updated_at),
    }
}

/// Writes frames to a terminal in raw mode (lines end with `\r\n`).
pub struct TerminalRenderer<W: Write> {
    out: W,
    low_hashrate_threshold_percent: f64,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, low_hashrate_threshold_percent: f64) -> Self {
        Self {
            out,
            low_hashrate_threshold_percent,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for TerminalRenderer<W> {
    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        let lines = frame_lines(frame, self.low_hashrate_threshold_percent);
        if frame.relayout {
            queue!(self.out, Clear(ClearType::All))?;
        }
        queue!(self.out, MoveTo(0, 0))?;
        for line in &lines {
            for span in &line.0 {
                match span.color {
                    Some(c) => queue!(
                        self.out,
                        SetForegroundColor(c),
                        Print(&span.text),
                        ResetColor
                    )?,
                    None => queue!(self.out, Print(&span.text))?,
                }
            }
            queue!(self.out, Clear(ClearType::UntilNewLine), Print("\r\n"))?;
        }
        queue!(self.out, Clear(ClearType::FromCursorDown))?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RigConfig;
    use crate::error::PollError;
    use crate::models::{GpuFailure, GpuStatus, RigSnapshot};

    fn rig(name: &str) -> RigConfig {
        RigConfig {
            address: "10.0.0.5".into(),
            port: 4028,
            display_name: name.into(),
        }
    }

    fn gpu(index: u32, khs: f64, hw: bool) -> GpuReport {
        GpuReport {
            index,
            hashrate_khs: khs,
            accepted: 10,
            rejected: 1,
            hardware_errors: 0,
            temperature_c: hw.then_some(65.0),
            fan_percent: hw.then_some(40.0),
            clock_mhz: hw.then_some(1150.0),
            enabled: true,
            status: GpuStatus::Alive,
        }
    }

    fn healthy(name: &str, total: f64, avg: f64) -> RigReport {
        RigReport {
            rig: rig(name),
            snapshot: RigSnapshot {
                rig_index: 0,
                gpu_reports: vec![gpu(0, total, true)],
                total_hashrate_khs: total,
                miner_description: Some("sgminer 5.6.0".into()),
                algorithm_name: Some("cryptonight".into()),
                miner_version: Some("sgminer 5.6.0".into()),
                poll_error: None,
                skipped_gpus: vec![],
            },
            moving_average_khs: avg,
        }
    }

    fn unreachable(name: &str) -> RigReport {
        RigReport {
            rig: rig(name),
            snapshot: RigSnapshot::unavailable(1, PollError::NoResponse),
            moving_average_khs: 0.0,
        }
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(Line::text).collect()
    }

    #[test]
    fn low_hashrate_uses_threshold() {
        assert!(hashrate_is_low(80.0, 100.0, 90.0));
        assert!(!hashrate_is_low(95.0, 100.0, 90.0));
        assert!(!hashrate_is_low(80.0, 100.0, 75.0));
        assert!(!hashrate_is_low(0.0, 0.0, 90.0));
        assert!(!hashrate_is_low(10.0, 0.0, 90.0));
    }

    #[test]
    fn formats_hashrates() {
        assert_eq!(format_khs(25.0), "25.00KH/s");
        assert_eq!(format_gpu_hashrate(12.5), "12500.0H/s");
    }

    #[test]
    fn summary_marks_unreachable_rig_and_keeps_others() {
        let lines = summary_lines(&[healthy("a", 25.0, 0.0), unreachable("b")], 90.0);
        let t = texts(&lines);
        assert!(t[1].contains("Name:a"));
        assert!(t[1].contains("Total:25.00KH/s"));
        assert!(!t[1].contains("Avg:"));
        assert!(t[1].contains("Miner:sgminer 5.6.0, Algo:cryptonight"));
        assert!(t[2].contains("Name:b"));
        assert!(t[2].contains("Unable to contact rig!"));
        assert!(t[2].contains("n/a"));
    }

    #[test]
    fn summary_total_red_when_below_average() {
        let lines = summary_lines(&[healthy("a", 50.0, 100.0)], 90.0);
        let total = lines[1]
            .0
            .iter()
            .find(|s| s.text.starts_with("Total:"))
            .unwrap();
        assert_eq!(total.color, Some(Color::Red));
        assert!(lines[1].text().contains("Avg:100.00KH/s"));
    }

    #[test]
    fn detail_shows_gpu_fields_and_placeholders() {
        let mut partial = healthy("a", 12.5, 12.5);
        partial.snapshot.gpu_reports.push(gpu(1, 0.0, false));
        partial.snapshot.skipped_gpus.push(GpuFailure {
            index: 2,
            reason: "unknown response format".into(),
        });
        let lines = detail_lines(&[partial, unreachable("b")], 90.0, "now");
        let t = texts(&lines);
        assert!(t.iter().any(|l| l.starts_with("GPU0:12500.0H/s, A:10, R:1, HW:0, Temp:65C")));
        assert!(t.iter().any(|l| l.starts_with("GPU1:") && l.contains("Miner version unknown")));
        assert!(t.iter().any(|l| l.starts_with("GPU2: unavailable")));
        assert!(t.iter().any(|l| l.contains("Unable to contact rig!")));
        assert_eq!(t.iter().filter(|l| *l == "n/a").count(), 3);
        assert_eq!(t.iter().filter(|l| l.starts_with("RIG IP:10.0.0.5")).count(), 2);
        assert!(t.iter().any(|l| l == "Updated:now"));
    }

    #[test]
    fn terminal_renderer_writes_menu() {
        let mut r = TerminalRenderer::new(Vec::new(), 90.0);
        let frame = Frame {
            report: Report::Menu,
            relayout: true,
            updated_at: chrono::Local::now(),
        };
        r.render(&frame).unwrap();
        let out = String::from_utf8_lossy(&r.into_inner()).to_string();
        assert!(out.contains("->Main Menu"));
        assert!(out.contains("Press (q) to quit the program."));
    }
}

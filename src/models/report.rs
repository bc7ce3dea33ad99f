// Render-agnostic output of one tick. Summary and Detail share the same per-rig shape.

use chrono::{DateTime, Local};

use super::{RigSnapshot, ViewState};
use crate::config::RigConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RigReport {
    pub rig: RigConfig,
    pub snapshot: RigSnapshot,
    /// Mean of the retained history samples for this rig (0 when none).
    pub moving_average_khs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Menu,
    Summary(Vec<RigReport>),
    Detail(Vec<RigReport>),
}

impl Report {
    pub fn view(&self) -> ViewState {
        match self {
            Report::Menu => ViewState::Menu,
            Report::Summary(_) => ViewState::Summary,
            Report::Detail(_) => ViewState::Detail,
        }
    }

    pub fn rigs(&self) -> &[RigReport] {
        match self {
            Report::Menu => &[],
            Report::Summary(rigs) | Report::Detail(rigs) => rigs,
        }
    }
}

/// What the render sink receives each tick.
#[derive(Debug, Clone)]
pub struct Frame {
    pub report: Report,
    /// Set after a view switch: the renderer must clear and lay out from scratch.
    pub relayout: bool,
    pub updated_at: DateTime<Local>,
}

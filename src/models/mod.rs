// Domain models: per-rig poll results, view state and render-ready reports

mod report;
mod snapshot;
mod view;

pub use report::{Frame, Report, RigReport};
pub use snapshot::{GpuFailure, GpuReport, GpuStatus, RigSnapshot};
pub use view::ViewState;

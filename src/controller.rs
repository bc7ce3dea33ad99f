// View controller: on each tick, read the active view, sweep the rigs if needed,
// record totals into history and hand a frame to the render sink.
// Ticks never overlap: the loop awaits each sweep before taking the next tick,
// and ticks missed during a slow sweep are skipped.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::oneshot;
use tokio::time::{Instant, interval};
use tracing::{debug, warn};

use crate::context::MonitorContext;
use crate::models::{Frame, Report, RigReport, RigSnapshot, ViewState};
use crate::poller::{self, PollDepth};
use crate::render::RenderSink;

#[derive(Clone)]
pub struct ViewController {
    ctx: Arc<MonitorContext>,
}

impl ViewController {
    pub fn new(ctx: Arc<MonitorContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &MonitorContext {
        &self.ctx
    }

    pub fn set_state(&self, view: ViewState) {
        self.ctx.view.set(view);
    }

    /// Build the report for the view that is active right now.
    pub async fn tick(&self) -> Report {
        match self.ctx.view.get() {
            ViewState::Menu => Report::Menu,
            ViewState::Summary => Report::Summary(self.sweep(PollDepth::Summary).await),
            ViewState::Detail => Report::Detail(self.sweep(PollDepth::Detail).await),
        }
    }

    pub async fn next_frame(&self) -> Frame {
        let relayout = self.ctx.view.take_relayout();
        let report = self.tick().await;
        Frame {
            report,
            relayout,
            updated_at: chrono::Local::now(),
        }
    }

    /// Poll every rig (at most `max_concurrent_polls` at once, results in rig order),
    /// read each rig's moving average, then record the reachable totals.
    /// The average therefore covers earlier sweeps only.
    async fn sweep(&self, depth: PollDepth) -> Vec<RigReport> {
        let ctx = &self.ctx;
        let started = Instant::now();

        let polls: Vec<_> = ctx
            .rigs
            .iter()
            .enumerate()
            .map(|(i, rig)| poller::poll(i, rig, &ctx.client, depth))
            .collect();
        let snapshots: Vec<RigSnapshot> = stream::iter(polls)
            .buffered(ctx.max_concurrent_polls)
            .collect()
            .await;

        let averages: Vec<f64> = snapshots
            .iter()
            .map(|s| ctx.history.average_for(s.rig_index))
            .collect();
        for s in snapshots.iter().filter(|s| s.is_reachable()) {
            ctx.history.record(s.rig_index, s.total_hashrate_khs);
        }

        let unreachable = snapshots.iter().filter(|s| !s.is_reachable()).count();
        debug!(
            operation = "sweep",
            ?depth,
            rigs = snapshots.len(),
            unreachable,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sweep complete"
        );

        ctx.rigs
            .iter()
            .zip(snapshots.into_iter().zip(averages))
            .map(|(rig, (snapshot, moving_average_khs))| RigReport {
                rig: rig.clone(),
                snapshot,
                moving_average_khs,
            })
            .collect()
    }
}

/// Spawns the timer loop. One frame per tick until `shutdown_rx` fires or is dropped.
pub fn spawn<S>(
    controller: ViewController,
    mut sink: S,
    tick_interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()>
where
    S: RenderSink + Send + 'static,
{
    tokio::spawn(async move {
        let mut tick = interval(tick_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let frame = controller.next_frame().await;
                    if let Err(e) = sink.render(&frame) {
                        warn!(error = %e, operation = "render", "render failed");
                    }
                }
                _ = &mut shutdown_rx => {
                    debug!("Controller shutting down");
                    break;
                }
            }
        }
    })
}

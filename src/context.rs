// State built once at startup and shared by handle: rigs, polling options, history, view.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::{AppConfig, RigConfig};
use crate::history::HistoryStore;
use crate::models::ViewState;
use crate::rig_api::RigClient;

/// Active view shared between the input task (writer) and the sweep (reader).
#[derive(Clone, Default)]
pub struct ViewHandle {
    state: Arc<AtomicU8>,
    relayout: Arc<AtomicBool>,
}

impl ViewHandle {
    pub fn new(initial: ViewState) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(initial.as_u8())),
            relayout: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn get(&self) -> ViewState {
        ViewState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Switch view. Takes effect on the next tick; the next frame is laid out from scratch.
    pub fn set(&self, view: ViewState) {
        self.state.store(view.as_u8(), Ordering::Release);
        self.relayout.store(true, Ordering::Release);
    }

    /// Read and clear the relayout flag.
    pub fn take_relayout(&self) -> bool {
        self.relayout.swap(false, Ordering::AcqRel)
    }
}

pub struct MonitorContext {
    pub rigs: Vec<RigConfig>,
    pub client: RigClient,
    pub max_concurrent_polls: usize,
    pub history: HistoryStore,
    pub view: ViewHandle,
}

impl MonitorContext {
    pub fn new(
        rigs: Vec<RigConfig>,
        client: RigClient,
        max_concurrent_polls: usize,
        samples_per_rig: usize,
    ) -> Self {
        let history = HistoryStore::new(samples_per_rig, rigs.len());
        Self {
            rigs,
            client,
            max_concurrent_polls: max_concurrent_polls.max(1),
            history,
            view: ViewHandle::new(ViewState::Menu),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.rigs.clone(),
            RigClient::new(config.polling.timeout(), config.polling.read_mode),
            config.polling.max_concurrent_polls,
            config.polling.samples_per_rig,
        )
    }
}

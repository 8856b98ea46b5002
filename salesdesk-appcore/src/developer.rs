use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Local};
use salesdesk_core::config::AppConfig;
use salesdesk_core::offer::{AgentConfig, AgentProfile, SalesOffer};
use salesdesk_core::transcript::TranscriptEntry;
use salesdesk_engine::session::{SendError, SessionState, SessionStatus, StartOutcome};
use salesdesk_engine::simulator::{SessionSimulator, SimulatorConfig};
use salesdesk_engine::traits::CallSetupRequest;
use salesdesk_runtime::script_store::ScriptStore;

use crate::script_manager::ScriptManager;

/// Script editing plus a sandbox call that never leaves the process.
pub struct DeveloperDashboard {
    username: String,
    opened_at: DateTime<Local>,
    store: Arc<ScriptStore>,
    scripts: ScriptManager,
    offer: SalesOffer,
    profile: AgentProfile,
    simulator: SessionSimulator,
}

impl DeveloperDashboard {
    pub fn open(
        username: impl Into<String>,
        cfg: &AppConfig,
        store: Arc<ScriptStore>,
    ) -> anyhow::Result<Self> {
        let username = username.into();
        let scripts = ScriptManager::open(store.clone(), username.clone())?;
        let sim_cfg =
            SimulatorConfig::from_settings(&cfg.call, cfg.call.developer_greeting.clone());

        log::info!("developer dashboard opened for {username}");
        Ok(Self {
            username,
            opened_at: Local::now(),
            store,
            scripts,
            offer: cfg.offer.clone(),
            profile: cfg.agent.clone(),
            simulator: SessionSimulator::new(sim_cfg),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn scripts(&self) -> &ScriptManager {
        &self.scripts
    }

    pub fn scripts_mut(&mut self) -> &mut ScriptManager {
        &mut self.scripts
    }

    /// Test calls always run on the local timer, against the active prompt.
    pub async fn start_call(&self) -> anyhow::Result<StartOutcome> {
        let instructions = self
            .store
            .active_prompt_or_seed()
            .context("read active prompt for test call")?;
        let request = CallSetupRequest {
            agent: AgentConfig::from_profile(&self.profile, instructions),
            offer: self.offer.clone(),
        };
        Ok(self.simulator.start_call(&request).await?)
    }

    pub async fn end_call(&self) {
        self.simulator.end_call().await;
    }

    pub fn send_message(&self, text: &str) -> Result<(), SendError> {
        self.simulator.send_message(text)
    }

    pub fn toggle_mute(&self) -> bool {
        self.simulator.toggle_mute()
    }

    pub fn status(&self) -> SessionStatus {
        self.simulator.status()
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.simulator.transcript()
    }

    pub fn simulator(&self) -> &SessionSimulator {
        &self.simulator
    }

    pub fn debug_log(&self) -> Vec<String> {
        let opened = self.opened_at.format("%H:%M:%S");
        let mut lines = vec![
            format!("[{opened}] System: Developer dashboard initialized"),
            format!("[{opened}] User: {} logged in", self.username),
            format!("[{opened}] Scripts: Loaded from local storage"),
        ];
        if self.simulator.state() == SessionState::Connected {
            lines.push(format!(
                "[{}] LiveKit: Agent connected",
                Local::now().format("%H:%M:%S")
            ));
        }
        lines.extend(self.simulator.transcript().iter().map(|e| e.log_line()));
        lines
    }

    /// Stops the sandbox call without waiting on it.
    pub fn close(&self) {
        self.simulator.shutdown();
    }
}

use std::sync::Arc;

use salesdesk_core::config::AppConfig;
use salesdesk_core::offer::{AgentConfig, SalesOffer};
use salesdesk_core::transcript::TranscriptEntry;
use salesdesk_engine::session::{SendError, SessionStatus, StartOutcome};
use salesdesk_engine::simulator::{SessionSimulator, SimulatorConfig};
use salesdesk_engine::traits::{CallSetupRequest, ConnectError, MediaConnector};
use salesdesk_runtime::call_setup::HttpCallSetup;
use salesdesk_runtime::script_store::ScriptStore;

/// The customer-facing call screen.
pub struct SalesDashboard {
    offer: SalesOffer,
    agent: AgentConfig,
    simulator: SessionSimulator,
}

impl SalesDashboard {
    /// Reads the active prompt once; later saves show up after `reload_prompt`.
    pub fn new(
        cfg: &AppConfig,
        scripts: &ScriptStore,
        media: Arc<dyn MediaConnector>,
    ) -> anyhow::Result<Self> {
        let instructions = scripts.active_prompt_or_seed()?;
        let agent = AgentConfig::from_profile(&cfg.agent, instructions);

        let sim_cfg = SimulatorConfig::from_settings(&cfg.call, cfg.call.greeting.clone());
        let mut builder = SessionSimulator::builder(sim_cfg);
        match cfg.call.start_call_url.as_deref() {
            Some(url) => {
                log::info!("sales calls go through {url}");
                builder = builder.call_setup(Arc::new(HttpCallSetup::new(url)), media);
            }
            None => log::info!("no call backend configured; sales calls are simulated"),
        }

        Ok(Self {
            offer: cfg.offer.clone(),
            agent,
            simulator: builder.build(),
        })
    }

    pub fn offer(&self) -> &SalesOffer {
        &self.offer
    }

    pub fn agent(&self) -> &AgentConfig {
        &self.agent
    }

    pub fn reload_prompt(&mut self, scripts: &ScriptStore) -> anyhow::Result<()> {
        let instructions = scripts.active_prompt_or_seed()?;
        if instructions != self.agent.instructions {
            log::info!("sales agent picked up a new active prompt");
            self.agent.instructions = instructions;
        }
        Ok(())
    }

    pub async fn start_call(&self) -> Result<StartOutcome, ConnectError> {
        let request = CallSetupRequest {
            agent: self.agent.clone(),
            offer: self.offer.clone(),
        };
        self.simulator.start_call(&request).await
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesdesk_core::types::Speaker;
    use salesdesk_engine::session::SessionState;
    use salesdesk_runtime::call_setup::NoMediaSdk;
    use salesdesk_runtime::defaults::DEFAULT_PROMPT;
    use salesdesk_runtime::kv::MemoryKv;
    use std::time::Duration;

    fn store() -> ScriptStore {
        ScriptStore::new(Arc::new(MemoryKv::new()))
    }

    #[tokio::test]
    async fn agent_uses_seeded_prompt_and_profile() {
        let cfg = AppConfig::default();
        let dash = SalesDashboard::new(&cfg, &store(), Arc::new(NoMediaSdk)).unwrap();
        assert_eq!(dash.agent().instructions, DEFAULT_PROMPT);
        assert_eq!(dash.agent().goals.len(), 4);
        assert_eq!(dash.offer().product_name, "Premium CRM Suite");
    }

    #[tokio::test]
    async fn reload_prompt_picks_up_saved_script() {
        let scripts = store();
        let mut dash =
            SalesDashboard::new(&AppConfig::default(), &scripts, Arc::new(NoMediaSdk)).unwrap();

        scripts
            .save(
                &salesdesk_core::script::ScriptDraft::named("Short", "Be brief."),
                "dev",
            )
            .unwrap();
        assert_eq!(dash.agent().instructions, DEFAULT_PROMPT);

        dash.reload_prompt(&scripts).unwrap();
        assert_eq!(dash.agent().instructions, "Be brief.");
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_call_greets_and_replies() {
        let dash =
            SalesDashboard::new(&AppConfig::default(), &store(), Arc::new(NoMediaSdk)).unwrap();

        assert_eq!(dash.start_call().await.unwrap(), StartOutcome::Simulated);
        assert_eq!(dash.status().state, SessionState::Connecting);
        assert_eq!(dash.send_message("hi"), Err(SendError::NotConnected));

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(dash.status().state, SessionState::Connected);
        let transcript = dash.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].speaker, Speaker::Agent);
        assert_eq!(
            transcript[0].text,
            "Hello! I'm your AI Sales Assistant. How can I help you today?"
        );

        dash.send_message("What does it cost?").unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let transcript = dash.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].speaker, Speaker::User);
        assert_eq!(transcript[2].speaker, Speaker::Agent);

        dash.end_call().await;
        assert_eq!(dash.status().state, SessionState::Disconnected);
    }

    #[tokio::test]
    async fn mute_is_a_display_toggle() {
        let dash =
            SalesDashboard::new(&AppConfig::default(), &store(), Arc::new(NoMediaSdk)).unwrap();
        assert!(dash.toggle_mute());
        assert!(dash.status().muted);
        assert!(!dash.toggle_mute());
    }
}

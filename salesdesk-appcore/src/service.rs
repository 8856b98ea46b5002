use std::sync::Arc;

use salesdesk_core::config::AppConfig;
use salesdesk_engine::traits::MediaConnector;
use salesdesk_runtime::auth::{AuthError, DeveloperAuth};
use salesdesk_runtime::kv::KeyValueStore;
use salesdesk_runtime::script_store::ScriptStore;
use serde::Serialize;

use crate::developer::DeveloperDashboard;
use crate::sales::SalesDashboard;

/// Which top-level screen is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Sales,
    DeveloperLogin,
    Developer { username: String },
}

/// Owns both dashboards and switches between them.
///
/// The sales dashboard lives for the whole service. A developer dashboard is
/// built on login and torn down on logout.
pub struct DashboardService {
    cfg: AppConfig,
    auth: DeveloperAuth,
    scripts: Arc<ScriptStore>,
    sales: SalesDashboard,
    developer: Option<DeveloperDashboard>,
    login_open: bool,
}

impl DashboardService {
    /// Restores a remembered developer session if the store has one.
    pub fn new(
        cfg: AppConfig,
        kv: Arc<dyn KeyValueStore>,
        media: Arc<dyn MediaConnector>,
    ) -> anyhow::Result<Self> {
        let scripts = Arc::new(ScriptStore::new(kv.clone()));
        let auth = DeveloperAuth::new(kv, cfg.developer.clone());
        let sales = SalesDashboard::new(&cfg, &scripts, media)?;

        let developer = match auth.current_user()? {
            Some(user) => {
                log::info!("restoring developer session for {user}");
                Some(DeveloperDashboard::open(user, &cfg, scripts.clone())?)
            }
            None => None,
        };

        Ok(Self {
            cfg,
            auth,
            scripts,
            sales,
            developer,
            login_open: false,
        })
    }

    pub fn screen(&self) -> Screen {
        match (&self.developer, self.login_open) {
            (Some(dev), _) => Screen::Developer {
                username: dev.username().to_string(),
            },
            (None, true) => Screen::DeveloperLogin,
            (None, false) => Screen::Sales,
        }
    }

    pub fn sales(&self) -> &SalesDashboard {
        &self.sales
    }

    pub fn developer(&self) -> Option<&DeveloperDashboard> {
        self.developer.as_ref()
    }

    pub fn developer_mut(&mut self) -> Option<&mut DeveloperDashboard> {
        self.developer.as_mut()
    }

    pub fn open_developer_login(&mut self) {
        if self.developer.is_none() {
            self.login_open = true;
        }
    }

    pub fn cancel_login(&mut self) {
        self.login_open = false;
    }

    /// On any failure the login form stays open and no session is remembered.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        let user = self.auth.login(username, password)?;
        let dashboard = match DeveloperDashboard::open(user, &self.cfg, self.scripts.clone()) {
            Ok(dashboard) => dashboard,
            Err(e) => {
                log::error!("developer dashboard failed to open: {e:#}");
                if let Err(undo) = self.auth.logout() {
                    log::error!("could not clear developer session: {undo:#}");
                }
                return Err(AuthError::Storage(e));
            }
        };
        self.developer = Some(dashboard);
        self.login_open = false;
        Ok(())
    }

    /// Forgets the developer, closes their dashboard and refreshes the sales
    /// agent's prompt.
    pub fn logout(&mut self) -> anyhow::Result<()> {
        self.auth.logout()?;
        if let Some(dev) = self.developer.take() {
            dev.close();
            log::info!("developer {} logged out", dev.username());
        }
        self.login_open = false;
        self.sales.reload_prompt(&self.scripts)
    }
}

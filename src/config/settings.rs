use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{EngineConfig, Pacing};
use crate::error::{AppError, AppResult};

const DEFAULT_ASSISTANT_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub assistant_url: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub search_max_results: Option<u32>,
    #[serde(default)]
    pub max_chain_depth: Option<usize>,
    #[serde(default)]
    pub pacing: PacingSettings,
}

/// Delays in milliseconds for the animated parts of action execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub to_char: u64,
    pub subject_char: u64,
    pub body_char: u64,
    pub compose_settle: u64,
    pub reply_settle: u64,
    pub highlight_lead: u64,
    pub highlight_duration: u64,
    pub open_email: u64,
    pub navigate: u64,
    pub chain: u64,
    pub logout: u64,
    pub assistant_settle: u64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            to_char: 25,
            subject_char: 20,
            body_char: 10,
            compose_settle: 400,
            reply_settle: 200,
            highlight_lead: 100,
            highlight_duration: 1500,
            open_email: 600,
            navigate: 300,
            chain: 500,
            logout: 800,
            assistant_settle: 400,
        }
    }
}

impl PacingSettings {
    pub fn to_pacing(&self) -> Pacing {
        let ms = Duration::from_millis;
        Pacing {
            to_char: ms(self.to_char),
            subject_char: ms(self.subject_char),
            body_char: ms(self.body_char),
            compose_settle: ms(self.compose_settle),
            reply_settle: ms(self.reply_settle),
            highlight_lead: ms(self.highlight_lead),
            highlight_duration: ms(self.highlight_duration),
            open_email: ms(self.open_email),
            navigate: ms(self.navigate),
            chain: ms(self.chain),
            logout: ms(self.logout),
            assistant_settle: ms(self.assistant_settle),
        }
    }
}

impl Settings {
    pub fn assistant_url(&self) -> String {
        self.assistant_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_ASSISTANT_URL)
            .trim_end_matches('/')
            .to_string()
    }

    /// Engine knobs with unset values taken from [`EngineConfig::default`].
    pub fn engine_config(&self) -> AppResult<EngineConfig> {
        let defaults = EngineConfig::default();
        let page_size = self.page_size.unwrap_or(defaults.page_size);
        if page_size == 0 {
            return Err(AppError::Config(
                "page_size must be greater than 0".to_string(),
            ));
        }

        Ok(EngineConfig {
            pacing: self.pacing.to_pacing(),
            page_size,
            search_max_results: self
                .search_max_results
                .unwrap_or(defaults.search_max_results)
                .max(1),
            max_chain_depth: self.max_chain_depth.unwrap_or(defaults.max_chain_depth),
            user_name: self.user_name.clone(),
        })
    }
}

pub fn load(path: PathBuf) -> AppResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&raw)?;
    Ok(settings)
}

use log::LevelFilter;
use rand::Rng;
use siot_core::ClientConfig;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SCHOOL: &str = "Montana";
const DEFAULT_SPORTS: &str = "Soccer (W)";
const DEFAULT_RECONNECT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: LevelFilter,
    pub url: String,
    pub uid: String,
    pub token: Option<String>,
    pub school: String,
    pub sports: Vec<String>,
    pub reconnect_interval: Duration,
    pub legacy_cgi_url: Option<String>,
    pub legacy_team_map: HashMap<String, String>,
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key/value source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let uid = get("SIOT_UID").unwrap_or_else(generate_uid);
        let url = get("SIOT_URL").unwrap_or_else(|| {
            let host = get("SIOT_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
            let port = get("SIOT_PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT);
            format!("ws://{host}:{port}/ws/{uid}")
        });

        let sports = parse_sports(&get("SIOT_SPORTS").unwrap_or_else(|| DEFAULT_SPORTS.to_string()));

        let reconnect_secs = get("SIOT_RECONNECT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_RECONNECT_SECS);

        let log_level = get("SIOT_LOG")
            .and_then(|l| l.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Error);

        Self {
            full_screen: false,
            log_level,
            url,
            uid,
            token: get("SIOT_TOKEN"),
            school: get("SIOT_SCHOOL").unwrap_or_else(|| DEFAULT_SCHOOL.to_string()),
            sports,
            reconnect_interval: Duration::from_secs(reconnect_secs),
            legacy_cgi_url: get("LEGACY_CGI_URL"),
            legacy_team_map: siot_core::notifier::team_map_from_json(
                get("LEGACY_TEAM_MAP_JSON").as_deref(),
            ),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.url.clone(),
            uid: self.uid.clone(),
            school: self.school.clone(),
            sports: self.sports.clone(),
            auth_token: self.token.clone(),
        }
    }
}

fn parse_sports(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Six-digit numeric id; the service routes sockets by `/ws/{integer}`.
fn generate_uid() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000u32).to_string()
}

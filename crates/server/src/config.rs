use config::ConfigError;
use domain::moderation::ModerationRules;
use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "REVISE_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub editing: EditingSettings,
    #[serde(default)]
    pub moderation: ModerationRules,
    pub security: SecuritySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
    pub cookie_path: String,
    // 部署在反向代理之后时，从 X-Forwarded-For 取客户端 IP
    pub trust_proxy: bool,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct EditingSettings {
    /// 分钟，上限 90
    pub comment_time: u32,
    pub allow_delete: bool,
    pub security_key_min: u32,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub nonce_secret: String,
    pub session_secret: String,
    pub nonce_lifetime_secs: i64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("server.cookie_path", "/")?
            .set_default("server.trust_proxy", false)?
            .set_default("database.url", "sqlite://data/revise.db")?
            .set_default("editing.comment_time", 5)?
            .set_default("editing.allow_delete", true)?
            .set_default("editing.security_key_min", 100)?
            .set_default("security.nonce_secret", "change_me_please")?
            .set_default("security.session_secret", "session_secret_change_me")?
            .set_default("security.nonce_lifetime_secs", 86_400)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .map_err(|e| ConfigError::Message(e.to_string()))?,
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

fn collect_env_vars() -> HashMap<String, String> {
    env_overrides(std::env::vars())
}

/// `REVISE_EDITING__COMMENT_TIME=10` becomes `editing.comment_time = "10"`.
fn env_overrides(vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches(ENV_PREFIX)
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}

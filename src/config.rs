//! Env-driven configuration for the service and the CLI.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Defaults are provided for the listener only, the backend
//! store must always be configured.
use std::env;
use dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub webhook_url: Option<String>,
    pub admin_password: Option<String>,
    pub api_host: String,
    pub api_port: String,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> Result<Self, env::VarError> {
        let supabase_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|_| env::var("SUPABASE_ANON_KEY"))?;
        Ok(Config {
            supabase_url: env::var("SUPABASE_URL")?,
            supabase_key,
            webhook_url: non_empty_var("N8N_WEBHOOK_URL"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "3000".to_string()),
        })
    }

    pub fn print_env_vars(&self) {
        tracing::info!("SUPABASE_URL: {}", self.supabase_url);
        tracing::info!("SUPABASE key: {}", mask(&self.supabase_key));
        tracing::info!(
            "N8N_WEBHOOK_URL: {}",
            self.webhook_url.as_deref().unwrap_or("<unset>")
        );
        tracing::info!(
            "ADMIN_PASSWORD: {}",
            if self.admin_password.is_some() { "<set>" } else { "<unset>" }
        );
        tracing::info!("API_HOST: {}", self.api_host);
        tracing::info!("API_PORT: {}", self.api_port);
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn mask(secret: &str) -> String {
    let shown: String = secret.chars().take(4).collect();
    format!("{}…", shown)
}

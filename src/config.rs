use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::quota::QuotaPolicy;

// which quota store backs the tracker
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Firestore,
}

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "story-gateway")]
#[command(about = "Chat bot that turns prompts into stories, gated by a per-user quota")]
pub struct Args {
    // Port for the interactions endpoint
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Chat platform bot credential
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    // Chat platform application id (used for command registration and response edits)
    #[arg(long, env = "APPLICATION_ID")]
    pub application_id: String,

    // Guild to register commands in, empty means global
    #[arg(long = "guild", env = "GUILD_ID", default_value = "")]
    pub guild_id: String,

    // Application public key (hex), used to verify interaction signatures
    #[arg(long, env = "PUBLIC_KEY")]
    pub public_key: String,

    #[arg(long, env = "DISCORD_API_URL", default_value = "https://discord.com/api/v10")]
    pub discord_api: String,

    // Generation backend credential
    #[arg(long, env = "BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: String,

    #[arg(
        long,
        env = "TEXTSYNTH_URL",
        default_value = "https://api.textsynth.com/v1/engines/gptj_6B/completions"
    )]
    pub textsynth_url: String,

    // Generation timeout in seconds
    #[arg(long, env = "GENERATION_TIMEOUT_SECS", default_value_t = 30)]
    pub generation_timeout: u64,

    // Admitted requests per window
    #[arg(long, env = "QUOTA_LIMIT", default_value_t = 2)]
    pub quota_limit: u32,

    // Window length in seconds
    #[arg(long, env = "QUOTA_WINDOW_SECS", default_value_t = 60)]
    pub quota_window: u64,

    // Compare-and-set attempts before giving up on a contended record
    #[arg(long, env = "STORE_RETRIES", default_value_t = 5)]
    pub store_retries: u32,

    // Bound on each quota store request in seconds
    #[arg(long = "store-timeout-secs", env = "STORE_TIMEOUT_SECS", default_value_t = 5)]
    pub store_timeout: u64,

    #[arg(long, env = "QUOTA_STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    #[arg(long, env = "FIRESTORE_PROJECT", default_value = "story-time-337102")]
    pub firestore_project: String,

    // OAuth access token for the Firestore REST api, not needed against the emulator
    #[arg(long, env = "FIRESTORE_TOKEN", hide_env_values = true)]
    pub firestore_token: Option<String>,

    #[arg(long, env = "FIRESTORE_URL", default_value = "https://firestore.googleapis.com/v1")]
    pub firestore_url: String,

    #[arg(long, env = "QUOTA_COLLECTION", default_value = "users")]
    pub collection: String,

    // How long in-flight stories may finish after shutdown starts
    #[arg(long = "shutdown-grace-secs", env = "SHUTDOWN_GRACE_SECS", default_value_t = 30)]
    pub shutdown_grace: u64,

    // Skip slash command registration on startup
    #[arg(long, env = "SKIP_REGISTER")]
    pub skip_register: bool,
}

impl Args {
    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy::new(self.quota_limit, self.quota_window)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }

    pub fn guild(&self) -> Option<&str> {
        let guild = self.guild_id.trim();
        (!guild.is_empty()).then_some(guild)
    }
}

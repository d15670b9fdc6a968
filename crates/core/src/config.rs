//! Environment-variable configuration, profiled the same way across every
//! stage binary: `{PROFILE}_{KEY}` is tried before the bare `{KEY}`.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load a `.env` file if present; silently ignored otherwise.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{profile}_{key}");
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn profiled_env_f64(profile: &str, key: &str, default: f64) -> f64 {
    profiled_env_opt(profile, key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn profiled_env_list(profile: &str, key: &str, default: &[&str]) -> Vec<String> {
    match profiled_env_opt(profile, key) {
        Some(v) => v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

/// Well-known env keys that identify a profile when prefixed.
const PROFILE_MARKER_KEYS: &[&str] = &["AWS_ACCESS_KEY_ID", "S3_BUCKET", "OPENAI_API_KEY", "ANTHROPIC_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub profile: String,
    pub object_store: ObjectStoreConfig,
    pub queue: QueueConfig,
    pub llm: LlmConfig,
    pub rate_limit: RateLimitConfig,
    pub quality: QualityConfig,
    pub site: SiteConfig,
    pub scheduler: SchedulerConfig,
    pub sources: SourcesConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let profile = env_or("GAZETTE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            object_store: ObjectStoreConfig::from_env_profiled(p),
            queue: QueueConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            rate_limit: RateLimitConfig::from_env_profiled(p),
            quality: QualityConfig::from_env_profiled(p),
            site: SiteConfig::from_env_profiled(p),
            scheduler: SchedulerConfig::from_env_profiled(p),
            sources: SourcesConfig::from_env_profiled(p),
        }
    }

    pub fn available_profiles() -> Vec<String> {
        let mut profiles = std::collections::BTreeSet::new();
        profiles.insert("default".to_string());
        for (key, _) in env::vars() {
            for marker in PROFILE_MARKER_KEYS {
                if let Some(prefix) = key.strip_suffix(&format!("_{marker}")) {
                    if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
                        profiles.insert(prefix.to_string());
                    }
                }
            }
        }
        profiles.into_iter().collect()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    pub fn log_summary(&self) {
        tracing::info!("config loaded (profile: {})", self.profile_label());
        tracing::info!("  object_store: backend={} bucket={:?}", self.object_store.backend, self.object_store.bucket);
        tracing::info!("  queue:        backend={}", self.queue.backend);
        tracing::info!("  llm:          provider={} model={}", self.llm.provider, self.llm.model);
        tracing::info!("  rate_limit:   rpm={}", self.rate_limit.requests_per_minute);
        tracing::info!("  quality:      strict_mode={} threshold={}", self.quality.strict_mode_default, self.quality.score_threshold);
        tracing::info!("  site:         hugo_bin={}", self.site.hugo_bin);
        tracing::info!("  scheduler:    cron={}", self.scheduler.cron_expression);
    }

    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "object_store": { "backend": self.object_store.backend, "bucket": self.object_store.bucket, "configured": self.object_store.is_configured() },
            "queue": { "backend": self.queue.backend, "configured": self.queue.is_configured() },
            "llm": { "provider": self.llm.provider, "model": self.llm.model, "configured": self.llm.is_configured() },
        })
    }
}

// ── Object store ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// "local" or "s3".
    pub backend: String,
    pub local_root: PathBuf,
    pub region: String,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub endpoint_url: Option<String>,
}

impl ObjectStoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            backend: profiled_env_or(p, "OBJECT_STORE_BACKEND", "local"),
            local_root: PathBuf::from(profiled_env_or(p, "OBJECT_STORE_LOCAL_ROOT", "data/containers")),
            region: profiled_env_or(p, "AWS_REGION", "us-east-1"),
            bucket: profiled_env_opt(p, "S3_BUCKET"),
            prefix: profiled_env_opt(p, "S3_PREFIX"),
            access_key_id: profiled_env_opt(p, "AWS_ACCESS_KEY_ID"),
            secret_access_key: profiled_env_opt(p, "AWS_SECRET_ACCESS_KEY"),
            session_token: profiled_env_opt(p, "AWS_SESSION_TOKEN"),
            endpoint_url: profiled_env_opt(p, "AWS_ENDPOINT_URL"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend == "local" || (self.access_key_id.is_some() && self.bucket.is_some())
    }
}

// ── Queue ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// "sqs" or "local" (file-backed, for tests/dev).
    pub backend: String,
    pub collection_requests_url: String,
    pub processing_requests_url: String,
    pub markdown_requests_url: String,
    pub publishing_requests_url: String,
    pub dlq_url: Option<String>,
    pub visibility_timeout_secs: u32,
    pub lease_ttl_secs: i64,
}

impl QueueConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            backend: profiled_env_or(p, "QUEUE_BACKEND", "local"),
            collection_requests_url: profiled_env_or(p, "QUEUE_COLLECTION_REQUESTS_URL", "content-collection-requests"),
            processing_requests_url: profiled_env_or(p, "QUEUE_PROCESSING_REQUESTS_URL", "content-processing-requests"),
            markdown_requests_url: profiled_env_or(p, "QUEUE_MARKDOWN_REQUESTS_URL", "markdown-generation-requests"),
            publishing_requests_url: profiled_env_or(p, "QUEUE_PUBLISHING_REQUESTS_URL", "site-publishing-requests"),
            dlq_url: profiled_env_opt(p, "QUEUE_DLQ_URL"),
            visibility_timeout_secs: profiled_env_u32(p, "QUEUE_VISIBILITY_TIMEOUT_SECS", 300),
            lease_ttl_secs: profiled_env_u64(p, "QUEUE_LEASE_TTL_SECS", 300) as i64,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend == "local" || !self.processing_requests_url.is_empty()
    }
}

// ── LLM ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic", "ollama"
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: u32,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub ollama_url: String,
    pub session_cost_cap_usd: f64,
    pub attempt_cost_cap_usd: f64,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "ollama"),
            model: profiled_env_or(p, "LLM_MODEL", "gpt-3.5-turbo"),
            temperature: profiled_env_f64(p, "LLM_TEMPERATURE", 0.7) as f32,
            max_tokens: profiled_env_u32(p, "LLM_MAX_TOKENS", 2048),
            max_retries: profiled_env_u32(p, "LLM_MAX_RETRIES", 3),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            ollama_url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            session_cost_cap_usd: profiled_env_f64(p, "LLM_SESSION_COST_CAP_USD", 5.0),
            attempt_cost_cap_usd: profiled_env_f64(p, "LLM_ATTEMPT_COST_CAP_USD", 0.50),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" => self.anthropic_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Rate limiting ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_minute: f64,
    pub initial_backoff_secs: f64,
    pub max_backoff_secs: f64,
    pub backoff_multiplier: f64,
}

impl RateLimitConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            requests_per_minute: profiled_env_f64(p, "RATE_LIMIT_RPM", 60.0),
            initial_backoff_secs: profiled_env_f64(p, "RATE_LIMIT_INITIAL_BACKOFF_SECS", 2.0),
            max_backoff_secs: profiled_env_f64(p, "RATE_LIMIT_MAX_BACKOFF_SECS", 300.0),
            backoff_multiplier: profiled_env_f64(p, "RATE_LIMIT_BACKOFF_MULTIPLIER", 2.0),
        }
    }
}

// ── Quality gate ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub strict_mode_default: bool,
    pub score_threshold: f64,
    pub diversity_cap_per_source: usize,
    pub enable_l2_dedup: bool,
    pub enable_l3_dedup: bool,
}

impl QualityConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            strict_mode_default: profiled_env_bool(p, "QUALITY_STRICT_MODE_DEFAULT", true),
            score_threshold: profiled_env_f64(p, "QUALITY_SCORE_THRESHOLD", 0.60),
            diversity_cap_per_source: profiled_env_u32(p, "QUALITY_DIVERSITY_CAP", 3) as usize,
            enable_l2_dedup: profiled_env_bool(p, "DEDUP_ENABLE_L2", true),
            enable_l3_dedup: profiled_env_bool(p, "DEDUP_ENABLE_L3", true),
        }
    }
}

// ── Static site ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub hugo_bin: String,
    pub hugo_config_path: String,
    pub base_url: String,
    pub build_timeout_secs: u64,
}

impl SiteConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            hugo_bin: profiled_env_or(p, "SITE_HUGO_BIN", "hugo"),
            hugo_config_path: profiled_env_or(p, "SITE_HUGO_CONFIG_PATH", "hugo.toml"),
            base_url: profiled_env_or(p, "SITE_BASE_URL", "https://example.com"),
            build_timeout_secs: profiled_env_u64(p, "SITE_BUILD_TIMEOUT_SECS", 120),
        }
    }
}

// ── Source adapters ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub reddit_subreddits: Vec<String>,
    pub mastodon_hosts: Vec<String>,
    pub rss_feeds: Vec<String>,
    pub max_items_per_cycle: usize,
}

impl SourcesConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            reddit_subreddits: profiled_env_list(p, "SOURCES_REDDIT_SUBREDDITS", &["technology", "programming"]),
            mastodon_hosts: profiled_env_list(p, "SOURCES_MASTODON_HOSTS", &["mastodon.social"]),
            rss_feeds: profiled_env_list(p, "SOURCES_RSS_FEEDS", &[]),
            max_items_per_cycle: profiled_env_u32(p, "SOURCES_MAX_ITEMS_PER_CYCLE", 30) as usize,
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub cron_expression: String,
    pub cooldown_secs: u64,
}

impl SchedulerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            cron_expression: profiled_env_or(p, "SCHEDULER_CRON", "0 */4 * * *"),
            cooldown_secs: profiled_env_u64(p, "SCHEDULER_COOLDOWN_SECS", 3600),
        }
    }
}

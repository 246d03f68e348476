use once_cell::sync::{Lazy, OnceCell};
use tracing::Level;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Process-wide settings, read from the environment on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

static TRACING: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Proof type applied at issuance when the options name none.
    pub default_proof_type: Option<String>,
    /// Whether credential status checks are strict unless the options say otherwise.
    pub strict_status: bool,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_proof_type: None,
            strict_status: false,
            log_level: Level::INFO,
        }
    }
}

impl Config {
    /// Loads `.env` files, then reads the `DIDKIT_*` variables.
    pub fn from_env() -> Self {
        dotenv_flow::dotenv_flow().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(read: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| read(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        // an unparsable level keeps the default
        let log_level = non_empty("DIDKIT_LOG")
            .and_then(|level| level.parse().ok())
            .unwrap_or(defaults.log_level);

        Self {
            default_proof_type: non_empty("DIDKIT_DEFAULT_PROOF_TYPE"),
            strict_status: non_empty("DIDKIT_STRICT_STATUS")
                .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
            log_level,
        }
    }
}

/// Installs the fmt subscriber once per process.
///
/// A subscriber already installed by the host application is left in place.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let tracing_layer = tracing_subscriber::fmt::layer();
        let filter = filter::Targets::new()
            .with_target("hyper", CONFIG.log_level.min(Level::INFO))
            .with_default(CONFIG.log_level);

        if tracing_subscriber::registry().with(tracing_layer).with(filter).try_init().is_ok() {
            tracing::debug!(level = %CONFIG.log_level, "tracing initialized");
        }
    });
}

use std::env;

use log::*;
use pod_common::{parse_boolean_flag, Secret};
use razorpay_tools::RazorpayConfig;
use settlement_engine::sqlite::db::db_url;

const DEFAULT_POD_HOST: &str = "127.0.0.1";
const DEFAULT_POD_PORT: u16 = 8460;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    pub razorpay_config: RazorpayConfig,
    /// If false, webhook deliveries are accepted without checking their signature. **DANGER**
    pub hmac_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_POD_HOST.to_string(),
            port: DEFAULT_POD_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            razorpay_config: RazorpayConfig::default(),
            hmac_checks: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("POD_HOST").ok().unwrap_or_else(|| DEFAULT_POD_HOST.into());
        let port = env::var("POD_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for POD_PORT. {e} Using the default, {DEFAULT_POD_PORT}, instead."
                    );
                    DEFAULT_POD_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_POD_PORT);
        let database_url = db_url();
        let razorpay_config = RazorpayConfig::new_from_env_or_default();
        let hmac_checks = parse_boolean_flag(env::var("POD_RAZORPAY_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!(
                "🚨️ Webhook signature checks are DISABLED. Anyone can mark orders as paid. Never run production like \
                 this."
            );
        }
        let use_x_forwarded_for = parse_boolean_flag(env::var("POD_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("POD_USE_FORWARDED").ok(), false);
        Self { host, port, database_url, use_x_forwarded_for, use_forwarded, razorpay_config, hmac_checks }
    }

    /// The secret that signs `razorpay_order_id|razorpay_payment_id` in checkout callbacks.
    pub fn payment_secret(&self) -> Secret<String> {
        self.razorpay_config.key_secret.clone()
    }

    pub fn webhook_secret(&self) -> Secret<String> {
        self.razorpay_config.webhook_secret.clone()
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}

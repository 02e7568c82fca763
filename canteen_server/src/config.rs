use std::{env, io::Write, str::FromStr, time::Duration};

use canteen_common::Secret;
use canteen_engine::helpers::OperatingTimeZone;
use firebase_tools::FirebaseConfig;
use log::*;
use rand::{thread_rng, RngCore};
use razorpay_tools::RazorpayConfig;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_CANTEEN_HOST: &str = "127.0.0.1";
const DEFAULT_CANTEEN_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/canteen_orders.db";
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;
const DEFAULT_ALLOCATION_MAX_ATTEMPTS: u32 = 8;
const DEFAULT_FEED_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_REAP_MAX_ATTEMPTS: i64 = 10;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Payment gateway credentials. The key secret doubles as the payment signature key.
    pub razorpay: RazorpayConfig,
    /// Push notification and identity admin credentials
    pub firebase: FirebaseConfig,
    /// The time zone the canteens operate in. Token sequences restart at local midnight.
    pub time_zone: OperatingTimeZone,
    /// How many times an order commit is attempted when the token counter is contended.
    pub allocation_max_attempts: u32,
    /// How often the document feed worker polls the change streams.
    pub feed_poll_interval: Duration,
    /// How often the reap worker retries failed account deletions.
    pub reap_interval: Duration,
    /// Failed account deletions are abandoned after this many attempts.
    pub reap_max_attempts: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CANTEEN_HOST.to_string(),
            port: DEFAULT_CANTEEN_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            razorpay: RazorpayConfig::default(),
            firebase: FirebaseConfig::default(),
            time_zone: OperatingTimeZone::default(),
            allocation_max_attempts: DEFAULT_ALLOCATION_MAX_ATTEMPTS,
            feed_poll_interval: DEFAULT_FEED_POLL_INTERVAL,
            reap_interval: DEFAULT_REAP_INTERVAL,
            reap_max_attempts: DEFAULT_REAP_MAX_ATTEMPTS,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CANTEEN_HOST").ok().unwrap_or_else(|| DEFAULT_CANTEEN_HOST.into());
        let port = parse_env("CANTEEN_PORT", DEFAULT_CANTEEN_PORT);
        let database_url = env::var("CANTEEN_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CANTEEN_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let razorpay = RazorpayConfig::new_from_env_or_default();
        if razorpay.key_secret.is_unset() {
            error!("🪛️ The gateway key secret is empty. Every payment confirmation will be rejected.");
        }
        let firebase = FirebaseConfig::new_from_env_or_default();
        let offset = parse_env("CANTEEN_UTC_OFFSET_MINUTES", DEFAULT_UTC_OFFSET_MINUTES);
        let time_zone = OperatingTimeZone::from_offset_minutes(offset).unwrap_or_else(|| {
            error!("🪛️ {offset} minutes is not a valid UTC offset. Using the default, {DEFAULT_UTC_OFFSET_MINUTES}.");
            OperatingTimeZone::default()
        });
        let allocation_max_attempts =
            parse_env("CANTEEN_ALLOCATION_MAX_ATTEMPTS", DEFAULT_ALLOCATION_MAX_ATTEMPTS).max(1);
        let feed_poll_interval = Duration::from_millis(parse_env(
            "CANTEEN_FEED_POLL_INTERVAL_MS",
            DEFAULT_FEED_POLL_INTERVAL.as_millis() as u64,
        ))
        .max(Duration::from_millis(10));
        let reap_interval =
            Duration::from_secs(parse_env("CANTEEN_REAP_INTERVAL_SECS", DEFAULT_REAP_INTERVAL.as_secs()))
                .max(Duration::from_secs(1));
        let reap_max_attempts = parse_env("CANTEEN_REAP_MAX_ATTEMPTS", DEFAULT_REAP_MAX_ATTEMPTS).max(1);
        Self {
            host,
            port,
            database_url,
            auth,
            razorpay,
            firebase,
            time_zone,
            allocation_max_attempts,
            feed_poll_interval,
            reap_interval,
            reap_max_attempts,
        }
    }
}

/// Reads and parses `name`, falling back to `default` (with a log message) if it is missing or invalid.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret that caller access tokens are signed with.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since no issued token will survive a restart. 🚨️🚨️🚨️"
        );
        let mut key = [0u8; 32];
        thread_rng().fill_bytes(&mut key);
        let secret = hex::encode(key);
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                         you are doing it wrong! Set the CANTEEN_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret. ");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(jwt_secret: S) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("CANTEEN_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [CANTEEN_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("CANTEEN_JWT_SECRET is empty".into()));
        }
        Ok(Self::new(secret))
    }
}

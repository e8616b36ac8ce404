use std::env;

use cps_common::Secret;
use log::*;
use stripe_tools::StripeConfig;

use crate::errors::ServerError;

const DEFAULT_CPS_HOST: &str = "127.0.0.1";
const DEFAULT_CPS_PORT: u16 = 8460;
const DEFAULT_RETURN_ORIGIN: &str = "http://localhost:5173";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Fallback frontend origin used for payment redirect URLs when a placement request carries no `Origin`
    /// header.
    pub default_return_origin: String,
    /// Payment gateway configuration (API and webhook secrets).
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CPS_HOST.to_string(),
            port: DEFAULT_CPS_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            default_return_origin: DEFAULT_RETURN_ORIGIN.to_string(),
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CPS_HOST").ok().unwrap_or_else(|| DEFAULT_CPS_HOST.into());
        let port = env::var("CPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CPS_PORT. {e} Using the default, {DEFAULT_CPS_PORT}, instead."
                    );
                    DEFAULT_CPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CPS_PORT);
        let database_url = env::var("CPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CPS_DATABASE_URL is not set. Please set it to the URL for the CPS database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to \
                 the default configuration."
            );
            AuthConfig::default()
        });
        let default_return_origin = env::var("CPS_RETURN_ORIGIN").ok().unwrap_or_else(|| {
            info!("🪛️ CPS_RETURN_ORIGIN is not set. Using the default, {DEFAULT_RETURN_ORIGIN}.");
            DEFAULT_RETURN_ORIGIN.to_string()
        });
        let stripe = StripeConfig::new_from_env_or_default();
        Self { host, port, database_url, auth, default_return_origin, stripe }
    }
}

//-------------------------------------------------  AuthConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign and verify access tokens (HS256).
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this, since every issued access token becomes invalid when the server \
             restarts. Set the CPS_JWT_SECRET environment variable instead. 🚨️🚨️🚨️"
        );
        let secret = format!("{:032x}{:032x}", rand::random::<u128>(), rand::random::<u128>());
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("CPS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [CPS_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "CPS_JWT_SECRET must be at least 32 characters long.".to_string(),
            ));
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}

//-------------------------------------------------  ServerOptions  ---------------------------------------------------
/// A subset of the server configuration that request handlers need. Generally we try to keep this as small as
/// possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub default_return_origin: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { default_return_origin: DEFAULT_RETURN_ORIGIN.to_string() }
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { default_return_origin: config.default_return_origin.clone() }
    }
}

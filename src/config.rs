use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::{error::AppError, services::password::PasswordPolicy};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub cookie_secret: String,
    pub session_ttl: Duration,
    pub login_floor: Duration,
    /// `None` disables the background purge of expired sessions.
    pub session_sweep_interval: Option<Duration>,
    pub shutdown_grace: Duration,
    pub password: PasswordPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://local.db".to_string());
        let listen_addr: SocketAddr = parse_var("APP_LISTEN_ADDR", "127.0.0.1:8080")?;

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dist"));

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-gatehouse-cookie-secret".to_string());

        let session_ttl = Duration::from_secs(parse_var("SESSION_TTL_SECS", 300u64)?);
        if session_ttl.is_zero() {
            return Err(AppError::Config("SESSION_TTL_SECS must be positive".into()));
        }
        let login_floor = Duration::from_millis(parse_var("LOGIN_FLOOR_MS", 3000u64)?);
        let session_sweep_interval = match parse_var("SESSION_SWEEP_SECS", 60u64)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let shutdown_grace = Duration::from_secs(parse_var("SHUTDOWN_GRACE_SECS", 5u64)?);

        let defaults = PasswordPolicy::default();
        let password = PasswordPolicy {
            memory_kib: parse_var("PASSWORD_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_var("PASSWORD_ITERATIONS", defaults.iterations)?,
            parallelism: parse_var("PASSWORD_PARALLELISM", defaults.parallelism)?,
        };
        password.params()?;

        Ok(Self {
            database_url,
            listen_addr,
            static_dir,
            cookie_secret,
            session_ttl,
            login_floor,
            session_sweep_interval,
            shutdown_grace,
            password,
        })
    }
}

fn parse_var<T>(key: &str, default: impl Display) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|err| AppError::Config(format!("invalid {key}: {err}")))
}

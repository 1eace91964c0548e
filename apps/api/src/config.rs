use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::layout::{Colour, FitOptions, FontFamily, PageBox, RenderTheme};

/// Application configuration loaded from environment variables.
/// Startup fails on unparsable values or fit options the renderer cannot honour.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset → records live in the in-memory store.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub fit: FitOptions,
    pub fit_debounce: Duration,
    /// Sessions untouched for this long are closed.
    pub session_idle_timeout: Duration,
    pub export_raster_scale: f32,
    pub theme: RenderTheme,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = FitOptions::default();
        let fit = FitOptions {
            max_scale: env_or("FIT_MAX_SCALE", defaults.max_scale)?,
            min_scale: env_or("FIT_MIN_SCALE", defaults.min_scale)?,
            step: env_or("FIT_STEP", defaults.step)?,
            margin_reserve: env_or("FIT_MARGIN_RESERVE_PX", defaults.margin_reserve)?,
        };
        fit.validate(&PageBox::A4).context("Invalid FIT_* configuration")?;

        let export_raster_scale: f32 = env_or("EXPORT_RASTER_SCALE", 2.0)?;
        if !(export_raster_scale > 0.0) {
            return Err(anyhow!(
                "EXPORT_RASTER_SCALE must be positive, got {export_raster_scale}"
            ));
        }

        let idle_secs: u64 = env_or("SESSION_IDLE_TIMEOUT_SECS", 1800)?;
        if idle_secs == 0 {
            return Err(anyhow!("SESSION_IDLE_TIMEOUT_SECS must be positive"));
        }

        let mut theme = RenderTheme::default();
        if let Some(font) = optional_env("RENDER_FONT") {
            theme.font = FontFamily::from_str(&font).map_err(|e| anyhow!("RENDER_FONT: {e}"))?;
        }
        if let Some(accent) = optional_env("RENDER_ACCENT") {
            theme.accent = Colour::from_hex(&accent)
                .with_context(|| format!("RENDER_ACCENT must be #rrggbb, got '{accent}'"))?;
        }

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            fit,
            fit_debounce: Duration::from_millis(env_or("FIT_DEBOUNCE_MS", 100)?),
            session_idle_timeout: Duration::from_secs(idle_secs),
            export_raster_scale,
            theme,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            port: 8080,
            rust_log: "info".to_string(),
            fit: FitOptions::default(),
            fit_debounce: Duration::from_millis(100),
            session_idle_timeout: Duration::from_secs(1800),
            export_raster_scale: 2.0,
            theme: RenderTheme::default(),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}

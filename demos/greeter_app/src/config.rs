// greeter_app/src/config.rs

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  /// Salutation prefixed to every greeting, e.g. "Hello".
  pub salutation: String,
  /// Uppercase the whole greeting before returning it.
  pub shout: bool,
  /// Budget for async dispatches before they are cancelled, in milliseconds.
  pub dispatch_budget_ms: u64,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let salutation = env::var("GREETER_SALUTATION").unwrap_or_else(|_| "Hello".to_string());
    let shout = env::var("GREETER_SHOUT")
      .map(|raw| raw == "1" || raw.eq_ignore_ascii_case("true"))
      .unwrap_or(false);
    let dispatch_budget_ms = env::var("GREETER_DISPATCH_BUDGET_MS")
      .unwrap_or_else(|_| "250".to_string())
      .parse::<u64>()
      .context("Invalid GREETER_DISPATCH_BUDGET_MS")?;

    Ok(Self {
      salutation,
      shout,
      dispatch_budget_ms,
    })
  }
}

// greeter_app/src/state.rs

use crate::config::AppConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared application state handed to every handler at registration time.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub visits: Arc<Mutex<HashMap<String, u64>>>,
}

impl AppState {
  pub fn new(config: AppConfig) -> Self {
    Self {
      config: Arc::new(config),
      visits: Arc::new(Mutex::new(HashMap::new())),
    }
  }
}

use serde_derive::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
  pub ip: String,
  pub port: u16,
  pub db: PathBuf,
  pub static_path: Option<PathBuf>,
  pub media_path: PathBuf,
  pub media_url_prefix: String,
  // the single privileged identity; may delete any memo or comment, and pin.
  pub admin_id: i64,
  pub login_token_expiration_ms: Option<i64>,
  pub open_registration: bool,
  pub smtp: Option<SmtpConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SmtpConfig {
  pub relay: String,
  pub from: String,
  pub mainsite: String,
}

use actix_web::error as awe;
use lettre;
use lettre::transport::smtp as lts;
use mtprotocol::constants::ResultCode;
use rusqlite;
use serde_json;
use std::fmt;

pub enum Error {
  Rusqlite(rusqlite::Error),
  SystemTimeError(std::time::SystemTimeError),
  String(String),
  ActixError(awe::Error),
  SerdeJson(serde_json::Error),
  IoError(std::io::Error),
  LettreError(lettre::error::Error),
  LettreSmtpError(lts::Error),
  AddressError(lettre::address::AddressError),
  ParamError(String),
  NotLoggedIn,
  LoginFailed,
  Forbidden(String),
  MemoNotFound(i64),
  MemoIsPrivate(i64),
  CommentNotFound(i64),
  UserNotFound(String),
}

// wire code for an error; the boundary puts this in the result envelope.
pub fn result_code(e: &Error) -> ResultCode {
  match e {
    Error::ParamError(_) => ResultCode::ParamError,
    Error::NotLoggedIn => ResultCode::TokenMissing,
    Error::Forbidden(_) => ResultCode::Forbidden,
    Error::MemoIsPrivate(_) => ResultCode::Forbidden,
    Error::MemoNotFound(_) => ResultCode::NotFound,
    Error::CommentNotFound(_) => ResultCode::NotFound,
    Error::UserNotFound(_) => ResultCode::NotFound,
    _ => ResultCode::Fail,
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    None
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self {
      Error::Rusqlite(rue) => write!(f, "{}", rue),
      Error::SystemTimeError(e) => write!(f, "{}", e),
      Error::String(e) => write!(f, "{}", e),
      Error::ActixError(e) => write!(f, "{}", e),
      Error::SerdeJson(e) => write!(f, "{}", e),
      Error::IoError(e) => write!(f, "{}", e),
      Error::LettreError(e) => write!(f, "{}", e),
      Error::LettreSmtpError(e) => write!(f, "{}", e),
      Error::AddressError(e) => write!(f, "{}", e),
      Error::ParamError(e) => write!(f, "bad parameter: {}", e),
      Error::NotLoggedIn => write!(f, "not logged in"),
      Error::LoginFailed => write!(f, "login failed"),
      Error::Forbidden(e) => write!(f, "forbidden: {}", e),
      Error::MemoNotFound(id) => write!(f, "memo not found: {}", id),
      Error::MemoIsPrivate(id) => write!(f, "memo is private: {}", id),
      Error::CommentNotFound(id) => write!(f, "comment not found: {}", id),
      Error::UserNotFound(name) => write!(f, "user not found: {}", name),
    }
  }
}

impl fmt::Debug for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self)
  }
}

impl From<rusqlite::Error> for Error {
  fn from(error: rusqlite::Error) -> Self {
    Error::Rusqlite(error)
  }
}

impl From<std::time::SystemTimeError> for Error {
  fn from(error: std::time::SystemTimeError) -> Self {
    Error::SystemTimeError(error)
  }
}

impl From<String> for Error {
  fn from(s: String) -> Self {
    Error::String(s)
  }
}

impl From<&str> for Error {
  fn from(s: &str) -> Self {
    Error::String(s.to_string())
  }
}

impl From<awe::Error> for Error {
  fn from(e: awe::Error) -> Self {
    Error::ActixError(e)
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Error::SerdeJson(e)
  }
}

impl From<std::io::Error> for Error {
  fn from(e: std::io::Error) -> Self {
    Error::IoError(e)
  }
}

impl From<lettre::error::Error> for Error {
  fn from(e: lettre::error::Error) -> Self {
    Error::LettreError(e)
  }
}

impl From<lts::Error> for Error {
  fn from(e: lts::Error) -> Self {
    Error::LettreSmtpError(e)
  }
}

impl From<lettre::address::AddressError> for Error {
  fn from(e: lettre::address::AddressError) -> Self {
    Error::AddressError(e)
  }
}

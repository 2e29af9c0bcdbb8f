pub mod access;
pub mod config;
pub mod error;
pub mod interfaces;
mod migrations;
pub mod notify;
pub mod search;
pub mod sqldata;
mod sqltest;
pub mod util;

use crate::access::Requester;
use crate::config::Config;
use crate::error as mterr;
use actix_cors::Cors;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use log::{error, info};
use mtprotocol::constants::ResultCode;
use mtprotocol::messages::{PrivateRequest, PublicRequest, ResultEnvelope, UserRequest};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tracing_actix_web::TracingLogger;

// the auth middleware contract: an opaque token in this header, resolved
// to an optional user before any request logic runs.
pub const TOKEN_HEADER: &str = "X-API-TOKEN";

pub fn ok_envelope<T: Serialize>(data: &T) -> ResultEnvelope {
  match serde_json::to_value(data) {
    Ok(v) => ResultEnvelope {
      code: ResultCode::Ok.num(),
      msg: None,
      data: Some(v),
    },
    Err(e) => err_envelope(&mterr::Error::SerdeJson(e)),
  }
}

pub fn err_envelope(e: &mterr::Error) -> ResultEnvelope {
  ResultEnvelope {
    code: mterr::result_code(e).num(),
    msg: Some(e.to_string()),
    data: None,
  }
}

fn token_for_req(req: &HttpRequest) -> Option<String> {
  req
    .headers()
    .get(TOKEN_HEADER)
    .and_then(|h| h.to_str().ok())
    .map(|s| s.to_string())
}

// on the public surface a missing, bad or expired token just means
// anonymous; visibility narrows accordingly.
fn requester_for_req(
  conn: &Connection,
  config: &Config,
  req: &HttpRequest,
) -> Result<Requester, mterr::Error> {
  match token_for_req(req) {
    None => Ok(Requester::Anonymous),
    Some(token) => Ok(
      match sqldata::read_user_by_token(
        &conn,
        token.as_str(),
        config.login_token_expiration_ms,
      )? {
        Some(uid) => Requester::User(uid),
        None => Requester::Anonymous,
      },
    ),
  }
}

async fn public(
  data: web::Data<Config>,
  item: web::Json<PublicRequest>,
  req: HttpRequest,
) -> HttpResponse {
  let msg = item.into_inner();
  info!(
    "public msg: {:?} connection_info: {:?}",
    &msg,
    req.connection_info()
  );

  let reply = (|| {
    let conn = sqldata::connection_open(data.db.as_path())?;
    let requester = requester_for_req(&conn, &data, &req)?;
    interfaces::public_interface(&data, &conn, &requester, &msg)
  })();

  match reply {
    Ok(sr) => HttpResponse::Ok().json(ok_envelope(&sr)),
    Err(e) => {
      error!("'public' err: {:?}", e);
      HttpResponse::Ok().json(err_envelope(&e))
    }
  }
}

async fn private(
  data: web::Data<Config>,
  item: web::Json<PrivateRequest>,
  req: HttpRequest,
) -> HttpResponse {
  let msg = item.into_inner();

  let reply = (|| {
    let conn = sqldata::connection_open(data.db.as_path())?;
    let requester = match token_for_req(&req) {
      None => return Err(mterr::Error::NotLoggedIn),
      Some(token) => match sqldata::read_user_by_token(
        &conn,
        token.as_str(),
        data.login_token_expiration_ms,
      )? {
        Some(uid) => Requester::User(uid),
        None => return Err(mterr::Error::NotLoggedIn),
      },
    };
    interfaces::private_interface(&data, &conn, &requester, &msg)
  })();

  match reply {
    Ok(sr) => HttpResponse::Ok().json(ok_envelope(&sr)),
    Err(e) => {
      error!("'private' err: {:?}", e);
      HttpResponse::Ok().json(err_envelope(&e))
    }
  }
}

async fn user(
  data: web::Data<Config>,
  item: web::Json<UserRequest>,
  req: HttpRequest,
) -> HttpResponse {
  let msg = item.into_inner();

  let reply = (|| {
    let conn = sqldata::connection_open(data.db.as_path())?;
    let token = token_for_req(&req);
    let requester = requester_for_req(&conn, &data, &req)?;
    interfaces::user_interface(&data, &conn, &requester, token.as_deref(), &msg)
  })();

  match reply {
    Ok(sr) => HttpResponse::Ok().json(ok_envelope(&sr)),
    Err(e) => {
      error!("'user' err: {:?}", e);
      HttpResponse::Ok().json(err_envelope(&e))
    }
  }
}

pub async fn run_server(config: Config) -> Result<(), Box<dyn Error>> {
  sqldata::dbinit(config.db.as_path(), config.login_token_expiration_ms)?;

  // expired tokens get purged once a day, same cadence as startup.
  let timer = timer::Timer::new();
  let ptconfig = config.clone();
  let _guard = timer.schedule_repeating(chrono::Duration::days(1), move || {
    match sqldata::connection_open(ptconfig.db.as_path())
      .and_then(|conn| sqldata::purge_login_tokens(&conn, ptconfig.login_token_expiration_ms))
    {
      Err(e) => error!("purge_login_tokens error: {}", e),
      Ok(_) => (),
    }
  });

  info!("server init: {}:{}", config.ip, config.port);

  let c = config.clone();
  HttpServer::new(move || {
    let staticpath = c.static_path.clone().unwrap_or(PathBuf::from("static/"));

    App::new()
      .app_data(web::Data::new(c.clone()))
      .wrap(Cors::permissive())
      .wrap(TracingLogger::default())
      .service(web::resource("/public").route(web::post().to(public)))
      .service(web::resource("/private").route(web::post().to(private)))
      .service(web::resource("/user").route(web::post().to(user)))
      .service(actix_files::Files::new(
        c.media_url_prefix.as_str(),
        c.media_path.clone(),
      ))
      .service(actix_files::Files::new("/static/", staticpath))
  })
  .bind(format!("{}:{}", config.ip, config.port))?
  .run()
  .await?;

  Ok(())
}

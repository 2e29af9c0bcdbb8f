use clap::Arg;
use log::{error, info};
use moments_server_lib::config::Config;
use moments_server_lib::{run_server, util};
use std::error::Error;
use std::path::PathBuf;

fn defcon() -> Config {
  Config {
    ip: "127.0.0.1".to_string(),
    port: 8010,
    db: PathBuf::from("./moments.db"),
    static_path: None,
    media_path: PathBuf::from("./media"),
    media_url_prefix: "/media/".to_string(),
    admin_id: 1,
    login_token_expiration_ms: Some(7 * 24 * 60 * 60 * 1000), // 7 days
    open_registration: true,
    smtp: None,
  }
}

fn load_config(filename: &str) -> Result<Config, Box<dyn Error>> {
  info!("loading config: {}", filename);
  let c = toml::from_str(util::load_string(filename)?.as_str())?;
  Ok(c)
}

fn main() {
  match err_main() {
    Err(e) => error!("error: {:?}", e),
    Ok(_) => (),
  }
}

#[actix_web::main]
async fn err_main() -> Result<(), Box<dyn Error>> {
  env_logger::init();

  let matches = clap::App::new("moments server")
    .version("1.0")
    .about("personal moments feed server")
    .arg(
      Arg::with_name("config")
        .short("c")
        .long("config")
        .value_name("FILE")
        .help("specify config file")
        .takes_value(true),
    )
    .arg(
      Arg::with_name("write_config")
        .short("w")
        .long("write_config")
        .value_name("FILE")
        .help("write default config file")
        .takes_value(true),
    )
    .get_matches();

  // writing a config file?
  match matches.value_of("write_config") {
    Some(filename) => {
      util::write_string(filename, toml::to_string_pretty(&defcon())?.as_str())?;
      info!("default config written to file: {}", filename);
      Ok(())
    }
    None => {
      // specifying a config file?  otherwise try to load the default.
      let config = match matches.value_of("config") {
        Some(filename) => load_config(filename)?,
        None => load_config("config.toml")?,
      };

      if !std::path::Path::exists(&config.media_path) {
        std::fs::create_dir_all(&config.media_path)?
      }

      info!("config parameters:\n\n{}", toml::to_string_pretty(&config)?);

      run_server(config).await
    }
  }
}

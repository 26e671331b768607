//! application entry point

use crate::server::model::config::{Env, ServerConfig};
use log::info;
use std::env;
use std::path::Path;

mod server;

const DOTENV_LOADING_FAILED_MSG: &str = "failed to load envs from dotenv files, aborting";
const CONFIG_FAILED_MSG: &str = "failed to build server config, aborting";

#[actix_web::main()]
async fn main() -> std::io::Result<()> {
    // bootstrap
    // a. env
    let env = env::var("APP_ENV")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(Env::Dev); // default dev env if absent

    match env {
        Env::Prod | Env::Stg => {} // loaded in CI
        Env::Dev => dotenvy::from_path(Path::new(".env.dev")).expect(DOTENV_LOADING_FAILED_MSG),
    };

    // b. logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // c. run app
    let config = ServerConfig::from_env().expect(CONFIG_FAILED_MSG);

    info!("App is starting in env={}", env);

    server::run(config).await
}

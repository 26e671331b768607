//! server assembly: pools, shared state, routes, and the background sweeper

pub(crate) mod controller;
pub(crate) mod database;
pub(crate) mod floorplan;
pub(crate) mod gateway;
pub(crate) mod model;
pub(crate) mod scheduler;
pub(crate) mod state;
pub(crate) mod util;

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::server::controller::booking::{get_bookings, patch_booking, post_booking};
use crate::server::controller::table::{
    delete_table, get_tables, patch_availability, patch_position, post_tables,
};
use crate::server::database::pool::{Pool, DEFAULT_POOL_SIZE};
use crate::server::gateway::postgres::PgGateway;
use crate::server::model::config::ServerConfig;
use crate::server::scheduler::job::booking_sweeper;
use crate::server::state::AppState;

/// Run the server and the sweeper until the server exits.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let (read_pool, write_pool) = (Pool::new("read"), Pool::new("write"));
    read_pool
        .init(config.db_read_conn_str.as_str(), DEFAULT_POOL_SIZE)
        .await
        .map_err(std::io::Error::other)?;
    write_pool
        .init(config.db_write_conn_str.as_str(), DEFAULT_POOL_SIZE)
        .await
        .map_err(std::io::Error::other)?;

    let gateway = PgGateway::new(read_pool, write_pool);
    let cancel_token = CancellationToken::new();
    let sweeper = tokio::spawn(booking_sweeper(gateway.clone(), cancel_token.clone()));

    let data = web::Data::new(AppState::new(gateway));
    let result = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(data.clone())
            .service(get_tables)
            .service(post_tables)
            .service(patch_position)
            .service(patch_availability)
            .service(delete_table)
            .service(post_booking)
            .service(get_bookings)
            .service(patch_booking)
    })
    .bind(config.addr)?
    .run()
    .await;

    info!("server stopped, draining the sweeper");
    cancel_token.cancel();
    sweeper.await.ok();
    result
}

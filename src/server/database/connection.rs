use anyhow::{Context, Error};
use log::error;
use tokio_postgres::{Client, NoTls};

/// Open one client connection and drive its socket on a background task.
pub(crate) async fn connect(conn_str: &str) -> Result<Client, Error> {
    let (client, conn) = tokio_postgres::connect(conn_str, NoTls)
        .await
        .context("failed to create connection")?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            error!("connection returned error and aborted, {}", e);
        }
    });
    Ok(client)
}

//! Hand-rolled FIFO pool of postgres connections.

use anyhow::Error;
use log::{error, info};
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tokio_postgres::Client;

use crate::server::database::connection::connect;

pub(crate) const DEFAULT_POOL_SIZE: usize = 10;

/// Connections are handed out front-of-queue; a checked-out connection rides
/// a [`PooledConn`] guard and rejoins the back of the queue when dropped.
pub(crate) struct Pool<C = Client> {
    name: &'static str,
    inner: Arc<Mutex<VecDeque<C>>>,
}

impl<C> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: self.inner.clone(),
        }
    }
}

impl<C> Pool<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(DEFAULT_POOL_SIZE))),
        }
    }

    /// Pop a connection if one is free. `None` means the pool is exhausted;
    /// callers report busy instead of queueing.
    pub fn acquire(&self) -> Option<PooledConn<C>> {
        let client = self
            .inner
            .lock()
            .expect("pool lock poisoned")
            .pop_front()?;
        Some(PooledConn {
            client: Some(client),
            pool: self.clone(),
        })
    }

    fn release(&self, client: C) {
        self.inner
            .lock()
            .expect("pool lock poisoned")
            .push_back(client);
    }
}

impl Pool<Client> {
    /// Establish `size` connections concurrently and seed the queue.
    pub async fn init(&self, conn_str: &str, size: usize) -> Result<(), Error> {
        let mut set = JoinSet::new();
        for _ in 0..size {
            let str = conn_str.to_string();
            set.spawn(async move { connect(str.as_str()).await });
        }
        let mut connections = VecDeque::with_capacity(size);
        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(client)) => {
                    info!("pool={} connection created", self.name);
                    connections.push_back(client);
                }
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    error!("pool={} join_next failed when joining, {}", self.name, e);
                }
            }
        }
        self.inner
            .lock()
            .expect("pool lock poisoned")
            .append(&mut connections);
        Ok(())
    }
}

pub(crate) struct PooledConn<C = Client> {
    client: Option<C>,
    pool: Pool<C>,
}

impl<C> Deref for PooledConn<C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.client.as_ref().expect("connection already released")
    }
}

impl<C> Drop for PooledConn<C> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.release(client);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_has_nothing_to_acquire() {
        let pool = Pool::<u8>::new("test");
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn acquire_and_release_cycles_fifo() {
        let pool = Pool::<u8>::new("test");
        pool.release(1);
        pool.release(2);

        {
            let first = pool.acquire().expect("should get some");
            assert_eq!(*first, 1);
            let second = pool.acquire().expect("should get some");
            assert_eq!(*second, 2);
            assert!(pool.acquire().is_none());
        } // guards drop in reverse order here, connections return to the pool

        let reacquired = pool.acquire().expect("should get some");
        assert_eq!(*reacquired, 2);
        assert!(pool.acquire().is_some());
    }
}

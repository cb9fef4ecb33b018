use futures::FutureExt;
use redis::aio::{ConnectionLike, MultiplexedConnection};
use redis::{Cmd, Pipeline, RedisFuture, RedisResult, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{trace, warn};

const RETRY_INTERVAL: Duration = Duration::from_secs(2);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

pub(super) type SharedConnection = Arc<Mutex<Option<MultiplexedConnection>>>;

/// Invalidates the shared connection when a command fails due to connection issues.
macro_rules! invalidate_if_disconnected {
    ($self:expr, $result:expr) => {
        if let Err(ref e) = $result {
            if e.is_connection_dropped()
                || e.is_io_error()
                || e.is_connection_refusal()
                || e.is_timeout()
            {
                warn!(error = %e, "Lost connection to redis, reconnecting on next use");
                $self.shared.lock().await.take();
            }
        }
    };
}

/// Multiplexed redis connection which drops itself from the shared slot once it breaks
pub struct MonitoredConnection {
    con: MultiplexedConnection,
    shared: SharedConnection,
}

impl MonitoredConnection {
    pub(super) fn new(con: MultiplexedConnection, shared: SharedConnection) -> Self {
        Self { con, shared }
    }
}

impl ConnectionLike for MonitoredConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        (async move {
            let result = self.con.req_packed_command(cmd).await;

            match result {
                Ok(ref value) => trace!(?value, "Redis RECV"),
                Err(ref error) => trace!(?error, "Redis RECV failed"),
            }

            invalidate_if_disconnected!(self, result);
            result
        })
        .boxed()
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        (async move {
            let result = self.con.req_packed_commands(cmd, offset, count).await;
            invalidate_if_disconnected!(self, result);
            result
        })
        .boxed()
    }

    fn get_db(&self) -> i64 {
        self.con.get_db()
    }
}

/// Repeatedly attempts to connect until it succeeds, only warning about the first failure
pub(super) async fn connect_with_retry<C, F, Fut>(connect: F) -> C
where
    F: Fn() -> Fut,
    Fut: Future<Output = RedisResult<C>>,
{
    let mut warn = true;

    loop {
        match timeout(CONNECT_TIMEOUT, connect()).await {
            Ok(Ok(connection)) => return connection,
            Ok(Err(e)) if warn => {
                warn = false;
                warn!("Unable to connect to redis server! ({})", e);
            }
            Err(e) if warn => {
                warn = false;
                warn!("Timed out while connecting to redis! ({})", e);
            }
            _ => {}
        }

        sleep(RETRY_INTERVAL).await;
    }
}

//! Store query metrics.
//!
//! Every repository call is timed under a query name. Failed queries are
//! counted separately so unique violations and backend outages show up
//! without grepping logs.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record the duration of one store query.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "store_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Count a failed store query.
pub fn record_query_error(query_name: &str) {
    counter!(
        "store_query_errors_total",
        "query" => query_name.to_string()
    )
    .increment(1);
}

/// Record connection pool gauges. Called periodically from the server.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one store query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_invited_team_by_token");
/// let result = sqlx::query_as::<_, InvitedTeamEntity>(sql).fetch_optional(&pool).await;
/// timer.observe(&result);
/// ```
pub struct QueryTimer {
    query_name: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(&self.query_name, duration);
    }

    /// Record the elapsed duration and count the query if it failed.
    pub fn observe<T>(self, result: &Result<T, sqlx::Error>) {
        if result.is_err() {
            record_query_error(&self.query_name);
        }
        self.record();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new(String::from("list_invited_teams"));
        assert_eq!(timer.query_name, "list_invited_teams");
    }

    #[test]
    fn test_observe_without_recorder() {
        let ok: Result<(), sqlx::Error> = Ok(());
        QueryTimer::new("get_config").observe(&ok);

        let failed: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        QueryTimer::new("get_config").observe(&failed);
    }
}

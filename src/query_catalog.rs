use crate::error::QueryError;
use crate::types::Row;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tracing::{debug, warn};

// A literal so the channel query can be assembled with `concat!`.
macro_rules! min_channel_signups {
    () => {
        5
    };
}

/// Channels with fewer signups than this in the window are left out of the
/// channel ranking.
pub const MIN_CHANNEL_SIGNUPS: i64 = min_channel_signups!();

/// A read-only aggregate query producing one part of the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamedQuery {
    pub key: &'static str,
    pub description: &'static str,
    pub sql: &'static str,
}

/// Anything that can run a catalog query and hand back decoded rows.
#[async_trait]
pub trait QueryExecutor {
    async fn fetch_rows(&mut self, sql: &str) -> Result<Vec<Row>, QueryError>;
}

#[derive(Clone, Debug)]
pub struct QueryCatalog {
    queries: Vec<NamedQuery>,
}

impl QueryCatalog {
    pub fn new(queries: Vec<NamedQuery>) -> Self {
        Self { queries }
    }

    pub fn iter(self: &Self) -> std::slice::Iter<'_, NamedQuery> {
        self.queries.iter()
    }

    pub fn get(self: &Self, key: &str) -> Option<&NamedQuery> {
        self.queries.iter().find(|query| query.key.eq(key))
    }

    /// The dashboard queries, in report order.
    pub fn saas() -> Self {
        Self::new(vec![
            NamedQuery {
                key: "active_users",
                description: "Active users",
                sql: "SELECT COUNT(*) AS count FROM users WHERE status = 'active'",
            },
            NamedQuery {
                key: "paid_subscribers",
                description: "Paid subscribers",
                sql: "SELECT COUNT(*) AS count FROM subscriptions \
                      WHERE status = 'active' AND plan_id != 1",
            },
            NamedQuery {
                key: "recurring_revenue",
                description: "Current MRR",
                sql: "SELECT billing_cycle, SUM(mrr) AS amount \
                      FROM subscriptions \
                      WHERE status = 'active' \
                      GROUP BY billing_cycle \
                      ORDER BY billing_cycle",
            },
            NamedQuery {
                key: "conversion",
                description: "Conversion rate",
                sql: "SELECT COUNT(DISTINCT u.id) AS total_users, \
                             COUNT(DISTINCT CASE WHEN s.plan_id != 1 THEN u.id END) AS paid_users \
                      FROM users u \
                      LEFT JOIN subscriptions s ON u.id = s.user_id AND s.status = 'active'",
            },
            NamedQuery {
                key: "plan_revenue",
                description: "Plan revenue",
                sql: "SELECT p.name AS plan, \
                             COUNT(re.id) AS transactions, \
                             SUM(re.amount) AS revenue \
                      FROM revenue_events re \
                      JOIN subscriptions s ON re.subscription_id = s.id \
                      JOIN plans p ON s.plan_id = p.id \
                      WHERE re.occurred_at >= CURRENT_DATE - INTERVAL '30 days' \
                        AND re.event_type = 'payment' \
                      GROUP BY p.name \
                      ORDER BY revenue DESC",
            },
            NamedQuery {
                key: "user_growth",
                description: "User growth",
                sql: "SELECT DATE_TRUNC('month', created_at)::timestamp AS month, \
                             COUNT(*) AS new_users, \
                             COUNT(activated_at) AS activated_users \
                      FROM users \
                      WHERE created_at >= CURRENT_DATE - INTERVAL '6 months' \
                      GROUP BY DATE_TRUNC('month', created_at) \
                      ORDER BY month DESC \
                      LIMIT 6",
            },
            NamedQuery {
                key: "channel_performance",
                description: "Channel performance",
                sql: concat!(
                    "SELECT u.signup_channel, \
                            COUNT(u.id) AS total_signups, \
                            COUNT(CASE WHEN s.plan_id != 1 THEN 1 END) AS paid_conversions \
                     FROM users u \
                     LEFT JOIN subscriptions s ON u.id = s.user_id AND s.status = 'active' \
                     WHERE u.created_at >= CURRENT_DATE - INTERVAL '90 days' \
                     GROUP BY u.signup_channel \
                     HAVING COUNT(u.id) >= ",
                    min_channel_signups!(),
                    " ORDER BY COUNT(CASE WHEN s.plan_id != 1 THEN 1 END) * 100.0 \
                       / COUNT(u.id) DESC"
                ),
            },
            NamedQuery {
                key: "recent_signups",
                description: "Recent signups",
                sql: "SELECT COUNT(*) AS count FROM users \
                      WHERE created_at >= CURRENT_DATE - INTERVAL '7 days'",
            },
            NamedQuery {
                key: "recent_upgrades",
                description: "Recent upgrades",
                sql: "SELECT COUNT(*) AS count FROM subscriptions \
                      WHERE plan_id != 1 AND started_at >= CURRENT_DATE - INTERVAL '7 days'",
            },
            NamedQuery {
                key: "recent_cancellations",
                description: "Recent churn",
                sql: "SELECT COUNT(*) AS count FROM subscriptions \
                      WHERE status = 'cancelled' AND cancelled_at >= CURRENT_DATE - INTERVAL '7 days'",
            },
            NamedQuery {
                key: "recent_projects",
                description: "Projects created",
                sql: "SELECT COUNT(*) AS count FROM projects \
                      WHERE created_at >= CURRENT_DATE - INTERVAL '7 days'",
            },
        ])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    pub query: NamedQuery,
    pub outcome: QueryOutcome,
}

/// Everything one dashboard run captured, in catalog order.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricSnapshot {
    pub generated_at: NaiveDateTime,
    pub results: Vec<QueryResult>,
}

impl MetricSnapshot {
    pub fn result(self: &Self, key: &str) -> Option<&QueryResult> {
        self.results.iter().find(|result| result.query.key.eq(key))
    }

    /// Rows of a successful query; empty when it failed or never ran.
    pub fn rows(self: &Self, key: &str) -> &[Row] {
        match self.result(key).map(|result| &result.outcome) {
            Some(QueryOutcome::Rows(rows)) => rows,
            _ => &[],
        }
    }

    pub fn failures(self: &Self) -> Vec<&QueryResult> {
        self.results
            .iter()
            .filter(|result| matches!(result.outcome, QueryOutcome::Failed(_)))
            .collect()
    }
}

/// Runs every query in order. A failing query is recorded and skipped so the
/// rest of the report still gets computed.
pub async fn run_catalog<E>(executor: &mut E, catalog: &QueryCatalog) -> MetricSnapshot
where
    E: QueryExecutor + Send + ?Sized,
{
    let mut results = Vec::with_capacity(catalog.iter().len());

    for query in catalog.iter() {
        debug!(query = query.key, "running query");

        let outcome = match executor.fetch_rows(query.sql).await {
            Ok(rows) => {
                debug!(query = query.key, rows = rows.len(), "query finished");
                QueryOutcome::Rows(rows)
            }
            Err(err) => {
                warn!(query = query.key, error = %err, "query failed, skipping section");
                QueryOutcome::Failed(err.to_string())
            }
        };

        results.push(QueryResult {
            query: *query,
            outcome,
        });
    }

    MetricSnapshot {
        generated_at: Local::now().naive_local(),
        results,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::Scalar;
    use std::collections::{HashMap, HashSet};

    /// Serves canned rows per SQL text; queries listed in `failing` error.
    #[derive(Default)]
    pub(crate) struct CannedExecutor {
        pub responses: HashMap<&'static str, Vec<Row>>,
        pub failing: HashSet<&'static str>,
        pub executed: Vec<String>,
    }

    impl CannedExecutor {
        pub fn respond(mut self, key: &str, rows: Vec<Row>) -> Self {
            let sql = QueryCatalog::saas().get(key).unwrap().sql;
            self.responses.insert(sql, rows);
            self
        }

        pub fn fail(mut self, key: &str) -> Self {
            let sql = QueryCatalog::saas().get(key).unwrap().sql;
            self.failing.insert(sql);
            self
        }
    }

    #[async_trait]
    impl QueryExecutor for CannedExecutor {
        async fn fetch_rows(&mut self, sql: &str) -> Result<Vec<Row>, QueryError> {
            self.executed.push(sql.to_string());

            if self.failing.contains(sql) {
                return Err(QueryError::Database(sqlx::Error::Protocol(
                    "relation does not exist".into(),
                )));
            }

            Ok(self.responses.get(sql).cloned().unwrap_or_default())
        }
    }

    pub(crate) fn row(values: &[(&str, Scalar)]) -> Row {
        values
            .iter()
            .map(|(label, value)| (label.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_catalog_keys_are_unique_and_ordered() {
        let catalog = QueryCatalog::saas();
        let keys: Vec<&str> = catalog.iter().map(|query| query.key).collect();
        let unique: HashSet<&str> = keys.iter().copied().collect();

        assert_eq!(keys.len(), unique.len());
        assert_eq!(keys.first(), Some(&"active_users"));
        assert_eq!(keys.last(), Some(&"recent_projects"));
    }

    /// Answers `SELECT COUNT(*) ... FROM users [WHERE status = '...']` from
    /// an in-memory list of user statuses.
    struct UserStatusExecutor {
        statuses: Vec<&'static str>,
    }

    #[async_trait]
    impl QueryExecutor for UserStatusExecutor {
        async fn fetch_rows(&mut self, sql: &str) -> Result<Vec<Row>, QueryError> {
            if !sql.starts_with("SELECT COUNT(*) AS count FROM users") {
                return Ok(vec![]);
            }

            let count = match sql.split_once("WHERE status = '") {
                Some((_, rest)) => {
                    let wanted = rest.split('\'').next().unwrap_or_default();
                    self.statuses.iter().filter(|status| **status == wanted).count()
                }
                None => self.statuses.len(),
            };

            Ok(vec![row(&[("count", Scalar::Integer(count as i64))])])
        }
    }

    #[tokio::test]
    async fn test_active_users_counts_only_active_status() {
        let mut executor = UserStatusExecutor {
            statuses: vec!["active", "inactive", "active", "suspended", "active", "inactive"],
        };

        let snapshot = run_catalog(&mut executor, &QueryCatalog::saas()).await;

        assert_eq!(
            snapshot.rows("active_users")[0].get("count"),
            Some(&Scalar::Integer(3))
        );
        // The same table without the status filter.
        assert_eq!(
            snapshot.rows("recent_signups")[0].get("count"),
            Some(&Scalar::Integer(6))
        );
    }

    #[test]
    fn test_user_growth_months_stay_in_session_time_zone() {
        let sql = QueryCatalog::saas().get("user_growth").unwrap().sql;

        assert!(sql.starts_with("SELECT DATE_TRUNC('month', created_at)::timestamp AS month"));
    }

    #[test]
    fn test_channel_ranking_uses_minimum_signups() {
        let sql = QueryCatalog::saas().get("channel_performance").unwrap().sql;

        let having = format!("HAVING COUNT(u.id) >= {} ORDER BY", MIN_CHANNEL_SIGNUPS);

        assert!(sql.contains(&having), "{}", sql);
    }

    #[tokio::test]
    async fn test_runs_queries_in_catalog_order() {
        let catalog = QueryCatalog::saas();
        let mut executor = CannedExecutor::default();

        let snapshot = run_catalog(&mut executor, &catalog).await;

        let expected: Vec<String> = catalog.iter().map(|query| query.sql.to_string()).collect();
        assert_eq!(executor.executed, expected);
        assert_eq!(snapshot.results.len(), catalog.iter().len());
        assert!(snapshot.failures().is_empty());
    }

    #[tokio::test]
    async fn test_failed_query_does_not_stop_the_report() {
        let mut executor = CannedExecutor::default()
            .fail("paid_subscribers")
            .respond("recent_projects", vec![row(&[("count", Scalar::Integer(4))])]);

        let snapshot = run_catalog(&mut executor, &QueryCatalog::saas()).await;

        let failures = snapshot.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].query.description, "Paid subscribers");
        assert!(snapshot.rows("paid_subscribers").is_empty());
        assert_eq!(
            snapshot.rows("recent_projects")[0].get("count"),
            Some(&Scalar::Integer(4))
        );
    }
}

use crate::config::Settings;
use crate::database::Session;
use crate::error::ReportError;
use crate::query_catalog::{run_catalog, MetricSnapshot, QueryCatalog};
use crate::report::{build_report, Report};
use tracing::info;

/// Connects, runs the catalog and releases the connection. Query failures
/// are captured in the snapshot; only a failed connection is an error here.
pub async fn collect_metrics(
    settings: &Settings,
    catalog: &QueryCatalog,
) -> Result<MetricSnapshot, ReportError> {
    let mut session = Session::connect(&settings.database).await?;

    let snapshot = run_catalog(&mut session, catalog).await;
    session.close().await;

    info!(
        queries = snapshot.results.len(),
        failed = snapshot.failures().len(),
        "metrics collected"
    );

    Ok(snapshot)
}

pub async fn run_dashboard(settings: &Settings) -> Result<Report, ReportError> {
    let snapshot = collect_metrics(settings, &QueryCatalog::saas()).await?;

    Ok(build_report(&snapshot))
}

/// With `fail_on_query_error`, a report missing any section is an error.
pub fn check_sections(report: &Report, fail_on_query_error: bool) -> Result<(), ReportError> {
    if fail_on_query_error && report.failed_queries > 0 {
        return Err(ReportError::SectionsFailed {
            failed: report.failed_queries,
            total: QueryCatalog::saas().iter().len(),
        });
    }

    Ok(())
}

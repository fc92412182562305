use crate::formatter::{
    format_currency, format_month, format_number, format_percentage, humanize_label,
};
use crate::metrics::{annual_recurring_revenue, monthly_recurring_revenue, percentage};
use crate::query_catalog::{MetricSnapshot, QueryOutcome};
use crate::types::Row;
use chrono::NaiveDateTime;
use serde_derive::Serialize;
use std::io::{self, Write};

const RULE_WIDTH: usize = 60;
const LABEL_WIDTH: usize = 35;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MetricLine {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub errors: Vec<String>,
    pub metrics: Vec<MetricLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: NaiveDateTime,
    pub sections: Vec<ReportSection>,
    pub failed_queries: usize,
}

fn metric(label: impl Into<String>, value: impl Into<String>) -> MetricLine {
    MetricLine {
        label: label.into(),
        value: value.into(),
    }
}

fn int(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(|value| value.as_i64())
}

fn float(row: &Row, column: &str) -> Option<f64> {
    row.get(column).and_then(|value| value.as_f64())
}

fn text<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column)
        .and_then(|value| value.as_text())
        .unwrap_or("unknown")
}

/// Single-value `count` queries; a failed or empty result reads as zero.
fn count(snapshot: &MetricSnapshot, key: &str) -> String {
    format_number(snapshot.rows(key).first().and_then(|row| int(row, "count")))
}

/// Starts a section with an error line for each of `keys` that failed.
struct SectionBuilder {
    section: ReportSection,
}

impl SectionBuilder {
    fn new(snapshot: &MetricSnapshot, title: &str, keys: &[&str]) -> Self {
        let errors = keys
            .iter()
            .filter_map(|key| snapshot.result(key))
            .filter_map(|result| match &result.outcome {
                QueryOutcome::Failed(message) => Some(format!(
                    "Query failed ({}): {}",
                    result.query.description, message
                )),
                QueryOutcome::Rows(_) => None,
            })
            .collect();

        Self {
            section: ReportSection {
                title: title.into(),
                errors,
                metrics: vec![],
            },
        }
    }

    fn push(mut self, line: MetricLine) -> Self {
        self.section.metrics.push(line);
        self
    }

    fn extend(mut self, lines: impl IntoIterator<Item = MetricLine>) -> Self {
        self.section.metrics.extend(lines);
        self
    }

    fn build(self) -> ReportSection {
        self.section
    }
}

fn key_metrics(snapshot: &MetricSnapshot) -> ReportSection {
    let mrr = monthly_recurring_revenue(snapshot.rows("recurring_revenue"));

    let conversion = snapshot.rows("conversion").first().map(|row| {
        percentage(
            float(row, "paid_users").unwrap_or(0.0),
            float(row, "total_users").unwrap_or(0.0),
        )
    });

    SectionBuilder::new(
        snapshot,
        "Key Metrics Overview",
        &["active_users", "paid_subscribers", "recurring_revenue", "conversion"],
    )
    .push(metric("Active Users", count(snapshot, "active_users")))
    .push(metric("Paid Subscribers", count(snapshot, "paid_subscribers")))
    .push(metric("Monthly Recurring Revenue", format_currency(Some(mrr))))
    .push(metric(
        "Annual Recurring Revenue",
        format_currency(Some(annual_recurring_revenue(mrr))),
    ))
    .push(metric("Free-to-Paid Conversion", format_percentage(conversion)))
    .build()
}

fn plan_revenue(snapshot: &MetricSnapshot) -> ReportSection {
    let lines = snapshot.rows("plan_revenue").iter().map(|row| {
        metric(
            format!("{} Plan", humanize_label(text(row, "plan"))),
            format!(
                "{} ({} transactions)",
                format_currency(float(row, "revenue")),
                format_number(int(row, "transactions"))
            ),
        )
    });

    SectionBuilder::new(snapshot, "Revenue by Plan (Last 30 Days)", &["plan_revenue"])
        .extend(lines)
        .build()
}

fn user_growth(snapshot: &MetricSnapshot) -> ReportSection {
    let lines = snapshot.rows("user_growth").iter().map(|row| {
        let month = row
            .get("month")
            .and_then(|value| value.as_timestamp())
            .map(format_month)
            .unwrap_or_else(|| "unknown".into());
        let new_users = int(row, "new_users");
        let activated = int(row, "activated_users");
        let activation_rate = percentage(
            activated.unwrap_or(0) as f64,
            new_users.unwrap_or(0) as f64,
        );

        metric(
            month,
            format!(
                "{} signups, {} activated ({})",
                format_number(new_users),
                format_number(activated),
                format_percentage(Some(activation_rate))
            ),
        )
    });

    SectionBuilder::new(snapshot, "User Growth (Last 6 Months)", &["user_growth"])
        .extend(lines)
        .build()
}

fn channel_performance(snapshot: &MetricSnapshot) -> ReportSection {
    let lines = snapshot.rows("channel_performance").iter().map(|row| {
        let signups = int(row, "total_signups");
        let conversions = int(row, "paid_conversions");
        let rate = percentage(
            conversions.unwrap_or(0) as f64,
            signups.unwrap_or(0) as f64,
        );

        metric(
            humanize_label(text(row, "signup_channel")),
            format!(
                "{} signups → {} paid ({})",
                format_number(signups),
                format_number(conversions),
                format_percentage(Some(rate))
            ),
        )
    });

    SectionBuilder::new(
        snapshot,
        "Top Performing Acquisition Channels",
        &["channel_performance"],
    )
    .extend(lines)
    .build()
}

fn recent_activity(snapshot: &MetricSnapshot) -> ReportSection {
    SectionBuilder::new(
        snapshot,
        "Recent Activity (Last 7 Days)",
        &[
            "recent_signups",
            "recent_upgrades",
            "recent_cancellations",
            "recent_projects",
        ],
    )
    .push(metric("New Signups", count(snapshot, "recent_signups")))
    .push(metric("New Paid Subscriptions", count(snapshot, "recent_upgrades")))
    .push(metric("Cancelled Subscriptions", count(snapshot, "recent_cancellations")))
    .push(metric("Projects Created", count(snapshot, "recent_projects")))
    .build()
}

pub fn build_report(snapshot: &MetricSnapshot) -> Report {
    Report {
        generated_at: snapshot.generated_at,
        sections: vec![
            key_metrics(snapshot),
            plan_revenue(snapshot),
            user_growth(snapshot),
            channel_performance(snapshot),
            recent_activity(snapshot),
        ],
        failed_queries: snapshot.failures().len(),
    }
}

impl Report {
    pub fn section(self: &Self, title: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|section| section.title.eq(title))
    }

    pub fn write_text<W: Write>(self: &Self, out: &mut W) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(out, "🚀 SaaS Analytics Dashboard")?;
        writeln!(
            out,
            "Generated at: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;

        for section in self.sections.iter() {
            writeln!(out)?;
            writeln!(out, "{}", rule)?;
            writeln!(out, "📊 {}", section.title)?;
            writeln!(out, "{}", rule)?;

            for error in section.errors.iter() {
                writeln!(out, "❌ {}", error)?;
            }
            for line in section.metrics.iter() {
                writeln!(
                    out,
                    "  {:<width$} {}",
                    line.label,
                    line.value,
                    width = LABEL_WIDTH
                )?;
            }
        }

        writeln!(out)?;
        writeln!(out, "{}", rule)?;
        if self.failed_queries == 0 {
            writeln!(out, "✅ Dashboard generated successfully!")?;
        } else {
            writeln!(
                out,
                "⚠️  Dashboard generated with {} failed queries",
                self.failed_queries
            )?;
        }
        writeln!(out)?;
        writeln!(out, "💡 Tips:")?;
        writeln!(out, "  • Run `saas-report erd` for the database structure")?;
        writeln!(out, "  • Use pgAdmin or psql for interactive querying")?;
        writeln!(out, "{}", rule)?;
        writeln!(out)?;

        Ok(())
    }

    pub fn write_json<W: Write>(self: &Self, out: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }

    pub fn write<W: Write>(self: &Self, format: ReportFormat, out: &mut W) -> io::Result<()> {
        match format {
            ReportFormat::Text => self.write_text(out),
            ReportFormat::Json => self.write_json(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_catalog::tests::{row, CannedExecutor};
    use crate::query_catalog::{run_catalog, QueryCatalog};
    use crate::types::Scalar;
    use chrono::NaiveDate;

    fn month(year: i32, month: u32) -> Scalar {
        Scalar::Timestamp(
            NaiveDate::from_ymd_opt(year, month, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    fn populated() -> CannedExecutor {
        CannedExecutor::default()
            .respond("active_users", vec![row(&[("count", Scalar::Integer(1250))])])
            .respond("paid_subscribers", vec![row(&[("count", Scalar::Integer(2))])])
            .respond(
                "recurring_revenue",
                vec![
                    row(&[
                        ("billing_cycle", Scalar::from("annual")),
                        ("amount", Scalar::Decimal(1200.0)),
                    ]),
                    row(&[
                        ("billing_cycle", Scalar::from("monthly")),
                        ("amount", Scalar::Decimal(1134.5)),
                    ]),
                ],
            )
            .respond(
                "conversion",
                vec![row(&[
                    ("total_users", Scalar::Integer(8)),
                    ("paid_users", Scalar::Integer(2)),
                ])],
            )
            .respond(
                "plan_revenue",
                vec![row(&[
                    ("plan", Scalar::from("pro")),
                    ("transactions", Scalar::Integer(1200)),
                    ("revenue", Scalar::Decimal(34800.0)),
                ])],
            )
            .respond(
                "user_growth",
                vec![row(&[
                    ("month", month(2026, 9)),
                    ("new_users", Scalar::Integer(0)),
                    ("activated_users", Scalar::Integer(0)),
                ])],
            )
            .respond(
                "channel_performance",
                vec![row(&[
                    ("signup_channel", Scalar::from("paid_search")),
                    ("total_signups", Scalar::Integer(8)),
                    ("paid_conversions", Scalar::Integer(1)),
                ])],
            )
    }

    async fn report_for(mut executor: CannedExecutor) -> Report {
        let snapshot = run_catalog(&mut executor, &QueryCatalog::saas()).await;
        build_report(&snapshot)
    }

    fn value<'a>(report: &'a Report, title: &str, label: &str) -> &'a str {
        report
            .section(title)
            .unwrap()
            .metrics
            .iter()
            .find(|line| line.label == label)
            .map(|line| line.value.as_str())
            .unwrap()
    }

    #[tokio::test]
    async fn test_key_metrics() {
        let report = report_for(populated()).await;
        let title = "Key Metrics Overview";

        assert_eq!(value(&report, title, "Active Users"), "1,250");
        assert_eq!(value(&report, title, "Paid Subscribers"), "2");
        assert_eq!(value(&report, title, "Monthly Recurring Revenue"), "$1,234.50");
        assert_eq!(value(&report, title, "Annual Recurring Revenue"), "$14,814.00");
        assert_eq!(value(&report, title, "Free-to-Paid Conversion"), "25.00%");
    }

    #[tokio::test]
    async fn test_row_sections_are_humanized() {
        let report = report_for(populated()).await;

        assert_eq!(
            value(&report, "Revenue by Plan (Last 30 Days)", "Pro Plan"),
            "$34,800.00 (1,200 transactions)"
        );
        assert_eq!(
            value(&report, "User Growth (Last 6 Months)", "2026-09"),
            "0 signups, 0 activated (0.00%)"
        );
        assert_eq!(
            value(&report, "Top Performing Acquisition Channels", "Paid Search"),
            "8 signups → 1 paid (12.50%)"
        );
    }

    #[tokio::test]
    async fn test_empty_database_reads_as_zero() {
        let report = report_for(
            CannedExecutor::default().respond(
                "conversion",
                vec![row(&[
                    ("total_users", Scalar::Integer(0)),
                    ("paid_users", Scalar::Integer(0)),
                ])],
            ),
        )
        .await;
        let title = "Key Metrics Overview";

        assert_eq!(value(&report, title, "Active Users"), "0");
        assert_eq!(value(&report, title, "Monthly Recurring Revenue"), "$0.00");
        assert_eq!(value(&report, title, "Free-to-Paid Conversion"), "0.00%");
        assert!(report
            .section("Revenue by Plan (Last 30 Days)")
            .unwrap()
            .metrics
            .is_empty());
        assert_eq!(report.failed_queries, 0);
    }

    #[tokio::test]
    async fn test_failed_section_is_reported_in_place() {
        let report = report_for(populated().fail("plan_revenue")).await;

        let plans = report.section("Revenue by Plan (Last 30 Days)").unwrap();
        assert_eq!(plans.errors.len(), 1);
        assert!(plans.errors[0].starts_with("Query failed (Plan revenue)"));
        assert!(plans.metrics.is_empty());

        assert_eq!(value(&report, "Key Metrics Overview", "Active Users"), "1,250");
        assert_eq!(report.failed_queries, 1);
    }

    #[tokio::test]
    async fn test_text_layout() {
        let report = report_for(populated()).await;
        let mut out = Vec::new();
        report.write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains(&format!("{}\n📊 Key Metrics Overview\n", "=".repeat(60))));
        assert!(text.contains(&format!("  {:<35} 1,250\n", "Active Users")));
        assert!(text.contains("✅ Dashboard generated successfully!"));

        let overview = text.find("Key Metrics Overview").unwrap();
        let recent = text.find("Recent Activity (Last 7 Days)").unwrap();
        assert!(overview < recent);
    }

    #[tokio::test]
    async fn test_json_output() {
        let report = report_for(populated()).await;
        let mut out = Vec::new();
        report.write(ReportFormat::Json, &mut out).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["sections"].as_array().unwrap().len(), 5);
        assert_eq!(json["sections"][0]["metrics"][0]["value"], "1,250");
    }
}

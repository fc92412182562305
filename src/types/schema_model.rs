use super::column_meta::ColumnMeta;
use super::foreign_key_meta::ForeignKeyMeta;
use super::table_meta::TableMeta;
use crate::error::SchemaError;
use serde_derive::Serialize;
use std::collections::HashSet;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SchemaModel {
    pub tables: Vec<TableMeta>,
    pub relationships: Vec<ForeignKeyMeta>,
}

impl SchemaModel {
    pub fn table(self: &Self, table_name: &str) -> Option<&TableMeta> {
        self.tables
            .iter()
            .find(|table: &&TableMeta| table.table_name.eq(table_name))
    }

    /// Every relationship must point at declared tables and columns, and
    /// table names must be unique since they become node identifiers.
    pub fn validate(self: &Self) -> Result<(), SchemaError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for table in self.tables.iter() {
            if !seen.insert(table.table_name.as_str()) {
                return Err(SchemaError::DuplicateTable(table.table_name.clone()));
            }
        }

        for fk in self.relationships.iter() {
            let relationship = format!(
                "{}.{} -> {}.{}",
                fk.source_table, fk.source_column, fk.destination_table, fk.destination_column
            );

            for (table_name, column_name) in [
                (&fk.source_table, &fk.source_column),
                (&fk.destination_table, &fk.destination_column),
            ] {
                let table = self.table(table_name).ok_or_else(|| SchemaError::UnknownTable {
                    relationship: relationship.clone(),
                    table: table_name.clone(),
                })?;

                if !table.has_column(column_name) {
                    return Err(SchemaError::UnknownColumn {
                        relationship,
                        table: table_name.clone(),
                        column: column_name.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// The SaaS analytics schema the diagram is drawn from when no live
    /// database is consulted.
    pub fn saas() -> Self {
        let tables = vec![
            TableMeta::new(
                "users",
                vec![
                    ColumnMeta::new("id", "UUID").primary_key(),
                    ColumnMeta::new("email", "VARCHAR(255)").not_null(),
                    ColumnMeta::new("created_at", "TIMESTAMP").not_null(),
                    ColumnMeta::new("activated_at", "TIMESTAMP"),
                    ColumnMeta::new("last_login_at", "TIMESTAMP"),
                    ColumnMeta::new("status", "user_status").not_null(),
                    ColumnMeta::new("signup_channel", "signup_channel").not_null(),
                    ColumnMeta::new("country_code", "VARCHAR(2)"),
                    ColumnMeta::new("utm_source", "VARCHAR(100)"),
                    ColumnMeta::new("utm_medium", "VARCHAR(100)"),
                    ColumnMeta::new("utm_campaign", "VARCHAR(100)"),
                    ColumnMeta::new("referred_by_user_id", "UUID"),
                ],
            ),
            TableMeta::new(
                "plans",
                vec![
                    ColumnMeta::new("id", "SERIAL").primary_key(),
                    ColumnMeta::new("name", "plan_type").not_null(),
                    ColumnMeta::new("price_monthly", "DECIMAL(10,2)").not_null(),
                    ColumnMeta::new("price_annual", "DECIMAL(10,2)").not_null(),
                    ColumnMeta::new("max_projects", "INTEGER"),
                    ColumnMeta::new("max_team_members", "INTEGER"),
                    ColumnMeta::new("features", "JSONB"),
                ],
            ),
            TableMeta::new(
                "subscriptions",
                vec![
                    ColumnMeta::new("id", "UUID").primary_key(),
                    ColumnMeta::new("user_id", "UUID").not_null(),
                    ColumnMeta::new("plan_id", "INTEGER").not_null(),
                    ColumnMeta::new("status", "subscription_status").not_null(),
                    ColumnMeta::new("billing_cycle", "billing_cycle").not_null(),
                    ColumnMeta::new("started_at", "TIMESTAMP").not_null(),
                    ColumnMeta::new("ended_at", "TIMESTAMP"),
                    ColumnMeta::new("cancelled_at", "TIMESTAMP"),
                    ColumnMeta::new("mrr", "DECIMAL(10,2)"),
                    ColumnMeta::new("created_at", "TIMESTAMP").not_null(),
                ],
            ),
            TableMeta::new(
                "projects",
                vec![
                    ColumnMeta::new("id", "UUID").primary_key(),
                    ColumnMeta::new("user_id", "UUID").not_null(),
                    ColumnMeta::new("name", "VARCHAR(255)").not_null(),
                    ColumnMeta::new("created_at", "TIMESTAMP").not_null(),
                    ColumnMeta::new("completed_at", "TIMESTAMP"),
                    ColumnMeta::new("is_active", "BOOLEAN"),
                ],
            ),
            TableMeta::new(
                "tasks",
                vec![
                    ColumnMeta::new("id", "UUID").primary_key(),
                    ColumnMeta::new("project_id", "UUID").not_null(),
                    ColumnMeta::new("user_id", "UUID").not_null(),
                    ColumnMeta::new("title", "VARCHAR(500)").not_null(),
                    ColumnMeta::new("created_at", "TIMESTAMP").not_null(),
                    ColumnMeta::new("completed_at", "TIMESTAMP"),
                    ColumnMeta::new("is_completed", "BOOLEAN"),
                ],
            ),
            TableMeta::new(
                "team_memberships",
                vec![
                    ColumnMeta::new("id", "UUID").primary_key(),
                    ColumnMeta::new("inviter_user_id", "UUID").not_null(),
                    ColumnMeta::new("invited_user_id", "UUID").not_null(),
                    ColumnMeta::new("project_id", "UUID").not_null(),
                    ColumnMeta::new("invited_at", "TIMESTAMP").not_null(),
                    ColumnMeta::new("accepted_at", "TIMESTAMP"),
                    ColumnMeta::new("role", "VARCHAR(50)"),
                ],
            ),
            TableMeta::new(
                "revenue_events",
                vec![
                    ColumnMeta::new("id", "UUID").primary_key(),
                    ColumnMeta::new("user_id", "UUID").not_null(),
                    ColumnMeta::new("subscription_id", "UUID"),
                    ColumnMeta::new("amount", "DECIMAL(10,2)").not_null(),
                    ColumnMeta::new("event_type", "VARCHAR(50)").not_null(),
                    ColumnMeta::new("occurred_at", "TIMESTAMP").not_null(),
                    ColumnMeta::new("stripe_payment_id", "VARCHAR(255)"),
                ],
            ),
            TableMeta::new(
                "user_activities",
                vec![
                    ColumnMeta::new("id", "UUID").primary_key(),
                    ColumnMeta::new("user_id", "UUID").not_null(),
                    ColumnMeta::new("activity_type", "VARCHAR(100)").not_null(),
                    ColumnMeta::new("metadata", "JSONB"),
                    ColumnMeta::new("occurred_at", "TIMESTAMP").not_null(),
                ],
            ),
            TableMeta::new(
                "funnel_events",
                vec![
                    ColumnMeta::new("id", "UUID").primary_key(),
                    ColumnMeta::new("user_id", "UUID"),
                    ColumnMeta::new("event_name", "VARCHAR(100)").not_null(),
                    ColumnMeta::new("occurred_at", "TIMESTAMP").not_null(),
                    ColumnMeta::new("session_id", "VARCHAR(255)"),
                    ColumnMeta::new("page_url", "VARCHAR(500)"),
                ],
            ),
        ];

        let relationships = vec![
            ForeignKeyMeta::new(("subscriptions", "user_id"), ("users", "id")),
            ForeignKeyMeta::new(("subscriptions", "plan_id"), ("plans", "id")),
            ForeignKeyMeta::new(("projects", "user_id"), ("users", "id")),
            ForeignKeyMeta::new(("tasks", "project_id"), ("projects", "id")),
            ForeignKeyMeta::new(("tasks", "user_id"), ("users", "id")),
            ForeignKeyMeta::new(("team_memberships", "inviter_user_id"), ("users", "id")),
            ForeignKeyMeta::new(("team_memberships", "invited_user_id"), ("users", "id")),
            ForeignKeyMeta::new(("team_memberships", "project_id"), ("projects", "id")),
            ForeignKeyMeta::new(("revenue_events", "user_id"), ("users", "id")),
            ForeignKeyMeta::new(("revenue_events", "subscription_id"), ("subscriptions", "id")),
            ForeignKeyMeta::new(("user_activities", "user_id"), ("users", "id")),
            ForeignKeyMeta::new(("funnel_events", "user_id"), ("users", "id")),
            ForeignKeyMeta::new(("users", "referred_by_user_id"), ("users", "id")),
        ];

        Self {
            tables,
            relationships,
        }
    }
}

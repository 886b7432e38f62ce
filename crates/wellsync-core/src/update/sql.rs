//! T-SQL rendering of staging and update statements.

use std::fmt::Write as _;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use wellsync_common::{FieldValue, column_values};
use wellsync_model::{
    JoinPath, PROPERTY_NUMBER, PredicateSource, SqlType, TargetTable, USER_TABLE,
};

use super::{LedgerStore, StagedTable, UpdateDirective};
use crate::error::StoreError;

/// Type used for staged columns without a hint.
const DEFAULT_STAGING_TYPE: &str = "NVARCHAR(MAX)";
const INSERT_BATCH: usize = 500;

/// Where the ledger tables live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlDialect {
    pub database: String,
    pub schema: String,
}

impl Default for SqlDialect {
    fn default() -> Self {
        Self {
            database: "WORKING_DISTRICT".to_string(),
            schema: "AriesAdmin".to_string(),
        }
    }
}

/// Bracket-quotes an identifier.
pub fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl SqlDialect {
    pub fn table(&self, name: &str) -> String {
        format!(
            "{}.{}.{}",
            quote_ident(&self.database),
            quote_ident(&self.schema),
            quote_ident(name)
        )
    }

    /// `CREATE TABLE` plus batched `INSERT`s for a staged table.
    pub fn render_stage(&self, table: &StagedTable) -> Result<String, StoreError> {
        let df = &table.data;
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let types: Vec<Option<SqlType>> = names
            .iter()
            .map(|name| table.hints.get(name).copied())
            .collect();

        let mut sql = String::new();
        let staged = quote_ident(&table.name);
        let _ = writeln!(
            sql,
            "IF OBJECT_ID('tempdb..{}') IS NOT NULL DROP TABLE {staged};",
            table.name
        );
        let definitions: Vec<String> = names
            .iter()
            .zip(&types)
            .map(|(name, sql_type)| match sql_type {
                Some(sql_type) => format!("{} {sql_type}", quote_ident(name)),
                None => format!("{} {DEFAULT_STAGING_TYPE}", quote_ident(name)),
            })
            .collect();
        let _ = writeln!(sql, "CREATE TABLE {staged} ({});", definitions.join(", "));

        let columns = columns_of(df, &names)?;
        let column_list: Vec<String> = names.iter().map(|name| quote_ident(name)).collect();
        let mut rows = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let cells = names
                .iter()
                .zip(&columns)
                .zip(&types)
                .map(|((name, values), sql_type)| {
                    render_value(&values[row], *sql_type).ok_or_else(|| StoreError::Staging {
                        table: table.name.clone(),
                        message: format!("{name} value {} does not fit its type", values[row]),
                    })
                })
                .collect::<Result<Vec<String>, StoreError>>()?;
            rows.push(format!("({})", cells.join(", ")));
        }
        for batch in rows.chunks(INSERT_BATCH) {
            let _ = writeln!(
                sql,
                "INSERT INTO {staged} ({}) VALUES\n    {};",
                column_list.join(", "),
                batch.join(",\n    ")
            );
        }
        Ok(sql)
    }

    /// The `UPDATE ... FROM` statement for one directive.
    ///
    /// `AC_USER` is joined only when the condition reads it, so property
    /// rows without a user row are still updated by unconditioned checks.
    pub fn render_update(&self, directive: &UpdateDirective) -> String {
        let primary = self.table(TargetTable::PRIMARY.table_name());
        let staged = quote_ident(&directive.staging);
        let key = quote_ident(&directive.key_column);
        let target_alias = match directive.join_path() {
            JoinPath::Direct => "M",
            JoinPath::ThroughPrimary => "T",
        };

        let mut sql = String::new();
        let _ = writeln!(sql, "UPDATE {target_alias}");
        let _ = writeln!(
            sql,
            "SET {target_alias}.{} = ct.{}",
            quote_ident(&directive.set_column),
            quote_ident(&directive.value_column)
        );
        let _ = writeln!(sql, "FROM {primary} M");
        if directive.join_path() == JoinPath::ThroughPrimary {
            let property = quote_ident(PROPERTY_NUMBER);
            let _ = writeln!(
                sql,
                "INNER JOIN {} T ON T.{property} = M.{property}",
                self.table(directive.target.table_name())
            );
        }
        let _ = writeln!(sql, "INNER JOIN {staged} ct ON ct.{key} = M.{key}");
        if directive.joins_user_table() {
            let property = quote_ident(PROPERTY_NUMBER);
            let _ = writeln!(
                sql,
                "INNER JOIN {} U ON U.{property} = M.{property}",
                self.table(USER_TABLE)
            );
        }

        let classes: Vec<String> = directive
            .update_class_names()
            .into_iter()
            .map(quote_literal)
            .collect();
        let class_column = quote_ident(&directive.class_column);
        let mut filter = match classes.as_slice() {
            [single] => format!("ct.{class_column} = {single}"),
            _ => format!("ct.{class_column} IN ({})", classes.join(", ")),
        };
        if let Some(condition) = &directive.condition {
            let alias = match condition.source {
                PredicateSource::Primary => "M",
                PredicateSource::User => "U",
                PredicateSource::Target => target_alias,
            };
            let _ = write!(
                filter,
                " AND {alias}.{} {} {}",
                quote_ident(&condition.column),
                condition.op.sql(),
                quote_literal(&condition.value)
            );
        }
        let _ = write!(sql, "WHERE {filter};");
        sql
    }
}

fn columns_of(df: &DataFrame, names: &[String]) -> Result<Vec<Vec<FieldValue>>, StoreError> {
    names
        .iter()
        .map(|name| column_values(df, name).map_err(StoreError::from))
        .collect()
}

/// One literal of an `INSERT` row; `None` when the value cannot be written
/// as the hinted type (T-SQL has no literal for infinity).
fn render_value(value: &FieldValue, sql_type: Option<SqlType>) -> Option<String> {
    if value.is_null() {
        return Some("NULL".to_string());
    }
    match sql_type {
        Some(SqlType::Float) => value
            .as_f64()
            .filter(|number| number.is_finite())
            .map(|number| number.to_string()),
        Some(SqlType::Integer) => value.as_i64().map(|number| number.to_string()),
        Some(SqlType::VarChar(_)) | None => Some(quote_literal(&value.to_string())),
    }
}

/// A ledger store that only records the T-SQL it would run.
///
/// Backs `--dry-run` and `--sql-out`; nothing is executed.
#[derive(Debug, Clone, Default)]
pub struct SqlScript {
    pub dialect: SqlDialect,
    statements: Vec<String>,
}

impl SqlScript {
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// All statements, separated by `GO` batch markers.
    pub fn to_script(&self) -> String {
        let mut script = String::new();
        for statement in &self.statements {
            script.push_str(statement.trim_end());
            script.push_str("\nGO\n\n");
        }
        script
    }
}

impl LedgerStore for SqlScript {
    fn stage(&mut self, table: &StagedTable) -> Result<(), StoreError> {
        let sql = self.dialect.render_stage(table)?;
        self.statements.push(sql);
        Ok(())
    }

    fn apply(&mut self, directive: &UpdateDirective) -> Result<Option<usize>, StoreError> {
        self.statements.push(self.dialect.render_update(directive));
        Ok(None)
    }
}

//! Result writers, one per statement category.
//!
//! Writers translate job output into result sets and OK replies on a
//! `ResultSink`. They're built before the job is finalized, but only write
//! while the job runs.
use std::sync::Arc;

use async_trait::async_trait;
use fedexec::errors::{ExecError, Result as ExecResult};
use fedexec::job::{JobOutput, ResultWriter};
use fedexec::query::QueryContext;
use fedexec::schema::{Column, DataType};
use fedexec::statement::StatementKind;

use crate::conn::ResultSink;
use crate::errors::{MySqlSrvError, Result};
use crate::protocol::{
    ColumnType, Field, OkResult, ResultSet, BINARY_FLAG, NOT_NULL_FLAG, UNSIGNED_FLAG,
};

/// What to do with a job's output.
pub enum WriterSelection {
    Writer(Box<dyn ResultWriter>),
    /// Reply OK immediately, the job has nothing to write.
    Acknowledge,
    /// Switch the session's schema instead of writing anything.
    UseSchema(String),
}

/// Pick a writer based on the statement the job was planned from.
pub fn select_writer(sink: Arc<dyn ResultSink>, ctx: &QueryContext) -> Result<WriterSelection> {
    let kind = match &ctx.stmt {
        Some(stmt) => stmt.kind(),
        None => return Err(MySqlSrvError::UnsupportedStatement("<none>".to_string())),
    };

    let schema = ctx.schema.name().to_string();
    Ok(match kind {
        StatementKind::Select => {
            WriterSelection::Writer(Box::new(MySqlResultWriter::new(sink, schema)))
        }
        StatementKind::Show | StatementKind::Describe => {
            WriterSelection::Writer(Box::new(MySqlSchemaWriter::new(sink, schema)))
        }
        StatementKind::Insert
        | StatementKind::Upsert
        | StatementKind::Update
        | StatementKind::Delete => WriterSelection::Writer(Box::new(MySqlExecResultWriter::new(sink))),
        StatementKind::Command => WriterSelection::Acknowledge,
        StatementKind::Use(name) => WriterSelection::UseSchema(name.clone()),
        StatementKind::Other(kind) => {
            return Err(MySqlSrvError::UnsupportedStatement(kind.clone()))
        }
    })
}

/// Streams tabular output as a result set.
pub struct MySqlResultWriter {
    sink: Arc<dyn ResultSink>,
    schema: String,
}

impl MySqlResultWriter {
    pub fn new(sink: Arc<dyn ResultSink>, schema: String) -> Self {
        MySqlResultWriter { sink, schema }
    }
}

#[async_trait]
impl ResultWriter for MySqlResultWriter {
    fn name(&self) -> &'static str {
        "mysql_result"
    }

    async fn write(&mut self, output: JobOutput) -> ExecResult<()> {
        match output {
            JobOutput::Rows { columns, rows } => {
                let fields = columns
                    .iter()
                    .map(|col| field_for_column(col, &self.schema))
                    .collect();
                self.sink
                    .write_result_set(ResultSet { fields, rows })
                    .await?;
                Ok(())
            }
            other => Err(ExecError::UnexpectedOutput {
                writer: self.name(),
                output: other.variant_name(),
            }),
        }
    }
}

/// Writes output of SHOW and DESCRIBE statements.
///
/// MySQL clients expect metadata as text, so all values are sent as strings.
pub struct MySqlSchemaWriter {
    sink: Arc<dyn ResultSink>,
    schema: String,
}

impl MySqlSchemaWriter {
    pub fn new(sink: Arc<dyn ResultSink>, schema: String) -> Self {
        MySqlSchemaWriter { sink, schema }
    }
}

#[async_trait]
impl ResultWriter for MySqlSchemaWriter {
    fn name(&self) -> &'static str {
        "mysql_schema"
    }

    async fn write(&mut self, output: JobOutput) -> ExecResult<()> {
        match output {
            JobOutput::Rows { columns, rows } => {
                let fields = columns
                    .iter()
                    .map(|col| Field {
                        name: col.name.clone(),
                        schema: self.schema.clone(),
                        column_type: ColumnType::VarString,
                        flags: if col.nullable { 0 } else { NOT_NULL_FLAG },
                    })
                    .collect();
                let rows = rows
                    .into_iter()
                    .map(|row| row.into_iter().map(|v| v.into_text()).collect())
                    .collect();
                self.sink
                    .write_result_set(ResultSet { fields, rows })
                    .await?;
                Ok(())
            }
            other => Err(ExecError::UnexpectedOutput {
                writer: self.name(),
                output: other.variant_name(),
            }),
        }
    }
}

/// Writes the summary of a data modifying statement.
pub struct MySqlExecResultWriter {
    sink: Arc<dyn ResultSink>,
}

impl MySqlExecResultWriter {
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        MySqlExecResultWriter { sink }
    }
}

#[async_trait]
impl ResultWriter for MySqlExecResultWriter {
    fn name(&self) -> &'static str {
        "mysql_exec_result"
    }

    async fn write(&mut self, output: JobOutput) -> ExecResult<()> {
        match output {
            JobOutput::Exec {
                affected_rows,
                last_insert_id,
            } => {
                self.sink
                    .write_exec_result(OkResult::new(affected_rows, last_insert_id))
                    .await?;
                Ok(())
            }
            other => Err(ExecError::UnexpectedOutput {
                writer: self.name(),
                output: other.variant_name(),
            }),
        }
    }
}

fn field_for_column(col: &Column, schema: &str) -> Field {
    let (column_type, mut flags) = match col.data_type {
        DataType::Bool => (ColumnType::Tiny, 0),
        DataType::Int64 => (ColumnType::LongLong, 0),
        DataType::UInt64 => (ColumnType::LongLong, UNSIGNED_FLAG),
        DataType::Float64 => (ColumnType::Double, 0),
        DataType::Utf8 => (ColumnType::VarString, 0),
        DataType::Binary => (ColumnType::Blob, BINARY_FLAG),
    };
    if !col.nullable {
        flags |= NOT_NULL_FLAG;
    }
    Field {
        name: col.name.clone(),
        schema: schema.to_string(),
        column_type,
        flags,
    }
}

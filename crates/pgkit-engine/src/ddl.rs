use pgkit_core::{PgKitError, QueryPlan};
use serde::{Deserialize, Serialize};

use crate::ident::{check_fragment, validate_column_name, validate_table_name};

/// A column definition, e.g. `user_id INTEGER REFERENCES users(id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    /// Trailing constraint text such as `NOT NULL` or `REFERENCES users(id)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            constraints: None,
        }
    }

    /// A pgvector column of the given dimensionality.
    pub fn vector(name: impl Into<String>, dimensions: u32) -> Self {
        Self::new(name, format!("vector({dimensions})"))
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = Some(constraints.into());
        self
    }

    fn to_sql(&self) -> Result<String, PgKitError> {
        validate_column_name(&self.name)?;
        check_fragment("column type", &self.data_type)?;
        match &self.constraints {
            Some(c) => {
                check_fragment("column constraint", c)?;
                Ok(format!("{} {} {}", self.name, self.data_type, c))
            }
            None => Ok(format!("{} {}", self.name, self.data_type)),
        }
    }
}

/// One structural change inside an `ALTER TABLE` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Alteration {
    AddColumn(ColumnDef),
    DropColumn { column: String },
    RenameColumn { from: String, to: String },
    AlterColumnType { column: String, data_type: String },
    RenameTable { to: String },
    AddConstraint { name: String, definition: String },
    DropConstraint { name: String },
    SetDefault { column: String, default: String },
    DropDefault { column: String },
    SetNotNull { column: String },
    DropNotNull { column: String },
}

impl Alteration {
    /// Renames cannot share an `ALTER TABLE` with other actions.
    fn is_rename(&self) -> bool {
        matches!(
            self,
            Alteration::RenameColumn { .. } | Alteration::RenameTable { .. }
        )
    }

    fn to_sql(&self) -> Result<String, PgKitError> {
        let sql = match self {
            Alteration::AddColumn(def) => format!("ADD COLUMN {}", def.to_sql()?),
            Alteration::DropColumn { column } => {
                validate_column_name(column)?;
                format!("DROP COLUMN {column}")
            }
            Alteration::RenameColumn { from, to } => {
                validate_column_name(from)?;
                validate_column_name(to)?;
                format!("RENAME COLUMN {from} TO {to}")
            }
            Alteration::AlterColumnType { column, data_type } => {
                validate_column_name(column)?;
                check_fragment("column type", data_type)?;
                format!("ALTER COLUMN {column} TYPE {data_type}")
            }
            Alteration::RenameTable { to } => {
                validate_column_name(to)?;
                format!("RENAME TO {to}")
            }
            Alteration::AddConstraint { name, definition } => {
                validate_column_name(name)?;
                check_fragment("constraint definition", definition)?;
                format!("ADD CONSTRAINT {name} {definition}")
            }
            Alteration::DropConstraint { name } => {
                validate_column_name(name)?;
                format!("DROP CONSTRAINT {name}")
            }
            Alteration::SetDefault { column, default } => {
                validate_column_name(column)?;
                check_fragment("column default", default)?;
                format!("ALTER COLUMN {column} SET DEFAULT {default}")
            }
            Alteration::DropDefault { column } => {
                validate_column_name(column)?;
                format!("ALTER COLUMN {column} DROP DEFAULT")
            }
            Alteration::SetNotNull { column } => {
                validate_column_name(column)?;
                format!("ALTER COLUMN {column} SET NOT NULL")
            }
            Alteration::DropNotNull { column } => {
                validate_column_name(column)?;
                format!("ALTER COLUMN {column} DROP NOT NULL")
            }
        };
        Ok(sql)
    }
}

/// Schema-only statements. None of these take conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DdlRequest {
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
        #[serde(default)]
        if_not_exists: bool,
    },
    AlterTable {
        table: String,
        alterations: Vec<Alteration>,
    },
    DropTable {
        table: String,
        #[serde(default = "default_true")]
        if_exists: bool,
        #[serde(default)]
        cascade: bool,
    },
    TruncateTable {
        table: String,
    },
    EnableVectorExtension,
}

fn default_true() -> bool {
    true
}

impl DdlRequest {
    pub fn create_table(table: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        DdlRequest::CreateTable {
            table: table.into(),
            columns,
            if_not_exists: false,
        }
    }

    pub fn alter_table(table: impl Into<String>, alterations: Vec<Alteration>) -> Self {
        DdlRequest::AlterTable {
            table: table.into(),
            alterations,
        }
    }

    /// `DROP TABLE IF EXISTS`, without cascade.
    pub fn drop_table(table: impl Into<String>) -> Self {
        DdlRequest::DropTable {
            table: table.into(),
            if_exists: true,
            cascade: false,
        }
    }

    pub fn truncate_table(table: impl Into<String>) -> Self {
        DdlRequest::TruncateTable {
            table: table.into(),
        }
    }
}

/// Ordered DDL statements that must be applied as one unit.
#[derive(Debug, PartialEq)]
pub struct DdlPlan {
    statements: Vec<QueryPlan>,
}

impl DdlPlan {
    pub fn statements(&self) -> &[QueryPlan] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// More than one statement: run them in a single transaction.
    pub fn is_atomic(&self) -> bool {
        self.statements.len() > 1
    }

    pub fn into_statements(self) -> Vec<QueryPlan> {
        self.statements
    }
}

pub fn build_ddl(request: &DdlRequest) -> Result<DdlPlan, PgKitError> {
    let statements = match request {
        DdlRequest::CreateTable {
            table,
            columns,
            if_not_exists,
        } => {
            validate_table_name(table)?;
            if columns.is_empty() {
                return Err(PgKitError::Validation(format!(
                    "table {table} needs at least one column"
                )));
            }
            let defs = columns
                .iter()
                .map(ColumnDef::to_sql)
                .collect::<Result<Vec<_>, _>>()?;
            let guard = if *if_not_exists { "IF NOT EXISTS " } else { "" };
            vec![statement(format!(
                "CREATE TABLE {guard}{table} ({})",
                defs.join(", ")
            ))]
        }
        DdlRequest::AlterTable { table, alterations } => alter_statements(table, alterations)?,
        DdlRequest::DropTable {
            table,
            if_exists,
            cascade,
        } => {
            validate_table_name(table)?;
            let guard = if *if_exists { "IF EXISTS " } else { "" };
            let cascade = if *cascade { " CASCADE" } else { "" };
            vec![statement(format!("DROP TABLE {guard}{table}{cascade}"))]
        }
        DdlRequest::TruncateTable { table } => {
            validate_table_name(table)?;
            vec![statement(format!("TRUNCATE TABLE {table}"))]
        }
        DdlRequest::EnableVectorExtension => {
            vec![statement("CREATE EXTENSION IF NOT EXISTS vector".to_string())]
        }
    };
    Ok(DdlPlan { statements })
}

/// Batch consecutive non-rename actions into one statement; each rename gets
/// its own. A table rename re-targets every later statement.
fn alter_statements(table: &str, alterations: &[Alteration]) -> Result<Vec<QueryPlan>, PgKitError> {
    validate_table_name(table)?;
    if alterations.is_empty() {
        return Err(PgKitError::Validation(format!(
            "no alterations requested for table {table}"
        )));
    }

    let mut target = table.to_string();
    let mut statements = Vec::new();
    let mut batch: Vec<String> = Vec::new();
    for alteration in alterations {
        let action = alteration.to_sql()?;
        if !alteration.is_rename() {
            batch.push(action);
            continue;
        }
        if !batch.is_empty() {
            statements.push(statement(format!("ALTER TABLE {target} {}", batch.join(", "))));
            batch.clear();
        }
        statements.push(statement(format!("ALTER TABLE {target} {action}")));
        if let Alteration::RenameTable { to } = alteration {
            target = match target.rsplit_once('.') {
                Some((schema, _)) => format!("{schema}.{to}"),
                None => to.clone(),
            };
        }
    }
    if !batch.is_empty() {
        statements.push(statement(format!("ALTER TABLE {target} {}", batch.join(", "))));
    }
    Ok(statements)
}

fn statement(sql: String) -> QueryPlan {
    QueryPlan::statement(sql, Vec::new())
}

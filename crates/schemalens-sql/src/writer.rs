use schemalens_core::{Column, Error, Result, SqlType, Table};

/// Default parameter holding the number of rows per page.
pub const PAGE_SIZE_PARAM: &str = "pageSize";
/// Default parameter holding the 1-based page number.
pub const CURRENT_PAGE_PARAM: &str = "currentPage";

/// How a dialect restricts a query to one page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStrategy {
    /// Number rows in a subquery with `ROW_NUMBER()` and filter on the rank.
    RowNumber,
    /// `LIMIT <size> OFFSET <skip>` with expression arguments.
    LimitOffset,
}

impl PagingStrategy {
    pub fn for_dialect(dialect: SqlType) -> Self {
        match dialect {
            // MySQL's LIMIT only takes literals or plain placeholders.
            SqlType::SqlServer | SqlType::Oracle | SqlType::MySql => PagingStrategy::RowNumber,
            SqlType::PostgreSql | SqlType::Sqlite => PagingStrategy::LimitOffset,
        }
    }
}

/// Generates statements for one table in one dialect.
///
/// The writer never executes anything. Identifiers are quoted with
/// [`SqlType::quote_identifier`] and parameters are named after their
/// column with [`SqlType::parameter_prefix`]. Statements span several lines;
/// pass them through [`simple_format`](crate::simple_format) for a one-line form.
#[derive(Debug, Clone, Copy)]
pub struct SqlWriter<'t> {
    table: &'t Table,
    dialect: SqlType,
}

impl<'t> SqlWriter<'t> {
    pub fn new(table: &'t Table, dialect: SqlType) -> Self {
        Self { table, dialect }
    }

    pub fn table(&self) -> &'t Table {
        self.table
    }

    pub fn dialect(&self) -> SqlType {
        self.dialect
    }

    /// Dialect parameter for `name`, e.g. `@UnitPrice` or `:UnitPrice`.
    ///
    /// Characters that cannot appear in a parameter name become `_`.
    pub fn parameter_name(&self, name: &str) -> String {
        let sanitized: String = name
            .chars()
            .map(|ch| if ch.is_alphanumeric() || ch == '_' { ch } else { '_' })
            .collect();
        format!("{}{}", self.dialect.parameter_prefix(), sanitized)
    }

    /// `SELECT` of every column in declaration order.
    pub fn select_sql(&self) -> String {
        format!("SELECT {}\nFROM {}", self.column_list(), self.table_name())
    }

    /// One page of rows using the `pageSize` and `currentPage` parameters.
    pub fn select_page_sql(&self) -> Result<String> {
        self.select_page_sql_with(PAGE_SIZE_PARAM, CURRENT_PAGE_PARAM)
    }

    /// One page of rows: ranks `(currentPage - 1) * pageSize + 1` through
    /// `currentPage * pageSize`, both inclusive, with `currentPage` starting at 1.
    ///
    /// Rows are ranked by the primary key in key order. A table without a
    /// key is ranked by all of its columns in declaration order. The rank is
    /// named `rowNumber` unless a column already uses that name, in which
    /// case the first free `rowNumber_<n>` is taken.
    pub fn select_page_sql_with(
        &self,
        page_size_param: &str,
        current_page_param: &str,
    ) -> Result<String> {
        if self.table.columns.is_empty() {
            return Err(Error::Unsupported(format!(
                "cannot page table {} without columns",
                self.table.name
            )));
        }

        let columns = self.column_list();
        let order_by = self.order_by_list();
        let page_size = self.parameter_name(page_size_param);
        let current_page = self.parameter_name(current_page_param);

        let sql = match PagingStrategy::for_dialect(self.dialect) {
            PagingStrategy::RowNumber => {
                // Oracle rejects `AS` before a table alias.
                let alias = match self.dialect {
                    SqlType::Oracle => "countedTable",
                    _ => "AS countedTable",
                };
                let rank = self.free_column_alias("rowNumber");
                format!(
                    "SELECT {columns}\n\
                     FROM (\n    \
                         SELECT ROW_NUMBER() OVER (ORDER BY {order_by}) AS {rank}, {columns}\n    \
                         FROM {table}\n\
                     ) {alias}\n\
                     WHERE {rank} > ({page_size} * ({current_page} - 1))\n    \
                         AND {rank} <= ({page_size} * {current_page})\n\
                     ORDER BY {rank}",
                    table = self.table_name(),
                )
            }
            PagingStrategy::LimitOffset => format!(
                "SELECT {columns}\n\
                 FROM {table}\n\
                 ORDER BY {order_by}\n\
                 LIMIT {page_size} OFFSET ({page_size} * ({current_page} - 1))",
                table = self.table_name(),
            ),
        };
        Ok(sql)
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*)\nFROM {}", self.table_name())
    }

    /// `SELECT` of one row by its primary key.
    pub fn select_by_id_sql(&self) -> Result<String> {
        let predicate = self.key_predicate()?;
        Ok(format!(
            "SELECT {}\nFROM {}\nWHERE {predicate}",
            self.column_list(),
            self.table_name()
        ))
    }

    /// `INSERT` binding every column to a parameter of the same name.
    pub fn insert_sql(&self) -> Result<String> {
        if self.table.columns.is_empty() {
            return Err(Error::Unsupported(format!(
                "cannot insert into table {} without columns",
                self.table.name
            )));
        }
        let parameters = self
            .table
            .columns
            .iter()
            .map(|column| self.parameter_name(&column.name))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "INSERT INTO {} ({})\nVALUES ({parameters})",
            self.table_name(),
            self.column_list()
        ))
    }

    /// `UPDATE` of every non-key column, matched on the primary key.
    pub fn update_sql(&self) -> Result<String> {
        let predicate = self.key_predicate()?;
        let assignments: Vec<String> = self
            .table
            .columns
            .iter()
            .filter(|column| !column.is_primary_key)
            .map(|column| self.assignment(column))
            .collect();
        if assignments.is_empty() {
            return Err(Error::Unsupported(format!(
                "every column of table {} is part of its primary key",
                self.table.name
            )));
        }
        Ok(format!(
            "UPDATE {}\nSET {}\nWHERE {predicate}",
            self.table_name(),
            assignments.join(",\n    ")
        ))
    }

    pub fn delete_sql(&self) -> Result<String> {
        let predicate = self.key_predicate()?;
        Ok(format!("DELETE FROM {}\nWHERE {predicate}", self.table_name()))
    }

    fn table_name(&self) -> String {
        self.dialect.quote_identifier(&self.table.name)
    }

    fn column_list(&self) -> String {
        if self.table.columns.is_empty() {
            return "*".to_string();
        }
        self.quoted_list(self.table.columns.iter())
    }

    fn order_by_list(&self) -> String {
        let key = self.table.primary_key_columns();
        if key.is_empty() {
            self.quoted_list(self.table.columns.iter())
        } else {
            self.quoted_list(key.into_iter())
        }
    }

    /// `base`, or `base_1`, `base_2`, ... when a column already has the name.
    /// Unquoted aliases may be case-folded, so the comparison ignores case.
    fn free_column_alias(&self, base: &str) -> String {
        let taken = |candidate: &str| {
            self.table
                .columns
                .iter()
                .any(|column| column.name.eq_ignore_ascii_case(candidate))
        };
        let mut alias = base.to_string();
        let mut suffix = 0;
        while taken(&alias) {
            suffix += 1;
            alias = format!("{base}_{suffix}");
        }
        alias
    }

    fn quoted_list<'c>(&self, columns: impl Iterator<Item = &'c Column>) -> String {
        columns
            .map(|column| self.dialect.quote_identifier(&column.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn assignment(&self, column: &Column) -> String {
        format!(
            "{} = {}",
            self.dialect.quote_identifier(&column.name),
            self.parameter_name(&column.name)
        )
    }

    fn key_predicate(&self) -> Result<String> {
        let key = self.table.primary_key_columns();
        if key.is_empty() {
            return Err(Error::Unsupported(format!(
                "table {} has no primary key",
                self.table.name
            )));
        }
        Ok(key
            .into_iter()
            .map(|column| self.assignment(column))
            .collect::<Vec<_>>()
            .join(" AND "))
    }
}

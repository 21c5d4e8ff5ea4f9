//! SQL Parser implementation.

use super::error::ParseError;
use super::pratt::{
    infix_binding_power, prefix_binding_power, token_to_binary_op, token_to_unary_op,
};
use crate::ast::{
    AlterTableAction, AlterTableStatement, ColumnDef, CommonTableExpr, ConflictAction,
    CreateDatabaseStatement, CreateTableStatement, CreateViewStatement, DataType,
    DeleteStatement, DropDatabaseStatement, DropTableStatement, DropViewStatement, Expr,
    FunctionCall, InsertSource, InsertStatement, JoinClause, JoinType, Literal, NullOrdering,
    OnConflict, OrderBy, OrderDirection, RefreshMaterializedViewStatement, SelectColumn,
    SelectStatement, SetOp, SetOpBranch, Statement, TableConstraint, TableRef, UnaryOp,
    UpdateAssignment, UpdateStatement, UseStatement,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// SQL Parser.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    /// Parameter counter for ? placeholders.
    param_counter: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0)),
            param_counter: 0,
        }
    }

    /// Parses a single SQL statement.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a valid SQL statement.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Select | Keyword::With) => {
                Ok(Statement::Select(self.parse_select_statement()?))
            }
            TokenKind::Keyword(Keyword::Insert) => {
                Ok(Statement::Insert(self.parse_insert_statement()?))
            }
            TokenKind::Keyword(Keyword::Update) => {
                Ok(Statement::Update(self.parse_update_statement()?))
            }
            TokenKind::Keyword(Keyword::Delete) => {
                Ok(Statement::Delete(self.parse_delete_statement()?))
            }
            TokenKind::Keyword(Keyword::Create) => self.parse_create_statement(),
            TokenKind::Keyword(Keyword::Drop) => self.parse_drop_statement(),
            TokenKind::Keyword(Keyword::Alter) => {
                Ok(Statement::AlterTable(self.parse_alter_table_statement()?))
            }
            TokenKind::Keyword(Keyword::Use) => Ok(Statement::Use(self.parse_use_statement()?)),
            TokenKind::Keyword(Keyword::Refresh) => Ok(Statement::RefreshMaterializedView(
                self.parse_refresh_statement()?,
            )),
            _ => Err(ParseError::unexpected(
                "SELECT, INSERT, UPDATE, DELETE, CREATE, DROP, ALTER, USE, or REFRESH",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    /// Parses a `;`-separated batch of statements. Trailing and doubled
    /// semicolons (including a batch that is empty or all-whitespace) are
    /// tolerated; each statement's span is returned alongside it so a caller
    /// can report which statement in the batch a later execution failure
    /// belongs to.
    ///
    /// # Errors
    ///
    /// Returns the first `ParseError` encountered; statements before it are
    /// not returned (the caller never sees a partially parsed batch).
    pub fn parse_statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::Eof) {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            statements.push(self.parse_statement()?);
            while self.check(&TokenKind::Semicolon) {
                self.advance();
            }
        }
        Ok(statements)
    }

    // --- SELECT ---

    /// Parses a (possibly `WITH`-prefixed, possibly set-op-chained) SELECT statement.
    fn parse_select_statement(&mut self) -> Result<SelectStatement, ParseError> {
        let ctes = if self.check_keyword(Keyword::With) {
            self.advance();
            if self.check_keyword(Keyword::Recursive) {
                self.advance();
            }
            self.parse_cte_list()?
        } else {
            vec![]
        };

        let mut stmt = self.parse_select_core()?;
        stmt.ctes = ctes;

        let mut set_ops = vec![];
        loop {
            let op = match &self.current.kind {
                TokenKind::Keyword(Keyword::Union) => {
                    self.advance();
                    if self.check_keyword(Keyword::All) {
                        self.advance();
                        SetOp::UnionAll
                    } else {
                        SetOp::Union
                    }
                }
                TokenKind::Keyword(Keyword::Intersect) => {
                    self.advance();
                    SetOp::Intersect
                }
                TokenKind::Keyword(Keyword::Except) => {
                    self.advance();
                    SetOp::Except
                }
                _ => break,
            };
            let select = self.parse_select_core()?;
            set_ops.push(SetOpBranch {
                op,
                select: Box::new(select),
            });
        }
        stmt.set_ops = set_ops;

        // A trailing `ORDER BY` / `LIMIT` / `OFFSET` binds to the whole
        // compound statement, not to the last branch (§4.2: "optional
        // trailing set-op … ORDER BY … LIMIT"), so it is parsed once here,
        // after the set-op loop, onto the top-level statement — never inside
        // `parse_select_core`, which only ever parses one bare branch.
        let (order_by, limit, offset) = self.parse_order_by_limit_offset()?;
        stmt.order_by = order_by;
        stmt.limit = limit;
        stmt.offset = offset;

        Ok(stmt)
    }

    /// Parses one `SELECT ... [GROUP BY ...] [HAVING ...]` branch, with no
    /// leading `WITH`, no trailing set-op chain, and no trailing `ORDER BY`/
    /// `LIMIT`/`OFFSET` — those bind to the whole compound statement and are
    /// the caller's job, so a single [`SelectStatement`] can hold the whole
    /// chain flat.
    fn parse_select_core(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        let distinct = if self.check_keyword(Keyword::Distinct) {
            self.advance();
            true
        } else if self.check_keyword(Keyword::All) {
            self.advance();
            false
        } else {
            false
        };

        let columns = self.parse_select_columns()?;

        let from = if self.check_keyword(Keyword::From) {
            self.advance();
            Some(self.parse_table_ref()?)
        } else {
            None
        };

        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let group_by = if self.check_keyword(Keyword::Group) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_expression_list()?
        } else {
            vec![]
        };

        let having = if self.check_keyword(Keyword::Having) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        Ok(SelectStatement {
            ctes: vec![],
            distinct,
            columns,
            from,
            where_clause,
            group_by,
            having,
            order_by: vec![],
            limit: None,
            offset: None,
            set_ops: vec![],
        })
    }

    /// Parses an optional trailing `ORDER BY ... [LIMIT ...] [OFFSET ...]`
    /// tail, binding once to the whole (possibly set-op-chained) statement.
    fn parse_order_by_limit_offset(
        &mut self,
    ) -> Result<(Vec<OrderBy>, Option<Expr>, Option<Expr>), ParseError> {
        let order_by = if self.check_keyword(Keyword::Order) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?
        } else {
            vec![]
        };

        let limit = if self.check_keyword(Keyword::Limit) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let offset = if self.check_keyword(Keyword::Offset) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        Ok((order_by, limit, offset))
    }

    /// Parses a `WITH` clause's comma-separated CTE bindings (the `WITH`
    /// keyword itself, and any `RECURSIVE`, is already consumed).
    fn parse_cte_list(&mut self) -> Result<Vec<CommonTableExpr>, ParseError> {
        let mut ctes = vec![];
        loop {
            let name = self.expect_identifier()?;
            let columns = if self.check(&TokenKind::LeftParen) {
                self.advance();
                let cols = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                cols
            } else {
                vec![]
            };
            self.expect_keyword(Keyword::As)?;
            self.expect(&TokenKind::LeftParen)?;
            let query = self.parse_select_statement()?;
            self.expect(&TokenKind::RightParen)?;
            ctes.push(CommonTableExpr {
                name,
                columns,
                query: Box::new(query),
            });
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(ctes)
    }

    /// Parses SELECT columns.
    fn parse_select_columns(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        let mut columns = vec![];

        loop {
            let expr = self.parse_expression(0)?;

            // Check for alias (AS name or just name)
            let alias = if self.check_keyword(Keyword::As) {
                self.advance();
                Some(self.expect_identifier()?)
            } else if matches!(&self.current.kind, TokenKind::Identifier(_)) {
                Some(self.expect_identifier()?)
            } else {
                None
            };

            columns.push(SelectColumn { expr, alias });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(columns)
    }

    /// Parses a table reference.
    fn parse_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let mut table_ref = if self.check(&TokenKind::LeftParen) {
            // Subquery or grouped table ref
            self.advance();
            if self.check_keyword(Keyword::Select) || self.check_keyword(Keyword::With) {
                let query = self.parse_select_statement()?;
                self.expect(&TokenKind::RightParen)?;
                let alias = self.parse_optional_alias()?;
                TableRef::Subquery {
                    query: Box::new(query),
                    alias: alias.unwrap_or_else(|| String::from("subquery")),
                }
            } else {
                let inner = self.parse_table_ref()?;
                self.expect(&TokenKind::RightParen)?;
                inner
            }
        } else {
            // Simple table name
            let (schema, name) = self.parse_schema_qualified_name()?;
            let alias = self.parse_optional_alias()?;

            TableRef::Table {
                schema,
                name,
                alias,
            }
        };

        // Parse joins
        while self.is_join_keyword() {
            let join_type = self.parse_join_type()?;
            let right = self.parse_simple_table_ref()?;

            let (on, using) = if join_type == JoinType::Cross {
                (None, vec![])
            } else if self.check_keyword(Keyword::On) {
                self.advance();
                (Some(self.parse_expression(0)?), vec![])
            } else if self.check_keyword(Keyword::Using) {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let cols = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                (None, cols)
            } else {
                return Err(ParseError::new(
                    "Expected ON or USING clause",
                    self.current.span,
                ));
            };

            table_ref = TableRef::Join {
                left: Box::new(table_ref),
                join: Box::new(JoinClause {
                    join_type,
                    table: right,
                    on,
                    using,
                }),
            };
        }

        Ok(table_ref)
    }

    /// Parses a simple table reference (no joins).
    fn parse_simple_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let (schema, name) = self.parse_schema_qualified_name()?;
        let alias = self.parse_optional_alias()?;

        Ok(TableRef::Table {
            schema,
            name,
            alias,
        })
    }

    /// Checks if current token is a join keyword.
    fn is_join_keyword(&self) -> bool {
        matches!(
            &self.current.kind,
            TokenKind::Keyword(
                Keyword::Join
                    | Keyword::Inner
                    | Keyword::Left
                    | Keyword::Right
                    | Keyword::Full
                    | Keyword::Cross
            )
        )
    }

    /// Parses a join type.
    fn parse_join_type(&mut self) -> Result<JoinType, ParseError> {
        let join_type = match &self.current.kind {
            TokenKind::Keyword(Keyword::Join) => {
                self.advance();
                JoinType::Inner
            }
            TokenKind::Keyword(Keyword::Inner) => {
                self.advance();
                self.expect_keyword(Keyword::Join)?;
                JoinType::Inner
            }
            TokenKind::Keyword(Keyword::Left) => {
                self.advance();
                if self.check_keyword(Keyword::Outer) {
                    self.advance();
                }
                self.expect_keyword(Keyword::Join)?;
                JoinType::Left
            }
            TokenKind::Keyword(Keyword::Right) => {
                self.advance();
                if self.check_keyword(Keyword::Outer) {
                    self.advance();
                }
                self.expect_keyword(Keyword::Join)?;
                JoinType::Right
            }
            TokenKind::Keyword(Keyword::Full) => {
                self.advance();
                if self.check_keyword(Keyword::Outer) {
                    self.advance();
                }
                self.expect_keyword(Keyword::Join)?;
                JoinType::Full
            }
            TokenKind::Keyword(Keyword::Cross) => {
                self.advance();
                self.expect_keyword(Keyword::Join)?;
                JoinType::Cross
            }
            _ => {
                return Err(ParseError::unexpected(
                    "JOIN keyword",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };
        Ok(join_type)
    }

    /// Parses an optional table alias.
    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.check_keyword(Keyword::As) {
            self.advance();
            Ok(Some(self.expect_identifier()?))
        } else if matches!(&self.current.kind, TokenKind::Identifier(_)) {
            Ok(Some(self.expect_identifier()?))
        } else {
            Ok(None)
        }
    }

    /// Parses a (possibly schema-qualified) `name` or `schema.name`.
    fn parse_schema_qualified_name(&mut self) -> Result<(Option<String>, String), ParseError> {
        let first = self.expect_identifier()?;
        if self.check(&TokenKind::Dot) {
            self.advance();
            let name = self.expect_identifier()?;
            Ok((Some(first), name))
        } else {
            Ok((None, first))
        }
    }

    // --- INSERT / UPDATE / DELETE ---

    /// Parses an INSERT statement.
    fn parse_insert_statement(&mut self) -> Result<InsertStatement, ParseError> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;

        let (schema, table) = self.parse_schema_qualified_name()?;

        // Column list (optional)
        let columns = if self.check(&TokenKind::LeftParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect(&TokenKind::RightParen)?;
            cols
        } else {
            vec![]
        };

        // VALUES, SELECT, or DEFAULT VALUES
        let values = if self.check_keyword(Keyword::Values) {
            self.advance();
            let mut rows = vec![];
            loop {
                self.expect(&TokenKind::LeftParen)?;
                let row = self.parse_expression_list()?;
                self.expect(&TokenKind::RightParen)?;
                rows.push(row);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
            InsertSource::Values(rows)
        } else if self.check_keyword(Keyword::Select) || self.check_keyword(Keyword::With) {
            InsertSource::Query(Box::new(self.parse_select_statement()?))
        } else if self.check_keyword(Keyword::Default) {
            self.advance();
            self.expect_keyword(Keyword::Values)?;
            InsertSource::DefaultValues
        } else {
            return Err(ParseError::unexpected(
                "VALUES, SELECT, or DEFAULT VALUES",
                self.current.kind.clone(),
                self.current.span,
            ));
        };

        let on_conflict = self.parse_on_conflict()?;
        let returning = self.parse_returning_clause()?;

        Ok(InsertStatement {
            schema,
            table,
            columns,
            values,
            on_conflict,
            returning,
        })
    }

    /// Parses an `ON CONFLICT (cols) DO NOTHING | DO UPDATE SET ...` clause.
    fn parse_on_conflict(&mut self) -> Result<Option<OnConflict>, ParseError> {
        if !self.check_keyword(Keyword::On) {
            return Ok(None);
        }
        self.advance();
        self.expect_keyword(Keyword::Conflict)?;

        let columns = if self.check(&TokenKind::LeftParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect(&TokenKind::RightParen)?;
            cols
        } else {
            vec![]
        };

        self.expect_keyword(Keyword::Do)?;
        let action = if self.check_keyword(Keyword::Nothing) {
            self.advance();
            ConflictAction::DoNothing
        } else {
            self.expect_keyword(Keyword::Update)?;
            self.expect_keyword(Keyword::Set)?;
            ConflictAction::DoUpdate(self.parse_update_assignments()?)
        };

        Ok(Some(OnConflict { columns, action }))
    }

    /// Parses a `RETURNING` clause; returns an empty list if absent.
    fn parse_returning_clause(&mut self) -> Result<Vec<SelectColumn>, ParseError> {
        if self.check_keyword(Keyword::Returning) {
            self.advance();
            self.parse_select_columns()
        } else {
            Ok(vec![])
        }
    }

    /// Parses a comma-separated list of `col = expr` assignments.
    fn parse_update_assignments(&mut self) -> Result<Vec<UpdateAssignment>, ParseError> {
        let mut assignments = vec![];
        loop {
            let column = self.expect_identifier()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expression(0)?;
            assignments.push(UpdateAssignment { column, value });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(assignments)
    }

    /// Parses an UPDATE statement.
    fn parse_update_statement(&mut self) -> Result<UpdateStatement, ParseError> {
        self.expect_keyword(Keyword::Update)?;

        let (schema, table) = self.parse_schema_qualified_name()?;
        let alias = self.parse_optional_alias()?;

        self.expect_keyword(Keyword::Set)?;
        let assignments = self.parse_update_assignments()?;

        let from = if self.check_keyword(Keyword::From) {
            self.advance();
            Some(self.parse_table_ref()?)
        } else {
            None
        };

        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let returning = self.parse_returning_clause()?;

        Ok(UpdateStatement {
            schema,
            table,
            alias,
            assignments,
            from,
            where_clause,
            returning,
        })
    }

    /// Parses a DELETE statement.
    fn parse_delete_statement(&mut self) -> Result<DeleteStatement, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;

        let (schema, table) = self.parse_schema_qualified_name()?;
        let alias = self.parse_optional_alias()?;

        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let returning = self.parse_returning_clause()?;

        Ok(DeleteStatement {
            schema,
            table,
            alias,
            where_clause,
            returning,
        })
    }

    // --- DDL ---

    /// Parses `IF NOT EXISTS`, if present.
    fn parse_if_not_exists(&mut self) -> Result<bool, ParseError> {
        if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Parses `IF EXISTS`, if present.
    fn parse_if_exists(&mut self) -> Result<bool, ParseError> {
        if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Parses a `CREATE ...` statement (dispatch on what follows `CREATE`).
    fn parse_create_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Create)?;
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Database) => {
                self.advance();
                let if_not_exists = self.parse_if_not_exists()?;
                let name = self.expect_identifier()?;
                Ok(Statement::CreateDatabase(CreateDatabaseStatement {
                    name,
                    if_not_exists,
                }))
            }
            TokenKind::Keyword(Keyword::Table) => {
                Ok(Statement::CreateTable(self.parse_create_table_rest()?))
            }
            TokenKind::Keyword(Keyword::View) => {
                Ok(Statement::CreateView(self.parse_create_view_rest(false)?))
            }
            TokenKind::Keyword(Keyword::Materialized) => {
                self.advance();
                Ok(Statement::CreateView(self.parse_create_view_rest(true)?))
            }
            _ => Err(ParseError::unexpected(
                "DATABASE, TABLE, VIEW, or MATERIALIZED VIEW",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    /// Parses a `DROP ...` statement (dispatch on what follows `DROP`).
    fn parse_drop_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Drop)?;
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Database) => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let name = self.expect_identifier()?;
                Ok(Statement::DropDatabase(DropDatabaseStatement {
                    name,
                    if_exists,
                }))
            }
            TokenKind::Keyword(Keyword::Table) => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let (schema, name) = self.parse_schema_qualified_name()?;
                Ok(Statement::DropTable(DropTableStatement {
                    schema,
                    name,
                    if_exists,
                }))
            }
            TokenKind::Keyword(Keyword::Materialized) => {
                self.advance();
                self.expect_keyword(Keyword::View)?;
                self.parse_drop_view_rest()
            }
            TokenKind::Keyword(Keyword::View) => {
                self.advance();
                self.parse_drop_view_rest()
            }
            _ => Err(ParseError::unexpected(
                "DATABASE, TABLE, VIEW, or MATERIALIZED VIEW",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    /// Parses the tail of `DROP [MATERIALIZED] VIEW` after both keywords are consumed.
    fn parse_drop_view_rest(&mut self) -> Result<Statement, ParseError> {
        let if_exists = self.parse_if_exists()?;
        let (schema, name) = self.parse_schema_qualified_name()?;
        Ok(Statement::DropView(DropViewStatement {
            schema,
            name,
            if_exists,
        }))
    }

    /// Parses the tail of `CREATE TABLE` after `CREATE` is consumed.
    fn parse_create_table_rest(&mut self) -> Result<CreateTableStatement, ParseError> {
        self.expect_keyword(Keyword::Table)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let (schema, name) = self.parse_schema_qualified_name()?;
        self.expect(&TokenKind::LeftParen)?;

        let mut columns = vec![];
        let mut constraints = vec![];
        loop {
            if self.is_table_constraint_start() {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&TokenKind::RightParen)?;

        Ok(CreateTableStatement {
            schema,
            name,
            columns,
            constraints,
            if_not_exists,
        })
    }

    /// True if the current token can only start a table-level constraint,
    /// never a column name.
    fn is_table_constraint_start(&self) -> bool {
        matches!(
            &self.current.kind,
            TokenKind::Keyword(
                Keyword::Primary | Keyword::Unique | Keyword::Check | Keyword::Constraint
            )
        )
    }

    /// Parses a table-level constraint, e.g. `PRIMARY KEY (a, b)`.
    ///
    /// A leading `CONSTRAINT name` is accepted and its name discarded:
    /// [`TableConstraint`] does not carry a name (only `DROP CONSTRAINT`
    /// addresses one by name, and that path is parsed separately).
    fn parse_table_constraint(&mut self) -> Result<TableConstraint, ParseError> {
        if self.check_keyword(Keyword::Constraint) {
            self.advance();
            let _name = self.expect_identifier()?;
        }

        match &self.current.kind {
            TokenKind::Keyword(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                self.expect(&TokenKind::LeftParen)?;
                let cols = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(TableConstraint::PrimaryKey(cols))
            }
            TokenKind::Keyword(Keyword::Unique) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let cols = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(TableConstraint::Unique(cols))
            }
            TokenKind::Keyword(Keyword::Check) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let expr = self.parse_expression(0)?;
                self.expect(&TokenKind::RightParen)?;
                Ok(TableConstraint::Check(expr))
            }
            _ => Err(ParseError::unexpected(
                "PRIMARY KEY, UNIQUE, or CHECK",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    /// Parses a single column definition, including inline constraints.
    fn parse_column_def(&mut self) -> Result<ColumnDef, ParseError> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;
        let mut col = ColumnDef::new(name, data_type);

        loop {
            match &self.current.kind {
                TokenKind::Keyword(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    col = col.primary_key();
                }
                TokenKind::Keyword(Keyword::Not) => {
                    self.advance();
                    self.expect_keyword(Keyword::Null)?;
                    col = col.not_null();
                }
                TokenKind::Keyword(Keyword::Null) => {
                    self.advance();
                    col.nullable = true;
                }
                TokenKind::Keyword(Keyword::Unique) => {
                    self.advance();
                    col = col.unique();
                }
                TokenKind::Keyword(Keyword::Default) => {
                    self.advance();
                    col = col.default(self.parse_expression(0)?);
                }
                TokenKind::Keyword(Keyword::Check) => {
                    self.advance();
                    self.expect(&TokenKind::LeftParen)?;
                    let expr = self.parse_expression(0)?;
                    self.expect(&TokenKind::RightParen)?;
                    col = col.check(expr);
                }
                TokenKind::Keyword(Keyword::Constraint) => {
                    self.advance();
                    let _name = self.expect_identifier()?;
                }
                _ => break,
            }
        }

        Ok(col)
    }

    /// Parses the tail of `ALTER TABLE`.
    fn parse_alter_table_statement(&mut self) -> Result<AlterTableStatement, ParseError> {
        self.expect_keyword(Keyword::Alter)?;
        self.expect_keyword(Keyword::Table)?;
        let (schema, name) = self.parse_schema_qualified_name()?;

        let action = match &self.current.kind {
            TokenKind::Keyword(Keyword::Add) => {
                self.advance();
                if self.check_keyword(Keyword::Column) {
                    self.advance();
                }
                if self.is_table_constraint_start() {
                    AlterTableAction::AddConstraint(self.parse_table_constraint()?)
                } else {
                    AlterTableAction::AddColumn(self.parse_column_def()?)
                }
            }
            TokenKind::Keyword(Keyword::Drop) => {
                self.advance();
                if self.check_keyword(Keyword::Constraint) {
                    self.advance();
                    AlterTableAction::DropConstraint(self.expect_identifier()?)
                } else {
                    if self.check_keyword(Keyword::Column) {
                        self.advance();
                    }
                    AlterTableAction::DropColumn(self.expect_identifier()?)
                }
            }
            TokenKind::Keyword(Keyword::Rename) => {
                self.advance();
                self.expect_keyword(Keyword::To)?;
                AlterTableAction::Rename(self.expect_identifier()?)
            }
            _ => {
                return Err(ParseError::unexpected(
                    "ADD, DROP, or RENAME",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };

        Ok(AlterTableStatement {
            schema,
            name,
            action,
        })
    }

    /// Parses the tail of `CREATE [MATERIALIZED] VIEW` after `CREATE`
    /// (and, for materialized views, the `MATERIALIZED` keyword) is consumed.
    fn parse_create_view_rest(
        &mut self,
        materialized: bool,
    ) -> Result<CreateViewStatement, ParseError> {
        self.expect_keyword(Keyword::View)?;
        let if_not_exists = self.parse_if_not_exists()?;
        let (schema, name) = self.parse_schema_qualified_name()?;
        self.expect_keyword(Keyword::As)?;
        let query = self.parse_select_statement()?;

        Ok(CreateViewStatement {
            schema,
            name,
            materialized,
            query: Box::new(query),
            if_not_exists,
        })
    }

    /// Parses `USE name`.
    fn parse_use_statement(&mut self) -> Result<UseStatement, ParseError> {
        self.expect_keyword(Keyword::Use)?;
        let name = self.expect_identifier()?;
        Ok(UseStatement { name })
    }

    /// Parses `REFRESH MATERIALIZED VIEW name`.
    fn parse_refresh_statement(&mut self) -> Result<RefreshMaterializedViewStatement, ParseError> {
        self.expect_keyword(Keyword::Refresh)?;
        self.expect_keyword(Keyword::Materialized)?;
        self.expect_keyword(Keyword::View)?;
        let (schema, name) = self.parse_schema_qualified_name()?;
        Ok(RefreshMaterializedViewStatement { schema, name })
    }

    /// Parses an ORDER BY list.
    fn parse_order_by_list(&mut self) -> Result<Vec<OrderBy>, ParseError> {
        let mut items = vec![];
        loop {
            let expr = self.parse_expression(0)?;
            let direction = if self.check_keyword(Keyword::Desc) {
                self.advance();
                OrderDirection::Desc
            } else if self.check_keyword(Keyword::Asc) {
                self.advance();
                OrderDirection::Asc
            } else {
                OrderDirection::Asc
            };

            let nulls = if self.check_keyword(Keyword::Nulls) {
                self.advance();
                if self.check_keyword(Keyword::First) {
                    self.advance();
                    Some(NullOrdering::First)
                } else {
                    self.expect_keyword(Keyword::Last)?;
                    Some(NullOrdering::Last)
                }
            } else {
                None
            };

            items.push(OrderBy {
                expr,
                direction,
                nulls,
            });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(items)
    }

    // --- Expressions ---

    /// Parses an expression using Pratt parsing.
    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            // `NOT IN` / `NOT BETWEEN` / `NOT LIKE` / `NOT ILIKE`: the `NOT`
            // token itself carries no infix binding power, so it is special
            // cased onto the same (9, 10) tier as its un-negated siblings.
            if self.check_keyword(Keyword::Not) {
                if 9 < min_bp {
                    break;
                }
                self.advance();
                lhs = self.parse_predicate_tail(lhs, true, 10)?;
                continue;
            }

            let (l_bp, r_bp) = match infix_binding_power(&self.current.kind) {
                Some(bp) => bp,
                None => break,
            };

            if l_bp < min_bp {
                break;
            }

            match &self.current.kind {
                TokenKind::Keyword(Keyword::Is) => {
                    self.advance();
                    let negated = if self.check_keyword(Keyword::Not) {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    self.expect_keyword(Keyword::Null)?;
                    lhs = Expr::IsNull {
                        expr: Box::new(lhs),
                        negated,
                    };
                }
                TokenKind::Keyword(
                    Keyword::In | Keyword::Between | Keyword::Like | Keyword::Ilike,
                ) => {
                    lhs = self.parse_predicate_tail(lhs, false, r_bp)?;
                }
                _ => {
                    if let Some(op) = token_to_binary_op(&self.current.kind) {
                        self.advance();
                        let rhs = self.parse_expression(r_bp)?;
                        lhs = Expr::Binary {
                            left: Box::new(lhs),
                            op,
                            right: Box::new(rhs),
                        };
                    } else {
                        break;
                    }
                }
            }
        }

        Ok(lhs)
    }

    /// Parses `IN (...)`, `BETWEEN ... AND ...`, `LIKE ...`, or `ILIKE ...`
    /// against an already-parsed `lhs`, with `negated` already decided by
    /// whatever (if anything) consumed a leading `NOT`.
    fn parse_predicate_tail(
        &mut self,
        lhs: Expr,
        negated: bool,
        r_bp: u8,
    ) -> Result<Expr, ParseError> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::In) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                if self.check_keyword(Keyword::Select) || self.check_keyword(Keyword::With) {
                    let query = self.parse_select_statement()?;
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::InSubquery {
                        expr: Box::new(lhs),
                        query: Box::new(query),
                        negated,
                    })
                } else {
                    let list = self.parse_expression_list()?;
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::In {
                        expr: Box::new(lhs),
                        list,
                        negated,
                    })
                }
            }
            TokenKind::Keyword(Keyword::Between) => {
                self.advance();
                let low = self.parse_expression(r_bp)?;
                self.expect_keyword(Keyword::And)?;
                let high = self.parse_expression(r_bp)?;
                Ok(Expr::Between {
                    expr: Box::new(lhs),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                })
            }
            TokenKind::Keyword(Keyword::Like) => {
                self.advance();
                let pattern = self.parse_expression(r_bp)?;
                Ok(Expr::Like {
                    expr: Box::new(lhs),
                    pattern: Box::new(pattern),
                    negated,
                    case_insensitive: false,
                })
            }
            TokenKind::Keyword(Keyword::Ilike) => {
                self.advance();
                let pattern = self.parse_expression(r_bp)?;
                Ok(Expr::Like {
                    expr: Box::new(lhs),
                    pattern: Box::new(pattern),
                    negated,
                    case_insensitive: true,
                })
            }
            _ => Err(ParseError::unexpected(
                "IN, BETWEEN, LIKE, or ILIKE",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    /// Parses a prefix expression.
    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        // `NOT` needs a peek past itself to special-case `NOT EXISTS (...)`
        // into a dedicated negated Exists node rather than wrapping a
        // generic Unary around it.
        if self.check_keyword(Keyword::Not) {
            self.advance();
            if self.check_keyword(Keyword::Exists) {
                return self.parse_exists_expr(true);
            }
            let bp = prefix_binding_power(&TokenKind::Keyword(Keyword::Not)).unwrap_or(5);
            let operand = self.parse_expression(bp)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }

        if let Some(op) = token_to_unary_op(&self.current.kind) {
            let bp = prefix_binding_power(&self.current.kind).unwrap_or(19);
            self.advance();
            let operand = self.parse_expression(bp)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    /// Parses `EXISTS (subquery)`, with `negated` already decided by the caller.
    fn parse_exists_expr(&mut self, negated: bool) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Exists)?;
        self.expect(&TokenKind::LeftParen)?;
        let query = self.parse_select_statement()?;
        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::Exists {
            query: Box::new(query),
            negated,
        })
    }

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current.clone();

        match &token.kind {
            // Literals
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Integer(*n)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(*f)))
            }
            TokenKind::String(s) => {
                let value = s.clone();
                self.advance();
                Ok(Expr::Literal(Literal::String(value)))
            }
            TokenKind::Blob(b) => {
                let value = b.clone();
                self.advance();
                Ok(Expr::Literal(Literal::Blob(value)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }

            // Parameter placeholders
            TokenKind::Question => {
                self.param_counter += 1;
                let position = self.param_counter;
                self.advance();
                Ok(Expr::Parameter {
                    name: None,
                    position,
                })
            }
            TokenKind::Colon => {
                self.advance();
                let name = self.expect_identifier()?;
                Ok(Expr::Parameter {
                    name: Some(name),
                    position: 0,
                })
            }

            // Wildcard
            TokenKind::Star => {
                self.advance();
                Ok(Expr::Wildcard { table: None })
            }

            // Parenthesized expression or subquery
            TokenKind::LeftParen => {
                self.advance();
                if self.check_keyword(Keyword::Select) || self.check_keyword(Keyword::With) {
                    let subquery = self.parse_select_statement()?;
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::Subquery(Box::new(subquery)))
                } else {
                    let expr = self.parse_expression(0)?;
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::Paren(Box::new(expr)))
                }
            }

            // Aggregate functions
            TokenKind::Keyword(
                kw @ (Keyword::Count | Keyword::Sum | Keyword::Avg | Keyword::Min | Keyword::Max),
            ) => {
                let name = kw.as_str().to_string();
                self.advance();
                self.parse_function_call(name)
            }

            // Other functions
            TokenKind::Keyword(kw @ (Keyword::Coalesce | Keyword::Nullif | Keyword::Cast)) => {
                let name = kw.as_str().to_string();
                self.advance();
                if matches!(kw, Keyword::Cast) {
                    self.parse_cast_expression()
                } else {
                    self.parse_function_call(name)
                }
            }

            // CASE expression
            TokenKind::Keyword(Keyword::Case) => self.parse_case_expression(),

            // EXISTS
            TokenKind::Keyword(Keyword::Exists) => self.parse_exists_expr(false),

            // EXTRACT(field FROM expr)
            TokenKind::Keyword(Keyword::Extract) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let field = self.expect_identifier()?;
                self.expect_keyword(Keyword::From)?;
                let expr = self.parse_expression(0)?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::Extract {
                    field,
                    expr: Box::new(expr),
                })
            }

            // CURRENT_DATE
            TokenKind::Keyword(Keyword::CurrentDate) => {
                self.advance();
                Ok(Expr::CurrentDate)
            }

            // Identifier (column reference or function call)
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = token.span;
                self.advance();

                // Check for function call
                if self.check(&TokenKind::LeftParen) {
                    return self.parse_function_call(name);
                }

                // Check for qualified name (table.column or table.*)
                if self.check(&TokenKind::Dot) {
                    self.advance();
                    if self.check(&TokenKind::Star) {
                        self.advance();
                        return Ok(Expr::Wildcard { table: Some(name) });
                    }
                    let column = self.expect_identifier()?;
                    return Ok(Expr::Column {
                        table: Some(name),
                        name: column,
                        span,
                    });
                }

                Ok(Expr::Column {
                    table: None,
                    name,
                    span,
                })
            }

            _ => Err(ParseError::unexpected(
                "expression",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }

    /// Parses a function call.
    fn parse_function_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let distinct = if self.check_keyword(Keyword::Distinct) {
            self.advance();
            true
        } else {
            false
        };

        let args = if self.check(&TokenKind::RightParen) {
            vec![]
        } else if self.check(&TokenKind::Star) {
            self.advance();
            vec![Expr::Wildcard { table: None }]
        } else {
            self.parse_expression_list()?
        };

        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::Function(FunctionCall {
            name,
            args,
            distinct,
        }))
    }

    /// Parses a CAST expression.
    fn parse_cast_expression(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expression(0)?;
        self.expect_keyword(Keyword::As)?;
        let data_type = self.parse_data_type()?;
        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::Cast {
            expr: Box::new(expr),
            data_type,
        })
    }

    /// Parses a CASE expression.
    fn parse_case_expression(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Case)?;

        // Check for simple CASE (CASE expr WHEN ...)
        let operand = if !self.check_keyword(Keyword::When) {
            Some(Box::new(self.parse_expression(0)?))
        } else {
            None
        };

        // Parse WHEN/THEN clauses
        let mut when_clauses = vec![];
        while self.check_keyword(Keyword::When) {
            self.advance();
            let when_expr = self.parse_expression(0)?;
            self.expect_keyword(Keyword::Then)?;
            let then_expr = self.parse_expression(0)?;
            when_clauses.push((when_expr, then_expr));
        }

        // Parse ELSE clause
        let else_clause = if self.check_keyword(Keyword::Else) {
            self.advance();
            Some(Box::new(self.parse_expression(0)?))
        } else {
            None
        };

        self.expect_keyword(Keyword::End)?;

        Ok(Expr::Case {
            operand,
            when_clauses,
            else_clause,
        })
    }

    /// Parses a data type.
    fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let data_type = match &self.current.kind {
            TokenKind::Keyword(Keyword::Int | Keyword::Integer) => {
                self.advance();
                DataType::Integer
            }
            TokenKind::Keyword(Keyword::Smallint) => {
                self.advance();
                DataType::Smallint
            }
            TokenKind::Keyword(Keyword::Bigint) => {
                self.advance();
                DataType::Bigint
            }
            TokenKind::Keyword(Keyword::Serial) => {
                self.advance();
                DataType::Serial
            }
            TokenKind::Keyword(Keyword::Real) => {
                self.advance();
                DataType::Real
            }
            TokenKind::Keyword(Keyword::Double) => {
                self.advance();
                DataType::Double
            }
            TokenKind::Keyword(Keyword::Float) => {
                self.advance();
                DataType::Double
            }
            TokenKind::Keyword(Keyword::Decimal) => {
                self.advance();
                let (precision, scale) = self.parse_optional_precision_scale()?;
                DataType::Decimal { precision, scale }
            }
            TokenKind::Keyword(Keyword::Numeric) => {
                self.advance();
                let (precision, scale) = self.parse_optional_precision_scale()?;
                DataType::Numeric { precision, scale }
            }
            TokenKind::Keyword(Keyword::Char) => {
                self.advance();
                let len = self.parse_optional_length()?;
                DataType::Char(len)
            }
            TokenKind::Keyword(Keyword::Varchar) => {
                self.advance();
                let len = self.parse_optional_length()?;
                DataType::Varchar(len)
            }
            TokenKind::Keyword(Keyword::Text) => {
                self.advance();
                DataType::Text
            }
            TokenKind::Keyword(Keyword::Blob) => {
                self.advance();
                DataType::Blob
            }
            TokenKind::Keyword(Keyword::Boolean) => {
                self.advance();
                DataType::Boolean
            }
            TokenKind::Keyword(Keyword::Date) => {
                self.advance();
                DataType::Date
            }
            TokenKind::Keyword(Keyword::Time) => {
                self.advance();
                DataType::Time
            }
            TokenKind::Keyword(Keyword::Timestamp) => {
                self.advance();
                DataType::Timestamp
            }
            TokenKind::Keyword(Keyword::Datetime) => {
                self.advance();
                DataType::Datetime
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                DataType::Custom(name)
            }
            _ => {
                return Err(ParseError::unexpected(
                    "data type",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };

        Ok(data_type)
    }

    /// Parses optional precision and scale (for DECIMAL/NUMERIC).
    fn parse_optional_precision_scale(&mut self) -> Result<(Option<u16>, Option<u16>), ParseError> {
        if !self.check(&TokenKind::LeftParen) {
            return Ok((None, None));
        }
        self.advance();

        let precision = match &self.current.kind {
            TokenKind::Integer(n) => {
                let p = u16::try_from(*n)
                    .map_err(|_| ParseError::new("Precision too large", self.current.span))?;
                self.advance();
                Some(p)
            }
            _ => {
                return Err(ParseError::unexpected(
                    "integer",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };

        let scale = if self.check(&TokenKind::Comma) {
            self.advance();
            match &self.current.kind {
                TokenKind::Integer(n) => {
                    let s = u16::try_from(*n)
                        .map_err(|_| ParseError::new("Scale too large", self.current.span))?;
                    self.advance();
                    Some(s)
                }
                _ => {
                    return Err(ParseError::unexpected(
                        "integer",
                        self.current.kind.clone(),
                        self.current.span,
                    ));
                }
            }
        } else {
            None
        };

        self.expect(&TokenKind::RightParen)?;
        Ok((precision, scale))
    }

    /// Parses optional length (for CHAR/VARCHAR).
    fn parse_optional_length(&mut self) -> Result<Option<u32>, ParseError> {
        if !self.check(&TokenKind::LeftParen) {
            return Ok(None);
        }
        self.advance();

        let length = match &self.current.kind {
            TokenKind::Integer(n) => {
                let len = u32::try_from(*n)
                    .map_err(|_| ParseError::new("Length too large", self.current.span))?;
                self.advance();
                len
            }
            _ => {
                return Err(ParseError::unexpected(
                    "integer",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };

        self.expect(&TokenKind::RightParen)?;
        Ok(Some(length))
    }

    /// Parses a comma-separated list of expressions.
    fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![];
        loop {
            exprs.push(self.parse_expression(0)?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(exprs)
    }

    /// Parses a comma-separated list of identifiers.
    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut idents = vec![];
        loop {
            idents.push(self.expect_identifier()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(idents)
    }

    // --- Helper methods ---

    /// Advances to the next token.
    fn advance(&mut self) {
        self.previous = core::mem::replace(&mut self.current, self.lexer.next_token());
    }

    /// Checks if the current token matches the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current.kind) == core::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    /// Expects the current token to be the given kind.
    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(
                format!("{kind:?}"),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    /// Expects the current token to be the given keyword.
    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(
                keyword.as_str(),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    /// Expects and returns an identifier.
    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::unexpected(
                "identifier",
                self.current.kind.clone(),
                self.current.span,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;

    fn parse(sql: &str) -> Result<Statement, ParseError> {
        Parser::new(sql).parse_statement()
    }

    #[test]
    fn test_simple_select() {
        let stmt = parse("SELECT id, name FROM users").unwrap();
        assert!(matches!(stmt, Statement::Select(_)));
    }

    #[test]
    fn test_select_with_where() {
        let stmt = parse("SELECT * FROM users WHERE id = 1").unwrap();
        if let Statement::Select(select) = stmt {
            assert!(select.where_clause.is_some());
        } else {
            panic!("Expected SELECT statement");
        }
    }

    #[test]
    fn test_select_with_join() {
        let stmt =
            parse("SELECT u.id, o.amount FROM users u JOIN orders o ON u.id = o.user_id").unwrap();
        assert!(matches!(stmt, Statement::Select(_)));
    }

    #[test]
    fn test_expression_precedence() {
        // 1 + 2 * 3 should be parsed as 1 + (2 * 3)
        let stmt = parse("SELECT 1 + 2 * 3").unwrap();
        if let Statement::Select(select) = stmt {
            if let Expr::Binary { op, right, .. } = &select.columns[0].expr {
                assert_eq!(*op, BinaryOp::Add);
                assert!(matches!(
                    right.as_ref(),
                    Expr::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            } else {
                panic!("Expected binary expression");
            }
        } else {
            panic!("Expected SELECT statement");
        }
    }

    #[test]
    fn test_insert_values() {
        let stmt =
            parse("INSERT INTO users (name, email) VALUES ('Alice', 'alice@example.com')").unwrap();
        if let Statement::Insert(insert) = stmt {
            assert_eq!(insert.table, "users");
            assert_eq!(insert.columns.len(), 2);
            assert!(matches!(insert.values, InsertSource::Values(_)));
        } else {
            panic!("Expected INSERT statement");
        }
    }

    #[test]
    fn test_insert_on_conflict_do_update_returning() {
        let stmt = parse(
            "INSERT INTO users (id, name) VALUES (1, 'Alice') \
             ON CONFLICT (id) DO UPDATE SET name = 'Alice' RETURNING id, name",
        )
        .unwrap();
        let Statement::Insert(insert) = stmt else {
            panic!("Expected INSERT statement");
        };
        let Some(on_conflict) = &insert.on_conflict else {
            panic!("Expected ON CONFLICT clause");
        };
        assert_eq!(on_conflict.columns, vec![String::from("id")]);
        assert!(matches!(on_conflict.action, ConflictAction::DoUpdate(_)));
        assert_eq!(insert.returning.len(), 2);
    }

    #[test]
    fn test_insert_on_conflict_do_nothing() {
        let stmt = parse("INSERT INTO users (id) VALUES (1) ON CONFLICT (id) DO NOTHING").unwrap();
        let Statement::Insert(insert) = stmt else {
            panic!("Expected INSERT statement");
        };
        assert!(matches!(
            insert.on_conflict,
            Some(OnConflict {
                action: ConflictAction::DoNothing,
                ..
            })
        ));
    }

    #[test]
    fn test_update() {
        let stmt = parse("UPDATE users SET name = 'Bob' WHERE id = 1").unwrap();
        if let Statement::Update(update) = stmt {
            assert_eq!(update.table, "users");
            assert_eq!(update.assignments.len(), 1);
            assert!(update.where_clause.is_some());
        } else {
            panic!("Expected UPDATE statement");
        }
    }

    #[test]
    fn test_update_returning() {
        let stmt = parse("UPDATE users SET name = 'Bob' WHERE id = 1 RETURNING id").unwrap();
        let Statement::Update(update) = stmt else {
            panic!("Expected UPDATE statement");
        };
        assert_eq!(update.returning.len(), 1);
    }

    #[test]
    fn test_delete() {
        let stmt = parse("DELETE FROM users WHERE id = 1").unwrap();
        if let Statement::Delete(delete) = stmt {
            assert_eq!(delete.table, "users");
            assert!(delete.where_clause.is_some());
        } else {
            panic!("Expected DELETE statement");
        }
    }

    #[test]
    fn test_delete_returning() {
        let stmt = parse("DELETE FROM users WHERE id = 1 RETURNING id, name").unwrap();
        let Statement::Delete(delete) = stmt else {
            panic!("Expected DELETE statement");
        };
        assert_eq!(delete.returning.len(), 2);
    }

    #[test]
    fn test_parameter_placeholders() {
        let stmt = parse("SELECT * FROM users WHERE id = ? AND name = :name").unwrap();
        let Statement::Select(select) = stmt else {
            panic!("Expected SELECT statement");
        };
        let Some(Expr::Binary { left, right, .. }) = &select.where_clause else {
            panic!("Expected Binary expression in WHERE clause");
        };
        // First condition: id = ?
        if let Expr::Binary { right: param1, .. } = left.as_ref() {
            assert!(matches!(
                param1.as_ref(),
                Expr::Parameter {
                    name: None,
                    position: 1
                }
            ));
        }
        // Second condition: name = :name
        if let Expr::Binary { right: param2, .. } = right.as_ref() {
            assert!(matches!(
                param2.as_ref(),
                Expr::Parameter { name: Some(n), .. } if n == "name"
            ));
        }
    }

    #[test]
    fn test_case_expression() {
        let stmt =
            parse("SELECT CASE WHEN status = 1 THEN 'active' ELSE 'inactive' END FROM users")
                .unwrap();
        if let Statement::Select(select) = stmt {
            assert!(matches!(select.columns[0].expr, Expr::Case { .. }));
        }
    }

    #[test]
    fn test_aggregate_functions() {
        let stmt = parse("SELECT COUNT(*), SUM(amount), AVG(price) FROM orders").unwrap();
        if let Statement::Select(select) = stmt {
            assert_eq!(select.columns.len(), 3);
            assert!(matches!(select.columns[0].expr, Expr::Function(_)));
        }
    }

    #[test]
    fn test_not_in_not_between_not_like() {
        let stmt = parse(
            "SELECT * FROM t WHERE a NOT IN (1, 2) AND b NOT BETWEEN 1 AND 10 \
             AND c NOT LIKE 'x%' AND d NOT ILIKE 'Y%'",
        )
        .unwrap();
        assert!(matches!(stmt, Statement::Select(_)));
    }

    #[test]
    fn test_like_ilike_expr_shape() {
        let stmt = parse("SELECT * FROM t WHERE name LIKE 'A%'").unwrap();
        let Statement::Select(select) = stmt else {
            panic!("Expected SELECT statement");
        };
        let Some(Expr::Like {
            negated,
            case_insensitive,
            ..
        }) = select.where_clause
        else {
            panic!("Expected Like expression");
        };
        assert!(!negated);
        assert!(!case_insensitive);
    }

    #[test]
    fn test_in_subquery() {
        let stmt =
            parse("SELECT * FROM t WHERE id IN (SELECT id FROM other WHERE active = TRUE)")
                .unwrap();
        let Statement::Select(select) = stmt else {
            panic!("Expected SELECT statement");
        };
        assert!(matches!(select.where_clause, Some(Expr::InSubquery { .. })));
    }

    #[test]
    fn test_exists_and_not_exists() {
        let stmt = parse(
            "SELECT * FROM t WHERE EXISTS (SELECT 1 FROM u) AND NOT EXISTS (SELECT 1 FROM v)",
        )
        .unwrap();
        let Statement::Select(select) = stmt else {
            panic!("Expected SELECT statement");
        };
        let Some(Expr::Binary { left, right, .. }) = select.where_clause else {
            panic!("Expected AND expression");
        };
        assert!(matches!(*left, Expr::Exists { negated: false, .. }));
        assert!(matches!(*right, Expr::Exists { negated: true, .. }));
    }

    #[test]
    fn test_extract_and_current_date() {
        let stmt =
            parse("SELECT EXTRACT(YEAR FROM created_at) FROM t WHERE d = CURRENT_DATE").unwrap();
        let Statement::Select(select) = stmt else {
            panic!("Expected SELECT statement");
        };
        assert!(matches!(select.columns[0].expr, Expr::Extract { .. }));
        assert!(matches!(select.where_clause, Some(Expr::Binary { .. })));
    }

    #[test]
    fn test_order_by_nulls_last() {
        let stmt = parse("SELECT * FROM t ORDER BY a DESC NULLS LAST, b NULLS FIRST").unwrap();
        let Statement::Select(select) = stmt else {
            panic!("Expected SELECT statement");
        };
        assert_eq!(select.order_by[0].nulls, Some(NullOrdering::Last));
        assert_eq!(select.order_by[1].nulls, Some(NullOrdering::First));
    }

    #[test]
    fn test_with_cte_and_set_ops() {
        let stmt = parse(
            "WITH active AS (SELECT id FROM users WHERE active = TRUE) \
             SELECT id FROM active UNION ALL SELECT id FROM active INTERSECT SELECT id FROM active",
        )
        .unwrap();
        let Statement::Select(select) = stmt else {
            panic!("Expected SELECT statement");
        };
        assert_eq!(select.ctes.len(), 1);
        assert_eq!(select.ctes[0].name, "active");
        assert_eq!(select.set_ops.len(), 2);
        assert_eq!(select.set_ops[0].op, SetOp::UnionAll);
        assert_eq!(select.set_ops[1].op, SetOp::Intersect);
    }

    #[test]
    fn test_create_table_with_serial_and_constraints() {
        let stmt = parse(
            "CREATE TABLE IF NOT EXISTS users (\
                id SERIAL PRIMARY KEY, \
                email TEXT UNIQUE NOT NULL, \
                age INTEGER CHECK (age >= 0), \
                UNIQUE (email, age))",
        )
        .unwrap();
        let Statement::CreateTable(create) = stmt else {
            panic!("Expected CREATE TABLE statement");
        };
        assert!(create.if_not_exists);
        assert_eq!(create.columns.len(), 3);
        assert!(create.columns[0].is_serial());
        assert!(create.columns[0].primary_key);
        assert_eq!(create.constraints.len(), 1);
    }

    #[test]
    fn test_drop_table_if_exists() {
        let stmt = parse("DROP TABLE IF EXISTS users").unwrap();
        let Statement::DropTable(drop) = stmt else {
            panic!("Expected DROP TABLE statement");
        };
        assert!(drop.if_exists);
    }

    #[test]
    fn test_alter_table_actions() {
        let add = parse("ALTER TABLE users ADD COLUMN nickname TEXT").unwrap();
        assert!(matches!(
            add,
            Statement::AlterTable(AlterTableStatement {
                action: AlterTableAction::AddColumn(_),
                ..
            })
        ));

        let drop = parse("ALTER TABLE users DROP COLUMN nickname").unwrap();
        assert!(matches!(
            drop,
            Statement::AlterTable(AlterTableStatement {
                action: AlterTableAction::DropColumn(_),
                ..
            })
        ));

        let rename = parse("ALTER TABLE users RENAME TO people").unwrap();
        assert!(matches!(
            rename,
            Statement::AlterTable(AlterTableStatement {
                action: AlterTableAction::Rename(_),
                ..
            })
        ));
    }

    #[test]
    fn test_create_and_drop_database_use() {
        assert!(matches!(
            parse("CREATE DATABASE IF NOT EXISTS shop").unwrap(),
            Statement::CreateDatabase(_)
        ));
        assert!(matches!(
            parse("DROP DATABASE IF EXISTS shop").unwrap(),
            Statement::DropDatabase(_)
        ));
        assert!(matches!(parse("USE shop").unwrap(), Statement::Use(_)));
    }

    #[test]
    fn test_create_materialized_view_and_refresh() {
        let stmt = parse(
            "CREATE MATERIALIZED VIEW IF NOT EXISTS active_users AS SELECT id FROM users WHERE active = TRUE",
        )
        .unwrap();
        let Statement::CreateView(view) = stmt else {
            panic!("Expected CREATE VIEW statement");
        };
        assert!(view.materialized);
        assert!(view.if_not_exists);

        let refresh = parse("REFRESH MATERIALIZED VIEW active_users").unwrap();
        assert!(matches!(refresh, Statement::RefreshMaterializedView(_)));

        let drop = parse("DROP VIEW IF EXISTS active_users").unwrap();
        assert!(matches!(drop, Statement::DropView(_)));
    }
}

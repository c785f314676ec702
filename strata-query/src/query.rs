//! Query descriptors and their execution.
//!
//! A [`Query`] is a named SQL template with `:name` placeholders, typed by
//! its input `I` and output `O`. It is built once, usually at startup, and
//! reused concurrently. Each invocation goes through the same steps:
//! sanitize and bind the input, rebind to the executor's dialect, run, and
//! convert the rows into `O`.
//!
//! ```rust,ignore
//! use strata_query::{Query, Void, Pagination, Sorting};
//!
//! let list: Query<Void, Vec<User>> = Query::new("listUsers", "SELECT id, email FROM users");
//! let page = list.paged(&db, vec![], Pagination::new(10, 0), &Sorting::new().asc("id")).await?;
//!
//! let by_id: Query<ById, User> = Query::new("userById", "SELECT id, email FROM users WHERE id = :id");
//! let user = by_id.run_one(&db, ById { id: 1 }).await?;
//! ```

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::bind::{bind_batch, bind_named};
use crate::error::QueryResult;
use crate::pagination::{Page, Pagination};
use crate::param::{NamedParams, Params, SqlValue, Void};
use crate::row::{FromRow, Row};
use crate::sql::{rebind, DatabaseType};
use crate::types::Sorting;

/// A database connection or pool that can run SQL.
#[async_trait]
pub trait Executor: Send + Sync {
    /// The dialect placeholders are rebound to.
    fn database_type(&self) -> DatabaseType;

    /// Run a statement, returning the number of affected rows.
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> QueryResult<u64>;

    /// Run a query, returning every row.
    async fn fetch_all(&self, sql: &str, args: &[SqlValue]) -> QueryResult<Vec<Row>>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn database_type(&self) -> DatabaseType {
        (**self).database_type()
    }

    async fn execute(&self, sql: &str, args: &[SqlValue]) -> QueryResult<u64> {
        (**self).execute(sql, args).await
    }

    async fn fetch_all(&self, sql: &str, args: &[SqlValue]) -> QueryResult<Vec<Row>> {
        (**self).fetch_all(sql, args).await
    }
}

/// How many rows a query output consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// No rows; the query runs as a statement.
    Statement,
    /// Exactly one row; zero rows is a not-found error.
    Row,
    /// Any number of rows.
    Rows,
}

/// The result type of a query.
///
/// Implemented for [`Void`] (statements), `Vec<T: FromRow>` (many rows) and
/// scalar types (one row, first column). Use [`crate::impl_from_row!`] or
/// [`crate::impl_output!`] for single-row structs.
pub trait Output: Sized + Send + 'static {
    /// Rows consumed.
    const SHAPE: Shape;

    /// Convert the fetched rows; `query` names the query in errors.
    fn from_rows(rows: Vec<Row>, query: &str) -> QueryResult<Self>;
}

impl Output for Void {
    const SHAPE: Shape = Shape::Statement;

    fn from_rows(_rows: Vec<Row>, _query: &str) -> QueryResult<Self> {
        Ok(Void)
    }
}

impl<T: FromRow + Send + 'static> Output for Vec<T> {
    const SHAPE: Shape = Shape::Rows;

    fn from_rows(rows: Vec<Row>, _query: &str) -> QueryResult<Self> {
        rows.iter().map(T::from_row).collect()
    }
}

crate::impl_output!(bool, i32, i64, u32, u64, f64, String, DateTime<Utc>, Uuid, serde_json::Value);

/// What a query returns, as used to decide whether it can be paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Runs as a statement.
    Exec,
    /// Returns one row, or several rows from an `INSERT ... RETURNING`.
    Single,
    /// Returns many rows; the only kind that can be paged.
    Many,
}

fn kind_of<O: Output>(template: Option<&str>) -> QueryKind {
    match O::SHAPE {
        Shape::Statement => QueryKind::Exec,
        Shape::Row => QueryKind::Single,
        Shape::Rows => match template {
            Some(body) if body.to_lowercase().contains("insert") => QueryKind::Single,
            _ => QueryKind::Many,
        },
    }
}

async fn fetch<E, O>(exec: &E, name: &str, sql: &str, args: &[SqlValue]) -> QueryResult<O>
where
    E: Executor + ?Sized,
    O: Output,
{
    let sql = rebind(sql, exec.database_type());
    debug!(query = %name, args = args.len(), "running query");
    trace!(sql = %sql, "query text");

    let rows = match O::SHAPE {
        Shape::Statement => exec.execute(&sql, args).await.map(|_| Vec::new()),
        Shape::Row | Shape::Rows => exec.fetch_all(&sql, args).await,
    };

    rows.and_then(|rows| O::from_rows(rows, name))
        .map_err(|e| e.in_query(&sql, args).with_query(name))
}

async fn paginate<E, O>(
    exec: &E,
    name: &str,
    base: String,
    mut args: Vec<SqlValue>,
    pagination: Pagination,
    sorting: &Sorting,
) -> QueryResult<Page<O>>
where
    E: Executor + ?Sized,
    O: Output,
{
    let count_sql = format!("SELECT COUNT(*) FROM (\n{}\n) AS query", base);
    let total: u64 = fetch::<E, u64>(exec, name, &count_sql, &args).await?;

    let mut sql = base;
    if !sorting.is_empty() {
        sql.push_str("\nORDER BY ");
        sql.push_str(&sorting.to_sql());
    }
    sql.push_str("\nLIMIT ?\nOFFSET ?");
    args.push(SqlValue::try_from(pagination.limit(total))?);
    args.push(SqlValue::try_from(pagination.skip)?);

    let items = fetch::<E, O>(exec, name, &sql, &args).await?;
    Ok(Page::build(items, total, pagination))
}

/// A named SQL template with typed input and output.
pub struct Query<I, O> {
    name: String,
    body: String,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> Clone for Query<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            body: self.body.clone(),
            _marker: PhantomData,
        }
    }
}

impl<I, O> fmt::Debug for Query<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("name", &self.name)
            .field("body", &self.body)
            .finish()
    }
}

impl<I: Params, O: Output> Query<I, O> {
    /// Declare a query.
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            _marker: PhantomData,
        }
    }

    /// The query name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The SQL template.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// What the query returns.
    pub fn kind(&self) -> QueryKind {
        kind_of::<O>(Some(&self.body))
    }

    /// Sanitize and bind `params` into positional SQL.
    ///
    /// # Panics
    ///
    /// If the query takes input and `params` is empty.
    pub fn build(&self, params: &mut [I]) -> (String, Vec<SqlValue>) {
        if I::IS_VOID {
            return (self.body.clone(), Vec::new());
        }
        assert!(
            !params.is_empty(),
            "query `{}` needs at least one input",
            self.name
        );

        let named: Vec<NamedParams> = params
            .iter_mut()
            .map(|p| {
                p.sanitize();
                let mut named = NamedParams::new();
                p.bind(&mut named);
                named
            })
            .collect();

        match named.as_slice() {
            [single] => bind_named(&self.body, single),
            rows => bind_batch(&self.body, rows),
        }
    }

    /// Run the query.
    ///
    /// Queries without input take an empty `params`; a single input binds
    /// the template once; several inputs repeat its `VALUES (...)` group.
    pub async fn run<E: Executor + ?Sized>(&self, exec: &E, mut params: Vec<I>) -> QueryResult<O> {
        let (sql, args) = self.build(&mut params);
        fetch(exec, &self.name, &sql, &args).await
    }

    /// Run the query with one input.
    pub async fn run_one<E: Executor + ?Sized>(&self, exec: &E, input: I) -> QueryResult<O> {
        self.run(exec, vec![input]).await
    }

    /// Run the query one page at a time.
    ///
    /// # Panics
    ///
    /// If the query does not return many rows.
    pub async fn paged<E: Executor + ?Sized>(
        &self,
        exec: &E,
        mut params: Vec<I>,
        pagination: Pagination,
        sorting: &Sorting,
    ) -> QueryResult<Page<O>> {
        assert_eq!(
            self.kind(),
            QueryKind::Many,
            "query `{}` does not return many rows and cannot be paged",
            self.name
        );
        let (sql, args) = self.build(&mut params);
        paginate(exec, &self.name, sql, args, pagination, sorting).await
    }
}

type Generator<I> = Arc<dyn Fn(&I) -> (String, NamedParams) + Send + Sync>;

/// A query whose SQL and parameters are generated from its input at call time.
///
/// Used with filter trees, where the WHERE clause depends on the request:
///
/// ```rust,ignore
/// let search: LazyQuery<Where<UserFilter>, Vec<User>> = LazyQuery::new("searchUsers", |filter| {
///     let mut params = NamedParams::new();
///     let clause = where_clause(&filter.parse(&mut params));
///     (format!("SELECT id, email FROM users {}", clause), params)
/// });
/// ```
pub struct LazyQuery<I, O> {
    name: String,
    generator: Generator<I>,
    _marker: PhantomData<fn() -> O>,
}

impl<I, O> Clone for LazyQuery<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            generator: Arc::clone(&self.generator),
            _marker: PhantomData,
        }
    }
}

impl<I, O> fmt::Debug for LazyQuery<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyQuery").field("name", &self.name).finish()
    }
}

impl<I: 'static, O: Output> LazyQuery<I, O> {
    /// Declare a lazy query.
    ///
    /// # Panics
    ///
    /// If `I` is [`Void`]; a query without input has nothing to generate from.
    pub fn new<G>(name: impl Into<String>, generator: G) -> Self
    where
        G: Fn(&I) -> (String, NamedParams) + Send + Sync + 'static,
    {
        let name = name.into();
        assert!(
            TypeId::of::<I>() != TypeId::of::<Void>(),
            "lazy query `{}` must take an input",
            name
        );
        Self {
            name,
            generator: Arc::new(generator),
            _marker: PhantomData,
        }
    }

    /// The query name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the query returns.
    pub fn kind(&self) -> QueryKind {
        kind_of::<O>(None)
    }

    /// Generate and bind the SQL for `input`.
    pub fn build(&self, input: &I) -> (String, Vec<SqlValue>) {
        let (sql, params) = (self.generator)(input);
        bind_named(&sql, &params)
    }

    /// Run the query.
    pub async fn run<E: Executor + ?Sized>(&self, exec: &E, input: &I) -> QueryResult<O> {
        let (sql, args) = self.build(input);
        fetch(exec, &self.name, &sql, &args).await
    }

    /// Run the query one page at a time.
    ///
    /// # Panics
    ///
    /// If the query does not return many rows.
    pub async fn paged<E: Executor + ?Sized>(
        &self,
        exec: &E,
        input: &I,
        pagination: Pagination,
        sorting: &Sorting,
    ) -> QueryResult<Page<O>> {
        assert_eq!(
            self.kind(),
            QueryKind::Many,
            "lazy query `{}` does not return many rows and cannot be paged",
            self.name
        );
        let (sql, args) = self.build(input);
        paginate(exec, &self.name, sql, args, pagination, sorting).await
    }
}

//!
//! Typed query construction over entity roots.
//!
//! A query is built inside a closure receiving a [`QueryBuilder`] (the
//! expression factory, wired to the function registry of the active
//! configuration) and the query object itself. Nothing touches the database
//! until the returned [`ExecutableQuery`] is fetched or executed.
//!
//! ```no_run
//! # use chatstore::{Configuration, Loader, Order};
//! # use chatstore::entry::FaceRecord;
//! # fn demo() -> chatstore::Result<()> {
//! # let factory = Configuration::from_loader(&Loader::default())?.build()?;
//! let session = factory.open_session()?;
//! let faces = session
//!     .select_query::<FaceRecord, _>(|builder, query| {
//!         query.order_by(builder.rand(), Order::Asc);
//!         query.limit(3);
//!     })
//!     .fetch()?;
//! # Ok(()) }
//! ```
use std::marker::PhantomData;

use crate::entity::{Entity, FromRow};
use crate::errors::Result;
use crate::functions::{FunctionDescriptor, FunctionRegistry};
use crate::session::Session;
use crate::value::{FromValue, ToValue, Value};

/// A typed scalar SQL fragment, usable in select lists, order-by and
/// predicates.
#[derive(Debug, Clone)]
pub struct Expr<T> {
    sql: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Expr<T> {
    pub(crate) fn raw<S: Into<String>>(sql: S) -> Self {
        Expr {
            sql: sql.into(),
            _marker: PhantomData,
        }
    }

    pub fn sql_fragment(&self) -> &str {
        &self.sql
    }
}

impl From<i64> for Expr<i64> {
    fn from(v: i64) -> Self {
        Expr::raw(v.to_string())
    }
}

impl From<f64> for Expr<f64> {
    fn from(v: f64) -> Self {
        Expr::raw(v.to_string())
    }
}

/// A boolean condition over expressions.
#[derive(Debug, Clone)]
pub struct Predicate {
    sql: String,
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate {
            sql: format!("({} and {})", self.sql, other.sql),
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate {
            sql: format!("({} or {})", self.sql, other.sql),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn keyword(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// The typed handle for an entity's table inside one query under
/// construction. Constructed once per query, not reusable across queries.
pub struct Root<T: Entity> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Root<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Entity> Copy for Root<T> {}

impl<T: Entity> Root<T> {
    pub(crate) fn new() -> Self {
        Root {
            _marker: PhantomData,
        }
    }

    /// A typed column expression. The column type is the caller's claim; it
    /// is checked when rows are mapped back, not here.
    pub fn get<C>(&self, column: &str) -> Expr<C> {
        Expr::raw(format!("`{}`", column))
    }
}

/// Expression factory handed to query closures. Wraps the function registry
/// of the active configuration so injected functions are reached by name.
pub struct QueryBuilder<'a> {
    registry: &'a FunctionRegistry,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(registry: &'a FunctionRegistry) -> Self {
        QueryBuilder { registry }
    }

    fn function(&self, name: &str) -> &FunctionDescriptor {
        // a miss here means queries were issued before the configuration
        // builder ran function registration, which is a programming error
        self.registry
            .lookup(name)
            .unwrap_or_else(|| panic!("sql function `{}` is not registered", name))
    }

    /// Uniform random double in `[0.0, 1.0)`.
    pub fn rand(&self) -> Expr<f64> {
        Expr::raw(self.function("rand").render(None))
    }

    /// Uniform random integer in the closed range `[0, bound]`. The bound is
    /// an `i64` literal or any `Int64`-typed expression, nested scalar
    /// subqueries included.
    pub fn dice<B: Into<Expr<i64>>>(&self, bound: B) -> Expr<i64> {
        let bound = bound.into();
        Expr::raw(self.function("dice").render(Some(bound.sql_fragment())))
    }

    pub fn literal(&self, v: i64) -> Expr<i64> {
        Expr::from(v)
    }

    pub fn text(&self, v: &str) -> Expr<String> {
        Expr::raw(format!("'{}'", v.replace('\'', "''")))
    }

    pub fn max<T>(&self, expr: Expr<T>) -> Expr<T> {
        Expr::raw(format!("max({})", expr.sql_fragment()))
    }

    /// A scalar subquery over another entity root.
    pub fn scalar_subquery<T, V, F>(&self, build: F) -> Expr<V>
    where
        T: Entity,
        F: FnOnce(Root<T>) -> Expr<V>,
    {
        let expr = build(Root::new());
        Expr::raw(format!(
            "(select {} from {})",
            expr.sql_fragment(),
            T::table_name()
        ))
    }

    fn compare<T>(&self, lhs: Expr<T>, op: &str, rhs: Expr<T>) -> Predicate {
        Predicate {
            sql: format!("{} {} {}", lhs.sql_fragment(), op, rhs.sql_fragment()),
        }
    }

    pub fn eq<T, R: Into<Expr<T>>>(&self, lhs: Expr<T>, rhs: R) -> Predicate {
        self.compare(lhs, "=", rhs.into())
    }

    pub fn ne<T, R: Into<Expr<T>>>(&self, lhs: Expr<T>, rhs: R) -> Predicate {
        self.compare(lhs, "<>", rhs.into())
    }

    pub fn gt<T, R: Into<Expr<T>>>(&self, lhs: Expr<T>, rhs: R) -> Predicate {
        self.compare(lhs, ">", rhs.into())
    }

    pub fn ge<T, R: Into<Expr<T>>>(&self, lhs: Expr<T>, rhs: R) -> Predicate {
        self.compare(lhs, ">=", rhs.into())
    }

    pub fn lt<T, R: Into<Expr<T>>>(&self, lhs: Expr<T>, rhs: R) -> Predicate {
        self.compare(lhs, "<", rhs.into())
    }

    pub fn le<T, R: Into<Expr<T>>>(&self, lhs: Expr<T>, rhs: R) -> Predicate {
        self.compare(lhs, "<=", rhs.into())
    }
}

/// A select statement under construction against one entity root.
pub struct SelectQuery<T: Entity> {
    root: Root<T>,
    projection: Option<String>,
    predicate: Option<Predicate>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl<T: Entity> SelectQuery<T> {
    pub(crate) fn new() -> Self {
        SelectQuery {
            root: Root::new(),
            projection: None,
            predicate: None,
            order: vec![],
            limit: None,
        }
    }

    pub fn root(&self) -> Root<T> {
        self.root
    }

    /// Replace the default all-columns projection with a scalar expression;
    /// fetch the result with
    /// [`fetch_scalar`](ExecutableQuery::fetch_scalar).
    pub fn select<V>(&mut self, expr: Expr<V>) -> &mut Self {
        self.projection = Some(expr.sql_fragment().to_string());
        self
    }

    pub fn filter(&mut self, predicate: Predicate) -> &mut Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn order_by<V>(&mut self, expr: Expr<V>, order: Order) -> &mut Self {
        self.order
            .push(format!("{} {}", expr.sql_fragment(), order.keyword()));
        self
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn into_sql(self) -> String {
        let projection = self.projection.unwrap_or_else(|| {
            T::columns()
                .iter()
                .map(|c| format!("`{}`", c))
                .collect::<Vec<_>>()
                .join(", ")
        });
        let mut sql = format!("select {} from {}", projection, T::table_name());
        if let Some(predicate) = self.predicate {
            sql.push_str(" where ");
            sql.push_str(&predicate.sql);
        }
        if !self.order.is_empty() {
            sql.push_str(" order by ");
            sql.push_str(&self.order.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" limit {}", limit));
        }
        sql
    }
}

/// A bulk update statement under construction. Set values are carried as
/// bound parameters, never spliced into the SQL text.
pub struct UpdateQuery<T: Entity> {
    root: Root<T>,
    sets: Vec<(String, Value)>,
    predicate: Option<Predicate>,
}

impl<T: Entity> UpdateQuery<T> {
    pub(crate) fn new() -> Self {
        UpdateQuery {
            root: Root::new(),
            sets: vec![],
            predicate: None,
        }
    }

    pub fn root(&self) -> Root<T> {
        self.root
    }

    pub fn set<V: ToValue>(&mut self, column: &str, value: V) -> &mut Self {
        self.sets.push((column.to_string(), value.to_value()));
        self
    }

    pub fn filter(&mut self, predicate: Predicate) -> &mut Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub(crate) fn into_sql(self) -> (String, Vec<Value>) {
        let assignments = self
            .sets
            .iter()
            .map(|(column, _)| format!("`{}` = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("update {} set {}", T::table_name(), assignments);
        if let Some(predicate) = self.predicate {
            sql.push_str(" where ");
            sql.push_str(&predicate.sql);
        }
        let params = self.sets.into_iter().map(|(_, value)| value).collect();
        (sql, params)
    }
}

/// A finished query bound to the session that built it. No I/O happens
/// before one of the consuming methods runs.
pub struct ExecutableQuery<'a, T> {
    session: &'a Session,
    sql: String,
    params: Vec<Value>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> ExecutableQuery<'a, T> {
    pub(crate) fn new(session: &'a Session, sql: String, params: Vec<Value>) -> Self {
        ExecutableQuery {
            session,
            sql,
            params,
            _marker: PhantomData,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Run a projection query and map the single result value.
    pub fn fetch_scalar<V: FromValue>(self) -> Result<V> {
        let rows = self.session.execute_result(&self.sql, self.params)?;
        let row = rows.iter().next();
        match row {
            Some(row) => row.first(),
            None => Err(crate::StoreError::DataError(
                "zero rows returned".to_string(),
            )),
        }
    }

    /// Run a statement that returns no rows; yields the affected row count.
    pub fn execute(self) -> Result<u64> {
        self.session.execute_update(&self.sql, self.params)
    }
}

impl<'a, T: Entity + FromRow> ExecutableQuery<'a, T> {
    pub fn fetch(self) -> Result<Vec<T>> {
        let rows = self.session.execute_result(&self.sql, self.params)?;
        rows.iter().map(|row| T::from_row(&row)).collect()
    }

    pub fn first(self) -> Result<Option<T>> {
        let rows = self.session.execute_result(&self.sql, self.params)?;
        let row = rows.iter().next();
        row.map(|row| T::from_row(&row)).transpose()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dialect::Dialect;
    use crate::entry::{FaceRecord, MessageRecord};

    fn registry() -> FunctionRegistry {
        FunctionRegistry::standard(Dialect::MariaDb)
    }

    #[test]
    fn select_all_columns_by_default() {
        let query = SelectQuery::<FaceRecord>::new();
        let sql = query.into_sql();
        assert!(sql.starts_with("select `md5`, `code`,"));
        assert!(sql.ends_with("from face_record"));
    }

    #[test]
    fn order_by_rand_with_limit() {
        let registry = registry();
        let builder = QueryBuilder::new(&registry);
        let mut query = SelectQuery::<FaceRecord>::new();
        query.order_by(builder.rand(), Order::Asc).limit(3);
        let sql = query.into_sql();
        assert!(sql.ends_with("order by rand() asc limit 3"), "{}", sql);
    }

    #[test]
    fn dice_bound_from_subquery() {
        let registry = registry();
        let builder = QueryBuilder::new(&registry);
        let mut query = SelectQuery::<MessageRecord>::new();
        let root = query.root();
        let id = root.get::<i64>("id");
        let max = builder.scalar_subquery::<MessageRecord, _, _>(|m| builder.max(m.get("id")));
        query.filter(builder.ge(id, builder.dice(max))).limit(3);
        let sql = query.into_sql();
        assert!(
            sql.contains("where `id` >= floor(rand() * ((select max(`id`) from message_record) + 1))"),
            "{}",
            sql
        );
    }

    #[test]
    fn update_carries_bound_parameters() {
        let registry = registry();
        let builder = QueryBuilder::new(&registry);
        let mut update = UpdateQuery::<MessageRecord>::new();
        let root = update.root();
        update.set("recall", true);
        update.filter(builder.eq(root.get::<i64>("id"), 42));
        let (sql, params) = update.into_sql();
        assert_eq!(sql, "update message_record set `recall` = ? where `id` = 42");
        assert_eq!(params, vec![Value::Bool(true)]);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn missing_function_is_fatal() {
        let registry = FunctionRegistry::new();
        let builder = QueryBuilder::new(&registry);
        let _ = builder.rand();
    }
}

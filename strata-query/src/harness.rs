//! Smoke-testing registered queries against a live database.
//!
//! A [`QuerySuite`] is handed the queries to exercise along with a sample
//! input for each. Every query runs once; many-row queries also run paged.
//! Errors a well-formed query can legitimately produce on an empty or
//! partial schema (no rows, constraint violations) are tolerated; anything
//! else, such as a syntax error or a column that does not exist, fails.
//!
//! ```rust,ignore
//! let report = QuerySuite::new(db)
//!     .query(queries::list_users(), vec![])
//!     .query(queries::user_by_id(), vec![ById::default()])
//!     .lazy_query(queries::search_users(), Where::default())
//!     .run_all()
//!     .await;
//! report.assert_ok();
//! ```
//!
//! With the `fuzz` feature, `QuerySuite::fuzz_query` and
//! `QuerySuite::fuzz_lazy_query` run a query over inputs drawn from a
//! proptest strategy; the `fuzz` module has strategies for filter trees.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
#[cfg(any(test, feature = "fuzz"))]
use proptest::strategy::Strategy;
use tracing::{info, warn};

use crate::error::{QueryError, QueryResult};
#[cfg(any(test, feature = "fuzz"))]
use crate::fuzz;
use crate::pagination::Pagination;
use crate::param::Params;
use crate::query::{Executor, LazyQuery, Output, Query, QueryKind};
use crate::types::Sorting;

type Case<E> = Box<dyn Fn(Arc<E>) -> BoxFuture<'static, QueryResult<()>> + Send + Sync>;

/// Queries to run against one executor.
pub struct QuerySuite<E> {
    exec: Arc<E>,
    cases: Vec<(String, Case<E>)>,
}

impl<E: Executor + 'static> QuerySuite<E> {
    /// Create an empty suite.
    pub fn new(exec: E) -> Self {
        Self::shared(Arc::new(exec))
    }

    /// Create an empty suite over a shared executor.
    pub fn shared(exec: Arc<E>) -> Self {
        Self {
            exec,
            cases: Vec::new(),
        }
    }

    /// Number of registered cases.
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Whether no case is registered.
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Register an arbitrary case.
    pub fn case<F, Fut>(mut self, name: impl Into<String>, run: F) -> Self
    where
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = QueryResult<()>> + Send + 'static,
    {
        self.cases
            .push((name.into(), Box::new(move |exec| run(exec).boxed())));
        self
    }

    /// Register a query, run with `sample`; many-row queries also run paged.
    pub fn query<I, O>(self, query: Query<I, O>, sample: Vec<I>) -> Self
    where
        I: Params + Clone + 'static,
        O: Output,
    {
        let name = query.name().to_string();
        self.register_query(name, query, sample)
    }

    /// Register a lazy query, run with `sample`; many-row queries also run paged.
    pub fn lazy_query<I, O>(self, query: LazyQuery<I, O>, sample: I) -> Self
    where
        I: Clone + Send + Sync + 'static,
        O: Output,
    {
        let name = query.name().to_string();
        self.register_lazy_query(name, query, sample)
    }

    fn register_query<I, O>(self, name: String, query: Query<I, O>, sample: Vec<I>) -> Self
    where
        I: Params + Clone + 'static,
        O: Output,
    {
        let paged = query.kind() == QueryKind::Many;

        let plain = {
            let (query, sample) = (query.clone(), sample.clone());
            move |exec: Arc<E>| {
                let (query, sample) = (query.clone(), sample.clone());
                async move { query.run(&*exec, sample).await.map(drop) }
            }
        };
        let suite = self.case(name.clone(), plain);
        if !paged {
            return suite;
        }

        suite.case(format!("{} (paged)", name), move |exec: Arc<E>| {
            let (query, sample) = (query.clone(), sample.clone());
            async move {
                query
                    .paged(&*exec, sample, Pagination::new(10, 0), &Sorting::new())
                    .await
                    .map(drop)
            }
        })
    }

    fn register_lazy_query<I, O>(self, name: String, query: LazyQuery<I, O>, sample: I) -> Self
    where
        I: Clone + Send + Sync + 'static,
        O: Output,
    {
        let paged = query.kind() == QueryKind::Many;

        let plain = {
            let (query, sample) = (query.clone(), sample.clone());
            move |exec: Arc<E>| {
                let (query, sample) = (query.clone(), sample.clone());
                async move { query.run(&*exec, &sample).await.map(drop) }
            }
        };
        let suite = self.case(name.clone(), plain);
        if !paged {
            return suite;
        }

        suite.case(format!("{} (paged)", name), move |exec: Arc<E>| {
            let (query, sample) = (query.clone(), sample.clone());
            async move {
                query
                    .paged(&*exec, &sample, Pagination::new(10, 0), &Sorting::new())
                    .await
                    .map(drop)
            }
        })
    }

    /// Register `count` runs of a query, each with one input drawn from
    /// `inputs`. Many-row queries also run paged.
    ///
    /// # Panics
    ///
    /// If the query takes no input; register it with [`QuerySuite::query`].
    #[cfg(any(test, feature = "fuzz"))]
    pub fn fuzz_query<I, O, S>(mut self, query: Query<I, O>, inputs: S, count: usize) -> Self
    where
        I: Params + Clone + 'static,
        O: Output,
        S: Strategy<Value = I>,
    {
        assert!(
            !I::IS_VOID,
            "query `{}` takes no input and cannot be fuzzed",
            query.name()
        );
        for (n, sample) in fuzz::samples(&inputs, count).into_iter().enumerate() {
            let name = format!("{} (fuzzed #{})", query.name(), n);
            self = self.register_query(name, query.clone(), vec![sample]);
        }
        self
    }

    /// Register `count` runs of a lazy query, each with an input drawn from
    /// `inputs`. Many-row queries also run paged.
    #[cfg(any(test, feature = "fuzz"))]
    pub fn fuzz_lazy_query<I, O, S>(mut self, query: LazyQuery<I, O>, inputs: S, count: usize) -> Self
    where
        I: Clone + Send + Sync + 'static,
        O: Output,
        S: Strategy<Value = I>,
    {
        for (n, sample) in fuzz::samples(&inputs, count).into_iter().enumerate() {
            let name = format!("{} (fuzzed #{})", query.name(), n);
            self = self.register_lazy_query(name, query.clone(), sample);
        }
        self
    }

    /// Run every case in registration order.
    pub async fn run_all(&self) -> SuiteReport {
        let mut report = SuiteReport::default();
        for (name, case) in &self.cases {
            match case(Arc::clone(&self.exec)).await {
                Ok(()) => {
                    info!(case = %name, "query ok");
                    report.passed.push(name.clone());
                }
                Err(e) if e.is_benign() => {
                    info!(case = %name, code = %e.code.code(), "query ok with tolerated error");
                    report.tolerated.push((name.clone(), e));
                }
                Err(e) => {
                    warn!(case = %name, error = %e, "query failed");
                    report.failed.push((name.clone(), e));
                }
            }
        }
        report
    }
}

/// Outcome of [`QuerySuite::run_all`].
#[derive(Debug, Default)]
pub struct SuiteReport {
    /// Cases that succeeded.
    pub passed: Vec<String>,
    /// Cases that returned a tolerated error.
    pub tolerated: Vec<(String, QueryError)>,
    /// Cases that failed.
    pub failed: Vec<(String, QueryError)>,
}

impl SuiteReport {
    /// Whether no case failed.
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    /// Panic with the failures, if any.
    pub fn assert_ok(&self) {
        assert!(self.is_ok(), "{}", self);
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} passed, {} tolerated, {} failed",
            self.passed.len(),
            self.tolerated.len(),
            self.failed.len()
        )?;
        for (name, error) in &self.failed {
            writeln!(f, "--- {}\n{}", name, error)?;
        }
        Ok(())
    }
}

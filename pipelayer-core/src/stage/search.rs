//! Atlas Search stages: `$search` and `$searchMeta`.
//!
//! Both stages take an index name and exactly one operator. Operators are plain values and can
//! be nested through [`SearchOperator::compound`]:
//!
//! ```ignore
//! p.search(|s| {
//!     s.index("default")
//!         .operator(SearchOperator::compound(|c| {
//!             c.must(SearchOperator::text("varieties", "description"));
//!             c.must_not(SearchOperator::text("apples", "description"));
//!             c.filter(SearchRange::new("price").lte(10));
//!         }))
//!         .count(SearchCount::Total);
//! });
//! p.sort(|s| {
//!     s.search_score("score");
//! });
//! ```
//!
//! Search paths are resolved as plain dotted names, without the `$` sigil.

use bson::{Bson, Document, doc};

use crate::{
    context::ResolutionContext,
    error::{AggregationError, AggregationResult},
    property::FieldPath,
    stage::{Stage, stage_document},
};

/// Range bounds of a `range` search operator.
#[derive(Debug, Clone)]
pub struct SearchRange {
    path: FieldPath,
    bounds: Vec<(&'static str, Bson)>,
}

impl SearchRange {
    pub fn new(path: impl Into<FieldPath>) -> Self {
        Self { path: path.into(), bounds: Vec::new() }
    }

    pub fn gt(self, value: impl Into<Bson>) -> Self {
        self.bound("gt", value)
    }

    pub fn gte(self, value: impl Into<Bson>) -> Self {
        self.bound("gte", value)
    }

    pub fn lt(self, value: impl Into<Bson>) -> Self {
        self.bound("lt", value)
    }

    pub fn lte(self, value: impl Into<Bson>) -> Self {
        self.bound("lte", value)
    }

    fn bound(mut self, name: &'static str, value: impl Into<Bson>) -> Self {
        self.bounds.retain(|(bound, _)| *bound != name);
        self.bounds.push((name, value.into()));
        self
    }
}

/// The clauses of a `compound` search operator.
#[derive(Debug, Clone, Default)]
pub struct CompoundScope {
    must: Vec<SearchOperator>,
    must_not: Vec<SearchOperator>,
    should: Vec<SearchOperator>,
    filter: Vec<SearchOperator>,
    minimum_should_match: Option<i32>,
}

impl CompoundScope {
    /// Documents must match `operator`; it contributes to the score.
    pub fn must(&mut self, operator: impl Into<SearchOperator>) -> &mut Self {
        self.must.push(operator.into());
        self
    }

    /// Documents must not match `operator`.
    pub fn must_not(&mut self, operator: impl Into<SearchOperator>) -> &mut Self {
        self.must_not.push(operator.into());
        self
    }

    /// Documents matching `operator` score higher.
    pub fn should(&mut self, operator: impl Into<SearchOperator>) -> &mut Self {
        self.should.push(operator.into());
        self
    }

    /// Documents must match `operator`; it does not contribute to the score.
    pub fn filter(&mut self, operator: impl Into<SearchOperator>) -> &mut Self {
        self.filter.push(operator.into());
        self
    }

    pub fn minimum_should_match(&mut self, count: i32) -> &mut Self {
        self.minimum_should_match = Some(count);
        self
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Document> {
        let clause_lists = [&self.must, &self.must_not, &self.should, &self.filter];
        if clause_lists.iter().all(|clauses| clauses.is_empty()) {
            return Err(AggregationError::incomplete_stage(
                "$search",
                "a compound operator requires at least one clause",
            ));
        }

        let mut body = Document::new();
        for (name, clauses) in [
            ("must", &self.must),
            ("mustNot", &self.must_not),
            ("should", &self.should),
            ("filter", &self.filter),
        ] {
            if !clauses.is_empty() {
                let clauses = clauses
                    .iter()
                    .map(|clause| clause.resolve(ctx))
                    .collect::<AggregationResult<Vec<_>>>()?;
                body.insert(name, clauses);
            }
        }
        if let Some(count) = self.minimum_should_match {
            body.insert("minimumShouldMatch", count);
        }

        Ok(body)
    }
}

/// One Atlas Search operator.
#[derive(Debug, Clone)]
pub enum SearchOperator {
    /// Full-text search of `query` in `path`.
    Text { query: String, path: FieldPath },
    /// Ordered term sequence search of `query` in `path`.
    Phrase { query: String, path: FieldPath },
    /// Documents where `path` is present.
    Exists { path: FieldPath },
    /// Documents where `path` equals `value`.
    Equals { path: FieldPath, value: Bson },
    /// Documents where `path` falls within the bounds.
    Range(SearchRange),
    /// A combination of other operators.
    Compound(Box<CompoundScope>),
}

impl SearchOperator {
    pub fn text(query: impl Into<String>, path: impl Into<FieldPath>) -> Self {
        SearchOperator::Text { query: query.into(), path: path.into() }
    }

    pub fn phrase(query: impl Into<String>, path: impl Into<FieldPath>) -> Self {
        SearchOperator::Phrase { query: query.into(), path: path.into() }
    }

    pub fn exists(path: impl Into<FieldPath>) -> Self {
        SearchOperator::Exists { path: path.into() }
    }

    pub fn equals(path: impl Into<FieldPath>, value: impl Into<Bson>) -> Self {
        SearchOperator::Equals { path: path.into(), value: value.into() }
    }

    pub fn range(range: SearchRange) -> Self {
        SearchOperator::Range(range)
    }

    /// Combines the clauses declared by `build`.
    pub fn compound(build: impl FnOnce(&mut CompoundScope)) -> Self {
        let mut scope = CompoundScope::default();
        build(&mut scope);
        SearchOperator::Compound(Box::new(scope))
    }

    fn name(&self) -> &'static str {
        match self {
            SearchOperator::Text { .. } => "text",
            SearchOperator::Phrase { .. } => "phrase",
            SearchOperator::Exists { .. } => "exists",
            SearchOperator::Equals { .. } => "equals",
            SearchOperator::Range(_) => "range",
            SearchOperator::Compound(_) => "compound",
        }
    }

    /// Resolves into `{ operatorName: { ... } }`.
    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Document> {
        let body = match self {
            SearchOperator::Text { query, path } | SearchOperator::Phrase { query, path } => {
                doc! { "query": query.as_str(), "path": path.resolve(ctx)? }
            }
            SearchOperator::Exists { path } => doc! { "path": path.resolve(ctx)? },
            SearchOperator::Equals { path, value } => {
                doc! { "path": path.resolve(ctx)?, "value": value.clone() }
            }
            SearchOperator::Range(range) => {
                let mut body = doc! { "path": range.path.resolve(ctx)? };
                for (bound, value) in &range.bounds {
                    body.insert(*bound, value.clone());
                }
                body
            }
            SearchOperator::Compound(scope) => scope.resolve(ctx)?,
        };

        Ok(stage_document(self.name(), body))
    }
}

impl From<SearchRange> for SearchOperator {
    fn from(range: SearchRange) -> Self {
        SearchOperator::Range(range)
    }
}

/// How `$search` counts matching documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCount {
    /// An exact count.
    Total,
    /// A lower bound, cheaper on large result sets.
    LowerBound,
}

/// Builder shared by `$search` and `$searchMeta`.
#[derive(Debug, Clone)]
pub struct SearchStage {
    name: &'static str,
    index: Option<String>,
    operator: Option<SearchOperator>,
    count: Option<SearchCount>,
    return_stored_source: Option<bool>,
}

impl SearchStage {
    /// Creates a `$search` builder.
    pub fn search() -> Self {
        Self::with_name("$search")
    }

    /// Creates a `$searchMeta` builder.
    pub fn search_meta() -> Self {
        Self::with_name("$searchMeta")
    }

    fn with_name(name: &'static str) -> Self {
        Self {
            name,
            index: None,
            operator: None,
            count: None,
            return_stored_source: None,
        }
    }

    /// Names the search index. The engine uses `default` when unset.
    pub fn index(&mut self, index: impl Into<String>) -> &mut Self {
        self.index = Some(index.into());
        self
    }

    /// Sets the operator. A later call replaces an earlier one.
    pub fn operator(&mut self, operator: impl Into<SearchOperator>) -> &mut Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn count(&mut self, count: SearchCount) -> &mut Self {
        self.count = Some(count);
        self
    }

    pub fn return_stored_source(&mut self, enabled: bool) -> &mut Self {
        self.return_stored_source = Some(enabled);
        self
    }
}

impl Stage for SearchStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn resolve(&self, ctx: &ResolutionContext) -> AggregationResult<Option<Document>> {
        let Some(operator) = &self.operator else {
            return Err(AggregationError::incomplete_stage(self.name, "a search operator is required"));
        };

        let mut body = Document::new();
        if let Some(index) = &self.index {
            body.insert("index", index.as_str());
        }
        for (key, value) in operator.resolve(ctx)? {
            body.insert(key, value);
        }
        if let Some(count) = self.count {
            let kind = match count {
                SearchCount::Total => "total",
                SearchCount::LowerBound => "lowerBound",
            };
            body.insert("count", doc! { "type": kind });
        }
        if let Some(enabled) = self.return_stored_source {
            body.insert("returnStoredSource", enabled);
        }

        Ok(Some(stage_document(self.name, body)))
    }
}

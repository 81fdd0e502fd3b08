//! Criteria search over one root entity.
//!
//! ```text
//! RawSearchRequest --parse_request--> SearchRequest
//!     --QueryBuilder--> QueryPlan --BackingStore--> ResultRow*
//!     --RowReconstructor--> entities
//! ```
//!
//! Every validation error surfaces before the backing store is called.

pub mod aggregate_format;
pub mod path_format;
pub mod query_builder;
pub mod reconstruct;
pub mod request;

pub use aggregate_format::AggregateFormatter;
pub use path_format::{PathFormatter, PAGE_METADATA_FIELDS};
pub use query_builder::{BuiltQuery, QueryBuilder, ResultShape};
pub use reconstruct::{
    AssociationReconstructor, JsonReconstructor, Reconstruct, RowReconstructor,
    SecondaryReconstructor,
};
pub use request::{
    Aggregates, PageRequest, RawField, RawFilters, RawSearchRequest, SearchRequest, Selection,
};

use crate::access::ResultRow;
use crate::catalog::Catalog;
use crate::config::SearchConfig;
use crate::error::{SearchError, SearchResult};
use crate::filter::{
    parameters_to_filter, FieldValueTransformer, FilterMapParser, FilterParameter,
    IdentityTransformer,
};
use crate::store::{BackingStore, CancellationToken, PageWindow};
use log::debug;
use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::sync::Arc;

/// Pagination metadata for one page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub current_page_count: usize,
    pub total: u64,
}

impl PageInfo {
    /// An unpaged search is reported as a single page holding everything
    pub fn new(window: Option<PageWindow>, current_page_count: usize, total: u64) -> Self {
        let total_usize = usize::try_from(total).unwrap_or(usize::MAX);
        match window {
            Some(window) if window.limit > 0 => Self {
                current_page: window.offset / window.limit,
                page_size: window.limit,
                total_pages: total_usize.div_ceil(window.limit),
                current_page_count,
                total,
            },
            _ => Self {
                current_page: 0,
                page_size: total_usize,
                total_pages: usize::from(total > 0),
                current_page_count,
                total,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchHits<E> {
    /// Reconstructed root entities
    Entities(Vec<E>),
    /// Flat rows keyed by selection alias
    Rows(Vec<ResultRow>),
}

impl<E> SearchHits<E> {
    pub fn len(&self) -> usize {
        match self {
            SearchHits::Entities(items) => items.len(),
            SearchHits::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage<E> {
    pub hits: SearchHits<E>,
    /// Present when a pagination metadata field was requested
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Hit<E> {
    Entity(E),
    Row(ResultRow),
}

impl Hit<Json> {
    pub fn to_json(&self) -> Json {
        match self {
            Hit::Entity(entity) => entity.clone(),
            Hit::Row(row) => row.to_json(),
        }
    }
}

impl SearchPage<Json> {
    /// Hits under `wrapper`, followed by the pagination fields when present
    pub fn to_json(&self, wrapper: &str) -> Json {
        let hits = match &self.hits {
            SearchHits::Entities(entities) => entities.clone(),
            SearchHits::Rows(rows) => rows.iter().map(ResultRow::to_json).collect(),
        };
        let mut object = Map::new();
        object.insert(wrapper.to_string(), Json::Array(hits));
        if let Some(Json::Object(info)) = self.page_info.and_then(|i| serde_json::to_value(i).ok()) {
            object.extend(info);
        }
        Json::Object(object)
    }
}

/// Runs criteria searches for one root entity against a backing store.
///
/// Shared freely between threads; each call builds its own plan.
pub struct CriteriaSearchExecutor<S, R = JsonReconstructor> {
    catalog: Arc<Catalog>,
    store: Arc<S>,
    root: String,
    config: SearchConfig,
    formatter: PathFormatter,
    transformer: Arc<dyn FieldValueTransformer>,
    reconstructor: R,
    cancel: CancellationToken,
}

impl<S: BackingStore> CriteriaSearchExecutor<S, JsonReconstructor> {
    /// Executor for `root`, reconstructing entities as JSON
    pub fn new(catalog: Arc<Catalog>, store: Arc<S>, root: &str) -> SearchResult<Self> {
        let root_path = catalog.get_entity(root)?.primary_root_path();
        let config = SearchConfig::default();
        Ok(Self {
            catalog,
            store,
            root: root.to_string(),
            formatter: PathFormatter::new(config.wrapper_marker.clone()),
            config,
            transformer: Arc::new(IdentityTransformer),
            reconstructor: JsonReconstructor::new(root_path),
            cancel: CancellationToken::new(),
        })
    }
}

impl<S: BackingStore, R: RowReconstructor> CriteriaSearchExecutor<S, R> {
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.formatter = PathFormatter::new(config.wrapper_marker.clone());
        self.config = config;
        self
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn FieldValueTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    /// Every later call observes `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_reconstructor<R2: RowReconstructor>(self, reconstructor: R2) -> CriteriaSearchExecutor<S, R2> {
        CriteriaSearchExecutor {
            catalog: self.catalog,
            store: self.store,
            root: self.root,
            config: self.config,
            formatter: self.formatter,
            transformer: self.transformer,
            reconstructor,
            cancel: self.cancel,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Parse and normalise a wire request against this executor's root
    pub fn parse_request(&self, raw: &RawSearchRequest) -> SearchResult<SearchRequest> {
        let parser = FilterMapParser::new(self.catalog.as_ref(), &self.root);
        let mut filter_groups = Vec::new();
        let mut unconstrained = false;
        for group in raw.filters.groups() {
            match parser.parse(group)? {
                Some(node) => filter_groups.push(node),
                None => unconstrained = true,
            }
        }
        // An empty group matches everything, and so does their disjunction
        if unconstrained {
            filter_groups.clear();
        }

        let parameters = raw
            .parameters
            .iter()
            .map(|(path, parameter)| {
                FilterParameter::from_raw(self.formatter.format(path), parameter.clone())
            })
            .collect::<SearchResult<Vec<_>>>()?;
        let parameters = parameters_to_filter(self.catalog.as_ref(), &self.root, &parameters)?;

        let mut page_metadata = false;
        let mut selections = Vec::new();
        for field in &raw.fields {
            let selection = match field {
                RawField::Path(path) => Selection::new(self.formatter.format(path)),
                RawField::Detailed {
                    path,
                    alias,
                    priority,
                    direction,
                } => Selection {
                    path: self.formatter.format(path),
                    alias: alias.clone(),
                    priority: *priority,
                    direction: direction.unwrap_or_default(),
                },
            };
            if PathFormatter::is_metadata(&selection.path) {
                page_metadata = true;
            } else {
                selections.push(selection);
            }
        }

        let selected: Vec<String> = selections.iter().map(|s| s.path.clone()).collect();
        let aggregates = AggregateFormatter::new(&self.formatter).format(raw.aggregates.as_ref(), &selected)?;

        Ok(SearchRequest {
            filter_groups,
            parameters,
            selections,
            page: raw.page,
            aggregates,
            page_metadata,
        })
    }

    /// Compile `request` without executing it
    pub fn plan(&self, request: &SearchRequest) -> SearchResult<BuiltQuery> {
        let window = self.page_window(request.page.as_ref())?;
        self.build(request, window)
    }

    pub fn search(&self, request: &SearchRequest) -> SearchResult<SearchPage<R::Entity>> {
        let window = self.page_window(request.page.as_ref())?;
        let built = self.build(request, window)?;
        let rows = self.store.fetch(&built.plan, &self.cancel)?;

        let page_info = if request.page_metadata {
            // Row totals follow the paged stream: groups, or one row per joined match
            let total = if built.plan.is_aggregate() || built.shape == ResultShape::Rows {
                let mut unpaged = built.plan.clone();
                unpaged.page = None;
                self.store.fetch(&unpaged, &self.cancel)?.len() as u64
            } else {
                self.store.count(&built.plan, &self.cancel)?
            };
            Some(PageInfo::new(window, rows.len(), total))
        } else {
            None
        };

        debug!("Search on {} returned {} rows", self.root, rows.len());
        let hits = match built.shape {
            ResultShape::Entities => SearchHits::Entities(
                rows.iter().map(|row| self.reconstructor.reconstruct(row)).collect(),
            ),
            ResultShape::Rows => SearchHits::Rows(rows),
        };
        Ok(SearchPage { hits, page_info })
    }

    /// Number of distinct root entities matching the filters
    pub fn count(&self, request: &SearchRequest) -> SearchResult<u64> {
        let built = self.build(request, None)?;
        Ok(self.store.count(&built.plan, &self.cancel)?)
    }

    pub fn exists(&self, request: &SearchRequest) -> SearchResult<bool> {
        let built = self.build(request, None)?;
        let rows = self.store.fetch(&built.plan.limited(1), &self.cancel)?;
        Ok(!rows.is_empty())
    }

    /// The single match of an equality-only request.
    ///
    /// The request must hold exactly one filter group built from equality
    /// constraints joined by `and`.
    pub fn search_unique(&self, request: &SearchRequest) -> SearchResult<Option<Hit<R::Entity>>> {
        match request.filter_groups.as_slice() {
            [group] if group.is_equality_conjunction() => {}
            _ => {
                return Err(SearchError::malformed(
                    "filters",
                    "a unique search needs one group of equality constraints",
                ))
            }
        }

        let built = self.build(request, None)?;
        let mut rows = self.store.fetch(&built.plan.limited(2), &self.cancel)?;
        if rows.len() > 1 {
            return Err(SearchError::NonUniqueResult { found: rows.len() });
        }
        Ok(rows.pop().map(|row| match built.shape {
            ResultShape::Entities => Hit::Entity(self.reconstructor.reconstruct(&row)),
            ResultShape::Rows => Hit::Row(row),
        }))
    }

    pub fn exists_unique(&self, request: &SearchRequest) -> SearchResult<bool> {
        Ok(self.search_unique(request)?.is_some())
    }

    fn build(&self, request: &SearchRequest, window: Option<PageWindow>) -> SearchResult<BuiltQuery> {
        QueryBuilder::new(
            self.catalog.as_ref(),
            &self.root,
            &self.formatter,
            self.transformer.as_ref(),
        )
        .build(request, window)
    }

    /// Offset and limit for a requested page; the default size fills a missing one
    fn page_window(&self, page: Option<&PageRequest>) -> SearchResult<Option<PageWindow>> {
        let Some(page) = page else {
            return Ok(None);
        };
        let size = page.size.unwrap_or(self.config.default_page_size);
        if size == 0 || size > self.config.max_page_size {
            return Err(SearchError::InvalidPage(format!(
                "page size {} is outside 1..={}",
                size, self.config.max_page_size
            )));
        }
        let offset = page
            .number
            .checked_mul(size)
            .ok_or_else(|| SearchError::InvalidPage(format!("page {} is out of range", page.number)))?;
        Ok(Some(PageWindow { offset, limit: size }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::library_catalog;
    use crate::executor::SortOrder;
    use crate::store::{MemoryStore, QueryPlan, StoreError, StoreResult};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn library_data() -> Json {
        json!({
            "Publisher": [
                {"id": 1, "name": "Gollancz", "country": "UK"},
                {"id": 2, "name": "Ace", "country": "US"}
            ],
            "Author": [
                {"id": 1, "name": "Frank Herbert", "born": "1920-10-08", "publisher": 2},
                {"id": 2, "name": "Jane Austen", "born": "1775-12-16", "publisher": 1},
                {"id": 3, "name": "William Gibson", "born": "1948-03-17", "publisher": 2}
            ],
            "Book": [
                {"id": 1, "title": "Dune", "price": 9.5, "pages": 412, "category": "scifi", "published": "1965-08-01", "author": 1},
                {"id": 2, "title": "Emma", "price": 4.0, "pages": 474, "category": "classic", "published": "1815-12-23", "author": 2},
                {"id": 3, "title": "Neuromancer", "price": 7.5, "pages": 271, "category": "scifi", "published": "1984-07-01", "author": 3},
                {"id": 4, "title": "Persuasion", "pages": 249, "category": "classic", "published": "1817-12-20", "author": 2},
                {"id": 5, "title": "Children of Dune", "price": 8.0, "pages": 444, "category": "scifi", "published": "1976-04-01", "author": 1},
                {"id": 6, "title": "Untitled"}
            ]
        })
    }

    /// Counts store calls so tests can assert validation happens first
    struct CountingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
    }

    impl BackingStore for CountingStore {
        fn fetch(&self, plan: &QueryPlan, cancel: &CancellationToken) -> StoreResult<Vec<ResultRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(plan, cancel)
        }

        fn count(&self, plan: &QueryPlan, cancel: &CancellationToken) -> StoreResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.count(plan, cancel)
        }
    }

    fn executor(root: &str) -> anyhow::Result<CriteriaSearchExecutor<CountingStore>> {
        let catalog = Arc::new(library_catalog()?);
        let inner = MemoryStore::new(Arc::clone(&catalog))?;
        inner.load_json(&library_data())?;
        let store = Arc::new(CountingStore {
            inner,
            calls: AtomicUsize::new(0),
        });
        Ok(CriteriaSearchExecutor::new(catalog, store, root)?)
    }

    fn request<S: BackingStore>(executor: &CriteriaSearchExecutor<S>, raw: Json) -> anyhow::Result<SearchRequest> {
        Ok(executor.parse_request(&RawSearchRequest::from_json(raw)?)?)
    }

    fn entities(page: &SearchPage<Json>) -> Vec<Json> {
        match &page.hits {
            SearchHits::Entities(items) => items.clone(),
            SearchHits::Rows(_) => Vec::new(),
        }
    }

    fn titles(page: &SearchPage<Json>) -> Vec<String> {
        entities(page)
            .iter()
            .filter_map(|e| e["title"].as_str().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_entity_search_reconstructs_associations() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let req = request(&executor, json!({"filters": {"title": {"containsic": "dune"}}}))?;
        let page = executor.search(&req)?;

        assert_eq!(titles(&page), vec!["Dune", "Children of Dune"]);
        let first = &entities(&page)[0];
        assert_eq!(first["author"]["name"], json!("Frank Herbert"));
        assert_eq!(first["price"], json!(9.5));
        assert!(page.page_info.is_none());
        Ok(())
    }

    #[test]
    fn test_case_sensitive_contains() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let req = request(&executor, json!({"filters": {"title": {"contains": "dune"}}}))?;
        assert!(executor.search(&req)?.hits.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_association_is_null() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let req = request(&executor, json!({"filters": {"title": "Untitled"}}))?;
        let page = executor.search(&req)?;
        assert_eq!(entities(&page)[0]["author"], Json::Null);
        Ok(())
    }

    #[test]
    fn test_filter_groups_are_alternatives() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let req = request(
            &executor,
            json!({"filters": [{"category": "classic"}, {"pages": {"gt": 440}}]}),
        )?;
        assert_eq!(executor.count(&req)?, 3);

        let with_empty = request(&executor, json!({"filters": [{"category": "classic"}, {}]}))?;
        assert_eq!(executor.count(&with_empty)?, 6);
        Ok(())
    }

    #[test]
    fn test_row_mode_paging_and_metadata() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let req = request(
            &executor,
            json!({
                "fields": [
                    "data.title",
                    {"path": "price", "priority": 1, "direction": "desc"},
                    "author.name",
                    "totalPages"
                ],
                "page": {"number": 0, "size": 2}
            }),
        )?;
        assert!(req.page_metadata);

        let page = executor.search(&req)?;
        let SearchHits::Rows(rows) = &page.hits else {
            anyhow::bail!("expected rows");
        };
        let picked: Vec<Json> = rows.iter().map(|r| r.to_json()).collect();
        assert_eq!(
            picked,
            vec![
                json!({"title": "Dune", "price": 9.5, "author.name": "Frank Herbert"}),
                json!({"title": "Children of Dune", "price": 8.0, "author.name": "Frank Herbert"}),
            ]
        );
        assert_eq!(
            page.page_info,
            Some(PageInfo {
                current_page: 0,
                page_size: 2,
                total_pages: 3,
                current_page_count: 2,
                total: 6,
            })
        );

        let json = page.to_json("data");
        assert_eq!(json["totalPages"], json!(3));
        assert_eq!(json["data"].as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[test]
    fn test_row_totals_count_joined_rows() -> anyhow::Result<()> {
        let executor = executor("Author")?;
        let req = request(
            &executor,
            json!({
                "fields": ["name", "books.title", "data.totalPages", "total"],
                "page": {"number": 0, "size": 2}
            }),
        )?;
        let page = executor.search(&req)?;
        assert_eq!(
            page.page_info,
            Some(PageInfo {
                current_page: 0,
                page_size: 2,
                total_pages: 3,
                current_page_count: 2,
                total: 5,
            })
        );

        let last = executor.search(&req.clone().page(2, 2))?;
        assert_eq!(last.hits.len(), 1);
        Ok(())
    }

    #[test]
    fn test_default_page_size_and_invalid_pages() -> anyhow::Result<()> {
        let executor = executor("Book")?.with_config(SearchConfig {
            default_page_size: 4,
            max_page_size: 10,
            ..Default::default()
        });

        let second = request(&executor, json!({"page": {"number": 1}}))?;
        assert_eq!(titles(&executor.search(&second)?), vec!["Children of Dune", "Untitled"]);

        for page in [json!({"number": 0, "size": 0}), json!({"number": 0, "size": 11})] {
            let req = request(&executor, json!({ "page": page }))?;
            assert!(matches!(executor.search(&req), Err(SearchError::InvalidPage(_))));
        }
        Ok(())
    }

    #[test]
    fn test_grouped_aggregates() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let req = request(
            &executor,
            json!({
                "fields": [{"path": "category", "priority": 1}],
                "aggregates": {"sum": ["price"], "count": ["id"]}
            }),
        )?;
        let page = executor.search(&req)?;
        let SearchHits::Rows(rows) = &page.hits else {
            anyhow::bail!("expected rows");
        };
        let scifi = rows
            .iter()
            .find(|r| r.get("category").and_then(|v| v.as_str()) == Some("scifi"))
            .map(ResultRow::to_json);
        assert_eq!(
            scifi,
            Some(json!({"category": "scifi", "count(id)": 3, "sum(price)": 25.0}))
        );
        assert_eq!(rows.len(), 3);
        Ok(())
    }

    #[test]
    fn test_unique_search() -> anyhow::Result<()> {
        let executor = executor("Book")?;

        let emma = request(&executor, json!({"filters": {"title": {"equals": "Emma"}}}))?;
        let hit = executor.search_unique(&emma)?;
        assert!(matches!(&hit, Some(Hit::Entity(e)) if e["pages"] == json!(474)));

        let scifi = request(&executor, json!({"filters": {"category": "scifi"}}))?;
        assert!(matches!(
            executor.search_unique(&scifi),
            Err(SearchError::NonUniqueResult { found: 2 })
        ));

        let missing = request(&executor, json!({"filters": {"title": "Nope"}}))?;
        assert!(!executor.exists_unique(&missing)?);

        let ranged = request(&executor, json!({"filters": {"pages": {"gt": 1}}}))?;
        assert!(matches!(
            executor.search_unique(&ranged),
            Err(SearchError::MalformedFilterShape { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_count_through_to_many() -> anyhow::Result<()> {
        let executor = executor("Author")?;
        let req = request(&executor, json!({"filters": {"books": {"category": "scifi"}}}))?;
        assert_eq!(executor.count(&req)?, 2);
        assert!(executor.exists(&req)?);

        let page = executor.search(&req)?;
        let names: Vec<Json> = entities(&page).iter().map(|e| e["name"].clone()).collect();
        assert_eq!(names, vec![json!("Frank Herbert"), json!("William Gibson")]);
        Ok(())
    }

    #[test]
    fn test_not_complements_rows_with_null_values() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let pricey = request(&executor, json!({"filters": {"price": {"gt": 5}}}))?;
        let rest = request(&executor, json!({"filters": {"not": [{"price": {"gt": 5}}]}}))?;

        assert_eq!(executor.count(&pricey)?, 3);
        assert_eq!(
            titles(&executor.search(&rest)?),
            vec!["Emma", "Persuasion", "Untitled"]
        );
        Ok(())
    }

    #[test]
    fn test_fractional_bound_on_integer_field() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let req = request(&executor, json!({"filters": {"pages": {"gt": 443.5}}}))?;
        assert_eq!(titles(&executor.search(&req)?), vec!["Emma", "Children of Dune"]);
        Ok(())
    }

    #[test]
    fn test_parameters_are_anded() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let req = request(
            &executor,
            json!({
                "filters": {"pages": {"gt": 260}},
                "parameters": {"category": {"operator": "NOT_IN", "values": ["scifi"]}}
            }),
        )?;
        assert_eq!(titles(&executor.search(&req)?), vec!["Emma"]);
        Ok(())
    }

    #[test]
    fn test_errors_precede_store_calls() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let invalid = [
            json!({"filters": {"unknownField": 1}}),
            json!({"filters": {"title": {"gt": 3}}}),
            json!({"fields": ["title", {"path": "pages", "alias": "title"}]}),
            json!({"aggregates": {"sum": ["category"], "groupBy": ["category"]}}),
        ];
        for raw in invalid {
            let result = RawSearchRequest::from_json(raw.clone())
                .map_err(anyhow::Error::from)
                .and_then(|r| Ok(executor.parse_request(&r)?))
                .and_then(|req| Ok(executor.search(&req)?));
            assert!(result.is_err(), "{}", raw);
        }
        assert_eq!(executor.store.calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_cancelled_search() -> anyhow::Result<()> {
        let token = CancellationToken::new();
        let executor = executor("Book")?.with_cancellation(token.clone());
        token.cancel();
        assert!(matches!(
            executor.search(&SearchRequest::new()),
            Err(SearchError::Store(StoreError::Cancelled))
        ));
        Ok(())
    }

    #[test]
    fn test_programmatic_request() -> anyhow::Result<()> {
        let executor = executor("Book")?;
        let req = SearchRequest::new()
            .select(Selection::new("title").ordered(1, SortOrder::Asc))
            .page(1, 2);
        let page = executor.search(&req)?;
        let SearchHits::Rows(rows) = &page.hits else {
            anyhow::bail!("expected rows");
        };
        let got: Vec<Json> = rows.iter().map(|r| r.to_json()["title"].clone()).collect();
        assert_eq!(got, vec![json!("Emma"), json!("Neuromancer")]);
        Ok(())
    }
}

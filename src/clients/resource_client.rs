use crate::accumulator::AccumulatorClient;
use crate::cache::ListState;
use crate::dispatcher::{DispatchHandle, FetchDispatcher};
use crate::error::EngineError;
use crate::model::{
    Filter, ListParams, Pagination, Record, RecordId, ReferenceSource, RelationKey, Request, Sort,
};
use crate::query::QueryState;
use crate::store::StoreClient;
use serde_json::Value;
use tracing::{debug, instrument};

/// Client for one resource, the way a widget sees the engine.
///
/// Write side: one method per request kind, each returning the
/// [`DispatchHandle`] of the request it issued. Read side: selectors answered
/// by the store actor. Nothing here mutates state directly.
#[derive(Clone)]
pub struct ResourceClient {
    resource: String,
    dispatcher: FetchDispatcher,
    store: StoreClient,
    accumulator: AccumulatorClient,
}

impl ResourceClient {
    pub fn new(
        resource: impl Into<String>,
        dispatcher: FetchDispatcher,
        store: StoreClient,
        accumulator: AccumulatorClient,
    ) -> Self {
        Self {
            resource: resource.into(),
            dispatcher,
            store,
            accumulator,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    fn dispatch(&self, request: Request) -> Result<DispatchHandle, EngineError> {
        debug!(kind = %request.kind(), "Sending request");
        self.dispatcher.dispatch(request)
    }

    #[instrument(skip(self), fields(resource = %self.resource))]
    pub fn get_list(
        &self,
        pagination: Pagination,
        sort: Sort,
        filter: Filter,
    ) -> Result<DispatchHandle, EngineError> {
        self.dispatch(Request::get_list(self.resource.clone(), pagination, sort, filter))
    }

    /// Fetches the page described by a list view's [`QueryState`].
    pub fn get_list_for(
        &self,
        query: &QueryState,
        default_sort: &Sort,
        default_per_page: u32,
    ) -> Result<DispatchHandle, EngineError> {
        let ListParams {
            pagination,
            sort,
            filter,
        } = query.to_params(default_sort, default_per_page);
        self.get_list(pagination, sort, filter)
    }

    #[instrument(skip(self), fields(resource = %self.resource))]
    pub fn get_one(
        &self,
        id: RecordId,
        base_path: Option<String>,
    ) -> Result<DispatchHandle, EngineError> {
        self.dispatch(Request::get_one(self.resource.clone(), id, base_path))
    }

    #[instrument(skip(self), fields(resource = %self.resource))]
    pub fn get_many(&self, ids: Vec<RecordId>) -> Result<DispatchHandle, EngineError> {
        self.dispatch(Request::get_many(self.resource.clone(), ids))
    }

    /// Queues `ids` for this resource's next batched `GET_MANY`.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub async fn get_many_accumulate(&self, ids: Vec<RecordId>) -> Result<(), EngineError> {
        debug!("Queueing ids");
        self.accumulator.request(self.resource.clone(), ids).await
    }

    /// Fetches the records of this resource whose `target` field points at
    /// record `id` of `parent`.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub fn get_many_reference(
        &self,
        parent: &str,
        target: &str,
        id: RecordId,
        pagination: Pagination,
        sort: Sort,
        filter: Filter,
    ) -> Result<DispatchHandle, EngineError> {
        let related_to = RelationKey::new(parent, self.resource.clone(), id.clone(), target);
        self.dispatch(Request::get_many_reference(
            self.resource.clone(),
            target,
            id,
            related_to,
            pagination,
            sort,
            filter,
        ))
    }

    /// Fetches the choices of a reference input pointing at this resource.
    #[instrument(skip(self), fields(resource = %self.resource))]
    pub fn get_matching(
        &self,
        related_to: ReferenceSource,
        pagination: Pagination,
        sort: Sort,
        filter: Filter,
    ) -> Result<DispatchHandle, EngineError> {
        self.dispatch(Request::get_matching(
            self.resource.clone(),
            related_to,
            pagination,
            sort,
            filter,
        ))
    }

    #[instrument(skip(self, data), fields(resource = %self.resource))]
    pub fn create(&self, data: Value, base_path: Option<String>) -> Result<DispatchHandle, EngineError> {
        self.dispatch(Request::create(self.resource.clone(), data, base_path))
    }

    #[instrument(skip(self, data, previous_data), fields(resource = %self.resource))]
    pub fn update(
        &self,
        id: RecordId,
        data: Value,
        previous_data: Option<Value>,
        base_path: Option<String>,
    ) -> Result<DispatchHandle, EngineError> {
        self.dispatch(Request::update(
            self.resource.clone(),
            id,
            data,
            previous_data,
            base_path,
        ))
    }

    #[instrument(skip(self), fields(resource = %self.resource))]
    pub fn delete(&self, id: RecordId, base_path: Option<String>) -> Result<DispatchHandle, EngineError> {
        self.dispatch(Request::delete(self.resource.clone(), id, base_path))
    }

    // --- Selectors ---

    pub async fn record(&self, id: impl Into<RecordId>) -> Result<Option<Record>, EngineError> {
        self.store.record(&self.resource, id.into()).await
    }

    pub async fn records(&self, ids: Vec<RecordId>) -> Result<Vec<Record>, EngineError> {
        self.store.records(&self.resource, ids).await
    }

    pub async fn list(&self) -> Result<ListState, EngineError> {
        self.store.list(&self.resource).await
    }

    /// Records of this resource related to `parent[id]` through `target`.
    pub async fn references(
        &self,
        parent: &str,
        id: RecordId,
        target: &str,
    ) -> Result<Option<Vec<Record>>, EngineError> {
        let key = RelationKey::new(parent, self.resource.clone(), id, target);
        self.store.references(key).await
    }

    /// Choices of `source`, resolved against this resource.
    pub async fn possible_references(
        &self,
        source: ReferenceSource,
        selected: Vec<RecordId>,
    ) -> Result<Option<Result<Vec<Record>, String>>, EngineError> {
        self.store
            .possible_references(source, &self.resource, selected)
            .await
    }

    /// Whether any request, for any resource, is in flight.
    pub async fn is_loading(&self) -> Result<bool, EngineError> {
        Ok(self.store.loading().await? > 0)
    }
}

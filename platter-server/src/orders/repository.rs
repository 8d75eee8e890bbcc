//! Order persistence
//!
//! Maps [`Order`] to store documents (`id` <-> `_id`) and routes every store
//! call through the resilient access layer.

use std::sync::Arc;

use serde_json::Value;
use shared::models::{Order, OrderStatus};

use crate::db::{
    AggregateOutput, Aggregation, Document, DocumentStore, Filter, FindOptions, ID_FIELD,
    StoreError, StoreResult, Update, UpdateOutcome,
};
use crate::resilience::ResilientAccess;
use crate::utils::DateRange;
use crate::utils::time::format_timestamp;

/// Collection holding order documents
pub const ORDERS_COLLECTION: &str = "orders";

/// Default page size for listings
pub const DEFAULT_LIMIT: usize = 50;

/// Upper bound on a single page
pub const MAX_LIMIT: usize = 200;

/// Listing criteria for one portal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderQuery {
    pub portal_id: String,
    /// Empty means any status
    pub statuses: Vec<OrderStatus>,
    pub created: DateRange,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl OrderQuery {
    pub fn for_portal(portal_id: impl Into<String>) -> Self {
        Self {
            portal_id: portal_id.into(),
            ..Default::default()
        }
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Page size clamped to `1..=MAX_LIMIT`
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub(crate) fn filter(&self) -> Filter {
        let mut filter = portal_filter(&self.portal_id, &self.created);
        if !self.statuses.is_empty() {
            filter = filter.one_of("status", self.statuses.iter().map(|s| s.as_str()));
        }
        filter
    }
}

/// Portal plus optional `createdAt` window
pub(crate) fn portal_filter(portal_id: &str, created: &DateRange) -> Filter {
    let mut filter = Filter::new().eq("portalId", portal_id);
    if let Some(start) = created.start {
        filter = filter.gte("createdAt", format_timestamp(start));
    }
    if let Some(end) = created.end {
        filter = filter.lt("createdAt", format_timestamp(end));
    }
    filter
}

pub(crate) fn to_document(order: &Order) -> StoreResult<Document> {
    let Value::Object(mut doc) = serde_json::to_value(order)? else {
        return Err(StoreError::InvalidDocument("order did not serialize to an object".into()));
    };
    if let Some(id) = doc.remove("id") {
        doc.insert(ID_FIELD.to_string(), id);
    }
    Ok(doc)
}

pub(crate) fn from_document(mut doc: Document) -> StoreResult<Order> {
    if let Some(id) = doc.remove(ID_FIELD) {
        doc.insert("id".to_string(), id);
    }
    Ok(serde_json::from_value(Value::Object(doc))?)
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    store: Arc<dyn DocumentStore>,
    access: ResilientAccess,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>, access: ResilientAccess) -> Self {
        Self { store, access }
    }

    pub fn access(&self) -> &ResilientAccess {
        &self.access
    }

    pub async fn insert(&self, order: &Order) -> StoreResult<()> {
        let doc = to_document(order)?;
        self.access
            .execute(|| self.store.insert_one(ORDERS_COLLECTION, doc.clone()))
            .await
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Order>> {
        let filter = Filter::by_id(id);
        let doc = self
            .access
            .execute(|| self.store.find_one(ORDERS_COLLECTION, &filter))
            .await?;
        doc.map(from_document).transpose()
    }

    /// Matching orders, newest first
    pub async fn find(&self, query: &OrderQuery) -> StoreResult<Vec<Order>> {
        let filter = query.filter();
        let options = FindOptions::new()
            .sort_desc("createdAt")
            .skip(query.offset)
            .limit(query.effective_limit());
        let docs = self
            .access
            .execute(|| self.store.find(ORDERS_COLLECTION, &filter, &options))
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    /// Apply `update` to the first order matching `filter`
    pub async fn update(&self, filter: &Filter, update: &Update) -> StoreResult<UpdateOutcome> {
        self.access
            .execute(|| self.store.update_one(ORDERS_COLLECTION, filter, update))
            .await
    }

    pub async fn aggregate(
        &self,
        filter: &Filter,
        aggregation: &Aggregation,
    ) -> StoreResult<AggregateOutput> {
        self.access
            .execute(|| self.store.aggregate(ORDERS_COLLECTION, filter, aggregation))
            .await
    }

    pub async fn throttle(&self) {
        self.access.throttle().await;
    }
}

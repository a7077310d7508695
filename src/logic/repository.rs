use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};
use crate::logic::query_builder::ListQuery;
use crate::logic::resolve::resolve_existing_device;
use crate::logic::validate::{is_present, reference_text, validate_coordinates};
use crate::model::{
    parse_id, Device, Document, EntityKind, FieldSet, Filter, Id, Location, NewDevice,
    NewLocation, PageEnvelope, QueryPlan, DEVICE_EXPANSION_FIELDS, PUBLIC_ID_FIELD,
    STORE_ID_FIELD,
};
use crate::store::traits::Store;

fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record).context("Failed to serialize record")? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("record serialized to a non-object: {}", other),
    }
}

fn project(mut document: Document, projection: &FieldSet) -> Document {
    document.retain(|field, _| projection.contains(field));
    document
}

/// Rename the store identity field to the public one, including in embedded records.
fn normalize_id(mut document: Document) -> Document {
    for value in document.values_mut() {
        if let Value::Object(nested) = value {
            *nested = normalize_id(std::mem::take(nested));
        }
    }
    if let Some(id) = document.remove(STORE_ID_FIELD) {
        document.insert(PUBLIC_ID_FIELD.to_string(), id);
    }
    document
}

/// Executes query plans and validated writes against the two collections.
pub struct RecordRepository<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> RecordRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn count(&self, kind: EntityKind, filter: &Filter) -> Result<u64> {
        match kind {
            EntityKind::Device => self.store.count_devices(filter).await,
            EntityKind::Location => self.store.count_locations(filter).await,
        }
    }

    pub async fn list(&self, kind: EntityKind, plan: &QueryPlan) -> Result<Vec<Document>> {
        let documents: Vec<Document> = match kind {
            EntityKind::Device => self
                .store
                .find_devices(plan)
                .await?
                .iter()
                .map(to_document)
                .collect::<Result<_>>()?,
            EntityKind::Location => self
                .store
                .find_locations(plan)
                .await?
                .iter()
                .map(to_document)
                .collect::<Result<_>>()?,
        };

        let documents = documents
            .into_iter()
            .map(|document| project(document, &plan.projection))
            .collect();
        let documents = self.expand(kind, documents, &plan.expansion).await?;

        Ok(documents.into_iter().map(normalize_id).collect())
    }

    /// Replace relation fields with a safe subset of the referenced record.
    /// Only relations that survived projection are expanded; dangling references become null.
    async fn expand(
        &self,
        kind: EntityKind,
        mut documents: Vec<Document>,
        expansion: &FieldSet,
    ) -> Result<Vec<Document>> {
        // Locations are the only collection holding a relation (to devices)
        if kind != EntityKind::Location || !expansion.contains("device") {
            return Ok(documents);
        }

        let ids: Vec<Id> = documents
            .iter()
            .filter_map(|document| document.get("device"))
            .filter_map(Value::as_str)
            .filter_map(parse_id)
            .unique()
            .collect();
        if ids.is_empty() {
            return Ok(documents);
        }

        let safe_fields = FieldSet::new(DEVICE_EXPANSION_FIELDS.iter().copied());
        let devices: HashMap<Id, Document> = self
            .store
            .get_devices(&ids)
            .await?
            .iter()
            .map(|device| Ok((device.id, project(to_document(device)?, &safe_fields))))
            .collect::<Result<_>>()?;

        for document in documents.iter_mut() {
            let Some(reference) = document.get("device").and_then(Value::as_str).and_then(parse_id)
            else {
                continue;
            };
            let expanded = devices
                .get(&reference)
                .cloned()
                .map(Value::Object)
                .unwrap_or(Value::Null);
            document.insert("device".to_string(), expanded);
        }

        Ok(documents)
    }

    /// Most recent location matching the plan, if any.
    pub async fn latest_location(&self, plan: &QueryPlan) -> Result<Option<Document>> {
        let plan = QueryPlan {
            skip: 0,
            limit: Some(1),
            ..plan.clone()
        };
        Ok(self.list(EntityKind::Location, &plan).await?.into_iter().next())
    }

    /// Count, then fetch one page. The two reads are not atomic.
    pub async fn fetch_page(&self, query: &ListQuery) -> Result<PageEnvelope<Document>> {
        let total = self.count(query.kind, &query.plan.filter).await?;

        if query.pagination.is_past_unlimited_page() {
            return Ok(PageEnvelope::past_unlimited(&query.pagination, total));
        }

        let data = self.list(query.kind, &query.plan).await?;
        Ok(PageEnvelope::new(
            query.pagination.page,
            query.pagination.total_pages(total),
            total,
            data,
        ))
    }

    pub async fn create_device(&self, body: NewDevice) -> ApiResult<Id> {
        let Some(Value::String(name)) = body.name else {
            return Err(ApiError::MissingName);
        };

        let device = Device::new(name);
        let id = device.id;
        self.store.insert_device(device).await?;
        log::info!("registered device {}", id);
        Ok(id)
    }

    /// Validate and persist a fix: presence, device resolution, numeric check, bounds.
    pub async fn create_location(&self, body: NewLocation) -> ApiResult<Id> {
        let (Some(device), Some(latitude), Some(longitude)) = (
            body.device.filter(is_present),
            body.latitude.filter(is_present),
            body.longitude.filter(is_present),
        ) else {
            return Err(ApiError::MissingFields);
        };

        let device = resolve_existing_device(self.store, &reference_text(&device))
            .await?
            .ok_or(ApiError::DeviceNotFound)?;

        let (latitude, longitude) = validate_coordinates(&latitude, &longitude)?;

        let location = Location::new(device, latitude, longitude);
        let id = location.id;
        self.store.insert_location(location).await?;
        Ok(id)
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::cmp::Ordering;

use crate::model::{Device, Filter, Id, Location, QueryPlan, Sort, SortDirection};
use crate::store::traits::{DeviceStore, LocationStore};

/// Value a record can be ordered by
#[derive(Debug, Clone, PartialEq, PartialOrd)]
enum SortKey {
    Id(Id),
    Text(String),
    Number(f64),
    Time(DateTime<Utc>),
}

trait Sortable {
    fn id(&self) -> Id;
    fn sort_key(&self, field: &str) -> Option<SortKey>;
}

impl Sortable for Device {
    fn id(&self) -> Id {
        self.id
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "_id" | "id" => Some(SortKey::Id(self.id)),
            "name" => Some(SortKey::Text(self.name.clone())),
            "createdAt" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }
}

impl Sortable for Location {
    fn id(&self) -> Id {
        self.id
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "_id" | "id" => Some(SortKey::Id(self.id)),
            "device" => Some(SortKey::Id(self.device)),
            "latitude" => Some(SortKey::Number(self.latitude)),
            "longitude" => Some(SortKey::Number(self.longitude)),
            "createdAt" => Some(SortKey::Time(self.created_at)),
            _ => None,
        }
    }
}

/// Sort, skip and limit a snapshot of a collection kept in insertion order.
/// Ties are broken by id in the sort direction. Unknown sort fields leave insertion order untouched.
fn apply_window<T: Sortable>(mut records: Vec<T>, sort: &Sort, skip: u64, limit: Option<u64>) -> Vec<T> {
    let known = records
        .first()
        .map_or(false, |record| record.sort_key(&sort.field).is_some());

    if known {
        records.sort_by(|a, b| {
            let ordering = a
                .sort_key(&sort.field)
                .partial_cmp(&b.sort_key(&sort.field))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id().cmp(&b.id()));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    let skip = usize::try_from(skip).unwrap_or(usize::MAX);
    let take = limit
        .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
        .unwrap_or(usize::MAX);
    records.into_iter().skip(skip).take(take).collect()
}

/// Process-local store. Used by tests and by the `memory` storage backend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    devices: RwLock<Vec<Device>>,
    locations: RwLock<Vec<Location>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches_device(device: &Device, filter: &Filter) -> bool {
        filter.device.map_or(true, |id| device.id == id)
    }

    fn matches_location(location: &Location, filter: &Filter) -> bool {
        filter.device.map_or(true, |id| location.device == id)
    }
}

#[async_trait::async_trait]
impl DeviceStore for InMemoryStore {
    async fn insert_device(&self, device: Device) -> Result<()> {
        self.devices.write().push(device);
        Ok(())
    }

    async fn get_device(&self, id: &Id) -> Result<Option<Device>> {
        Ok(self.devices.read().iter().find(|d| d.id == *id).cloned())
    }

    async fn find_device_by_name(&self, name: &str) -> Result<Option<Device>> {
        let devices = self.devices.read();
        Ok(devices
            .iter()
            .filter(|d| d.name == name)
            .min_by_key(|d| (d.created_at, d.id))
            .cloned())
    }

    async fn get_devices(&self, ids: &[Id]) -> Result<Vec<Device>> {
        Ok(self
            .devices
            .read()
            .iter()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect())
    }

    async fn find_devices(&self, plan: &QueryPlan) -> Result<Vec<Device>> {
        let matching: Vec<Device> = self
            .devices
            .read()
            .iter()
            .filter(|d| Self::matches_device(d, &plan.filter))
            .cloned()
            .collect();
        Ok(apply_window(matching, &plan.sort, plan.skip, plan.limit))
    }

    async fn count_devices(&self, filter: &Filter) -> Result<u64> {
        let devices = self.devices.read();
        Ok(devices.iter().filter(|d| Self::matches_device(d, filter)).count() as u64)
    }
}

#[async_trait::async_trait]
impl LocationStore for InMemoryStore {
    async fn insert_location(&self, location: Location) -> Result<()> {
        self.locations.write().push(location);
        Ok(())
    }

    async fn find_locations(&self, plan: &QueryPlan) -> Result<Vec<Location>> {
        let matching: Vec<Location> = self
            .locations
            .read()
            .iter()
            .filter(|l| Self::matches_location(l, &plan.filter))
            .cloned()
            .collect();
        Ok(apply_window(matching, &plan.sort, plan.skip, plan.limit))
    }

    async fn count_locations(&self, filter: &Filter) -> Result<u64> {
        let locations = self.locations.read();
        Ok(locations
            .iter()
            .filter(|l| Self::matches_location(l, filter))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(sort: Sort, skip: u64, limit: Option<u64>) -> QueryPlan {
        QueryPlan {
            sort,
            skip,
            limit,
            ..QueryPlan::default()
        }
    }

    #[tokio::test]
    async fn find_applies_sort_skip_and_limit() {
        let store = InMemoryStore::new();
        let device = Device::new("tracker".to_string());
        let device_id = device.id;
        store.insert_device(device).await.unwrap();
        for latitude in [10.0, -5.0, 30.0, 0.0] {
            store
                .insert_location(Location::new(device_id, latitude, 1.0))
                .await
                .unwrap();
        }

        let sorted = store
            .find_locations(&plan(
                Sort::new(Some("latitude"), SortDirection::Desc),
                1,
                Some(2),
            ))
            .await
            .unwrap();
        let latitudes: Vec<f64> = sorted.iter().map(|l| l.latitude).collect();
        assert_eq!(latitudes, vec![10.0, 0.0]);

        let unknown = store
            .find_locations(&plan(Sort::new(Some("altitude"), SortDirection::Desc), 0, None))
            .await
            .unwrap();
        let latitudes: Vec<f64> = unknown.iter().map(|l| l.latitude).collect();
        assert_eq!(latitudes, vec![10.0, -5.0, 30.0, 0.0]);
    }

    #[tokio::test]
    async fn equal_sort_keys_fall_back_to_id_order() {
        let store = InMemoryStore::new();
        let device = Device::new("tracker".to_string());
        let device_id = device.id;
        store.insert_device(device).await.unwrap();
        let mut ids = Vec::new();
        for _ in 0..6 {
            let location = Location::new(device_id, 5.0, 1.0);
            ids.push(location.id);
            store.insert_location(location).await.unwrap();
        }
        ids.sort();

        let ascending = store
            .find_locations(&plan(Sort::new(Some("latitude"), SortDirection::Asc), 0, None))
            .await
            .unwrap();
        assert_eq!(ascending.iter().map(|l| l.id).collect::<Vec<_>>(), ids);

        let descending = store
            .find_locations(&plan(Sort::new(Some("latitude"), SortDirection::Desc), 2, Some(3)))
            .await
            .unwrap();
        let expected: Vec<Id> = ids.iter().rev().skip(2).take(3).copied().collect();
        assert_eq!(descending.iter().map(|l| l.id).collect::<Vec<_>>(), expected);
    }

    #[tokio::test]
    async fn filter_scopes_both_collections_to_a_device() {
        let store = InMemoryStore::new();
        let a = Device::new("a".to_string());
        let b = Device::new("b".to_string());
        let (a_id, b_id) = (a.id, b.id);
        store.insert_device(a).await.unwrap();
        store.insert_device(b).await.unwrap();
        store.insert_location(Location::new(a_id, 1.0, 1.0)).await.unwrap();
        store.insert_location(Location::new(b_id, 2.0, 2.0)).await.unwrap();
        store.insert_location(Location::new(b_id, 3.0, 3.0)).await.unwrap();

        assert_eq!(store.count_locations(&Filter::for_device(b_id)).await.unwrap(), 2);
        assert_eq!(store.count_locations(&Filter::default()).await.unwrap(), 3);
        assert_eq!(store.count_devices(&Filter::for_device(a_id)).await.unwrap(), 1);
        assert_eq!(store.get_devices(&[b_id]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_name_lookup_prefers_the_earliest_device() {
        let store = InMemoryStore::new();
        let first = Device::new("twin".to_string());
        let mut second = Device::new("twin".to_string());
        second.created_at = first.created_at + chrono::Duration::seconds(5);
        let first_id = first.id;
        store.insert_device(second).await.unwrap();
        store.insert_device(first).await.unwrap();

        let found = store.find_device_by_name("twin").await.unwrap().unwrap();
        assert_eq!(found.id, first_id);
        assert!(store.find_device_by_name("Twin").await.unwrap().is_none());
    }
}

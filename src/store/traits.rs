use crate::model::{Device, Filter, Id, Location, QueryPlan};
use anyhow::Result;

#[async_trait::async_trait]
pub trait DeviceStore: Send + Sync {
    async fn insert_device(&self, device: Device) -> Result<()>;
    async fn get_device(&self, id: &Id) -> Result<Option<Device>>;
    /// First device with exactly this name, earliest created first
    async fn find_device_by_name(&self, name: &str) -> Result<Option<Device>>;
    /// Devices for the given ids, in no particular order; unknown ids are skipped
    async fn get_devices(&self, ids: &[Id]) -> Result<Vec<Device>>;
    /// Apply filter, sort, skip and limit of the plan. Projection is not the store's concern.
    async fn find_devices(&self, plan: &QueryPlan) -> Result<Vec<Device>>;
    async fn count_devices(&self, filter: &Filter) -> Result<u64>;
}

#[async_trait::async_trait]
pub trait LocationStore: Send + Sync {
    async fn insert_location(&self, location: Location) -> Result<()>;
    async fn find_locations(&self, plan: &QueryPlan) -> Result<Vec<Location>>;
    async fn count_locations(&self, filter: &Filter) -> Result<u64>;
}

pub trait Store: DeviceStore + LocationStore + Send + Sync {}
impl<T: DeviceStore + LocationStore + Send + Sync> Store for T {}

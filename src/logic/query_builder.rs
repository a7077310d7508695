use anyhow::Result;

use crate::logic::resolve::resolve_device;
use crate::model::{
    populate_fields, select_fields, EntityKind, Filter, Pagination, ProjectionMode, QueryPlan,
    Sort, SortDirection,
};
use crate::store::traits::DeviceStore;

/// Raw query-string parameters shared by every read endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub device: Option<String>,
    pub populate_fields: Option<String>,
    pub select_fields: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    /// Collect decoded query pairs. A repeated key keeps its first value; unknown keys are ignored.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let mut params = QueryParams::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "device" => &mut params.device,
                "populateFields" => &mut params.populate_fields,
                "selectFields" => &mut params.select_fields,
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                "sort" => &mut params.sort,
                "order" => &mut params.order,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }
}

/// A listing plan together with the pagination it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub kind: EntityKind,
    pub plan: QueryPlan,
    pub pagination: Pagination,
}

/// Resolve an optional device reference into a filter.
/// An unresolvable reference leaves the filter unconstrained.
async fn device_filter<S: DeviceStore + ?Sized>(store: &S, reference: Option<&str>) -> Result<Filter> {
    let Some(reference) = reference.filter(|r| !r.is_empty()) else {
        return Ok(Filter::default());
    };

    match resolve_device(store, reference).await? {
        Some(id) => Ok(Filter::for_device(id)),
        None => {
            log::debug!("device reference '{}' did not resolve, not filtering by device", reference);
            Ok(Filter::default())
        }
    }
}

/// Build a paginated listing plan for `kind`.
///
/// `scope` is the device reference taken from the path; it takes precedence
/// over the `device` query parameter. Device listings are never scoped.
pub async fn build_list_query<S: DeviceStore + ?Sized>(
    store: &S,
    kind: EntityKind,
    scope: Option<&str>,
    params: &QueryParams,
) -> Result<ListQuery> {
    let filter = match kind {
        EntityKind::Device => Filter::default(),
        EntityKind::Location => {
            device_filter(store, scope.or(params.device.as_deref())).await?
        }
    };

    let pagination = Pagination::from_params(params.page.as_deref(), params.limit.as_deref());
    let plan = QueryPlan {
        filter,
        sort: Sort::new(
            params.sort.as_deref(),
            SortDirection::from_param(params.order.as_deref()),
        ),
        skip: pagination.skip(),
        limit: pagination.limit_clause(),
        projection: select_fields(kind, params.select_fields.as_deref(), ProjectionMode::Listing),
        expansion: populate_fields(kind, params.populate_fields.as_deref()),
    };

    log::debug!(
        "{} query: filter={:?} sort={} {:?} skip={} limit={:?} select=[{}] populate=[{}]",
        kind.plural(),
        plan.filter,
        plan.sort.field,
        plan.sort.direction,
        plan.skip,
        plan.limit,
        plan.projection,
        plan.expansion
    );

    Ok(ListQuery {
        kind,
        plan,
        pagination,
    })
}

/// Build the plan for the most recent location of a device.
/// Newest first unless the caller explicitly asks for `order=asc`.
pub async fn build_latest_location_query<S: DeviceStore + ?Sized>(
    store: &S,
    scope: &str,
    params: &QueryParams,
) -> Result<QueryPlan> {
    let direction = match params.order.as_deref() {
        Some("asc") => SortDirection::Asc,
        _ => SortDirection::Desc,
    };

    Ok(QueryPlan {
        filter: device_filter(store, Some(scope)).await?,
        sort: Sort::new(params.sort.as_deref(), direction),
        skip: 0,
        limit: Some(1),
        projection: select_fields(
            EntityKind::Location,
            params.select_fields.as_deref(),
            ProjectionMode::Single,
        ),
        expansion: populate_fields(EntityKind::Location, params.populate_fields.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Device, FieldSet};
    use crate::store::{DeviceStore, InMemoryStore};

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn repeated_keys_keep_their_first_value() {
        let params = params(&[
            ("page", "1"),
            ("selectFields", "name"),
            ("page", "2"),
            ("selectFields", "createdAt"),
            ("altitude", "high"),
        ]);
        assert_eq!(params.page.as_deref(), Some("1"));
        assert_eq!(params.select_fields.as_deref(), Some("name"));
        assert_eq!(params.limit, None);
    }

    #[tokio::test]
    async fn defaults_produce_an_unlimited_ascending_plan() {
        let store = InMemoryStore::new();
        let query = build_list_query(&store, EntityKind::Device, None, &QueryParams::default())
            .await
            .unwrap();

        assert_eq!(query.pagination, Pagination::default());
        assert_eq!(query.plan.filter, Filter::default());
        assert_eq!(query.plan.sort, Sort::new(None, SortDirection::Asc));
        assert_eq!(query.plan.skip, 0);
        assert_eq!(query.plan.limit, None);
        assert_eq!(query.plan.projection.to_string(), "_id name createdAt");
        assert!(query.plan.expansion.is_empty());
    }

    #[tokio::test]
    async fn parameters_flow_into_the_plan() {
        let store = InMemoryStore::new();
        let query = build_list_query(
            &store,
            EntityKind::Location,
            None,
            &params(&[
                ("page", "3"),
                ("limit", "10"),
                ("sort", "latitude"),
                ("order", "desc"),
                ("selectFields", "latitude,longitude,latitude"),
                ("populateFields", "device,owner"),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(query.plan.skip, 20);
        assert_eq!(query.plan.limit, Some(10));
        assert_eq!(query.plan.sort, Sort::new(Some("latitude"), SortDirection::Desc));
        assert_eq!(
            query.plan.projection,
            FieldSet::new(["latitude", "longitude", "_id", "createdAt"])
        );
        assert_eq!(query.plan.expansion, FieldSet::new(["device"]));
    }

    #[tokio::test]
    async fn device_names_become_canonical_filters() {
        let store = InMemoryStore::new();
        let device = Device::new("truck-7".to_string());
        let id = device.id;
        store.insert_device(device).await.unwrap();

        let by_param = build_list_query(
            &store,
            EntityKind::Location,
            None,
            &params(&[("device", "truck-7")]),
        )
        .await
        .unwrap();
        assert_eq!(by_param.plan.filter, Filter::for_device(id));

        // The path segment wins over the query parameter
        let by_path = build_list_query(
            &store,
            EntityKind::Location,
            Some("truck-7"),
            &params(&[("device", "unknown")]),
        )
        .await
        .unwrap();
        assert_eq!(by_path.plan.filter, Filter::for_device(id));
    }

    #[tokio::test]
    async fn unresolvable_device_leaves_filter_unconstrained() {
        let store = InMemoryStore::new();
        let query = build_list_query(&store, EntityKind::Location, Some("ghost"), &QueryParams::default())
            .await
            .unwrap();
        assert_eq!(query.plan.filter, Filter::default());

        let devices = build_list_query(
            &store,
            EntityKind::Device,
            None,
            &params(&[("device", "ghost")]),
        )
        .await
        .unwrap();
        assert_eq!(devices.plan.filter, Filter::default());
    }

    #[tokio::test]
    async fn latest_plan_is_newest_first_single_record() {
        let store = InMemoryStore::new();
        let device = Device::new("van".to_string());
        let id = device.id;
        store.insert_device(device).await.unwrap();

        let plan = build_latest_location_query(&store, "van", &params(&[("order", "sideways")]))
            .await
            .unwrap();
        assert_eq!(plan.filter, Filter::for_device(id));
        assert_eq!(plan.sort, Sort::new(None, SortDirection::Desc));
        assert_eq!(plan.limit, Some(1));
        assert_eq!(
            plan.projection.to_string(),
            "_id device latitude longitude createdAt"
        );

        let ascending = build_latest_location_query(&store, "van", &params(&[("order", "asc")]))
            .await
            .unwrap();
        assert_eq!(ascending.sort.direction, SortDirection::Asc);

        let unscoped = build_latest_location_query(&store, "ghost", &QueryParams::default())
            .await
            .unwrap();
        assert_eq!(unscoped.filter, Filter::default());
        assert_eq!(unscoped.sort, Sort::new(None, SortDirection::Desc));
    }
}

use serde::Serialize;

pub const DEFAULT_PAGE: u64 = 1;
/// A limit of zero means "no limit": the whole result set is one page.
pub const UNLIMITED: u64 = 0;

/// Page/limit pair after parsing and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: UNLIMITED,
        }
    }
}

/// Leading signed integer of `raw`, ignoring leading whitespace and any trailing text.
/// `"10abc"` and `"2.5"` read as 10 and 2; text without leading digits reads as nothing.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let unsigned = raw.strip_prefix(&['-', '+'][..]).unwrap_or(raw);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    let sign_len = raw.len() - unsigned.len();
    // Overflowing values saturate rather than fall back to the default
    match raw[..sign_len + digits].parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) if raw.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

impl Pagination {
    /// Parse raw query values by their leading integer. Garbage falls back to the defaults,
    /// pages below 1 clamp to 1 and negative limits clamp to unlimited.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(leading_integer)
            .filter(|page| *page >= 1)
            .map(|page| page as u64)
            .unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .and_then(leading_integer)
            .filter(|limit| *limit >= 0)
            .map(|limit| limit as u64)
            .unwrap_or(UNLIMITED);
        Self { page, limit }
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit == UNLIMITED
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Limit clause for the store, `None` when unlimited.
    pub fn limit_clause(&self) -> Option<u64> {
        (!self.is_unlimited()).then_some(self.limit)
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        if total_count == 0 {
            0
        } else if self.is_unlimited() {
            1
        } else {
            total_count.div_ceil(self.limit)
        }
    }

    /// Unlimited listings only ever have a first page.
    pub fn is_past_unlimited_page(&self) -> bool {
        self.is_unlimited() && self.page > 1
    }
}

/// Paginated listing returned inside the success envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    pub current_page: u64,
    pub total_page_count: u64,
    pub total_data_count: u64,
    pub data: Vec<T>,
}

impl<T> PageEnvelope<T> {
    pub fn new(current_page: u64, total_page_count: u64, total_data_count: u64, data: Vec<T>) -> Self {
        Self {
            current_page,
            total_page_count,
            total_data_count,
            data,
        }
    }

    /// Page returned for `page > 1` on an unlimited listing, without touching the data.
    pub fn past_unlimited(pagination: &Pagination, total_data_count: u64) -> Self {
        Self::new(pagination.page, 1, total_data_count, Vec::new())
    }
}

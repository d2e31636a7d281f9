//! Limit/offset windowing and the paginated response envelope.

use serde::Serialize;

use crate::extractors::{ApiQuery, QueryParams};

pub const LIMIT_PARAM: &str = "limit";
pub const OFFSET_PARAM: &str = "offset";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

impl Paginator {
    pub fn new(default_limit: i64, max_limit: i64) -> Self {
        Self {
            default_limit,
            max_limit,
        }
    }

    /// Reads `limit`/`offset`. Oversized limits are clamped; unparseable or
    /// non-positive limits fall back to the default and bad offsets to 0.
    pub fn window(&self, params: &QueryParams) -> Window {
        let limit = params
            .get(LIMIT_PARAM)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(self.default_limit)
            .min(self.max_limit);
        let offset = params
            .get(OFFSET_PARAM)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|offset| *offset >= 0)
            .unwrap_or(0);
        Window { limit, offset }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, window: Window, query: &ApiQuery) -> Self {
        let limit = Some(window.limit.to_string());

        let next_offset = window
            .offset
            .checked_add(window.limit)
            .filter(|next_offset| *next_offset < count);
        let next = next_offset.map(|next_offset| {
            let params = query
                .params
                .with(LIMIT_PARAM, limit.clone())
                .with(OFFSET_PARAM, Some(next_offset.to_string()));
            query.link(&params)
        });

        let previous = (window.offset > 0).then(|| {
            let params = query.params.with(LIMIT_PARAM, limit.clone());
            let prev_offset = window.offset - window.limit;
            let params = if prev_offset <= 0 {
                params.with(OFFSET_PARAM, None)
            } else {
                params.with(OFFSET_PARAM, Some(prev_offset.to_string()))
            };
            query.link(&params)
        });

        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

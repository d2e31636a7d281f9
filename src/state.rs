use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::pagination::Paginator;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
}

impl AppState {
    /// Paging bounds for general resource listings.
    pub fn paginator(&self) -> Paginator {
        let p = &self.config.pagination;
        Paginator::new(p.default_limit, p.max_limit)
    }

    /// Tighter bounds for post-cache listings, whose rows carry full bodies.
    pub fn post_cache_paginator(&self) -> Paginator {
        let p = &self.config.pagination;
        Paginator::new(p.post_cache_default_limit, p.post_cache_max_limit)
    }
}

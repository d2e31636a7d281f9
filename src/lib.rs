// Library exports for hivetower
// This allows integration tests and external code to use hivetower modules

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod filters;
pub mod pagination;
pub mod routes;
pub mod state;
pub mod votes;

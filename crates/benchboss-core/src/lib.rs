// Library root: the lineup engine's data model, rules and persistence, shared
// by the app crate and integration tests.

pub mod calendar;
pub mod config;
pub mod data;
pub mod db;
pub mod eligibility;
pub mod history;
pub mod lineup;
pub mod lock;
pub mod mutation;
pub mod optimizer;
pub mod persist;
pub mod player;
pub mod resolver;
pub mod schedule;
pub mod scheduler;
pub mod session;
pub mod slot;
pub mod store;
pub mod view;

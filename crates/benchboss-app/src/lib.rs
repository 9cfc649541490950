// Library root: exposes the app modules so integration tests can drive the
// event loop directly.

pub mod app;
pub mod input;
pub mod protocol;
pub mod render;

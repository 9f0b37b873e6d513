//! Terminal handlers reached through the middleware chain

pub mod catchall;
pub mod editing_config;
pub mod editing_render;

pub use self::catchall::CatchAllHandler;
pub use self::editing_config::{ComponentRegistry, EditingConfigHandler, StaticComponentRegistry};
pub use self::editing_render::{EditingRenderHandler, PageRenderer};

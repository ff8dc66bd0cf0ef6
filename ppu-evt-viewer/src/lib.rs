pub mod color;
pub mod constants;
pub mod event;
pub mod frame;
pub mod framebuffer;
pub mod hover;
pub mod overlay;
pub mod prelude;
pub mod prefs;
pub mod registry;
pub mod render;
pub mod transform;
pub mod viewer;

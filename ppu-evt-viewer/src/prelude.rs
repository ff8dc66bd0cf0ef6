pub use crate::color::Color32;
pub use crate::event::{parse, parse_with_diagnostics, Event, ParseDiagnostic};
pub use crate::frame::{filter_to_frame, frame_count};
pub use crate::framebuffer::Framebuffer;
pub use crate::hover::HoverReadout;
pub use crate::overlay::ReferenceOverlay;
pub use crate::prefs::{MemoryPreferences, Preferences};
pub use crate::registry::{discover_types, ToggleState};
pub use crate::render::{render, RenderStats, Surface};
pub use crate::transform::{CoordinateTransform, LogicalPos, PixelPos};
pub use crate::viewer::Viewer;

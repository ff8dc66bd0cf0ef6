/// Marker token at the start of every log line emitted by the traced PPU
pub const EVENT_LINE_MARKER: &str = "PPU_EVENT";

/// Reserved event type separating consecutive frames
pub const FRAME_END: &str = "FRAME_END";

pub const SPR_FETCH_START: &str = "SPR_FETCH_START";
pub const SPR_FETCH_END: &str = "SPR_FETCH_END";
pub const PX_FETCH_LINE_END: &str = "PX_FETCH_LINE_END";
pub const LX_INC: &str = "LX_INC";
pub const SPR_FETCHER_STATE_CHANGE: &str = "SPR_FETCHER_STATE_CHANGE";

/// Event types the renderer has a draw rule for
pub const SUPPORTED_EVENT_TYPES: [&str; 5] = [
    SPR_FETCH_START,
    SPR_FETCH_END,
    PX_FETCH_LINE_END,
    LX_INC,
    SPR_FETCHER_STATE_CHANGE,
];

pub const SCREEN_WIDTH: usize = 160;

/// Width of the horizontal timing domain in logical cycle units
pub const LOGICAL_WIDTH: f32 = (SCREEN_WIDTH * 2) as f32;

/// Number of scanlines in a frame, including vblank
pub const LINES_PER_FRAME: usize = 154;

/// Nominal cycle count at which pixel fetching for a line should be done
pub const LINE_LENGTH_THRESHOLD: f32 = 289.0;

/// Dots spent in OAM scan before pixel transfer starts on each line
pub const OAM_SCAN_DOTS: i64 = 80;

pub const DEFAULT_OVERLAY_OFFSET: i64 = 12;

//! Global constants for the labeldesk editor

/// Minimum width/height (image pixels) of a shape created by a drag gesture.
pub const MIN_SHAPE_SIZE: f32 = 4.0;

/// Minimum number of vertices for a polygon to be committed.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// A polygon vertex this close (image pixels) to the previous one is a duplicate.
pub const DUPLICATE_VERTEX_DISTANCE: f32 = 0.5;

/// Pointer travel (image pixels) below which a select-tool drag is a click.
pub const MIN_DRAG_DISTANCE: f32 = 1.0;

/// Zoom bounds and steps for the canvas viewport.
pub mod zoom {
    /// Minimum zoom level
    pub const MIN: f32 = 0.05;
    /// Maximum zoom level
    pub const MAX: f32 = 8.0;
    /// Zoom factor per wheel notch
    pub const WHEEL_FACTOR: f32 = 1.1;
    /// Padding (screen pixels) kept around the image when fitting to view
    pub const FIT_PADDING: f32 = 20.0;
}

/// Keyboard nudge distances (image pixels).
pub mod nudge {
    /// Plain nudge
    pub const STEP: f32 = 1.0;
    /// Nudge with Shift held
    pub const LARGE_STEP: f32 = 10.0;
}

/// Stroke widths used by the scene description.
pub mod stroke {
    /// Regular shape outline
    pub const NORMAL: f32 = 2.0;
    /// Outline of the selected shape
    pub const SELECTED: f32 = 4.0;
    /// In-progress drawing preview
    pub const PREVIEW: f32 = 1.5;
}

/// Edit-lock lease timing.
pub mod lease {
    /// Requested lease length in seconds
    pub const DEFAULT_TTL_SECONDS: u32 = 300;
    /// Smallest lease the backend grants
    pub const MIN_TTL_SECONDS: u32 = 30;
    /// Largest lease the backend grants
    pub const MAX_TTL_SECONDS: u32 = 3600;
    /// Renew this long before the lease expires
    pub const DEFAULT_RENEW_LEAD_SECONDS: u32 = 30;
}

/// Job monitoring intervals.
pub mod jobs {
    /// Status polling interval when the push channel is not used
    pub const POLL_INTERVAL_MS: u64 = 2000;
    /// Live-metrics polling interval
    pub const METRICS_INTERVAL_MS: u64 = 3000;
    /// Rows requested from the live-metrics tail
    pub const METRICS_ROWS: u32 = 15;
}

//! In-process real-time fan-out keyed by geo-grid cells.

mod grid_router;

pub use grid_router::{ClientId, EventReceiver, FanoutMode, GridRouter};

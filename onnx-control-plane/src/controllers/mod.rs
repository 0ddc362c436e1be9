//! HTTP surface (C7): one controller per resource family, all mounted under
//! [`crate::AppState`]. Route bodies stay thin — every decision belongs to
//! the component it delegates to; a controller only shapes the request and
//! response.

pub mod job_controller;
pub mod job_reaper;
pub mod model_controller;

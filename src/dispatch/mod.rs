//! Outbound request handling
//!
//! - `Transport`: the network seam (`HttpTransport` in production)
//! - `Dispatcher`: cancellation-on-replace per endpoint plus deadlines
//! - `endpoints`: the appliance REST paths this crate calls

mod dispatcher;
mod transport;

pub use dispatcher::{Dispatcher, RequestOptions};
pub use transport::{HttpTransport, Method, OutboundRequest, Reply, Transport};

pub mod endpoints {
    pub const RECORDING_START: &str = "/api/recording/start";
    pub const RECORDING_STOP: &str = "/api/recording/stop";
    pub const DOWNLOAD_FRAME: &str = "/api/download_frame";
    pub const DETECTION_START: &str = "/api/detection/start";
    pub const DETECTION_STOP: &str = "/api/detection/stop";
    pub const UPDATE_GPS: &str = "/api/update_gps";
    pub const SYSTEM_STATS: &str = "/api/system_stats";
}

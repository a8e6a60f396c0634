pub mod artifact;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod gps;
pub mod notify;
pub mod panel;
pub mod protocol;
pub mod recording;
pub mod status;
pub mod zoom;

pub use artifact::{ArtifactKind, ArtifactSink, DirectorySink};
pub use config::Config;
pub use device::DeviceCommands;
pub use dispatch::{Dispatcher, HttpTransport, Reply, RequestOptions, Transport};
pub use error::{AbortReason, PanelError, PanelResult};
pub use gps::{GpsFeed, GpsSample, GpsStatus, PositionEvent, PositionSource};
pub use notify::{Notification, NotificationKind, NotificationSink};
pub use panel::{Panel, PanelViews};
pub use recording::{Progress, RecordingController, RecordingSession, RecordingView, SessionState};
pub use status::{ConnectionState, StatusBoard, StatusPoller, StatusView};
pub use zoom::ZoomState;

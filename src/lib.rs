pub mod codec;
pub mod container;
pub mod csv;
pub mod emg;
pub mod error;
pub mod filter;
pub mod gait;
pub mod kinematics;

pub use container::{Capture, Channel, ChannelSeries, Event, MarkerSeries, Point3, Writer, parse};
pub use emg::{EmgConfig, process_emg};
pub use error::{CaptureError, Result};
pub use gait::{GaitEvent, GaitEventKind, SpatiotemporalStats, detect_gait_events, spatiotemporal};
pub use kinematics::{joint_angle, joint_angle_series};

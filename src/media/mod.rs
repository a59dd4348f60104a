//! Media transport abstraction
//!
//! The session controller consumes a live audio/video room only through
//! [`MediaTransport`]. Room/track events, the local camera frame source and
//! the in-process loopback room live here.

pub mod events;
pub mod frames;
pub mod loopback;
pub mod transport;

pub use events::{ConnectionState, RemoteTrack, RoomEvent, RoomEventKind, TrackEvent, TrackKind};
pub use frames::{video_channel, VideoFrame, VideoFrameSink, VideoFrameSource};
pub use loopback::{ConnectGate, LoopbackHandle, LoopbackTransport};
pub use transport::{MediaTransport, RoomContext};

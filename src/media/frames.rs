// Live video frames shared between track rendering and the eye-tracking analyzer.
//
// The transport owns the single writer (`VideoFrameSink`). Everyone else gets a
// `VideoFrameSource`, which can only observe the latest frame.

use std::sync::Arc;
use tokio::sync::watch;

/// A decoded video frame (RGBA, row-major)
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    /// Timestamp in milliseconds since the track started
    pub timestamp_ms: u64,
}

type FrameCell = Option<Arc<VideoFrame>>;

/// Create a connected sink/source pair
pub fn video_channel() -> (VideoFrameSink, VideoFrameSource) {
    let (tx, rx) = watch::channel(None);
    (VideoFrameSink { tx }, VideoFrameSource { rx })
}

/// Writer side, held by the media transport
#[derive(Debug)]
pub struct VideoFrameSink {
    tx: watch::Sender<FrameCell>,
}

impl VideoFrameSink {
    /// Replace the latest frame
    pub fn push(&self, frame: VideoFrame) {
        self.tx.send_replace(Some(Arc::new(frame)));
    }

    pub fn subscribe(&self) -> VideoFrameSource {
        VideoFrameSource {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only view over the latest video frame
#[derive(Debug, Clone)]
pub struct VideoFrameSource {
    rx: watch::Receiver<FrameCell>,
}

impl VideoFrameSource {
    /// Latest frame, if any has been produced yet
    pub fn latest(&self) -> Option<Arc<VideoFrame>> {
        self.rx.borrow().clone()
    }

    /// Wait for the next frame published after the last one observed
    ///
    /// Returns `None` once the sink is gone.
    pub async fn next_frame(&mut self) -> Option<Arc<VideoFrame>> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            if let Some(frame) = self.rx.borrow_and_update().clone() {
                return Some(frame);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ts: u64) -> VideoFrame {
        VideoFrame {
            width: 2,
            height: 1,
            data: vec![0; 8],
            timestamp_ms: ts,
        }
    }

    #[test]
    fn test_source_starts_empty() {
        let (_sink, source) = video_channel();
        assert!(source.latest().is_none());
    }

    #[test]
    fn test_sources_see_latest_frame_only() {
        let (sink, source) = video_channel();
        let other = sink.subscribe();

        sink.push(frame(10));
        sink.push(frame(20));

        assert_eq!(source.latest().unwrap().timestamp_ms, 20);
        assert_eq!(other.latest().unwrap().timestamp_ms, 20);
    }

    #[tokio::test]
    async fn test_next_frame_ends_when_sink_dropped() {
        let (sink, mut source) = video_channel();
        sink.push(frame(1));

        assert_eq!(source.next_frame().await.unwrap().timestamp_ms, 1);

        drop(sink);
        assert!(source.next_frame().await.is_none());
    }
}

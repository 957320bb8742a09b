// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Detection module - frame acquisition and detector collaborator seams

mod simulator;

pub use simulator::*;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TrackingConfig;
use crate::tracking::TrackId;
use crate::zones::Rect;

/// How a frame's pixel buffer is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameEncoding {
    /// Uncompressed pixels, not suitable for transport as-is
    Raw,
    Png,
    Jpeg,
}

/// A captured video frame.
///
/// The pixel buffer is shared and never mutated, so cloning a frame is a
/// cheap way to take an immutable snapshot.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub encoding: FrameEncoding,
    pub data: Arc<[u8]>,
}

impl Frame {
    pub fn new(sequence: u64, width: u32, height: u32, encoding: FrameEncoding, data: Vec<u8>) -> Self {
        Self {
            sequence,
            captured_at: Utc::now(),
            width,
            height,
            encoding,
            data: Arc::from(data),
        }
    }

    /// Frame without pixel data, used by simulators and tests
    pub fn blank(sequence: u64, width: u32, height: u32) -> Self {
        Self::new(sequence, width, height, FrameEncoding::Raw, Vec::new())
    }

    /// MIME type and file name for transport, if the frame is encoded
    pub fn attachment(&self) -> Option<(&'static str, String)> {
        match self.encoding {
            FrameEncoding::Raw => None,
            FrameEncoding::Png => Some(("image/png", format!("frame-{}.png", self.sequence))),
            FrameEncoding::Jpeg => Some(("image/jpeg", format!("frame-{}.jpg", self.sequence))),
        }
    }
}

/// One box reported by the detector for the current frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Persistent id from the upstream tracker; `None` for untracked boxes
    pub track_id: Option<TrackId>,
    pub class_label: String,
    pub bbox: Rect,
    pub confidence: f32,
}

/// Detector result for one frame
#[derive(Debug, Clone)]
pub struct DetectorOutput {
    pub detections: Vec<RawDetection>,
    /// Frame with the detector's own overlays, for display
    pub annotated: Frame,
}

/// Source of video frames
#[async_trait]
pub trait FrameSource: Send {
    /// Human readable name for logs
    fn name(&self) -> &str;

    /// Grab the next frame
    async fn get_frame(&mut self) -> Result<Frame>;
}

/// Object detector with persistent track ids
#[async_trait]
pub trait Detector: Send {
    fn name(&self) -> &str;

    /// Detect and track objects in `frame`
    async fn detect(&mut self, frame: &Frame) -> Result<DetectorOutput>;
}

/// Drops detections the tracker should never see
#[derive(Debug, Clone)]
pub struct DetectionFilter {
    min_confidence: f32,
    classes: Vec<String>,
}

impl DetectionFilter {
    pub fn new(min_confidence: f32, classes: Vec<String>) -> Self {
        Self {
            min_confidence,
            classes,
        }
    }

    /// Accept everything that carries a track id
    pub fn allow_all() -> Self {
        Self::new(f32::MIN, Vec::new())
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(config.min_confidence, config.classes.clone())
    }

    pub fn accepts(&self, detection: &RawDetection) -> bool {
        detection.track_id.is_some()
            && detection.confidence >= self.min_confidence
            && (self.classes.is_empty() || self.classes.iter().any(|c| c == &detection.class_label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(track_id: Option<TrackId>, label: &str, confidence: f32) -> RawDetection {
        RawDetection {
            track_id,
            class_label: label.to_string(),
            bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
            confidence,
        }
    }

    #[test]
    fn test_filter() {
        let filter = DetectionFilter::new(0.6, vec!["truck".to_string()]);

        assert!(filter.accepts(&det(Some(1), "truck", 0.9)));
        assert!(!filter.accepts(&det(Some(1), "truck", 0.5)));
        assert!(!filter.accepts(&det(Some(1), "car", 0.9)));
        assert!(!filter.accepts(&det(None, "truck", 0.9)));
    }

    #[test]
    fn test_allow_all_still_needs_track_id() {
        let filter = DetectionFilter::allow_all();
        assert!(filter.accepts(&det(Some(3), "person", 0.0)));
        assert!(!filter.accepts(&det(None, "person", 1.0)));
    }

    #[test]
    fn test_attachment() {
        let raw = Frame::blank(7, 640, 360);
        assert!(raw.attachment().is_none());

        let png = Frame::new(7, 640, 360, FrameEncoding::Png, vec![1, 2, 3]);
        assert_eq!(png.attachment(), Some(("image/png", "frame-7.png".to_string())));
    }
}

// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/zonewatch

//! Scene simulator for demo/testing

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::prelude::*;
use rand_distr::StandardNormal;

use super::{Detector, DetectorOutput, Frame, FrameSource, RawDetection};
use crate::tracking::TrackId;
use crate::zones::Rect;

const LABELS: [&str; 4] = ["truck", "truck", "car", "bus"];

struct SimObject {
    track_id: TrackId,
    class_label: &'static str,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    vx: f64,
    vy: f64,
}

impl SimObject {
    fn bbox(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.w, self.y + self.h)
    }
}

/// Shared world state behind the simulated camera and detector
struct Scene {
    width: u32,
    height: u32,
    rng: StdRng,
    objects: Vec<SimObject>,
    next_id: TrackId,
    sequence: u64,
    spawn_probability: f64,
    max_objects: usize,
    jitter: f64,
}

impl Scene {
    fn step(&mut self) {
        self.sequence += 1;

        let (width, height) = (self.width as f64, self.height as f64);
        for obj in self.objects.iter_mut() {
            let jx: f64 = self.rng.sample(StandardNormal);
            let jy: f64 = self.rng.sample(StandardNormal);
            obj.x += obj.vx + jx * self.jitter;
            obj.y += obj.vy + jy * self.jitter;
        }

        // Objects leave once their center exits the frame
        self.objects.retain(|o| {
            let c = o.bbox().center();
            c.x >= 0.0 && c.x <= width && c.y >= 0.0 && c.y <= height
        });

        if self.objects.len() < self.max_objects && self.rng.gen_bool(self.spawn_probability) {
            self.spawn();
        }
    }

    fn spawn(&mut self) {
        let w = self.rng.gen_range(60.0..180.0);
        let h = self.rng.gen_range(40.0..120.0);
        let obj = SimObject {
            track_id: self.next_id,
            class_label: LABELS[self.rng.gen_range(0..LABELS.len())],
            x: self.rng.gen_range(0.0..(self.width as f64 - w).max(1.0)),
            y: self.rng.gen_range(0.0..(self.height as f64 - h).max(1.0)),
            w,
            h,
            vx: self.rng.gen_range(-12.0..12.0),
            vy: self.rng.gen_range(-6.0..6.0),
        };
        self.next_id += 1;
        self.objects.push(obj);
    }
}

/// Build a camera/detector pair that observe the same synthetic scene.
///
/// Pass a seed for reproducible runs.
pub fn simulated_pipeline(width: u32, height: u32, seed: Option<u64>) -> (SimulatedCamera, SimulatedDetector) {
    let rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let scene = Arc::new(Mutex::new(Scene {
        width,
        height,
        rng,
        objects: Vec::new(),
        next_id: 1,
        sequence: 0,
        spawn_probability: 0.08,
        max_objects: 6,
        jitter: 1.5,
    }));

    (
        SimulatedCamera { scene: scene.clone() },
        SimulatedDetector {
            scene,
            failure_rate: 0.0,
            untracked_rate: 0.05,
        },
    )
}

/// Frame source that advances the simulated scene on every grab
pub struct SimulatedCamera {
    scene: Arc<Mutex<Scene>>,
}

impl SimulatedCamera {
    /// Place an object directly; returns its track id
    pub fn insert_object(&self, class_label: &'static str, bbox: Rect, velocity: (f64, f64)) -> TrackId {
        let mut scene = self.scene.lock();
        let track_id = scene.next_id;
        scene.next_id += 1;
        scene.objects.push(SimObject {
            track_id,
            class_label,
            x: bbox.x_min,
            y: bbox.y_min,
            w: bbox.width(),
            h: bbox.height(),
            vx: velocity.0,
            vy: velocity.1,
        });
        track_id
    }

    /// Stop random spawning and motion noise
    pub fn freeze_randomness(&self) {
        let mut scene = self.scene.lock();
        scene.spawn_probability = 0.0;
        scene.jitter = 0.0;
    }

    pub fn object_count(&self) -> usize {
        self.scene.lock().objects.len()
    }
}

#[async_trait]
impl FrameSource for SimulatedCamera {
    fn name(&self) -> &str {
        "simulated-camera"
    }

    async fn get_frame(&mut self) -> Result<Frame> {
        let mut scene = self.scene.lock();
        scene.step();
        Ok(Frame::blank(scene.sequence, scene.width, scene.height))
    }
}

/// Detector that reports the simulated scene's objects
pub struct SimulatedDetector {
    scene: Arc<Mutex<Scene>>,
    failure_rate: f64,
    untracked_rate: f64,
}

impl SimulatedDetector {
    /// Fail this fraction of calls, to exercise the skip-frame path
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Report this fraction of boxes without a track id
    pub fn with_untracked_rate(mut self, rate: f64) -> Self {
        self.untracked_rate = rate.clamp(0.0, 1.0);
        self
    }
}

#[async_trait]
impl Detector for SimulatedDetector {
    fn name(&self) -> &str {
        "simulated-detector"
    }

    async fn detect(&mut self, frame: &Frame) -> Result<DetectorOutput> {
        let mut scene = self.scene.lock();
        let Scene { rng, objects, .. } = &mut *scene;

        if rng.gen_bool(self.failure_rate) {
            return Err(anyhow!("simulated detector failure on frame {}", frame.sequence));
        }

        let mut detections = Vec::with_capacity(objects.len());
        for obj in objects.iter() {
            let tracked = !rng.gen_bool(self.untracked_rate);
            detections.push(RawDetection {
                track_id: tracked.then_some(obj.track_id),
                class_label: obj.class_label.to_string(),
                bbox: obj.bbox(),
                confidence: rng.gen_range(0.65..0.99),
            });
        }

        Ok(DetectorOutput {
            detections,
            annotated: frame.clone(),
        })
    }
}

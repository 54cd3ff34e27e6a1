/// Animations: immutable frame lists shared between instances, plus the
/// per-instance playhead that walks them.

use std::sync::Arc;

use super::image::Image;

#[derive(Clone, Debug)]
pub struct Frame {
    pub image: Arc<Image>,
    /// Cumulative time (ms) at which this frame ends.
    pub end_time: u64,
}

#[derive(Clone, Debug)]
pub struct Animation {
    name: String,
    frames: Arc<[Frame]>,
    total: u64,
}

impl Animation {
    /// Builds from `(image, duration_ms)` pairs. Returns `None` when the
    /// list is empty or a duration is zero, so end times strictly increase.
    pub fn new(name: impl Into<String>, frames: Vec<(Arc<Image>, u64)>) -> Option<Self> {
        if frames.is_empty() || frames.iter().any(|(_, d)| *d == 0) {
            return None;
        }
        let mut total = 0;
        let frames: Vec<Frame> = frames
            .into_iter()
            .map(|(image, duration)| {
                total += duration;
                Frame { image, end_time: total }
            })
            .collect();
        Some(Animation { name: name.into(), frames: frames.into(), total })
    }

    /// Single still frame.
    pub fn still(name: impl Into<String>, image: Arc<Image>) -> Self {
        Animation {
            name: name.into(),
            frames: vec![Frame { image, end_time: 1 }].into(),
            total: 1,
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn frames(&self) -> &[Frame] { &self.frames }
    pub fn total(&self) -> u64 { self.total }
}

/// Position inside one animation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Playhead {
    pub frame_index: usize,
    pub anim_time: u64,
}

impl Playhead {
    pub fn advance(&mut self, anim: &Animation, dt: u64) {
        let frames = anim.frames();
        if frames.len() <= 1 { return; }
        self.anim_time += dt;
        if self.anim_time >= anim.total() {
            self.anim_time %= anim.total();
            self.frame_index = 0;
        }
        while self.anim_time > frames[self.frame_index].end_time {
            self.frame_index += 1;
        }
    }
}

/// Named animations of one template, in declaration order.
/// The first entry is the initial animation.
#[derive(Clone, Debug)]
pub struct AnimationSet {
    anims: Vec<Animation>,
}

impl AnimationSet {
    pub fn new(anims: Vec<Animation>) -> Option<Self> {
        if anims.is_empty() { return None; }
        Some(AnimationSet { anims })
    }

    pub fn len(&self) -> usize { self.anims.len() }

    pub fn get(&self, index: usize) -> &Animation {
        &self.anims[index]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.anims.iter().position(|a| a.name() == name)
    }
}

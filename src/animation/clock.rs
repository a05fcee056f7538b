use crate::foundation::core::Fps;

/// Fixed-rate frame clock: the single source of `now` for a stage.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    fps: Fps,
    frame: u64,
}

impl FrameClock {
    pub fn new(fps: Fps) -> Self {
        Self { fps, frame: 0 }
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn now(&self) -> f64 {
        self.fps.frames_to_secs(self.frame)
    }

    /// Step one frame forward and return the new time.
    pub fn tick(&mut self) -> f64 {
        self.frame += 1;
        self.now()
    }

    /// Jump to the first frame at or after `secs`.
    pub fn seek(&mut self, secs: f64) -> f64 {
        let floor = self.fps.secs_to_frames_floor(secs);
        self.frame = if self.fps.frames_to_secs(floor) < secs {
            floor + 1
        } else {
            floor
        };
        self.now()
    }
}

use std::time::{Duration, Instant};

const SAMPLE_WINDOW: Duration = Duration::from_millis(500);

/// Frame-rate sampler behind the stats overlay.
pub struct FrameStats {
    last_frame_time: Option<Instant>,
    window_start: Option<Instant>,
    frame_count: u32,
    frame_dt: f32,
    fps: f32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            last_frame_time: None,
            window_start: None,
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            fps: 0.0,
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame_ms(&self) -> f32 {
        self.frame_dt * 1000.0
    }

    pub fn update(&mut self, now: Instant) {
        if let Some(last) = self.last_frame_time {
            self.frame_dt = now.saturating_duration_since(last).as_secs_f32();
        }
        self.last_frame_time = Some(now);

        let start = *self.window_start.get_or_insert(now);
        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= SAMPLE_WINDOW {
            self.fps = self.frame_count as f32 / elapsed.as_secs_f32();
            log::trace!("stats: {:.1} fps, {:.2} ms", self.fps, self.frame_ms());
            self.frame_count = 0;
            self.window_start = Some(now);
        }
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_fps_every_half_second() {
        let mut stats = FrameStats::new();
        let start = Instant::now();
        let step = Duration::from_micros(16_667);
        for i in 0..30 {
            stats.update(start + step * i);
        }
        assert_eq!(stats.fps(), 0.0);
        stats.update(start + step * 30);
        assert!((stats.fps() - 62.0).abs() < 1.0);
        assert!((stats.frame_ms() - 16.667).abs() < 0.01);
    }
}

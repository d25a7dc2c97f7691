use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailSample {
    pub time: f64,
    pub position: [f64; 2],
}

impl TrailSample {
    /// Opacity for drawing this sample at time `now`: fully opaque when
    /// fresh, fading out as the sample approaches the trail duration.
    pub fn alpha(&self, now: f64, duration: f64) -> f64 {
        if duration <= 0.0 {
            return 0.0;
        }
        let age = (now - self.time) / duration;
        (1.0 - age.powi(4)).clamp(0.0, 1.0)
    }
}

/// Time-windowed history of a point, oldest sample first.
#[derive(Debug, Clone)]
pub struct Trail {
    duration: f64,
    samples: VecDeque<TrailSample>,
}

impl Trail {
    pub fn new(duration: f64) -> Result<Self> {
        if !duration.is_finite() || duration < 0.0 {
            bail!("Trail duration must be finite and non-negative (got {}).", duration);
        }
        Ok(Self {
            duration,
            samples: VecDeque::new(),
        })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Appends a sample and drops everything older than the window.
    pub fn push(&mut self, time: f64, position: [f64; 2]) {
        self.samples.push_back(TrailSample { time, position });
        self.evict(time);
    }

    /// Drops samples with `time < now - duration` from the front.
    pub fn evict(&mut self, now: f64) {
        let cutoff = now - self.duration;
        while self
            .samples
            .front()
            .is_some_and(|sample| sample.time < cutoff)
        {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailSample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<TrailSample> {
        self.samples.iter().copied().collect()
    }

    /// Samples packed as `[t0, x0, y0, t1, x1, y1, ...]`.
    pub fn flatten(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(3 * self.samples.len());
        for sample in &self.samples {
            out.extend_from_slice(&[sample.time, sample.position[0], sample.position[1]]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_duration() {
        assert!(Trail::new(-1.0).is_err());
        assert!(Trail::new(f64::NAN).is_err());
        assert!(Trail::new(0.0).is_ok());
    }

    #[test]
    fn evicts_samples_older_than_the_window() {
        let mut trail = Trail::new(1.0).unwrap();
        for i in 0..30 {
            let t = i as f64 * 0.1;
            trail.push(t, [t, -t]);
        }
        let now = 29.0 * 0.1;
        assert!(trail.iter().all(|s| s.time >= now - 1.0 - 1e-12));
        assert_eq!(trail.iter().last().map(|s| s.time), Some(now));
        assert!(trail.len() >= 10 && trail.len() <= 11, "len {}", trail.len());
    }

    #[test]
    fn samples_stay_in_time_order() {
        let mut trail = Trail::new(5.0).unwrap();
        for t in [0.0, 0.5, 1.0, 1.5] {
            trail.push(t, [0.0, 0.0]);
        }
        let times: Vec<f64> = trail.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);
        trail.clear();
        assert!(trail.is_empty());
    }

    #[test]
    fn flatten_interleaves_time_and_position() {
        let mut trail = Trail::new(5.0).unwrap();
        trail.push(1.0, [2.0, 3.0]);
        trail.push(1.5, [4.0, 5.0]);
        assert_eq!(trail.flatten(), vec![1.0, 2.0, 3.0, 1.5, 4.0, 5.0]);
    }

    #[test]
    fn alpha_fades_with_age() {
        let sample = TrailSample {
            time: 1.0,
            position: [0.0, 0.0],
        };
        assert_eq!(sample.alpha(1.0, 2.0), 1.0);
        assert!((sample.alpha(2.0, 2.0) - (1.0 - 0.5f64.powi(4))).abs() < 1e-12);
        assert_eq!(sample.alpha(3.0, 2.0), 0.0);
        assert_eq!(sample.alpha(10.0, 2.0), 0.0);
    }
}

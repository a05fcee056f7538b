use std::collections::BTreeMap;

use crate::{
    animation::tween::Tween,
    foundation::error::{StageError, StageResult},
};

#[derive(Clone, Debug)]
struct Entry {
    start: f64,
    tween: Tween<f64>,
}

impl Entry {
    fn end(&self) -> f64 {
        self.start + self.tween.total_duration()
    }
}

/// Ordered composition of scalar tweens placed at explicit start offsets.
///
/// Tracks are keyed by `K` (usually `(target, property)`). Sub-timelines can be inserted at an
/// offset, which flattens them into this one. The natural duration can be rescaled with
/// [`Timeline::set_total_duration`]; sampling then maps outer time through the scale.
#[derive(Clone, Debug)]
pub struct Timeline<K> {
    tracks: BTreeMap<K, Vec<Entry>>,
    last_start: f64,
    total: Option<f64>,
}

impl<K> Default for Timeline<K> {
    fn default() -> Self {
        Self {
            tracks: BTreeMap::new(),
            last_start: 0.0,
            total: None,
        }
    }
}

impl<K> Timeline<K>
where
    K: Copy + Ord,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `tween` on track `key` starting at `at` seconds.
    pub fn to(&mut self, key: K, tween: Tween<f64>, at: f64) -> &mut Self {
        let start = at.max(0.0);
        let entries = self.tracks.entry(key).or_default();
        let idx = entries.partition_point(|e| e.start <= start);
        entries.insert(idx, Entry { start, tween });
        self.last_start = start;
        self
    }

    /// Place one tween per key, each starting `step` seconds after the previous one.
    pub fn stagger<I, F>(&mut self, keys: I, at: f64, step: f64, mut make: F) -> &mut Self
    where
        I: IntoIterator<Item = K>,
        F: FnMut(usize, K) -> Tween<f64>,
    {
        let mut first = None;
        for (i, key) in keys.into_iter().enumerate() {
            let start = at + step * i as f64;
            first.get_or_insert(start);
            let tween = make(i, key);
            self.to(key, tween, start);
        }
        if let Some(first) = first {
            self.last_start = first;
        }
        self
    }

    /// Flatten `child` into this timeline with its time origin at `at`.
    pub fn insert(&mut self, at: f64, child: Timeline<K>) -> &mut Self {
        let scale = child.stretch();
        for (key, entries) in child.tracks {
            for e in entries {
                let tween = e.tween.stretched(scale);
                self.to(key, tween, at + e.start * scale);
            }
        }
        self.last_start = at.max(0.0);
        self
    }

    /// Start offset of the most recently placed tween (the `"<"` position).
    pub fn last_start(&self) -> f64 {
        self.last_start
    }

    /// End of the last finite tween in unscaled time; infinite tweens are ignored.
    pub fn natural_duration(&self) -> f64 {
        self.tracks
            .values()
            .flatten()
            .map(Entry::end)
            .filter(|end| end.is_finite())
            .fold(0.0, f64::max)
    }

    /// Playback length after rescaling.
    pub fn total_duration(&self) -> f64 {
        self.total.unwrap_or_else(|| self.natural_duration())
    }

    /// Compress or stretch playback so it lasts exactly `secs`.
    pub fn set_total_duration(&mut self, secs: f64) -> StageResult<()> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(StageError::validation(
                "timeline total duration must be finite and > 0",
            ));
        }
        self.total = Some(secs);
        Ok(())
    }

    /// Outer-time stretch factor (`total / natural`).
    fn stretch(&self) -> f64 {
        let natural = self.natural_duration();
        match self.total {
            Some(total) if natural > 0.0 => total / natural,
            _ => 1.0,
        }
    }

    pub fn is_complete(&self, t: f64) -> bool {
        t >= self.total_duration()
    }

    /// Value of track `key` at outer time `t`.
    ///
    /// The most recently started tween wins; before the first one starts the track reads that
    /// tween's `from` value.
    pub fn sample(&self, key: K, t: f64) -> Option<f64> {
        let entries = self.tracks.get(&key)?;
        let local = t / self.stretch();
        let idx = entries.partition_point(|e| e.start <= local);
        let entry = if idx == 0 {
            entries.first()?
        } else {
            &entries[idx - 1]
        };
        Some(entry.tween.sample(local - entry.start))
    }

    pub fn sample_or(&self, key: K, t: f64, fallback: f64) -> f64 {
        self.sample(key, t).unwrap_or(fallback)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;

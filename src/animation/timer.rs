//! Wall-clock timers driven by the stage clock.

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle to a scheduled timer. Stale handles are harmless: cancelling twice is a no-op.
    pub struct TimerId;
}

const MIN_PERIOD: f64 = 1e-3;

#[derive(Clone, Debug)]
struct Timer<E> {
    due: f64,
    period: Option<f64>,
    seq: u64,
    event: E,
}

/// A fired timer: the instant it was due and its payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Fired<E> {
    pub id: TimerId,
    pub due: f64,
    pub event: E,
}

/// One-shot and interval timers owned by a single layer.
///
/// Nothing fires on its own: [`TimerQueue::advance`] returns every timer that came due up to
/// `now`, in due order (ties in scheduling order).
#[derive(Clone, Debug)]
pub struct TimerQueue<E> {
    timers: SlotMap<TimerId, Timer<E>>,
    seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            timers: SlotMap::with_key(),
            seq: 0,
        }
    }
}

impl<E: Clone> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event` once, `delay` seconds after `now`.
    pub fn after(&mut self, now: f64, delay: f64, event: E) -> TimerId {
        self.push(now + delay.max(0.0), None, event)
    }

    /// Fire `event` every `period` seconds, first at `now + period`.
    pub fn every(&mut self, now: f64, period: f64, event: E) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.push(now + period, Some(period), event)
    }

    fn push(&mut self, due: f64, period: Option<f64>, event: E) -> TimerId {
        self.seq += 1;
        self.timers.insert(Timer {
            due,
            period,
            seq: self.seq,
            event,
        })
    }

    /// Returns `false` when the timer already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Pop every timer due at or before `now`. Intervals are rescheduled and may fire several
    /// times if `now` jumped over multiple periods.
    pub fn advance(&mut self, now: f64) -> Vec<Fired<E>> {
        let mut out = Vec::new();
        while let Some(fired) = self.pop_due(now) {
            out.push(fired);
        }
        out
    }

    /// Pop the earliest timer due at or before `now`.
    ///
    /// Timers scheduled while draining are seen by the next call, so a handler can chain
    /// follow-ups and still observe them in due order.
    pub fn pop_due(&mut self, now: f64) -> Option<Fired<E>> {
        let id = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(id, _)| id)?;
        let timer = self.timers.get_mut(id)?;
        let fired = Fired {
            id,
            due: timer.due,
            event: timer.event.clone(),
        };
        match timer.period {
            Some(period) => {
                timer.due += period;
                self.seq += 1;
                timer.seq = self.seq;
            }
            None => {
                self.timers.remove(id);
            }
        }
        Some(fired)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timer.rs"]
mod tests;

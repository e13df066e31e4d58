//! Timer-driven character queue.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Default delay between two displayed characters.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(30);

/// FIFO character queue paced by a single deadline.
///
/// The scheduler owns no task and no timer. It exposes the instant of its
/// next step through [`deadline`](Self::deadline); the owning loop sleeps
/// until then and calls [`fire`](Self::fire). Since the deadline is a single
/// `Option`, at most one step can ever be scheduled.
///
/// # Example
/// ```rust,ignore
/// let mut scheduler = RenderScheduler::new(Duration::from_millis(30));
/// let now = Instant::now();
/// scheduler.enqueue("Hi", now);
/// assert_eq!(scheduler.fire(now), Some('H'));
/// assert_eq!(scheduler.deadline(), Some(now + Duration::from_millis(30)));
/// ```
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    queue: VecDeque<char>,
    interval: Duration,
    next_tick: Option<Instant>,
    /// Characters released since creation
    rendered: u64,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_INTERVAL)
    }
}

impl RenderScheduler {
    /// Creates an idle scheduler. A zero interval drains without delay.
    pub fn new(interval: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            interval,
            next_tick: None,
            rendered: 0,
        }
    }

    /// Appends the characters of `text` and starts the scheduler if idle.
    ///
    /// A running scheduler keeps its current deadline. Returns the number of
    /// characters queued.
    pub fn enqueue(&mut self, text: &str, now: Instant) -> usize {
        let before = self.queue.len();
        self.queue.extend(text.chars());
        let added = self.queue.len() - before;

        if added > 0 && self.next_tick.is_none() {
            self.next_tick = Some(now);
        }
        added
    }

    /// Releases the next character if the deadline has passed.
    ///
    /// Reschedules one interval after `now` while characters remain, and
    /// goes idle once the queue is empty.
    pub fn fire(&mut self, now: Instant) -> Option<char> {
        let due = self.next_tick.is_some_and(|deadline| deadline <= now);
        if !due {
            return None;
        }

        let next = self.queue.pop_front();
        if next.is_some() {
            self.rendered += 1;
        }
        self.next_tick = if self.queue.is_empty() {
            None
        } else {
            Some(now + self.interval)
        };
        next
    }

    /// Releases every character that is due at `now`.
    ///
    /// With a non-zero interval this is at most one character.
    pub fn fire_due(&mut self, now: Instant, out: &mut String) -> usize {
        let mut released = 0;
        while let Some(c) = self.fire(now) {
            out.push(c);
            released += 1;
        }
        released
    }

    /// Clears the queue and cancels the pending step.
    ///
    /// Returns the number of characters discarded.
    pub fn stop(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        self.next_tick = None;
        discarded
    }

    /// Instant of the next step, or `None` when idle.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.next_tick.is_none()
    }

    /// Characters waiting to be displayed.
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time needed to drain the current queue from now.
    pub fn backlog_duration(&self) -> Duration {
        match self.queue.len() {
            0 => Duration::ZERO,
            n => self
                .interval
                .saturating_mul(u32::try_from(n - 1).unwrap_or(u32::MAX)),
        }
    }
}

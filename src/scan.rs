//! Edge-detecting state scans over frame sequences
//!
//! Entrances and shocks are rising edges of a two-state machine. The machine
//! is seeded in its low state, so a track that starts inside counts as one
//! entrance.
//!
//! | state | input high      | input low |
//! |-------|-----------------|-----------|
//! | Low   | High, count + 1 | Low       |
//! | High  | High            | Low       |
//!
//! For entrances "high" is any inside code (Outside / Inside), for shocks it
//! is the stimulus code only (NotShocking / Shocking).

use crate::types::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Low,
    High,
}

/// Rising edge counter
#[derive(Debug, Clone, Copy)]
pub struct EdgeCounter {
    level: Level,
    edges: u32,
}

impl Default for EdgeCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeCounter {
    pub fn new() -> Self {
        Self {
            level: Level::Low,
            edges: 0,
        }
    }

    /// Feed one sample, returns true on a rising edge
    pub fn step(&mut self, high: bool) -> bool {
        let rising = high && self.level == Level::Low;
        self.level = if high { Level::High } else { Level::Low };
        if rising {
            self.edges += 1;
        }
        rising
    }

    pub fn edges(&self) -> u32 {
        self.edges
    }
}

/// Count rising edges of `predicate` across the frames
pub fn count_rising_edges<'a, I, F>(frames: I, predicate: F) -> u32
where
    I: IntoIterator<Item = &'a Frame>,
    F: Fn(&Frame) -> bool,
{
    let mut counter = EdgeCounter::new();
    for frame in frames {
        counter.step(predicate(frame));
    }
    counter.edges()
}

/// Longest avoidance run, in timestamp units
///
/// `run_start` begins at the first frame's timestamp and moves to the current
/// timestamp on every Inside -> Outside transition. While inside, the run
/// length is `timestamp - run_start`. Note the run start is the last outside
/// frame, not the first inside frame.
pub fn longest_avoidance_run(frames: &[&Frame]) -> i64 {
    let Some(first) = frames.first() else {
        return 0;
    };

    let mut run_start = first.timestamp;
    let mut outside = true;
    let mut longest = 0;

    for frame in frames {
        if frame.state.is_inside() {
            longest = longest.max(frame.timestamp - run_start);
            outside = false;
        } else if !outside {
            outside = true;
            run_start = frame.timestamp;
        }
    }

    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Position, StateCode};

    fn frame(timestamp: i64, state: &str) -> Frame {
        Frame {
            index: timestamp.to_string(),
            timestamp,
            position: Some(Position::new(1.0, 1.0)),
            state: StateCode::from_token(state),
            extra: vec![],
        }
    }

    #[test]
    fn test_edge_counter_transitions() {
        let mut counter = EdgeCounter::new();
        assert!(counter.step(true));
        assert!(!counter.step(true));
        assert!(!counter.step(false));
        assert!(counter.step(true));
        assert_eq!(counter.edges(), 2);
    }

    #[test]
    fn test_entrances_and_shocks() {
        let frames = vec![
            frame(0, "0"),
            frame(1, "1"),
            frame(2, "2"),
            frame(3, "2"),
            frame(4, "1"),
            frame(5, "2"),
            frame(6, "0"),
            frame(7, "2"),
        ];

        assert_eq!(count_rising_edges(&frames, |f| f.state.is_inside()), 2);
        assert_eq!(count_rising_edges(&frames, |f| f.state.is_shock()), 3);
    }

    #[test]
    fn test_longest_avoidance_run() {
        let frames = vec![
            frame(0, "0"),
            frame(10, "1"),
            frame(30, "1"),
            frame(40, "0"),
            frame(50, "1"),
            frame(60, "0"),
        ];
        let refs: Vec<&Frame> = frames.iter().collect();

        // First run measured from the seed (0) to 30
        assert_eq!(longest_avoidance_run(&refs), 30);
    }

    #[test]
    fn test_longest_run_resets_on_exit() {
        let frames = vec![
            frame(0, "1"),
            frame(5, "0"),
            frame(100, "0"),
            frame(150, "1"),
            frame(200, "1"),
        ];
        let refs: Vec<&Frame> = frames.iter().collect();

        // Second run starts at the exit frame (5), not at 100
        assert_eq!(longest_avoidance_run(&refs), 195);
    }

    #[test]
    fn test_no_inside_frames() {
        let frames = vec![frame(0, "0"), frame(10, "0")];
        let refs: Vec<&Frame> = frames.iter().collect();

        assert_eq!(longest_avoidance_run(&refs), 0);
        assert_eq!(longest_avoidance_run(&[]), 0);
    }
}

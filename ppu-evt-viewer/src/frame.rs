use std::ops::Range;

use crate::event::Event;
#[cfg(test)]
use crate::event::parse;

/// Returns the number of frames in the sequence
///
/// A frame starts with the first event of the sequence and with the first
/// event after each `FRAME_END`, so a trace that ends in a `FRAME_END` has no
/// trailing empty frame while back-to-back `FRAME_END`s do delimit an empty one.
pub fn frame_count(events: &[Event]) -> usize {
    let mut frames = 0;
    let mut frame_started = false;
    for event in events {
        if !frame_started {
            frames += 1;
            frame_started = true;
        }
        if event.is_frame_end() {
            frame_started = false;
        }
    }
    frames
}

/// Returns the events belonging to frame `frame_index` (zero based)
///
/// Frame N is everything strictly between the (N-1)th and Nth `FRAME_END`.
/// Separators are never included and an index past the end gives an empty
/// sequence.
pub fn filter_to_frame(events: &[Event], frame_index: usize) -> Vec<Event> {
    let mut current = 0;
    events
        .iter()
        .filter(|event| {
            if event.is_frame_end() {
                current += 1;
                return false;
            }
            current == frame_index
        })
        .cloned()
        .collect()
}

/// Returns the index range (into `events`) covered by each frame, separators excluded
pub fn frames(events: &[Event]) -> Vec<Range<usize>> {
    let mut ranges = vec![];
    let mut start = None;
    for (i, event) in events.iter().enumerate() {
        if start.is_none() {
            start = Some(i);
        }
        if event.is_frame_end() {
            if let Some(start) = start.take() {
                ranges.push(start..i);
            }
        }
    }
    if let Some(start) = start {
        ranges.push(start..events.len());
    }
    ranges
}

#[cfg(test)]
const SCENARIO: &str = "PPU_EVENT SPR_FETCH_START lx=10 ly=5 cycles=20\n\
                        PPU_EVENT FRAME_END\n\
                        PPU_EVENT SPR_FETCH_END cycles=30 ly=5";

#[test]
fn test_frame_count_scenario() {
    let events = parse(SCENARIO);
    assert_eq!(events.iter().filter(|e| !e.is_frame_end()).count(), 2);
    assert_eq!(frame_count(&events), 2);
}

#[test]
fn test_frame_count_boundaries() {
    assert_eq!(frame_count(&[]), 0);

    // N events and M separators: M + 1 frames...
    let events = parse("PPU_EVENT A\nPPU_EVENT FRAME_END\nPPU_EVENT B\nPPU_EVENT FRAME_END\nPPU_EVENT C");
    assert_eq!(frame_count(&events), 3);

    // ... or M when the trace ends on a separator
    let events = parse("PPU_EVENT A\nPPU_EVENT FRAME_END\nPPU_EVENT B\nPPU_EVENT FRAME_END");
    assert_eq!(frame_count(&events), 2);

    // Consecutive separators delimit an empty frame
    let events = parse("PPU_EVENT A\nPPU_EVENT FRAME_END\nPPU_EVENT FRAME_END\nPPU_EVENT B");
    assert_eq!(frame_count(&events), 3);
    assert!(filter_to_frame(&events, 1).is_empty());
    assert_eq!(filter_to_frame(&events, 2)[0].event_type(), "B");

    let events = parse("PPU_EVENT FRAME_END");
    assert_eq!(frame_count(&events), 1);
}

#[test]
fn test_filter_to_frame() {
    let events = parse(SCENARIO);

    let frame0 = filter_to_frame(&events, 0);
    assert_eq!(frame0.len(), 1);
    assert_eq!(frame0[0].event_type(), "SPR_FETCH_START");

    let frame1 = filter_to_frame(&events, 1);
    assert_eq!(frame1.len(), 1);
    assert_eq!(frame1[0].event_type(), "SPR_FETCH_END");

    assert!(filter_to_frame(&events, 99).is_empty());
}

#[test]
fn test_filter_is_idempotent() {
    let events = parse(
        "PPU_EVENT A\nPPU_EVENT FRAME_END\nPPU_EVENT B n=1\nPPU_EVENT C\nPPU_EVENT FRAME_END\nPPU_EVENT D",
    );
    for k in 0..4 {
        let filtered = filter_to_frame(&events, k);
        assert!(filtered.iter().all(|e| !e.is_frame_end()));
        assert_eq!(filter_to_frame(&filtered, 0), filtered);
    }
}

#[test]
fn test_frame_ranges() {
    let events = parse("PPU_EVENT A\nPPU_EVENT B\nPPU_EVENT FRAME_END\nPPU_EVENT FRAME_END\nPPU_EVENT C");
    assert_eq!(frames(&events), vec![0..2, 3..3, 4..5]);
    assert_eq!(frames(&events).len(), frame_count(&events));
}

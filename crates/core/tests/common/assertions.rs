//! Assertions over the emitted NDJSON stream.

use ak_protocol::stream_models::{Progress, StreamEvent};

/// Parse NDJSON output, one event per line.
pub fn parse_events(output: &[u8]) -> Vec<StreamEvent> {
    let text = std::str::from_utf8(output).expect("stream is UTF-8");
    assert!(
        text.is_empty() || text.ends_with('\n'),
        "every event must end with a newline"
    );
    text.lines()
        .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("bad line {line:?}: {e}")))
        .collect()
}

/// `(step, progress)` of every processing event, in order.
pub fn processing(events: &[StreamEvent]) -> Vec<(String, Progress)> {
    events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Processing { step, progress } => Some((step.clone(), *progress)),
            _ => None,
        })
        .collect()
}

/// Distinct steps in the order they were first announced.
pub fn announced_steps(events: &[StreamEvent]) -> Vec<String> {
    let mut steps: Vec<String> = Vec::new();
    for (step, _) in processing(events) {
        if steps.last() != Some(&step) {
            steps.push(step);
        }
    }
    steps
}

/// Exactly one terminal event, and it is the last one.
pub fn assert_single_terminal(events: &[StreamEvent]) -> &StreamEvent {
    let terminals = events.iter().filter(|event| event.is_terminal()).count();
    assert_eq!(terminals, 1, "expected one terminal event in {events:#?}");
    let last = events.last().expect("stream is not empty");
    assert!(last.is_terminal(), "terminal event must come last");
    last
}

/// Completed never decreases, total never changes and never exceeds it.
pub fn assert_monotonic(events: &[StreamEvent], total: u64) {
    let mut previous = 0;
    for (step, progress) in processing(events) {
        assert_eq!(progress.total, total, "total changed at {step}");
        assert!(
            progress.completed >= previous,
            "completed went backwards at {step}: {previous} -> {}",
            progress.completed
        );
        assert!(progress.completed <= total, "completed exceeded total at {step}");
        previous = progress.completed;
    }
}

pub fn error_message(event: &StreamEvent) -> &str {
    match event {
        StreamEvent::Error { error } => error,
        other => panic!("expected an error event, got {other:?}"),
    }
}

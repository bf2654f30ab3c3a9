//! Streams started while every producer thread is busy.
//!
//! This lives in its own test binary so that no other test holds producer
//! threads at the same time.

use std::sync::Arc;

use svgdraw::{parse_svg, DrawingInstruction, InstructionProducer, Instructions, MAX_PRODUCER_THREADS};

fn group_of_rects(n: usize) -> String {
    format!(
        "<svg><g>{}</g></svg>",
        r#"<rect width="1" height="1"/>"#.repeat(n)
    )
}

#[test]
fn streams_stay_lazy_when_no_producer_thread_is_free() {
    let busy_input = format!(
        "<svg>{}</svg>",
        r#"<g><rect width="1" height="1"/></g>"#.repeat(MAX_PRODUCER_THREADS)
    );
    let busy = parse_svg(&busy_input, "busy", 0.0).unwrap();

    // Each unread group stream keeps its producer thread blocked.
    let held: Vec<Instructions> = busy.groups().iter().map(|g| g.instructions()).collect();

    let doc = parse_svg(&group_of_rects(1000), "wide", 0.0).unwrap();
    let mut stream = doc.instructions();

    assert_eq!(stream.next(), Some(DrawingInstruction::MoveTo(0.0, 0.0)));
    assert!(Arc::strong_count(&doc) > 1);

    let paints = stream
        .filter(|i| matches!(i, DrawingInstruction::Paint(_)))
        .count();
    assert_eq!(paints, 1000);
    assert_eq!(Arc::strong_count(&doc), 1);

    for group_stream in held {
        assert_eq!(group_stream.filter(|i| matches!(i, DrawingInstruction::Paint(_))).count(), 1);
    }
}

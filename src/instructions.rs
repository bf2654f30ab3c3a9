//! Drawing instructions and the ordered streams that carry them.
//!
//! Every node in a [`Document`](crate::Document) can produce an [`Instructions`]
//! stream through the [`InstructionProducer`] trait.  Shapes compute their few
//! instructions right away.  Groups and the document start a producer thread
//! that forwards the streams of their children, one child after another, into
//! their own stream:
//!
//! ```text
//! document ──(capacity 100)──> consumer
//!    ├── shape           (ready)
//!    └── group ──(rendezvous)──> document producer
//!          ├── shape     (ready)
//!          └── group ──(rendezvous)──> group producer
//! ```
//!
//! A producer starts up to [`CHILD_LOOKAHEAD`] children beyond the one it is
//! forwarding, so that nested groups can get going while earlier siblings are
//! drained, but it never reads from a child before all the previous children
//! have finished.  That is what keeps the output in declaration order.
//!
//! Dropping an [`Instructions`] disconnects it from its producer.  The
//! producer's next write fails, it stops, and drops the streams of its own
//! children, which stops their producers in turn.  The drop waits for the
//! producer thread to exit, so when it returns the whole pipeline below that
//! stream is gone.
//!
//! Only [`MAX_PRODUCER_THREADS`](crate::MAX_PRODUCER_THREADS) producer threads
//! run at a time.  A composite started beyond that gets no thread: its stream
//! starts each child's stream when the previous one is exhausted, as it gets
//! read.  The order and the content of the instructions are the same, and
//! nothing is produced before it is asked for.  If a producer thread panics,
//! reading or dropping its stream panics with the same payload.

use std::collections::VecDeque;
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::vec;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::document::Document;
use crate::limits;
use crate::node::Node;
use crate::path_builder::{CubicBezierCurve, PathCommand};
use crate::transform::Transform;

/// Capacity of the stream returned by a document's producer.
pub const DOCUMENT_BUFFER_SIZE: usize = 100;

/// Number of children that a composite producer starts ahead of the one it is forwarding.
pub(crate) const CHILD_LOOKAHEAD: usize = 2;

/// Style that applies to the outline instructions emitted just before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paint {
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub fill: Option<String>,
    pub fill_rule: Option<String>,
}

impl Paint {
    /// Fills the unset fields of `self` from `other`.
    pub(crate) fn inherit_from(&mut self, other: &Paint) {
        fn inherit<T: Clone>(dest: &mut Option<T>, src: &Option<T>) {
            if dest.is_none() {
                dest.clone_from(src);
            }
        }

        inherit(&mut self.stroke, &other.stroke);
        inherit(&mut self.stroke_width, &other.stroke_width);
        inherit(&mut self.fill, &other.fill);
        inherit(&mut self.fill_rule, &other.fill_rule);
    }
}

/// One drawing operation, in document coordinates.
///
/// A shape emits its outline as a sequence of `MoveTo`, `LineTo`, `CurveTo`
/// and `ClosePath`, followed by a single `Paint` with the style to use for it.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingInstruction {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo {
        pt1: (f64, f64),
        pt2: (f64, f64),
        to: (f64, f64),
    },
    ClosePath,
    Paint(Paint),
}

impl DrawingInstruction {
    /// Converts a path command that has no arcs, mapping its points through `transform`.
    pub(crate) fn from_path_command(cmd: &PathCommand, transform: &Transform) -> Option<Self> {
        let instruction = match *cmd {
            PathCommand::MoveTo(x, y) => {
                let (x, y) = transform.transform_point(x, y);
                DrawingInstruction::MoveTo(x, y)
            }

            PathCommand::LineTo(x, y) => {
                let (x, y) = transform.transform_point(x, y);
                DrawingInstruction::LineTo(x, y)
            }

            PathCommand::CurveTo(CubicBezierCurve { pt1, pt2, to }) => DrawingInstruction::CurveTo {
                pt1: transform.transform_point(pt1.0, pt1.1),
                pt2: transform.transform_point(pt2.0, pt2.1),
                to: transform.transform_point(to.0, to.1),
            },

            PathCommand::ClosePath => DrawingInstruction::ClosePath,

            PathCommand::Arc(_) => return None,
        };

        Some(instruction)
    }
}

/// A single-use, ordered sequence of drawing instructions.
///
/// Iterate over it to get the instructions; the iterator ends once every
/// producer that feeds it has finished.  Dropping it early, or calling
/// [`Instructions::close`], cancels the producers.
pub struct Instructions {
    source: Source,
    producer: Option<thread::JoinHandle<()>>,
}

enum Source {
    Ready(vec::IntoIter<DrawingInstruction>),
    Stream(Receiver<DrawingInstruction>),
    Sequential(Sequential),
}

// Drains the children's streams one at a time, as the stream gets read.
struct Sequential {
    current: Option<Box<Instructions>>,
    pending: vec::IntoIter<Node>,
    _keep_alive: Option<Arc<Document>>,
}

impl Sequential {
    fn next(&mut self) -> Option<DrawingInstruction> {
        loop {
            if let Some(instruction) = self.current.as_mut().and_then(|c| c.next()) {
                return Some(instruction);
            }

            match self.pending.next() {
                Some(child) => self.current = Some(Box::new(child.instructions())),

                None => {
                    self.current = None;
                    self._keep_alive = None;
                    return None;
                }
            }
        }
    }
}

impl Instructions {
    pub(crate) fn ready(instructions: Vec<DrawingInstruction>) -> Instructions {
        Instructions {
            source: Source::Ready(instructions.into_iter()),
            producer: None,
        }
    }

    fn stream(rx: Receiver<DrawingInstruction>, producer: Option<thread::JoinHandle<()>>) -> Self {
        Instructions {
            source: Source::Stream(rx),
            producer,
        }
    }

    fn sequential(children: Vec<Node>, keep_alive: Option<Arc<Document>>) -> Self {
        Instructions {
            source: Source::Sequential(Sequential {
                current: None,
                pending: children.into_iter(),
                _keep_alive: keep_alive,
            }),
            producer: None,
        }
    }

    /// Stops reading and waits until the producers of this stream have exited.
    ///
    /// This is the same as dropping the stream.
    pub fn close(self) {}

    // Re-raises a panic from the producer thread in the reader.
    fn join_producer(&mut self) {
        if let Some(handle) = self.producer.take() {
            if let Err(payload) = handle.join() {
                if !thread::panicking() {
                    panic::resume_unwind(payload);
                }
            }
        }
    }
}

impl Iterator for Instructions {
    type Item = DrawingInstruction;

    fn next(&mut self) -> Option<DrawingInstruction> {
        match self.source {
            Source::Ready(ref mut iter) => iter.next(),
            Source::Sequential(ref mut seq) => seq.next(),

            Source::Stream(ref rx) => {
                let received = rx.recv().ok();
                if received.is_none() {
                    self.join_producer();
                }
                received
            }
        }
    }
}

impl Drop for Instructions {
    fn drop(&mut self) {
        // Disconnect before joining, so a producer blocked on sending gets woken up.
        self.source = Source::Ready(Vec::new().into_iter());

        self.join_producer();
    }
}

/// Capability of producing a stream of drawing instructions.
///
/// Implemented by [`Shape`](crate::Shape), [`Group`](crate::Group),
/// [`Node`](crate::Node) and `Arc<Document>`.  Each call returns a fresh stream
/// with the same instructions.
pub trait InstructionProducer {
    fn instructions(&self) -> Instructions;
}

static LIVE_PRODUCERS: AtomicUsize = AtomicUsize::new(0);

// Decrements the live producer count when a producer thread exits, even by panicking.
struct ProducerSlot;

impl ProducerSlot {
    fn acquire() -> Option<ProducerSlot> {
        LIVE_PRODUCERS
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limits::MAX_PRODUCER_THREADS).then_some(n + 1)
            })
            .ok()
            .map(|_| ProducerSlot)
    }
}

impl Drop for ProducerSlot {
    fn drop(&mut self) {
        LIVE_PRODUCERS.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Starts a producer that forwards the streams of `children` in order.
///
/// `capacity` is the size of the returned stream's buffer; zero makes every
/// write wait for the reader.  `keep_alive` is held by the producer until it
/// finishes, so the document stays around while its instructions are in flight.
///
/// If no producer thread can be started, the returned stream reads the
/// children's streams by itself, one after the other, as it is iterated.
pub(crate) fn forward_children(
    thread_name: &str,
    capacity: usize,
    children: Vec<Node>,
    keep_alive: Option<Arc<Document>>,
) -> Instructions {
    if let Some(slot) = ProducerSlot::acquire() {
        let (tx, rx) = bounded(capacity);
        let kids = children.clone();
        let doc = keep_alive.clone();

        let spawned = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                let _slot = slot;
                let _doc = doc;
                forward_in_order(kids, &tx);
            });

        if let Ok(handle) = spawned {
            return Instructions::stream(rx, Some(handle));
        }
    }

    Instructions::sequential(children, keep_alive)
}

/// Forwards each child's stream to completion before moving on to the next one.
///
/// Returns early if the reader of `out` went away.
fn forward_in_order(children: Vec<Node>, out: &Sender<DrawingInstruction>) {
    let mut pending = children.into_iter();
    let mut started: VecDeque<Instructions> = pending
        .by_ref()
        .take(CHILD_LOOKAHEAD + 1)
        .map(|child| child.instructions())
        .collect();

    while let Some(current) = started.pop_front() {
        for instruction in current {
            if out.send(instruction).is_err() {
                return;
            }
        }

        if let Some(child) = pending.next() {
            started.push_back(child.instructions());
        }
    }
}

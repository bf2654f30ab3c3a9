//! Processing limits to mitigate malicious SVGs.

/// Maximum number of elements loadable per document.
///
/// This is a mitigation for SVG files which create millions of elements
/// in an attempt to exhaust memory.  We don't allow loading more than
/// this number of elements during the initial streaming load process.
pub const MAX_LOADED_ELEMENTS: usize = 1_000_000;

/// Maximum depth of nested `<g>` elements, counting unwrapped unknown elements too.
///
/// The decoder, the linking pass and the instruction producers all walk the tree
/// recursively, one stack frame (or one producer) per level of nesting.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Maximum number of producer threads running at the same time, over all documents.
///
/// Groups that are started when this many producers are busy do not get a
/// thread; their children's streams are drained one after another by whoever
/// reads the group's stream.
pub const MAX_PRODUCER_THREADS: usize = 256;

pub mod decorate;
pub mod deferred;
pub mod editor;
pub mod error;
pub mod extensions;
pub mod history;
pub mod hooks;
pub mod io;
pub mod location;
pub mod node;
mod normalize;
pub mod operation;
pub mod options;
pub mod patch;
pub mod query;
pub mod refs;
pub mod schema;
pub mod snapshot;
mod transforms;

// Re-export key types for easier usage
pub use decorate::{Decorate, DecoratedRange, Leaf, leaves};
pub use deferred::{PendingDiff, TextDiff};
pub use editor::{DEFAULT_ITERATIONS_PER_DIRTY_PATH, Editor};
pub use error::{EngineError, Result};
pub use history::Batch;
pub use hooks::{DataTransfer, Extension, Next, TEXT_PLAIN};
pub use io::{IoError, read_document, write_document};
pub use location::{Affinity, Edge, Location, Path, Point, Range, RangeAffinity, SelectionEdge};
pub use node::{Element, Node, Props, Text};
pub use operation::Operation;
pub use options::{Match, Mode, Options, Unit};
pub use patch::Patch;
pub use query::{Nodes, Positions, Walk};
pub use refs::{PathRef, PointRef, RangeRef};
pub use schema::{ContentRule, DEFAULT_ROOT_FILL, Schema};

//! Reading surface: hover detection, segmentation, session state, and
//! highlight synchronization.

pub mod controller;
pub mod document;
pub mod ids;
pub mod selection;
pub mod session;
pub mod task;

pub use controller::{DebounceControl, PointerEvent, ReaderController, SurfaceEffects};
pub use document::{DisplayKind, Document, GeometryQuery, NodeId, Point, Rect};
pub use ids::{IdAllocator, IdRange};
pub use selection::{HighlightSink, LoggingHighlight, Marker, MarkerKind, SelectionSync};
pub use session::{ReaderState, ReadingSession, TextFragment};
pub use task::{spawn_reader, ReaderInput};

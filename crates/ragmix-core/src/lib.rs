pub mod config;
pub mod error;
pub mod segmenter;
pub mod settings;
pub mod source;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use segmenter::{Segmenter, Segments};
pub use settings::Settings;
pub use types::{Document, DocNo, Meta, RankedResult, ScoredSegment, Segment, SegmentId, SourceKind};

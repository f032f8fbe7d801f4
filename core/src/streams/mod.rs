//! streams: the seekable byte stream abstraction the engine is written against,
//! plus in-memory and std adapters.

pub mod types;
pub mod memory;
pub mod io;

pub use types::{copy_to, read_fully, RandomAccessStream};
pub use memory::{MemoryStream, SliceStream, WindowStream};
pub use io::IoStream;

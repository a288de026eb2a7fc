mod stream_relay;

pub use stream_relay::{EventStream, StreamRelay};

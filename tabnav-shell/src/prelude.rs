pub use crate::bus::*;
pub use lifeline::prelude::*;
pub use log::{debug, error, info, trace, warn};
pub use postage::{sink::Sink, stream::Stream};

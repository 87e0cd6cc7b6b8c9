pub mod level;
pub mod attr;
pub mod record;
pub mod destination;
pub mod fanout;
pub mod writer;
pub mod output;
pub mod text;
pub mod json;
pub mod discard;
pub mod logger;
pub mod layer;

pub mod init;
pub mod env;

mod scope;

pub use attr::{Attr, Value};
pub use destination::{Destination, EmitError, SharedDestination};
pub use fanout::FanOut;
pub use init::{init, init_global, install, Config, InitError, LogGuard};
pub use level::Level;
pub use logger::Logger;
pub use record::Record;

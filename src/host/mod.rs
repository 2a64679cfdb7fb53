//! Host shell: event script input, restart timers and snapshot output.
//!
//! Stands in for the page that embeds the session: it owns the event channel
//! and carries out the effects the session asks for.

mod printer;
mod script;
mod timer;

pub use printer::{Printer, describe};
pub use script::spawn_script_reader;
pub use timer::RestartTimer;

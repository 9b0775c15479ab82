pub mod types;
pub mod crash_point;
pub mod clock;
pub mod ledger;
pub mod bet_book;
pub mod history;
pub mod engine;
pub mod ticker;

pub use types::*;
pub use crash_point::{CrashPointGenerator, CrashPointSource, ScriptedCrashPoints};
pub use clock::{RoundClock, RoundState, RoundTransition};
pub use engine::{GameEngine, RoundEvent};
pub use ticker::spawn_ticker;

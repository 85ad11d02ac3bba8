//! Mind Chain core crate.
//!
//! A single-screen reaction / cognition mini-game: the player answers a rapid
//! series of short puzzle tasks under a per-task countdown, building a chain of
//! consecutive correct answers that multiplies score, inside a 5-minute
//! session. The round/session logic lives in `game::session` as a pure
//! event-in / commands-out state machine; `game` itself holds the browser glue
//! (DOM presenter, timers, audio cues). Fixed puzzle banks are kept here so
//! both the generators and external tooling can reach them.

use wasm_bindgen::prelude::*;

mod game;

pub use game::session::{Command, Game, Outcome, Phase, Screen, Session, format_clock};
pub use game::task::{Task, TaskKind};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// Fixed puzzle banks & symbol palette
// -----------------------------------------------------------------------------

/// Symbols the memory generator samples from (4 of 6, without replacement).
pub const COLOR_PALETTE: &[&str] = &["🔴", "🔵", "🟢", "🟡", "🟣", "🟠"];

/// Appended to a truncated memory sequence to build the fixed distractor.
/// Deliberately absent from [`COLOR_PALETTE`] so it can never collide with a
/// reshuffle of the sampled symbols.
pub const MEMORY_EXTRA_SYMBOL: &str = "🟤";

/// Odd-one-out bank: (prompt, options in display order, correct option).
pub const LOGIC_PUZZLES: &[(&str, [&str; 4], &str)] = &[
    ("Which one is different?", ["Cat", "Dog", "Car", "Bird"], "Car"),
    ("Which doesn't belong?", ["2", "4", "7", "6"], "7"),
    ("Odd one out:", ["Apple", "Banana", "Carrot", "Orange"], "Carrot"),
    ("Which is the odd one?", ["Square", "Circle", "Blue", "Triangle"], "Blue"),
];

/// What-comes-next/before bank: (prompt, shown sequence, options, correct).
pub const SEQUENCE_PUZZLES: &[(&str, &str, [&str; 4], &str)] = &[
    ("What comes before?", "B, C, D, E", ["A", "F", "Z", "G"], "A"),
    (
        "What comes after?",
        "Monday, Tuesday, Wednesday",
        ["Thursday", "Friday", "Sunday", "Monday"],
        "Thursday",
    ),
    ("Next in sequence:", "Jan, Feb, Mar, Apr", ["May", "Jun", "Dec", "Aug"], "May"),
];

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

/// Build the game layout (start / task / game-over screens) and show the start
/// screen; the session itself begins when the player hits the start button.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    game::init()
}

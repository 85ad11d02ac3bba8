// Integration tests for fixed puzzle-bank invariants.
// These tests are native-friendly and avoid wasm/browser APIs.

use std::collections::HashSet;

use mind_chain::{COLOR_PALETTE, LOGIC_PUZZLES, MEMORY_EXTRA_SYMBOL, SEQUENCE_PUZZLES};

#[test]
fn logic_puzzles_are_well_formed() {
    for (prompt, options, correct) in LOGIC_PUZZLES {
        assert!(!prompt.is_empty(), "empty prompt in LOGIC_PUZZLES");
        let unique: HashSet<&str> = options.iter().copied().collect();
        assert_eq!(unique.len(), 4, "duplicate options in logic puzzle '{}'", prompt);
        assert!(
            options.contains(correct),
            "correct answer '{}' missing from options of '{}'",
            correct,
            prompt
        );
    }
}

#[test]
fn sequence_puzzles_are_well_formed() {
    for (prompt, display, options, correct) in SEQUENCE_PUZZLES {
        assert!(!prompt.is_empty(), "empty prompt in SEQUENCE_PUZZLES");
        assert!(!display.is_empty(), "empty display for '{}'", prompt);
        let unique: HashSet<&str> = options.iter().copied().collect();
        assert_eq!(unique.len(), 4, "duplicate options in sequence puzzle '{}'", prompt);
        assert!(
            options.contains(correct),
            "correct answer '{}' missing from options of '{}'",
            correct,
            prompt
        );
        assert!(
            !display.contains(correct),
            "sequence puzzle '{}' leaks its answer in the display",
            prompt
        );
    }
}

#[test]
fn palette_symbols_are_unique_and_exclude_the_extra() {
    let unique: HashSet<&str> = COLOR_PALETTE.iter().copied().collect();
    assert_eq!(unique.len(), COLOR_PALETTE.len(), "duplicate symbol in COLOR_PALETTE");
    assert_eq!(COLOR_PALETTE.len(), 6, "memory generator samples 4 of 6 symbols");
    assert!(
        !COLOR_PALETTE.contains(&MEMORY_EXTRA_SYMBOL),
        "the truncated-distractor symbol must not be samplable"
    );
}

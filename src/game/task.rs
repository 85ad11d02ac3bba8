//! Task generation: one puzzle per round, five kinds, uniform pick.
//!
//! Generators are pure functions of the supplied RNG and share no state, so
//! they test natively with a seeded `StdRng`. All option values are
//! normalized to `String` at generation time; answer comparison downstream is
//! plain string equality. Every task carries exactly 4 distinct options
//! containing the correct answer once (distractor collisions are deduplicated
//! at the source rather than shipped to the player).

use rand::Rng;
use rand::seq::SliceRandom;

use crate::{COLOR_PALETTE, LOGIC_PUZZLES, MEMORY_EXTRA_SYMBOL, SEQUENCE_PUZZLES};

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Pattern,
    Memory,
    Logic,
    Math,
    Sequence,
}

/// One puzzle, immutable for the lifetime of its round.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub kind: TaskKind,
    pub prompt: String,
    /// Sequence / equation shown above the options, when the kind has one.
    pub display: Option<String>,
    /// Exactly 4 distinct candidate answers, one of them correct.
    pub options: Vec<String>,
    pub correct: String,
}

impl Task {
    /// Memory tasks hide their display after the fixed reveal window.
    pub fn hides_display(&self) -> bool {
        self.kind == TaskKind::Memory
    }
}

/// Produce one task of a uniformly random kind.
pub fn generate(rng: &mut impl Rng) -> Task {
    match rng.gen_range(0..5u8) {
        0 => pattern(rng),
        1 => memory(rng),
        2 => logic(rng),
        3 => math(rng),
        _ => sequence(rng),
    }
}

/// Arithmetic sequence continuation: 4 terms shown, 5th is the answer.
pub(crate) fn pattern(rng: &mut impl Rng) -> Task {
    let start: i64 = rng.gen_range(1..=5);
    let step: i64 = rng.gen_range(2..=4);
    let shown: Vec<String> = (0..4).map(|i| (start + step * i).to_string()).collect();
    let correct = start + step * 4;
    let candidates = [
        correct + rng.gen_range(1..=3),
        correct - rng.gen_range(1..=3),
        correct + step + rng.gen_range(1..=2),
    ];
    Task {
        kind: TaskKind::Pattern,
        prompt: "What number comes next?".to_string(),
        display: Some(format!("{}, ?", shown.join(", "))),
        options: numeric_options(rng, correct, &candidates),
        correct: correct.to_string(),
    }
}

/// Symbol sequence recall: shown for 2 seconds, then masked.
pub(crate) fn memory(rng: &mut impl Rng) -> Task {
    let mut palette: Vec<&str> = COLOR_PALETTE.to_vec();
    palette.shuffle(rng);
    let chosen: Vec<&str> = palette[..4].to_vec();
    let correct = chosen.join(" ");

    let mut options = vec![correct.clone()];
    // Two distractors by reshuffling the same symbols; reject duplicates of
    // the correct order or of each other. 24 permutations exist, so the
    // attempt cap is never a practical limit.
    let mut symbols = chosen.clone();
    let mut attempts = 0;
    while options.len() < 3 && attempts < 64 {
        symbols.shuffle(rng);
        let candidate = symbols.join(" ");
        if !options.contains(&candidate) {
            options.push(candidate);
        }
        attempts += 1;
    }
    // Fixed third distractor: truncate and append a symbol outside the
    // palette, so it cannot collide with any reshuffle.
    options.push(format!("{} {}", chosen[..3].join(" "), MEMORY_EXTRA_SYMBOL));
    options.shuffle(rng);

    Task {
        kind: TaskKind::Memory,
        prompt: "Remember this sequence:".to_string(),
        display: Some(correct.clone()),
        options,
        correct,
    }
}

/// Odd-one-out from the fixed bank; option order is the bank's.
pub(crate) fn logic(rng: &mut impl Rng) -> Task {
    let (prompt, options, correct) = LOGIC_PUZZLES[rng.gen_range(0..LOGIC_PUZZLES.len())];
    Task {
        kind: TaskKind::Logic,
        prompt: prompt.to_string(),
        display: None,
        options: options.iter().map(|o| o.to_string()).collect(),
        correct: correct.to_string(),
    }
}

/// Quick mental arithmetic with small operands.
pub(crate) fn math(rng: &mut impl Rng) -> Task {
    let a: i64 = rng.gen_range(2..=12);
    let b: i64 = rng.gen_range(2..=12);
    let (symbol, correct) = match rng.gen_range(0..3u8) {
        0 => ("+", a + b),
        1 => ("-", a - b),
        _ => ("×", a * b),
    };
    let candidates = [
        correct + rng.gen_range(1..=3),
        correct - rng.gen_range(1..=3),
        correct + rng.gen_range(4..=7),
    ];
    Task {
        kind: TaskKind::Math,
        prompt: "Quick math:".to_string(),
        display: Some(format!("{a} {symbol} {b} = ?")),
        options: numeric_options(rng, correct, &candidates),
        correct: correct.to_string(),
    }
}

/// What-comes-next/before from the fixed bank.
pub(crate) fn sequence(rng: &mut impl Rng) -> Task {
    let (prompt, display, options, correct) =
        SEQUENCE_PUZZLES[rng.gen_range(0..SEQUENCE_PUZZLES.len())];
    Task {
        kind: TaskKind::Sequence,
        prompt: prompt.to_string(),
        display: Some(display.to_string()),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct: correct.to_string(),
    }
}

/// Assemble `correct` plus 3 numeric distractors into a shuffled option list,
/// dropping candidate collisions and topping up from a widening offset range
/// until 4 distinct values exist.
fn numeric_options(rng: &mut impl Rng, correct: i64, candidates: &[i64]) -> Vec<String> {
    let mut values = vec![correct];
    for &c in candidates {
        if !values.contains(&c) {
            values.push(c);
        }
    }
    let mut spread: i64 = 4;
    while values.len() < 4 {
        let offset = rng.gen_range(1..=spread);
        let candidate = if rng.gen_range(0..2) == 0 { correct + offset } else { correct - offset };
        if !values.contains(&candidate) {
            values.push(candidate);
        }
        spread += 1;
    }
    let mut options: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    options.shuffle(rng);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn assert_shape(task: &Task) {
        assert_eq!(task.options.len(), 4, "task {task:?} must have 4 options");
        let unique: HashSet<&String> = task.options.iter().collect();
        assert_eq!(unique.len(), 4, "options must be distinct: {task:?}");
        assert_eq!(
            task.options.iter().filter(|o| **o == task.correct).count(),
            1,
            "correct answer must appear exactly once: {task:?}"
        );
    }

    #[test]
    fn every_generated_task_has_4_distinct_options() {
        for seed in 0..300u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_shape(&generate(&mut rng));
        }
    }

    #[test]
    fn all_kinds_are_reachable() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            seen.insert(generate(&mut rng).kind);
        }
        for kind in [
            TaskKind::Pattern,
            TaskKind::Memory,
            TaskKind::Logic,
            TaskKind::Math,
            TaskKind::Sequence,
        ] {
            assert!(seen.contains(&kind), "{kind:?} never generated");
        }
    }

    #[test]
    fn pattern_answer_is_fifth_term_of_shown_sequence() {
        for seed in 0..100u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let task = pattern(&mut rng);
            assert_shape(&task);
            let display = task.display.as_deref().unwrap();
            let terms: Vec<i64> = display
                .trim_end_matches(", ?")
                .split(", ")
                .map(|t| t.parse().unwrap())
                .collect();
            assert_eq!(terms.len(), 4);
            let step = terms[1] - terms[0];
            assert!((2..=4).contains(&step));
            assert!((1..=5).contains(&terms[0]));
            for pair in terms.windows(2) {
                assert_eq!(pair[1] - pair[0], step);
            }
            assert_eq!(task.correct, (terms[3] + step).to_string());
        }
    }

    #[test]
    fn math_answer_matches_displayed_equation() {
        for seed in 0..100u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let task = math(&mut rng);
            assert_shape(&task);
            let display = task.display.as_deref().unwrap();
            let parts: Vec<&str> = display.trim_end_matches(" = ?").split(' ').collect();
            let &[a, op, b] = parts.as_slice() else {
                panic!("unexpected equation: {display}")
            };
            let a: i64 = a.parse().unwrap();
            let b: i64 = b.parse().unwrap();
            assert!((2..=12).contains(&a) && (2..=12).contains(&b));
            let expected = match op {
                "+" => a + b,
                "-" => a - b,
                "×" => a * b,
                other => panic!("unexpected operator: {other}"),
            };
            assert_eq!(task.correct, expected.to_string());
        }
    }

    #[test]
    fn memory_task_shows_what_it_asks_for() {
        for seed in 0..100u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let task = memory(&mut rng);
            assert_shape(&task);
            assert!(task.hides_display());
            assert_eq!(task.display.as_deref(), Some(task.correct.as_str()));
            // 4 distinct palette symbols joined by spaces.
            let symbols: Vec<&str> = task.correct.split(' ').collect();
            assert_eq!(symbols.len(), 4);
            let unique: HashSet<&&str> = symbols.iter().collect();
            assert_eq!(unique.len(), 4);
            for s in &symbols {
                assert!(COLOR_PALETTE.contains(s), "{s} not in palette");
            }
            // The fixed truncated distractor is present.
            assert!(
                task.options
                    .iter()
                    .any(|o| o.ends_with(MEMORY_EXTRA_SYMBOL) && *o != task.correct)
            );
        }
    }

    #[test]
    fn bank_tasks_come_verbatim_from_their_banks() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let task = logic(&mut rng);
            assert_shape(&task);
            assert!(task.display.is_none());
            assert!(LOGIC_PUZZLES.iter().any(|(p, opts, c)| {
                *p == task.prompt
                    && *c == task.correct
                    && opts.iter().map(|o| o.to_string()).collect::<Vec<_>>() == task.options
            }));

            let task = sequence(&mut rng);
            assert_shape(&task);
            assert!(SEQUENCE_PUZZLES.iter().any(|(p, d, opts, c)| {
                *p == task.prompt
                    && Some(d.to_string()) == task.display
                    && *c == task.correct
                    && opts.iter().map(|o| o.to_string()).collect::<Vec<_>>() == task.options
            }));
        }
    }

    #[test]
    fn numeric_options_dedupe_colliding_distractors() {
        let mut rng = StdRng::seed_from_u64(9);
        // Candidates collide with the correct answer and each other on purpose.
        let options = numeric_options(&mut rng, 21, &[21, 21, 24]);
        assert_eq!(options.len(), 4);
        let unique: HashSet<&String> = options.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(options.contains(&"21".to_string()));
    }
}

//! # indicial-schedule
//!
//! Dependency ordering of derived quantities.
//!
//! A discretization evaluates derived quantities (pressure from momentum
//! and energy, temperature from pressure, ...) whose formulas reference
//! each other. [`DependencyGraph`] records each quantity with the names it
//! requires and produces an evaluation order in which every quantity
//! appears after everything it depends on.
//!
//! The sort runs in rounds: each round schedules, in insertion order, every
//! still-pending quantity whose requirements are all satisfied, and a
//! quantity scheduled earlier in a round satisfies later ones in the same
//! round. A round that schedules nothing means the remainder can never
//! resolve (a cycle, or a requirement nobody provides) and fails
//! immediately rather than spinning.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::debug;

/// Hard upper bound on scheduling rounds. Progress of at least one quantity
/// per round makes this unreachable for any realistic equation system; it
/// exists so a scheduler bug can never loop forever.
pub const ROUND_CAP: usize = 1000;

/// A scheduling failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// A round completed without scheduling anything: the listed quantities
    /// form a cycle or require names nobody provides.
    #[error("dependency resolution stalled; unresolved: {}", render_stuck(.0))]
    Stalled(Vec<(String, Vec<String>)>),

    /// The round cap was hit before the graph resolved.
    #[error("dependency resolution exceeded {ROUND_CAP} rounds")]
    RoundCapExceeded,
}

fn render_stuck(stuck: &[(String, Vec<String>)]) -> String {
    stuck
        .iter()
        .map(|(name, missing)| format!("{name} (needs {})", missing.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Quantities to be evaluated, each with the names it requires.
///
/// Insertion order is preserved and breaks ties: independent quantities are
/// scheduled in the order they were inserted.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    entries: Vec<(String, Vec<String>)>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a quantity with its requirements. Re-inserting a name replaces
    /// its requirement list in place, keeping the original position.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        requires: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let name = name.into();
        let requires: Vec<String> = requires.into_iter().map(Into::into).collect();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = requires;
        } else {
            self.entries.push((name, requires));
        }
    }

    /// The number of quantities in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the graph has no quantities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produces an evaluation order over all quantities, given the names
    /// that are available up front (solution variables, constants).
    ///
    /// # Errors
    ///
    /// Fails with [`ScheduleError::Stalled`] when the remaining quantities
    /// cannot make progress, naming each stuck quantity with its unmet
    /// requirements.
    pub fn sort(&self, known: &FxHashSet<String>) -> Result<Vec<String>, ScheduleError> {
        let mut resolved: FxHashSet<String> = known.clone();
        let mut pending: Vec<(String, Vec<String>)> = self.entries.clone();
        let mut order = Vec::with_capacity(pending.len());

        let mut rounds = 0;
        while !pending.is_empty() {
            rounds += 1;
            if rounds > ROUND_CAP {
                return Err(ScheduleError::RoundCapExceeded);
            }
            let before = pending.len();
            let mut still = Vec::new();
            for (name, requires) in pending {
                if requires.iter().all(|r| resolved.contains(r)) {
                    resolved.insert(name.clone());
                    order.push(name);
                } else {
                    still.push((name, requires));
                }
            }
            pending = still;
            debug!(round = rounds, scheduled = order.len(), "scheduling round");
            if pending.len() == before {
                let stuck = pending
                    .into_iter()
                    .map(|(name, requires)| {
                        let missing: Vec<String> = requires
                            .into_iter()
                            .filter(|r| !resolved.contains(r))
                            .collect();
                        (name, missing)
                    })
                    .collect();
                return Err(ScheduleError::Stalled(stuck));
            }
        }
        Ok(order)
    }
}

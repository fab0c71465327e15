//! Random shortcode generation
//!
//! Draws come from a [`CodeSource`] so tests can substitute a deterministic
//! source. Collisions are retried a bounded number of times.

use std::collections::HashSet;

use rand::{distr::Alphanumeric, Rng};

use crate::error::GenerationExhausted;

/// Length of generated shortcodes
pub const GENERATED_LENGTH: usize = 8;

/// Draws allowed before giving up
pub const MAX_ATTEMPTS: usize = 10;

/// Produces candidate shortcodes
pub trait CodeSource: Send + Sync + 'static {
    /// Returns an alphanumeric string of exactly `len` characters
    fn draw(&self, len: usize) -> String;
}

/// Draws from the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeSource;

impl CodeSource for RandomCodeSource {
    fn draw(&self, len: usize) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

/// Returns a fresh 8-character code not present in `existing`
pub fn generate_shortcode(
    existing: &HashSet<String>,
    source: &dyn CodeSource,
) -> Result<String, GenerationExhausted> {
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = source.draw(GENERATED_LENGTH);
        if !existing.contains(&candidate) {
            tracing::debug!(shortcode = %candidate, attempt, "Generated shortcode");
            return Ok(candidate);
        }
    }

    tracing::error!(attempts = MAX_ATTEMPTS, "Failed to generate unique shortcode");
    Err(GenerationExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

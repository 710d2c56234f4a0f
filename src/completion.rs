use crate::span::{ByteSpan, contains};

/// Candidate names taken from the most recent workload listing.
///
/// Only one generation of candidates is live at a time: `rebuild` drops the
/// previous list before installing the new one.
#[derive(Debug, Clone, Default)]
pub struct CompletionIndex {
    candidates: Vec<String>,
    generation: u64,
}

impl CompletionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, listing: ByteSpan<'_>) {
        self.candidates = Vec::new();

        let mut remaining = listing;
        let mut next = Vec::new();
        while !remaining.is_empty() {
            let line = remaining.split_on(b'\n').trim_end_cr();
            let field = line.first_field();
            if field.is_empty() {
                continue;
            }
            next.push(field.to_string_lossy().into_owned());
        }

        self.candidates = next;
        self.generation = self.generation.wrapping_add(1);
    }

    /// First candidate, in listing order, that contains `partial` anywhere.
    pub fn complete(&self, partial: &str) -> Option<&str> {
        let needle = ByteSpan::from_text(partial);
        self.candidates
            .iter()
            .find(|candidate| contains(ByteSpan::from_text(candidate), needle))
            .map(String::as_str)
    }

    #[cfg(test)]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

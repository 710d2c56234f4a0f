use std::borrow::Cow;

/// Non-owning view over a byte range. Copying a span never copies the bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteSpan<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteSpan<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn to_string_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes)
    }

    /// Returns everything before the first `delimiter` and advances `self`
    /// past it. Without a delimiter the whole remainder is returned and `self`
    /// becomes empty.
    pub fn split_on(&mut self, delimiter: u8) -> ByteSpan<'a> {
        if self.bytes.is_empty() {
            return ByteSpan::default();
        }

        match self.bytes.iter().position(|byte| *byte == delimiter) {
            Some(index) => {
                let head = &self.bytes[..index];
                self.bytes = &self.bytes[index + 1..];
                ByteSpan::new(head)
            }
            None => {
                let head = self.bytes;
                self.bytes = &self.bytes[self.bytes.len()..];
                ByteSpan::new(head)
            }
        }
    }

    /// First ASCII-whitespace-delimited field, leading whitespace skipped.
    pub fn first_field(&self) -> ByteSpan<'a> {
        let start = self
            .bytes
            .iter()
            .position(|byte| !byte.is_ascii_whitespace())
            .unwrap_or(self.bytes.len());
        let rest = &self.bytes[start..];
        let end = rest
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(rest.len());
        ByteSpan::new(&rest[..end])
    }

    pub fn trim_end_cr(&self) -> ByteSpan<'a> {
        match self.bytes.split_last() {
            Some((b'\r', head)) => ByteSpan::new(head),
            _ => *self,
        }
    }
}

/// True iff `needle` occurs contiguously in `haystack`. Empty inputs never
/// match.
pub fn contains(haystack: ByteSpan<'_>, needle: ByteSpan<'_>) -> bool {
    if haystack.is_empty() || needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }

    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{ByteSpan, contains};
    use proptest::prelude::*;

    fn split_all(source: &[u8], delimiter: u8) -> Vec<Vec<u8>> {
        let mut remaining = ByteSpan::new(source);
        let mut fields = Vec::new();
        while !remaining.is_empty() {
            fields.push(remaining.split_on(delimiter).as_bytes().to_vec());
        }
        fields
    }

    #[test]
    fn split_on_consumes_delimiter() {
        let mut view = ByteSpan::from_text("pod-a 1/1\npod-b 0/1\n");
        assert_eq!(view.split_on(b'\n').as_bytes(), b"pod-a 1/1");
        assert_eq!(view.as_bytes(), b"pod-b 0/1\n");
        assert_eq!(view.split_on(b'\n').as_bytes(), b"pod-b 0/1");
        assert!(view.is_empty());
    }

    #[test]
    fn split_on_without_delimiter_takes_everything() {
        let mut view = ByteSpan::from_text(":gp");
        assert_eq!(view.split_on(b' ').as_bytes(), b":gp");
        assert!(view.is_empty());
    }

    #[test]
    fn split_on_empty_view_returns_empty_span() {
        let mut view = ByteSpan::default();
        assert!(view.split_on(b'\n').is_empty());
        assert!(view.is_empty());
    }

    #[test]
    fn split_on_yields_empty_fields_between_adjacent_delimiters() {
        assert_eq!(
            split_all(b"a,,b", b','),
            vec![b"a".to_vec(), Vec::new(), b"b".to_vec()]
        );
        assert_eq!(split_all(b",", b','), vec![Vec::new()]);
    }

    #[test]
    fn first_field_skips_leading_whitespace() {
        let line = ByteSpan::from_text("  pod-a-123\t1/1   Running");
        assert_eq!(line.first_field().as_bytes(), b"pod-a-123");
        assert!(ByteSpan::from_text("   ").first_field().is_empty());
    }

    #[test]
    fn trim_end_cr_handles_crlf_lines() {
        assert_eq!(
            ByteSpan::from_text("pod-a\r").trim_end_cr().as_bytes(),
            b"pod-a"
        );
        assert_eq!(ByteSpan::from_text("pod-a").trim_end_cr().as_bytes(), b"pod-a");
    }

    #[test]
    fn contains_rejects_empty_and_oversized_needles() {
        let haystack = ByteSpan::from_text("pod");
        assert!(!contains(haystack, ByteSpan::default()));
        assert!(!contains(ByteSpan::default(), haystack));
        assert!(!contains(haystack, ByteSpan::from_text("pods")));
        assert!(contains(haystack, ByteSpan::from_text("od")));
    }

    #[test]
    fn contains_matches_naive_search_exhaustively() {
        fn words(max_len: usize) -> Vec<Vec<u8>> {
            let mut all = vec![Vec::new()];
            let mut frontier = vec![Vec::new()];
            for _ in 0..max_len {
                let mut next = Vec::new();
                for word in &frontier {
                    for byte in [b'a', b'b', b'c'] {
                        let mut extended: Vec<u8> = word.clone();
                        extended.push(byte);
                        next.push(extended);
                    }
                }
                all.extend(next.iter().cloned());
                frontier = next;
            }
            all
        }

        let candidates = words(4);
        for haystack in &candidates {
            for needle in &candidates {
                let expected = !haystack.is_empty()
                    && !needle.is_empty()
                    && needle.len() <= haystack.len()
                    && (0..=haystack.len() - needle.len())
                        .any(|start| &haystack[start..start + needle.len()] == needle.as_slice());
                assert_eq!(
                    contains(ByteSpan::new(haystack), ByteSpan::new(needle)),
                    expected,
                    "haystack={haystack:?} needle={needle:?}"
                );
            }
        }
    }

    proptest! {
        #[test]
        fn split_round_trips_through_join(
            source in proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'\n')], 0..64)
        ) {
            let fields = split_all(&source, b'\n');
            let mut rebuilt = fields.join(&b'\n');
            if source.last() == Some(&b'\n') {
                rebuilt.push(b'\n');
            }
            prop_assert_eq!(rebuilt, source);
        }
    }
}

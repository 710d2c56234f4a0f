use crate::span::ByteSpan;

/// Append-only byte accumulator used to collect subprocess output.
///
/// Growth is geometric: when an append does not fit, at least
/// `max(appended, capacity)` extra bytes are reserved, so appends are
/// amortized O(1). Allocation failure aborts the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let required = self.bytes.len().saturating_add(data.len());
        if required > self.bytes.capacity() {
            let grow = data.len().max(self.bytes.capacity());
            self.bytes.reserve_exact(grow);
        }
        self.bytes.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn span(&self) -> ByteSpan<'_> {
        ByteSpan::new(&self.bytes)
    }
}

impl From<&str> for ByteBuffer {
    fn from(text: &str) -> Self {
        let mut buffer = Self::with_capacity(text.len());
        buffer.append(text.as_bytes());
        buffer
    }
}

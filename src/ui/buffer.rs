// src/ui/buffer.rs

/// Output retained for display, capped at a fixed number of bytes.
///
/// Appending past the cap discards the oldest bytes. The cut is moved forward
/// to the next character boundary, so the buffer may hold slightly less than
/// the cap but is always valid UTF-8.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    data: String,
    max_bytes: usize,
}

impl OutputBuffer {
    pub fn with_capacity(max_bytes: usize) -> Self {
        Self {
            data: String::new(),
            max_bytes,
        }
    }

    pub fn push(&mut self, chunk: &str) {
        self.data.push_str(chunk);

        if self.data.len() > self.max_bytes {
            let mut cut = self.data.len() - self.max_bytes;
            while !self.data.is_char_boundary(cut) {
                cut += 1;
            }
            self.data.drain(..cut);
        }
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

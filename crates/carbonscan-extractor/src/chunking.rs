//! Packing classified spans into bounded chunks

use carbonscan_domain::{Chunk, ClassifiedSpan};
use tracing::warn;

/// Greedily packs spans, in order, into chunks under a character limit
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    max_chars: usize,
}

impl ChunkBuilder {
    /// Create a chunk builder
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Character limit per chunk
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Pack spans into chunks
    ///
    /// Spans keep their order and are never split. A span that cannot fit
    /// in any chunk gets one to itself, flagged `oversized`.
    pub fn build(&self, spans: Vec<ClassifiedSpan>) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current = Chunk::new(0);

        for span in spans {
            let len = span.char_len();

            if len > self.max_chars {
                if span.is_table() {
                    warn!(
                        "Table on page {} is {} chars (limit {}), sending alone",
                        span.page_index, len, self.max_chars
                    );
                } else {
                    warn!(
                        "Text span on page {} is {} chars (limit {})",
                        span.page_index, len, self.max_chars
                    );
                }
                self.close(&mut chunks, &mut current);
                let mut alone = Chunk::new(chunks.len());
                alone.push(span);
                alone.oversized = true;
                chunks.push(alone);
                current = Chunk::new(chunks.len());
                continue;
            }

            let needed = if current.is_empty() {
                len
            } else {
                current.char_len() + Chunk::SEPARATOR.len() + len
            };
            if needed > self.max_chars {
                self.close(&mut chunks, &mut current);
            }
            current.push(span);
        }

        self.close(&mut chunks, &mut current);
        chunks
    }

    fn close(&self, chunks: &mut Vec<Chunk>, current: &mut Chunk) {
        if !current.is_empty() {
            let next = Chunk::new(chunks.len() + 1);
            chunks.push(std::mem::replace(current, next));
        }
    }
}

/// A segment of extracted text ready for embedding. Indexes count emitted
/// segments only, so they are contiguous even when blank windows are
/// discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub index: i32,
    pub text: String,
    pub token_estimate: i32,
}

pub const DEFAULT_CHUNK_SIZE: usize = 1200;
pub const DEFAULT_OVERLAP: usize = 200;

/// Sliding-window segmenter. The window advances by `chunk_size - overlap`
/// per step, so overlap must be strictly smaller than the window or the
/// scan would never terminate.
#[derive(Debug, Clone)]
pub struct TextSegmenter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSegmenter {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, String> {
        if chunk_size == 0 {
            return Err("chunk_size must be positive".to_string());
        }
        if overlap >= chunk_size {
            return Err(format!(
                "overlap ({}) must be strictly less than chunk_size ({})",
                overlap, chunk_size
            ));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Scan the text into overlapping, trimmed, size-bounded segments.
    /// Sizes are measured in characters; the token estimate is
    /// ceil(chars / 4), a cheap proxy rather than a real tokenizer.
    pub fn segment(&self, text: &str) -> Vec<Segment> {
        let chars: Vec<char> = text.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0usize;
        let mut index = 0i32;

        while i < chars.len() {
            let end = usize::min(i + self.chunk_size, chars.len());
            let window: String = chars[i..end].iter().collect();
            let trimmed = window.trim();

            if !trimmed.is_empty() {
                let char_count = trimmed.chars().count();
                segments.push(Segment {
                    index,
                    text: trimmed.to_string(),
                    token_estimate: char_count.div_ceil(4) as i32,
                });
                index += 1;
            }

            if end == chars.len() {
                break;
            }
            // Never regress before position 0.
            i = end.saturating_sub(self.overlap);
        }

        segments
    }
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

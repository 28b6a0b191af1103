//! Fixed-size word chunker for the retrieval corpus.
//!
//! Text is split on whitespace and regrouped into chunks of at most
//! `chunk_size` words joined by single spaces. Unlike a paragraph chunker
//! this ignores document structure; chunk boundaries fall wherever the word
//! count says.
//!
//! ```rust
//! use rfp_analyzer_core::chunk::chunk_words;
//!
//! let chunks = chunk_words("one two three four five", 2);
//! assert_eq!(chunks, vec!["one two", "three four", "five"]);
//! ```

/// Default words per chunk.
pub const DEFAULT_CHUNK_WORDS: usize = 500;

/// Split `text` into chunks of `chunk_size` words.
///
/// Empty or whitespace-only text yields no chunks. A `chunk_size` of zero
/// is treated as one.
pub fn chunk_words(text: &str, chunk_size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(chunk_size.max(1))
        .map(|group| group.join(" "))
        .collect()
}

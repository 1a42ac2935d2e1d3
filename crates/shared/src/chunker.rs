/// Soft maximum size for a single chunk, in bytes.
pub const MAX_CHUNK_SIZE: usize = 2000;

/// Target number of summarization groups per document. The batch size grows
/// with the document so the external-call count stays near this figure.
pub const TARGET_GROUP_COUNT: usize = 15;

/// Split plain text into paragraph-aligned chunks bounded by `max_size`.
///
/// Paragraphs are accumulated greedily; a paragraph that alone exceeds the
/// limit is hard-split into fixed-size slices (char-boundary safe, word
/// boundaries ignored). Whitespace-only paragraphs are skipped. Pure: the
/// same input always yields the same chunks, in input order.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        // The +2 accounts for the paragraph separator joining it on.
        if !current.is_empty() && current.len() + paragraph.len() + 2 > max_size {
            chunks.push(current);
            current = paragraph.to_string();
        } else if current.is_empty() {
            current = paragraph.to_string();
        } else {
            current.push_str("\n\n");
            current.push_str(paragraph);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .flat_map(|chunk| {
            if chunk.len() > max_size {
                hard_split(&chunk, max_size)
            } else {
                vec![chunk]
            }
        })
        .collect()
}

/// Slice an oversized paragraph into `max_size`-byte pieces, backing each cut
/// off to the nearest UTF-8 char boundary.
fn hard_split(text: &str, max_size: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_size).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        parts.push(text[start..end].to_string());
        start = end;
    }

    parts
}

/// Group chunks into batches, each batch joined with blank lines.
///
/// The batch size is `ceil(n / target_groups)` so the number of batches (and
/// therefore summarization calls) stays roughly at `target_groups` no matter
/// how long the newsletter is.
pub fn group_chunks(chunks: &[String], target_groups: usize) -> Vec<String> {
    if chunks.is_empty() {
        return Vec::new();
    }

    let group_size = chunks.len().div_ceil(target_groups.max(1)).max(1);

    chunks
        .chunks(group_size)
        .map(|group| group.join("\n\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(word: &str, len: usize) -> String {
        let mut s = String::new();
        while s.len() < len {
            s.push_str(word);
            s.push(' ');
        }
        s.trim().to_string()
    }

    // ==================== Chunking Tests ====================

    #[test]
    fn test_chunks_reconstruct_paragraphs_in_order() {
        let text = "first paragraph\n\nsecond paragraph\n\n\n\nthird paragraph";
        let chunks = chunk_text(text, 40);

        let rebuilt: Vec<String> = chunks
            .join("\n\n")
            .split("\n\n")
            .map(str::to_string)
            .collect();
        assert_eq!(
            rebuilt,
            vec!["first paragraph", "second paragraph", "third paragraph"]
        );
    }

    #[test]
    fn test_paragraphs_accumulate_until_limit() {
        let a = para("alpha", 800);
        let b = para("beta", 800);
        let c = para("gamma", 800);
        let text = format!("{}\n\n{}\n\n{}", a, b, c);

        let chunks = chunk_text(&text, 2000);

        // a+b fit together under 2000, c starts a fresh chunk
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("alpha"));
        assert!(chunks[0].contains("beta"));
        assert!(chunks[1].contains("gamma"));
    }

    #[test]
    fn test_oversized_paragraph_is_hard_split() {
        let big = para("word", 5000);
        let chunks = chunk_text(&big, 2000);

        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.len() <= 2000));
        assert_eq!(chunks.concat(), big);
    }

    #[test]
    fn test_hard_split_respects_char_boundaries() {
        // é is two bytes; an odd limit forces a cut inside it unless backed off
        let text = "é".repeat(30);
        let parts = hard_split(&text, 5);

        assert_eq!(parts.concat(), text);
        assert!(parts.iter().all(|p| p.len() <= 5));
    }

    #[test]
    fn test_blank_paragraphs_are_skipped() {
        let chunks = chunk_text("  \n\n\n\nonly real paragraph\n\n   ", 2000);
        assert_eq!(chunks, vec!["only real paragraph"]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", 2000).is_empty());
    }

    // ==================== Batching Tests ====================

    #[test]
    fn test_batch_count_stays_near_target() {
        let chunks: Vec<String> = (0..100).map(|i| format!("chunk number {}", i)).collect();
        let batches = group_chunks(&chunks, 15);

        // ceil(100/15) = 7 per batch -> ceil(100/7) = 15 batches
        assert_eq!(batches.len(), 15);
    }

    #[test]
    fn test_fewer_chunks_than_target_gives_one_batch_each() {
        let chunks: Vec<String> = (0..7).map(|i| format!("chunk number {}", i)).collect();
        let batches = group_chunks(&chunks, 15);

        assert_eq!(batches.len(), 7);
        assert_eq!(batches[0], "chunk number 0");
    }

    #[test]
    fn test_batches_join_chunks_with_blank_lines() {
        let chunks = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let batches = group_chunks(&chunks, 1);

        assert_eq!(batches, vec!["one\n\ntwo\n\nthree"]);
    }

    #[test]
    fn test_no_chunks_no_batches() {
        assert!(group_chunks(&[], 15).is_empty());
    }

    #[test]
    fn test_batch_count_bound_holds_across_sizes() {
        for n in [1usize, 5, 14, 15, 16, 44, 45, 200] {
            let chunks: Vec<String> = (0..n).map(|i| i.to_string()).collect();
            let batches = group_chunks(&chunks, 15);
            let group_size = n.div_ceil(15).max(1);
            assert!(batches.len() <= n.div_ceil(group_size));
        }
    }
}

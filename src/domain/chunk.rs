//! 대형 diff를 모델 토큰 예산에 맞는 청크로 나누는 모듈.

use tracing::debug;

use crate::domain::review::FileChange;

/// 토큰 추정 근사치: 1 토큰 ≈ 4문자.
/// 실제 토크나이저가 아니라 의도된 고정 근사값이며, 청크 경계와 프롬프트
/// 예산이 이 값 기준으로 튜닝되어 있다.
pub const CHARS_PER_TOKEN: usize = 4;

const FILE_BOUNDARY: &str = "\n\nFile: ";
const FILE_PREFIX: &str = "File: ";

fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}

/// 변경 목록을 모델 입력용 diff 텍스트로 렌더링한다.
/// 파일 경계는 `split_diff_into_chunks`가 그대로 되찾을 수 있는 형태다.
pub fn format_diff_text(changes: &[FileChange]) -> String {
    changes
        .iter()
        .map(|change| {
            format!(
                "File: {} -> {}\n```diff\n{}\n```",
                change.old_path, change.new_path, change.diff
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// diff 텍스트를 파일 블록 단위로 욕심쟁이 누적해 청크로 나눈다.
///
/// 블록 하나가 예산을 넘으면 물리 라인 그룹으로 다시 나눈다(라인 자체는
/// 절대 쪼개지 않는다). 빈 diff는 청크 0개를 돌려주고, 입력이 어떤
/// 형태여도 실패하지 않는다 — 최악의 경우 작은 청크가 많아질 뿐이다.
pub fn split_diff_into_chunks(diff: &str, max_tokens_per_chunk: usize) -> Vec<String> {
    if diff.trim().is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current_blocks: Vec<String> = Vec::new();
    let mut current_size = 0usize;

    for block in diff.split(FILE_BOUNDARY) {
        // 분리자에 잘려나간 접두사를 첫 블록 이외에 다시 붙인다.
        let block = if chunks.is_empty() && current_blocks.is_empty() {
            block.to_string()
        } else {
            format!("{FILE_PREFIX}{block}")
        };
        let block_size = estimate_tokens(&block);

        if block_size > max_tokens_per_chunk {
            split_oversized_block(
                &block,
                max_tokens_per_chunk,
                &mut chunks,
                &mut current_blocks,
                &mut current_size,
            );
        } else if current_size + block_size > max_tokens_per_chunk && !current_blocks.is_empty() {
            chunks.push(current_blocks.join("\n\n"));
            current_blocks = vec![block];
            current_size = block_size;
        } else {
            current_blocks.push(block);
            current_size += block_size;
        }
    }

    if !current_blocks.is_empty() {
        chunks.push(current_blocks.join("\n\n"));
    }

    debug!(
        num_chunks = chunks.len(),
        max_tokens_per_chunk, "split diff into chunks"
    );
    chunks
}

/// 예산을 넘는 단일 파일 블록을 라인 그룹으로 재분할한다.
fn split_oversized_block(
    block: &str,
    max_tokens_per_chunk: usize,
    chunks: &mut Vec<String>,
    current_blocks: &mut Vec<String>,
    current_size: &mut usize,
) {
    let mut group: Vec<&str> = Vec::new();
    let mut group_size = 0usize;

    for line in block.split('\n') {
        let line_size = estimate_tokens(line);
        if group_size + line_size > max_tokens_per_chunk && !group.is_empty() {
            if !current_blocks.is_empty() {
                chunks.push(current_blocks.join("\n\n"));
            }
            *current_blocks = vec![group.join("\n")];
            *current_size = group_size;
            group = vec![line];
            group_size = line_size;
        } else {
            group.push(line);
            group_size += line_size;
        }
    }

    if !group.is_empty() {
        if !current_blocks.is_empty() {
            chunks.push(current_blocks.join("\n\n"));
        }
        *current_blocks = vec![group.join("\n")];
        *current_size = group_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(old: &str, new: &str, diff: &str) -> FileChange {
        FileChange {
            old_path: old.to_string(),
            new_path: new.to_string(),
            diff: diff.to_string(),
            new_file: false,
            renamed_file: false,
            deleted_file: false,
        }
    }

    #[test]
    fn empty_diff_yields_zero_chunks() {
        assert!(split_diff_into_chunks("", 100).is_empty());
        assert!(split_diff_into_chunks("  \n\n ", 100).is_empty());
    }

    #[test]
    fn small_diff_fits_in_one_chunk() {
        let diff = format_diff_text(&[change("a.rs", "a.rs", "@@ -1 +1 @@\n-x\n+y")]);
        let chunks = split_diff_into_chunks(&diff, 1000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], diff);
    }

    #[test]
    fn joining_chunks_reconstructs_the_diff() {
        let diff = format_diff_text(&[
            change("a.rs", "a.rs", "@@ -1 +1 @@\n-old a\n+new a"),
            change("b.rs", "b.rs", "@@ -1 +1 @@\n-old b\n+new b"),
            change("c.rs", "c.rs", "@@ -1 +1 @@\n-old c\n+new c"),
        ]);

        // 블록 하나 크기보다 약간 큰 예산으로 강제 분할한다.
        let chunks = split_diff_into_chunks(&diff, 15);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.join("\n\n"), diff);
    }

    #[test]
    fn chunks_respect_token_budget() {
        let diff = format_diff_text(&[
            change("a.rs", "a.rs", "@@ -1 +1 @@\n-old a\n+new a"),
            change("b.rs", "b.rs", "@@ -1 +1 @@\n-old b\n+new b"),
        ]);
        let budget = 20;
        for chunk in split_diff_into_chunks(&diff, budget) {
            assert!(chunk.len() / CHARS_PER_TOKEN <= budget, "chunk over budget: {chunk}");
        }
    }

    #[test]
    fn block_of_exactly_budget_size_fits_alone() {
        let block = "x".repeat(80);
        let chunks = split_diff_into_chunks(&block, 20);
        assert_eq!(chunks, vec![block]);
    }

    #[test]
    fn oversized_block_is_split_into_line_groups() {
        let long_line = |tag: &str| format!("+{}{}", tag, "x".repeat(38));
        let block = format!(
            "File: big.rs -> big.rs\n{}\n{}\n{}",
            long_line("a"),
            long_line("b"),
            long_line("c")
        );
        let chunks = split_diff_into_chunks(&block, 12);
        assert!(chunks.len() > 1);

        // 물리 라인은 절대 쪼개지지 않는다.
        let original_lines: Vec<&str> = block.split('\n').collect();
        for chunk in &chunks {
            for line in chunk.split('\n') {
                assert!(original_lines.contains(&line));
            }
        }
    }

    #[test]
    fn single_line_over_budget_becomes_its_own_chunk() {
        let huge = format!("+{}", "y".repeat(400));
        let block = format!("short\n{huge}\nshort");
        let chunks = split_diff_into_chunks(&block, 10);
        assert!(chunks.iter().any(|c| c == &huge));
    }

    #[test]
    fn ordering_is_preserved() {
        let diff = format_diff_text(&[
            change("a.rs", "a.rs", "+first"),
            change("b.rs", "b.rs", "+second"),
            change("c.rs", "c.rs", "+third"),
        ]);
        let chunks = split_diff_into_chunks(&diff, 12);
        let joined = chunks.join("\n\n");
        let first = joined.find("first").unwrap();
        let second = joined.find("second").unwrap();
        let third = joined.find("third").unwrap();
        assert!(first < second && second < third);
    }
}

//! Truncation for log output
//!
//! Model responses are logged verbatim at debug level; these helpers keep
//! the head and tail of an oversized response and cut only on UTF-8
//! character boundaries.

const APPROX_BYTES_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationPolicy {
    Bytes(usize),
    Tokens(usize),
}

impl TruncationPolicy {
    pub fn byte_budget(&self) -> usize {
        match self {
            TruncationPolicy::Bytes(bytes) => *bytes,
            TruncationPolicy::Tokens(tokens) => tokens.saturating_mul(APPROX_BYTES_PER_TOKEN),
        }
    }
}

/// Keeps roughly half the budget from each end of `content`.
pub fn truncate_text(content: &str, policy: TruncationPolicy) -> String {
    let budget = policy.byte_budget();
    if content.len() <= budget {
        return content.to_string();
    }
    if budget == 0 {
        return format!("[{} bytes omitted]", content.len());
    }

    let half = budget / 2;
    let head_end = boundary_at_or_before(content, half);
    let tail_start = boundary_at_or_after(content, content.len() - half).max(head_end);

    let omitted = tail_start - head_end;
    format!(
        "{} ... [{} bytes omitted] ... {}",
        &content[..head_end],
        omitted,
        &content[tail_start..]
    )
}

fn boundary_at_or_before(text: &str, mut idx: usize) -> usize {
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn boundary_at_or_after(text: &str, mut idx: usize) -> usize {
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

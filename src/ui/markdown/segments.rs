//! Splitting assistant content into reasoning and normal segments before
//! markdown parsing. Reasoning segments are delimited by `<think>` and
//! `</think>`; an unterminated open tag claims the rest of the string, so
//! the split is safe to run on a partial message mid-stream.

use crate::core::constants::{REASONING_CLOSE_TAG, REASONING_OPEN_TAG};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Normal(String),
    Reasoning(String),
}

pub fn split_reasoning(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = content;

    loop {
        let Some(open) = rest.find(REASONING_OPEN_TAG) else {
            if !rest.trim().is_empty() {
                segments.push(Segment::Normal(rest.to_string()));
            }
            break;
        };

        let before = &rest[..open];
        if !before.trim().is_empty() {
            segments.push(Segment::Normal(before.to_string()));
        }

        let after_open = &rest[open + REASONING_OPEN_TAG.len()..];
        match after_open.find(REASONING_CLOSE_TAG) {
            Some(close) => {
                let body = &after_open[..close];
                if !body.trim().is_empty() {
                    segments.push(Segment::Reasoning(body.to_string()));
                }
                rest = &after_open[close + REASONING_CLOSE_TAG.len()..];
            }
            None => {
                if !after_open.trim().is_empty() {
                    segments.push(Segment::Reasoning(after_open.to_string()));
                }
                break;
            }
        }
    }

    segments
}

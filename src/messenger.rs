use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, MessageId, ReplyParameters};
use tracing::{debug, error};

/// Telegram's per-message text limit
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Delivers one already-sized segment to the chat provider.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_segment(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()>;
}

#[async_trait]
impl ChatSender for Bot {
    async fn send_segment(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()> {
        let mut req = self.send_message(ChatId(chat_id), text);
        req.link_preview_options = Some(LinkPreviewOptions {
            is_disabled: true,
            url: None,
            prefer_small_media: false,
            prefer_large_media: false,
            show_above_text: false,
        });
        if let Some(id) = reply_to {
            req.reply_parameters = Some(ReplyParameters::new(MessageId(id)));
        }
        req.await
            .with_context(|| format!("Failed to send message to chat {}", chat_id))?;
        Ok(())
    }
}

/// Split text into segments of at most `max_len` characters.
///
/// Each split happens at the last newline inside the window, which is
/// dropped; a window without a newline is cut at exactly `max_len`.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let window_end = match rest.char_indices().nth(max_len) {
            Some((idx, _)) => idx,
            None => {
                chunks.push(rest.to_string());
                break;
            }
        };

        let window = &rest[..window_end];
        match window.rfind('\n') {
            Some(pos) => {
                if pos > 0 {
                    chunks.push(window[..pos].to_string());
                }
                rest = &rest[pos + 1..];
            }
            None => {
                chunks.push(window.to_string());
                rest = &rest[window_end..];
            }
        }
    }

    chunks
}

/// Chunking front-end over a [`ChatSender`], shared by the update loop and the webhook.
#[derive(Clone)]
pub struct Messenger {
    sender: Arc<dyn ChatSender>,
}

impl Messenger {
    pub fn new(sender: Arc<dyn ChatSender>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, chat_id: i64, text: &str) -> usize {
        self.deliver(chat_id, text, None).await
    }

    /// Like [`Messenger::send`], with the first segment threaded as a reply.
    pub async fn reply(&self, chat_id: i64, text: &str, reply_to: i32) -> usize {
        self.deliver(chat_id, text, Some(reply_to)).await
    }

    /// Send every segment in order; a failed segment is logged and skipped.
    /// Returns the number of segments delivered.
    async fn deliver(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> usize {
        let segments = split_message(text, MAX_MESSAGE_LEN);
        let total = segments.len();
        let mut delivered = 0;

        for (i, segment) in segments.iter().enumerate() {
            if segment.trim().is_empty() {
                debug!("Skipping blank segment {}/{} for chat {}", i + 1, total, chat_id);
                continue;
            }
            let reply = if i == 0 { reply_to } else { None };
            match self.sender.send_segment(chat_id, segment, reply).await {
                Ok(()) => delivered += 1,
                Err(e) => error!("Segment {}/{} to chat {} failed: {:#}", i + 1, total, chat_id, e),
            }
        }

        delivered
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSender;
    use super::*;

    #[test]
    fn test_short_text_is_single_segment() {
        assert_eq!(split_message("hello", 10), vec!["hello"]);
        let exact = "x".repeat(10);
        assert_eq!(split_message(&exact, 10), vec![exact.clone()]);
        assert_eq!(split_message("", 10), vec![""]);
    }

    #[test]
    fn test_splits_at_last_newline_in_window() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_message(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_lines_rejoin_to_input() {
        let line = "line of news text";
        let text = vec![line; 50].join("\n");
        let chunks = split_message(&text, 64);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 64));
        assert_eq!(chunks.join("\n"), text);
    }

    #[test]
    fn test_no_newline_hard_split() {
        let text = "z".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 10);
        assert_eq!(chunks[2].len(), 5);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_no_newline_exact_multiple() {
        let text = "q".repeat(MAX_MESSAGE_LEN * 2);
        let chunks = split_message(&text, MAX_MESSAGE_LEN);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == MAX_MESSAGE_LEN));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "é".repeat(15);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks[1].chars().count(), 5);
    }

    #[test]
    fn test_leading_newline_does_not_emit_empty_segment() {
        let text = format!("\n{}", "y".repeat(12));
        let chunks = split_message(&text, 10);
        assert_eq!(chunks, vec!["y".repeat(10), "y".repeat(2)]);
    }

    #[tokio::test]
    async fn test_messenger_sends_segments_in_order() {
        let sender = Arc::new(RecordingSender::default());
        let messenger = Messenger::new(sender.clone());

        let first = "a".repeat(MAX_MESSAGE_LEN - 10);
        let second = "b".repeat(100);
        let text = format!("{}\n{}", first, second);

        assert_eq!(messenger.send(7, &text).await, 2);
        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text, first);
        assert_eq!(sent[1].text, second);
        assert!(sent.iter().all(|s| s.chat_id == 7 && s.reply_to.is_none()));
    }

    #[tokio::test]
    async fn test_failed_segment_does_not_abort() {
        let sender = Arc::new(RecordingSender::failing_on(vec![0]));
        let messenger = Messenger::new(sender.clone());

        let text = "c".repeat(MAX_MESSAGE_LEN * 2 + 1);
        assert_eq!(messenger.send(1, &text).await, 2);
        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].text, "c");
    }

    #[tokio::test]
    async fn test_reply_tags_first_segment_only() {
        let sender = Arc::new(RecordingSender::default());
        let messenger = Messenger::new(sender.clone());

        let text = "d".repeat(MAX_MESSAGE_LEN + 1);
        messenger.reply(3, &text, 99).await;
        let sent = sender.sent();
        assert_eq!(sent[0].reply_to, Some(99));
        assert_eq!(sent[1].reply_to, None);
    }

    #[tokio::test]
    async fn test_blank_text_is_not_sent() {
        let sender = Arc::new(RecordingSender::default());
        let messenger = Messenger::new(sender.clone());
        assert_eq!(messenger.send(1, "  ").await, 0);
        assert!(sender.sent().is_empty());
    }
}

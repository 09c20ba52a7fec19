use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use futures::stream::{self, Stream, StreamExt};

pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(100);

/// Splits text into the chunks shown by the typing effect: one per word,
/// each followed by a single space except the last.
pub fn word_chunks(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let last = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i < last {
                format!("{} ", word)
            } else {
                word.to_string()
            }
        })
        .collect()
}

/// Yields the chunks of `text`, sleeping `delay` after each one.
pub fn typing_stream(text: &str, delay: Duration) -> impl Stream<Item = String> {
    stream::iter(word_chunks(text)).then(move |chunk| async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        chunk
    })
}

/// Presents an assistant reply to the user.
#[async_trait(?Send)]
pub trait ReplyRenderer {
    /// Writes the reply and returns the text as it was displayed.
    async fn render(&mut self, text: &str) -> Result<String>;
}

pub struct PlainRenderer<W: Write> {
    output: W,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

#[async_trait(?Send)]
impl<W: Write> ReplyRenderer for PlainRenderer<W> {
    async fn render(&mut self, text: &str) -> Result<String> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()?;
        Ok(text.to_string())
    }
}

pub struct TypingRenderer<W: Write> {
    output: W,
    delay: Duration,
}

impl<W: Write> TypingRenderer<W> {
    pub fn new(output: W, delay: Duration) -> Self {
        Self { output, delay }
    }
}

#[async_trait(?Send)]
impl<W: Write> ReplyRenderer for TypingRenderer<W> {
    async fn render(&mut self, text: &str) -> Result<String> {
        let mut shown = String::new();
        let mut chunks = Box::pin(typing_stream(text, self.delay));

        while let Some(chunk) = chunks.next().await {
            write!(self.output, "{}", chunk)?;
            self.output.flush()?;
            shown.push_str(&chunk);
        }

        writeln!(self.output)?;
        Ok(shown)
    }
}

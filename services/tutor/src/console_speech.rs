//! Terminal stand-ins for the platform speech engines: the learner types an
//! utterance per line and the tutor's spoken lines are printed.

use async_trait::async_trait;
use speakgenie_core::speech::{
    RecognitionError, SpeechRecognizer, SpeechSynthesizer, SynthesisError, Utterance, Voice,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::{Mutex, Notify};

/// Typed lines that end the conversation.
const QUIT_WORDS: [&str; 3] = ["quit", "exit", "bye"];

pub struct ConsoleRecognizer<R> {
    lines: Mutex<Lines<R>>,
    abort: Notify,
}

impl ConsoleRecognizer<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> ConsoleRecognizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
            abort: Notify::new(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> SpeechRecognizer for ConsoleRecognizer<R> {
    async fn recognize(&self, locale: &str) -> Result<String, RecognitionError> {
        tracing::trace!("Reading typed utterance ({})", locale);
        let mut lines = self.lines.lock().await;

        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if QUIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w)) {
                        Err(RecognitionError::Aborted)
                    } else if line.is_empty() {
                        Err(RecognitionError::NoSpeech)
                    } else {
                        Ok(line.to_string())
                    }
                }
                Ok(None) => Err(RecognitionError::Aborted),
                Err(e) => Err(RecognitionError::Engine(e.to_string())),
            },
            _ = self.abort.notified() => Err(RecognitionError::Aborted),
        }
    }

    fn abort(&self) {
        self.abort.notify_one();
    }
}

pub struct ConsoleSynthesizer<W> {
    out: Mutex<W>,
}

impl ConsoleSynthesizer<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleSynthesizer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> SpeechSynthesizer for ConsoleSynthesizer<W> {
    fn voices(&self) -> Vec<Voice> {
        // A terminal has no voices; the bridge falls back to the default.
        Vec::new()
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), SynthesisError> {
        let mut out = self.out.lock().await;
        let line = format!("Tutor [{}]: {}\n", utterance.lang, utterance.text);
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| SynthesisError::Engine(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| SynthesisError::Engine(e.to_string()))
    }

    fn cancel(&self) {}
}

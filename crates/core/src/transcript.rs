//! Transcript Emission
//!
//! The transcript is the only user-visible output of a simulation: one plain
//! text line per event, in the order the events happened.

use std::fmt;
use std::io::{self, Write};

/// Something that happened during a run and belongs in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// A participant spoke.
    Utterance { speaker: String, text: String },
    /// A new round is about to start.
    RoundBoundary(u32),
    /// The round budget is exhausted.
    End,
}

impl fmt::Display for TranscriptEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptEvent::Utterance { speaker, text } => write!(f, "{}: {}", speaker, text),
            TranscriptEvent::RoundBoundary(round) => write!(f, "--- Round {} ---", round),
            TranscriptEvent::End => write!(f, "Simulation ended."),
        }
    }
}

/// Receives transcript events as the engine produces them.
pub trait TranscriptSink {
    fn emit(&mut self, event: &TranscriptEvent) -> io::Result<()>;
}

/// Keeps the rendered transcript lines in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryTranscript {
    lines: Vec<String>,
}

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl TranscriptSink for MemoryTranscript {
    fn emit(&mut self, event: &TranscriptEvent) -> io::Result<()> {
        self.lines.push(event.to_string());
        Ok(())
    }
}

/// Writes each event as a line to any `Write`, flushing after every line.
pub struct WriterTranscript<W: Write> {
    writer: W,
}

impl<W: Write> WriterTranscript<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TranscriptSink for WriterTranscript<W> {
    fn emit(&mut self, event: &TranscriptEvent) -> io::Result<()> {
        writeln!(self.writer, "{}", event)?;
        self.writer.flush()
    }
}

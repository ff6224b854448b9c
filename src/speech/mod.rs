//! Text-to-speech and speech-to-text collaborators.
//!
//! Both are synchronous and allowed to fail. Synthesis failure is `None`;
//! recognition failure is one of the non-`Heard` [`Transcript`] variants and
//! is never graded as an answer.

pub mod cache;
pub mod command;
#[cfg(feature = "network")]
pub mod gtts;

/// Encoded audio (mp3 from synthesis, whatever the recorder emits otherwise).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

pub trait SpeechSynthesizer {
    fn synthesize(&self, text: &str) -> Option<AudioClip>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transcript {
    Heard(String),
    NotRecognized,
    ServiceError(String),
    OtherError(String),
}

impl Transcript {
    /// The recognized text, if there is any worth grading.
    pub fn usable_text(&self) -> Option<&str> {
        match self {
            Transcript::Heard(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

pub trait SpeechRecognizer {
    fn transcribe(&self, audio: &AudioClip) -> Transcript;
}

pub trait AudioRecorder {
    fn record(&self) -> Option<AudioClip>;
}

/// Synthesizer used when speech is disabled.
pub struct Silent;

impl SpeechSynthesizer for Silent {
    fn synthesize(&self, _text: &str) -> Option<AudioClip> {
        None
    }
}

/// Pick the synthesizer for the current config.
pub fn synthesizer(enabled: bool, lang: &str) -> Box<dyn SpeechSynthesizer> {
    if !enabled {
        return Box::new(Silent);
    }
    #[cfg(feature = "network")]
    {
        Box::new(gtts::GoogleTts::new(lang))
    }
    #[cfg(not(feature = "network"))]
    {
        tracing::warn!(lang, "speech enabled but built without the network feature");
        Box::new(Silent)
    }
}

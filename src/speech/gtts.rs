use std::time::Duration;

use crate::speech::cache::ClipCache;
use crate::speech::{AudioClip, SpeechSynthesizer};

const TTS_URL: &str = "https://translate.google.com/translate_tts";
/// The endpoint rejects longer queries.
const MAX_CHARS: usize = 200;

/// Google Translate text-to-speech, the service behind gTTS.
pub struct GoogleTts {
    lang: String,
    cache: Option<ClipCache>,
}

impl GoogleTts {
    pub fn new(lang: &str) -> Self {
        Self {
            lang: lang.to_string(),
            cache: ClipCache::new("tts"),
        }
    }

    fn fetch(&self, text: &str) -> Option<Vec<u8>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .ok()?;
        let response = client
            .get(TTS_URL)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.lang.as_str()),
                ("q", text),
            ])
            .send()
            .ok()?;
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "tts request rejected");
            return None;
        }
        let bytes = response.bytes().ok()?;
        (!bytes.is_empty()).then(|| bytes.to_vec())
    }
}

/// Split text into pieces of at most `max` characters, breaking between
/// words. A single word longer than `max` is cut mid-word.
fn chunks(text: &str, max: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if word_len > max {
            let chars: Vec<char> = word.chars().collect();
            for part in chars.chunks(max) {
                pieces.push(part.iter().collect());
            }
            continue;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if current_len > 0 {
        pieces.push(current);
    }
    pieces
}

impl SpeechSynthesizer for GoogleTts {
    fn synthesize(&self, text: &str) -> Option<AudioClip> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let key = format!("{}-{}", self.lang, text);
        if let Some(bytes) = self.cache.as_ref().and_then(|c| c.get(&key, "mp3")) {
            return Some(AudioClip {
                bytes,
                extension: "mp3",
            });
        }
        // MP3 frames concatenate, so long text is fetched piecewise and joined.
        let mut bytes = Vec::new();
        for piece in chunks(text, MAX_CHARS) {
            bytes.extend(self.fetch(&piece)?);
        }
        if let Some(cache) = &self.cache {
            cache.put(&key, "mp3", &bytes);
        }
        Some(AudioClip {
            bytes,
            extension: "mp3",
        })
    }
}

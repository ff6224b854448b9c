use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::bank::PhraseBank;
use crate::config::Config;
use crate::engine::question::QuizMode;
use crate::session::Session;
use crate::speech::command::{AudioPlayer, CommandLine, CommandRecognizer, CommandRecorder};
use crate::speech::{self, AudioClip, AudioRecorder, SpeechRecognizer, SpeechSynthesizer, Transcript};
use crate::store::json_store::JsonStore;
use crate::store::ledger::{MemoryStore, MistakeLedger};
use crate::ui::components::menu::Menu;
use crate::ui::components::mistake_list::MistakeSelection;
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    Drill,
    Mistakes,
    Settings,
}

/// Rows of the settings screen, top to bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsField {
    ReviewRate,
    Mode(QuizMode),
    Speech,
    Theme,
}

pub const SETTINGS_FIELDS: [SettingsField; 8] = [
    SettingsField::ReviewRate,
    SettingsField::Mode(QuizMode::Phrase),
    SettingsField::Mode(QuizMode::Sentence),
    SettingsField::Mode(QuizMode::Listening),
    SettingsField::Mode(QuizMode::Choice),
    SettingsField::Mode(QuizMode::Speaking),
    SettingsField::Speech,
    SettingsField::Theme,
];

const REVIEW_RATE_STEP: f64 = 0.05;

pub struct App {
    pub screen: AppScreen,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub bank: PhraseBank,
    /// Why the bank is empty, if loading failed.
    pub bank_error: Option<String>,
    pub ledger: MistakeLedger,
    pub session: Session,
    pub input: LineInput,
    /// Set when no question could be produced.
    pub drill_error: Option<String>,
    pub mistakes: MistakeSelection,
    pub settings_selected: usize,
    /// A recording was requested and runs after the next draw.
    pub recording: bool,
    pub should_quit: bool,
    rng: SmallRng,
    tts: Box<dyn SpeechSynthesizer>,
    recorder: Option<Box<dyn AudioRecorder>>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    player: Option<AudioPlayer>,
}

impl App {
    pub fn new(config: Config, seed: Option<u64>) -> Self {
        let ledger = match JsonStore::new() {
            Ok(store) => MistakeLedger::load(Box::new(store)),
            Err(err) => {
                tracing::warn!(error = %err, "data dir unavailable, mistakes will not be saved");
                MistakeLedger::load(Box::new(MemoryStore::default()))
            }
        };
        let mut app = Self::with_ledger(config, ledger, seed);
        app.reload_bank();
        app
    }

    /// Build the app around an existing ledger with an empty bank.
    pub fn with_ledger(config: Config, ledger: MistakeLedger, seed: Option<u64>) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let menu = Menu::new(theme);

        let tts = speech::synthesizer(config.speech_enabled, &config.tts_lang);
        let recorder = config
            .record_command
            .as_deref()
            .and_then(CommandLine::parse)
            .map(|line| Box::new(CommandRecorder::new(line)) as Box<dyn AudioRecorder>);
        let recognizer = config
            .transcribe_command
            .as_deref()
            .and_then(CommandLine::parse)
            .map(|line| Box::new(CommandRecognizer::new(line)) as Box<dyn SpeechRecognizer>);
        let player = config
            .audio_player
            .as_deref()
            .and_then(CommandLine::parse)
            .and_then(AudioPlayer::new);

        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Self {
            screen: AppScreen::Menu,
            menu,
            theme,
            config,
            bank: PhraseBank::default(),
            bank_error: None,
            ledger,
            session: Session::new(),
            input: LineInput::default(),
            drill_error: None,
            mistakes: MistakeSelection::default(),
            settings_selected: 0,
            recording: false,
            should_quit: false,
            rng,
            tts,
            recorder,
            recognizer,
            player,
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        let theme: &'static Theme = Box::leak(Box::new(theme));
        self.theme = theme;
        self.menu.theme = theme;
    }

    /// Re-read the phrase bank and the mistake ledger from disk.
    pub fn reload_bank(&mut self) {
        self.ledger.reload();
        let path = self.config.phrase_bank_path();
        let (bank, error) = PhraseBank::load_reporting(&path);
        self.bank = bank;
        self.bank_error = error.map(|err| err.to_string());
        self.refresh_menu_status();
    }

    pub fn refresh_menu_status(&mut self) {
        self.menu.status = Some(self.bank_status());
    }

    /// One-line summary for the menu.
    pub fn bank_status(&self) -> (String, bool) {
        match &self.bank_error {
            Some(err) => (err.clone(), true),
            None => (
                format!(
                    "{} phrases, {} meanings, {} to review",
                    self.bank.len(),
                    self.bank.meanings.len(),
                    self.ledger.len()
                ),
                false,
            ),
        }
    }

    pub fn start_drill(&mut self) {
        self.screen = AppScreen::Drill;
        self.next_question();
    }

    pub fn next_question(&mut self) {
        self.input.clear();
        self.stop_audio();
        let settings = self.config.selector_settings();
        match self.session.next_question(
            &self.bank,
            &mut self.ledger,
            &settings,
            self.tts.as_ref(),
            &mut self.rng,
        ) {
            Ok(_) => {
                self.drill_error = None;
                self.replay_audio();
            }
            Err(err) => {
                tracing::warn!(error = %err, "no question available");
                self.drill_error = Some(err.to_string());
            }
        }
    }

    pub fn submit_input(&mut self) {
        if self.session.is_answered() {
            self.next_question();
            return;
        }
        let graded = self
            .session
            .submit(
                &self.bank,
                &mut self.ledger,
                self.tts.as_ref(),
                self.input.value(),
            )
            .is_some();
        if graded {
            self.input.clear();
            self.replay_audio();
        }
    }

    /// Answer a multiple-choice question with the option at `index`.
    pub fn choose(&mut self, index: usize) {
        let Some(option) = self
            .session
            .question()
            .filter(|q| q.mode == QuizMode::Choice)
            .and_then(|q| q.options.get(index))
            .cloned()
        else {
            return;
        };
        if self
            .session
            .submit(&self.bank, &mut self.ledger, self.tts.as_ref(), &option)
            .is_some()
        {
            self.replay_audio();
        }
    }

    /// Flag a recording so the UI can show it before the recorder blocks.
    pub fn request_recording(&mut self) {
        let speaking = self
            .session
            .question()
            .is_some_and(|q| q.mode == QuizMode::Speaking);
        self.recording = speaking && !self.session.is_answered();
    }

    /// Record and grade a spoken answer to a speaking question.
    pub fn record_answer(&mut self) {
        self.recording = false;
        let speaking = self
            .session
            .question()
            .is_some_and(|q| q.mode == QuizMode::Speaking);
        if !speaking || self.session.is_answered() {
            return;
        }
        self.stop_audio();
        let Some(clip) = self.recorder.as_ref().and_then(|r| r.record()) else {
            self.session.recording_failed();
            return;
        };
        let transcript = match &self.recognizer {
            Some(recognizer) => recognizer.transcribe(&clip),
            None => Transcript::OtherError("no transcribe command configured".to_string()),
        };
        if self
            .session
            .submit_transcript(&self.bank, &mut self.ledger, self.tts.as_ref(), transcript)
            .is_some()
        {
            self.replay_audio();
        }
    }

    /// Play the feedback sentence once answered, the prompt audio otherwise.
    pub fn replay_audio(&mut self) {
        let clip: Option<AudioClip> = if self.session.is_answered() {
            self.session.feedback_audio().clip().cloned()
        } else {
            self.session.prompt_audio().clip().cloned()
        };
        if let (Some(player), Some(clip)) = (self.player.as_mut(), clip) {
            player.play(&clip);
        }
    }

    fn stop_audio(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.stop();
        }
    }

    pub fn skip_question(&mut self) {
        self.next_question();
    }

    pub fn go_to_menu(&mut self) {
        self.stop_audio();
        self.session.skip();
        self.input.clear();
        self.drill_error = None;
        self.refresh_menu_status();
        self.screen = AppScreen::Menu;
    }

    pub fn go_to_mistakes(&mut self) {
        self.mistakes = MistakeSelection::default();
        self.screen = AppScreen::Mistakes;
    }

    /// Remove the chosen rows from the ledger. Returns how many were removed.
    pub fn remove_selected_mistakes(&mut self) -> usize {
        let keys = self.mistakes.chosen_keys(self.ledger.keys());
        let removed = self.ledger.remove_many(&keys);
        tracing::info!(removed, "cleared mistakes");
        self.mistakes.reset(self.ledger.len());
        removed
    }

    pub fn go_to_settings(&mut self) {
        self.settings_selected = 0;
        self.screen = AppScreen::Settings;
    }

    pub fn settings_field(&self) -> SettingsField {
        SETTINGS_FIELDS[self.settings_selected.min(SETTINGS_FIELDS.len() - 1)]
    }

    pub fn settings_value(&self, field: SettingsField) -> String {
        let on_off = |on: bool| (if on { "on" } else { "off" }).to_string();
        match field {
            SettingsField::ReviewRate => {
                format!("{:.0}%", self.config.review_probability * 100.0)
            }
            SettingsField::Mode(mode) => {
                let enabled = self.config.enabled_modes.contains(&mode);
                if enabled && mode == QuizMode::Choice && !self.bank.supports_choice() {
                    "on (needs 4 meanings)".to_string()
                } else {
                    on_off(enabled)
                }
            }
            SettingsField::Speech => on_off(self.config.speech_enabled),
            SettingsField::Theme => self.config.theme.clone(),
        }
    }

    pub fn settings_cycle_forward(&mut self) {
        self.settings_cycle(true);
    }

    pub fn settings_cycle_backward(&mut self) {
        self.settings_cycle(false);
    }

    fn settings_cycle(&mut self, forward: bool) {
        match self.settings_field() {
            SettingsField::ReviewRate => {
                let step = if forward {
                    REVIEW_RATE_STEP
                } else {
                    -REVIEW_RATE_STEP
                };
                let rate = (self.config.review_probability + step).clamp(0.0, 1.0);
                self.config.review_probability = (rate * 100.0).round() / 100.0;
            }
            SettingsField::Mode(mode) => {
                let modes = &mut self.config.enabled_modes;
                if let Some(pos) = modes.iter().position(|m| *m == mode) {
                    // At least one mode stays enabled.
                    if modes.len() > 1 {
                        modes.remove(pos);
                    }
                } else {
                    modes.push(mode);
                    modes.sort_by_key(|m| QuizMode::ALL.iter().position(|a| a == m));
                }
            }
            SettingsField::Speech => {
                self.config.speech_enabled = !self.config.speech_enabled;
                self.tts = speech::synthesizer(self.config.speech_enabled, &self.config.tts_lang);
            }
            SettingsField::Theme => {
                let themes = Theme::available_themes();
                if let Some(idx) = themes.iter().position(|t| *t == self.config.theme) {
                    let next = if forward {
                        (idx + 1) % themes.len()
                    } else if idx == 0 {
                        themes.len() - 1
                    } else {
                        idx - 1
                    };
                    self.config.theme = themes[next].clone();
                } else if let Some(first) = themes.first() {
                    self.config.theme = first.clone();
                }
                if let Some(new_theme) = Theme::load(&self.config.theme) {
                    self.set_theme(new_theme);
                }
            }
        }
    }

    pub fn save_settings(&mut self) {
        self.config.validate();
        if let Err(err) = self.config.save() {
            tracing::warn!(error = %err, "failed to save config");
        }
    }
}

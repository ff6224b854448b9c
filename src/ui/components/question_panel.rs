use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::engine::question::{ActiveQuestion, QuizMode};
use crate::session::{AudioSlot, Session};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// Prompt, hint, choice options and the answer line for the open question.
pub struct QuestionPanel<'a> {
    question: &'a ActiveQuestion,
    session: &'a Session,
    input: &'a LineInput,
    recording: bool,
    theme: &'a Theme,
}

impl<'a> QuestionPanel<'a> {
    pub fn new(
        question: &'a ActiveQuestion,
        session: &'a Session,
        input: &'a LineInput,
        theme: &'a Theme,
    ) -> Self {
        Self {
            question,
            session,
            input,
            recording: false,
            theme,
        }
    }

    pub fn recording(mut self, recording: bool) -> Self {
        self.recording = recording;
        self
    }

    fn prompt_lines(&self) -> Vec<Line<'a>> {
        let colors = &self.theme.colors;
        let q = self.question;
        let heading = Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD);
        let emphasis = Style::default()
            .fg(colors.accent())
            .add_modifier(Modifier::BOLD);

        match q.mode {
            QuizMode::Phrase => vec![
                Line::from(Span::styled("Type the phrase for this meaning:", heading)),
                Line::from(Span::styled(q.item.meaning.clone(), emphasis)),
            ],
            QuizMode::Sentence => vec![
                Line::from(vec![
                    Span::styled("Meaning: ", heading),
                    Span::styled(q.item.meaning.clone(), emphasis),
                ]),
                Line::from(""),
                Line::from(Span::styled(q.masked_sentence(), emphasis)),
            ],
            QuizMode::Listening => vec![
                Line::from(Span::styled(
                    "Listen to the sentence and fill in the blank:",
                    heading,
                )),
                Line::from(""),
                Line::from(Span::styled(q.masked_sentence(), emphasis)),
            ],
            QuizMode::Choice => vec![Line::from(Span::styled(
                "Listen and pick the matching meaning:",
                heading,
            ))],
            QuizMode::Speaking => vec![
                Line::from(Span::styled("Read this sentence aloud:", heading)),
                Line::from(""),
                Line::from(Span::styled(q.full_sentence(), emphasis)),
            ],
        }
    }

    fn audio_line(&self) -> Option<Line<'a>> {
        let colors = &self.theme.colors;
        if !self.question.mode.has_prompt_audio() {
            return None;
        }
        let line = match self.session.prompt_audio() {
            AudioSlot::Ready(_) => Line::from(Span::styled(
                "\u{266a} Audio ready  [Ctrl+P] play again",
                Style::default().fg(colors.success()),
            )),
            AudioSlot::Failed => {
                // Without audio the listening modes still need something to go on.
                let fallback = match self.question.mode {
                    QuizMode::Choice => format!(" Phrase: {}", self.question.item.phrase),
                    _ => String::new(),
                };
                Line::from(vec![
                    Span::styled(
                        "Audio generation failed.",
                        Style::default().fg(colors.warning()),
                    ),
                    Span::styled(fallback, Style::default().fg(colors.fg())),
                ])
            }
            AudioSlot::Empty => return None,
        };
        Some(line)
    }

    fn answer_lines(&self) -> Vec<Line<'a>> {
        let colors = &self.theme.colors;
        if self.question.mode == QuizMode::Choice {
            return self
                .question
                .options
                .iter()
                .enumerate()
                .map(|(i, option)| {
                    Line::from(vec![
                        Span::styled(
                            format!("  [{}] ", i + 1),
                            Style::default().fg(colors.focused_key()),
                        ),
                        Span::styled(option.clone(), Style::default().fg(colors.fg())),
                    ])
                })
                .collect();
        }

        let (before, cursor, after) = self.input.render_parts();
        let cursor_style = Style::default()
            .fg(colors.text_cursor_fg())
            .bg(colors.text_cursor_bg());
        let label = if self.question.mode == QuizMode::Speaking {
            "Say it ([Ctrl+R] record) or type it: "
        } else {
            "Answer: "
        };
        vec![Line::from(vec![
            Span::styled(label, Style::default().fg(colors.text_pending())),
            Span::styled(before.to_string(), Style::default().fg(colors.fg())),
            Span::styled(
                cursor.map(String::from).unwrap_or_else(|| " ".to_string()),
                cursor_style,
            ),
            Span::styled(after.to_string(), Style::default().fg(colors.fg())),
        ])]
    }
}

impl Widget for QuestionPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let title = if self.question.is_review {
            format!(" {} \u{00b7} Review ", self.question.mode.label())
        } else {
            format!(" {} ", self.question.mode.label())
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(if self.question.is_review {
                colors.warning()
            } else {
                colors.accent()
            }))
            .style(Style::default().bg(colors.bg()));

        let mut lines = vec![Line::from("")];
        lines.extend(self.prompt_lines());
        if let Some(audio) = self.audio_line() {
            lines.push(Line::from(""));
            lines.push(audio);
        }
        if let Some(hint) = self.session.visible_hint() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Hint: starts with \"{}\" ({} characters)", hint.first, hint.len),
                Style::default().fg(colors.focused_key()),
            )));
        }
        if !self.session.is_answered() {
            lines.push(Line::from(""));
            lines.extend(self.answer_lines());
        }
        if self.recording {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "\u{25cf} Recording...",
                Style::default().fg(colors.error()).add_modifier(Modifier::BOLD),
            )));
        }
        if let Some(heard) = self.session.heard() {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Heard: ", Style::default().fg(colors.text_pending())),
                Span::styled(heard.to_string(), Style::default().fg(colors.fg())),
            ]));
        }
        if let Some(notice) = self.session.notice() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                notice.message(),
                Style::default().fg(colors.warning()),
            )));
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::engine::diff::{DiffSpan, SpanKind};
use crate::engine::grader::{GradeOutcome, LedgerEffect, Verdict};
use crate::session::AudioSlot;
use crate::ui::theme::{Theme, ThemeColors};

/// Verdict, character diff and the completed sentence for a graded answer.
pub struct FeedbackPanel<'a> {
    outcome: &'a GradeOutcome,
    audio: &'a AudioSlot,
    theme: &'a Theme,
}

impl<'a> FeedbackPanel<'a> {
    pub fn new(outcome: &'a GradeOutcome, audio: &'a AudioSlot, theme: &'a Theme) -> Self {
        Self {
            outcome,
            audio,
            theme,
        }
    }
}

fn verdict_color(verdict: Verdict, colors: &ThemeColors) -> Color {
    match verdict {
        Verdict::Correct => colors.success(),
        Verdict::CorrectWrongForm | Verdict::CorrectSynonymWrongTarget => colors.warning(),
        Verdict::Incorrect => colors.error(),
    }
}

fn span_style(kind: SpanKind, colors: &ThemeColors) -> Style {
    match kind {
        SpanKind::Matched => Style::default()
            .fg(colors.text_correct())
            .add_modifier(Modifier::BOLD),
        SpanKind::Missing => Style::default()
            .fg(colors.text_incorrect())
            .bg(colors.text_incorrect_bg())
            .add_modifier(Modifier::UNDERLINED),
        SpanKind::Extra => Style::default()
            .fg(colors.text_pending())
            .add_modifier(Modifier::CROSSED_OUT),
    }
}

/// Style each diff run. Missing spaces get a visible marker so they are not lost.
pub fn diff_line<'a>(spans: &'a [DiffSpan], colors: &ThemeColors) -> Line<'a> {
    Line::from(
        spans
            .iter()
            .map(|span| {
                let text = if span.kind == SpanKind::Missing && span.text.trim().is_empty() {
                    span.text.replace(' ', "\u{2423}")
                } else {
                    span.text.clone()
                };
                Span::styled(text, span_style(span.kind, colors))
            })
            .collect::<Vec<_>>(),
    )
}

impl Widget for FeedbackPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let outcome = self.outcome;
        let accent = verdict_color(outcome.verdict, colors);

        let block = Block::bordered()
            .title(" Result ")
            .border_style(Style::default().fg(accent))
            .style(Style::default().bg(colors.bg()));

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                outcome.headline(),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            )),
        ];

        if let Some(ref spans) = outcome.diff {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Your answer against the target:",
                Style::default().fg(colors.text_pending()),
            )));
            lines.push(diff_line(spans, colors));
            lines.push(Line::from(vec![
                Span::styled("missing", span_style(SpanKind::Missing, colors)),
                Span::raw("  "),
                Span::styled("extra", span_style(SpanKind::Extra, colors)),
            ]));
        }

        if outcome.ledger_effect == LedgerEffect::Added {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("\"{}\" was added to your mistake list.", outcome.phrase),
                Style::default().fg(colors.text_pending()),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Sentence: ", Style::default().fg(colors.text_pending())),
            Span::styled(
                outcome.full_sentence.clone(),
                Style::default().fg(colors.fg()),
            ),
        ]));
        if self.audio.clip().is_some() {
            lines.push(Line::from(Span::styled(
                "\u{266a} [Ctrl+P] hear it again",
                Style::default().fg(colors.text_pending()),
            )));
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

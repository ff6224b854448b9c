use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::Tally;
use crate::ui::theme::Theme;

pub struct StatsSidebar<'a> {
    tally: &'a Tally,
    mistakes: usize,
    phrases: usize,
    /// Enabled mode labels, in the order they are cycled in settings.
    modes: Vec<&'static str>,
    theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(
        tally: &'a Tally,
        mistakes: usize,
        phrases: usize,
        modes: Vec<&'static str>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            tally,
            mistakes,
            phrases,
            modes,
            theme,
        }
    }
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Min(6)])
            .split(area);

        // This session
        {
            let accuracy = self.tally.accuracy();
            let lines = vec![
                Line::from(vec![
                    Span::styled("Answered: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        self.tally.answered().to_string(),
                        Style::default().fg(colors.accent()),
                    ),
                ]),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Accuracy: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        format!("{accuracy:.1}%"),
                        Style::default().fg(if accuracy >= 90.0 {
                            colors.success()
                        } else if accuracy >= 70.0 {
                            colors.warning()
                        } else {
                            colors.error()
                        }),
                    ),
                ]),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Correct:   ", Style::default().fg(colors.fg())),
                    Span::styled(
                        self.tally.correct.to_string(),
                        Style::default().fg(colors.success()),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Near miss: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        self.tally.near_miss.to_string(),
                        Style::default().fg(colors.warning()),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Wrong:     ", Style::default().fg(colors.fg())),
                    Span::styled(
                        self.tally.incorrect.to_string(),
                        Style::default().fg(colors.error()),
                    ),
                ]),
            ];

            let block = Block::bordered()
                .title(" Session ")
                .border_style(Style::default().fg(colors.border()))
                .style(Style::default().bg(colors.bg()));
            Paragraph::new(lines).block(block).render(sections[0], buf);
        }

        // Bank
        {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("Phrases:  ", Style::default().fg(colors.fg())),
                    Span::styled(
                        self.phrases.to_string(),
                        Style::default().fg(colors.accent()),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Mistakes: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        self.mistakes.to_string(),
                        Style::default().fg(if self.mistakes == 0 {
                            colors.success()
                        } else {
                            colors.warning()
                        }),
                    ),
                ]),
                Line::from(""),
            ];
            lines.extend(self.modes.iter().map(|label| {
                Line::from(Span::styled(
                    format!("\u{2022} {label}"),
                    Style::default().fg(colors.text_pending()),
                ))
            }));

            let block = Block::bordered()
                .title(" Bank ")
                .border_style(Style::default().fg(colors.border()))
                .style(Style::default().bg(colors.bg()));
            Paragraph::new(lines).block(block).render(sections[1], buf);
        }
    }
}

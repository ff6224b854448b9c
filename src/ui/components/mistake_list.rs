use std::collections::BTreeSet;

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::bank::PhraseBank;
use crate::ui::theme::Theme;

/// Cursor and checked rows for the mistake review screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MistakeSelection {
    pub cursor: usize,
    pub checked: BTreeSet<usize>,
    pub confirm_delete: bool,
}

impl MistakeSelection {
    pub fn move_down(&mut self, len: usize) {
        if len > 0 {
            self.cursor = (self.cursor + 1).min(len - 1);
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn toggle(&mut self, len: usize) {
        if self.cursor >= len {
            return;
        }
        if !self.checked.remove(&self.cursor) {
            self.checked.insert(self.cursor);
        }
    }

    /// Check everything, or clear the selection when everything is checked.
    pub fn toggle_all(&mut self, len: usize) {
        if self.checked.len() == len {
            self.checked.clear();
        } else {
            self.checked = (0..len).collect();
        }
    }

    /// Keys to remove: the checked rows, or the row under the cursor when
    /// nothing is checked.
    pub fn chosen_keys(&self, keys: &[String]) -> Vec<String> {
        if self.checked.is_empty() {
            return keys.get(self.cursor).cloned().into_iter().collect();
        }
        self.checked
            .iter()
            .filter_map(|&i| keys.get(i).cloned())
            .collect()
    }

    /// Forget the selection after the list changed underneath it.
    pub fn reset(&mut self, len: usize) {
        self.checked.clear();
        self.confirm_delete = false;
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}

pub struct MistakeList<'a> {
    keys: &'a [String],
    bank: &'a PhraseBank,
    selection: &'a MistakeSelection,
    theme: &'a Theme,
}

impl<'a> MistakeList<'a> {
    pub fn new(
        keys: &'a [String],
        bank: &'a PhraseBank,
        selection: &'a MistakeSelection,
        theme: &'a Theme,
    ) -> Self {
        Self {
            keys,
            bank,
            selection,
            theme,
        }
    }
}

impl Widget for MistakeList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" Mistakes ({}) ", self.keys.len()))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.keys.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "No mistakes recorded. Keep drilling!",
                Style::default().fg(colors.text_pending()),
            )))
            .render(inner, buf);
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(inner);

        Paragraph::new(Line::from(Span::styled(
            format!("  {} selected", self.selection.checked.len()),
            Style::default().fg(colors.text_pending()),
        )))
        .render(layout[0], buf);

        // Keep the cursor row on screen.
        let visible = layout[1].height as usize;
        let first = if visible == 0 {
            0
        } else {
            self.selection.cursor.saturating_sub(visible - 1)
        };

        let lines: Vec<Line> = self
            .keys
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .map(|(i, key)| {
                let is_cursor = i == self.selection.cursor;
                let mark = if self.selection.checked.contains(&i) {
                    "[x]"
                } else {
                    "[ ]"
                };
                let indicator = if is_cursor { ">" } else { " " };
                let meaning = self
                    .bank
                    .find(key)
                    .map(|record| format!("  {}", record.meaning))
                    .unwrap_or_else(|| "  (not in the current bank)".to_string());
                let key_style = Style::default()
                    .fg(if is_cursor { colors.accent() } else { colors.fg() })
                    .add_modifier(if is_cursor {
                        Modifier::BOLD
                    } else {
                        Modifier::empty()
                    });
                Line::from(vec![
                    Span::styled(format!(" {indicator} {mark} "), key_style),
                    Span::styled(key.clone(), key_style),
                    Span::styled(meaning, Style::default().fg(colors.text_pending())),
                ])
            })
            .collect();
        Paragraph::new(lines).render(layout[1], buf);

        if self.selection.confirm_delete {
            let count = self.selection.chosen_keys(self.keys).len();
            let dialog_width = 40u16.min(area.width);
            let dialog_height = 5u16.min(area.height);
            let dialog_x = area.x + area.width.saturating_sub(dialog_width) / 2;
            let dialog_y = area.y + area.height.saturating_sub(dialog_height) / 2;
            let dialog_area = Rect::new(dialog_x, dialog_y, dialog_width, dialog_height);

            Clear.render(dialog_area, buf);
            Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("  Remove {count} phrase(s) from the list? (y/n)"),
                    Style::default().fg(colors.fg()),
                )),
            ])
            .style(Style::default().bg(colors.bg()))
            .block(
                Block::bordered()
                    .title(" Confirm ")
                    .border_style(Style::default().fg(colors.error()))
                    .style(Style::default().bg(colors.bg())),
            )
            .render(dialog_area, buf);
        }
    }
}

//! Multi-select list for one wizard step.
//!
//! The view keeps only the cursor. What is offered, what is picked and the
//! step's rules come from the `WizardController` on every draw.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use club_core::{step::CatalogItem, ConstraintError, InterestWithDetails, SelectionStep, StepKind};

use crate::tui::Frame;

/// What a key press on the step means for the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    Toggle(usize),
    Confirm,
    Back,
    Cancel,
    Moved,
}

/// Everything needed to draw one step.
pub struct StepFrame<'a> {
    pub step: &'a SelectionStep,
    pub offered: &'a [CatalogItem],
    pub draft: &'a [String],
    pub seed: Option<&'a InterestWithDetails>,
    pub notice: Option<&'a ConstraintError>,
    pub position: (usize, usize),
}

#[derive(Debug, Default)]
pub struct StepView {
    state: ListState,
}

impl StepView {
    pub fn new() -> Self {
        let mut view = Self::default();
        view.state.select(Some(0));
        view
    }

    pub fn reset(&mut self) {
        self.state.select(Some(0));
    }

    pub fn cursor(&self) -> usize {
        self.state.selected().unwrap_or(0)
    }

    pub fn handle_key(&mut self, key: KeyEvent, len: usize) -> Option<StepInput> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if len > 0 {
                    let next = if self.cursor() == 0 { len - 1 } else { self.cursor() - 1 };
                    self.state.select(Some(next));
                }
                Some(StepInput::Moved)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if len > 0 {
                    self.state.select(Some((self.cursor() + 1) % len));
                }
                Some(StepInput::Moved)
            }
            KeyCode::Char(' ') if len > 0 => Some(StepInput::Toggle(self.cursor().min(len - 1))),
            KeyCode::Enter => Some(StepInput::Confirm),
            KeyCode::Backspace | KeyCode::Left => Some(StepInput::Back),
            KeyCode::Esc => Some(StepInput::Cancel),
            _ => None,
        }
    }

    pub fn draw(&mut self, f: &mut Frame<'_>, area: Rect, frame: StepFrame<'_>) {
        let StepFrame {
            step,
            offered,
            draft,
            seed,
            notice,
            position,
        } = frame;

        let (marker_on, marker_off, hint) = match step.kind {
            StepKind::Interest => ("[x]", "[ ]", interest_hint(step)),
            StepKind::InterestDetail => ("[x]", "[ ]", "Pick tags that describe the club".to_string()),
            StepKind::Region => ("(o)", "( )", "Where does the club meet?".to_string()),
        };

        let [header, list_area, footer] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(2),
        ])
        .areas(area);

        let mut header_lines = vec![Line::from(vec![
            Span::styled(step.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  ({}/{})", position.0, position.1)).fg(Color::DarkGray),
        ])];
        match (step.kind, seed) {
            (StepKind::InterestDetail, Some(seed)) => {
                header_lines.push(Line::from(format!("Interest: {}", seed.name)).fg(Color::Cyan));
            }
            _ => header_lines.push(Line::from(hint).fg(Color::DarkGray)),
        }
        f.render_widget(Paragraph::new(header_lines), header);

        if offered.is_empty() {
            f.render_widget(
                Paragraph::new("Nothing to choose here, press Enter to continue")
                    .fg(Color::DarkGray)
                    .block(Block::default().borders(Borders::TOP)),
                list_area,
            );
        } else {
            let items: Vec<ListItem> = offered
                .iter()
                .map(|item| {
                    let picked = draft.contains(&item.id);
                    let marker = if picked { marker_on } else { marker_off };
                    let style = if picked {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default()
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{marker} ")),
                        Span::styled(item.title.clone(), style),
                    ]))
                })
                .collect();
            if self.cursor() >= offered.len() {
                self.state.select(Some(offered.len() - 1));
            }
            let list = List::new(items)
                .block(Block::default().borders(Borders::TOP))
                .highlight_style(Style::default().bg(Color::DarkGray).bold())
                .highlight_symbol("> ");
            f.render_stateful_widget(list, list_area, &mut self.state);
        }

        let status = match notice {
            Some(problem) => Line::from(problem.to_string()).fg(if problem.is_warning() {
                Color::Yellow
            } else {
                Color::Red
            }),
            None => Line::from(format!(
                "{}/{} selected   Space: toggle   Enter: next   Backspace: back   Esc: cancel",
                draft.len(),
                step.constraint.max()
            ))
            .fg(Color::DarkGray),
        };
        f.render_widget(Paragraph::new(status), footer);
    }
}

fn interest_hint(step: &SelectionStep) -> String {
    match step.constraint.max() {
        1 => "Pick one interest".to_string(),
        max => format!("Pick up to {max} interests"),
    }
}

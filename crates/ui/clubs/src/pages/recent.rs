use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tracing::warn;

use club_core::store::{ClubSummary, KeyValueStore, RecentClubs};

use super::{Context, Page, Route};
use crate::{action::Action, tui::Frame};

/// Clubs visited lately, newest first. Doubles as the home screen.
pub struct RecentPage {
    store: Arc<dyn KeyValueStore>,
    clubs: Vec<ClubSummary>,
    state: ListState,
}

impl RecentPage {
    pub fn new(ctx: &Context) -> Self {
        Self {
            store: ctx.store.clone(),
            clubs: Vec::new(),
            state: ListState::default(),
        }
    }

    fn reload(&mut self) {
        self.clubs = RecentClubs::new(self.store.as_ref()).load();
        let selected = match self.clubs.len() {
            0 => None,
            len => Some(self.state.selected().unwrap_or(0).min(len - 1)),
        };
        self.state.select(selected);
    }

    fn open_selected(&mut self) -> Option<Action> {
        let club = self.clubs.get(self.state.selected()?)?.clone();
        let id = club.id;
        if let Err(err) = RecentClubs::new(self.store.as_ref()).record(club) {
            warn!(%err, "could not update recent clubs");
        }
        Some(Action::Navigate(Route::Gallery(id)))
    }
}

impl Page for RecentPage {
    fn route(&self) -> Route {
        Route::Recent
    }

    fn on_enter(&mut self) -> Result<Option<Action>> {
        self.reload();
        Ok(Some(Action::Render))
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.select_next();
                Some(Action::Render)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.select_previous();
                Some(Action::Render)
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('f') => Some(Action::Navigate(Route::Favorites)),
            KeyCode::Char('n') => Some(Action::Navigate(Route::CreateClub)),
            KeyCode::Char('l') => Some(Action::Logout),
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            _ => None,
        };
        Ok(action)
    }

    fn hints(&self) -> &'static str {
        "Enter: open gallery   f: favorites   n: new club   l: log out   q: quit"
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Recently visited ");
        if self.clubs.is_empty() {
            f.render_widget(
                Paragraph::new("No clubs visited yet.")
                    .fg(Color::DarkGray)
                    .block(block),
                area,
            );
            return Ok(());
        }

        let items: Vec<ListItem> = self
            .clubs
            .iter()
            .map(|club| {
                ListItem::new(vec![
                    Line::from(vec![
                        Span::raw(club.club_title.clone()).bold(),
                        Span::raw(format!("  {} members", club.member)).fg(Color::DarkGray),
                    ]),
                    Line::from(format!("{} · {}", club.interest_title, club.region))
                        .fg(Color::DarkGray),
                ])
            })
            .collect();
        // select_next can run past the end; clamp before drawing
        if let Some(selected) = self.state.selected() {
            self.state.select(Some(selected.min(self.clubs.len() - 1)));
        }
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");
        f.render_stateful_widget(list, area, &mut self.state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use club_core::{store::MemoryStore, InterestCatalog, Session};
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use crate::config::Config;

    fn club(id: u64, title: &str) -> ClubSummary {
        ClubSummary {
            id,
            club_title: title.into(),
            club_description: String::new(),
            club_image: None,
            region: "Seoul".into(),
            member: 30,
            interest_title: "Hiking".into(),
        }
    }

    fn page_with(clubs: &[ClubSummary]) -> (RecentPage, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        RecentClubs::new(store.as_ref()).save(clubs).unwrap();
        let ctx = Context {
            config: Config::default(),
            session: Session::new(),
            store: store.clone(),
            catalog: Arc::new(InterestCatalog::embedded().unwrap()),
        };
        let mut page = RecentPage::new(&ctx);
        page.on_enter().unwrap();
        (page, store)
    }

    fn press(page: &mut RecentPage, code: KeyCode) -> Option<Action> {
        page.handle_key_events(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn opening_a_club_moves_it_to_the_front() {
        let (mut page, store) = page_with(&[club(1, "Hikers"), club(2, "Readers")]);
        press(&mut page, KeyCode::Down);
        assert_eq!(press(&mut page, KeyCode::Enter), Some(Action::Navigate(Route::Gallery(2))));
        let ids: Vec<u64> = RecentClubs::new(store.as_ref())
            .load()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn empty_list_opens_nothing() {
        let (mut page, _) = page_with(&[]);
        assert_eq!(press(&mut page, KeyCode::Enter), None);
    }

    #[test]
    fn shortcuts_navigate() {
        let (mut page, _) = page_with(&[]);
        assert_eq!(press(&mut page, KeyCode::Char('f')), Some(Action::Navigate(Route::Favorites)));
        assert_eq!(press(&mut page, KeyCode::Char('n')), Some(Action::Navigate(Route::CreateClub)));
        assert_eq!(press(&mut page, KeyCode::Char('l')), Some(Action::Logout));
    }
}

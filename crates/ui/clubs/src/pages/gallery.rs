use std::time::Instant;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::Line,
    widgets::{Block, Borders, Paragraph},
};
use tracing::warn;

use club_core::gallery::{
    AlbumId, GalleryState, GalleryView, EMPTY_GALLERY_MESSAGE, SKELETON_TILES,
};

use super::{Page, Route};
use crate::{
    action::{Action, PopupResult},
    components::popup::{centered_rect_fixed, draw_popup_frame, render_backdrop},
    tui::Frame,
};

const COLUMNS: usize = 2;
const TILE_HEIGHT: u16 = 4;

/// Photo grid of one club with a close-up view.
pub struct GalleryPage {
    club: u64,
    gallery: GalleryState,
    user_id: Option<u64>,
    cursor: usize,
    pending_delete: Option<AlbumId>,
}

impl GalleryPage {
    pub fn new(club: u64) -> Self {
        Self {
            club,
            gallery: GalleryState::new(),
            user_id: None,
            cursor: 0,
            pending_delete: None,
        }
    }

    fn reload(&mut self) -> Action {
        self.gallery.begin_loading();
        Action::LoadAlbums(self.club)
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.gallery.albums().len();
        if len == 0 {
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    /// Step to the neighbouring album while in the close-up.
    fn flip(&mut self, delta: isize) {
        self.move_cursor(delta);
        if let Some(album) = self.gallery.albums().get(self.cursor) {
            let id = album.id;
            self.gallery.dismiss();
            self.gallery.open(id);
        }
    }

    fn close_up_keys(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.gallery.toggle_nav();
                Some(Action::Render)
            }
            KeyCode::Esc => {
                self.gallery.dismiss();
                Some(Action::Render)
            }
            KeyCode::Left => {
                self.flip(-1);
                Some(Action::Render)
            }
            KeyCode::Right => {
                self.flip(1);
                Some(Action::Render)
            }
            KeyCode::Char('d') => {
                let target = self.gallery.delete_target(self.user_id)?;
                self.pending_delete = Some(target);
                Some(Action::Confirm {
                    title: "Delete photo".into(),
                    question: "Delete this photo from the club gallery?".into(),
                })
            }
            _ => None,
        }
    }

    fn draw_grid(&self, f: &mut Frame<'_>, area: Rect, skeleton: bool) {
        let rows_visible = (area.height / TILE_HEIGHT).max(1) as usize;
        let tiles = if skeleton {
            SKELETON_TILES
        } else {
            self.gallery.albums().len()
        };
        let cursor_row = self.cursor / COLUMNS;
        let first_row = cursor_row.saturating_sub(rows_visible - 1);

        let rows = Layout::vertical(vec![Constraint::Length(TILE_HEIGHT); rows_visible]).split(area);
        for (slot, row_area) in rows.iter().enumerate() {
            let row = first_row + slot;
            let cells = Layout::horizontal([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
                .split(*row_area);
            for (col, cell) in cells.iter().enumerate() {
                let index = row * COLUMNS + col;
                if index >= tiles {
                    return;
                }
                if skeleton {
                    f.render_widget(
                        Block::bordered()
                            .border_style(Style::default().fg(Color::DarkGray))
                            .style(Style::default().bg(Color::Rgb(40, 40, 40))),
                        *cell,
                    );
                    continue;
                }
                let album = &self.gallery.albums()[index];
                let selected = index == self.cursor;
                let border_style = if selected {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                f.render_widget(
                    Paragraph::new(vec![
                        Line::from(album.user_name.clone()).bold(),
                        Line::from(album.created_at.clone()).fg(Color::DarkGray),
                    ])
                    .block(
                        Block::bordered()
                            .border_set(border::ROUNDED)
                            .border_style(border_style),
                    ),
                    *cell,
                );
            }
        }
    }

    fn draw_close_up(&self, f: &mut Frame<'_>, area: Rect) {
        let Some(close_up) = self.gallery.close_up() else {
            return;
        };
        render_backdrop(f, area);
        let dialog = centered_rect_fixed(area, 70, 12);
        let inner = draw_popup_frame(f, dialog, "Photo");
        let [top, body, bottom] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let album = &close_up.album;
        f.render_widget(
            Paragraph::new(vec![
                Line::from(album.image_src()),
                Line::default(),
                Line::from(format!("by {}", album.user_name)).fg(Color::DarkGray),
            ])
            .centered(),
            body,
        );

        if close_up.show_nav {
            f.render_widget(
                Paragraph::new(Line::from(format!("{}  {}", album.user_name, album.created_at)))
                    .fg(Color::White)
                    .bg(Color::DarkGray),
                top,
            );
            let actions = if self.gallery.can_delete(self.user_id) {
                "Esc: close   ←/→: browse   d: delete"
            } else {
                "Esc: close   ←/→: browse"
            };
            f.render_widget(
                Paragraph::new(actions).fg(Color::White).bg(Color::DarkGray),
                bottom,
            );
        }
    }
}

impl Page for GalleryPage {
    fn route(&self) -> Route {
        Route::Gallery(self.club)
    }

    fn on_enter(&mut self) -> Result<Option<Action>> {
        Ok(Some(self.reload()))
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.gallery.close_up().is_some() {
            return Ok(self.close_up_keys(key));
        }
        let action = match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.move_cursor(-1);
                Some(Action::Render)
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.move_cursor(1);
                Some(Action::Render)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_cursor(-(COLUMNS as isize));
                Some(Action::Render)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_cursor(COLUMNS as isize);
                Some(Action::Render)
            }
            KeyCode::Enter => {
                let id = self.gallery.albums().get(self.cursor).map(|a| a.id);
                id.filter(|id| self.gallery.open(*id))
                    .map(|_| Action::Render)
            }
            KeyCode::Char('r') => Some(self.reload()),
            KeyCode::Esc | KeyCode::Backspace => Some(Action::Back),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let action = match action {
            Action::AlbumsLoaded(Ok(albums)) => {
                self.gallery.loaded(albums, Instant::now());
                self.move_cursor(0);
                if self.cursor >= self.gallery.albums().len() {
                    self.cursor = 0;
                }
                Some(Action::Render)
            }
            Action::AlbumsLoaded(Err(reason)) => {
                self.gallery.load_failed(Instant::now());
                Some(Action::Alert {
                    title: "Gallery".into(),
                    message: format!("Could not load photos: {reason}"),
                })
            }
            Action::CurrentUser(user_id) => {
                self.user_id = user_id;
                None
            }
            Action::PopupResult(result) => match (self.pending_delete.take(), result) {
                (Some(album), PopupResult::Confirmed) => Some(Action::DeleteAlbum(album)),
                _ => None,
            },
            Action::AlbumDeleted(Ok(album)) => {
                self.gallery.remove(album);
                Some(self.reload())
            }
            Action::AlbumDeleted(Err(reason)) => {
                warn!(%reason, "album not deleted");
                Some(Action::Alert {
                    title: "Gallery".into(),
                    message: "The photo could not be deleted.".into(),
                })
            }
            // redraw while the skeleton grace period runs out
            Action::Tick if self.gallery.view(Instant::now()) == GalleryView::Skeleton => {
                Some(Action::Render)
            }
            _ => None,
        };
        Ok(action)
    }

    fn hints(&self) -> &'static str {
        if self.gallery.close_up().is_some() {
            "Enter: show/hide bars   ←/→: browse   Esc: close"
        } else {
            "Arrows: move   Enter: open   r: refresh   Esc: back"
        }
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Gallery · club {} ", self.club));
        let inner = block.inner(area);
        f.render_widget(block, area);

        match self.gallery.view(Instant::now()) {
            GalleryView::Skeleton => self.draw_grid(f, inner, true),
            GalleryView::Empty => {
                let [middle] = Layout::vertical([Constraint::Length(1)])
                    .flex(ratatui::layout::Flex::Center)
                    .areas(inner);
                f.render_widget(
                    Paragraph::new(EMPTY_GALLERY_MESSAGE)
                        .fg(Color::DarkGray)
                        .centered(),
                    middle,
                );
            }
            GalleryView::Grid => self.draw_grid(f, inner, false),
        }
        self.draw_close_up(f, area);
        Ok(())
    }
}

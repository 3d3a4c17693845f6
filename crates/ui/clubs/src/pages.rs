use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use strum::Display;

use club_core::{store::KeyValueStore, InterestCatalog, SessionHandle};

use crate::{action::Action, config::Config, tui::Frame};

mod create_club;
mod favorites;
mod gallery;
mod login;
mod recent;
mod wizard;

pub use create_club::CreateClubPage;
pub use favorites::FavoritesPage;
pub use gallery::GalleryPage;
pub use login::LoginPage;
pub use recent::RecentPage;

/// Screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Route {
    Login,
    Favorites,
    CreateClub,
    Recent,
    Gallery(u64),
}

impl Route {
    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

/// Shared collaborators handed to every page.
#[derive(Clone)]
pub struct Context {
    pub config: Config,
    pub session: SessionHandle,
    pub store: Arc<dyn KeyValueStore>,
    pub catalog: Arc<InterestCatalog>,
}

/// A `Page` fills the whole screen below the header. Popups drawn by the
/// app sit on top and get the keys first.
pub trait Page {
    fn route(&self) -> Route;

    /// Called when the page becomes active.
    fn on_enter(&mut self) -> Result<Option<Action>> {
        Ok(None)
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let _ = key;
        Ok(None)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let _ = action;
        Ok(None)
    }

    /// One-line key help for the footer.
    fn hints(&self) -> &'static str {
        ""
    }

    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()>;
}

pub fn build(route: Route, ctx: &Context) -> Box<dyn Page> {
    match route {
        Route::Login => Box::new(LoginPage::new()),
        Route::Favorites => Box::new(FavoritesPage::new(ctx)),
        Route::CreateClub => Box::new(CreateClubPage::new(ctx)),
        Route::Recent => Box::new(RecentPage::new(ctx)),
        Route::Gallery(club) => Box::new(GalleryPage::new(club)),
    }
}

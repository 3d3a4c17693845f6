//! View state of a club's photo gallery.
//!
//! The grid shows a skeleton while albums load and for a short grace period
//! afterwards. Tapping an album opens a close-up in a `ModalStack`; tapping the
//! photo toggles its navigation bars, from which the uploader may delete it.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::modal::ModalStack;

pub const SKELETON_GRACE: Duration = Duration::from_millis(1000);
pub const SKELETON_TILES: usize = 12;
pub const EMPTY_GALLERY_MESSAGE: &str = "Be the first to upload a photo!";

pub type AlbumId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    pub image_url: String,
    pub user_id: u64,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_img: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Album {
    /// Gallery-sized variant of the image.
    pub fn image_src(&self) -> String {
        format!("{}/gallery", self.image_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseUp {
    pub album: Album,
    pub show_nav: bool,
}

/// What the gallery area should draw right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryView {
    Skeleton,
    Empty,
    Grid,
}

#[derive(Debug, Default)]
pub struct GalleryState {
    albums: Option<Vec<Album>>,
    loading: bool,
    loaded_at: Option<Instant>,
    close_up: ModalStack<CloseUp>,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
        self.loaded_at = None;
    }

    pub fn loaded(&mut self, albums: Vec<Album>, now: Instant) {
        debug!(count = albums.len(), "albums loaded");
        self.albums = Some(albums);
        self.loading = false;
        self.loaded_at = Some(now);
    }

    /// A failed fetch leaves the previous albums in place.
    pub fn load_failed(&mut self, now: Instant) {
        self.loading = false;
        self.loaded_at = Some(now);
    }

    pub fn albums(&self) -> &[Album] {
        self.albums.as_deref().unwrap_or_default()
    }

    pub fn view(&self, now: Instant) -> GalleryView {
        let in_grace = self
            .loaded_at
            .map(|at| now.saturating_duration_since(at) < SKELETON_GRACE)
            .unwrap_or(false);
        if self.loading || in_grace {
            return GalleryView::Skeleton;
        }
        match &self.albums {
            Some(albums) if albums.is_empty() => GalleryView::Empty,
            _ => GalleryView::Grid,
        }
    }

    pub fn open(&mut self, album_id: AlbumId) -> bool {
        let Some(album) = self.albums().iter().find(|a| a.id == album_id).cloned() else {
            return false;
        };
        self.close_up.show(CloseUp {
            album,
            show_nav: false,
        });
        true
    }

    pub fn toggle_nav(&mut self) {
        if let Some(close_up) = self.close_up.current_mut() {
            close_up.show_nav = !close_up.show_nav;
        }
    }

    pub fn hide_nav(&mut self) {
        if let Some(close_up) = self.close_up.current_mut() {
            close_up.show_nav = false;
        }
    }

    pub fn dismiss(&mut self) {
        self.close_up.dismiss();
    }

    pub fn close_up(&self) -> Option<&CloseUp> {
        self.close_up.current()
    }

    /// Only the uploader sees the delete control, and only with the nav bars up.
    pub fn can_delete(&self, user_id: Option<u64>) -> bool {
        match (self.close_up.current(), user_id) {
            (Some(close_up), Some(user)) => close_up.show_nav && close_up.album.user_id == user,
            _ => false,
        }
    }

    /// Album to delete once the user confirmed.
    pub fn delete_target(&self, user_id: Option<u64>) -> Option<AlbumId> {
        if self.can_delete(user_id) {
            self.close_up.current().map(|c| c.album.id)
        } else {
            None
        }
    }

    /// Drop the album locally ahead of the refetch and close the close-up.
    pub fn remove(&mut self, album_id: AlbumId) {
        if let Some(albums) = self.albums.as_mut() {
            albums.retain(|a| a.id != album_id);
        }
        self.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(id: AlbumId, user_id: u64) -> Album {
        Album {
            id,
            image_url: format!("https://img.example/{id}"),
            user_id,
            user_name: "kim".into(),
            user_img: None,
            created_at: "2024-05-01T10:00:00".into(),
        }
    }

    #[test]
    fn skeleton_lingers_after_loading() {
        let t0 = Instant::now();
        let mut gallery = GalleryState::new();
        gallery.begin_loading();
        assert_eq!(gallery.view(t0), GalleryView::Skeleton);

        gallery.loaded(vec![album(1, 9)], t0);
        assert_eq!(gallery.view(t0 + Duration::from_millis(500)), GalleryView::Skeleton);
        assert_eq!(gallery.view(t0 + SKELETON_GRACE), GalleryView::Grid);
    }

    #[test]
    fn empty_gallery_has_its_own_view() {
        let t0 = Instant::now();
        let mut gallery = GalleryState::new();
        gallery.loaded(Vec::new(), t0);
        assert_eq!(gallery.view(t0 + SKELETON_GRACE), GalleryView::Empty);
    }

    #[test]
    fn only_uploader_with_nav_can_delete() {
        let mut gallery = GalleryState::new();
        gallery.loaded(vec![album(1, 9), album(2, 3)], Instant::now());
        assert!(gallery.open(1));
        assert!(!gallery.can_delete(Some(9)));

        gallery.toggle_nav();
        assert!(gallery.can_delete(Some(9)));
        assert!(!gallery.can_delete(Some(3)));
        assert!(!gallery.can_delete(None));
        assert_eq!(gallery.delete_target(Some(9)), Some(1));
    }

    #[test]
    fn remove_is_optimistic_and_closes() {
        let mut gallery = GalleryState::new();
        gallery.loaded(vec![album(1, 9), album(2, 3)], Instant::now());
        gallery.open(1);
        gallery.remove(1);
        assert!(gallery.close_up().is_none());
        assert_eq!(gallery.albums().len(), 1);
        gallery.dismiss();
    }

    #[test]
    fn open_unknown_album_does_nothing() {
        let mut gallery = GalleryState::new();
        assert!(!gallery.open(4));
        assert_eq!(album(4, 1).image_src(), "https://img.example/4/gallery");
    }
}

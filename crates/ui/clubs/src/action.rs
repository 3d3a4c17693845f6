use strum::Display;

use club_core::{
    controller::TicketId,
    forms::Credentials,
    gallery::{Album, AlbumId},
    session::LoginData,
    Ack, SubmissionError, SubmissionPayload,
};

use crate::pages::Route;

/// Which remote form a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FormKind {
    Favorites,
    CreateClub,
}

impl FormKind {
    pub fn path(&self) -> &'static str {
        match self {
            FormKind::Favorites => "users/favorites",
            FormKind::CreateClub => "clubs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupResult {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Resume,
    Quit,
    Error(String),
    Navigate(Route),
    Back,

    // popups
    Alert { title: String, message: String },
    Confirm { title: String, question: String },
    PopupResult(PopupResult),
    ClosePopup,

    // session
    SignIn(Credentials),
    SignedIn(LoginData),
    SignInFailed(String),
    Logout,

    // wizard submissions
    Submit {
        form: FormKind,
        ticket: TicketId,
        payload: SubmissionPayload,
    },
    Submitted {
        form: FormKind,
        ticket: TicketId,
        result: Result<Ack, SubmissionError>,
    },
    /// Esc on the busy overlay: give up on the running submission.
    AbandonSubmission(FormKind),

    // gallery
    LoadAlbums(u64),
    AlbumsLoaded(Result<Vec<Album>, String>),
    DeleteAlbum(AlbumId),
    AlbumDeleted(Result<AlbumId, String>),
    CurrentUser(Option<u64>),
}

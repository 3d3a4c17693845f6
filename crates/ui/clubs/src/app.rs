use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use club_core::{
    forms::Credentials, store::save_json, ModalStack, SubmissionError, SubmissionGateway,
    SubmissionPayload,
};

use crate::{
    action::{Action, FormKind},
    api::{ApiClient, HttpGateway},
    components::{
        alert::AlertPopup, busy::BusyOverlay, confirm::ConfirmPopup, Component, Overlay,
    },
    pages::{self, Context, Page, Route},
    tui::{Event, EventResponse, Frame, Tui},
};

/// Store key of the persisted sign-in response.
pub const SESSION_KEY: &str = "session";

pub struct App {
    ctx: Context,
    api: ApiClient,
    page: Box<dyn Page>,
    history: Vec<Route>,
    overlay: ModalStack<Overlay>,
    user_id: Option<u64>,
    action_tx: UnboundedSender<Action>,
    action_rx: UnboundedReceiver<Action>,
    should_quit: bool,
    should_suspend: bool,
}

impl App {
    pub fn new(ctx: Context, start: Route) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let api = ApiClient::new(&ctx.config)?;
        let page = pages::build(Route::Login, &ctx);
        let mut app = Self {
            ctx,
            api,
            page,
            history: Vec::new(),
            overlay: ModalStack::new(),
            user_id: None,
            action_tx,
            action_rx,
            should_quit: false,
            should_suspend: false,
        };
        app.navigate(start, false)?;
        Ok(app)
    }

    pub fn route(&self) -> Route {
        self.page.route()
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?
            .tick_rate(self.ctx.config.tick_rate)
            .frame_rate(self.ctx.config.frame_rate);
        tui.enter()?;

        loop {
            if let Some(event) = tui.next().await {
                self.handle_event(event)?;
            }

            while let Ok(action) = self.action_rx.try_recv() {
                if action != Action::Tick && action != Action::Render {
                    debug!("{action:?}");
                }
                match action {
                    Action::Render => self.render(&mut tui)?,
                    Action::Resize(w, h) => {
                        tui.resize(Rect::new(0, 0, w, h))?;
                        self.render(&mut tui)?;
                    }
                    other => self.update(other)?,
                }
            }

            if self.should_suspend {
                tui.suspend()?;
                self.action_tx.send(Action::Resume)?;
                tui.resume()?;
            } else if self.should_quit {
                tui.stop()?;
                break;
            }
        }
        tui.exit()?;
        Ok(())
    }

    /// Overlays get input first and, being modal, swallow it.
    fn handle_event(&mut self, event: Event) -> Result<()> {
        let tx = self.action_tx.clone();
        match &event {
            Event::Key(key) if is_ctrl(key, 'c') => return Ok(tx.send(Action::Quit)?),
            Event::Key(key) if is_ctrl(key, 'z') => return Ok(tx.send(Action::Suspend)?),
            Event::Quit => return Ok(tx.send(Action::Quit)?),
            Event::Tick => return Ok(tx.send(Action::Tick)?),
            Event::Render => return Ok(tx.send(Action::Render)?),
            Event::Resize(w, h) => return Ok(tx.send(Action::Resize(*w, *h))?),
            _ => {}
        }

        if let Some(overlay) = self.overlay.current_mut() {
            match overlay.handle_events(event)? {
                Some(EventResponse::Continue(action)) | Some(EventResponse::Stop(action)) => {
                    tx.send(action)?
                }
                None => {}
            }
            return Ok(());
        }

        if let Event::Key(key) = event {
            if let Some(action) = self.page.handle_key_events(key)? {
                tx.send(action)?;
            }
        }
        Ok(())
    }

    /// Apply one action. Everything not consumed here is handed to the
    /// overlay and the active page.
    pub fn update(&mut self, action: Action) -> Result<()> {
        match &action {
            Action::Quit => self.should_quit = true,
            Action::Suspend => self.should_suspend = true,
            Action::Resume => self.should_suspend = false,
            Action::Navigate(route) => return self.navigate(*route, true),
            Action::Back => return self.back(),
            Action::Error(message) => {
                error!(%message, "unexpected error");
                self.show(Overlay::Alert(AlertPopup::new("Error", message.clone())));
            }
            Action::Alert { title, message } => {
                self.show(Overlay::Alert(AlertPopup::new(title.clone(), message.clone())));
            }
            Action::Confirm { title, question } => {
                self.show(Overlay::Confirm(ConfirmPopup::new(title.clone(), question.clone())));
            }
            Action::ClosePopup | Action::PopupResult(_) => {
                self.overlay.dismiss();
            }
            Action::SignIn(credentials) => self.spawn_sign_in(credentials.clone()),
            Action::SignInFailed(reason) => {
                self.show(Overlay::Alert(AlertPopup::new("Sign in", reason.clone())));
            }
            Action::SignedIn(data) => {
                self.ctx.session.login_with(data);
                if let Err(err) = save_json(self.ctx.store.as_ref(), SESSION_KEY, data) {
                    warn!(%err, "session not persisted");
                }
                self.history.clear();
                return self.navigate(Route::Recent, false);
            }
            Action::Logout => {
                self.logout();
                return self.navigate(Route::Login, false);
            }
            Action::Submit {
                form,
                ticket,
                payload,
            } => {
                self.show(Overlay::Busy(BusyOverlay::new(*form)));
                self.spawn_submit(*form, *ticket, payload.clone());
                return Ok(());
            }
            Action::Submitted { form, .. } | Action::AbandonSubmission(form) => {
                if matches!(self.overlay.current(), Some(Overlay::Busy(busy)) if busy.form() == *form)
                {
                    self.overlay.dismiss();
                }
            }
            Action::LoadAlbums(club) => self.spawn_load_albums(*club),
            Action::DeleteAlbum(album) => self.spawn_delete_album(*album),
            Action::CurrentUser(user_id) => self.user_id = *user_id,
            _ => {}
        }

        if let Some(overlay) = self.overlay.current_mut() {
            if let Some(next) = overlay.update(action.clone())? {
                self.action_tx.send(next)?;
            }
        }
        if let Some(next) = self.page.update(action)? {
            self.action_tx.send(next)?;
        }
        Ok(())
    }

    fn show(&mut self, overlay: Overlay) {
        if let Some(previous) = self.overlay.show(overlay) {
            debug!(?previous, "overlay replaced");
        }
    }

    fn guard(&self, route: Route) -> Route {
        if route.requires_session() && !self.ctx.session.is_authenticated() {
            info!(%route, "no valid session, redirecting to login");
            return Route::Login;
        }
        route
    }

    fn navigate(&mut self, route: Route, remember: bool) -> Result<()> {
        let route = self.guard(route);
        if remember && self.page.route() != route {
            self.history.push(self.page.route());
        }
        self.overlay.dismiss();
        self.page = pages::build(route, &self.ctx);
        if let Some(action) = self.page.on_enter()? {
            self.action_tx.send(action)?;
        }
        Ok(())
    }

    fn back(&mut self) -> Result<()> {
        let route = self.history.pop().unwrap_or(Route::Recent);
        self.navigate(route, false)
    }

    fn logout(&mut self) {
        self.ctx.session.logout();
        self.user_id = None;
        self.history.clear();
        if let Err(err) = self.ctx.store.remove(SESSION_KEY) {
            warn!(%err, "stored session not removed");
        }
    }

    fn spawn_sign_in(&self, credentials: Credentials) {
        let api = self.api.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let action = match api.sign_in(&credentials).await {
                Ok(data) => Action::SignedIn(data),
                Err(err) => {
                    warn!(error = %err, "sign-in failed");
                    Action::SignInFailed("Login failed.".into())
                }
            };
            let _ = tx.send(action);
        });
    }

    fn spawn_submit(&self, form: FormKind, ticket: u64, payload: SubmissionPayload) {
        let tx = self.action_tx.clone();
        let Some(token) = self.ctx.session.token() else {
            let _ = tx.send(Action::Submitted {
                form,
                ticket,
                result: Err(SubmissionError::new("not signed in")),
            });
            let _ = tx.send(Action::Logout);
            return;
        };
        let gateway = HttpGateway::new(self.api.clone(), form.path());
        tokio::spawn(async move {
            let result = gateway.submit(&payload, &token).await;
            let _ = tx.send(Action::Submitted {
                form,
                ticket,
                result,
            });
        });
    }

    fn spawn_load_albums(&self, club: u64) {
        let Some(token) = self.ctx.session.token() else {
            let _ = self.action_tx.send(Action::Logout);
            return;
        };
        let api = self.api.clone();
        let tx = self.action_tx.clone();
        let known_user = self.user_id;
        tokio::spawn(async move {
            if known_user.is_none() {
                let user = match api.current_user(&token).await {
                    Ok(user) => Some(user.id),
                    Err(err) => {
                        warn!(error = %err, "current user unknown");
                        None
                    }
                };
                let _ = tx.send(Action::CurrentUser(user));
            } else {
                let _ = tx.send(Action::CurrentUser(known_user));
            }
            let result = api
                .albums(club, &token)
                .await
                .map_err(|err| err.to_string());
            let _ = tx.send(Action::AlbumsLoaded(result));
        });
    }

    fn spawn_delete_album(&self, album: u64) {
        let Some(token) = self.ctx.session.token() else {
            let _ = self.action_tx.send(Action::Logout);
            return;
        };
        let api = self.api.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = api
                .delete_album(album, &token)
                .await
                .map(|()| album)
                .map_err(|err| err.to_string());
            let _ = tx.send(Action::AlbumDeleted(result));
        });
    }

    fn render(&mut self, tui: &mut Tui) -> Result<()> {
        let tx = self.action_tx.clone();
        tui.draw(|f| {
            if let Err(err) = self.draw(f) {
                let _ = tx.send(Action::Error(format!("Failed to draw: {err:?}")));
            }
        })?;
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame<'_>) -> Result<()> {
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(f.area());

        let who = if self.ctx.session.is_authenticated() {
            Span::raw("signed in").fg(Color::Green)
        } else {
            Span::raw("signed out").fg(Color::DarkGray)
        };
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw(" clubs ").bold(),
                Span::raw(format!("· {} ", self.page.route())).fg(Color::DarkGray),
                who,
            ])),
            header,
        );

        self.page.draw(f, body)?;
        f.render_widget(
            Paragraph::new(self.page.hints()).fg(Color::DarkGray),
            footer,
        );

        if let Some(overlay) = self.overlay.current_mut() {
            overlay.draw(f, body)?;
        }
        Ok(())
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use club_core::{
        session::LoginData,
        store::{load_json, KeyValueStore, MemoryStore},
        Ack, InterestCatalog, Session,
    };
    use pretty_assertions::assert_eq;

    use crate::config::Config;

    fn context() -> (Context, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context {
            config: Config::default(),
            session: Session::new(),
            store: store.clone(),
            catalog: Arc::new(InterestCatalog::embedded().unwrap()),
        };
        (ctx, store)
    }

    fn login_data() -> LoginData {
        LoginData {
            access_token: "token".into(),
            access_token_expiration_date_time: "2999-01-01T00:00:00".into(),
            refresh_token: None,
            refresh_token_expiration_date_time: None,
        }
    }

    fn drain(app: &mut App) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Ok(action) = app.action_rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    #[test]
    fn protected_routes_redirect_to_login() {
        let (ctx, _) = context();
        let mut app = App::new(ctx, Route::Favorites).unwrap();
        assert_eq!(app.route(), Route::Login);
        app.update(Action::Navigate(Route::Gallery(4))).unwrap();
        assert_eq!(app.route(), Route::Login);
    }

    #[test]
    fn sign_in_persists_session_and_goes_home() {
        let (ctx, store) = context();
        let mut app = App::new(ctx, Route::Login).unwrap();
        app.update(Action::SignedIn(login_data())).unwrap();
        assert_eq!(app.route(), Route::Recent);
        assert!(app.ctx.session.is_authenticated());
        let stored: Option<LoginData> = load_json(store.as_ref(), SESSION_KEY);
        assert_eq!(stored, Some(login_data()));
    }

    #[test]
    fn logout_forgets_everything() {
        let (ctx, store) = context();
        let mut app = App::new(ctx, Route::Login).unwrap();
        app.update(Action::SignedIn(login_data())).unwrap();
        app.update(Action::Navigate(Route::Favorites)).unwrap();
        app.update(Action::Logout).unwrap();
        assert_eq!(app.route(), Route::Login);
        assert!(!app.ctx.session.is_authenticated());
        assert_eq!(store.get(SESSION_KEY).unwrap(), None);
        assert!(app.history.is_empty());
    }

    #[test]
    fn back_returns_to_previous_page() {
        let (ctx, _) = context();
        ctx.session.login_with(&login_data());
        let mut app = App::new(ctx, Route::Recent).unwrap();
        app.update(Action::Navigate(Route::CreateClub)).unwrap();
        assert_eq!(app.route(), Route::CreateClub);
        app.update(Action::Back).unwrap();
        assert_eq!(app.route(), Route::Recent);
        // empty history falls back to the home screen
        app.update(Action::Back).unwrap();
        assert_eq!(app.route(), Route::Recent);
    }

    #[test]
    fn alerts_replace_each_other_and_close() {
        let (ctx, _) = context();
        let mut app = App::new(ctx, Route::Login).unwrap();
        app.update(Action::Alert {
            title: "a".into(),
            message: "first".into(),
        })
        .unwrap();
        app.update(Action::Alert {
            title: "b".into(),
            message: "second".into(),
        })
        .unwrap();
        match app.overlay.current() {
            Some(Overlay::Alert(alert)) => assert_eq!(alert.message(), "second"),
            other => panic!("expected an alert, got {other:?}"),
        }
        app.update(Action::ClosePopup).unwrap();
        assert!(!app.overlay.is_shown());
    }

    #[tokio::test]
    async fn submit_shows_busy_until_result_arrives() {
        let (ctx, _) = context();
        ctx.session.login_with(&login_data());
        let mut app = App::new(ctx, Route::Favorites).unwrap();
        drain(&mut app);

        app.update(Action::Submit {
            form: FormKind::Favorites,
            ticket: 1,
            payload: Default::default(),
        })
        .unwrap();
        assert!(matches!(app.overlay.current(), Some(Overlay::Busy(_))));

        app.update(Action::Submitted {
            form: FormKind::Favorites,
            ticket: 1,
            result: Ok(Ack::default()),
        })
        .unwrap();
        assert!(!app.overlay.is_shown());
    }

    #[test]
    fn submit_without_session_logs_out() {
        let (ctx, _) = context();
        let mut app = App::new(ctx, Route::Login).unwrap();
        app.update(Action::Submit {
            form: FormKind::CreateClub,
            ticket: 7,
            payload: Default::default(),
        })
        .unwrap();
        let actions = drain(&mut app);
        assert!(actions.contains(&Action::Logout));
        assert!(actions.iter().any(|a| matches!(
            a,
            Action::Submitted { ticket: 7, result: Err(_), .. }
        )));
    }
}

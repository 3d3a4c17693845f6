use color_eyre::Result;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Block, Borders, Clear},
};

use crate::{
    action::Action,
    components::{alert::AlertPopup, busy::BusyOverlay, confirm::ConfirmPopup, Component},
    tui::{Event, EventResponse, Frame},
};

/// Everything the app can show on top of a page. Lives in a
/// `ModalStack<Overlay>`, so at most one is visible.
#[derive(Debug)]
pub enum Overlay {
    Alert(AlertPopup),
    Confirm(ConfirmPopup),
    Busy(BusyOverlay),
}

impl Overlay {
    fn inner(&mut self) -> &mut dyn Component {
        match self {
            Overlay::Alert(p) => p,
            Overlay::Confirm(p) => p,
            Overlay::Busy(p) => p,
        }
    }
}

impl Component for Overlay {
    fn handle_events(&mut self, event: Event) -> Result<Option<EventResponse<Action>>> {
        self.inner().handle_events(event)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        self.inner().update(action)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        render_backdrop(f, area);
        self.inner().draw(f, area)
    }
}

/// Dim the page underneath. Terminals have no transparency, so this is a
/// solid dark background.
pub fn render_backdrop(frame: &mut Frame<'_>, area: Rect) {
    let backdrop = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(backdrop, area);
}

/// Rectangle of at most `width` x `height`, centered in `area`.
pub fn centered_rect_fixed(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);

    let x = area.x.saturating_add((area.width.saturating_sub(w)) / 2);
    let y = area.y.saturating_add((area.height.saturating_sub(h)) / 2);

    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

/// Clear `area` and draw a rounded, titled frame. Returns the inner area.
pub fn draw_popup_frame(frame: &mut Frame<'_>, area: Rect, title: impl Into<String>) -> Rect {
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", title.into()))
        .borders(Borders::ALL)
        .border_set(symbols::border::ROUNDED)
        .style(Style::default().fg(Color::White).bg(Color::Black));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

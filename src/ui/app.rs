use std::mem;

use anyhow::Result;
use chrono::Utc;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use tracing::debug;

use crate::db::Store;
use crate::error::{ErrorKind, StoreError};
use crate::mutation::{MutationOutcome, MutationService};
use crate::query::QueryService;

use super::forms::{ConfirmDelete, EntityForm, FormTarget};
use super::helpers::{centered_rect, plural, surface_error};
use super::screens::{format_start, DetailScreen, DirectoryScreen, Tab, Target};

/// Height reserved for the footer (status line + key hints).
const FOOTER_HEIGHT: u16 = 3;
/// Rows moved by PageUp / PageDown.
const PAGE: isize = 10;

/// Which page is on screen. The directory is always kept loaded so going back
/// from a detail page is instant.
enum Screen {
    Directory,
    Detail(DetailScreen),
}

/// Fine-grained modes layered over the current screen.
enum Mode {
    Normal,
    Searching(SearchState),
    Editing(EntityForm),
    ConfirmDelete(ConfirmDelete),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: Store,
    directory: DirectoryScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(store: Store) -> Result<Self> {
        let mut directory = DirectoryScreen::new();
        directory.reload(&store, Utc::now())?;
        Ok(Self {
            store,
            directory,
            screen: Screen::Directory,
            mode: Mode::Normal,
            status: None,
        })
    }

    /// Handle one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => match self.screen {
                Screen::Directory => self.handle_directory_key(code, &mut exit)?,
                Screen::Detail(_) => self.handle_detail_key(code, &mut exit)?,
            },
            Mode::Searching(state) => self.handle_search(code, state)?,
            Mode::Editing(form) => self.handle_form(code, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
        };

        Ok(exit)
    }

    fn handle_directory_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.directory.filter.is_some() {
                    self.directory.set_filter(None);
                    self.reload_directory(None)?;
                    self.clear_status();
                } else {
                    *exit = true;
                }
            }
            KeyCode::Tab => self.switch_tab(1)?,
            KeyCode::BackTab => self.switch_tab(-1)?,
            KeyCode::Up => self.directory.move_selection(-1),
            KeyCode::Down => self.directory.move_selection(1),
            KeyCode::PageUp => self.directory.move_selection(-PAGE),
            KeyCode::PageDown => self.directory.move_selection(PAGE),
            KeyCode::Home => self.directory.select_first(),
            KeyCode::End => self.directory.select_last(),
            KeyCode::Enter => match self.directory.current() {
                Some(target) => self.open_detail(target)?,
                None => self.set_status("Nothing selected.", StatusKind::Error),
            },
            KeyCode::Char('f') | KeyCode::Char('/') => {
                let query = self.directory.filter.clone().unwrap_or_default();
                return Ok(Mode::Searching(SearchState { query }));
            }
            KeyCode::Char('+') => {
                let form = match self.directory.tab {
                    Tab::Venues => EntityForm::new_venue(),
                    Tab::Artists => EntityForm::new_artist(),
                    Tab::Shows => EntityForm::new_show(None, None),
                };
                return Ok(Mode::Editing(form));
            }
            KeyCode::Char('e') => {
                if let Some(target) = self.directory.current() {
                    return self.edit_mode(target);
                }
                self.set_status("Nothing selected.", StatusKind::Error);
            }
            KeyCode::Char('-') => {
                let selected = self.directory.rows.get(self.directory.selected);
                if let Some((target, label)) =
                    selected.and_then(|row| row.target.map(|t| (t, row.label.clone())))
                {
                    return Ok(Mode::ConfirmDelete(ConfirmDelete { target, label }));
                }
                self.set_status("Nothing selected.", StatusKind::Error);
            }
            KeyCode::Char('o') => {
                if let Some(target) = self.directory.current() {
                    self.open_facebook_for(target)?;
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_detail_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let (target, title, link) = match &self.screen {
            Screen::Detail(detail) => (
                detail.target,
                detail.title.clone(),
                detail.facebook_link.clone(),
            ),
            Screen::Directory => return Ok(Mode::Normal),
        };

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                self.screen = Screen::Directory;
                self.reload_directory(Some(target))?;
            }
            KeyCode::Up => self.scroll_detail(-1),
            KeyCode::Down => self.scroll_detail(1),
            KeyCode::PageUp => self.scroll_detail(-(PAGE as i32)),
            KeyCode::PageDown => self.scroll_detail(PAGE as i32),
            KeyCode::Home => {
                if let Screen::Detail(detail) = &mut self.screen {
                    detail.scroll = 0;
                }
            }
            KeyCode::Char('e') => return self.edit_mode(target),
            KeyCode::Char('-') => {
                return Ok(Mode::ConfirmDelete(ConfirmDelete {
                    target,
                    label: title,
                }))
            }
            KeyCode::Char('+') => {
                let form = match target {
                    Target::Artist(id) => EntityForm::new_show(Some(id), None),
                    Target::Venue(id) | Target::Show { venue_id: id, .. } => {
                        EntityForm::new_show(None, Some(id))
                    }
                };
                return Ok(Mode::Editing(form));
            }
            KeyCode::Char('o') => self.open_facebook(&title, link.as_deref()),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.directory.set_filter(None);
                self.reload_directory(None)?;
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => return Ok(Mode::Normal),
            KeyCode::Up => {
                self.directory.move_selection(-1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Down => {
                self.directory.move_selection(1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::PageUp => {
                self.directory.move_selection(-PAGE);
                return Ok(Mode::Searching(state));
            }
            KeyCode::PageDown => {
                self.directory.move_selection(PAGE);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => return Ok(Mode::Searching(state)),
        }

        let filter = if state.query.trim().is_empty() {
            None
        } else {
            Some(state.query.clone())
        };
        self.directory.set_filter(filter);
        self.reload_directory(None)?;
        Ok(Mode::Searching(state))
    }

    fn handle_form(&mut self, code: KeyCode, mut form: EntityForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", form.target.title()), StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.submit(&form) {
                Ok(MutationOutcome::Success { id, message }) => {
                    self.set_status(message, StatusKind::Info);
                    self.refresh(Some(form.saved_target(id)))?;
                    return Ok(Mode::Normal);
                }
                Ok(MutationOutcome::Failure { message, .. }) => {
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Editing(form))
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let mutations = MutationService::new(&self.store);
                let outcome = match confirm.target {
                    Target::Venue(id) => mutations.delete_venue(id),
                    Target::Artist(id) => mutations.delete_artist(id),
                    Target::Show { id, .. } => mutations.delete_show(id),
                };
                if outcome.is_success() {
                    if let Screen::Detail(detail) = &self.screen {
                        if detail.target.same_record(confirm.target) {
                            self.screen = Screen::Directory;
                        }
                    }
                    self.set_status(outcome.message(), StatusKind::Info);
                    self.refresh(None)?;
                } else {
                    self.set_status(outcome.message(), StatusKind::Error);
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    /// Run the mutation the form describes. Only unparseable show fields
    /// come back as `Err`; store failures are part of the outcome.
    fn submit(&self, form: &EntityForm) -> Result<MutationOutcome> {
        let mutations = MutationService::new(&self.store);
        let outcome = match form.target {
            FormTarget::NewVenue => mutations.create_venue(form.to_new_venue()),
            FormTarget::EditVenue(id) => mutations.update_venue(id, form.to_venue_changes()),
            FormTarget::NewArtist => mutations.create_artist(form.to_new_artist()),
            FormTarget::EditArtist(id) => mutations.update_artist(id, form.to_artist_changes()),
            FormTarget::NewShow => mutations.create_show(form.to_new_show()?),
            FormTarget::EditShow(id) => mutations.update_show(id, form.to_show_changes()?),
        };
        Ok(outcome)
    }

    fn edit_mode(&mut self, target: Target) -> Result<Mode> {
        let queries = QueryService::new(&self.store);
        let loaded = match target {
            Target::Venue(id) => queries.get_venue(id).map(|v| EntityForm::edit_venue(&v)),
            Target::Artist(id) => queries.get_artist(id).map(|a| EntityForm::edit_artist(&a)),
            Target::Show { id, .. } => queries.get_show(id).map(|s| EntityForm::edit_show(&s)),
        };
        match loaded {
            Ok(form) => Ok(Mode::Editing(form)),
            Err(err) => {
                self.report(err)?;
                Ok(Mode::Normal)
            }
        }
    }

    fn open_detail(&mut self, target: Target) -> Result<()> {
        let now = Utc::now();
        let queries = QueryService::new(&self.store);
        let detail = match target {
            Target::Venue(id) | Target::Show { venue_id: id, .. } => {
                queries.venue_detail(id, now).map(DetailScreen::from_venue)
            }
            Target::Artist(id) => queries.artist_detail(id, now).map(DetailScreen::from_artist),
        };
        match detail {
            Ok(detail) => {
                debug!(?target, "opened detail page");
                self.screen = Screen::Detail(detail);
            }
            Err(err) => self.report(err)?,
        }
        Ok(())
    }

    fn open_facebook_for(&mut self, target: Target) -> Result<()> {
        let queries = QueryService::new(&self.store);
        let found = match target {
            Target::Venue(id) => queries.get_venue(id).map(|v| (v.name, v.facebook_link)),
            Target::Artist(id) => queries.get_artist(id).map(|a| (a.name, a.facebook_link)),
            Target::Show { .. } => {
                self.set_status("Shows do not have a Facebook page.", StatusKind::Error);
                return Ok(());
            }
        };
        match found {
            Ok((name, link)) => self.open_facebook(&name, link.as_deref()),
            Err(err) => self.report(err)?,
        }
        Ok(())
    }

    fn open_facebook(&mut self, name: &str, link: Option<&str>) {
        match link {
            None => self.set_status(
                format!("{name} does not have a Facebook link."),
                StatusKind::Error,
            ),
            Some(link) => {
                if let Err(err) = open_link(link) {
                    self.set_status(format!("Failed to open link: {err}"), StatusKind::Error);
                } else {
                    self.set_status(format!("Opened {name} on Facebook."), StatusKind::Info);
                }
            }
        }
    }

    /// Show expected store failures in the footer; anything transient is
    /// passed up and ends the session.
    fn report(&mut self, err: StoreError) -> Result<()> {
        match err.kind() {
            ErrorKind::Transient => Err(err.into()),
            ErrorKind::NotFound => {
                self.set_status(
                    format!("{err}; it may have been deleted."),
                    StatusKind::Error,
                );
                Ok(())
            }
            _ => {
                self.set_status(err.to_string(), StatusKind::Error);
                Ok(())
            }
        }
    }

    /// Reload the directory and, if a detail page is open, re-read it too.
    fn refresh(&mut self, focus: Option<Target>) -> Result<()> {
        self.reload_directory(focus)?;
        let open = match &self.screen {
            Screen::Detail(detail) => Some((detail.target, detail.scroll)),
            Screen::Directory => None,
        };
        if let Some((target, scroll)) = open {
            self.screen = Screen::Directory;
            self.open_detail(target)?;
            if let Screen::Detail(detail) = &mut self.screen {
                detail.scroll = scroll;
            }
        }
        Ok(())
    }

    fn reload_directory(&mut self, focus: Option<Target>) -> Result<()> {
        if let Err(err) = self.directory.reload(&self.store, Utc::now()) {
            self.report(err)?;
        }
        if let Some(target) = focus {
            self.directory.focus(target);
        }
        Ok(())
    }

    fn switch_tab(&mut self, delta: isize) -> Result<()> {
        self.directory.switch_tab(delta);
        self.clear_status();
        self.reload_directory(None)
    }

    fn scroll_detail(&mut self, delta: i32) {
        if let Screen::Detail(detail) = &mut self.screen {
            detail.scroll_by(delta);
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Directory => self.draw_directory(frame, content_area),
            Screen::Detail(detail) => self.draw_detail(frame, content_area, detail),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Editing(form) => self.draw_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_directory(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let selected_tab = Tab::ALL
            .iter()
            .position(|tab| *tab == self.directory.tab)
            .unwrap_or(0);
        let tabs = Tabs::new(Tab::ALL.iter().map(|tab| tab.title()))
            .select(selected_tab)
            .block(Block::default().borders(Borders::ALL).title("Showbook"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        let list_area = chunks[1];
        if list_area.height == 0 {
            return;
        }

        let title = match &self.directory.filter {
            Some(filter) => format!("{} • filter: {filter}", self.directory.tab.title()),
            None => self.directory.tab.title().to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.directory.rows.is_empty() {
            let text = match self.directory.tab {
                Tab::Venues => "No venues yet. Press '+' to list one.",
                Tab::Artists => "No artists yet. Press '+' to list one.",
                Tab::Shows if self.directory.filter.is_some() => "No shows match the filter.",
                Tab::Shows => "No shows yet. Press '+' to list one.",
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, list_area);
            return;
        }

        let items: Vec<ListItem> = self
            .directory
            .rows
            .iter()
            .map(|row| {
                if row.target.is_none() {
                    ListItem::new(Line::from(Span::styled(
                        row.label.clone(),
                        Style::default()
                            .fg(Color::Magenta)
                            .add_modifier(Modifier::BOLD),
                    )))
                } else {
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("  {}", row.label)),
                        Span::raw("  "),
                        Span::styled(row.hint.clone(), Style::default().fg(Color::DarkGray)),
                    ]))
                }
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );

        let mut list_state = ListState::default();
        if self.directory.current().is_some() {
            list_state.select(Some(self.directory.selected));
        }
        frame.render_stateful_widget(list, list_area, &mut list_state);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, detail: &DetailScreen) {
        let heading = match detail.target {
            Target::Artist(id) => format!("Artist #{id}"),
            Target::Venue(id) | Target::Show { venue_id: id, .. } => format!("Venue #{id}"),
        };
        let label_style = Style::default().fg(Color::Gray);
        let section_style = Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::from(Span::styled(
                detail.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (label, value) in &detail.facts {
            let value = if value.is_empty() { "-" } else { value.as_str() };
            lines.push(Line::from(vec![
                Span::styled(format!("{label}: "), label_style),
                Span::raw(value.to_string()),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("Facebook: ", label_style),
            Span::raw(detail.facebook_link.clone().unwrap_or_else(|| "-".to_string())),
        ]));

        let sections = [
            ("upcoming show", &detail.shows.upcoming, detail.shows.upcoming_count),
            ("past show", &detail.shows.past, detail.shows.past_count),
        ];
        for (noun, shows, count) in sections {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(plural(count, noun), section_style)));
            for show in shows {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {}  ", format_start(show.start_time)),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(detail.counterpart(show).to_string()),
                ]));
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(heading))
            .wrap(Wrap { trim: false })
            .scroll((detail.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::Editing(_)) => &[
                ("[Tab]", "Next Field"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ],
            (_, Mode::ConfirmDelete(_)) => &[("[y]", "Delete"), ("[n]", "Keep")],
            (_, Mode::Searching(_)) => &[
                ("[↑↓]", "Navigate"),
                ("[Enter]", "Keep Filter"),
                ("[Esc]", "Clear"),
            ],
            (Screen::Detail(_), Mode::Normal) => &[
                ("[↑↓]", "Scroll"),
                ("[+]", "Book Show"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[o]", "Facebook"),
                ("[Esc]", "Back"),
                ("[q]", "Quit"),
            ],
            (Screen::Directory, Mode::Normal) => &[
                ("[Tab]", "Switch"),
                ("[Enter]", "Open"),
                ("[f]", "Find"),
                ("[+]", "Add"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[o]", "Facebook"),
                ("[q]", "Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, action) in keys {
            spans.push(Span::styled(key.to_string(), key_style));
            spans.push(Span::raw(format!(" {action}   ")));
        }
        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        let cursor_y = inner.y;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &EntityForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(form.target.title())
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len())
            .map(|idx| form.build_line(idx))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            let hint = match form.target {
                FormTarget::NewShow | FormTarget::EditShow(_) => {
                    "Start time as YYYY-MM-DD HH:MM • Enter to save • Esc to cancel"
                }
                _ => "Genres are comma separated • Enter to save • Esc to cancel",
            };
            lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let (title, warning) = match confirm.target {
            Target::Venue(_) => (
                "Delete Venue",
                "A venue that still hosts shows cannot be deleted.",
            ),
            Target::Artist(_) => (
                "Delete Artist",
                "An artist with booked shows cannot be deleted.",
            ),
            Target::Show { .. } => ("Delete Show", "This cannot be undone."),
        };

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete '{}'?", confirm.label)),
            Line::from(warning),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn app_with_venue_and_artist() -> App {
        let store = test_support::store();
        store
            .write(|conn| {
                test_support::venue(conn, "The Musical Hop", "San Francisco", "CA");
                test_support::artist(conn, "Guns N Petals");
                Ok(())
            })
            .unwrap();
        App::new(store).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn status_text(app: &App) -> &str {
        app.status.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }

    #[test]
    fn enter_opens_venue_page_and_esc_returns() {
        let mut app = app_with_venue_and_artist();
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(&app.screen, Screen::Detail(d) if d.title == "The Musical Hop"));

        app.handle_key(KeyCode::Esc).unwrap();
        assert!(matches!(app.screen, Screen::Directory));
        assert_eq!(app.directory.current(), Some(Target::Venue(1)));
    }

    #[test]
    fn booking_from_venue_page_lists_the_show() {
        let mut app = app_with_venue_and_artist();
        app.handle_key(KeyCode::Enter).unwrap();
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "1");
        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "2099-06-01 20:00");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), "Show was successfully listed!");
        match &app.screen {
            Screen::Detail(detail) => assert_eq!(detail.shows.upcoming_count, 1),
            Screen::Directory => panic!("expected venue page"),
        }
    }

    #[test]
    fn invalid_form_stays_open_with_error() {
        let mut app = app_with_venue_and_artist();
        app.handle_key(KeyCode::Char('+')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        match &app.mode {
            Mode::Editing(form) => {
                assert_eq!(form.error.as_deref(), Some("Venue name is required."))
            }
            _ => panic!("form should stay open"),
        }
    }

    #[test]
    fn blocked_delete_reports_integrity_message() {
        let mut app = app_with_venue_and_artist();
        app.store
            .write(|conn| {
                let venue = crate::db::fetch_venue(conn, 1)?;
                let artist = crate::db::fetch_artist(conn, 1)?;
                test_support::show(conn, &venue, &artist, test_support::at(1, 20));
                Ok(())
            })
            .unwrap();

        app.handle_key(KeyCode::Char('-')).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));
        app.handle_key(KeyCode::Char('y')).unwrap();
        assert_eq!(
            status_text(&app),
            "Venue The Musical Hop still hosts 1 show(s); delete them first."
        );
    }

    #[test]
    fn search_filters_live_and_esc_clears() {
        let mut app = app_with_venue_and_artist();
        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Char('f')).unwrap();
        type_text(&mut app, "zzz");
        assert_eq!(app.directory.current(), None);

        app.handle_key(KeyCode::Esc).unwrap();
        assert_eq!(app.directory.filter, None);
        assert_eq!(app.directory.current(), Some(Target::Artist(1)));
    }
}

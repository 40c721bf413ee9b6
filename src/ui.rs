use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use money_tracker::aggregates::{self, ExpenseFilter, Totals};
use money_tracker::entities::routine;
use money_tracker::format::{format_currency, format_date, month_name, week_label};
use money_tracker::lock::{now_ms, IdleWatch, Interaction, LockMachine, LockOutcome, PIN_LENGTH};
use money_tracker::validation::{self, ExpenseDraft};
use money_tracker::{Action, Expense, Store};

/// How long the event loop waits for input before servicing timers
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Analytics,
    Categories,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::Analytics,
            Page::Analytics => Page::Categories,
            Page::Categories => Page::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dashboard => Page::Categories,
            Page::Analytics => Page::Dashboard,
            Page::Categories => Page::Analytics,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Home",
            Page::Analytics => "Analytics",
            Page::Categories => "Categories",
        }
    }
}

// ============================================================================
// INPUT MODES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseField {
    Description,
    Amount,
    Category,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: String,
    pub category: Option<usize>,
    pub field: Option<ExpenseField>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryForm {
    pub name: String,
    pub limit: String,
    pub on_limit: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Confirm {
    DeleteExpense { id: String, label: String },
    DeleteCategory(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    AddExpense(ExpenseForm),
    RoutinePrompt(ExpenseDraft),
    EditBalance { value: String, error: Option<String> },
    AddCategory(CategoryForm),
    EditLimit { category: String, value: String, error: Option<String> },
    Search,
    DateRange { value: String, error: Option<String> },
    Confirm(Confirm),
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    pub store: Store,
    pub lock: LockMachine,
    idle_watch: Option<IdleWatch>,
    check_interval: Duration,
    pub current_page: Page,
    pub expense_state: TableState,
    pub category_state: TableState,
    pub filter: ExpenseFilter,
    pub mode: InputMode,
    pub status: Option<String>,
}

impl App {
    pub fn new(store: Store, lock: LockMachine, check_interval: Duration, now: i64) -> Self {
        let mut app = Self {
            store,
            lock,
            idle_watch: None,
            check_interval,
            current_page: Page::Dashboard,
            expense_state: TableState::default(),
            category_state: TableState::default(),
            filter: ExpenseFilter::default(),
            mode: InputMode::Normal,
            status: None,
        };
        app.sync_idle_watch(now);
        app.reset_selection();
        app
    }

    /// The inactivity check only runs while the unlocked view is up.
    fn sync_idle_watch(&mut self, now: i64) {
        if self.lock.is_locked() {
            self.idle_watch = None;
        } else if self.idle_watch.is_none() {
            self.idle_watch = Some(IdleWatch::start(self.check_interval, now));
        }
    }

    /// Timer-driven work between input events.
    pub fn on_tick(&mut self, now: i64) {
        let due = self.idle_watch.as_mut().map_or(false, |w| w.due(now));
        if due && self.lock.check_idle(now) {
            self.mode = InputMode::Normal;
            self.sync_idle_watch(now);
        }
    }

    pub fn on_interaction(&mut self, interaction: Interaction, now: i64) {
        self.lock
            .record_activity(interaction, self.store.storage_mut(), now);
    }

    pub fn dispatch(&mut self, action: Action) {
        self.store.dispatch(action);
        self.clamp_selection();
    }

    pub fn visible_expenses(&self) -> Vec<&Expense> {
        self.filter.apply(self.store.expenses(), &Local)
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        self.expense_state
            .selected()
            .and_then(|i| self.visible_expenses().get(i).copied())
    }

    pub fn selected_category(&self) -> Option<&String> {
        self.category_state
            .selected()
            .and_then(|i| self.store.categories().get(i))
    }

    fn reset_selection(&mut self) {
        let expenses = self.visible_expenses().len();
        self.expense_state
            .select(if expenses > 0 { Some(0) } else { None });

        let categories = self.store.categories().len();
        self.category_state
            .select(if categories > 0 { Some(0) } else { None });
    }

    fn clamp_selection(&mut self) {
        let expenses = self.visible_expenses().len();
        let categories = self.store.categories().len();
        clamp(&mut self.expense_state, expenses);
        clamp(&mut self.category_state, categories);
    }

    fn move_selection(&mut self, delta: isize) {
        let (state, len) = match self.current_page {
            Page::Categories => (&mut self.category_state, self.store.categories().len()),
            _ => {
                let len = self.filter.apply(self.store.expenses(), &Local).len();
                (&mut self.expense_state, len)
            }
        };

        if len == 0 {
            state.select(None);
            return;
        }

        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len as isize) as usize;
        state.select(Some(next));
    }

    // ========================================================================
    // KEY HANDLING
    // ========================================================================

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent, now: i64) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        if self.lock.is_locked() {
            return self.handle_lock_key(key, now);
        }

        self.on_interaction(Interaction::KeyDown, now);

        let mode = std::mem::replace(&mut self.mode, InputMode::Normal);
        match mode {
            InputMode::Normal => return self.handle_normal_key(key, now),
            InputMode::AddExpense(form) => self.handle_expense_form(form, key),
            InputMode::RoutinePrompt(draft) => self.handle_routine_prompt(draft, key),
            InputMode::EditBalance { value, .. } => self.handle_balance(value, key),
            InputMode::AddCategory(form) => self.handle_category_form(form, key),
            InputMode::EditLimit { category, value, .. } => self.handle_limit(category, value, key),
            InputMode::Search => self.handle_search(key),
            InputMode::DateRange { value, .. } => self.handle_date_range(value, key),
            InputMode::Confirm(confirm) => self.handle_confirm(confirm, key),
        }

        false
    }

    fn handle_lock_key(&mut self, key: KeyEvent, now: i64) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char(c) if c.is_ascii_digit() => self.lock.press_digit(c),
            KeyCode::Backspace => self.lock.delete_digit(),
            KeyCode::Enter => {
                let outcome = self.lock.submit(self.store.storage_mut(), now);
                if outcome == LockOutcome::Unlocked {
                    self.status = None;
                    self.sync_idle_watch(now);
                }
            }
            _ => {}
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent, now: i64) -> bool {
        self.status = None;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Char('1') => self.current_page = Page::Dashboard,
            KeyCode::Char('2') => self.current_page = Page::Analytics,
            KeyCode::Char('3') => self.current_page = Page::Categories,
            KeyCode::Char('L') => {
                self.lock.lock();
                self.sync_idle_watch(now);
            }
            KeyCode::Char('t') => self.dispatch(Action::ToggleDarkMode),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            _ => match self.current_page {
                Page::Dashboard => self.handle_dashboard_key(key),
                Page::Categories => self.handle_categories_key(key),
                Page::Analytics => {}
            },
        }

        false
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('a') => {
                self.mode = InputMode::AddExpense(ExpenseForm {
                    field: Some(ExpenseField::Description),
                    ..ExpenseForm::default()
                })
            }
            KeyCode::Char('b') => {
                self.mode = InputMode::EditBalance {
                    value: self.store.bank_balance().to_string(),
                    error: None,
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(expense) = self.selected_expense() {
                    self.mode = InputMode::Confirm(Confirm::DeleteExpense {
                        id: expense.id.clone(),
                        label: format!("{} ({})", expense.description, format_currency(expense.amount)),
                    });
                }
            }
            KeyCode::Char('/') => self.mode = InputMode::Search,
            KeyCode::Char('f') => self.cycle_category_filter(),
            KeyCode::Char('r') => {
                self.mode = InputMode::DateRange {
                    value: String::new(),
                    error: None,
                }
            }
            KeyCode::Char('c') => {
                self.filter = ExpenseFilter::default();
                self.reset_selection();
            }
            _ => {}
        }
    }

    fn handle_categories_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('a') => self.mode = InputMode::AddCategory(CategoryForm::default()),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(category) = self.selected_category().cloned() {
                    let limit = self.store.limit_for(&category);
                    self.mode = InputMode::EditLimit {
                        category,
                        value: limit.to_string(),
                        error: None,
                    };
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(category) = self.selected_category().cloned() {
                    self.mode = InputMode::Confirm(Confirm::DeleteCategory(category));
                }
            }
            _ => {}
        }
    }

    fn cycle_category_filter(&mut self) {
        let categories = self.store.categories();
        self.filter.category = match &self.filter.category {
            None => categories.first().cloned(),
            Some(current) => categories
                .iter()
                .position(|c| c == current)
                .and_then(|i| categories.get(i + 1))
                .cloned(),
        };
        self.reset_selection();
    }

    fn handle_expense_form(&mut self, mut form: ExpenseForm, key: KeyEvent) {
        let field = form.field.unwrap_or(ExpenseField::Description);

        match key.code {
            KeyCode::Esc => return,
            KeyCode::Tab => {
                form.field = Some(match field {
                    ExpenseField::Description => ExpenseField::Amount,
                    ExpenseField::Amount => ExpenseField::Category,
                    ExpenseField::Category => ExpenseField::Description,
                })
            }
            KeyCode::Enter => {
                let category = form
                    .category
                    .and_then(|i| self.store.categories().get(i))
                    .cloned()
                    .unwrap_or_default();

                match ExpenseDraft::parse(&form.description, &form.amount, &category) {
                    Ok(draft) => {
                        if draft.needs_routine_prompt(self.store.routines()) {
                            self.mode = InputMode::RoutinePrompt(draft);
                        } else {
                            self.submit_draft(draft, false);
                        }
                        return;
                    }
                    Err(e) => form.error = Some(e.to_string()),
                }
            }
            code => match field {
                ExpenseField::Description => {
                    if code == KeyCode::Right {
                        let suggestion = routine::suggest(self.store.routines(), &form.description)
                            .first()
                            .map(|s| s.to_string());
                        if let Some(s) = suggestion {
                            form.description = s;
                        }
                    } else {
                        edit_text(&mut form.description, code);
                    }
                }
                ExpenseField::Amount => edit_number(&mut form.amount, code),
                ExpenseField::Category => {
                    let count = self.store.categories().len();
                    form.category = cycle_choice(form.category, count, code);
                }
            },
        }

        self.mode = InputMode::AddExpense(form);
    }

    fn handle_routine_prompt(&mut self, draft: ExpenseDraft, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.submit_draft(draft, true),
            KeyCode::Char('n') | KeyCode::Char('N') => self.submit_draft(draft, false),
            KeyCode::Esc => {}
            _ => self.mode = InputMode::RoutinePrompt(draft),
        }
    }

    fn submit_draft(&mut self, draft: ExpenseDraft, save_as_routine: bool) {
        for action in draft.into_actions(save_as_routine) {
            self.dispatch(action);
        }
        if !self.visible_expenses().is_empty() {
            self.expense_state.select(Some(0));
        }
        self.status = Some("Expense added".to_string());
    }

    fn handle_balance(&mut self, mut value: String, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => match validation::bank_balance(&value) {
                Ok(action) => self.dispatch(action),
                Err(e) => {
                    self.mode = InputMode::EditBalance {
                        value,
                        error: Some(e.to_string()),
                    }
                }
            },
            code => {
                edit_number(&mut value, code);
                self.mode = InputMode::EditBalance { value, error: None };
            }
        }
    }

    fn handle_category_form(&mut self, mut form: CategoryForm, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Tab => form.on_limit = !form.on_limit,
            KeyCode::Enter => match validation::new_category(&form.name, &form.limit) {
                Ok(actions) => {
                    for action in actions {
                        self.dispatch(action);
                    }
                    self.clamp_selection();
                    if self.category_state.selected().is_none() {
                        self.category_state.select(Some(0));
                    }
                    return;
                }
                Err(e) => form.error = Some(e.to_string()),
            },
            code if form.on_limit => edit_number(&mut form.limit, code),
            code => edit_text(&mut form.name, code),
        }

        self.mode = InputMode::AddCategory(form);
    }

    fn handle_limit(&mut self, category: String, mut value: String, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => match validation::edit_limit(&category, &value) {
                Ok(action) => self.dispatch(action),
                Err(e) => {
                    self.mode = InputMode::EditLimit {
                        category,
                        value,
                        error: Some(e.to_string()),
                    }
                }
            },
            code => {
                edit_number(&mut value, code);
                self.mode = InputMode::EditLimit {
                    category,
                    value,
                    error: None,
                };
            }
        }
    }

    fn handle_search(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {}
            code => {
                edit_text(&mut self.filter.search, code);
                self.mode = InputMode::Search;
            }
        }
        self.reset_selection();
    }

    fn handle_date_range(&mut self, mut value: String, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => match parse_date_range(&value) {
                Ok((from, to)) => {
                    self.filter.date_from = from;
                    self.filter.date_to = to;
                    self.reset_selection();
                }
                Err(e) => {
                    self.mode = InputMode::DateRange {
                        value,
                        error: Some(e),
                    }
                }
            },
            code => {
                edit_text(&mut value, code);
                self.mode = InputMode::DateRange { value, error: None };
            }
        }
    }

    fn handle_confirm(&mut self, confirm: Confirm, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => match confirm {
                Confirm::DeleteExpense { id, .. } => self.dispatch(Action::DeleteExpense(id)),
                Confirm::DeleteCategory(name) => {
                    if self.filter.category.as_deref() == Some(name.as_str()) {
                        self.filter.category = None;
                    }
                    self.dispatch(Action::DeleteCategory(name));
                }
            },
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {}
            _ => self.mode = InputMode::Confirm(confirm),
        }
    }
}

fn clamp(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

fn edit_text(buf: &mut String, code: KeyCode) {
    match code {
        KeyCode::Char(c) => buf.push(c),
        KeyCode::Backspace => {
            buf.pop();
        }
        _ => {}
    }
}

fn edit_number(buf: &mut String, code: KeyCode) {
    match code {
        KeyCode::Char(c) if c.is_ascii_digit() || (c == '.' && !buf.contains('.')) => buf.push(c),
        KeyCode::Backspace => {
            buf.pop();
        }
        _ => {}
    }
}

/// Left/Right walks the choices; Space clears the selection.
fn cycle_choice(current: Option<usize>, count: usize, code: KeyCode) -> Option<usize> {
    if count == 0 {
        return None;
    }
    match code {
        KeyCode::Right => Some(current.map_or(0, |i| (i + 1) % count)),
        KeyCode::Left => Some(current.map_or(count - 1, |i| (i + count - 1) % count)),
        KeyCode::Char(' ') => None,
        _ => current,
    }
}

/// `YYYY-MM-DD..YYYY-MM-DD`; either side may be empty.
fn parse_date_range(raw: &str) -> Result<(Option<NaiveDate>, Option<NaiveDate>), String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok((None, None));
    }

    let (from, to) = raw.split_once("..").unwrap_or((raw, raw));
    let parse = |s: &str| -> Result<Option<NaiveDate>, String> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("Invalid date: {}", s))
    };

    Ok((parse(from)?, parse(to)?))
}

// ============================================================================
// EVENT LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Restore the terminal before a panic message is printed
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        default_hook(info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal UI failed");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key, now_ms()) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) if !app.lock.is_locked() => match mouse.kind {
                    MouseEventKind::Down(_) => app.on_interaction(Interaction::PointerDown, now_ms()),
                    MouseEventKind::ScrollUp => {
                        app.on_interaction(Interaction::Scroll, now_ms());
                        app.move_selection(-1);
                    }
                    MouseEventKind::ScrollDown => {
                        app.on_interaction(Interaction::Scroll, now_ms());
                        app.move_selection(1);
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        app.on_tick(now_ms());
    }
}

// ============================================================================
// RENDERING
// ============================================================================

struct Palette {
    bg: Color,
    fg: Color,
    muted: Color,
    accent: Color,
    danger: Color,
    warning: Color,
    ok: Color,
}

impl Palette {
    fn for_app(app: &App) -> Self {
        if app.store.dark_mode() {
            Palette {
                bg: Color::Black,
                fg: Color::White,
                muted: Color::DarkGray,
                accent: Color::Magenta,
                danger: Color::LightRed,
                warning: Color::Yellow,
                ok: Color::LightGreen,
            }
        } else {
            Palette {
                bg: Color::Reset,
                fg: Color::Reset,
                muted: Color::Gray,
                accent: Color::Blue,
                danger: Color::Red,
                warning: Color::Yellow,
                ok: Color::Green,
            }
        }
    }

    fn block(&self, title: &str) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.muted))
            .style(Style::default().bg(self.bg).fg(self.fg))
            .title(format!(" {} ", title))
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let palette = Palette::for_app(app);

    if app.lock.is_locked() {
        let area = f.size();
        render_lock_screen(f, area, app, &palette);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app, &palette);

    match app.current_page {
        Page::Dashboard => render_dashboard(f, chunks[1], app, &palette),
        Page::Analytics => render_analytics(f, chunks[1], app, &palette),
        Page::Categories => render_categories(f, chunks[1], app, &palette),
    }

    render_status_bar(f, chunks[2], app, &palette);
    render_modal(f, app, &palette);
}

fn render_lock_screen(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let now = now_ms();
    let shaking = app.lock.is_shaking(now);

    let dots: String = (0..PIN_LENGTH)
        .map(|i| if i < app.lock.entered_len() { "● " } else { "○ " })
        .collect();
    // Shake: nudge the dots sideways while the signal is active
    let dots = if shaking {
        format!("  {}", dots.trim_end())
    } else {
        dots.trim_end().to_string()
    };

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled("🔐", Style::default())),
        Line::from(""),
        Line::from(Span::styled(
            "Enter Your PIN",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Welcome back! Enter your PIN to continue",
            Style::default().fg(palette.muted),
        )),
        Line::from(""),
        Line::from(Span::styled(
            dots,
            Style::default().fg(if shaking { palette.danger } else { palette.fg }),
        )),
        Line::from(""),
    ];

    if let Some(error) = app.lock.error() {
        content.push(Line::from(Span::styled(
            error,
            Style::default().fg(palette.danger).add_modifier(Modifier::BOLD),
        )));
    } else {
        content.push(Line::from(""));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "0-9 digits · Backspace delete · Enter unlock · q quit",
        Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
    )));

    let panel = centered_rect(50, 16, area);
    let paragraph = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(palette.block("Money Tracker"));

    f.render_widget(Clear, panel);
    f.render_widget(paragraph, panel);
}

fn render_header(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let totals = app.store.totals();

    let pages = [Page::Dashboard, Page::Analytics, Page::Categories];
    let mut tab_spans = vec![Span::styled(
        "💰 Money Tracker  ",
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
    )];

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(palette.warning)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(palette.muted)
        };

        tab_spans.push(Span::styled(format!("{} {}", i + 1, page.title()), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Balance: {}", format_currency(totals.current_balance)),
        Style::default().fg(if totals.is_overdrawn() { palette.danger } else { palette.ok }),
    ));

    let header = Paragraph::new(Line::from(tab_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent))
            .style(Style::default().bg(palette.bg).fg(palette.fg)),
    );

    f.render_widget(header, area);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &mut App, palette: &Palette) {
    let totals = app.store.totals();
    let has_budget = totals.total_monthly_budget > 0.0;
    let has_categories = !app.store.categories().is_empty();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),                                  // Cards
            Constraint::Length(if has_budget { 3 } else { 0 }),     // Budget bar
            Constraint::Length(if has_categories { 3 } else { 0 }), // Snapshot
            Constraint::Min(0),                                     // Expense list
        ])
        .split(area);

    render_cards(f, chunks[0], &totals, palette);
    if has_budget {
        render_budget_bar(f, chunks[1], &totals, palette);
    }
    if has_categories {
        render_snapshot(f, chunks[2], app, palette);
    }
    render_expense_table(f, chunks[3], app, palette);
}

fn render_cards(f: &mut Frame, area: Rect, totals: &Totals, palette: &Palette) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let figures = [
        (
            "Current Balance",
            totals.current_balance,
            if totals.is_overdrawn() { palette.danger } else { palette.ok },
        ),
        ("Total Spent", totals.total_spent, palette.fg),
        ("This Month", totals.monthly_spent, palette.accent),
    ];

    for (i, (title, value, color)) in figures.iter().enumerate() {
        let card = Paragraph::new(Line::from(Span::styled(
            format_currency(*value),
            Style::default().fg(*color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(palette.block(title));

        f.render_widget(card, cards[i]);
    }
}

fn render_budget_bar(f: &mut Frame, area: Rect, totals: &Totals, palette: &Palette) {
    let pct = totals.budget_used_percent();
    let color = if pct > 90.0 {
        palette.danger
    } else if pct > 70.0 {
        palette.warning
    } else {
        palette.accent
    };

    let label = if totals.monthly_remaining < 0.0 {
        format!(
            "{} of {} · Over by {}",
            format_currency(totals.monthly_spent),
            format_currency(totals.total_monthly_budget),
            format_currency(totals.monthly_remaining.abs())
        )
    } else {
        format!(
            "{} of {} · Remaining: {}",
            format_currency(totals.monthly_spent),
            format_currency(totals.total_monthly_budget),
            format_currency(totals.monthly_remaining)
        )
    };

    let gauge = Gauge::default()
        .block(palette.block("Monthly Budget"))
        .gauge_style(Style::default().fg(color))
        .ratio((pct / 100.0).clamp(0.0, 1.0))
        .label(label);

    f.render_widget(gauge, area);
}

fn render_snapshot(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let mut spans = Vec::new();

    for status in app.store.budget_overview() {
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        let balance = status.balance();
        spans.push(Span::styled(
            format!("{}: {}", status.name, format_currency(balance)),
            Style::default().fg(if balance < 0.0 { palette.danger } else { palette.ok }),
        ));
    }

    let snapshot = Paragraph::new(Line::from(spans)).block(palette.block("Categories Left"));
    f.render_widget(snapshot, area);
}

fn render_expense_table(f: &mut Frame, area: Rect, app: &mut App, palette: &Palette) {
    let header_cells = ["Date", "Description", "Category", "Amount"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(palette.warning)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(palette.muted))
        .height(1);

    let known: Vec<String> = app.store.categories().to_vec();
    let rows: Vec<Row> = app
        .visible_expenses()
        .into_iter()
        .map(|expense| {
            let date: DateTime<Local> = expense.date.with_timezone(&Local);
            let category_style = match label_kind(expense, &known) {
                LabelKind::Known => Style::default().fg(palette.fg),
                LabelKind::Uncategorized => Style::default().fg(palette.muted),
                LabelKind::Orphaned => Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
            };

            Row::new(vec![
                Cell::from(format_date(&date)),
                Cell::from(truncate(&expense.description, 30)),
                Cell::from(truncate(&expense.category, 18)).style(category_style),
                Cell::from(format_currency(expense.amount)).style(Style::default().fg(palette.danger)),
            ])
            .height(1)
        })
        .collect();

    let empty = rows.is_empty();
    let title = if app.filter.is_active() {
        format!("Expenses (filtered: {})", describe_filter(&app.filter))
    } else {
        "Expenses".to_string()
    };

    if empty {
        let message = if app.filter.is_active() {
            "No expenses match the current filter"
        } else {
            "No expenses yet. Press 'a' to add one! 🎉"
        };
        let paragraph = Paragraph::new(message)
            .alignment(Alignment::Center)
            .block(palette.block(&title));
        f.render_widget(paragraph, area);
        return;
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(13),
            Constraint::Min(20),
            Constraint::Length(20),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(palette.block(&title))
    .highlight_style(Style::default().bg(palette.muted).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.expense_state);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelKind {
    Known,
    Uncategorized,
    /// Label of a category that has since been deleted
    Orphaned,
}

fn label_kind(expense: &Expense, categories: &[String]) -> LabelKind {
    if categories.contains(&expense.category) {
        LabelKind::Known
    } else if expense.is_uncategorized() {
        LabelKind::Uncategorized
    } else {
        LabelKind::Orphaned
    }
}

fn describe_filter(filter: &ExpenseFilter) -> String {
    let mut parts = Vec::new();
    if let Some(category) = &filter.category {
        parts.push(category.clone());
    }
    if !filter.search.is_empty() {
        parts.push(format!("\"{}\"", filter.search));
    }
    match (filter.date_from, filter.date_to) {
        (None, None) => {}
        (from, to) => parts.push(format!(
            "{}..{}",
            from.map(|d| d.to_string()).unwrap_or_default(),
            to.map(|d| d.to_string()).unwrap_or_default()
        )),
    }
    parts.join(", ")
}

fn render_analytics(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let overview = app.store.budget_overview();

    if overview.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from("No categories yet."),
            Line::from("Create categories to see your budget overview here! 📊"),
        ])
        .alignment(Alignment::Center)
        .block(palette.block("Budget Overview"));
        f.render_widget(paragraph, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(area);

    let header = Row::new(["Category", "Limit", "Spent", "Left", "Status", "Usage"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(palette.warning).add_modifier(Modifier::BOLD))
    }));

    let rows = overview.iter().map(|status| {
        let pct = status.used_percent();
        let color = if status.over_budget {
            palette.danger
        } else if pct > 80.0 {
            palette.warning
        } else {
            palette.ok
        };

        let left = if status.over_budget {
            format!("-{}", format_currency(status.over_amount))
        } else {
            format!("{} left", format_currency(status.remaining))
        };

        Row::new(vec![
            Cell::from(status.name.clone()),
            Cell::from(format_currency(status.limit)),
            Cell::from(format_currency(status.spent)),
            Cell::from(left).style(Style::default().fg(color)),
            Cell::from(if status.over_budget { "⚠ Over" } else { "✓ OK" })
                .style(Style::default().fg(color)),
            Cell::from(usage_bar(pct, status.over_percent(), 20)).style(Style::default().fg(color)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Min(22),
        ],
    )
    .header(header)
    .block(palette.block(&format!("Budget Overview ({})", month_name(&Local::now()))));

    f.render_widget(table, chunks[0]);
    render_weekly(f, chunks[1], app, palette);
}

/// `█` for the used share, `!` for spend past the limit
fn usage_bar(used_percent: f64, over_percent: f64, width: usize) -> String {
    let filled = ((used_percent / 100.0) * width as f64).round() as usize;
    let over = ((over_percent / 100.0) * width as f64).round() as usize;
    format!(
        "{}{}{}",
        "█".repeat(filled.min(width)),
        "░".repeat(width.saturating_sub(filled)),
        "!".repeat(over)
    )
}

fn render_weekly(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let now = Local::now();
    let mut weeks: BTreeMap<&'static str, f64> = BTreeMap::new();
    for label in ["Week 1", "Week 2", "Week 3", "Week 4"] {
        weeks.insert(label, 0.0);
    }

    for expense in app.store.expenses().iter().filter(|e| e.is_in_month_of(&now)) {
        let date = expense.date.with_timezone(&Local);
        *weeks.entry(week_label(&date)).or_insert(0.0) += expense.amount;
    }

    let max = weeks.values().cloned().fold(0.0_f64, f64::max);
    let lines: Vec<Line> = weeks
        .iter()
        .map(|(label, amount)| {
            let width = if max > 0.0 { (amount / max * 30.0).round() as usize } else { 0 };
            Line::from(vec![
                Span::raw(format!("  {:<7} ", label)),
                Span::styled("▇".repeat(width), Style::default().fg(palette.accent)),
                Span::raw(format!(" {}", format_currency(*amount))),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(palette.block("This Month by Week"));
    f.render_widget(paragraph, area);
}

fn render_categories(f: &mut Frame, area: Rect, app: &mut App, palette: &Palette) {
    if app.store.categories().is_empty() {
        let paragraph = Paragraph::new("No categories yet. Press 'a' to create one.")
            .alignment(Alignment::Center)
            .block(palette.block("Categories"));
        f.render_widget(paragraph, area);
        return;
    }

    let totals = aggregates::spent_this_month(app.store.expenses(), &Local::now());
    let rows: Vec<Row> = app
        .store
        .categories()
        .iter()
        .map(|name| {
            Row::new(vec![
                Cell::from(name.clone()),
                Cell::from(format_currency(app.store.limit_for(name))),
                Cell::from(format_currency(totals.get(name).copied().unwrap_or(0.0))),
            ])
        })
        .collect();

    let header = Row::new(["Category", "Monthly Limit", "Spent This Month"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(palette.warning).add_modifier(Modifier::BOLD))
    }));

    let table = Table::new(
        rows,
        [Constraint::Min(20), Constraint::Length(16), Constraint::Length(18)],
    )
    .header(header)
    .block(palette.block("Categories"))
    .highlight_style(Style::default().bg(palette.muted).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.category_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(palette.warning));

    let mut spans = Vec::new();
    if let Some(status) = &app.status {
        spans.push(Span::styled(format!(" {} ", status), Style::default().fg(palette.ok)));
        spans.push(Span::raw("| "));
    }

    match app.current_page {
        Page::Dashboard => {
            spans.extend([
                key("a"), Span::raw(" Add | "),
                key("x"), Span::raw(" Delete | "),
                key("b"), Span::raw(" Balance | "),
                key("/"), Span::raw(" Search | "),
                key("f"), Span::raw(" Category | "),
                key("r"), Span::raw(" Dates | "),
                key("c"), Span::raw(" Clear | "),
            ]);
        }
        Page::Categories => {
            spans.extend([
                key("a"), Span::raw(" New | "),
                key("e"), Span::raw(" Edit limit | "),
                key("x"), Span::raw(" Delete | "),
            ]);
        }
        Page::Analytics => {}
    }

    spans.extend([
        key("Tab"), Span::raw(" Page | "),
        key("t"), Span::raw(" Theme | "),
        key("L"), Span::raw(" Lock | "),
        Span::styled("q", Style::default().fg(palette.danger)), Span::raw(" Quit"),
    ]);

    let status_bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.muted))
            .style(Style::default().bg(palette.bg).fg(palette.fg)),
    );

    f.render_widget(status_bar, area);
}

fn render_modal(f: &mut Frame, app: &App, palette: &Palette) {
    let field_line = |label: &str, value: &str, active: bool| {
        let style = if active {
            Style::default().fg(palette.warning).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.fg)
        };
        Line::from(vec![
            Span::styled(format!("  {:<12}", label), Style::default().fg(palette.muted)),
            Span::styled(format!("{}{}", value, if active { "▏" } else { "" }), style),
        ])
    };
    let error_line = |error: &Option<String>| match error {
        Some(e) => Line::from(Span::styled(format!("  {}", e), Style::default().fg(palette.danger))),
        None => Line::from(""),
    };
    let hint = |text: &'static str| {
        Line::from(Span::styled(
            format!("  {}", text),
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        ))
    };

    let (title, lines): (&str, Vec<Line>) = match &app.mode {
        InputMode::Normal => return,
        InputMode::Search => {
            let area = f.size();
            let bar = Rect::new(area.x, area.height.saturating_sub(3), area.width, 3);
            let search = Paragraph::new(format!("/{}▏", app.filter.search))
                .block(palette.block("Search expenses"));
            f.render_widget(Clear, bar);
            f.render_widget(search, bar);
            return;
        }
        InputMode::AddExpense(form) => {
            let field = form.field.unwrap_or(ExpenseField::Description);
            let category = form
                .category
                .and_then(|i| app.store.categories().get(i))
                .cloned()
                .unwrap_or_else(|| "(none)".to_string());
            let suggestions = routine::suggest(app.store.routines(), &form.description).join(", ");

            let mut lines = vec![
                Line::from(""),
                field_line("Description", &form.description, field == ExpenseField::Description),
            ];
            if !suggestions.is_empty() && field == ExpenseField::Description {
                lines.push(hint("→ to use:"));
                lines.push(Line::from(Span::styled(
                    format!("  {}", suggestions),
                    Style::default().fg(palette.accent),
                )));
            }
            lines.push(field_line("Amount ₹", &form.amount, field == ExpenseField::Amount));
            lines.push(field_line("Category", &category, field == ExpenseField::Category));
            if app.store.categories().is_empty() {
                lines.push(hint("Create categories first on the Categories page"));
            }
            lines.push(error_line(&form.error));
            lines.push(hint("Tab next field · ←/→ pick category · Enter add · Esc cancel"));
            ("Add Expense", lines)
        }
        InputMode::RoutinePrompt(draft) => (
            "Save as Routine?",
            vec![
                Line::from(""),
                Line::from(format!("  Remember \"{}\" as a routine?", draft.description)),
                Line::from(""),
                hint("y save & add · n just add · Esc cancel"),
            ],
        ),
        InputMode::EditBalance { value, error } => (
            "Set Bank Balance",
            vec![
                Line::from(""),
                field_line("Balance ₹", value, true),
                error_line(error),
                hint("Enter save · Esc cancel"),
            ],
        ),
        InputMode::AddCategory(form) => (
            "New Category",
            vec![
                Line::from(""),
                field_line("Name", &form.name, !form.on_limit),
                field_line("Limit ₹", &form.limit, form.on_limit),
                error_line(&form.error),
                hint("Tab switch field · Enter create · Esc cancel"),
            ],
        ),
        InputMode::EditLimit { category, value, error } => (
            "Edit Monthly Limit",
            vec![
                Line::from(""),
                Line::from(format!("  {}", category)),
                field_line("Limit ₹", value, true),
                error_line(error),
                hint("Enter save · Esc cancel"),
            ],
        ),
        InputMode::DateRange { value, error } => (
            "Filter by Date",
            vec![
                Line::from(""),
                field_line("Range", value, true),
                error_line(error),
                hint("YYYY-MM-DD..YYYY-MM-DD (either side optional) · Enter apply"),
            ],
        ),
        InputMode::Confirm(confirm) => {
            let question = match confirm {
                Confirm::DeleteExpense { label, .. } => format!("  Delete expense {}?", label),
                Confirm::DeleteCategory(name) => format!(
                    "  Delete category \"{}\"? Existing expenses keep the label.",
                    name
                ),
            };
            (
                "Confirm",
                vec![Line::from(""), Line::from(question), Line::from(""), hint("y yes · n no")],
            )
        }
    };

    let area = centered_rect(60, lines.len() as u16 + 2, f.size());
    let modal = Paragraph::new(lines).block(
        palette
            .block(title)
            .border_style(Style::default().fg(palette.accent)),
    );

    f.render_widget(Clear, area);
    f.render_widget(modal, area);
}

/// Rectangle of `percent_x` width and `height` rows centered in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

// ============================================================================
// TESTS
// ============================================================================

use crate::domain::{DatasetRecord, filter_dataset_indices};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifecycle of the login+fetch sequence. `Authenticating` and `Fetching` are
/// explicit so a refresh cannot be re-triggered while one is underway, and so
/// the status line can show the stage in progress.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionPhase {
    Unauthenticated,
    Authenticating,
    AuthenticationFailed,
    Authenticated,
    Fetching,
    FetchFailed,
    Loaded,
}

impl SessionPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Authenticating | Self::Fetching)
    }
}

/// Session-scoped credential state: created at successful login, replaced by
/// the next login, discarded at process exit. Never persisted.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub token: Option<String>,
}

/// The filtered view over the catalog plus the user's selection within it.
///
/// `filtered_indices` is index-aligned with the rendered list; `checked` holds
/// positions in that list, not catalog indices. Every rebuild bumps
/// `generation` and clears `checked`, so a selection can never be resolved
/// against a view other than the one it was made in.
#[derive(Clone, Debug)]
pub struct CatalogView {
    pub query: String,
    pub filtered_indices: Vec<usize>,
    pub cursor: usize,
    pub checked: BTreeSet<usize>,
    pub generation: u64,
}

impl CatalogView {
    pub fn new(record_count: usize) -> Self {
        Self {
            query: String::new(),
            filtered_indices: (0..record_count).collect(),
            cursor: 0,
            checked: BTreeSet::new(),
            generation: 0,
        }
    }

    fn rebuild(&mut self, records: &[DatasetRecord]) {
        self.filtered_indices = filter_dataset_indices(records, &self.query);
        self.checked.clear();
        self.generation = self.generation.wrapping_add(1);
        if self.filtered_indices.is_empty() {
            self.cursor = 0;
        } else {
            self.cursor = self
                .cursor
                .min(self.filtered_indices.len().saturating_sub(1));
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub session: SessionState,
    pub catalog: Vec<DatasetRecord>,
    pub view: CatalogView,
    pub phase: SessionPhase,
    pub status: String,
    pub notice: Option<String>,
}

impl AppModel {
    pub fn new() -> Self {
        Self {
            session: SessionState::default(),
            catalog: Vec::new(),
            view: CatalogView::new(0),
            phase: SessionPhase::Unauthenticated,
            status: "Ready".to_string(),
            notice: None,
        }
    }

    /// Replace the catalog wholesale and recompute the view with the active
    /// query. Old records are never merged with new ones.
    pub fn replace_catalog(&mut self, records: Vec<DatasetRecord>) {
        self.catalog = records;
        self.view.rebuild(&self.catalog);
    }

    pub fn set_query(&mut self, query: String) {
        self.view.query = query;
        self.view.rebuild(&self.catalog);
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Paste(String),
}

#[derive(Clone, Debug)]
pub enum AppCommand {
    None,
    Quit,
    Refresh,
    OpenSelection { records: Vec<DatasetRecord> },
}

/// Map each checked position to the record behind it in the current view.
/// Positions outside the view (a stale selection against a view that shrank)
/// are skipped rather than erroring. `BTreeSet` iteration keeps the result in
/// view order, which is catalog order, regardless of toggle order.
pub fn resolve_selection(
    records: &[DatasetRecord],
    filtered_indices: &[usize],
    checked: &BTreeSet<usize>,
) -> Vec<DatasetRecord> {
    checked
        .iter()
        .filter_map(|position| filtered_indices.get(*position))
        .filter_map(|index| records.get(*index))
        .cloned()
        .collect()
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Paste(text) => update_on_paste(model, text),
    }
}

fn update_on_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => return (model, AppCommand::Quit),
            KeyCode::Char('r') => {
                model.notice = None;
                if model.phase.is_busy() {
                    model.notice = Some("Refresh already in progress.".to_string());
                    return (model, AppCommand::None);
                }
                return (model, AppCommand::Refresh);
            }
            _ => return (model, AppCommand::None),
        }
    }

    // Only keys that act clear the notice; cursor movement keeps the last
    // message readable.
    match key.code {
        KeyCode::Up => {
            model.view.cursor = model.view.cursor.saturating_sub(1);
        }
        KeyCode::Down => {
            if !model.view.filtered_indices.is_empty() {
                model.view.cursor = (model.view.cursor + 1)
                    .min(model.view.filtered_indices.len().saturating_sub(1));
            }
        }
        KeyCode::Char(' ') => {
            model.notice = None;
            if model.view.filtered_indices.get(model.view.cursor).is_some() {
                let position = model.view.cursor;
                if !model.view.checked.remove(&position) {
                    model.view.checked.insert(position);
                }
            }
        }
        KeyCode::Enter => {
            model.notice = None;
            let records = resolve_selection(
                &model.catalog,
                &model.view.filtered_indices,
                &model.view.checked,
            );
            return (model, AppCommand::OpenSelection { records });
        }
        KeyCode::Esc => {
            if !model.view.query.is_empty() {
                model.notice = None;
                model.set_query(String::new());
            }
        }
        KeyCode::Backspace => {
            if !model.view.query.is_empty() {
                model.notice = None;
                let mut query = model.view.query.clone();
                query.pop();
                model.set_query(query);
            }
        }
        KeyCode::Char(ch) => {
            model.notice = None;
            let mut query = model.view.query.clone();
            query.push(ch);
            model.set_query(query);
        }
        _ => {}
    }

    (model, AppCommand::None)
}

fn update_on_paste(mut model: AppModel, text: String) -> (AppModel, AppCommand) {
    let pasted: String = text.chars().filter(|ch| !ch.is_control()).collect();
    if !pasted.is_empty() {
        model.notice = None;
        let mut query = model.view.query.clone();
        query.push_str(&pasted);
        model.set_query(query);
    }
    (model, AppCommand::None)
}

/// One refresh attempt: login, then the authenticated page fetch, strictly
/// sequential. A login failure ends the attempt before the fetch stage is
/// reached. `draw` runs before each blocking stage so the caller can repaint
/// the status line; failures leave the model in a recoverable state with the
/// service message in the notice.
pub fn perform_refresh<E: std::fmt::Display>(
    model: &mut AppModel,
    mut draw: impl FnMut(&AppModel) -> Result<(), AppError>,
    login: impl FnOnce() -> Result<String, E>,
    fetch: impl FnOnce(&str) -> Result<Vec<DatasetRecord>, E>,
) -> Result<(), AppError> {
    if model.phase.is_busy() {
        return Ok(());
    }

    model.phase = SessionPhase::Authenticating;
    model.status = "Logging in...".to_string();
    model.notice = None;
    draw(model)?;

    let token = match login() {
        Ok(token) => token,
        Err(error) => {
            model.phase = SessionPhase::AuthenticationFailed;
            model.status = "Error occurred".to_string();
            model.notice = Some(error.to_string());
            return Ok(());
        }
    };
    model.phase = SessionPhase::Authenticated;
    model.session.token = Some(token.clone());

    model.phase = SessionPhase::Fetching;
    model.status = "Fetching datasets...".to_string();
    draw(model)?;

    match fetch(&token) {
        Ok(records) => {
            let count = records.len();
            model.replace_catalog(records);
            model.phase = SessionPhase::Loaded;
            model.status = format!("Ready - {count} datasets loaded");
        }
        Err(error) => {
            model.phase = SessionPhase::FetchFailed;
            model.status = "Error occurred".to_string();
            model.notice = Some(error.to_string());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(ch: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
    }

    fn loaded_model(names: &[&str]) -> AppModel {
        let mut model = AppModel::new();
        model.replace_catalog(names.iter().map(|name| DatasetRecord::named(name)).collect());
        model.phase = SessionPhase::Loaded;
        model
    }

    fn type_query(mut model: AppModel, text: &str) -> AppModel {
        for ch in text.chars() {
            let (next, _) = update(model, key(KeyCode::Char(ch)));
            model = next;
        }
        model
    }

    #[test]
    fn typing_narrows_view_per_keystroke() {
        let model = loaded_model(&["Foo", "Bar"]);
        assert_eq!(model.view.filtered_indices, vec![0, 1]);

        let model = type_query(model, "fo");
        assert_eq!(model.view.filtered_indices, vec![0]);
    }

    #[test]
    fn clearing_query_restores_full_catalog() {
        let model = type_query(loaded_model(&["Foo", "Bar"]), "fo");
        let (model, _) = update(model, key(KeyCode::Esc));
        assert_eq!(model.view.filtered_indices, vec![0, 1]);
        assert!(model.view.query.is_empty());
    }

    #[test]
    fn query_change_clears_selection_and_bumps_generation() {
        let mut model = loaded_model(&["Foo", "Bar"]);
        let (next, _) = update(model.clone(), key(KeyCode::Char(' ')));
        model = next;
        assert_eq!(model.view.checked.len(), 1);
        let generation = model.view.generation;

        let model = type_query(model, "b");
        assert!(model.view.checked.is_empty());
        assert!(model.view.generation > generation);
    }

    #[test]
    fn refetch_replaces_catalog_and_clears_selection() {
        let mut model = loaded_model(&["Foo", "Bar"]);
        let (next, _) = update(model, key(KeyCode::Char(' ')));
        model = next;

        model.replace_catalog(vec![DatasetRecord::named("Baz")]);
        assert_eq!(model.catalog.len(), 1);
        assert!(model.view.checked.is_empty());
        assert_eq!(model.view.filtered_indices, vec![0]);
    }

    #[test]
    fn enter_resolves_selection_in_catalog_order() {
        let mut model = loaded_model(&["Foo", "Bar", "Baz"]);

        // Toggle the last entry first, then the first; resolution still comes
        // back in catalog order.
        let (next, _) = update(model, key(KeyCode::Down));
        let (next, _) = update(next, key(KeyCode::Down));
        let (next, _) = update(next, key(KeyCode::Char(' ')));
        let (next, _) = update(next, key(KeyCode::Up));
        let (next, _) = update(next, key(KeyCode::Up));
        let (next, _) = update(next, key(KeyCode::Char(' ')));
        model = next;

        let (_, command) = update(model, key(KeyCode::Enter));
        match command {
            AppCommand::OpenSelection { records } => {
                let names: Vec<_> = records.iter().map(|record| record.name.as_str()).collect();
                assert_eq!(names, vec!["Foo", "Baz"]);
            }
            other => panic!("expected OpenSelection, got {other:?}"),
        }
    }

    #[test]
    fn enter_with_nothing_checked_yields_empty_selection() {
        let model = loaded_model(&["Foo"]);
        let (_, command) = update(model, key(KeyCode::Enter));
        match command {
            AppCommand::OpenSelection { records } => assert!(records.is_empty()),
            other => panic!("expected OpenSelection, got {other:?}"),
        }
    }

    #[test]
    fn stale_positions_are_skipped_on_resolution() {
        let records = vec![DatasetRecord::named("Foo")];
        let filtered = vec![0usize];
        let checked: BTreeSet<usize> = [0usize, 5].into_iter().collect();
        let resolved = resolve_selection(&records, &filtered, &checked);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "Foo");
    }

    #[test]
    fn ctrl_r_requests_refresh_when_idle() {
        let model = loaded_model(&["Foo"]);
        let (_, command) = update(model, ctrl('r'));
        assert!(matches!(command, AppCommand::Refresh));
    }

    #[test]
    fn refresh_is_rejected_while_busy() {
        let mut model = loaded_model(&["Foo"]);
        model.phase = SessionPhase::Fetching;
        let (next, command) = update(model, ctrl('r'));
        assert!(matches!(command, AppCommand::None));
        assert!(next.notice.is_some());
    }

    #[test]
    fn ctrl_q_quits() {
        let (_, command) = update(loaded_model(&[]), ctrl('q'));
        assert!(matches!(command, AppCommand::Quit));
    }

    #[test]
    fn empty_catalog_filters_to_empty_for_any_query() {
        let model = type_query(loaded_model(&[]), "anything");
        assert!(model.view.filtered_indices.is_empty());
    }

    #[test]
    fn cursor_stays_in_bounds_when_view_shrinks() {
        let mut model = loaded_model(&["Foo", "Bar", "Baz"]);
        let (next, _) = update(model, key(KeyCode::Down));
        let (next, _) = update(next, key(KeyCode::Down));
        model = next;
        assert_eq!(model.view.cursor, 2);

        let model = type_query(model, "fo");
        assert_eq!(model.view.filtered_indices.len(), 1);
        assert_eq!(model.view.cursor, 0);
    }

    #[test]
    fn paste_appends_to_query() {
        let model = loaded_model(&["Foo", "Bar"]);
        let (model, _) = update(model, AppEvent::Paste("ba".to_string()));
        assert_eq!(model.view.query, "ba");
        assert_eq!(model.view.filtered_indices, vec![1]);
    }

    #[test]
    fn notice_survives_navigation_but_clears_on_edit() {
        let mut model = loaded_model(&["Foo", "Bar"]);
        model.notice = Some("login failed: bad password".to_string());

        let (model, _) = update(model, key(KeyCode::Down));
        assert!(model.notice.is_some());
        let (model, _) = update(model, key(KeyCode::Up));
        assert!(model.notice.is_some());

        let (model, _) = update(model, key(KeyCode::Char('f')));
        assert!(model.notice.is_none());
    }

    #[test]
    fn notice_clears_on_toggle() {
        let mut model = loaded_model(&["Foo"]);
        model.notice = Some("stale".to_string());
        let (model, _) = update(model, key(KeyCode::Char(' ')));
        assert!(model.notice.is_none());
        assert_eq!(model.view.checked.len(), 1);
    }
}

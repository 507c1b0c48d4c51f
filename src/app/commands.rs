//! Command handlers - business logic for processing UI events
//!
//! Operations that need the host return the envelopes to send; the actor
//! forwards them.

use crate::app::state::{auth_fields, AppState, SaveField, SaveForm, SidebarItem};
use crate::collections::{self, SaveTarget};
use crate::curl;
use crate::messages::ui_events::{InputMode, Panel, Popup, RequestTab, RowField};
use crate::messages::{Execution, HostCommand, HostEvent};
use crate::models::{ApiKeyLocation, ApiRequest};
use crate::request::{edit_row, ensure_trailing_blank, remove_row, RowEdit};

impl AppState {
    /// Envelopes that load the persisted records at startup
    pub fn initial_commands(&self) -> Vec<HostCommand> {
        vec![
            HostCommand::GetCollections,
            HostCommand::GetHistory,
            HostCommand::GetEnvironments,
        ]
    }

    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.active_panel = self.active_panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = self.active_panel.prev();
    }

    pub fn select_tab(&mut self, tab: RequestTab) {
        self.active_tab = tab;
        self.active_panel = Panel::Editor;
        self.input_mode = InputMode::Normal;
        self.selected_row = 0;
        self.row_field = RowField::Key;
    }

    pub fn scroll_up(&mut self) {
        match self.active_panel {
            Panel::Editor => self.code_scroll = self.code_scroll.saturating_sub(1),
            _ => self.response_scroll = self.response_scroll.saturating_sub(1),
        }
    }

    pub fn scroll_down(&mut self) {
        match self.active_panel {
            Panel::Editor => self.code_scroll = self.code_scroll.saturating_add(1),
            _ => self.response_scroll = self.response_scroll.saturating_add(1),
        }
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        let Some(target) = self.editing_target() else {
            return;
        };
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.input_text(target).len();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn move_cursor_left(&mut self) {
        let Some(target) = self.editing_target() else {
            return;
        };
        let input = self.input_text(target);
        let cursor = self.cursor_position.min(input.len());
        if cursor > 0 {
            self.cursor_position = input[..cursor]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_cursor_right(&mut self) {
        let Some(target) = self.editing_target() else {
            return;
        };
        let input = self.input_text(target);
        if self.cursor_position < input.len() {
            self.cursor_position = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_end(&mut self) {
        if let Some(target) = self.editing_target() {
            self.cursor_position = self.input_text(target).len();
        }
    }

    pub fn enter_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.insert_text(c.encode_utf8(&mut buf));
    }

    /// Insert text at the cursor (typed or pasted)
    pub fn insert_text(&mut self, text: &str) {
        let Some(target) = self.editing_target() else {
            return;
        };
        let mut input = self.input_text(target).to_string();
        let cursor = self.cursor_position.min(input.len());
        input.insert_str(cursor, text);
        self.set_input_text(target, input);
        self.cursor_position = cursor + text.len();
    }

    pub fn delete_char(&mut self) {
        let Some(target) = self.editing_target() else {
            return;
        };
        let mut input = self.input_text(target).to_string();
        let cursor = self.cursor_position.min(input.len());
        if cursor == 0 {
            return;
        }
        let prev = input[..cursor]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        input.remove(prev);
        self.set_input_text(target, input);
        self.cursor_position = prev;
    }

    // ========================
    // Request fields
    // ========================

    pub fn cycle_method(&mut self) {
        if !self.is_loading {
            self.request.method = self.request.method.next();
        }
    }

    pub fn new_request(&mut self) {
        self.replace_request(ApiRequest::default());
        self.response = None;
        self.active_panel = Panel::Url;
    }

    pub fn cycle_body_type(&mut self) {
        let body = &mut self.request.body;
        body.kind = body.kind.next();
        if body.kind.uses_form_rows() {
            ensure_trailing_blank(body.form_data.get_or_insert_with(Vec::new));
        }
        self.selected_row = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn cycle_auth_type(&mut self) {
        self.request.auth.kind = self.request.auth.kind.next();
        self.auth_field = auth_fields(self.request.auth.kind)
            .first()
            .copied()
            .unwrap_or_default();
        self.selected_row = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn toggle_api_key_location(&mut self) {
        self.request.auth.add_to = match self.request.auth.add_to {
            ApiKeyLocation::Header => ApiKeyLocation::Query,
            ApiKeyLocation::Query => ApiKeyLocation::Header,
        };
    }

    pub fn cycle_code_format(&mut self) {
        self.code_format = self.code_format.next();
        self.code_scroll = 0;
    }

    // ========================
    // Rows and auth fields
    // ========================

    pub fn next_row(&mut self) {
        let count = self.selectable_count();
        if count > 0 {
            self.selected_row = (self.selected_row + 1) % count;
            self.sync_auth_field();
        }
    }

    pub fn prev_row(&mut self) {
        let count = self.selectable_count();
        if count > 0 {
            self.selected_row = self.selected_row.checked_sub(1).unwrap_or(count - 1) % count;
            self.sync_auth_field();
        }
    }

    /// Key/value column for rows, next field for auth
    pub fn next_field(&mut self) {
        if self.active_tab == RequestTab::Auth {
            self.next_row();
        } else {
            self.row_field = match self.row_field {
                RowField::Key => RowField::Value,
                RowField::Value => RowField::Key,
            };
        }
        if let Some(target) = self.editing_target() {
            self.cursor_position = self.input_text(target).len();
        }
    }

    fn sync_auth_field(&mut self) {
        if self.active_tab == RequestTab::Auth {
            if let Some(field) = auth_fields(self.request.auth.kind).get(self.selected_row) {
                self.auth_field = *field;
            }
        }
    }

    pub fn toggle_row(&mut self) {
        let Some(list) = self.row_list() else {
            return;
        };
        let index = self.selected_row;
        if let Some(enabled) = self.rows(list).get(index).map(|row| row.enabled) {
            edit_row(self.rows_mut(list), index, RowEdit::Enabled(!enabled));
        }
    }

    pub fn delete_row(&mut self) {
        let Some(list) = self.row_list() else {
            return;
        };
        let index = self.selected_row;
        let rows = self.rows_mut(list);
        remove_row(rows, index);
        let len = rows.len();
        self.selected_row = self.selected_row.min(len.saturating_sub(1));
    }

    // ========================
    // Environments
    // ========================

    /// No environment, then each environment in turn
    pub fn cycle_environment(&mut self) {
        let position = self
            .active_environment
            .as_deref()
            .and_then(|id| self.environments.iter().position(|env| env.id == id));
        let next = match position {
            None => 0,
            Some(i) => i + 1,
        };
        self.active_environment = self.environments.get(next).map(|env| env.id.clone());
    }

    // ========================
    // Request sending
    // ========================

    /// Build the execute envelope; refused while loading or without a URL
    pub fn prepare_send(&mut self) -> Option<HostCommand> {
        if self.is_loading || self.request.url.trim().is_empty() {
            return None;
        }
        self.input_mode = InputMode::Normal;
        self.is_loading = true;
        self.response = None;
        self.response_scroll = 0;

        Some(HostCommand::ExecuteRequest(Execution {
            request: self.request.clone(),
            environment_id: self.active_environment.clone(),
        }))
    }

    // ========================
    // Host events
    // ========================

    pub fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Response(response) => {
                self.response = Some(response);
                self.is_loading = false;
                self.response_scroll = 0;
            }
            HostEvent::Collections(collections) => {
                self.collections = collections;
                self.clamp_sidebar();
            }
            HostEvent::History(history) => {
                self.history = history;
                self.clamp_sidebar();
            }
            HostEvent::Environments(environments) => {
                self.environments = environments;
                if self.current_environment().is_none() {
                    self.active_environment = None;
                }
            }
            HostEvent::Notification(notification) => self.toast = Some(notification),
        }
    }

    // ========================
    // Sidebar
    // ========================

    pub fn next_sidebar_item(&mut self) {
        let len = self.sidebar_items().len();
        if len > 0 {
            self.sidebar_selected = (self.sidebar_selected + 1) % len;
        }
    }

    pub fn prev_sidebar_item(&mut self) {
        let len = self.sidebar_items().len();
        if len > 0 {
            self.sidebar_selected = self.sidebar_selected.checked_sub(1).unwrap_or(len - 1) % len;
        }
    }

    /// Load the selected saved request or history entry into the editor
    pub fn open_sidebar_item(&mut self) {
        let item = self.sidebar_items().into_iter().nth(self.sidebar_selected);
        let request = match item {
            Some(SidebarItem::Request {
                collection_id,
                request_id,
                ..
            }) => collections::find_request(&self.collections, &collection_id, &request_id).cloned(),
            Some(SidebarItem::History { index, .. }) => {
                self.history.get(index).map(|entry| entry.request.clone())
            }
            _ => None,
        };
        if let Some(request) = request {
            self.replace_request(request);
            self.active_panel = Panel::Url;
        }
    }

    pub fn delete_sidebar_item(&mut self) -> Vec<HostCommand> {
        let item = self.sidebar_items().into_iter().nth(self.sidebar_selected);
        let commands = match item {
            Some(SidebarItem::Collection { id, name, .. }) => {
                match collections::delete_collection(&self.collections, &id) {
                    Some(updated) => {
                        self.collections = updated.clone();
                        vec![
                            HostCommand::SaveCollections(updated),
                            HostCommand::OnInfo(format!("Collection \"{}\" deleted", name)),
                        ]
                    }
                    None => Vec::new(),
                }
            }
            Some(SidebarItem::Request {
                collection_id,
                request_id,
                ..
            }) => match collections::remove_request(&self.collections, &collection_id, &request_id) {
                Some(updated) => {
                    self.collections = updated.clone();
                    vec![HostCommand::SaveCollections(updated)]
                }
                None => Vec::new(),
            },
            Some(SidebarItem::History { index, .. }) => {
                if index < self.history.len() {
                    self.history.remove(index);
                    vec![HostCommand::SaveHistory(self.history.clone())]
                } else {
                    Vec::new()
                }
            }
            Some(SidebarItem::HistoryHeader { .. }) => vec![self.clear_history()],
            Some(SidebarItem::Folder { .. }) | None => Vec::new(),
        };
        self.clamp_sidebar();
        commands
    }

    /// History is cleared by the host, which echoes the empty list
    pub fn clear_history(&self) -> HostCommand {
        HostCommand::ClearHistory
    }

    // ========================
    // Popups
    // ========================

    pub fn toggle_help(&mut self) {
        self.popup = match self.popup {
            Some(Popup::Help) => None,
            _ => Some(Popup::Help),
        };
    }

    pub fn close_help(&mut self) {
        if self.popup == Some(Popup::Help) {
            self.popup = None;
        }
    }

    pub fn open_save_request(&mut self) {
        self.input_mode = InputMode::Normal;
        self.save_form = SaveForm {
            name: self.request.name.clone(),
            target: 0,
            new_collection_name: String::new(),
            field: SaveField::Name,
        };
        self.popup = Some(Popup::SaveRequest);
    }

    pub fn open_new_collection(&mut self) {
        self.input_mode = InputMode::Normal;
        self.new_collection_name.clear();
        self.popup = Some(Popup::NewCollection);
    }

    pub fn open_curl_import(&mut self) {
        self.input_mode = InputMode::Normal;
        self.curl_buffer.clear();
        self.popup = Some(Popup::CurlImport);
    }

    /// Whether the save popup targets a collection that does not exist yet
    pub fn saving_to_new_collection(&self) -> bool {
        self.save_form.target >= self.collections.len()
    }

    fn popup_input_mut(&mut self) -> Option<&mut String> {
        match self.popup {
            Some(Popup::SaveRequest) => match self.save_form.field {
                SaveField::Name => Some(&mut self.save_form.name),
                SaveField::NewCollectionName => Some(&mut self.save_form.new_collection_name),
            },
            Some(Popup::NewCollection) => Some(&mut self.new_collection_name),
            Some(Popup::CurlImport) => Some(&mut self.curl_buffer),
            Some(Popup::Help) | None => None,
        }
    }

    pub fn popup_char(&mut self, c: char) {
        if let Some(input) = self.popup_input_mut() {
            input.push(c);
        }
    }

    pub fn popup_paste(&mut self, text: &str) {
        if let Some(input) = self.popup_input_mut() {
            input.push_str(text);
        }
    }

    pub fn popup_backspace(&mut self) {
        if let Some(input) = self.popup_input_mut() {
            input.pop();
        }
    }

    pub fn popup_next_field(&mut self) {
        if self.popup == Some(Popup::SaveRequest) {
            self.save_form.field = match self.save_form.field {
                SaveField::Name if self.saving_to_new_collection() => SaveField::NewCollectionName,
                _ => SaveField::Name,
            };
        }
    }

    /// Move the save target; the last choice is "new collection"
    pub fn popup_up(&mut self) {
        if self.popup == Some(Popup::SaveRequest) {
            let choices = self.collections.len() + 1;
            self.save_form.target = self.save_form.target.checked_sub(1).unwrap_or(choices - 1);
            self.sync_save_field();
        }
    }

    pub fn popup_down(&mut self) {
        if self.popup == Some(Popup::SaveRequest) {
            let choices = self.collections.len() + 1;
            self.save_form.target = (self.save_form.target + 1) % choices;
            self.sync_save_field();
        }
    }

    fn sync_save_field(&mut self) {
        if !self.saving_to_new_collection() {
            self.save_form.field = SaveField::Name;
        }
    }

    pub fn popup_cancel(&mut self) {
        self.popup = None;
    }

    pub fn popup_confirm(&mut self) -> Vec<HostCommand> {
        match self.popup {
            Some(Popup::SaveRequest) => self.confirm_save(),
            Some(Popup::NewCollection) => self.confirm_new_collection(),
            Some(Popup::CurlImport) => self.confirm_curl_import(),
            Some(Popup::Help) | None => Vec::new(),
        }
    }

    /// Save the active request; validation errors keep the popup open
    fn confirm_save(&mut self) -> Vec<HostCommand> {
        let target = match self.collections.get(self.save_form.target) {
            Some(collection) => SaveTarget::Existing(collection.id.clone()),
            None => SaveTarget::New(self.save_form.new_collection_name.clone()),
        };
        match collections::save_request(&self.collections, &self.request, &self.save_form.name, target) {
            Ok(saved) => {
                self.collections = saved.collections.clone();
                self.request.name = saved.request.name.clone();
                self.popup = None;
                vec![
                    HostCommand::SaveCollections(saved.collections),
                    HostCommand::OnInfo(format!("Request saved to {}", saved.collection_name)),
                ]
            }
            Err(e) => vec![HostCommand::OnError(e.to_string())],
        }
    }

    /// Save into the first collection without asking
    pub fn quick_save(&mut self) -> Vec<HostCommand> {
        let saved = collections::quick_save(&self.collections, &self.request);
        self.collections = saved.collections.clone();
        vec![
            HostCommand::SaveCollections(saved.collections),
            HostCommand::OnInfo(format!("Request saved to {}", saved.collection_name)),
        ]
    }

    fn confirm_new_collection(&mut self) -> Vec<HostCommand> {
        match collections::create_collection(&self.collections, &self.new_collection_name) {
            Ok(updated) => {
                self.collections = updated.clone();
                self.popup = None;
                vec![
                    HostCommand::SaveCollections(updated),
                    HostCommand::OnInfo(format!(
                        "Collection \"{}\" created",
                        self.new_collection_name.trim()
                    )),
                ]
            }
            Err(e) => vec![HostCommand::OnError(e.to_string())],
        }
    }

    fn confirm_curl_import(&mut self) -> Vec<HostCommand> {
        match curl::parse_curl(&self.curl_buffer) {
            Ok(request) => {
                self.replace_request(request);
                self.popup = None;
                self.curl_buffer.clear();
                self.active_panel = Panel::Url;
                vec![HostCommand::OnInfo("Imported cURL command".to_string())]
            }
            Err(e) => vec![HostCommand::OnError(format!("Failed to import cURL: {}", e))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Notification, NotificationLevel};
    use crate::models::{ApiResponse, Collection, HistoryEntry, HttpMethod};

    #[test]
    fn send_is_refused_while_loading_or_without_url() {
        let mut state = AppState::new();
        assert!(state.prepare_send().is_none());

        state.request.url = "https://example.com".into();
        let command = state.prepare_send().unwrap();
        assert!(matches!(command, HostCommand::ExecuteRequest(_)));
        assert!(state.is_loading);
        assert!(state.prepare_send().is_none());
    }

    #[test]
    fn failed_dispatch_clears_loading_once() {
        let mut state = AppState::new();
        state.request.url = "https://unreachable.invalid".into();
        state.prepare_send().unwrap();

        state.handle_host_event(HostEvent::Response(ApiResponse::transport_error(
            "Connection failed: dns error",
            4,
        )));
        assert!(!state.is_loading);
        let response = state.response.clone().unwrap();
        assert_eq!(response.status, 0);
        assert!(!response.body_text().is_empty());

        // A new send is possible again and starts loading afresh
        assert!(state.prepare_send().is_some());
        assert!(state.is_loading);
        assert!(state.response.is_none());
    }

    #[test]
    fn typing_edits_through_the_cursor() {
        let mut state = AppState::new();
        state.start_editing();
        for c in "https://x.io".chars() {
            state.enter_char(c);
        }
        state.move_cursor_left();
        state.move_cursor_left();
        state.delete_char();
        assert_eq!(state.request.url, "https://xio");
        assert_eq!(state.cursor_position, 9);

        state.move_cursor_end();
        state.insert_text("/v1");
        assert_eq!(state.request.url, "https://xio/v1");
    }

    #[test]
    fn toggle_row_never_appends() {
        let mut state = AppState::new();
        state.select_tab(RequestTab::Params);
        state.toggle_row();
        assert_eq!(state.request.params.len(), 1);
        assert!(!state.request.params[0].enabled);
    }

    #[test]
    fn delete_last_remaining_row_clears_it() {
        let mut state = AppState::new();
        state.select_tab(RequestTab::Headers);
        state.edit_header(0, RowEdit::Key("X-A".into()));
        state.selected_row = 0;
        state.delete_row();
        assert_eq!(state.request.headers.len(), 1);
        assert!(state.request.headers[0].is_blank());
        state.delete_row();
        assert_eq!(state.request.headers.len(), 1);
    }

    #[test]
    fn save_with_blank_new_collection_reports_error() {
        let mut state = AppState::new();
        state.open_save_request();
        assert!(state.saving_to_new_collection());

        let commands = state.popup_confirm();
        assert_eq!(
            commands,
            vec![HostCommand::OnError("Please enter a collection name".into())]
        );
        assert_eq!(state.popup, Some(Popup::SaveRequest));
        assert!(state.collections.is_empty());

        state.popup_next_field();
        for c in "Api".chars() {
            state.popup_char(c);
        }
        let commands = state.popup_confirm();
        assert!(matches!(commands[0], HostCommand::SaveCollections(ref c) if c.len() == 1));
        assert_eq!(state.popup, None);
        assert_eq!(state.collections[0].requests.len(), 1);
    }

    #[test]
    fn save_popup_cycles_targets() {
        let mut state = AppState::new();
        state.collections = vec![Collection::new("A"), Collection::new("B")];
        state.open_save_request();
        assert!(!state.saving_to_new_collection());
        state.popup_up();
        assert!(state.saving_to_new_collection());
        state.popup_down();
        assert_eq!(state.save_form.target, 0);
    }

    #[test]
    fn curl_import_replaces_request() {
        let mut state = AppState::new();
        state.open_curl_import();
        state.popup_paste("curl -X POST https://example.com/items -d '{\"a\":1}'");
        let commands = state.popup_confirm();

        assert_eq!(commands, vec![HostCommand::OnInfo("Imported cURL command".into())]);
        assert_eq!(state.request.method, HttpMethod::POST);
        assert_eq!(state.request.url, "https://example.com/items");
        assert_eq!(state.popup, None);
    }

    #[test]
    fn bad_curl_keeps_popup_open() {
        let mut state = AppState::new();
        state.open_curl_import();
        state.popup_paste("curl -X GET");
        let commands = state.popup_confirm();
        assert!(matches!(commands[0], HostCommand::OnError(_)));
        assert_eq!(state.popup, Some(Popup::CurlImport));
    }

    #[test]
    fn opening_history_entry_loads_a_copy() {
        let mut state = AppState::new();
        let request = ApiRequest {
            url: "https://example.com/h".into(),
            ..ApiRequest::default()
        };
        state.handle_host_event(HostEvent::History(vec![HistoryEntry {
            request: request.clone(),
            timestamp: chrono::Utc::now(),
        }]));
        state.sidebar_selected = 1;
        state.open_sidebar_item();

        assert_eq!(state.request, request);
        state.request.url.push_str("/edited");
        assert_eq!(state.history[0].request.url, "https://example.com/h");
    }

    #[test]
    fn deleting_history_entry_saves_remaining() {
        let mut state = AppState::new();
        state.history = vec![HistoryEntry {
            request: ApiRequest::default(),
            timestamp: chrono::Utc::now(),
        }];
        state.sidebar_selected = 1;
        let commands = state.delete_sidebar_item();
        assert_eq!(commands, vec![HostCommand::SaveHistory(Vec::new())]);
        assert_eq!(state.sidebar_selected, 0);
    }

    #[test]
    fn environment_cycle_wraps_to_none() {
        let mut state = AppState::new();
        state.handle_host_event(HostEvent::Environments(vec![
            crate::models::Environment::new("dev"),
            crate::models::Environment::new("prod"),
        ]));
        state.cycle_environment();
        assert_eq!(state.current_environment().unwrap().name, "dev");
        state.cycle_environment();
        assert_eq!(state.current_environment().unwrap().name, "prod");
        state.cycle_environment();
        assert!(state.current_environment().is_none());
    }

    #[test]
    fn notifications_become_toasts() {
        let mut state = AppState::new();
        let note = Notification {
            level: NotificationLevel::Info,
            message: "Request saved to Api".into(),
        };
        state.handle_host_event(HostEvent::Notification(note.clone()));
        assert_eq!(state.toast, Some(note));
    }
}

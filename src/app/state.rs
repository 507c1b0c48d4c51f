//! App state - pure data structure with no I/O logic

use chrono::{DateTime, Utc};

use crate::codegen::{generate, CodeFormat};
use crate::messages::ui_events::{AuthField, InputMode, Panel, Popup, RequestTab, RowField};
use crate::messages::{Notification, RenderState};
use crate::models::{
    ApiRequest, ApiResponse, AuthKind, Collection, Environment, HistoryEntry, HttpMethod, KeyValue,
};
use crate::request::{edit_row, RequestPatch, RowEdit};

/// One line of the sidebar: collections with their requests, then history
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarItem {
    Collection {
        id: String,
        name: String,
        count: usize,
    },
    Folder {
        name: String,
        depth: usize,
    },
    Request {
        collection_id: String,
        request_id: String,
        name: String,
        method: HttpMethod,
        depth: usize,
    },
    HistoryHeader {
        count: usize,
    },
    History {
        index: usize,
        method: HttpMethod,
        url: String,
        timestamp: DateTime<Utc>,
    },
}

/// Field focused in the save-request popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveField {
    #[default]
    Name,
    NewCollectionName,
}

/// Save-request popup contents
#[derive(Debug, Clone, Default)]
pub struct SaveForm {
    pub name: String,
    /// Index into the collections; one past the end means "new collection"
    pub target: usize,
    pub new_collection_name: String,
    pub field: SaveField,
}

/// Row lists of the active request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowList {
    Params,
    Headers,
    Form,
}

/// Text field the cursor edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    Url,
    Row(RowList, usize, RowField),
    BodyContent,
    Auth(AuthField),
}

/// Auth fields shown for an auth type
pub fn auth_fields(kind: AuthKind) -> &'static [AuthField] {
    match kind {
        AuthKind::None => &[],
        AuthKind::Basic => &[AuthField::Username, AuthField::Password],
        AuthKind::Bearer | AuthKind::OAuth2 => &[AuthField::Token],
        AuthKind::ApiKey => &[AuthField::Key, AuthField::Value],
    }
}

/// Main application state - pure data, no I/O
pub struct AppState {
    // Active request and its response
    pub request: ApiRequest,
    pub response: Option<ApiResponse>,
    pub is_loading: bool,

    // Host-owned data mirrored for display
    pub collections: Vec<Collection>,
    pub history: Vec<HistoryEntry>,
    pub environments: Vec<Environment>,
    pub active_environment: Option<String>,

    // UI state
    pub active_panel: Panel,
    pub active_tab: RequestTab,
    pub input_mode: InputMode,
    pub cursor_position: usize,

    // Editor
    pub selected_row: usize,
    pub row_field: RowField,
    pub auth_field: AuthField,
    pub code_format: CodeFormat,
    pub code_scroll: u16,
    pub response_scroll: u16,

    // Sidebar
    pub sidebar_selected: usize,

    // Popups
    pub popup: Option<Popup>,
    pub save_form: SaveForm,
    pub new_collection_name: String,
    pub curl_buffer: String,

    pub toast: Option<Notification>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            request: ApiRequest::default(),
            response: None,
            is_loading: false,
            collections: Vec::new(),
            history: Vec::new(),
            environments: Vec::new(),
            active_environment: None,
            active_panel: Panel::Url,
            active_tab: RequestTab::Params,
            input_mode: InputMode::Normal,
            cursor_position: 0,
            selected_row: 0,
            row_field: RowField::Key,
            auth_field: AuthField::Username,
            code_format: CodeFormat::Curl,
            code_scroll: 0,
            response_scroll: 0,
            sidebar_selected: 0,
            popup: None,
            save_form: SaveForm::default(),
            new_collection_name: String::new(),
            curl_buffer: String::new(),
            toast: None,
        }
    }

    // ========================
    // Request model
    // ========================

    /// Merge a partial update into the active request
    pub fn set_field(&mut self, patch: RequestPatch) {
        self.request.apply(patch);
    }

    /// Replace the active request wholesale
    pub fn replace_request(&mut self, request: ApiRequest) {
        self.request = request;
        self.input_mode = InputMode::Normal;
        self.cursor_position = 0;
        self.selected_row = 0;
        self.row_field = RowField::Key;
        self.auth_field = auth_fields(self.request.auth.kind)
            .first()
            .copied()
            .unwrap_or_default();
        self.code_scroll = 0;
    }

    pub fn edit_param(&mut self, index: usize, edit: RowEdit) {
        edit_row(self.rows_mut(RowList::Params), index, edit);
    }

    pub fn edit_header(&mut self, index: usize, edit: RowEdit) {
        edit_row(self.rows_mut(RowList::Headers), index, edit);
    }

    pub fn edit_form_row(&mut self, index: usize, edit: RowEdit) {
        edit_row(self.rows_mut(RowList::Form), index, edit);
    }

    pub fn current_environment(&self) -> Option<&Environment> {
        let id = self.active_environment.as_deref()?;
        self.environments.iter().find(|env| env.id == id)
    }

    /// Code for the active request with the selected environment applied
    pub fn generated_code(&self) -> String {
        generate(
            &self.request.resolved(self.current_environment()),
            self.code_format,
        )
    }

    // ========================
    // Rows
    // ========================

    /// Row list edited by the active tab, if any
    pub fn row_list(&self) -> Option<RowList> {
        match self.active_tab {
            RequestTab::Params => Some(RowList::Params),
            RequestTab::Headers => Some(RowList::Headers),
            RequestTab::Body if self.request.body.kind.uses_form_rows() => Some(RowList::Form),
            _ => None,
        }
    }

    pub fn rows(&self, list: RowList) -> &[KeyValue] {
        match list {
            RowList::Params => &self.request.params,
            RowList::Headers => &self.request.headers,
            RowList::Form => self.request.body.form_data.as_deref().unwrap_or(&[]),
        }
    }

    /// Mutable row list; an empty list gets its blank row back first
    pub fn rows_mut(&mut self, list: RowList) -> &mut Vec<KeyValue> {
        let rows = match list {
            RowList::Params => &mut self.request.params,
            RowList::Headers => &mut self.request.headers,
            RowList::Form => self.request.body.form_data.get_or_insert_with(Vec::new),
        };
        if rows.is_empty() {
            rows.push(KeyValue::blank());
        }
        rows
    }

    /// Number of selectable lines in the editor for the active tab
    pub fn selectable_count(&self) -> usize {
        match self.row_list() {
            Some(list) => self.rows(list).len().max(1),
            None if self.active_tab == RequestTab::Auth => {
                auth_fields(self.request.auth.kind).len()
            }
            None => 0,
        }
    }

    // ========================
    // Input targets
    // ========================

    /// Field the cursor would edit in the focused panel
    pub fn editing_target(&self) -> Option<InputTarget> {
        match self.active_panel {
            Panel::Url => Some(InputTarget::Url),
            Panel::Editor => match self.active_tab {
                RequestTab::Params | RequestTab::Headers | RequestTab::Body => {
                    match self.row_list() {
                        Some(list) => Some(InputTarget::Row(list, self.selected_row, self.row_field)),
                        None => Some(InputTarget::BodyContent),
                    }
                }
                RequestTab::Auth => {
                    let fields = auth_fields(self.request.auth.kind);
                    if fields.contains(&self.auth_field) {
                        Some(InputTarget::Auth(self.auth_field))
                    } else {
                        fields.first().map(|f| InputTarget::Auth(*f))
                    }
                }
                RequestTab::Code => None,
            },
            Panel::Sidebar | Panel::Response => None,
        }
    }

    pub fn input_text(&self, target: InputTarget) -> &str {
        match target {
            InputTarget::Url => &self.request.url,
            InputTarget::BodyContent => &self.request.body.content,
            InputTarget::Row(list, index, field) => self
                .rows(list)
                .get(index)
                .map(|row| match field {
                    RowField::Key => row.key.as_str(),
                    RowField::Value => row.value.as_str(),
                })
                .unwrap_or(""),
            InputTarget::Auth(field) => {
                let auth = &self.request.auth;
                match field {
                    AuthField::Username => &auth.username,
                    AuthField::Password => &auth.password,
                    AuthField::Token => &auth.token,
                    AuthField::Key => &auth.key,
                    AuthField::Value => &auth.value,
                }
            }
        }
    }

    /// Store edited text; row edits go through the row-editing policy
    pub fn set_input_text(&mut self, target: InputTarget, text: String) {
        match target {
            InputTarget::Url => self.set_field(RequestPatch {
                url: Some(text),
                ..RequestPatch::default()
            }),
            InputTarget::BodyContent => self.request.body.content = text,
            InputTarget::Row(list, index, field) => {
                let edit = match field {
                    RowField::Key => RowEdit::Key(text),
                    RowField::Value => RowEdit::Value(text),
                };
                edit_row(self.rows_mut(list), index, edit);
            }
            InputTarget::Auth(field) => {
                let auth = &mut self.request.auth;
                match field {
                    AuthField::Username => auth.username = text,
                    AuthField::Password => auth.password = text,
                    AuthField::Token => auth.token = text,
                    AuthField::Key => auth.key = text,
                    AuthField::Value => auth.value = text,
                }
            }
        }
    }

    /// Editing the text body, where Enter inserts a newline
    pub fn is_multiline(&self) -> bool {
        self.input_mode == InputMode::Editing
            && self.editing_target() == Some(InputTarget::BodyContent)
    }

    // ========================
    // Sidebar
    // ========================

    pub fn sidebar_items(&self) -> Vec<SidebarItem> {
        let mut items = Vec::new();
        for collection in &self.collections {
            items.push(SidebarItem::Collection {
                id: collection.id.clone(),
                name: collection.name.clone(),
                count: collection.request_count(),
            });
            push_folder_contents(&mut items, &collection.id, collection, 1);
        }
        items.push(SidebarItem::HistoryHeader {
            count: self.history.len(),
        });
        for (index, entry) in self.history.iter().enumerate() {
            items.push(SidebarItem::History {
                index,
                method: entry.request.method,
                url: entry.request.url.clone(),
                timestamp: entry.timestamp,
            });
        }
        items
    }

    /// Keep the sidebar selection inside the item list
    pub fn clamp_sidebar(&mut self) {
        let len = self.sidebar_items().len();
        self.sidebar_selected = self.sidebar_selected.min(len.saturating_sub(1));
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let code = if self.active_tab == RequestTab::Code {
            self.generated_code()
        } else {
            String::new()
        };

        RenderState {
            request: self.request.clone(),
            active_panel: self.active_panel,
            active_tab: self.active_tab,
            input_mode: self.input_mode,
            cursor_position: self.cursor_position,
            multiline: self.is_multiline(),
            selected_row: self.selected_row,
            row_field: self.row_field,
            auth_field: self.auth_field,
            code_format: self.code_format,
            code,
            code_scroll: self.code_scroll,
            response: self.response.clone(),
            response_scroll: self.response_scroll,
            is_loading: self.is_loading,
            sidebar: self.sidebar_items(),
            sidebar_selected: self.sidebar_selected,
            environment: self.current_environment().map(|env| env.name.clone()),
            popup: self.popup,
            save_form: self.save_form.clone(),
            collection_names: self.collections.iter().map(|c| c.name.clone()).collect(),
            new_collection_name: self.new_collection_name.clone(),
            curl_buffer: self.curl_buffer.clone(),
            toast: self.toast.clone(),
        }
    }
}

fn push_folder_contents(
    items: &mut Vec<SidebarItem>,
    collection_id: &str,
    folder: &Collection,
    depth: usize,
) {
    for request in &folder.requests {
        items.push(SidebarItem::Request {
            collection_id: collection_id.to_string(),
            request_id: request.id.clone(),
            name: request.name.clone(),
            method: request.method,
            depth,
        });
    }
    for child in &folder.folders {
        items.push(SidebarItem::Folder {
            name: child.name.clone(),
            depth,
        });
        push_folder_contents(items, collection_id, child, depth + 1);
    }
}

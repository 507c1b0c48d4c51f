//! Render state - data structure sent from App layer to UI for rendering

use crate::app::state::{SaveForm, SidebarItem};
use crate::codegen::CodeFormat;
use crate::messages::host::Notification;
use crate::messages::ui_events::{
    AuthField, InputMode, KeyContext, Panel, Popup, RequestTab, RowField,
};
use crate::models::{ApiRequest, ApiResponse};

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Active request
    pub request: ApiRequest,

    // UI state
    pub active_panel: Panel,
    pub active_tab: RequestTab,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    /// Editing a multi-line field (the text body)
    pub multiline: bool,

    // Rows and auth
    pub selected_row: usize,
    pub row_field: RowField,
    pub auth_field: AuthField,

    // Code tab
    pub code_format: CodeFormat,
    pub code: String,
    pub code_scroll: u16,

    // Response
    pub response: Option<ApiResponse>,
    pub response_scroll: u16,
    pub is_loading: bool,

    // Sidebar
    pub sidebar: Vec<SidebarItem>,
    pub sidebar_selected: usize,
    pub environment: Option<String>,

    // Popups
    pub popup: Option<Popup>,
    pub save_form: SaveForm,
    pub collection_names: Vec<String>,
    pub new_collection_name: String,
    pub curl_buffer: String,

    // Status bar toast
    pub toast: Option<Notification>,
}

impl RenderState {
    pub fn key_context(&self) -> KeyContext {
        KeyContext {
            panel: self.active_panel,
            tab: self.active_tab,
            input_mode: self.input_mode,
            popup: self.popup,
            multiline: self.multiline,
        }
    }
}

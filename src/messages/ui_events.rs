//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Panel navigation
    NextPanel,
    PrevPanel,
    SelectTab(RequestTab),
    ScrollUp,
    ScrollDown,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    Paste(String),

    // Request actions
    SendRequest,
    CycleMethod,
    NewRequest,

    // Rows (params, headers, form fields) and auth fields
    NextRow,
    PrevRow,
    NextField,
    ToggleRow,
    DeleteRow,

    // Body / auth / code
    CycleBodyType,
    CycleAuthType,
    ToggleApiKeyLocation,
    CycleCodeFormat,

    // Sidebar
    NextSidebarItem,
    PrevSidebarItem,
    OpenSidebarItem,
    DeleteSidebarItem,
    ClearHistory,

    // Environments
    CycleEnvironment,

    // Popups
    OpenSaveRequest,
    QuickSave,
    OpenNewCollection,
    OpenCurlImport,
    PopupChar(char),
    PopupPaste(String),
    PopupBackspace,
    PopupNextField,
    PopupUp,
    PopupDown,
    PopupConfirm,
    PopupCancel,
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Focusable areas of the screen
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Panel {
    Sidebar,
    #[default]
    Url,
    Editor,
    Response,
}

impl Panel {
    pub fn next(&self) -> Panel {
        match self {
            Panel::Sidebar => Panel::Url,
            Panel::Url => Panel::Editor,
            Panel::Editor => Panel::Response,
            Panel::Response => Panel::Sidebar,
        }
    }

    pub fn prev(&self) -> Panel {
        match self {
            Panel::Sidebar => Panel::Response,
            Panel::Url => Panel::Sidebar,
            Panel::Editor => Panel::Url,
            Panel::Response => Panel::Editor,
        }
    }
}

/// Tabs of the request editor
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RequestTab {
    #[default]
    Params,
    Headers,
    Body,
    Auth,
    Code,
}

impl RequestTab {
    pub const ALL: [RequestTab; 5] = [
        RequestTab::Params,
        RequestTab::Headers,
        RequestTab::Body,
        RequestTab::Auth,
        RequestTab::Code,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            RequestTab::Params => "Params",
            RequestTab::Headers => "Headers",
            RequestTab::Body => "Body",
            RequestTab::Auth => "Auth",
            RequestTab::Code => "Code",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Column of a key/value row
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RowField {
    #[default]
    Key,
    Value,
}

/// Auth editing field
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AuthField {
    #[default]
    Username,
    Password,
    Token,
    Key,
    Value,
}

impl AuthField {
    pub fn label(&self) -> &'static str {
        match self {
            AuthField::Username => "Username",
            AuthField::Password => "Password",
            AuthField::Token => "Token",
            AuthField::Key => "Key",
            AuthField::Value => "Value",
        }
    }
}

/// Modal popups
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Popup {
    Help,
    SaveRequest,
    NewCollection,
    CurlImport,
}

/// What the key mapper needs to know about the screen
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyContext {
    pub panel: Panel,
    pub tab: RequestTab,
    pub input_mode: InputMode,
    pub popup: Option<Popup>,
    /// Editing a multi-line field: Enter inserts a newline
    pub multiline: bool,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(key: KeyEvent, ctx: KeyContext) -> Option<UiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            KeyCode::Char('s') if ctx.popup.is_none() => return Some(UiEvent::QuickSave),
            _ => {}
        }
    }

    match ctx.popup {
        Some(Popup::Help) => return Some(UiEvent::CloseHelp),
        Some(_) => {
            return match key.code {
                KeyCode::Esc => Some(UiEvent::PopupCancel),
                KeyCode::Enter => Some(UiEvent::PopupConfirm),
                KeyCode::Tab => Some(UiEvent::PopupNextField),
                KeyCode::Up => Some(UiEvent::PopupUp),
                KeyCode::Down => Some(UiEvent::PopupDown),
                KeyCode::Backspace => Some(UiEvent::PopupBackspace),
                KeyCode::Char(c) => Some(UiEvent::PopupChar(c)),
                _ => None,
            };
        }
        None => {}
    }

    match ctx.input_mode {
        InputMode::Editing => editing_keys(key, ctx),
        InputMode::Normal => normal_keys(key, ctx),
    }
}

/// Route bracketed-paste text to the popup or the field being edited
pub fn paste_to_ui_event(text: String, ctx: KeyContext) -> Option<UiEvent> {
    match ctx.popup {
        Some(Popup::Help) => None,
        Some(_) => Some(UiEvent::PopupPaste(text)),
        None if ctx.input_mode == InputMode::Editing => Some(UiEvent::Paste(text)),
        None => None,
    }
}

fn editing_keys(key: KeyEvent, ctx: KeyContext) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc => Some(UiEvent::StopEditing),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Home => Some(UiEvent::CursorHome),
        KeyCode::End => Some(UiEvent::CursorEnd),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Tab if ctx.panel == Panel::Editor => Some(UiEvent::NextField),
        KeyCode::Enter if ctx.multiline => Some(UiEvent::CharInput('\n')),
        KeyCode::Enter if ctx.panel == Panel::Url => Some(UiEvent::SendRequest),
        KeyCode::Enter => Some(UiEvent::StopEditing),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        _ => None,
    }
}

fn normal_keys(key: KeyEvent, ctx: KeyContext) -> Option<UiEvent> {
    let panel = ctx.panel;
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Tab => Some(UiEvent::NextPanel),
        KeyCode::BackTab => Some(UiEvent::PrevPanel),
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            Some(UiEvent::SelectTab(RequestTab::ALL[index]))
        }
        KeyCode::Char('m') => Some(UiEvent::CycleMethod),
        KeyCode::Char('s') => Some(UiEvent::SendRequest),
        KeyCode::Char('S') => Some(UiEvent::OpenSaveRequest),
        KeyCode::Char('n') => Some(UiEvent::OpenNewCollection),
        KeyCode::Char('N') => Some(UiEvent::NewRequest),
        KeyCode::Char('i') => Some(UiEvent::OpenCurlImport),
        KeyCode::Char('X') => Some(UiEvent::ClearHistory),
        KeyCode::Char('E') => Some(UiEvent::CycleEnvironment),
        KeyCode::Char('b') => Some(UiEvent::CycleBodyType),
        KeyCode::Char('t') => Some(UiEvent::CycleAuthType),
        KeyCode::Char('l') => Some(UiEvent::ToggleApiKeyLocation),
        KeyCode::Char('f') => Some(UiEvent::CycleCodeFormat),
        KeyCode::Char('e') | KeyCode::Enter => match panel {
            Panel::Sidebar => Some(UiEvent::OpenSidebarItem),
            Panel::Url | Panel::Editor => Some(UiEvent::StartEditing),
            Panel::Response => None,
        },
        KeyCode::Char(' ') if panel == Panel::Editor => Some(UiEvent::ToggleRow),
        KeyCode::Char('d') => match panel {
            Panel::Sidebar => Some(UiEvent::DeleteSidebarItem),
            Panel::Editor => Some(UiEvent::DeleteRow),
            _ => None,
        },
        KeyCode::Up => match panel {
            Panel::Sidebar => Some(UiEvent::PrevSidebarItem),
            Panel::Editor if ctx.tab == RequestTab::Code => Some(UiEvent::ScrollUp),
            Panel::Editor => Some(UiEvent::PrevRow),
            Panel::Response => Some(UiEvent::ScrollUp),
            Panel::Url => None,
        },
        KeyCode::Down => match panel {
            Panel::Sidebar => Some(UiEvent::NextSidebarItem),
            Panel::Editor if ctx.tab == RequestTab::Code => Some(UiEvent::ScrollDown),
            Panel::Editor => Some(UiEvent::NextRow),
            Panel::Response => Some(UiEvent::ScrollDown),
            Panel::Url => None,
        },
        KeyCode::Left | KeyCode::Right if panel == Panel::Editor => Some(UiEvent::NextField),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn number_keys_select_tabs() {
        let ctx = KeyContext::default();
        assert_eq!(
            key_to_ui_event(press(KeyCode::Char('3')), ctx),
            Some(UiEvent::SelectTab(RequestTab::Body))
        );
        assert_eq!(
            key_to_ui_event(press(KeyCode::Char('5')), ctx),
            Some(UiEvent::SelectTab(RequestTab::Code))
        );
    }

    #[test]
    fn enter_depends_on_context() {
        let mut ctx = KeyContext {
            input_mode: InputMode::Editing,
            ..KeyContext::default()
        };
        assert_eq!(
            key_to_ui_event(press(KeyCode::Enter), ctx),
            Some(UiEvent::SendRequest)
        );

        ctx.panel = Panel::Editor;
        ctx.multiline = true;
        assert_eq!(
            key_to_ui_event(press(KeyCode::Enter), ctx),
            Some(UiEvent::CharInput('\n'))
        );

        ctx.input_mode = InputMode::Normal;
        ctx.panel = Panel::Sidebar;
        assert_eq!(
            key_to_ui_event(press(KeyCode::Enter), ctx),
            Some(UiEvent::OpenSidebarItem)
        );
    }

    #[test]
    fn popups_capture_typing() {
        let ctx = KeyContext {
            popup: Some(Popup::CurlImport),
            ..KeyContext::default()
        };
        assert_eq!(
            key_to_ui_event(press(KeyCode::Char('q')), ctx),
            Some(UiEvent::PopupChar('q'))
        );
        assert_eq!(
            key_to_ui_event(press(KeyCode::Esc), ctx),
            Some(UiEvent::PopupCancel)
        );

        let help = KeyContext {
            popup: Some(Popup::Help),
            ..KeyContext::default()
        };
        assert_eq!(
            key_to_ui_event(press(KeyCode::Char('x')), help),
            Some(UiEvent::CloseHelp)
        );
    }

    #[test]
    fn paste_goes_to_popup_or_editor() {
        let popup = KeyContext {
            popup: Some(Popup::CurlImport),
            ..KeyContext::default()
        };
        assert_eq!(
            paste_to_ui_event("curl x".into(), popup),
            Some(UiEvent::PopupPaste("curl x".into()))
        );
        assert_eq!(paste_to_ui_event("x".into(), KeyContext::default()), None);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let ctx = KeyContext {
            input_mode: InputMode::Editing,
            ..KeyContext::default()
        };
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_ui_event(key, ctx), Some(UiEvent::Quit));
    }
}

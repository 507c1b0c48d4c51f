//! App actor - message loop processing UI events and host events

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::{HostCommand, HostEvent, RenderState, UiEvent};

/// App actor that processes UI events and host events
pub struct AppActor {
    state: AppState,
    host_tx: mpsc::UnboundedSender<HostCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        host_tx: mpsc::UnboundedSender<HostCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state: AppState::new(),
            host_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut host_rx: mpsc::UnboundedReceiver<HostEvent>,
    ) {
        let initial = self.state.initial_commands();
        self.send_all(initial);
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.host_tx.send(HostCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(event) = host_rx.recv() => {
                    self.state.handle_host_event(event);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    fn send_all(&self, commands: Vec<HostCommand>) {
        for command in commands {
            let _ = self.host_tx.send(command);
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        // A toast lasts until the next key press
        self.state.toast = None;

        match event {
            // Panel navigation
            UiEvent::NextPanel => self.state.next_panel(),
            UiEvent::PrevPanel => self.state.prev_panel(),
            UiEvent::SelectTab(tab) => self.state.select_tab(tab),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Paste(text) => self.state.insert_text(&text),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),
            UiEvent::CursorHome => self.state.move_cursor_home(),
            UiEvent::CursorEnd => self.state.move_cursor_end(),

            // Request actions
            UiEvent::SendRequest => {
                if let Some(cmd) = self.state.prepare_send() {
                    let _ = self.host_tx.send(cmd);
                }
            }
            UiEvent::CycleMethod => self.state.cycle_method(),
            UiEvent::NewRequest => self.state.new_request(),

            // Rows
            UiEvent::NextRow => self.state.next_row(),
            UiEvent::PrevRow => self.state.prev_row(),
            UiEvent::NextField => self.state.next_field(),
            UiEvent::ToggleRow => self.state.toggle_row(),
            UiEvent::DeleteRow => self.state.delete_row(),

            // Body / auth / code
            UiEvent::CycleBodyType => self.state.cycle_body_type(),
            UiEvent::CycleAuthType => self.state.cycle_auth_type(),
            UiEvent::ToggleApiKeyLocation => self.state.toggle_api_key_location(),
            UiEvent::CycleCodeFormat => self.state.cycle_code_format(),

            // Sidebar
            UiEvent::NextSidebarItem => self.state.next_sidebar_item(),
            UiEvent::PrevSidebarItem => self.state.prev_sidebar_item(),
            UiEvent::OpenSidebarItem => self.state.open_sidebar_item(),
            UiEvent::DeleteSidebarItem => {
                let commands = self.state.delete_sidebar_item();
                self.send_all(commands);
            }
            UiEvent::ClearHistory => {
                let _ = self.host_tx.send(self.state.clear_history());
            }

            // Environments
            UiEvent::CycleEnvironment => self.state.cycle_environment(),

            // Popups
            UiEvent::OpenSaveRequest => self.state.open_save_request(),
            UiEvent::QuickSave => {
                let commands = self.state.quick_save();
                self.send_all(commands);
            }
            UiEvent::OpenNewCollection => self.state.open_new_collection(),
            UiEvent::OpenCurlImport => self.state.open_curl_import(),
            UiEvent::PopupChar(c) => self.state.popup_char(c),
            UiEvent::PopupPaste(text) => self.state.popup_paste(&text),
            UiEvent::PopupBackspace => self.state.popup_backspace(),
            UiEvent::PopupNextField => self.state.popup_next_field(),
            UiEvent::PopupUp => self.state.popup_up(),
            UiEvent::PopupDown => self.state.popup_down(),
            UiEvent::PopupConfirm => {
                let commands = self.state.popup_confirm();
                self.send_all(commands);
            }
            UiEvent::PopupCancel => self.state.popup_cancel(),
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn startup_requests_stored_records_and_quit_stops_host() {
        let (host_tx, mut host_rx) = mpsc::unbounded_channel();
        let (render_tx, mut render_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_event_tx, event_rx) = mpsc::unbounded_channel();

        let actor = AppActor::new(host_tx, render_tx);
        let handle = tokio::spawn(actor.run(ui_rx, event_rx));

        ui_tx.send(UiEvent::Quit).unwrap();
        handle.await.unwrap();

        assert_eq!(host_rx.recv().await, Some(HostCommand::GetCollections));
        assert_eq!(host_rx.recv().await, Some(HostCommand::GetHistory));
        assert_eq!(host_rx.recv().await, Some(HostCommand::GetEnvironments));
        assert_eq!(host_rx.recv().await, Some(HostCommand::Shutdown));
        assert!(render_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn send_forwards_execute_and_response_clears_loading() {
        let (host_tx, mut host_rx) = mpsc::unbounded_channel();
        let (render_tx, _render_rx) = mpsc::unbounded_channel();
        let mut actor = AppActor::new(host_tx, render_tx);
        actor.state.request.url = "https://example.com".into();

        assert!(!actor.handle_ui_event(UiEvent::SendRequest));
        assert!(matches!(
            host_rx.recv().await,
            Some(HostCommand::ExecuteRequest(_))
        ));
        assert!(actor.state.is_loading);

        actor.state.handle_host_event(HostEvent::Response(
            crate::models::ApiResponse::transport_error("boom", 1),
        ));
        assert!(!actor.state.is_loading);
    }
}

use crate::app::{App, MenuItem};
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub fn handle_key_bindings(key_event: KeyEvent, app: &mut App) {
    match (app.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => app.update_tab(MenuItem::Dashboard),
        (_, Char('2'), _) => app.update_tab(MenuItem::Feed),
        (_, Char('?'), _) => app.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => app.exit_help(),

        // Dashboard navigation
        (MenuItem::Dashboard, Char('j') | KeyCode::Down, _) => app.select_next_sport(),
        (MenuItem::Dashboard, Char('k') | KeyCode::Up, _) => app.select_prev_sport(),

        // Feed scrolling, newest first
        (MenuItem::Feed, Char('j') | KeyCode::Down, _) => app.state.feed.scroll_down(),
        (MenuItem::Feed, Char('k') | KeyCode::Up, _) => app.state.feed.scroll_up(),
        (MenuItem::Feed, KeyCode::Esc, _) => app.update_tab(MenuItem::Dashboard),

        // Global
        (_, Char('f'), _) => app.toggle_full_screen(),
        (_, Char('"'), _) => app.toggle_show_logs(),

        _ => {}
    }
}

use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use groupstage_core::roster::StatAdjustment;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;

    // An open form swallows every key, including q.
    if guard.state.prompt.is_some() {
        let request = guard.handle_prompt_key(key_event);
        drop(guard);
        send(network_requests, request).await;
        return;
    }

    let request = match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => tab(&mut guard, MenuItem::Standings),
        (_, Char('2'), _) => tab(&mut guard, MenuItem::Fixtures),
        (_, Char('3'), _) => tab(&mut guard, MenuItem::Admin),
        (_, Char('?'), _) => tab(&mut guard, MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => {
            guard.exit_help();
            None
        }

        // Group cycling
        (_, Char('g') | KeyCode::Right, KeyModifiers::NONE) => {
            guard.next_group();
            None
        }
        (_, Char('G'), _) | (_, KeyCode::Left, _) => {
            guard.prev_group();
            None
        }

        // Admin navigation
        (MenuItem::Admin, Char('j') | KeyCode::Down, _) => {
            guard.team_down();
            None
        }
        (MenuItem::Admin, Char('k') | KeyCode::Up, _) => {
            guard.team_up();
            None
        }
        (MenuItem::Admin | MenuItem::Fixtures, Char('J'), _) => {
            guard.fixture_down();
            None
        }
        (MenuItem::Admin | MenuItem::Fixtures, Char('K'), _) => {
            guard.fixture_up();
            None
        }

        // Roster
        (MenuItem::Admin, Char('a'), _) => {
            guard.open_add_team();
            None
        }
        (MenuItem::Admin, Char('e'), _) => {
            guard.open_rename_team();
            None
        }
        (MenuItem::Admin, Char('x'), _) => {
            guard.open_remove_team();
            None
        }
        (MenuItem::Admin, Char('w'), _) => guard.adjust_selected(StatAdjustment::Win),
        (MenuItem::Admin, Char('d'), _) => guard.adjust_selected(StatAdjustment::Draw),
        (MenuItem::Admin, Char('l'), _) => guard.adjust_selected(StatAdjustment::Loss),
        (MenuItem::Admin, Char('+'), _) => guard.adjust_selected(StatAdjustment::GoalFor),
        (MenuItem::Admin, Char('-'), _) => guard.adjust_selected(StatAdjustment::GoalAgainst),
        (MenuItem::Admin, Char('r'), _) => {
            guard.open_record_result();
            None
        }

        // Fixtures
        (MenuItem::Admin, Char('m'), _) => {
            guard.open_add_match();
            None
        }
        (MenuItem::Admin, Char('s'), _) => {
            guard.open_save_score();
            None
        }
        (MenuItem::Admin, Char('D'), _) => {
            guard.open_delete_match();
            None
        }

        // History and session
        (MenuItem::Admin, Char('u'), _) => guard.undo(),
        (MenuItem::Admin, Char('R'), _) => {
            guard.open_reset();
            None
        }
        (_, Char('i'), _) => {
            guard.open_sign_in();
            None
        }
        (_, Char('o'), _) => guard.sign_out(),

        // Global
        (_, Char('f'), _) => {
            guard.toggle_full_screen();
            None
        }
        (_, Char('"'), _) => {
            guard.toggle_show_logs();
            None
        }

        _ => None,
    };

    drop(guard);
    send(network_requests, request).await;
}

fn tab(app: &mut App, item: MenuItem) -> Option<NetworkRequest> {
    app.update_tab(item);
    None
}

async fn send(network_requests: &mpsc::Sender<NetworkRequest>, request: Option<NetworkRequest>) {
    if let Some(request) = request {
        let _ = network_requests.send(request).await;
    }
}

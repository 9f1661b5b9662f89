//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use carebridge_core::Route;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_email_char, can_add_name_char, can_add_password_char, App, AppState, LoginFocus,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => {
            handle_login_input(app, key);
            Ok(false)
        }
        AppState::ShowingHelp => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                app.state = AppState::Normal;
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                Ok(true)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
                Ok(false)
            }
            _ => Ok(false),
        },
        AppState::Normal => {
            handle_normal_input(app, key);
            Ok(false)
        }
        AppState::Quitting => Ok(true),
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    // Page-specific keys first
    if app.current_route == Route::Patients && app.session.is_authenticated() {
        match key.code {
            KeyCode::Char('a') => return app.add_demo_patient(),
            KeyCode::Char('d') | KeyCode::Delete => return app.remove_selected_patient(),
            KeyCode::Down | KeyCode::Char('j') => return app.select_next_patient(),
            KeyCode::Up | KeyCode::Char('k') => return app.select_prev_patient(),
            _ => {}
        }
    }

    if let KeyCode::Char(c) = key.code {
        if let Some(index) = nav_index(app, c) {
            return app.navigate_nav(index);
        }
    }

    match key.code {
        KeyCode::Char('h') => app.navigate(Route::Home),
        KeyCode::Char('p') => app.navigate(Route::Profile),
        KeyCode::Char('s') => app.navigate(Route::Settings),
        KeyCode::Char('l') => app.navigate(Route::Login),
        KeyCode::Char('o') => app.logout(),
        KeyCode::Char('n') => app.notify_test(),
        KeyCode::Char('x') => app.dismiss_latest(),
        KeyCode::Char('c') => app.clear_notifications(),
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        _ => {}
    }
}

/// Header link index for a digit key, if that link exists
fn nav_index(app: &App, c: char) -> Option<usize> {
    let index = (c.to_digit(10)? as usize).checked_sub(1)?;
    (index < app.nav_items().len()).then_some(index)
}

fn handle_login_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_login(),
        KeyCode::Tab | KeyCode::Down => app.login_focus = app.login_focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.login_focus = app.login_focus.prev(),
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Button | LoginFocus::Password => app.submit_login(),
            LoginFocus::Name | LoginFocus::Email => app.login_focus = app.login_focus.next(),
        },
        KeyCode::Backspace => {
            match app.login_focus {
                LoginFocus::Name => app.login_name.pop(),
                LoginFocus::Email => app.login_email.pop(),
                LoginFocus::Password => app.login_password.pop(),
                LoginFocus::Button => None,
            };
        }
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Name if can_add_name_char(app.login_name.chars().count(), c) => {
                app.login_name.push(c);
            }
            LoginFocus::Email if can_add_email_char(app.login_email.chars().count(), c) => {
                app.login_email.push(c);
            }
            LoginFocus::Password
                if can_add_password_char(app.login_password.chars().count(), c) =>
            {
                app.login_password.push(c);
            }
            _ => {}
        },
        _ => {}
    }
}

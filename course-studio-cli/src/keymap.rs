use crate::state::{Action, FieldEdit};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Apply(Action),
}

pub fn command_for(event: &Event) -> Option<Command> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => key_command(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(Command::Apply(Action::ScrollUp(3))),
            MouseEventKind::ScrollDown => Some(Command::Apply(Action::ScrollDown(3))),
            _ => None,
        },
        _ => None,
    }
}

fn key_command(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') => Some(Command::Quit),
            KeyCode::Char('n') => Some(Command::Apply(Action::NextOperation)),
            KeyCode::Char('p') => Some(Command::Apply(Action::PreviousOperation)),
            KeyCode::Char('b') => Some(Command::Apply(Action::ToggleSidebar)),
            _ => None,
        };
    }

    if key.modifiers.contains(KeyModifiers::SHIFT) {
        let history = match key.code {
            KeyCode::Up => Some(Action::HistoryScrollUp(1)),
            KeyCode::Down => Some(Action::HistoryScrollDown(1)),
            KeyCode::PageUp => Some(Action::HistoryScrollUp(10)),
            KeyCode::PageDown => Some(Action::HistoryScrollDown(10)),
            _ => None,
        };
        if let Some(action) = history {
            return Some(Command::Apply(action));
        }
    }

    let action = match key.code {
        KeyCode::Char(c) => Action::Edit(FieldEdit::Insert(c)),
        KeyCode::Backspace => Action::Edit(FieldEdit::Backspace),
        KeyCode::Esc => Action::Edit(FieldEdit::Clear),
        KeyCode::Tab => Action::FocusNext,
        KeyCode::BackTab => Action::FocusPrevious,
        KeyCode::Enter => Action::SubmitStart,
        KeyCode::Up => Action::ScrollUp(1),
        KeyCode::Down => Action::ScrollDown(1),
        KeyCode::PageUp => Action::ScrollUp(10),
        KeyCode::PageDown => Action::ScrollDown(10),
        _ => return None,
    };
    Some(Command::Apply(action))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
        command_for(&Event::Key(KeyEvent::new(code, modifiers)))
    }

    #[test]
    fn control_chords_are_commands_not_text() {
        assert_eq!(press(KeyCode::Char('q'), KeyModifiers::CONTROL), Some(Command::Quit));
        assert_eq!(
            press(KeyCode::Char('b'), KeyModifiers::CONTROL),
            Some(Command::Apply(Action::ToggleSidebar))
        );
        assert_eq!(press(KeyCode::Char('x'), KeyModifiers::CONTROL), None);
    }

    #[test]
    fn plain_keys_edit_and_submit() {
        assert_eq!(
            press(KeyCode::Char('Q'), KeyModifiers::SHIFT),
            Some(Command::Apply(Action::Edit(FieldEdit::Insert('Q'))))
        );
        assert_eq!(
            press(KeyCode::Enter, KeyModifiers::NONE),
            Some(Command::Apply(Action::SubmitStart))
        );
        assert_eq!(
            press(KeyCode::BackTab, KeyModifiers::SHIFT),
            Some(Command::Apply(Action::FocusPrevious))
        );
    }

    #[test]
    fn shifted_scroll_keys_move_history() {
        assert_eq!(
            press(KeyCode::Up, KeyModifiers::SHIFT),
            Some(Command::Apply(Action::HistoryScrollUp(1)))
        );
        assert_eq!(
            press(KeyCode::PageDown, KeyModifiers::SHIFT),
            Some(Command::Apply(Action::HistoryScrollDown(10)))
        );
        assert_eq!(
            press(KeyCode::Up, KeyModifiers::NONE),
            Some(Command::Apply(Action::ScrollUp(1)))
        );
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut release = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(command_for(&Event::Key(release)), None);
    }
}

//! Small modal input forms for admin actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use groupstage_core::TeamId;

/// What a submitted form is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    AddTeam,
    RenameTeam { id: TeamId },
    AddMatch,
    SaveScore { id: String },
    RecordResult,
    SignIn,
    Confirm(ConfirmAction),
}

/// Destructive actions that need an explicit yes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    RemoveTeam { id: TeamId, name: String },
    DeleteMatch { id: String, label: String },
    Reset,
}

impl ConfirmAction {
    pub fn question(&self) -> String {
        match self {
            ConfirmAction::RemoveTeam { name, .. } => format!("Remove {name}?"),
            ConfirmAction::DeleteMatch { label, .. } => format!("Delete {label}?"),
            ConfirmAction::Reset => "Reset the whole tournament? This clears all teams and undo history.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: String,
    pub value: String,
    pub secret: bool,
}

impl Field {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: String::new(),
            secret: false,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn display_value(&self) -> String {
        if self.secret {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    Pending,
    Cancelled,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub title: String,
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Prompt {
    fn new(kind: PromptKind, title: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            kind,
            title: title.into(),
            fields,
            focus: 0,
        }
    }

    pub fn add_team(group_label: &str) -> Self {
        Self::new(PromptKind::AddTeam, format!("Add team to {group_label}"), vec![Field::new("Name")])
    }

    pub fn rename_team(id: TeamId, current: &str) -> Self {
        Self::new(
            PromptKind::RenameTeam { id },
            format!("Rename {current}"),
            vec![Field::new("New name").with_value(current)],
        )
    }

    pub fn add_match(group_label: &str, team_a: &str) -> Self {
        Self::new(
            PromptKind::AddMatch,
            format!("New fixture in {group_label}"),
            vec![
                Field::new("Team A").with_value(team_a),
                Field::new("Team B"),
                Field::new("Kick-off (2026-06-14T15:00)"),
                Field::new("Pitch"),
            ],
        )
    }

    pub fn save_score(id: String, team_a: &str, team_b: &str) -> Self {
        Self::new(
            PromptKind::SaveScore { id },
            format!("{team_a} v {team_b}"),
            vec![Field::new(team_a), Field::new(team_b)],
        )
    }

    pub fn record_result(group_label: &str, team_a: &str) -> Self {
        Self::new(
            PromptKind::RecordResult,
            format!("Record a result in {group_label}"),
            vec![
                Field::new("Team A").with_value(team_a),
                Field::new("Team B"),
                Field::new("Score A"),
                Field::new("Score B"),
            ],
        )
    }

    pub fn sign_in() -> Self {
        Self::new(
            PromptKind::SignIn,
            "Admin sign-in",
            vec![Field::new("Email"), Field::new("Password").secret()],
        )
    }

    pub fn confirm(action: ConfirmAction) -> Self {
        let title = action.question();
        Self::new(PromptKind::Confirm(action), title, Vec::new())
    }

    pub fn is_confirm(&self) -> bool {
        matches!(self.kind, PromptKind::Confirm(_))
    }

    /// Field value by position, empty when the form has fewer fields.
    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or_default()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptInput {
        if self.is_confirm() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => PromptInput::Submitted,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => PromptInput::Cancelled,
                _ => PromptInput::Pending,
            };
        }

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return PromptInput::Cancelled,
            (KeyCode::Enter, _) => {
                if self.focus + 1 < self.fields.len() {
                    self.focus += 1;
                } else {
                    return PromptInput::Submitted;
                }
            }
            (KeyCode::Tab | KeyCode::Down, _) => {
                if !self.fields.is_empty() {
                    self.focus = (self.focus + 1) % self.fields.len();
                }
            }
            (KeyCode::BackTab | KeyCode::Up, _) => {
                if !self.fields.is_empty() {
                    self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
                }
            }
            (KeyCode::Backspace, _) => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.pop();
                }
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.clear();
                }
            }
            (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.push(c);
                }
            }
            _ => {}
        }
        PromptInput::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(prompt: &mut Prompt, text: &str) {
        for c in text.chars() {
            assert_eq!(prompt.handle_key(key(KeyCode::Char(c))), PromptInput::Pending);
        }
    }

    #[test]
    fn enter_walks_fields_then_submits() {
        let mut prompt = Prompt::sign_in();
        type_text(&mut prompt, "admin@example.com");
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), PromptInput::Pending);
        type_text(&mut prompt, "pw");
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), PromptInput::Submitted);
        assert_eq!(prompt.value(0), "admin@example.com");
        assert_eq!(prompt.value(1), "pw");
        assert_eq!(prompt.fields[1].display_value(), "**");
    }

    #[test]
    fn editing_keys_change_only_the_focused_field() {
        let mut prompt = Prompt::add_match("Group A", "Lions");
        prompt.handle_key(key(KeyCode::Backspace));
        assert_eq!(prompt.value(0), "Lion");
        prompt.handle_key(key(KeyCode::BackTab));
        assert_eq!(prompt.focus, 3);
        type_text(&mut prompt, "North");
        prompt.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(prompt.value(3), "");
        assert_eq!(prompt.value(9), "");
    }

    #[test]
    fn confirmation_accepts_only_yes() {
        let mut prompt = Prompt::confirm(ConfirmAction::Reset);
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), PromptInput::Pending);
        assert_eq!(prompt.handle_key(key(KeyCode::Char('y'))), PromptInput::Submitted);
        assert_eq!(prompt.handle_key(key(KeyCode::Char('n'))), PromptInput::Cancelled);
    }

    #[test]
    fn escape_cancels_forms() {
        let mut prompt = Prompt::rename_team(TeamId::from("A0"), "Lions");
        assert_eq!(prompt.value(0), "Lions");
        assert_eq!(prompt.handle_key(key(KeyCode::Esc)), PromptInput::Cancelled);
    }
}

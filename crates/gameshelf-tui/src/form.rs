//! Editable form overlay state.
//!
//! Every dialog other than login (register, review, play, profile, user
//! edit, game editor) is a list of fields edited the same way. The overlay
//! only tracks raw input; turning it into a request is done by the
//! matching `gameshelf_core::forms` type.

use gameshelf_core::forms::{
    parse_list, GameForm, PlayForm, ProfileForm, RegisterForm, ReviewForm, UserEditForm,
    PLAY_DURATIONS,
};
use gameshelf_core::models::{Game, User};
use gameshelf_core::Identity;

/// Maximum length for single-line text input
const MAX_TEXT_LENGTH: usize = 200;

/// Maximum length for free text (descriptions, comments)
const MAX_LONG_TEXT_LENGTH: usize = 2000;

const RATING_OPTIONS: &[&str] = &["none", "1", "2", "3", "4", "5"];
const TRI_STATE_OPTIONS: &[&str] = &["unset", "yes", "no"];

/// What submitting the form does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    Register,
    Review { game_id: String },
    Play { game_id: String },
    Profile,
    UserEdit { user_id: String },
    /// `None` creates a new game
    GameEditor { game_id: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text { value: String, long: bool },
    Secret(String),
    Toggle(bool),
    Choice { options: Vec<String>, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: FieldValue,
}

impl FormField {
    fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: FieldValue::Text {
                value: value.into(),
                long: false,
            },
        }
    }

    fn long_text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: FieldValue::Text {
                value: value.into(),
                long: true,
            },
        }
    }

    fn secret(label: &'static str) -> Self {
        Self {
            label,
            value: FieldValue::Secret(String::new()),
        }
    }

    fn toggle(label: &'static str, on: bool) -> Self {
        Self {
            label,
            value: FieldValue::Toggle(on),
        }
    }

    fn choice(label: &'static str, options: &[&str], index: usize) -> Self {
        Self {
            label,
            value: FieldValue::Choice {
                options: options.iter().map(|o| o.to_string()).collect(),
                index,
            },
        }
    }

    /// Text shown in the overlay; secrets are masked
    pub fn display(&self) -> String {
        match &self.value {
            FieldValue::Text { value, .. } => value.clone(),
            FieldValue::Secret(value) => "*".repeat(value.chars().count()),
            FieldValue::Toggle(on) => (if *on { "[x]" } else { "[ ]" }).to_string(),
            FieldValue::Choice { options, index } => options
                .get(*index)
                .map(|o| format!("< {} >", o))
                .unwrap_or_default(),
        }
    }

    pub fn is_editable_text(&self) -> bool {
        matches!(self.value, FieldValue::Text { .. } | FieldValue::Secret(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOverlay {
    pub kind: FormKind,
    pub title: String,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
    /// Set when reviews have comments switched off
    comments_disabled: bool,
}

impl FormOverlay {
    fn new(kind: FormKind, title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            title: title.into(),
            fields,
            focus: 0,
            error: None,
            comments_disabled: false,
        }
    }

    pub fn register(email: &str) -> Self {
        Self::new(
            FormKind::Register,
            "Create Account",
            vec![
                FormField::text("Name", ""),
                FormField::text("Email", email),
                FormField::secret("Password"),
                FormField::secret("Confirm"),
            ],
        )
    }

    pub fn review(game: &Game) -> Self {
        let mut fields = vec![FormField::choice("Rating", RATING_OPTIONS, 0)];
        if !game.disable_commenting {
            fields.push(FormField::long_text("Comment", ""));
        }
        let mut form = Self::new(
            FormKind::Review {
                game_id: game.id.clone(),
            },
            format!("Review {}", game.name),
            fields,
        );
        form.comments_disabled = game.disable_commenting;
        form
    }

    pub fn play(game: &Game) -> Self {
        let options: Vec<String> = PLAY_DURATIONS.iter().map(|m| format!("{} min", m)).collect();
        let options: Vec<&str> = options.iter().map(String::as_str).collect();
        Self::new(
            FormKind::Play {
                game_id: game.id.clone(),
            },
            format!("Play {}", game.name),
            vec![FormField::choice("Duration", &options, 0)],
        )
    }

    pub fn profile(identity: &Identity) -> Self {
        Self::new(
            FormKind::Profile,
            "Edit Profile",
            vec![
                FormField::text("Name", identity.name.clone()),
                FormField::text("Email", identity.email.clone()),
                FormField::secret("New password"),
                FormField::secret("Confirm"),
            ],
        )
    }

    pub fn user_edit(user: &User) -> Self {
        Self::new(
            FormKind::UserEdit {
                user_id: user.id.clone(),
            },
            format!("Edit {}", user.name),
            vec![
                FormField::text("Name", user.name.clone()),
                FormField::text("Email", user.email.clone()),
                FormField::toggle("Admin", user.is_admin),
            ],
        )
    }

    pub fn game_editor(game: Option<&Game>) -> Self {
        let form = game.map(GameForm::from_game).unwrap_or_default();
        let tri_state = |value: Option<bool>| match value {
            None => 0,
            Some(true) => 1,
            Some(false) => 2,
        };
        let title = match game {
            Some(g) => format!("Edit {}", g.name),
            None => "New Game".to_string(),
        };
        Self::new(
            FormKind::GameEditor {
                game_id: game.map(|g| g.id.clone()),
            },
            title,
            vec![
                FormField::text("Name", form.name),
                FormField::text("Image", form.image),
                FormField::text("Brand", form.brand),
                FormField::text("Categories", form.categories.join(", ")),
                FormField::long_text("Description", form.description),
                FormField::toggle("Disable rating", form.disable_rating),
                FormField::toggle("Disable comments", form.disable_commenting),
                FormField::text("Release date", form.release_date),
                FormField::text("Developer", form.developer),
                FormField::text("Platforms", form.platforms.join(", ")),
                FormField::choice("Voice acting", TRI_STATE_OPTIONS, tri_state(form.voice_acting)),
                FormField::choice(
                    "Soundtrack",
                    TRI_STATE_OPTIONS,
                    tri_state(form.soundtrack_included),
                ),
            ],
        )
    }

    // ===== Editing =====

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn input_char(&mut self, c: char) {
        if c.is_control() {
            return;
        }
        self.error = None;
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match &mut field.value {
            FieldValue::Text { value, long } => {
                let max = if *long { MAX_LONG_TEXT_LENGTH } else { MAX_TEXT_LENGTH };
                if value.chars().count() < max {
                    value.push(c);
                }
            }
            FieldValue::Secret(value) => {
                if value.chars().count() < MAX_TEXT_LENGTH {
                    value.push(c);
                }
            }
            FieldValue::Toggle(on) if c == ' ' => *on = !*on,
            FieldValue::Choice { options, index } if c == ' ' && !options.is_empty() => {
                *index = (*index + 1) % options.len();
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        self.error = None;
        if let Some(field) = self.fields.get_mut(self.focus) {
            match &mut field.value {
                FieldValue::Text { value, .. } | FieldValue::Secret(value) => {
                    value.pop();
                }
                _ => {}
            }
        }
    }

    /// Step a choice or flip a toggle on the focused field
    pub fn cycle(&mut self, forward: bool) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            match &mut field.value {
                FieldValue::Choice { options, index } if !options.is_empty() => {
                    *index = if forward {
                        (*index + 1) % options.len()
                    } else {
                        (*index + options.len() - 1) % options.len()
                    };
                }
                FieldValue::Toggle(on) => *on = !*on,
                _ => {}
            }
        }
    }

    // ===== Reading =====

    fn field(&self, label: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.label == label).map(|f| &f.value)
    }

    fn text(&self, label: &str) -> String {
        match self.field(label) {
            Some(FieldValue::Text { value, .. }) | Some(FieldValue::Secret(value)) => value.clone(),
            _ => String::new(),
        }
    }

    fn toggle_value(&self, label: &str) -> bool {
        matches!(self.field(label), Some(FieldValue::Toggle(true)))
    }

    fn choice_index(&self, label: &str) -> usize {
        match self.field(label) {
            Some(FieldValue::Choice { index, .. }) => *index,
            _ => 0,
        }
    }

    fn tri_state(&self, label: &str) -> Option<bool> {
        match self.choice_index(label) {
            1 => Some(true),
            2 => Some(false),
            _ => None,
        }
    }

    pub fn register_form(&self) -> RegisterForm {
        RegisterForm {
            name: self.text("Name"),
            email: self.text("Email"),
            password: self.text("Password"),
            confirm_password: self.text("Confirm"),
        }
    }

    pub fn review_form(&self) -> ReviewForm {
        let rating = self.choice_index("Rating");
        ReviewForm {
            rating: (rating > 0).then_some(rating as u8),
            comment: self.text("Comment"),
            comments_disabled: self.comments_disabled,
        }
    }

    pub fn play_form(&self) -> PlayForm {
        let index = self.choice_index("Duration");
        PlayForm {
            minutes: PLAY_DURATIONS.get(index).copied().unwrap_or(PLAY_DURATIONS[0]),
        }
    }

    pub fn profile_form(&self) -> ProfileForm {
        ProfileForm {
            name: self.text("Name"),
            email: self.text("Email"),
            password: self.text("New password"),
            confirm_password: self.text("Confirm"),
        }
    }

    pub fn user_edit_form(&self) -> UserEditForm {
        UserEditForm {
            name: self.text("Name"),
            email: self.text("Email"),
            is_admin: self.toggle_value("Admin"),
        }
    }

    pub fn game_form(&self) -> GameForm {
        GameForm {
            name: self.text("Name"),
            image: self.text("Image"),
            brand: self.text("Brand"),
            categories: parse_list(&self.text("Categories")),
            description: self.text("Description"),
            disable_rating: self.toggle_value("Disable rating"),
            disable_commenting: self.toggle_value("Disable comments"),
            release_date: self.text("Release date"),
            developer: self.text("Developer"),
            platforms: parse_list(&self.text("Platforms")),
            voice_acting: self.tri_state("Voice acting"),
            soundtrack_included: self.tri_state("Soundtrack"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(disable_commenting: bool) -> Game {
        serde_json::from_value(serde_json::json!({
            "_id": "g1",
            "name": "Celeste",
            "brand": "EXOK",
            "category": ["Platformer", "Indie"],
            "description": "Climb.",
            "image": "https://img/c.png",
            "disableCommenting": disable_commenting,
            "voiceActing": false
        }))
        .unwrap()
    }

    fn type_text(form: &mut FormOverlay, text: &str) {
        for c in text.chars() {
            form.input_char(c);
        }
    }

    #[test]
    fn test_register_form_fields() {
        let mut form = FormOverlay::register("ann@example.com");
        type_text(&mut form, "Ann");
        form.focus = 2;
        type_text(&mut form, "pw");
        form.focus_next();
        type_text(&mut form, "pw");

        let request = form.register_form().validate().unwrap();
        assert_eq!(request.name, "Ann");
        assert_eq!(request.email, "ann@example.com");
        assert_eq!(form.fields[2].display(), "**");
    }

    #[test]
    fn test_review_form_without_comments() {
        let mut form = FormOverlay::review(&game(true));
        assert_eq!(form.fields.len(), 1);
        assert!(form.review_form().validate().is_err());

        form.cycle(true);
        form.cycle(true);
        let review = form.review_form().validate().unwrap();
        assert_eq!(review.rating, Some(2));
        assert_eq!(review.comment, None);
    }

    #[test]
    fn test_play_form_choice() {
        let mut form = FormOverlay::play(&game(false));
        form.cycle(false);
        assert_eq!(form.play_form().minutes, 120);
        assert_eq!(form.fields[0].display(), "< 120 min >");
    }

    #[test]
    fn test_game_editor_round_trips_game() {
        let form = FormOverlay::game_editor(Some(&game(false)));
        assert_eq!(
            form.kind,
            FormKind::GameEditor {
                game_id: Some("g1".to_string())
            }
        );
        let data = form.game_form().validate().unwrap();
        assert_eq!(data.category, vec!["Platformer", "Indie"]);
        assert_eq!(data.voice_acting, Some(false));
        assert_eq!(data.soundtrack_included, None);
    }

    #[test]
    fn test_toggle_with_space_and_backspace_on_text() {
        let user: User = serde_json::from_str(
            r#"{"_id": "u2", "name": "Bo", "email": "bo@example.com"}"#,
        )
        .unwrap();
        let mut form = FormOverlay::user_edit(&user);
        form.backspace();
        assert_eq!(form.user_edit_form().name, "B");

        form.focus_prev();
        assert_eq!(form.focused().unwrap().label, "Admin");
        form.input_char(' ');
        assert!(form.user_edit_form().is_admin);
    }

    #[test]
    fn test_control_chars_ignored() {
        let mut form = FormOverlay::register("");
        form.input_char('\n');
        assert_eq!(form.register_form().name, "");
    }
}

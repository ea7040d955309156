//! Form state and validation for every input screen.
//!
//! Each form holds the raw field text as typed and turns it into the
//! request body the API expects, or a [`FormError`] describing the first
//! problem found.

use std::path::Path;

use base64::Engine;
use thiserror::Error;

use crate::models::{
    Game, GameFormData, LoginRequest, PlayRequest, ProfileUpdate, RegisterRequest, ReviewRequest,
    User, UserUpdate,
};
use crate::utils::format::non_blank;

/// Durations offered when logging a play session, in minutes
pub const PLAY_DURATIONS: [u32; 4] = [15, 30, 60, 120];

/// Most categories a game may carry
pub const MAX_CATEGORIES: usize = 5;

/// Largest image accepted for upload
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Name, email and password are required")]
    MissingRegistrationFields,

    #[error("Name and email are required")]
    MissingProfileFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,

    #[error("Please provide a rating")]
    RatingRequired,

    #[error("Please provide either a rating or a comment")]
    RatingOrCommentRequired,

    #[error("Play time must be one of 15, 30, 60 or 120 minutes")]
    InvalidPlayDuration,

    #[error("Game name is required")]
    GameNameRequired,

    #[error("Game image is required")]
    GameImageRequired,

    #[error("Developer name is required")]
    BrandRequired,

    #[error("Game description is required")]
    DescriptionRequired,

    #[error("At least one category is required")]
    CategoryRequired,

    #[error("A game can have at most 5 categories")]
    TooManyCategories,

    #[error("Please upload a JPG or PNG image only")]
    UnsupportedImage,

    #[error("Image size should be less than 5MB")]
    ImageTooLarge,

    #[error("Failed to process the image")]
    ImageUnreadable,
}

// ============================================================================
// Account forms
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, FormError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(FormError::MissingCredentials);
        }
        Ok(LoginRequest {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, FormError> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(FormError::MissingRegistrationFields);
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Ok(RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl ProfileForm {
    /// Prefill from the signed-in user; password fields start empty
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<ProfileUpdate, FormError> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(FormError::MissingProfileFields);
        }
        if !self.password.is_empty() && self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Ok(ProfileUpdate {
            name: name.to_string(),
            email: email.to_string(),
            password: (!self.password.is_empty()).then(|| self.password.clone()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserEditForm {
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl UserEditForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }

    pub fn validate(&self) -> Result<UserUpdate, FormError> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(FormError::MissingProfileFields);
        }
        Ok(UserUpdate {
            name: name.to_string(),
            email: email.to_string(),
            is_admin: self.is_admin,
        })
    }
}

// ============================================================================
// Game interaction forms
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewForm {
    pub rating: Option<u8>,
    pub comment: String,
    pub comments_disabled: bool,
}

impl ReviewForm {
    pub fn validate(&self) -> Result<ReviewRequest, FormError> {
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(FormError::RatingOutOfRange);
            }
        }
        let comment = if self.comments_disabled {
            None
        } else {
            non_blank(&self.comment)
        };
        if self.rating.is_none() && comment.is_none() {
            return Err(if self.comments_disabled {
                FormError::RatingRequired
            } else {
                FormError::RatingOrCommentRequired
            });
        }
        Ok(ReviewRequest {
            rating: self.rating,
            comment,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayForm {
    pub minutes: u32,
}

impl Default for PlayForm {
    fn default() -> Self {
        Self {
            minutes: PLAY_DURATIONS[0],
        }
    }
}

impl PlayForm {
    /// Step to the next offered duration, wrapping around
    pub fn cycle(&mut self) {
        let index = PLAY_DURATIONS
            .iter()
            .position(|&m| m == self.minutes)
            .map(|i| (i + 1) % PLAY_DURATIONS.len())
            .unwrap_or(0);
        self.minutes = PLAY_DURATIONS[index];
    }

    pub fn validate(&self) -> Result<PlayRequest, FormError> {
        if !PLAY_DURATIONS.contains(&self.minutes) {
            return Err(FormError::InvalidPlayDuration);
        }
        Ok(PlayRequest { time: self.minutes })
    }
}

// ============================================================================
// Game editor
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameForm {
    pub name: String,
    /// URL, data URL, or path to a local JPG/PNG
    pub image: String,
    pub brand: String,
    pub categories: Vec<String>,
    pub description: String,
    pub disable_rating: bool,
    pub disable_commenting: bool,
    pub release_date: String,
    pub developer: String,
    pub platforms: Vec<String>,
    pub voice_acting: Option<bool>,
    pub soundtrack_included: Option<bool>,
}

impl GameForm {
    pub fn from_game(game: &Game) -> Self {
        Self {
            name: game.name.clone(),
            image: game.image.clone(),
            brand: game.brand.clone(),
            categories: game.category.clone(),
            description: game.description.clone(),
            disable_rating: game.disable_rating,
            disable_commenting: game.disable_commenting,
            release_date: game.release_date.clone().unwrap_or_default(),
            developer: game.developer.clone().unwrap_or_default(),
            platforms: game.platform.clone(),
            voice_acting: game.voice_acting,
            soundtrack_included: game.soundtrack_included,
        }
    }

    pub fn validate(&self) -> Result<GameFormData, FormError> {
        let name = non_blank(&self.name).ok_or(FormError::GameNameRequired)?;
        let image = non_blank(&self.image).ok_or(FormError::GameImageRequired)?;
        let brand = non_blank(&self.brand).ok_or(FormError::BrandRequired)?;
        let description = non_blank(&self.description).ok_or(FormError::DescriptionRequired)?;

        let categories: Vec<String> = self.categories.iter().filter_map(|c| non_blank(c)).collect();
        if categories.is_empty() {
            return Err(FormError::CategoryRequired);
        }
        if categories.len() > MAX_CATEGORIES {
            return Err(FormError::TooManyCategories);
        }

        Ok(GameFormData {
            name,
            image: resolve_image(&image)?,
            brand,
            category: categories,
            description,
            disable_rating: self.disable_rating,
            disable_commenting: self.disable_commenting,
            release_date: non_blank(&self.release_date),
            developer: non_blank(&self.developer),
            platform: self.platforms.iter().filter_map(|p| non_blank(p)).collect(),
            voice_acting: self.voice_acting,
            soundtrack_included: self.soundtrack_included,
        })
    }
}

/// Split comma-separated input into trimmed, non-empty entries
pub fn parse_list(input: &str) -> Vec<String> {
    input.split(',').filter_map(non_blank).collect()
}

/// Remote and inline images pass through; anything else is read from disk
pub fn resolve_image(value: &str) -> Result<String, FormError> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") || value.starts_with("data:")
    {
        Ok(value.to_string())
    } else {
        encode_image(Path::new(value))
    }
}

/// Read a local JPG or PNG and return it as a base64 data URL
pub fn encode_image(path: &Path) -> Result<String, FormError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(FormError::UnsupportedImage)?;
    let mime = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => return Err(FormError::UnsupportedImage),
    };

    let metadata = std::fs::metadata(path).map_err(|_| FormError::ImageUnreadable)?;
    if metadata.len() > MAX_IMAGE_BYTES {
        return Err(FormError::ImageTooLarge);
    }

    let bytes = std::fs::read(path).map_err(|_| FormError::ImageUnreadable)?;
    let magic_ok = match mime {
        "image/png" => bytes.starts_with(PNG_MAGIC),
        _ => bytes.starts_with(JPEG_MAGIC),
    };
    if !magic_ok {
        return Err(FormError::UnsupportedImage);
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:{};base64,{}", mime, encoded))
}

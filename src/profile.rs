//! Public profile view and self-service profile edits.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ContentConfig;
use crate::content::posts::posts_by_user;
use crate::content::StoreError;
use crate::db::models::{Post, User};
use crate::error::AppError;

pub const DEFAULT_AVATAR: &str = "👤";
pub const MAX_BIO_CHARS: usize = 300;
pub const MAX_AVATAR_CHARS: usize = 16;
const IMAGE_PREFIX: &str = "data:image/";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("User not found")]
    NotFound,

    #[error("Bio must be at most 300 characters")]
    BioTooLong,

    #[error("Avatar must be at most 16 characters")]
    AvatarTooLong,

    #[error("Profile image must be a data:image/ URI")]
    InvalidImage,

    #[error("Profile image must be at most {0} bytes")]
    ImageTooLarge(usize),

    #[error("Send either a new profile image or remove_image, not both")]
    ConflictingImageChange,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound => AppError::NotFound(err.to_string()),
            ProfileError::Store(e) => e.into(),
            ProfileError::Sql(e) => AppError::Database(e),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub avatar: String,
    pub profile_image: Option<String>,
    pub total_posts: i64,
    pub total_comments: i64,
    pub created_at: String,
    pub posts: Vec<Post>,
}

/// Partial profile edit. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub profile_image: Option<String>,
    #[serde(default)]
    pub remove_image: bool,
}

pub fn get_profile(conn: &Connection, username: &str) -> Result<ProfileView, ProfileError> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE username = ?1", User::COLUMNS),
            params![username],
            User::from_row,
        )
        .optional()?
        .ok_or(ProfileError::NotFound)?;

    let posts = posts_by_user(conn, &user.id)?;

    Ok(ProfileView {
        username: user.username,
        full_name: user.full_name,
        bio: user.bio,
        avatar: user.avatar,
        profile_image: user.profile_image,
        total_posts: user.total_posts,
        total_comments: user.total_comments,
        created_at: user.created_at,
        posts,
    })
}

pub fn update_profile(
    conn: &Connection,
    user_id: &str,
    update: ProfileUpdate,
    limits: &ContentConfig,
) -> Result<(), ProfileError> {
    let bio = match update.bio {
        Some(bio) => {
            let bio = bio.trim().to_string();
            if bio.chars().count() > MAX_BIO_CHARS {
                return Err(ProfileError::BioTooLong);
            }
            Some(bio)
        }
        None => None,
    };

    // A blank glyph is treated as "no change".
    let avatar = match update.avatar.as_deref().map(str::trim) {
        Some(a) if !a.is_empty() => {
            if a.chars().count() > MAX_AVATAR_CHARS {
                return Err(ProfileError::AvatarTooLong);
            }
            Some(a.to_string())
        }
        _ => None,
    };

    let image = match update.profile_image {
        Some(img) if !img.is_empty() => {
            if !img.starts_with(IMAGE_PREFIX) {
                return Err(ProfileError::InvalidImage);
            }
            if img.len() > limits.max_profile_image_bytes {
                return Err(ProfileError::ImageTooLarge(limits.max_profile_image_bytes));
            }
            Some(img)
        }
        _ => None,
    };

    if image.is_some() && update.remove_image {
        return Err(ProfileError::ConflictingImageChange);
    }

    crate::db::atomic(conn, |conn| {
        let (current_bio, current_avatar, current_image): (String, String, Option<String>) = conn
            .query_row(
                "SELECT bio, avatar, profile_image FROM users WHERE id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or(ProfileError::NotFound)?;

        let new_bio = bio.unwrap_or(current_bio);
        let supplied_avatar = avatar.is_some();
        let mut new_avatar = avatar.unwrap_or(current_avatar);
        let mut new_image = current_image;

        if let Some(img) = image {
            new_image = Some(img);
            new_avatar = String::new();
        }
        if update.remove_image {
            new_image = None;
            if new_avatar.is_empty() && !supplied_avatar {
                new_avatar = DEFAULT_AVATAR.to_string();
            }
        }

        conn.execute(
            "UPDATE users SET bio = ?1, avatar = ?2, profile_image = ?3 WHERE id = ?4",
            params![new_bio, new_avatar, new_image, user_id],
        )?;
        Ok(())
    })
}

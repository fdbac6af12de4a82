// Postboard
// Copyright 2025 The Postboard Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! High-level data types for the service.

use postboard_core::model::{EmailAddress, ModelError, ModelResult, Username};
use serde::de::Visitor;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

mod passwords;
pub(crate) use passwords::{HashedPassword, Password, PasswordOptions};

/// Maximum length of the optional `name` and `surname` profile fields.
pub(crate) const MAX_NAME_LENGTH: usize = 50;

/// Minimum age a user can claim to have.
pub(crate) const MIN_AGE: i16 = 14;

/// Maximum age a user can claim to have.
pub(crate) const MAX_AGE: i16 = 100;

/// Identifier of a user.  We store this as an `i32` because that's what the serial columns of
/// the PostgreSQL database backend provide.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub(crate) struct UserId(i32);

impl UserId {
    /// Creates an identifier from a trusted `i32` as handed out by the database.
    pub(crate) fn new(id: i32) -> Self {
        Self(id)
    }

    /// Creates an identifier from an `i64` with range validation.  SQLite hands out row
    /// identifiers as 64-bit quantities.
    pub(crate) fn from_i64(id: i64) -> ModelResult<Self> {
        match i32::try_from(id) {
            Ok(id) => Ok(Self(id)),
            Err(e) => Err(ModelError(format!("User id cannot be represented: {}", e))),
        }
    }

    /// Returns the identifier as an `i32`.
    pub(crate) fn as_i32(&self) -> i32 {
        self.0
    }
}

/// Identifier of a post.  Same representation notes as for `UserId`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub(crate) struct PostId(i32);

impl PostId {
    /// Creates an identifier from a trusted `i32` as handed out by the database.
    pub(crate) fn new(id: i32) -> Self {
        Self(id)
    }

    /// Creates an identifier from an `i64` with range validation.
    pub(crate) fn from_i64(id: i64) -> ModelResult<Self> {
        match i32::try_from(id) {
            Ok(id) => Ok(Self(id)),
            Err(e) => Err(ModelError(format!("Post id cannot be represented: {}", e))),
        }
    }

    /// Returns the identifier as an `i32`.
    pub(crate) fn as_i32(&self) -> i32 {
        self.0
    }
}

/// The age of a user, validated to be within the range the service accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct Age(i16);

impl Age {
    /// Creates a new age from an untrusted quantity `age`, making sure it is in range.
    pub(crate) fn new(age: i16) -> ModelResult<Self> {
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            return Err(ModelError(format!(
                "Age must be between {} and {}, got {}",
                MIN_AGE, MAX_AGE, age
            )));
        }
        Ok(Self(age))
    }

    /// Returns the age as an `i16`.
    pub(crate) fn as_i16(&self) -> i16 {
        self.0
    }
}

/// A deserialization visitor for an `Age`.
struct AgeVisitor;

impl Visitor<'_> for AgeVisitor {
    type Value = Age;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("an age in years")
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let v = i16::try_from(v).map_err(|e| E::custom(e.to_string()))?;
        Age::new(v).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let v = i16::try_from(v).map_err(|e| E::custom(e.to_string()))?;
        Age::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Age {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_i64(AgeVisitor)
    }
}

/// Validates one of the optional free-form profile fields.
pub(crate) fn validate_profile_text(field: &'static str, value: &str) -> ModelResult<()> {
    if value.is_empty() {
        return Err(ModelError(format!("{} cannot be empty when provided", field)));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ModelError(format!("{} is too long", field)));
    }
    Ok(())
}

/// A user account as stored in the database.
///
/// The `id`, `email` and `username` fields are immutable after creation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct User {
    /// Identifier assigned by the database at creation time.
    id: UserId,

    /// Unique email address, used as the login identity.
    email: EmailAddress,

    /// Unique public name of the user.
    username: Username,

    /// The user's password in hashed form.
    password: HashedPassword,

    /// Optional first name.
    name: Option<String>,

    /// Optional family name.
    surname: Option<String>,

    /// Optional age.
    age: Option<Age>,

    /// Optional URL path to the user's avatar image.
    avatar: Option<String>,
}

impl User {
    /// Creates a new user with the mandatory fields and no profile details.
    pub(crate) fn new(
        id: UserId,
        email: EmailAddress,
        username: Username,
        password: HashedPassword,
    ) -> Self {
        Self { id, email, username, password, name: None, surname: None, age: None, avatar: None }
    }

    /// Attaches a first name to the user.
    pub(crate) fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Attaches a family name to the user.
    pub(crate) fn with_surname(mut self, surname: String) -> Self {
        self.surname = Some(surname);
        self
    }

    /// Attaches an age to the user.
    pub(crate) fn with_age(mut self, age: Age) -> Self {
        self.age = Some(age);
        self
    }

    /// Attaches an avatar URL path to the user.
    pub(crate) fn with_avatar(mut self, avatar: String) -> Self {
        self.avatar = Some(avatar);
        self
    }

    pub(crate) fn id(&self) -> UserId {
        self.id
    }

    pub(crate) fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub(crate) fn username(&self) -> &Username {
        &self.username
    }

    pub(crate) fn password(&self) -> &HashedPassword {
        &self.password
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn surname(&self) -> Option<&str> {
        self.surname.as_deref()
    }

    pub(crate) fn age(&self) -> Option<Age> {
        self.age
    }

    pub(crate) fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }
}

/// The data required to create a new user account.
///
/// The password travels here in plain text form and is only hashed by the business layer right
/// before insertion, which is why this type must never be logged verbatim.  `Password` takes
/// care of scrubbing itself from debug output.
#[derive(Debug)]
pub(crate) struct Registration {
    /// Email address to register, which must not yet be taken.
    pub(crate) email: EmailAddress,

    /// Username to register, which must not yet be taken.
    pub(crate) username: Username,

    /// Password in plain text form.
    pub(crate) password: Password,

    /// Optional first name.
    pub(crate) name: Option<String>,

    /// Optional family name.
    pub(crate) surname: Option<String>,

    /// Optional age.
    pub(crate) age: Option<Age>,

    /// Optional URL path to an already-uploaded avatar image.
    pub(crate) avatar: Option<String>,
}

/// The subset of a user's fields that can be modified after creation.  Fields left as `None`
/// keep their previous value.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct UserPatch {
    /// New first name, if any.
    pub(crate) name: Option<String>,

    /// New family name, if any.
    pub(crate) surname: Option<String>,

    /// New age, if any.
    pub(crate) age: Option<Age>,

    /// New avatar URL path, if any.
    pub(crate) avatar: Option<String>,
}

impl UserPatch {
    /// Checks whether the patch carries no changes at all.
    pub(crate) fn is_empty(&self) -> bool {
        self == &UserPatch::default()
    }
}

/// A post as stored in the database.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Post {
    /// Identifier assigned by the database at creation time.
    id: PostId,

    /// Free-form text of the post.
    text: String,

    /// Optional URL path to an image attached to the post.
    image: Option<String>,

    /// The user that created the post.  Becomes `None` when the owner deletes their account,
    /// at which point nobody can modify the post any longer.
    owner_id: Option<UserId>,

    /// Time at which the post was created.
    created_at: OffsetDateTime,

    /// Time of the last modification to the post's content.
    updated_at: OffsetDateTime,
}

impl Post {
    /// Creates a new post from its parts.
    pub(crate) fn new(
        id: PostId,
        text: String,
        image: Option<String>,
        owner_id: Option<UserId>,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
    ) -> Self {
        Self { id, text, image, owner_id, created_at, updated_at }
    }

    pub(crate) fn id(&self) -> PostId {
        self.id
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub(crate) fn owner_id(&self) -> Option<UserId> {
        self.owner_id
    }

    pub(crate) fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub(crate) fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }
}

/// The subset of a post's fields that can be modified after creation.  Fields left as `None`
/// keep their previous value, but `updated_at` is always bumped.
#[derive(Debug, PartialEq)]
pub(crate) struct PostPatch {
    /// New text, if any.
    pub(crate) text: Option<String>,

    /// New image URL path, if any.
    pub(crate) image: Option<String>,

    /// New modification time for the post.
    pub(crate) updated_at: OffsetDateTime,
}

/// Public representation of a user.  Never includes the password, and relations to posts are
/// flattened to lists of identifiers.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct UserView {
    pub(crate) id: UserId,
    pub(crate) email: EmailAddress,
    pub(crate) username: Username,
    pub(crate) name: Option<String>,
    pub(crate) surname: Option<String>,
    pub(crate) age: Option<Age>,
    pub(crate) avatar: Option<String>,

    /// Identifiers of the posts this user has marked as favorites.
    pub(crate) liked_posts: Vec<PostId>,

    /// Identifiers of the posts this user has created.
    pub(crate) created_posts: Vec<PostId>,
}

/// Public representation of a post.  The timestamps are expressed as Unix seconds and the
/// favorites relation is flattened to a list of user identifiers.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub(crate) struct PostView {
    pub(crate) id: PostId,
    pub(crate) text: String,
    pub(crate) image: Option<String>,
    pub(crate) owner_id: Option<UserId>,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,

    /// Identifiers of the users that have marked this post as a favorite.
    pub(crate) favorites: Vec<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_ok() {
        assert_eq!(14, Age::new(14).unwrap().as_i16());
        assert_eq!(42, Age::new(42).unwrap().as_i16());
        assert_eq!(100, Age::new(100).unwrap().as_i16());
    }

    #[test]
    fn test_age_error() {
        assert!(Age::new(-1).is_err());
        assert!(Age::new(0).is_err());
        assert!(Age::new(13).is_err());
        assert!(Age::new(101).is_err());
    }

    #[test]
    fn test_age_de() {
        assert_eq!(Age::new(25).unwrap(), serde_json::from_str::<Age>("25").unwrap());
        assert!(serde_json::from_str::<Age>("13").is_err());
        assert!(serde_json::from_str::<Age>("101").is_err());
    }

    #[test]
    fn test_ids_from_i64() {
        assert_eq!(UserId::new(123), UserId::from_i64(123).unwrap());
        assert!(UserId::from_i64(i64::from(i32::MAX) + 1).is_err());
        assert_eq!(PostId::new(5), PostId::from_i64(5).unwrap());
        assert!(PostId::from_i64(i64::MIN).is_err());
    }

    #[test]
    fn test_validate_profile_text() {
        assert!(validate_profile_text("Name", "John").is_ok());
        assert!(validate_profile_text("Name", &"x".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(validate_profile_text("Name", "").is_err());
        assert!(validate_profile_text("Name", &"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_user_patch_is_empty() {
        assert!(UserPatch::default().is_empty());
        assert!(!UserPatch { name: Some("n".to_owned()), ..Default::default() }.is_empty());
    }
}

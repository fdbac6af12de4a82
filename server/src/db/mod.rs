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

//! Database abstraction to manipulate users, posts and favorites.
//!
//! The common CRUD operations are expressed once via the `Repo` trait and implemented per
//! entity.  Operations that do not fit the generic contract (lookups by alternate keys and
//! the manipulation of the favorites join table) are plain free functions.

use crate::model::{Age, HashedPassword, Post, PostId, PostPatch, User, UserId, UserPatch};
use async_trait::async_trait;
use postboard_core::db::postgres;
use postboard_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use postboard_core::db::{DbError, DbResult, Executor};
use postboard_core::model::{EmailAddress, Username};
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;


/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,
    }
}

impl TryFrom<PgRow> for User {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(postgres::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(postgres::map_sqlx_error)?;
        let name: Option<String> = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let surname: Option<String> = row.try_get("surname").map_err(postgres::map_sqlx_error)?;
        let age: Option<i16> = row.try_get("age").map_err(postgres::map_sqlx_error)?;
        let avatar: Option<String> = row.try_get("avatar").map_err(postgres::map_sqlx_error)?;

        let mut user = User::new(
            UserId::new(id),
            EmailAddress::new(email)?,
            Username::new(username)?,
            HashedPassword::new(password),
        );
        if let Some(name) = name {
            user = user.with_name(name);
        }
        if let Some(surname) = surname {
            user = user.with_surname(surname);
        }
        if let Some(age) = age {
            user = user.with_age(Age::new(age)?);
        }
        if let Some(avatar) = avatar {
            user = user.with_avatar(avatar);
        }
        Ok(user)
    }
}

impl TryFrom<SqliteRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(sqlite::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(sqlite::map_sqlx_error)?;
        let name: Option<String> = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let surname: Option<String> = row.try_get("surname").map_err(sqlite::map_sqlx_error)?;
        let age: Option<i64> = row.try_get("age").map_err(sqlite::map_sqlx_error)?;
        let avatar: Option<String> = row.try_get("avatar").map_err(sqlite::map_sqlx_error)?;

        let mut user = User::new(
            UserId::from_i64(id)?,
            EmailAddress::new(email)?,
            Username::new(username)?,
            HashedPassword::new(password),
        );
        if let Some(name) = name {
            user = user.with_name(name);
        }
        if let Some(surname) = surname {
            user = user.with_surname(surname);
        }
        if let Some(age) = age {
            let age = i16::try_from(age)
                .map_err(|e| DbError::DataIntegrityError(format!("Invalid age: {}", e)))?;
            user = user.with_age(Age::new(age)?);
        }
        if let Some(avatar) = avatar {
            user = user.with_avatar(avatar);
        }
        Ok(user)
    }
}

impl TryFrom<PgRow> for Post {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let text: String = row.try_get("text").map_err(postgres::map_sqlx_error)?;
        let image: Option<String> = row.try_get("image").map_err(postgres::map_sqlx_error)?;
        let owner_id: Option<i32> = row.try_get("owner_id").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
        let updated_at: OffsetDateTime =
            row.try_get("updated_at").map_err(postgres::map_sqlx_error)?;

        Ok(Post::new(
            PostId::new(id),
            text,
            image,
            owner_id.map(UserId::new),
            created_at,
            updated_at,
        ))
    }
}

impl TryFrom<SqliteRow> for Post {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let text: String = row.try_get("text").map_err(sqlite::map_sqlx_error)?;
        let image: Option<String> = row.try_get("image").map_err(sqlite::map_sqlx_error)?;
        let owner_id: Option<i64> = row.try_get("owner_id").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_secs: i64 = row.try_get("updated_at_secs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_nsecs: i64 =
            row.try_get("updated_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        let owner_id = match owner_id {
            Some(id) => Some(UserId::from_i64(id)?),
            None => None,
        };

        Ok(Post::new(
            PostId::from_i64(id)?,
            text,
            image,
            owner_id,
            build_timestamp(created_at_secs, created_at_nsecs)?,
            build_timestamp(updated_at_secs, updated_at_nsecs)?,
        ))
    }
}

/// The data required to persist a new user.
pub(crate) struct NewUser {
    /// Unique email address.
    pub(crate) email: EmailAddress,

    /// Unique username.
    pub(crate) username: Username,

    /// The user's password, already hashed.
    pub(crate) password: HashedPassword,

    /// Optional first name.
    pub(crate) name: Option<String>,

    /// Optional family name.
    pub(crate) surname: Option<String>,

    /// Optional age.
    pub(crate) age: Option<Age>,

    /// Optional avatar URL path.
    pub(crate) avatar: Option<String>,
}

/// The data required to persist a new post.
pub(crate) struct NewPost {
    /// Free-form text of the post.
    pub(crate) text: String,

    /// Optional URL path to an attached image.
    pub(crate) image: Option<String>,

    /// The user creating the post.
    pub(crate) owner_id: UserId,

    /// Creation time, which also seeds the modification time.
    pub(crate) created_at: OffsetDateTime,
}

/// Generic CRUD contract implemented once per entity.
///
/// All operations run against a single executor, so multi-step flows get their atomicity by
/// passing in an executor backed by a transaction.
#[async_trait]
pub(crate) trait Repo {
    /// The entity this repository persists.
    type Entity;

    /// The type of the entity's primary key.
    type Id;

    /// The data required to create an entity.
    type New;

    /// The partial-update description for the entity.
    type Patch;

    /// Persists a new entity and returns it with its generated id populated.
    async fn create(ex: &mut Executor, new: Self::New) -> DbResult<Self::Entity>;

    /// Returns all persisted entities.
    async fn list(ex: &mut Executor) -> DbResult<Vec<Self::Entity>>;

    /// Looks up a single entity by its primary key.
    async fn get_by_id(ex: &mut Executor, id: Self::Id) -> DbResult<Self::Entity>;

    /// Applies the fields present in `patch` to the entity `id`, leaving all others untouched.
    async fn update(ex: &mut Executor, id: Self::Id, patch: Self::Patch) -> DbResult<()>;

    /// Deletes the entity `id`.
    async fn delete(ex: &mut Executor, id: Self::Id) -> DbResult<()>;
}

/// Validates the row count of an `UPDATE` or `DELETE` that targets one row by primary key.
fn ensure_one_row(rows_affected: u64) -> DbResult<()> {
    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Statement affected more than one row".to_owned())),
    }
}

/// Repository for the `users` table.
pub(crate) struct Users;

#[async_trait]
impl Repo for Users {
    type Entity = User;
    type Id = UserId;
    type New = NewUser;
    type Patch = UserPatch;

    async fn create(ex: &mut Executor, new: NewUser) -> DbResult<User> {
        let id = match ex {
            Executor::Postgres(ex) => {
                let query_str = "
                    INSERT INTO users (email, username, password, name, surname, age, avatar)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id";
                let row = sqlx::query(query_str)
                    .bind(new.email.as_str())
                    .bind(new.username.as_str())
                    .bind(new.password.as_str())
                    .bind(new.name.as_deref())
                    .bind(new.surname.as_deref())
                    .bind(new.age.map(|a| a.as_i16()))
                    .bind(new.avatar.as_deref())
                    .fetch_one(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
                UserId::new(id)
            }

            Executor::Sqlite(ex) => {
                let query_str = "
                    INSERT INTO users (email, username, password, name, surname, age, avatar)
                    VALUES (?, ?, ?, ?, ?, ?, ?)";
                let done = sqlx::query(query_str)
                    .bind(new.email.as_str())
                    .bind(new.username.as_str())
                    .bind(new.password.as_str())
                    .bind(new.name.as_deref())
                    .bind(new.surname.as_deref())
                    .bind(new.age.map(|a| a.as_i16()))
                    .bind(new.avatar.as_deref())
                    .execute(ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                UserId::from_i64(done.last_insert_rowid())?
            }
        };

        let mut user = User::new(id, new.email, new.username, new.password);
        if let Some(name) = new.name {
            user = user.with_name(name);
        }
        if let Some(surname) = new.surname {
            user = user.with_surname(surname);
        }
        if let Some(age) = new.age {
            user = user.with_age(age);
        }
        if let Some(avatar) = new.avatar {
            user = user.with_avatar(avatar);
        }
        Ok(user)
    }

    async fn list(ex: &mut Executor) -> DbResult<Vec<User>> {
        match ex {
            Executor::Postgres(ex) => {
                let query_str = "SELECT * FROM users ORDER BY id";
                let rows = sqlx::query(query_str)
                    .fetch_all(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                let mut users = Vec::with_capacity(rows.len());
                for row in rows {
                    users.push(User::try_from(row)?);
                }
                Ok(users)
            }

            Executor::Sqlite(ex) => {
                let query_str = "SELECT * FROM users ORDER BY id";
                let rows =
                    sqlx::query(query_str).fetch_all(ex).await.map_err(sqlite::map_sqlx_error)?;
                let mut users = Vec::with_capacity(rows.len());
                for row in rows {
                    users.push(User::try_from(row)?);
                }
                Ok(users)
            }
        }
    }

    async fn get_by_id(ex: &mut Executor, id: UserId) -> DbResult<User> {
        match ex {
            Executor::Postgres(ex) => {
                let query_str = "SELECT * FROM users WHERE id = $1";
                let row = sqlx::query(query_str)
                    .bind(id.as_i32())
                    .fetch_one(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                User::try_from(row)
            }

            Executor::Sqlite(ex) => {
                let query_str = "SELECT * FROM users WHERE id = ?";
                let row = sqlx::query(query_str)
                    .bind(id.as_i32())
                    .fetch_one(ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                User::try_from(row)
            }
        }
    }

    async fn update(ex: &mut Executor, id: UserId, patch: UserPatch) -> DbResult<()> {
        let rows_affected = match ex {
            Executor::Postgres(ex) => {
                let query_str = "
                    UPDATE users SET
                        name = COALESCE($1, name),
                        surname = COALESCE($2, surname),
                        age = COALESCE($3, age),
                        avatar = COALESCE($4, avatar)
                    WHERE id = $5";
                let done = sqlx::query(query_str)
                    .bind(patch.name.as_deref())
                    .bind(patch.surname.as_deref())
                    .bind(patch.age.map(|a| a.as_i16()))
                    .bind(patch.avatar.as_deref())
                    .bind(id.as_i32())
                    .execute(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                done.rows_affected()
            }

            Executor::Sqlite(ex) => {
                let query_str = "
                    UPDATE users SET
                        name = COALESCE(?, name),
                        surname = COALESCE(?, surname),
                        age = COALESCE(?, age),
                        avatar = COALESCE(?, avatar)
                    WHERE id = ?";
                let done = sqlx::query(query_str)
                    .bind(patch.name.as_deref())
                    .bind(patch.surname.as_deref())
                    .bind(patch.age.map(|a| a.as_i16()))
                    .bind(patch.avatar.as_deref())
                    .bind(id.as_i32())
                    .execute(ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                done.rows_affected()
            }
        };

        ensure_one_row(rows_affected)
    }

    async fn delete(ex: &mut Executor, id: UserId) -> DbResult<()> {
        let rows_affected = match ex {
            Executor::Postgres(ex) => {
                let query_str = "DELETE FROM users WHERE id = $1";
                let done = sqlx::query(query_str)
                    .bind(id.as_i32())
                    .execute(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                done.rows_affected()
            }

            Executor::Sqlite(ex) => {
                let query_str = "DELETE FROM users WHERE id = ?";
                let done = sqlx::query(query_str)
                    .bind(id.as_i32())
                    .execute(ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                done.rows_affected()
            }
        };

        ensure_one_row(rows_affected)
    }
}

/// Repository for the `posts` table.
pub(crate) struct Posts;

#[async_trait]
impl Repo for Posts {
    type Entity = Post;
    type Id = PostId;
    type New = NewPost;
    type Patch = PostPatch;

    async fn create(ex: &mut Executor, new: NewPost) -> DbResult<Post> {
        let id = match ex {
            Executor::Postgres(ex) => {
                let query_str = "
                    INSERT INTO posts (text, image, owner_id, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id";
                let row = sqlx::query(query_str)
                    .bind(new.text.as_str())
                    .bind(new.image.as_deref())
                    .bind(new.owner_id.as_i32())
                    .bind(new.created_at)
                    .bind(new.created_at)
                    .fetch_one(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
                PostId::new(id)
            }

            Executor::Sqlite(ex) => {
                let (created_at_secs, created_at_nsecs) = unpack_timestamp(new.created_at);

                let query_str = "
                    INSERT INTO posts (
                        text, image, owner_id,
                        created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs)
                    VALUES (?, ?, ?, ?, ?, ?, ?)";
                let done = sqlx::query(query_str)
                    .bind(new.text.as_str())
                    .bind(new.image.as_deref())
                    .bind(new.owner_id.as_i32())
                    .bind(created_at_secs)
                    .bind(created_at_nsecs)
                    .bind(created_at_secs)
                    .bind(created_at_nsecs)
                    .execute(ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                PostId::from_i64(done.last_insert_rowid())?
            }
        };

        Ok(Post::new(
            id,
            new.text,
            new.image,
            Some(new.owner_id),
            new.created_at,
            new.created_at,
        ))
    }

    async fn list(ex: &mut Executor) -> DbResult<Vec<Post>> {
        match ex {
            Executor::Postgres(ex) => {
                let query_str = "SELECT * FROM posts ORDER BY id";
                let rows = sqlx::query(query_str)
                    .fetch_all(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                let mut posts = Vec::with_capacity(rows.len());
                for row in rows {
                    posts.push(Post::try_from(row)?);
                }
                Ok(posts)
            }

            Executor::Sqlite(ex) => {
                let query_str = "SELECT * FROM posts ORDER BY id";
                let rows =
                    sqlx::query(query_str).fetch_all(ex).await.map_err(sqlite::map_sqlx_error)?;
                let mut posts = Vec::with_capacity(rows.len());
                for row in rows {
                    posts.push(Post::try_from(row)?);
                }
                Ok(posts)
            }
        }
    }

    async fn get_by_id(ex: &mut Executor, id: PostId) -> DbResult<Post> {
        match ex {
            Executor::Postgres(ex) => {
                let query_str = "SELECT * FROM posts WHERE id = $1";
                let row = sqlx::query(query_str)
                    .bind(id.as_i32())
                    .fetch_one(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                Post::try_from(row)
            }

            Executor::Sqlite(ex) => {
                let query_str = "SELECT * FROM posts WHERE id = ?";
                let row = sqlx::query(query_str)
                    .bind(id.as_i32())
                    .fetch_one(ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                Post::try_from(row)
            }
        }
    }

    async fn update(ex: &mut Executor, id: PostId, patch: PostPatch) -> DbResult<()> {
        let rows_affected = match ex {
            Executor::Postgres(ex) => {
                let query_str = "
                    UPDATE posts SET
                        text = COALESCE($1, text),
                        image = COALESCE($2, image),
                        updated_at = $3
                    WHERE id = $4";
                let done = sqlx::query(query_str)
                    .bind(patch.text.as_deref())
                    .bind(patch.image.as_deref())
                    .bind(patch.updated_at)
                    .bind(id.as_i32())
                    .execute(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                done.rows_affected()
            }

            Executor::Sqlite(ex) => {
                let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(patch.updated_at);

                let query_str = "
                    UPDATE posts SET
                        text = COALESCE(?, text),
                        image = COALESCE(?, image),
                        updated_at_secs = ?,
                        updated_at_nsecs = ?
                    WHERE id = ?";
                let done = sqlx::query(query_str)
                    .bind(patch.text.as_deref())
                    .bind(patch.image.as_deref())
                    .bind(updated_at_secs)
                    .bind(updated_at_nsecs)
                    .bind(id.as_i32())
                    .execute(ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                done.rows_affected()
            }
        };

        ensure_one_row(rows_affected)
    }

    async fn delete(ex: &mut Executor, id: PostId) -> DbResult<()> {
        let rows_affected = match ex {
            Executor::Postgres(ex) => {
                let query_str = "DELETE FROM posts WHERE id = $1";
                let done = sqlx::query(query_str)
                    .bind(id.as_i32())
                    .execute(ex)
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                done.rows_affected()
            }

            Executor::Sqlite(ex) => {
                let query_str = "DELETE FROM posts WHERE id = ?";
                let done = sqlx::query(query_str)
                    .bind(id.as_i32())
                    .execute(ex)
                    .await
                    .map_err(sqlite::map_sqlx_error)?;
                done.rows_affected()
            }
        };

        ensure_one_row(rows_affected)
    }
}

/// Gets the user that registered `email`.
pub(crate) async fn get_user_by_email(ex: &mut Executor, email: &EmailAddress) -> DbResult<User> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM users WHERE email = $1";
            let row = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(row)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM users WHERE email = ?";
            let row = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(row)
        }
    }
}

/// Gets the user that registered `username`.
pub(crate) async fn get_user_by_username(ex: &mut Executor, username: &Username) -> DbResult<User> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM users WHERE username = $1";
            let row = sqlx::query(query_str)
                .bind(username.as_str())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(row)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM users WHERE username = ?";
            let row = sqlx::query(query_str)
                .bind(username.as_str())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(row)
        }
    }
}

/// Gets all posts created by `owner_id`.
pub(crate) async fn list_posts_by_owner(ex: &mut Executor, owner_id: UserId) -> DbResult<Vec<Post>> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM posts WHERE owner_id = $1 ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(owner_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let mut posts = Vec::with_capacity(rows.len());
            for row in rows {
                posts.push(Post::try_from(row)?);
            }
            Ok(posts)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM posts WHERE owner_id = ? ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(owner_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            let mut posts = Vec::with_capacity(rows.len());
            for row in rows {
                posts.push(Post::try_from(row)?);
            }
            Ok(posts)
        }
    }
}

/// Gets the identifiers of the posts created by `owner_id`.
pub(crate) async fn list_created_posts(ex: &mut Executor, owner_id: UserId) -> DbResult<Vec<PostId>> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT id FROM posts WHERE owner_id = $1 ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(owner_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
                ids.push(PostId::new(id));
            }
            Ok(ids)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT id FROM posts WHERE owner_id = ? ORDER BY id";
            let rows = sqlx::query(query_str)
                .bind(owner_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
                ids.push(PostId::from_i64(id)?);
            }
            Ok(ids)
        }
    }
}

/// Gets the identifiers of the posts that `user_id` has marked as favorites.
pub(crate) async fn list_liked_posts(ex: &mut Executor, user_id: UserId) -> DbResult<Vec<PostId>> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT post_id FROM user_post WHERE user_id = $1 ORDER BY post_id";
            let rows = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let id: i32 = row.try_get("post_id").map_err(postgres::map_sqlx_error)?;
                ids.push(PostId::new(id));
            }
            Ok(ids)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT post_id FROM user_post WHERE user_id = ? ORDER BY post_id";
            let rows = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let id: i64 = row.try_get("post_id").map_err(sqlite::map_sqlx_error)?;
                ids.push(PostId::from_i64(id)?);
            }
            Ok(ids)
        }
    }
}

/// Gets the identifiers of the users that have marked `post_id` as a favorite.
pub(crate) async fn list_post_favorites(ex: &mut Executor, post_id: PostId) -> DbResult<Vec<UserId>> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT user_id FROM user_post WHERE post_id = $1 ORDER BY user_id";
            let rows = sqlx::query(query_str)
                .bind(post_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let id: i32 = row.try_get("user_id").map_err(postgres::map_sqlx_error)?;
                ids.push(UserId::new(id));
            }
            Ok(ids)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT user_id FROM user_post WHERE post_id = ? ORDER BY user_id";
            let rows = sqlx::query(query_str)
                .bind(post_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let id: i64 = row.try_get("user_id").map_err(sqlite::map_sqlx_error)?;
                ids.push(UserId::from_i64(id)?);
            }
            Ok(ids)
        }
    }
}

/// Checks whether `user_id` has marked `post_id` as a favorite.
pub(crate) async fn is_favorite(ex: &mut Executor, user_id: UserId, post_id: PostId) -> DbResult<bool> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str =
                "SELECT COUNT(*) AS count FROM user_post WHERE user_id = $1 AND post_id = $2";
            let row = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .bind(post_id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let count: i64 = row.try_get("count").map_err(postgres::map_sqlx_error)?;
            Ok(count > 0)
        }

        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT COUNT(*) AS count FROM user_post WHERE user_id = ? AND post_id = ?";
            let row = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .bind(post_id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            let count: i64 = row.try_get("count").map_err(sqlite::map_sqlx_error)?;
            Ok(count > 0)
        }
    }
}

/// Records `post_id` as a favorite of `user_id`.  The composite primary key turns concurrent
/// double-insertions into an `AlreadyExists` error.
pub(crate) async fn add_favorite(ex: &mut Executor, user_id: UserId, post_id: PostId) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO user_post (user_id, post_id) VALUES ($1, $2)";
            let done = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .bind(post_id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO user_post (user_id, post_id) VALUES (?, ?)";
            let done = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .bind(post_id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Removes `post_id` from the favorites of `user_id`.
pub(crate) async fn remove_favorite(
    ex: &mut Executor,
    user_id: UserId,
    post_id: PostId,
) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM user_post WHERE user_id = $1 AND post_id = $2";
            let done = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .bind(post_id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM user_post WHERE user_id = ? AND post_id = ?";
            let done = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .bind(post_id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    ensure_one_row(rows_affected)
}

/// Removes all favorites recorded by `user_id`, returning how many were removed.
pub(crate) async fn unlink_user_favorites(ex: &mut Executor, user_id: UserId) -> DbResult<u64> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM user_post WHERE user_id = $1";
            let done = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Ok(done.rows_affected())
        }

        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM user_post WHERE user_id = ?";
            let done = sqlx::query(query_str)
                .bind(user_id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ok(done.rows_affected())
        }
    }
}

/// Removes all favorites recorded against `post_id`, returning how many were removed.
pub(crate) async fn unlink_post_favorites(ex: &mut Executor, post_id: PostId) -> DbResult<u64> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM user_post WHERE post_id = $1";
            let done = sqlx::query(query_str)
                .bind(post_id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Ok(done.rows_affected())
        }

        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM user_post WHERE post_id = ?";
            let done = sqlx::query(query_str)
                .bind(post_id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ok(done.rows_affected())
        }
    }
}

/// Clears the ownership of all posts created by `owner_id` so that they survive the deletion
/// of the account.
pub(crate) async fn detach_user_posts(ex: &mut Executor, owner_id: UserId) -> DbResult<u64> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "UPDATE posts SET owner_id = NULL WHERE owner_id = $1";
            let done = sqlx::query(query_str)
                .bind(owner_id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Ok(done.rows_affected())
        }

        Executor::Sqlite(ex) => {
            let query_str = "UPDATE posts SET owner_id = NULL WHERE owner_id = ?";
            let done = sqlx::query(query_str)
                .bind(owner_id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ok(done.rows_affected())
        }
    }
}

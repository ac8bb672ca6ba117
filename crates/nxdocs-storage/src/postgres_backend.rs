//! `PostgreSQL` storage backend.
//!
//! Keeps one table per record type: `protocols`, `modules`, `tutorials`, and
//! `saved_commands`. List-valued and map-valued fields are stored as
//! `JSONB`. `modules.protocol_id` is a plain integer; the join to
//! `protocols` happens here, as two sequential queries.
//!
//! Feature-gated behind `postgres-backend`. Uses `sqlx` with the Tokio
//! runtime for fully async operations.

use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::fixtures::{self, Fixtures};
use crate::models::{
    AdditionalOptions, Module, ModuleExample, ModuleParameter, ModuleParams, NewSavedCommand,
    Protocol, SavedCommand, SavedCommandPatch, Tutorial,
};
use crate::{Storage, StorageError};

const MIGRATIONS: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS protocols (\
        id           SERIAL PRIMARY KEY, \
        name         TEXT NOT NULL UNIQUE, \
        display_name TEXT NOT NULL, \
        icon         TEXT NOT NULL, \
        description  TEXT NOT NULL\
    )",
    "CREATE TABLE IF NOT EXISTS modules (\
        id              SERIAL PRIMARY KEY, \
        name            TEXT NOT NULL, \
        protocol_id     INTEGER NOT NULL, \
        description     TEXT NOT NULL, \
        stability       TEXT NOT NULL, \
        required_params JSONB, \
        optional_params JSONB, \
        examples        JSONB, \
        output          TEXT, \
        troubleshooting JSONB\
    )",
    "CREATE TABLE IF NOT EXISTS tutorials (\
        id          SERIAL PRIMARY KEY, \
        title       TEXT NOT NULL, \
        slug        TEXT NOT NULL UNIQUE, \
        image       TEXT, \
        description TEXT NOT NULL, \
        content     TEXT NOT NULL, \
        level       TEXT NOT NULL, \
        read_time   INTEGER NOT NULL, \
        tags        JSONB\
    )",
    "CREATE TABLE IF NOT EXISTS saved_commands (\
        id                 SERIAL PRIMARY KEY, \
        name               TEXT NOT NULL, \
        user_id            INTEGER, \
        protocol           TEXT NOT NULL, \
        target             TEXT, \
        username           TEXT, \
        password           TEXT, \
        is_hash            BOOLEAN DEFAULT FALSE, \
        module             TEXT, \
        module_params      JSONB, \
        additional_options JSONB, \
        command            TEXT NOT NULL\
    )",
];

const INSERT_SAVED_COMMAND: &str = r"INSERT INTO saved_commands
      (name, user_id, protocol, target, username, password, is_hash, module,
       module_params, additional_options, command)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
      RETURNING *";

/// A storage backend backed by `PostgreSQL`.
///
/// Thread-safe via `PgPool` (connection pool). All operations are fully async.
///
/// # Examples
///
/// ```no_run
/// # use nxdocs_storage::PostgresStorage;
/// # #[tokio::main]
/// # async fn main() {
/// let storage = PostgresStorage::connect("postgres://localhost/nxdocs").await.unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("pool", &"[PgPool]")
            .finish_non_exhaustive()
    }
}

impl PostgresStorage {
    /// Connect to `PostgreSQL` and create the tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the connection or migration fails.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Open {
                reason: e.to_string(),
            })?;

        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| StorageError::Open {
                    reason: format!("migration failed: {e}"),
                })?;
        }

        Ok(Self { pool })
    }

    async fn find_protocol_id(&self, name: &str) -> Result<Option<i32>, StorageError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM protocols WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("protocol lookup"))?;

        Ok(row.map(|(id,)| id))
    }

    async fn seed(tx: &mut Transaction<'_, Postgres>, fixtures: Fixtures) -> Result<(), StorageError> {
        for table in ["saved_commands", "tutorials", "modules", "protocols"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut **tx)
                .await
                .map_err(query_error("clear table"))?;
        }
        tracing::info!("cleared existing database data");

        let mut protocols = Vec::with_capacity(fixtures.protocols.len());
        for p in fixtures.protocols {
            let protocol = sqlx::query_as::<_, Protocol>(
                r"INSERT INTO protocols (name, display_name, icon, description)
                  VALUES ($1, $2, $3, $4)
                  RETURNING *",
            )
            .bind(p.name)
            .bind(p.display_name)
            .bind(p.icon)
            .bind(p.description)
            .fetch_one(&mut **tx)
            .await
            .map_err(query_error("insert protocol"))?;
            protocols.push(protocol);
        }
        tracing::info!(count = protocols.len(), "inserted protocols");

        // Fixture modules for unlisted protocols attach to the first one.
        let fallback_id = protocols.first().map_or(1, |p| p.id);
        let module_count = fixtures.modules.len();
        for m in fixtures.modules {
            let protocol_id = protocols
                .iter()
                .find(|p| p.name == m.protocol)
                .map_or(fallback_id, |p| p.id);
            sqlx::query(
                r"INSERT INTO modules
                  (name, protocol_id, description, stability, required_params,
                   optional_params, examples, output, troubleshooting)
                  VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(m.name)
            .bind(protocol_id)
            .bind(m.description)
            .bind(m.stability.to_string())
            .bind(m.required_params.map(Json))
            .bind(m.optional_params.map(Json))
            .bind(m.examples.map(Json))
            .bind(m.output)
            .bind(m.troubleshooting.map(Json))
            .execute(&mut **tx)
            .await
            .map_err(query_error("insert module"))?;
        }
        tracing::info!(count = module_count, "inserted modules");

        let tutorial_count = fixtures.tutorials.len();
        for t in fixtures.tutorials {
            sqlx::query(
                r"INSERT INTO tutorials
                  (title, slug, image, description, content, level, read_time, tags)
                  VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(t.title)
            .bind(t.slug)
            .bind(t.image)
            .bind(t.description)
            .bind(t.content)
            .bind(t.level.to_string())
            .bind(t.read_time)
            .bind(Json(t.tags))
            .execute(&mut **tx)
            .await
            .map_err(query_error("insert tutorial"))?;
        }
        tracing::info!(count = tutorial_count, "inserted tutorials");

        let seeds = fixtures::seed_saved_commands();
        let seed_count = seeds.len();
        for command in seeds {
            insert_saved_command(command)
                .fetch_one(&mut **tx)
                .await
                .map_err(query_error("insert saved command"))?;
        }
        tracing::info!(count = seed_count, "inserted saved commands");

        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for PostgresStorage {
    async fn initialize(&self) -> Result<(), StorageError> {
        let fixtures = Fixtures::bundled()?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_error("begin initialization"))?;

        Self::seed(&mut tx, fixtures).await?;

        tx.commit()
            .await
            .map_err(query_error("commit initialization"))?;
        tracing::info!("database initialization completed");
        Ok(())
    }

    async fn list_protocols(&self) -> Result<Vec<Protocol>, StorageError> {
        sqlx::query_as::<_, Protocol>("SELECT * FROM protocols ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("list protocols"))
    }

    async fn list_modules(&self) -> Result<Vec<Module>, StorageError> {
        let rows = sqlx::query_as::<_, ModuleRow>("SELECT * FROM modules ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("list modules"))?;

        rows.into_iter().map(Module::try_from).collect()
    }

    async fn list_modules_by_protocol(&self, protocol: &str) -> Result<Vec<Module>, StorageError> {
        let Some(protocol_id) = self.find_protocol_id(protocol).await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, ModuleRow>(
            "SELECT * FROM modules WHERE protocol_id = $1 ORDER BY id",
        )
        .bind(protocol_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error("list modules by protocol"))?;

        rows.into_iter().map(Module::try_from).collect()
    }

    async fn get_module(
        &self,
        protocol: &str,
        name: &str,
    ) -> Result<Option<Module>, StorageError> {
        let Some(protocol_id) = self.find_protocol_id(protocol).await? else {
            return Ok(None);
        };

        sqlx::query_as::<_, ModuleRow>(
            "SELECT * FROM modules WHERE protocol_id = $1 AND name = $2 ORDER BY id LIMIT 1",
        )
        .bind(protocol_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error("get module"))?
        .map(Module::try_from)
        .transpose()
    }

    async fn list_tutorials(&self) -> Result<Vec<Tutorial>, StorageError> {
        let rows = sqlx::query_as::<_, TutorialRow>("SELECT * FROM tutorials ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("list tutorials"))?;

        rows.into_iter().map(Tutorial::try_from).collect()
    }

    async fn get_tutorial(&self, slug: &str) -> Result<Option<Tutorial>, StorageError> {
        sqlx::query_as::<_, TutorialRow>("SELECT * FROM tutorials WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("get tutorial"))?
            .map(Tutorial::try_from)
            .transpose()
    }

    async fn list_saved_commands(&self) -> Result<Vec<SavedCommand>, StorageError> {
        let rows =
            sqlx::query_as::<_, SavedCommandRow>("SELECT * FROM saved_commands ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(query_error("list saved commands"))?;

        Ok(rows.into_iter().map(SavedCommand::from).collect())
    }

    async fn get_saved_command(&self, id: i32) -> Result<Option<SavedCommand>, StorageError> {
        let row = sqlx::query_as::<_, SavedCommandRow>("SELECT * FROM saved_commands WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("get saved command"))?;

        Ok(row.map(SavedCommand::from))
    }

    async fn create_saved_command(
        &self,
        command: NewSavedCommand,
    ) -> Result<SavedCommand, StorageError> {
        let row = insert_saved_command(command)
            .fetch_one(&self.pool)
            .await
            .map_err(query_error("create saved command"))?;

        Ok(row.into())
    }

    async fn update_saved_command(
        &self,
        id: i32,
        patch: SavedCommandPatch,
    ) -> Result<Option<SavedCommand>, StorageError> {
        let Some(mut command) = self.get_saved_command(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut command);

        let row = sqlx::query_as::<_, SavedCommandRow>(
            r"UPDATE saved_commands SET
                name = $2, user_id = $3, protocol = $4, target = $5, username = $6,
                password = $7, is_hash = $8, module = $9, module_params = $10,
                additional_options = $11, command = $12
              WHERE id = $1
              RETURNING *",
        )
        .bind(id)
        .bind(command.name)
        .bind(command.user_id)
        .bind(command.protocol)
        .bind(command.target)
        .bind(command.username)
        .bind(command.password)
        .bind(command.is_hash)
        .bind(command.module)
        .bind(Json(command.module_params))
        .bind(Json(command.additional_options))
        .bind(command.command)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error("update saved command"))?;

        Ok(row.map(SavedCommand::from))
    }

    async fn delete_saved_command(&self, id: i32) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM saved_commands WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_error("delete saved command"))?;

        Ok(())
    }
}

fn query_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StorageError {
    move |e| StorageError::Query {
        operation,
        reason: e.to_string(),
    }
}

type SavedCommandQuery<'q> = sqlx::query::QueryAs<'q, Postgres, SavedCommandRow, PgArguments>;

/// Build the saved-command insert with all eleven columns bound.
fn insert_saved_command<'q>(command: NewSavedCommand) -> SavedCommandQuery<'q> {
    sqlx::query_as::<_, SavedCommandRow>(INSERT_SAVED_COMMAND)
        .bind(command.name)
        .bind(command.user_id)
        .bind(command.protocol)
        .bind(command.target)
        .bind(command.username)
        .bind(command.password)
        .bind(command.is_hash)
        .bind(command.module)
        .bind(Json(command.module_params))
        .bind(Json(command.additional_options))
        .bind(command.command)
}

// ── Row types ────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct ModuleRow {
    id: i32,
    name: String,
    protocol_id: i32,
    description: String,
    stability: String,
    required_params: Option<Json<Vec<String>>>,
    optional_params: Option<Json<Vec<ModuleParameter>>>,
    examples: Option<Json<Vec<ModuleExample>>>,
    output: Option<String>,
    troubleshooting: Option<Json<Vec<String>>>,
}

impl TryFrom<ModuleRow> for Module {
    type Error = StorageError;

    fn try_from(row: ModuleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            protocol_id: row.protocol_id,
            description: row.description,
            stability: row.stability.parse().map_err(|reason| StorageError::Decode {
                field: "stability",
                reason,
            })?,
            required_params: row.required_params.map(|Json(v)| v),
            optional_params: row.optional_params.map(|Json(v)| v),
            examples: row.examples.map(|Json(v)| v),
            output: row.output,
            troubleshooting: row.troubleshooting.map(|Json(v)| v),
        })
    }
}

#[derive(sqlx::FromRow)]
struct TutorialRow {
    id: i32,
    title: String,
    slug: String,
    image: Option<String>,
    description: String,
    content: String,
    level: String,
    read_time: i32,
    tags: Option<Json<Vec<String>>>,
}

impl TryFrom<TutorialRow> for Tutorial {
    type Error = StorageError;

    fn try_from(row: TutorialRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            image: row.image,
            description: row.description,
            content: row.content,
            level: row.level.parse().map_err(|reason| StorageError::Decode {
                field: "level",
                reason,
            })?,
            read_time: row.read_time,
            tags: row.tags.map(|Json(v)| v).unwrap_or_default(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct SavedCommandRow {
    id: i32,
    name: String,
    user_id: Option<i32>,
    protocol: String,
    target: Option<String>,
    username: Option<String>,
    password: Option<String>,
    is_hash: Option<bool>,
    module: Option<String>,
    module_params: Option<Json<ModuleParams>>,
    additional_options: Option<Json<AdditionalOptions>>,
    command: String,
}

impl From<SavedCommandRow> for SavedCommand {
    fn from(row: SavedCommandRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            user_id: row.user_id,
            protocol: row.protocol,
            target: row.target,
            username: row.username,
            password: row.password,
            is_hash: row.is_hash.unwrap_or(false),
            module: row.module,
            module_params: row.module_params.map(|Json(v)| v).unwrap_or_default(),
            additional_options: row.additional_options.map(|Json(v)| v).unwrap_or_default(),
            command: row.command,
        }
    }
}

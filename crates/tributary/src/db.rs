//! Database connection utilities.

use std::path::{Path, PathBuf};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// File name of the database inside a scope directory.
pub const CACHE_FILE_NAME: &str = "cache.db";

/// Where a cache lives, keyed by provider and account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheScope {
    /// `github/{owner}/{repo}`
    GitHub { owner: String, repo: String },
    /// `jira/{host}/{user}`
    Jira { host: String, user: String },
}

impl CacheScope {
    pub fn github(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self::GitHub {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    pub fn jira(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self::Jira {
            host: host.into(),
            user: user.into(),
        }
    }

    /// Directory of this scope relative to the cache root.
    pub fn relative_dir(&self) -> PathBuf {
        let (provider, a, b) = match self {
            CacheScope::GitHub { owner, repo } => ("github", owner, repo),
            CacheScope::Jira { host, user } => ("jira", host, user),
        };
        [provider.to_string(), path_segment(a), path_segment(b)]
            .iter()
            .collect()
    }

    /// Database file of this scope under `root`.
    pub fn database_path(&self, root: &Path) -> PathBuf {
        root.join(self.relative_dir()).join(CACHE_FILE_NAME)
    }
}

impl std::fmt::Display for CacheScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheScope::GitHub { owner, repo } => write!(f, "github/{}/{}", owner, repo),
            CacheScope::Jira { host, user } => write!(f, "jira/{}/{}", host, user),
        }
    }
}

/// Keep a user-supplied name to a single safe path component.
fn path_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '@' => c,
            _ => '_',
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Configure SQLite-specific pragmas for better performance and concurrency.
///
/// This sets:
/// - `journal_mode=WAL` - Write-ahead logging for better concurrent access
/// - `busy_timeout=5000` - Wait up to 5 seconds for locks instead of failing immediately
/// - `synchronous=NORMAL` - Good balance of safety and performance with WAL
async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    // Enable WAL mode for better concurrency (readers don't block writers)
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA journal_mode=WAL".to_string(),
    ))
    .await?;

    // Wait up to 5 seconds for locks instead of failing immediately
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA busy_timeout=5000".to_string(),
    ))
    .await?;

    // NORMAL synchronous is safe with WAL and faster than FULL
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA synchronous=NORMAL".to_string(),
    ))
    .await?;

    Ok(())
}

/// Establish a connection to the database.
///
/// For SQLite databases, this automatically configures:
/// - WAL journal mode for better concurrency
/// - 5 second busy timeout to handle lock contention
/// - NORMAL synchronous mode for better performance
///
/// # Arguments
/// * `database_url` - Database connection string (e.g., `sqlite:///path/to/cache.db?mode=rwc`)
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Configure SQLite-specific settings
    if database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Establish a connection to the database and run all pending migrations.
///
/// Pragmas are applied as in [`connect`].
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or migrations fail.
///
/// # Example
/// ```ignore
/// let db = tributary::connect_and_migrate("sqlite::memory:").await?;
/// ```
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = Database::connect(database_url).await?;

    // Configure SQLite-specific settings
    if database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Open (creating if needed) the migrated cache database of `scope` under `root`.
#[cfg(feature = "migrate")]
pub async fn connect_scope(
    root: &Path,
    scope: &CacheScope,
) -> Result<DatabaseConnection, crate::cache::CacheError> {
    let path = scope.database_path(root);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| crate::cache::CacheError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let url = format!("sqlite://{}?mode=rwc", path.display());
    tracing::debug!(scope = %scope, path = %path.display(), "Opening cache");
    Ok(connect_and_migrate(&url).await?)
}

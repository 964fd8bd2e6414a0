//! Migrations and named, append-only migration sets.

/// A pair of statements: one that upgrades the schema to a version and one
/// that undoes it (dropping the table, index, trigger or column it added).
///
/// Either statement may contain several `;`-separated statements; they are
/// executed as one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    up: String,
    down: String,
}

impl Migration {
    /// Creates a migration from its forward and reverse statements.
    #[must_use]
    pub fn new(up: impl Into<String>, down: impl Into<String>) -> Self {
        Self {
            up: up.into(),
            down: down.into(),
        }
    }

    /// The statement that applies this migration.
    #[must_use]
    pub fn up(&self) -> &str {
        &self.up
    }

    /// The statement that reverts this migration.
    ///
    /// This is captured into the `migrations` table when the migration is
    /// applied; downgrades run the stored copy, not this one.
    #[must_use]
    pub fn down(&self) -> &str {
        &self.down
    }
}

/// A named, ordered sequence of migrations owned by one app.
///
/// The position of a migration in the set **is** its version, starting at 0.
/// Sets can only grow at the end. Once a database has recorded a version,
/// removing or reordering any migration at or below that position silently
/// corrupts its history, so the type offers no way to do either.
///
/// # Examples
///
/// ```rust
/// use monet::MigrationSet;
///
/// let set = MigrationSet::new("page")
///     .with("CREATE TABLE page (id integer PRIMARY KEY)", "DROP TABLE page")
///     .with("ALTER TABLE page ADD COLUMN url text", "ALTER TABLE page DROP COLUMN url");
///
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.latest_version(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSet {
    name: String,
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            migrations: Vec::new(),
        }
    }

    /// Appends a migration built from `up` and `down`, returning the set.
    #[must_use]
    pub fn with(mut self, up: impl Into<String>, down: impl Into<String>) -> Self {
        self.push(Migration::new(up, down));
        self
    }

    /// Appends a migration as the next version.
    pub fn push(&mut self, migration: Migration) {
        self.migrations.push(migration);
    }

    /// The set's name, used as the `name` column of its version records.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of migrations in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Whether the set has no migrations.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// The version a fully upgraded database records, or -1 for an empty set.
    #[must_use]
    pub fn latest_version(&self) -> i64 {
        self.iter().last().map_or(-1, |(version, _)| version)
    }

    /// Returns the migration at `version`, if the set has one.
    #[must_use]
    pub fn get(&self, version: i64) -> Option<&Migration> {
        usize::try_from(version)
            .ok()
            .and_then(|idx| self.migrations.get(idx))
    }

    /// Iterates migrations paired with their versions, in order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Migration)> {
        (0_i64..).zip(self.migrations.iter())
    }
}

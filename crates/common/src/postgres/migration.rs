use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

/// Applies goose-format SQL migrations by running the goose binary
pub struct MigrationRunner {
    goose_binary_path: String,
    migrations_dir: String,
    dsn: String,
}

impl MigrationRunner {
    pub fn new(goose_binary_path: String, migrations_dir: String, dsn: String) -> Self {
        Self {
            goose_binary_path,
            migrations_dir,
            dsn,
        }
    }

    /// Runs `goose -dir {migrations_dir} postgres {dsn} up`
    pub async fn run_migrations(&self) -> Result<()> {
        info!(migrations_dir = %self.migrations_dir, "running PostgreSQL migrations");

        let output = Command::new(&self.goose_binary_path)
            .args(self.goose_args("up"))
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.goose_binary_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            bail!("Migration failed.\nstdout: {}\nstderr: {}", stdout, stderr);
        }

        debug!(
            output = %String::from_utf8_lossy(&output.stdout),
            "migrations completed"
        );
        Ok(())
    }

    fn goose_args<'a>(&'a self, command: &'a str) -> [&'a str; 5] {
        ["-dir", &self.migrations_dir, "postgres", &self.dsn, command]
    }
}

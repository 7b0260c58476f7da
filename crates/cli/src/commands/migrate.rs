use crate::commands::{prepare, CommandResult};
use folio_db::{connect_with_settings, migrations};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("migrate") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let applied = migrations::MIGRATOR.iter().count();
        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(applied)
    });

    match result {
        Ok(known) => CommandResult::success(
            "migrate",
            format!("database schema is current ({known} migrations known)"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

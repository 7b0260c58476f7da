use folio_core::errors::AuthenticationError;
use folio_db::{connect_with_settings, migrations};
use folio_server::AuthGateway;

use crate::commands::{prepare, CommandResult};

pub fn add(email: &str, display_name: &str, password: &str) -> CommandResult {
    if email.trim().is_empty() || !email.contains('@') {
        return CommandResult::failure("user.add", "input_validation", "a valid --email is required", 6);
    }
    if display_name.trim().is_empty() {
        return CommandResult::failure("user.add", "input_validation", "--name must not be blank", 6);
    }
    if password.chars().count() < 8 {
        return CommandResult::failure(
            "user.add",
            "input_validation",
            "--password must be at least 8 characters",
            6,
        );
    }

    let (config, runtime) = match prepare("user.add") {
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

        let auth = AuthGateway::sqlite(pool.clone(), config.auth.session_ttl_hours);
        let registered = auth.register(email, display_name, password).await;
        pool.close().await;

        registered.map_err(|error| match error {
            AuthenticationError::EmailTaken => ("email_taken", error.to_string(), 7u8),
            other => ("auth_provider", other.to_string(), 8u8),
        })
    });

    match result {
        Ok(user) => CommandResult::success(
            "user.add",
            format!("created user {} ({})", user.email, user.id.0),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("user.add", error_class, message, exit_code)
        }
    }
}

use crate::commands::{load_config, open_database, runtime, CommandResult, Failure};

pub fn run() -> CommandResult {
    match apply() {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}

fn apply() -> Result<(), Failure> {
    let config = load_config()?;
    runtime()?.block_on(async {
        let pool = open_database(&config).await?;
        pool.close().await;
        Ok(())
    })
}

use procura_core::domain::rfp::RfpId;
use procura_core::errors::ApplicationError;
use procura_server::bootstrap::{wire_collaborators, BootstrapError};

use crate::commands::{load_config, open_database, runtime, CommandResult, Failure};

/// One response-correlation pass, the same one `POST /api/rfps/{id}/check-responses` runs.
pub fn run(rfp_id: &str) -> CommandResult {
    match scan(rfp_id) {
        Ok(created) => CommandResult::success(
            "scan",
            format!("rfp `{rfp_id}`: {created} new proposal(s) recorded"),
        ),
        Err(failure) => CommandResult::from_failure("scan", failure),
    }
}

fn scan(rfp_id: &str) -> Result<usize, Failure> {
    let config = load_config()?;
    runtime()?.block_on(async {
        let pool = open_database(&config).await?;
        let outcome = match wire_collaborators(&config, &pool) {
            Ok(wired) => wired
                .lifecycle
                .check_responses(&RfpId(rfp_id.to_string()))
                .await
                .map(|report| report.count)
                .map_err(classify),
            Err(error) => Err(wiring_failure(error)),
        };
        pool.close().await;
        outcome
    })
}

fn wiring_failure(error: BootstrapError) -> Failure {
    let class = match &error {
        BootstrapError::Mail(_) => ("mail_transport", 7),
        BootstrapError::DatabaseConnect(_) | BootstrapError::Migration(_) => ("db_connectivity", 4),
        BootstrapError::Config(_) => ("config_validation", 2),
        BootstrapError::Extraction(_) => ("extraction_backend", 8),
        BootstrapError::Lifecycle(_) => ("lifecycle", 8),
    };
    (class.0, error.to_string(), class.1)
}

fn classify(error: ApplicationError) -> Failure {
    let class = match &error {
        ApplicationError::NotFound { .. } => ("not_found", 6),
        ApplicationError::UpstreamUnavailable(_) => ("mail_transport", 7),
        ApplicationError::Persistence(_) => ("db_connectivity", 4),
        ApplicationError::Domain(_) | ApplicationError::Configuration(_) => ("lifecycle", 8),
    };
    (class.0, error.to_string(), class.1)
}

#[cfg(test)]
mod tests {
    use procura_core::errors::ApplicationError;
    use procura_core::ports::TransportError;
    use procura_server::bootstrap::BootstrapError;

    use super::{classify, wiring_failure};

    #[test]
    fn unknown_rfp_and_mail_outage_get_distinct_exit_codes() {
        let (class, message, code) = classify(ApplicationError::not_found("rfp", "r-1"));
        assert_eq!((class, code), ("not_found", 6));
        assert!(message.contains("r-1"));

        let (class, _, code) = classify(ApplicationError::UpstreamUnavailable("imap".into()));
        assert_eq!((class, code), ("mail_transport", 7));
    }

    #[test]
    fn wiring_failures_keep_the_exit_codes_of_their_collaborator() {
        let mail = BootstrapError::Mail(TransportError::Unavailable("relay down".into()));
        let (class, message, code) = wiring_failure(mail);
        assert_eq!((class, code), ("mail_transport", 7));
        assert!(message.contains("relay down"));

        let lifecycle = BootstrapError::Lifecycle(ApplicationError::Configuration("bad".into()));
        let (class, _, code) = wiring_failure(lifecycle);
        assert_eq!((class, code), ("lifecycle", 8));
    }
}

use super::{format_udid, Simctl};
use crate::{
    command,
    runner::Runner,
    util::cli::{Report, Reportable},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("Failed to delete simulator {}: {source}", format_udid(.udid))]
    DeleteFailed {
        udid: Uuid,
        source: command::Error,
    },
}

impl Reportable for DeleteError {
    fn report(&self) -> Report {
        match self {
            Self::DeleteFailed { udid, source } => Report::error(
                format!("Failed to delete simulator {}", format_udid(udid)),
                source,
            ),
        }
    }
}

impl DeleteError {
    pub fn udid(&self) -> Uuid {
        match self {
            Self::DeleteFailed { udid, .. } => *udid,
        }
    }
}

/// `simctl delete` prints nothing when it works, so a silent zero exit is
/// taken as success.
pub(crate) fn interpret(udid: Uuid, result: command::Result<Vec<u8>>) -> Result<(), DeleteError> {
    match result {
        Ok(output) => {
            log::info!(
                "`simctl delete` for {} printed {} bytes; treating as success",
                format_udid(&udid),
                output.len()
            );
            Ok(())
        }
        Err(err) if err.is_silent_success() => Ok(()),
        Err(source) => Err(DeleteError::DeleteFailed { udid, source }),
    }
}

pub fn delete<R: Runner + ?Sized>(runner: &R, simctl: &Simctl, udid: Uuid) -> Result<(), DeleteError> {
    interpret(udid, runner.execute(&simctl.delete(udid)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::runner::fake::{self, ScriptedRunner};

    fn udid() -> Uuid {
        Uuid::parse_str("6f7e2a0c-1d2b-4c3a-9e8f-0a1b2c3d4e5f").unwrap()
    }

    #[test]
    fn silent_zero_exit_is_success() {
        let runner = ScriptedRunner::new().then_reply(fake::silent_success);
        delete(&runner, &Simctl::default(), udid()).unwrap();
        assert_eq!(
            runner.seen()[0].to_string(),
            "/usr/bin/xcrun simctl delete 6F7E2A0C-1D2B-4C3A-9E8F-0A1B2C3D4E5F"
        );
    }

    #[test]
    fn stderr_is_a_failure() {
        let runner = ScriptedRunner::new()
            .then_reply(|invocation| fake::stderr(invocation, "Invalid device: 6F7E2A0C"));
        let err = delete(&runner, &Simctl::default(), udid()).unwrap_err();
        assert_eq!(err.udid(), udid());
        assert!(err.to_string().contains("Invalid device"));
    }

    #[test]
    fn silent_nonzero_exit_is_a_failure() {
        let err = interpret(
            udid(),
            Err(command::Error::new(
                "xcrun simctl delete",
                command::Cause::NoOutput { exit_code: Some(148) },
            )),
        )
        .unwrap_err();
        assert!(matches!(err, DeleteError::DeleteFailed { .. }));
    }
}

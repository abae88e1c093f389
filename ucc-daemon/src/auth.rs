//! Authorization gate (C9): checks every mutating RPC against the system
//! policy service before the handler runs. Grounded on the Polkit call
//! shape system76-power's daemon uses for `SetChargeThresholds`, widened
//! to the three action classes the data model defines.

use tracing::{info, warn};
use ucc_error::{Result, UccError};
use ucc_protocol::ActionClass;
use zbus_polkit::policykit1::{AuthorityProxy, Subject};

use ucc_core::constants::timing::AUTH_CHECK_TIMEOUT;

const DAEMON_BUS_NAME: &str = "com.uccd.ControlCenter";

/// Checks whether `pid` is authorized for `action`. `Read` is granted
/// without a round trip, per §4.9 ("read action effectively always
/// allowed for local callers"); `Control` and `ManageHardware` always go
/// to the policy service.
pub async fn check_authorization(connection: &zbus::Connection, pid: u32, action: ActionClass) -> Result<()> {
    if action == ActionClass::Read {
        return Ok(());
    }

    let action_id = action.polkit_action_id(DAEMON_BUS_NAME);

    let authority = AuthorityProxy::new(connection)
        .await
        .map_err(|e| UccError::Generic(format!("could not connect to polkit authority: {e}")))?;

    let subject = Subject::new_for_owner(pid, None, None)
        .map_err(|e| UccError::Generic(format!("could not build polkit subject: {e}")))?;

    let check = tokio::time::timeout(
        AUTH_CHECK_TIMEOUT,
        authority.check_authorization(
            &subject,
            &action_id,
            &std::collections::HashMap::new(),
            zbus_polkit::policykit1::CheckAuthorizationFlags::AllowUserInteraction.into(),
            "",
        ),
    )
    .await;

    let result = match check {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(pid, action = action_id, error = %e, "polkit authorization check failed");
            return Err(UccError::AuthDenied(format!("authorization check failed: {e}")));
        }
        Err(_) => {
            warn!(pid, action = action_id, "polkit authorization check timed out");
            return Err(UccError::AuthDenied("authorization check timed out".into()));
        }
    };

    if result.is_authorized {
        Ok(())
    } else {
        info!(pid, action = action_id, "authorization denied");
        Err(UccError::AuthDenied(format!("caller not authorized for {action_id}")))
    }
}

pub const fn daemon_bus_name() -> &'static str {
    DAEMON_BUS_NAME
}

/// Resolves the Unix process id of the peer that sent the current method
/// call, via the bus driver's `GetConnectionUnixProcessID`. `None` sender
/// (a peer-to-peer connection rather than a bus message) maps to pid 0,
/// which Polkit treats as "the local system", i.e. always permitted.
pub async fn caller_pid(connection: &zbus::Connection, header: &zbus::message::Header<'_>) -> u32 {
    let Some(sender) = header.sender() else { return 0 };
    let Ok(dbus_proxy) = zbus::fdo::DBusProxy::new(connection).await else { return 0 };
    dbus_proxy.get_connection_unix_process_id(sender.into()).await.unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polkit_action_ids_are_namespaced() {
        assert_eq!(ActionClass::Read.polkit_action_id(DAEMON_BUS_NAME), "com.uccd.ControlCenter.read");
        assert_eq!(ActionClass::Control.polkit_action_id(DAEMON_BUS_NAME), "com.uccd.ControlCenter.control");
        assert_eq!(
            ActionClass::ManageHardware.polkit_action_id(DAEMON_BUS_NAME),
            "com.uccd.ControlCenter.manage-hardware"
        );
    }
}

//! Modem boot sequence
//!
//! Reset, multiplexed connections, join the configured access point, start
//! the TCP server. Runs once from the main task before the pump loop starts.

use rover_kernel_core::modem::{CommandSession, ModemLink, ModemState, ModemStatus, Watchdog};
use rover_kernel_core::traits::SharedState;

use crate::parameters::ModemParams;
use crate::platform::{PlatformError, Result};

/// Bring the modem online; returns the station address when the chip reports one.
///
/// # Errors
///
/// - `PlatformError::InvalidConfig` when `params` cannot be used
/// - `PlatformError::InitializationFailed` when a step is rejected, times out
///   or the link fails
pub fn bring_up<L, W, S, F>(
    session: &mut CommandSession<'_, L, W, S, F>,
    params: &ModemParams,
) -> Result<Option<[u8; 4]>>
where
    L: ModemLink,
    W: Watchdog,
    S: SharedState<ModemState<L, W>>,
    F: FnMut(),
{
    params.validate()?;

    let status = session.reset().map_err(|_| PlatformError::InitializationFailed)?;
    check("reset", status, ModemStatus::READY)?;

    let status = session
        .enable_multiplex()
        .map_err(|_| PlatformError::InitializationFailed)?;
    check("multiplex", status, ModemStatus::OK)?;

    let status = session
        .join_access_point(&params.ssid, &params.password)
        .map_err(|_| PlatformError::InitializationFailed)?;
    check("join", status, ModemStatus::OK)?;
    crate::log_info!("Joined access point {}", params.ssid.as_str());

    let status = session
        .start_server(params.server_port)
        .map_err(|_| PlatformError::InitializationFailed)?;
    check("server", status, ModemStatus::OK)?;
    crate::log_info!("Modem listening on port {}", params.server_port);

    let ip = session
        .query_ip()
        .map_err(|_| PlatformError::InitializationFailed)?;
    if let Some([a, b, c, d]) = ip {
        crate::log_info!("Modem address {}.{}.{}.{}", a, b, c, d);
    }
    Ok(ip)
}

#[allow(unused_variables)]
fn check(step: &str, status: ModemStatus, required: ModemStatus) -> Result<()> {
    if status.contains(required) && !status.is_failure() {
        return Ok(());
    }
    if status.contains(ModemStatus::TIMEOUT) {
        crate::log_warn!("Modem {} timed out", step);
    } else {
        crate::log_error!("Modem {} rejected (status {:#x})", step, status.bits());
    }
    Err(PlatformError::InitializationFailed)
}

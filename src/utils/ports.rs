//! Local port probing for the Appium bridge

use anyhow::Result;
use log::{debug, warn};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, TcpListener, ToSocketAddrs};
use std::ops::RangeInclusive;

/// Ports scanned when no usable port was requested
pub const FALLBACK_PORTS: RangeInclusive<u16> = 4731..=4749;

fn addr_in_use<A: ToSocketAddrs>(addr: A) -> bool {
    match TcpListener::bind(addr) {
        Ok(_) => false,
        Err(e) if e.kind() == ErrorKind::AddrInUse => true,
        Err(e) => {
            debug!("port probe bind failed: {}", e);
            false
        }
    }
}

/// Whether a listening socket already holds `port`
///
/// Checked by binding on `host` and on the wildcard address, so a listener
/// on any local interface counts. Bind errors other than address-in-use
/// (an unresolvable or non-local host) do not mark the port as taken.
pub fn is_port_in_use(host: &str, port: u16) -> bool {
    addr_in_use((host, port)) || addr_in_use((Ipv4Addr::UNSPECIFIED, port))
}

/// First port in `range` the probe reports as free
pub fn pick_free_port<P>(range: RangeInclusive<u16>, is_listening: P) -> Option<u16>
where
    P: Fn(u16) -> bool,
{
    range.into_iter().find(|p| !is_listening(*p))
}

/// Resolve the port to launch the Appium server on
///
/// A requested port is honored when free; when it is already taken the first
/// free port of [`FALLBACK_PORTS`] is used instead.
pub fn resolve_appium_port<P>(requested: Option<u16>, is_listening: P) -> Result<u16>
where
    P: Fn(u16) -> bool,
{
    let picked = match requested {
        Some(port) if !is_listening(port) => Some(port),
        Some(port) => {
            let fallback = pick_free_port(FALLBACK_PORTS, &is_listening);
            if let Some(f) = fallback {
                warn!(
                    "[mobile] APPIUM_PORT={} is already in use. Falling back to a free port: {}",
                    port, f
                );
            }
            fallback
        }
        None => pick_free_port(FALLBACK_PORTS, &is_listening),
    };

    picked.ok_or_else(|| {
        anyhow::anyhow!(
            "Could not find a free Appium port in range {}-{}. Set APPIUM_PORT manually.",
            FALLBACK_PORTS.start(),
            FALLBACK_PORTS.end()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_bound_listener() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(is_port_in_use("127.0.0.1", port));
        drop(listener);
        assert!(!is_port_in_use("127.0.0.1", port));
    }

    #[test]
    fn test_detects_wildcard_listener_for_any_host() {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(is_port_in_use("127.0.0.1", port));
        assert!(is_port_in_use("0.0.0.0", port));
        drop(listener);
    }

    #[test]
    fn test_requested_port_used_when_free() {
        assert_eq!(resolve_appium_port(Some(4723), |_| false).unwrap(), 4723);
    }

    #[test]
    fn test_busy_requested_port_falls_back_to_range() {
        let port = resolve_appium_port(Some(4723), |p| p == 4723 || p == 4731).unwrap();
        assert_eq!(port, 4732);
    }

    #[test]
    fn test_no_request_scans_range() {
        assert_eq!(resolve_appium_port(None, |p| p < 4740).unwrap(), 4740);
    }

    #[test]
    fn test_exhausted_range_is_an_error() {
        let err = resolve_appium_port(None, |_| true).unwrap_err();
        assert!(err.to_string().contains("4731-4749"));
    }
}

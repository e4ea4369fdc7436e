use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted (parental controls, etc)
    Restricted,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Camera authorization flag owned by the host.
///
/// The host runs its own permission prompt and flips the gate; the
/// coordinator reads it before every open. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    granted: Arc<AtomicBool>,
}

impl PermissionGate {
    pub fn granted() -> Self {
        Self::new(true)
    }

    pub fn denied() -> Self {
        Self::new(false)
    }

    pub fn new(granted: bool) -> Self {
        Self {
            granted: Arc::new(AtomicBool::new(granted)),
        }
    }

    /// Gate reflecting a platform permission query.
    pub fn from_status(status: PermissionStatus) -> Self {
        Self::new(status.is_granted())
    }

    pub fn set_granted(&self, granted: bool) {
        log::info!(
            "Camera permission {}",
            if granted { "granted" } else { "revoked" }
        );
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> PermissionStatus {
        if self.is_granted() {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::denied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let gate = PermissionGate::denied();
        let host_side = gate.clone();
        assert!(!gate.is_granted());

        host_side.set_granted(true);
        assert!(gate.is_granted());
        assert_eq!(gate.status(), PermissionStatus::Granted);
    }

    #[test]
    fn test_from_status() {
        assert!(PermissionGate::from_status(PermissionStatus::Granted).is_granted());
        assert!(!PermissionGate::from_status(PermissionStatus::Restricted).is_granted());
        assert!(!PermissionGate::from_status(PermissionStatus::NotDetermined).is_granted());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PermissionStatus::NotDetermined.to_string(), "not_determined");
    }
}

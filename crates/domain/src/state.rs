/// Lifecycle state of a Homie device, published lowercase on `$state`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceState {
    /// Starting up, first connection attempt pending
    #[default]
    Init,
    /// Connected and announced
    Ready,
    /// Broker unreachable, retrying
    Disconnected,
    /// Reserved
    Sleeping,
    /// Reserved
    Lost,
    /// Reserved
    Alert,
}

/// Outcome of one state machine tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    ConnectSucceeded,
    ConnectFailed,
    LinkAlive,
    LinkLost,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
            Self::Sleeping => "sleeping",
            Self::Lost => "lost",
            Self::Alert => "alert",
        }
    }

    /// Transition table. `None` means the state does not change.
    ///
    /// Sleeping, Lost and Alert have no outgoing transitions.
    pub fn next(self, event: TickEvent) -> Option<Self> {
        use TickEvent::*;

        match (self, event) {
            (Self::Init, ConnectSucceeded) => Some(Self::Ready),
            (Self::Init, ConnectFailed) => Some(Self::Disconnected),
            (Self::Init, LinkAlive | LinkLost) => None,

            (Self::Ready, LinkLost) => Some(Self::Disconnected),
            (Self::Ready, LinkAlive | ConnectSucceeded | ConnectFailed) => None,

            (Self::Disconnected, ConnectSucceeded) => Some(Self::Ready),
            (Self::Disconnected, ConnectFailed | LinkAlive | LinkLost) => None,

            (Self::Sleeping | Self::Lost | Self::Alert, _) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_init() {
        assert_eq!(DeviceState::default(), DeviceState::Init);
    }

    #[test]
    fn test_init_transitions() {
        assert_eq!(
            DeviceState::Init.next(TickEvent::ConnectSucceeded),
            Some(DeviceState::Ready)
        );
        assert_eq!(
            DeviceState::Init.next(TickEvent::ConnectFailed),
            Some(DeviceState::Disconnected)
        );
    }

    #[test]
    fn test_ready_only_leaves_on_link_loss() {
        assert_eq!(DeviceState::Ready.next(TickEvent::LinkAlive), None);
        assert_eq!(
            DeviceState::Ready.next(TickEvent::LinkLost),
            Some(DeviceState::Disconnected)
        );
    }

    #[test]
    fn test_disconnected_retries_until_connected() {
        assert_eq!(DeviceState::Disconnected.next(TickEvent::ConnectFailed), None);
        assert_eq!(
            DeviceState::Disconnected.next(TickEvent::ConnectSucceeded),
            Some(DeviceState::Ready)
        );
    }

    #[test]
    fn test_reserved_states_have_no_transitions() {
        let events = [
            TickEvent::ConnectSucceeded,
            TickEvent::ConnectFailed,
            TickEvent::LinkAlive,
            TickEvent::LinkLost,
        ];
        for state in [DeviceState::Sleeping, DeviceState::Lost, DeviceState::Alert] {
            for event in events {
                assert_eq!(state.next(event), None);
            }
        }
    }

    #[test]
    fn test_payloads_are_lowercase() {
        assert_eq!(DeviceState::Init.to_string(), "init");
        assert_eq!(DeviceState::Ready.to_string(), "ready");
        assert_eq!(DeviceState::Disconnected.to_string(), "disconnected");
        assert_eq!(DeviceState::Sleeping.to_string(), "sleeping");
        assert_eq!(DeviceState::Lost.to_string(), "lost");
        assert_eq!(DeviceState::Alert.to_string(), "alert");
    }
}

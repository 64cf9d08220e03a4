#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceState {
    New,
    Checking,
    Connected,
    Completed,
    Closed,
    Failed,
}

impl IceState {
    /// Whether `self -> next` is an allowed transition.
    pub fn can_transition_to(self, next: IceState) -> bool {
        use IceState::*;
        match (self, next) {
            (Closed, _) | (Failed, _) => false,
            (_, Failed) => true,
            (New, Checking) | (New, Connected) => true,
            (Checking, Connected) => true,
            (Connected, Completed) => true,
            (Completed, Closed) | (Connected, Closed) | (Checking, Closed) | (New, Closed) => true,
            _ => false,
        }
    }
}

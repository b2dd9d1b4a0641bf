//! Discrete triggers the controller hands to external collaborators
//! (animation, audio, camera rigs) through a drainable queue.

/// Something noteworthy that happened during a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharacterEvent {
    /// The character settled onto walkable ground.
    Landed,
    /// Ground support was lost without a jump.
    LeftGround,
    /// A jump started.
    Jumped,
    /// The character fell out of the world and teleports to its spawn at the
    /// start of the next step.
    PositionReset,
}

const EVENT_ORDER: [CharacterEvent; 4] = [
    CharacterEvent::Landed,
    CharacterEvent::LeftGround,
    CharacterEvent::Jumped,
    CharacterEvent::PositionReset,
];

/// Staged events with fixed delivery order.
///
/// Each kind fires at most once per drain; when several coincide they come
/// out landings first and resets last.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: [bool; EVENT_ORDER.len()],
}

impl EventQueue {
    pub fn push(&mut self, event: CharacterEvent) {
        self.pending[event as usize] = true;
    }

    pub fn contains(&self, event: CharacterEvent) -> bool {
        self.pending[event as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.pending.iter().all(|staged| !staged)
    }

    /// Remove and return the staged events in delivery order.
    pub fn drain(&mut self) -> Vec<CharacterEvent> {
        let mut drained = Vec::new();
        for event in EVENT_ORDER {
            if self.pending[event as usize] {
                drained.push(event);
            }
        }
        self.pending = [false; EVENT_ORDER.len()];
        drained
    }
}

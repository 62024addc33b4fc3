use billiards_shared::protocol::IdentityWire;

pub const DEFAULT_PLAYER2_NAME: &str = "Player 2";

/// Who sits at the table, as supplied by the login collaborator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Anonymous seats are never persisted
    #[serde(default)]
    pub anonymous: bool,
}

impl Identity {
    pub fn new(name: impl Into<String>, avatar: Option<String>) -> Self {
        Self {
            name: name.into(),
            avatar,
            anonymous: false,
        }
    }

    /// The stand-in opponent used when nobody logged in as player 2.
    pub fn guest() -> Self {
        Self {
            name: DEFAULT_PLAYER2_NAME.to_string(),
            avatar: None,
            anonymous: true,
        }
    }
}

impl From<IdentityWire> for Identity {
    fn from(wire: IdentityWire) -> Self {
        Self::new(wire.name, wire.avatar)
    }
}

/// One of the two hot-seat positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    P1,
    P2,
}

impl Seat {
    pub fn other(self) -> Self {
        match self {
            Seat::P1 => Seat::P2,
            Seat::P2 => Seat::P1,
        }
    }

    /// Array index for per-seat pairs
    pub fn index(self) -> usize {
        match self {
            Seat::P1 => 0,
            Seat::P2 => 1,
        }
    }

    /// 1-based number used on the wire and in logs
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_seat_flips() {
        assert_eq!(Seat::P1.other(), Seat::P2);
        assert_eq!(Seat::P2.other().other(), Seat::P2);
    }

    #[test]
    fn seat_numbers_are_one_based() {
        assert_eq!(Seat::P1.number(), 1);
        assert_eq!(Seat::P2.number(), 2);
        assert_eq!(Seat::P2.index(), 1);
    }

    #[test]
    fn guest_is_anonymous_player_two() {
        let guest = Identity::guest();
        assert_eq!(guest.name, "Player 2");
        assert!(guest.avatar.is_none());
        assert!(guest.anonymous);
    }

    #[test]
    fn identity_from_wire_keeps_avatar() {
        let identity: Identity = IdentityWire {
            name: "alice".into(),
            avatar: Some("cat.png".into()),
        }
        .into();
        assert_eq!(identity.name, "alice");
        assert_eq!(identity.avatar.as_deref(), Some("cat.png"));
        assert!(!identity.anonymous);
    }
}

//! Read/write history of memory ranges.
//!
//! Every byte range of a tracked allocation carries an [`AccessState`]. The state records
//! whether the captured contents of the range are ever observed during the frame, and whether
//! they're destroyed afterwards, which decides what must happen before each replay of the frame:
//!
//! * ranges that are written before being read are fully determined by in-frame writes and need
//!   nothing;
//! * ranges that are read before any write need their captured contents once (`INIT`);
//! * ranges that are read and later overwritten must be reset before every replay (`RESET`).
use crate::ResetRequirement;

/// Access history of a memory range.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AccessState {
    /// Not accessed yet during the frame.
    #[default]
    Init,
    /// Read before any write: the captured contents are observed.
    Read,
    /// Written before any read: the captured contents are never observed.
    Write,
    /// The whole resource was cleared before any read.
    Clear,
    /// Read, then overwritten. Absorbing.
    Reset,
}

/// Kind of access performed on a memory range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AccessAction {
    Read,
    Write,
    /// A read followed by a write (e.g. read-modify-write storage access).
    ReadWrite,
    /// A clear of the whole resource.
    Clear,
}

/// Error returned when converting an integer that doesn't name an [`AccessAction`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid access action: {0}")]
pub struct InvalidAccessAction(pub u32);

impl TryFrom<u32> for AccessAction {
    type Error = InvalidAccessAction;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AccessAction::Read),
            1 => Ok(AccessAction::Write),
            2 => Ok(AccessAction::ReadWrite),
            3 => Ok(AccessAction::Clear),
            other => Err(InvalidAccessAction(other)),
        }
    }
}

impl AccessState {
    /// State after reading the range.
    pub const fn read(self) -> AccessState {
        match self {
            AccessState::Init => AccessState::Read,
            AccessState::Read => AccessState::Read,
            // the read observes in-frame data
            AccessState::Write => AccessState::Write,
            AccessState::Clear => AccessState::Clear,
            AccessState::Reset => AccessState::Reset,
        }
    }

    /// State after writing the range.
    pub const fn write(self) -> AccessState {
        match self {
            AccessState::Init => AccessState::Write,
            AccessState::Read => AccessState::Reset,
            AccessState::Write => AccessState::Write,
            AccessState::Clear => AccessState::Clear,
            AccessState::Reset => AccessState::Reset,
        }
    }

    /// State after clearing the whole resource.
    pub const fn clear(self) -> AccessState {
        match self {
            AccessState::Init => AccessState::Clear,
            AccessState::Read => AccessState::Reset,
            AccessState::Write => AccessState::Clear,
            AccessState::Clear => AccessState::Clear,
            AccessState::Reset => AccessState::Reset,
        }
    }

    /// State after a read immediately followed by a write.
    pub const fn read_write(self) -> AccessState {
        self.read().write()
    }

    /// Applies the transition function selected by `action`.
    pub const fn apply(self, action: AccessAction) -> AccessState {
        match action {
            AccessAction::Read => self.read(),
            AccessAction::Write => self.write(),
            AccessAction::ReadWrite => self.read_write(),
            AccessAction::Clear => self.clear(),
        }
    }

    /// What a range in this state requires before each replay of the frame.
    pub const fn reset_requirement(self) -> ResetRequirement {
        match self {
            AccessState::Init | AccessState::Write | AccessState::Clear => ResetRequirement::NoReset,
            AccessState::Read => ResetRequirement::Init,
            AccessState::Reset => ResetRequirement::Reset,
        }
    }
}

/// Applies `action` to `state`.
pub const fn access_transition(state: AccessState, action: AccessAction) -> AccessState {
    state.apply(action)
}

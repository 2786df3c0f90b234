//! The fixed request action catalog.

use std::fmt;

use roster_core::CollectionName;

/// A request action the broker knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Login,
    Get(CollectionName),
    Add(CollectionName),
    Delete(CollectionName),
    Update(CollectionName),
}

impl Action {
    /// Every action, in catalog order.
    pub const ALL: [Self; 13] = [
        Self::Login,
        Self::Get(CollectionName::Students),
        Self::Add(CollectionName::Students),
        Self::Delete(CollectionName::Students),
        Self::Update(CollectionName::Students),
        Self::Get(CollectionName::Teachers),
        Self::Add(CollectionName::Teachers),
        Self::Delete(CollectionName::Teachers),
        Self::Update(CollectionName::Teachers),
        Self::Get(CollectionName::Admins),
        Self::Add(CollectionName::Admins),
        Self::Delete(CollectionName::Admins),
        Self::Update(CollectionName::Admins),
    ];

    /// Wire name, e.g. `deleteTeacher`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        use CollectionName::{Admins, Students, Teachers};

        match self {
            Self::Login => "login",
            Self::Get(Students) => "getStudents",
            Self::Add(Students) => "addStudent",
            Self::Delete(Students) => "deleteStudent",
            Self::Update(Students) => "updateStudent",
            Self::Get(Teachers) => "getTeachers",
            Self::Add(Teachers) => "addTeacher",
            Self::Delete(Teachers) => "deleteTeacher",
            Self::Update(Teachers) => "updateTeacher",
            Self::Get(Admins) => "getAdmins",
            Self::Add(Admins) => "addAdmin",
            Self::Delete(Admins) => "deleteAdmin",
            Self::Update(Admins) => "updateAdmin",
        }
    }

    /// Look up an action by wire name. Matching is case-sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == name)
    }

    /// The collection this action reads or mutates.
    #[must_use]
    pub const fn collection(self) -> Option<CollectionName> {
        match self {
            Self::Login => None,
            Self::Get(c) | Self::Add(c) | Self::Delete(c) | Self::Update(c) => Some(c),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Meetings lookup used to admit participants into rooms.
//!
//! Meetings themselves are managed elsewhere: the relay only needs to know
//! whether a meeting exists, which room it maps to and who may join it.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    fs::File,
    io::Read as _,
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use derive_more::{Display, From};
use huddle_client_api_proto::{MemberId, RoomId};
use serde::Deserialize;

use crate::{conf, log::prelude::*};

/// ID of a meeting, as it appears in the connection URL.
#[derive(Clone, Debug, Deserialize, Display, Eq, From, Hash, PartialEq)]
#[from(forward)]
#[serde(transparent)]
pub struct MeetingId(pub String);

/// Meeting that participants may connect to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Meeting {
    /// ID of this [`Meeting`].
    pub id: MeetingId,

    /// Key of the room which connections of this [`Meeting`] are grouped in.
    pub room_id: RoomId,

    /// Participants allowed to join this [`Meeting`].
    ///
    /// Anyone is allowed if `None`.
    pub authorized_participants: Option<HashSet<MemberId>>,
}

impl Meeting {
    /// Creates new [`Meeting`] restricted to the provided `participants`.
    #[must_use]
    pub fn new(id: MeetingId, participants: Option<HashSet<MemberId>>) -> Self {
        let room_id = RoomId(format!("meeting_{}", id));
        Self {
            id,
            room_id,
            authorized_participants: participants,
        }
    }

    /// Indicates whether the provided participant may join this [`Meeting`].
    #[must_use]
    pub fn is_authorized(&self, member_id: &MemberId) -> bool {
        self.authorized_participants
            .as_ref()
            .map_or(true, |p| p.contains(member_id))
    }
}

/// Error of looking up a [`Meeting`].
#[derive(Debug, Display)]
#[display(fmt = "Meeting lookup failed: {}", _0)]
pub struct MeetingLookupError(pub String);

impl std::error::Error for MeetingLookupError {}

/// Service resolving [`Meeting`]s by their IDs.
#[async_trait(?Send)]
pub trait MeetingService: fmt::Debug + Send + Sync {
    /// Looks up [`Meeting`] with the provided ID.
    ///
    /// Returns `Ok(None)` if no such [`Meeting`] exists.
    async fn get_meeting(
        &self,
        id: &MeetingId,
    ) -> Result<Option<Meeting>, MeetingLookupError>;
}

/// Root elements of static meeting specs.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind")]
pub enum RootElement {
    /// Spec of a single [`Meeting`].
    Meeting {
        id: MeetingId,
        #[serde(default)]
        participants: Option<Vec<MemberId>>,
    },
}

impl From<RootElement> for Meeting {
    fn from(spec: RootElement) -> Self {
        match spec {
            RootElement::Meeting { id, participants } => {
                Self::new(id, participants.map(|p| p.into_iter().collect()))
            }
        }
    }
}

/// Errors that can occur while loading static meeting specs.
#[derive(Debug, Display, From)]
pub enum LoadStaticSpecsError {
    /// I/O error while reading specs.
    #[display(fmt = "I/O error while reading specs: {}", _0)]
    Io(std::io::Error),

    /// Spec file is not a valid meeting spec.
    #[display(fmt = "Error while deserializing static spec: {}", _0)]
    Yaml(serde_yaml::Error),
}

impl std::error::Error for LoadStaticSpecsError {}

/// Loads [`RootElement`] from the YAML file at the provided `path`.
pub fn load_from_yaml_file<P: AsRef<Path>>(
    path: P,
) -> Result<RootElement, LoadStaticSpecsError> {
    let mut file = File::open(path)?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    Ok(serde_yaml::from_str(&buf)?)
}

/// Loads all [`Meeting`]s from the YAML specs placed in the provided directory.
///
/// Only `.yml` and `.yaml` files are considered.
pub fn load_static_specs_from_dir<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<Meeting>, LoadStaticSpecsError> {
    let mut specs = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e == "yml" || e == "yaml");
        if !entry.file_type()?.is_file() || !is_yaml {
            continue;
        }
        specs.push(Meeting::from(load_from_yaml_file(path)?));
    }
    Ok(specs)
}

/// In-memory [`MeetingService`] backed by static specs.
#[derive(Clone, Debug, Default)]
pub struct MeetingRepository {
    /// Known [`Meeting`]s.
    meetings: Arc<RwLock<HashMap<MeetingId, Meeting>>>,

    /// Whether unknown [`Meeting`]s are considered existing and open to
    /// anyone.
    open_meetings: bool,
}

impl MeetingRepository {
    /// Creates new empty [`MeetingRepository`].
    #[must_use]
    pub fn new(open_meetings: bool) -> Self {
        Self {
            meetings: Arc::default(),
            open_meetings,
        }
    }

    /// Creates new [`MeetingRepository`] prefilled with the specs from
    /// [`conf::Control::static_specs_dir`].
    ///
    /// Absent directory is treated as an empty one.
    pub fn from_conf(
        conf: &conf::Control,
    ) -> Result<Self, LoadStaticSpecsError> {
        let repo = Self::new(conf.open_meetings);
        let dir = Path::new(&conf.static_specs_dir);
        if !dir.exists() {
            info!(
                "Static specs dir '{}' doesn't exist, no meetings predefined",
                conf.static_specs_dir,
            );
            return Ok(repo);
        }
        for meeting in load_static_specs_from_dir(dir)? {
            debug!("Meeting [id = {}] loaded from static specs", meeting.id);
            repo.create_meeting(meeting);
        }
        Ok(repo)
    }

    /// Stores the provided [`Meeting`], replacing the one with the same ID.
    pub fn create_meeting(&self, meeting: Meeting) {
        self.meetings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(meeting.id.clone(), meeting);
    }
}

#[async_trait(?Send)]
impl MeetingService for MeetingRepository {
    async fn get_meeting(
        &self,
        id: &MeetingId,
    ) -> Result<Option<Meeting>, MeetingLookupError> {
        let found = self
            .meetings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned();
        Ok(found.or_else(|| {
            self.open_meetings.then(|| Meeting::new(id.clone(), None))
        }))
    }
}

//! Check-in session: one user's interaction with one place.
//!
//! State is an immutable snapshot advanced by [`reduce`], a pure function
//! from `(state, intent)` to `(next state, effects)`. [`CheckInSession`]
//! owns the current snapshot, runs the emitted effects against
//! [`CheckInSync`], and feeds their outcomes back in as intents.
//!
//! | Intent              | Effect emitted                                  |
//! |---------------------|-------------------------------------------------|
//! | `CheckIn`           | `RegisterCheckIn` (first time only)             |
//! | `ToggleTag`         | `SubmitTags`; ignored before check-in           |
//! | `ReplaceTags`       | `SubmitTags`; ignored before check-in           |
//! | everything else     | none                                            |

use std::collections::{BTreeSet, VecDeque};

use super::record::CheckInRecord;
use super::sync::CheckInSync;
use crate::crowd::CrowdTier;
use crate::errors::{CheckInAction, CheckInError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckInState {
    pub place_id: Option<String>,
    pub loading: bool,
    pub checked_in: bool,
    pub selected_tags: BTreeSet<String>,
    pub crowd_count: u64,
    pub error: Option<&'static str>,
}

impl CheckInState {
    pub fn new(place_id: Option<&str>) -> Self {
        match place_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self {
                place_id: Some(id.to_string()),
                loading: true,
                ..Self::default()
            },
            None => Self {
                error: Some("Invalid pub"),
                ..Self::default()
            },
        }
    }

    pub fn tier(&self) -> CrowdTier {
        CrowdTier::from_count(self.crowd_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Stored aggregate arrived; `None` means nobody has checked in yet.
    Loaded(Option<CheckInRecord>),
    LoadFailed,
    CheckIn,
    ToggleTag(String),
    ReplaceTags(BTreeSet<String>),
    CheckInRegistered,
    TagsSaved,
    EffectFailed(CheckInAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RegisterCheckIn { place_id: String },
    SubmitTags { place_id: String, tags: BTreeSet<String> },
}

pub fn reduce(state: &CheckInState, intent: Intent) -> (CheckInState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match intent {
        Intent::Loaded(record) => {
            next.loading = false;
            if let Some(record) = record {
                next.selected_tags = record.tags;
                next.crowd_count = record.crowd_count;
            }
        }
        Intent::LoadFailed => {
            next.loading = false;
            next.error = Some(CheckInAction::Load.failure_message());
        }
        Intent::CheckIn => {
            // The flag flips before the write goes out, so a second tap is a no-op.
            if let Some(place_id) = &state.place_id
                && !state.checked_in
            {
                next.checked_in = true;
                effects.push(Effect::RegisterCheckIn {
                    place_id: place_id.clone(),
                });
            }
        }
        // Tags can only be chosen once checked in.
        Intent::ToggleTag(tag) if state.checked_in => {
            let tag = tag.trim().to_string();
            if !tag.is_empty() {
                if !next.selected_tags.remove(&tag) {
                    next.selected_tags.insert(tag);
                }
                push_submit(&next, &mut effects);
            }
        }
        Intent::ReplaceTags(tags) if state.checked_in => {
            next.selected_tags = tags;
            push_submit(&next, &mut effects);
        }
        Intent::ToggleTag(_) | Intent::ReplaceTags(_) => {}
        Intent::CheckInRegistered => {
            next.crowd_count = next.crowd_count.saturating_add(1);
        }
        Intent::TagsSaved => {}
        Intent::EffectFailed(action) => {
            next.error = Some(action.failure_message());
        }
    }

    (next, effects)
}

fn push_submit(state: &CheckInState, effects: &mut Vec<Effect>) {
    if let Some(place_id) = &state.place_id {
        effects.push(Effect::SubmitTags {
            place_id: place_id.clone(),
            tags: state.selected_tags.clone(),
        });
    }
}

/// Drives a [`CheckInState`] against the store.
pub struct CheckInSession {
    sync: CheckInSync,
    state: CheckInState,
}

impl CheckInSession {
    /// Start a session and load the place's stored aggregate.
    pub async fn open(sync: CheckInSync, place_id: Option<&str>) -> Self {
        let mut session = Self {
            sync,
            state: CheckInState::new(place_id),
        };
        if let Some(id) = session.state.place_id.clone() {
            let loaded = match session.sync.fetch_check_in_state(&id).await {
                Ok(record) => Intent::Loaded(record),
                Err(e) => {
                    tracing::warn!(place_id = %id, error = %e, "failed to load check-in state");
                    Intent::LoadFailed
                }
            };
            session.dispatch(loaded).await;
        }
        session
    }

    pub fn state(&self) -> &CheckInState {
        &self.state
    }

    /// Apply an intent and run every effect it (transitively) produces.
    pub async fn dispatch(&mut self, intent: Intent) -> &CheckInState {
        let mut queue = VecDeque::from([intent]);
        while let Some(intent) = queue.pop_front() {
            let (next, effects) = reduce(&self.state, intent);
            self.state = next;
            for effect in effects {
                queue.push_back(self.run(effect).await);
            }
        }
        &self.state
    }

    async fn run(&self, effect: Effect) -> Intent {
        match effect {
            Effect::RegisterCheckIn { place_id } => {
                match self.sync.register_check_in(&place_id).await {
                    Ok(()) => Intent::CheckInRegistered,
                    Err(e) => failed(e, CheckInAction::RegisterCheckIn),
                }
            }
            Effect::SubmitTags { place_id, tags } => {
                match self.sync.submit_tags(&place_id, &tags).await {
                    Ok(()) => Intent::TagsSaved,
                    Err(e) => failed(e, CheckInAction::SaveTags),
                }
            }
        }
    }
}

fn failed(error: CheckInError, action: CheckInAction) -> Intent {
    tracing::warn!(error = %error, "{}", error.user_message(action));
    Intent::EffectFailed(action)
}

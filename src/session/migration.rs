//! Template migration
//!
//! Switching grammars is a small state machine:
//!
//! ```text
//! Idle --request--> AwaitingSaveDecision --decline--------------------------> Switching --> Idle
//!                                        --save (named)-------------> Saving --ok--> Switching --> Idle
//!                                        --save (unnamed)--> AwaitingName --name--> Saving
//! ```
//!
//! `Saving` holds the switch while the store works; the write is reported
//! back with `finish_pending_save`. Any failed save returns to `Idle` with
//! the grammar and the document untouched. Cancelling from either waiting
//! state drops the pending target. Only one migration runs at a time: a
//! new request while one is pending is refused.

use serde::Serialize;
use std::sync::Arc;

use super::{EditingSession, SessionError};
use crate::models::ChangeReason;
use crate::persistence::{PersistenceError, ScreenplayStore};
use crate::text::Cursor;

#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum MigrationState {
    #[default]
    Idle,

    /// Asked the user whether to save before switching to `target`
    AwaitingSaveDecision { target: String },

    /// The document must be named (save-as) before switching to `pending`
    AwaitingName { pending: String },

    /// The current document is being written as `name` (created when
    /// `create`); the switch to `target` waits for the outcome
    Saving { target: String, name: String, create: bool },

    /// Grammar, configuration and document are being replaced
    Switching { target: String },
}

impl MigrationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, MigrationState::Idle)
    }
}

/// What the caller has to do next
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum MigrationStep {
    /// Requested grammar is already active
    NoOp,
    /// Ask "save before switching?" and answer with `answer_save_prompt`
    AskSave { target: String },
    /// Ask for a name and answer with `complete_pending_save`
    AskName { pending: String },
    /// Write the current payload as `name`, then report the outcome with
    /// `finish_pending_save`
    Persist { name: String, create: bool },
    /// The switch is done
    Switched { template_id: String },
    Cancelled,
}

impl EditingSession {
    pub fn migration_state(&self) -> &MigrationState {
        &self.migration
    }

    /// Start switching to `template_id`
    ///
    /// Unknown ids resolve to the default grammar.
    pub fn request_template_switch(&mut self, template_id: &str) -> Result<MigrationStep, SessionError> {
        if !self.migration.is_idle() {
            log::warn!(
                "Template switch to '{}' ignored: {:?} in progress",
                template_id,
                self.migration
            );
            return Err(SessionError::MigrationBusy);
        }

        let target = self.registry.find_or_default(Some(template_id));
        if target.id == self.template_id() {
            return Ok(MigrationStep::NoOp);
        }

        log::info!("Template switch requested: '{}' -> '{}'", self.template_id(), target.id);
        self.migration = MigrationState::AwaitingSaveDecision {
            target: target.id.to_string(),
        };
        Ok(MigrationStep::AskSave {
            target: target.id.to_string(),
        })
    }

    /// Answer the save prompt, running the save against `store`
    ///
    /// With `save` on a named screenplay the current content is saved under
    /// the current grammar first; a failed save aborts the migration.
    pub fn answer_save_prompt(
        &mut self,
        save: bool,
        store: &mut dyn ScreenplayStore,
    ) -> Result<MigrationStep, SessionError> {
        let step = self.decide_save(save)?;
        self.persist_pending(step, store)
    }

    /// Create the never-saved screenplay as `name`, then switch
    pub fn complete_pending_save(
        &mut self,
        name: &str,
        store: &mut dyn ScreenplayStore,
    ) -> Result<MigrationStep, SessionError> {
        let step = self.name_pending_save(name)?;
        self.persist_pending(step, store)
    }

    fn persist_pending(
        &mut self,
        step: MigrationStep,
        store: &mut dyn ScreenplayStore,
    ) -> Result<MigrationStep, SessionError> {
        let MigrationStep::Persist { name, create } = step else {
            return Ok(step);
        };
        let payload = self.payload();
        let outcome = if create {
            store.create(&name, &payload)
        } else {
            store.save(&name, &payload)
        };
        self.finish_pending_save(outcome)
    }

    /// First half of `answer_save_prompt`, for stores that answer later
    ///
    /// Returns `Persist` when the caller has to write `payload()` and
    /// report back.
    pub fn decide_save(&mut self, save: bool) -> Result<MigrationStep, SessionError> {
        let MigrationState::AwaitingSaveDecision { target } = self.migration.clone() else {
            return Err(SessionError::NoPendingMigration);
        };

        if !save {
            return self.switch_to(&target);
        }

        match self.current_file.clone() {
            Some(name) => {
                self.migration = MigrationState::Saving {
                    target,
                    name: name.clone(),
                    create: false,
                };
                Ok(MigrationStep::Persist { name, create: false })
            }
            None => {
                log::info!("Template switch to '{}' waits for a screenplay name", target);
                self.migration = MigrationState::AwaitingName {
                    pending: target.clone(),
                };
                Ok(MigrationStep::AskName { pending: target })
            }
        }
    }

    /// First half of `complete_pending_save`
    pub fn name_pending_save(&mut self, name: &str) -> Result<MigrationStep, SessionError> {
        let MigrationState::AwaitingName { pending } = self.migration.clone() else {
            return Err(SessionError::NoPendingMigration);
        };
        self.migration = MigrationState::Saving {
            target: pending,
            name: name.to_string(),
            create: true,
        };
        Ok(MigrationStep::Persist {
            name: name.to_string(),
            create: true,
        })
    }

    /// Report how the pending write went; only success moves on to the switch
    pub fn finish_pending_save(
        &mut self,
        outcome: Result<(), PersistenceError>,
    ) -> Result<MigrationStep, SessionError> {
        let MigrationState::Saving { target, name, .. } = self.migration.clone() else {
            return Err(SessionError::NoPendingMigration);
        };

        if let Err(e) = outcome {
            log::warn!(
                "Saving '{}' before template switch failed, staying on '{}': {}",
                name,
                self.template_id(),
                e
            );
            self.migration = MigrationState::Idle;
            return Err(e.into());
        }
        self.switch_to(&target)
    }

    /// Abandon a pending switch from either waiting state
    ///
    /// Refused while a save is in flight; its outcome decides.
    pub fn cancel_template_switch(&mut self) -> Result<MigrationStep, SessionError> {
        if let MigrationState::Saving { name, .. } = &self.migration {
            log::warn!("Template switch cannot be cancelled while '{}' is saving", name);
            return Err(SessionError::MigrationBusy);
        }
        if !self.migration.is_idle() {
            log::info!("Template switch cancelled: {:?}", self.migration);
        }
        self.migration = MigrationState::Idle;
        Ok(MigrationStep::Cancelled)
    }

    /// Replace grammar, configuration, file identity and document, then
    /// rebind the controller
    fn switch_to(&mut self, target: &str) -> Result<MigrationStep, SessionError> {
        self.migration = MigrationState::Switching {
            target: target.to_string(),
        };
        self.controller.unbind();

        let grammar = self.registry.find_or_default(Some(target));
        let binding = Arc::new(Self::make_binding(grammar, &self.preferences));
        self.binding = Arc::clone(&binding);
        self.current_file = None;
        self.document = self.binding.grammar.empty_document();
        self.cursor = Cursor::document_start().clamp_to(&self.document);

        let committed = self.commit(0, ChangeReason::Replaced);
        self.controller.bind(binding);
        self.migration = MigrationState::Idle;
        committed?;

        log::info!("Switched to template '{}'", self.template_id());
        Ok(MigrationStep::Switched {
            template_id: self.template_id().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::templates::{builtin_registry, PreferenceBook};

    fn session() -> EditingSession {
        EditingSession::new(builtin_registry(), PreferenceBook::new())
    }

    #[test]
    fn test_same_template_is_noop() {
        let mut session = session();
        assert_eq!(session.request_template_switch("american").unwrap(), MigrationStep::NoOp);
        assert!(session.migration_state().is_idle());
    }

    #[test]
    fn test_second_request_is_refused() {
        let mut session = session();
        session.request_template_switch("arabic_v2").unwrap();
        assert_eq!(
            session.request_template_switch("arabic_av_table"),
            Err(SessionError::MigrationBusy)
        );
        assert_eq!(
            session.migration_state(),
            &MigrationState::AwaitingSaveDecision {
                target: "arabic_v2".to_string()
            }
        );
    }

    #[test]
    fn test_answer_without_request() {
        let mut session = session();
        let mut store = MemoryStore::new();
        assert_eq!(
            session.answer_save_prompt(false, &mut store),
            Err(SessionError::NoPendingMigration)
        );
        assert_eq!(
            session.complete_pending_save("x", &mut store),
            Err(SessionError::NoPendingMigration)
        );
    }

    #[test]
    fn test_deferred_save_holds_switch_until_reported() {
        let mut session = session();
        let mut store = MemoryStore::new();
        session.insert_text("Keep me.").unwrap();
        session.save_as(&mut store, "Pilot").unwrap();

        session.request_template_switch("arabic_v2").unwrap();
        assert_eq!(
            session.decide_save(true).unwrap(),
            MigrationStep::Persist {
                name: "Pilot".to_string(),
                create: false
            }
        );
        assert_eq!(session.template_id(), "american");
        assert_eq!(session.request_template_switch("arabic_v2"), Err(SessionError::MigrationBusy));
        assert_eq!(session.cancel_template_switch(), Err(SessionError::MigrationBusy));

        let err = session
            .finish_pending_save(Err(PersistenceError::backend("save", "offline")))
            .unwrap_err();
        assert_eq!(err, SessionError::Persistence(PersistenceError::backend("save", "offline")));
        assert!(session.migration_state().is_idle());
        assert_eq!(session.template_id(), "american");
        assert_eq!(session.current_file(), Some("Pilot"));
        assert_eq!(session.document().blocks()[0].text_content(), "Keep me.");
    }

    #[test]
    fn test_deferred_create_switches_on_success() {
        let mut session = session();
        session.request_template_switch("arabic_v2").unwrap();
        session.decide_save(true).unwrap();
        assert_eq!(
            session.name_pending_save("Draft").unwrap(),
            MigrationStep::Persist {
                name: "Draft".to_string(),
                create: true
            }
        );
        assert_eq!(
            session.finish_pending_save(Ok(())).unwrap(),
            MigrationStep::Switched {
                template_id: "arabic_v2".to_string()
            }
        );
        assert_eq!(session.finish_pending_save(Ok(())), Err(SessionError::NoPendingMigration));
    }

    #[test]
    fn test_cancel_from_awaiting_name() {
        let mut session = session();
        let mut store = MemoryStore::new();
        session.insert_text("Keep me.").unwrap();
        session.request_template_switch("arabic_v2").unwrap();
        assert_eq!(
            session.answer_save_prompt(true, &mut store).unwrap(),
            MigrationStep::AskName {
                pending: "arabic_v2".to_string()
            }
        );
        assert_eq!(session.cancel_template_switch(), Ok(MigrationStep::Cancelled));
        assert!(session.migration_state().is_idle());
        assert_eq!(session.template_id(), "american");
        assert_eq!(session.document().blocks()[0].text_content(), "Keep me.");
        assert!(store.is_empty());
    }
}

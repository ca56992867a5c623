//! Template switching from the host
//!
//! Answers that save the screenplay are async. The session parks in
//! `Saving` while the store works, so a rejected write leaves the grammar
//! and the document where they were.

use wasm_bindgen::prelude::*;

use crate::api::core::with_session;
use crate::api::helpers::serialize;
use crate::api::store::JsStore;
use crate::api::types::{MigrationResult, SessionSnapshot};
use crate::session::{EditingSession, MigrationStep};

fn step_result(session: &EditingSession, step: MigrationStep) -> MigrationResult {
    MigrationResult {
        step,
        snapshot: SessionSnapshot::of(session),
    }
}

/// Write the pending payload when `step` asks for it and report back
async fn persist_pending(context: &str, step: MigrationStep, store: &JsStore) -> Result<MigrationStep, JsValue> {
    let MigrationStep::Persist { name, create } = step else {
        return Ok(step);
    };
    let payload = with_session(context, |session| Ok(session.payload()))?;
    let outcome = store.persist(create, &name, &payload).await;
    with_session(context, |session| session.finish_pending_save(outcome))
}

#[wasm_bindgen(js_name = requestTemplateSwitch)]
pub fn request_template_switch(template_id: &str) -> Result<JsValue, JsValue> {
    let result = with_session("requestTemplateSwitch", |session| {
        let step = session.request_template_switch(template_id)?;
        Ok(step_result(session, step))
    })?;
    serialize(&result, "requestTemplateSwitch")
}

/// Answer "save before switching?"
#[wasm_bindgen(js_name = answerSavePrompt)]
pub async fn answer_save_prompt(save: bool, store_js: JsValue) -> Result<JsValue, JsValue> {
    let store = JsStore::new(store_js)?;
    let step = with_session("answerSavePrompt", |session| session.decide_save(save))?;
    let step = persist_pending("answerSavePrompt", step, &store).await?;
    let result = with_session("answerSavePrompt", |session| Ok(step_result(session, step)))?;
    serialize(&result, "answerSavePrompt")
}

/// Name a never-saved screenplay so the pending switch can go ahead
#[wasm_bindgen(js_name = completePendingSave)]
pub async fn complete_pending_save(name: String, store_js: JsValue) -> Result<JsValue, JsValue> {
    let store = JsStore::new(store_js)?;
    let step = with_session("completePendingSave", |session| session.name_pending_save(&name))?;
    let step = persist_pending("completePendingSave", step, &store).await?;
    let result = with_session("completePendingSave", |session| Ok(step_result(session, step)))?;
    serialize(&result, "completePendingSave")
}

#[wasm_bindgen(js_name = cancelTemplateSwitch)]
pub fn cancel_template_switch() -> Result<JsValue, JsValue> {
    let result = with_session("cancelTemplateSwitch", |session| {
        let step = session.cancel_template_switch()?;
        Ok(step_result(session, step))
    })?;
    serialize(&result, "cancelTemplateSwitch")
}

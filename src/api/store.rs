//! Storage collaborator supplied by the host
//!
//! The host passes a plain object whose methods may return values or
//! Promises:
//!
//! ```js
//! {
//!   create(name, payloadJson),   // rejects if the name exists
//!   save(name, payloadJson),     // rejects if the name is unknown
//!   list(),                      // -> string[]
//!   open(name),                  // -> JSON string or object, null if missing
//!   delete(name),
//! }
//! ```
//!
//! Every result is awaited before the session hears about it. A throw or a
//! rejection becomes `PersistenceError::Backend`.

use js_sys::{Array, Function, Promise, Reflect};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::persistence::{PersistenceError, ScreenplayPayload};

pub struct JsStore {
    target: JsValue,
}

impl JsStore {
    pub fn new(target: JsValue) -> Result<Self, JsValue> {
        if !target.is_object() {
            return Err(JsValue::from_str("Storage collaborator must be an object"));
        }
        Ok(Self { target })
    }

    fn method(&self, operation: &str) -> Result<Function, PersistenceError> {
        Reflect::get(&self.target, &JsValue::from_str(operation))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| PersistenceError::backend(operation, "missing method"))
    }

    fn describe(err: JsValue) -> String {
        err.as_string()
            .or_else(|| {
                Reflect::get(&err, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", err))
    }

    /// Call `operation` and wait for it to settle
    async fn call(&self, operation: &str, args: &Array) -> Result<JsValue, PersistenceError> {
        let returned = self
            .method(operation)?
            .apply(&self.target, args)
            .map_err(|e| PersistenceError::backend(operation, Self::describe(e)))?;
        JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(|e| PersistenceError::backend(operation, Self::describe(e)))
    }

    async fn write(&self, operation: &str, name: &str, payload: &ScreenplayPayload) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(payload)
            .map_err(|e| PersistenceError::backend(operation, e.to_string()))?;
        let args = Array::of2(&JsValue::from_str(name), &JsValue::from_str(&json));
        self.call(operation, &args).await.map(|_| ())
    }

    /// First save of a new name
    pub async fn create(&self, name: &str, payload: &ScreenplayPayload) -> Result<(), PersistenceError> {
        self.write("create", name, payload).await
    }

    pub async fn save(&self, name: &str, payload: &ScreenplayPayload) -> Result<(), PersistenceError> {
        self.write("save", name, payload).await
    }

    /// `create` or `save`, as a pending template switch asks
    pub async fn persist(&self, create: bool, name: &str, payload: &ScreenplayPayload) -> Result<(), PersistenceError> {
        if create {
            self.create(name, payload).await
        } else {
            self.save(name, payload).await
        }
    }

    pub async fn list(&self) -> Result<Vec<String>, PersistenceError> {
        let result = self.call("list", &Array::new()).await?;
        if !Array::is_array(&result) {
            return Err(PersistenceError::backend("list", "expected an array of names"));
        }
        Ok(Array::from(&result).iter().filter_map(|v| v.as_string()).collect())
    }

    pub async fn open(&self, name: &str) -> Result<Value, PersistenceError> {
        let result = self.call("open", &Array::of1(&JsValue::from_str(name))).await?;

        if result.is_null() || result.is_undefined() {
            return Err(PersistenceError::NotFound(name.to_string()));
        }
        match result.as_string() {
            Some(text) => {
                serde_json::from_str(&text).map_err(|e| PersistenceError::backend("open", e.to_string()))
            }
            None => serde_wasm_bindgen::from_value(result)
                .map_err(|e| PersistenceError::backend("open", e.to_string())),
        }
    }

    pub async fn delete(&self, name: &str) -> Result<(), PersistenceError> {
        self.call("delete", &Array::of1(&JsValue::from_str(name)))
            .await
            .map(|_| ())
    }
}

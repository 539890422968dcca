//! JavaScript entry point: `attrify(options?)`.

use crate::attribution::capture::capture;
use crate::base::error::AttributionError;
use crate::page::browser::BrowserPage;
use serde_json::Value;
use wasm_bindgen::prelude::*;

/// Capture attribution cookies for the current page.
///
/// `options` is a plain object; `undefined` fields are dropped by
/// `JSON.stringify`, which is what the data-value rules expect.
#[wasm_bindgen(js_name = attrify)]
pub fn attrify(options: JsValue) -> Result<(), JsValue> {
    run(options).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn run(options: JsValue) -> Result<(), AttributionError> {
    let raw = if options.is_undefined() || options.is_null() {
        None
    } else {
        let text: String = js_sys::JSON::stringify(&options)
            .map_err(|e| AttributionError::invalid_options(format!("{e:?}")))?
            .into();
        Some(serde_json::from_str::<Value>(&text)?)
    };

    let page = BrowserPage::current()?;
    capture(&page, raw.as_ref())?;
    Ok(())
}

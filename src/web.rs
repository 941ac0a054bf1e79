//! Browser glue: element lookups and the `fetch` transport.

use dioxus::prelude::UseRef;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::config::{ScanConfig, CONFIG_ELEMENT_ID};
use crate::controller::{ControllerCell, HttpReply, ScanController, ScanTransport};
use crate::error::TransportError;
use crate::upload::{SelectedFile, UploadRequest};

impl SelectedFile for web_sys::File {
    fn file_name(&self) -> String {
        self.name()
    }

    fn byte_len(&self) -> u64 {
        self.size() as u64
    }
}

impl ControllerCell for UseRef<ScanController> {
    fn with_controller<R>(&self, f: impl FnOnce(&mut ScanController) -> R) -> R {
        self.with_mut(f)
    }
}

fn js_message(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn document() -> Option<web_sys::Document> {
    web_sys::window()?.document()
}

/// The first file picked in the `<input type="file">` with the given id.
pub fn selected_file(input_id: &str) -> Option<web_sys::File> {
    let input: web_sys::HtmlInputElement = document()?
        .get_element_by_id(input_id)?
        .dyn_into()
        .ok()?;
    input.files()?.get(0)
}

/// Config embedded in the page, or the defaults.
pub fn page_config() -> ScanConfig {
    let Some(raw) = document()
        .and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|e| e.text_content())
    else {
        return ScanConfig::default();
    };

    match ScanConfig::from_json(&raw) {
        Ok(config) => {
            log::info!("loaded scan config, endpoint {}", config.endpoint);
            config
        }
        Err(e) => {
            log::warn!("{e}, using defaults");
            ScanConfig::default()
        }
    }
}

/// Posts the upload as `multipart/form-data` with `window.fetch`.
#[derive(Debug, Clone, Default)]
pub struct FetchTransport;

impl ScanTransport for FetchTransport {
    type File = web_sys::File;

    async fn post(
        &self,
        request: UploadRequest<web_sys::File>,
    ) -> Result<HttpReply, TransportError> {
        let window = web_sys::window()
            .ok_or_else(|| TransportError::Environment("no window".to_string()))?;

        let form = web_sys::FormData::new()
            .map_err(|e| TransportError::Environment(js_message(e)))?;
        form.append_with_blob_and_filename(&request.field_name, &request.file, &request.file_name)
            .map_err(|e| TransportError::Environment(js_message(e)))?;

        let init = web_sys::RequestInit::new();
        init.set_method("POST");
        init.set_body(&form);
        let req = web_sys::Request::new_with_str_and_init(&request.endpoint, &init)
            .map_err(|e| TransportError::Network(js_message(e)))?;

        let res: web_sys::Response = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(|e| TransportError::Network(js_message(e)))?
            .dyn_into()
            .map_err(|e| TransportError::Network(js_message(e)))?;

        let status = res.status();
        let text = res
            .text()
            .map_err(|e| TransportError::Body(js_message(e)))?;
        let body = JsFuture::from(text)
            .await
            .map_err(|e| TransportError::Body(js_message(e)))?
            .as_string()
            .ok_or_else(|| TransportError::Body("response text was not a string".to_string()))?;

        log::debug!("{} answered {status}", request.endpoint);
        Ok(HttpReply { status, body })
    }
}

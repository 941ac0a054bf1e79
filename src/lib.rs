#![allow(non_snake_case)]

use std::{cell::RefCell, marker::PhantomData, rc::Rc};

use dioxus::prelude::*;

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod upload;
pub mod web;

pub use config::ScanConfig;
pub use controller::{run_scan, PanelState, ScanController, ScanOutcome, ScanView};
pub use model::{ProductInfo, ScanResponse};

pub const IMAGE_INPUT_ID: &str = "image-upload";

#[derive(Clone)]
pub struct StaticCallback<T> {
    inner: Rc<RefCell<Box<dyn FnMut(T)>>>,
}

impl<T> StaticCallback<T> {
    pub fn call(&self, value: T) {
        (self.inner.borrow_mut())(value)
    }
}

impl<F, T> From<F> for StaticCallback<T>
where
    F: FnMut(T) + 'static,
{
    fn from(f: F) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
        }
    }
}

#[derive(Props)]
pub struct ScanFormProps<'a> {
    #[props(default)]
    config: ScanConfig,
    /// Called with every successful reply, product or not.
    #[props(into)]
    handlescan: Option<StaticCallback<ScanResponse>>,
    /// Called with the message shown in the error panel.
    #[props(into)]
    handleerror: Option<StaticCallback<String>>,
    #[props(default = PhantomData)]
    phantom: PhantomData<&'a ()>,
}

fn hidden(visible: bool) -> &'static str {
    if visible {
        ""
    } else {
        "d-none"
    }
}

pub fn ScanForm<'a>(cx: Scope<'a, ScanFormProps<'a>>) -> Element<'a> {
    let controller = use_ref(cx, || ScanController::new(cx.props.config.clone()));

    let state = PanelState::from(controller.read().panels());
    let field_name = controller.read().config().field_name.clone();

    render! {
        div { class: "card",
            div { class: "card-body",
                form {
                    id: "barcode-form",
                    prevent_default: "onsubmit",
                    onsubmit: move |_| {
                        let controller = controller.clone();
                        let handlescan = cx.props.handlescan.clone();
                        let handleerror = cx.props.handleerror.clone();
                        let file = web::selected_file(IMAGE_INPUT_ID);
                        cx.spawn(async move {
                            match run_scan(&controller, &web::FetchTransport, file).await {
                                ScanOutcome::Scanned(res) => {
                                    if let Some(handler) = handlescan {
                                        handler.call(res);
                                    }
                                }
                                ScanOutcome::Failed(message) => {
                                    if let Some(handler) = handleerror {
                                        handler.call(message);
                                    }
                                }
                                ScanOutcome::Rejected(e) => {
                                    if let Some(handler) = handleerror {
                                        handler.call(e.to_string());
                                    }
                                }
                            }
                        });
                    },
                    div { class: "mb-3",
                        label { r#for: IMAGE_INPUT_ID, class: "form-label", "Barcode image" }
                        input {
                            id: IMAGE_INPUT_ID,
                            class: "form-control",
                            r#type: "file",
                            name: "{field_name}",
                            accept: "image/*",
                            onchange: move |_| controller.with_mut(ScanController::file_changed),
                        }
                    }
                    ScanButton { disabled: state.submit_disabled }
                }
                ScanPanels { state: state.clone() }
            }
        }
    }
}

#[derive(Props, PartialEq)]
pub struct ScanButtonProps {
    disabled: bool,
}

pub fn ScanButton(cx: Scope<ScanButtonProps>) -> Element {
    render! {
        button {
            id: "scan-button",
            class: "btn btn-primary",
            r#type: "submit",
            disabled: cx.props.disabled,
            "Scan"
        }
    }
}

#[derive(Props, PartialEq)]
pub struct ScanPanelsProps {
    state: PanelState,
}

/// Loading indicator, error panel and result container.
pub fn ScanPanels(cx: Scope<ScanPanelsProps>) -> Element {
    let state = &cx.props.state;
    let loading_class = hidden(state.loading);
    let error_class = hidden(state.error.is_some());
    let error_text = state.error.clone().unwrap_or_default();
    let result_class = hidden(state.result.is_some());
    let ScanView {
        barcode,
        symbology,
        name,
        manufacturer,
        category,
        description,
        notice,
    } = state.result.clone().unwrap_or_default();
    let notice_class = hidden(notice.is_some());
    let notice = notice.unwrap_or_default();

    render! {
        div { id: "loading-indicator", class: "text-center mt-3 {loading_class}",
            div { class: "spinner-border" }
            p { "Scanning.." }
        }
        div { id: "error-message", class: "alert alert-danger mt-3 {error_class}",
            span { id: "error-text", "{error_text}" }
        }
        div { id: "result-container", class: "mt-3 {result_class}",
            dl { class: "row",
                dt { class: "col-sm-4", "Barcode" }
                dd { id: "barcode-number", class: "col-sm-8", "{barcode}" }
                dt { class: "col-sm-4", "Type" }
                dd { id: "barcode-type", class: "col-sm-8", "{symbology}" }
                dt { class: "col-sm-4", "Name" }
                dd { id: "product-name", class: "col-sm-8", "{name}" }
                dt { class: "col-sm-4", "Manufacturer" }
                dd { id: "product-manufacturer", class: "col-sm-8", "{manufacturer}" }
                dt { class: "col-sm-4", "Category" }
                dd { id: "product-category", class: "col-sm-8", "{category}" }
                dt { class: "col-sm-4", "Description" }
                dd { id: "product-description", class: "col-sm-8", "{description}" }
            }
            div { id: "product-notice", class: "alert alert-info {notice_class}", "{notice}" }
        }
    }
}

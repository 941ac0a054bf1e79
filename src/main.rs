#![allow(non_snake_case)]

use dioxus::prelude::*;
use log::LevelFilter;

use dioxus_scan_form::{web, ScanForm, ScanResponse};

fn main() {
    // Init debug
    dioxus_logger::init(LevelFilter::Info).expect("failed to init logger");
    console_error_panic_hook::set_once();

    log::info!("starting scan form");
    dioxus_web::launch(app);
}

fn app(cx: Scope) -> Element {
    let config = cx.use_hook(web::page_config).clone();

    render! {
        div { class: "container py-4",
            h1 { class: "mb-4", "Barcode Scanner" }
            ScanForm {
                config: config,
                handlescan: |res: ScanResponse| {
                    log::info!("{} ({}) found: {}", res.barcode, res.symbology, res.product.is_some());
                },
                handleerror: |message: String| {
                    log::warn!("{message}");
                },
            }
        }
    }
}

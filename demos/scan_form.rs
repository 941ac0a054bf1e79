use dioxus::prelude::*;

use dioxus_scan_form::{ScanConfig, ScanForm, ScanResponse};

fn main() {
    dioxus_logger::init(log::LevelFilter::Info).expect("failed to init logger");
    dioxus_web::launch(crate::app);
}

fn app(cx: Scope) -> Element {
    let config = ScanConfig {
        endpoint: "/api/scan".to_string(),
        ..ScanConfig::default()
    };

    render! {
        ScanForm {
            config: config,
            handlescan: |res: ScanResponse| {
                log::info!("{} {:?}", res.barcode, res.product.and_then(|p| p.name));
            },
            handleerror: |message: String| {
                log::error!("{message}");
            },
        }
    }
}

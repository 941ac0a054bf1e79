//! The scan form state machine.
//!
//! `Idle -> Submitting -> {DisplayingResult | DisplayingError} -> Idle`
//!
//! The controller owns no browser handles. It hands out an
//! [`UploadRequest`] on [`ScanController::begin`], and the caller feeds the
//! transport's reply back through [`ScanController::finish`].
//! [`run_scan`] ties the two together around the single await point.

use std::cell::RefCell;

use crate::config::ScanConfig;
use crate::error::{TransportError, ValidationError};
use crate::model::{ErrorBody, ScanResponse};
use crate::upload::{self, SelectedFile, UploadRequest};

/// Raw reply from the `/scan` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one upload and returns whatever came back.
#[allow(async_fn_in_trait)]
pub trait ScanTransport {
    type File: SelectedFile;

    async fn post(&self, request: UploadRequest<Self::File>)
        -> Result<HttpReply, TransportError>;
}

/// Shared access to a controller from an async task.
pub trait ControllerCell {
    fn with_controller<R>(&self, f: impl FnOnce(&mut ScanController) -> R) -> R;
}

impl ControllerCell for RefCell<ScanController> {
    fn with_controller<R>(&self, f: impl FnOnce(&mut ScanController) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

/// Display strings for a decoded barcode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanView {
    pub barcode: String,
    pub symbology: String,
    pub name: String,
    pub manufacturer: String,
    pub category: String,
    pub description: String,
    /// Set when no product matched the barcode.
    pub notice: Option<String>,
}

impl ScanView {
    pub fn new(response: &ScanResponse, config: &ScanConfig) -> Self {
        let barcode = response.barcode.clone();
        let symbology = response.symbology.clone();

        match &response.product {
            Some(product) => {
                let field = |value: &Option<String>| {
                    value
                        .as_deref()
                        .filter(|v| !v.is_empty())
                        .unwrap_or(&config.missing_field)
                        .to_string()
                };
                Self {
                    barcode,
                    symbology,
                    name: field(&product.name),
                    manufacturer: field(&product.manufacturer),
                    category: field(&product.category),
                    description: field(&product.description),
                    notice: None,
                }
            }
            None => Self {
                barcode,
                symbology,
                name: config.no_product.clone(),
                manufacturer: config.no_product.clone(),
                category: config.no_product.clone(),
                description: config.no_product.clone(),
                notice: Some(config.no_product_notice.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    DisplayingResult(ScanView),
    DisplayingError(String),
}

/// What the page should show right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panels<'a> {
    pub loading: bool,
    pub submit_disabled: bool,
    pub error: Option<&'a str>,
    pub result: Option<&'a ScanView>,
}

/// Owned copy of [`Panels`] for view components that must hold their props.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub loading: bool,
    pub submit_disabled: bool,
    pub error: Option<String>,
    pub result: Option<ScanView>,
}

impl From<Panels<'_>> for PanelState {
    fn from(panels: Panels<'_>) -> Self {
        Self {
            loading: panels.loading,
            submit_disabled: panels.submit_disabled,
            error: panels.error.map(str::to_string),
            result: panels.result.cloned(),
        }
    }
}

/// How one submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Scanned(ScanResponse),
    Failed(String),
    Rejected(ValidationError),
}

#[derive(Debug, Clone, Default)]
pub struct ScanController {
    config: ScanConfig,
    phase: Phase,
}

impl ScanController {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn panels(&self) -> Panels<'_> {
        let submitting = self.phase == Phase::Submitting;
        Panels {
            loading: submitting,
            submit_disabled: submitting,
            error: match &self.phase {
                Phase::DisplayingError(message) => Some(message.as_str()),
                _ => None,
            },
            result: match &self.phase {
                Phase::DisplayingResult(view) => Some(view),
                _ => None,
            },
        }
    }

    /// Start a submission. On success the controller is `Submitting` and the
    /// returned request must be sent and its reply passed to [`Self::finish`].
    pub fn begin<F: SelectedFile>(
        &mut self,
        file: Option<F>,
    ) -> Result<UploadRequest<F>, ValidationError> {
        if self.phase == Phase::Submitting {
            log::warn!("scan already in flight, ignoring submit");
            return Err(ValidationError::InFlight);
        }

        match upload::prepare(file, &self.config) {
            Ok(request) => {
                log::debug!("submitting {} to {}", request.file_name, request.endpoint);
                self.phase = Phase::Submitting;
                Ok(request)
            }
            Err(err) => {
                log::info!("upload rejected: {err}");
                self.phase = Phase::DisplayingError(err.to_string());
                Err(err)
            }
        }
    }

    /// Settle the in-flight submission with the transport's result.
    pub fn finish(&mut self, reply: Result<HttpReply, TransportError>) -> ScanOutcome {
        match self.interpret(reply) {
            Ok(response) => {
                let view = ScanView::new(&response, &self.config);
                if view.notice.is_some() {
                    log::info!("barcode {} has no product entry", response.barcode);
                } else {
                    log::info!("barcode {} scanned", response.barcode);
                }
                self.phase = Phase::DisplayingResult(view);
                ScanOutcome::Scanned(response)
            }
            Err(message) => {
                log::warn!("scan failed: {message}");
                self.phase = Phase::DisplayingError(message.clone());
                ScanOutcome::Failed(message)
            }
        }
    }

    /// The in-flight submission ended without a reply.
    pub fn abandon(&mut self) {
        if self.phase == Phase::Submitting {
            log::debug!("in-flight scan dropped");
            self.phase = Phase::Idle;
        }
    }

    /// A different file was picked; clear stale panels.
    pub fn file_changed(&mut self) {
        if self.phase != Phase::Submitting {
            self.phase = Phase::Idle;
        }
    }

    fn interpret(&self, reply: Result<HttpReply, TransportError>) -> Result<ScanResponse, String> {
        let reply = reply.map_err(|err| {
            log::error!("{err}");
            self.config.failure.clone()
        })?;

        if reply.is_success() {
            return serde_json::from_str::<ScanResponse>(&reply.body).map_err(|err| {
                // a 2xx without a barcode may still carry a server message
                let message = serde_json::from_str::<ErrorBody>(&reply.body)
                    .ok()
                    .and_then(|body| body.message().map(str::to_string));
                message.unwrap_or_else(|| {
                    log::error!("unreadable scan response: {err}");
                    self.config.failure.clone()
                })
            });
        }

        match serde_json::from_str::<ErrorBody>(&reply.body) {
            Ok(body) => Err(body
                .message()
                .unwrap_or(&self.config.unknown_error)
                .to_string()),
            Err(err) => {
                log::error!("unreadable error response ({}): {err}", reply.status);
                Err(self.config.failure.clone())
            }
        }
    }
}

/// Returns the controller to a non-submitting state if dropped before the
/// reply arrives.
struct InFlight<'a, C: ControllerCell> {
    cell: &'a C,
    settled: bool,
}

impl<C: ControllerCell> InFlight<'_, C> {
    fn settle(mut self, reply: Result<HttpReply, TransportError>) -> ScanOutcome {
        self.settled = true;
        self.cell.with_controller(|c| c.finish(reply))
    }
}

impl<C: ControllerCell> Drop for InFlight<'_, C> {
    fn drop(&mut self) {
        if !self.settled {
            self.cell.with_controller(ScanController::abandon);
        }
    }
}

/// Run one submission end to end. Whatever happens, the controller is not
/// left `Submitting` once this returns or is dropped.
pub async fn run_scan<C, T>(cell: &C, transport: &T, file: Option<T::File>) -> ScanOutcome
where
    C: ControllerCell,
    T: ScanTransport,
{
    let request = match cell.with_controller(|c| c.begin(file)) {
        Ok(request) => request,
        Err(err) => return ScanOutcome::Rejected(err),
    };

    let guard = InFlight {
        cell,
        settled: false,
    };
    let reply = transport.post(request).await;
    guard.settle(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductInfo;

    #[derive(Debug, Clone, PartialEq)]
    struct Picked(&'static str);

    impl SelectedFile for Picked {
        fn file_name(&self) -> String {
            self.0.to_string()
        }

        fn byte_len(&self) -> u64 {
            1024
        }
    }

    fn reply(status: u16, body: &str) -> Result<HttpReply, TransportError> {
        Ok(HttpReply {
            status,
            body: body.to_string(),
        })
    }

    fn submitting() -> ScanController {
        let mut controller = ScanController::default();
        controller.begin(Some(Picked("code.png"))).unwrap();
        controller
    }

    #[test]
    fn should_start_idle_with_controls_enabled() {
        let controller = ScanController::default();
        let panels = controller.panels();

        assert!(!panels.loading);
        assert!(!panels.submit_disabled);
        assert!(panels.error.is_none());
        assert!(panels.result.is_none());
    }

    #[test]
    fn should_show_validation_message_without_submitting() {
        let mut controller = ScanController::default();

        let err = controller.begin::<Picked>(None).unwrap_err();

        assert_eq!(err, ValidationError::NoFileSelected);
        let panels = controller.panels();
        assert_eq!(panels.error, Some("Please select an image file"));
        assert!(!panels.loading);
        assert!(!panels.submit_disabled);
    }

    #[test]
    fn should_disable_submit_and_clear_panels_while_submitting() {
        let mut controller = ScanController::default();
        controller.begin::<Picked>(None).unwrap_err();

        let request = controller.begin(Some(Picked("code.png"))).unwrap();

        assert_eq!(request.file, Picked("code.png"));
        let panels = controller.panels();
        assert!(panels.loading);
        assert!(panels.submit_disabled);
        assert!(panels.error.is_none());
        assert!(panels.result.is_none());
    }

    #[test]
    fn should_reject_second_submit_while_in_flight() {
        let mut controller = submitting();

        let err = controller.begin(Some(Picked("other.png"))).unwrap_err();

        assert_eq!(err, ValidationError::InFlight);
        assert_eq!(controller.phase(), &Phase::Submitting);
    }

    #[test]
    fn should_display_full_product_verbatim() {
        let mut controller = submitting();

        let outcome = controller.finish(reply(
            200,
            r#"{"barcode":"4901777046504","type":"EAN13","product":{
                "name":"Pocky Chocolate","manufacturer":"Glico",
                "category":"Snacks","description":"Chocolate-coated biscuit sticks"}}"#,
        ));

        assert!(matches!(outcome, ScanOutcome::Scanned(_)));
        let view = controller.panels().result.cloned().unwrap();
        assert_eq!(
            view,
            ScanView {
                barcode: "4901777046504".into(),
                symbology: "EAN13".into(),
                name: "Pocky Chocolate".into(),
                manufacturer: "Glico".into(),
                category: "Snacks".into(),
                description: "Chocolate-coated biscuit sticks".into(),
                notice: None,
            }
        );
        assert!(controller.panels().error.is_none());
    }

    #[test]
    fn should_show_na_for_missing_subfields() {
        let mut controller = submitting();

        controller.finish(reply(
            200,
            r#"{"barcode":"1","type":"EAN13","product":{"name":"Cheerios","category":"","description":"Oats"}}"#,
        ));

        let view = controller.panels().result.cloned().unwrap();
        assert_eq!(view.name, "Cheerios");
        assert_eq!(view.manufacturer, "N/A");
        assert_eq!(view.category, "N/A");
        assert_eq!(view.description, "Oats");
        assert!(view.notice.is_none());
    }

    #[test]
    fn should_show_placeholders_and_notice_without_product() {
        let mut controller = submitting();

        let outcome = controller.finish(reply(200, r#"{"barcode":"123","type":"CODE128"}"#));

        assert!(matches!(outcome, ScanOutcome::Scanned(ref r) if r.product.is_none()));
        let config = ScanConfig::default();
        let view = controller.panels().result.cloned().unwrap();
        assert_eq!(view.barcode, "123");
        assert_eq!(view.symbology, "CODE128");
        for field in [&view.name, &view.manufacturer, &view.category, &view.description] {
            assert_eq!(field, &config.no_product);
        }
        assert_eq!(view.notice, Some(config.no_product_notice));
        assert!(controller.panels().error.is_none());
    }

    #[test]
    fn should_use_server_error_message() {
        let mut controller = submitting();

        let outcome = controller.finish(reply(400, r#"{"error":"No barcode detected"}"#));

        assert_eq!(outcome, ScanOutcome::Failed("No barcode detected".into()));
        let panels = controller.panels();
        assert_eq!(panels.error, Some("No barcode detected"));
        assert!(panels.result.is_none());
    }

    #[test]
    fn should_fall_back_when_server_sends_no_message() {
        let mut controller = submitting();

        controller.finish(reply(500, "{}"));

        assert_eq!(controller.panels().error, Some("An unknown error occurred"));
    }

    #[test]
    fn should_fall_back_on_unparseable_bodies() {
        for bad in [reply(200, "<html>"), reply(413, "Request Entity Too Large")] {
            let mut controller = submitting();

            controller.finish(bad);

            assert_eq!(controller.panels().error, Some("Failed to process the image"));
        }
    }

    #[test]
    fn should_show_error_message_from_success_reply_without_barcode() {
        let mut controller = submitting();

        let outcome = controller.finish(reply(200, r#"{"error":"Barcode unreadable"}"#));

        assert_eq!(outcome, ScanOutcome::Failed("Barcode unreadable".into()));
        assert_eq!(controller.panels().error, Some("Barcode unreadable"));
        assert!(controller.panels().result.is_none());
    }

    #[test]
    fn should_fall_back_on_network_failure() {
        let mut controller = submitting();

        controller.finish(Err(TransportError::Network("Failed to fetch".into())));

        assert_eq!(controller.panels().error, Some("Failed to process the image"));
    }

    #[test]
    fn should_reenable_controls_after_every_outcome() {
        let outcomes = [
            reply(200, r#"{"barcode":"1","type":"QR"}"#),
            reply(404, r#"{"error":"x"}"#),
            Err(TransportError::Body("aborted".into())),
        ];
        for outcome in outcomes {
            let mut controller = submitting();

            controller.finish(outcome);

            let panels = controller.panels();
            assert!(!panels.loading);
            assert!(!panels.submit_disabled);
        }
    }

    #[test]
    fn should_clear_panels_on_file_change() {
        let mut controller = submitting();
        controller.finish(reply(400, r#"{"error":"x"}"#));

        controller.file_changed();

        assert_eq!(controller.phase(), &Phase::Idle);
    }

    #[test]
    fn should_keep_submitting_on_file_change_mid_flight() {
        let mut controller = submitting();

        controller.file_changed();

        assert_eq!(controller.phase(), &Phase::Submitting);
    }

    #[test]
    fn should_snapshot_panels_while_submitting() {
        let controller = submitting();

        let state = PanelState::from(controller.panels());

        assert_eq!(
            state,
            PanelState {
                loading: true,
                submit_disabled: true,
                error: None,
                result: None,
            }
        );
    }

    #[test]
    fn should_return_to_idle_when_abandoned() {
        let mut controller = submitting();

        controller.abandon();

        assert_eq!(controller.phase(), &Phase::Idle);
    }

    #[test]
    fn should_build_view_from_custom_texts() {
        let config = ScanConfig {
            missing_field: "-".into(),
            ..ScanConfig::default()
        };
        let response = ScanResponse {
            barcode: "9".into(),
            symbology: "EAN8".into(),
            product: Some(ProductInfo::default()),
            error: None,
        };

        let view = ScanView::new(&response, &config);

        assert_eq!(view.name, "-");
        assert_eq!(view.description, "-");
    }
}

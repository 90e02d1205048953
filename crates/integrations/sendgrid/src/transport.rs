use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mailbridge_core::Message;
use mailbridge_transport::{
    ConfigSource, EnvSource, EventDispatcher, EventListener, ProviderRequestError, SendEventKind,
    SendResult, Transport, TransportError,
};
use tracing::{debug, error, info, instrument, warn};

use crate::client::{MailApi, SendGridClient};
use crate::config::{DEFAULT_FROM_EMAIL_VAR, SendGridConfig, TEST_EMAIL_VAR};
use crate::types::{EmailAddress, SendGridAttachment, SendGridMail};

/// A mail transport that delivers messages through the SendGrid v3 API.
///
/// Every send raises a before-send event (which listeners may cancel), maps
/// the message onto a single SendGrid request, and reports the result through
/// an after-send or exception event.
///
/// Two values are looked up from the [`ConfigSource`] on every send:
///
/// | Variable | Effect |
/// |----------|--------|
/// | `SENDGRID_DEFAULT_FROM_EMAIL` | Sender used when the message has none |
/// | `SENDGRID_TEST_EMAIL` | Replaces all `to` recipients with this address |
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use mailbridge_core::Message;
/// use mailbridge_sendgrid::{SendGridConfig, SendGridTransport};
/// use mailbridge_transport::{ListenerDispatcher, LogListener, Transport};
///
/// # async fn run() -> Result<(), mailbridge_transport::TransportError> {
/// let dispatcher = Arc::new(ListenerDispatcher::new());
/// let transport = SendGridTransport::new(SendGridConfig::new("SG.xxxx"), dispatcher)?;
/// transport.register_plugin(Arc::new(LogListener::new("audit")));
///
/// let message = Message::new()
///     .with_from(("alerts@example.com", "Alerts"))
///     .with_to("oncall@example.com")
///     .with_subject("Disk almost full")
///     .with_body("<p>/var is at 93%</p>");
/// let recipients = transport.send(&message).await?;
/// assert_eq!(recipients, 1);
/// # Ok(())
/// # }
/// ```
pub struct SendGridTransport {
    api: Box<dyn MailApi>,
    dispatcher: Arc<dyn EventDispatcher>,
    config: Box<dyn ConfigSource>,
    started: AtomicBool,
}

impl std::fmt::Debug for SendGridTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridTransport")
            .field("api", &self.api)
            .field("config", &self.config)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl SendGridTransport {
    /// Create a transport backed by a [`SendGridClient`], reading per-send
    /// settings from the process environment.
    pub fn new(
        config: SendGridConfig,
        dispatcher: Arc<dyn EventDispatcher>,
    ) -> Result<Self, TransportError> {
        let client = SendGridClient::new(config)?;
        Ok(Self::with_api(Box::new(client), dispatcher))
    }

    /// Create a transport with a pre-built provider client.
    pub fn with_api(api: Box<dyn MailApi>, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        Self {
            api,
            dispatcher,
            config: Box::new(EnvSource),
            started: AtomicBool::new(false),
        }
    }

    /// Read per-send settings from `source` instead of the process
    /// environment.
    #[must_use]
    pub fn with_config_source(mut self, source: Box<dyn ConfigSource>) -> Self {
        self.config = source;
        self
    }

    /// Map `message` onto a SendGrid request.
    ///
    /// Returns the request and the number of recipients added to it.
    fn build_mail(&self, message: &Message) -> Result<(SendGridMail, usize), TransportError> {
        let mut mail = SendGridMail::new();

        match message.from().first() {
            Some(from) => mail.set_from(from.into()),
            None => {
                let fallback = self.config.get(DEFAULT_FROM_EMAIL_VAR).ok_or_else(|| {
                    TransportError::Configuration(format!(
                        "message has no sender and {DEFAULT_FROM_EMAIL_VAR} is not set"
                    ))
                })?;
                mail.set_from(EmailAddress::new(fallback));
            }
        }

        let mut count = 0;

        if let Some(test_address) = self.config.get(TEST_EMAIL_VAR) {
            debug!(test_address = %test_address, "redirecting recipients to test address");
            mail.add_to(EmailAddress::new(test_address));
            count += 1;
        } else {
            for to in message.to() {
                mail.add_to(to.into());
                count += 1;
            }
        }

        if let Some(reply_to) = message.reply_to().first() {
            mail.set_reply_to(reply_to.into());
        }

        for bcc in message.bcc() {
            mail.add_bcc(bcc.into());
            count += 1;
        }

        for cc in message.cc() {
            mail.add_cc(cc.into());
            count += 1;
        }

        for attachment in message.attachments() {
            mail.add_attachment(SendGridAttachment::from(attachment));
        }

        mail.set_subject(message.subject());
        // A multipart/alternative text+html pair renders as an empty body at
        // SendGrid, so only the HTML part is sent.
        mail.add_content("text/html", message.body());

        Ok((mail, count))
    }

    /// Offer `error` to the exception listeners.
    ///
    /// Returns `Ok(recipients)` when a listener cancels the event, the error
    /// otherwise.
    fn raise(&self, error: TransportError, recipients: usize) -> Result<usize, TransportError> {
        let cancelled = self
            .dispatcher
            .create_transport_exception_event(Transport::name(self), &error)
            .is_some_and(|event| self.dispatcher.dispatch_exception_event(&event).is_cancelled());

        if cancelled {
            warn!(error = %error, "transport error suppressed by listener");
            return Ok(recipients);
        }

        error!(error = %error, "SendGrid send failed");
        Err(error)
    }
}

impl Transport for SendGridTransport {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "sendgrid"
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::Relaxed)
    }

    fn start(&self) {
        self.started.store(true, Ordering::Relaxed);
    }

    fn stop(&self) {
        self.started.store(false, Ordering::Relaxed);
    }

    // The API is stateless over HTTP; there is no connection to probe.
    fn ping(&self) -> bool {
        true
    }

    fn register_plugin(&self, listener: Arc<dyn EventListener>) {
        self.dispatcher.bind_event_listener(listener);
    }

    #[instrument(skip(self, message), fields(transport = "sendgrid", subject = message.subject()))]
    async fn send(&self, message: &Message) -> Result<usize, TransportError> {
        let mut event = self
            .dispatcher
            .create_send_event(Transport::name(self), message);

        let cancelled = event.as_ref().is_some_and(|event| {
            self.dispatcher
                .dispatch_send_event(event, SendEventKind::BeforeSendPerformed)
                .is_cancelled()
        });
        if cancelled {
            info!("send cancelled by listener");
            return Ok(0);
        }

        let (mail, count) = match self.build_mail(message) {
            Ok(built) => built,
            Err(e) => return self.raise(e, 0),
        };

        debug!(
            recipients = count,
            attachments = mail.attachments.len(),
            backend = self.api.backend_name(),
            "sending email"
        );

        let response = self.api.send(&mail).await?;

        if response.is_accepted() {
            if let Some(event) = event.as_mut() {
                event.set_result(SendResult::Success);
                event.set_failed_recipients(Vec::new());
                // Cancelling here only stops later listeners.
                let _ = self
                    .dispatcher
                    .dispatch_send_event(event, SendEventKind::SendPerformed);
            }

            info!(
                recipients = count,
                message_id = response.message_id().unwrap_or_default(),
                "email accepted by SendGrid"
            );
            return Ok(count);
        }

        let status = response.status_code;
        warn!(status, "SendGrid rejected the message");
        let error = ProviderRequestError::new(
            format!("SendGrid rejected the message with HTTP {status}"),
            response,
        );
        self.raise(error.into(), count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mailbridge_core::{ApiResponse, Attachment, BodyPart, Disposition, Mailbox};
    use mailbridge_transport::{
        Dispatch, ListenerDispatcher, MapSource, NullDispatcher, SendEvent,
        TransportExceptionEvent,
    };

    use super::*;
    use crate::client::tests::MockSendGridServer;
    use crate::error::SendGridError;

    /// A provider client that records every request and answers with a fixed
    /// status.
    #[derive(Debug, Clone)]
    struct MockApi {
        status: u16,
        body: String,
        sent: Arc<Mutex<Vec<SendGridMail>>>,
    }

    impl MockApi {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_owned(),
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        fn last(&self) -> SendGridMail {
            self.sent.lock().unwrap().last().cloned().expect("no request sent")
        }
    }

    #[async_trait]
    impl MailApi for MockApi {
        async fn send(&self, mail: &SendGridMail) -> Result<ApiResponse, SendGridError> {
            self.sent.lock().unwrap().push(mail.clone());
            Ok(ApiResponse::new(self.status, self.body.clone()))
        }

        async fn health_check(&self) -> Result<(), SendGridError> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "mock"
        }
    }

    /// Counts lifecycle notifications and optionally cancels them.
    #[derive(Default)]
    struct Recorder {
        cancel_before: bool,
        cancel_exception: bool,
        before: Mutex<usize>,
        after: Mutex<Vec<SendResult>>,
        exceptions: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn before_count(&self) -> usize {
            *self.before.lock().unwrap()
        }

        fn after_results(&self) -> Vec<SendResult> {
            self.after.lock().unwrap().clone()
        }

        fn exceptions(&self) -> Vec<String> {
            self.exceptions.lock().unwrap().clone()
        }
    }

    impl EventListener for Recorder {
        fn before_send_performed(&self, _event: &SendEvent<'_>) -> Dispatch {
            *self.before.lock().unwrap() += 1;
            if self.cancel_before {
                Dispatch::Cancelled
            } else {
                Dispatch::Continue
            }
        }

        fn send_performed(&self, event: &SendEvent<'_>) -> Dispatch {
            assert!(event.failed_recipients().is_empty());
            self.after.lock().unwrap().push(event.result());
            Dispatch::Continue
        }

        fn exception_thrown(&self, event: &TransportExceptionEvent<'_>) -> Dispatch {
            assert_eq!(event.transport(), "sendgrid");
            self.exceptions
                .lock()
                .unwrap()
                .push(event.error().to_string());
            if self.cancel_exception {
                Dispatch::Cancelled
            } else {
                Dispatch::Continue
            }
        }
    }

    fn transport_with(
        api: &MockApi,
        source: MapSource,
        recorder: &Arc<Recorder>,
    ) -> SendGridTransport {
        let transport =
            SendGridTransport::with_api(Box::new(api.clone()), Arc::new(ListenerDispatcher::new()))
                .with_config_source(Box::new(source));
        transport.register_plugin(Arc::clone(recorder) as Arc<dyn EventListener>);
        transport
    }

    fn greeting() -> Message {
        Message::new()
            .with_from(("a@x.com", "A"))
            .with_to(("b@x.com", "B"))
            .with_to(("c@x.com", "C"))
            .with_subject("Hi")
            .with_body("<p>hi</p>")
    }

    #[tokio::test]
    async fn accepted_send_returns_recipient_count() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let transport = transport_with(&api, MapSource::new(), &recorder);

        let count = transport.send(&greeting()).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(api.calls(), 1);
        assert_eq!(recorder.before_count(), 1);
        assert_eq!(recorder.after_results(), vec![SendResult::Success]);
        assert!(recorder.exceptions().is_empty());

        let mail = api.last();
        let from = mail.from.expect("from is set");
        assert_eq!(from.email, "a@x.com");
        assert_eq!(from.name.as_deref(), Some("A"));
        let to: Vec<&str> = mail.personalizations[0]
            .to
            .iter()
            .map(|a| a.email.as_str())
            .collect();
        assert_eq!(to, vec!["b@x.com", "c@x.com"]);
        assert_eq!(mail.subject, "Hi");
        assert!(mail.reply_to.is_none());
        assert!(mail.attachments.is_empty());
    }

    #[tokio::test]
    async fn only_html_content_is_sent() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let transport = transport_with(&api, MapSource::new(), &recorder);

        let message = greeting().with_part(BodyPart::new("text/plain", "hi"));
        transport.send(&message).await.unwrap();

        let mail = api.last();
        assert_eq!(mail.content.len(), 1);
        assert_eq!(mail.content[0].content_type, "text/html");
        assert_eq!(mail.content[0].value, "<p>hi</p>");
    }

    #[tokio::test]
    async fn rejected_send_returns_provider_request_error() {
        let api = MockApi::new(400, "bad request");
        let recorder = Arc::new(Recorder::default());
        let transport = transport_with(&api, MapSource::new(), &recorder);

        let err = transport.send(&greeting()).await.unwrap_err();

        match &err {
            TransportError::ProviderRequest(e) => {
                assert_eq!(e.status_code, 400);
                assert_eq!(e.body(), "bad request");
                assert_eq!(e.response.status_code, 400);
            }
            other => panic!("expected ProviderRequest, got {other:?}"),
        }
        assert_eq!(api.calls(), 1);
        assert_eq!(recorder.exceptions().len(), 1);
        assert!(recorder.after_results().is_empty());
    }

    #[tokio::test]
    async fn missing_sender_without_fallback_is_configuration_error() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let transport = transport_with(&api, MapSource::new(), &recorder);

        let message = Message::new().with_to("b@x.com").with_subject("Hi");
        let err = transport.send(&message).await.unwrap_err();

        assert!(matches!(err, TransportError::Configuration(_)));
        assert!(err.to_string().contains(DEFAULT_FROM_EMAIL_VAR));
        assert_eq!(api.calls(), 0);
        assert_eq!(recorder.exceptions().len(), 1);
    }

    #[tokio::test]
    async fn missing_sender_uses_configured_fallback() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let source = MapSource::new().with(DEFAULT_FROM_EMAIL_VAR, "noreply@x.com");
        let transport = transport_with(&api, source, &recorder);

        let message = Message::new().with_to("b@x.com");
        assert_eq!(transport.send(&message).await.unwrap(), 1);

        let from = api.last().from.expect("from is set");
        assert_eq!(from, EmailAddress::new("noreply@x.com"));
    }

    #[tokio::test]
    async fn message_sender_wins_over_fallback() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let source = MapSource::new().with(DEFAULT_FROM_EMAIL_VAR, "noreply@x.com");
        let transport = transport_with(&api, source, &recorder);

        transport.send(&greeting()).await.unwrap();
        assert_eq!(api.last().from.unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn override_address_replaces_to_recipients() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let source = MapSource::new().with(TEST_EMAIL_VAR, "qa@x.com");
        let transport = transport_with(&api, source, &recorder);

        let message = greeting().with_cc("cc@x.com").with_bcc("bcc@x.com");
        let count = transport.send(&message).await.unwrap();

        assert_eq!(count, 3);
        let mail = api.last();
        let personalization = &mail.personalizations[0];
        assert_eq!(personalization.to, vec![EmailAddress::new("qa@x.com")]);
        assert_eq!(personalization.cc, vec![EmailAddress::new("cc@x.com")]);
        assert_eq!(personalization.bcc, vec![EmailAddress::new("bcc@x.com")]);
        assert!(mail.recipients().all(|a| a.email != "b@x.com" && a.email != "c@x.com"));
    }

    #[tokio::test]
    async fn count_includes_cc_and_bcc() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let transport = transport_with(&api, MapSource::new(), &recorder);

        let message = greeting()
            .with_cc("cc1@x.com")
            .with_cc("cc2@x.com")
            .with_bcc("bcc@x.com");
        assert_eq!(transport.send(&message).await.unwrap(), 5);
        assert_eq!(api.last().recipients().count(), 5);
    }

    #[tokio::test]
    async fn reply_to_uses_first_entry_only() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let transport = transport_with(&api, MapSource::new(), &recorder);

        let message = greeting()
            .with_reply_to(("support@x.com", "Support"))
            .with_reply_to("other@x.com");
        transport.send(&message).await.unwrap();

        let reply_to = api.last().reply_to.expect("reply-to is set");
        assert_eq!(reply_to, EmailAddress::from(&Mailbox::named("support@x.com", "Support")));
    }

    #[tokio::test]
    async fn only_attachment_parts_are_forwarded() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let transport = transport_with(&api, MapSource::new(), &recorder);

        let logo = Attachment::inline(vec![0x89, 0x50, 0x4e, 0x47], "image/png", "logo.png");
        let message = greeting()
            .with_part(BodyPart::new("text/calendar", "BEGIN:VCALENDAR"))
            .with_attachment(Attachment::new(b"a,b".to_vec(), "text/csv", "data.csv"))
            .with_attachment(logo.clone());
        transport.send(&message).await.unwrap();

        let mail = api.last();
        assert_eq!(mail.attachments.len(), 2);
        assert_eq!(mail.attachments[0].filename, "data.csv");
        assert_eq!(mail.attachments[0].content, "YSxi");
        assert_eq!(mail.attachments[0].disposition, Disposition::Attachment);
        assert_eq!(mail.attachments[1].disposition, Disposition::Inline);
        assert_eq!(mail.attachments[1].content_id, logo.content_id());
        assert_eq!(mail.attachments[1].content_type, "image/png");
    }

    #[tokio::test]
    async fn empty_recipients_still_call_provider() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder::default());
        let transport = transport_with(&api, MapSource::new(), &recorder);

        let message = Message::new().with_from("a@x.com");
        assert_eq!(transport.send(&message).await.unwrap(), 0);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn cancelled_before_send_skips_provider() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder {
            cancel_before: true,
            ..Recorder::default()
        });
        let transport = transport_with(&api, MapSource::new(), &recorder);

        assert_eq!(transport.send(&greeting()).await.unwrap(), 0);
        assert_eq!(api.calls(), 0);
        assert!(recorder.after_results().is_empty());
    }

    #[tokio::test]
    async fn cancelled_exception_returns_attempted_count() {
        let api = MockApi::new(500, "internal error");
        let recorder = Arc::new(Recorder {
            cancel_exception: true,
            ..Recorder::default()
        });
        let transport = transport_with(&api, MapSource::new(), &recorder);

        assert_eq!(transport.send(&greeting()).await.unwrap(), 2);
        assert_eq!(recorder.exceptions().len(), 1);
        assert!(recorder.after_results().is_empty());
    }

    #[tokio::test]
    async fn cancelled_configuration_error_returns_zero() {
        let api = MockApi::new(202, "");
        let recorder = Arc::new(Recorder {
            cancel_exception: true,
            ..Recorder::default()
        });
        let transport = transport_with(&api, MapSource::new(), &recorder);

        let message = Message::new().with_to("b@x.com");
        assert_eq!(transport.send(&message).await.unwrap(), 0);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn without_events_errors_always_propagate() {
        let api = MockApi::new(403, "forbidden");
        let transport = SendGridTransport::with_api(Box::new(api.clone()), Arc::new(NullDispatcher))
            .with_config_source(Box::new(MapSource::new()));

        let err = transport.send(&greeting()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn without_events_accepted_send_returns_count() {
        let api = MockApi::new(202, "");
        let transport = SendGridTransport::with_api(Box::new(api.clone()), Arc::new(NullDispatcher))
            .with_config_source(Box::new(MapSource::new()));

        assert_eq!(transport.send(&greeting()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn client_failures_bypass_exception_listeners() {
        let recorder = Arc::new(Recorder {
            cancel_exception: true,
            ..Recorder::default()
        });
        let client = SendGridClient::new(
            SendGridConfig::new("SG.key").with_api_base_url("http://127.0.0.1:1"),
        )
        .unwrap();
        let transport =
            SendGridTransport::with_api(Box::new(client), Arc::new(ListenerDispatcher::new()))
                .with_config_source(Box::new(MapSource::new()));
        transport.register_plugin(Arc::clone(&recorder) as Arc<dyn EventListener>);

        let err = transport.send(&greeting()).await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
        assert!(err.is_retryable());
        assert!(recorder.exceptions().is_empty());
    }

    #[tokio::test]
    async fn end_to_end_against_mock_server() {
        let server = MockSendGridServer::start().await;
        let transport = SendGridTransport::new(
            SendGridConfig::new("SG.key").with_api_base_url(&server.base_url),
            Arc::new(ListenerDispatcher::new()),
        )
        .unwrap()
        .with_config_source(Box::new(MapSource::new()));

        let server_handle = tokio::spawn(async move { server.respond_once(202, "").await });

        let count = transport.send(&greeting()).await.unwrap();
        let request = server_handle.await.unwrap();

        assert_eq!(count, 2);
        assert!(request.contains(r#""from":{"email":"a@x.com","name":"A"}"#));
        assert!(request.contains(r#""to":[{"email":"b@x.com","name":"B"},{"email":"c@x.com","name":"C"}]"#));
    }

    #[test]
    fn lifecycle_flags_and_ping() {
        let api = MockApi::new(202, "");
        let dispatcher = Arc::new(ListenerDispatcher::new());
        let transport = SendGridTransport::with_api(
            Box::new(api),
            Arc::clone(&dispatcher) as Arc<dyn EventDispatcher>,
        );

        assert_eq!(Transport::name(&transport), "sendgrid");
        assert!(Transport::ping(&transport));
        assert!(!Transport::is_started(&transport));
        Transport::start(&transport);
        Transport::start(&transport);
        assert!(Transport::is_started(&transport));
        Transport::stop(&transport);
        Transport::stop(&transport);
        assert!(!Transport::is_started(&transport));

        Transport::register_plugin(&transport, Arc::new(Recorder::default()));
        assert_eq!(dispatcher.len(), 1);
    }

    #[tokio::test]
    async fn usable_as_dyn_transport() {
        let api = MockApi::new(202, "");
        let transport: Arc<dyn mailbridge_transport::DynTransport> = Arc::new(
            SendGridTransport::with_api(Box::new(api.clone()), Arc::new(NullDispatcher))
                .with_config_source(Box::new(MapSource::new())),
        );

        assert_eq!(transport.name(), "sendgrid");
        assert_eq!(transport.send(&greeting()).await.unwrap(), 2);
        assert_eq!(api.calls(), 1);
    }

    #[test]
    fn debug_does_not_leak_api_key() {
        let transport = SendGridTransport::new(
            SendGridConfig::new("SG.secret-value"),
            Arc::new(NullDispatcher),
        )
        .unwrap();
        let debug = format!("{transport:?}");
        assert!(debug.contains("SendGridTransport"));
        assert!(!debug.contains("secret-value"));
    }
}

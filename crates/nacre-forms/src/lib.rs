#![forbid(unsafe_code)]

//! Form layer for Nacre: per-form rule sets, real-time field validation,
//! a submit pipeline with guaranteed cleanup, transient notifications, and
//! the attachment policy.
//!
//! One [`FormHandler`] instance owns the wiring for a document. Like the
//! animation controller it is constructed explicitly and torn down with
//! [`FormHandler::dispose`].
//!
//! # Pipeline
//!
//! Per form: `Idle → Validating → (Invalid → Idle) | (Submitting →
//! Submitted | Failed → Idle)`. The settle step always restores the submit
//! control — success, failure, and handler-error paths alike — so no
//! outcome can leave a form permanently disabled. An explicit in-flight
//! phase ignores re-entrant submits regardless of button state.

pub mod attach;
#[cfg(feature = "config")]
pub mod config;
pub mod mailto;
pub mod notify;
pub mod rules;
pub mod submit;
pub mod validate;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;
use rand::SeedableRng;
use rand::rngs::StdRng;

use nacre_dom::{Document, EventKind, ListenerId, NodeId};
use nacre_runtime::{Debouncer, TimerId, TimerQueue};

pub use attach::{
    ALLOWED_MIME_TYPES, AttachmentError, FileMeta, MAX_ATTACHMENT_BYTES, check_attachment,
};
#[cfg(feature = "config")]
pub use config::{ConfigError, descriptors_from_toml};
pub use mailto::{contact_body, encode_component, mailto_uri};
pub use notify::{NotificationCenter, NotificationKind};
pub use rules::{
    DEFAULT_CONTACT_RECIPIENT, FieldRule, FormDescriptor, contact_descriptor,
    newsletter_descriptor,
};
pub use submit::{
    FormPhase, INPUT_DEBOUNCE_MS, Outcome, SubmitHandler, SubmitResult, Submission,
};
pub use validate::{FieldError, FormData, ValidationResult, field_label, validate, validate_value};

use submit::{
    FALLBACK_SUBMIT_LABEL, FEEDBACK_CLASS_MS, GENERIC_FAILURE_MESSAGE, MAIL_HANDOFF_MESSAGE,
    SENDING_LABEL, resolve_outcome,
};

struct RegisteredForm {
    descriptor: FormDescriptor,
    node: NodeId,
    phase: Cell<FormPhase>,
}

/// Handles shared by every pipeline closure.
#[derive(Clone)]
struct Shared {
    doc: Document,
    timers: TimerQueue,
    notifications: NotificationCenter,
    rng: Rc<RefCell<StdRng>>,
    last_mailto: Rc<RefCell<Option<String>>>,
    mail_launcher: Rc<RefCell<Option<Box<dyn Fn(&str)>>>>,
    armed: Rc<RefCell<Vec<TimerId>>>,
}

/// Owns validation and submission wiring for every registered form.
pub struct FormHandler {
    shared: Shared,
    forms: Rc<RefCell<AHashMap<String, Rc<RegisteredForm>>>>,
    listeners: Rc<RefCell<Vec<ListenerId>>>,
    debouncers: Vec<Rc<Debouncer>>,
    disposed: bool,
}

impl FormHandler {
    /// Create a handler and register the stock forms when present: an
    /// element with id `contact-form` gets the contact descriptor, one with
    /// id `newsletter-form` the newsletter descriptor.
    #[must_use]
    pub fn new(doc: &Document, timers: &TimerQueue) -> Self {
        Self::with_rng(doc, timers, StdRng::from_os_rng())
    }

    /// Same as [`FormHandler::new`] with a fixed RNG seed, for deterministic
    /// simulated outcomes in tests.
    #[must_use]
    pub fn with_seed(doc: &Document, timers: &TimerQueue, seed: u64) -> Self {
        Self::with_rng(doc, timers, StdRng::seed_from_u64(seed))
    }

    fn with_rng(doc: &Document, timers: &TimerQueue, rng: StdRng) -> Self {
        let mut handler = Self {
            shared: Shared {
                doc: doc.clone(),
                timers: timers.clone(),
                notifications: NotificationCenter::new(doc, timers),
                rng: Rc::new(RefCell::new(rng)),
                last_mailto: Rc::new(RefCell::new(None)),
                mail_launcher: Rc::new(RefCell::new(None)),
                armed: Rc::new(RefCell::new(Vec::new())),
            },
            forms: Rc::new(RefCell::new(AHashMap::new())),
            listeners: Rc::new(RefCell::new(Vec::new())),
            debouncers: Vec::new(),
            disposed: false,
        };
        if let Some(node) = doc.query_id("contact-form") {
            handler.register(contact_descriptor(DEFAULT_CONTACT_RECIPIENT), node);
        }
        if let Some(node) = doc.query_id("newsletter-form") {
            handler.register(newsletter_descriptor(), node);
        }
        handler
    }

    /// Receive the `mailto:` URI whenever a mail-client submission runs.
    /// The URI is also always recorded for [`FormHandler::last_mailto`].
    pub fn set_mail_launcher(&self, launcher: impl Fn(&str) + 'static) {
        *self.shared.mail_launcher.borrow_mut() = Some(Box::new(launcher));
    }

    /// The most recent mail hand-off URI, if any.
    #[must_use]
    pub fn last_mailto(&self) -> Option<String> {
        self.shared.last_mailto.borrow().clone()
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationCenter {
        &self.shared.notifications
    }

    /// Current pipeline phase of a registered form.
    #[must_use]
    pub fn phase(&self, name: &str) -> Option<FormPhase> {
        self.forms.borrow().get(name).map(|f| f.phase.get())
    }

    /// Register `descriptor` against a form node: wires the submit listener
    /// plus per-control blur/focus/input validation.
    pub fn register(&mut self, descriptor: FormDescriptor, node: NodeId) {
        let name = descriptor.name.clone();
        let form = Rc::new(RegisteredForm {
            descriptor,
            node,
            phase: Cell::new(FormPhase::Idle),
        });

        let shared = self.shared.clone();
        let on_submit = Rc::clone(&form);
        self.listeners.borrow_mut().push(self.shared.doc.add_listener(
            node,
            EventKind::Submit,
            move |_| run_submit(&shared, &on_submit),
        ));

        let controls = self.shared.doc.controls(node);
        for control in &controls {
            let control = *control;

            let doc = self.shared.doc.clone();
            let on_blur = Rc::clone(&form);
            self.listeners.borrow_mut().push(self.shared.doc.add_listener(
                control,
                EventKind::Blur,
                move |_| validate_field_now(&doc, &on_blur.descriptor, control),
            ));

            let doc = self.shared.doc.clone();
            self.listeners.borrow_mut().push(self.shared.doc.add_listener(
                control,
                EventKind::Focus,
                move |_| clear_field_error(&doc, control),
            ));

            let debouncer = Rc::new(Debouncer::new(
                self.shared.timers.clone(),
                INPUT_DEBOUNCE_MS,
            ));
            self.debouncers.push(Rc::clone(&debouncer));
            let doc = self.shared.doc.clone();
            let on_input = Rc::clone(&form);
            self.listeners.borrow_mut().push(self.shared.doc.add_listener(
                control,
                EventKind::Input,
                move |_| {
                    let doc = doc.clone();
                    let form = Rc::clone(&on_input);
                    debouncer.trigger(move || {
                        validate_field_now(&doc, &form.descriptor, control);
                    });
                },
            ));
        }

        tracing::debug!(form = %name, controls = controls.len(), "form registered");
        self.forms.borrow_mut().insert(name, form);
    }

    /// Run the submit pipeline for a registered form, exactly as a `Submit`
    /// event on its node would.
    pub fn submit(&self, name: &str) {
        let form = self.forms.borrow().get(name).cloned();
        if let Some(form) = form {
            run_submit(&self.shared, &form);
        } else {
            tracing::warn!(form = %name, "submit for unregistered form");
        }
    }

    /// Validate a registered form's current control values without touching
    /// the document or the pipeline.
    #[must_use]
    pub fn validate_form(&self, name: &str) -> Option<ValidationResult> {
        let form = self.forms.borrow().get(name).cloned()?;
        let data = FormData::collect(&self.shared.doc, form.node);
        Some(validate(&form.descriptor.rules, &data))
    }

    /// Remove every error decoration under `form`. Safe to call repeatedly.
    pub fn clear_errors(&self, form: NodeId) {
        clear_all_errors(&self.shared.doc, form);
    }

    /// Apply the attachment policy to a picked file. Rejections notify the
    /// user and clear the input's value. Accepted images get an inline
    /// preview next to the input; the preview's remove button clears both.
    pub fn attach_file(
        &self,
        input: NodeId,
        file: FileMeta,
    ) -> Result<Option<NodeId>, AttachmentError> {
        let doc = &self.shared.doc;
        if let Err(error) = check_attachment(&file) {
            tracing::debug!(file = %file.name, %error, "attachment rejected");
            self.shared
                .notifications
                .show(NotificationKind::Error, error.user_message());
            doc.set_value(input, "");
            return Err(error);
        }
        if !file.is_image() {
            return Ok(None);
        }

        let preview = doc.create_element("div");
        doc.add_class(preview, "file-preview");
        for (prop, value) in [
            ("position", "relative"),
            ("display", "inline-block"),
            ("margin-top", "0.5rem"),
        ] {
            doc.set_style(preview, prop, value);
        }

        let image = doc.create_element("img");
        doc.set_attr(image, "alt", "Preview");
        doc.set_attr(image, "data-file", &file.name);
        doc.append_child(preview, image);

        let remove = doc.create_element("button");
        doc.add_class(remove, "remove-file");
        doc.set_attr(remove, "aria-label", "Remove file");
        doc.set_text(remove, "×");
        doc.append_child(preview, remove);

        if let Some(parent) = doc.parent(input) {
            doc.append_child(parent, preview);
        }

        let doc_handle = doc.clone();
        let listener = doc.add_listener(remove, EventKind::Click, move |_| {
            doc_handle.remove(preview);
            doc_handle.set_value(input, "");
        });
        self.listeners.borrow_mut().push(listener);

        Ok(Some(preview))
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Tear down: unregister listeners, cancel debouncers and armed timers,
    /// evict the live notification, clear the registry. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for listener in self.listeners.borrow_mut().drain(..) {
            self.shared.doc.remove_listener(listener);
        }
        for debouncer in self.debouncers.drain(..) {
            debouncer.cancel();
        }
        for timer in self.shared.armed.borrow_mut().drain(..) {
            self.shared.timers.cancel(timer);
        }
        self.shared.notifications.evict();
        self.forms.borrow_mut().clear();
        tracing::debug!("form handler disposed");
    }
}

impl std::fmt::Debug for FormHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormHandler")
            .field("forms", &self.forms.borrow().len())
            .field("listeners", &self.listeners.borrow().len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn run_submit(shared: &Shared, form: &Rc<RegisteredForm>) {
    let name = form.descriptor.name.as_str();
    if form.phase.get() == FormPhase::Submitting {
        tracing::debug!(form = %name, "submit ignored, already in flight");
        return;
    }

    form.phase.set(FormPhase::Validating);
    let data = FormData::collect(&shared.doc, form.node);
    let result = validate(&form.descriptor.rules, &data);
    if !result.is_valid() {
        tracing::debug!(form = %name, errors = result.errors().len(), "validation failed");
        render_errors(&shared.doc, form.node, &result);
        form.phase.set(FormPhase::Idle);
        return;
    }

    let button = submit_button(&shared.doc, form.node);
    let original_label = button.map(|b| shared.doc.text(b));
    if let Some(button) = button {
        shared.doc.set_disabled(button, true);
        shared.doc.set_text(button, SENDING_LABEL);
        shared.doc.set_style(button, "opacity", "0.7");
    }
    form.phase.set(FormPhase::Submitting);

    match &form.descriptor.submission {
        Submission::MailClient { recipient } => {
            let uri = mailto_uri(
                recipient,
                data.get_or_empty("subject"),
                &contact_body(
                    data.get_or_empty("name"),
                    data.get_or_empty("email"),
                    data.get_or_empty("message"),
                ),
            );
            tracing::debug!(form = %name, "mail hand-off constructed");
            *shared.last_mailto.borrow_mut() = Some(uri.clone());
            if let Some(launch) = shared.mail_launcher.borrow().as_ref() {
                launch(&uri);
            }
            settle(
                shared,
                form,
                button,
                original_label,
                SubmitResult::success(MAIL_HANDOFF_MESSAGE),
            );
        }
        Submission::Simulated { delay_ms, outcome } => {
            let shared_done = shared.clone();
            let form_done = Rc::clone(form);
            let outcome = outcome.clone();
            let timer = shared.timers.set_timeout(*delay_ms, move || {
                let result = resolve_outcome(&outcome, &mut shared_done.rng.borrow_mut());
                settle(&shared_done, &form_done, button, original_label, result);
            });
            shared.armed.borrow_mut().push(timer);
        }
        Submission::Custom { delay_ms, handler } => {
            let shared_done = shared.clone();
            let form_done = Rc::clone(form);
            let handler = Rc::clone(handler);
            let timer = shared.timers.set_timeout(*delay_ms, move || {
                let result = match handler(&data) {
                    Ok(result) => result,
                    Err(error) => {
                        tracing::error!(
                            form = %form_done.descriptor.name,
                            %error,
                            "submission handler failed"
                        );
                        SubmitResult::failure(GENERIC_FAILURE_MESSAGE)
                    }
                };
                settle(&shared_done, &form_done, button, original_label, result);
            });
            shared.armed.borrow_mut().push(timer);
        }
    }
}

/// Always-run cleanup plus the outcome branch. No path skips the restore.
fn settle(
    shared: &Shared,
    form: &Rc<RegisteredForm>,
    button: Option<NodeId>,
    original_label: Option<String>,
    result: SubmitResult,
) {
    if let Some(button) = button {
        shared.doc.set_disabled(button, false);
        shared
            .doc
            .set_text(button, original_label.as_deref().unwrap_or(FALLBACK_SUBMIT_LABEL));
        shared.doc.set_style(button, "opacity", "1");
    }
    form.phase.set(FormPhase::Idle);

    if result.success {
        shared
            .notifications
            .show(NotificationKind::Success, &result.message);
        shared.doc.reset_controls(form.node);
        clear_all_errors(&shared.doc, form.node);
        flash_class(shared, form.node, "form-success");
    } else {
        tracing::warn!(form = %form.descriptor.name, message = %result.message, "submission failed");
        shared
            .notifications
            .show(NotificationKind::Error, &result.message);
        flash_class(shared, form.node, "form-error");
    }
}

/// Add a feedback class and drop it again after the feedback window.
fn flash_class(shared: &Shared, node: NodeId, class: &str) {
    shared.doc.add_class(node, class);
    let doc = shared.doc.clone();
    let class = class.to_owned();
    let timer = shared
        .timers
        .set_timeout(FEEDBACK_CLASS_MS, move || doc.remove_class(node, &class));
    shared.armed.borrow_mut().push(timer);
}

/// First descendant `button` with `type="submit"`.
fn submit_button(doc: &Document, form: NodeId) -> Option<NodeId> {
    doc.query_tag_within(form, "button")
        .into_iter()
        .find(|b| doc.attr(*b, "type").as_deref() == Some("submit"))
}

// ---------------------------------------------------------------------------
// Error decorations
// ---------------------------------------------------------------------------

/// Validate one control against its rule right now (blur / debounced input).
fn validate_field_now(doc: &Document, descriptor: &FormDescriptor, control: NodeId) {
    let Some(name) = doc.attr(control, "name") else {
        return;
    };
    let Some(rule) = descriptor.rule_for(&name) else {
        return;
    };
    match validate_value(rule, &doc.value(control)) {
        Some(message) => show_field_error(doc, control, &message),
        None => clear_field_error(doc, control),
    }
}

/// Decorate a control with an error: `error` class on the control, a
/// `field-error` message node right after it. Replaces any previous
/// decoration on the same control.
fn show_field_error(doc: &Document, control: NodeId, message: &str) {
    clear_field_error(doc, control);
    doc.add_class(control, "error");

    let error = doc.create_element("div");
    doc.add_class(error, "field-error");
    doc.set_text(error, message);
    for (prop, value) in [
        ("color", "#ef4444"),
        ("font-size", "0.875rem"),
        ("margin-top", "0.25rem"),
        ("display", "block"),
    ] {
        doc.set_style(error, prop, value);
    }
    doc.insert_after(control, error);
}

/// Remove one control's decoration, if present.
fn clear_field_error(doc: &Document, control: NodeId) {
    doc.remove_class(control, "error");
    if let Some(parent) = doc.parent(control) {
        let children = doc.children(parent);
        if let Some(position) = children.iter().position(|c| *c == control)
            && let Some(next) = children.get(position + 1)
            && doc.has_class(*next, "field-error")
        {
            doc.remove(*next);
        }
    }
}

/// Remove every decoration under `form`. Idempotent.
fn clear_all_errors(doc: &Document, form: NodeId) {
    for control in doc.controls(form) {
        doc.remove_class(control, "error");
    }
    for error in doc.query_class_within(form, "field-error") {
        doc.remove(error);
    }
}

/// Clear everything, then render exactly the new error set.
fn render_errors(doc: &Document, form: NodeId, result: &ValidationResult) {
    clear_all_errors(doc, form);
    for error in result.errors() {
        if let Some(control) = doc.query_name_within(form, &error.field) {
            show_field_error(doc, control, &error.message);
        }
    }
}

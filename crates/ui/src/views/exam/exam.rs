use std::time::Duration;

use dioxus::document::eval;
use dioxus::prelude::*;
use tracing::{info, warn};

use services::{ExamPhase, StartForm, TickOutcome};

use super::chrome::{ExamFooter, ExamHeader, HeaderInfo, QuestionPalette, SectionSelector};
use super::question::{PaneNav, QuestionPane};
use super::scripts::{focus_script, fullscreen_script};
use super::start_screen::{StartInfo, StartScreen};
use super::submitted::{SubmittedInfo, SubmittedView};
use crate::context::{AppContext, CurrentUser};
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{ExamIntent, ExamVm, TickLedger, format_datetime, format_duration, load_exam};

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;

fn start_info(vm: &ExamVm) -> StartInfo {
    let definition = vm.session().definition();
    StartInfo {
        title: definition.title().to_string(),
        description: definition.description().to_string(),
        duration_label: format_duration(definition.duration_seconds()),
        sections: definition.sections().to_vec(),
    }
}

fn header_info(vm: &ExamVm) -> HeaderInfo {
    HeaderInfo {
        title: vm.title().to_string(),
        email: vm.candidate_email().map(str::to_string),
        timer_label: vm.timer_label(),
        timer_warning: vm.timer_warning(),
        preview: vm.is_preview(),
        fullscreen: vm.fullscreen(),
    }
}

fn submitted_info(vm: &ExamVm) -> Option<SubmittedInfo> {
    let submission = vm.session().submission()?;
    Some(SubmittedInfo {
        title: vm.title().to_string(),
        reason: submission.snapshot.reason,
        answered: submission.snapshot.answered_count(),
        total: submission.snapshot.entries.len(),
        started_at: vm.session().started_at().map(format_datetime),
        delivery: submission.delivery.clone(),
    })
}

fn current_section_title(vm: &ExamVm) -> String {
    vm.sections()
        .into_iter()
        .find(|s| s.is_current)
        .map(|s| s.title)
        .unwrap_or_default()
}

#[component]
pub fn ExamView() -> Element {
    let ctx = use_context::<AppContext>();
    let exam_loop = ctx.exam_loop();
    let test_id = ctx.test_id();
    let preview = ctx.preview();

    let mut error = use_signal(|| None::<ViewError>);
    let mut vm = use_signal(|| None::<ExamVm>);
    // Copy of the session rendered while the real one is out on an async call.
    let mut frozen = use_signal(|| None::<ExamVm>);
    let mut busy = use_signal(|| false);
    let form = use_signal(StartForm::default);
    let mut choosing_section = use_signal(|| false);
    let mut applied_fullscreen = use_signal(|| false);

    let resource = {
        let exam_loop = exam_loop.clone();
        use_resource(move || {
            let exam_loop = exam_loop.clone();
            async move {
                let loaded = load_exam(&exam_loop, test_id, preview).await?;
                vm.set(Some(loaded));
                Ok::<_, ViewError>(())
            }
        })
    };
    let state = view_state_from_resource(resource);

    // One-second ticker, cancelled with the component. Ticks that land while
    // the session is checked out are owed and replayed once it is back.
    {
        let exam_loop = exam_loop.clone();
        use_future(move || {
            let exam_loop = exam_loop.clone();
            async move {
                let mut ledger = TickLedger::default();
                loop {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    let due = ledger.record(vm.peek().as_ref().map(ExamVm::phase));
                    if due == 0 {
                        continue;
                    }
                    let Some(mut vm_value) = vm.write().take() else {
                        continue;
                    };
                    frozen.set(Some(vm_value.clone()));
                    let outcome = vm_value.tick(&exam_loop, due).await;
                    ledger.settle();
                    vm.set(Some(vm_value));
                    frozen.set(None);
                    if outcome == TickOutcome::Expired {
                        info!("time is up, test submitted");
                    }
                }
            }
        });
    }

    // Follows sign-in and logout; a checked-out session leaves it alone.
    let current_user = try_use_context::<CurrentUser>();
    use_effect(move || {
        let Some(CurrentUser(mut user)) = current_user else {
            return;
        };
        let guard = vm.read();
        let Some(vm_value) = guard.as_ref() else {
            return;
        };
        let signed_in = vm_value.session().candidate().map(|c| c.user_id.clone());
        if *user.peek() != signed_in {
            user.set(signed_in);
        }
    });

    use_effect(move || {
        let wanted = vm.read().as_ref().is_some_and(ExamVm::fullscreen);
        if *applied_fullscreen.peek() == wanted {
            return;
        }
        applied_fullscreen.set(wanted);
        let _ = eval(&fullscreen_script(wanted));
    });

    let dispatch = {
        let exam_loop = exam_loop.clone();
        use_callback(move |intent: ExamIntent| {
            // The session is out on an async call, possibly the ticker's.
            if *busy.peek() || frozen.peek().is_some() {
                return;
            }
            if !intent.is_async() {
                let result = match vm.write().as_mut() {
                    Some(vm_value) => vm_value.apply(&intent),
                    None => Err(ViewError::Unknown),
                };
                match result {
                    Ok(()) => error.set(None),
                    Err(err) => error.set(Some(err)),
                }
                if intent == ExamIntent::Logout {
                    choosing_section.set(false);
                    let _ = eval(&focus_script("start-email"));
                }
                return;
            }

            let exam_loop = exam_loop.clone();
            spawn(async move {
                let is_start = matches!(intent, ExamIntent::Start(_));
                let Some(mut vm_value) = vm.write().take() else {
                    error.set(Some(ViewError::Unknown));
                    return;
                };
                busy.set(true);
                frozen.set(Some(vm_value.clone()));

                let result = vm_value.perform(&exam_loop, intent).await;

                // The session goes back even on error; nothing was lost.
                vm.set(Some(vm_value));
                frozen.set(None);
                busy.set(false);

                match result {
                    Ok(()) => error.set(None),
                    Err(err) => {
                        warn!(error = ?err, "exam action failed");
                        if is_start {
                            choosing_section.set(false);
                        }
                        error.set(Some(err));
                    }
                }
            });
        })
    };

    #[cfg(test)]
    {
        let mut registered = use_signal(|| false);
        if !registered() {
            registered.set(true);
            if let Some(handles) = try_consume_context::<ExamTestHandles>() {
                handles.register(dispatch, vm, frozen);
            }
        }
    }

    let on_key = move |evt: KeyboardEvent| {
        if !evt.data.modifiers().contains(Modifiers::ALT) {
            return;
        }
        match evt.data.key() {
            Key::ArrowRight => {
                evt.prevent_default();
                dispatch.call(ExamIntent::Next);
            }
            Key::ArrowLeft => {
                evt.prevent_default();
                dispatch.call(ExamIntent::Previous);
            }
            _ => {}
        }
    };

    let vm_guard = vm.read();
    let frozen_guard = frozen.read();
    let shown = vm_guard.as_ref().or(frozen_guard.as_ref());
    let is_busy = busy();
    let error_now = error.read().clone();

    rsx! {
        div { class: "page exam-page", id: "exam-root", tabindex: "0", onkeydown: on_key,
            match (state, shown) {
                (ViewState::Idle, _) => rsx! {
                    p { "Idle" }
                },
                (ViewState::Loading, _) => rsx! {
                    p { class: "exam-status", "Loading test..." }
                },
                (ViewState::Error(err), _) => rsx! {
                    div { class: "exam-status exam-status--error",
                        p { "{err.message()}" }
                        if err.is_retryable() {
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| {
                                    let mut resource = resource;
                                    resource.restart();
                                },
                                "Retry"
                            }
                        }
                    }
                },
                (ViewState::Ready(()), None) => rsx! {
                    p { class: "exam-status", "Loading test..." }
                },
                (ViewState::Ready(()), Some(current)) => match current.phase() {
                    ExamPhase::Unauthenticated => rsx! {
                        StartScreen {
                            info: start_info(current),
                            form,
                            choosing_section,
                            error,
                            on_intent: dispatch,
                        }
                    },
                    ExamPhase::Active | ExamPhase::Preview => {
                        let window_class = if current.fullscreen() {
                            "exam-window exam-window--fullscreen"
                        } else {
                            "exam-window"
                        };
                        rsx! {
                        div { class: "{window_class}",
                            ExamHeader { info: header_info(current), on_intent: dispatch }
                            SectionSelector { sections: current.sections(), on_intent: dispatch }
                            if let Some(err) = error_now.as_ref() {
                                p { class: "exam-error", role: "alert", "{err.message()}" }
                            }
                            div { class: "exam-body",
                                if current.sidebar_visible() {
                                    QuestionPalette {
                                        section_title: current_section_title(current),
                                        items: current.palette(),
                                        on_intent: dispatch,
                                    }
                                }
                                main { class: "exam-main",
                                    if let Some(question) = current.question() {
                                        QuestionPane {
                                            question,
                                            nav: PaneNav {
                                                position_label: current.position_label(),
                                                can_previous: current.can_previous(),
                                                can_next: current.can_next(),
                                            },
                                            running: is_busy,
                                            on_intent: dispatch,
                                        }
                                    }
                                }
                            }
                            ExamFooter {
                                progress: current.progress(),
                                preview: current.is_preview(),
                                on_intent: dispatch,
                            }
                        }
                        }
                    }
                    ExamPhase::Submitted => match submitted_info(current) {
                        Some(info) => rsx! {
                            SubmittedView { info, busy: is_busy, on_intent: dispatch }
                        },
                        None => rsx! {
                            p { class: "exam-status", "Submitting..." }
                        },
                    },
                },
            }
        }
    }
}

#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct ExamTestHandles {
    dispatch: Rc<RefCell<Option<Callback<ExamIntent>>>>,
    vm: Rc<RefCell<Option<Signal<Option<ExamVm>>>>>,
    frozen: Rc<RefCell<Option<Signal<Option<ExamVm>>>>>,
}

#[cfg(test)]
impl ExamTestHandles {
    pub(crate) fn register(
        &self,
        dispatch: Callback<ExamIntent>,
        vm: Signal<Option<ExamVm>>,
        frozen: Signal<Option<ExamVm>>,
    ) {
        *self.dispatch.borrow_mut() = Some(dispatch);
        *self.vm.borrow_mut() = Some(vm);
        *self.frozen.borrow_mut() = Some(frozen);
    }

    pub(crate) fn dispatch(&self) -> Callback<ExamIntent> {
        (*self.dispatch.borrow()).expect("exam dispatch registered")
    }

    pub(crate) fn vm(&self) -> Signal<Option<ExamVm>> {
        (*self.vm.borrow()).expect("exam vm registered")
    }

    pub(crate) fn frozen(&self) -> Signal<Option<ExamVm>> {
        (*self.frozen.borrow()).expect("exam frozen copy registered")
    }
}

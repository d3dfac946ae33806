use dioxus::prelude::*;
use dioxus_router::Link;

use services::DeliveryStatus;
use testcraft_core::model::SubmitReason;

use crate::routes::Route;
use crate::vm::ExamIntent;

#[derive(Clone, Debug, PartialEq)]
pub(super) struct SubmittedInfo {
    pub title: String,
    pub reason: SubmitReason,
    pub answered: usize,
    pub total: usize,
    pub started_at: Option<String>,
    pub delivery: DeliveryStatus,
}

#[component]
pub(super) fn SubmittedView(
    info: SubmittedInfo,
    busy: bool,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    let lead = match info.reason {
        SubmitReason::TimeExpired => "Time is up. Your answers were submitted automatically.",
        SubmitReason::Manual => "Your answers have been recorded.",
    };
    let answered = format!("Answered {} of {} questions", info.answered, info.total);

    rsx! {
        div { class: "submitted",
            h2 { class: "submitted__title", "{info.title}" }
            p { class: "submitted__lead", "{lead}" }
            p { class: "submitted__meta", "{answered}" }
            if let Some(started) = info.started_at.as_ref() {
                p { class: "submitted__meta", "Started {started}" }
            }
            match info.delivery.clone() {
                DeliveryStatus::Pending => rsx! {
                    p { class: "delivery delivery--pending", "Submitting..." }
                },
                DeliveryStatus::Delivered(_) => rsx! {
                    p { class: "delivery delivery--ok", "Test submitted successfully!" }
                },
                DeliveryStatus::Duplicate => rsx! {
                    p { class: "delivery delivery--ok", "Your answers were already received." }
                },
                DeliveryStatus::Rejected(message) => rsx! {
                    div { class: "delivery delivery--failed", role: "alert",
                        p { "The server did not accept this submission: {message}" }
                        p { "Please contact the test organizer." }
                    }
                },
                DeliveryStatus::Failed(message) => rsx! {
                    div { class: "delivery delivery--failed", role: "alert",
                        p { "Your answers could not be sent: {message}" }
                        p { "They are kept here until delivery succeeds." }
                        button {
                            class: "btn btn-primary",
                            id: "delivery-retry",
                            r#type: "button",
                            disabled: busy,
                            onclick: move |_| on_intent.call(ExamIntent::RetryDelivery),
                            if busy { "Retrying..." } else { "Retry" }
                        }
                    }
                },
            }
            p { class: "submitted__aside",
                Link { to: Route::Ranking {}, "View rankings" }
            }
        }
    }
}

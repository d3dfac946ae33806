use dioxus::prelude::*;
use dioxus_router::Link;

use services::StartForm;
use testcraft_core::model::{Section, SectionId};

use crate::routes::Route;
use crate::views::ViewError;
use crate::vm::ExamIntent;

#[derive(Clone, Debug, PartialEq)]
pub(super) struct StartInfo {
    pub title: String,
    pub description: String,
    pub duration_label: String,
    pub sections: Vec<Section>,
}

/// Credentials first, then the starting section. The draft lives in the
/// parent so it survives the round trip to the access validator.
#[component]
pub(super) fn StartScreen(
    info: StartInfo,
    mut form: Signal<StartForm>,
    mut choosing_section: Signal<bool>,
    mut error: Signal<Option<ViewError>>,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    let first_section = info.sections.first().map(|s| s.id.clone());
    let selected = form
        .read()
        .starting_section
        .clone()
        .or_else(|| first_section.clone());
    let subtitle = if choosing_section() {
        "Select a section to begin with"
    } else {
        "Please enter your credentials to start the test"
    };

    let on_continue = move |evt: FormEvent| {
        evt.prevent_default();
        match form.read().validate() {
            Ok(_) => {
                error.set(None);
                choosing_section.set(true);
            }
            Err(err) => error.set(Some(ViewError::Invalid(err.to_string()))),
        }
    };

    rsx! {
        div { class: "start-screen",
            h2 { class: "start-screen__title", "{info.title}" }
            p { class: "start-screen__subtitle", "{subtitle}" }
            div { class: "start-screen__card",
                if !choosing_section() {
                    div { class: "start-info",
                        h3 { "Test Information" }
                        if !info.description.is_empty() {
                            p { "{info.description}" }
                        }
                        p {
                            strong { "Duration: " }
                            "{info.duration_label}"
                        }
                        p { strong { "Sections:" } }
                        ul {
                            for section in info.sections.iter() {
                                li { key: "{section.id}",
                                    if section.description.is_empty() {
                                        "{section.title}"
                                    } else {
                                        "{section.title} - {section.description}"
                                    }
                                }
                            }
                        }
                    }
                    if let Some(err) = error.read().as_ref() {
                        p { class: "form-error", role: "alert", "{err.message()}" }
                    }
                    form { class: "start-form", onsubmit: on_continue,
                        label { r#for: "start-email", "Email address" }
                        input {
                            id: "start-email",
                            r#type: "email",
                            placeholder: "you@example.com",
                            value: "{form.read().email}",
                            oninput: move |evt| form.write().email = evt.value(),
                        }
                        label { r#for: "start-code", "Access Code" }
                        input {
                            id: "start-code",
                            r#type: "text",
                            placeholder: "Enter your access code",
                            value: "{form.read().access_code}",
                            oninput: move |evt| form.write().access_code = evt.value(),
                        }
                        button { class: "btn btn-primary", id: "start-continue", r#type: "submit", "Continue" }
                    }
                    p { class: "start-screen__aside",
                        Link { to: Route::Ranking {}, "View rankings" }
                    }
                } else {
                    div { class: "start-sections",
                        h3 { "Select Starting Section" }
                        p { "Choose which section you'd like to begin with:" }
                        for section in info.sections.iter() {
                            SectionChoice {
                                key: "{section.id}",
                                section: section.clone(),
                                selected: selected.as_ref() == Some(&section.id),
                                on_select: move |id: SectionId| {
                                    form.write().starting_section = Some(id);
                                },
                            }
                        }
                    }
                    if let Some(err) = error.read().as_ref() {
                        p { class: "form-error", role: "alert", "{err.message()}" }
                    }
                    div { class: "start-sections__actions",
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: move |_| choosing_section.set(false),
                            "Back"
                        }
                        button {
                            class: "btn btn-primary",
                            id: "start-test",
                            r#type: "button",
                            onclick: move |_| {
                                let mut draft = form.read().clone();
                                if draft.starting_section.is_none() {
                                    draft.starting_section = first_section.clone();
                                }
                                on_intent.call(ExamIntent::Start(draft));
                            },
                            "Start Test"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn SectionChoice(section: Section, selected: bool, on_select: EventHandler<SectionId>) -> Element {
    let class = if selected {
        "section-choice section-choice--selected"
    } else {
        "section-choice"
    };
    let id = section.id.clone();
    rsx! {
        div { class: "{class}", onclick: move |_| on_select.call(id.clone()),
            span { class: "section-choice__radio" }
            div {
                h4 { "{section.title}" }
                if !section.description.is_empty() {
                    p { "{section.description}" }
                }
            }
        }
    }
}

use dioxus::prelude::*;

use services::exam::{ExamProgress, PaletteItem, SectionProgress};

use crate::vm::ExamIntent;

#[derive(Clone, Debug, PartialEq)]
pub(super) struct HeaderInfo {
    pub title: String,
    pub email: Option<String>,
    pub timer_label: String,
    pub timer_warning: bool,
    pub preview: bool,
    pub fullscreen: bool,
}

#[component]
pub(super) fn ExamHeader(info: HeaderInfo, on_intent: EventHandler<ExamIntent>) -> Element {
    let timer_class = if info.timer_warning {
        "exam-timer exam-timer--warning"
    } else {
        "exam-timer"
    };
    let fullscreen_title = if info.fullscreen {
        "Exit Fullscreen"
    } else {
        "Enter Fullscreen"
    };
    rsx! {
        header { class: "exam-header",
            div { class: "exam-header__left",
                button {
                    class: "icon-btn",
                    id: "exam-toggle-sidebar",
                    r#type: "button",
                    title: "Toggle question list",
                    onclick: move |_| on_intent.call(ExamIntent::ToggleSidebar),
                    "☰"
                }
                h1 { class: "exam-header__title", "{info.title}" }
                if info.preview {
                    span { class: "badge badge--preview", "Preview" }
                }
            }
            div { class: "exam-header__right",
                if let Some(email) = info.email.as_ref() {
                    span { class: "exam-header__email", "{email}" }
                }
                span { class: "{timer_class}", id: "exam-timer", "{info.timer_label}" }
                button {
                    class: "icon-btn",
                    id: "exam-toggle-fullscreen",
                    r#type: "button",
                    title: "{fullscreen_title}",
                    onclick: move |_| on_intent.call(ExamIntent::ToggleFullscreen),
                    if info.fullscreen { "⤓" } else { "⤢" }
                }
                if !info.preview {
                    button {
                        class: "icon-btn",
                        id: "exam-logout",
                        r#type: "button",
                        title: "Logout",
                        onclick: move |_| on_intent.call(ExamIntent::Logout),
                        "Logout"
                    }
                }
            }
        }
    }
}

#[component]
pub(super) fn SectionSelector(
    sections: Vec<SectionProgress>,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    rsx! {
        nav { class: "section-selector",
            for section in sections.iter() {
                SectionTab { key: "{section.section}", section: section.clone(), on_intent }
            }
        }
    }
}

#[component]
fn SectionTab(section: SectionProgress, on_intent: EventHandler<ExamIntent>) -> Element {
    let class = if section.is_current {
        "section-tab section-tab--current"
    } else {
        "section-tab"
    };
    let id = section.section.clone();
    rsx! {
        button {
            class: "{class}",
            r#type: "button",
            onclick: move |_| on_intent.call(ExamIntent::SelectSection(id.clone())),
            span { "{section.title}" }
            span { class: "section-tab__count", "{section.answered}/{section.total}" }
        }
    }
}

#[component]
pub(super) fn QuestionPalette(
    section_title: String,
    items: Vec<PaletteItem>,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    rsx! {
        aside { class: "exam-sidebar",
            h3 { class: "exam-sidebar__title", "{section_title}" }
            div { class: "palette",
                for item in items.iter() {
                    PaletteButton { key: "{item.question_id}", item: item.clone(), on_intent }
                }
            }
            ul { class: "palette-legend",
                li { span { class: "palette-dot palette-dot--answered" } "Answered" }
                li { span { class: "palette-dot palette-dot--marked" } "Marked for review" }
                li { span { class: "palette-dot" } "Not answered" }
            }
        }
    }
}

fn palette_class(item: &PaletteItem) -> String {
    let mut class = String::from("palette-btn");
    if item.is_answered {
        class.push_str(" palette-btn--answered");
    }
    if item.is_marked {
        class.push_str(" palette-btn--marked");
    }
    if item.is_current {
        class.push_str(" palette-btn--current");
    }
    class
}

#[component]
fn PaletteButton(item: PaletteItem, on_intent: EventHandler<ExamIntent>) -> Element {
    let class = palette_class(&item);
    let index = item.index;
    let kind = if item.is_coding { "Coding" } else { "MCQ" };
    rsx! {
        button {
            class: "{class}",
            r#type: "button",
            title: "{kind}",
            onclick: move |_| on_intent.call(ExamIntent::SelectQuestion(index)),
            "{item.number_in_section}"
        }
    }
}

#[component]
pub(super) fn ExamFooter(
    progress: ExamProgress,
    preview: bool,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    let mut confirming = use_signal(|| false);
    let summary = format!(
        "Answered {} of {} · Marked {}",
        progress.answered, progress.total, progress.marked
    );
    let unanswered = progress.unanswered();

    rsx! {
        footer { class: "exam-footer",
            span { class: "exam-footer__summary", "{summary}" }
            if preview {
                span { class: "exam-footer__note", "Preview mode: submission is disabled" }
            } else if confirming() {
                div { class: "submit-confirm", role: "dialog",
                    if unanswered > 0 {
                        p { "You have {unanswered} unanswered questions. Submit anyway?" }
                    } else {
                        p { "Submit your answers now?" }
                    }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| confirming.set(false),
                        "Cancel"
                    }
                    button {
                        class: "btn btn-danger",
                        id: "exam-submit-confirm",
                        r#type: "button",
                        onclick: move |_| {
                            confirming.set(false);
                            on_intent.call(ExamIntent::Submit);
                        },
                        "Submit"
                    }
                }
            } else {
                button {
                    class: "btn btn-primary",
                    id: "exam-submit",
                    r#type: "button",
                    onclick: move |_| confirming.set(true),
                    "Submit Test"
                }
            }
        }
    }
}
